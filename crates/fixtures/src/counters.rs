// Per-route request counters.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use crate::routes::RouteKey;

/// `CounterRegistry` owns one independent counter per [`RouteKey`].
///
/// Every call to [`CounterRegistry::next`] is serialized through a single
/// lock, so two callers asking for the same key never observe the same
/// value. The lock is only ever held for the increment itself and never
/// across an `.await`.
#[derive(Debug, Default)]
pub struct CounterRegistry {
    counters: Mutex<HashMap<RouteKey, u64>>,
}

impl CounterRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of prior calls made for `key` and records this one.
    ///
    /// The first call for a key returns `0`, the second `1`, and so on.
    pub fn next(&self, key: &RouteKey) -> u64 {
        let mut counters = self.counters.lock().unwrap_or_else(PoisonError::into_inner);

        if let Some(counter) = counters.get_mut(key) {
            let current = *counter;
            *counter += 1;
            return current;
        }

        counters.insert(key.clone(), 1);
        0
    }

    /// Returns how many times `next` was called for `key`, `None` if never.
    #[must_use]
    pub fn peek(&self, key: &RouteKey) -> Option<u64> {
        self.counters
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;
    use std::sync::Arc;

    #[test]
    fn should_start_at_zero_and_step_by_one() {
        let registry = CounterRegistry::new();
        let key = RouteKey::from_static("test-image");

        let observed: Vec<u64> = (0..5).map(|_| registry.next(&key)).collect();

        assert_eq!(observed, vec![0, 1, 2, 3, 4]);
        assert_eq!(registry.peek(&key), Some(5));
    }

    #[test]
    fn should_keep_counters_isolated_per_route() {
        let registry = CounterRegistry::new();
        let css = RouteKey::from_static("test-css");
        let js = RouteKey::from_static("test-js");

        registry.next(&css);
        registry.next(&css);
        registry.next(&css);

        assert_eq!(registry.peek(&js), None);
        assert_eq!(registry.next(&js), 0);
        assert_eq!(registry.next(&css), 3);
    }

    #[test]
    fn should_hand_out_unique_values_across_threads() {
        let registry = Arc::new(CounterRegistry::new());
        let key = RouteKey::from_static("test-large-image");

        let seen: BTreeSet<u64> = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..8)
                .map(|_| {
                    let registry = registry.clone();
                    let key = key.clone();
                    scope.spawn(move || (0..250).map(|_| registry.next(&key)).collect::<Vec<_>>())
                })
                .collect();

            handles
                .into_iter()
                .flat_map(|handle| handle.join().expect("counter thread panicked"))
                .collect()
        });

        assert_eq!(seen.len(), 2000);
        assert_eq!(seen, (0..2000).collect::<BTreeSet<u64>>());
    }
}
