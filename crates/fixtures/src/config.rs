use std::collections::BTreeMap;

use derive_more::derive::From;
use http::{HeaderName, HeaderValue};
use serde::Deserialize;

use crate::body::DEFAULT_BODY_LIMIT;
use crate::response::DEFAULT_COUNTER_HEADER;
use crate::routes::RouteTable;

#[derive(Debug, From)]
pub enum ConfigError {
    IOError(std::io::Error),

    DeserializationFailed(toml::de::Error),

    #[from(ignore)]
    UnknownRoute(String),

    #[from(ignore)]
    InvalidHeader(String),
}

impl std::error::Error for ConfigError {}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{self:?}")
    }
}

pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// `ServerConfig` holds where the server listens and how it stamps and
/// reads requests.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub addr: String,
    pub port: u16,
    pub counter_header: String,
    pub body_limit: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: String::from("0.0.0.0"),
            port: 80,
            counter_header: DEFAULT_COUNTER_HEADER.as_str().to_owned(),
            body_limit: DEFAULT_BODY_LIMIT,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RouteOverride {
    pub cache_control: Option<String>,
}

/// `FixtureConfig` is the whole configuration file, every section and field
/// is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct FixtureConfig {
    pub server: ServerConfig,
    pub routes: BTreeMap<String, RouteOverride>,
}

impl FixtureConfig {
    /// The `addr:port` pair to bind to.
    #[must_use]
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.addr, self.server.port)
    }

    /// The header name fixture counters are written to.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidHeader`] for names that are not valid
    /// http header names.
    pub fn counter_header(&self) -> ConfigResult<HeaderName> {
        HeaderName::try_from(self.server.counter_header.as_str())
            .map_err(|_| ConfigError::InvalidHeader(self.server.counter_header.clone()))
    }

    /// The standard route table with this configuration's overrides applied.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnknownRoute`] for overrides naming a route that
    /// does not exist and [`ConfigError::InvalidHeader`] for policies that
    /// are not valid header values.
    pub fn route_table(&self) -> ConfigResult<RouteTable> {
        let mut table = RouteTable::standard();

        for (key, overrides) in &self.routes {
            let route = table
                .get_mut(key)
                .ok_or_else(|| ConfigError::UnknownRoute(key.clone()))?;

            if let Some(policy) = &overrides.cache_control {
                let value = HeaderValue::from_str(policy)
                    .map_err(|_| ConfigError::InvalidHeader(policy.clone()))?;
                route.set_cache_control(value);
            }
        }

        Ok(table)
    }
}

/// Parses configuration from toml text.
///
/// # Errors
///
/// Returns [`ConfigError::DeserializationFailed`] for malformed toml.
pub fn from_str(content: &str) -> ConfigResult<FixtureConfig> {
    let config_obj: FixtureConfig = toml::from_str(content)?;
    Ok(config_obj)
}

/// Reads and parses the configuration file at `target`.
///
/// # Errors
///
/// Returns [`ConfigError::IOError`] when the file can not be read and
/// [`ConfigError::DeserializationFailed`] for malformed toml.
pub fn from_path<V>(target: V) -> ConfigResult<FixtureConfig>
where
    V: Into<std::path::PathBuf>,
{
    let target_path = target.into();
    let config_content = std::fs::read_to_string(target_path)?;
    from_str(&config_content)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_uses_defaults() {
        let config = from_str("").expect("empty config");

        assert_eq!(config, FixtureConfig::default());
        assert_eq!(config.bind_addr(), "0.0.0.0:80");
        assert_eq!(config.counter_header().expect("header"), DEFAULT_COUNTER_HEADER);
    }

    #[test]
    fn applies_route_overrides() {
        let config = from_str(
            r#"
            [server]
            addr = "127.0.0.1"
            port = 8080
            counter_header = "x-hit"

            [routes.test-css]
            cache_control = "no-store"
            "#,
        )
        .expect("config");

        let table = config.route_table().expect("route table");

        assert_eq!(config.bind_addr(), "127.0.0.1:8080");
        assert_eq!(config.counter_header().expect("header"), "x-hit");
        assert_eq!(table.get("test-css").expect("css").cache_control(), "no-store");
        assert_eq!(table.get("test-image").expect("image").cache_control(), "max-age=3600");
    }

    #[test]
    fn rejects_unknown_routes() {
        let config = from_str(
            r#"
            [routes.test-video]
            cache_control = "no-store"
            "#,
        )
        .expect("config");

        assert!(matches!(
            config.route_table(),
            Err(ConfigError::UnknownRoute(key)) if key == "test-video"
        ));
    }

    #[test]
    fn rejects_invalid_headers() {
        let config = from_str(
            r#"
            [server]
            counter_header = "not a header"

            [routes.test-js]
            cache_control = "bad\nvalue"
            "#,
        )
        .expect("config");

        assert!(matches!(config.counter_header(), Err(ConfigError::InvalidHeader(_))));
        assert!(matches!(config.route_table(), Err(ConfigError::InvalidHeader(_))));
    }

    #[test]
    fn rejects_malformed_toml() {
        assert!(matches!(
            from_str("[server\nport = 1"),
            Err(ConfigError::DeserializationFailed(_))
        ));
    }

    #[test]
    fn reports_missing_files() {
        assert!(matches!(
            from_path("/definitely/not/here/fixtures.toml"),
            Err(ConfigError::IOError(_))
        ));
    }
}
