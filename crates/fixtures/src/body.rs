// Structured request body parsing for the echo route.

use axum::body::Body;
use http::{header, request::Parts, Method};
use http_body_util::{BodyExt, LengthLimitError, Limited};
use serde_json::{Map, Value};

use crate::errors::BodyError;

/// `DEFAULT_BODY_LIMIT` caps how many bytes of a request body are read.
pub const DEFAULT_BODY_LIMIT: usize = 1024 * 1024;

/// What the parser produces when there is no structured body to report.
#[must_use]
pub fn no_structured_body() -> Value {
    Value::Object(Map::new())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BodyFormat {
    Json,
    Form,
    Text,
}

impl BodyFormat {
    fn detect(parts: &Parts) -> Option<Self> {
        let content_type = parts.headers.get(header::CONTENT_TYPE)?.to_str().ok()?;
        let essence = content_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();

        if essence == "application/json" || essence.ends_with("+json") {
            return Some(Self::Json);
        }

        if essence == "application/x-www-form-urlencoded" {
            return Some(Self::Form);
        }

        if essence.starts_with("text/") {
            return Some(Self::Text);
        }

        None
    }
}

fn parses_body(method: &Method) -> bool {
    method == Method::POST || method == Method::PUT || method == Method::PATCH
}

/// Reads and parses `body` according to the request's content type.
///
/// Only `POST`, `PUT` and `PATCH` bodies are read. Json, urlencoded forms and
/// `text/*` are understood; anything else, an empty body or content that
/// fails to parse becomes [`no_structured_body`].
///
/// # Errors
///
/// Returns [`BodyError::TooLarge`] when the body exceeds `limit` bytes and
/// [`BodyError::Read`] when the underlying stream fails.
pub async fn parse(parts: &Parts, body: Body, limit: usize) -> Result<Value, BodyError> {
    if !parses_body(&parts.method) {
        return Ok(no_structured_body());
    }

    let Some(format) = BodyFormat::detect(parts) else {
        return Ok(no_structured_body());
    };

    let data = match Limited::new(body, limit).collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(err) if err.is::<LengthLimitError>() => return Err(BodyError::TooLarge(limit)),
        Err(err) => return Err(BodyError::Read(err.to_string())),
    };

    Ok(decode(format, &data))
}

fn decode(format: BodyFormat, data: &[u8]) -> Value {
    if data.is_empty() {
        return no_structured_body();
    }

    match format {
        BodyFormat::Json => serde_json::from_slice(data).unwrap_or_else(|err| {
            tracing::debug!("discarding unparseable json body: {}", err);
            no_structured_body()
        }),
        BodyFormat::Form => decode_form(data),
        BodyFormat::Text => Value::String(String::from_utf8_lossy(data).into_owned()),
    }
}

/// Decodes an urlencoded form into an object, repeated keys collect into
/// an array in the order they were sent.
fn decode_form(data: &[u8]) -> Value {
    let pairs: Vec<(String, String)> = match serde_urlencoded::from_bytes(data) {
        Ok(pairs) => pairs,
        Err(err) => {
            tracing::debug!("discarding unparseable form body: {}", err);
            return no_structured_body();
        }
    };

    let mut fields = Map::new();
    for (name, value) in pairs {
        let value = Value::String(value);
        match fields.get_mut(&name) {
            Some(Value::Array(values)) => values.push(value),
            Some(existing) => {
                let first = existing.take();
                *existing = Value::Array(vec![first, value]);
            }
            None => {
                fields.insert(name, value);
            }
        }
    }

    Value::Object(fields)
}
