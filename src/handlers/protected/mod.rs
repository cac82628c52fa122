// Protected handlers: everything that reaches the Garage admin API, plus the
// local account list. All routes here sit behind `require_session`.

pub mod bucket;
pub mod key;
pub mod layout;
pub mod node;
pub mod users;

use serde::Deserialize;
use serde_json::Value;

use crate::error::{ApiError, ApiResult};

#[derive(Debug, Default, Deserialize)]
pub struct IdQuery {
    pub id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct NameQuery {
    pub name: Option<String>,
}

/// Percent-encode a value for use inside an upstream query string
pub(crate) fn encode(value: &str) -> String {
    url::form_urlencoded::byte_serialize(value.as_bytes()).collect()
}

/// A query parameter that must be present and non-empty
pub(crate) fn required(value: Option<String>, message: &str) -> ApiResult<String> {
    value
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ApiError::bad_request(message))
}

/// `{ ...object, key: value }`; non-objects are replaced
pub(crate) fn with_field(object: Value, key: &str, value: Value) -> Value {
    let mut map = match object {
        Value::Object(map) => map,
        _ => serde_json::Map::new(),
    };
    map.insert(key.to_string(), value);
    Value::Object(map)
}
