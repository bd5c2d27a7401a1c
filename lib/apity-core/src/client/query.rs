use serde_json::{Map, Value};

use super::ApiClientError;

/// Builds the `application/x-www-form-urlencoded` query string of a request.
///
/// Only the payload fields named in `names` are used, in that order, and they are
/// removed from `fields`. Arrays become repeated pairs (`list=b&list=c`), `null`
/// values are skipped.
pub(in crate::client) fn build_query(
    names: &[String],
    fields: &mut Map<String, Value>,
) -> Result<String, ApiClientError> {
    let mut pairs = Vec::new();

    for name in names {
        let Some(value) = fields.remove(name.as_str()) else {
            continue;
        };
        match value {
            Value::Null => {}
            Value::Array(items) => {
                for item in items {
                    if let Some(item) = query_value_to_string(item)? {
                        pairs.push((name.clone(), item));
                    }
                }
            }
            value => {
                if let Some(value) = query_value_to_string(value)? {
                    pairs.push((name.clone(), value));
                }
            }
        }
    }

    let query = serde_urlencoded::to_string(&pairs)?;
    Ok(query)
}

fn query_value_to_string(value: Value) -> Result<Option<String>, ApiClientError> {
    match value {
        Value::Null => Ok(None),
        Value::String(text) => Ok(Some(text)),
        Value::Bool(_) | Value::Number(_) => Ok(Some(value.to_string())),
        Value::Array(_) | Value::Object(_) => {
            Err(ApiClientError::UnsupportedQueryParameterValue { value })
        }
    }
}
