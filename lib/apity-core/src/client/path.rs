use std::sync::LazyLock;

use indexmap::IndexSet;
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use regex::Regex;
use serde_json::{Map, Value};

use super::ApiClientError;

/// Regular expression for matching path parameters in the format `{param_name}`.
static RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{(?<name>\w+)}").expect("a valid regex"));

/// Characters escaped in a path segment: everything but `A-Z a-z 0-9 - _ . ! ~ * ' ( )`.
const PATH_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

fn replace_path_param(path: &str, param_name: &str, value: &str) -> String {
    let pattern = ["{", param_name, "}"].concat();
    path.replace(&pattern, value)
}

fn encode_path_param_value(value: &str) -> String {
    utf8_percent_encode(value, PATH_SEGMENT).to_string()
}

/// Returns the placeholder names of a path template, in order and without duplicates.
fn placeholder_names(path: &str) -> IndexSet<String> {
    RE.captures_iter(path)
        .filter_map(|caps| caps.name("name"))
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Substitutes the `{name}` placeholders of `path` with the matching payload fields.
///
/// Each value is percent-encoded as a single path segment. The consumed fields are
/// removed from `fields`, so they are neither sent as query parameters nor in the body.
pub(in crate::client) fn resolve_path(
    path: &str,
    fields: &mut Map<String, Value>,
) -> Result<String, ApiClientError> {
    let names = placeholder_names(path);
    if names.is_empty() {
        return Ok(path.to_string());
    }

    let missings = names
        .iter()
        .filter(|name| !fields.contains_key(name.as_str()))
        .cloned()
        .collect::<Vec<_>>();
    if !missings.is_empty() {
        return Err(ApiClientError::PathUnresolved {
            path: path.to_string(),
            missings,
        });
    }

    let mut resolved = path.to_string();
    for name in &names {
        let Some(value) = fields.remove(name.as_str()) else {
            continue;
        };
        let path_value = path_value_to_string(&value)?;
        let encoded_value = encode_path_param_value(&path_value);
        resolved = replace_path_param(&resolved, name, &encoded_value);
    }

    Ok(resolved)
}

fn path_value_to_string(value: &Value) -> Result<String, ApiClientError> {
    match value {
        Value::String(text) => Ok(text.clone()),
        Value::Null | Value::Bool(_) | Value::Number(_) => Ok(value.to_string()),
        Value::Array(items) => {
            let parts = items
                .iter()
                .map(path_value_to_string)
                .collect::<Result<Vec<_>, _>>()?;
            Ok(parts.join(","))
        }
        Value::Object(_) => Err(ApiClientError::UnsupportedParameterValue {
            message: "objects are not supported as path parameters".to_string(),
            value: value.clone(),
        }),
    }
}
