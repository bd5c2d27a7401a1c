use serde::Serialize;
use serde_json::{Map, Value};

use super::ApiClientError;

/// The single payload object of a typed call.
///
/// Its fields feed the path placeholders, the declared query parameters and, for the
/// methods with a body, the JSON body. An array body (see [`array_request_body`]) is
/// sent as a whole, the fields then only feed the path and the query.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Payload {
    fields: Map<String, Value>,
    array_body: Option<Vec<Value>>,
}

impl Payload {
    /// Creates a payload from a JSON value.
    ///
    /// `null` is an empty payload and a top-level array is an array body.
    ///
    /// # Errors
    ///
    /// Returns an error for any other scalar value.
    pub fn from_value(value: Value) -> Result<Self, ApiClientError> {
        match value {
            Value::Null => Ok(Self::default()),
            Value::Object(fields) => Ok(Self {
                fields,
                array_body: None,
            }),
            Value::Array(items) => Ok(Self {
                fields: Map::new(),
                array_body: Some(items),
            }),
            value => Err(ApiClientError::UnsupportedParameterValue {
                message: "a payload must be an object, an array or null".to_string(),
                value,
            }),
        }
    }

    /// Returns the payload fields.
    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    /// Returns the array body, if any.
    pub fn array_body(&self) -> Option<&[Value]> {
        self.array_body.as_deref()
    }

    pub(in crate::client) fn into_parts(self) -> (Map<String, Value>, Option<Vec<Value>>) {
        (self.fields, self.array_body)
    }
}

/// Conversion into a [`Payload`].
///
/// Implemented for every [`Serialize`] type and for [`ArrayRequestBody`].
pub trait IntoPayload {
    /// Converts the value into a payload.
    ///
    /// # Errors
    ///
    /// Returns an error if the value cannot be serialized into a payload.
    fn into_payload(self) -> Result<Payload, ApiClientError>;
}

impl<T> IntoPayload for T
where
    T: Serialize,
{
    fn into_payload(self) -> Result<Payload, ApiClientError> {
        let value = serde_json::to_value(&self)?;
        Payload::from_value(value)
    }
}

/// A payload whose body is a whole array, see [`array_request_body`].
#[derive(Debug, Clone, PartialEq)]
pub struct ArrayRequestBody<B, P> {
    body: Vec<B>,
    params: P,
}

/// Marks `body` as the whole array body of a request, `params` holding the path and
/// query fields.
///
/// Without it, a payload is an object whose remaining fields become the body: an
/// array body could not share the payload with path or query fields.
///
/// # Example
///
/// ```rust
/// use apity_core::{IntoPayload, array_request_body};
/// use serde_json::json;
///
/// # fn example() -> Result<(), apity_core::ApiClientError> {
/// let payload = array_request_body(["b", "c"], json!({ "id": 1 })).into_payload()?;
///
/// assert_eq!(payload.fields()["id"], json!(1));
/// assert_eq!(payload.array_body(), Some([json!("b"), json!("c")].as_slice()));
/// # Ok(())
/// # }
/// ```
pub fn array_request_body<B, P>(
    body: impl IntoIterator<Item = B>,
    params: P,
) -> ArrayRequestBody<B, P>
where
    B: Serialize,
    P: Serialize,
{
    ArrayRequestBody {
        body: body.into_iter().collect(),
        params,
    }
}

impl<B, P> IntoPayload for ArrayRequestBody<B, P>
where
    B: Serialize,
    P: Serialize,
{
    fn into_payload(self) -> Result<Payload, ApiClientError> {
        let Self { body, params } = self;

        let fields = match serde_json::to_value(&params)? {
            Value::Null => Map::new(),
            Value::Object(fields) => fields,
            value => {
                return Err(ApiClientError::UnsupportedParameterValue {
                    message: "array body parameters must be an object".to_string(),
                    value,
                });
            }
        };
        let array_body = body
            .iter()
            .map(serde_json::to_value)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Payload {
            fields,
            array_body: Some(array_body),
        })
    }
}
