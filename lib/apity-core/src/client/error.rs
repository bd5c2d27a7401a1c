use std::convert::Infallible;

use super::response::{Body, ResponseStatus};

/// Errors that can occur when building or sending a typed call.
///
/// Transport failures, body decoding failures and HTTP error statuses are *not* errors:
/// they are folded into [`ApiResponse`](crate::ApiResponse) with their status.
/// This enum covers the programmer errors (malformed payloads, unresolved paths, ...)
/// plus the [`ApiError`] raised by [`TypedCall::send`](crate::TypedCall::send).
#[derive(Debug, derive_more::Error, derive_more::Display, derive_more::From)]
pub enum ApiClientError {
    /// HTTP client error from the underlying reqwest library.
    ///
    /// Occurs when network requests fail, timeouts occur, or connection issues arise.
    ReqwestError(reqwest::Error),

    /// URL parsing error when constructing request URLs.
    ///
    /// Occurs when the base URL or the resolved path create an invalid URL.
    UrlError(url::ParseError),

    /// Invalid HTTP header name.
    InvalidHeaderName(http::header::InvalidHeaderName),

    /// Invalid HTTP header value.
    InvalidHeaderValue(http::header::InvalidHeaderValue),

    /// JSON serialization error, typically when converting the payload.
    JsonValueError(serde_json::Error),

    /// Query parameter serialization error.
    QuerySerializationError(serde_urlencoded::ser::Error),

    /// A typed call was invoked outside a tokio runtime.
    RuntimeUnavailable(tokio::runtime::TryCurrentError),

    /// Failure reported by a custom [`Fetch`](crate::Fetch) implementation.
    #[display("Transport failure: {message}")]
    #[from(skip)]
    Transport {
        /// Description of the transport failure.
        message: String,
    },

    /// A body could not be decoded into the expected type.
    #[display("Failed to deserialize JSON at '{path}': {error}\n{body}")]
    #[from(skip)]
    JsonError {
        /// The JSON path where the error occurred.
        path: String,
        /// The underlying JSON error.
        error: serde_json::Error,
        /// The body that failed to decode.
        body: String,
    },

    /// Path template contains unresolved parameters.
    ///
    /// Occurs when the payload lacks a field named by a `{placeholder}`.
    #[display("Path '{path}' is missing required arguments: {missings:?}")]
    #[from(skip)]
    PathUnresolved {
        /// The path template that couldn't be resolved.
        path: String,
        /// List of missing parameter names.
        missings: Vec<String>,
    },

    /// Query parameter value type is not supported.
    #[display(
        "Unsupported query parameter value: objects are not supported for query parameters. Got: {value}"
    )]
    #[from(skip)]
    UnsupportedQueryParameterValue {
        /// The unsupported value that was provided.
        value: serde_json::Value,
    },

    /// Parameter or payload value cannot be converted to the required format.
    #[display("Unsupported parameter value: {message}. Got: {value}")]
    #[from(skip)]
    UnsupportedParameterValue {
        /// Specific error message describing the conversion failure.
        message: String,
        /// The value that failed to convert.
        value: serde_json::Value,
    },

    /// The server answered with a failure, see [`ApiError`].
    Api(ApiError),
}

impl From<Infallible> for ApiClientError {
    fn from(value: Infallible) -> Self {
        match value {}
    }
}

/// Generic API error: a response that was not ok.
///
/// Typed calls narrow it into an [`OperationError`](crate::OperationError)
/// specific to the operation that produced it.
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("API call failed with {status}")]
pub struct ApiError {
    status: ResponseStatus,
    data: Option<Body>,
}

impl ApiError {
    pub(crate) fn new(status: ResponseStatus, data: Option<Body>) -> Self {
        Self { status, data }
    }

    /// Returns the response status, possibly a sentinel status.
    pub fn status(&self) -> ResponseStatus {
        self.status
    }

    /// Returns the parsed error body, if any.
    pub fn data(&self) -> Option<&Body> {
        self.data.as_ref()
    }
}
