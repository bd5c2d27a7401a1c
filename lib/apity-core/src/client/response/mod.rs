//! Response normalization.
//!
//! This module provides:
//!
//! - [`ApiResponse`] - The normalized `{status, ok, data}` result of one request
//! - [`ResponseStatus`] - HTTP statuses plus the transport / parse failure sentinels
//! - [`Body`] - The parsed, untyped response body

use http::StatusCode;
use serde::de::DeserializeOwned;

use super::ApiError;

mod body;
pub use self::body::Body;

mod status;
pub use self::status::{ResponseStatus, STATUS_PARSE_FAILURE, STATUS_TRANSPORT_FAILURE};

mod parser;
pub(in crate::client) use self::parser::parse_response;

/// The normalized result of one request.
///
/// Every outcome of a request is represented here, none of them is an error:
///
/// - `Success`: a 2xx response, its body decoded into `R` (`None` for `204 No Content`)
/// - `Failure` with an HTTP status: the server answered with a non-2xx status,
///   the body is parsed but kept untyped
/// - `Failure` with [`ResponseStatus::TransportFailure`] (`-1`): no response was received
/// - `Failure` with [`ResponseStatus::ParseFailure`] (`-2`): the body could not be read
///   or decoded
///
/// # Example
///
/// ```rust
/// use apity_core::{ApiResponse, ResponseStatus};
///
/// fn describe(response: &ApiResponse<String>) -> String {
///     match response {
///         ApiResponse::Success { data, .. } => format!("got {data:?}"),
///         ApiResponse::Failure { status: ResponseStatus::TransportFailure, .. } => {
///             "network is down".to_string()
///         }
///         ApiResponse::Failure { status, .. } => format!("failed with {}", status.code()),
///     }
/// }
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum ApiResponse<R> {
    /// The server answered with a 2xx status.
    Success {
        /// The HTTP status.
        status: StatusCode,
        /// The decoded body, `None` for `204 No Content`.
        data: Option<R>,
    },
    /// The request failed, see [`ResponseStatus`].
    Failure {
        /// The HTTP status or a sentinel status.
        status: ResponseStatus,
        /// The parsed error body, if any.
        data: Option<Body>,
    },
}

impl<R> ApiResponse<R> {
    pub(crate) fn transport_failure() -> Self {
        Self::Failure {
            status: ResponseStatus::TransportFailure,
            data: None,
        }
    }

    pub(crate) fn parse_failure() -> Self {
        Self::Failure {
            status: ResponseStatus::ParseFailure,
            data: None,
        }
    }

    /// Returns `true` for a 2xx response.
    pub fn ok(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    /// Returns the numeric status, `-1` for a transport failure, `-2` for a parse failure.
    pub fn status(&self) -> i32 {
        self.response_status().code()
    }

    /// Returns the status as a [`ResponseStatus`].
    pub fn response_status(&self) -> ResponseStatus {
        match self {
            Self::Success { status, .. } => ResponseStatus::Http(*status),
            Self::Failure { status, .. } => *status,
        }
    }

    /// Returns the decoded data of a successful response.
    pub fn data(&self) -> Option<&R> {
        match self {
            Self::Success { data, .. } => data.as_ref(),
            Self::Failure { .. } => None,
        }
    }

    /// Returns the parsed body of a failed response.
    pub fn error_data(&self) -> Option<&Body> {
        match self {
            Self::Success { .. } => None,
            Self::Failure { data, .. } => data.as_ref(),
        }
    }

    /// Converts the response into a `Result`, failures becoming a generic [`ApiError`].
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] when the response is not ok.
    pub fn into_result(self) -> Result<Option<R>, ApiError> {
        match self {
            Self::Success { data, .. } => Ok(data),
            Self::Failure { status, data } => Err(ApiError::new(status, data)),
        }
    }
}

impl ApiResponse<Body> {
    /// Decodes a response holding a raw [`Body`] into a typed response.
    ///
    /// A decode failure of a successful body turns the response into a parse failure.
    pub fn decode<R>(self) -> ApiResponse<R>
    where
        R: DeserializeOwned,
    {
        match self {
            Self::Success { status, data: None } => ApiResponse::Success { status, data: None },
            Self::Success {
                status,
                data: Some(body),
            } => match body.decode::<R>() {
                Ok(data) => ApiResponse::Success {
                    status,
                    data: Some(data),
                },
                Err(error) => {
                    tracing::warn!(%status, %error, "failed to decode response body");
                    ApiResponse::parse_failure()
                }
            },
            Self::Failure { status, data } => ApiResponse::Failure { status, data },
        }
    }
}
