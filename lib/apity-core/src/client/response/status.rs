use http::StatusCode;

/// Status code of a request whose transport failed.
pub const STATUS_TRANSPORT_FAILURE: i32 = -1;

/// Status code of a response whose body could not be read or decoded.
pub const STATUS_PARSE_FAILURE: i32 = -2;

/// Status of an [`ApiResponse`](crate::ApiResponse).
///
/// Besides real HTTP statuses, two sentinel statuses unify the failures that never
/// produced a usable response: the transport failed (`-1`) or the body could not be
/// read or decoded (`-2`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, derive_more::Display)]
pub enum ResponseStatus {
    /// A real HTTP status received from the server.
    #[display("HTTP {_0}")]
    Http(StatusCode),
    /// The transport failed (network error, DNS failure, ...).
    #[display("transport failure (-1)")]
    TransportFailure,
    /// The body could not be read, parsed, or decoded.
    #[display("parse failure (-2)")]
    ParseFailure,
}

impl ResponseStatus {
    /// Returns the numeric status, using negative sentinels outside the HTTP range.
    pub fn code(self) -> i32 {
        match self {
            Self::Http(status) => i32::from(status.as_u16()),
            Self::TransportFailure => STATUS_TRANSPORT_FAILURE,
            Self::ParseFailure => STATUS_PARSE_FAILURE,
        }
    }

    /// Returns the HTTP status, `None` for sentinel statuses.
    pub fn http(self) -> Option<StatusCode> {
        match self {
            Self::Http(status) => Some(status),
            Self::TransportFailure | Self::ParseFailure => None,
        }
    }

    /// Returns `true` for the sentinel statuses.
    pub fn is_sentinel(self) -> bool {
        self.http().is_none()
    }
}

impl From<StatusCode> for ResponseStatus {
    fn from(value: StatusCode) -> Self {
        Self::Http(value)
    }
}
