use std::time::Duration;

use bytes::Bytes;
use http::header::{HeaderName, HeaderValue};
use http::{HeaderMap, Method, Version};

use super::ApiClientError;

/// Transport options of a request, the `RequestInit` of a fetch call.
///
/// A default init is configured once in [`FetchConfig`](crate::FetchConfig) and can be
/// overridden per call with [`CallOverrides`](crate::CallOverrides), see [`merge`](Self::merge).
/// The method and the body are set by the request assembler.
///
/// # Example
///
/// ```rust
/// use std::time::Duration;
/// use apity_core::RequestInit;
///
/// # fn example() -> Result<(), apity_core::ApiClientError> {
/// let init = RequestInit::new()
///     .with_header("Authorization", "Bearer token")?
///     .with_timeout(Duration::from_secs(5));
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct RequestInit {
    /// The HTTP method, `GET` when absent.
    pub method: Option<Method>,
    /// The request headers.
    pub headers: HeaderMap,
    /// The request body.
    pub body: Option<Bytes>,
    /// The request timeout.
    pub timeout: Option<Duration>,
    /// The HTTP version.
    pub version: Option<Version>,
}

impl RequestInit {
    /// Creates an empty init.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a header, replacing any previous value with the same name.
    ///
    /// # Errors
    ///
    /// Returns an error for an invalid header name or value.
    pub fn with_header<K, V>(mut self, name: K, value: V) -> Result<Self, ApiClientError>
    where
        K: TryInto<HeaderName>,
        V: TryInto<HeaderValue>,
        ApiClientError: From<K::Error> + From<V::Error>,
    {
        let name = name.try_into()?;
        let value = value.try_into()?;
        self.headers.insert(name, value);
        Ok(self)
    }

    /// Merges headers, replacing the values of the names already present.
    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers.extend(headers);
        self
    }

    /// Sets the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Sets the HTTP version.
    pub fn with_version(mut self, version: Version) -> Self {
        self.version = Some(version);
        self
    }

    /// Merges this default init with a per-call override.
    ///
    /// Headers are merged key by key, all the values of a header name present in the
    /// override replacing the default ones. Any other field set in the override replaces
    /// the default one.
    pub fn merge(&self, overrides: Option<&Self>) -> Self {
        let Some(overrides) = overrides else {
            return self.clone();
        };

        let mut headers = self.headers.clone();
        headers.extend(overrides.headers.clone());

        Self {
            method: overrides.method.clone().or_else(|| self.method.clone()),
            headers,
            body: overrides.body.clone().or_else(|| self.body.clone()),
            timeout: overrides.timeout.or(self.timeout),
            version: overrides.version.or(self.version),
        }
    }
}
