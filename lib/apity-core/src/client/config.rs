use std::sync::{Arc, PoisonError, RwLock};

use super::{Middleware, RequestInit};

/// Default configuration of the typed calls created by an [`Apity`](crate::Apity) builder.
///
/// # Example
///
/// ```rust
/// use apity_core::{Apity, FetchConfig, RequestInit};
///
/// # fn example() -> Result<(), apity_core::ApiClientError> {
/// let apity = Apity::new();
/// apity.configure(
///     FetchConfig::default()
///         .with_base_url("https://petstore.example.com/api")
///         .with_init(RequestInit::new().with_header("Authorization", "Bearer token")?),
/// );
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct FetchConfig {
    /// The base URL every path is appended to.
    pub base_url: String,
    /// The default transport options, merged with the per-call ones.
    pub init: RequestInit,
    /// The middleware chain, the first one being the outermost.
    pub middleware: Vec<Arc<dyn Middleware>>,
}

impl FetchConfig {
    /// Sets the base URL.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Sets the default transport options.
    pub fn with_init(mut self, init: RequestInit) -> Self {
        self.init = init;
        self
    }

    /// Appends a middleware to the chain.
    pub fn with_middleware(mut self, middleware: impl Middleware) -> Self {
        self.middleware.push(Arc::new(middleware));
        self
    }
}

/// The configuration shared by a builder and all its typed calls.
///
/// Calls read a snapshot at invocation time, so a `replace` is seen by calls created
/// before it.
#[derive(Debug, Clone, Default)]
pub(in crate::client) struct SharedConfig(Arc<RwLock<FetchConfig>>);

impl SharedConfig {
    pub(in crate::client) fn snapshot(&self) -> FetchConfig {
        self.0
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub(in crate::client) fn replace(&self, config: FetchConfig) {
        let mut current = self.0.write().unwrap_or_else(PoisonError::into_inner);
        *current = config;
    }
}
