use std::sync::Arc;

mod assemble;
pub use self::assemble::FetchParams;

mod builder;
pub use self::builder::{MethodBuilder, PathBuilder};

mod call;
pub use self::call::{
    CallError, CallOverrides, Endpoint, ErrorResponse, Operation, OperationError, TypedCall,
};

mod config;
pub use self::config::FetchConfig;
use self::config::SharedConfig;

mod error;
pub use self::error::{ApiClientError, ApiError};

mod fetch;
pub use self::fetch::{
    Fetch, FetchFn, FetchFuture, FetchResponse, Middleware, MiddlewareFn, Next, fetch_fn,
    middleware_fn,
};

mod init;
pub use self::init::RequestInit;

mod path;

mod payload;
pub use self::payload::{ArrayRequestBody, IntoPayload, Payload, array_request_body};

mod query;

mod request;
pub use self::request::{ApiRequest, Settlement};

mod response;
pub use self::response::{
    ApiResponse, Body, ResponseStatus, STATUS_PARSE_FAILURE, STATUS_TRANSPORT_FAILURE,
};

/// Factory of typed calls for one API.
///
/// An `Apity` owns the default configuration ([`FetchConfig`]) and the default transport
/// of the typed calls it creates. The configuration can be replaced at any time with
/// [`configure`](Self::configure): every call reads it when it is invoked, including
/// the calls created before.
///
/// # Example
///
/// ```rust,no_run
/// use apity_core::{Apity, Endpoint, FetchConfig};
/// use http::Method;
/// use serde_json::{Value, json};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let apity = Apity::new();
/// apity.configure(FetchConfig::default().with_base_url("http://localhost:3000"));
///
/// let find_pets = apity
///     .path("/pets")
///     .method(Method::GET)
///     .create_with_query::<Endpoint<Value, Vec<Value>>>(["tags", "limit"]);
///
/// let request = find_pets.call(json!({ "tags": ["dog", "cat"], "limit": 10 }))?;
/// let pets = request.on_data().await;
///
/// if let Some(pets) = pets.data() {
///     println!("{} pets", pets.len());
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Apity {
    config: SharedConfig,
    fetch: Arc<dyn Fetch>,
}

impl Apity {
    /// Creates a builder using a default [`reqwest::Client`] as transport.
    pub fn new() -> Self {
        Self::with_fetch(reqwest::Client::new())
    }

    /// Creates a builder using the given default transport.
    pub fn with_fetch(fetch: impl Fetch) -> Self {
        Self {
            config: SharedConfig::default(),
            fetch: Arc::new(fetch),
        }
    }

    /// Replaces the whole configuration.
    ///
    /// Fields not set in `config` are reset to their default value.
    pub fn configure(&self, config: FetchConfig) {
        self.config.replace(config);
    }

    /// Starts the creation of a typed call for a path template such as `/pets/{id}`.
    pub fn path(&self, path: impl Into<String>) -> PathBuilder {
        PathBuilder::new(path.into(), self.config.clone(), Arc::clone(&self.fetch))
    }
}

impl Default for Apity {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use http::{Method, StatusCode};
    use serde_json::{Value, json};

    use super::*;

    fn echo_url() -> impl Fetch {
        fetch_fn(|params: FetchParams| async move {
            FetchResponse::json(StatusCode::OK, &json!({ "url": params.url.as_str() }))
        })
    }

    #[tokio::test]
    async fn test_configure_is_seen_by_existing_calls() {
        let apity = Apity::with_fetch(echo_url());
        let call = apity
            .path("/users/{id}")
            .method(Method::GET)
            .create::<Endpoint<Value, Value>>();

        apity.configure(FetchConfig::default().with_base_url("http://first.localhost"));
        let first = call.send(json!({ "id": 1 })).await.expect("should succeed");

        apity.configure(FetchConfig::default().with_base_url("http://second.localhost/"));
        let second = call.send(json!({ "id": 2 })).await.expect("should succeed");

        assert_eq!(first, Some(json!({ "url": "http://first.localhost/users/1" })));
        assert_eq!(second, Some(json!({ "url": "http://second.localhost/users/2" })));
    }

    #[tokio::test]
    async fn test_configured_middleware_wraps_the_transport() {
        let apity = Apity::with_fetch(fetch_fn(|params: FetchParams| async move {
            let source = params
                .init
                .headers
                .get("x-request-source")
                .and_then(|value| value.to_str().ok())
                .map(ToString::to_string);
            FetchResponse::json(StatusCode::OK, &json!({ "source": source }))
        }));
        apity.configure(
            FetchConfig::default()
                .with_base_url("http://localhost")
                .with_middleware(middleware_fn(|mut params: FetchParams, next: Next| async move {
                    params
                        .init
                        .headers
                        .insert("x-request-source", http::HeaderValue::from_static("test"));
                    next.run(params).await
                })),
        );
        let call = apity.path("/").method(Method::GET).create::<Endpoint<(), Value>>();

        let data = call.send(()).await.expect("should succeed");

        assert_eq!(data, Some(json!({ "source": "test" })));
    }
}
