use std::fmt::Debug;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use bytes::Bytes;
use http::header::{HeaderName, HeaderValue};
use http::{HeaderMap, Method, StatusCode};
use reqwest::{Body, Request};
use tracing::debug;

use super::{ApiClientError, FetchParams, RequestInit};

/// Boxed future returned by [`Fetch`] and [`Middleware`] implementations.
pub type FetchFuture = Pin<Box<dyn Future<Output = Result<FetchResponse, ApiClientError>> + Send>>;

type BodyFuture = Pin<Box<dyn Future<Output = Result<Bytes, ApiClientError>> + Send>>;

/// The HTTP transport used by typed calls.
///
/// Any failure returned by the transport is reported as a transport failure
/// (status `-1`) in the resulting [`ApiResponse`](crate::ApiResponse).
///
/// It is implemented for [`reqwest::Client`], the default transport, and for closures
/// through [`fetch_fn`].
pub trait Fetch: Send + Sync + 'static {
    /// Sends the request and returns the response head with a deferred body.
    fn fetch(&self, params: FetchParams) -> FetchFuture;
}

impl Fetch for reqwest::Client {
    fn fetch(&self, params: FetchParams) -> FetchFuture {
        Box::pin(execute(self.clone(), params))
    }
}

async fn execute(
    client: reqwest::Client,
    params: FetchParams,
) -> Result<FetchResponse, ApiClientError> {
    let FetchParams { url, init } = params;
    let RequestInit {
        method,
        headers,
        body,
        timeout,
        version,
    } = init;

    let mut request = Request::new(method.unwrap_or(Method::GET), url);
    *request.headers_mut() = headers;
    *request.timeout_mut() = timeout;
    if let Some(version) = version {
        *request.version_mut() = version;
    }
    if let Some(body) = body {
        *request.body_mut() = Some(Body::from(body));
    }

    debug!(?request, "sending...");
    let response = client.execute(request).await?;
    debug!(?response, "...receiving");

    let status = response.status();
    let headers = response.headers().clone();
    let result = FetchResponse::new(status)
        .with_headers(headers)
        .with_deferred_body(read_body(response));
    Ok(result)
}

async fn read_body(response: reqwest::Response) -> Result<Bytes, ApiClientError> {
    let bytes = response.bytes().await?;
    Ok(bytes)
}

/// A [`Fetch`] implementation backed by a closure, see [`fetch_fn`].
#[derive(Clone)]
pub struct FetchFn<F>(F);

impl<F> Debug for FetchFn<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("FetchFn")
    }
}

/// Creates a [`Fetch`] transport from an async closure.
///
/// # Example
///
/// ```rust
/// use apity_core::{FetchResponse, fetch_fn};
/// use http::StatusCode;
///
/// let transport = fetch_fn(|params| async move {
///     assert_eq!(params.url.scheme(), "https");
///     Ok::<_, apity_core::ApiClientError>(FetchResponse::new(StatusCode::NO_CONTENT))
/// });
/// ```
pub fn fetch_fn<F, Fut>(fetch: F) -> FetchFn<F>
where
    F: Fn(FetchParams) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<FetchResponse, ApiClientError>> + Send + 'static,
{
    FetchFn(fetch)
}

impl<F, Fut> Fetch for FetchFn<F>
where
    F: Fn(FetchParams) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<FetchResponse, ApiClientError>> + Send + 'static,
{
    fn fetch(&self, params: FetchParams) -> FetchFuture {
        Box::pin((self.0)(params))
    }
}

/// A response received by a [`Fetch`] transport.
///
/// The head (status and headers) is available immediately, the body is read lazily
/// by the response parser.
#[derive(derive_more::Debug)]
pub struct FetchResponse {
    status: StatusCode,
    headers: HeaderMap,
    #[debug(skip)]
    body: BodyFuture,
}

impl FetchResponse {
    /// Creates a response with the given status, no header and an empty body.
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: Box::pin(async { Ok::<_, ApiClientError>(Bytes::new()) }),
        }
    }

    /// Creates a JSON response with the `application/json` content type.
    ///
    /// # Errors
    ///
    /// Returns an error if the value cannot be serialized.
    pub fn json<T>(status: StatusCode, value: &T) -> Result<Self, ApiClientError>
    where
        T: serde::Serialize + ?Sized,
    {
        let body = serde_json::to_vec(value)?;
        let result = Self::new(status)
            .with_header(
                http::header::CONTENT_TYPE,
                HeaderValue::from_static("application/json"),
            )
            .with_body(body);
        Ok(result)
    }

    /// Adds a header, replacing any previous value.
    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Replaces all headers.
    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    /// Sets an already available body.
    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        let body = body.into();
        self.body = Box::pin(async move { Ok::<_, ApiClientError>(body) });
        self
    }

    /// Sets a body that is read when the response is parsed.
    pub fn with_deferred_body<F>(mut self, body: F) -> Self
    where
        F: Future<Output = Result<Bytes, ApiClientError>> + Send + 'static,
    {
        self.body = Box::pin(body);
        self
    }

    /// Returns the HTTP status.
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Returns `true` for a 2xx status.
    pub fn ok(&self) -> bool {
        self.status.is_success()
    }

    /// Returns the response headers.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Reads the whole body.
    ///
    /// # Errors
    ///
    /// Returns the error reported while reading the body.
    pub async fn bytes(self) -> Result<Bytes, ApiClientError> {
        self.body.await
    }
}

/// A request interceptor.
///
/// Middleware are registered in [`FetchConfig`](crate::FetchConfig), the first one
/// being the outermost. A middleware can rewrite the [`FetchParams`], call the rest of
/// the chain with [`Next::run`], inspect or replace the response, or answer directly.
pub trait Middleware: Send + Sync + 'static {
    /// Handles a request, usually by delegating to `next`.
    fn handle(&self, params: FetchParams, next: Next) -> FetchFuture;
}

/// A [`Middleware`] implementation backed by a closure, see [`middleware_fn`].
#[derive(Clone)]
pub struct MiddlewareFn<F>(F);

impl<F> Debug for MiddlewareFn<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("MiddlewareFn")
    }
}

/// Creates a [`Middleware`] from an async closure.
///
/// # Example
///
/// ```rust
/// use apity_core::middleware_fn;
/// use http::HeaderValue;
///
/// let tracing_header = middleware_fn(|mut params, next| async move {
///     params
///         .init
///         .headers
///         .insert("x-request-source", HeaderValue::from_static("apity"));
///     next.run(params).await
/// });
/// ```
pub fn middleware_fn<F, Fut>(middleware: F) -> MiddlewareFn<F>
where
    F: Fn(FetchParams, Next) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<FetchResponse, ApiClientError>> + Send + 'static,
{
    MiddlewareFn(middleware)
}

impl<F, Fut> Middleware for MiddlewareFn<F>
where
    F: Fn(FetchParams, Next) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<FetchResponse, ApiClientError>> + Send + 'static,
{
    fn handle(&self, params: FetchParams, next: Next) -> FetchFuture {
        Box::pin((self.0)(params, next))
    }
}

/// The remaining middleware chain, ending with the transport.
#[derive(Clone, derive_more::Debug)]
pub struct Next {
    chain: Arc<[Arc<dyn Middleware>]>,
    index: usize,
    #[debug(skip)]
    fetch: Arc<dyn Fetch>,
}

impl Next {
    pub(in crate::client) fn new(fetch: Arc<dyn Fetch>, chain: Arc<[Arc<dyn Middleware>]>) -> Self {
        Self {
            chain,
            index: 0,
            fetch,
        }
    }

    /// Runs the rest of the chain.
    pub fn run(self, params: FetchParams) -> FetchFuture {
        match self.chain.get(self.index).cloned() {
            Some(middleware) => {
                let next = Self {
                    index: self.index + 1,
                    ..self
                };
                middleware.handle(params, next)
            }
            None => self.fetch.fetch(params),
        }
    }
}

impl Debug for dyn Fetch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Fetch")
    }
}

impl Debug for dyn Middleware {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Middleware")
    }
}
