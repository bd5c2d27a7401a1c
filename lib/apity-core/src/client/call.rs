use std::fmt::{Debug, Display};
use std::marker::PhantomData;
use std::sync::Arc;

use http::Method;
use serde::de::DeserializeOwned;
use serde_json::Value;

use super::assemble::RequestDescriptor;
use super::config::SharedConfig;
use super::request::Exchange;
use super::{
    ApiClientError, ApiError, ApiRequest, Fetch, IntoPayload, RequestInit, ResponseStatus,
};

/// The types of one operation: a `(path, method)` pair of the API.
///
/// Use the [`operation!`](crate::operation) macro to declare an operation, or
/// [`Endpoint`] for an ad-hoc one.
pub trait Operation: 'static {
    /// The payload: path placeholders, declared query parameters and body fields.
    type Payload: IntoPayload;
    /// The body of a successful response.
    type Response: DeserializeOwned + Clone + Send + Sync + 'static;
    /// The body of an error response.
    type Error: DeserializeOwned + 'static;
}

/// A generic [`Operation`] described only by its payload, response and error types.
///
/// Two endpoints with the same types share the same [`OperationError`] type: declare a
/// dedicated marker with [`operation!`](crate::operation) when errors must be told apart.
pub struct Endpoint<P = Value, R = Value, E = Value>(PhantomData<fn() -> (P, R, E)>);

impl<P, R, E> Operation for Endpoint<P, R, E>
where
    P: IntoPayload + 'static,
    R: DeserializeOwned + Clone + Send + Sync + 'static,
    E: DeserializeOwned + 'static,
{
    type Payload = P;
    type Response = R;
    type Error = E;
}

/// Per-call overrides of the builder configuration.
#[derive(Debug, Clone, Default)]
pub struct CallOverrides {
    fetch: Option<Arc<dyn Fetch>>,
    init: Option<RequestInit>,
}

impl CallOverrides {
    /// Uses another transport for this call.
    pub fn with_fetch(mut self, fetch: impl Fetch) -> Self {
        self.fetch = Some(Arc::new(fetch));
        self
    }

    /// Merges these transport options over the default ones, see [`RequestInit::merge`].
    pub fn with_init(mut self, init: RequestInit) -> Self {
        self.init = Some(init);
        self
    }
}

/// The typed callable of one operation, created by [`Apity`](crate::Apity).
///
/// # Example
///
/// ```rust,no_run
/// use apity_core::{Apity, operation};
/// use http::Method;
/// # use serde::{Deserialize, Serialize};
/// # #[derive(Serialize)]
/// # struct PetId { id: u64 }
/// # #[derive(Debug, Clone, Deserialize)]
/// # struct Pet { name: String }
/// # #[derive(Debug, Deserialize)]
/// # struct NotFound { message: String }
///
/// operation!(GetPet: PetId => Pet, NotFound);
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let apity = Apity::new();
/// let get_pet = apity.path("/pets/{id}").method(Method::GET).create::<GetPet>();
/// assert_eq!(get_pet.name(), "GET /pets/{id}");
///
/// match get_pet.send(PetId { id: 1 }).await {
///     Ok(pet) => println!("{pet:?}"),
///     Err(error) => {
///         let error = error.into_operation_error()?;
///         println!("{:?}", error.actual_type()?.data);
///     }
/// }
/// # Ok(())
/// # }
/// ```
pub struct TypedCall<Op> {
    name: Arc<str>,
    path: Arc<str>,
    method: Method,
    query_params: Arc<[String]>,
    config: SharedConfig,
    fetch: Arc<dyn Fetch>,
    marker: PhantomData<fn() -> Op>,
}

impl<Op> TypedCall<Op>
where
    Op: Operation,
{
    pub(in crate::client) fn new(
        path: &str,
        method: Method,
        query_params: Vec<String>,
        config: SharedConfig,
        fetch: Arc<dyn Fetch>,
    ) -> Self {
        let name = format!("{} {path}", method.as_str().to_uppercase());
        Self {
            name: Arc::from(name),
            path: Arc::from(path),
            method,
            query_params: Arc::from(query_params),
            config,
            fetch,
            marker: PhantomData,
        }
    }

    /// Returns the display name, `"<METHOD> <path>"`.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Starts a request with the builder configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the request cannot be assembled (malformed payload,
    /// unresolved path, invalid URL) or if no tokio runtime is running.
    pub fn call(&self, payload: Op::Payload) -> Result<ApiRequest<Op::Response>, CallError<Op>> {
        self.call_with(payload, CallOverrides::default())
    }

    /// Starts a request with per-call overrides.
    ///
    /// # Errors
    ///
    /// See [`call`](Self::call).
    pub fn call_with(
        &self,
        payload: Op::Payload,
        overrides: CallOverrides,
    ) -> Result<ApiRequest<Op::Response>, CallError<Op>> {
        self.invoke(payload, overrides)
            .map_err(|error| self.narrow(error))
    }

    /// Sends a request and waits for its response data.
    ///
    /// # Errors
    ///
    /// Besides the [`call`](Self::call) errors, a response that is not ok is returned as
    /// an [`OperationError`] of this operation.
    pub async fn send(&self, payload: Op::Payload) -> Result<Option<Op::Response>, CallError<Op>> {
        self.send_with(payload, CallOverrides::default()).await
    }

    /// Sends a request with per-call overrides and waits for its response data.
    ///
    /// # Errors
    ///
    /// See [`send`](Self::send).
    pub async fn send_with(
        &self,
        payload: Op::Payload,
        overrides: CallOverrides,
    ) -> Result<Option<Op::Response>, CallError<Op>> {
        let request = self.call_with(payload, overrides)?;
        let response = request.on_data().await;
        response
            .into_result()
            .map_err(|error| self.narrow(ApiClientError::Api(error)))
    }

    /// Wraps a generic API error into the error type of this operation.
    pub fn error(&self, error: ApiError) -> OperationError<Op> {
        OperationError {
            operation: Arc::clone(&self.name),
            error,
            marker: PhantomData,
        }
    }

    fn invoke(
        &self,
        payload: Op::Payload,
        overrides: CallOverrides,
    ) -> Result<ApiRequest<Op::Response>, ApiClientError> {
        let config = self.config.snapshot();
        let CallOverrides { fetch, init } = overrides;

        let descriptor = RequestDescriptor {
            base_url: config.base_url,
            path: self.path.to_string(),
            method: self.method.clone(),
            query_params: self.query_params.to_vec(),
            payload: payload.into_payload()?,
            init: config.init.merge(init.as_ref()),
        };
        let params = descriptor.assemble()?;

        let fetch = fetch.unwrap_or_else(|| Arc::clone(&self.fetch));
        let exchange = Exchange::new(params, fetch, Arc::from(config.middleware));
        ApiRequest::start(exchange)
    }

    fn narrow(&self, error: ApiClientError) -> CallError<Op> {
        match error {
            ApiClientError::Api(error) => CallError::Operation(self.error(error)),
            error => CallError::Client(error),
        }
    }
}

impl<Op> Clone for TypedCall<Op> {
    fn clone(&self) -> Self {
        Self {
            name: Arc::clone(&self.name),
            path: Arc::clone(&self.path),
            method: self.method.clone(),
            query_params: Arc::clone(&self.query_params),
            config: self.config.clone(),
            fetch: Arc::clone(&self.fetch),
            marker: PhantomData,
        }
    }
}

impl<Op> Debug for TypedCall<Op> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TypedCall")
            .field("name", &self.name)
            .field("query_params", &self.query_params)
            .finish_non_exhaustive()
    }
}

/// The decoded error response of an operation, see [`OperationError::actual_type`].
#[derive(Debug, Clone, PartialEq)]
pub struct ErrorResponse<E> {
    /// The response status, possibly a sentinel status.
    pub status: ResponseStatus,
    /// The decoded error body.
    pub data: Option<E>,
}

/// An [`ApiError`] raised by the typed call of the operation `Op`.
///
/// Each operation has its own error type, an error of one operation never matches the
/// error type of another one.
pub struct OperationError<Op> {
    operation: Arc<str>,
    error: ApiError,
    marker: PhantomData<fn() -> Op>,
}

impl<Op> OperationError<Op> {
    /// Returns the name of the typed call that raised the error.
    pub fn operation(&self) -> &str {
        &self.operation
    }

    /// Returns the generic API error.
    pub fn api_error(&self) -> &ApiError {
        &self.error
    }

    /// Returns the response status.
    pub fn status(&self) -> ResponseStatus {
        self.error.status()
    }

    /// Converts into the generic API error.
    pub fn into_api_error(self) -> ApiError {
        self.error
    }
}

impl<Op> OperationError<Op>
where
    Op: Operation,
{
    /// Returns the status and the error body decoded as the operation error type.
    ///
    /// # Errors
    ///
    /// Returns an error if the body does not match the operation error type.
    pub fn actual_type(&self) -> Result<ErrorResponse<Op::Error>, ApiClientError> {
        let data = self
            .error
            .data()
            .map(|body| body.decode::<Op::Error>())
            .transpose()?;
        Ok(ErrorResponse {
            status: self.error.status(),
            data,
        })
    }
}

impl<Op> Clone for OperationError<Op> {
    fn clone(&self) -> Self {
        Self {
            operation: Arc::clone(&self.operation),
            error: self.error.clone(),
            marker: PhantomData,
        }
    }
}

impl<Op> Debug for OperationError<Op> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OperationError")
            .field("operation", &self.operation)
            .field("error", &self.error)
            .finish()
    }
}

impl<Op> Display for OperationError<Op> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.operation, self.error)
    }
}

impl<Op> std::error::Error for OperationError<Op>
where
    Op: 'static,
{
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}

/// The error of a typed call.
pub enum CallError<Op> {
    /// The server answered with a failure.
    Operation(OperationError<Op>),
    /// Any other error: the request could not be built or started.
    Client(ApiClientError),
}

impl<Op> CallError<Op> {
    /// Returns the operation error, if any.
    pub fn operation_error(&self) -> Option<&OperationError<Op>> {
        match self {
            Self::Operation(error) => Some(error),
            Self::Client(_) => None,
        }
    }

    /// Converts into the operation error.
    ///
    /// # Errors
    ///
    /// Returns the client error when it is not an operation error.
    pub fn into_operation_error(self) -> Result<OperationError<Op>, ApiClientError> {
        match self {
            Self::Operation(error) => Ok(error),
            Self::Client(error) => Err(error),
        }
    }
}

impl<Op> From<OperationError<Op>> for CallError<Op> {
    fn from(value: OperationError<Op>) -> Self {
        Self::Operation(value)
    }
}

impl<Op> Debug for CallError<Op> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Operation(error) => f.debug_tuple("Operation").field(error).finish(),
            Self::Client(error) => f.debug_tuple("Client").field(error).finish(),
        }
    }
}

impl<Op> Display for CallError<Op> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Operation(error) => Display::fmt(error, f),
            Self::Client(error) => Display::fmt(error, f),
        }
    }
}

impl<Op> std::error::Error for CallError<Op>
where
    Op: 'static,
{
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Operation(error) => Some(error),
            Self::Client(error) => Some(error),
        }
    }
}
