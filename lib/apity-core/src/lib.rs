//! # Apity Core
//!
//! Strongly-typed HTTP calls with reactive request handles for statically known APIs.
//!
//! Each operation of an API (a `(path, method)` pair) is described by a type implementing
//! [`Operation`]: its payload, its success response and its error body. An [`Apity`]
//! builder turns it into a [`TypedCall`] that:
//!
//! - splits a single payload object into path placeholders, query parameters and JSON body
//! - sends the request through a pluggable [`Fetch`] transport (a [`reqwest::Client`] by
//!   default) and an optional [`Middleware`] chain
//! - normalizes every outcome into an [`ApiResponse`], using the `-1` / `-2` sentinel
//!   statuses for transport and parse failures
//! - wraps each invocation into a reactive [`ApiRequest`] that can be observed and reloaded
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use apity_core::{Apity, FetchConfig, RequestInit, operation};
//! use http::Method;
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Serialize)]
//! struct FindPets {
//!     tags: Vec<String>,
//!     limit: u32,
//! }
//!
//! #[derive(Debug, Clone, Deserialize)]
//! struct Pet {
//!     id: u64,
//!     name: String,
//! }
//!
//! #[derive(Debug, Deserialize)]
//! struct Problem {
//!     message: String,
//! }
//!
//! operation!(
//!     /// `GET /pets`
//!     ListPets: FindPets => Vec<Pet>, Problem
//! );
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let apity = Apity::new();
//! apity.configure(
//!     FetchConfig::default()
//!         .with_base_url("https://petstore.example.com/api")
//!         .with_init(RequestInit::new().with_header("Authorization", "Bearer token")?),
//! );
//!
//! let list_pets = apity
//!     .path("/pets")
//!     .method(Method::GET)
//!     .create_with_query::<ListPets>(["tags", "limit"]);
//!
//! // Reactive handle: the request is already in flight
//! let request = list_pets.call(FindPets { tags: vec!["dog".to_string()], limit: 10 })?;
//! let response = request.on_data().await;
//! println!("{} -> {:?}", response.status(), response.data());
//!
//! // Send the same request again
//! let reloaded = request.reload().await;
//! println!("reloaded: {}", reloaded.status());
//!
//! // Or simply wait for the data, errors being typed per operation
//! match list_pets.send(FindPets { tags: vec![], limit: 1 }).await {
//!     Ok(pets) => println!("{pets:?}"),
//!     Err(error) => {
//!         let error = error.into_operation_error()?;
//!         println!("{} failed: {:?}", error.operation(), error.actual_type()?.data);
//!     }
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Payload
//!
//! The payload of a call is serialized into a JSON object:
//!
//! - the fields named by the `{placeholder}`s of the path are substituted, URI-encoded
//! - the fields declared with [`MethodBuilder::create_with_query`] are sent in the query
//!   string, arrays as repeated pairs
//! - for `POST`, `PUT`, `PATCH` and `DELETE`, the remaining fields are the JSON body
//!
//! Use [`array_request_body`] to send a JSON array as body.

mod client;

pub use self::client::{
    ApiClientError, ApiError, ApiRequest, ApiResponse, Apity, ArrayRequestBody, Body,
    CallError, CallOverrides, Endpoint, ErrorResponse, Fetch, FetchConfig, FetchFn,
    FetchFuture, FetchParams, FetchResponse, IntoPayload, MethodBuilder, Middleware,
    MiddlewareFn, Next, Operation, OperationError, PathBuilder, Payload, RequestInit,
    ResponseStatus, STATUS_PARSE_FAILURE, STATUS_TRANSPORT_FAILURE, Settlement, TypedCall,
    array_request_body, fetch_fn, middleware_fn,
};

#[doc(hidden)]
pub mod __private {
    pub use serde_json::Value;
}

/// Declares an operation marker type and its [`Operation`] implementation.
///
/// # Syntax
///
/// - `operation!(Name: Payload => Response, Error)`
/// - `operation!(Name: Payload => Response)`: the error body is kept as a
///   [`serde_json::Value`]
///
/// Attributes (including doc comments) and a visibility can prefix the name.
///
/// # Examples
///
/// ```rust
/// use std::any::TypeId;
///
/// use apity_core::{Operation, operation};
/// use serde_json::Value;
///
/// operation!(
///     /// `DELETE /pets/{id}`
///     pub DeletePet: Value => ()
/// );
/// operation!(GetPet: Value => Value, String);
///
/// fn error_type<Op: Operation>() -> TypeId {
///     TypeId::of::<Op::Error>()
/// }
/// assert_eq!(error_type::<DeletePet>(), TypeId::of::<Value>());
/// assert_eq!(error_type::<GetPet>(), TypeId::of::<String>());
/// ```
#[macro_export]
macro_rules! operation {
    ($(#[$meta:meta])* $vis:vis $name:ident : $payload:ty => $response:ty, $error:ty $(,)?) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        $vis struct $name;

        impl $crate::Operation for $name {
            type Payload = $payload;
            type Response = $response;
            type Error = $error;
        }
    };

    ($(#[$meta:meta])* $vis:vis $name:ident : $payload:ty => $response:ty $(,)?) => {
        $crate::operation!(
            $(#[$meta])* $vis $name: $payload => $response, $crate::__private::Value
        );
    };
}
