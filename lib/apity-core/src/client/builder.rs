use std::sync::Arc;

use http::Method;

use super::call::{Operation, TypedCall};
use super::config::SharedConfig;
use super::Fetch;

/// Second step of the typed call creation, see [`Apity::path`](crate::Apity::path).
#[derive(Debug, Clone)]
pub struct PathBuilder {
    path: String,
    config: SharedConfig,
    fetch: Arc<dyn Fetch>,
}

impl PathBuilder {
    pub(in crate::client) fn new(
        path: String,
        config: SharedConfig,
        fetch: Arc<dyn Fetch>,
    ) -> Self {
        Self {
            path,
            config,
            fetch,
        }
    }

    /// Selects the HTTP method of the operation.
    pub fn method(self, method: Method) -> MethodBuilder {
        let Self {
            path,
            config,
            fetch,
        } = self;
        MethodBuilder {
            path,
            method,
            config,
            fetch,
        }
    }
}

/// Last step of the typed call creation, binding the operation types.
#[derive(Debug, Clone)]
pub struct MethodBuilder {
    path: String,
    method: Method,
    config: SharedConfig,
    fetch: Arc<dyn Fetch>,
}

impl MethodBuilder {
    /// Creates a typed call without query parameters.
    pub fn create<Op>(self) -> TypedCall<Op>
    where
        Op: Operation,
    {
        self.create_with_query(Vec::<String>::new())
    }

    /// Creates a typed call sending the named payload fields as query parameters.
    ///
    /// The query string follows the order of `names`, payload fields not listed here
    /// are never sent in the query.
    pub fn create_with_query<Op>(
        self,
        names: impl IntoIterator<Item = impl Into<String>>,
    ) -> TypedCall<Op>
    where
        Op: Operation,
    {
        let query_params = names.into_iter().map(Into::into).collect();
        TypedCall::new(&self.path, self.method, query_params, self.config, self.fetch)
    }
}
