use bytes::Bytes;
use headers::{ContentType, HeaderMapExt};
use http::header::ACCEPT;
use http::{HeaderValue, Method};
use serde_json::Value;
use tracing::debug;
use url::Url;

use super::path::resolve_path;
use super::query::build_query;
use super::{ApiClientError, Payload, RequestInit};

/// The fully assembled request handed to a [`Fetch`](crate::Fetch) transport.
#[derive(Debug, Clone)]
pub struct FetchParams {
    /// The absolute request URL, query string included.
    pub url: Url,
    /// The transport options, with the method, headers and body set.
    pub init: RequestInit,
}

/// Everything needed to assemble one request, built fresh for each invocation.
#[derive(Debug, Clone)]
pub(in crate::client) struct RequestDescriptor {
    pub(in crate::client) base_url: String,
    pub(in crate::client) path: String,
    pub(in crate::client) method: Method,
    pub(in crate::client) query_params: Vec<String>,
    pub(in crate::client) payload: Payload,
    /// The default init already merged with the per-call override.
    pub(in crate::client) init: RequestInit,
}

impl RequestDescriptor {
    /// Splits the payload into path, query and body, and builds the transport parameters.
    pub(in crate::client) fn assemble(self) -> Result<FetchParams, ApiClientError> {
        let Self {
            base_url,
            path,
            method,
            query_params,
            payload,
            mut init,
        } = self;

        let (mut fields, array_body) = payload.into_parts();
        let path = resolve_path(&path, &mut fields)?;
        let query = build_query(&query_params, &mut fields)?;
        let url = build_url(&base_url, &path, &query)?;

        let body = if has_body(&method) {
            match array_body {
                Some(items) => Some(serde_json::to_vec(&Value::Array(items))?),
                None if fields.is_empty() => None,
                None => Some(serde_json::to_vec(&Value::Object(fields))?),
            }
        } else {
            None
        };

        if let Some(body) = body {
            init.headers.typed_insert(ContentType::json());
            init.body = Some(Bytes::from(body));
        }
        if !init.headers.contains_key(ACCEPT) {
            init.headers
                .insert(ACCEPT, HeaderValue::from_static("application/json"));
        }
        init.method = Some(method);

        debug!(%url, method = ?init.method, has_body = init.body.is_some(), "request assembled");
        Ok(FetchParams { url, init })
    }
}

fn has_body(method: &Method) -> bool {
    matches!(
        *method,
        Method::POST | Method::PUT | Method::PATCH | Method::DELETE
    )
}

fn build_url(base_url: &str, path: &str, query: &str) -> Result<Url, ApiClientError> {
    let url = format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        path.trim_start_matches('/')
    );
    let mut url = url.parse::<Url>()?;

    if !query.is_empty() {
        url.set_query(Some(query));
    }

    Ok(url)
}

#[cfg(test)]
mod tests {
    use http::header::{AUTHORIZATION, CONTENT_TYPE};
    use rstest::rstest;
    use serde_json::json;

    use super::*;
    use crate::IntoPayload;
    use crate::client::payload::array_request_body;

    fn descriptor(
        method: Method,
        path: &str,
        query: &[&str],
        payload: Payload,
    ) -> RequestDescriptor {
        RequestDescriptor {
            base_url: "http://localhost:3000/api/".to_string(),
            path: path.to_string(),
            method,
            query_params: query.iter().map(ToString::to_string).collect(),
            payload,
            init: RequestInit::default(),
        }
    }

    fn body_json(params: &FetchParams) -> Option<Value> {
        params
            .init
            .body
            .as_ref()
            .map(|body| serde_json::from_slice(body).expect("json body"))
    }

    #[test]
    fn test_path_and_query() {
        let payload = json!({"a": 1, "b": "/", "scalar": "a", "list": ["b", "c"], "ignored": 2})
            .into_payload()
            .expect("payload");

        let params = descriptor(Method::GET, "/query/{a}/{b}", &["scalar", "list"], payload)
            .assemble()
            .expect("should assemble");

        insta::assert_snapshot!(
            params.url,
            @"http://localhost:3000/api/query/1/%2F?scalar=a&list=b&list=c"
        );
        assert_eq!(params.init.method, Some(Method::GET));
        assert!(params.init.body.is_none());
        assert!(params.init.headers.get(CONTENT_TYPE).is_none());
    }

    #[test]
    fn test_remaining_fields_are_the_body() {
        let payload = json!({"id": 1, "list": ["b", "c"]})
            .into_payload()
            .expect("payload");

        let params = descriptor(Method::POST, "/body/{id}", &[], payload)
            .assemble()
            .expect("should assemble");

        assert_eq!(params.url.as_str(), "http://localhost:3000/api/body/1");
        assert_eq!(params.url.query(), None);
        assert_eq!(body_json(&params), Some(json!({"list": ["b", "c"]})));
        assert_eq!(
            params.init.headers.get(CONTENT_TYPE),
            Some(&HeaderValue::from_static("application/json"))
        );
    }

    #[test]
    fn test_query_fields_are_not_in_body() {
        let payload = json!({"id": 1, "list": ["b", "c"], "scalar": "a"})
            .into_payload()
            .expect("payload");

        let params = descriptor(Method::PUT, "/bodyquery/{id}", &["scalar"], payload)
            .assemble()
            .expect("should assemble");

        assert_eq!(params.url.query(), Some("scalar=a"));
        assert_eq!(body_json(&params), Some(json!({"list": ["b", "c"]})));
    }

    #[test]
    fn test_array_body() {
        let payload = array_request_body(["b", "c"], json!({"id": 1, "scalar": "a"}))
            .into_payload()
            .expect("payload");

        let params = descriptor(Method::PATCH, "/bodyarray/{id}", &["scalar"], payload)
            .assemble()
            .expect("should assemble");

        assert_eq!(params.url.as_str(), "http://localhost:3000/api/bodyarray/1?scalar=a");
        assert_eq!(body_json(&params), Some(json!(["b", "c"])));
    }

    #[test]
    fn test_empty_array_body_is_sent() {
        let payload = Vec::<u32>::new().into_payload().expect("payload");

        let params = descriptor(Method::POST, "/bodyarray", &[], payload)
            .assemble()
            .expect("should assemble");

        assert_eq!(body_json(&params), Some(json!([])));
    }

    #[rstest]
    #[case::post(Method::POST)]
    #[case::put(Method::PUT)]
    #[case::patch(Method::PATCH)]
    #[case::delete(Method::DELETE)]
    fn test_no_remaining_field_no_body(#[case] method: Method) {
        let payload = json!({"id": 1}).into_payload().expect("payload");

        let params = descriptor(method, "/body/{id}", &[], payload)
            .assemble()
            .expect("should assemble");

        assert!(params.init.body.is_none());
        assert!(params.init.headers.get(CONTENT_TYPE).is_none());
    }

    #[rstest]
    #[case::get(Method::GET)]
    #[case::head(Method::HEAD)]
    #[case::options(Method::OPTIONS)]
    fn test_methods_without_body(#[case] method: Method) {
        let payload = json!({"list": ["b"]}).into_payload().expect("payload");

        let params = descriptor(method, "/items", &[], payload)
            .assemble()
            .expect("should assemble");

        assert!(params.init.body.is_none());
    }

    #[test]
    fn test_accept_header() {
        let params = descriptor(Method::GET, "/items", &[], Payload::default())
            .assemble()
            .expect("should assemble");

        assert_eq!(
            params.init.headers.get(ACCEPT),
            Some(&HeaderValue::from_static("application/json"))
        );
    }

    #[test]
    fn test_init_headers_are_kept() {
        let mut descriptor = descriptor(Method::GET, "/items", &[], Payload::default());
        descriptor.init = RequestInit::new()
            .with_header(AUTHORIZATION, "Bearer token")
            .expect("valid header")
            .with_header(ACCEPT, "text/plain")
            .expect("valid header");

        let params = descriptor.assemble().expect("should assemble");

        assert_eq!(
            params.init.headers.get(AUTHORIZATION),
            Some(&HeaderValue::from_static("Bearer token"))
        );
        assert_eq!(
            params.init.headers.get(ACCEPT),
            Some(&HeaderValue::from_static("text/plain"))
        );
    }

    #[rstest]
    #[case::plain("http://localhost", "users", "http://localhost/users")]
    #[case::trailing_slash("http://localhost/", "/users", "http://localhost/users")]
    #[case::base_path("http://localhost/v1", "/users", "http://localhost/v1/users")]
    fn test_build_url(#[case] base: &str, #[case] path: &str, #[case] expected: &str) {
        let url = build_url(base, path, "").expect("valid url");

        assert_eq!(url.as_str(), expected);
    }

    #[test]
    fn test_relative_base_url_is_rejected() {
        let result = build_url("", "/users", "");

        assert!(matches!(result, Err(ApiClientError::UrlError(_))));
    }

    #[test]
    fn test_missing_path_field() {
        let result = descriptor(Method::GET, "/users/{id}", &[], Payload::default()).assemble();

        assert!(matches!(
            result,
            Err(ApiClientError::PathUnresolved { .. })
        ));
    }
}
