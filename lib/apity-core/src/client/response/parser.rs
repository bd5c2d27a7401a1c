use headers::{ContentType, HeaderMapExt};
use http::{HeaderMap, StatusCode};
use tracing::warn;

use super::{ApiResponse, Body, ResponseStatus};
use crate::client::FetchResponse;

/// How a response body is read, decided by its content type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BodyKind {
    Json,
    Text,
    Binary,
    /// No usable content type: read as text, then try JSON.
    Sniff,
}

impl BodyKind {
    fn of(headers: &HeaderMap) -> Self {
        let Some(content_type) = headers.typed_get::<ContentType>() else {
            return Self::Sniff;
        };
        let mime = mime::Mime::from(content_type);

        if mime.subtype() == mime::JSON || mime.suffix() == Some(mime::JSON) {
            Self::Json
        } else if mime.essence_str().contains("text") {
            Self::Text
        } else {
            Self::Binary
        }
    }
}

/// Reads and parses the body of a transport response.
///
/// Never fails: an unreadable or malformed body becomes a parse failure (`-2`).
pub(in crate::client) async fn parse_response(response: FetchResponse) -> ApiResponse<Body> {
    let status = response.status();
    if status == StatusCode::NO_CONTENT {
        return settle(status, None);
    }

    let kind = BodyKind::of(response.headers());
    let bytes = match response.bytes().await {
        Ok(bytes) => bytes,
        Err(error) => {
            warn!(%status, %error, "failed to read response body");
            return ApiResponse::parse_failure();
        }
    };

    let body = match kind {
        BodyKind::Json => match serde_json::from_slice(&bytes) {
            Ok(value) => Some(Body::Json(value)),
            Err(error) => {
                warn!(%status, %error, "failed to parse JSON response body");
                return ApiResponse::parse_failure();
            }
        },
        _ if bytes.is_empty() => None,
        BodyKind::Text => Some(Body::Text(String::from_utf8_lossy(&bytes).into_owned())),
        BodyKind::Binary => Some(Body::Bytes(bytes)),
        BodyKind::Sniff => {
            let text = String::from_utf8_lossy(&bytes).into_owned();
            match serde_json::from_str(&text) {
                Ok(value) => Some(Body::Json(value)),
                Err(_) => Some(Body::Text(text)),
            }
        }
    };

    settle(status, body)
}

fn settle(status: StatusCode, data: Option<Body>) -> ApiResponse<Body> {
    if status.is_success() {
        ApiResponse::Success { status, data }
    } else {
        ApiResponse::Failure {
            status: ResponseStatus::Http(status),
            data,
        }
    }
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;
    use http::HeaderValue;
    use http::header::CONTENT_TYPE;
    use rstest::rstest;

    use super::*;
    use crate::client::ApiClientError;

    fn response(
        status: StatusCode,
        content_type: Option<&'static str>,
        body: &[u8],
    ) -> FetchResponse {
        let response = FetchResponse::new(status).with_body(Bytes::copy_from_slice(body));
        match content_type {
            Some(content_type) => {
                response.with_header(CONTENT_TYPE, HeaderValue::from_static(content_type))
            }
            None => response,
        }
    }

    #[rstest]
    #[case::json("application/json", BodyKind::Json)]
    #[case::json_charset("application/json; charset=utf-8", BodyKind::Json)]
    #[case::problem_json("application/problem+json", BodyKind::Json)]
    #[case::plain_text("text/plain", BodyKind::Text)]
    #[case::html("text/html; charset=utf-8", BodyKind::Text)]
    #[case::octet_stream("application/octet-stream", BodyKind::Binary)]
    #[case::image("image/png", BodyKind::Binary)]
    #[case::unparsable("garbage", BodyKind::Sniff)]
    fn test_body_kind_from_content_type(
        #[case] content_type: &'static str,
        #[case] expected: BodyKind,
    ) {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static(content_type));

        assert_eq!(BodyKind::of(&headers), expected);
    }

    #[test]
    fn test_body_kind_without_content_type() {
        assert_eq!(BodyKind::of(&HeaderMap::new()), BodyKind::Sniff);
    }

    #[tokio::test]
    async fn test_no_content_ignores_content_type() {
        let response = response(StatusCode::NO_CONTENT, Some("application/json"), b"not json");

        let result = parse_response(response).await;

        assert!(result.ok());
        assert_eq!(result.status(), 204);
        assert_eq!(result.data(), None);
    }

    #[tokio::test]
    async fn test_json_body() {
        let response = response(StatusCode::OK, Some("application/json"), br#"{"id":1}"#);

        let result = parse_response(response).await;

        assert_eq!(
            result.data(),
            Some(&Body::Json(serde_json::json!({"id": 1})))
        );
    }

    #[tokio::test]
    async fn test_malformed_json_is_parse_failure() {
        let response = response(StatusCode::OK, Some("application/json"), b"{oops");

        let result = parse_response(response).await;

        assert!(!result.ok());
        assert_eq!(result.status(), -2);
        assert!(result.error_data().is_none());
    }

    #[tokio::test]
    async fn test_text_body() {
        let response = response(StatusCode::OK, Some("text/plain"), b"{\"looks\": \"like json\"}");

        let result = parse_response(response).await;

        assert_eq!(
            result.data(),
            Some(&Body::Text("{\"looks\": \"like json\"}".to_string()))
        );
    }

    #[tokio::test]
    async fn test_binary_body() {
        let response = response(StatusCode::OK, Some("application/octet-stream"), &[0xFF, 0xFE]);

        let result = parse_response(response).await;

        assert_eq!(
            result.data(),
            Some(&Body::Bytes(Bytes::from_static(&[0xFF, 0xFE])))
        );
    }

    #[tokio::test]
    async fn test_sniff_json_without_content_type() {
        let response = response(StatusCode::OK, None, b"[1,2,3]");

        let result = parse_response(response).await;

        assert_eq!(
            result.data(),
            Some(&Body::Json(serde_json::json!([1, 2, 3])))
        );
    }

    #[rstest]
    #[case::json(b"{\"id\":1}", Body::Json(serde_json::json!({"id": 1})))]
    #[case::text(b"plain words", Body::Text("plain words".to_string()))]
    #[tokio::test]
    async fn test_sniff_with_unparsable_content_type(
        #[case] body: &'static [u8],
        #[case] expected: Body,
    ) {
        let response = response(StatusCode::OK, Some("garbage"), body);

        let result = parse_response(response).await;

        assert!(result.ok());
        assert_eq!(result.data(), Some(&expected));
    }

    #[tokio::test]
    async fn test_sniff_keeps_raw_text() {
        let response = response(StatusCode::OK, None, b"plain words");

        let result = parse_response(response).await;

        assert_eq!(result.data(), Some(&Body::Text("plain words".to_string())));
    }

    #[tokio::test]
    async fn test_http_error_keeps_status_and_body() {
        let response = response(
            StatusCode::NOT_FOUND,
            Some("application/json"),
            br#"{"message":"not found"}"#,
        );

        let result = parse_response(response).await;

        assert!(!result.ok());
        assert_eq!(result.status(), 404);
        assert_eq!(
            result.error_data(),
            Some(&Body::Json(serde_json::json!({"message": "not found"})))
        );
    }

    #[tokio::test]
    async fn test_body_read_failure_is_parse_failure() {
        let response = FetchResponse::new(StatusCode::OK).with_deferred_body(async {
            Err::<Bytes, _>(ApiClientError::Transport {
                message: "connection reset".to_string(),
            })
        });

        let result = parse_response(response).await;

        assert_eq!(result.status(), -2);
    }
}
