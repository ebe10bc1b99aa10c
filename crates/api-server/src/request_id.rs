//! Per-request correlation ids for chat and data calls.

use axum::{
    extract::Request,
    http::{HeaderMap, HeaderValue},
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

const REQUEST_ID_HEADER: &str = "x-request-id";

/// Longest caller-supplied id that is echoed back as-is.
const MAX_REQUEST_ID_LEN: usize = 64;

/// Request id carried in request extensions.
#[derive(Clone, Debug)]
pub struct RequestId(pub String);

/// Caller-supplied id when it is short and made of `[A-Za-z0-9_-]`,
/// otherwise a fresh UUID v4.
pub fn resolve_request_id(headers: &HeaderMap) -> String {
    headers
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|s| !s.is_empty() && s.len() <= MAX_REQUEST_ID_LEN)
        .filter(|s| s.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'))
        .map(|s| s.to_string())
        .unwrap_or_else(|| Uuid::new_v4().to_string())
}

/// Record the resolved id on the current span, hand it to handlers and echo
/// it on the response.
pub async fn request_id_middleware(headers: HeaderMap, mut request: Request, next: Next) -> Response {
    let id = resolve_request_id(&headers);

    tracing::Span::current().record("request_id", id.as_str());
    request.extensions_mut().insert(RequestId(id.clone()));

    let mut response = next.run(request).await;
    if let Ok(val) = HeaderValue::from_str(&id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, val);
    }

    response
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(id: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(REQUEST_ID_HEADER, HeaderValue::from_str(id).unwrap());
        headers
    }

    #[test]
    fn test_resolve_keeps_well_formed_id() {
        assert_eq!(resolve_request_id(&headers(" chat_42-a ")), "chat_42-a");
    }

    #[test]
    fn test_resolve_replaces_unusable_id() {
        let too_long = "a".repeat(MAX_REQUEST_ID_LEN + 1);
        for bad in ["", "has space", "semi;colon", too_long.as_str()] {
            let id = resolve_request_id(&headers(bad));
            assert_ne!(id, bad);
            assert!(Uuid::parse_str(&id).is_ok(), "id {:?}", id);
        }
        assert!(Uuid::parse_str(&resolve_request_id(&HeaderMap::new())).is_ok());
    }
}
