use axum::{
    extract::Request,
    http::{header::HeaderName, HeaderValue},
    middleware::Next,
    response::Response,
};

use crate::tracing::RequestId;

/// Header carrying the request id on both requests and responses.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Assigns a request id to every request.
///
/// A client-supplied `x-request-id` is kept so ids stay stable across service
/// hops; otherwise a fresh UUID is generated. The id is stored in request
/// extensions, scoped into the task-local used by error responses, and echoed
/// back on the response.
pub async fn request_id_middleware(mut request: Request, next: Next) -> Response {
    let request_id = request
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .map(RequestId::new)
        .unwrap_or_default();

    // to_str() above only accepts visible ASCII, and generated ids are UUIDs,
    // so building the header value back cannot fail.
    let header_value = HeaderValue::from_str(request_id.as_str())
        .unwrap_or_else(|_| HeaderValue::from_static("invalid"));

    request.extensions_mut().insert(request_id.clone());

    let mut response = crate::tracing::scope_request_id(request_id, async move {
        next.run(request).await
    })
    .await;

    response
        .headers_mut()
        .insert(HeaderName::from_static(REQUEST_ID_HEADER), header_value);
    response
}
