use axum::{
    body::Body,
    http::{HeaderName, HeaderValue, Request},
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

pub const REQUEST_ID_HEADER: HeaderName = HeaderName::from_static("x-request-id");

/// Request id carried in request extensions for span construction.
#[derive(Debug, Clone)]
pub struct RequestId(pub HeaderValue);

// Ensures each request has an X-Request-Id and mirrors it on the response
pub async fn request_id(mut req: Request<Body>, next: Next) -> Response {
    // Preserve a client-supplied id; otherwise mint one
    let req_id_value = match req.headers().get(&REQUEST_ID_HEADER) {
        Some(value) => value.clone(),
        None => mint_request_id(),
    };

    req.extensions_mut().insert(RequestId(req_id_value.clone()));

    let mut res = next.run(req).await;
    res.headers_mut().insert(REQUEST_ID_HEADER, req_id_value);
    res
}

fn mint_request_id() -> HeaderValue {
    HeaderValue::from_str(&Uuid::new_v4().to_string())
        .unwrap_or_else(|_| HeaderValue::from_static("unknown"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minted_ids_are_uuids() {
        let value = mint_request_id();
        let text = value.to_str().unwrap();
        assert!(Uuid::parse_str(text).is_ok());
    }
}
