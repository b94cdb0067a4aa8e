//! Response envelope middleware.
//!
//! # Responsibilities
//! - Rewrite plain-text 408/413 answers from the timeout and body-limit
//!   layers into the JSON error body
//! - Count every response in `records_requests_total`
//!
//! Sits outside the timeout and body-limit layers, so it observes what they
//! produce as well as handler responses.

use std::time::Instant;

use axum::{
    extract::Request,
    http::{header, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::http::response::ApiError;
use crate::observability::metrics;

pub async fn error_envelope(request: Request, next: Next) -> Response {
    let start_time = Instant::now();
    let method = request.method().clone();

    let response = envelope_layer_errors(next.run(request).await);

    metrics::record_request(method.as_str(), response.status().as_u16(), start_time);
    response
}

fn envelope_layer_errors(response: Response) -> Response {
    let reason = match response.status() {
        StatusCode::REQUEST_TIMEOUT => "request did not complete in time",
        StatusCode::PAYLOAD_TOO_LARGE => "request body exceeds the configured limit",
        _ => return response,
    };
    if is_json(&response) {
        return response;
    }
    ApiError::from_status(response.status(), reason).into_response()
}

fn is_json(response: &Response) -> bool {
    response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("application/json"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;

    #[test]
    fn test_plain_timeout_gets_json_body() {
        let plain = Response::builder()
            .status(StatusCode::REQUEST_TIMEOUT)
            .body(Body::empty())
            .unwrap();

        let response = envelope_layer_errors(plain);
        assert_eq!(response.status(), StatusCode::REQUEST_TIMEOUT);
        assert!(is_json(&response));
    }

    #[test]
    fn test_other_responses_untouched() {
        let ok = Response::builder()
            .status(StatusCode::OK)
            .header(header::CONTENT_TYPE, "text/plain")
            .body(Body::from("OK"))
            .unwrap();

        let response = envelope_layer_errors(ok);
        assert!(!is_json(&response));
    }
}
