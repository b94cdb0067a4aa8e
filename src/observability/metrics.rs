//! Metrics collection and exposition.
//!
//! # Metrics
//! - `records_requests_total` (counter): requests by method, status
//! - `records_request_duration_seconds` (histogram): latency distribution
//! - `records_normalize_errors_total` (counter): malformed requests by field
//!
//! Recording is a no-op until [`init_metrics`] installs the exporter.

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Install the Prometheus recorder and its scrape listener on `addr`.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics exporter listening");
    Ok(())
}

/// Record a completed records request.
pub fn record_request(method: &str, status: u16, start: Instant) {
    metrics::counter!(
        "records_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    metrics::histogram!("records_request_duration_seconds").record(start.elapsed().as_secs_f64());
}

/// Request fields that may appear as a `field` label.
const FIELD_LABELS: &[&str] = &[
    "start",
    "end",
    "exclude_interim",
    "from",
    "size",
    "page",
    "page.from",
    "page.size",
    "record_score",
    "sort",
    "desc",
    "job_id",
];

/// Map an offending field onto a closed label set. Client-chosen keys
/// collapse to `unknown`; a body with no field is `body`.
pub fn field_label(field: Option<&str>) -> &'static str {
    match field {
        None => "body",
        Some(field) => FIELD_LABELS
            .iter()
            .copied()
            .find(|known| *known == field)
            .unwrap_or("unknown"),
    }
}

/// Record a request rejected by the normalizer.
pub fn record_normalize_error(field: Option<&str>) {
    metrics::counter!("records_normalize_errors_total", "field" => field_label(field)).increment(1);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::{normalize, InboundRequest};

    fn body_error_label(json: &str) -> &'static str {
        let err = normalize("myjob", InboundRequest::StructuredBody(json.as_bytes())).unwrap_err();
        field_label(err.field.as_deref())
    }

    #[test]
    fn test_recognized_fields_keep_their_name() {
        assert_eq!(field_label(Some("from")), "from");
        assert_eq!(body_error_label(r#"{"page": {"size": "x"}}"#), "page.size");
        assert_eq!(body_error_label(r#"{"desc": 1}"#), "desc");
    }

    #[test]
    fn test_unknown_body_keys_share_one_label() {
        let labels: std::collections::HashSet<_> = (0..100)
            .map(|i| body_error_label(&format!(r#"{{"junk_key_{i}": 1}}"#)))
            .collect();
        assert_eq!(labels.len(), 1);
        assert!(labels.contains("unknown"));

        assert_eq!(body_error_label(r#"{"page": {"limit": 1}}"#), "unknown");
    }

    #[test]
    fn test_unparseable_body_is_labelled_body() {
        assert_eq!(body_error_label("{oops"), "body");
    }
}
