//! Records endpoint handlers.

use std::collections::HashMap;

use axum::{
    body::Bytes,
    extract::{
        rejection::{BytesRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};

use crate::http::response::ApiError;
use crate::http::server::AppState;
use crate::http::X_REQUEST_ID;
use crate::observability::metrics;
use crate::records::{normalize, InboundRequest, RecordsPage, ACTION_NAME};

/// `GET|POST {base}/anomaly_detectors/{job_id}/results/records`
pub async fn get_records(
    State(state): State<AppState>,
    headers: HeaderMap,
    job_id: Result<Path<String>, PathRejection>,
    params: Result<Query<HashMap<String, String>>, QueryRejection>,
    body: Result<Bytes, BytesRejection>,
) -> Response {
    let request_id = headers
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown");

    let (job_id, params, body) = match (job_id, params, body) {
        (Ok(Path(job_id)), Ok(Query(params)), Ok(body)) => (job_id, params, body),
        (Err(r), _, _) => return rejected(request_id, r.status(), r.body_text()),
        (_, Err(r), _) => return rejected(request_id, r.status(), r.body_text()),
        (_, _, Err(r)) => return rejected(request_id, r.status(), r.body_text()),
    };

    match dispatch(&state, &job_id, &params, &body, request_id).await {
        Ok(page) => (StatusCode::OK, Json(page)).into_response(),
        Err(e) => e.into_response(),
    }
}

/// The request could not be extracted (undecodable path, oversized body).
fn rejected(request_id: &str, status: StatusCode, reason: String) -> Response {
    tracing::warn!(request_id = %request_id, status = status.as_u16(), reason = %reason, "Records request rejected by extractor");
    ApiError::from_status(status, reason).into_response()
}

/// Normalize the inbound request and hand it to the executor.
async fn dispatch(
    state: &AppState,
    job_id: &str,
    params: &HashMap<String, String>,
    body: &[u8],
    request_id: &str,
) -> Result<RecordsPage, ApiError> {
    let inbound = InboundRequest::classify(body, params);
    let request = normalize(job_id, inbound).map_err(|e| {
        tracing::warn!(request_id = %request_id, job_id = %job_id, error = %e, "Malformed records request");
        metrics::record_normalize_error(e.field.as_deref());
        ApiError::from(e)
    })?;

    tracing::debug!(
        request_id = %request_id,
        action = ACTION_NAME,
        request = ?request,
        "Dispatching records request"
    );

    state.executor.execute(request).await.map_err(|e| {
        let err = ApiError::from(e);
        if err.status().is_server_error() {
            tracing::error!(request_id = %request_id, job_id = %job_id, kind = err.kind(), "Records execution failed");
        } else {
            tracing::warn!(request_id = %request_id, job_id = %job_id, kind = err.kind(), "Records request rejected");
        }
        err
    })
}

/// Liveness probe.
pub async fn health() -> &'static str {
    "OK"
}
