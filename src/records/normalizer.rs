//! Request normalization.
//!
//! # Responsibilities
//! - Decide which of the two inbound shapes a call uses
//! - Parse the structured body, the path job id overriding the body's
//! - Overlay flat query parameters onto a default request
//! - Report the first field that cannot be converted
//!
//! # Design Decisions
//! - Pure and synchronous: no I/O, no shared state
//! - The two shapes are never merged; a body shadows every flat parameter
//! - Defaults come only from [`GetRecordsRequest::new`]

use std::collections::HashMap;

use serde_json::{Map, Value};
use thiserror::Error;

use crate::records::request::GetRecordsRequest;

/// Query parameter that may carry the structured document in place of a body.
pub const SOURCE_PARAM: &str = "source";

/// Longest raw body excerpt kept in an error.
const MAX_RAW_EXCERPT: usize = 128;

/// A recognized field could not be converted to its required type.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{}", render(.field.as_deref(), .raw_value, .reason))]
pub struct MalformedRequestError {
    /// Offending field, when it can be determined.
    pub field: Option<String>,
    /// Raw value as received.
    pub raw_value: String,
    /// What was expected instead.
    pub reason: String,
}

fn render(field: Option<&str>, raw_value: &str, reason: &str) -> String {
    match field {
        Some(field) => format!("failed to parse [{field}] with value [{raw_value}]: {reason}"),
        None => format!("failed to parse request body: {reason}"),
    }
}

impl MalformedRequestError {
    fn field(field: impl Into<String>, raw_value: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            field: Some(field.into()),
            raw_value: raw_value.into(),
            reason: reason.into(),
        }
    }

    fn body(raw: &[u8], reason: impl Into<String>) -> Self {
        let text = String::from_utf8_lossy(raw);
        Self {
            field: None,
            raw_value: text.chars().take(MAX_RAW_EXCERPT).collect(),
            reason: reason.into(),
        }
    }
}

/// The two legal inbound shapes of a records query.
#[derive(Debug, Clone, Copy)]
pub enum InboundRequest<'a> {
    /// All parameters in one JSON document.
    StructuredBody(&'a [u8]),
    /// Parameters carried individually, typically in the query string.
    FlatParams(&'a HashMap<String, String>),
}

impl<'a> InboundRequest<'a> {
    /// Pick the shape of a call from its body and query parameters.
    ///
    /// A non-empty body wins; otherwise a `source` parameter is treated as the
    /// body; otherwise the query parameters are used one by one.
    pub fn classify(body: &'a [u8], params: &'a HashMap<String, String>) -> Self {
        if !body.is_empty() {
            return Self::StructuredBody(body);
        }
        match params.get(SOURCE_PARAM) {
            Some(source) => Self::StructuredBody(source.as_bytes()),
            None => Self::FlatParams(params),
        }
    }
}

/// Normalize an inbound request for `job_id` into its canonical form.
pub fn normalize(
    job_id: &str,
    inbound: InboundRequest<'_>,
) -> Result<GetRecordsRequest, MalformedRequestError> {
    match inbound {
        InboundRequest::StructuredBody(raw) => from_body(job_id, raw),
        InboundRequest::FlatParams(params) => from_flat_params(job_id, params),
    }
}

fn from_flat_params(
    job_id: &str,
    params: &HashMap<String, String>,
) -> Result<GetRecordsRequest, MalformedRequestError> {
    let mut request = GetRecordsRequest::new(job_id);

    if let Some(start) = params.get("start") {
        request.start = start.clone();
    }
    if let Some(end) = params.get("end") {
        request.end = end.clone();
    }
    if let Some(raw) = params.get("exclude_interim") {
        request.exclude_interim = parse_bool("exclude_interim", raw, request.exclude_interim)?;
    }
    if let Some(raw) = params.get("from") {
        request.page.from = parse_count("from", raw)?;
    }
    if let Some(raw) = params.get("size") {
        request.page.size = parse_count("size", raw)?;
    }
    if let Some(raw) = params.get("record_score") {
        request.record_score = parse_score("record_score", raw)?;
    }
    if let Some(sort) = params.get("sort") {
        request.sort = parse_sort("sort", sort)?;
    }
    if let Some(raw) = params.get("desc") {
        request.desc = parse_bool("desc", raw, request.desc)?;
    }

    Ok(request)
}

fn from_body(job_id: &str, raw: &[u8]) -> Result<GetRecordsRequest, MalformedRequestError> {
    let document: Value = serde_json::from_slice(raw)
        .map_err(|e| MalformedRequestError::body(raw, e.to_string()))?;
    let Value::Object(fields) = document else {
        return Err(MalformedRequestError::body(raw, "expected a JSON object"));
    };

    let mut request = GetRecordsRequest::new(job_id);
    for (key, value) in &fields {
        // Explicit nulls leave the default in place.
        if value.is_null() {
            continue;
        }
        match key.as_str() {
            // Validated for type, then discarded: the path is authoritative.
            "job_id" => {
                expect_string(key, value)?;
            }
            "start" => request.start = expect_string(key, value)?,
            "end" => request.end = expect_string(key, value)?,
            "exclude_interim" => request.exclude_interim = expect_bool(key, value)?,
            "page" => apply_page(&mut request, value)?,
            "record_score" => request.record_score = expect_score(key, value)?,
            "sort" => request.sort = parse_sort(key, &expect_string(key, value)?)?,
            "desc" => request.desc = expect_bool(key, value)?,
            _ => {
                return Err(MalformedRequestError::field(
                    key.as_str(),
                    value.to_string(),
                    "unknown field",
                ))
            }
        }
    }

    Ok(request)
}

fn apply_page(request: &mut GetRecordsRequest, value: &Value) -> Result<(), MalformedRequestError> {
    let page: &Map<String, Value> = value
        .as_object()
        .ok_or_else(|| MalformedRequestError::field("page", value.to_string(), "expected an object"))?;

    for (key, value) in page {
        if value.is_null() {
            continue;
        }
        let path = format!("page.{key}");
        match key.as_str() {
            "from" => request.page.from = expect_count(&path, value)?,
            "size" => request.page.size = expect_count(&path, value)?,
            _ => return Err(MalformedRequestError::field(path, value.to_string(), "unknown field")),
        }
    }
    Ok(())
}

/// Case-insensitive `true`/`false`. An empty value keeps `default`.
fn parse_bool(field: &str, raw: &str, default: bool) -> Result<bool, MalformedRequestError> {
    if raw.is_empty() {
        Ok(default)
    } else if raw.eq_ignore_ascii_case("true") {
        Ok(true)
    } else if raw.eq_ignore_ascii_case("false") {
        Ok(false)
    } else {
        Err(MalformedRequestError::field(field, raw, "expected [true] or [false]"))
    }
}

/// Bare decimal digits only; surrounding whitespace is rejected.
fn parse_count(field: &str, raw: &str) -> Result<u32, MalformedRequestError> {
    raw.parse::<u32>()
        .map_err(|_| MalformedRequestError::field(field, raw, "expected a non-negative integer"))
}

fn parse_score(field: &str, raw: &str) -> Result<f64, MalformedRequestError> {
    let score = raw
        .trim()
        .parse::<f64>()
        .map_err(|_| MalformedRequestError::field(field, raw, "expected a number"))?;
    check_score(field, raw, score)
}

fn check_score(field: &str, raw: &str, score: f64) -> Result<f64, MalformedRequestError> {
    if score.is_finite() && score >= 0.0 {
        Ok(score)
    } else {
        Err(MalformedRequestError::field(field, raw, "expected a finite number >= 0"))
    }
}

fn parse_sort(field: &str, raw: &str) -> Result<String, MalformedRequestError> {
    if raw.is_empty() {
        return Err(MalformedRequestError::field(field, raw, "expected a field name"));
    }
    Ok(raw.to_string())
}

fn expect_string(field: &str, value: &Value) -> Result<String, MalformedRequestError> {
    value
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| MalformedRequestError::field(field, value.to_string(), "expected a string"))
}

/// JSON booleans, or their string spellings.
fn expect_bool(field: &str, value: &Value) -> Result<bool, MalformedRequestError> {
    match value {
        Value::Bool(b) => Ok(*b),
        Value::String(s) if !s.is_empty() => parse_bool(field, s, false),
        other => Err(MalformedRequestError::field(
            field,
            other.to_string(),
            "expected [true] or [false]",
        )),
    }
}

fn expect_count(field: &str, value: &Value) -> Result<u32, MalformedRequestError> {
    match value {
        Value::Number(n) => n
            .as_u64()
            .and_then(|n| u32::try_from(n).ok())
            .ok_or_else(|| {
                MalformedRequestError::field(field, n.to_string(), "expected a non-negative integer")
            }),
        Value::String(s) => parse_count(field, s),
        other => Err(MalformedRequestError::field(
            field,
            other.to_string(),
            "expected a non-negative integer",
        )),
    }
}

fn expect_score(field: &str, value: &Value) -> Result<f64, MalformedRequestError> {
    match value {
        Value::Number(n) => {
            let raw = n.to_string();
            let score = n
                .as_f64()
                .ok_or_else(|| MalformedRequestError::field(field, raw.as_str(), "expected a number"))?;
            check_score(field, &raw, score)
        }
        Value::String(s) => parse_score(field, s),
        other => Err(MalformedRequestError::field(field, other.to_string(), "expected a number")),
    }
}
