//! In-memory record store.
//!
//! # Responsibilities
//! - Hold anomaly records grouped by job id
//! - Load records from a JSON fixture file
//! - Answer canonical records queries (filter, sort, page)
//!
//! # Design Decisions
//! - Sharded concurrent map: readers never take a global lock
//! - Paging past the result window is rejected, never clamped
//! - Time bounds are parsed here, not by the normalizer

use std::cmp::Ordering;
use std::path::Path;
use std::sync::Arc;

use chrono::DateTime;
use dashmap::DashMap;
use futures_util::future::{BoxFuture, FutureExt};
use thiserror::Error;

use crate::records::executor::{ExecutionError, ExecutionResult, RecordsExecutor};
use crate::records::request::GetRecordsRequest;
use crate::records::types::{AnomalyRecord, RecordsPage};

/// Default maximum for `from + size`.
pub const DEFAULT_MAX_RESULT_WINDOW: u32 = 10_000;

/// Error loading records into the store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to read fixture: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse fixture: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Numeric record fields that can be sorted on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    RecordScore,
    InitialRecordScore,
    Probability,
    Timestamp,
    DetectorIndex,
    BucketSpan,
}

impl SortField {
    /// Resolve a sort field by its record field name.
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "record_score" => Some(Self::RecordScore),
            "initial_record_score" => Some(Self::InitialRecordScore),
            "probability" => Some(Self::Probability),
            "timestamp" => Some(Self::Timestamp),
            "detector_index" => Some(Self::DetectorIndex),
            "bucket_span" => Some(Self::BucketSpan),
            _ => None,
        }
    }

    fn compare(self, a: &AnomalyRecord, b: &AnomalyRecord) -> Ordering {
        match self {
            Self::RecordScore => a.record_score.total_cmp(&b.record_score),
            Self::InitialRecordScore => a.initial_record_score.total_cmp(&b.initial_record_score),
            Self::Probability => a.probability.total_cmp(&b.probability),
            Self::Timestamp => a.timestamp.cmp(&b.timestamp),
            Self::DetectorIndex => a.detector_index.cmp(&b.detector_index),
            Self::BucketSpan => a.bucket_span.cmp(&b.bucket_span),
        }
    }
}

/// Records held in memory, keyed by job id.
#[derive(Debug, Clone)]
pub struct RecordStore {
    jobs: Arc<DashMap<String, Vec<AnomalyRecord>>>,
    max_result_window: u32,
}

impl RecordStore {
    /// Create an empty store.
    pub fn new(max_result_window: u32) -> Self {
        Self {
            jobs: Arc::new(DashMap::new()),
            max_result_window,
        }
    }

    /// Load a JSON array of records from `path`.
    pub fn from_fixture(path: &Path, max_result_window: u32) -> Result<Self, StoreError> {
        let content = std::fs::read_to_string(path)?;
        let records: Vec<AnomalyRecord> = serde_json::from_str(&content)?;

        let store = Self::new(max_result_window);
        let count = records.len();
        store.extend(records);

        tracing::info!(path = ?path, records = count, jobs = store.job_count(), "Loaded record fixture");
        Ok(store)
    }

    /// Register a job with no records yet.
    pub fn create_job(&self, job_id: impl Into<String>) {
        self.jobs.entry(job_id.into()).or_default();
    }

    /// Add records, creating their jobs as needed.
    pub fn extend(&self, records: impl IntoIterator<Item = AnomalyRecord>) {
        for record in records {
            self.jobs.entry(record.job_id.clone()).or_default().push(record);
        }
    }

    pub fn job_count(&self) -> usize {
        self.jobs.len()
    }

    /// Run a canonical records query.
    pub fn query(&self, request: &GetRecordsRequest) -> ExecutionResult {
        let requested = request.page.window_end();
        if requested > u64::from(self.max_result_window) {
            return Err(ExecutionError::ResultWindowTooLarge {
                requested,
                max: self.max_result_window,
            });
        }

        let sort = SortField::parse(&request.sort)
            .ok_or_else(|| ExecutionError::UnknownSortField(request.sort.clone()))?;
        let start = parse_time_bound("start", &request.start)?;
        let end = parse_time_bound("end", &request.end)?;

        let records = self
            .jobs
            .get(&request.job_id)
            .ok_or_else(|| ExecutionError::JobNotFound(request.job_id.clone()))?;

        let mut matches: Vec<&AnomalyRecord> = records
            .iter()
            .filter(|r| start.map_or(true, |s| r.timestamp >= s))
            .filter(|r| end.map_or(true, |e| r.timestamp < e))
            .filter(|r| !(request.exclude_interim && r.is_interim))
            .filter(|r| r.record_score >= request.record_score)
            .collect();

        matches.sort_by(|a, b| {
            let ord = sort.compare(a, b);
            let ord = if request.desc { ord.reverse() } else { ord };
            ord.then_with(|| a.timestamp.cmp(&b.timestamp))
        });

        let count = matches.len() as u64;
        let records = matches
            .into_iter()
            .skip(request.page.from as usize)
            .take(request.page.size as usize)
            .cloned()
            .collect();

        Ok(RecordsPage { count, records })
    }
}

impl Default for RecordStore {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_RESULT_WINDOW)
    }
}

impl RecordsExecutor for RecordStore {
    fn execute(&self, request: GetRecordsRequest) -> BoxFuture<'static, ExecutionResult> {
        let store = self.clone();
        async move { store.query(&request) }.boxed()
    }
}

/// Parse a time bound as epoch milliseconds or an RFC 3339 date-time.
/// An empty bound is unbounded.
fn parse_time_bound(field: &'static str, value: &str) -> Result<Option<i64>, ExecutionError> {
    if value.is_empty() {
        return Ok(None);
    }
    if let Ok(millis) = value.parse::<i64>() {
        return Ok(Some(millis));
    }
    DateTime::parse_from_rfc3339(value)
        .map(|dt| Some(dt.timestamp_millis()))
        .map_err(|_| ExecutionError::InvalidTimeExpression {
            field,
            value: value.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(job_id: &str, timestamp: i64, score: f64, interim: bool) -> AnomalyRecord {
        AnomalyRecord {
            job_id: job_id.to_string(),
            result_type: "record".to_string(),
            timestamp,
            bucket_span: 300,
            detector_index: 0,
            record_score: score,
            initial_record_score: score,
            probability: 1.0 - score / 100.0,
            is_interim: interim,
            function: None,
            field_name: None,
            by_field_name: None,
            by_field_value: None,
            partition_field_name: None,
            partition_field_value: None,
            actual: vec![],
            typical: vec![],
        }
    }

    fn seeded() -> RecordStore {
        let store = RecordStore::default();
        store.extend(vec![
            record("job", 1_000, 10.0, false),
            record("job", 2_000, 90.0, false),
            record("job", 3_000, 50.0, true),
            record("job", 4_000, 70.0, false),
            record("other", 1_000, 99.0, false),
        ]);
        store
    }

    fn timestamps(page: &RecordsPage) -> Vec<i64> {
        page.records.iter().map(|r| r.timestamp).collect()
    }

    #[test]
    fn test_default_query_sorts_by_score_descending() {
        let page = seeded().query(&GetRecordsRequest::new("job")).unwrap();
        assert_eq!(page.count, 4);
        assert_eq!(timestamps(&page), vec![2_000, 4_000, 3_000, 1_000]);
    }

    #[test]
    fn test_unknown_job() {
        let err = seeded().query(&GetRecordsRequest::new("missing")).unwrap_err();
        assert_eq!(err, ExecutionError::JobNotFound("missing".to_string()));
    }

    #[test]
    fn test_empty_job_is_not_missing() {
        let store = RecordStore::default();
        store.create_job("fresh");
        let page = store.query(&GetRecordsRequest::new("fresh")).unwrap();
        assert_eq!(page, RecordsPage::empty());
    }

    #[test]
    fn test_filters() {
        let store = seeded();

        let mut req = GetRecordsRequest::new("job");
        req.record_score = 50.0;
        req.exclude_interim = true;
        let page = store.query(&req).unwrap();
        assert_eq!(timestamps(&page), vec![2_000, 4_000]);

        let mut req = GetRecordsRequest::new("job");
        req.start = "2000".to_string();
        req.end = "1970-01-01T00:00:04Z".to_string();
        let page = store.query(&req).unwrap();
        // End bound is exclusive.
        assert_eq!(timestamps(&page), vec![2_000, 3_000]);
    }

    #[test]
    fn test_paging_reports_total_count() {
        let mut req = GetRecordsRequest::new("job");
        req.sort = "timestamp".to_string();
        req.desc = false;
        req.page.from = 1;
        req.page.size = 2;

        let page = seeded().query(&req).unwrap();
        assert_eq!(page.count, 4);
        assert_eq!(timestamps(&page), vec![2_000, 3_000]);
    }

    #[test]
    fn test_result_window_is_enforced() {
        let store = RecordStore::new(100);
        store.create_job("job");

        let mut req = GetRecordsRequest::new("job");
        req.page.from = 1;
        let err = store.query(&req).unwrap_err();
        assert_eq!(err, ExecutionError::ResultWindowTooLarge { requested: 101, max: 100 });

        req.page.from = 0;
        assert!(store.query(&req).is_ok());
    }

    #[test]
    fn test_unknown_sort_field() {
        let mut req = GetRecordsRequest::new("job");
        req.sort = "nope".to_string();
        let err = seeded().query(&req).unwrap_err();
        assert_eq!(err, ExecutionError::UnknownSortField("nope".to_string()));
    }

    #[test]
    fn test_invalid_time_expression() {
        let mut req = GetRecordsRequest::new("job");
        req.start = "yesterday".to_string();
        let err = seeded().query(&req).unwrap_err();
        assert!(matches!(err, ExecutionError::InvalidTimeExpression { field: "start", .. }));
    }

    #[tokio::test]
    async fn test_execute_matches_query() {
        let store = seeded();
        let page = store.execute(GetRecordsRequest::new("other")).await.unwrap();
        assert_eq!(page.count, 1);
        assert_eq!(page.records[0].record_score, 99.0);
    }

    #[test]
    fn test_from_fixture() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("records.json");
        std::fs::write(
            &path,
            r#"[
                {"job_id": "a", "timestamp": 1, "bucket_span": 60, "record_score": 5, "probability": 0.1},
                {"job_id": "b", "timestamp": 2, "bucket_span": 60, "record_score": 6, "probability": 0.2}
            ]"#,
        )
        .unwrap();

        let store = RecordStore::from_fixture(&path, 50).unwrap();
        assert_eq!(store.job_count(), 2);

        std::fs::write(&path, "not json").unwrap();
        assert!(matches!(RecordStore::from_fixture(&path, 50), Err(StoreError::Parse(_))));
    }
}
