//! Canonical get-records request and its default values.

use serde::Serialize;

/// Action name the canonical request is dispatched under.
pub const ACTION_NAME: &str = "get_records";

// Built-in defaults. A freshly constructed request carries exactly these.
pub const DEFAULT_START: &str = "";
pub const DEFAULT_END: &str = "";
pub const DEFAULT_EXCLUDE_INTERIM: bool = false;
pub const DEFAULT_FROM: u32 = 0;
pub const DEFAULT_SIZE: u32 = 100;
pub const DEFAULT_RECORD_SCORE: f64 = 0.0;
pub const DEFAULT_SORT_FIELD: &str = "record_score";
pub const DEFAULT_DESCENDING: bool = true;

/// Paging window over the matching records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageParams {
    /// Number of matching records to skip.
    pub from: u32,
    /// Maximum number of records to return.
    pub size: u32,
}

impl PageParams {
    /// End of the window (`from + size`), without overflow.
    pub fn window_end(&self) -> u64 {
        u64::from(self.from) + u64::from(self.size)
    }
}

impl Default for PageParams {
    fn default() -> Self {
        Self {
            from: DEFAULT_FROM,
            size: DEFAULT_SIZE,
        }
    }
}

/// The single normalized representation of a records query.
///
/// Serializes with the same field names the structured body accepts, so a
/// value can be sent back to the endpoint as a body unchanged.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GetRecordsRequest {
    /// Job the records belong to. Always taken from the request path.
    pub job_id: String,
    /// Lower time bound, caller's lexical form. Empty means unbounded.
    pub start: String,
    /// Upper time bound, caller's lexical form. Empty means unbounded.
    pub end: String,
    /// Drop interim results.
    pub exclude_interim: bool,
    /// Paging window.
    pub page: PageParams,
    /// Minimum record score.
    pub record_score: f64,
    /// Field to sort on.
    pub sort: String,
    /// Sort descending.
    pub desc: bool,
}

impl GetRecordsRequest {
    /// Create a request for `job_id` with every other field at its default.
    pub fn new(job_id: impl Into<String>) -> Self {
        Self {
            job_id: job_id.into(),
            start: DEFAULT_START.to_string(),
            end: DEFAULT_END.to_string(),
            exclude_interim: DEFAULT_EXCLUDE_INTERIM,
            page: PageParams::default(),
            record_score: DEFAULT_RECORD_SCORE,
            sort: DEFAULT_SORT_FIELD.to_string(),
            desc: DEFAULT_DESCENDING,
        }
    }

    /// Render the request as flat query parameters.
    ///
    /// Only fields that differ from their default are emitted; the job id is
    /// part of the path and never a parameter.
    pub fn to_flat_params(&self) -> Vec<(&'static str, String)> {
        let mut params = Vec::new();
        if self.start != DEFAULT_START {
            params.push(("start", self.start.clone()));
        }
        if self.end != DEFAULT_END {
            params.push(("end", self.end.clone()));
        }
        if self.exclude_interim != DEFAULT_EXCLUDE_INTERIM {
            params.push(("exclude_interim", self.exclude_interim.to_string()));
        }
        if self.page.from != DEFAULT_FROM {
            params.push(("from", self.page.from.to_string()));
        }
        if self.page.size != DEFAULT_SIZE {
            params.push(("size", self.page.size.to_string()));
        }
        if self.record_score != DEFAULT_RECORD_SCORE {
            params.push(("record_score", self.record_score.to_string()));
        }
        if self.sort != DEFAULT_SORT_FIELD {
            params.push(("sort", self.sort.clone()));
        }
        if self.desc != DEFAULT_DESCENDING {
            params.push(("desc", self.desc.to_string()));
        }
        params
    }
}
