//! Execution contract for records queries.

use futures_util::future::BoxFuture;
use thiserror::Error;

use crate::records::request::GetRecordsRequest;
use crate::records::types::RecordsPage;

/// Result of executing a records query.
pub type ExecutionResult = Result<RecordsPage, ExecutionError>;

/// Failures reported by an executor. Relayed to the caller unchanged.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ExecutionError {
    /// No job with this id is known.
    #[error("No known job with id '{0}'")]
    JobNotFound(String),

    /// `from + size` pages past the permitted result window.
    #[error("from + size must be less than or equal to: [{max}] but was [{requested}]")]
    ResultWindowTooLarge { requested: u64, max: u32 },

    /// The requested sort field does not exist on records.
    #[error("No mapping found for [{0}] in order to sort on")]
    UnknownSortField(String),

    /// A time bound could not be parsed.
    #[error("Query param [{field}] with value [{value}] cannot be parsed as a date or converted to a number (epoch)")]
    InvalidTimeExpression { field: &'static str, value: String },

    /// Any other backend failure.
    #[error("backend failure: {0}")]
    Backend(String),
}

/// Performs the records lookup for a canonical request.
///
/// Implementations must not block the calling task; the returned future is
/// awaited on the runtime.
pub trait RecordsExecutor: Send + Sync {
    fn execute(&self, request: GetRecordsRequest) -> BoxFuture<'static, ExecutionResult>;
}
