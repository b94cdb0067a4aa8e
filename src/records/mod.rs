//! Anomaly records subsystem.
//!
//! # Data Flow
//! ```text
//! path job id + (body | `source` param | query params)
//!     → normalizer.rs (classify shape, parse, apply defaults)
//!     → GetRecordsRequest (request.rs)
//!     → RecordsExecutor (executor.rs), async
//!     → RecordsPage (types.rs) or ExecutionError
//! ```
//!
//! `store.rs` is the in-memory executor the server runs with.

pub mod executor;
pub mod normalizer;
pub mod request;
pub mod store;
pub mod types;

pub use executor::{ExecutionError, ExecutionResult, RecordsExecutor};
pub use normalizer::{normalize, InboundRequest, MalformedRequestError};
pub use request::{GetRecordsRequest, PageParams, ACTION_NAME};
pub use store::{RecordStore, StoreError};
pub use types::{AnomalyRecord, RecordsPage};
