//! Anomaly records service library.

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod records;

pub use config::ServiceConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use records::{GetRecordsRequest, RecordStore, RecordsExecutor};
