//! Shared utilities for integration tests.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anomaly_records::config::ServiceConfig;
use anomaly_records::http::HttpServer;
use anomaly_records::lifecycle::Shutdown;
use anomaly_records::records::{AnomalyRecord, RecordStore, RecordsExecutor};

/// A server running on an ephemeral port.
pub struct TestServer {
    pub addr: SocketAddr,
    pub shutdown: Shutdown,
    pub config: ServiceConfig,
}

impl TestServer {
    /// URL of the records endpoint for `job_id`.
    pub fn records_url(&self, job_id: &str) -> String {
        format!(
            "http://{}{}/anomaly_detectors/{}/results/records",
            self.addr, self.config.api.base_path, job_id
        )
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

/// Start the HTTP server with `executor` and wait until it accepts.
#[allow(dead_code)]
pub async fn start_server_with(config: ServiceConfig, executor: Arc<dyn RecordsExecutor>) -> TestServer {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let server = HttpServer::new(config.clone(), executor);
    let rx = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.run(listener, rx).await;
    });

    for _ in 0..50 {
        if tokio::net::TcpStream::connect(addr).await.is_ok() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }

    TestServer { addr, shutdown, config }
}

/// Start the HTTP server backed by `store`.
#[allow(dead_code)]
pub async fn start_server(config: ServiceConfig, store: RecordStore) -> TestServer {
    start_server_with(config, Arc::new(store)).await
}

/// A record with the given position and score.
pub fn record(job_id: &str, timestamp: i64, score: f64, interim: bool) -> AnomalyRecord {
    AnomalyRecord {
        job_id: job_id.to_string(),
        result_type: "record".to_string(),
        timestamp,
        bucket_span: 900,
        detector_index: 0,
        record_score: score,
        initial_record_score: score,
        probability: 0.01,
        is_interim: interim,
        function: Some("high_count".to_string()),
        field_name: None,
        by_field_name: Some("status".to_string()),
        by_field_value: Some("500".to_string()),
        partition_field_name: None,
        partition_field_value: None,
        actual: vec![120.0],
        typical: vec![4.0],
    }
}

/// Store holding twenty records for `myjob` (timestamps 1000..=20000,
/// score = index * 5) plus one unrelated job.
#[allow(dead_code)]
pub fn seeded_store() -> RecordStore {
    let store = RecordStore::default();
    store.extend((1..=20).map(|i| record("myjob", i * 1_000, i as f64 * 5.0, i % 4 == 0)));
    store.extend([record("otherjob", 1_000, 100.0, false)]);
    store
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .no_proxy()
        .build()
        .unwrap()
}
