//! Anomaly record result types.

use serde::{Deserialize, Serialize};

fn record_result_type() -> String {
    "record".to_string()
}

/// A single anomaly record produced by an analysis job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnomalyRecord {
    /// Job that produced the record.
    pub job_id: String,
    #[serde(default = "record_result_type")]
    pub result_type: String,
    /// Bucket start, epoch milliseconds.
    pub timestamp: i64,
    /// Bucket span in seconds.
    pub bucket_span: u64,
    #[serde(default)]
    pub detector_index: u32,
    /// Normalized anomaly score (0-100), may be renormalized over time.
    pub record_score: f64,
    /// Score at the time the record was first written.
    #[serde(default)]
    pub initial_record_score: f64,
    pub probability: f64,
    #[serde(default)]
    pub is_interim: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub function: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub by_field_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub by_field_value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub partition_field_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub partition_field_value: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub actual: Vec<f64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub typical: Vec<f64>,
}

/// One page of matching records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordsPage {
    /// Number of records matching the query before paging.
    pub count: u64,
    pub records: Vec<AnomalyRecord>,
}

impl RecordsPage {
    pub fn empty() -> Self {
        Self {
            count: 0,
            records: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_record_fills_defaults() {
        let record: AnomalyRecord = serde_json::from_str(
            r#"{"job_id": "j", "timestamp": 1000, "bucket_span": 60,
                "record_score": 80.5, "probability": 0.001}"#,
        )
        .unwrap();

        assert_eq!(record.result_type, "record");
        assert!(!record.is_interim);
        assert_eq!(record.detector_index, 0);
        assert!(record.actual.is_empty());
    }

    #[test]
    fn test_optional_fields_are_omitted() {
        let page = RecordsPage {
            count: 1,
            records: vec![AnomalyRecord {
                job_id: "j".to_string(),
                result_type: "record".to_string(),
                timestamp: 1000,
                bucket_span: 60,
                detector_index: 0,
                record_score: 1.0,
                initial_record_score: 1.0,
                probability: 0.5,
                is_interim: false,
                function: Some("mean".to_string()),
                field_name: None,
                by_field_name: None,
                by_field_value: None,
                partition_field_name: None,
                partition_field_value: None,
                actual: vec![],
                typical: vec![],
            }],
        };

        let value = serde_json::to_value(&page).unwrap();
        let record = &value["records"][0];
        assert_eq!(record["function"], "mean");
        assert!(record.get("field_name").is_none());
        assert!(record.get("actual").is_none());
    }
}
