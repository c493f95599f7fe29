//! Wire types for the data-flow backend response.
//!
//! The backend runs two Prometheus instant queries (router-side and
//! environment-side call rates) and concatenates their vectors into a single
//! `result` array. Every entry is one [`Sample`]: a labeled call between two
//! endpoints plus a `[timestamp, value]` pair.
//!
//! Decoding goes through [`RawResultSet::from_slice`], which also validates
//! the numeric value strings so that malformed payloads fail here instead of
//! deep inside the graph builder.

use serde::{Deserialize, Serialize};

use crate::error::FlowError;

/// Status string the backend uses for a successful upstream query.
pub const STATUS_SUCCESS: &str = "success";

/// A complete response from the data-flow endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawResultSet {
    /// Outcome of the router-side query ("success" or "fail").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_router: Option<String>,

    /// Outcome of the environment-side query ("success" or "fail").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_env: Option<String>,

    /// All samples, in the order the backend returned them.
    pub result: Vec<Sample>,
}

/// One observed call between two endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub metric: SampleMetric,
    pub value: SampleValue,
}

/// Labels attached to a sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampleMetric {
    /// Calling endpoint id (e.g. "default.hello").
    pub source: String,
    /// Called endpoint id.
    pub destination: String,
    /// Endpoint type of the caller ("func", "kafka", ...).
    pub stype: String,
    /// Endpoint type of the callee.
    pub dtype: String,
    /// HTTP status code as a string, or "unknown".
    pub code: String,
    /// HTTP method, when the recorder captured one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
}

/// Prometheus `[timestamp, "value"]` pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampleValue(pub f64, pub String);

impl SampleValue {
    /// The value exactly as the backend sent it.
    pub fn raw(&self) -> &str {
        &self.1
    }

    /// Zero-valued observations are sent as the literal string "0".
    pub fn is_zero(&self) -> bool {
        self.1 == "0"
    }

    /// Parse the value string.
    pub fn parse(&self) -> Result<f64, FlowError> {
        self.1
            .trim()
            .parse::<f64>()
            .map_err(|_| FlowError::Schema(format!("non-numeric sample value {:?}", self.1)))
    }
}

impl RawResultSet {
    /// Decode and validate a response body.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, FlowError> {
        let set: RawResultSet = serde_json::from_slice(bytes)?;
        set.validate()?;
        Ok(set)
    }

    /// Decode and validate a response held in a string.
    pub fn from_json(content: &str) -> Result<Self, FlowError> {
        Self::from_slice(content.as_bytes())
    }

    /// Check that every sample value is numeric.
    pub fn validate(&self) -> Result<(), FlowError> {
        for (i, sample) in self.result.iter().enumerate() {
            sample.value.parse().map_err(|_| {
                FlowError::Schema(format!(
                    "sample {} ({} -> {}): non-numeric value {:?}",
                    i, sample.metric.source, sample.metric.destination, sample.value.1
                ))
            })?;
        }
        Ok(())
    }

    /// Upstream queries the backend reported as failed.
    pub fn failed_queries(&self) -> Vec<&'static str> {
        let mut failed = Vec::new();
        if matches!(&self.status_router, Some(s) if s != STATUS_SUCCESS) {
            failed.push("router");
        }
        if matches!(&self.status_env, Some(s) if s != STATUS_SUCCESS) {
            failed.push("env");
        }
        failed
    }

    pub fn is_empty(&self) -> bool {
        self.result.is_empty()
    }

    pub fn len(&self) -> usize {
        self.result.len()
    }
}

impl Sample {
    /// Convenience constructor, mostly for tests and replay tooling.
    pub fn new(
        source: &str,
        stype: &str,
        destination: &str,
        dtype: &str,
        code: &str,
        value: &str,
    ) -> Self {
        Self {
            metric: SampleMetric {
                source: source.to_string(),
                destination: destination.to_string(),
                stype: stype.to_string(),
                dtype: dtype.to_string(),
                code: code.to_string(),
                method: None,
            },
            value: SampleValue(0.0, value.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_backend_response() {
        let json = r#"{
            "status_router": "success",
            "status_env": "success",
            "result": [
                {
                    "metric": {
                        "source": "default.hello",
                        "destination": "default.world",
                        "stype": "func",
                        "dtype": "func",
                        "method": "GET",
                        "code": "200"
                    },
                    "value": [1600073370.123, "1.5"]
                }
            ]
        }"#;

        let set = RawResultSet::from_json(json).unwrap();
        assert_eq!(set.len(), 1);
        assert!(set.failed_queries().is_empty());

        let sample = &set.result[0];
        assert_eq!(sample.metric.source, "default.hello");
        assert_eq!(sample.metric.dtype, "func");
        assert_eq!(sample.metric.method.as_deref(), Some("GET"));
        assert!((sample.value.0 - 1600073370.123).abs() < 1e-6);
        assert_eq!(sample.value.raw(), "1.5");
        assert_eq!(sample.value.parse().unwrap(), 1.5);
    }

    #[test]
    fn test_status_fields_are_optional() {
        let set = RawResultSet::from_json(r#"{"result": []}"#).unwrap();
        assert!(set.is_empty());
        assert!(set.status_router.is_none());
    }

    #[test]
    fn test_missing_label_is_schema_error() {
        let json = r#"{"result": [{"metric": {"source": "a"}, "value": [0, "1"]}]}"#;
        let err = RawResultSet::from_json(json).unwrap_err();
        assert!(matches!(err, FlowError::Schema(_)));
    }

    #[test]
    fn test_missing_result_is_schema_error() {
        let err = RawResultSet::from_json(r#"{"status_router": "fail"}"#).unwrap_err();
        assert!(matches!(err, FlowError::Schema(_)));
    }

    #[test]
    fn test_non_numeric_value_rejected() {
        let json = r#"{"result": [{
            "metric": {"source": "a", "destination": "b", "stype": "func", "dtype": "func", "code": "200"},
            "value": [0, "lots"]
        }]}"#;
        let err = RawResultSet::from_json(json).unwrap_err();
        match err {
            FlowError::Schema(msg) => assert!(msg.contains("lots")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_prometheus_nan_accepted() {
        let json = r#"{"result": [{
            "metric": {"source": "a", "destination": "b", "stype": "func", "dtype": "func", "code": "200"},
            "value": [0, "NaN"]
        }]}"#;
        let set = RawResultSet::from_json(json).unwrap();
        assert!(set.result[0].value.parse().unwrap().is_nan());
    }

    #[test]
    fn test_failed_queries_reported() {
        let set = RawResultSet {
            status_router: Some("fail".to_string()),
            status_env: Some("success".to_string()),
            result: vec![],
        };
        assert_eq!(set.failed_queries(), vec!["router"]);
    }

    #[test]
    fn test_zero_is_literal_string_match() {
        assert!(Sample::new("a", "func", "b", "func", "200", "0").value.is_zero());
        assert!(!Sample::new("a", "func", "b", "func", "200", "0.0").value.is_zero());
    }
}
