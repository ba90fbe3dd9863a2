use std::time::Duration;

use straico_gateway::{GatewayError, Result};

#[test]
fn test_error_display() {
    let err = GatewayError::Validation("prompt cannot be empty".to_string());
    assert!(err.to_string().contains("prompt cannot be empty"));
}

#[test]
fn test_api_error_display() {
    let err = GatewayError::Api {
        status: 422,
        body: r#"{"error":"bad size"}"#.to_string(),
    };
    let msg = err.to_string();
    assert!(msg.contains("422"));
    assert!(msg.contains("bad size"));
}

#[test]
fn test_result_alias() {
    fn returns_error() -> Result<()> {
        Err(GatewayError::NotOpen)
    }
    assert!(returns_error().is_err());
}

#[test]
fn test_json_error_converts() {
    fn parse() -> Result<serde_json::Value> {
        Ok(serde_json::from_str("{")?)
    }
    assert!(matches!(parse(), Err(GatewayError::Json(_))));
}

// ============================================================================
// Retry classification
// ============================================================================

#[test]
fn retryable_errors() {
    assert!(
        GatewayError::Api {
            status: 500,
            body: String::new()
        }
        .is_retryable()
    );
}

#[test]
fn non_retryable_errors() {
    for status in [400, 401, 404, 422, 429, 502, 503] {
        assert!(
            !GatewayError::Api {
                status,
                body: String::new()
            }
            .is_retryable(),
            "{status} must not be retried"
        );
    }
    assert!(!GatewayError::Network("connection reset".into()).is_retryable());
    assert!(
        !GatewayError::Timeout {
            endpoint: "/v1/models".into(),
            timeout: Duration::from_secs(30),
        }
        .is_retryable()
    );
    assert!(!GatewayError::EmptyResponse.is_retryable());
    assert!(!GatewayError::Decode("missing data".into()).is_retryable());
}
