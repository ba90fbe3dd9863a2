//! Body decoding for upstream responses.
//!
//! Upstream does not set `Content-Type` consistently: JSON bodies sometimes
//! arrive as `text/plain` or with no content type at all, and some
//! endpoints answer with bare text. Everything that tolerates this lives
//! here; the typed decoders in [`crate::types`] only ever see JSON values.

use serde_json::{Value, json};

use crate::{GatewayError, Result};

/// Field under which a non-JSON text body is wrapped.
pub(crate) const TEXT_BODY_FIELD: &str = "response";

/// Decode a response body into a JSON value.
///
/// - Declared JSON must parse; a malformed body is an error.
/// - Anything else is parsed as JSON if possible, and otherwise wrapped as
///   `{"response": <text>}`.
pub(crate) fn decode_body(content_type: Option<&str>, text: &str) -> Result<Value> {
    let declared_json = content_type.is_some_and(|ct| ct.contains("application/json"));
    if declared_json {
        return serde_json::from_str(text)
            .map_err(|e| GatewayError::Decode(format!("invalid JSON body: {e}")));
    }
    Ok(serde_json::from_str(text).unwrap_or_else(|_| json!({ TEXT_BODY_FIELD: text })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn declared_json_is_parsed() {
        let value = decode_body(Some("application/json; charset=utf-8"), r#"{"a":1}"#).unwrap();
        assert_eq!(value["a"], 1);
    }

    #[test]
    fn declared_json_must_be_valid() {
        let err = decode_body(Some("application/json"), "not json").unwrap_err();
        assert!(matches!(err, GatewayError::Decode(_)));
    }

    #[test]
    fn mislabelled_json_is_still_parsed() {
        let value = decode_body(Some("text/plain"), r#"{"data":{"images":[]}}"#).unwrap();
        assert!(value["data"]["images"].is_array());

        let value = decode_body(None, "[1,2]").unwrap();
        assert_eq!(value, json!([1, 2]));
    }

    #[test]
    fn plain_text_is_wrapped() {
        let value = decode_body(Some("text/html"), "<p>done</p>").unwrap();
        assert_eq!(value, json!({ "response": "<p>done</p>" }));
    }
}
