//! Wire types for the `/chat` endpoint.
//!
//! The request is a single-field JSON object.  The reply is kept as raw JSON
//! because the backend's shape is not guaranteed: a reply either carries an
//! `error` field or is treated as an answer, and fields are rendered exactly
//! as they arrive.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};

/// Text shown for a field the backend did not send.
pub const UNDEFINED: &str = "undefined";

/// Body of a `POST /chat` request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatRequest {
    /// The trimmed user text.
    pub query: String,
}

impl ChatRequest {
    /// Create a new request for the given query.
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
        }
    }
}

/// A decoded reply from `/chat`.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatReply {
    body: Value,
}

impl ChatReply {
    /// Wrap a JSON value as a reply.
    ///
    /// A `null` body cannot be inspected for fields and is rejected.
    pub fn from_value(body: Value) -> Result<Self> {
        if body.is_null() {
            return Err(Error::serialization("response body is null", None));
        }
        Ok(Self { body })
    }

    /// Decode a reply from raw response bytes.
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        let body: Value = serde_json::from_slice(bytes).map_err(|e| {
            Error::serialization(
                format!("Failed to parse response: {e}"),
                Some(Box::new(e)),
            )
        })?;
        Self::from_value(body)
    }

    /// The raw JSON body.
    pub fn body(&self) -> &Value {
        &self.body
    }

    /// The backend-reported error, if the `error` field is present and truthy.
    pub fn error(&self) -> Option<String> {
        self.body
            .get("error")
            .filter(|value| is_truthy(value))
            .map(|value| verbatim(Some(value)))
    }

    /// The `answer` field, rendered verbatim.
    pub fn answer(&self) -> String {
        verbatim(self.body.get("answer"))
    }

    /// The `source` field, rendered verbatim.
    pub fn source(&self) -> String {
        verbatim(self.body.get("source"))
    }

    /// The `confidence` field, rendered verbatim.
    pub fn confidence(&self) -> String {
        verbatim(self.body.get("confidence"))
    }

    /// Check that an answer reply carries well-typed fields.
    ///
    /// `answer` and `source` must be strings; `confidence` must be a number
    /// or a string.  Replies with a truthy `error` are always valid.
    pub fn validate(&self) -> Result<()> {
        if self.error().is_some() {
            return Ok(());
        }
        for field in ["answer", "source"] {
            match self.body.get(field) {
                Some(Value::String(_)) => {}
                _ => {
                    return Err(Error::validation(
                        "expected a string",
                        Some(field.to_string()),
                    ));
                }
            }
        }
        match self.body.get("confidence") {
            Some(Value::Number(_)) | Some(Value::String(_)) => Ok(()),
            _ => Err(Error::validation(
                "expected a number or a string",
                Some("confidence".to_string()),
            )),
        }
    }
}

/// Render a JSON field the way it should appear in the log.
///
/// Strings lose their quotes, numbers keep their exact JSON text, and an
/// absent field becomes [`UNDEFINED`].
pub fn verbatim(value: Option<&Value>) -> String {
    match value {
        None => UNDEFINED.to_string(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

/// JSON truthiness: `null`, `false`, zero and the empty string are false.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, to_value};

    #[test]
    fn request_serialization() {
        let request = ChatRequest::new("what is a block?");
        assert_eq!(
            to_value(&request).unwrap(),
            json!({"query": "what is a block?"})
        );
    }

    #[test]
    fn answer_fields_are_verbatim() {
        let reply =
            ChatReply::from_slice(br#"{"answer":"42","source":"wiki","confidence":0.9}"#).unwrap();
        assert_eq!(reply.error(), None);
        assert_eq!(reply.answer(), "42");
        assert_eq!(reply.source(), "wiki");
        assert_eq!(reply.confidence(), "0.9");
    }

    #[test]
    fn numbers_keep_their_json_text() {
        let reply = ChatReply::from_slice(
            br#"{"answer":1e2,"source":"s","confidence":0.50,"rank":12345678901234567890123}"#,
        )
        .unwrap();
        assert_eq!(reply.answer(), "1e2");
        assert_eq!(reply.confidence(), "0.50");
        assert_eq!(verbatim(reply.body().get("rank")), "12345678901234567890123");
        assert!(is_truthy(&reply.body()["confidence"]));

        let reply = ChatReply::from_slice(br#"{"error":0.0,"answer":"ok"}"#).unwrap();
        assert_eq!(reply.error(), None);
    }

    #[test]
    fn string_confidence() {
        let reply = ChatReply::from_value(json!({"answer": "a", "source": "s", "confidence": "High"}))
            .unwrap();
        assert_eq!(reply.confidence(), "High");
        assert!(reply.validate().is_ok());
    }

    #[test]
    fn missing_fields_render_undefined() {
        let reply = ChatReply::from_value(json!({"status": "ok"})).unwrap();
        assert_eq!(reply.error(), None);
        assert_eq!(reply.answer(), UNDEFINED);
        assert_eq!(reply.source(), UNDEFINED);
        assert_eq!(reply.confidence(), UNDEFINED);
    }

    #[test]
    fn error_field_truthiness() {
        let reply = ChatReply::from_value(json!({"error": "not found"})).unwrap();
        assert_eq!(reply.error(), Some("not found".to_string()));

        for falsy in [json!(""), json!(null), json!(false), json!(0)] {
            let reply = ChatReply::from_value(json!({"error": falsy, "answer": "ok"})).unwrap();
            assert_eq!(reply.error(), None);
            assert_eq!(reply.answer(), "ok");
        }

        let reply = ChatReply::from_value(json!({"error": 503})).unwrap();
        assert_eq!(reply.error(), Some("503".to_string()));

        // Structured errors are shown as their JSON text.
        let reply = ChatReply::from_value(json!({"error": ["a", "b"]})).unwrap();
        assert_eq!(reply.error(), Some(r#"["a","b"]"#.to_string()));
        let reply = ChatReply::from_value(json!({"error": {"code": 7}})).unwrap();
        assert_eq!(reply.error(), Some(r#"{"code":7}"#.to_string()));
    }

    #[test]
    fn non_json_and_null_bodies_are_rejected() {
        assert!(ChatReply::from_slice(b"<html>502</html>").unwrap_err().is_serialization());
        assert!(ChatReply::from_slice(b"null").unwrap_err().is_serialization());
    }

    #[test]
    fn validation() {
        let reply = ChatReply::from_value(json!({"source": "wiki", "confidence": 1})).unwrap();
        let err = reply.validate().unwrap_err();
        assert!(err.is_validation());
        assert!(err.to_string().contains("answer"));

        let reply =
            ChatReply::from_value(json!({"answer": "a", "source": "s", "confidence": [1]})).unwrap();
        assert!(reply.validate().unwrap_err().to_string().contains("confidence"));

        let reply = ChatReply::from_value(json!({"error": "boom"})).unwrap();
        assert!(reply.validate().is_ok());
    }
}
