use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::ProtocolError;

/// Outbound envelope published to the channel.
#[derive(Debug, Serialize)]
pub struct OutboundFrame<'a> {
    pub text: &'a str,
    pub username: &'a str,
}

/// Inbound envelope after validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundFrame {
    pub username: String,
    pub text: String,
}

pub fn encode_frame(text: &str, username: &str) -> Result<String, serde_json::Error> {
    serde_json::to_string(&OutboundFrame { text, username })
}

/// Parse a frame received from the channel. The frame must be a JSON
/// object; extra keys are ignored. Both fields must be non-empty strings
/// and the text is returned trimmed.
pub fn parse_frame(raw: &str) -> Result<InboundFrame, ProtocolError> {
    let mut frame: Map<String, Value> = serde_json::from_str(raw)?;

    let username =
        non_empty_string(frame.remove("username")).ok_or(ProtocolError::MissingField("username"))?;
    let text = non_empty_string(frame.remove("text")).ok_or(ProtocolError::MissingField("text"))?;

    Ok(InboundFrame {
        username,
        text: text.trim().to_string(),
    })
}

fn non_empty_string(value: Option<Value>) -> Option<String> {
    match value {
        Some(Value::String(s)) if !s.trim().is_empty() => Some(s),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_text_and_username() {
        let frame = encode_frame("hello", "alice").unwrap();
        let value: serde_json::Value = serde_json::from_str(&frame).unwrap();
        assert_eq!(value, serde_json::json!({ "text": "hello", "username": "alice" }));
    }

    #[test]
    fn parses_frame_with_extra_fields() {
        let frame = parse_frame(r#"{"username":"bob","text":" hi ","extra":1}"#).unwrap();
        assert_eq!(frame.username, "bob");
        assert_eq!(frame.text, "hi");
    }

    #[test]
    fn rejects_malformed_frames() {
        assert!(matches!(parse_frame("not json"), Err(ProtocolError::InvalidJson(_))));
        assert!(matches!(
            parse_frame(r#"{"username":"bob"}"#),
            Err(ProtocolError::MissingField("text"))
        ));
        assert!(matches!(
            parse_frame(r#"{"username":"","text":"hi"}"#),
            Err(ProtocolError::MissingField("username"))
        ));
        assert!(matches!(
            parse_frame(r#"{"username":"bob","text":42}"#),
            Err(ProtocolError::MissingField("text"))
        ));
        assert!(matches!(parse_frame("[1,2,3]"), Err(ProtocolError::InvalidJson(_))));
        assert!(matches!(
            parse_frame(r#"["bob","hi"]"#),
            Err(ProtocolError::InvalidJson(_))
        ));
        assert!(parse_frame(r#""bob: hi""#).is_err());
    }
}
