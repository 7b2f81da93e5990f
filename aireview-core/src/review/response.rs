//! Response envelope delivered to the host

use chrono::Utc;
use serde::{Deserialize, Serialize};

/// One addressable text part of a response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponsePart {
    pub id: u32,
    pub text: String,
}

/// A link the model's answer refers to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reference {
    pub display_text: String,
    pub url: String,
}

/// A source the model's answer quotes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Citation {
    pub text: String,
    pub url: String,
}

/// Structured reply handed to the listener
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatResponse {
    pub response_parts: Vec<ResponsePart>,
    // TODO: populate references and citations once Gemini grounding metadata is parsed
    pub references: Vec<Reference>,
    pub citations: Vec<Citation>,
    pub timestamp_millis: i64,
}

impl ChatResponse {
    /// Single-part response stamped with the current time
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            response_parts: vec![ResponsePart {
                id: 0,
                text: text.into(),
            }],
            references: Vec::new(),
            citations: Vec::new(),
            timestamp_millis: Utc::now().timestamp_millis(),
        }
    }

    /// All parts concatenated in order
    pub fn full_text(&self) -> String {
        self.response_parts
            .iter()
            .map(|p| p.text.as_str())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_envelope_shape() {
        let before = Utc::now().timestamp_millis();
        let response = ChatResponse::text("Looks good");

        assert_eq!(response.response_parts.len(), 1);
        assert_eq!(response.response_parts[0].id, 0);
        assert_eq!(response.full_text(), "Looks good");
        assert!(response.references.is_empty());
        assert!(response.citations.is_empty());
        assert!(response.timestamp_millis >= before);
    }

    #[test]
    fn test_serialized_field_names() {
        let json = serde_json::to_value(ChatResponse::text("hi")).unwrap();
        assert_eq!(json["response_parts"][0]["text"], "hi");
        assert_eq!(json["references"], serde_json::json!([]));
        assert_eq!(json["citations"], serde_json::json!([]));
        assert!(json["timestamp_millis"].is_i64());
    }
}
