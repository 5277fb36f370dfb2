//! Bubble creation requests and the remote "create bubble" collaborator

use serde::{Deserialize, Serialize};

use crate::error::{CreateError, ValidationError};

/// Topics offered by the creation form
pub const TOPICS: [&str; 7] = [
    "Filosofia",
    "Spiritualità",
    "Tecnologia",
    "Arte",
    "Musica",
    "Scienza",
    "Altro",
];

/// A validated "create bubble" payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateBubbleRequest {
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl CreateBubbleRequest {
    /// Trim every field; blank optional fields become `None`
    pub fn new(label: &str, topic: Option<&str>, description: Option<&str>) -> Result<Self, ValidationError> {
        let label = label.trim();
        if label.is_empty() {
            return Err(ValidationError::EmptyLabel);
        }
        let non_blank = |s: Option<&str>| s.map(str::trim).filter(|s| !s.is_empty()).map(String::from);
        Ok(Self {
            label: label.to_string(),
            topic: non_blank(topic),
            description: non_blank(description),
        })
    }

    /// Whether the topic is one of `TOPICS` (or absent)
    pub fn has_known_topic(&self) -> bool {
        self.topic.as_deref().is_none_or(|t| TOPICS.contains(&t))
    }
}

/// Server response to a successful create
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedBubble {
    pub id: String,
    #[serde(default, alias = "reflection_count")]
    pub reflection_count: u32,
}

/// Remote bubble creation call
pub trait BubbleCreator {
    fn create(&mut self, request: &CreateBubbleRequest) -> Result<CreatedBubble, CreateError>;
}

/// What to do with the optimistic bubble when creation fails
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RollbackPolicy {
    /// Leave the pending bubble in place
    #[default]
    Keep,
    /// Remove the pending bubble
    Discard,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_trims_and_drops_blanks() {
        let request = CreateBubbleRequest::new("  Stoici  ", Some("Filosofia"), Some("   ")).unwrap();
        assert_eq!(request.label, "Stoici");
        assert_eq!(request.topic.as_deref(), Some("Filosofia"));
        assert_eq!(request.description, None);
        assert!(request.has_known_topic());
    }

    #[test]
    fn test_request_requires_label() {
        assert_eq!(
            CreateBubbleRequest::new("   ", Some("Arte"), None),
            Err(ValidationError::EmptyLabel)
        );
    }

    #[test]
    fn test_unknown_topic_flagged() {
        let request = CreateBubbleRequest::new("x", Some("Cucina"), None).unwrap();
        assert!(!request.has_known_topic());
        let no_topic = CreateBubbleRequest::new("x", None, None).unwrap();
        assert!(no_topic.has_known_topic());
    }

    #[test]
    fn test_request_json_omits_empty_fields() {
        let request = CreateBubbleRequest::new("x", None, None).unwrap();
        assert_eq!(serde_json::to_string(&request).unwrap(), r#"{"label":"x"}"#);

        let created: CreatedBubble = serde_json::from_str(r#"{"id":"s1","reflection_count":2}"#).unwrap();
        assert_eq!(created.reflection_count, 2);
    }
}
