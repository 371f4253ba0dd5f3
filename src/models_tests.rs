//! Unit tests for domain models

#[cfg(test)]
mod tests {
    use serde_json::json;
    use uuid::Uuid;

    use crate::models::*;

    fn result_with(distance: f32, metadata: serde_json::Value) -> RetrievalResult {
        RetrievalResult {
            text: "Ashish builds backend systems.".to_string(),
            metadata: metadata.as_object().cloned().unwrap_or_default(),
            distance,
        }
    }

    #[test]
    fn test_relevance_score_mapping() {
        assert!((result_with(0.0, json!({})).relevance_score() - 1.0).abs() < f32::EPSILON);
        assert!((result_with(0.5, json!({})).relevance_score() - 0.75).abs() < 1e-6);
        assert!((result_with(1.234, json!({})).relevance_score() - 0.38).abs() < 1e-6);
    }

    #[test]
    fn test_relevance_score_is_clamped() {
        assert_eq!(result_with(3.5, json!({})).relevance_score(), 0.0);
    }

    #[test]
    fn test_source_name_defaults_to_unknown() {
        assert_eq!(result_with(0.1, json!({})).source_name(), "Unknown");
        assert_eq!(
            result_with(0.1, json!({"source": "resume.md"})).source_name(),
            "resume.md"
        );
    }

    #[test]
    fn test_source_document_from_result() {
        let result = result_with(0.4, json!({"source": "about.md", "chunk_index": 0}));
        let doc = SourceDocument::from(&result);
        assert_eq!(doc.content, result.text);
        assert_eq!(doc.metadata["chunk_index"], json!(0));
        assert_eq!(doc.relevance_score, Some(0.8));
    }

    #[test]
    fn test_role_serializes_lowercase() {
        let message = ChatMessage::assistant("hello");
        let value = serde_json::to_value(&message).unwrap();
        assert_eq!(value, json!({"role": "assistant", "content": "hello"}));
        assert_eq!(Role::User.as_str(), "user");
    }

    #[test]
    fn test_chat_request_defaults() {
        let request: ChatRequest =
            serde_json::from_str(r#"{"question": "Where does Ashish work?"}"#).unwrap();
        assert!(request.conversation_id.is_none());
        assert!(!request.stream);
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_chat_request_validation() {
        assert!(ChatRequest::new("   ").validate().is_err());
        assert!(ChatRequest::new("x".repeat(MAX_QUESTION_CHARS)).validate().is_ok());
        assert!(ChatRequest::new("x".repeat(MAX_QUESTION_CHARS + 1))
            .validate()
            .is_err());
    }

    #[test]
    fn test_with_conversation() {
        let id = Uuid::new_v4();
        let request = ChatRequest::new("hi").with_conversation(id);
        assert_eq!(request.conversation_id, Some(id));
    }
}
