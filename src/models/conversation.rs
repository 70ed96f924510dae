//! Conversations and their messages.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::Paginated;

/// A conversation (chat session) of one agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conversation {
    pub id: i64,
    #[serde(default)]
    pub name: Option<String>,
    pub project_id: i64,
    /// Identifier used in message paths.
    pub session_id: String,
    #[serde(default)]
    pub created_by: Option<i64>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

/// One prompt/response pair inside a conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: i64,
    #[serde(default)]
    pub user_query: String,
    #[serde(default)]
    pub openai_response: Option<String>,
    #[serde(default)]
    pub conversation_id: Option<i64>,
    /// Ids of the pages cited by the response.
    #[serde(default)]
    pub citations: Vec<i64>,
    #[serde(default)]
    pub response_feedback: Option<Value>,
    #[serde(default)]
    pub metadata: Option<Value>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

impl Message {
    /// The answer text, or an empty string if none was produced.
    pub fn response(&self) -> &str {
        self.openai_response.as_deref().unwrap_or_default()
    }
}

/// Message listing: the conversation plus one page of its messages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationMessages {
    #[serde(default)]
    pub conversation: Option<Conversation>,
    pub messages: Paginated<Message>,
}

/// Body of a message send, streamed or not.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SendMessage {
    pub prompt: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_persona: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chatbot_model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_source: Option<String>,
}

impl SendMessage {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            ..Default::default()
        }
    }
}

/// Feedback on a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Reaction {
    Liked,
    Disliked,
    Neutral,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_message_deserialize() {
        let msg: Message = serde_json::from_value(json!({
            "id": 7,
            "user_query": "What is X?",
            "openai_response": "X is Y.",
            "citations": [3, 9]
        }))
        .unwrap();
        assert_eq!(msg.response(), "X is Y.");
        assert_eq!(msg.citations, vec![3, 9]);
    }

    #[test]
    fn test_conversation_messages() {
        let page: ConversationMessages = serde_json::from_value(json!({
            "conversation": {"id": 1, "project_id": 2, "session_id": "abc"},
            "messages": {"current_page": 1, "data": [{"id": 5, "user_query": "hi"}]}
        }))
        .unwrap();
        assert_eq!(page.conversation.unwrap().session_id, "abc");
        assert_eq!(page.messages.data[0].response(), "");
    }

    #[test]
    fn test_send_message_skips_unset() {
        let body = serde_json::to_value(SendMessage::new("hi")).unwrap();
        assert_eq!(body, json!({ "prompt": "hi" }));
    }

    #[test]
    fn test_reaction_wire_names() {
        assert_eq!(serde_json::to_value(Reaction::Disliked).unwrap(), json!("disliked"));
    }
}
