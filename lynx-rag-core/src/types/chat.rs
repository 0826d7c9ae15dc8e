//! Chat message, request and response types exchanged with chat handlers.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::ExtraValue;

/// Role of a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// Message from the user.
    User,
    /// Message from the assistant.
    Assistant,
    /// System message providing instructions.
    System,
    /// Tool output fed back to the model.
    Tool,
}

impl std::fmt::Display for MessageRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::User => "user",
            Self::Assistant => "assistant",
            Self::System => "system",
            Self::Tool => "tool",
        };
        f.write_str(label)
    }
}

/// A single message in a conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Role of the message sender.
    pub role: MessageRole,

    /// Content of the message.
    pub content: String,

    /// Optional metadata for the message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<HashMap<String, serde_json::Value>>,
}

impl ChatMessage {
    /// Create a message with the given role.
    pub fn new<S: Into<String>>(role: MessageRole, content: S) -> Self {
        Self {
            role,
            content: content.into(),
            metadata: None,
        }
    }

    /// Create a user message.
    pub fn user<S: Into<String>>(content: S) -> Self {
        Self::new(MessageRole::User, content)
    }

    /// Create an assistant message.
    pub fn assistant<S: Into<String>>(content: S) -> Self {
        Self::new(MessageRole::Assistant, content)
    }

    /// Create a system message.
    pub fn system<S: Into<String>>(content: S) -> Self {
        Self::new(MessageRole::System, content)
    }
}

/// A request handed to a chat handler.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChatRequest {
    /// Conversation so far, oldest first.
    pub messages: Vec<ChatMessage>,

    /// Free-form call parameters (model options, user id, filters...).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameters: Option<HashMap<String, serde_json::Value>>,
}

impl ChatRequest {
    /// Create a request from a message list.
    #[must_use]
    pub fn new(messages: Vec<ChatMessage>) -> Self {
        Self {
            messages,
            parameters: None,
        }
    }

    /// Add a call parameter.
    #[must_use]
    pub fn with_parameter<K, V>(mut self, key: K, value: V) -> Self
    where
        K: Into<String>,
        V: Into<serde_json::Value>,
    {
        self.parameters
            .get_or_insert_with(HashMap::new)
            .insert(key.into(), value.into());
        self
    }

    /// The most recent user message, if any.
    #[must_use]
    pub fn last_user_message(&self) -> Option<&ChatMessage> {
        self.messages
            .iter()
            .rev()
            .find(|m| m.role == MessageRole::User)
    }

    /// Replace the text of the most recent user message.
    ///
    /// Returns `false` when the request carries no user message.
    pub fn replace_last_user_message_text<S: Into<String>>(&mut self, text: S) -> bool {
        match self
            .messages
            .iter_mut()
            .rev()
            .find(|m| m.role == MessageRole::User)
        {
            Some(message) => {
                message.content = text.into();
                true
            }
            None => false,
        }
    }
}

/// A complete response, or one chunk of a streamed response.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChatResponse {
    /// Generated text.
    pub content: String,

    /// Response metadata (usage, finish reason, retrieved documents...).
    pub metadata: HashMap<String, ExtraValue>,
}

impl ChatResponse {
    /// Create a response with the given content.
    pub fn new<S: Into<String>>(content: S) -> Self {
        Self {
            content: content.into(),
            metadata: HashMap::new(),
        }
    }

    /// Get a metadata value.
    #[must_use]
    pub fn get_metadata(&self, key: &str) -> Option<&ExtraValue> {
        self.metadata.get(key)
    }

    /// Set a metadata value, replacing any previous one.
    pub fn set_metadata<K: Into<String>, V: Into<ExtraValue>>(&mut self, key: K, value: V) {
        self.metadata.insert(key.into(), value.into());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_last_user_message_skips_assistant() {
        let request = ChatRequest::new(vec![
            ChatMessage::system("be brief"),
            ChatMessage::user("first"),
            ChatMessage::assistant("reply"),
            ChatMessage::user("second"),
            ChatMessage::assistant("pending"),
        ]);
        assert_eq!(request.last_user_message().unwrap().content, "second");
    }

    #[test]
    fn test_replace_last_user_message_text() {
        let mut request = ChatRequest::new(vec![
            ChatMessage::user("first"),
            ChatMessage::user("second"),
        ]);
        assert!(request.replace_last_user_message_text("rewritten"));
        assert_eq!(request.messages[0].content, "first");
        assert_eq!(request.messages[1].content, "rewritten");

        let mut empty = ChatRequest::default();
        assert!(!empty.replace_last_user_message_text("x"));
    }

    #[test]
    fn test_role_serializes_lowercase() {
        let json = serde_json::to_string(&ChatMessage::user("hi")).unwrap();
        assert_eq!(json, r#"{"role":"user","content":"hi"}"#);
    }
}
