//! Message record model for persistence.
//!
//! Maps to the `messages` table and is used by SqliteConversationStore.

use mirror_core::{ConversationId, Message, NewMessage, StoreError};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct MessageRecord {
    pub id: String,
    /// `chats/{conversation_id}`
    pub namespace: String,
    pub conversation_id: String,
    pub role: String,
    pub content: String,
    pub timestamp: i64,
}

impl MessageRecord {
    /// Creates a record with a generated UUID under the conversation's namespace.
    pub fn new(conversation: &ConversationId, message: &NewMessage) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            namespace: conversation.path(),
            conversation_id: conversation.as_str().to_string(),
            role: message.role.as_str().to_string(),
            content: message.content.clone(),
            timestamp: message.timestamp,
        }
    }

    pub fn into_message(self) -> Result<Message, StoreError> {
        Ok(Message {
            id: self.id,
            role: self.role.parse()?,
            content: self.content,
            timestamp: self.timestamp,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mirror_core::Role;

    #[test]
    fn test_new_record_uses_conversation_namespace() {
        let conversation = ConversationId::new("user_7");
        let record = MessageRecord::new(&conversation, &NewMessage::new(Role::Mirror, "hi", 5));

        assert_eq!(record.namespace, "chats/user_7");
        assert_eq!(record.conversation_id, "user_7");
        assert_eq!(record.role, "mirror");
        assert!(Uuid::parse_str(&record.id).is_ok());

        let message = record.into_message().unwrap();
        assert_eq!(message.role, Role::Mirror);
        assert_eq!(message.timestamp, 5);
    }

    #[test]
    fn test_unknown_role_is_invalid_message() {
        let mut record =
            MessageRecord::new(&ConversationId::new("c"), &NewMessage::new(Role::User, "x", 1));
        record.role = "system".to_string();
        assert!(matches!(
            record.into_message(),
            Err(StoreError::InvalidMessage(_))
        ));
    }
}
