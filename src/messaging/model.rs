//! Message data models

use serde::{Deserialize, Serialize};
use sqlx::types::chrono::{DateTime, Utc};
use uuid::Uuid;
use validator::Validate;

/// Subject stored when the sender leaves it blank
pub const DEFAULT_SUBJECT: &str = "(no subject)";

/// Message database model
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone)]
pub struct Message {
    pub id: Uuid,
    pub sender_id: Uuid,
    pub recipient_id: Uuid,
    pub subject: String,
    pub content: String,
    pub read: bool,
    pub reply_to: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl Message {
    pub fn is_participant(&self, user_id: Uuid) -> bool {
        self.sender_id == user_id || self.recipient_id == user_id
    }
}

/// Request to send a message
#[derive(Debug, Deserialize, Validate)]
pub struct SendMessageRequest {
    pub recipient_id: Uuid,
    #[validate(length(max = 200))]
    pub subject: Option<String>,
    #[validate(length(min = 1, max = 10000))]
    pub content: String,
    pub reply_to: Option<Uuid>,
}

impl SendMessageRequest {
    /// Trimmed subject, or the default when blank
    pub fn subject_or_default(&self) -> String {
        match self.subject.as_deref().map(str::trim) {
            Some(s) if !s.is_empty() => s.to_string(),
            _ => DEFAULT_SUBJECT.to_string(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct UnreadCount {
    pub unread: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(subject: Option<&str>, content: &str) -> SendMessageRequest {
        SendMessageRequest {
            recipient_id: Uuid::new_v4(),
            subject: subject.map(str::to_string),
            content: content.to_string(),
            reply_to: None,
        }
    }

    #[test]
    fn test_blank_subject_falls_back_to_default() {
        assert_eq!(request(None, "hi").subject_or_default(), DEFAULT_SUBJECT);
        assert_eq!(request(Some("   "), "hi").subject_or_default(), DEFAULT_SUBJECT);
        assert_eq!(request(Some(" Loan "), "hi").subject_or_default(), "Loan");
    }

    #[test]
    fn test_empty_content_is_invalid() {
        assert!(request(None, "").validate().is_err());
        assert!(request(None, "hello").validate().is_ok());
    }

    #[test]
    fn test_is_participant() {
        let sender = Uuid::new_v4();
        let recipient = Uuid::new_v4();
        let message = Message {
            id: Uuid::new_v4(),
            sender_id: sender,
            recipient_id: recipient,
            subject: DEFAULT_SUBJECT.to_string(),
            content: "hi".to_string(),
            read: false,
            reply_to: None,
            created_at: Utc::now(),
        };
        assert!(message.is_participant(sender));
        assert!(message.is_participant(recipient));
        assert!(!message.is_participant(Uuid::new_v4()));
    }
}
