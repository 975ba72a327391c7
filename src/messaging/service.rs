//! Messaging service layer

use sqlx::PgPool;
use uuid::Uuid;

use super::contacts::{contact_filter_for, ContactFilter};
use super::model::{Message, SendMessageRequest, UnreadCount};
use crate::db::page_window;
use crate::error::{ApiError, ApiResult};
use crate::models::{Actor, PaginationParams, Profile};

/// Message service
#[derive(Clone)]
pub struct MessageService {
    db_pool: PgPool,
}

impl MessageService {
    pub fn new(db_pool: PgPool) -> Self {
        Self { db_pool }
    }

    /// Send a message, optionally as a reply to one the sender is part of
    pub async fn send_message(
        &self,
        actor: &Actor,
        request: SendMessageRequest,
    ) -> ApiResult<Message> {
        if request.recipient_id == actor.user_id {
            return Err(ApiError::BadRequest(
                "You cannot send a message to yourself".to_string(),
            ));
        }
        if request.content.trim().is_empty() {
            return Err(ApiError::ValidationError(
                "Message content cannot be empty".to_string(),
            ));
        }

        let recipient_exists: Option<(Uuid,)> =
            sqlx::query_as("SELECT id FROM profiles WHERE id = $1")
                .bind(request.recipient_id)
                .fetch_optional(&self.db_pool)
                .await?;
        if recipient_exists.is_none() {
            return Err(ApiError::NotFound(format!(
                "Recipient {} not found",
                request.recipient_id
            )));
        }

        if let Some(parent_id) = request.reply_to {
            let parent = self.find_message(parent_id).await?;
            if !parent.is_participant(actor.user_id) {
                return Err(ApiError::Forbidden(
                    "You can only reply to your own conversations".to_string(),
                ));
            }
        }

        let subject = request.subject_or_default();

        let message = sqlx::query_as::<_, Message>(
            r#"
            INSERT INTO messages (sender_id, recipient_id, subject, content, reply_to)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(actor.user_id)
        .bind(request.recipient_id)
        .bind(subject)
        .bind(request.content)
        .bind(request.reply_to)
        .fetch_one(&self.db_pool)
        .await?;

        tracing::info!(
            message_id = %message.id,
            sender_id = %actor.user_id,
            recipient_id = %message.recipient_id,
            "Message sent"
        );

        Ok(message)
    }

    /// Messages received by the actor, newest first
    pub async fn inbox(&self, actor: &Actor, page: PaginationParams) -> ApiResult<Vec<Message>> {
        let (offset, limit) = page_window(page.page, page.limit);

        let messages = sqlx::query_as::<_, Message>(
            r#"
            SELECT * FROM messages
            WHERE recipient_id = $1
            ORDER BY created_at DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(actor.user_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.db_pool)
        .await?;

        Ok(messages)
    }

    /// Messages sent by the actor, newest first
    pub async fn sent(&self, actor: &Actor, page: PaginationParams) -> ApiResult<Vec<Message>> {
        let (offset, limit) = page_window(page.page, page.limit);

        let messages = sqlx::query_as::<_, Message>(
            r#"
            SELECT * FROM messages
            WHERE sender_id = $1
            ORDER BY created_at DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(actor.user_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.db_pool)
        .await?;

        Ok(messages)
    }

    pub async fn get_message(&self, actor: &Actor, id: Uuid) -> ApiResult<Message> {
        let message = self.find_message(id).await?;
        if !message.is_participant(actor.user_id) {
            return Err(ApiError::Forbidden(
                "You are not part of this conversation".to_string(),
            ));
        }
        Ok(message)
    }

    /// Mark a received message read; repeated calls are no-ops
    pub async fn mark_as_read(&self, actor: &Actor, id: Uuid) -> ApiResult<Message> {
        let message = self.find_message(id).await?;
        if message.recipient_id != actor.user_id {
            return Err(ApiError::Forbidden(
                "Only the recipient can mark a message as read".to_string(),
            ));
        }
        if message.read {
            return Ok(message);
        }

        let message = sqlx::query_as::<_, Message>(
            "UPDATE messages SET read = TRUE WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .fetch_one(&self.db_pool)
        .await?;

        tracing::debug!(message_id = %id, "Message marked as read");

        Ok(message)
    }

    pub async fn delete_message(&self, actor: &Actor, id: Uuid) -> ApiResult<()> {
        let message = self.find_message(id).await?;
        if !message.is_participant(actor.user_id) {
            return Err(ApiError::Forbidden(
                "You are not part of this conversation".to_string(),
            ));
        }

        sqlx::query("DELETE FROM messages WHERE id = $1")
            .bind(id)
            .execute(&self.db_pool)
            .await?;

        tracing::info!(message_id = %id, deleted_by = %actor.user_id, "Message deleted");

        Ok(())
    }

    pub async fn unread_count(&self, actor: &Actor) -> ApiResult<UnreadCount> {
        let (unread,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM messages WHERE recipient_id = $1 AND NOT read",
        )
        .bind(actor.user_id)
        .fetch_one(&self.db_pool)
        .await?;

        Ok(UnreadCount { unread })
    }

    /// Profiles the actor can message, by display name
    pub async fn contacts(&self, actor: &Actor) -> ApiResult<Vec<Profile>> {
        let profiles = match contact_filter_for(actor.role) {
            ContactFilter::Role(role) => {
                sqlx::query_as::<_, Profile>(
                    r#"
                    SELECT * FROM profiles
                    WHERE role = $1 AND id <> $2
                    ORDER BY full_name NULLS LAST, id
                    "#,
                )
                .bind(role)
                .bind(actor.user_id)
                .fetch_all(&self.db_pool)
                .await?
            }
            ContactFilter::Everyone => {
                sqlx::query_as::<_, Profile>(
                    "SELECT * FROM profiles WHERE id <> $1 ORDER BY full_name NULLS LAST, id",
                )
                .bind(actor.user_id)
                .fetch_all(&self.db_pool)
                .await?
            }
        };

        Ok(profiles)
    }

    async fn find_message(&self, id: Uuid) -> ApiResult<Message> {
        sqlx::query_as::<_, Message>("SELECT * FROM messages WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.db_pool)
            .await?
            .ok_or_else(|| ApiError::NotFound(format!("Message {} not found", id)))
    }
}
