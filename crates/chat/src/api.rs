use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UserProfile {
    pub id: Uuid,
    pub name: String,
    pub is_bot: bool,
    pub suspended: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MessageSummary {
    pub id: Uuid,
    pub channel_id: Uuid,
    pub author_id: Uuid,
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ChatApiError {
    #[error("chat api request failed: {0}")]
    Request(String),
    #[error("not found: {0}")]
    NotFound(String),
}

/// The REST surface command handlers call back into. The real client lives
/// with the deployment; everything in this crate works against the trait.
#[async_trait]
pub trait ChatApi: Send + Sync {
    async fn post_message(&self, channel_id: Uuid, content: &str) -> Result<(), ChatApiError>;

    async fn add_stamp(
        &self,
        message_id: Uuid,
        stamp_id: Uuid,
        count: u32,
    ) -> Result<(), ChatApiError>;

    async fn remove_stamp(&self, message_id: Uuid, stamp_id: Uuid) -> Result<(), ChatApiError>;

    async fn delete_message(&self, message_id: Uuid) -> Result<(), ChatApiError>;

    async fn message(&self, message_id: Uuid) -> Result<MessageSummary, ChatApiError>;

    async fn join_channel(&self, channel_id: Uuid) -> Result<(), ChatApiError>;

    async fn leave_channel(&self, channel_id: Uuid) -> Result<(), ChatApiError>;

    async fn user(&self, user_id: Uuid) -> Result<UserProfile, ChatApiError>;

    async fn user_by_name(&self, name: &str) -> Result<Option<UserProfile>, ChatApiError>;
}

/// Accepts writes, knows nothing. Keeps the process alive without platform
/// credentials.
#[derive(Default)]
pub struct NoopChatApi;

#[async_trait]
impl ChatApi for NoopChatApi {
    async fn post_message(&self, _channel_id: Uuid, _content: &str) -> Result<(), ChatApiError> {
        Ok(())
    }

    async fn add_stamp(
        &self,
        _message_id: Uuid,
        _stamp_id: Uuid,
        _count: u32,
    ) -> Result<(), ChatApiError> {
        Ok(())
    }

    async fn remove_stamp(&self, _message_id: Uuid, _stamp_id: Uuid) -> Result<(), ChatApiError> {
        Ok(())
    }

    async fn delete_message(&self, _message_id: Uuid) -> Result<(), ChatApiError> {
        Ok(())
    }

    async fn message(&self, message_id: Uuid) -> Result<MessageSummary, ChatApiError> {
        Err(ChatApiError::NotFound(format!("message {message_id}")))
    }

    async fn join_channel(&self, _channel_id: Uuid) -> Result<(), ChatApiError> {
        Ok(())
    }

    async fn leave_channel(&self, _channel_id: Uuid) -> Result<(), ChatApiError> {
        Ok(())
    }

    async fn user(&self, user_id: Uuid) -> Result<UserProfile, ChatApiError> {
        Ok(UserProfile { id: user_id, name: "unknown".to_owned(), is_bot: false, suspended: false })
    }

    async fn user_by_name(&self, _name: &str) -> Result<Option<UserProfile>, ChatApiError> {
        Ok(None)
    }
}
