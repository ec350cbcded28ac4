//! Recording fakes shared by this crate's tests.

use async_trait::async_trait;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::api::{ChatApi, ChatApiError, MessageSummary, UserProfile};

#[derive(Default)]
pub struct FakeChatApi {
    users: Vec<UserProfile>,
    messages: Vec<MessageSummary>,
    posted: Mutex<Vec<(Uuid, String)>>,
    stamps_added: Mutex<Vec<(Uuid, Uuid, u32)>>,
    stamps_removed: Mutex<Vec<(Uuid, Uuid)>>,
    deleted: Mutex<Vec<Uuid>>,
    joined: Mutex<Vec<Uuid>>,
    left: Mutex<Vec<Uuid>>,
}

impl FakeChatApi {
    pub fn with_user(mut self, id: Uuid, name: &str, is_bot: bool, suspended: bool) -> Self {
        self.users.push(UserProfile { id, name: name.to_owned(), is_bot, suspended });
        self
    }

    pub fn with_message(mut self, id: Uuid, channel_id: Uuid, author_id: Uuid) -> Self {
        self.messages.push(MessageSummary { id, channel_id, author_id });
        self
    }

    pub async fn posted(&self) -> Vec<(Uuid, String)> {
        self.posted.lock().await.clone()
    }

    pub async fn stamps_added(&self) -> Vec<(Uuid, Uuid, u32)> {
        self.stamps_added.lock().await.clone()
    }

    pub async fn stamps_removed(&self) -> Vec<(Uuid, Uuid)> {
        self.stamps_removed.lock().await.clone()
    }

    pub async fn deleted(&self) -> Vec<Uuid> {
        self.deleted.lock().await.clone()
    }

    pub async fn joined(&self) -> Vec<Uuid> {
        self.joined.lock().await.clone()
    }

    pub async fn left(&self) -> Vec<Uuid> {
        self.left.lock().await.clone()
    }
}

#[async_trait]
impl ChatApi for FakeChatApi {
    async fn post_message(&self, channel_id: Uuid, content: &str) -> Result<(), ChatApiError> {
        self.posted.lock().await.push((channel_id, content.to_owned()));
        Ok(())
    }

    async fn add_stamp(
        &self,
        message_id: Uuid,
        stamp_id: Uuid,
        count: u32,
    ) -> Result<(), ChatApiError> {
        self.stamps_added.lock().await.push((message_id, stamp_id, count));
        Ok(())
    }

    async fn remove_stamp(&self, message_id: Uuid, stamp_id: Uuid) -> Result<(), ChatApiError> {
        self.stamps_removed.lock().await.push((message_id, stamp_id));
        Ok(())
    }

    async fn delete_message(&self, message_id: Uuid) -> Result<(), ChatApiError> {
        self.deleted.lock().await.push(message_id);
        Ok(())
    }

    async fn message(&self, message_id: Uuid) -> Result<MessageSummary, ChatApiError> {
        self.messages
            .iter()
            .find(|message| message.id == message_id)
            .cloned()
            .ok_or_else(|| ChatApiError::NotFound(format!("message {message_id}")))
    }

    async fn join_channel(&self, channel_id: Uuid) -> Result<(), ChatApiError> {
        self.joined.lock().await.push(channel_id);
        Ok(())
    }

    async fn leave_channel(&self, channel_id: Uuid) -> Result<(), ChatApiError> {
        self.left.lock().await.push(channel_id);
        Ok(())
    }

    async fn user(&self, user_id: Uuid) -> Result<UserProfile, ChatApiError> {
        self.users
            .iter()
            .find(|user| user.id == user_id)
            .cloned()
            .ok_or_else(|| ChatApiError::NotFound(format!("user {user_id}")))
    }

    async fn user_by_name(&self, name: &str) -> Result<Option<UserProfile>, ChatApiError> {
        Ok(self.users.iter().find(|user| user.name == name).cloned())
    }
}
