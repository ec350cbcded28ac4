//! Command grammars and execution.
//!
//! Each command module pairs an argument type parsed from a
//! [`CommandReader`](facebot_core::command::CommandReader) with an async
//! execution function. Parsing returns `None` on any grammar violation; the
//! dispatcher maps that to invalid-arguments feedback.

pub mod face;
pub mod hello;
pub mod help;
pub mod rmmsg;
pub mod status;

use facebot_core::config::StampConfig;
use facebot_core::ledger::FaceScoreRepository;
use thiserror::Error;
use uuid::Uuid;

use crate::api::ChatApi;
use crate::events::MessageAuthor;
use crate::health::HealthReporter;

/// Everything a command execution may need. Built once per dispatched
/// message.
pub struct CommandContext<'a> {
    pub sender: &'a MessageAuthor,
    pub admin_user_id: Uuid,
    pub stamps: &'a StampConfig,
    pub api: &'a dyn ChatApi,
    pub ledger: &'a dyn FaceScoreRepository,
    pub health: &'a dyn HealthReporter,
}

/// What a successful command sends back: a reply message, a reaction stamp
/// on the triggering message, or nothing.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CommandOutcome {
    pub message: Option<String>,
    pub stamp: Option<Uuid>,
}

impl CommandOutcome {
    pub fn message(text: impl Into<String>) -> Self {
        Self { message: Some(text.into()), stamp: None }
    }

    pub fn stamp(id: Uuid) -> Self {
        Self { message: None, stamp: Some(id) }
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum CommandError {
    #[error("unknown command")]
    UnknownCommand,
    #[error("invalid arguments: {0}")]
    InvalidArguments(String),
    #[error("permission denied")]
    PermissionDenied,
    #[error("internal failure: {0}")]
    Internal(String),
}

impl CommandError {
    pub fn invalid(detail: impl Into<String>) -> Self {
        Self::InvalidArguments(detail.into())
    }
}

impl From<crate::api::ChatApiError> for CommandError {
    fn from(error: crate::api::ChatApiError) -> Self {
        Self::Internal(error.to_string())
    }
}

impl From<facebot_core::ledger::StoreError> for CommandError {
    fn from(error: facebot_core::ledger::StoreError) -> Self {
        Self::Internal(error.to_string())
    }
}

/// Accepts a raw message id or a message URL whose last path segment is the
/// id.
pub(crate) fn parse_message_id(value: &str) -> Option<Uuid> {
    if let Ok(id) = Uuid::parse_str(value) {
        return Some(id);
    }
    let tail = value.trim_end_matches('/').rsplit('/').next()?;
    Uuid::parse_str(tail).ok()
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::parse_message_id;

    const ID: &str = "7a9d2a3e-1c4b-4a9e-8f00-d2f5a1b6c7d8";

    #[test]
    fn accepts_a_bare_uuid() {
        assert_eq!(parse_message_id(ID), Some(Uuid::parse_str(ID).expect("uuid")));
    }

    #[test]
    fn accepts_a_message_url() {
        let url = format!("https://chat.example.com/messages/{ID}");
        assert_eq!(parse_message_id(&url), Some(Uuid::parse_str(ID).expect("uuid")));
    }

    #[test]
    fn rejects_garbage() {
        assert_eq!(parse_message_id("not-an-id"), None);
        assert_eq!(parse_message_id("https://chat.example.com/messages/xyz"), None);
    }
}
