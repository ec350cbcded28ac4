use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BotEnvelope {
    pub envelope_id: String,
    pub event: BotEvent,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BotEvent {
    MessageCreated(MessageCreatedEvent),
    DirectMessageCreated(MessageCreatedEvent),
    Unsupported { event_type: String },
}

impl BotEvent {
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::MessageCreated(_) => "message_created",
            Self::DirectMessageCreated(_) => "direct_message_created",
            Self::Unsupported { .. } => "unsupported",
        }
    }

    /// The message payload for either message-bearing event kind.
    pub fn message(&self) -> Option<&MessageCreatedEvent> {
        match self {
            Self::MessageCreated(event) | Self::DirectMessageCreated(event) => Some(event),
            Self::Unsupported { .. } => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MessageCreatedEvent {
    pub message_id: Uuid,
    pub channel_id: Uuid,
    pub author: MessageAuthor,
    pub text: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MessageAuthor {
    pub id: Uuid,
    pub name: String,
    pub is_bot: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EventContext {
    pub correlation_id: String,
}

impl Default for EventContext {
    fn default() -> Self {
        Self { correlation_id: "untracked".to_owned() }
    }
}
