use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use facebot_core::command::{CommandReader, MarkupOracle};
use facebot_core::config::BotConfig;
use facebot_core::ledger::FaceScoreRepository;
use facebot_core::markup::{self, EmbeddingKind};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::api::ChatApi;
use crate::commands::{self, CommandContext, CommandError, CommandOutcome};
use crate::events::{BotEnvelope, EventContext, MessageCreatedEvent};
use crate::health::HealthReporter;
use crate::reactions;
use crate::runner::EnvelopeHandler;

/// How one message was disposed of.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Handled {
    /// Recognized as a command; a reply, stamp, or error feedback went out.
    Command,
    /// Matched the auto-reaction table.
    Reaction,
    /// Neither a command nor a reaction.
    Ignored,
}

/// Routes incoming messages to command handlers and auto-reactions.
///
/// A command invocation is either the configured prefix (`/face count`) or a
/// leading @-mention of the bot (`@facebot face count`). Mention-triggered
/// readers carry an empty command name, so the verb is pulled from the first
/// value token instead.
pub struct CommandDispatcher {
    bot: BotConfig,
    api: Arc<dyn ChatApi>,
    ledger: Arc<dyn FaceScoreRepository>,
    health: Arc<dyn HealthReporter>,
}

impl CommandDispatcher {
    pub fn new(
        bot: BotConfig,
        api: Arc<dyn ChatApi>,
        ledger: Arc<dyn FaceScoreRepository>,
        health: Arc<dyn HealthReporter>,
    ) -> Self {
        Self { bot, api, ledger, health }
    }

    pub async fn handle_message(
        &self,
        event: &MessageCreatedEvent,
        ctx: &EventContext,
    ) -> Handled {
        if event.author.is_bot {
            return Handled::Ignored;
        }
        let text = event.text.trim();
        if text.is_empty() {
            return Handled::Ignored;
        }

        let (command_text, is_mention_triggered) = self.strip_self_mention(text);
        let oracle = MarkupOracle;
        let Some(mut reader) = CommandReader::try_new(
            command_text,
            is_mention_triggered,
            &self.bot.command_prefix,
            &oracle,
        ) else {
            return self.try_react(event).await;
        };

        let verb = if reader.command_name().is_empty() && is_mention_triggered {
            reader.next_value_only().unwrap_or("")
        } else {
            reader.command_name()
        };

        let started = Instant::now();
        match self.execute(verb, &mut reader, event).await {
            Some(Ok(outcome)) => {
                self.deliver(event, outcome, ctx).await;
                info!(
                    event_name = "dispatch.command_executed",
                    correlation_id = %ctx.correlation_id,
                    command = verb,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "executed command"
                );
                Handled::Command
            }
            Some(Err(error)) => {
                self.report_error(event, &error, ctx).await;
                Handled::Command
            }
            None => {
                if is_mention_triggered {
                    self.report_error(event, &CommandError::UnknownCommand, ctx).await;
                    Handled::Command
                } else {
                    self.try_react(event).await
                }
            }
        }
    }

    /// Runs the handler for `verb`, or `None` when no such command exists.
    async fn execute(
        &self,
        verb: &str,
        reader: &mut CommandReader<'_>,
        event: &MessageCreatedEvent,
    ) -> Option<Result<CommandOutcome, CommandError>> {
        let ctx = CommandContext {
            sender: &event.author,
            admin_user_id: self.bot.admin_user_id,
            stamps: &self.bot.stamps,
            api: self.api.as_ref(),
            ledger: self.ledger.as_ref(),
            health: self.health.as_ref(),
        };

        Some(match verb {
            "face" => match commands::face::parse(reader) {
                Some(args) => commands::face::run(args, &ctx).await,
                None => Err(CommandError::invalid("unrecognized `face` arguments")),
            },
            "hello" => match commands::hello::parse(reader) {
                Some(()) => commands::hello::run(&ctx).await,
                None => Err(CommandError::invalid("`hello` takes no arguments")),
            },
            "help" => match commands::help::parse(reader) {
                Some(()) => commands::help::run().await,
                None => Err(CommandError::invalid("`help` takes no arguments")),
            },
            "status" => match commands::status::parse(reader) {
                Some(()) => commands::status::run(&ctx).await,
                None => Err(CommandError::invalid("`status` takes no arguments")),
            },
            "rmmsg" => match commands::rmmsg::parse(reader) {
                Some(message_id) => commands::rmmsg::run(message_id, &ctx).await,
                None => Err(CommandError::invalid("`rmmsg` expects a message id or url")),
            },
            "join" => {
                if reader.has_any_arguments() {
                    Err(CommandError::invalid("`join` takes no arguments"))
                } else {
                    self.api
                        .join_channel(event.channel_id)
                        .await
                        .map(|()| CommandOutcome::stamp(self.bot.stamps.ack))
                        .map_err(CommandError::from)
                }
            }
            "leave" => {
                if reader.has_any_arguments() {
                    Err(CommandError::invalid("`leave` takes no arguments"))
                } else {
                    self.api
                        .leave_channel(event.channel_id)
                        .await
                        .map(|()| CommandOutcome::stamp(self.bot.stamps.wave))
                        .map_err(CommandError::from)
                }
            }
            _ => return None,
        })
    }

    async fn deliver(
        &self,
        event: &MessageCreatedEvent,
        outcome: CommandOutcome,
        ctx: &EventContext,
    ) {
        if let Some(message) = outcome.message {
            if let Err(error) = self.api.post_message(event.channel_id, &message).await {
                warn!(
                    correlation_id = %ctx.correlation_id,
                    error = %error,
                    "failed to post command reply"
                );
            }
        }
        if let Some(stamp) = outcome.stamp {
            self.add_stamp(event.message_id, stamp, ctx).await;
        }
    }

    async fn report_error(
        &self,
        event: &MessageCreatedEvent,
        error: &CommandError,
        ctx: &EventContext,
    ) {
        let stamp = match error {
            CommandError::Internal(_) => {
                warn!(
                    correlation_id = %ctx.correlation_id,
                    command = %event.text,
                    error = %error,
                    "internal error while executing command"
                );
                self.bot.stamps.explosion
            }
            CommandError::PermissionDenied => {
                info!(
                    correlation_id = %ctx.correlation_id,
                    command = %event.text,
                    "permission denied"
                );
                self.bot.stamps.no_entry
            }
            CommandError::UnknownCommand | CommandError::InvalidArguments(_) => {
                debug!(
                    correlation_id = %ctx.correlation_id,
                    command = %event.text,
                    error = %error,
                    "command rejected"
                );
                self.bot.stamps.question
            }
        };
        self.add_stamp(event.message_id, stamp, ctx).await;
    }

    async fn try_react(&self, event: &MessageCreatedEvent) -> Handled {
        let Some(reaction) = reactions::tail_reaction(&event.text, &self.bot.stamps) else {
            return Handled::Ignored;
        };

        if let Some(stamp) = reaction.stamp {
            self.add_stamp(event.message_id, stamp, &EventContext::default()).await;
        }
        if let Some(message) = reaction.message {
            if let Err(error) = self.api.post_message(event.channel_id, &message).await {
                warn!(error = %error, "failed to post auto-reaction reply");
            }
        }
        Handled::Reaction
    }

    async fn add_stamp(&self, message_id: Uuid, stamp: Uuid, ctx: &EventContext) {
        if stamp.is_nil() {
            return;
        }
        if let Err(error) = self.api.add_stamp(message_id, stamp, 1).await {
            warn!(
                correlation_id = %ctx.correlation_id,
                error = %error,
                "failed to add feedback stamp"
            );
        }
    }

    fn strip_self_mention<'t>(&self, text: &'t str) -> (&'t str, bool) {
        if let Some(embedding) = markup::parse_head(text) {
            if embedding.kind == EmbeddingKind::UserMention && embedding.id == self.bot.user_id {
                return (text[embedding.raw.len()..].trim_start(), true);
            }
        }
        (text, false)
    }
}

#[async_trait]
impl EnvelopeHandler for CommandDispatcher {
    async fn handle(&self, envelope: &BotEnvelope, ctx: &EventContext) -> anyhow::Result<()> {
        match envelope.event.message() {
            Some(event) => {
                self.handle_message(event, ctx).await;
            }
            None => {
                debug!(
                    correlation_id = %ctx.correlation_id,
                    event_type = envelope.event.event_type(),
                    "ignoring unsupported event"
                );
            }
        }
        Ok(())
    }
}
