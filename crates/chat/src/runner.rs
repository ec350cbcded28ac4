//! Bot event loop.
//!
//! The platform delivers events over one long-lived stream. The runner keeps
//! that stream open the way the platform's own clients do: reopen after every
//! drop, pace the attempts, and stop only after a run of consecutive failures
//! long enough to look like a real outage rather than a blip.

use std::{sync::Arc, time::Duration};

use anyhow::Result;
use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::events::{BotEnvelope, EventContext};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("could not open the event stream: {0}")]
    Connection(String),
    #[error("event stream read failed: {0}")]
    Stream(String),
    #[error("event stream close failed: {0}")]
    Shutdown(String),
}

/// Pacing for stream reopening. Every consecutive failure lengthens the
/// pause by `delay_step_ms` (up to `delay_cap_ms`); a successful connection
/// resets the count, so a long-lived session tolerates any number of
/// isolated drops.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetryWindow {
    pub max_consecutive_failures: u32,
    pub delay_step_ms: u64,
    pub delay_cap_ms: u64,
}

impl Default for RetryWindow {
    fn default() -> Self {
        Self { max_consecutive_failures: 6, delay_step_ms: 500, delay_cap_ms: 10_000 }
    }
}

impl RetryWindow {
    fn pause(&self, consecutive_failures: u32) -> Duration {
        let ramp = self.delay_step_ms.saturating_mul(u64::from(consecutive_failures));
        Duration::from_millis(ramp.min(self.delay_cap_ms))
    }

    fn is_spent(&self, consecutive_failures: u32) -> bool {
        consecutive_failures >= self.max_consecutive_failures
    }
}

/// The event stream. Real deployments connect a WebSocket client here; this
/// crate only consumes the trait.
#[async_trait]
pub trait EventTransport: Send + Sync {
    async fn open(&self) -> Result<(), TransportError>;
    /// `Ok(None)` means the stream closed normally.
    async fn next_envelope(&self) -> Result<Option<BotEnvelope>, TransportError>;
    async fn close(&self) -> Result<(), TransportError>;
}

#[derive(Default)]
pub struct NoopEventTransport;

#[async_trait]
impl EventTransport for NoopEventTransport {
    async fn open(&self) -> Result<(), TransportError> {
        Ok(())
    }

    async fn next_envelope(&self) -> Result<Option<BotEnvelope>, TransportError> {
        Ok(None)
    }

    async fn close(&self) -> Result<(), TransportError> {
        Ok(())
    }
}

/// Consumer of drained envelopes; implemented by the command dispatcher.
#[async_trait]
pub trait EnvelopeHandler: Send + Sync {
    async fn handle(&self, envelope: &BotEnvelope, ctx: &EventContext) -> Result<()>;
}

pub struct BotRunner {
    transport: Arc<dyn EventTransport>,
    handler: Arc<dyn EnvelopeHandler>,
    retry: RetryWindow,
}

impl BotRunner {
    pub fn new(
        transport: Arc<dyn EventTransport>,
        handler: Arc<dyn EnvelopeHandler>,
        retry: RetryWindow,
    ) -> Self {
        Self { transport, handler, retry }
    }

    /// Runs until the stream closes normally or the retry window is spent.
    /// Either way the return is `Ok`, so the rest of the process (health
    /// endpoint included) stays up without platform connectivity.
    pub async fn start(&self) -> Result<()> {
        let mut consecutive_failures = 0u32;

        loop {
            if consecutive_failures > 0 {
                if self.retry.is_spent(consecutive_failures) {
                    warn!(
                        consecutive_failures,
                        "event stream failure limit reached; bot loop stopped"
                    );
                    return Ok(());
                }
                let pause = self.retry.pause(consecutive_failures);
                if !pause.is_zero() {
                    tokio::time::sleep(pause).await;
                }
            }

            if let Err(error) = self.transport.open().await {
                consecutive_failures += 1;
                warn!(consecutive_failures, error = %error, "event stream did not open");
                continue;
            }
            info!(event_name = "ingress.stream_opened", "event stream opened");
            consecutive_failures = 0;

            match self.drain().await {
                Ok(()) => {
                    info!(event_name = "ingress.stream_closed", "event stream closed");
                    return Ok(());
                }
                Err(error) => {
                    consecutive_failures += 1;
                    warn!(consecutive_failures, error = %error, "event stream dropped");
                }
            }
        }
    }

    /// Hands envelopes to the handler until the stream ends. Handler errors
    /// are logged and skipped; only transport errors abort the drain.
    async fn drain(&self) -> Result<(), TransportError> {
        while let Some(envelope) = self.transport.next_envelope().await? {
            debug!(
                event_name = "ingress.envelope_received",
                envelope_id = %envelope.envelope_id,
                event_type = envelope.event.event_type(),
                correlation_id = %envelope.envelope_id,
                "received envelope"
            );

            let context = EventContext { correlation_id: envelope.envelope_id.clone() };
            if let Err(error) = self.handler.handle(&envelope, &context).await {
                warn!(
                    envelope_id = %envelope.envelope_id,
                    correlation_id = %envelope.envelope_id,
                    error = %error,
                    "envelope handling failed; skipping envelope"
                );
            }
        }
        self.transport.close().await
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::Arc;

    use anyhow::Result;
    use async_trait::async_trait;
    use tokio::sync::Mutex;
    use uuid::Uuid;

    use super::{BotRunner, EnvelopeHandler, EventTransport, RetryWindow, TransportError};
    use crate::events::{BotEnvelope, BotEvent, EventContext, MessageAuthor, MessageCreatedEvent};

    fn no_pause(max_consecutive_failures: u32) -> RetryWindow {
        RetryWindow { max_consecutive_failures, delay_step_ms: 0, delay_cap_ms: 0 }
    }

    #[derive(Default)]
    struct ScriptedTransport {
        state: Mutex<ScriptedState>,
    }

    #[derive(Default)]
    struct ScriptedState {
        open_results: VecDeque<Result<(), TransportError>>,
        envelopes: VecDeque<Result<Option<BotEnvelope>, TransportError>>,
        open_attempts: usize,
        close_calls: usize,
    }

    impl ScriptedTransport {
        fn with_script(
            open_results: Vec<Result<(), TransportError>>,
            envelopes: Vec<Result<Option<BotEnvelope>, TransportError>>,
        ) -> Self {
            Self {
                state: Mutex::new(ScriptedState {
                    open_results: open_results.into(),
                    envelopes: envelopes.into(),
                    open_attempts: 0,
                    close_calls: 0,
                }),
            }
        }

        async fn open_attempts(&self) -> usize {
            self.state.lock().await.open_attempts
        }
    }

    #[async_trait]
    impl EventTransport for ScriptedTransport {
        async fn open(&self) -> Result<(), TransportError> {
            let mut state = self.state.lock().await;
            state.open_attempts += 1;
            state.open_results.pop_front().unwrap_or(Ok(()))
        }

        async fn next_envelope(&self) -> Result<Option<BotEnvelope>, TransportError> {
            self.state.lock().await.envelopes.pop_front().unwrap_or(Ok(None))
        }

        async fn close(&self) -> Result<(), TransportError> {
            self.state.lock().await.close_calls += 1;
            Ok(())
        }
    }

    #[derive(Default)]
    struct RecordingHandler {
        seen: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl EnvelopeHandler for RecordingHandler {
        async fn handle(&self, envelope: &BotEnvelope, _ctx: &EventContext) -> Result<()> {
            self.seen.lock().await.push(envelope.envelope_id.clone());
            Ok(())
        }
    }

    fn message_envelope(id: &str) -> BotEnvelope {
        BotEnvelope {
            envelope_id: id.to_owned(),
            event: BotEvent::MessageCreated(MessageCreatedEvent {
                message_id: Uuid::from_u128(1),
                channel_id: Uuid::from_u128(2),
                author: MessageAuthor {
                    id: Uuid::from_u128(3),
                    name: "alice".to_owned(),
                    is_bot: false,
                },
                text: "hello".to_owned(),
            }),
        }
    }

    #[tokio::test]
    async fn reopens_the_stream_after_a_connect_failure() {
        let transport = Arc::new(ScriptedTransport::with_script(
            vec![Err(TransportError::Connection("network down".to_owned())), Ok(())],
            vec![Ok(Some(message_envelope("env-1"))), Ok(None)],
        ));
        let handler = Arc::new(RecordingHandler::default());

        let runner = BotRunner::new(transport.clone(), handler.clone(), no_pause(3));
        runner.start().await.expect("runner should not fail");

        assert_eq!(transport.open_attempts().await, 2);
        assert_eq!(*handler.seen.lock().await, vec!["env-1".to_owned()]);
    }

    #[tokio::test]
    async fn a_successful_connection_resets_the_failure_count() {
        // Two isolated failures with a window of two: only the reset lets the
        // loop reach the second envelope.
        let transport = Arc::new(ScriptedTransport::with_script(
            vec![Err(TransportError::Connection("boot flake".to_owned())), Ok(()), Ok(())],
            vec![
                Ok(Some(message_envelope("env-1"))),
                Err(TransportError::Stream("mid-session drop".to_owned())),
                Ok(Some(message_envelope("env-2"))),
                Ok(None),
            ],
        ));
        let handler = Arc::new(RecordingHandler::default());

        let runner = BotRunner::new(transport.clone(), handler.clone(), no_pause(2));
        runner.start().await.expect("runner should not fail");

        assert_eq!(transport.open_attempts().await, 3);
        assert_eq!(*handler.seen.lock().await, vec!["env-1".to_owned(), "env-2".to_owned()]);
    }

    #[tokio::test]
    async fn stops_after_consecutive_failures_without_crashing() {
        let transport = Arc::new(ScriptedTransport::with_script(
            vec![
                Err(TransportError::Connection("fail-1".to_owned())),
                Err(TransportError::Connection("fail-2".to_owned())),
                Err(TransportError::Connection("fail-3".to_owned())),
            ],
            vec![],
        ));

        let runner =
            BotRunner::new(transport.clone(), Arc::new(RecordingHandler::default()), no_pause(3));

        runner.start().await.expect("runner should degrade gracefully");
        assert_eq!(transport.open_attempts().await, 3);
    }

    #[tokio::test]
    async fn handler_errors_do_not_stop_the_drain() {
        struct FailingHandler;

        #[async_trait]
        impl EnvelopeHandler for FailingHandler {
            async fn handle(&self, _envelope: &BotEnvelope, _ctx: &EventContext) -> Result<()> {
                anyhow::bail!("handler exploded")
            }
        }

        let transport = Arc::new(ScriptedTransport::with_script(
            vec![Ok(())],
            vec![
                Ok(Some(message_envelope("env-1"))),
                Ok(Some(message_envelope("env-2"))),
                Ok(None),
            ],
        ));

        let runner = BotRunner::new(transport.clone(), Arc::new(FailingHandler), no_pause(1));

        runner.start().await.expect("runner should survive handler errors");
        assert_eq!(transport.state.lock().await.close_calls, 1);
    }
}
