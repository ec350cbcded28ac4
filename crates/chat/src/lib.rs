//! Chat platform layer.
//!
//! This crate turns the platform's message stream into command executions:
//! - **Events** (`events`) - envelope and event types for the stream
//! - **Runner** (`runner`) - event loop over an abstract transport with
//!   paced reconnects
//! - **Api** (`api`) - the REST surface handlers call back into
//! - **Commands** (`commands`) - `face`, `hello`, `help`, `status`, `rmmsg`
//!   argument grammars and execution
//! - **Dispatch** (`dispatch`) - mention stripping, command routing, and
//!   error-to-stamp feedback
//! - **Reactions** (`reactions`) - auto-reactions for non-command messages
//!
//! Transport and REST clients are deployment concerns: both are traits here,
//! with no-op implementations as defaults.

pub mod api;
pub mod commands;
pub mod dispatch;
pub mod events;
pub mod health;
pub mod reactions;
pub mod runner;

#[cfg(test)]
pub(crate) mod testing;
