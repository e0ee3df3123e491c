//! Outbound boundary to the command execution backend.
//!
//! The registry's job ends at a validated `InvocationPayload`; whatever
//! transports it to the backend plugin lives behind this trait. The
//! bundled implementation just echoes the payload, which is enough for
//! the interactive surface and for tests.

use async_trait::async_trait;
use campusmate_core::InvocationPayload;

/// Collaborator that executes a validated command invocation.
#[async_trait]
pub trait Dispatcher: Send + Sync {
    async fn dispatch(&self, payload: InvocationPayload) -> anyhow::Result<()>;
}

/// Prints the serialized payload instead of executing it.
#[derive(Debug, Default)]
pub struct EchoDispatcher;

#[async_trait]
impl Dispatcher for EchoDispatcher {
    async fn dispatch(&self, payload: InvocationPayload) -> anyhow::Result<()> {
        let json = serde_json::to_string_pretty(&payload)?;
        tracing::info!(trigger = %payload.trigger, "dispatching command");
        println!("{json}");
        Ok(())
    }
}
