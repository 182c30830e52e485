//! Tab-addressed command delivery.

use parking_lot::RwLock;
use serde_json::Value as Json;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};

use crate::command::{CommandAck, CommandParse, ControlCommand};
use crate::error::{BridgeError, BridgeResult};
use crate::retry::RetryPolicy;

/// Identifies the tab an overlay lives in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TabId(pub u32);

impl fmt::Display for TabId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

struct CommandRequest {
    payload: Json,
    reply: oneshot::Sender<CommandAck>,
}

/// Routes command requests to the overlay registered for each tab.
#[derive(Clone, Default)]
pub struct CommandBus {
    tabs: Arc<RwLock<HashMap<TabId, mpsc::UnboundedSender<CommandRequest>>>>,
    policy: RetryPolicy,
}

impl CommandBus {
    pub fn new(policy: RetryPolicy) -> Self {
        Self {
            tabs: Arc::new(RwLock::new(HashMap::new())),
            policy,
        }
    }

    /// Register the overlay of `tab`, replacing any previous one.
    pub fn register(&self, tab: TabId) -> CommandInbox {
        let (sender, receiver) = mpsc::unbounded_channel();
        self.tabs.write().insert(tab, sender);
        tracing::debug!(%tab, "command inbox registered");
        CommandInbox { receiver }
    }

    pub fn unregister(&self, tab: TabId) {
        self.tabs.write().remove(&tab);
    }

    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    /// One attempt: deliver a raw payload and wait for its acknowledgment.
    pub async fn request(&self, tab: TabId, payload: Json) -> BridgeResult<CommandAck> {
        let sender = self
            .tabs
            .read()
            .get(&tab)
            .cloned()
            .ok_or(BridgeError::NoReceiver(tab))?;

        let (reply, ack) = oneshot::channel();
        sender
            .send(CommandRequest { payload, reply })
            .map_err(|_| BridgeError::NoReceiver(tab))?;

        match tokio::time::timeout(self.policy.ack_timeout, ack).await {
            Ok(Ok(ack)) => Ok(ack),
            Ok(Err(_)) => Err(BridgeError::NoAcknowledgment),
            Err(_) => Err(BridgeError::Timeout),
        }
    }

    /// Send a command, retrying on missing or failed acknowledgments.
    ///
    /// Exhausting the attempts logs a warning and returns
    /// [`BridgeError::RetriesExhausted`].
    pub async fn send(&self, tab: TabId, command: &ControlCommand) -> BridgeResult<CommandAck> {
        let payload = serde_json::to_value(command)?;
        let attempts = self.policy.max_attempts;
        let mut last_error = String::new();

        for attempt in 1..=attempts {
            match self.request(tab, payload.clone()).await {
                Ok(ack) if ack.is_ok() => return Ok(ack),
                Ok(ack) => {
                    last_error = BridgeError::Rejected(ack.message.unwrap_or_default()).to_string();
                }
                Err(e) => last_error = e.to_string(),
            }
            tracing::debug!(%tab, attempt, error = %last_error, "command attempt failed");
            if attempt < attempts {
                tokio::time::sleep(self.policy.delay).await;
            }
        }

        tracing::warn!(%tab, attempts, error = %last_error, "giving up on command");
        Err(BridgeError::RetriesExhausted {
            attempts,
            last_error,
        })
    }

    /// Like [`send`](Self::send), but a failure only leaves the warning
    /// behind and yields `None`.
    pub async fn deliver(&self, tab: TabId, command: &ControlCommand) -> Option<CommandAck> {
        self.send(tab, command).await.ok()
    }
}

/// Overlay end of the command channel.
pub struct CommandInbox {
    receiver: mpsc::UnboundedReceiver<CommandRequest>,
}

impl CommandInbox {
    /// Next recognized command. Unrecognized requests are dropped without a
    /// reply; invalid ones are answered with an error here.
    pub async fn recv(&mut self) -> Option<IncomingCommand> {
        loop {
            let request = self.receiver.recv().await?;
            if let Some(command) = Self::screen(request) {
                return Some(command);
            }
        }
    }

    /// Non-blocking variant of [`recv`](Self::recv).
    pub fn try_recv(&mut self) -> Option<IncomingCommand> {
        while let Ok(request) = self.receiver.try_recv() {
            if let Some(command) = Self::screen(request) {
                return Some(command);
            }
        }
        None
    }

    fn screen(request: CommandRequest) -> Option<IncomingCommand> {
        match CommandParse::from_json(&request.payload) {
            CommandParse::Command(command) => Some(IncomingCommand {
                command,
                reply: request.reply,
            }),
            CommandParse::Invalid(reason) => {
                tracing::debug!(%reason, "rejecting invalid command");
                let _ = request.reply.send(CommandAck::error(reason));
                None
            }
            CommandParse::Unrecognized => None,
        }
    }
}

/// A command awaiting its acknowledgment.
pub struct IncomingCommand {
    pub command: ControlCommand,
    reply: oneshot::Sender<CommandAck>,
}

impl IncomingCommand {
    pub fn respond(self, ack: CommandAck) {
        // The sender may have timed out already.
        let _ = self.reply.send(ack);
    }
}
