//! Single-writer queue in front of a shared [`LogBuffer`].
//!
//! Arrivals from the page channel and edits from the panel are funnelled
//! through one task, so arrival order is exactly queue order. Readers take
//! the lock only to snapshot, and learn about changes from a `watch`
//! channel.

use parking_lot::RwLock;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;

use bridge::LogEvent;
use common::{ConsoleError, ConsoleResult};

use crate::buffer::LogBuffer;
use crate::entry::EntryId;

/// Buffer shared between the writer task and readers.
pub type SharedBuffer = Arc<RwLock<LogBuffer>>;

/// Published after every applied operation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BufferChange {
    /// Increments once per applied operation.
    pub revision: u64,
    /// The change was a new entry rather than an edit.
    pub arrival: bool,
}

enum BufferOp {
    Append(LogEvent, Option<oneshot::Sender<EntryId>>),
    Delete(EntryId),
    TogglePin(EntryId),
    Clear,
    Barrier(oneshot::Sender<()>),
}

/// Cloneable handle that queues buffer mutations.
#[derive(Clone)]
pub struct BufferWriter {
    ops: mpsc::UnboundedSender<BufferOp>,
    changes: watch::Receiver<BufferChange>,
}

impl BufferWriter {
    /// Spawn the writer task for `buffer` on the current runtime.
    pub fn spawn(buffer: SharedBuffer) -> (Self, JoinHandle<()>) {
        let (ops, receiver) = mpsc::unbounded_channel();
        let (notify, changes) = watch::channel(BufferChange::default());
        let task = tokio::spawn(run(buffer, receiver, notify));
        (Self { ops, changes }, task)
    }

    /// Queue an arrival.
    pub fn append(&self, event: LogEvent) -> ConsoleResult<()> {
        self.send(BufferOp::Append(event, None))
    }

    /// Queue an arrival and wait for its id.
    pub async fn append_and_wait(&self, event: LogEvent) -> ConsoleResult<EntryId> {
        let (reply, id) = oneshot::channel();
        self.send(BufferOp::Append(event, Some(reply)))?;
        id.await.map_err(|_| closed())
    }

    pub fn delete(&self, id: EntryId) -> ConsoleResult<()> {
        self.send(BufferOp::Delete(id))
    }

    pub fn toggle_pin(&self, id: EntryId) -> ConsoleResult<()> {
        self.send(BufferOp::TogglePin(id))
    }

    pub fn clear(&self) -> ConsoleResult<()> {
        self.send(BufferOp::Clear)
    }

    /// Wait until everything queued before this call is applied.
    pub async fn flush(&self) -> ConsoleResult<()> {
        let (reply, done) = oneshot::channel();
        self.send(BufferOp::Barrier(reply))?;
        done.await.map_err(|_| closed())
    }

    /// Change notifications.
    pub fn subscribe(&self) -> watch::Receiver<BufferChange> {
        self.changes.clone()
    }

    fn send(&self, op: BufferOp) -> ConsoleResult<()> {
        self.ops.send(op).map_err(|_| closed())
    }
}

fn closed() -> ConsoleError {
    ConsoleError::internal("log buffer writer has stopped")
}

async fn run(
    buffer: SharedBuffer,
    mut ops: mpsc::UnboundedReceiver<BufferOp>,
    notify: watch::Sender<BufferChange>,
) {
    let mut revision = 0u64;
    while let Some(op) = ops.recv().await {
        let arrival = matches!(op, BufferOp::Append(..));
        let changed = {
            let mut buffer = buffer.write();
            match op {
                BufferOp::Append(event, reply) => {
                    let id = buffer.append(event);
                    if let Some(reply) = reply {
                        let _ = reply.send(id);
                    }
                    true
                }
                BufferOp::Delete(id) => buffer.delete(id),
                BufferOp::TogglePin(id) => buffer.toggle_pin(id).is_some(),
                BufferOp::Clear => {
                    buffer.clear();
                    true
                }
                BufferOp::Barrier(reply) => {
                    let _ = reply.send(());
                    false
                }
            }
        };

        if changed {
            revision += 1;
            notify.send_replace(BufferChange { revision, arrival });
        }
    }
    tracing::debug!(revision, "log buffer writer stopped");
}
