//! Page message channel.
//!
//! Models the page's same-origin message bus: any number of posters, any
//! number of listeners, in-order delivery per listener, and unrelated
//! traffic mixed in. Every listener owns an unbounded queue, so a burst of
//! posts is never dropped however far a listener falls behind.

use parking_lot::RwLock;
use serde_json::Value as Json;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TryRecvError;

use common::time::now_millis;

use crate::envelope::{decode, Inbound, ReceiverStats};
use crate::error::BridgeResult;

/// Something the capture context can post messages to.
pub trait MessagePort: Send + Sync {
    fn post_message(&self, message: Json) -> BridgeResult<()>;
}

/// Fan-out bus shared by the page and the overlay.
#[derive(Clone, Default)]
pub struct PageChannel {
    listeners: Arc<RwLock<Vec<mpsc::UnboundedSender<Json>>>>,
}

impl PageChannel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start listening for overlay messages. Only messages posted after
    /// this call are delivered.
    pub fn listen(&self) -> PageListener {
        let (sender, receiver) = mpsc::unbounded_channel();
        self.listeners.write().push(sender);
        PageListener {
            receiver,
            stats: Arc::new(ReceiverStats::default()),
        }
    }

    /// Number of live listeners.
    pub fn listener_count(&self) -> usize {
        self.listeners
            .read()
            .iter()
            .filter(|sender| !sender.is_closed())
            .count()
    }
}

impl MessagePort for PageChannel {
    fn post_message(&self, message: Json) -> BridgeResult<()> {
        let mut listeners = self.listeners.write();
        // Dropped listeners are pruned here.
        listeners.retain(|sender| !sender.is_closed());

        // Posting with nobody listening is not an error on a page bus.
        let Some((last, rest)) = listeners.split_last() else {
            tracing::trace!("page message posted with no listeners");
            return Ok(());
        };
        for sender in rest {
            let _ = sender.send(message.clone());
        }
        let _ = last.send(message);
        Ok(())
    }
}

/// Listener end that yields only validated overlay messages.
pub struct PageListener {
    receiver: mpsc::UnboundedReceiver<Json>,
    stats: Arc<ReceiverStats>,
}

impl PageListener {
    /// Wait for the next accepted message. `None` once the channel closes.
    pub async fn recv(&mut self) -> Option<Inbound> {
        loop {
            let payload = self.receiver.recv().await?;
            if let Some(inbound) = self.accept(&payload) {
                return Some(inbound);
            }
        }
    }

    /// Take every accepted message that is already queued.
    pub fn drain(&mut self) -> Vec<Inbound> {
        let mut out = Vec::new();
        loop {
            match self.receiver.try_recv() {
                Ok(payload) => {
                    if let Some(inbound) = self.accept(&payload) {
                        out.push(inbound);
                    }
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => return out,
            }
        }
    }

    /// Accepted/dropped counters.
    pub fn stats(&self) -> Arc<ReceiverStats> {
        self.stats.clone()
    }

    fn accept(&self, payload: &Json) -> Option<Inbound> {
        let result = decode(payload, now_millis());
        self.stats.record(&result);
        match result {
            Ok(inbound) => Some(inbound),
            Err(rejection) => {
                tracing::debug!(?rejection, "inbound page message ignored");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::envelope::{LogEvent, LogMessage};
    use common::LogType;
    use serde_json::json;

    fn event(text: &str, timestamp: f64) -> LogEvent {
        LogEvent::new(LogType::Log, LogMessage::Text(text.into()), timestamp, 0)
    }

    #[test]
    fn test_post_without_listeners_is_ok() {
        let channel = PageChannel::new();
        assert!(channel.post_message(json!({"type": "x"})).is_ok());
    }

    #[test]
    fn test_drain_filters_traffic() {
        let channel = PageChannel::new();
        let mut listener = channel.listen();
        let now = now_millis();

        channel
            .post_message(event("first", now).to_envelope().unwrap())
            .unwrap();
        channel.post_message(json!({"type": "PAGE_OWN_MESSAGE"})).unwrap();
        channel
            .post_message(event("future", now + 60_000.0).to_envelope().unwrap())
            .unwrap();
        channel
            .post_message(event("second", now).to_envelope().unwrap())
            .unwrap();

        let received = listener.drain();
        assert_eq!(received.len(), 2);
        assert!(matches!(&received[0], Inbound::Log(e) if e.message.plain_text() == "first"));
        assert!(matches!(&received[1], Inbound::Log(e) if e.message.plain_text() == "second"));

        let stats = listener.stats();
        assert_eq!(stats.accepted(), 2);
        assert_eq!(stats.dropped(), 1);
    }

    #[tokio::test]
    async fn test_recv_async() {
        let channel = PageChannel::new();
        let mut listener = channel.listen();
        let poster = channel.clone();

        tokio::spawn(async move {
            poster
                .post_message(event("async", now_millis()).to_envelope().unwrap())
                .unwrap();
        });

        let inbound = listener.recv().await;
        assert!(matches!(inbound, Some(Inbound::Log(e)) if e.message.plain_text() == "async"));
    }

    #[test]
    fn test_burst_is_delivered_in_full() {
        let channel = PageChannel::new();
        let mut listener = channel.listen();
        let now = now_millis();

        for n in 0..10_000 {
            channel
                .post_message(event(&format!("line {}", n), now).to_envelope().unwrap())
                .unwrap();
        }

        let received = listener.drain();
        assert_eq!(received.len(), 10_000);
        assert!(matches!(&received[0], Inbound::Log(e) if e.message.plain_text() == "line 0"));
        assert!(matches!(&received[9_999], Inbound::Log(e) if e.message.plain_text() == "line 9999"));
    }

    #[test]
    fn test_every_listener_gets_a_copy() {
        let channel = PageChannel::new();
        let mut first = channel.listen();
        let mut second = channel.listen();
        assert_eq!(channel.listener_count(), 2);

        channel
            .post_message(event("shared", now_millis()).to_envelope().unwrap())
            .unwrap();
        assert_eq!(first.drain().len(), 1);
        assert_eq!(second.drain().len(), 1);

        drop(second);
        assert_eq!(channel.listener_count(), 1);
        channel
            .post_message(event("again", now_millis()).to_envelope().unwrap())
            .unwrap();
        assert_eq!(first.drain().len(), 1);
    }

    #[tokio::test]
    async fn test_recv_ends_when_channel_dropped() {
        let channel = PageChannel::new();
        let mut listener = channel.listen();
        drop(channel);
        assert!(listener.recv().await.is_none());
    }
}
