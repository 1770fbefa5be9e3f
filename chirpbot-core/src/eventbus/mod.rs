//! src/eventbus/mod.rs
//!
//! The single in-process event stream between the EventSub runtime (producer)
//! and the dispatcher (consumer), plus the process-wide shutdown signal.
//!
//! There is exactly one consumer. Events are delivered in the order the
//! producer published them; the bounded queue applies backpressure to the
//! socket reader when the dispatcher falls behind.

use std::sync::Mutex;
use tokio::sync::{mpsc, watch};
use tracing::warn;

use crate::platforms::twitch_eventsub::events::{ChannelChatMessage, StreamOnline};

/// Everything the dispatcher can be handed.
#[derive(Debug, Clone)]
pub enum BotEvent {
    /// "channel.chat.message"
    ChatMessage(ChannelChatMessage),
    /// "stream.online"
    StreamOnline(StreamOnline),
}

impl BotEvent {
    pub fn event_type(&self) -> &'static str {
        match self {
            BotEvent::ChatMessage(_) => "channel.chat.message",
            BotEvent::StreamOnline(_) => "stream.online",
        }
    }
}

/// Default size for the event queue. Adjust as needed.
const DEFAULT_BUFFER_SIZE: usize = 1000;

pub struct EventBus {
    tx: mpsc::Sender<BotEvent>,
    rx: Mutex<Option<mpsc::Receiver<BotEvent>>>,
    shutdown_tx: watch::Sender<bool>,
    pub shutdown_rx: watch::Receiver<bool>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventBus {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_BUFFER_SIZE)
    }

    pub fn with_capacity(buffer_size: usize) -> Self {
        let (tx, rx) = mpsc::channel(buffer_size);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        Self {
            tx,
            rx: Mutex::new(Some(rx)),
            shutdown_tx,
            shutdown_rx,
        }
    }

    pub fn shutdown(&self) {
        // Setting watch to true
        let _ = self.shutdown_tx.send(true);
    }

    pub fn is_shutdown(&self) -> bool {
        *self.shutdown_rx.borrow()
    }

    /// Hands out the receiving end. Only the first caller gets it.
    pub fn subscribe(&self) -> Option<mpsc::Receiver<BotEvent>> {
        match self.rx.lock() {
            Ok(mut guard) => guard.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        }
    }

    /// Publish an event. Waits for queue space; dropped once shutdown started
    /// or after the consumer went away.
    pub async fn publish(&self, event: BotEvent) {
        if self.is_shutdown() {
            return;
        }
        if let Err(e) = self.tx.send(event).await {
            warn!("event bus has no consumer; dropped {}", e.0.event_type());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::sample_chat_message;
    use tokio::time::{timeout, Duration};

    #[tokio::test]
    async fn only_one_subscriber_gets_the_stream() {
        let bus = EventBus::new();
        assert!(bus.subscribe().is_some());
        assert!(bus.subscribe().is_none());
    }

    #[tokio::test]
    async fn events_arrive_in_publish_order() {
        let bus = EventBus::new();
        let mut rx = bus.subscribe().expect("first subscriber");

        bus.publish(BotEvent::ChatMessage(sample_chat_message("one", &[]))).await;
        bus.publish(BotEvent::ChatMessage(sample_chat_message("two", &[]))).await;

        for expected in ["one", "two"] {
            let evt = timeout(Duration::from_secs(1), rx.recv()).await.expect("timeout");
            match evt {
                Some(BotEvent::ChatMessage(m)) => assert_eq!(m.text(), expected),
                other => panic!("unexpected {other:?}"),
            }
        }
    }

    #[tokio::test]
    async fn publishing_after_shutdown_is_a_no_op() {
        let bus = EventBus::new();
        let mut rx = bus.subscribe().expect("first subscriber");
        bus.shutdown();
        assert!(bus.is_shutdown());

        bus.publish(BotEvent::ChatMessage(sample_chat_message("late", &[]))).await;
        assert!(rx.try_recv().is_err());
    }
}
