//! # System Message Publisher
//!
//! Defines the publishing side of the system stream.

use crate::events::{RawSystemMessage, SystemMessageFilter};
use crate::subscriber::{Subscription, SystemMessageStream, SystemMessageSubscriber};
use crate::DEFAULT_CHANNEL_CAPACITY;
use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::broadcast;
use tracing::{debug, warn};

/// Trait for publishing system messages.
#[async_trait]
pub trait SystemMessagePublisher: Send + Sync {
    /// Publish a raw message.
    ///
    /// # Returns
    ///
    /// The number of active subscribers that received the message.
    async fn publish(&self, message: RawSystemMessage) -> usize;

    /// Get the total number of messages published.
    fn messages_published(&self) -> u64;
}

/// In-memory implementation of the system stream.
///
/// Uses `tokio::sync::broadcast`, which gives the same delivery contract as
/// the real pub/sub network from a subscriber's point of view: every
/// subscriber sees every message published after it subscribed, a slow
/// subscriber loses the oldest messages, nothing is acknowledged.
pub struct InMemorySystemBus {
    /// Broadcast sender for raw messages.
    sender: broadcast::Sender<RawSystemMessage>,

    /// Total messages published.
    messages_published: AtomicU64,

    /// Channel capacity.
    capacity: usize,
}

impl InMemorySystemBus {
    /// Create a new bus with default capacity.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CHANNEL_CAPACITY)
    }

    /// Create a new bus with specified capacity.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender,
            messages_published: AtomicU64::new(0),
            capacity,
        }
    }

    /// Subscribe to messages matching a filter.
    #[must_use]
    pub fn subscription(&self, filter: SystemMessageFilter) -> Subscription {
        let receiver = self.sender.subscribe();

        debug!(kinds = ?filter.kinds, "New system message subscription");

        Subscription::new(receiver, filter)
    }

    /// Get the number of active subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    /// Get the channel capacity.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for InMemorySystemBus {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SystemMessagePublisher for InMemorySystemBus {
    async fn publish(&self, message: RawSystemMessage) -> usize {
        let publisher = message.metadata.publisher_id.clone();

        // Always increment counter (publish was attempted)
        self.messages_published.fetch_add(1, Ordering::Relaxed);

        match self.sender.send(message) {
            Ok(receiver_count) => {
                debug!(
                    publisher = %publisher,
                    receivers = receiver_count,
                    "System message published"
                );
                receiver_count
            }
            Err(e) => {
                warn!(
                    publisher = %publisher,
                    error = %e,
                    "System message dropped (no receivers)"
                );
                0
            }
        }
    }

    fn messages_published(&self) -> u64 {
        self.messages_published.load(Ordering::Relaxed)
    }
}

impl SystemMessageSubscriber for InMemorySystemBus {
    fn subscribe(&self, filter: SystemMessageFilter) -> SystemMessageStream {
        SystemMessageStream::new(self.subscription(filter))
    }
}
