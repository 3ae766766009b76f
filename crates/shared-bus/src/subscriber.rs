//! # System Message Subscriber
//!
//! Defines the subscription side of the system stream. Subscribers only ever
//! see decoded [`SystemMessageValue`]s: malformed payloads and message types
//! nobody here understands are logged, counted and skipped.

use crate::events::{RawSystemMessage, SystemMessageFilter};
use logstore_telemetry::metric_inc;
use logstore_telemetry::metrics::{BUS_MESSAGES_DROPPED_TOTAL, BUS_MESSAGES_TOTAL};
use shared_types::{CodecError, SystemMessage, SystemMessageValue};
use std::pin::Pin;
use std::task::{ready, Context, Poll};
use thiserror::Error;
use tokio::sync::broadcast;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::Stream;
use tracing::{debug, trace};

/// Errors from subscription operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SubscriptionError {
    /// The bus was dropped.
    #[error("System message bus closed")]
    Closed,
}

/// Trait for subscribing to the system stream.
pub trait SystemMessageSubscriber: Send + Sync {
    /// Subscribe to messages matching a filter.
    ///
    /// Only messages published after this call are delivered.
    fn subscribe(&self, filter: SystemMessageFilter) -> SystemMessageStream;
}

/// Decodes one raw message, applying the filter.
///
/// Returns `None` for anything the subscriber should not see.
fn decode(raw: RawSystemMessage, filter: &SystemMessageFilter) -> Option<SystemMessageValue> {
    let message = match SystemMessage::deserialize(&raw.content) {
        Ok(message) => message,
        Err(CodecError::UnsupportedType(code)) => {
            // Other system messages share the stream
            trace!(code, publisher = %raw.metadata.publisher_id, "Skipping system message");
            metric_inc!(BUS_MESSAGES_DROPPED_TOTAL, &["unsupported_type"]);
            return None;
        }
        Err(e) => {
            debug!(
                publisher = %raw.metadata.publisher_id,
                error = %e,
                "Dropping undecodable system message"
            );
            metric_inc!(BUS_MESSAGES_DROPPED_TOTAL, &[e.reason()]);
            return None;
        }
    };

    metric_inc!(BUS_MESSAGES_TOTAL, &[message.kind().as_str()]);

    if !filter.matches(&message) {
        return None;
    }
    Some(SystemMessageValue::new(message, raw.metadata))
}

fn record_lag(count: u64) {
    debug!(lagged = count, "Subscriber lagged, some system messages dropped");
    BUS_MESSAGES_DROPPED_TOTAL
        .with_label_values(&["lagged"])
        .inc_by(count as f64);
}

/// A subscription handle for receiving decoded messages.
///
/// When dropped, the subscription is automatically cleaned up.
pub struct Subscription {
    receiver: broadcast::Receiver<RawSystemMessage>,
    filter: SystemMessageFilter,
}

impl Subscription {
    pub(crate) fn new(
        receiver: broadcast::Receiver<RawSystemMessage>,
        filter: SystemMessageFilter,
    ) -> Self {
        Self { receiver, filter }
    }

    /// Receive the next message that decodes and matches the filter.
    ///
    /// # Returns
    ///
    /// - `Some(value)` - The next matching message
    /// - `None` - The bus was dropped
    pub async fn recv(&mut self) -> Option<SystemMessageValue> {
        loop {
            let raw = match self.receiver.recv().await {
                Ok(raw) => raw,
                Err(broadcast::error::RecvError::Closed) => return None,
                Err(broadcast::error::RecvError::Lagged(count)) => {
                    record_lag(count);
                    continue;
                }
            };

            if let Some(value) = decode(raw, &self.filter) {
                return Some(value);
            }
        }
    }

    /// Try to receive the next message without blocking.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(value))` - A message was available and matched
    /// - `Ok(None)` - Nothing available (would block)
    /// - `Err(SubscriptionError::Closed)` - The bus was dropped
    pub fn try_recv(&mut self) -> Result<Option<SystemMessageValue>, SubscriptionError> {
        loop {
            let raw = match self.receiver.try_recv() {
                Ok(raw) => raw,
                Err(broadcast::error::TryRecvError::Empty) => return Ok(None),
                Err(broadcast::error::TryRecvError::Closed) => {
                    return Err(SubscriptionError::Closed)
                }
                Err(broadcast::error::TryRecvError::Lagged(count)) => {
                    record_lag(count);
                    continue;
                }
            };

            if let Some(value) = decode(raw, &self.filter) {
                return Ok(Some(value));
            }
        }
    }

    /// Get the filter for this subscription.
    #[must_use]
    pub fn filter(&self) -> &SystemMessageFilter {
        &self.filter
    }
}

/// Stream of decoded system messages.
///
/// Never yields errors and ends only when the bus is dropped. Dropping the
/// stream releases the subscription.
pub struct SystemMessageStream {
    inner: BroadcastStream<RawSystemMessage>,
    filter: SystemMessageFilter,
}

impl SystemMessageStream {
    /// Create a stream from a subscription.
    #[must_use]
    pub fn new(subscription: Subscription) -> Self {
        let Subscription { receiver, filter } = subscription;
        Self {
            inner: BroadcastStream::new(receiver),
            filter,
        }
    }

    /// Get the filter for this stream.
    #[must_use]
    pub fn filter(&self) -> &SystemMessageFilter {
        &self.filter
    }
}

impl Stream for SystemMessageStream {
    type Item = SystemMessageValue;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        loop {
            match ready!(Pin::new(&mut self.inner).poll_next(cx)) {
                None => return Poll::Ready(None),
                Some(Err(BroadcastStreamRecvError::Lagged(count))) => record_lag(count),
                Some(Ok(raw)) => {
                    if let Some(value) = decode(raw, &self.filter) {
                        return Poll::Ready(Some(value));
                    }
                }
            }
        }
    }
}
