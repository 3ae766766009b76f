//! # Shared Bus - System Message Stream
//!
//! In-process rendition of the network's system stream: every storage node
//! broadcasts query requests, responses and propagations here, and any
//! number of consumers observe them.
//!
//! ```text
//! ┌──────────────┐                    ┌──────────────┐
//! │ Storage node │                    │  Validator   │
//! │              │    publish()       │              │
//! │              │ ──────┐            │              │
//! └──────────────┘       │            └──────────────┘
//!                        ▼                    ↑
//!                  ┌──────────────┐          │
//!                  │ System bus   │          │
//!                  │ (broadcast)  │ ─────────┘
//!                  └──────────────┘  subscribe()
//! ```
//!
//! ## Delivery
//!
//! - At-most-once, no acknowledgement.
//! - Subscribers only receive messages published after they subscribed.
//! - Sender identity comes from the transport metadata, never the payload.

// Nursery lints that are too strict
#![allow(clippy::missing_const_for_fn)]
// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

pub mod events;
pub mod publisher;
pub mod subscriber;

// Re-export main types
pub use events::{RawSystemMessage, SystemMessageFilter};
pub use publisher::{InMemorySystemBus, SystemMessagePublisher};
pub use subscriber::{Subscription, SubscriptionError, SystemMessageStream, SystemMessageSubscriber};

/// Maximum messages to buffer per subscriber before the oldest are dropped.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1000;
