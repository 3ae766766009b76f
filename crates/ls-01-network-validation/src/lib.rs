//! # LS-01 Network Validation
//!
//! Confirms that an HTTP query response served by one storage node is what
//! the rest of the storage network reports holding.
//!
//! **Subsystem ID:** 1  
//! **Architecture:** Hexagonal (DDD + Ports/Adapters)
//!
//! ## Purpose
//!
//! A query node answers the HTTP query and broadcasts a query request; every
//! participating node answers on the system message bus with the ids and
//! hashes it stores, and nodes holding messages the query node lacks
//! propagate them. The response is accepted only when:
//!
//! - every expected node has answered
//! - every owed propagation has been observed
//! - all nodes agree on each message hash
//! - every payload message is attested by at least one node
//!
//! all within one fixed deadline.
//!
//! ## Data Flow
//!
//! ```text
//! ┌──────────────┐  system messages   ┌─────────────────────┐
//! │ SystemBus    │ ─────────────────→ │ ValidationSession   │
//! └──────────────┘                    │  admission → pools  │
//! ┌──────────────┐  request id, nodes │  completion         │
//! │ HTTP response│ ─────────────────→ │  storage matrix     │
//! └──────────────┘  payload           └──────────┬──────────┘
//! ┌──────────────┐  query node,                  │
//! │ NodeManager  │  active nodes                 ▼
//! └──────────────┘                     ValidationReport | ValidationError
//! ```
//!
//! ## Module Structure
//!
//! ```text
//! ls-01-network-validation/
//! ├── domain/     # Session state machine, matrix, propagation, errors, config
//! ├── ports/      # NetworkValidationApi, NodeManager, QueryResponseStreams
//! └── service.rs  # Async orchestrator with the hard deadline
//! ```

#![warn(clippy::all)]

pub mod domain;
pub mod ports;
pub mod service;

// Re-exports
pub use domain::{
    convert_to_storage_matrix, get_expected_propagated_messages,
    get_missing_propagated_messages, nodes_agree_on_storage_matrix,
    verify_message_presence_in_storage_matrix, CollectionState, CompletedCollection,
    ExpectedNodes, HttpQuery, QueryInput, StorageMatrix, ValidationConfig, ValidationError,
    ValidationReport, ValidationSession, DEFAULT_VALIDATION_TIMEOUT,
};
pub use ports::{
    MockNodeManager, NetworkValidationApi, NodeManager, QueryResponseStreams, ResponseMetadata,
};
pub use service::NetworkValidationService;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
