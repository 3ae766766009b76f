//! # Integration Flows
//!
//! End-to-end scenarios over the in-memory system bus.

pub mod network_validation;
