//! # Shared Types Crate
//!
//! Domain entities and system-message types shared by the bus, the
//! validation subsystem and the test suite.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: every cross-crate type is defined here.
//! - **Normalised Identity**: addresses and request ids are lowercase from
//!   construction onwards, so comparisons never depend on the source's casing.
//! - **Metadata Authority**: the sender of a system message is the transport
//!   metadata's `publisher_id`, never a field inside the payload.

pub mod codec;
pub mod entities;
pub mod errors;
pub mod system_message;

pub use codec::LATEST_VERSION;
pub use entities::*;
pub use errors::*;
pub use system_message::*;
