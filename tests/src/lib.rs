//! # Log-Store Client Test Suite
//!
//! Unified test crate containing:
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! ├── benchmarks/       # Reduction benchmarks per subsystem
//! │   └── ls_01_network_validation.rs
//! │
//! └── integration/      # Flows across the system bus and subsystems
//!     └── network_validation.rs
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! # All tests
//! cargo test -p ls-tests
//!
//! # Integration only
//! cargo test -p ls-tests integration::
//!
//! # Benchmarks
//! cargo bench -p ls-tests
//! ```

#![allow(unused_variables)]
#![allow(unused_imports)]
#![allow(dead_code)]

pub mod benchmarks;
pub mod fixtures;
pub mod integration;
