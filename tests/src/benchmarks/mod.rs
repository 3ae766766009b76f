//! # Log-Store Benchmarks
//!
//! Performance benchmarks per subsystem.

pub mod ls_01_network_validation;
