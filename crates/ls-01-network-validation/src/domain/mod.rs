//! # Domain Module
//!
//! Pure validation logic: admission, pooling, the storage matrix,
//! propagation accounting and the session state machine. Nothing here
//! performs I/O.

pub mod admission;
pub mod completion;
pub mod entities;
pub mod errors;
pub mod pools;
pub mod propagation;
pub mod session;
pub mod storage_matrix;
pub mod value_objects;

pub use admission::*;
pub use completion::*;
pub use entities::*;
pub use errors::*;
pub use pools::MessagePools;
pub use propagation::*;
pub use session::{CompletedCollection, ValidationSession};
pub use storage_matrix::*;
pub use value_objects::*;
