//! Shared kernel - identifiers, errors and event plumbing used by every context

pub mod error;
pub mod events;
pub mod result;
pub mod value_objects;

pub use error::DomainError;
pub use result::Result;
pub use value_objects::*;
