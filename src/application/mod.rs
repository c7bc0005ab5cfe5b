//! Application layer - Use cases and application services
//!
//! This layer orchestrates domain objects to fulfill use cases.
//! It's responsible for:
//! - Serialising mutations of a call
//! - Enforcing rules that span calls (one call per chat, call limits)
//! - Publishing domain events

pub mod calls;

pub use calls::{CallRecord, CallUpdate, CallsManager};
