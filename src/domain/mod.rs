//! Domain layer - Core business logic and rules
//!
//! This layer contains:
//! - Aggregates: the call, the consistency boundary for status changes
//! - Entities: the chat a call belongs to
//! - Value Objects: statuses, media settings, friend call state
//! - Domain Services: rules that need a chat and a call together
//! - Repository Interfaces: ports for keeping live calls
//! - Domain Events: things that happened to a call

pub mod call;
pub mod chat;
pub mod shared;

// Re-export commonly used types
pub use shared::{DomainError, Result};
