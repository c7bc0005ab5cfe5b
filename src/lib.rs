//! chatcall - call state for a messenger client
//!
//! A call belongs to exactly one chat and carries a status. Code outside
//! this crate reads calls; only the calls manager creates them and changes
//! their chat or status.

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;

// Re-export commonly used types
pub use application::{CallRecord, CallUpdate, CallsManager};
pub use domain::shared::error::DomainError;
pub use domain::shared::result::Result;
