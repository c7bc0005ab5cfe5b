//! Infrastructure layer - Technical implementations
//!
//! This layer contains repository implementations.

pub mod persistence;
