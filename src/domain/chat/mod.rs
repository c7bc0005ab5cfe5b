//! Chat context - the conversation a call belongs to

pub mod entity;

pub use entity::Chat;
