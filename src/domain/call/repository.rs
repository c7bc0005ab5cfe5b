//! Call repository interface

use crate::domain::call::aggregate::Call;
use crate::domain::shared::result::Result;
use crate::domain::shared::value_objects::{CallId, ChatId};
use async_trait::async_trait;

/// Repository interface for live calls
///
/// Defined in the domain layer as a trait (port) and implemented in the
/// infrastructure layer (adapter).
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CallRepository: Send + Sync {
    /// Find a call by its ID
    async fn find_by_id(&self, id: &CallId) -> Result<Option<Call>>;

    /// Find the live call of a chat
    async fn find_by_chat(&self, chat: &ChatId) -> Result<Option<Call>>;

    /// Save a call (insert or update)
    async fn save(&self, call: &Call) -> Result<()>;

    /// Delete a call
    async fn delete(&self, id: &CallId) -> Result<()>;

    /// All live calls
    async fn find_all(&self) -> Result<Vec<Call>>;
}
