//! In-memory call repository

use crate::domain::call::{Call, CallRepository};
use crate::domain::shared::result::Result;
use crate::domain::shared::value_objects::{CallId, ChatId};
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

/// Keeps live calls in a map; nothing survives a restart
#[derive(Default)]
pub struct InMemoryCallRepository {
    calls: RwLock<HashMap<CallId, Call>>,
}

impl InMemoryCallRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CallRepository for InMemoryCallRepository {
    async fn find_by_id(&self, id: &CallId) -> Result<Option<Call>> {
        let calls = self.calls.read().await;
        Ok(calls.get(id).cloned())
    }

    async fn find_by_chat(&self, chat: &ChatId) -> Result<Option<Call>> {
        let calls = self.calls.read().await;
        Ok(calls.values().find(|call| call.chat() == chat).cloned())
    }

    async fn save(&self, call: &Call) -> Result<()> {
        // Pending events belong to the caller, not the stored copy
        let mut stored = call.clone();
        stored.take_events();

        let mut calls = self.calls.write().await;
        calls.insert(*call.id(), stored);
        Ok(())
    }

    async fn delete(&self, id: &CallId) -> Result<()> {
        let mut calls = self.calls.write().await;
        calls.remove(id);
        Ok(())
    }

    async fn find_all(&self) -> Result<Vec<Call>> {
        let calls = self.calls.read().await;
        let mut all: Vec<Call> = calls.values().cloned().collect();
        all.sort_by_key(|call| *call.created_at());
        Ok(all)
    }
}
