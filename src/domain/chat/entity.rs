//! Chat entity
//!
//! Only the slice of a chat that the call subsystem needs: who is in it and
//! when it was last active.

use crate::domain::shared::value_objects::{ChatId, FriendId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chat {
    id: ChatId,
    friends: Vec<FriendId>,
    last_activity: Option<DateTime<Utc>>,
}

impl Chat {
    pub fn new(id: ChatId, friends: Vec<FriendId>) -> Self {
        Self {
            id,
            friends,
            last_activity: None,
        }
    }

    /// One-to-one chat with a single friend
    pub fn with_friend(friend: FriendId) -> Self {
        Self::new(ChatId::new(), vec![friend])
    }

    pub fn id(&self) -> &ChatId {
        &self.id
    }

    pub fn friends(&self) -> &[FriendId] {
        &self.friends
    }

    /// The only friend of a one-to-one chat, `None` for group chats
    pub fn single_friend(&self) -> Option<&FriendId> {
        match self.friends.as_slice() {
            [friend] => Some(friend),
            _ => None,
        }
    }

    pub fn is_group(&self) -> bool {
        self.friends.len() > 1
    }

    pub fn last_activity(&self) -> Option<&DateTime<Utc>> {
        self.last_activity.as_ref()
    }

    pub fn touch(&mut self, at: DateTime<Utc>) {
        self.last_activity = Some(at);
    }
}
