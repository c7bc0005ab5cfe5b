//! Call domain events

use crate::domain::call::value_object::{CallStatus, EndReason, MediaSettings, PausedStatus};
use crate::domain::shared::events::{DomainEvent, EventMetadata};
use crate::domain::shared::value_objects::{CallId, ChatId, FriendId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Fields common to every call event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallEventBase {
    pub metadata: EventMetadata,
    pub call_id: CallId,
}

impl CallEventBase {
    pub fn new(event_type: &str, call_id: CallId) -> Self {
        Self {
            metadata: EventMetadata::new(event_type),
            call_id,
        }
    }
}

/// Call created, either dialed by the user or received from a friend
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallCreated {
    pub base: CallEventBase,
    pub chat: ChatId,
    pub caller: Option<FriendId>,
    pub status: CallStatus,
}

/// Call moved to another chat
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallChatChanged {
    pub base: CallEventBase,
    pub from: ChatId,
    pub to: ChatId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallStatusChanged {
    pub base: CallEventBase,
    pub from: CallStatus,
    pub to: CallStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallPauseChanged {
    pub base: CallEventBase,
    pub paused: PausedStatus,
}

/// Local mute or bit rates changed
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallMediaChanged {
    pub base: CallEventBase,
    pub media: MediaSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallEnded {
    pub base: CallEventBase,
    pub chat: ChatId,
    pub reason: EndReason,
    pub ended_at: DateTime<Utc>,
    /// Seconds since answer, `None` when the call never became active
    pub duration_seconds: Option<i64>,
}

/// Union of all call events
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum CallEvent {
    Created(CallCreated),
    ChatChanged(CallChatChanged),
    StatusChanged(CallStatusChanged),
    PauseChanged(CallPauseChanged),
    MediaChanged(CallMediaChanged),
    Ended(CallEnded),
}

impl CallEvent {
    fn base(&self) -> &CallEventBase {
        match self {
            CallEvent::Created(e) => &e.base,
            CallEvent::ChatChanged(e) => &e.base,
            CallEvent::StatusChanged(e) => &e.base,
            CallEvent::PauseChanged(e) => &e.base,
            CallEvent::MediaChanged(e) => &e.base,
            CallEvent::Ended(e) => &e.base,
        }
    }

    pub fn call_id(&self) -> &CallId {
        &self.base().call_id
    }
}

impl DomainEvent for CallEvent {
    fn event_type(&self) -> &'static str {
        match self {
            CallEvent::Created(_) => "call.created",
            CallEvent::ChatChanged(_) => "call.chat_changed",
            CallEvent::StatusChanged(_) => "call.status_changed",
            CallEvent::PauseChanged(_) => "call.pause_changed",
            CallEvent::MediaChanged(_) => "call.media_changed",
            CallEvent::Ended(_) => "call.ended",
        }
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        self.base().metadata.occurred_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_type_matches_metadata() {
        let call_id = CallId::new();
        let event = CallEvent::StatusChanged(CallStatusChanged {
            base: CallEventBase::new("call.status_changed", call_id),
            from: CallStatus::Dialing,
            to: CallStatus::Active,
        });

        assert_eq!(event.event_type(), "call.status_changed");
        assert_eq!(event.call_id(), &call_id);
        assert_eq!(event.base().metadata.event_type, event.event_type());
    }
}
