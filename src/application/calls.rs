//! Calls manager - the only place that creates calls and changes their status

use crate::config::CallsConfig;
use crate::domain::call::{
    Call, CallControl, CallDomainService, CallEvent, CallRepository, CallStatus, EndReason,
    FriendCallState, MediaSettings,
};
use crate::domain::chat::Chat;
use crate::domain::shared::error::DomainError;
use crate::domain::shared::events::DomainEvent;
use crate::domain::shared::result::Result;
use crate::domain::shared::value_objects::{CallId, ChatId, FriendId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::{broadcast, Mutex};
use tracing::{debug, info, warn};

const EVENT_CHANNEL_CAPACITY: usize = 256;

/// What a chat keeps once a call is over
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallRecord {
    pub call_id: CallId,
    pub chat: ChatId,
    pub outgoing: bool,
    pub answered: bool,
    pub reason: EndReason,
    pub duration_seconds: Option<i64>,
    pub ended_at: DateTime<Utc>,
}

impl CallRecord {
    /// Bump the chat's last activity to the end of this call
    pub fn apply_to(&self, chat: &mut Chat) -> Result<()> {
        if chat.id() != &self.chat {
            return Err(DomainError::ValidationError(format!(
                "Call {} belongs to chat {}, not {}",
                self.call_id,
                self.chat,
                chat.id()
            )));
        }

        chat.touch(self.ended_at);
        Ok(())
    }
}

/// Result of an operation that may end the call
#[derive(Debug, Clone)]
pub enum CallUpdate {
    Updated(Call),
    Ended(CallRecord),
}

impl CallUpdate {
    pub fn call(&self) -> Option<&Call> {
        match self {
            CallUpdate::Updated(call) => Some(call),
            CallUpdate::Ended(_) => None,
        }
    }

    pub fn record(&self) -> Option<&CallRecord> {
        match self {
            CallUpdate::Ended(record) => Some(record),
            CallUpdate::Updated(_) => None,
        }
    }
}

pub struct CallsManager {
    repository: Arc<dyn CallRepository>,
    settings: CallsConfig,
    events: broadcast::Sender<CallEvent>,
    /// Held across every read-modify-write of a call
    write_lock: Mutex<()>,
}

impl CallsManager {
    pub fn new(repository: Arc<dyn CallRepository>, settings: CallsConfig) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            repository,
            settings,
            events,
            write_lock: Mutex::new(()),
        }
    }

    /// Receive every call event published from now on
    pub fn subscribe(&self) -> broadcast::Receiver<CallEvent> {
        self.events.subscribe()
    }

    /// Place a call to a one-to-one chat
    pub async fn call_to_chat(
        &self,
        chat: &Chat,
        enable_audio: bool,
        enable_video: bool,
    ) -> Result<Call> {
        let _guard = self.write_lock.lock().await;

        let friend = CallDomainService::validate_call_target(chat)
            .map_err(|err| rejected("call_to_chat", err))?;
        self.ensure_can_start(chat.id())
            .await
            .map_err(|err| rejected("call_to_chat", err))?;

        let mut call = Call::outgoing(*chat.id(), self.media_for(enable_audio, enable_video));
        info!(
            call_id = %call.id(),
            chat = %chat.id(),
            friend = %friend,
            audio = enable_audio,
            video = enable_video,
            "Calling chat"
        );

        self.commit(&mut call).await?;
        Ok(call)
    }

    /// A friend is calling us
    pub async fn handle_incoming_call(
        &self,
        chat: &Chat,
        caller: FriendId,
        friend_state: FriendCallState,
    ) -> Result<Call> {
        let _guard = self.write_lock.lock().await;

        CallDomainService::validate_caller(chat, &caller)
            .map_err(|err| rejected("handle_incoming_call", err))?;
        self.ensure_can_start(chat.id())
            .await
            .map_err(|err| rejected("handle_incoming_call", err))?;

        let mut call = Call::incoming(*chat.id(), caller, friend_state);
        info!(call_id = %call.id(), chat = %chat.id(), caller = %caller, "Incoming call");

        self.commit(&mut call).await?;
        Ok(call)
    }

    /// Answer a ringing call
    pub async fn answer_call(
        &self,
        call_id: &CallId,
        enable_audio: bool,
        enable_video: bool,
    ) -> Result<Call> {
        let _guard = self.write_lock.lock().await;

        let mut call = self.load(call_id).await?;
        if call.status() != CallStatus::Ringing {
            return Err(rejected(
                "answer_call",
                DomainError::InvalidStateTransition(format!(
                    "Only ringing calls can be answered, call {} is {}",
                    call_id,
                    call.status()
                )),
            ));
        }

        call.set_media(self.media_for(enable_audio, enable_video))
            .and_then(|_| call.activate())
            .map_err(|err| rejected("answer_call", err))?;
        info!(call_id = %call_id, audio = enable_audio, video = enable_video, "Call answered");

        self.commit(&mut call).await?;
        Ok(call)
    }

    /// Apply a user control to a call
    pub async fn send_call_control(
        &self,
        call_id: &CallId,
        control: CallControl,
    ) -> Result<CallUpdate> {
        let _guard = self.write_lock.lock().await;

        let mut call = self.load(call_id).await?;
        debug!(call_id = %call_id, ?control, status = %call.status(), "Call control");

        let applied = match control {
            CallControl::Cancel => {
                let reason = CallDomainService::cancel_reason(call.status());
                return self.end_call(call, reason).await.map(CallUpdate::Ended);
            }
            CallControl::Pause => call.pause_by_user(true),
            CallControl::Resume => call.pause_by_user(false),
            CallControl::MuteAudio => call.set_audio_muted(true),
            CallControl::UnmuteAudio => call.set_audio_muted(false),
            CallControl::HideVideo => call.set_video_bit_rate(0),
            CallControl::ShowVideo => call.set_video_bit_rate(self.settings.video_bit_rate),
        };
        applied.map_err(|err| rejected("send_call_control", err))?;

        self.commit(&mut call).await?;
        Ok(CallUpdate::Updated(call))
    }

    /// The friend's client reported a new call state
    pub async fn handle_friend_call_state(
        &self,
        call_id: &CallId,
        state: FriendCallState,
    ) -> Result<CallUpdate> {
        let _guard = self.write_lock.lock().await;

        let mut call = self.load(call_id).await?;

        if state.is_terminal() {
            if state.error {
                warn!(call_id = %call_id, "Friend reported a call error");
            }
            let reason = CallDomainService::friend_end_reason(&state);
            return self.end_call(call, reason).await.map(CallUpdate::Ended);
        }

        call.apply_friend_state(state)
            .map_err(|err| rejected("handle_friend_call_state", err))?;
        self.commit(&mut call).await?;
        Ok(CallUpdate::Updated(call))
    }

    /// Re-associate a live call with another chat. The target chat must be
    /// one-to-one and, for incoming calls, contain the caller.
    pub async fn move_call_to_chat(&self, call_id: &CallId, chat: &Chat) -> Result<Call> {
        let _guard = self.write_lock.lock().await;

        let mut call = self.load(call_id).await?;
        if call.chat() == chat.id() {
            return Ok(call);
        }

        CallDomainService::validate_call_target(chat)
            .and_then(|_| match call.caller() {
                Some(caller) => CallDomainService::validate_caller(chat, caller),
                None => Ok(()),
            })
            .map_err(|err| rejected("move_call_to_chat", err))?;

        if let Some(existing) = self.repository.find_by_chat(chat.id()).await? {
            return Err(rejected(
                "move_call_to_chat",
                DomainError::Conflict(format!(
                    "Chat {} already has call {}",
                    chat.id(),
                    existing.id()
                )),
            ));
        }

        info!(call_id = %call_id, from = %call.chat(), to = %chat.id(), "Moving call to chat");
        call.set_chat(*chat.id());

        self.commit(&mut call).await?;
        Ok(call)
    }

    pub async fn get_call(&self, call_id: &CallId) -> Result<Option<Call>> {
        self.repository.find_by_id(call_id).await
    }

    pub async fn call_for_chat(&self, chat: &ChatId) -> Result<Option<Call>> {
        self.repository.find_by_chat(chat).await
    }

    /// Every live call, oldest first
    pub async fn active_calls(&self) -> Result<Vec<Call>> {
        self.repository.find_all().await
    }

    async fn ensure_can_start(&self, chat: &ChatId) -> Result<()> {
        if let Some(existing) = self.repository.find_by_chat(chat).await? {
            return Err(DomainError::Conflict(format!(
                "Chat {} already has call {}",
                chat,
                existing.id()
            )));
        }

        let live = self.repository.find_all().await?.len();
        if live >= self.settings.max_active_calls {
            return Err(DomainError::Conflict(format!(
                "Too many calls ({} of {})",
                live, self.settings.max_active_calls
            )));
        }

        Ok(())
    }

    fn media_for(&self, enable_audio: bool, enable_video: bool) -> MediaSettings {
        MediaSettings::new(
            if enable_audio { self.settings.audio_bit_rate } else { 0 },
            if enable_video { self.settings.video_bit_rate } else { 0 },
        )
    }

    async fn load(&self, call_id: &CallId) -> Result<Call> {
        self.repository
            .find_by_id(call_id)
            .await?
            .ok_or_else(|| rejected("load", DomainError::NotFound(format!("Call {}", call_id))))
    }

    async fn commit(&self, call: &mut Call) -> Result<()> {
        // Drain before saving so the stored copy carries no pending events
        let events = call.take_events();
        self.repository.save(call).await?;
        self.publish(events);
        Ok(())
    }

    async fn end_call(&self, mut call: Call, reason: EndReason) -> Result<CallRecord> {
        call.finish(reason.clone())
            .map_err(|err| rejected("end_call", err))?;
        let events = call.take_events();

        let record = CallRecord {
            call_id: *call.id(),
            chat: *call.chat(),
            outgoing: call.is_outgoing(),
            answered: call.answered_at().is_some(),
            reason,
            duration_seconds: call.duration().map(|d| d.num_seconds()),
            ended_at: call.ended_at().copied().unwrap_or_else(Utc::now),
        };

        self.repository.delete(call.id()).await?;
        info!(
            call_id = %record.call_id,
            chat = %record.chat,
            reason = ?record.reason,
            duration = ?record.duration_seconds,
            "Call ended"
        );

        self.publish(events);
        Ok(record)
    }

    fn publish(&self, events: Vec<CallEvent>) {
        for event in events {
            debug!(call_id = %event.call_id(), event = event.event_type(), "Publishing call event");
            // No subscribers is fine
            let _ = self.events.send(event);
        }
    }
}

/// Log a refused operation with the error's kind as a structured field
fn rejected(operation: &'static str, err: DomainError) -> DomainError {
    warn!(operation, error_kind = err.kind(), "{}", err);
    err
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::call::repository::MockCallRepository;

    fn manager_with(repository: MockCallRepository) -> CallsManager {
        CallsManager::new(Arc::new(repository), CallsConfig::default())
    }

    #[tokio::test]
    async fn test_unknown_call_is_not_found() {
        let mut repo = MockCallRepository::new();
        repo.expect_find_by_id().returning(|_| Ok(None));

        let manager = manager_with(repo);
        let result = manager.answer_call(&CallId::new(), true, false).await;
        assert!(matches!(result, Err(DomainError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_repository_failure_is_propagated() {
        let mut repo = MockCallRepository::new();
        repo.expect_find_by_chat().returning(|_| Ok(None));
        repo.expect_find_all().returning(|| Ok(Vec::new()));
        repo.expect_save()
            .returning(|_| Err(DomainError::Internal("disk full".to_string())));

        let manager = manager_with(repo);
        let chat = Chat::with_friend(FriendId::new());
        let result = manager.call_to_chat(&chat, true, false).await;
        assert!(matches!(result, Err(DomainError::Internal(_))));
    }

    #[tokio::test]
    async fn test_call_limit() {
        let mut repo = MockCallRepository::new();
        repo.expect_find_by_chat().returning(|_| Ok(None));
        repo.expect_find_all()
            .returning(|| Ok((0..8).map(|_| Call::new(ChatId::new())).collect()));
        repo.expect_save().never();

        let manager = manager_with(repo);
        let chat = Chat::with_friend(FriendId::new());
        let result = manager.call_to_chat(&chat, true, false).await;
        assert!(matches!(result, Err(DomainError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_group_chat_is_rejected_before_repository() {
        let repo = MockCallRepository::new();
        let manager = manager_with(repo);

        let chat = Chat::new(ChatId::new(), vec![FriendId::new(), FriendId::new()]);
        let result = manager.call_to_chat(&chat, true, true).await;
        assert!(matches!(result, Err(DomainError::ValidationError(_))));
    }

    #[test]
    fn test_rejected_passes_error_through() {
        let err = DomainError::Conflict("busy".to_string());
        let returned = rejected("call_to_chat", err.clone());
        assert_eq!(returned, err);
        assert_eq!(returned.kind(), "conflict");
    }

    #[test]
    fn test_media_for() {
        let manager = manager_with(MockCallRepository::new());
        assert_eq!(manager.media_for(true, false), MediaSettings::new(48, 0));
        assert_eq!(manager.media_for(true, true), MediaSettings::new(48, 400));
        assert_eq!(manager.media_for(false, false), MediaSettings::new(0, 0));
    }
}
