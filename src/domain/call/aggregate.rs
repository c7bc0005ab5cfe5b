//! Call aggregate root

use crate::domain::call::event::{
    CallChatChanged, CallCreated, CallEnded, CallEvent, CallEventBase, CallMediaChanged,
    CallPauseChanged, CallStatusChanged,
};
use crate::domain::call::value_object::{
    CallStatus, EndReason, FriendCallState, MediaSettings, PausedStatus,
};
use crate::domain::shared::error::DomainError;
use crate::domain::shared::result::Result;
use crate::domain::shared::value_objects::{CallId, ChatId, FriendId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Call aggregate root
///
/// A call always belongs to exactly one chat. Everything outside this crate
/// gets read-only access; construction and every mutation go through
/// `pub(crate)` methods driven by [`crate::application::calls::CallsManager`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Call {
    id: CallId,
    /// Owning chat
    chat: ChatId,
    status: CallStatus,
    /// Friend who called us, `None` for outgoing calls
    caller: Option<FriendId>,
    paused: PausedStatus,
    friend_state: FriendCallState,
    media: MediaSettings,
    created_at: DateTime<Utc>,
    answered_at: Option<DateTime<Utc>>,
    ended_at: Option<DateTime<Utc>>,
    /// Pending domain events
    #[serde(skip)]
    events: Vec<CallEvent>,
}

impl Call {
    /// Create a call bound to `chat`. The call starts out dialing with media
    /// disabled.
    pub(crate) fn new(chat: ChatId) -> Self {
        Self::build(chat, None, CallStatus::Dialing)
    }

    /// Outgoing call placed by the user
    pub(crate) fn outgoing(chat: ChatId, media: MediaSettings) -> Self {
        let mut call = Self::new(chat);
        call.media = media;
        call
    }

    /// Incoming call from `caller`
    pub(crate) fn incoming(chat: ChatId, caller: FriendId, friend_state: FriendCallState) -> Self {
        let mut call = Self::build(chat, Some(caller), CallStatus::Ringing);
        call.friend_state = friend_state;
        call
    }

    fn build(chat: ChatId, caller: Option<FriendId>, status: CallStatus) -> Self {
        let mut call = Self {
            id: CallId::new(),
            chat,
            status,
            caller,
            paused: PausedStatus::NONE,
            friend_state: FriendCallState::default(),
            media: MediaSettings::default(),
            created_at: Utc::now(),
            answered_at: None,
            ended_at: None,
            events: Vec::new(),
        };

        call.record_event(CallEvent::Created(CallCreated {
            base: CallEventBase::new("call.created", call.id),
            chat,
            caller,
            status,
        }));

        call
    }

    /// Re-associate the call with another chat
    pub(crate) fn set_chat(&mut self, chat: ChatId) {
        if self.chat == chat {
            return;
        }

        let from = std::mem::replace(&mut self.chat, chat);
        self.record_event(CallEvent::ChatChanged(CallChatChanged {
            base: CallEventBase::new("call.chat_changed", self.id),
            from,
            to: chat,
        }));
    }

    /// Overwrite the status slot. Transition rules are enforced by the
    /// lifecycle methods, not here.
    pub(crate) fn set_status(&mut self, status: CallStatus) {
        if self.status == status {
            return;
        }

        let from = std::mem::replace(&mut self.status, status);
        self.record_event(CallEvent::StatusChanged(CallStatusChanged {
            base: CallEventBase::new("call.status_changed", self.id),
            from,
            to: status,
        }));
    }

    /// Both sides answered
    pub(crate) fn activate(&mut self) -> Result<()> {
        self.ensure_not_ended()?;
        if !self.status.can_transition_to(&CallStatus::Active) {
            return Err(DomainError::InvalidStateTransition(format!(
                "Cannot transition from {} to {}",
                self.status,
                CallStatus::Active
            )));
        }

        self.set_status(CallStatus::Active);
        self.answered_at = Some(Utc::now());
        Ok(())
    }

    pub(crate) fn set_media(&mut self, media: MediaSettings) -> Result<()> {
        self.ensure_not_ended()?;
        if self.media == media {
            return Ok(());
        }

        self.media = media;
        self.record_event(CallEvent::MediaChanged(CallMediaChanged {
            base: CallEventBase::new("call.media_changed", self.id),
            media,
        }));
        Ok(())
    }

    pub(crate) fn set_audio_muted(&mut self, muted: bool) -> Result<()> {
        self.ensure_active("mute audio")?;
        self.set_media(MediaSettings {
            audio_muted: muted,
            ..self.media
        })
    }

    pub(crate) fn set_video_bit_rate(&mut self, video_bit_rate: u32) -> Result<()> {
        self.ensure_active("change video")?;
        self.set_media(MediaSettings {
            video_bit_rate,
            ..self.media
        })
    }

    /// Pause or resume the call from our side
    pub(crate) fn pause_by_user(&mut self, paused: bool) -> Result<()> {
        self.ensure_active("pause")?;
        self.set_paused(PausedStatus {
            by_user: paused,
            ..self.paused
        });
        Ok(())
    }

    /// Apply a state update from the friend's client.
    ///
    /// Any media flag while dialing means the friend picked up. On an active
    /// call, losing every media flag means the friend paused.
    pub(crate) fn apply_friend_state(&mut self, state: FriendCallState) -> Result<()> {
        self.ensure_not_ended()?;
        if state.is_terminal() {
            return Err(DomainError::InvalidOperation(
                "Terminal friend state must end the call".to_string(),
            ));
        }

        self.friend_state = state;

        match self.status {
            CallStatus::Dialing if !state.is_idle() => self.activate(),
            CallStatus::Active => {
                self.set_paused(PausedStatus {
                    by_friend: state.is_idle(),
                    ..self.paused
                });
                Ok(())
            }
            _ => Ok(()),
        }
    }

    /// End the call
    pub(crate) fn finish(&mut self, reason: EndReason) -> Result<()> {
        self.ensure_not_ended()?;

        let ended_at = Utc::now();
        self.ended_at = Some(ended_at);

        let duration_seconds = self
            .answered_at
            .map(|answered| (ended_at - answered).num_seconds());

        self.record_event(CallEvent::Ended(CallEnded {
            base: CallEventBase::new("call.ended", self.id),
            chat: self.chat,
            reason,
            ended_at,
            duration_seconds,
        }));

        Ok(())
    }

    fn set_paused(&mut self, paused: PausedStatus) {
        if self.paused == paused {
            return;
        }

        self.paused = paused;
        self.record_event(CallEvent::PauseChanged(CallPauseChanged {
            base: CallEventBase::new("call.pause_changed", self.id),
            paused,
        }));
    }

    fn ensure_not_ended(&self) -> Result<()> {
        if self.ended_at.is_some() {
            return Err(DomainError::InvalidStateTransition(format!(
                "Call {} has already ended",
                self.id
            )));
        }
        Ok(())
    }

    fn ensure_active(&self, action: &str) -> Result<()> {
        self.ensure_not_ended()?;
        if !self.status.is_active() {
            return Err(DomainError::InvalidOperation(format!(
                "Cannot {} a call that is {}",
                action, self.status
            )));
        }
        Ok(())
    }

    fn record_event(&mut self, event: CallEvent) {
        self.events.push(event);
    }

    /// Take all pending events
    pub fn take_events(&mut self) -> Vec<CallEvent> {
        std::mem::take(&mut self.events)
    }

    // Getters
    pub fn id(&self) -> &CallId {
        &self.id
    }

    pub fn chat(&self) -> &ChatId {
        &self.chat
    }

    pub fn status(&self) -> CallStatus {
        self.status
    }

    pub fn caller(&self) -> Option<&FriendId> {
        self.caller.as_ref()
    }

    pub fn is_outgoing(&self) -> bool {
        self.caller.is_none()
    }

    pub fn paused(&self) -> PausedStatus {
        self.paused
    }

    pub fn friend_state(&self) -> FriendCallState {
        self.friend_state
    }

    pub fn media(&self) -> MediaSettings {
        self.media
    }

    pub fn created_at(&self) -> &DateTime<Utc> {
        &self.created_at
    }

    pub fn answered_at(&self) -> Option<&DateTime<Utc>> {
        self.answered_at.as_ref()
    }

    pub fn ended_at(&self) -> Option<&DateTime<Utc>> {
        self.ended_at.as_ref()
    }

    /// Talk time: from answer until the end, or until now for a live call
    pub fn duration(&self) -> Option<chrono::Duration> {
        self.answered_at
            .map(|answered| self.ended_at.unwrap_or_else(Utc::now) - answered)
    }

    pub fn is_ended(&self) -> bool {
        self.ended_at.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_call_is_bound_to_chat() {
        let chat = ChatId::new();
        let call = Call::new(chat);

        assert_eq!(call.chat(), &chat);
        assert_eq!(call.status(), CallStatus::Dialing);
        assert!(call.is_outgoing());
        assert!(!call.media().audio_enabled());
    }

    #[test]
    fn test_set_status_is_read_back() {
        let mut call = Call::new(ChatId::new());

        call.set_status(CallStatus::Ringing);
        assert_eq!(call.status(), CallStatus::Ringing);

        call.set_status(CallStatus::Active);
        assert_eq!(call.status(), CallStatus::Active);
    }

    #[test]
    fn test_calls_on_same_chat_are_distinct() {
        let chat = ChatId::new();
        let mut first = Call::new(chat);
        let second = Call::new(chat);

        assert_ne!(first.id(), second.id());

        first.set_status(CallStatus::Active);
        assert_eq!(second.status(), CallStatus::Dialing);
    }

    #[test]
    fn test_set_chat_records_event() {
        let mut call = Call::new(ChatId::new());
        call.take_events();

        let other = ChatId::new();
        call.set_chat(other);
        assert_eq!(call.chat(), &other);

        let events = call.take_events();
        assert_eq!(events.len(), 1);
        assert!(matches!(&events[0], CallEvent::ChatChanged(e) if e.to == other));

        // Same chat again is a no-op
        call.set_chat(other);
        assert!(call.take_events().is_empty());
    }

    #[test]
    fn test_outgoing_lifecycle() {
        let mut call = Call::outgoing(ChatId::new(), MediaSettings::new(48, 0));
        assert_eq!(call.status(), CallStatus::Dialing);

        // Friend still silent: keep dialing
        call.apply_friend_state(FriendCallState::default()).unwrap();
        assert_eq!(call.status(), CallStatus::Dialing);

        call.apply_friend_state(FriendCallState::audio()).unwrap();
        assert_eq!(call.status(), CallStatus::Active);
        assert!(call.answered_at().is_some());

        call.finish(EndReason::LocalHangup).unwrap();
        assert!(call.is_ended());
        assert!(call.duration().is_some());

        let events = call.take_events();
        assert_eq!(events.len(), 3); // Created, StatusChanged, Ended
        assert!(matches!(
            &events[2],
            CallEvent::Ended(e) if e.duration_seconds.is_some()
        ));
    }

    #[test]
    fn test_incoming_call_rings() {
        let caller = FriendId::new();
        let mut call = Call::incoming(ChatId::new(), caller, FriendCallState::audio());

        assert_eq!(call.status(), CallStatus::Ringing);
        assert_eq!(call.caller(), Some(&caller));
        assert!(!call.is_outgoing());

        // Friend flags do not answer for us
        call.apply_friend_state(FriendCallState::audio_video()).unwrap();
        assert_eq!(call.status(), CallStatus::Ringing);

        call.activate().unwrap();
        assert_eq!(call.status(), CallStatus::Active);
    }

    #[test]
    fn test_cannot_activate_twice() {
        let mut call = Call::new(ChatId::new());
        call.activate().unwrap();
        assert!(matches!(
            call.activate(),
            Err(DomainError::InvalidStateTransition(_))
        ));
    }

    #[test]
    fn test_pause_requires_active_call() {
        let mut call = Call::new(ChatId::new());
        assert!(matches!(
            call.pause_by_user(true),
            Err(DomainError::InvalidOperation(_))
        ));

        call.activate().unwrap();
        call.pause_by_user(true).unwrap();
        assert!(call.paused().by_user);

        call.pause_by_user(false).unwrap();
        assert!(!call.paused().is_paused());
    }

    #[test]
    fn test_friend_pause() {
        let mut call = Call::outgoing(ChatId::new(), MediaSettings::new(48, 400));
        call.apply_friend_state(FriendCallState::audio_video()).unwrap();

        call.apply_friend_state(FriendCallState::default()).unwrap();
        assert!(call.paused().by_friend);
        assert!(!call.paused().by_user);

        call.apply_friend_state(FriendCallState::audio()).unwrap();
        assert!(!call.paused().is_paused());
    }

    #[test]
    fn test_terminal_friend_state_is_rejected() {
        let mut call = Call::new(ChatId::new());
        assert!(call.apply_friend_state(FriendCallState::finished()).is_err());
    }

    #[test]
    fn test_cannot_mutate_after_end() {
        let mut call = Call::new(ChatId::new());
        call.finish(EndReason::Canceled).unwrap();

        assert!(call.finish(EndReason::Canceled).is_err());
        assert!(call.activate().is_err());
        assert!(call.set_media(MediaSettings::new(48, 0)).is_err());
        assert!(call.duration().is_none());
    }

    #[test]
    fn test_mute_and_video_toggle() {
        let mut call = Call::outgoing(ChatId::new(), MediaSettings::new(48, 400));
        call.activate().unwrap();

        call.set_audio_muted(true).unwrap();
        assert!(call.media().audio_muted);

        call.set_video_bit_rate(0).unwrap();
        assert!(!call.media().video_enabled());
        assert!(call.media().audio_enabled());
    }

    #[test]
    fn test_serde_skips_events() {
        let call = Call::new(ChatId::new());
        let json = serde_json::to_value(&call).unwrap();
        assert!(json.get("events").is_none());
        assert_eq!(json["status"], "dialing");
    }
}
