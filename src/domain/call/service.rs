//! Call domain service

use crate::domain::call::value_object::{CallStatus, EndReason, FriendCallState};
use crate::domain::chat::Chat;
use crate::domain::shared::error::DomainError;
use crate::domain::shared::result::Result;
use crate::domain::shared::value_objects::FriendId;

/// Rules that need more than a single call to decide
pub struct CallDomainService;

impl CallDomainService {
    /// Calls can only be placed to one-to-one chats
    pub fn validate_call_target(chat: &Chat) -> Result<FriendId> {
        match chat.single_friend() {
            Some(friend) => Ok(*friend),
            None if chat.is_group() => Err(DomainError::ValidationError(format!(
                "Chat {} has {} friends, group calls are not supported",
                chat.id(),
                chat.friends().len()
            ))),
            None => Err(DomainError::ValidationError(format!(
                "Chat {} has no friend to call",
                chat.id()
            ))),
        }
    }

    /// The caller of an incoming call must be a member of the chat
    pub fn validate_caller(chat: &Chat, caller: &FriendId) -> Result<()> {
        if !chat.friends().contains(caller) {
            return Err(DomainError::ValidationError(format!(
                "Friend {} is not a member of chat {}",
                caller,
                chat.id()
            )));
        }
        Ok(())
    }

    /// Why a call ends when the user cancels it in `status`
    pub fn cancel_reason(status: CallStatus) -> EndReason {
        match status {
            CallStatus::Dialing => EndReason::Canceled,
            CallStatus::Ringing => EndReason::Rejected,
            CallStatus::Active => EndReason::LocalHangup,
        }
    }

    /// Why a call ends when the friend reports a terminal state
    pub fn friend_end_reason(state: &FriendCallState) -> EndReason {
        if state.error {
            EndReason::Failed("friend call error".to_string())
        } else {
            EndReason::RemoteHangup
        }
    }
}
