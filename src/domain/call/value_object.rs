//! Call value objects

use serde::{Deserialize, Serialize};
use std::fmt;

/// Call status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CallStatus {
    /// Incoming call, waiting for the user to answer
    Ringing,
    /// Outgoing call, waiting for the friend to answer
    Dialing,
    /// Both sides answered
    Active,
}

impl CallStatus {
    /// Check if status transition is valid
    pub fn can_transition_to(&self, new_status: &CallStatus) -> bool {
        use CallStatus::*;

        matches!((self, new_status), (Ringing, Active) | (Dialing, Active))
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CallStatus::Ringing => "ringing",
            CallStatus::Dialing => "dialing",
            CallStatus::Active => "active",
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self, CallStatus::Active)
    }
}

impl fmt::Display for CallStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Who paused an active call. Both sides can hold a pause at the same time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PausedStatus {
    pub by_user: bool,
    pub by_friend: bool,
}

impl PausedStatus {
    pub const NONE: PausedStatus = PausedStatus {
        by_user: false,
        by_friend: false,
    };

    pub fn is_paused(&self) -> bool {
        self.by_user || self.by_friend
    }
}

/// Call state reported by the friend's client
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FriendCallState {
    pub sending_audio: bool,
    pub sending_video: bool,
    pub accepting_audio: bool,
    pub accepting_video: bool,
    /// Friend hung up
    pub finished: bool,
    /// Friend's client hit an error and dropped the call
    pub error: bool,
}

impl FriendCallState {
    /// Friend sends and accepts audio only
    pub fn audio() -> Self {
        Self {
            sending_audio: true,
            accepting_audio: true,
            ..Self::default()
        }
    }

    /// Friend sends and accepts audio and video
    pub fn audio_video() -> Self {
        Self {
            sending_video: true,
            accepting_video: true,
            ..Self::audio()
        }
    }

    pub fn finished() -> Self {
        Self {
            finished: true,
            ..Self::default()
        }
    }

    /// The friend left the call, one way or another
    pub fn is_terminal(&self) -> bool {
        self.finished || self.error
    }

    /// No media in either direction: the friend has paused the call
    pub fn is_idle(&self) -> bool {
        !(self.sending_audio || self.sending_video || self.accepting_audio || self.accepting_video)
    }
}

/// Local media settings. A bit rate of 0 means the stream is disabled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaSettings {
    /// Audio bit rate in kbit/s
    pub audio_bit_rate: u32,
    /// Video bit rate in kbit/s
    pub video_bit_rate: u32,
    pub audio_muted: bool,
}

impl MediaSettings {
    pub fn new(audio_bit_rate: u32, video_bit_rate: u32) -> Self {
        Self {
            audio_bit_rate,
            video_bit_rate,
            audio_muted: false,
        }
    }

    pub fn audio_enabled(&self) -> bool {
        self.audio_bit_rate > 0
    }

    pub fn video_enabled(&self) -> bool {
        self.video_bit_rate > 0
    }
}

/// Reason for call ending
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EndReason {
    /// User hung up an active call
    LocalHangup,
    /// Friend hung up
    RemoteHangup,
    /// User cancelled an outgoing call before it was answered
    Canceled,
    /// User declined an incoming call
    Rejected,
    /// Call dropped because of an error
    Failed(String),
}

/// Controls the user can send to a call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CallControl {
    Resume,
    Pause,
    Cancel,
    MuteAudio,
    UnmuteAudio,
    HideVideo,
    ShowVideo,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_status_transitions() {
        assert!(CallStatus::Ringing.can_transition_to(&CallStatus::Active));
        assert!(CallStatus::Dialing.can_transition_to(&CallStatus::Active));
    }

    #[test]
    fn test_invalid_status_transitions() {
        assert!(!CallStatus::Active.can_transition_to(&CallStatus::Ringing));
        assert!(!CallStatus::Active.can_transition_to(&CallStatus::Dialing));
        assert!(!CallStatus::Ringing.can_transition_to(&CallStatus::Dialing));
        assert!(!CallStatus::Active.can_transition_to(&CallStatus::Active));
    }

    #[test]
    fn test_paused_status() {
        assert!(!PausedStatus::NONE.is_paused());
        let paused = PausedStatus {
            by_friend: true,
            ..PausedStatus::NONE
        };
        assert!(paused.is_paused());
    }

    #[test]
    fn test_friend_call_state() {
        assert!(FriendCallState::default().is_idle());
        assert!(!FriendCallState::audio().is_idle());
        assert!(FriendCallState::finished().is_terminal());
        assert!(!FriendCallState::audio_video().is_terminal());
    }

    #[test]
    fn test_status_serializes_lowercase() {
        let json = serde_json::to_string(&CallStatus::Dialing).unwrap();
        assert_eq!(json, "\"dialing\"");
    }
}
