//! Call bounded context - a call, the chat it belongs to, and its status

pub mod aggregate;
pub mod event;
pub mod repository;
pub mod service;
pub mod value_object;

pub use aggregate::Call;
pub use event::CallEvent;
pub use repository::CallRepository;
pub use service::CallDomainService;
pub use value_object::{
    CallControl, CallStatus, EndReason, FriendCallState, MediaSettings, PausedStatus,
};
