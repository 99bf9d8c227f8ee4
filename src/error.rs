//! Error taxonomy for the client session
//!
//! Validation errors are corrected locally and never sent. Protocol errors are
//! logged and the offending event dropped. Room errors come from the server and
//! are shown verbatim. Channel errors invalidate the session.

use crate::types::Phase;

/// Result type for session operations
pub type ClientResult<T> = Result<T, ClientError>;

/// Why a submission guard refused an operation
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GuardError {
    #[error("nothing to submit yet")]
    EmptyPayload,

    #[error("already submitted, edit first to change it")]
    AlreadySubmitted,

    #[error("story is {words} words long, the limit is {limit}")]
    TooLong { words: usize, limit: usize },

    #[error("submission is not editable right now")]
    NotEditable,

    #[error("time is up, submission is locked")]
    Locked,
}

/// User input that was rejected before anything was sent
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error(transparent)]
    Guard(#[from] GuardError),

    #[error("room code must be {expected} letters or digits, got {got:?}")]
    RoomCode { got: String, expected: usize },

    #[error("please enter a display name")]
    DisplayName,

    #[error("only the host can {0}")]
    NotHost(&'static str),

    #[error("need at least {need} players to start, have {have}")]
    NotEnoughPlayers { have: usize, need: usize },

    #[error("option {idx} does not exist (only {len} available)")]
    OptionOutOfRange { idx: usize, len: usize },

    #[error("cannot {action} during {phase:?}")]
    WrongPhase { action: &'static str, phase: Phase },

    #[error("already in room {0}")]
    AlreadyInRoom(String),

    #[error("not in a room")]
    NotInRoom,
}

/// Inbound event that does not fit the current session state
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProtocolError {
    #[error("unexpected {event} during {phase:?}")]
    UnexpectedEvent { event: &'static str, phase: Phase },

    #[error("cursor {chat_idx}/{msg_step} is out of range for {chat_count} results")]
    CursorOutOfRange {
        chat_idx: usize,
        msg_step: u8,
        chat_count: usize,
    },

    #[error("stale cursor update (seq {got}, already at {current})")]
    StaleCursor { got: u64, current: u64 },

    #[error("room event for {got} while in room {current}")]
    RoomMismatch { got: String, current: String },
}

/// Transport failures
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ChannelError {
    #[error("connection closed")]
    Closed,

    #[error("failed to encode message: {0}")]
    Encode(String),

    #[error("failed to decode message: {0}")]
    Decode(String),

    #[error("websocket error: {0}")]
    WebSocket(String),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ClientError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error("room error: {0}")]
    Room(String),

    #[error(transparent)]
    Channel(#[from] ChannelError),
}

impl From<GuardError> for ClientError {
    fn from(e: GuardError) -> Self {
        ClientError::Validation(ValidationError::Guard(e))
    }
}
