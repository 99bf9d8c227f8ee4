use crate::types::*;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Actions this client sends to the game server
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "t", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum ClientMessage {
    CreateRoom {
        display_name: String,
        avatar_id: EmojiId,
    },
    JoinRoom {
        display_name: String,
        room_code: RoomCode,
        avatar_id: EmojiId,
    },
    // Host-only
    StartGame {
        room_code: RoomCode,
    },
    /// Overwrites any story previously sent by this player
    SubmitStory {
        room_code: RoomCode,
        story: String,
    },
    SubmitGuess {
        room_code: RoomCode,
        guess: Guess,
    },
    // Host-only
    AdvanceResults {
        room_code: RoomCode,
    },
    // Host-only
    SelectResult {
        room_code: RoomCode,
        idx: usize,
    },
    // Host-only
    RequestLeaderboard {
        room_code: RoomCode,
    },
    RequestNewGame {
        room_code: RoomCode,
    },
}

/// Events pushed by the game server
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "t", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum ServerMessage {
    RoomCreated {
        room_code: RoomCode,
        players: Vec<PlayerInfo>,
    },
    RoomJoined {
        room_code: RoomCode,
        players: Vec<PlayerInfo>,
    },
    PlayersUpdated {
        players: Vec<PlayerInfo>,
    },
    RoomError {
        message: String,
    },
    RoomClosed,
    GameStarted,
    WritingPhase {
        prompt: Vec<EmojiId>,
        /// Instant the writing phase started on the server (epoch milliseconds)
        #[serde(with = "chrono::serde::ts_milliseconds")]
        anchor_time: DateTime<Utc>,
    },
    GuessingPhase {
        story: String,
        emoji_options: Vec<Vec<EmojiId>>,
        players: Vec<PlayerInfo>,
    },
    ResultsPhase {
        players: Vec<PlayerInfo>,
        results: Vec<ResultEntry>,
        #[serde(default)]
        cursor: PlaybackCursor,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        seq: Option<u64>,
    },
    ResultsProgress {
        cursor: PlaybackCursor,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        seq: Option<u64>,
    },
    LeaderboardPhase {
        scores: HashMap<PlayerId, f64>,
        #[serde(default)]
        score_details: HashMap<PlayerId, ScoreDetail>,
        players: Vec<PlayerInfo>,
    },
    NewGameReady {
        #[serde(default)]
        scores: HashMap<PlayerId, f64>,
    },
}

impl ServerMessage {
    /// Wire tag, used when logging dropped events
    pub fn kind(&self) -> &'static str {
        match self {
            ServerMessage::RoomCreated { .. } => "room-created",
            ServerMessage::RoomJoined { .. } => "room-joined",
            ServerMessage::PlayersUpdated { .. } => "players-updated",
            ServerMessage::RoomError { .. } => "room-error",
            ServerMessage::RoomClosed => "room-closed",
            ServerMessage::GameStarted => "game-started",
            ServerMessage::WritingPhase { .. } => "writing-phase",
            ServerMessage::GuessingPhase { .. } => "guessing-phase",
            ServerMessage::ResultsPhase { .. } => "results-phase",
            ServerMessage::ResultsProgress { .. } => "results-progress",
            ServerMessage::LeaderboardPhase { .. } => "leaderboard-phase",
            ServerMessage::NewGameReady { .. } => "new-game-ready",
        }
    }
}
