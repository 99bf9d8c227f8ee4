use serde::{Deserialize, Serialize};

/// Opaque ID types for type safety
pub type PlayerId = String;
pub type RoomCode = String;
pub type EmojiId = String;

/// The five mutually exclusive stages of a game round
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Phase {
    Lobby,
    Writing,
    Guessing,
    Results,
    Leaderboard,
}

/// Room this client belongs to. Set once on create/join and never changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomIdentity {
    pub room_code: RoomCode,
    pub is_host: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlayerInfo {
    pub id: PlayerId,
    pub name: String,
    #[serde(default)]
    pub emoji: Option<EmojiId>,
}

/// A guess as sent by a player: which emoji combo and which author
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Guess {
    pub emoji_combo: Vec<EmojiId>,
    pub player_id: PlayerId,
}

/// A guess as recorded against one result
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct GuessRecord {
    pub guesser_id: PlayerId,
    pub chosen_emoji_combo: Vec<EmojiId>,
    pub chosen_author_id: PlayerId,
}

/// One player's result: the prompt they got, the story they wrote, and the guesses about it
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ResultEntry {
    pub author_id: PlayerId,
    #[serde(alias = "emojis")]
    pub prompt: Vec<EmojiId>,
    pub story: String,
    #[serde(default)]
    pub guesses: Vec<GuessRecord>,
}

/// Which result is shown and how many of its reveal steps are visible
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PlaybackCursor {
    pub current_chat_idx: usize,
    pub current_msg_step: u8,
}

impl PlaybackCursor {
    pub fn new(current_chat_idx: usize, current_msg_step: u8) -> Self {
        Self {
            current_chat_idx,
            current_msg_step,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScoreItem {
    pub reason: String,
    #[serde(default)]
    pub points: f64,
}

/// Per-player breakdown of how points were earned
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ScoreDetail {
    #[serde(default)]
    pub personal: Vec<ScoreItem>,
    #[serde(default)]
    pub earned: Vec<ScoreItem>,
}

/// Minimum roster size before the host may start a game
pub const MIN_PLAYERS: usize = 3;

/// Length of a room code after normalization
pub const ROOM_CODE_LENGTH: usize = 6;
