//! What the session asks a front end to show
//!
//! The session never draws anything itself. It emits `View` snapshots and
//! `Notice`s which a `Renderer` turns into pixels, terminal lines, or nothing
//! at all in tests.

use crate::error::ClientError;
use crate::types::{EmojiId, PlayerInfo};

/// Avatar used when a player has none
pub const DEFAULT_AVATAR: &str = "😀";

/// Avatar of the narrator who reads out each prompt
pub const NARRATOR_AVATAR: &str = "🤖";

/// Placeholder when a guess cannot be resolved
pub const NO_GUESS: &str = "—";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Speaker {
    Narrator,
    Author,
    Guesser,
}

/// One bubble in the results replay
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub speaker: Speaker,
    pub avatar: String,
    pub text: String,
    /// Newest bubble, shown with a typing effect
    pub typing: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptEmoji {
    pub emoji: EmojiId,
    pub name: Option<&'static str>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LeaderboardRow {
    pub avatar: String,
    pub name: String,
    pub points: String,
    pub reasons: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum View {
    /// Not in a room yet
    Menu { avatar: EmojiId },
    Lobby {
        room_code: String,
        players: Vec<PlayerInfo>,
        is_host: bool,
        can_start: bool,
    },
    Writing {
        prompt: Vec<PromptEmoji>,
        clock: String,
        progress: f32,
        draft: String,
        word_count: usize,
        editable: bool,
        submitted: bool,
        /// Writing time ran out; no more edits this phase
        locked: bool,
    },
    /// Timer-only refresh during writing
    Timer { clock: String, progress: f32 },
    Guessing {
        story: String,
        emoji_options: Vec<Vec<EmojiId>>,
        players: Vec<PlayerInfo>,
        selected_combo: Option<usize>,
        selected_player: Option<usize>,
        can_submit: bool,
        submitted: bool,
    },
    Results {
        sidebar: Vec<PlayerInfo>,
        selected: usize,
        messages: Vec<ChatMessage>,
        is_host: bool,
        complete: bool,
    },
    Leaderboard { rows: Vec<LeaderboardRow> },
}

#[derive(Debug, Clone, PartialEq)]
pub enum Notice {
    GameStarted,
    StorySubmitted,
    GuessSubmitted,
    /// Writing time ran out; `auto_submitted` tells whether the draft went out
    TimeUp { auto_submitted: bool },
    /// Something the user tried was refused locally
    Rejected(ClientError),
    /// Server-reported room failure, shown verbatim
    RoomError(String),
    RoomClosed,
    Disconnected(ClientError),
}

/// Front end for a session
pub trait Renderer: Send {
    fn render(&mut self, view: &View);

    fn notice(&mut self, notice: &Notice);
}

/// Renderer that discards everything
#[derive(Debug, Default)]
pub struct NullRenderer;

impl Renderer for NullRenderer {
    fn render(&mut self, _view: &View) {}

    fn notice(&mut self, _notice: &Notice) {}
}
