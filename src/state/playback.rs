use crate::error::{ProtocolError, ValidationError};
use crate::types::*;
use crate::view::{ChatMessage, Speaker, DEFAULT_AVATAR, NARRATOR_AVATAR, NO_GUESS};
use std::collections::VecDeque;

/// Index of the last reveal step (prompt, story, outcome)
pub const LAST_STEP: u8 = 2;

/// What an `advance` did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advance {
    Moved(PlaybackCursor),
    /// Already on the last step of the last result
    Complete,
}

/// Turn-by-turn replay of every player's result.
///
/// Only the host moves the cursor with `advance`/`select_chat`; everyone else
/// mirrors the host through `apply_cursor`.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackStepper {
    players: Vec<PlayerInfo>,
    results: Vec<ResultEntry>,
    cursor: PlaybackCursor,
    last_seq: Option<u64>,
    // Local host moves whose broadcast has not come back yet, oldest first
    pending_echoes: VecDeque<PlaybackCursor>,
}

impl PlaybackStepper {
    pub fn new(
        players: Vec<PlayerInfo>,
        results: Vec<ResultEntry>,
        cursor: PlaybackCursor,
        seq: Option<u64>,
    ) -> Self {
        let mut stepper = Self {
            players,
            results,
            cursor: PlaybackCursor::default(),
            last_seq: seq,
            pending_echoes: VecDeque::new(),
        };

        if stepper.in_range(&cursor) {
            stepper.cursor = cursor;
        } else if !stepper.results.is_empty() {
            tracing::warn!(
                "Initial results cursor {:?} out of range for {} results, starting from the top",
                cursor,
                stepper.results.len()
            );
        }
        stepper
    }

    pub fn cursor(&self) -> PlaybackCursor {
        self.cursor
    }

    pub fn players(&self) -> &[PlayerInfo] {
        &self.players
    }

    pub fn results(&self) -> &[ResultEntry] {
        &self.results
    }

    pub fn chat_count(&self) -> usize {
        self.results.len()
    }

    fn in_range(&self, cursor: &PlaybackCursor) -> bool {
        cursor.current_chat_idx < self.results.len() && cursor.current_msg_step <= LAST_STEP
    }

    /// True once the last step of the last result is visible, or when there is nothing to show
    pub fn is_complete(&self) -> bool {
        match self.results.len() {
            0 => true,
            n => self.cursor.current_chat_idx == n - 1 && self.cursor.current_msg_step >= LAST_STEP,
        }
    }

    /// Reveal the next step, moving on to the next result after the third one
    pub fn advance(&mut self) -> Advance {
        if self.is_complete() {
            return Advance::Complete;
        }

        if self.cursor.current_msg_step < LAST_STEP {
            self.cursor.current_msg_step += 1;
        } else {
            self.cursor = PlaybackCursor::new(self.cursor.current_chat_idx + 1, 0);
        }
        self.pending_echoes.push_back(self.cursor);
        Advance::Moved(self.cursor)
    }

    /// Jump to a specific player's result, starting from its first step
    pub fn select_chat(&mut self, idx: usize) -> Result<PlaybackCursor, ValidationError> {
        if idx >= self.results.len() {
            return Err(ValidationError::OptionOutOfRange {
                idx,
                len: self.results.len(),
            });
        }
        self.cursor = PlaybackCursor::new(idx, 0);
        self.pending_echoes.push_back(self.cursor);
        Ok(self.cursor)
    }

    /// Mirror a cursor broadcast by the host.
    ///
    /// Updates carrying a sequence number older than the last applied one are
    /// dropped, as are cursors pointing outside the dataset. On the host, the
    /// echo of a move it already made locally is acknowledged without moving
    /// the cursor back.
    pub fn apply_cursor(
        &mut self,
        cursor: PlaybackCursor,
        seq: Option<u64>,
    ) -> Result<(), ProtocolError> {
        if let (Some(got), Some(current)) = (seq, self.last_seq) {
            if got <= current {
                return Err(ProtocolError::StaleCursor { got, current });
            }
        }

        if !self.in_range(&cursor) {
            return Err(ProtocolError::CursorOutOfRange {
                chat_idx: cursor.current_chat_idx,
                msg_step: cursor.current_msg_step,
                chat_count: self.results.len(),
            });
        }

        if seq.is_some() {
            self.last_seq = seq;
        }

        if let Some(pos) = self.pending_echoes.iter().position(|c| *c == cursor) {
            self.pending_echoes.drain(..=pos);
            tracing::debug!("Echo of local move to {:?}", cursor);
            return Ok(());
        }

        self.pending_echoes.clear();
        self.cursor = cursor;
        Ok(())
    }

    /// The result being shown and how many of its steps are visible
    pub fn current(&self) -> Option<(&ResultEntry, usize)> {
        self.results
            .get(self.cursor.current_chat_idx)
            .map(|entry| (entry, usize::from(self.cursor.current_msg_step) + 1))
    }

    fn player(&self, id: &str) -> Option<&PlayerInfo> {
        self.players.iter().find(|p| p.id == id)
    }

    /// Visible bubbles for the current result, newest last
    pub fn messages(&self) -> Vec<ChatMessage> {
        let Some((entry, visible)) = self.current() else {
            return Vec::new();
        };

        let author_avatar = self
            .player(&entry.author_id)
            .or_else(|| self.players.get(self.cursor.current_chat_idx))
            .and_then(|p| p.emoji.clone())
            .unwrap_or_else(|| DEFAULT_AVATAR.to_string());
        let (guesser_avatar, outcome) = self.outcome(entry);

        let steps = [
            (Speaker::Narrator, NARRATOR_AVATAR.to_string(), entry.prompt.join(" ")),
            (Speaker::Author, author_avatar, entry.story.clone()),
            (Speaker::Guesser, guesser_avatar, outcome),
        ];

        steps
            .into_iter()
            .take(visible)
            .enumerate()
            .map(|(i, (speaker, avatar, text))| ChatMessage {
                speaker,
                avatar,
                text,
                typing: i + 1 == visible,
            })
            .collect()
    }

    /// Avatar and text of the outcome bubble
    fn outcome(&self, entry: &ResultEntry) -> (String, String) {
        let Some(guess) = select_guess(entry) else {
            return (DEFAULT_AVATAR.to_string(), NO_GUESS.to_string());
        };

        let guesser = self.player(&guess.guesser_id);
        let chosen = self.player(&guess.chosen_author_id);
        let avatar = guesser
            .and_then(|p| p.emoji.clone())
            .unwrap_or_else(|| DEFAULT_AVATAR.to_string());

        let text = match (guesser, chosen) {
            (Some(_), Some(chosen)) => format!(
                "{} — {} ({})",
                guess.chosen_emoji_combo.join(" "),
                chosen.name,
                chosen.emoji.as_deref().unwrap_or(DEFAULT_AVATAR)
            ),
            _ => NO_GUESS.to_string(),
        };
        (avatar, text)
    }
}

/// Pick the guess to show for a result: one that named this author, else the first received
pub fn select_guess(entry: &ResultEntry) -> Option<&GuessRecord> {
    entry
        .guesses
        .iter()
        .find(|g| g.chosen_author_id == entry.author_id)
        .or_else(|| entry.guesses.first())
}
