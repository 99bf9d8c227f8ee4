use crate::error::GuardError;
use crate::types::{EmojiId, Guess, PlayerId};

/// Word ceiling for a story
pub const MAX_STORY_WORDS: usize = 500;

/// Something a player edits and then submits
pub trait Payload: Clone + PartialEq {
    /// What actually goes over the wire
    type Output;

    /// Check the payload is complete and within limits
    fn prepare(&self) -> Result<Self::Output, GuardError>;

    fn is_blank(&self) -> bool;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardStatus {
    Editing,
    Submitted,
    Locked,
}

/// Submit/edit state around a single user-authored payload.
///
/// `submit` is the only way a payload leaves the guard; after it succeeds the
/// guard refuses further submits and edits until `begin_edit`.
#[derive(Debug, Clone, PartialEq)]
pub struct SubmissionGuard<T: Payload> {
    payload: Option<T>,
    status: GuardStatus,
    // Last value sent, kept so the edit cycle can be checked against it
    last_sent: Option<T>,
}

impl<T: Payload> Default for SubmissionGuard<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Payload> SubmissionGuard<T> {
    pub fn new() -> Self {
        Self {
            payload: None,
            status: GuardStatus::Editing,
            last_sent: None,
        }
    }

    pub fn payload(&self) -> Option<&T> {
        self.payload.as_ref()
    }

    pub fn status(&self) -> GuardStatus {
        self.status
    }

    pub fn is_editable(&self) -> bool {
        self.status == GuardStatus::Editing
    }

    pub fn is_submitted(&self) -> bool {
        self.last_sent.is_some() && self.status != GuardStatus::Editing
    }

    pub fn set_payload(&mut self, value: T) -> Result<(), GuardError> {
        match self.status {
            GuardStatus::Editing => {
                self.payload = Some(value);
                Ok(())
            }
            GuardStatus::Submitted => Err(GuardError::NotEditable),
            GuardStatus::Locked => Err(GuardError::Locked),
        }
    }

    /// Validate and hand out the value to send
    pub fn submit(&mut self) -> Result<T::Output, GuardError> {
        match self.status {
            GuardStatus::Submitted => return Err(GuardError::AlreadySubmitted),
            GuardStatus::Locked => return Err(GuardError::Locked),
            GuardStatus::Editing => {}
        }

        let payload = match &self.payload {
            Some(p) if !p.is_blank() => p,
            _ => return Err(GuardError::EmptyPayload),
        };
        let output = payload.prepare()?;

        self.last_sent = Some(payload.clone());
        self.status = GuardStatus::Submitted;
        Ok(output)
    }

    /// Reopen a submitted payload for editing. A no-op while already editing.
    pub fn begin_edit(&mut self) -> Result<(), GuardError> {
        match self.status {
            GuardStatus::Locked => Err(GuardError::Locked),
            GuardStatus::Editing | GuardStatus::Submitted => {
                self.status = GuardStatus::Editing;
                Ok(())
            }
        }
    }

    pub fn lock(&mut self) {
        self.status = GuardStatus::Locked;
    }

    /// Time's up: submit a pending non-empty draft, then lock either way.
    ///
    /// Returns the value to send when an auto-submit happened. Calling it
    /// again after locking never submits twice.
    pub fn finalize(&mut self) -> Result<Option<T::Output>, GuardError> {
        if self.status != GuardStatus::Editing {
            self.lock();
            return Ok(None);
        }

        let result = match self.submit() {
            Ok(output) => Ok(Some(output)),
            Err(GuardError::EmptyPayload) => Ok(None),
            Err(e) => Err(e),
        };
        self.lock();
        result
    }
}

/// Count words by splitting on whitespace runs
pub fn count_words(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Story draft for the writing phase
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Story(pub String);

impl Story {
    pub fn word_count(&self) -> usize {
        count_words(&self.0)
    }
}

impl Payload for Story {
    type Output = String;

    fn prepare(&self) -> Result<String, GuardError> {
        let words = self.word_count();
        if words > MAX_STORY_WORDS {
            return Err(GuardError::TooLong {
                words,
                limit: MAX_STORY_WORDS,
            });
        }
        Ok(self.0.clone())
    }

    fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

/// Emoji combo and author chosen during the guessing phase
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GuessSelection {
    pub emoji_combo: Option<Vec<EmojiId>>,
    pub player_id: Option<PlayerId>,
}

impl GuessSelection {
    pub fn is_complete(&self) -> bool {
        self.emoji_combo.is_some() && self.player_id.is_some()
    }
}

impl Payload for GuessSelection {
    type Output = Guess;

    fn prepare(&self) -> Result<Guess, GuardError> {
        match (&self.emoji_combo, &self.player_id) {
            (Some(emoji_combo), Some(player_id)) => Ok(Guess {
                emoji_combo: emoji_combo.clone(),
                player_id: player_id.clone(),
            }),
            _ => Err(GuardError::EmptyPayload),
        }
    }

    fn is_blank(&self) -> bool {
        !self.is_complete()
    }
}
