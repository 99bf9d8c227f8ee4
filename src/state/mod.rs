//! Client session: the phase state machine
//!
//! A `Session` owns everything the client knows about the current game and is
//! driven by a single reducer, [`Session::handle`]. Inbound server events, user
//! intents, timer ticks and disconnects all go through it, and it answers with
//! a list of [`Effect`]s (messages to send, views to render, notices to show).
//! The session never touches the clock or the network itself.

pub mod countdown;
pub mod guard;
pub mod leaderboard;
pub mod lobby;
pub mod phase;
pub mod playback;

use crate::avatar;
use crate::error::*;
use crate::protocol::{ClientMessage, ServerMessage};
use crate::types::*;
use crate::view::{Notice, PromptEmoji, View};
use chrono::{DateTime, Utc};
use std::collections::HashMap;

use countdown::{format_clock, Countdown};
use guard::{GuessSelection, Story, SubmissionGuard};
use leaderboard::{leaderboard_rows, LeaderboardTrigger};
use playback::{Advance, PlaybackStepper};

/// Default length of the writing phase
pub const DEFAULT_WRITING_SECONDS: u32 = 180;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    pub writing_seconds: u32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            writing_seconds: DEFAULT_WRITING_SECONDS,
        }
    }
}

/// Things the user can do
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    CreateRoom { display_name: String },
    JoinRoom { display_name: String, room_code: String },
    ChangeAvatar,
    StartGame,
    /// Replace the story draft
    SetStory(String),
    SelectEmojiCombo(usize),
    SelectGuessTarget(usize),
    /// Submit the story or guess of the current phase
    Submit,
    /// Reopen the story or guess of the current phase
    BeginEdit,
    AdvanceResults,
    SelectResult(usize),
    RequestNewGame,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    Server(ServerMessage),
    User(Intent),
    /// Periodic timer, once per second
    Tick,
    Disconnected(ChannelError),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    Send(ClientMessage),
    Render(View),
    Notice(Notice),
    PersistAvatar(EmojiId),
}

#[derive(Debug, Clone)]
struct WritingState {
    prompt: Vec<EmojiId>,
    countdown: Countdown,
    guard: SubmissionGuard<Story>,
}

#[derive(Debug, Clone)]
struct GuessingState {
    story: String,
    emoji_options: Vec<Vec<EmojiId>>,
    players: Vec<PlayerInfo>,
    guard: SubmissionGuard<GuessSelection>,
}

#[derive(Debug, Clone)]
struct ResultsState {
    stepper: PlaybackStepper,
    trigger: LeaderboardTrigger,
    // Cursor the phase was entered with, to recognise a repeated snapshot
    entry_cursor: PlaybackCursor,
}

#[derive(Debug, Clone)]
struct LeaderboardState {
    scores: HashMap<PlayerId, f64>,
    score_details: HashMap<PlayerId, ScoreDetail>,
    players: Vec<PlayerInfo>,
}

/// Phase plus the data that only lives while in it
#[derive(Debug, Clone)]
enum PhaseState {
    Lobby,
    Writing(WritingState),
    Guessing(GuessingState),
    Results(ResultsState),
    Leaderboard(LeaderboardState),
}

impl PhaseState {
    fn phase(&self) -> Phase {
        match self {
            PhaseState::Lobby => Phase::Lobby,
            PhaseState::Writing(_) => Phase::Writing,
            PhaseState::Guessing(_) => Phase::Guessing,
            PhaseState::Results(_) => Phase::Results,
            PhaseState::Leaderboard(_) => Phase::Leaderboard,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Session {
    config: SessionConfig,
    avatar: EmojiId,
    identity: Option<RoomIdentity>,
    players: Vec<PlayerInfo>,
    phase: PhaseState,
}

impl Session {
    pub fn new(config: SessionConfig, avatar: EmojiId) -> Self {
        Self {
            config,
            avatar,
            identity: None,
            players: Vec::new(),
            phase: PhaseState::Lobby,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase.phase()
    }

    pub fn identity(&self) -> Option<&RoomIdentity> {
        self.identity.as_ref()
    }

    pub fn is_host(&self) -> bool {
        self.identity.as_ref().is_some_and(|i| i.is_host)
    }

    pub fn players(&self) -> &[PlayerInfo] {
        &self.players
    }

    pub fn avatar(&self) -> &str {
        &self.avatar
    }

    pub fn countdown(&self) -> Option<&Countdown> {
        match &self.phase {
            PhaseState::Writing(w) => Some(&w.countdown),
            _ => None,
        }
    }

    pub fn story_guard(&self) -> Option<&SubmissionGuard<Story>> {
        match &self.phase {
            PhaseState::Writing(w) => Some(&w.guard),
            _ => None,
        }
    }

    pub fn guess_guard(&self) -> Option<&SubmissionGuard<GuessSelection>> {
        match &self.phase {
            PhaseState::Guessing(g) => Some(&g.guard),
            _ => None,
        }
    }

    pub fn stepper(&self) -> Option<&PlaybackStepper> {
        match &self.phase {
            PhaseState::Results(r) => Some(&r.stepper),
            _ => None,
        }
    }

    /// Feed one event through the state machine
    pub fn handle(&mut self, event: SessionEvent, now: DateTime<Utc>) -> Vec<Effect> {
        let mut effects = Vec::new();

        let result = match event {
            SessionEvent::Server(msg) => self.on_server(msg, now, &mut effects),
            SessionEvent::User(intent) => self.on_intent(intent, now, &mut effects),
            SessionEvent::Tick => {
                self.on_tick(now, &mut effects);
                Ok(())
            }
            SessionEvent::Disconnected(e) => {
                tracing::error!("Channel lost: {}", e);
                self.reset();
                effects.push(Effect::Notice(Notice::Disconnected(e.into())));
                effects.push(Effect::Render(self.view(now)));
                Ok(())
            }
        };

        match result {
            Ok(()) => {}
            Err(ClientError::Protocol(e)) => {
                tracing::warn!("Dropping event: {}", e);
            }
            Err(e) => {
                tracing::warn!("Rejected: {}", e);
                effects.push(Effect::Notice(Notice::Rejected(e)));
            }
        }

        effects
    }

    fn room_code(&self) -> Result<RoomCode, ValidationError> {
        self.identity
            .as_ref()
            .map(|i| i.room_code.clone())
            .ok_or(ValidationError::NotInRoom)
    }

    /// Back to the entry state: no room, no roster, no phase data
    fn reset(&mut self) {
        self.enter(PhaseState::Lobby);
        self.identity = None;
        self.players.clear();
    }

    /// Replace the current phase, cancelling its timer first
    fn enter(&mut self, next: PhaseState) {
        if let PhaseState::Writing(w) = &mut self.phase {
            w.countdown.cancel();
        }
        let from = self.phase();
        self.phase = next;
        tracing::info!("Phase {:?} -> {:?}", from, self.phase());
    }

    fn check_transition(&self, to: Phase, event: &'static str) -> Result<(), ProtocolError> {
        let from = self.phase();
        if self.identity.is_none() || !phase::is_valid_transition(from, to) {
            tracing::debug!(
                "{:?} only moves on to {:?}",
                from,
                phase::valid_transitions(from)
            );
            return Err(ProtocolError::UnexpectedEvent { event, phase: from });
        }
        Ok(())
    }

    // ========== Inbound ==========

    fn on_server(
        &mut self,
        msg: ServerMessage,
        now: DateTime<Utc>,
        effects: &mut Vec<Effect>,
    ) -> ClientResult<()> {
        tracing::debug!("Received {}", msg.kind());

        match msg {
            ServerMessage::RoomCreated { room_code, players } => {
                self.enter_room(room_code, players, true, now, effects)?
            }
            ServerMessage::RoomJoined { room_code, players } => {
                self.enter_room(room_code, players, false, now, effects)?
            }
            ServerMessage::PlayersUpdated { players } => {
                self.players = players;
                if self.identity.is_some() && self.phase() == Phase::Lobby {
                    effects.push(Effect::Render(self.view(now)));
                }
            }
            ServerMessage::RoomError { message } => {
                tracing::warn!("Room error: {}", message);
                effects.push(Effect::Notice(Notice::RoomError(message)));
            }
            ServerMessage::RoomClosed => {
                tracing::info!("Room closed");
                self.reset();
                effects.push(Effect::Notice(Notice::RoomClosed));
                effects.push(Effect::Render(self.view(now)));
            }
            ServerMessage::GameStarted => {
                if self.identity.is_none() || self.phase() != Phase::Lobby {
                    return Err(ProtocolError::UnexpectedEvent {
                        event: "game-started",
                        phase: self.phase(),
                    }
                    .into());
                }
                effects.push(Effect::Notice(Notice::GameStarted));
            }
            ServerMessage::WritingPhase {
                prompt,
                anchor_time,
            } => {
                if let PhaseState::Writing(w) = &self.phase {
                    if w.prompt == prompt && w.countdown.anchor_time() == anchor_time {
                        tracing::debug!("Repeated writing-phase, ignoring");
                        return Ok(());
                    }
                }
                self.check_transition(Phase::Writing, "writing-phase")?;

                self.enter(PhaseState::Writing(WritingState {
                    prompt,
                    countdown: Countdown::start(anchor_time, self.config.writing_seconds),
                    guard: SubmissionGuard::new(),
                }));
                effects.push(Effect::Render(self.view(now)));
                // A late joiner may already be out of time
                self.on_tick(now, effects);
            }
            ServerMessage::GuessingPhase {
                story,
                emoji_options,
                players,
            } => {
                if let PhaseState::Guessing(g) = &self.phase {
                    if g.story == story && g.emoji_options == emoji_options && g.players == players
                    {
                        tracing::debug!("Repeated guessing-phase, ignoring");
                        return Ok(());
                    }
                }
                self.check_transition(Phase::Guessing, "guessing-phase")?;

                self.enter(PhaseState::Guessing(GuessingState {
                    story,
                    emoji_options,
                    players,
                    guard: SubmissionGuard::new(),
                }));
                effects.push(Effect::Render(self.view(now)));
            }
            ServerMessage::ResultsPhase {
                players,
                results,
                cursor,
                seq,
            } => {
                if let PhaseState::Results(r) = &self.phase {
                    if r.stepper.players() == players.as_slice()
                        && r.stepper.results() == results.as_slice()
                        && r.entry_cursor == cursor
                    {
                        tracing::debug!("Repeated results-phase, ignoring");
                        return Ok(());
                    }
                }
                self.check_transition(Phase::Results, "results-phase")?;

                self.enter(PhaseState::Results(ResultsState {
                    stepper: PlaybackStepper::new(players, results, cursor, seq),
                    trigger: LeaderboardTrigger::new(),
                    entry_cursor: cursor,
                }));
                effects.push(Effect::Render(self.view(now)));
            }
            ServerMessage::ResultsProgress { cursor, seq } => {
                let PhaseState::Results(r) = &mut self.phase else {
                    return Err(ProtocolError::UnexpectedEvent {
                        event: "results-progress",
                        phase: self.phase(),
                    }
                    .into());
                };
                r.stepper.apply_cursor(cursor, seq)?;
                effects.push(Effect::Render(self.view(now)));
            }
            ServerMessage::LeaderboardPhase {
                scores,
                score_details,
                players,
            } => {
                if let PhaseState::Leaderboard(l) = &self.phase {
                    if l.scores == scores && l.score_details == score_details && l.players == players
                    {
                        tracing::debug!("Repeated leaderboard-phase, ignoring");
                        return Ok(());
                    }
                }
                self.check_transition(Phase::Leaderboard, "leaderboard-phase")?;

                self.enter(PhaseState::Leaderboard(LeaderboardState {
                    scores,
                    score_details,
                    players,
                }));
                effects.push(Effect::Render(self.view(now)));
            }
            ServerMessage::NewGameReady { scores } => {
                if self.identity.is_some() && self.phase() == Phase::Lobby {
                    tracing::debug!("Repeated new-game-ready, ignoring");
                    return Ok(());
                }
                self.check_transition(Phase::Lobby, "new-game-ready")?;

                tracing::info!("New game ready ({} scores carried over)", scores.len());
                self.enter(PhaseState::Lobby);
                effects.push(Effect::Render(self.view(now)));
            }
        }

        Ok(())
    }

    fn enter_room(
        &mut self,
        room_code: RoomCode,
        players: Vec<PlayerInfo>,
        is_host: bool,
        now: DateTime<Utc>,
        effects: &mut Vec<Effect>,
    ) -> ClientResult<()> {
        let room_code = room_code.trim().to_uppercase();

        if let Some(identity) = &self.identity {
            if identity.room_code == room_code {
                tracing::debug!("Already in room {}, ignoring", room_code);
                return Ok(());
            }
            return Err(ProtocolError::RoomMismatch {
                got: room_code,
                current: identity.room_code.clone(),
            }
            .into());
        }

        tracing::info!(
            "Entered room {} as {} with {} players",
            room_code,
            if is_host { "host" } else { "guest" },
            players.len()
        );
        self.enter(PhaseState::Lobby);
        self.identity = Some(RoomIdentity { room_code, is_host });
        self.players = players;
        effects.push(Effect::Render(self.view(now)));
        Ok(())
    }

    // ========== Timer ==========

    fn on_tick(&mut self, now: DateTime<Utc>, effects: &mut Vec<Effect>) {
        let room_code = self.identity.as_ref().map(|i| i.room_code.clone());
        let PhaseState::Writing(w) = &mut self.phase else {
            return;
        };
        let Some(tick) = w.countdown.tick(now) else {
            return;
        };

        tracing::debug!("Writing time left: {}s", tick.remaining_seconds);
        effects.push(Effect::Render(View::Timer {
            clock: format_clock(tick.remaining_seconds),
            progress: w.countdown.progress(now),
        }));

        if !tick.expired_now {
            return;
        }

        tracing::info!("Writing time is up");
        match w.guard.finalize() {
            Ok(Some(story)) => match room_code {
                Some(room_code) => {
                    tracing::info!("Auto-submitting story ({} chars)", story.len());
                    effects.push(Effect::Send(ClientMessage::SubmitStory { room_code, story }));
                    effects.push(Effect::Notice(Notice::TimeUp {
                        auto_submitted: true,
                    }));
                }
                None => effects.push(Effect::Notice(Notice::TimeUp {
                    auto_submitted: false,
                })),
            },
            Ok(None) => effects.push(Effect::Notice(Notice::TimeUp {
                auto_submitted: false,
            })),
            Err(e) => {
                tracing::warn!("Draft not auto-submitted: {}", e);
                effects.push(Effect::Notice(Notice::TimeUp {
                    auto_submitted: false,
                }));
                effects.push(Effect::Notice(Notice::Rejected(e.into())));
            }
        }
        effects.push(Effect::Render(self.view(now)));
    }

    // ========== Outbound ==========

    fn on_intent(
        &mut self,
        intent: Intent,
        now: DateTime<Utc>,
        effects: &mut Vec<Effect>,
    ) -> ClientResult<()> {
        match intent {
            Intent::CreateRoom { display_name } => {
                if let Some(identity) = &self.identity {
                    return Err(ValidationError::AlreadyInRoom(identity.room_code.clone()).into());
                }
                let display_name = lobby::normalize_display_name(&display_name)?;
                tracing::info!("Creating room as {}", display_name);
                effects.push(Effect::Send(ClientMessage::CreateRoom {
                    display_name,
                    avatar_id: self.avatar.clone(),
                }));
            }
            Intent::JoinRoom {
                display_name,
                room_code,
            } => {
                if let Some(identity) = &self.identity {
                    return Err(ValidationError::AlreadyInRoom(identity.room_code.clone()).into());
                }
                let display_name = lobby::normalize_display_name(&display_name)?;
                let room_code = lobby::normalize_room_code(&room_code)?;
                tracing::info!("Joining room {} as {}", room_code, display_name);
                effects.push(Effect::Send(ClientMessage::JoinRoom {
                    display_name,
                    room_code,
                    avatar_id: self.avatar.clone(),
                }));
            }
            Intent::ChangeAvatar => {
                self.avatar = avatar::pick_different(&self.avatar, &mut rand::rng());
                tracing::info!("Avatar changed to {}", self.avatar);
                effects.push(Effect::PersistAvatar(self.avatar.clone()));
                if self.identity.is_none() {
                    effects.push(Effect::Render(self.view(now)));
                }
            }
            Intent::StartGame => {
                let identity = self.identity.as_ref().ok_or(ValidationError::NotInRoom)?;
                self.require_phase(Phase::Lobby, "start the game")?;
                lobby::check_can_start(identity, &self.players)?;
                tracing::info!("Starting game with {} players", self.players.len());
                effects.push(Effect::Send(ClientMessage::StartGame {
                    room_code: identity.room_code.clone(),
                }));
            }
            Intent::SetStory(text) => {
                let PhaseState::Writing(w) = &mut self.phase else {
                    return Err(self.wrong_phase("write a story"));
                };
                w.guard.set_payload(Story(text))?;
                effects.push(Effect::Render(self.view(now)));
            }
            Intent::SelectEmojiCombo(idx) => {
                let PhaseState::Guessing(g) = &mut self.phase else {
                    return Err(self.wrong_phase("pick emojis"));
                };
                let combo = g.emoji_options.get(idx).cloned().ok_or(
                    ValidationError::OptionOutOfRange {
                        idx,
                        len: g.emoji_options.len(),
                    },
                )?;
                let mut selection = g.guard.payload().cloned().unwrap_or_default();
                selection.emoji_combo = Some(combo);
                g.guard.set_payload(selection)?;
                effects.push(Effect::Render(self.view(now)));
            }
            Intent::SelectGuessTarget(idx) => {
                let PhaseState::Guessing(g) = &mut self.phase else {
                    return Err(self.wrong_phase("pick an author"));
                };
                let player = g
                    .players
                    .get(idx)
                    .ok_or(ValidationError::OptionOutOfRange {
                        idx,
                        len: g.players.len(),
                    })?;
                let mut selection = g.guard.payload().cloned().unwrap_or_default();
                selection.player_id = Some(player.id.clone());
                g.guard.set_payload(selection)?;
                effects.push(Effect::Render(self.view(now)));
            }
            Intent::Submit => {
                let room_code = self.room_code()?;
                match &mut self.phase {
                    PhaseState::Writing(w) => {
                        let story = w.guard.submit()?;
                        tracing::info!("Submitting story ({} words)", guard::count_words(&story));
                        effects.push(Effect::Send(ClientMessage::SubmitStory { room_code, story }));
                        effects.push(Effect::Notice(Notice::StorySubmitted));
                    }
                    PhaseState::Guessing(g) => {
                        let guess = g.guard.submit()?;
                        tracing::info!("Submitting guess for {}", guess.player_id);
                        effects.push(Effect::Send(ClientMessage::SubmitGuess { room_code, guess }));
                        effects.push(Effect::Notice(Notice::GuessSubmitted));
                    }
                    _ => return Err(self.wrong_phase("submit")),
                }
                effects.push(Effect::Render(self.view(now)));
            }
            Intent::BeginEdit => {
                match &mut self.phase {
                    PhaseState::Writing(w) => w.guard.begin_edit()?,
                    PhaseState::Guessing(g) => g.guard.begin_edit()?,
                    _ => return Err(self.wrong_phase("edit")),
                }
                effects.push(Effect::Render(self.view(now)));
            }
            Intent::AdvanceResults => {
                let room_code = self.room_code()?;
                let is_host = self.is_host();
                let PhaseState::Results(r) = &mut self.phase else {
                    return Err(self.wrong_phase("continue the results"));
                };
                if !is_host {
                    return Err(ValidationError::NotHost("continue the results").into());
                }

                match r.stepper.advance() {
                    Advance::Moved(cursor) => {
                        tracing::info!(
                            "Results at {}/{}",
                            cursor.current_chat_idx,
                            cursor.current_msg_step
                        );
                        effects.push(Effect::Send(ClientMessage::AdvanceResults {
                            room_code: room_code.clone(),
                        }));
                    }
                    Advance::Complete => tracing::debug!("Results playback already complete"),
                }

                if r
                    .trigger
                    .evaluate(is_host, r.stepper.cursor(), r.stepper.chat_count())
                {
                    tracing::info!("All results shown, requesting leaderboard");
                    effects.push(Effect::Send(ClientMessage::RequestLeaderboard { room_code }));
                }
                effects.push(Effect::Render(self.view(now)));
            }
            Intent::SelectResult(idx) => {
                let room_code = self.room_code()?;
                let is_host = self.is_host();
                let PhaseState::Results(r) = &mut self.phase else {
                    return Err(self.wrong_phase("pick a result"));
                };
                if !is_host {
                    return Err(ValidationError::NotHost("pick a result").into());
                }
                r.stepper.select_chat(idx)?;
                effects.push(Effect::Send(ClientMessage::SelectResult { room_code, idx }));
                effects.push(Effect::Render(self.view(now)));
            }
            Intent::RequestNewGame => {
                let room_code = self.room_code()?;
                self.require_phase(Phase::Leaderboard, "start a new game")?;
                effects.push(Effect::Send(ClientMessage::RequestNewGame { room_code }));
            }
        }

        Ok(())
    }

    fn require_phase(&self, phase: Phase, action: &'static str) -> Result<(), ValidationError> {
        if self.phase() != phase {
            return Err(ValidationError::WrongPhase {
                action,
                phase: self.phase(),
            });
        }
        Ok(())
    }

    fn wrong_phase(&self, action: &'static str) -> ClientError {
        ValidationError::WrongPhase {
            action,
            phase: self.phase(),
        }
        .into()
    }

    // ========== Views ==========

    /// Snapshot of what should be on screen
    pub fn view(&self, now: DateTime<Utc>) -> View {
        let Some(identity) = &self.identity else {
            return View::Menu {
                avatar: self.avatar.clone(),
            };
        };

        match &self.phase {
            PhaseState::Lobby => View::Lobby {
                room_code: identity.room_code.clone(),
                players: self.players.clone(),
                is_host: identity.is_host,
                can_start: lobby::check_can_start(identity, &self.players).is_ok(),
            },
            PhaseState::Writing(w) => {
                let draft = w.guard.payload().map(|s| s.0.clone()).unwrap_or_default();
                View::Writing {
                    prompt: w
                        .prompt
                        .iter()
                        .map(|e| PromptEmoji {
                            emoji: e.clone(),
                            name: avatar::emoji_name(e),
                        })
                        .collect(),
                    clock: format_clock(w.countdown.remaining_seconds(now)),
                    progress: w.countdown.progress(now),
                    word_count: guard::count_words(&draft),
                    draft,
                    editable: w.guard.is_editable(),
                    submitted: w.guard.is_submitted(),
                    locked: w.countdown.is_expired(),
                }
            }
            PhaseState::Guessing(g) => {
                let selection = g.guard.payload().cloned().unwrap_or_default();
                View::Guessing {
                    story: g.story.clone(),
                    emoji_options: g.emoji_options.clone(),
                    players: g.players.clone(),
                    selected_combo: selection
                        .emoji_combo
                        .as_ref()
                        .and_then(|c| g.emoji_options.iter().position(|o| o == c)),
                    selected_player: selection
                        .player_id
                        .as_ref()
                        .and_then(|id| g.players.iter().position(|p| &p.id == id)),
                    can_submit: g.guard.is_editable() && selection.is_complete(),
                    submitted: g.guard.is_submitted(),
                }
            }
            PhaseState::Results(r) => View::Results {
                sidebar: r.stepper.players().to_vec(),
                selected: r.stepper.cursor().current_chat_idx,
                messages: r.stepper.messages(),
                is_host: identity.is_host,
                complete: r.stepper.is_complete(),
            },
            PhaseState::Leaderboard(l) => View::Leaderboard {
                rows: leaderboard_rows(&l.players, &l.scores, &l.score_details),
            },
        }
    }
}
