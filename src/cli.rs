//! Line-based terminal front end

use std::io::Write;

use crate::state::Intent;
use crate::view::{Notice, Renderer, Speaker, View};

pub const HELP: &str = "\
Commands:
  create <name>          create a room
  join <code> <name>     join a room
  avatar                 pick another avatar
  start                  start the game (host)
  write <text>           replace your story draft
  submit                 submit story or guess
  edit                   edit what you submitted
  emoji <n>              pick emoji combo n
  player <n>             pick player n as author
  next                   reveal the next result step (host)
  show <n>               jump to result n (host)
  newgame                back to the lobby
  help                   show this help
  quit                   leave";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Intent(Intent),
    Help,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("empty command")]
    Empty,

    #[error("unknown command {0:?}, type `help`")]
    Unknown(String),

    #[error("`{command}` needs {arg}")]
    MissingArgument {
        command: &'static str,
        arg: &'static str,
    },

    #[error("{0:?} is not a number from the list")]
    BadIndex(String),
}

/// List numbers are shown from 1
fn parse_index(raw: &str) -> Result<usize, ParseError> {
    match raw.trim().parse::<usize>() {
        Ok(n) if n >= 1 => Ok(n - 1),
        _ => Err(ParseError::BadIndex(raw.trim().to_string())),
    }
}

fn required<'a>(
    rest: &'a str,
    command: &'static str,
    arg: &'static str,
) -> Result<&'a str, ParseError> {
    let rest = rest.trim();
    if rest.is_empty() {
        return Err(ParseError::MissingArgument { command, arg });
    }
    Ok(rest)
}

pub fn parse_command(line: &str) -> Result<Command, ParseError> {
    let line = line.trim();
    let (word, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));

    let intent = match word.to_lowercase().as_str() {
        "" => return Err(ParseError::Empty),
        "help" | "?" => return Ok(Command::Help),
        "quit" | "exit" => return Ok(Command::Quit),
        "create" => Intent::CreateRoom {
            display_name: required(rest, "create", "a name")?.to_string(),
        },
        "join" => {
            let rest = required(rest, "join", "a room code and a name")?;
            let (code, name) = rest
                .split_once(char::is_whitespace)
                .ok_or(ParseError::MissingArgument {
                    command: "join",
                    arg: "a name",
                })?;
            Intent::JoinRoom {
                display_name: name.trim().to_string(),
                room_code: code.to_string(),
            }
        }
        "avatar" => Intent::ChangeAvatar,
        "start" => Intent::StartGame,
        // Draft may legitimately be cleared
        "write" => Intent::SetStory(rest.to_string()),
        "submit" => Intent::Submit,
        "edit" => Intent::BeginEdit,
        "emoji" => Intent::SelectEmojiCombo(parse_index(required(rest, "emoji", "a number")?)?),
        "player" => Intent::SelectGuessTarget(parse_index(required(rest, "player", "a number")?)?),
        "next" => Intent::AdvanceResults,
        "show" => Intent::SelectResult(parse_index(required(rest, "show", "a number")?)?),
        "newgame" => Intent::RequestNewGame,
        other => return Err(ParseError::Unknown(other.to_string())),
    };

    Ok(Command::Intent(intent))
}

/// Plain-text renderer writing to any `Write`
pub struct TerminalRenderer<W: Write + Send> {
    out: W,
}

impl<W: Write + Send> TerminalRenderer<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn draw(&mut self, view: &View) -> std::io::Result<()> {
        let out = &mut self.out;
        match view {
            View::Menu { avatar } => {
                writeln!(out, "== Icon Tale ==")?;
                writeln!(out, "Your avatar: {avatar}  (`avatar` to change)")?;
                writeln!(out, "`create <name>` or `join <code> <name>`")?;
            }
            View::Lobby {
                room_code,
                players,
                is_host,
                can_start,
            } => {
                writeln!(out, "== Room {room_code} ==")?;
                for p in players {
                    writeln!(out, "  {} {}", p.emoji.as_deref().unwrap_or(" "), p.name)?;
                }
                if *is_host {
                    if *can_start {
                        writeln!(out, "`start` when everyone is here")?;
                    } else {
                        writeln!(out, "Waiting for more players...")?;
                    }
                } else {
                    writeln!(out, "Waiting for the host to start...")?;
                }
            }
            View::Writing {
                prompt,
                clock,
                draft,
                word_count,
                submitted,
                locked,
                ..
            } => {
                let prompt: Vec<String> = prompt
                    .iter()
                    .map(|p| match p.name {
                        Some(name) => format!("{} ({name})", p.emoji),
                        None => p.emoji.clone(),
                    })
                    .collect();
                writeln!(out, "== Write a story [{clock}] ==")?;
                writeln!(out, "Prompt: {}", prompt.join("  "))?;
                writeln!(out, "Draft ({word_count} words): {draft}")?;
                if *locked && *submitted {
                    writeln!(out, "Time is up, your story is in")?;
                } else if *locked {
                    writeln!(out, "Time is up")?;
                } else if *submitted {
                    writeln!(out, "Submitted. `edit` to change it")?;
                }
            }
            View::Timer { clock, .. } => writeln!(out, "[{clock}]")?,
            View::Guessing {
                story,
                emoji_options,
                players,
                selected_combo,
                selected_player,
                submitted,
                ..
            } => {
                writeln!(out, "== Guess ==")?;
                writeln!(out, "{story}")?;
                for (i, combo) in emoji_options.iter().enumerate() {
                    let mark = if *selected_combo == Some(i) { '*' } else { ' ' };
                    writeln!(out, " {mark}emoji {}: {}", i + 1, combo.join(" "))?;
                }
                for (i, p) in players.iter().enumerate() {
                    let mark = if *selected_player == Some(i) { '*' } else { ' ' };
                    writeln!(out, " {mark}player {}: {}", i + 1, p.name)?;
                }
                if *submitted {
                    writeln!(out, "Guess sent. `edit` to change it")?;
                }
            }
            View::Results {
                sidebar,
                selected,
                messages,
                is_host,
                complete,
            } => {
                let name = sidebar.get(*selected).map(|p| p.name.as_str()).unwrap_or("?");
                writeln!(out, "== Results: {name} ({}/{}) ==", selected + 1, sidebar.len())?;
                for m in messages {
                    let who = match m.speaker {
                        Speaker::Narrator => "narrator",
                        Speaker::Author => "author",
                        Speaker::Guesser => "guess",
                    };
                    writeln!(out, "  {} {who}: {}", m.avatar, m.text)?;
                }
                if *is_host && !complete {
                    writeln!(out, "`next` to continue")?;
                }
            }
            View::Leaderboard { rows } => {
                writeln!(out, "== Leaderboard ==")?;
                for row in rows {
                    writeln!(
                        out,
                        "  {} {} {}  ({})",
                        row.avatar,
                        row.name,
                        row.points,
                        row.reasons.join("; ")
                    )?;
                }
                writeln!(out, "`newgame` to play again")?;
            }
        }
        out.flush()
    }

    fn say(&mut self, notice: &Notice) -> std::io::Result<()> {
        let text = match notice {
            Notice::GameStarted => "Game started!".to_string(),
            Notice::StorySubmitted => "Story submitted".to_string(),
            Notice::GuessSubmitted => "Guess submitted".to_string(),
            Notice::TimeUp {
                auto_submitted: true,
            } => "Time is up, your draft was submitted".to_string(),
            Notice::TimeUp {
                auto_submitted: false,
            } => "Time is up".to_string(),
            Notice::Rejected(e) => format!("! {e}"),
            Notice::RoomError(message) => format!("! {message}"),
            Notice::RoomClosed => "The room was closed".to_string(),
            Notice::Disconnected(e) => format!("Disconnected: {e}"),
        };
        writeln!(self.out, "{text}")?;
        self.out.flush()
    }
}

impl<W: Write + Send> Renderer for TerminalRenderer<W> {
    fn render(&mut self, view: &View) {
        if let Err(e) = self.draw(view) {
            tracing::warn!("Failed to draw view: {}", e);
        }
    }

    fn notice(&mut self, notice: &Notice) {
        if let Err(e) = self.say(notice) {
            tracing::warn!("Failed to print notice: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ClientError, ValidationError};
    use crate::view::PromptEmoji;

    #[test]
    fn test_parse_commands() {
        assert_eq!(
            parse_command("join abc123  Alice Smith"),
            Ok(Command::Intent(Intent::JoinRoom {
                display_name: "Alice Smith".to_string(),
                room_code: "abc123".to_string(),
            }))
        );
        assert_eq!(
            parse_command("  EMOJI 2 "),
            Ok(Command::Intent(Intent::SelectEmojiCombo(1)))
        );
        assert_eq!(
            parse_command("write once upon a time"),
            Ok(Command::Intent(Intent::SetStory("once upon a time".to_string())))
        );
        assert_eq!(parse_command("next"), Ok(Command::Intent(Intent::AdvanceResults)));
        assert_eq!(parse_command("quit"), Ok(Command::Quit));
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(parse_command("   "), Err(ParseError::Empty));
        assert!(matches!(parse_command("dance"), Err(ParseError::Unknown(_))));
        assert!(matches!(
            parse_command("join ABC123"),
            Err(ParseError::MissingArgument { .. })
        ));
        assert_eq!(parse_command("show 0"), Err(ParseError::BadIndex("0".to_string())));
        assert!(matches!(parse_command("player"), Err(ParseError::MissingArgument { .. })));
    }

    #[test]
    fn test_renders_menu_and_notices() {
        let mut renderer = TerminalRenderer::new(Vec::new());
        renderer.render(&View::Menu {
            avatar: "🦄".to_string(),
        });
        renderer.notice(&Notice::Rejected(ClientError::Validation(
            ValidationError::DisplayName,
        )));

        let text = String::from_utf8(renderer.into_inner()).unwrap();
        assert!(text.contains("Your avatar: 🦄"));
        assert!(text.contains("! please enter a display name"));
    }

    fn writing_view(editable: bool, submitted: bool, locked: bool) -> View {
        View::Writing {
            prompt: vec![PromptEmoji {
                emoji: "🐉".to_string(),
                name: Some("dragon"),
            }],
            clock: "00:00".to_string(),
            progress: 0.0,
            draft: "The dragon".to_string(),
            word_count: 2,
            editable,
            submitted,
            locked,
        }
    }

    fn rendered(view: &View) -> String {
        let mut renderer = TerminalRenderer::new(Vec::new());
        renderer.render(view);
        String::from_utf8(renderer.into_inner()).unwrap()
    }

    #[test]
    fn test_locked_writing_does_not_offer_edit() {
        let text = rendered(&writing_view(false, true, true));
        assert!(text.contains("Time is up, your story is in"));
        assert!(!text.contains("`edit`"));

        let text = rendered(&writing_view(false, false, true));
        assert!(text.contains("Time is up"));
        assert!(!text.contains("`edit`"));
    }

    #[test]
    fn test_submitted_writing_offers_edit_before_expiry() {
        let text = rendered(&writing_view(false, true, false));
        assert!(text.contains("Submitted. `edit` to change it"));
        assert!(!text.contains("Time is up"));
    }
}
