use chrono::{DateTime, TimeDelta, TimeZone, Utc};
use icontale::client::{self, transport::channel_pair};
use icontale::protocol::{ClientMessage, ServerMessage};
use icontale::state::{Effect, Intent, Session, SessionConfig, SessionEvent};
use icontale::types::{GuessRecord, Phase, PlaybackCursor, PlayerInfo, ResultEntry};
use icontale::view::{NullRenderer, View};
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::mpsc;

fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
}

fn players() -> Vec<PlayerInfo> {
    [("p1", "Alice", "🐶"), ("p2", "Bob", "🐱"), ("p3", "Cara", "🦄")]
        .into_iter()
        .map(|(id, name, emoji)| PlayerInfo {
            id: id.to_string(),
            name: name.to_string(),
            emoji: Some(emoji.to_string()),
        })
        .collect()
}

/// Fan a server broadcast out to every session
fn broadcast(sessions: &mut [Session], msg: ServerMessage, now: DateTime<Utc>) {
    for session in sessions.iter_mut() {
        session.handle(SessionEvent::Server(msg.clone()), now);
    }
}

fn sent(effects: &[Effect]) -> Vec<ClientMessage> {
    effects
        .iter()
        .filter_map(|e| match e {
            Effect::Send(m) => Some(m.clone()),
            _ => None,
        })
        .collect()
}

fn results() -> Vec<ResultEntry> {
    (1..=3)
        .map(|i| ResultEntry {
            author_id: format!("p{i}"),
            prompt: vec!["🐉".to_string(), "🍕".to_string()],
            story: format!("Story {i}"),
            guesses: vec![GuessRecord {
                guesser_id: format!("p{}", i % 3 + 1),
                chosen_emoji_combo: vec!["🐉".to_string(), "🍕".to_string()],
                chosen_author_id: format!("p{i}"),
            }],
        })
        .collect()
}

/// End-to-end game through three sessions and a hand-played server
#[test]
fn test_full_game_flow() {
    let now = t0();
    let config = SessionConfig::default();
    let mut sessions = vec![
        Session::new(config.clone(), "🐶".to_string()),
        Session::new(config.clone(), "🐱".to_string()),
        Session::new(config, "🦄".to_string()),
    ];

    // 1. Room setup
    let effects = sessions[0].handle(
        SessionEvent::User(Intent::CreateRoom {
            display_name: "Alice".to_string(),
        }),
        now,
    );
    assert!(matches!(sent(&effects)[0], ClientMessage::CreateRoom { .. }));
    sessions[0].handle(
        SessionEvent::Server(ServerMessage::RoomCreated {
            room_code: "ABC123".to_string(),
            players: players()[..1].to_vec(),
        }),
        now,
    );
    for session in &mut sessions[1..] {
        session.handle(
            SessionEvent::Server(ServerMessage::RoomJoined {
                room_code: "ABC123".to_string(),
                players: players(),
            }),
            now,
        );
    }
    broadcast(
        &mut sessions,
        ServerMessage::PlayersUpdated { players: players() },
        now,
    );
    assert!(sessions[0].is_host());
    assert!(!sessions[1].is_host());

    let effects = sessions[0].handle(SessionEvent::User(Intent::StartGame), now);
    assert_eq!(
        sent(&effects),
        vec![ClientMessage::StartGame {
            room_code: "ABC123".to_string()
        }]
    );
    broadcast(&mut sessions, ServerMessage::GameStarted, now);

    // 2. Writing: everyone sees the same clock, one player relies on the timer
    broadcast(
        &mut sessions,
        ServerMessage::WritingPhase {
            prompt: vec!["🐉".to_string(), "🍕".to_string()],
            anchor_time: now,
        },
        now,
    );
    for (i, session) in sessions.iter_mut().enumerate() {
        assert_eq!(session.phase(), Phase::Writing);
        session.handle(
            SessionEvent::User(Intent::SetStory(format!("Story {}", i + 1))),
            now,
        );
    }
    for session in &mut sessions[..2] {
        let effects = session.handle(SessionEvent::User(Intent::Submit), now);
        assert_eq!(sent(&effects).len(), 1);
    }
    let later = now + TimeDelta::seconds(180);
    let effects = sessions[2].handle(SessionEvent::Tick, later);
    assert_eq!(
        sent(&effects),
        vec![ClientMessage::SubmitStory {
            room_code: "ABC123".to_string(),
            story: "Story 3".to_string(),
        }]
    );
    // Players who already submitted do not resend on expiry
    assert!(sent(&sessions[0].handle(SessionEvent::Tick, later)).is_empty());

    // 3. Guessing
    broadcast(
        &mut sessions,
        ServerMessage::GuessingPhase {
            story: "Story 2".to_string(),
            emoji_options: vec![
                vec!["🚀".to_string(), "🌈".to_string()],
                vec!["🐉".to_string(), "🍕".to_string()],
            ],
            players: players(),
        },
        later,
    );
    for session in &mut sessions {
        session.handle(SessionEvent::User(Intent::SelectEmojiCombo(1)), later);
        session.handle(SessionEvent::User(Intent::SelectGuessTarget(1)), later);
        let effects = session.handle(SessionEvent::User(Intent::Submit), later);
        assert!(matches!(
            &sent(&effects)[..],
            [ClientMessage::SubmitGuess { guess, .. }] if guess.player_id == "p2"
        ));
    }

    // 4. Results: host drives, guests mirror the broadcast cursor
    broadcast(
        &mut sessions,
        ServerMessage::ResultsPhase {
            players: players(),
            results: results(),
            cursor: PlaybackCursor::default(),
            seq: Some(0),
        },
        later,
    );

    let mut leaderboard_requests = 0;
    for seq in 1..=9u64 {
        let effects = sessions[0].handle(SessionEvent::User(Intent::AdvanceResults), later);
        for msg in sent(&effects) {
            if matches!(msg, ClientMessage::RequestLeaderboard { .. }) {
                leaderboard_requests += 1;
            }
        }
        let cursor = sessions[0].stepper().unwrap().cursor();
        broadcast(
            &mut sessions[1..],
            ServerMessage::ResultsProgress {
                cursor,
                seq: Some(seq),
            },
            later,
        );
    }
    assert_eq!(leaderboard_requests, 1);
    for session in &sessions {
        assert_eq!(
            session.stepper().unwrap().cursor(),
            PlaybackCursor::new(2, 2)
        );
    }
    match sessions[1].view(later) {
        View::Results {
            messages, complete, ..
        } => {
            assert!(complete);
            assert_eq!(messages.len(), 3);
            assert_eq!(messages[2].text, "🐉 🍕 — Cara (🦄)");
        }
        other => panic!("expected results view, got {other:?}"),
    }

    // 5. Leaderboard and a new game
    broadcast(
        &mut sessions,
        ServerMessage::LeaderboardPhase {
            scores: HashMap::from([("p1".to_string(), 3.0), ("p2".to_string(), 1.5)]),
            score_details: HashMap::new(),
            players: players(),
        },
        later,
    );
    match sessions[2].view(later) {
        View::Leaderboard { rows } => {
            assert_eq!(rows[0].points, "3.00");
            assert_eq!(rows[2].points, "0");
        }
        other => panic!("expected leaderboard view, got {other:?}"),
    }

    let effects = sessions[1].handle(SessionEvent::User(Intent::RequestNewGame), later);
    assert_eq!(sent(&effects).len(), 1);
    broadcast(
        &mut sessions,
        ServerMessage::NewGameReady {
            scores: HashMap::new(),
        },
        later,
    );

    // 6. Second round starts from clean phase state
    let round_two = later + TimeDelta::seconds(60);
    broadcast(
        &mut sessions,
        ServerMessage::WritingPhase {
            prompt: vec!["🚀".to_string()],
            anchor_time: round_two,
        },
        round_two,
    );
    for session in &sessions {
        assert_eq!(session.phase(), Phase::Writing);
        let guard = session.story_guard().unwrap();
        assert!(guard.is_editable());
        assert!(!guard.is_submitted());
        assert_eq!(guard.payload(), None);
        assert_eq!(session.countdown().unwrap().remaining_seconds(round_two), 180);
    }
}

/// The runtime auto-submits a draft when the writing clock runs out
#[tokio::test]
async fn test_runtime_auto_submits_on_expiry() {
    let (transport, mut server) = channel_pair();
    let (intent_tx, intent_rx) = mpsc::channel(8);
    let session = Session::new(SessionConfig { writing_seconds: 2 }, "🦄".to_string());

    let handle = tokio::spawn(async move {
        let mut renderer = NullRenderer;
        client::run(
            session,
            transport,
            &mut renderer,
            intent_rx,
            None,
            Duration::from_millis(50),
        )
        .await
    });

    server
        .to_client
        .send(ServerMessage::RoomJoined {
            room_code: "ABC123".to_string(),
            players: players(),
        })
        .unwrap();
    server
        .to_client
        .send(ServerMessage::WritingPhase {
            prompt: vec!["🐉".to_string()],
            anchor_time: Utc::now(),
        })
        .unwrap();
    intent_tx
        .send(Intent::SetStory("never pressed submit".to_string()))
        .await
        .unwrap();

    let msg = tokio::time::timeout(Duration::from_secs(5), server.from_client.recv())
        .await
        .expect("auto-submit before timeout");
    assert_eq!(
        msg,
        Some(ClientMessage::SubmitStory {
            room_code: "ABC123".to_string(),
            story: "never pressed submit".to_string(),
        })
    );

    drop(intent_tx);
    let session = handle.await.unwrap();
    assert!(!session.story_guard().unwrap().is_editable());
}
