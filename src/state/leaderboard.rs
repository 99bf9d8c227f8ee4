use crate::types::*;
use crate::view::{LeaderboardRow, DEFAULT_AVATAR};
use std::collections::HashMap;

use super::playback::LAST_STEP;

/// Decides, host-side, when to ask the server for the leaderboard.
///
/// Fires at most once per results phase; a fresh trigger is created every
/// time the results phase is entered.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LeaderboardTrigger {
    fired: bool,
}

impl LeaderboardTrigger {
    pub fn new() -> Self {
        Self::default()
    }

    /// The last player's final reveal step is visible
    pub fn is_due(cursor: PlaybackCursor, player_count: usize) -> bool {
        player_count > 0
            && cursor.current_chat_idx == player_count - 1
            && cursor.current_msg_step >= LAST_STEP
    }

    /// Returns true exactly once, the first time it is evaluated as due by the host
    pub fn evaluate(&mut self, is_host: bool, cursor: PlaybackCursor, player_count: usize) -> bool {
        if !is_host || self.fired || !Self::is_due(cursor, player_count) {
            return false;
        }
        self.fired = true;
        true
    }
}

/// Build leaderboard rows in the order the server listed the players
pub fn leaderboard_rows(
    players: &[PlayerInfo],
    scores: &HashMap<PlayerId, f64>,
    details: &HashMap<PlayerId, ScoreDetail>,
) -> Vec<LeaderboardRow> {
    players
        .iter()
        .map(|p| {
            let points = scores
                .get(&p.id)
                .map(|s| format!("{s:.2}"))
                .unwrap_or_else(|| "0".to_string());
            let mut reasons: Vec<String> = details
                .get(&p.id)
                .map(|d| {
                    d.personal
                        .iter()
                        .chain(d.earned.iter())
                        .map(|item| item.reason.clone())
                        .collect()
                })
                .unwrap_or_default();
            if reasons.is_empty() {
                reasons.push("No points".to_string());
            }

            LeaderboardRow {
                avatar: p.emoji.clone().unwrap_or_else(|| DEFAULT_AVATAR.to_string()),
                name: p.name.clone(),
                points,
                reasons,
            }
        })
        .collect()
}
