use crate::types::Phase;

/// Check if a phase transition is valid
pub fn is_valid_transition(from: Phase, to: Phase) -> bool {
    use Phase::*;

    matches!(
        (from, to),
        // Normal forward flow
        (Lobby, Writing)
            | (Writing, Guessing)
            | (Guessing, Results)
            | (Results, Leaderboard)
            // Repeat play
            | (Leaderboard, Lobby)
            // Lobby closed or errored: back to the entry state
            | (Lobby, Lobby)
    )
}

/// Phases a client in `from` may legally move to next
pub fn valid_transitions(from: Phase) -> Vec<Phase> {
    use Phase::*;

    [Lobby, Writing, Guessing, Results, Leaderboard]
        .into_iter()
        .filter(|to| is_valid_transition(from, *to))
        .collect()
}
