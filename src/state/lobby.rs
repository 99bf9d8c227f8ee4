use crate::error::ValidationError;
use crate::types::*;

/// Trim and upper-case a typed room code, rejecting anything that is not
/// exactly `ROOM_CODE_LENGTH` letters or digits
pub fn normalize_room_code(input: &str) -> Result<RoomCode, ValidationError> {
    let code = input.trim().to_uppercase();
    if code.chars().count() != ROOM_CODE_LENGTH || !code.chars().all(|c| c.is_ascii_alphanumeric())
    {
        return Err(ValidationError::RoomCode {
            got: code,
            expected: ROOM_CODE_LENGTH,
        });
    }
    Ok(code)
}

pub fn normalize_display_name(input: &str) -> Result<String, ValidationError> {
    let name = input.trim();
    if name.is_empty() {
        return Err(ValidationError::DisplayName);
    }
    Ok(name.to_string())
}

/// Host may start once enough players joined
pub fn check_can_start(identity: &RoomIdentity, players: &[PlayerInfo]) -> Result<(), ValidationError> {
    if !identity.is_host {
        return Err(ValidationError::NotHost("start the game"));
    }
    if players.len() < MIN_PLAYERS {
        return Err(ValidationError::NotEnoughPlayers {
            have: players.len(),
            need: MIN_PLAYERS,
        });
    }
    Ok(())
}
