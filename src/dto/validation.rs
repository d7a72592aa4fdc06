//! Validation helpers for DTOs.

use validator::ValidationError;

const SESSION_KEY_LENGTH: usize = 22;
const PLAYER_TOKEN_LENGTH: usize = 20;
const TEAM_NAME_MAX: usize = 60;
const PRESET_NAME_MAX: usize = 40;

/// Validates that a session key is exactly 22 URL-safe characters.
pub fn validate_session_key(key: &str) -> Result<(), ValidationError> {
    if key.len() != SESSION_KEY_LENGTH || !key.chars().all(|c| c.is_ascii_alphanumeric()) {
        let mut err = ValidationError::new("session_key_format");
        err.message = Some(
            format!("session key must be exactly {SESSION_KEY_LENGTH} alphanumeric characters")
                .into(),
        );
        return Err(err);
    }
    Ok(())
}

/// Validates that a player token has the 20-character minted shape.
pub fn validate_player_token(token: &str) -> Result<(), ValidationError> {
    if token.len() != PLAYER_TOKEN_LENGTH || !token.chars().all(|c| c.is_ascii_alphanumeric()) {
        let mut err = ValidationError::new("player_token_format");
        err.message = Some(
            format!("player token must be exactly {PLAYER_TOKEN_LENGTH} alphanumeric characters")
                .into(),
        );
        return Err(err);
    }
    Ok(())
}

/// Validates a team display label: non-blank, bounded length.
pub fn validate_team_name(name: &str) -> Result<(), ValidationError> {
    if name.trim().is_empty() {
        let mut err = ValidationError::new("team_name_empty");
        err.message = Some("team name must not be blank".into());
        return Err(err);
    }
    if name.chars().count() > TEAM_NAME_MAX {
        let mut err = ValidationError::new("team_name_length");
        err.message = Some(format!("team name must be at most {TEAM_NAME_MAX} characters").into());
        return Err(err);
    }
    Ok(())
}

/// Validates a cost preset name: non-blank, at most 40 characters.
pub fn validate_preset_name(name: &str) -> Result<(), ValidationError> {
    if name.trim().is_empty() {
        let mut err = ValidationError::new("preset_name_empty");
        err.message = Some("preset name must not be blank".into());
        return Err(err);
    }
    if name.chars().count() > PRESET_NAME_MAX {
        let mut err = ValidationError::new("preset_name_length");
        err.message =
            Some(format!("preset name must be at most {PRESET_NAME_MAX} characters").into());
        return Err(err);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_keys() {
        assert!(validate_session_key(&"a".repeat(22)).is_ok());
        assert!(validate_session_key(&"a".repeat(21)).is_err());
        assert!(validate_session_key(&format!("{}!", "a".repeat(21))).is_err());
    }

    #[test]
    fn player_tokens() {
        assert!(validate_player_token(&"A9".repeat(10)).is_ok());
        assert!(validate_player_token("short").is_err());
        assert!(validate_player_token(&" ".repeat(20)).is_err());
    }

    #[test]
    fn team_names() {
        assert!(validate_team_name("Solar Flare").is_ok());
        assert!(validate_team_name("  ").is_err());
        assert!(validate_team_name(&"x".repeat(61)).is_err());
    }

    #[test]
    fn preset_names() {
        assert!(validate_preset_name("Season 4 costs").is_ok());
        assert!(validate_preset_name("").is_err());
        assert!(validate_preset_name(&"x".repeat(41)).is_err());
    }
}
