use std::fmt;
use std::str::FromStr;

use rand::distributions::Alphanumeric;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::GameError;

/// Length of a locally minted id.
pub const GAME_ID_LEN: usize = 20;
pub const GAME_ID_MAX_LEN: usize = 64;

/// Key of a game document. Created once per session and shared through
/// the `game=<id>` query parameter.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct GameId(String);

impl GameId {
    pub fn generate() -> Self {
        let id: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(GAME_ID_LEN)
            .map(char::from)
            .collect();
        Self(id)
    }

    pub fn parse(value: &str) -> Result<Self, GameError> {
        if value.is_empty() || value.len() > GAME_ID_MAX_LEN {
            return Err(GameError::InvalidGameId(format!(
                "length must be 1..={GAME_ID_MAX_LEN}, got {}",
                value.len()
            )));
        }
        if let Some((idx, ch)) = value
            .chars()
            .enumerate()
            .find(|(_, ch)| !(ch.is_ascii_alphanumeric() || *ch == '_' || *ch == '-'))
        {
            return Err(GameError::InvalidGameId(format!(
                "invalid character '{ch}' at position {idx}"
            )));
        }
        Ok(Self(value.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for GameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for GameId {
    type Err = GameError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::parse(value)
    }
}

impl TryFrom<String> for GameId {
    type Error = GameError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<GameId> for String {
    fn from(id: GameId) -> Self {
        id.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_ids_are_valid_and_distinct() {
        let a = GameId::generate();
        let b = GameId::generate();
        assert_eq!(a.as_str().len(), GAME_ID_LEN);
        assert!(GameId::parse(a.as_str()).is_ok());
        assert_ne!(a, b);
    }

    #[test]
    fn test_parse_rejects_bad_ids() {
        assert!(GameId::parse("").is_err());
        assert!(GameId::parse("has space").is_err());
        assert!(GameId::parse("../etc").is_err());
        assert!(GameId::parse(&"a".repeat(65)).is_err());
        assert!(GameId::parse("abc_DEF-123").is_ok());
    }
}
