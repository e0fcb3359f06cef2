//! Outcome reported for a single practice trial.
use crate::error::CoreError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Wire codes are fixed: Wrong = 0, Hard = 1, Easy = 2.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum AnswerDifficulty {
    Wrong = 0,
    Hard = 1,
    Easy = 2,
}

impl AnswerDifficulty {
    pub const ALL: [AnswerDifficulty; 3] = [Self::Wrong, Self::Hard, Self::Easy];

    pub fn code(self) -> u8 {
        self as u8
    }

    /// Label used by the practice log table.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Wrong => "WRONG",
            Self::Hard => "HARD",
            Self::Easy => "EASY",
        }
    }
}

impl From<AnswerDifficulty> for u8 {
    fn from(difficulty: AnswerDifficulty) -> Self {
        difficulty.code()
    }
}

impl TryFrom<u8> for AnswerDifficulty {
    type Error = CoreError;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(Self::Wrong),
            1 => Ok(Self::Hard),
            2 => Ok(Self::Easy),
            other => Err(CoreError::InvalidArgument(format!(
                "unknown difficulty code {other}"
            ))),
        }
    }
}

/// Accepts the storage labels, lowercase names and the numeric wire codes.
impl FromStr for AnswerDifficulty {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "WRONG" | "0" => Ok(Self::Wrong),
            "HARD" | "1" => Ok(Self::Hard),
            "EASY" | "2" => Ok(Self::Easy),
            _ => Err(CoreError::InvalidArgument(format!(
                "unknown difficulty '{s}'"
            ))),
        }
    }
}

impl fmt::Display for AnswerDifficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_codes() {
        assert_eq!(AnswerDifficulty::Wrong.code(), 0);
        assert_eq!(AnswerDifficulty::Hard.code(), 1);
        assert_eq!(AnswerDifficulty::Easy.code(), 2);
        assert_eq!(AnswerDifficulty::try_from(2).unwrap(), AnswerDifficulty::Easy);
        assert!(AnswerDifficulty::try_from(3).is_err());
    }

    #[test]
    fn test_parse_labels() {
        assert_eq!("easy".parse::<AnswerDifficulty>().unwrap(), AnswerDifficulty::Easy);
        assert_eq!("HARD".parse::<AnswerDifficulty>().unwrap(), AnswerDifficulty::Hard);
        assert_eq!("0".parse::<AnswerDifficulty>().unwrap(), AnswerDifficulty::Wrong);
        assert!("maybe".parse::<AnswerDifficulty>().is_err());
    }

    #[test]
    fn test_serializes_as_code() {
        assert_eq!(serde_json::to_string(&AnswerDifficulty::Hard).unwrap(), "1");
        let parsed: AnswerDifficulty = serde_json::from_str("0").unwrap();
        assert_eq!(parsed, AnswerDifficulty::Wrong);
    }
}
