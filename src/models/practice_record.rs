//! One entry of practice history.
use super::AnswerDifficulty;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PracticeRecord {
    pub card_id: String,
    pub timestamp: DateTime<Utc>,
    pub difficulty: AnswerDifficulty,
    pub previous_bucket: Option<usize>,
    pub new_bucket: usize,
}

impl PracticeRecord {
    pub fn new(
        card_id: impl Into<String>,
        timestamp: DateTime<Utc>,
        difficulty: AnswerDifficulty,
        previous_bucket: Option<usize>,
        new_bucket: usize,
    ) -> Self {
        Self {
            card_id: card_id.into(),
            timestamp,
            difficulty,
            previous_bucket,
            new_bucket,
        }
    }
}
