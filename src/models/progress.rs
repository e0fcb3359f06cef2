//! Progress statistics over the bucket model and practice history.
//!
//! `compute_progress` is the primary aggregate. `compute_learning_stats` is an
//! additional view tracking distinct cards rather than raw counts.

use super::bucket::BucketMap;
use super::{AnswerDifficulty, PracticeRecord};
use crate::error::{CoreError, CoreResult};
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};

/// Tally of history entries per difficulty.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct DifficultyCounts {
    pub wrong: usize,
    pub hard: usize,
    pub easy: usize,
}

impl DifficultyCounts {
    pub fn get(&self, difficulty: AnswerDifficulty) -> usize {
        match difficulty {
            AnswerDifficulty::Wrong => self.wrong,
            AnswerDifficulty::Hard => self.hard,
            AnswerDifficulty::Easy => self.easy,
        }
    }

    fn record(&mut self, difficulty: AnswerDifficulty) {
        match difficulty {
            AnswerDifficulty::Wrong => self.wrong += 1,
            AnswerDifficulty::Hard => self.hard += 1,
            AnswerDifficulty::Easy => self.easy += 1,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ProgressReport {
    pub total_cards: usize,
    pub cards_by_bucket: BTreeMap<usize, usize>,
    pub total_practices: usize,
    pub difficulty_counts: DifficultyCounts,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct LearningStats {
    /// Distinct cards that appear in the history.
    pub cards_practiced: usize,
    /// Distinct cards answered Easy at least once.
    pub cards_mastered: usize,
    /// Size of the highest populated bucket.
    pub completeness: usize,
}

fn require<'a, T: ?Sized>(input: Option<&'a T>, name: &str) -> CoreResult<&'a T> {
    input.ok_or_else(|| CoreError::InvalidArgument(format!("{name} cannot be absent")))
}

/// Totals per bucket and per difficulty. Both inputs are required.
pub fn compute_progress(
    buckets: Option<&BucketMap>,
    history: Option<&[PracticeRecord]>,
) -> CoreResult<ProgressReport> {
    let buckets = require(buckets, "buckets")?;
    let history = require(history, "history")?;

    let cards_by_bucket: BTreeMap<usize, usize> = buckets
        .iter()
        .map(|(number, cards)| (number, cards.len()))
        .collect();
    let total_cards = cards_by_bucket.values().sum();

    let mut difficulty_counts = DifficultyCounts::default();
    for record in history {
        difficulty_counts.record(record.difficulty);
    }

    Ok(ProgressReport {
        total_cards,
        cards_by_bucket,
        total_practices: history.len(),
        difficulty_counts,
    })
}

/// Distinct-card statistics. Both inputs are required.
pub fn compute_learning_stats(
    buckets: Option<&BucketMap>,
    history: Option<&[PracticeRecord]>,
) -> CoreResult<LearningStats> {
    let buckets = require(buckets, "buckets")?;
    let history = require(history, "history")?;

    let practiced: HashSet<&str> = history.iter().map(|r| r.card_id.as_str()).collect();
    let mastered: HashSet<&str> = history
        .iter()
        .filter(|r| r.difficulty == AnswerDifficulty::Easy)
        .map(|r| r.card_id.as_str())
        .collect();

    let completeness = buckets
        .iter()
        .filter(|(_, cards)| !cards.is_empty())
        .last()
        .map(|(_, cards)| cards.len())
        .unwrap_or(0);

    Ok(LearningStats {
        cards_practiced: practiced.len(),
        cards_mastered: mastered.len(),
        completeness,
    })
}
