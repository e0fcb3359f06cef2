//! Modified-Leitner scheduling.
//!
//! Cards live in numbered buckets and the bucket decides how often a card comes up:
//! - A card in bucket i is due on day d when d mod 2^i == 0 (bucket 0 daily, bucket 1 every 2 days, ...)
//! - Wrong sends the card back to bucket 0
//! - Hard keeps the card where it is
//! - Easy moves the card up one bucket, with no upper limit
//!
//! Every function here is pure: the input model is never touched and a new model is returned.

use super::bucket::{BucketMap, CardSet};
use super::difficulty::AnswerDifficulty;
use super::flashcard::CardRef;
use crate::error::{CoreError, CoreResult};
use chrono::{DateTime, Duration, Utc};

/// Whether bucket `bucket` is due on `day` (assumed non-negative).
pub fn is_due_on(bucket: usize, day: u64) -> bool {
    // d mod 2^i == 0 without computing 2^i, which overflows past bucket 63
    day == 0 || day.trailing_zeros() as usize >= bucket
}

/// Cards due on `day`. Fails with `InvalidArgument` for a negative day.
pub fn select_due_cards(buckets: &[CardSet], day: i64) -> CoreResult<CardSet> {
    let day = u64::try_from(day)
        .map_err(|_| CoreError::InvalidArgument(format!("day cannot be negative: {day}")))?;

    let due = buckets
        .iter()
        .enumerate()
        .filter(|(number, cards)| !cards.is_empty() && is_due_on(*number, day))
        .flat_map(|(_, cards)| cards.iter().cloned())
        .collect();

    Ok(due)
}

/// Bucket a card moves to from `current` after answering with `difficulty`.
pub fn next_bucket(current: usize, difficulty: AnswerDifficulty) -> usize {
    match difficulty {
        AnswerDifficulty::Wrong => 0,
        AnswerDifficulty::Hard => current,
        AnswerDifficulty::Easy => current.saturating_add(1),
    }
}

/// Returns a new bucket model with `card` moved according to `difficulty`.
/// Fails with `NotFound` if this card instance is not in any bucket.
pub fn apply_practice_result(
    buckets: &BucketMap,
    card: &CardRef,
    difficulty: AnswerDifficulty,
) -> CoreResult<BucketMap> {
    let current = buckets.bucket_of(card).ok_or_else(|| {
        CoreError::NotFound(format!("flashcard {} not found in buckets", card.id()))
    })?;
    let target = next_bucket(current, difficulty);

    let mut updated = buckets.clone();
    if let Some(old) = updated.get_mut(current) {
        old.remove(card);
    }
    updated.entry(target).insert(card.clone());

    Ok(updated)
}

/// Review interval of a bucket in days (2^bucket, saturating).
pub fn interval_days(bucket: usize) -> i64 {
    u32::try_from(bucket)
        .ok()
        .and_then(|exp| 1i64.checked_shl(exp))
        .filter(|days| *days > 0)
        .unwrap_or(i64::MAX)
}

/// Elapsed-time form of the due rule: never practiced, or at least
/// 2^bucket days since the last practice.
pub fn is_due_after(
    bucket: usize,
    last_practiced: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> bool {
    let Some(last) = last_practiced else {
        return true;
    };

    match Duration::try_days(interval_days(bucket)) {
        Some(interval) => now.signed_duration_since(last) >= interval,
        None => false,
    }
}
