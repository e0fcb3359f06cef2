//! Bucket model: which bucket each card is in.
//!
//! Two representations are used:
//! - `BucketMap`, a sparse mapping from bucket number to card set (gaps are empty buckets)
//! - `DenseBuckets`, an ordered vector where the index is the bucket number
//!
//! Card sets are indexed by card id, and membership additionally requires the same
//! `CardRef` instance, so value-equal copies of a card are never treated as members.

use super::flashcard::CardRef;
use std::collections::BTreeMap;
use std::sync::Arc;

/// A set of cards keyed by id. Cloning copies the set, not the cards.
#[derive(Debug, Clone, Default)]
pub struct CardSet {
    cards: BTreeMap<String, CardRef>,
}

impl CardSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    /// True only if this exact card instance is a member.
    pub fn contains(&self, card: &CardRef) -> bool {
        self.cards
            .get(card.id())
            .is_some_and(|member| Arc::ptr_eq(member, card))
    }

    /// Adds a card. Returns false if the instance was already present.
    /// A different instance with the same id replaces the previous member.
    pub fn insert(&mut self, card: CardRef) -> bool {
        if self.contains(&card) {
            return false;
        }
        self.cards.insert(card.id().to_string(), card);
        true
    }

    /// Removes this exact card instance. Returns false if it was not a member.
    pub fn remove(&mut self, card: &CardRef) -> bool {
        if !self.contains(card) {
            return false;
        }
        self.cards.remove(card.id());
        true
    }

    pub fn get(&self, id: &str) -> Option<&CardRef> {
        self.cards.get(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &CardRef> {
        self.cards.values()
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.cards.keys().map(String::as_str)
    }
}

impl PartialEq for CardSet {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().all(|card| other.contains(card))
    }
}

impl Eq for CardSet {}

impl FromIterator<CardRef> for CardSet {
    fn from_iter<I: IntoIterator<Item = CardRef>>(iter: I) -> Self {
        let mut set = CardSet::new();
        for card in iter {
            set.insert(card);
        }
        set
    }
}

impl Extend<CardRef> for CardSet {
    fn extend<I: IntoIterator<Item = CardRef>>(&mut self, iter: I) {
        for card in iter {
            self.insert(card);
        }
    }
}

/// Sparse bucket model: bucket number -> cards. Keys need not be contiguous.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BucketMap {
    buckets: BTreeMap<usize, CardSet>,
}

impl BucketMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Puts a card into a bucket, creating the bucket if absent.
    pub fn insert(&mut self, bucket: usize, card: CardRef) -> bool {
        self.buckets.entry(bucket).or_default().insert(card)
    }

    /// Sets a bucket's contents, keeping an explicitly empty bucket as a key.
    pub fn set_bucket(&mut self, bucket: usize, cards: CardSet) {
        self.buckets.insert(bucket, cards);
    }

    pub fn get(&self, bucket: usize) -> Option<&CardSet> {
        self.buckets.get(&bucket)
    }

    pub(crate) fn get_mut(&mut self, bucket: usize) -> Option<&mut CardSet> {
        self.buckets.get_mut(&bucket)
    }

    pub(crate) fn entry(&mut self, bucket: usize) -> &mut CardSet {
        self.buckets.entry(bucket).or_default()
    }

    /// Iterates buckets in ascending bucket-number order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &CardSet)> {
        self.buckets.iter().map(|(&number, cards)| (number, cards))
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    /// Highest bucket key present, populated or not.
    pub fn max_bucket(&self) -> Option<usize> {
        self.buckets.keys().next_back().copied()
    }

    /// Bucket holding this exact card instance.
    pub fn bucket_of(&self, card: &CardRef) -> Option<usize> {
        self.iter()
            .find(|(_, cards)| cards.contains(card))
            .map(|(number, _)| number)
    }

    /// Looks a card up by id across all buckets.
    pub fn find_by_id(&self, id: &str) -> Option<(usize, &CardRef)> {
        self.iter()
            .find_map(|(number, cards)| cards.get(id).map(|card| (number, card)))
    }

    pub fn total_cards(&self) -> usize {
        self.buckets.values().map(CardSet::len).sum()
    }
}

impl FromIterator<(usize, CardSet)> for BucketMap {
    fn from_iter<I: IntoIterator<Item = (usize, CardSet)>>(iter: I) -> Self {
        Self {
            buckets: iter.into_iter().collect(),
        }
    }
}

/// Dense bucket model: index = bucket number, gaps materialised as empty sets.
pub type DenseBuckets = Vec<CardSet>;

/// Lowest and highest bucket holding at least one card.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BucketRange {
    pub min_bucket: usize,
    pub max_bucket: usize,
}

/// Builds the dense form covering buckets `0..=max key`. Every set is a fresh copy.
pub fn to_dense_buckets(sparse: &BucketMap) -> DenseBuckets {
    let Some(max) = sparse.max_bucket() else {
        return Vec::new();
    };

    (0..=max)
        .map(|number| sparse.get(number).cloned().unwrap_or_default())
        .collect()
}

/// Converts back to the sparse form, dropping empty buckets.
pub fn to_sparse_buckets(dense: &[CardSet]) -> BucketMap {
    dense
        .iter()
        .enumerate()
        .filter(|(_, cards)| !cards.is_empty())
        .map(|(number, cards)| (number, cards.clone()))
        .collect()
}

/// Range of non-empty buckets, or `None` if every bucket is empty.
pub fn get_bucket_range(dense: &[CardSet]) -> Option<BucketRange> {
    let mut populated = dense
        .iter()
        .enumerate()
        .filter(|(_, cards)| !cards.is_empty())
        .map(|(number, _)| number);

    let min_bucket = populated.next()?;
    let max_bucket = populated.last().unwrap_or(min_bucket);

    Some(BucketRange {
        min_bucket,
        max_bucket,
    })
}
