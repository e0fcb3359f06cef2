//! Flashcard is an immutable prompt/answer pair with an identifier, an optional hint and tags.
//! Cards are shared between buckets as `CardRef` so that membership follows the instance.
use crate::error::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Shared handle to a card. Bucket membership compares these by pointer.
pub type CardRef = Arc<Flashcard>;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "RawFlashcard")]
pub struct Flashcard {
    id: String,
    front: String,
    back: String,
    hint: Option<String>,
    tags: Vec<String>,
}

/// Unvalidated shape used while deserializing.
#[derive(Deserialize)]
struct RawFlashcard {
    id: String,
    front: String,
    back: String,
    #[serde(default)]
    hint: Option<String>,
    #[serde(default)]
    tags: Vec<String>,
}

impl TryFrom<RawFlashcard> for Flashcard {
    type Error = CoreError;

    fn try_from(raw: RawFlashcard) -> CoreResult<Self> {
        Flashcard::new(raw.id, raw.front, raw.back, raw.hint, raw.tags)
    }
}

impl Flashcard {
    /// Fails with `InvalidArgument` when the id, front or back is empty.
    pub fn new(
        id: impl Into<String>,
        front: impl Into<String>,
        back: impl Into<String>,
        hint: Option<String>,
        tags: Vec<String>,
    ) -> CoreResult<Self> {
        let (id, front, back) = (id.into(), front.into(), back.into());
        if id.is_empty() || front.is_empty() || back.is_empty() {
            return Err(CoreError::InvalidArgument(
                "flashcard requires id, front, and back".to_string(),
            ));
        }

        Ok(Self {
            id,
            front,
            back,
            hint,
            tags,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn front(&self) -> &str {
        &self.front
    }

    pub fn back(&self) -> &str {
        &self.back
    }

    pub fn hint(&self) -> Option<&str> {
        self.hint.as_deref()
    }

    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    /// Wraps the card in a shared handle for use in bucket sets.
    pub fn into_ref(self) -> CardRef {
        Arc::new(self)
    }
}
