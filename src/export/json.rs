//! JSON import/export of bucket state.
//! A snapshot stores every card together with the bucket it currently sits in.

use crate::error::CoreError;
use crate::models::{BucketMap, Flashcard};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Core(#[from] CoreError),
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SnapshotCard {
    pub bucket: usize,
    #[serde(flatten)]
    pub card: Flashcard,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DeckSnapshot {
    pub name: String,
    pub cards: Vec<SnapshotCard>,
}

/// Captures the bucket model, cards ordered by bucket then id.
pub fn snapshot_from_buckets(name: &str, buckets: &BucketMap) -> DeckSnapshot {
    let cards = buckets
        .iter()
        .flat_map(|(bucket, cards)| {
            cards.iter().map(move |card| SnapshotCard {
                bucket,
                card: (**card).clone(),
            })
        })
        .collect();

    DeckSnapshot {
        name: name.to_string(),
        cards,
    }
}

/// Rebuilds a bucket model. Duplicate card ids are rejected.
pub fn buckets_from_snapshot(snapshot: &DeckSnapshot) -> Result<BucketMap, ExportError> {
    let mut seen = HashSet::new();
    let mut buckets = BucketMap::new();

    for entry in &snapshot.cards {
        if !seen.insert(entry.card.id()) {
            return Err(CoreError::InvalidArgument(format!(
                "duplicate flashcard id {} in snapshot",
                entry.card.id()
            ))
            .into());
        }
        buckets.insert(entry.bucket, entry.card.clone().into_ref());
    }

    Ok(buckets)
}

/// Exports a snapshot to a JSON file at the specified path.
pub fn export_json_to_path(snapshot: &DeckSnapshot, path: &Path) -> Result<(), ExportError> {
    let json_string = serde_json::to_string_pretty(snapshot)?;
    let mut file = File::create(path)?;
    file.write_all(json_string.as_bytes())?;
    info!(
        name = %snapshot.name,
        cards = snapshot.cards.len(),
        path = %path.display(),
        "snapshot exported"
    );
    Ok(())
}

/// Imports a snapshot from a JSON file. Cards are validated while parsing.
pub fn import_json(path: &Path) -> Result<DeckSnapshot, ExportError> {
    let mut file = File::open(path)?;
    let mut contents = String::new();
    file.read_to_string(&mut contents)?;

    let snapshot: DeckSnapshot = serde_json::from_str(&contents)?;

    info!(name = %snapshot.name, path = %path.display(), "snapshot imported");
    Ok(snapshot)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn create_test_buckets() -> BucketMap {
        let mut buckets = BucketMap::new();
        buckets.insert(
            0,
            Flashcard::new("hello", "hello", "cześć", None, Vec::new())
                .unwrap()
                .into_ref(),
        );
        buckets.insert(
            2,
            Flashcard::new(
                "goodbye",
                "goodbye",
                "do widzenia",
                Some("formal".to_string()),
                vec!["polish".to_string()],
            )
            .unwrap()
            .into_ref(),
        );
        buckets
    }

    #[test]
    fn test_export_json_to_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("export.json");
        let snapshot = snapshot_from_buckets("Test Deck", &create_test_buckets());

        assert!(export_json_to_path(&snapshot, &path).is_ok());
        assert!(fs::metadata(&path).is_ok(), "File should exist");
    }

    #[test]
    fn test_import_json() {
        let json_content = r#"{
  "name": "Import Test Deck",
  "cards": [
    { "bucket": 3, "id": "t1", "front": "test term", "back": "test definition" }
  ]
}"#;
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("import.json");
        fs::write(&path, json_content).unwrap();

        let snapshot = import_json(&path).unwrap();
        assert_eq!(snapshot.name, "Import Test Deck");
        assert_eq!(snapshot.cards.len(), 1);
        assert_eq!(snapshot.cards[0].bucket, 3);
        assert_eq!(snapshot.cards[0].card.back(), "test definition");

        let buckets = buckets_from_snapshot(&snapshot).unwrap();
        assert_eq!(buckets.find_by_id("t1").map(|(n, _)| n), Some(3));
    }

    #[test]
    fn test_export_and_import_keep_buckets() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("roundtrip.json");
        let original = create_test_buckets();

        export_json_to_path(&snapshot_from_buckets("Deck", &original), &path).unwrap();
        let restored = buckets_from_snapshot(&import_json(&path).unwrap()).unwrap();

        assert_eq!(restored.total_cards(), 2);
        assert_eq!(restored.find_by_id("hello").map(|(n, _)| n), Some(0));
        let (bucket, card) = restored.find_by_id("goodbye").unwrap();
        assert_eq!(bucket, 2);
        assert_eq!(card.hint(), Some("formal"));
    }

    #[test]
    fn test_import_nonexistent_file() {
        let result = import_json(Path::new("nonexistent_file_xyz123.json"));
        assert!(matches!(result, Err(ExportError::Io(_))));
    }

    #[test]
    fn test_import_invalid_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("invalid.json");
        fs::write(&path, "{ this is not valid json }").unwrap();

        assert!(matches!(import_json(&path), Err(ExportError::Json(_))));
    }

    #[test]
    fn test_import_rejects_empty_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad_card.json");
        fs::write(
            &path,
            r#"{"name":"d","cards":[{"bucket":0,"id":"x","front":"f","back":""}]}"#,
        )
        .unwrap();

        assert!(import_json(&path).is_err());
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let card = Flashcard::new("same", "f", "b", None, Vec::new()).unwrap();
        let snapshot = DeckSnapshot {
            name: "dup".to_string(),
            cards: vec![
                SnapshotCard {
                    bucket: 0,
                    card: card.clone(),
                },
                SnapshotCard { bucket: 1, card },
            ],
        };

        assert!(matches!(
            buckets_from_snapshot(&snapshot),
            Err(ExportError::Core(CoreError::InvalidArgument(_)))
        ));
    }
}
