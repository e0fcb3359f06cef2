//! Database operations for the Leitner scheduler
//!
//! Handles SQLite initialization, flashcard storage, bucket assignments,
//! the practice log and the simulated day counter. Scheduling decisions are
//! delegated to the pure functions in `models`.

use crate::error::CoreError;
use crate::models::leitner::{apply_practice_result, is_due_after};
use crate::models::{AnswerDifficulty, BucketMap, Flashcard, PracticeRecord};
use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, Row, Transaction, TransactionBehavior, params};
use serde::Serialize;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum DbError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Core(#[from] CoreError),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Corrupt row: {0}")]
    Corrupt(String),
}

pub type DbResult<T> = Result<T, DbError>;

/// Result of recording one practice trial.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PracticeOutcome {
    pub card_id: String,
    pub previous_bucket: usize,
    pub new_bucket: usize,
}

/// Opens (or creates) the database file and makes sure the schema exists
pub fn init_database(path: &Path) -> DbResult<Connection> {
    let conn = Connection::open(path)?;
    create_schema(&conn)?;
    info!(path = %path.display(), "database ready");
    Ok(conn)
}

/// In-memory database, used by tests
pub fn init_in_memory() -> DbResult<Connection> {
    let conn = Connection::open_in_memory()?;
    create_schema(&conn)?;
    Ok(conn)
}

/// Creates tables for cards, users, bucket assignments, the practice log and app state.
/// Sets the day counter to 0 if not already initialized.
pub fn create_schema(conn: &Connection) -> DbResult<()> {
    conn.execute_batch(
        "PRAGMA foreign_keys = ON;

        CREATE TABLE IF NOT EXISTS flashcards (
            id TEXT PRIMARY KEY,
            front TEXT NOT NULL,
            back TEXT NOT NULL,
            hint TEXT,
            tags TEXT NOT NULL DEFAULT '[]',
            created_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS users (
            id TEXT PRIMARY KEY,
            username TEXT NOT NULL UNIQUE,
            created_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS card_buckets (
            card_id TEXT PRIMARY KEY REFERENCES flashcards(id) ON DELETE CASCADE,
            bucket_number INTEGER NOT NULL DEFAULT 0,
            updated_at TEXT NOT NULL,
            last_practiced_at TEXT
        );

        CREATE TABLE IF NOT EXISTS practice_log (
            log_id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            flashcard_id TEXT NOT NULL REFERENCES flashcards(id) ON DELETE CASCADE,
            difficulty_chosen TEXT NOT NULL CHECK (difficulty_chosen IN ('WRONG', 'HARD', 'EASY')),
            previous_bucket INTEGER,
            new_bucket INTEGER NOT NULL,
            practiced_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS app_state (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_card_buckets_bucket ON card_buckets(bucket_number);
        CREATE INDEX IF NOT EXISTS idx_practice_log_user ON practice_log(user_id);
        CREATE INDEX IF NOT EXISTS idx_practice_log_card ON practice_log(flashcard_id);

        INSERT OR IGNORE INTO app_state (key, value) VALUES ('current_day', '0');",
    )?;
    Ok(())
}

fn to_db_time(time: DateTime<Utc>) -> String {
    time.to_rfc3339()
}

fn from_db_time(text: &str) -> DbResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(text)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| DbError::Corrupt(format!("bad timestamp '{text}': {e}")))
}

fn to_bucket(number: i64) -> DbResult<usize> {
    usize::try_from(number).map_err(|_| DbError::Corrupt(format!("bad bucket number {number}")))
}

fn to_db_bucket(number: usize) -> DbResult<i64> {
    i64::try_from(number).map_err(|_| DbError::Corrupt(format!("bucket {number} out of range")))
}

/// Retrieves the simulated day counter used by `select_due_cards`
pub fn get_current_day(conn: &Connection) -> DbResult<i64> {
    let value: String = conn.query_row(
        "SELECT value FROM app_state WHERE key = 'current_day'",
        [],
        |row| row.get(0),
    )?;

    value
        .parse::<i64>()
        .map_err(|_| DbError::Corrupt(format!("bad day counter '{value}'")))
}

/// Advances the day counter by one and returns the new day
pub fn advance_day(conn: &Connection) -> DbResult<i64> {
    let next_day = get_current_day(conn)? + 1;

    conn.execute(
        "UPDATE app_state SET value = ?1 WHERE key = 'current_day'",
        params![next_day.to_string()],
    )?;

    info!(day = next_day, "advanced day counter");
    Ok(next_day)
}

/// Adds a flashcard and places it in bucket 0, never practiced.
/// A duplicate id is rejected by the primary key.
pub fn add_flashcard(card: &Flashcard, now: DateTime<Utc>, conn: &Connection) -> DbResult<()> {
    let tx = conn.unchecked_transaction()?;
    add_flashcard_in_bucket(card, 0, now, &tx)?;
    tx.commit()?;
    Ok(())
}

/// Inserts the card and its bucket row without committing.
/// Callers run it on an open transaction.
pub fn add_flashcard_in_bucket(
    card: &Flashcard,
    bucket: usize,
    now: DateTime<Utc>,
    conn: &Connection,
) -> DbResult<()> {
    let timestamp = to_db_time(now);

    conn.execute(
        "INSERT INTO flashcards (id, front, back, hint, tags, created_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            card.id(),
            card.front(),
            card.back(),
            card.hint(),
            serde_json::to_string(card.tags())?,
            timestamp,
        ],
    )?;
    conn.execute(
        "INSERT INTO card_buckets (card_id, bucket_number, updated_at, last_practiced_at) VALUES (?1, ?2, ?3, NULL)",
        params![card.id(), to_db_bucket(bucket)?, timestamp],
    )?;

    debug!(card_id = card.id(), bucket, "flashcard added");
    Ok(())
}

/// Stores every card of `buckets` in its bucket. All or nothing: a failing
/// card (e.g. an id that already exists) rolls the whole import back.
pub fn import_buckets(
    buckets: &BucketMap,
    now: DateTime<Utc>,
    conn: &Connection,
) -> DbResult<usize> {
    let tx = Transaction::new_unchecked(conn, TransactionBehavior::Immediate)?;
    for (bucket, cards) in buckets.iter() {
        for card in cards.iter() {
            add_flashcard_in_bucket(card, bucket, now, &tx)?;
        }
    }
    tx.commit()?;

    let imported = buckets.total_cards();
    info!(cards = imported, "import complete");
    Ok(imported)
}

/// id, front, back, hint, tags (JSON)
type CardRow = (String, String, String, Option<String>, String);

fn flashcard_from_row(row: &Row<'_>) -> rusqlite::Result<CardRow> {
    Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?, row.get(4)?))
}

fn build_flashcard((id, front, back, hint, tags): CardRow) -> DbResult<Flashcard> {
    let tags: Vec<String> = serde_json::from_str(&tags)?;
    Ok(Flashcard::new(id, front, back, hint, tags)?)
}

/// Retrieves a single flashcard by id
pub fn get_flashcard(id: &str, conn: &Connection) -> DbResult<Flashcard> {
    let row = conn
        .query_row(
            "SELECT id, front, back, hint, tags FROM flashcards WHERE id = ?1",
            params![id],
            flashcard_from_row,
        )
        .optional()?
        .ok_or_else(|| DbError::NotFound(format!("flashcard {id}")))?;

    build_flashcard(row)
}

/// Loads every card into the sparse bucket model
pub fn load_buckets(conn: &Connection) -> DbResult<BucketMap> {
    let mut stmt = conn.prepare(
        "SELECT f.id, f.front, f.back, f.hint, f.tags, b.bucket_number
         FROM flashcards f
         JOIN card_buckets b ON b.card_id = f.id
         ORDER BY b.bucket_number, f.id",
    )?;

    let rows = stmt
        .query_map([], |row| Ok((flashcard_from_row(row)?, row.get::<_, i64>(5)?)))?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    let mut buckets = BucketMap::new();
    for (card_row, bucket) in rows {
        buckets.insert(to_bucket(bucket)?, build_flashcard(card_row)?.into_ref());
    }

    Ok(buckets)
}

/// Practice history, oldest first
pub fn load_history(conn: &Connection) -> DbResult<Vec<PracticeRecord>> {
    let mut stmt = conn.prepare(
        "SELECT flashcard_id, practiced_at, difficulty_chosen, previous_bucket, new_bucket
         FROM practice_log
         ORDER BY practiced_at, log_id",
    )?;

    let rows = stmt
        .query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, Option<i64>>(3)?,
                row.get::<_, i64>(4)?,
            ))
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    rows.into_iter()
        .map(|(card_id, practiced_at, difficulty, previous, new)| -> DbResult<PracticeRecord> {
            Ok(PracticeRecord::new(
                card_id,
                from_db_time(&practiced_at)?,
                difficulty.parse::<AnswerDifficulty>()?,
                previous.map(to_bucket).transpose()?,
                to_bucket(new)?,
            ))
        })
        .collect()
}

/// Returns the id of `username`, creating the user if needed
pub fn ensure_user(username: &str, conn: &Connection) -> DbResult<String> {
    let existing: Option<String> = conn
        .query_row(
            "SELECT id FROM users WHERE username = ?1",
            params![username],
            |row| row.get(0),
        )
        .optional()?;

    if let Some(id) = existing {
        return Ok(id);
    }

    let id = uuid::Uuid::new_v4().to_string();
    conn.execute(
        "INSERT INTO users (id, username, created_at) VALUES (?1, ?2, ?3)",
        params![id, username, to_db_time(Utc::now())],
    )?;
    info!(username, "created user");
    Ok(id)
}

/// Ids of cards due at `now` by elapsed time: never practiced, or at least
/// 2^bucket days since the last practice. Ordered by bucket, then id.
pub fn get_due_card_ids_at(now: DateTime<Utc>, conn: &Connection) -> DbResult<Vec<String>> {
    let mut stmt = conn.prepare(
        "SELECT card_id, bucket_number, last_practiced_at FROM card_buckets
         ORDER BY bucket_number, card_id",
    )?;

    let rows = stmt
        .query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, i64>(1)?,
                row.get::<_, Option<String>>(2)?,
            ))
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    let mut due = Vec::new();
    for (card_id, bucket, last_practiced) in rows {
        let last_practiced = last_practiced.as_deref().map(from_db_time).transpose()?;
        if is_due_after(to_bucket(bucket)?, last_practiced, now) {
            due.push(card_id);
        }
    }

    Ok(due)
}

/// Applies a practice result for `card_id` and stores the new bucket together
/// with a practice-log entry. The read and both writes share one immediate
/// transaction, so concurrent writers cannot interleave.
pub fn record_practice(
    username: &str,
    card_id: &str,
    difficulty: AnswerDifficulty,
    now: DateTime<Utc>,
    conn: &Connection,
) -> DbResult<PracticeOutcome> {
    let tx = Transaction::new_unchecked(conn, TransactionBehavior::Immediate)?;
    let user_id = ensure_user(username, &tx)?;
    let buckets = load_buckets(&tx)?;

    let (previous_bucket, card) = buckets
        .find_by_id(card_id)
        .map(|(bucket, card)| (bucket, card.clone()))
        .ok_or_else(|| DbError::NotFound(format!("flashcard {card_id}")))?;

    let updated = apply_practice_result(&buckets, &card, difficulty)?;
    let new_bucket = updated
        .bucket_of(&card)
        .ok_or_else(|| DbError::Corrupt(format!("flashcard {card_id} lost during update")))?;

    let timestamp = to_db_time(now);
    tx.execute(
        "UPDATE card_buckets SET bucket_number = ?1, updated_at = ?2, last_practiced_at = ?2
         WHERE card_id = ?3",
        params![to_db_bucket(new_bucket)?, timestamp, card_id],
    )?;
    tx.execute(
        "INSERT INTO practice_log (user_id, flashcard_id, difficulty_chosen, previous_bucket, new_bucket, practiced_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            user_id,
            card_id,
            difficulty.as_str(),
            to_db_bucket(previous_bucket)?,
            to_db_bucket(new_bucket)?,
            timestamp,
        ],
    )?;
    tx.commit()?;

    info!(card_id, %difficulty, previous_bucket, new_bucket, "practice recorded");
    Ok(PracticeOutcome {
        card_id: card_id.to_string(),
        previous_bucket,
        new_bucket,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn card(id: &str, back: &str) -> Flashcard {
        Flashcard::new(id, format!("front {id}"), back, None, vec!["test".to_string()]).unwrap()
    }

    #[test]
    fn test_new_card_starts_in_bucket_zero() {
        let conn = init_in_memory().unwrap();
        add_flashcard(&card("a", "alpha"), Utc::now(), &conn).unwrap();

        let buckets = load_buckets(&conn).unwrap();
        assert_eq!(buckets.find_by_id("a").map(|(n, _)| n), Some(0));

        let last: Option<String> = conn
            .query_row(
                "SELECT last_practiced_at FROM card_buckets WHERE card_id = 'a'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert!(last.is_none());
    }

    #[test]
    fn test_duplicate_card_rejected() {
        let conn = init_in_memory().unwrap();
        add_flashcard(&card("a", "alpha"), Utc::now(), &conn).unwrap();
        assert!(add_flashcard(&card("a", "other"), Utc::now(), &conn).is_err());
    }

    #[test]
    fn test_get_flashcard_roundtrip() {
        let conn = init_in_memory().unwrap();
        let original = Flashcard::new(
            "a",
            "front",
            "back",
            Some("hint".to_string()),
            vec!["x".to_string(), "y".to_string()],
        )
        .unwrap();
        add_flashcard(&original, Utc::now(), &conn).unwrap();

        let loaded = get_flashcard("a", &conn).unwrap();
        assert_eq!(loaded.hint(), Some("hint"));
        assert_eq!(loaded.tags(), original.tags());
        assert!(matches!(get_flashcard("missing", &conn), Err(DbError::NotFound(_))));
    }

    #[test]
    fn test_day_counter() {
        let conn = init_in_memory().unwrap();
        assert_eq!(get_current_day(&conn).unwrap(), 0);
        assert_eq!(advance_day(&conn).unwrap(), 1);
        assert_eq!(advance_day(&conn).unwrap(), 2);
        assert_eq!(get_current_day(&conn).unwrap(), 2);
    }

    #[test]
    fn test_record_practice_moves_card_and_logs() {
        let conn = init_in_memory().unwrap();
        let now = Utc::now();
        add_flashcard(&card("a", "alpha"), now, &conn).unwrap();
        add_flashcard(&card("b", "beta"), now, &conn).unwrap();

        let outcome = record_practice("tester", "a", AnswerDifficulty::Easy, now, &conn).unwrap();
        assert_eq!(outcome.previous_bucket, 0);
        assert_eq!(outcome.new_bucket, 1);

        let outcome = record_practice("tester", "a", AnswerDifficulty::Hard, now, &conn).unwrap();
        assert_eq!((outcome.previous_bucket, outcome.new_bucket), (1, 1));

        let outcome = record_practice("tester", "a", AnswerDifficulty::Wrong, now, &conn).unwrap();
        assert_eq!((outcome.previous_bucket, outcome.new_bucket), (1, 0));

        let history = load_history(&conn).unwrap();
        assert_eq!(history.len(), 3);
        assert_eq!(history[0].difficulty, AnswerDifficulty::Easy);
        assert_eq!(history[0].previous_bucket, Some(0));
        assert_eq!(history[2].new_bucket, 0);
    }

    #[test]
    fn test_record_practice_unknown_card() {
        let conn = init_in_memory().unwrap();
        let result = record_practice("ghost", "nope", AnswerDifficulty::Easy, Utc::now(), &conn);
        assert!(matches!(result, Err(DbError::NotFound(_))));
        assert!(load_history(&conn).unwrap().is_empty());

        let users: i64 = conn
            .query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))
            .unwrap();
        assert_eq!(users, 0, "failed practice must not create the user");
    }

    #[test]
    fn test_import_buckets() {
        let conn = init_in_memory().unwrap();
        let mut buckets = BucketMap::new();
        buckets.insert(0, card("a", "alpha").into_ref());
        buckets.insert(3, card("b", "beta").into_ref());

        assert_eq!(import_buckets(&buckets, Utc::now(), &conn).unwrap(), 2);

        let loaded = load_buckets(&conn).unwrap();
        assert_eq!(loaded.find_by_id("a").map(|(n, _)| n), Some(0));
        assert_eq!(loaded.find_by_id("b").map(|(n, _)| n), Some(3));
    }

    #[test]
    fn test_failed_import_leaves_nothing_behind() {
        let conn = init_in_memory().unwrap();
        add_flashcard(&card("b", "beta"), Utc::now(), &conn).unwrap();

        let mut buckets = BucketMap::new();
        buckets.insert(0, card("a", "alpha").into_ref());
        buckets.insert(1, card("b", "beta again").into_ref());

        assert!(import_buckets(&buckets, Utc::now(), &conn).is_err());

        let cards: i64 = conn
            .query_row("SELECT COUNT(*) FROM flashcards", [], |row| row.get(0))
            .unwrap();
        assert_eq!(cards, 1);
        assert!(load_buckets(&conn).unwrap().find_by_id("a").is_none());
    }

    #[test]
    fn test_due_by_elapsed_time() {
        let conn = init_in_memory().unwrap();
        let start = Utc::now();
        add_flashcard(&card("a", "alpha"), start, &conn).unwrap();
        add_flashcard(&card("b", "beta"), start, &conn).unwrap();

        // never practiced cards are due
        assert_eq!(get_due_card_ids_at(start, &conn).unwrap(), vec!["a", "b"]);

        record_practice("tester", "a", AnswerDifficulty::Easy, start, &conn).unwrap();
        assert_eq!(get_due_card_ids_at(start, &conn).unwrap(), vec!["b"]);
        assert_eq!(
            get_due_card_ids_at(start + Duration::days(1), &conn).unwrap(),
            vec!["b"]
        );
        assert_eq!(
            get_due_card_ids_at(start + Duration::days(2), &conn).unwrap(),
            vec!["b", "a"]
        );
    }

    #[test]
    fn test_ensure_user_is_stable() {
        let conn = init_in_memory().unwrap();
        let first = ensure_user("tester", &conn).unwrap();
        let second = ensure_user("tester", &conn).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_init_database_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("leitner.sqlite3");

        {
            let conn = init_database(&path).unwrap();
            add_flashcard(&card("a", "alpha"), Utc::now(), &conn).unwrap();
            advance_day(&conn).unwrap();
        }

        let conn = init_database(&path).unwrap();
        assert_eq!(load_buckets(&conn).unwrap().total_cards(), 1);
        assert_eq!(get_current_day(&conn).unwrap(), 1);
    }
}
