use leitner_core::*;

use anyhow::Context;
use chrono::Utc;
use clap::{Parser, Subcommand};
use config::Config;
use database::db;
use export::json::{buckets_from_snapshot, export_json_to_path, import_json, snapshot_from_buckets};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "leitner")]
#[command(about = "Modified-Leitner flashcard scheduler")]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, env = "LEITNER_CONFIG")]
    config: Option<PathBuf>,

    /// Database file (overrides config file)
    #[arg(long, env = "LEITNER_DB")]
    database: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Add a card to bucket 0
    Add {
        #[arg(long)]
        front: String,
        #[arg(long)]
        back: String,
        #[arg(long)]
        hint: Option<String>,
        #[arg(long = "tag")]
        tags: Vec<String>,
        /// Card id, generated when omitted
        #[arg(long)]
        id: Option<String>,
    },
    /// Cards due on the stored day counter (or the given day)
    Due {
        #[arg(long, allow_hyphen_values = true)]
        day: Option<i64>,
    },
    /// Cards due by elapsed time since their last practice
    DueNow,
    /// Record a practice result: wrong|hard|easy or 0|1|2
    Practice {
        card_id: String,
        difficulty: AnswerDifficulty,
    },
    /// Show a partially revealed answer
    Hint {
        card_id: String,
        #[arg(long, allow_hyphen_values = true)]
        letters: Option<i64>,
    },
    /// Print progress statistics
    Progress,
    /// Advance the day counter
    NextDay,
    /// Write all cards and their buckets to a JSON file
    Export {
        path: PathBuf,
        #[arg(long, default_value = "Leitner Deck")]
        name: String,
    },
    /// Load cards and their buckets from a JSON file
    Import { path: PathBuf },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "leitner=info,leitner_core=info".into()),
        )
        .init();

    let cli = Cli::parse();

    let config_path = cli.config.clone().or_else(Config::default_path);
    let mut config = match &config_path {
        Some(path) => Config::load(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => Config::default(),
    };
    if let Some(database) = cli.database {
        config.storage.database_path = database;
    }

    if let Some(parent) = config.storage.database_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let conn = db::init_database(&config.storage.database_path)?;

    match cli.command {
        Command::Add {
            front,
            back,
            hint,
            tags,
            id,
        } => {
            let id = id.unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
            let card = Flashcard::new(id, front, back, hint, tags)?;
            db::add_flashcard(&card, Utc::now(), &conn)?;
            println!("Added card {} to bucket 0", card.id());
        }
        Command::Due { day } => {
            let day = match day {
                Some(day) => day,
                None => db::get_current_day(&conn)?,
            };
            let dense = to_dense_buckets(&db::load_buckets(&conn)?);
            let due = select_due_cards(&dense, day)?;

            println!("Day {}: {} card(s) due", day, due.len());
            for card in due.iter() {
                println!("  - [{}] {}", card.id(), card.front());
            }
        }
        Command::DueNow => {
            let due = db::get_due_card_ids_at(Utc::now(), &conn)?;
            println!("{} card(s) due now", due.len());
            for id in due {
                let card = db::get_flashcard(&id, &conn)?;
                println!("  - [{}] {}", card.id(), card.front());
            }
        }
        Command::Practice {
            card_id,
            difficulty,
        } => {
            let outcome = db::record_practice(
                &config.practice.user,
                &card_id,
                difficulty,
                Utc::now(),
                &conn,
            )?;
            println!(
                "Card {}: bucket {} -> {}",
                outcome.card_id, outcome.previous_bucket, outcome.new_bucket
            );
        }
        Command::Hint { card_id, letters } => {
            let card = db::get_flashcard(&card_id, &conn)?;
            let letters = letters.unwrap_or(config.practice.default_hint_letters);
            println!("{}", card.front());
            println!("{}", reveal_hint(Some(&card), letters)?);
        }
        Command::Progress => {
            let buckets = db::load_buckets(&conn)?;
            let history = db::load_history(&conn)?;
            let report = compute_progress(Some(&buckets), Some(history.as_slice()))?;
            let stats = compute_learning_stats(Some(&buckets), Some(history.as_slice()))?;

            println!("Cards: {}", report.total_cards);
            for (bucket, count) in &report.cards_by_bucket {
                println!("  bucket {bucket}: {count}");
            }
            println!("Practices: {}", report.total_practices);
            for difficulty in AnswerDifficulty::ALL {
                println!("  {}: {}", difficulty, report.difficulty_counts.get(difficulty));
            }
            if report.total_practices == 0 {
                println!("No practice history found.");
            }
            match get_bucket_range(&to_dense_buckets(&buckets)) {
                Some(range) => {
                    println!("Bucket range: {}..={}", range.min_bucket, range.max_bucket)
                }
                None => println!("Bucket range: none"),
            }
            println!(
                "Practiced: {}, mastered: {}, completeness: {}",
                stats.cards_practiced, stats.cards_mastered, stats.completeness
            );
        }
        Command::NextDay => {
            let day = db::advance_day(&conn)?;
            println!("Day is now {day}");
        }
        Command::Export { path, name } => {
            let snapshot = snapshot_from_buckets(&name, &db::load_buckets(&conn)?);
            export_json_to_path(&snapshot, &path)?;
            println!("Exported {} card(s) to {}", snapshot.cards.len(), path.display());
        }
        Command::Import { path } => {
            let buckets = buckets_from_snapshot(&import_json(&path)?)?;
            let imported = db::import_buckets(&buckets, Utc::now(), &conn)?;
            println!("Imported {imported} card(s)");
        }
    }

    Ok(())
}
