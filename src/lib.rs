pub mod config;
pub mod database;
pub mod error;
pub mod export;
pub mod models;

pub use error::{CoreError, CoreResult};
pub use models::bucket::{get_bucket_range, to_dense_buckets, to_sparse_buckets};
pub use models::hint::reveal_hint;
pub use models::leitner::{apply_practice_result, select_due_cards};
pub use models::progress::{compute_learning_stats, compute_progress};
pub use models::{
    AnswerDifficulty, BucketMap, BucketRange, CardRef, CardSet, DenseBuckets, Flashcard,
    PracticeRecord, ProgressReport,
};
