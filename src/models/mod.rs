pub mod bucket;
pub mod difficulty;
pub mod flashcard;
pub mod hint;
pub mod leitner;
pub mod practice_record;
pub mod progress;

pub use bucket::{BucketMap, BucketRange, CardSet, DenseBuckets};
pub use difficulty::AnswerDifficulty;
pub use flashcard::{CardRef, Flashcard};
pub use practice_record::PracticeRecord;
pub use progress::{DifficultyCounts, LearningStats, ProgressReport};
