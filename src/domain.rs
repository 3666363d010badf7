//! Domain module - category matching core types and collaborator contracts
//!
//! Pure types only: nothing in here touches the network, the database or
//! the filesystem. Each submodule is its own file in the domain/ directory.

pub mod category;
pub mod constants;
pub mod job;
pub mod matching;
pub mod repositories;
pub mod services;

// Re-export commonly used items for convenience
pub use category::{CategoryExtraction, CategorySet, CategorySource, clean_label};
pub use job::{
    CacheStats, DownloadLinks, JobDescriptor, JobRecord, JobStats, JobStatus, JobStatusDetails,
    MatchingDetails, RowOutcome, SpreadsheetRow,
};
pub use matching::{Classification, MatchCandidate, MatchMethod, MatchResult, MatchStatus, Thresholds};
