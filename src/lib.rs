// Plate Ledger - Core Library
// Streaming fuzzy deduplication of noisy OCR plate readings.
// Exposes all modules for use in the CLI, the API server, and tests.

pub mod normalize;
pub mod matcher;
pub mod ledger;
pub mod capture;
pub mod replay;

// Re-export commonly used types
pub use normalize::{normalize, is_valid_candidate, MIN_KEY_LENGTH};
pub use matcher::{SimilarityMatcher, MatchReason, levenshtein_distance};
pub use ledger::{
    PlateLedger, LedgerEntry, InputError,
    ReconcileReport, MergedEntry,
};
pub use capture::{
    CaptureController, CaptureState, CaptureMode, CaptureOutcome,
    PlateDetector, Detection,
};
pub use replay::{ReplaySource, ReplayFrame};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
