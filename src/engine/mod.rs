//! Core analysis engine module
//!
//! Window fan-out, scoring and ranking, plus progress bookkeeping.

pub mod progress;
pub mod ranker;

pub use progress::ProgressTracker;
pub use ranker::{sort_candidates, CandidateRanker, RankedCandidates};
