//! Built-in document refiners.
//!
//! Refiners reshape the retrieved document set before augmentation:
//!
//! - [`DeduplicationRefiner`]: drops repeated document ids
//! - [`RankRefiner`]: keeps the `top_k` best-scored documents
//! - [`SimilarityRefiner`]: drops documents under a score cutoff

pub mod deduplication;
pub mod rank;
pub mod similarity;

pub use deduplication::DeduplicationRefiner;
pub use rank::RankRefiner;
pub use similarity::SimilarityRefiner;
