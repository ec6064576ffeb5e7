//! sitebot-rank
//!
//! Turns a user query into the context handed to the generator: embed the
//! query, over-fetch neighbours, re-rank them (freshness-boosted when the
//! query asks for news), keep `top_k`, join their text under a character
//! budget and collect their unique source URLs.

pub mod context;
pub mod keywords;
pub mod ranker;
pub mod scoring;

pub use context::{build_context, unique_sources, TRUNCATION_MARKER};
pub use keywords::FreshnessKeywords;
pub use ranker::{RankRequest, RetrievalRanker, DEFAULT_OVER_FETCH};
pub use scoring::{DistanceOnly, FreshnessFirst, RankKey, RankScorer};
