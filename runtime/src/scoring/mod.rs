//! Site aggregation, privacy scoring, and ranking.

pub mod metrics;
pub mod rank;
pub mod score;

pub use metrics::{aggregate, SiteMetrics};
pub use rank::rank_by;
pub use score::{score, ScoreBreakdown};
