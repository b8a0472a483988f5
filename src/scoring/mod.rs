//! Deal scoring: fee-aware profit arithmetic and the weighted deal score

pub mod fees;
pub mod scorer;
pub mod types;

pub use fees::{fee_total, net_proceeds, FeeSchedule};
pub use scorer::{rank_deals, DealScorer};
pub use types::{Confidence, DealAnalysis, DealRating, MarketEstimate, ScoreBreakdown};
