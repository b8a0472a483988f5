//! DealScout
//!
//! Buyer-side tooling for marketplace listings:
//! - Fee-aware deal scoring (HOT / GOOD / FAIR / PASS)
//! - Negotiation bounds per strategy tier
//! - A round-by-round negotiation state machine with a decreasing-concession
//!   strategy, guarded against concurrent updates

pub mod api;
pub mod cli;
pub mod config;
pub mod error;
pub mod negotiation;
pub mod scoring;
pub mod types;

// Re-export commonly used types
pub use config::{load_config, EngineConfig};
pub use error::{DealScoutError, Result};
pub use negotiation::{
    BoundsCalculator, NegotiationBounds, NegotiationEngine, NegotiationOutcome, NegotiationState,
    RecommendedAction, SellerResponse, StrategyTier,
};
pub use scoring::{net_proceeds, DealAnalysis, DealRating, DealScorer, FeeSchedule, MarketEstimate};
pub use types::{round_amount, Listing, ListingId, NegotiationId};
