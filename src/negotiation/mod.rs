//! Negotiation module: bounds, the per-listing state machine and the engine around it

pub mod bounds;
pub mod engine;
pub mod session;
pub mod types;

pub use bounds::{BoundsCalculator, StrategySelector};
pub use engine::NegotiationEngine;
pub use session::NegotiationSession;
pub use types::{
    Message, NegotiationBounds, NegotiationOutcome, NegotiationProgress, NegotiationSnapshot,
    NegotiationState, OpeningApproach, Recommendation, RecommendedAction, Role, SellerResponse,
    StrategyTier, Tone,
};
