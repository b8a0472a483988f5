//! Negotiation types and state machine states

use crate::error::DealScoutError;
use crate::types::{ListingId, NegotiationId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::SystemTime;

/// Buyer risk posture; decides how low the opening offer goes
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StrategyTier {
    Shrewd,
    Moderate,
    Lenient,
    Accept,
}

impl StrategyTier {
    pub const ALL: [StrategyTier; 4] = [
        StrategyTier::Shrewd,
        StrategyTier::Moderate,
        StrategyTier::Lenient,
        StrategyTier::Accept,
    ];

    /// Display name shown next to the bounds
    pub fn name(&self) -> &'static str {
        match self {
            StrategyTier::Shrewd => "Shrewd Negotiator",
            StrategyTier::Moderate => "Balanced Negotiator",
            StrategyTier::Lenient => "Easy-Going Buyer",
            StrategyTier::Accept => "Quick Buyer",
        }
    }

    pub fn tone(&self) -> Tone {
        match self {
            StrategyTier::Shrewd => Tone::Businesslike,
            StrategyTier::Moderate => Tone::Friendly,
            StrategyTier::Lenient => Tone::Warm,
            StrategyTier::Accept => Tone::Eager,
        }
    }

    pub fn opening_approach(&self) -> OpeningApproach {
        match self {
            StrategyTier::Shrewd => OpeningApproach::AnchorLow,
            StrategyTier::Moderate => OpeningApproach::RapportThenOffer,
            StrategyTier::Lenient => OpeningApproach::SoftAsk,
            StrategyTier::Accept => OpeningApproach::BuyAtAsking,
        }
    }

    /// One step tougher; shrewd and accept stay put
    pub fn tougher(self) -> Self {
        match self {
            StrategyTier::Lenient => StrategyTier::Moderate,
            StrategyTier::Moderate => StrategyTier::Shrewd,
            other => other,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StrategyTier::Shrewd => "shrewd",
            StrategyTier::Moderate => "moderate",
            StrategyTier::Lenient => "lenient",
            StrategyTier::Accept => "accept",
        }
    }
}

impl fmt::Display for StrategyTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for StrategyTier {
    type Err = DealScoutError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "shrewd" => Ok(StrategyTier::Shrewd),
            "moderate" => Ok(StrategyTier::Moderate),
            "lenient" => Ok(StrategyTier::Lenient),
            "accept" => Ok(StrategyTier::Accept),
            other => Err(DealScoutError::Validation(format!(
                "unknown strategy tier: {}",
                other
            ))),
        }
    }
}

/// Advisory tone tag for the message composer
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tone {
    Businesslike,
    Friendly,
    Warm,
    Eager,
}

/// Advisory opening tag for the message composer
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OpeningApproach {
    AnchorLow,
    RapportThenOffer,
    SoftAsk,
    BuyAtAsking,
}

/// Operating envelope for one negotiation
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NegotiationBounds {
    pub tier: StrategyTier,
    pub initial_offer: u64,
    pub target_price: u64,
    pub walk_away_price: u64,
    /// Fraction of the remaining gap to the walk-away price one round may add.
    /// `None` for the accept tier, which never concedes.
    pub max_increase_per_round_pct: Option<Decimal>,
    pub tone_guidance: Tone,
    pub opening_approach: OpeningApproach,
}

impl NegotiationBounds {
    /// Lower every price above `budget` to `budget`, keeping the ordering intact
    pub fn capped_at(&self, budget: u64) -> Self {
        Self {
            initial_offer: self.initial_offer.min(budget),
            target_price: self.target_price.min(budget),
            walk_away_price: self.walk_away_price.min(budget),
            ..self.clone()
        }
    }

    /// Largest single-round increase allowed from `current_offer`
    pub fn max_increase(&self, current_offer: u64) -> Decimal {
        let remaining = Decimal::from(self.walk_away_price.saturating_sub(current_offer));
        match self.max_increase_per_round_pct {
            Some(pct) => remaining * pct,
            None => remaining,
        }
    }
}

/// Negotiation state machine.
///
/// `idle -> composing -> awaiting -> countering -> awaiting ...` until one of
/// the absorbing terminal states is reached.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NegotiationState {
    Idle,
    Composing,
    Awaiting,
    Countering,
    Accepted,
    Rejected,
    Abandoned,
}

impl NegotiationState {
    /// Check if negotiation is in a terminal state
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            NegotiationState::Accepted | NegotiationState::Rejected | NegotiationState::Abandoned
        )
    }

    /// Check if negotiation is active
    pub fn is_active(&self) -> bool {
        !self.is_terminal()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            NegotiationState::Idle => "idle",
            NegotiationState::Composing => "composing",
            NegotiationState::Awaiting => "awaiting",
            NegotiationState::Countering => "countering",
            NegotiationState::Accepted => "accepted",
            NegotiationState::Rejected => "rejected",
            NegotiationState::Abandoned => "abandoned",
        }
    }
}

impl fmt::Display for NegotiationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for NegotiationState {
    type Err = DealScoutError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "idle" => Ok(NegotiationState::Idle),
            "composing" => Ok(NegotiationState::Composing),
            "awaiting" => Ok(NegotiationState::Awaiting),
            "countering" => Ok(NegotiationState::Countering),
            "accepted" => Ok(NegotiationState::Accepted),
            "rejected" => Ok(NegotiationState::Rejected),
            "abandoned" => Ok(NegotiationState::Abandoned),
            other => Err(DealScoutError::Validation(format!(
                "unknown negotiation state: {}",
                other
            ))),
        }
    }
}

/// Who sent a message
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Buyer,
    Seller,
}

/// One exchanged message, with the price it carried if any
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
    pub amount: Option<u64>,
    pub timestamp: SystemTime,
}

/// Kind of move the buyer should make next
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendedAction {
    /// Send the opening offer
    Open,
    /// Nothing to do until the seller replies
    Wait,
    Counter,
    /// Meet the seller near the midpoint
    Split,
    /// Last offer at the walk-away ceiling
    FinalOffer,
    WalkAway,
    /// Seller agreed; close the deal
    Accept,
}

impl fmt::Display for RecommendedAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RecommendedAction::Open => "open",
            RecommendedAction::Wait => "wait",
            RecommendedAction::Counter => "counter",
            RecommendedAction::Split => "split",
            RecommendedAction::FinalOffer => "final_offer",
            RecommendedAction::WalkAway => "walk_away",
            RecommendedAction::Accept => "accept",
        };
        write!(f, "{}", s)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub action: RecommendedAction,
    pub amount: Option<u64>,
    pub is_final: bool,
}

impl Recommendation {
    pub fn new(action: RecommendedAction, amount: Option<u64>) -> Self {
        Self {
            action,
            amount,
            is_final: false,
        }
    }

    pub fn final_offer(amount: u64) -> Self {
        Self {
            action: RecommendedAction::FinalOffer,
            amount: Some(amount),
            is_final: true,
        }
    }
}

/// A seller reply as classified by the caller.
///
/// Rejection is never inferred from the message text; the caller sets `is_rejection`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SellerResponse {
    pub message: String,
    pub counter: Option<u64>,
    #[serde(default)]
    pub is_rejection: bool,
}

impl SellerResponse {
    pub fn counter(message: impl Into<String>, amount: u64) -> Self {
        Self {
            message: message.into(),
            counter: Some(amount),
            is_rejection: false,
        }
    }

    pub fn acceptance(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            counter: None,
            is_rejection: false,
        }
    }

    pub fn rejection(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            counter: None,
            is_rejection: true,
        }
    }
}

/// What every mutating operation returns
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NegotiationOutcome {
    pub negotiation_id: NegotiationId,
    pub state: NegotiationState,
    pub round_number: u32,
    pub current_offer: u64,
    pub recommendation: Recommendation,
}

impl NegotiationOutcome {
    pub fn recommended_action(&self) -> RecommendedAction {
        self.recommendation.action
    }

    pub fn recommended_amount(&self) -> Option<u64> {
        self.recommendation.amount
    }
}

/// Read-only copy of a negotiation
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NegotiationSnapshot {
    pub id: NegotiationId,
    pub listing_id: ListingId,
    pub state: NegotiationState,
    pub asking_price: u64,
    pub max_budget: u64,
    pub current_offer: u64,
    pub round_number: u32,
    pub bounds: Option<NegotiationBounds>,
    pub agreed_price: Option<u64>,
    pub recommendation: Recommendation,
    pub messages: Vec<Message>,
}

/// Summary of how a negotiation has moved so far
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NegotiationProgress {
    pub state: NegotiationState,
    pub round_number: u32,
    pub buyer_offers: Vec<u64>,
    pub seller_counters: Vec<u64>,
    pub messages_exchanged: usize,
}
