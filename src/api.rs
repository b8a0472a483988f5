//! Request/response contracts for the surrounding application
//!
//! Requests arrive as loosely typed JSON (signed amounts, tier and rating as
//! strings) and are validated into engine types before anything is touched.

use crate::error::{DealScoutError, Result};
use crate::negotiation::{
    NegotiationBounds, NegotiationEngine, NegotiationOutcome, NegotiationState,
    RecommendedAction, SellerResponse, StrategyTier,
};
use crate::scoring::DealRating;
use crate::types::{round_amount, NegotiationId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// `compute_bounds` request
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BoundsRequest {
    pub asking_price: i64,
    #[serde(default)]
    pub market_average: Option<Decimal>,
    #[serde(default)]
    pub deal_rating: Option<String>,
    /// Auto-selected when absent
    #[serde(default)]
    pub strategy_tier: Option<String>,
    #[serde(default)]
    pub listing_age_days: Option<u32>,
}

/// Validated form of [`BoundsRequest`]
#[derive(Clone, Debug, PartialEq)]
pub struct ValidBoundsRequest {
    pub asking_price: u64,
    pub market_average: Option<u64>,
    pub deal_rating: Option<DealRating>,
    pub strategy_tier: Option<StrategyTier>,
    pub listing_age_days: Option<u32>,
}

impl BoundsRequest {
    pub fn validate(&self) -> Result<ValidBoundsRequest> {
        let asking_price = positive_amount("asking_price", self.asking_price)?;

        let market_average = match self.market_average {
            Some(avg) if avg < Decimal::ZERO => {
                return Err(DealScoutError::Validation(format!(
                    "market_average must not be negative, got {}",
                    avg
                )))
            }
            Some(avg) if avg.is_zero() => None,
            Some(avg) => Some(round_amount(avg)),
            None => None,
        };

        let deal_rating = self
            .deal_rating
            .as_deref()
            .map(str::parse::<DealRating>)
            .transpose()?;
        let strategy_tier = self
            .strategy_tier
            .as_deref()
            .map(str::parse::<StrategyTier>)
            .transpose()?;

        Ok(ValidBoundsRequest {
            asking_price,
            market_average,
            deal_rating,
            strategy_tier,
            listing_age_days: self.listing_age_days,
        })
    }
}

/// `advance_negotiation` request
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AdvanceRequest {
    pub negotiation_id: String,
    pub round_number: u32,
    pub seller_message: String,
    #[serde(default)]
    pub seller_counter: Option<i64>,
    #[serde(default)]
    pub is_rejection: bool,
}

/// Buyer offer request, recorded before the seller replies
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OfferRequest {
    pub negotiation_id: String,
    pub round_number: u32,
    pub amount: i64,
    #[serde(default)]
    pub message: String,
}

/// Response to every mutating request
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AdvanceResponse {
    pub negotiation_id: String,
    pub state: NegotiationState,
    pub round_number: u32,
    pub current_offer: u64,
    pub recommended_action: RecommendedAction,
    pub recommended_amount: Option<u64>,
    pub is_final: bool,
}

impl From<NegotiationOutcome> for AdvanceResponse {
    fn from(outcome: NegotiationOutcome) -> Self {
        Self {
            negotiation_id: outcome.negotiation_id.0,
            state: outcome.state,
            round_number: outcome.round_number,
            current_offer: outcome.current_offer,
            recommended_action: outcome.recommendation.action,
            recommended_amount: outcome.recommendation.amount,
            is_final: outcome.recommendation.is_final,
        }
    }
}

/// Stateless bounds computation; safe to call any number of times
pub fn compute_bounds(
    engine: &NegotiationEngine,
    request: &BoundsRequest,
) -> Result<NegotiationBounds> {
    let valid = request.validate()?;
    engine.compute_bounds(
        valid.asking_price,
        valid.market_average,
        valid.deal_rating,
        valid.strategy_tier,
        valid.listing_age_days,
    )
}

/// The sole seller-driven mutation
pub fn advance_negotiation(
    engine: &NegotiationEngine,
    request: &AdvanceRequest,
) -> Result<AdvanceResponse> {
    let id = NegotiationId(request.negotiation_id.clone());

    let counter = match request.seller_counter {
        Some(amount) if amount < 0 => {
            return rejected_amount(engine, &id, amount);
        }
        Some(amount) => Some(amount as u64),
        None => None,
    };

    let response = SellerResponse {
        message: request.seller_message.clone(),
        counter,
        is_rejection: request.is_rejection,
    };

    engine
        .advance_negotiation(&id, request.round_number, &response)
        .map(AdvanceResponse::from)
}

/// Record the buyer's offer for the observed round
pub fn send_offer(engine: &NegotiationEngine, request: &OfferRequest) -> Result<AdvanceResponse> {
    let id = NegotiationId(request.negotiation_id.clone());
    if request.amount < 0 {
        return rejected_amount(engine, &id, request.amount);
    }

    engine
        .send_offer(
            &id,
            request.round_number,
            request.amount as u64,
            request.message.clone(),
        )
        .map(AdvanceResponse::from)
}

/// Negative amounts are invalid offers, unless the negotiation is already over
fn rejected_amount(
    engine: &NegotiationEngine,
    id: &NegotiationId,
    amount: i64,
) -> Result<AdvanceResponse> {
    let outcome = engine.outcome(id)?;
    if outcome.state.is_terminal() {
        return Ok(outcome.into());
    }

    let asking_price = engine.get_state(id)?.asking_price;
    Err(DealScoutError::InvalidOffer {
        amount,
        asking_price,
    })
}

fn positive_amount(field: &str, value: i64) -> Result<u64> {
    if value <= 0 {
        return Err(DealScoutError::Validation(format!(
            "{} must be positive, got {}",
            field, value
        )));
    }
    Ok(value as u64)
}
