//! Negotiation session: the state machine for one listing negotiation

use crate::config::NegotiationConfig;
use crate::error::{DealScoutError, Result};
use crate::types::{round_amount, Listing, ListingId, NegotiationId, RequestFingerprint};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::sync::Arc;
use std::time::SystemTime;
use tracing::{debug, info};

use super::types::{
    Message, NegotiationBounds, NegotiationOutcome, NegotiationProgress, NegotiationSnapshot,
    NegotiationState, Recommendation, RecommendedAction, Role, SellerResponse,
};

/// The last applied seller response, kept so a retried request gets the same answer
#[derive(Clone, Debug)]
struct AppliedResponse {
    round_number: u32,
    fingerprint: RequestFingerprint,
    outcome: NegotiationOutcome,
}

/// A buyer-side negotiation over one listing
#[derive(Clone, Debug)]
pub struct NegotiationSession {
    id: NegotiationId,
    listing_id: ListingId,
    asking_price: u64,
    market_average: u64,
    max_budget: u64,
    state: NegotiationState,
    bounds: Option<NegotiationBounds>,
    current_offer: u64,
    round_number: u32,
    agreed_price: Option<u64>,
    recommendation: Recommendation,
    messages: Vec<Message>,
    policy: Arc<NegotiationConfig>,
    last_response: Option<AppliedResponse>,
    created_at: SystemTime,
}

impl NegotiationSession {
    /// Create an idle session. A zero `market_average` means unknown.
    pub fn new(
        id: NegotiationId,
        listing: &Listing,
        market_average: u64,
        max_budget: u64,
        policy: Arc<NegotiationConfig>,
    ) -> Result<Self> {
        if listing.asking_price == 0 {
            return Err(DealScoutError::Validation(
                "asking price must be positive".to_string(),
            ));
        }
        if max_budget == 0 {
            return Err(DealScoutError::Validation(
                "max budget must be positive".to_string(),
            ));
        }

        Ok(Self {
            id,
            listing_id: listing.id.clone(),
            asking_price: listing.asking_price,
            market_average,
            max_budget,
            state: NegotiationState::Idle,
            bounds: None,
            current_offer: 0,
            round_number: 0,
            agreed_price: None,
            recommendation: Recommendation::new(RecommendedAction::Open, None),
            messages: Vec::new(),
            policy,
            last_response: None,
            created_at: SystemTime::now(),
        })
    }

    pub fn id(&self) -> &NegotiationId {
        &self.id
    }

    pub fn listing_id(&self) -> &ListingId {
        &self.listing_id
    }

    pub fn state(&self) -> NegotiationState {
        self.state
    }

    pub fn asking_price(&self) -> u64 {
        self.asking_price
    }

    pub fn market_average(&self) -> u64 {
        self.market_average
    }

    pub fn current_offer(&self) -> u64 {
        self.current_offer
    }

    pub fn round_number(&self) -> u32 {
        self.round_number
    }

    pub fn bounds(&self) -> Option<&NegotiationBounds> {
        self.bounds.as_ref()
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn agreed_price(&self) -> Option<u64> {
        self.agreed_price
    }

    pub fn created_at(&self) -> SystemTime {
        self.created_at
    }

    /// Begin the negotiation with the given envelope. Valid only from `idle`.
    pub fn start(&mut self, bounds: NegotiationBounds) -> Result<NegotiationOutcome> {
        if self.state.is_terminal() {
            return Ok(self.outcome());
        }
        if self.state != NegotiationState::Idle {
            return Err(self.invalid_transition("start"));
        }

        let bounds = bounds.capped_at(self.max_budget);
        self.recommendation =
            Recommendation::new(RecommendedAction::Open, Some(bounds.initial_offer));
        self.bounds = Some(bounds);
        self.state = NegotiationState::Composing;

        info!(
            negotiation_id = %self.id,
            listing_id = %self.listing_id,
            suggested_offer = ?self.recommendation.amount,
            "Negotiation started"
        );

        Ok(self.outcome())
    }

    /// Install new bounds for the rounds still to come; history is untouched
    pub fn set_bounds(&mut self, bounds: NegotiationBounds) -> Result<()> {
        if self.state.is_terminal() {
            return Ok(());
        }

        let bounds = bounds.capped_at(self.max_budget);
        if matches!(
            self.state,
            NegotiationState::Idle | NegotiationState::Composing
        ) && self.round_number == 0
        {
            self.recommendation =
                Recommendation::new(RecommendedAction::Open, Some(bounds.initial_offer));
        }
        self.bounds = Some(bounds);
        Ok(())
    }

    /// Record a buyer offer that was sent to the seller
    pub fn send_offer(&mut self, amount: u64, message: String) -> Result<NegotiationOutcome> {
        if self.state.is_terminal() {
            return Ok(self.outcome());
        }
        self.check_amount(amount)?;
        if !matches!(
            self.state,
            NegotiationState::Composing | NegotiationState::Countering
        ) {
            return Err(self.invalid_transition("send_offer"));
        }

        self.messages.push(Message {
            role: Role::Buyer,
            content: message,
            amount: Some(amount),
            timestamp: SystemTime::now(),
        });
        self.current_offer = amount;
        self.state = NegotiationState::Awaiting;
        self.recommendation = Recommendation::new(RecommendedAction::Wait, None);

        info!(
            negotiation_id = %self.id,
            round = self.round_number,
            offer = amount,
            "Offer sent"
        );

        Ok(self.outcome())
    }

    /// Process the seller's reply and decide the next move
    pub fn receive_response(&mut self, response: &SellerResponse) -> Result<NegotiationOutcome> {
        if self.state.is_terminal() {
            return Ok(self.outcome());
        }
        if let Some(counter) = response.counter {
            self.check_amount(counter)?;
        }
        if self.state != NegotiationState::Awaiting {
            return Err(self.invalid_transition("receive_response"));
        }
        let bounds = match &self.bounds {
            Some(bounds) => bounds.clone(),
            None => return Err(self.invalid_transition("receive_response")),
        };

        self.messages.push(Message {
            role: Role::Seller,
            content: response.message.clone(),
            amount: response.counter,
            timestamp: SystemTime::now(),
        });

        match response.counter {
            None if response.is_rejection => {
                self.state = NegotiationState::Rejected;
                self.recommendation = Recommendation::new(RecommendedAction::WalkAway, None);
                info!(negotiation_id = %self.id, round = self.round_number, "Seller rejected");
            }
            None => self.accept_at(self.current_offer),
            // Seller met or beat our offer
            Some(counter) if counter <= self.current_offer => self.accept_at(counter),
            Some(counter) => {
                self.round_number += 1;
                self.state = NegotiationState::Countering;
                self.recommendation = self.concede(&bounds, counter);

                info!(
                    negotiation_id = %self.id,
                    round = self.round_number,
                    seller_counter = counter,
                    action = %self.recommendation.action,
                    amount = ?self.recommendation.amount,
                    "Seller countered"
                );
            }
        }

        Ok(self.outcome())
    }

    /// The buyer's explicit decision to end the negotiation
    pub fn walk_away(&mut self, reason: Option<String>) -> NegotiationOutcome {
        if self.state.is_terminal() {
            return self.outcome();
        }

        if let Some(reason) = reason {
            self.messages.push(Message {
                role: Role::Buyer,
                content: reason,
                amount: None,
                timestamp: SystemTime::now(),
            });
        }
        self.state = NegotiationState::Abandoned;
        self.recommendation = Recommendation::new(RecommendedAction::WalkAway, None);

        info!(negotiation_id = %self.id, round = self.round_number, "Negotiation abandoned");
        self.outcome()
    }

    fn accept_at(&mut self, price: u64) {
        self.state = NegotiationState::Accepted;
        self.agreed_price = Some(price);
        self.recommendation = Recommendation::new(RecommendedAction::Accept, Some(price));
        info!(negotiation_id = %self.id, price, "Deal accepted");
    }

    /// Decreasing-concession response to a seller counter above our offer
    fn concede(&self, bounds: &NegotiationBounds, seller_counter: u64) -> Recommendation {
        let current = Decimal::from(self.current_offer);
        let counter = Decimal::from(seller_counter);
        let walk_away = Decimal::from(bounds.walk_away_price);

        let rate = self.policy.concession_rate(self.round_number);
        let gap = counter - current;
        let raw_next = current + gap * rate;

        debug!(
            negotiation_id = %self.id,
            round = self.round_number,
            gap = %gap,
            rate = %rate,
            raw_next = %raw_next,
            walk_away = bounds.walk_away_price,
            "Concession computed"
        );

        if raw_next > walk_away {
            if counter <= walk_away * (Decimal::ONE + self.policy.final_offer_tolerance_pct) {
                let split = midpoint(counter, walk_away, bounds.walk_away_price);
                return Recommendation::final_offer(split);
            }
            return Recommendation::new(RecommendedAction::WalkAway, None);
        }

        let next = raw_next.min(current + bounds.max_increase(self.current_offer));

        let convergence = Decimal::from(self.asking_price) * self.policy.convergence_pct;
        if (counter - next).abs() <= convergence {
            let split = midpoint(counter, next, bounds.walk_away_price);
            // A split that reaches the ceiling is a final offer
            if split >= bounds.walk_away_price {
                return Recommendation::final_offer(bounds.walk_away_price);
            }
            return Recommendation::new(RecommendedAction::Split, Some(split));
        }

        Recommendation::new(RecommendedAction::Counter, Some(round_amount(next)))
    }

    fn check_amount(&self, amount: u64) -> Result<()> {
        if amount > self.asking_price {
            return Err(DealScoutError::InvalidOffer {
                amount: amount.min(i64::MAX as u64) as i64,
                asking_price: self.asking_price,
            });
        }
        Ok(())
    }

    fn invalid_transition(&self, operation: &'static str) -> DealScoutError {
        DealScoutError::InvalidTransition {
            state: self.state.to_string(),
            operation,
        }
    }

    /// Cached outcome if this exact response was already applied at `round_number`
    pub(crate) fn replayed(
        &self,
        round_number: u32,
        fingerprint: &RequestFingerprint,
    ) -> Option<NegotiationOutcome> {
        self.last_response
            .as_ref()
            .filter(|applied| {
                applied.round_number == round_number && &applied.fingerprint == fingerprint
            })
            .map(|applied| applied.outcome.clone())
    }

    pub(crate) fn remember_response(
        &mut self,
        round_number: u32,
        fingerprint: RequestFingerprint,
        outcome: NegotiationOutcome,
    ) {
        self.last_response = Some(AppliedResponse {
            round_number,
            fingerprint,
            outcome,
        });
    }

    /// State, offer and next move
    pub fn outcome(&self) -> NegotiationOutcome {
        NegotiationOutcome {
            negotiation_id: self.id.clone(),
            state: self.state,
            round_number: self.round_number,
            current_offer: self.current_offer,
            recommendation: self.recommendation.clone(),
        }
    }

    /// Read-only copy of the whole negotiation
    pub fn snapshot(&self) -> NegotiationSnapshot {
        NegotiationSnapshot {
            id: self.id.clone(),
            listing_id: self.listing_id.clone(),
            state: self.state,
            asking_price: self.asking_price,
            max_budget: self.max_budget,
            current_offer: self.current_offer,
            round_number: self.round_number,
            bounds: self.bounds.clone(),
            agreed_price: self.agreed_price,
            recommendation: self.recommendation.clone(),
            messages: self.messages.clone(),
        }
    }

    pub fn progress(&self) -> NegotiationProgress {
        let offers = |role: Role| -> Vec<u64> {
            self.messages
                .iter()
                .filter(|m| m.role == role)
                .filter_map(|m| m.amount)
                .collect()
        };

        NegotiationProgress {
            state: self.state,
            round_number: self.round_number,
            buyer_offers: offers(Role::Buyer),
            seller_counters: offers(Role::Seller),
            messages_exchanged: self.messages.len(),
        }
    }
}

/// Rounded midpoint of two prices, never above `ceiling`
fn midpoint(a: Decimal, b: Decimal, ceiling: u64) -> u64 {
    round_amount((a + b) / dec!(2)).min(ceiling)
}
