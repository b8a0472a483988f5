//! DealScout application wiring the scorer and negotiation engine together

use crate::config::{load_config, EngineConfig};
use crate::error::Result;
use crate::negotiation::{
    NegotiationBounds, NegotiationEngine, NegotiationOutcome, RecommendedAction, SellerResponse,
    StrategyTier,
};
use crate::scoring::{DealAnalysis, DealRating, DealScorer, MarketEstimate};
use crate::types::Listing;
use rust_decimal::Decimal;
use std::path::Path;

/// Main DealScout application
pub struct DealScoutApp {
    scorer: DealScorer,
    engine: NegotiationEngine,
}

impl DealScoutApp {
    /// Create an application from an already validated configuration
    pub fn new(config: EngineConfig) -> Self {
        Self {
            scorer: DealScorer::new(config.scoring.clone()),
            engine: NegotiationEngine::new(config),
        }
    }

    /// Load configuration from `path`, or use the defaults
    pub fn from_config_file(path: Option<&Path>) -> Result<Self> {
        let config = match path {
            Some(path) => load_config(path)?,
            None => EngineConfig::default(),
        };
        Ok(Self::new(config))
    }

    /// Get negotiation engine
    pub fn engine(&self) -> &NegotiationEngine {
        &self.engine
    }

    /// Score a listing against an optional market estimate
    pub fn score(
        &self,
        listing: &Listing,
        average: Option<Decimal>,
        median: Option<Decimal>,
        samples: u32,
        resale: Option<Decimal>,
        fees: Option<&str>,
    ) -> Result<DealAnalysis> {
        let schedule = self.engine.config().fees.schedule(fees)?;
        let estimate = average.map(|avg| {
            MarketEstimate::from_samples(avg, median, samples, self.scorer.config())
        });

        self.scorer
            .score_with_resale(listing, estimate.as_ref(), resale, schedule)
    }

    /// Preview bounds; the tier is auto-selected when `tier` is `None`
    pub fn bounds(
        &self,
        asking: u64,
        average: Option<u64>,
        tier: Option<&str>,
        rating: Option<&str>,
        age_days: Option<u32>,
    ) -> Result<NegotiationBounds> {
        let tier = tier.map(str::parse::<StrategyTier>).transpose()?;
        let rating = rating.map(str::parse::<DealRating>).transpose()?;
        self.engine
            .compute_bounds(asking, average, rating, tier, age_days)
    }

    /// Drive a negotiation against scripted seller counters.
    ///
    /// The buyer always sends the recommended amount and walks away when told
    /// to. The script ends when the negotiation terminates or the counters
    /// run out (with a final rejection if `reject` is set).
    pub fn simulate(
        &self,
        listing: &Listing,
        average: Option<u64>,
        budget: Option<u64>,
        tier: Option<StrategyTier>,
        counters: &[u64],
        reject: bool,
    ) -> Result<Vec<NegotiationOutcome>> {
        let engine = &self.engine;
        let mut last = engine.open(listing, average, budget, tier)?;
        let id = last.negotiation_id.clone();
        let mut outcomes = vec![last.clone()];
        let mut counters = counters.iter();

        while last.state.is_active() {
            last = match (last.recommended_action(), last.recommended_amount()) {
                (RecommendedAction::WalkAway, _) => engine.walk_away(
                    &id,
                    last.round_number,
                    Some("Thanks, but that's more than I can spend".to_string()),
                )?,
                (_, Some(amount)) => engine.send_offer(
                    &id,
                    last.round_number,
                    amount,
                    format!("Would you take ${}?", amount),
                )?,
                (_, None) => break,
            };
            outcomes.push(last.clone());
            if last.state.is_terminal() {
                break;
            }

            let response = match counters.next() {
                Some(&counter) => {
                    SellerResponse::counter(format!("I could do ${}", counter), counter)
                }
                None if reject => SellerResponse::rejection("Sorry, not selling at that price"),
                None => break,
            };
            last = engine.advance_negotiation(&id, last.round_number, &response)?;
            outcomes.push(last.clone());
        }

        tracing::info!(
            negotiation_id = %id,
            steps = outcomes.len(),
            final_state = %last.state,
            "Simulation finished"
        );

        Ok(outcomes)
    }
}

impl Default for DealScoutApp {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}
