//! Negotiation engine manages all active negotiation sessions

use crate::config::{EngineConfig, NegotiationConfig};
use crate::error::{DealScoutError, Result};
use crate::scoring::DealRating;
use crate::types::{Listing, NegotiationId, RequestFingerprint};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};
use tracing::{debug, info, warn};

use super::bounds::{BoundsCalculator, StrategySelector};
use super::session::NegotiationSession;
use super::types::{
    NegotiationBounds, NegotiationOutcome, NegotiationProgress, NegotiationSnapshot,
    NegotiationState, SellerResponse, StrategyTier,
};

type SessionHandle = Arc<Mutex<NegotiationSession>>;

/// Negotiation engine manages all active sessions.
///
/// Each session sits behind its own lock, so two callers driving the same
/// negotiation are serialized while different negotiations proceed
/// independently. Mutating calls carry the round number the caller last
/// observed and fail with [`DealScoutError::StaleRound`] when it has moved on.
pub struct NegotiationEngine {
    config: Arc<EngineConfig>,
    policy: Arc<NegotiationConfig>,
    calculator: BoundsCalculator,
    selector: StrategySelector,
    sessions: RwLock<HashMap<NegotiationId, SessionHandle>>,
}

impl NegotiationEngine {
    /// Create new negotiation engine
    pub fn new(config: EngineConfig) -> Self {
        let policy = Arc::new(config.negotiation.clone());
        Self {
            calculator: BoundsCalculator::new(config.negotiation.clone()),
            selector: StrategySelector,
            policy,
            config: Arc::new(config),
            sessions: RwLock::new(HashMap::new()),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Stateless bounds preview. The tier is auto-selected when `tier` is `None`.
    pub fn compute_bounds(
        &self,
        asking_price: u64,
        market_average: Option<u64>,
        deal_rating: Option<DealRating>,
        tier: Option<StrategyTier>,
        listing_age_days: Option<u32>,
    ) -> Result<NegotiationBounds> {
        let tier = self.selector.select(
            asking_price,
            market_average,
            deal_rating,
            listing_age_days,
            tier,
        );
        self.calculator
            .compute(asking_price, market_average.unwrap_or(0), tier)
    }

    /// Open a negotiation on `listing` and return its opening recommendation.
    ///
    /// `max_budget` defaults to the asking price.
    pub fn open(
        &self,
        listing: &Listing,
        market_average: Option<u64>,
        max_budget: Option<u64>,
        tier: Option<StrategyTier>,
    ) -> Result<NegotiationOutcome> {
        let bounds = self.compute_bounds(
            listing.asking_price,
            market_average,
            None,
            tier,
            listing.listing_age_days,
        )?;

        let id = NegotiationId::generate();
        let mut session = NegotiationSession::new(
            id.clone(),
            listing,
            market_average.unwrap_or(0),
            max_budget.unwrap_or(listing.asking_price),
            self.policy.clone(),
        )?;
        let outcome = session.start(bounds)?;

        self.sessions
            .write()
            .map_err(|_| poisoned("session registry"))?
            .insert(id.clone(), Arc::new(Mutex::new(session)));

        info!(
            negotiation_id = %id,
            listing_id = %listing.id,
            asking_price = listing.asking_price,
            "Negotiation opened"
        );

        Ok(outcome)
    }

    /// Record the buyer's offer for the current round
    pub fn send_offer(
        &self,
        id: &NegotiationId,
        observed_round: u32,
        amount: u64,
        message: impl Into<String>,
    ) -> Result<NegotiationOutcome> {
        self.with_session(id, |session| {
            if session.state().is_terminal() {
                return Ok(session.outcome());
            }
            check_round(session, observed_round)?;
            session.send_offer(amount, message.into())
        })
    }

    /// Apply a seller response and return the next recommended move.
    ///
    /// Retrying the exact request that was last applied returns the same
    /// outcome instead of a stale-round error.
    pub fn advance_negotiation(
        &self,
        id: &NegotiationId,
        observed_round: u32,
        response: &SellerResponse,
    ) -> Result<NegotiationOutcome> {
        let fingerprint = fingerprint(id, observed_round, response)?;

        self.with_session(id, |session| {
            if let Some(outcome) = session.replayed(observed_round, &fingerprint) {
                debug!(
                    negotiation_id = %id,
                    round = observed_round,
                    fingerprint = %fingerprint,
                    "Replayed seller response"
                );
                return Ok(outcome);
            }
            if session.state().is_terminal() {
                return Ok(session.outcome());
            }
            check_round(session, observed_round)?;

            let outcome = session.receive_response(response)?;
            session.remember_response(observed_round, fingerprint, outcome.clone());
            Ok(outcome)
        })
    }

    /// The buyer's explicit decision to stop negotiating
    pub fn walk_away(
        &self,
        id: &NegotiationId,
        observed_round: u32,
        reason: Option<String>,
    ) -> Result<NegotiationOutcome> {
        self.with_session(id, |session| {
            if session.state().is_terminal() {
                return Ok(session.outcome());
            }
            check_round(session, observed_round)?;
            Ok(session.walk_away(reason))
        })
    }

    /// Abandon regardless of round, for external schedulers such as reply timeouts
    pub fn abandon(
        &self,
        id: &NegotiationId,
        reason: Option<String>,
    ) -> Result<NegotiationOutcome> {
        self.with_session(id, |session| Ok(session.walk_away(reason)))
    }

    /// Switch tier mid-negotiation. Only rounds still to come are affected.
    pub fn change_tier(
        &self,
        id: &NegotiationId,
        observed_round: u32,
        tier: StrategyTier,
    ) -> Result<NegotiationSnapshot> {
        self.with_session(id, |session| {
            if session.state().is_terminal() {
                return Ok(session.snapshot());
            }
            check_round(session, observed_round)?;

            let bounds =
                self.calculator
                    .compute(session.asking_price(), session.market_average(), tier)?;
            session.set_bounds(bounds)?;

            info!(negotiation_id = %id, tier = %tier, "Strategy tier changed");
            Ok(session.snapshot())
        })
    }

    /// Read-only snapshot
    pub fn get_state(&self, id: &NegotiationId) -> Result<NegotiationSnapshot> {
        self.with_session(id, |session| Ok(session.snapshot()))
    }

    /// Current state and recommendation without the message history
    pub fn outcome(&self, id: &NegotiationId) -> Result<NegotiationOutcome> {
        self.with_session(id, |session| Ok(session.outcome()))
    }

    pub fn progress(&self, id: &NegotiationId) -> Result<NegotiationProgress> {
        self.with_session(id, |session| Ok(session.progress()))
    }

    /// Snapshots of every session, optionally only those in `state`
    pub fn list(&self, state: Option<NegotiationState>) -> Result<Vec<NegotiationSnapshot>> {
        let handles: Vec<SessionHandle> = self
            .sessions
            .read()
            .map_err(|_| poisoned("session registry"))?
            .values()
            .cloned()
            .collect();

        let mut snapshots = Vec::with_capacity(handles.len());
        for handle in handles {
            let session = handle.lock().map_err(|_| poisoned("session"))?;
            if state.map_or(true, |s| session.state() == s) {
                snapshots.push(session.snapshot());
            }
        }
        snapshots.sort_by(|a, b| a.id.0.cmp(&b.id.0));
        Ok(snapshots)
    }

    /// Number of registered negotiations, terminal ones included
    pub fn len(&self) -> Result<usize> {
        let sessions = self
            .sessions
            .read()
            .map_err(|_| poisoned("session registry"))?;
        Ok(sessions.len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    fn with_session<T>(
        &self,
        id: &NegotiationId,
        f: impl FnOnce(&mut NegotiationSession) -> Result<T>,
    ) -> Result<T> {
        let handle = self
            .sessions
            .read()
            .map_err(|_| poisoned("session registry"))?
            .get(id)
            .cloned()
            .ok_or_else(|| DealScoutError::NegotiationNotFound(id.to_string()))?;

        let mut session = handle.lock().map_err(|_| poisoned("session"))?;
        f(&mut session)
    }
}

impl Default for NegotiationEngine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

fn check_round(session: &NegotiationSession, observed_round: u32) -> Result<()> {
    let expected = session.round_number();
    if expected != observed_round {
        warn!(
            negotiation_id = %session.id(),
            expected,
            observed = observed_round,
            "Stale round rejected"
        );
        return Err(DealScoutError::StaleRound {
            expected,
            observed: observed_round,
        });
    }
    Ok(())
}

fn fingerprint(
    id: &NegotiationId,
    round_number: u32,
    response: &SellerResponse,
) -> Result<RequestFingerprint> {
    let bytes = serde_json::to_vec(&(id, round_number, response))?;
    Ok(RequestFingerprint::from_bytes(&bytes))
}

fn poisoned(what: &str) -> DealScoutError {
    DealScoutError::Internal(format!("{} lock poisoned", what))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::negotiation::types::RecommendedAction;
    use rust_decimal_macros::dec;
    use std::thread;

    fn listing() -> Listing {
        Listing::new("listing_1", "Road bike", 500).unwrap()
    }

    /// Opened negotiation with the opening offer already sent
    fn opened(engine: &NegotiationEngine) -> NegotiationId {
        let outcome = engine
            .open(&listing(), Some(500), None, Some(StrategyTier::Moderate))
            .unwrap();
        let id = outcome.negotiation_id.clone();
        engine
            .send_offer(&id, 0, outcome.recommended_amount().unwrap(), "Would you take 350?")
            .unwrap();
        id
    }

    #[test]
    fn test_open_registers_session() {
        let engine = NegotiationEngine::default();
        let outcome = engine
            .open(&listing(), Some(400), None, Some(StrategyTier::Moderate))
            .unwrap();

        assert_eq!(outcome.state, NegotiationState::Composing);
        assert_eq!(outcome.recommended_amount(), Some(350));
        assert_eq!(engine.len().unwrap(), 1);
        assert!(!engine.is_empty().unwrap());

        let snapshot = engine.get_state(&outcome.negotiation_id).unwrap();
        assert_eq!(snapshot.max_budget, 500);
        assert_eq!(snapshot.bounds.unwrap().walk_away_price, 420);
    }

    #[test]
    fn test_open_auto_selects_tier() {
        let engine = NegotiationEngine::default();
        let outcome = engine.open(&listing(), Some(520), None, None).unwrap();
        let snapshot = engine.get_state(&outcome.negotiation_id).unwrap();
        assert_eq!(snapshot.bounds.unwrap().tier, StrategyTier::Shrewd);
    }

    #[test]
    fn test_unknown_negotiation() {
        let engine = NegotiationEngine::default();
        let id = NegotiationId("neg_missing".to_string());
        let result = engine.get_state(&id);
        assert!(matches!(result, Err(DealScoutError::NegotiationNotFound(_))));
    }

    #[test]
    fn test_advance_counter() {
        let engine = NegotiationEngine::default();
        let id = opened(&engine);

        let outcome = engine
            .advance_negotiation(&id, 0, &SellerResponse::counter("How about 480?", 480))
            .unwrap();
        assert_eq!(outcome.state, NegotiationState::Countering);
        assert_eq!(outcome.round_number, 1);
        assert_eq!(outcome.recommended_action(), RecommendedAction::Counter);
    }

    #[test]
    fn test_stale_round_rejected() {
        let engine = NegotiationEngine::default();
        let id = opened(&engine);
        engine
            .advance_negotiation(&id, 0, &SellerResponse::counter("480?", 480))
            .unwrap();
        let before = engine.get_state(&id).unwrap();

        let result = engine.advance_negotiation(&id, 0, &SellerResponse::counter("470?", 470));
        assert!(matches!(
            result,
            Err(DealScoutError::StaleRound { expected: 1, observed: 0 })
        ));
        assert_eq!(engine.get_state(&id).unwrap(), before);

        let result = engine.send_offer(&id, 0, 360, "360?");
        assert!(matches!(result, Err(DealScoutError::StaleRound { .. })));
    }

    #[test]
    fn test_replayed_request_is_idempotent() {
        let engine = NegotiationEngine::default();
        let id = opened(&engine);
        let response = SellerResponse::counter("480?", 480);

        let first = engine.advance_negotiation(&id, 0, &response).unwrap();
        let second = engine.advance_negotiation(&id, 0, &response).unwrap();

        assert_eq!(first, second);
        assert_eq!(engine.get_state(&id).unwrap().messages.len(), 2);
    }

    #[test]
    fn test_terminal_absorbs_stale_and_invalid_calls() {
        let engine = NegotiationEngine::default();
        let id = opened(&engine);
        engine
            .advance_negotiation(&id, 0, &SellerResponse::acceptance("Deal"))
            .unwrap();
        let before = engine.get_state(&id).unwrap();
        assert_eq!(before.state, NegotiationState::Accepted);

        let outcome = engine
            .advance_negotiation(&id, 7, &SellerResponse::counter("actually 900", 900))
            .unwrap();
        assert_eq!(outcome.state, NegotiationState::Accepted);
        engine.send_offer(&id, 3, 10, "hello?").unwrap();
        engine.walk_away(&id, 9, None).unwrap();
        engine.change_tier(&id, 4, StrategyTier::Shrewd).unwrap();

        assert_eq!(engine.get_state(&id).unwrap(), before);
    }

    #[test]
    fn test_walk_away_and_abandon() {
        let engine = NegotiationEngine::default();
        let id = opened(&engine);

        assert!(matches!(
            engine.walk_away(&id, 5, None),
            Err(DealScoutError::StaleRound { .. })
        ));
        let outcome = engine.walk_away(&id, 0, Some("Found another".to_string())).unwrap();
        assert_eq!(outcome.state, NegotiationState::Abandoned);

        let other = opened(&engine);
        let outcome = engine.abandon(&other, None).unwrap();
        assert_eq!(outcome.state, NegotiationState::Abandoned);
    }

    #[test]
    fn test_change_tier_affects_future_rounds() {
        let engine = NegotiationEngine::default();
        let id = opened(&engine);
        engine
            .advance_negotiation(&id, 0, &SellerResponse::counter("480?", 480))
            .unwrap();

        let snapshot = engine.change_tier(&id, 1, StrategyTier::Shrewd).unwrap();
        let bounds = snapshot.bounds.unwrap();
        assert_eq!(bounds.tier, StrategyTier::Shrewd);
        assert_eq!(bounds.max_increase_per_round_pct, Some(dec!(0.08)));
        assert_eq!(snapshot.current_offer, 350);
        assert_eq!(snapshot.round_number, 1);
        assert_eq!(snapshot.messages.len(), 2);
    }

    #[test]
    fn test_change_tier_rejects_stale_round() {
        let engine = NegotiationEngine::default();
        let id = opened(&engine);
        engine
            .advance_negotiation(&id, 0, &SellerResponse::counter("480?", 480))
            .unwrap();
        let before = engine.get_state(&id).unwrap();

        let result = engine.change_tier(&id, 0, StrategyTier::Lenient);
        assert!(matches!(
            result,
            Err(DealScoutError::StaleRound { expected: 1, observed: 0 })
        ));
        assert_eq!(engine.get_state(&id).unwrap(), before);
    }

    #[test]
    fn test_poisoned_registry_is_internal_error() {
        let engine = NegotiationEngine::default();
        opened(&engine);

        thread::scope(|scope| {
            let result = scope
                .spawn(|| {
                    let _guard = engine.sessions.write().unwrap();
                    panic!("writer died holding the registry");
                })
                .join();
            assert!(result.is_err());
        });

        assert!(matches!(engine.len(), Err(DealScoutError::Internal(_))));
        assert!(matches!(engine.is_empty(), Err(DealScoutError::Internal(_))));
        assert!(matches!(engine.list(None), Err(DealScoutError::Internal(_))));
    }

    #[test]
    fn test_list_by_state() {
        let engine = NegotiationEngine::default();
        let a = opened(&engine);
        let _b = opened(&engine);
        engine.abandon(&a, None).unwrap();

        assert_eq!(engine.list(None).unwrap().len(), 2);
        let abandoned = engine.list(Some(NegotiationState::Abandoned)).unwrap();
        assert_eq!(abandoned.len(), 1);
        assert_eq!(abandoned[0].id, a);
        assert_eq!(engine.list(Some(NegotiationState::Awaiting)).unwrap().len(), 1);
    }

    #[test]
    fn test_concurrent_advance_applies_once() {
        let engine = NegotiationEngine::default();
        let id = opened(&engine);

        let results: Vec<Result<NegotiationOutcome>> = thread::scope(|scope| {
            let handles: Vec<_> = (0..8u64)
                .map(|i| {
                    let engine = &engine;
                    let id = &id;
                    scope.spawn(move || {
                        let response = SellerResponse::counter(format!("{}?", 450 + i), 450 + i);
                        engine.advance_negotiation(id, 0, &response)
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        let applied = results.iter().filter(|r| r.is_ok()).count();
        let stale = results
            .iter()
            .filter(|r| matches!(r, Err(DealScoutError::StaleRound { .. })))
            .count();
        assert_eq!(applied, 1);
        assert_eq!(stale, 7);

        let snapshot = engine.get_state(&id).unwrap();
        assert_eq!(snapshot.round_number, 1);
        assert_eq!(snapshot.messages.len(), 2);
    }

    #[test]
    fn test_concurrent_duplicate_requests_agree() {
        let engine = NegotiationEngine::default();
        let id = opened(&engine);
        let response = SellerResponse::counter("480?", 480);

        let outcomes: Vec<NegotiationOutcome> = thread::scope(|scope| {
            let handles: Vec<_> = (0..4)
                .map(|_| scope.spawn(|| engine.advance_negotiation(&id, 0, &response).unwrap()))
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        assert!(outcomes.windows(2).all(|w| w[0] == w[1]));
        assert_eq!(engine.get_state(&id).unwrap().messages.len(), 2);
    }
}
