//! Strategy tier selection and negotiation bounds

use crate::config::NegotiationConfig;
use crate::error::{DealScoutError, Result};
use crate::scoring::DealRating;
use crate::types::round_amount;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tracing::debug;

use super::types::{NegotiationBounds, StrategyTier};

/// Maps a tier and the listing/market prices to a negotiation envelope.
///
/// Pure: identical inputs always give identical bounds, so callers may
/// recompute freely while the user flips between tiers.
#[derive(Debug, Clone, Default)]
pub struct BoundsCalculator {
    config: NegotiationConfig,
}

impl BoundsCalculator {
    pub fn new(config: NegotiationConfig) -> Self {
        Self { config }
    }

    /// Compute bounds. A zero `market_average` means unknown and falls back to the asking price.
    pub fn compute(
        &self,
        asking_price: u64,
        market_average: u64,
        tier: StrategyTier,
    ) -> Result<NegotiationBounds> {
        if asking_price == 0 {
            return Err(DealScoutError::Validation(
                "asking price must be positive".to_string(),
            ));
        }
        let market_average = if market_average == 0 {
            asking_price
        } else {
            market_average
        };

        if tier == StrategyTier::Accept {
            return Ok(NegotiationBounds {
                tier,
                initial_offer: asking_price,
                target_price: asking_price,
                walk_away_price: asking_price,
                max_increase_per_round_pct: None,
                tone_guidance: tier.tone(),
                opening_approach: tier.opening_approach(),
            });
        }

        let policy = self.config.tiers.policy(tier);
        let asking = Decimal::from(asking_price);

        let walk_away_price = asking_price.min(round_amount(
            Decimal::from(market_average) * (Decimal::ONE + self.config.walk_away_markup),
        ));

        // A market far below asking can put the opening offer above the ceiling
        let initial_offer = round_amount(asking * policy.opening_fraction).min(walk_away_price);

        let anchor = market_average.min(asking_price);
        let midpoint = (Decimal::from(initial_offer) + Decimal::from(anchor)) / dec!(2);
        let target_price = round_amount(midpoint)
            .max(initial_offer)
            .min(walk_away_price);

        let bounds = NegotiationBounds {
            tier,
            initial_offer,
            target_price,
            walk_away_price,
            max_increase_per_round_pct: Some(policy.max_increase_per_round_pct),
            tone_guidance: tier.tone(),
            opening_approach: tier.opening_approach(),
        };

        debug!(
            tier = %tier,
            asking_price,
            market_average,
            initial_offer,
            target_price,
            walk_away_price,
            "Computed negotiation bounds"
        );

        Ok(bounds)
    }
}

/// Picks a tier from deal quality, market discount and listing age
#[derive(Debug, Clone, Copy, Default)]
pub struct StrategySelector;

impl StrategySelector {
    /// Older listings give the buyer leverage, fresh ones less so
    const STALE_LISTING_DAYS: u32 = 14;
    const FRESH_LISTING_DAYS: u32 = 2;

    pub fn select(
        &self,
        asking_price: u64,
        market_average: Option<u64>,
        rating: Option<DealRating>,
        listing_age_days: Option<u32>,
        user_override: Option<StrategyTier>,
    ) -> StrategyTier {
        if let Some(tier) = user_override {
            return tier;
        }

        let discount = match market_average {
            Some(avg) if avg > 0 => {
                let avg = Decimal::from(avg);
                (avg - Decimal::from(asking_price)) / avg
            }
            _ => Decimal::ZERO,
        };

        if rating == Some(DealRating::Hot) || discount > dec!(0.40) {
            return StrategyTier::Accept;
        }

        let base = if rating == Some(DealRating::Pass) || discount < dec!(0.10) {
            StrategyTier::Shrewd
        } else if rating == Some(DealRating::Fair) || discount < dec!(0.20) {
            StrategyTier::Moderate
        } else {
            StrategyTier::Lenient
        };

        // A zero age is what sources report when they do not know it
        match listing_age_days.filter(|days| *days > 0) {
            Some(days) if days > Self::STALE_LISTING_DAYS => base.tougher(),
            Some(days) if days < Self::FRESH_LISTING_DAYS && base == StrategyTier::Shrewd => {
                StrategyTier::Moderate
            }
            _ => base,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn calculator() -> BoundsCalculator {
        BoundsCalculator::default()
    }

    #[test]
    fn test_moderate_opening_offer() {
        let bounds = calculator().compute(500, 500, StrategyTier::Moderate).unwrap();
        assert_eq!(bounds.initial_offer, 350);
        assert_eq!(bounds.max_increase_per_round_pct, Some(dec!(0.12)));
    }

    #[test]
    fn test_half_unit_opening_offers_round_up() {
        // 45 * 0.7 = 31.5, 85 * 0.7 = 59.5, 165 * 0.7 = 115.5
        for (asking, expected) in [(45, 32), (85, 60), (165, 116)] {
            let bounds = calculator()
                .compute(asking, asking, StrategyTier::Moderate)
                .unwrap();
            assert_eq!(bounds.initial_offer, expected, "asking {}", asking);
        }
    }

    #[test]
    fn test_walk_away_from_market_average() {
        let bounds = calculator().compute(500, 400, StrategyTier::Moderate).unwrap();
        assert_eq!(bounds.walk_away_price, 420);
        // (350 + 400) / 2
        assert_eq!(bounds.target_price, 375);
    }

    #[test]
    fn test_walk_away_never_above_asking() {
        let bounds = calculator().compute(500, 700, StrategyTier::Shrewd).unwrap();
        assert_eq!(bounds.initial_offer, 250);
        assert_eq!(bounds.target_price, 375);
        assert_eq!(bounds.walk_away_price, 500);
    }

    #[test]
    fn test_accept_tier() {
        let bounds = calculator().compute(500, 400, StrategyTier::Accept).unwrap();
        assert_eq!(bounds.initial_offer, 500);
        assert_eq!(bounds.target_price, 500);
        assert_eq!(bounds.walk_away_price, 500);
        assert_eq!(bounds.max_increase_per_round_pct, None);
    }

    #[test]
    fn test_market_far_below_asking_keeps_ordering() {
        let bounds = calculator().compute(500, 300, StrategyTier::Lenient).unwrap();
        assert_eq!(bounds.walk_away_price, 315);
        assert!(bounds.initial_offer <= bounds.target_price);
        assert!(bounds.target_price <= bounds.walk_away_price);
    }

    #[test]
    fn test_extreme_prices_do_not_overflow() {
        for tier in StrategyTier::ALL {
            let bounds = calculator().compute(u64::MAX, u64::MAX, tier).unwrap();
            assert_eq!(bounds.walk_away_price, u64::MAX);
            assert!(bounds.initial_offer <= bounds.target_price);
            assert!(bounds.target_price <= bounds.walk_away_price);
        }
    }

    #[test]
    fn test_unknown_market_uses_asking() {
        let unknown = calculator().compute(500, 0, StrategyTier::Moderate).unwrap();
        let same = calculator().compute(500, 500, StrategyTier::Moderate).unwrap();
        assert_eq!(unknown, same);
    }

    #[test]
    fn test_zero_asking_rejected() {
        let result = calculator().compute(0, 400, StrategyTier::Shrewd);
        assert!(matches!(result, Err(DealScoutError::Validation(_))));
    }

    #[test]
    fn test_compute_is_idempotent() {
        let calc = calculator();
        for tier in StrategyTier::ALL {
            assert_eq!(
                calc.compute(737, 612, tier).unwrap(),
                calc.compute(737, 612, tier).unwrap()
            );
        }
    }

    #[test]
    fn test_selector_override_wins() {
        let tier = StrategySelector.select(
            500,
            Some(1000),
            Some(DealRating::Hot),
            None,
            Some(StrategyTier::Shrewd),
        );
        assert_eq!(tier, StrategyTier::Shrewd);
    }

    #[test]
    fn test_selector_by_rating_and_discount() {
        let s = StrategySelector;
        assert_eq!(
            s.select(500, Some(600), Some(DealRating::Hot), None, None),
            StrategyTier::Accept
        );
        assert_eq!(s.select(500, Some(1000), None, None, None), StrategyTier::Accept);
        assert_eq!(s.select(500, Some(520), None, None, None), StrategyTier::Shrewd);
        assert_eq!(
            s.select(500, Some(600), Some(DealRating::Fair), None, None),
            StrategyTier::Moderate
        );
        assert_eq!(s.select(500, Some(600), None, None, None), StrategyTier::Moderate);
        assert_eq!(
            s.select(500, Some(700), Some(DealRating::Good), None, None),
            StrategyTier::Lenient
        );
        assert_eq!(s.select(500, None, None, None, None), StrategyTier::Shrewd);
    }

    #[test]
    fn test_selector_listing_age() {
        let s = StrategySelector;
        // Lenient base, stale listing
        assert_eq!(
            s.select(500, Some(700), Some(DealRating::Good), Some(20), None),
            StrategyTier::Moderate
        );
        // Shrewd base, fresh listing
        assert_eq!(s.select(500, Some(520), None, Some(1), None), StrategyTier::Moderate);
        // Middle-aged listing keeps its tier
        assert_eq!(s.select(500, Some(520), None, Some(7), None), StrategyTier::Shrewd);
    }

    #[test]
    fn test_selector_zero_age_is_unknown() {
        let s = StrategySelector;
        assert_eq!(s.select(500, Some(520), None, Some(0), None), StrategyTier::Shrewd);
        assert_eq!(
            s.select(500, Some(520), None, Some(0), None),
            s.select(500, Some(520), None, None, None)
        );
    }
}
