//! Deal scoring engine
//!
//! Turns a listing price, a market estimate and a fee schedule into a
//! 0-100 score and a HOT/GOOD/FAIR/PASS rating. Four sub-scores are each
//! scaled linearly into [0, 100] and combined with configured weights:
//! discount below market, ROI, absolute profit, and estimate confidence.

use crate::config::ScoringConfig;
use crate::error::{DealScoutError, Result};
use crate::types::Listing;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tracing::{debug, warn};

use super::fees::{net_proceeds, FeeSchedule};
use super::types::{Confidence, DealAnalysis, DealRating, MarketEstimate, ScoreBreakdown};

/// Scores listings against market estimates
#[derive(Debug, Clone, Default)]
pub struct DealScorer {
    config: ScoringConfig,
}

impl DealScorer {
    pub fn new(config: ScoringConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    /// Score a listing, assuming it resells at the market average
    pub fn score(
        &self,
        listing: &Listing,
        estimate: Option<&MarketEstimate>,
        fees: &FeeSchedule,
    ) -> Result<DealAnalysis> {
        self.score_with_resale(listing, estimate, None, fees)
    }

    /// Score a listing with an explicit resale estimate for a separate resale channel.
    ///
    /// A missing or empty market estimate never fails: the listing is scored
    /// against its own asking price with neutral sub-scores and LOW confidence.
    pub fn score_with_resale(
        &self,
        listing: &Listing,
        estimate: Option<&MarketEstimate>,
        resale_estimate: Option<Decimal>,
        fees: &FeeSchedule,
    ) -> Result<DealAnalysis> {
        if listing.asking_price == 0 {
            return Err(DealScoutError::Validation(format!(
                "listing {} has a zero asking price",
                listing.id
            )));
        }
        let asking = Decimal::from(listing.asking_price);

        let analysis = match estimate.filter(|e| e.is_usable()) {
            Some(estimate) => {
                let average = estimate.average;
                let resale = resale_estimate.unwrap_or(average);
                let profit = net_proceeds(resale, fees)? - asking;
                let roi = profit / asking * dec!(100);
                let discount = (average - asking) / average * dec!(100);

                let breakdown = ScoreBreakdown {
                    discount_score: scale(discount, self.config.max_discount_pct),
                    roi_score: scale(roi, self.config.max_roi_pct),
                    profit_score: scale(profit, self.config.max_profit),
                    confidence_score: estimate.confidence.score(&self.config),
                    reference_price: average,
                };

                self.finish(
                    listing,
                    breakdown,
                    profit,
                    roi,
                    discount,
                    estimate.confidence,
                    Some(average),
                    basic_reason(discount, profit, roi),
                )
            }
            None => {
                warn!(
                    listing_id = %listing.id,
                    "No usable market estimate, scoring against asking price"
                );

                let resale = resale_estimate.unwrap_or(asking);
                let profit = net_proceeds(resale, fees)? - asking;
                let roi = profit / asking * dec!(100);
                let neutral = self.config.neutral_score;

                let breakdown = ScoreBreakdown {
                    discount_score: neutral,
                    roi_score: neutral,
                    profit_score: neutral,
                    confidence_score: Confidence::Low.score(&self.config),
                    reference_price: asking,
                };

                self.finish(
                    listing,
                    breakdown,
                    profit,
                    roi,
                    Decimal::ZERO,
                    Confidence::Low,
                    None,
                    "No comparable sales found; scored against asking price".to_string(),
                )
            }
        };

        debug!(
            listing_id = %analysis.listing_id,
            score = %analysis.score,
            rating = %analysis.rating,
            profit = %analysis.profit_estimate,
            roi = %analysis.roi_percent,
            "Scored listing"
        );

        Ok(analysis)
    }

    #[allow(clippy::too_many_arguments)]
    fn finish(
        &self,
        listing: &Listing,
        breakdown: ScoreBreakdown,
        profit: Decimal,
        roi: Decimal,
        discount: Decimal,
        confidence: Confidence,
        market_average: Option<Decimal>,
        reason: String,
    ) -> DealAnalysis {
        let c = &self.config;
        let score = (breakdown.discount_score * c.discount_weight
            + breakdown.roi_score * c.roi_weight
            + breakdown.profit_score * c.profit_weight
            + breakdown.confidence_score * c.confidence_weight)
            .clamp(Decimal::ZERO, dec!(100));

        DealAnalysis {
            listing_id: listing.id.clone(),
            score,
            rating: DealRating::from_score(score, c),
            profit_estimate: profit,
            roi_percent: roi,
            discount_pct: discount,
            confidence,
            market_average,
            reason,
            breakdown,
        }
    }
}

/// Linear 0 -> 0, `saturation` -> 100, clamped
fn scale(value: Decimal, saturation: Decimal) -> Decimal {
    if saturation <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    value
        .checked_div(saturation)
        .and_then(|ratio| ratio.checked_mul(dec!(100)))
        .map_or(Decimal::ZERO, |scaled| scaled.clamp(Decimal::ZERO, dec!(100)))
}

fn basic_reason(discount: Decimal, profit: Decimal, roi: Decimal) -> String {
    if profit > dec!(50) && roi > dec!(50) {
        format!(
            "Strong deal: {:.0}% below market, ${:.0} profit potential ({:.0}% ROI)",
            discount, profit, roi
        )
    } else if profit > dec!(20) {
        format!(
            "Good opportunity: {:.0}% discount, ${:.0} estimated profit",
            discount, profit
        )
    } else if discount > dec!(20) {
        format!(
            "Fair price: {:.0}% below average but modest profit margin",
            discount
        )
    } else {
        format!("Limited upside: only {:.0}% below market average", discount)
    }
}

/// Keep HOT and GOOD deals, HOT first, then by profit estimate descending
pub fn rank_deals(analyses: Vec<DealAnalysis>) -> Vec<DealAnalysis> {
    let mut deals: Vec<DealAnalysis> = analyses
        .into_iter()
        .filter(|a| matches!(a.rating, DealRating::Hot | DealRating::Good))
        .collect();

    deals.sort_by(|a, b| {
        a.rating
            .cmp(&b.rating)
            .then_with(|| b.profit_estimate.cmp(&a.profit_estimate))
    });

    deals
}

#[cfg(test)]
mod tests {
    use super::*;

    fn listing(id: &str, price: u64) -> Listing {
        Listing::new(id, "Test item", price).unwrap()
    }

    fn estimate(average: Decimal, samples: u32) -> MarketEstimate {
        MarketEstimate::from_samples(average, None, samples, &ScoringConfig::default())
    }

    #[test]
    fn test_deep_discount_with_high_confidence_is_hot() {
        let scorer = DealScorer::default();
        let analysis = scorer
            .score(&listing("l1", 300), Some(&estimate(dec!(600), 25)), &FeeSchedule::ebay())
            .unwrap();

        // net 518 on a 300 buy
        assert_eq!(analysis.profit_estimate, dec!(218));
        assert!(analysis.roi_percent > dec!(70));
        assert_eq!(analysis.confidence, Confidence::High);
        assert!(analysis.score >= dec!(80));
        assert_eq!(analysis.rating, DealRating::Hot);
        assert!(analysis.reason.starts_with("Strong deal"));
    }

    #[test]
    fn test_weighted_sum() {
        let scorer = DealScorer::default();
        let analysis = scorer
            .score(
                &listing("l2", 350),
                Some(&estimate(dec!(500), 20)),
                &FeeSchedule::facebook(),
            )
            .unwrap();

        // discount 30% -> 75, profit 125 -> 83.33, roi 35.71% -> 71.43, confidence 100
        let roi_score = dec!(125) / dec!(350) * dec!(100) / dec!(50) * dec!(100);
        let profit_score = dec!(125) / dec!(150) * dec!(100);
        let expected = dec!(0.40) * dec!(75)
            + dec!(0.30) * roi_score
            + dec!(0.20) * profit_score
            + dec!(0.10) * dec!(100);
        assert!((analysis.score - expected).abs() < dec!(0.000001));
        assert_eq!(analysis.rating, DealRating::Good);
        assert!(analysis.reason.starts_with("Good opportunity"));
    }

    #[test]
    fn test_overpriced_listing_passes() {
        let scorer = DealScorer::default();
        let analysis = scorer
            .score(&listing("l3", 500), Some(&estimate(dec!(400), 12)), &FeeSchedule::ebay())
            .unwrap();

        assert!(analysis.profit_estimate < Decimal::ZERO);
        assert_eq!(analysis.breakdown.discount_score, Decimal::ZERO);
        assert_eq!(analysis.breakdown.roi_score, Decimal::ZERO);
        assert_eq!(analysis.breakdown.profit_score, Decimal::ZERO);
        assert_eq!(analysis.confidence, Confidence::Medium);
        assert_eq!(analysis.score, dec!(6));
        assert_eq!(analysis.rating, DealRating::Pass);
        assert!(analysis.reason.starts_with("Limited upside"));
    }

    #[test]
    fn test_missing_estimate_degrades_to_neutral() {
        let scorer = DealScorer::default();
        let analysis = scorer
            .score(&listing("l4", 200), None, &FeeSchedule::none())
            .unwrap();

        assert_eq!(analysis.confidence, Confidence::Low);
        assert_eq!(analysis.market_average, None);
        assert_eq!(analysis.breakdown.discount_score, dec!(50));
        assert_eq!(analysis.breakdown.reference_price, dec!(200));
        // 0.4*50 + 0.3*50 + 0.2*50 + 0.1*20
        assert_eq!(analysis.score, dec!(47));
        assert_eq!(analysis.rating, DealRating::Fair);
    }

    #[test]
    fn test_empty_estimate_treated_as_missing() {
        let scorer = DealScorer::default();
        let empty = estimate(dec!(450), 0);
        let analysis = scorer
            .score(&listing("l5", 200), Some(&empty), &FeeSchedule::none())
            .unwrap();

        assert_eq!(analysis.confidence, Confidence::Low);
        assert_eq!(analysis.score, dec!(47));
    }

    #[test]
    fn test_separate_resale_channel() {
        let scorer = DealScorer::default();
        let analysis = scorer
            .score_with_resale(
                &listing("l6", 100),
                Some(&estimate(dec!(120), 30)),
                Some(dec!(200)),
                &FeeSchedule::none(),
            )
            .unwrap();

        assert_eq!(analysis.profit_estimate, dec!(100));
        assert_eq!(analysis.roi_percent, dec!(100));
        assert_eq!(analysis.breakdown.roi_score, dec!(100));
    }

    #[test]
    fn test_negative_resale_rejected() {
        let scorer = DealScorer::default();
        let result = scorer.score_with_resale(
            &listing("l7", 100),
            Some(&estimate(dec!(120), 30)),
            Some(dec!(-5)),
            &FeeSchedule::none(),
        );
        assert!(matches!(result, Err(DealScoutError::Validation(_))));
    }

    #[test]
    fn test_lower_profit_saturation_lifts_rating() {
        let good = DealScorer::default()
            .score(
                &listing("l8", 350),
                Some(&estimate(dec!(500), 20)),
                &FeeSchedule::facebook(),
            )
            .unwrap();

        let scorer = DealScorer::new(ScoringConfig {
            max_profit: dec!(125),
            ..ScoringConfig::default()
        });
        let hot = scorer
            .score(
                &listing("l8", 350),
                Some(&estimate(dec!(500), 20)),
                &FeeSchedule::facebook(),
            )
            .unwrap();

        assert_eq!(good.rating, DealRating::Good);
        assert_eq!(hot.breakdown.profit_score, dec!(100));
        assert!(hot.score > good.score);
        assert_eq!(hot.rating, DealRating::Hot);
    }

    #[test]
    fn test_weights_change_score() {
        let scorer = DealScorer::new(ScoringConfig {
            discount_weight: dec!(0.10),
            roi_weight: dec!(0.10),
            profit_weight: dec!(0.10),
            confidence_weight: dec!(0.70),
            ..ScoringConfig::default()
        });
        let analysis = scorer
            .score(&listing("l9", 500), Some(&estimate(dec!(400), 12)), &FeeSchedule::ebay())
            .unwrap();

        // Only the MEDIUM confidence sub-score is non-zero: 0.7 * 60
        assert_eq!(analysis.score, dec!(42));
        assert_eq!(analysis.rating, DealRating::Fair);
    }

    #[test]
    fn test_scale_clamps() {
        assert_eq!(scale(dec!(80), dec!(40)), dec!(100));
        assert_eq!(scale(dec!(-10), dec!(40)), Decimal::ZERO);
        assert_eq!(scale(dec!(20), dec!(40)), dec!(50));
        assert_eq!(scale(dec!(20), Decimal::ZERO), Decimal::ZERO);
    }

    #[test]
    fn test_rank_deals() {
        let scorer = DealScorer::default();
        let fees = FeeSchedule::none();

        let hot_small = scorer
            .score(&listing("hot_small", 100), Some(&estimate(dec!(300), 25)), &fees)
            .unwrap();
        let hot_big = scorer
            .score(&listing("hot_big", 300), Some(&estimate(dec!(900), 25)), &fees)
            .unwrap();
        let good = scorer
            .score(
                &listing("good", 350),
                Some(&estimate(dec!(500), 20)),
                &FeeSchedule::facebook(),
            )
            .unwrap();
        let pass = scorer
            .score(&listing("pass", 500), Some(&estimate(dec!(400), 12)), &fees)
            .unwrap();

        let ranked = rank_deals(vec![good, pass, hot_small, hot_big]);
        let ids: Vec<&str> = ranked.iter().map(|a| a.listing_id.0.as_str()).collect();
        assert_eq!(ids, vec!["hot_big", "hot_small", "good"]);
    }
}
