//! Configuration loading and validation

use std::path::Path;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tracing::info;

use super::EngineConfig;
use crate::error::{DealScoutError, Result};

/// Load and validate configuration from a TOML file.
///
/// Sections and fields missing from the file keep their defaults.
pub fn load_config(path: impl AsRef<Path>) -> Result<EngineConfig> {
    let path = path.as_ref();

    let content = std::fs::read_to_string(path).map_err(|e| {
        DealScoutError::Configuration(format!("failed to read {}: {}", path.display(), e))
    })?;

    let config = parse_config(&content)?;

    info!(
        path = %path.display(),
        fee_schedules = config.fees.schedules.len(),
        concession_rounds = config.negotiation.concession_schedule.len(),
        "Configuration loaded"
    );

    Ok(config)
}

/// Parse and validate configuration from TOML text
pub fn parse_config(content: &str) -> Result<EngineConfig> {
    let config: EngineConfig = toml::from_str(content)
        .map_err(|e| DealScoutError::Configuration(format!("failed to parse TOML: {}", e)))?;

    validate_config(&config)?;
    Ok(config)
}

fn ensure(condition: bool, message: impl FnOnce() -> String) -> Result<()> {
    if condition {
        Ok(())
    } else {
        Err(DealScoutError::Configuration(message()))
    }
}

fn in_unit_interval(value: Decimal) -> bool {
    value > Decimal::ZERO && value <= Decimal::ONE
}

fn is_fraction(value: Decimal) -> bool {
    value >= Decimal::ZERO && value < Decimal::ONE
}

/// Validate every policy parameter.
pub fn validate_config(config: &EngineConfig) -> Result<()> {
    let scoring = &config.scoring;

    ensure(
        scoring.max_discount_pct > Decimal::ZERO
            && scoring.max_roi_pct > Decimal::ZERO
            && scoring.max_profit > Decimal::ZERO,
        || "scoring saturation points must be positive".to_string(),
    )?;

    let weight_sum = scoring.discount_weight
        + scoring.roi_weight
        + scoring.profit_weight
        + scoring.confidence_weight;
    ensure((weight_sum - Decimal::ONE).abs() <= dec!(0.000001), || {
        format!("scoring weights must sum to 1.0, got {}", weight_sum)
    })?;
    ensure(
        [
            scoring.discount_weight,
            scoring.roi_weight,
            scoring.profit_weight,
            scoring.confidence_weight,
        ]
        .iter()
        .all(|w| *w >= Decimal::ZERO),
        || "scoring weights must not be negative".to_string(),
    )?;

    ensure(
        scoring.hot_threshold > scoring.good_threshold
            && scoring.good_threshold > scoring.fair_threshold
            && scoring.fair_threshold >= Decimal::ZERO
            && scoring.hot_threshold <= dec!(100),
        || "rating thresholds must satisfy 100 >= hot > good > fair >= 0".to_string(),
    )?;

    for score in [
        scoring.high_confidence_score,
        scoring.medium_confidence_score,
        scoring.low_confidence_score,
        scoring.neutral_score,
    ] {
        ensure(score >= Decimal::ZERO && score <= dec!(100), || {
            format!("scores must be within [0, 100], got {}", score)
        })?;
    }

    ensure(
        scoring.high_confidence_samples > scoring.medium_confidence_samples
            && scoring.medium_confidence_samples > 0,
        || "confidence sample thresholds must satisfy high > medium > 0".to_string(),
    )?;

    let negotiation = &config.negotiation;
    let schedule = &negotiation.concession_schedule;

    ensure(!schedule.is_empty(), || {
        "concession_schedule must not be empty".to_string()
    })?;
    ensure(schedule.iter().all(|r| in_unit_interval(*r)), || {
        format!("concession rates must be in (0, 1], got {:?}", schedule)
    })?;
    ensure(schedule.windows(2).all(|w| w[1] <= w[0]), || {
        format!("concession_schedule must be non-increasing, got {:?}", schedule)
    })?;

    for (name, value) in [
        ("convergence_pct", negotiation.convergence_pct),
        ("final_offer_tolerance_pct", negotiation.final_offer_tolerance_pct),
        ("walk_away_markup", negotiation.walk_away_markup),
    ] {
        ensure(is_fraction(value), || {
            format!("{} must be in [0, 1), got {}", name, value)
        })?;
    }

    let tiers = &negotiation.tiers;
    for (name, policy) in [
        ("shrewd", &tiers.shrewd),
        ("moderate", &tiers.moderate),
        ("lenient", &tiers.lenient),
    ] {
        ensure(in_unit_interval(policy.opening_fraction), || {
            format!("{} opening_fraction must be in (0, 1]", name)
        })?;
        ensure(in_unit_interval(policy.max_increase_per_round_pct), || {
            format!("{} max_increase_per_round_pct must be in (0, 1]", name)
        })?;
    }
    ensure(tiers.accept.opening_fraction == Decimal::ONE, || {
        "accept tier must open at the asking price".to_string()
    })?;

    let fees = &config.fees;
    ensure(fees.schedules.contains_key(&fees.default_schedule), || {
        format!("default fee schedule '{}' is not defined", fees.default_schedule)
    })?;
    for (name, schedule) in &fees.schedules {
        ensure(
            is_fraction(schedule.percentage_rate) && is_fraction(schedule.regulatory_rate),
            || format!("fee schedule '{}' rates must be in [0, 1)", name),
        )?;
        ensure(schedule.flat_fee >= Decimal::ZERO, || {
            format!("fee schedule '{}' flat_fee must be non-negative", name)
        })?;
    }

    Ok(())
}
