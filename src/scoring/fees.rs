//! Marketplace fee model

use crate::error::{DealScoutError, Result};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// Seller-side fees a marketplace charges on a sale.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeeSchedule {
    /// Fraction of the sale price (final value fee)
    #[serde(default)]
    pub percentage_rate: Decimal,
    /// Fixed amount per transaction
    #[serde(default)]
    pub flat_fee: Decimal,
    /// Additional fraction of the sale price for regulatory operating fees
    #[serde(default)]
    pub regulatory_rate: Decimal,
}

impl FeeSchedule {
    pub fn new(percentage_rate: Decimal, flat_fee: Decimal, regulatory_rate: Decimal) -> Self {
        Self {
            percentage_rate,
            flat_fee,
            regulatory_rate,
        }
    }

    /// 13.25% final value fee, $0.40 per order, 0.35% regulatory fee
    pub fn ebay() -> Self {
        Self::new(dec!(0.1325), dec!(0.40), dec!(0.0035))
    }

    /// 5% selling fee
    pub fn facebook() -> Self {
        Self::new(dec!(0.05), Decimal::ZERO, Decimal::ZERO)
    }

    /// Local cash sale
    pub fn none() -> Self {
        Self::new(Decimal::ZERO, Decimal::ZERO, Decimal::ZERO)
    }
}

/// Total fees charged on a sale at `sale_price`
pub fn fee_total(sale_price: Decimal, schedule: &FeeSchedule) -> Result<Decimal> {
    if sale_price < Decimal::ZERO {
        return Err(DealScoutError::Validation(format!(
            "sale price must not be negative, got {}",
            sale_price
        )));
    }

    Ok(sale_price * schedule.percentage_rate
        + schedule.flat_fee
        + sale_price * schedule.regulatory_rate)
}

/// What the seller keeps after fees.
///
/// Not clamped: a negative result means the sale loses money.
pub fn net_proceeds(sale_price: Decimal, schedule: &FeeSchedule) -> Result<Decimal> {
    Ok(sale_price - fee_total(sale_price, schedule)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ebay_net_proceeds() {
        // 600 - 79.5 - 0.40 - 2.1
        let net = net_proceeds(dec!(600), &FeeSchedule::ebay()).unwrap();
        assert_eq!(net, dec!(518));
    }

    #[test]
    fn test_facebook_net_proceeds() {
        let net = net_proceeds(dec!(200), &FeeSchedule::facebook()).unwrap();
        assert_eq!(net, dec!(190));
    }

    #[test]
    fn test_no_fees() {
        let net = net_proceeds(dec!(123), &FeeSchedule::none()).unwrap();
        assert_eq!(net, dec!(123));
    }

    #[test]
    fn test_fees_are_exact_in_cents() {
        // 19.99 * 0.136 + 0.40
        let fee = fee_total(dec!(19.99), &FeeSchedule::ebay()).unwrap();
        assert_eq!(fee, dec!(3.11864));
    }

    #[test]
    fn test_negative_result_not_clamped() {
        let schedule = FeeSchedule::new(Decimal::ZERO, dec!(5), Decimal::ZERO);
        let net = net_proceeds(dec!(2), &schedule).unwrap();
        assert_eq!(net, dec!(-3));
    }

    #[test]
    fn test_zero_sale_price_still_pays_flat_fee() {
        let net = net_proceeds(Decimal::ZERO, &FeeSchedule::ebay()).unwrap();
        assert_eq!(net, dec!(-0.40));
    }

    #[test]
    fn test_negative_sale_price_rejected() {
        let result = net_proceeds(dec!(-1), &FeeSchedule::ebay());
        assert!(matches!(result, Err(DealScoutError::Validation(_))));

        let result = fee_total(dec!(-0.01), &FeeSchedule::ebay());
        assert!(result.is_err());
    }

    #[test]
    fn test_schedule_from_toml_fields() {
        let schedule: FeeSchedule = toml::from_str("percentage_rate = 0.1").unwrap();
        assert_eq!(
            schedule,
            FeeSchedule::new(dec!(0.1), Decimal::ZERO, Decimal::ZERO)
        );
    }
}
