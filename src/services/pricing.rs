//! Money arithmetic for issuances.
//!
//! Totals are always derived from the snapshotted line items, so applying the
//! same discount again reproduces the same figures.

use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use serde::Serialize;
use utoipa::ToSchema;

use crate::errors::ServiceError;

/// Highest discount an operator may grant, in percent.
pub const MAX_DISCOUNT_PERCENT: Decimal = Decimal::TEN;

const MONEY_DP: u32 = 2;

/// Largest unit price a `decimal(12,2)` column holds
pub const MAX_PRICE: Decimal = dec!(9999999999.99);

/// Largest discount a `decimal(14,2)` column holds
pub const MAX_DISCOUNT_AMOUNT: Decimal = dec!(999999999999.99);

fn decimal_places(value: Decimal) -> u32 {
    value.normalize().scale()
}

/// Derived totals of one issuance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub struct IssueTotals {
    #[schema(value_type = String, example = "100.00")]
    pub total_amount: Decimal,
    #[schema(value_type = String, example = "10.00")]
    pub discount_amount: Decimal,
    #[schema(value_type = String, example = "90.00")]
    pub final_amount: Decimal,
}

pub fn round_money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(MONEY_DP, RoundingStrategy::MidpointAwayFromZero)
}

pub fn line_total(unit_price: Decimal, quantity: i32) -> Decimal {
    unit_price * Decimal::from(quantity)
}

/// Σ unit_price × quantity over `(unit_price, quantity)` pairs
pub fn issue_total<I>(lines: I) -> Decimal
where
    I: IntoIterator<Item = (Decimal, i32)>,
{
    lines
        .into_iter()
        .map(|(price, qty)| line_total(price, qty))
        .sum()
}

pub fn validate_price(price: Decimal) -> Result<(), ServiceError> {
    if price < Decimal::ZERO {
        return Err(ServiceError::ValidationError(
            "price cannot be negative".to_string(),
        ));
    }
    if price > MAX_PRICE {
        return Err(ServiceError::ValidationError(format!(
            "price cannot exceed {}",
            MAX_PRICE
        )));
    }
    if decimal_places(price) > MONEY_DP {
        return Err(ServiceError::ValidationError(format!(
            "price has more than {} decimal places: {}",
            MONEY_DP, price
        )));
    }
    Ok(())
}

/// Percent must lie in [0, 10] with at most two decimal places, the
/// precision it is stored with.
pub fn validate_discount_percent(percent: Decimal) -> Result<(), ServiceError> {
    if percent < Decimal::ZERO || percent > MAX_DISCOUNT_PERCENT {
        return Err(ServiceError::ValidationError(format!(
            "discount_percent must be between 0 and {}, got {}",
            MAX_DISCOUNT_PERCENT, percent
        )));
    }
    if decimal_places(percent) > 2 {
        return Err(ServiceError::ValidationError(format!(
            "discount_percent has more than 2 decimal places: {}",
            percent
        )));
    }
    Ok(())
}

/// Discount for `total`, refused when it would not fit the stored column.
pub fn checked_discount(total: Decimal, percent: Decimal) -> Result<Decimal, ServiceError> {
    validate_discount_percent(percent)?;
    let discount = discount_amount(total, percent);
    if discount > MAX_DISCOUNT_AMOUNT {
        return Err(ServiceError::ValidationError(format!(
            "discount of {} exceeds the largest recordable amount",
            discount
        )));
    }
    Ok(discount)
}

/// total × percent / 100, rounded to cents
pub fn discount_amount(total: Decimal, percent: Decimal) -> Decimal {
    round_money(total * percent / Decimal::ONE_HUNDRED)
}

pub fn totals<I>(lines: I, discount_amount: Decimal) -> IssueTotals
where
    I: IntoIterator<Item = (Decimal, i32)>,
{
    let total_amount = issue_total(lines);
    IssueTotals {
        total_amount,
        discount_amount,
        final_amount: total_amount - discount_amount,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use proptest::prelude::*;

    #[test]
    fn ten_percent_of_one_hundred() {
        let total = issue_total([(dec!(10), 2), (dec!(40), 2)]);
        assert_eq!(total, dec!(100));
        assert_eq!(discount_amount(total, dec!(10)), dec!(10));

        let t = totals([(dec!(10), 2), (dec!(40), 2)], dec!(10));
        assert_eq!(t.final_amount, dec!(90));
    }

    #[test]
    fn zero_percent_is_free_of_discount() {
        assert_eq!(discount_amount(dec!(57.30), Decimal::ZERO), Decimal::ZERO);
    }

    #[test]
    fn discount_bounds_are_inclusive() {
        assert!(validate_discount_percent(dec!(0)).is_ok());
        assert!(validate_discount_percent(dec!(10)).is_ok());
        assert!(validate_discount_percent(dec!(7.5)).is_ok());
        assert_matches!(
            validate_discount_percent(dec!(15)),
            Err(ServiceError::ValidationError(_))
        );
        assert_matches!(
            validate_discount_percent(dec!(-1)),
            Err(ServiceError::ValidationError(_))
        );
    }

    #[test]
    fn percent_finer_than_cents_of_a_percent_is_rejected() {
        assert!(validate_discount_percent(dec!(7.55)).is_ok());
        assert!(validate_discount_percent(dec!(7.500)).is_ok());
        assert_matches!(
            validate_discount_percent(dec!(7.555)),
            Err(ServiceError::ValidationError(msg)) if msg.contains("decimal places")
        );
    }

    #[test]
    fn prices_must_fit_the_stored_precision() {
        assert!(validate_price(dec!(0)).is_ok());
        assert!(validate_price(dec!(12.50)).is_ok());
        assert!(validate_price(MAX_PRICE).is_ok());
        for bad in [dec!(-0.01), dec!(10000000000), dec!(1.005)] {
            assert_matches!(validate_price(bad), Err(ServiceError::ValidationError(_)));
        }
    }

    #[test]
    fn oversized_discount_is_a_validation_error() {
        assert_eq!(checked_discount(dec!(100), dec!(10)).unwrap(), dec!(10));
        let huge_total = MAX_PRICE * Decimal::from(i32::MAX);
        assert_matches!(
            checked_discount(huge_total, dec!(10)),
            Err(ServiceError::ValidationError(_))
        );
    }

    #[test]
    fn discount_rounds_half_cents_up() {
        // 3 × 0.35 = 1.05; 5% of it is 0.0525
        assert_eq!(discount_amount(dec!(1.05), dec!(5)), dec!(0.05));
        assert_eq!(discount_amount(dec!(0.30), dec!(5)), dec!(0.02));
    }

    #[test]
    fn empty_issue_totals_zero() {
        assert_eq!(issue_total(std::iter::empty()), Decimal::ZERO);
    }

    proptest! {
        #[test]
        fn discount_never_exceeds_a_tenth_of_total(
            cents in 0i64..10_000_000,
            qty in 1i32..1_000,
            pct_tenths in 0i64..=100,
        ) {
            let price = Decimal::new(cents, 2);
            let pct = Decimal::new(pct_tenths, 1);
            let total = issue_total([(price, qty)]);
            let discount = discount_amount(total, pct);

            prop_assert!(discount >= Decimal::ZERO);
            prop_assert!(discount <= round_money(total / Decimal::TEN));
            prop_assert!(total - discount >= Decimal::ZERO);
            // re-deriving gives the same figure
            prop_assert_eq!(discount, discount_amount(issue_total([(price, qty)]), pct));
        }
    }
}
