//! Product sale pricing.
//!
//! A product carries a regular `price` and an optional sale. The sale is in
//! effect whenever `on_sale` is set and a positive `sale_price` exists. The
//! stored `sale_start`/`sale_end` dates are informational and never gate it.

use rust_decimal::Decimal;
use rust_decimal::prelude::RoundingStrategy;

/// Pricing inputs for one product.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SalePricing {
    pub price: Decimal,
    pub on_sale: bool,
    pub sale_price: Option<Decimal>,
}

impl SalePricing {
    /// The sale price, if a sale is in effect.
    #[must_use]
    pub fn active_sale_price(&self) -> Option<Decimal> {
        if !self.on_sale {
            return None;
        }
        self.sale_price.filter(|p| *p > Decimal::ZERO)
    }

    /// The price a customer pays.
    #[must_use]
    pub fn current_price(&self) -> Decimal {
        self.active_sale_price().unwrap_or(self.price)
    }

    /// Discount percentage rounded to two decimals; zero when no sale applies.
    #[must_use]
    pub fn sale_percentage(&self) -> Decimal {
        match self.active_sale_price() {
            Some(sale) if self.price > Decimal::ZERO => ((self.price - sale) / self.price
                * Decimal::ONE_HUNDRED)
                .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero),
            _ => Decimal::ZERO,
        }
    }
}

/// Format a money amount with exactly two decimals.
#[must_use]
pub fn format_money(amount: Decimal) -> String {
    let mut rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(2);
    rounded.to_string()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn pricing() -> SalePricing {
        SalePricing {
            price: dec("100.00"),
            on_sale: true,
            sale_price: Some(dec("75.00")),
        }
    }

    #[test]
    fn test_sale_applies_when_on_sale() {
        let p = pricing();
        assert_eq!(p.current_price(), dec("75.00"));
        assert_eq!(p.sale_percentage(), dec("25.00"));
    }

    #[test]
    fn test_not_on_sale_uses_regular_price() {
        let p = SalePricing {
            on_sale: false,
            ..pricing()
        };
        assert_eq!(p.current_price(), dec("100.00"));
        assert_eq!(p.sale_percentage(), Decimal::ZERO);
    }

    #[test]
    fn test_missing_or_zero_sale_price() {
        let missing = SalePricing {
            sale_price: None,
            ..pricing()
        };
        let zero = SalePricing {
            sale_price: Some(Decimal::ZERO),
            ..pricing()
        };
        assert_eq!(missing.current_price(), dec("100.00"));
        assert_eq!(zero.current_price(), dec("100.00"));
    }

    #[test]
    fn test_percentage_rounds() {
        let p = SalePricing {
            price: dec("30.00"),
            sale_price: Some(dec("20.00")),
            ..pricing()
        };
        assert_eq!(p.sale_percentage(), dec("33.33"));
    }

    #[test]
    fn test_format_money() {
        assert_eq!(format_money(dec("5")), "5.00");
        assert_eq!(format_money(dec("19.999")), "20.00");
        assert_eq!(format_money(dec("12.5")), "12.50");
    }
}
