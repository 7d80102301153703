//! Value objects

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Money value object
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Money {
    amount: Decimal,
    currency: String,
}

impl Money {
    pub fn new(amount: Decimal, currency: &str) -> Self {
        Self { amount, currency: currency.to_string() }
    }
    pub fn usd(amount: Decimal) -> Self {
        Self::new(amount, "USD")
    }
    pub fn zero(currency: &str) -> Self {
        Self::new(Decimal::ZERO, currency)
    }
    pub fn amount(&self) -> Decimal {
        self.amount
    }
    pub fn currency(&self) -> &str {
        &self.currency
    }
    pub fn is_positive(&self) -> bool {
        self.amount > Decimal::ZERO
    }
    pub fn add(&self, other: &Money) -> Result<Money, MoneyError> {
        if self.currency != other.currency {
            return Err(MoneyError::CurrencyMismatch);
        }
        Ok(Money::new(self.amount + other.amount, &self.currency))
    }
    pub fn subtract(&self, other: &Money) -> Result<Money, MoneyError> {
        if self.currency != other.currency {
            return Err(MoneyError::CurrencyMismatch);
        }
        Ok(Money::new(self.amount - other.amount, &self.currency))
    }
    pub fn multiply(&self, qty: u32) -> Money {
        Money::new(self.amount * Decimal::from(qty), &self.currency)
    }
}

impl Default for Money {
    fn default() -> Self {
        Self::zero("USD")
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.amount, self.currency)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MoneyError {
    CurrencyMismatch,
}
impl std::error::Error for MoneyError {}
impl fmt::Display for MoneyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Currency mismatch")
    }
}

/// Quantity value object. Stock can never go negative by construction.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Quantity(u32);

impl Quantity {
    pub fn new(value: u32) -> Self {
        Self(value)
    }
    pub fn value(&self) -> u32 {
        self.0
    }
    pub fn add(&self, other: u32) -> Self {
        Self(self.0.saturating_add(other))
    }
    pub fn subtract(&self, other: u32) -> Option<Self> {
        if other > self.0 {
            None
        } else {
            Some(Self(self.0 - other))
        }
    }
    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_money_add() {
        let a = Money::usd(Decimal::new(100, 0));
        let b = Money::usd(Decimal::new(50, 0));
        assert_eq!(a.add(&b).unwrap().amount(), Decimal::new(150, 0));
    }

    #[test]
    fn test_money_currency_mismatch() {
        let a = Money::usd(Decimal::new(10, 0));
        let b = Money::new(Decimal::new(10, 0), "EUR");
        assert!(a.add(&b).is_err());
    }

    #[test]
    fn test_money_multiply() {
        let price = Money::usd(Decimal::new(1050, 2));
        assert_eq!(price.multiply(3).amount(), Decimal::new(3150, 2));
    }

    #[test]
    fn test_quantity_subtract() {
        let q = Quantity::new(5);
        assert_eq!(q.subtract(3), Some(Quantity::new(2)));
        assert_eq!(q.subtract(6), None);
    }
}
