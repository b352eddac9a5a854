//! Fixed-precision money.
//!
//! Amounts are integer minor units (paise, cents) tagged with a currency.
//! Arithmetic never mixes currencies and never touches floating point.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use utoipa::ToSchema;

use crate::core::errors::MoneyError;

#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, ToSchema, PartialEq, Eq, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    #[default]
    Inr,
    Usd,
    Eur,
    Gbp,
    Jpy,
}

impl Currency {
    pub fn code(&self) -> &'static str {
        match self {
            Currency::Inr => "INR",
            Currency::Usd => "USD",
            Currency::Eur => "EUR",
            Currency::Gbp => "GBP",
            Currency::Jpy => "JPY",
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            Currency::Inr => "Rs. ",
            Currency::Usd => "$",
            Currency::Eur => "€",
            Currency::Gbp => "£",
            Currency::Jpy => "¥",
        }
    }

    /// Number of fractional digits in a major unit.
    pub fn exponent(&self) -> u32 {
        match self {
            Currency::Jpy => 0,
            _ => 2,
        }
    }

    pub fn minor_per_major(&self) -> i64 {
        10_i64.pow(self.exponent())
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl FromStr for Currency {
    type Err = MoneyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "INR" => Ok(Currency::Inr),
            "USD" => Ok(Currency::Usd),
            "EUR" => Ok(Currency::Eur),
            "GBP" => Ok(Currency::Gbp),
            "JPY" => Ok(Currency::Jpy),
            _ => Err(MoneyError::Parse(s.to_string())),
        }
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, ToSchema, PartialEq, Eq, Hash)]
pub struct Money {
    minor_units: i64,
    currency: Currency,
}

impl Money {
    pub const fn new(minor_units: i64, currency: Currency) -> Self {
        Self { minor_units, currency }
    }

    pub const fn zero(currency: Currency) -> Self {
        Self::new(0, currency)
    }

    pub const fn minor_units(&self) -> i64 {
        self.minor_units
    }

    pub const fn currency(&self) -> Currency {
        self.currency
    }

    pub const fn is_zero(&self) -> bool {
        self.minor_units == 0
    }

    pub const fn is_positive(&self) -> bool {
        self.minor_units > 0
    }

    pub const fn is_negative(&self) -> bool {
        self.minor_units < 0
    }

    fn same_currency(&self, other: &Money) -> Result<(), MoneyError> {
        if self.currency != other.currency {
            return Err(MoneyError::CurrencyMismatch {
                expected: self.currency,
                found: other.currency,
            });
        }
        Ok(())
    }

    pub fn add(self, other: Money) -> Result<Money, MoneyError> {
        self.same_currency(&other)?;
        let units = self
            .minor_units
            .checked_add(other.minor_units)
            .ok_or(MoneyError::Overflow)?;
        Ok(Money::new(units, self.currency))
    }

    pub fn subtract(self, other: Money) -> Result<Money, MoneyError> {
        self.same_currency(&other)?;
        let units = self
            .minor_units
            .checked_sub(other.minor_units)
            .ok_or(MoneyError::Overflow)?;
        Ok(Money::new(units, self.currency))
    }

    pub fn negate(self) -> Result<Money, MoneyError> {
        let units = self.minor_units.checked_neg().ok_or(MoneyError::Overflow)?;
        Ok(Money::new(units, self.currency))
    }

    /// Splits into `n` equal shares, returning the share and the leftover
    /// minor units (`0 <= remainder < n`) so that `share * n + remainder == self`.
    pub fn divide_evenly(self, n: i64) -> Result<(Money, i64), MoneyError> {
        if n <= 0 {
            return Err(MoneyError::InvalidSplit(n));
        }
        let share = self.minor_units.div_euclid(n);
        let remainder = self.minor_units.rem_euclid(n);
        Ok((Money::new(share, self.currency), remainder))
    }

    /// Compares two amounts of the same currency.
    pub fn try_cmp(&self, other: &Money) -> Result<Ordering, MoneyError> {
        self.same_currency(other)?;
        Ok(self.minor_units.cmp(&other.minor_units))
    }

    /// Parses a major-unit decimal such as `"100"`, `"12.5"` or `"12.50"`.
    ///
    /// More fractional digits than the currency carries is rejected rather
    /// than rounded.
    pub fn parse(input: &str, currency: Currency) -> Result<Money, MoneyError> {
        let text = input.trim();
        let invalid = || MoneyError::Parse(input.to_string());

        let (negative, digits) = match text.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, text),
        };
        let (whole, fraction) = match digits.split_once('.') {
            Some((whole, fraction)) => (whole, fraction),
            None => (digits, ""),
        };

        let exponent = currency.exponent() as usize;
        if whole.is_empty() || fraction.len() > exponent || (digits.contains('.') && fraction.is_empty()) {
            return Err(invalid());
        }
        if !whole.chars().all(|c| c.is_ascii_digit()) || !fraction.chars().all(|c| c.is_ascii_digit()) {
            return Err(invalid());
        }

        let whole: i64 = whole.parse().map_err(|_| invalid())?;
        let mut minor = whole
            .checked_mul(currency.minor_per_major())
            .ok_or(MoneyError::Overflow)?;
        if !fraction.is_empty() {
            let padded = format!("{:0<width$}", fraction, width = exponent);
            let fraction: i64 = padded.parse().map_err(|_| invalid())?;
            minor = minor.checked_add(fraction).ok_or(MoneyError::Overflow)?;
        }

        Ok(Money::new(if negative { -minor } else { minor }, currency))
    }
}

impl PartialOrd for Money {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        self.try_cmp(other).ok()
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.is_negative() { "-" } else { "" };
        let per_major = self.currency.minor_per_major();
        let units = self.minor_units.unsigned_abs();
        let whole = units / per_major as u64;
        let fraction = units % per_major as u64;
        match self.currency.exponent() {
            0 => write!(f, "{}{}{}", sign, self.currency.symbol(), whole),
            exponent => write!(
                f,
                "{}{}{}.{:0width$}",
                sign,
                self.currency.symbol(),
                whole,
                fraction,
                width = exponent as usize
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inr(units: i64) -> Money {
        Money::new(units, Currency::Inr)
    }

    #[test]
    fn divide_evenly_returns_share_and_remainder() {
        let (share, remainder) = inr(100).divide_evenly(3).unwrap();
        assert_eq!(share, inr(33));
        assert_eq!(remainder, 1);
    }

    #[test]
    fn divide_evenly_rejects_non_positive_counts() {
        assert_eq!(inr(100).divide_evenly(0), Err(MoneyError::InvalidSplit(0)));
        assert_eq!(inr(100).divide_evenly(-2), Err(MoneyError::InvalidSplit(-2)));
    }

    #[test]
    fn mixing_currencies_fails() {
        let err = inr(10).add(Money::new(10, Currency::Usd)).unwrap_err();
        assert_eq!(
            err,
            MoneyError::CurrencyMismatch {
                expected: Currency::Inr,
                found: Currency::Usd
            }
        );
        assert!(inr(10).partial_cmp(&Money::new(10, Currency::Usd)).is_none());
    }

    #[test]
    fn arithmetic_is_exact() {
        assert_eq!(inr(10).add(inr(5)).unwrap(), inr(15));
        assert_eq!(inr(10).subtract(inr(15)).unwrap(), inr(-5));
        assert_eq!(inr(7).negate().unwrap(), inr(-7));
        assert_eq!(Money::new(i64::MAX, Currency::Inr).add(inr(1)), Err(MoneyError::Overflow));
    }

    #[test]
    fn parses_major_unit_decimals() {
        assert_eq!(Money::parse("100", Currency::Inr).unwrap(), inr(10_000));
        assert_eq!(Money::parse("12.5", Currency::Inr).unwrap(), inr(1_250));
        assert_eq!(Money::parse(" 12.05 ", Currency::Inr).unwrap(), inr(1_205));
        assert_eq!(Money::parse("-3.10", Currency::Inr).unwrap(), inr(-310));
        assert_eq!(Money::parse("500", Currency::Jpy).unwrap(), Money::new(500, Currency::Jpy));
    }

    #[test]
    fn parse_rejects_excess_precision_and_garbage() {
        assert!(Money::parse("1.005", Currency::Inr).is_err());
        assert!(Money::parse("1.5", Currency::Jpy).is_err());
        assert!(Money::parse("abc", Currency::Inr).is_err());
        assert!(Money::parse("1.", Currency::Inr).is_err());
        assert!(Money::parse("", Currency::Inr).is_err());
    }

    #[test]
    fn displays_with_symbol() {
        assert_eq!(inr(6_600).to_string(), "Rs. 66.00");
        assert_eq!(inr(-3_305).to_string(), "-Rs. 33.05");
        assert_eq!(Money::new(42, Currency::Jpy).to_string(), "¥42");
    }

    #[test]
    fn currency_codes_round_trip_through_from_str() {
        assert_eq!("inr".parse::<Currency>().unwrap(), Currency::Inr);
        assert_eq!("JPY".parse::<Currency>().unwrap(), Currency::Jpy);
        assert!("XYZ".parse::<Currency>().is_err());
    }
}
