//! Money value objects: currency codes, amounts with explicit units, and display.
//!
//! The storefront prices plans in whole meticais (e.g. `199` means 199 MZN) and
//! the gateway accepts the same whole-unit integers. Amounts therefore carry
//! their unit explicitly instead of having it inferred from magnitude.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::foundation::ValidationError;

/// Threshold used by the legacy display heuristic in [`format_amount`].
pub const LEGACY_MINOR_UNIT_THRESHOLD: i64 = 1000;

/// ISO-4217 style three-letter currency code.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Currency(String);

impl Currency {
    /// Parses a currency code. Input is upper-cased before validation.
    pub fn new(code: impl AsRef<str>) -> Result<Self, ValidationError> {
        let code = code.as_ref().trim().to_ascii_uppercase();
        if code.is_empty() {
            return Err(ValidationError::empty_field("currency"));
        }
        if code.len() != 3 || !code.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(ValidationError::invalid_format(
                "currency",
                format!("expected a three-letter code, got '{}'", code),
            ));
        }
        Ok(Self(code))
    }

    /// Mozambican metical, the only currency this deployment sells in.
    pub fn mzn() -> Self {
        Self("MZN".to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for Currency {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Currency::new(value)
    }
}

impl From<Currency> for String {
    fn from(currency: Currency) -> Self {
        currency.0
    }
}

/// Unit an [`Amount`] value is expressed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AmountUnit {
    /// Whole currency units (199 = 199 MZN).
    Major,
    /// Hundredths of a unit (19900 = 199 MZN).
    Minor,
}

/// A monetary amount with an explicit unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Amount {
    value: i64,
    unit: AmountUnit,
}

impl Amount {
    /// Amount in whole currency units.
    pub fn whole(value: i64) -> Self {
        Self {
            value,
            unit: AmountUnit::Major,
        }
    }

    /// Amount in minor units (hundredths).
    pub fn minor(value: i64) -> Self {
        Self {
            value,
            unit: AmountUnit::Minor,
        }
    }

    /// Whole-unit amount that must be strictly positive, as required for
    /// payment creation.
    pub fn positive_whole(value: i64) -> Result<Self, ValidationError> {
        if value <= 0 {
            return Err(ValidationError::not_positive("amount", value));
        }
        Ok(Self::whole(value))
    }

    pub fn value(&self) -> i64 {
        self.value
    }

    pub fn unit(&self) -> AmountUnit {
        self.unit
    }

    /// The amount expressed in minor units.
    pub fn in_minor_units(&self) -> i64 {
        match self.unit {
            AmountUnit::Major => self.value.saturating_mul(100),
            AmountUnit::Minor => self.value,
        }
    }

    /// The whole-unit value the gateway expects, truncating any fraction.
    pub fn in_whole_units(&self) -> i64 {
        match self.unit {
            AmountUnit::Major => self.value,
            AmountUnit::Minor => self.value / 100,
        }
    }

    /// Formats the amount for display using its declared unit.
    pub fn display(&self, currency: &Currency) -> String {
        format_minor(self.in_minor_units(), currency)
    }
}

/// Legacy storefront formatter.
///
/// Values below [`LEGACY_MINOR_UNIT_THRESHOLD`] are read as whole units and
/// everything else as minor units, so `199` and `19900` render identically.
/// Kept for pages that still pass raw integers; new code should use
/// [`Amount::display`].
pub fn format_amount(amount: i64, currency: &Currency) -> String {
    if amount < LEGACY_MINOR_UNIT_THRESHOLD {
        Amount::whole(amount).display(currency)
    } else {
        Amount::minor(amount).display(currency)
    }
}

fn format_minor(minor: i64, currency: &Currency) -> String {
    let sign = if minor < 0 { "-" } else { "" };
    let abs = minor.unsigned_abs();
    format!("{}{}.{:02} {}", sign, abs / 100, abs % 100, currency)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn currency_normalizes_case() {
        assert_eq!(Currency::new("mzn").unwrap(), Currency::mzn());
    }

    #[test]
    fn currency_rejects_bad_codes() {
        assert!(Currency::new("").is_err());
        assert!(Currency::new("MZ").is_err());
        assert!(Currency::new("M2N").is_err());
        assert!(Currency::new("METICAL").is_err());
    }

    #[test]
    fn currency_deserializes_through_validation() {
        let ok: Currency = serde_json::from_str("\"usd\"").unwrap();
        assert_eq!(ok.as_str(), "USD");
        assert!(serde_json::from_str::<Currency>("\"dollars\"").is_err());
    }

    #[test]
    fn positive_whole_rejects_zero_and_negative() {
        assert!(Amount::positive_whole(0).is_err());
        assert!(Amount::positive_whole(-199).is_err());
        assert_eq!(Amount::positive_whole(199).unwrap().value(), 199);
    }

    #[test]
    fn explicit_units_never_guess() {
        let mzn = Currency::mzn();
        assert_eq!(Amount::whole(199).display(&mzn), "199.00 MZN");
        assert_eq!(Amount::whole(19900).display(&mzn), "19900.00 MZN");
        assert_eq!(Amount::minor(19950).display(&mzn), "199.50 MZN");
    }

    #[test]
    fn unit_conversions() {
        assert_eq!(Amount::whole(499).in_minor_units(), 49900);
        assert_eq!(Amount::minor(49950).in_whole_units(), 499);
    }

    // The legacy heuristic treats 199 as whole units and 19900 as minor units.
    // Both render as 199.00 even though the inputs differ by a factor of 100.
    #[test]
    fn legacy_format_pins_sub_thousand_boundary() {
        let mzn = Currency::mzn();
        assert_eq!(format_amount(199, &mzn), "199.00 MZN");
        assert_eq!(format_amount(199 * 100, &mzn), "199.00 MZN");
        assert_eq!(format_amount(999, &mzn), "999.00 MZN");
        assert_eq!(format_amount(1000, &mzn), "10.00 MZN");
        assert_eq!(format_amount(1999, &mzn), "19.99 MZN");
    }

    #[test]
    fn legacy_format_disagrees_with_explicit_units_above_threshold() {
        let mzn = Currency::mzn();
        assert_ne!(format_amount(1500, &mzn), Amount::whole(1500).display(&mzn));
        assert_eq!(format_amount(1500, &mzn), Amount::minor(1500).display(&mzn));
    }

    proptest! {
        #[test]
        fn legacy_format_matches_whole_units_below_threshold(amount in 0i64..LEGACY_MINOR_UNIT_THRESHOLD) {
            let mzn = Currency::mzn();
            prop_assert_eq!(format_amount(amount, &mzn), Amount::whole(amount).display(&mzn));
        }

        #[test]
        fn legacy_format_matches_minor_units_from_threshold(amount in LEGACY_MINOR_UNIT_THRESHOLD..10_000_000i64) {
            let mzn = Currency::mzn();
            prop_assert_eq!(format_amount(amount, &mzn), Amount::minor(amount).display(&mzn));
        }
    }
}
