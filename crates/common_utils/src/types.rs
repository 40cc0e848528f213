//! Types that can be used in other crates
use std::fmt::Display;

use error_stack::report;
use serde::{Deserialize, Serialize};

use crate::{
    consts,
    errors::{CustomResult, ParsingError},
};

/// This Unit struct represents MinorUnit in which core amount works
#[derive(
    Default, Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord,
)]
#[serde(transparent)]
pub struct MinorUnit(i64);

impl MinorUnit {
    /// gets amount as i64 value
    pub fn get_amount_as_i64(&self) -> i64 {
        self.0
    }

    /// forms a new minor unit from amount
    pub fn new(value: i64) -> Self {
        Self(value)
    }

    /// Zero amount, used when a gateway reports something unreadable
    pub fn zero() -> Self {
        Self(0)
    }

    /// Convert the amount to its major denomination and return String (`1234` -> `"12.34"`)
    fn to_major_unit_as_string(self) -> CustomResult<StringMajorUnit, ParsingError> {
        let amount = u64::try_from(self.0).map_err(|_| {
            report!(ParsingError::AmountConversionFailed {
                value: self.0.to_string()
            })
        })?;
        let per_major = consts::CNY_MINOR_UNITS_PER_MAJOR.unsigned_abs();
        Ok(StringMajorUnit::new(format!(
            "{}.{:02}",
            amount / per_major,
            amount % per_major
        )))
    }

    /// Convert the amount to a String of minor units (`1234` -> `"1234"`)
    fn to_minor_unit_as_string(self) -> CustomResult<StringMinorUnit, ParsingError> {
        if self.0 < 0 {
            return Err(report!(ParsingError::AmountConversionFailed {
                value: self.0.to_string()
            }));
        }
        Ok(StringMinorUnit::new(self.0.to_string()))
    }
}

impl Display for MinorUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Amount in major units as a decimal string, e.g. Alipay's `total_amount`
#[derive(Default, Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
#[serde(transparent)]
pub struct StringMajorUnit(String);

impl StringMajorUnit {
    /// forms a new major unit from amount
    pub fn new(value: String) -> Self {
        Self(value)
    }

    /// Get the inner string
    pub fn get_amount_as_string(&self) -> String {
        self.0.clone()
    }

    /// Parse the decimal string back into minor units.
    ///
    /// Digits beyond the second decimal place are truncated.
    fn to_minor_unit_as_i64(&self) -> CustomResult<MinorUnit, ParsingError> {
        let conversion_error = || {
            report!(ParsingError::AmountConversionFailed {
                value: self.0.clone()
            })
        };
        let trimmed = self.0.trim();
        let (negative, unsigned) = match trimmed.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, trimmed),
        };
        let (whole, fraction) = unsigned.split_once('.').unwrap_or((unsigned, ""));
        let is_digits = |part: &str| part.chars().all(|c| c.is_ascii_digit());
        if whole.is_empty() || !is_digits(whole) || !is_digits(fraction) {
            return Err(conversion_error());
        }

        let whole: i64 = whole.parse().map_err(|_| conversion_error())?;
        let cents = fraction
            .chars()
            .chain(std::iter::repeat('0'))
            .take(2)
            .collect::<String>()
            .parse::<i64>()
            .map_err(|_| conversion_error())?;

        let amount = whole
            .checked_mul(consts::CNY_MINOR_UNITS_PER_MAJOR)
            .and_then(|amount| amount.checked_add(cents))
            .ok_or_else(|| report!(ParsingError::IntegerOverflow("major unit amount")))?;
        Ok(MinorUnit::new(if negative { -amount } else { amount }))
    }
}

impl Display for StringMajorUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Amount in minor units as a string, e.g. WeChat Pay's `total_fee`
#[derive(Default, Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
#[serde(transparent)]
pub struct StringMinorUnit(String);

impl StringMinorUnit {
    /// forms a new minor unit string from amount
    pub fn new(value: String) -> Self {
        Self(value)
    }

    /// Get the inner string
    pub fn get_amount_as_string(&self) -> String {
        self.0.clone()
    }

    fn to_minor_unit_as_i64(&self) -> CustomResult<MinorUnit, ParsingError> {
        self.0.trim().parse::<i64>().map(MinorUnit::new).map_err(|_| {
            report!(ParsingError::AmountConversionFailed {
                value: self.0.clone()
            })
        })
    }
}

impl Display for StringMinorUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Converts between the core [`MinorUnit`] and the representation a gateway expects
pub trait AmountConvertor: Send {
    /// Gateway side representation
    type Output;
    /// Convert a core amount to the gateway representation
    fn convert(&self, amount: MinorUnit) -> CustomResult<Self::Output, ParsingError>;
    /// Convert a gateway amount back to the core representation
    fn convert_back(&self, amount: Self::Output) -> CustomResult<MinorUnit, ParsingError>;
}

/// Connector required amount type
#[derive(Default, Debug, Clone, Copy, PartialEq)]
pub struct StringMajorUnitForConnector;

impl AmountConvertor for StringMajorUnitForConnector {
    type Output = StringMajorUnit;
    fn convert(&self, amount: MinorUnit) -> CustomResult<Self::Output, ParsingError> {
        amount.to_major_unit_as_string()
    }

    fn convert_back(&self, amount: StringMajorUnit) -> CustomResult<MinorUnit, ParsingError> {
        amount.to_minor_unit_as_i64()
    }
}

/// Connector required amount type
#[derive(Default, Debug, Clone, Copy, PartialEq)]
pub struct StringMinorUnitForConnector;

impl AmountConvertor for StringMinorUnitForConnector {
    type Output = StringMinorUnit;
    fn convert(&self, amount: MinorUnit) -> CustomResult<Self::Output, ParsingError> {
        amount.to_minor_unit_as_string()
    }

    fn convert_back(&self, amount: StringMinorUnit) -> CustomResult<MinorUnit, ParsingError> {
        amount.to_minor_unit_as_i64()
    }
}
