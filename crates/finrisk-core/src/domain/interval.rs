use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ValidationError;

/// Sampling frequency for price history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Interval {
    #[serde(rename = "1d")]
    Daily,
    #[serde(rename = "1wk")]
    Weekly,
    #[serde(rename = "1mo")]
    Monthly,
}

impl Interval {
    pub const ALL: [Self; 3] = [Self::Daily, Self::Weekly, Self::Monthly];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Daily => "1d",
            Self::Weekly => "1wk",
            Self::Monthly => "1mo",
        }
    }
}

impl Display for Interval {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Interval {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "1d" => Ok(Self::Daily),
            "1wk" => Ok(Self::Weekly),
            "1mo" => Ok(Self::Monthly),
            other => Err(ValidationError::InvalidInterval {
                value: other.to_owned(),
            }),
        }
    }
}

/// Trailing lookback such as `10y`, `6mo` or `30d`, counted back from today.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum TrailingRange {
    Days(u16),
    Months(u16),
    Years(u16),
}

impl TrailingRange {
    pub fn as_query(self) -> String {
        match self {
            Self::Days(n) => format!("{n}d"),
            Self::Months(n) => format!("{n}mo"),
            Self::Years(n) => format!("{n}y"),
        }
    }
}

impl FromStr for TrailingRange {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_lowercase();
        let invalid = || ValidationError::InvalidRange {
            value: value.to_owned(),
        };

        let split = normalized
            .find(|ch: char| !ch.is_ascii_digit())
            .ok_or_else(invalid)?;
        let (count, unit) = normalized.split_at(split);
        let count = count.parse::<u16>().map_err(|_| invalid())?;
        if count == 0 {
            return Err(invalid());
        }

        match unit {
            "d" => Ok(Self::Days(count)),
            "mo" => Ok(Self::Months(count)),
            "y" => Ok(Self::Years(count)),
            _ => Err(invalid()),
        }
    }
}

impl TryFrom<String> for TrailingRange {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<TrailingRange> for String {
    fn from(value: TrailingRange) -> Self {
        value.as_query()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_interval() {
        let interval = Interval::from_str("1wk").expect("must parse");
        assert_eq!(interval, Interval::Weekly);
    }

    #[test]
    fn rejects_invalid_interval() {
        let err = Interval::from_str("2h").expect_err("must fail");
        assert!(matches!(err, ValidationError::InvalidInterval { .. }));
    }

    #[test]
    fn parses_trailing_range() {
        assert_eq!("10y".parse::<TrailingRange>().expect("range"), TrailingRange::Years(10));
        assert_eq!("6MO".parse::<TrailingRange>().expect("range"), TrailingRange::Months(6));
        assert!("0y".parse::<TrailingRange>().is_err());
        assert!("y".parse::<TrailingRange>().is_err());
    }
}
