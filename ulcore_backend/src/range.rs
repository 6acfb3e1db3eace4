//! Input/output range selectors.
//!
//! A [`UlRange`] is what the driver calls a "gain" argument: a code selecting the span of the
//! converter. Every member knows its driver code and its engineering-unit limits, which is all
//! that [`crate::convert`] needs to translate raw counts.
//!
//! ```
//! use ulcore_backend::range::UlRange;
//!
//! let range: UlRange = "bip10volts".parse().unwrap();
//! assert_eq!(range.code(), 1);
//! assert_eq!((range.min(), range.max()), (-10.0, 10.0));
//! assert_eq!(UlRange::from_code(101), Some(UlRange::UNI5VOLTS));
//! ```

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::error::{ErrorCode, UlError};

macro_rules! ul_ranges {
    ($($name:ident = ($code:literal, $min:literal, $max:literal),)*) => {
        /// Range selectors understood by the driver, with their engineering limits.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum UlRange {
            $($name,)*
        }

        impl UlRange {
            /// Every member of the table, including the `NOTUSED` and `UNKNOWN` markers.
            pub const TABLE: &'static [UlRange] = &[$(UlRange::$name,)*];

            pub fn code(self) -> i32 {
                match self {
                    $(UlRange::$name => $code,)*
                }
            }

            pub fn min(self) -> f64 {
                match self {
                    $(UlRange::$name => $min,)*
                }
            }

            pub fn max(self) -> f64 {
                match self {
                    $(UlRange::$name => $max,)*
                }
            }

            pub fn name(self) -> &'static str {
                match self {
                    $(UlRange::$name => stringify!($name),)*
                }
            }

            pub fn from_code(code: i32) -> Option<Self> {
                match code {
                    $($code => Some(UlRange::$name),)*
                    _ => None,
                }
            }
        }
    };
}

ul_ranges! {
    NOTUSED = (-2, 0.0, 0.0),
    UNKNOWN = (-1, 0.0, 0.0),
    BIP60VOLTS = (20, -60.0, 60.0),
    BIP30VOLTS = (23, -30.0, 30.0),
    BIP20VOLTS = (15, -20.0, 20.0),
    BIP15VOLTS = (21, -15.0, 15.0),
    BIP10VOLTS = (1, -10.0, 10.0),
    BIP5VOLTS = (0, -5.0, 5.0),
    BIP4VOLTS = (16, -4.0, 4.0),
    BIP2PT5VOLTS = (2, -2.5, 2.5),
    BIP2VOLTS = (14, -2.0, 2.0),
    BIP1PT25VOLTS = (3, -1.25, 1.25),
    BIP1VOLTS = (4, -1.0, 1.0),
    BIPPT625VOLTS = (5, -0.625, 0.625),
    BIPPT5VOLTS = (6, -0.5, 0.5),
    BIPPT25VOLTS = (12, -0.25, 0.25),
    BIPPT2VOLTS = (13, -0.2, 0.2),
    BIPPT1VOLTS = (7, -0.1, 0.1),
    BIPPT05VOLTS = (8, -0.05, 0.05),
    BIPPT01VOLTS = (9, -0.01, 0.01),
    BIPPT005VOLTS = (10, -0.005, 0.005),
    BIP1PT67VOLTS = (11, -1.67, 1.67),
    BIPPT312VOLTS = (17, -0.312, 0.312),
    BIPPT156VOLTS = (18, -0.156, 0.156),
    BIPPT125VOLTS = (22, -0.125, 0.125),
    BIPPT078VOLTS = (19, -0.078, 0.078),
    UNI10VOLTS = (100, 0.0, 10.0),
    UNI5VOLTS = (101, 0.0, 5.0),
    UNI4VOLTS = (114, 0.0, 4.0),
    UNI2PT5VOLTS = (102, 0.0, 2.5),
    UNI2VOLTS = (103, 0.0, 2.0),
    UNI1PT67VOLTS = (109, 0.0, 1.67),
    UNI1PT25VOLTS = (104, 0.0, 1.25),
    UNI1VOLTS = (105, 0.0, 1.0),
    UNIPT5VOLTS = (110, 0.0, 0.5),
    UNIPT25VOLTS = (111, 0.0, 0.25),
    UNIPT2VOLTS = (112, 0.0, 0.2),
    UNIPT1VOLTS = (106, 0.0, 0.1),
    UNIPT05VOLTS = (113, 0.0, 0.05),
    UNIPT02VOLTS = (108, 0.0, 0.02),
    UNIPT01VOLTS = (107, 0.0, 0.01),
    MA4TO20 = (200, 4.0, 20.0),
    MA2TO10 = (201, 2.0, 10.0),
    MA1TO5 = (202, 1.0, 5.0),
    MAPT5TO2PT5 = (203, 0.5, 2.5),
    MA0TO20 = (204, 0.0, 20.0),
    BIPPT025AMPS = (205, -25.0, 25.0),
    BIPPT025VOLTSPERVOLT = (400, -0.025, 0.025),
}

impl UlRange {
    /// Selectable ranges: the table without the `NOTUSED`/`UNKNOWN` markers.
    pub fn all() -> impl Iterator<Item = UlRange> {
        Self::TABLE.iter().copied().filter(|r| r.is_selectable())
    }

    pub fn is_selectable(self) -> bool {
        !matches!(self, UlRange::NOTUSED | UlRange::UNKNOWN)
    }

    pub fn span(self) -> f64 {
        self.max() - self.min()
    }

    pub fn is_bipolar(self) -> bool {
        self.min() < 0.0
    }

    /// Clamps an engineering value into the range limits.
    pub fn clamp(self, value: f64) -> f64 {
        value.max(self.min()).min(self.max())
    }

    pub fn contains(self, value: f64) -> bool {
        value >= self.min() && value <= self.max()
    }

    /// Looks up a driver code, failing with `BADRANGE` for codes outside the table.
    pub fn try_from_code(code: i32) -> Result<Self, UlError> {
        Self::from_code(code)
            .ok_or_else(|| UlError::with_context(ErrorCode::BADRANGE, format!("range code {}", code)))
    }
}

impl fmt::Display for UlRange {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for UlRange {
    type Err = UlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::TABLE
            .iter()
            .copied()
            .find(|r| r.name().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| UlError::with_context(ErrorCode::BADRANGE, format!("unknown range '{}'", s)))
    }
}

impl TryFrom<i32> for UlRange {
    type Error = UlError;

    fn try_from(code: i32) -> Result<Self, Self::Error> {
        Self::try_from_code(code)
    }
}

impl Serialize for UlRange {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

impl<'de> Deserialize<'de> for UlRange {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        name.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_are_unique() {
        for (i, a) in UlRange::TABLE.iter().enumerate() {
            for b in &UlRange::TABLE[i + 1..] {
                assert_ne!(a.code(), b.code(), "{} and {} share a code", a, b);
            }
        }
    }

    #[test]
    fn test_lookup() {
        assert_eq!(UlRange::from_code(0), Some(UlRange::BIP5VOLTS));
        assert_eq!(UlRange::from_code(400), Some(UlRange::BIPPT025VOLTSPERVOLT));
        assert_eq!(UlRange::from_code(999), None);
        let err = UlRange::try_from(999).unwrap_err();
        assert!(err.is(ErrorCode::BADRANGE));
    }

    #[test]
    fn test_span_and_polarity() {
        assert_eq!(UlRange::BIP10VOLTS.span(), 20.0);
        assert!(UlRange::BIP10VOLTS.is_bipolar());
        assert!(!UlRange::UNI10VOLTS.is_bipolar());
        assert_eq!(UlRange::MA4TO20.span(), 16.0);
        assert_eq!(UlRange::UNI5VOLTS.clamp(7.0), 5.0);
        assert_eq!(UlRange::UNI5VOLTS.clamp(-1.0), 0.0);
    }

    #[test]
    fn test_selectable() {
        assert!(UlRange::all().all(|r| r.span() > 0.0));
        assert_eq!(UlRange::all().count(), UlRange::TABLE.len() - 2);
    }

    #[test]
    fn test_parse() {
        assert_eq!("UNI10VOLTS".parse::<UlRange>().unwrap(), UlRange::UNI10VOLTS);
        assert_eq!(" ma4to20 ".parse::<UlRange>().unwrap(), UlRange::MA4TO20);
        assert!("TENVOLTS".parse::<UlRange>().is_err());
    }
}
