//! Textual channel addresses of the form `<board>/<kind><index>`, e.g. `0/ai3`.
//!
//! The driver itself only knows `(board number, channel)` pairs; the address form is what the
//! command-line tool and configuration files use to name one input or output.
//!
//! ```
//! use ulcore_backend::channel::*;
//!
//! let addr: ChannelAddr = "1/ao0".parse().unwrap();
//! assert_eq!((addr.board_num, addr.kind, addr.index), (1, ChannelKind::AO, 0));
//! assert_eq!(addr.to_string(), "1/ao0");
//! ```

use regex::Regex;
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use crate::error::{ErrorCode, UlError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChannelKind {
    AI,
    AO,
    CTR,
    TEMP,
}

impl ChannelKind {
    pub fn prefix(self) -> &'static str {
        match self {
            ChannelKind::AI => "ai",
            ChannelKind::AO => "ao",
            ChannelKind::CTR => "ctr",
            ChannelKind::TEMP => "temp",
        }
    }

    /// Error code the driver uses for an invalid channel of this kind.
    pub fn bad_channel_code(self) -> ErrorCode {
        match self {
            ChannelKind::AI | ChannelKind::TEMP => ErrorCode::BADADCHAN,
            ChannelKind::AO => ErrorCode::BADDACHAN,
            ChannelKind::CTR => ErrorCode::BADCOUNTERDEVNUM,
        }
    }

    fn from_prefix(prefix: &str) -> Option<Self> {
        match prefix.to_ascii_lowercase().as_str() {
            "ai" => Some(ChannelKind::AI),
            "ao" => Some(ChannelKind::AO),
            "ctr" => Some(ChannelKind::CTR),
            "temp" => Some(ChannelKind::TEMP),
            _ => None,
        }
    }
}

impl fmt::Display for ChannelKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.prefix())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChannelAddr {
    pub board_num: i32,
    pub kind: ChannelKind,
    pub index: i32,
}

impl ChannelAddr {
    pub fn new(board_num: i32, kind: ChannelKind, index: i32) -> Self {
        Self { board_num, kind, index }
    }
}

impl fmt::Display for ChannelAddr {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}/{}{}", self.board_num, self.kind, self.index)
    }
}

fn addr_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(?:(?P<board>\d+)/)?(?P<kind>[A-Za-z]+)(?P<index>\d+)?$")
            .expect("channel address pattern is valid")
    })
}

impl FromStr for ChannelAddr {
    type Err = UlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let text = s.trim();
        let caps = addr_regex().captures(text).ok_or_else(|| {
            UlError::with_context(ErrorCode::BADOPTION, format!("malformed channel address '{}'", s))
        })?;
        let kind = ChannelKind::from_prefix(&caps["kind"]).ok_or_else(|| {
            UlError::with_context(ErrorCode::BADOPTION, format!("unknown channel kind in '{}'", s))
        })?;
        let malformed = |what: &str| {
            UlError::with_context(kind.bad_channel_code(), format!("{} in channel address '{}'", what, s))
        };
        let board_num = caps
            .name("board")
            .ok_or_else(|| malformed("missing board number"))?
            .as_str()
            .parse::<i32>()
            .map_err(|_| malformed("board number out of range"))?;
        let index = caps
            .name("index")
            .ok_or_else(|| malformed("missing channel index"))?
            .as_str()
            .parse::<i32>()
            .map_err(|_| malformed("channel index out of range"))?;
        Ok(ChannelAddr { board_num, kind, index })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid() {
        let addr: ChannelAddr = "0/ai3".parse().unwrap();
        assert_eq!(addr, ChannelAddr::new(0, ChannelKind::AI, 3));
        let addr: ChannelAddr = " 12/TEMP7 ".parse().unwrap();
        assert_eq!(addr, ChannelAddr::new(12, ChannelKind::TEMP, 7));
        let addr: ChannelAddr = "2/ctr1".parse().unwrap();
        assert_eq!(addr.to_string(), "2/ctr1");
    }

    #[test]
    fn test_missing_board() {
        let err = "ai3".parse::<ChannelAddr>().unwrap_err();
        assert!(err.is(ErrorCode::BADADCHAN));
        let err = "ao1".parse::<ChannelAddr>().unwrap_err();
        assert!(err.is(ErrorCode::BADDACHAN));
    }

    #[test]
    fn test_missing_index() {
        let err = "0/ctr".parse::<ChannelAddr>().unwrap_err();
        assert!(err.is(ErrorCode::BADCOUNTERDEVNUM));
    }

    #[test]
    fn test_unknown_kind() {
        assert!("0/xx1".parse::<ChannelAddr>().unwrap_err().is(ErrorCode::BADOPTION));
        assert!("0/ai-1".parse::<ChannelAddr>().unwrap_err().is(ErrorCode::BADOPTION));
    }
}
