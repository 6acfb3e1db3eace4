//! TOML configuration of the binding and of the simulated boards.
//!
//! ```toml
//! [library]
//! backend = "simulated"          # or "native"
//! error_log = "ul_error.log"
//! ignore_instacal = false
//!
//! [stream]
//! buffer_ms = 100.0
//! poll_ms = 10
//!
//! [[board]]
//! board_num = 0
//! product_name = "USB-1608FS-Plus"
//! ai_channels = 8
//! ai_ranges = ["BIP10VOLTS", "BIP5VOLTS"]
//!
//! [board.signals]
//! 0 = { kind = "const", value = 1.25 }
//! ```
//!
//! Every section and most fields are optional; see the `default_*` functions for the values
//! used when a field is omitted. `[[board]]` tables are only read by the simulated backend.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::convert::MAX_RESOLUTION;
use crate::enums::{ChannelType, DigitalPortType};
use crate::error::ConfigError;
use crate::options::{EventType, InterfaceType};
use crate::range::UlRange;
use crate::signal::Signal;

/// Temperature reported by simulated temperature channels without a configured signal.
pub const DEFAULT_TEMPERATURE_C: f64 = 22.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    #[default]
    Simulated,
    Native,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct UlConfig {
    #[serde(default)]
    pub library: LibraryConfig,
    #[serde(default)]
    pub stream: StreamConfig,
    #[serde(default, rename = "board")]
    pub boards: Vec<BoardConfig>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LibraryConfig {
    #[serde(default)]
    pub backend: Backend,
    /// Driver errors are appended to this file when set.
    #[serde(default)]
    pub error_log: Option<PathBuf>,
    /// Use runtime discovery instead of the stored board configuration.
    #[serde(default)]
    pub ignore_instacal: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamConfig {
    #[serde(default = "default_buffer_ms")]
    pub buffer_ms: f64,
    #[serde(default = "default_poll_ms")]
    pub poll_ms: u64,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            buffer_ms: default_buffer_ms(),
            poll_ms: default_poll_ms(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DioPortConfig {
    pub port: DigitalPortType,
    #[serde(default = "default_port_bits")]
    pub bits: u32,
}

/// One simulated board.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoardConfig {
    pub board_num: i32,
    pub product_name: String,
    #[serde(default)]
    pub product_id: u32,
    #[serde(default)]
    pub unique_id: String,
    #[serde(default = "default_interface")]
    pub interface: InterfaceType,
    /// Bound to `board_num` at start-up. When false the board only shows up in the device
    /// inventory until it is created.
    #[serde(default = "default_true")]
    pub installed: bool,
    #[serde(default = "default_resolution")]
    pub ad_resolution: u32,
    #[serde(default)]
    pub ai_channels: u32,
    #[serde(default)]
    pub ai_ranges: Vec<UlRange>,
    #[serde(default = "default_resolution")]
    pub da_resolution: u32,
    #[serde(default)]
    pub ao_channels: u32,
    #[serde(default)]
    pub ao_ranges: Vec<UlRange>,
    #[serde(default)]
    pub dio_ports: Vec<DioPortConfig>,
    #[serde(default)]
    pub counters: u32,
    #[serde(default)]
    pub temp_channels: u32,
    /// Whether `a_load_queue` is accepted.
    #[serde(default)]
    pub gain_queue: bool,
    /// Channel types a DAQ input scan can mix; empty on boards without DAQ input scans.
    #[serde(default)]
    pub daqi_chan_types: Vec<ChannelType>,
    #[serde(default)]
    pub daqo_chan_types: Vec<ChannelType>,
    /// Events the board can signal.
    #[serde(default = "EventType::empty")]
    pub events: EventType,
    /// Highest aggregate scan rate in samples per second.
    #[serde(default = "default_max_rate")]
    pub max_rate: f64,
    /// Analog input waveforms, keyed by channel index.
    #[serde(default)]
    pub signals: IndexMap<String, Signal>,
    /// Temperature waveforms in degrees Celsius, keyed by channel index.
    #[serde(default)]
    pub temperatures: IndexMap<String, Signal>,
}

fn default_buffer_ms() -> f64 {
    100.0
}

fn default_poll_ms() -> u64 {
    10
}

fn default_port_bits() -> u32 {
    8
}

fn default_interface() -> InterfaceType {
    InterfaceType::USB
}

fn default_true() -> bool {
    true
}

fn default_resolution() -> u32 {
    16
}

fn default_max_rate() -> f64 {
    100_000.0
}

impl UlConfig {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path.as_ref())?;
        tracing::debug!("loaded configuration from {}", path.as_ref().display());
        Self::from_toml_str(&text)
    }

    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: UlConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Simulated backend with a single demo board at board number 0.
    pub fn demo() -> Self {
        Self {
            boards: vec![BoardConfig::demo(0)],
            ..Default::default()
        }
    }

    pub fn board(&self, board_num: i32) -> Option<&BoardConfig> {
        self.boards.iter().find(|b| b.board_num == board_num)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.stream.buffer_ms > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "stream.buffer_ms must be positive, got {}",
                self.stream.buffer_ms
            )));
        }
        if self.stream.poll_ms == 0 {
            return Err(ConfigError::Invalid("stream.poll_ms must be positive".to_string()));
        }
        let mut seen = HashSet::new();
        for board in &self.boards {
            if !seen.insert(board.board_num) {
                return Err(ConfigError::Invalid(format!(
                    "board number {} is configured more than once",
                    board.board_num
                )));
            }
            board.validate()?;
        }
        Ok(())
    }
}

impl BoardConfig {
    /// A 16-bit multifunction USB board with every subsystem populated.
    pub fn demo(board_num: i32) -> Self {
        let mut signals = IndexMap::new();
        signals.insert("0".to_string(), Signal::new_const(1.25));
        signals.insert("1".to_string(), Signal::new_sine(10.0, Some(2.0), None, None));
        signals.insert("2".to_string(), Signal::new_ramp(-5.0, 5.0, 1.0));
        Self {
            board_num,
            product_name: "USB-1608FS-Plus".to_string(),
            product_id: 234,
            unique_id: format!("01ABCD{:02X}", board_num),
            interface: InterfaceType::USB,
            installed: true,
            ad_resolution: 16,
            ai_channels: 8,
            ai_ranges: vec![
                UlRange::BIP10VOLTS,
                UlRange::BIP5VOLTS,
                UlRange::BIP2PT5VOLTS,
                UlRange::BIP1VOLTS,
            ],
            da_resolution: 16,
            ao_channels: 2,
            ao_ranges: vec![UlRange::UNI5VOLTS],
            dio_ports: vec![DioPortConfig {
                port: DigitalPortType::FIRSTPORTA,
                bits: 8,
            }],
            counters: 2,
            temp_channels: 0,
            gain_queue: true,
            daqi_chan_types: Vec::new(),
            daqo_chan_types: Vec::new(),
            events: EventType::ON_SCAN_ERROR | EventType::ON_DATA_AVAILABLE | EventType::ON_END_OF_AI_SCAN,
            max_rate: default_max_rate(),
            signals,
            temperatures: IndexMap::new(),
        }
    }

    fn invalid(&self, msg: impl std::fmt::Display) -> ConfigError {
        ConfigError::Invalid(format!("board {}: {}", self.board_num, msg))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, bits, chans, ranges) in [
            ("ad", self.ad_resolution, self.ai_channels, &self.ai_ranges),
            ("da", self.da_resolution, self.ao_channels, &self.ao_ranges),
        ] {
            if bits == 0 || bits > MAX_RESOLUTION {
                return Err(self.invalid(format!("{}_resolution {} is outside 1..=32", name, bits)));
            }
            if chans > 0 && ranges.is_empty() {
                return Err(self.invalid(format!("{} channels configured without ranges", name)));
            }
            if ranges.iter().any(|r| !r.is_selectable()) {
                return Err(self.invalid(format!("{} ranges may not contain NOTUSED/UNKNOWN", name)));
            }
        }
        let mut ports = HashSet::new();
        for port in &self.dio_ports {
            if !ports.insert(port.port) {
                return Err(self.invalid(format!("digital port {} listed twice", port.port)));
            }
            if port.bits == 0 || port.bits > 32 {
                return Err(self.invalid(format!("port {} has {} bits", port.port, port.bits)));
            }
        }
        if self.gain_queue && self.ai_channels == 0 {
            return Err(self.invalid("gain_queue needs analog inputs"));
        }
        if !(self.max_rate > 0.0) {
            return Err(self.invalid("max_rate must be positive"));
        }
        for (table, chans, signals) in [
            ("signals", self.ai_channels, &self.signals),
            ("temperatures", self.temp_channels, &self.temperatures),
        ] {
            for (key, signal) in signals {
                match key.parse::<u32>() {
                    Ok(chan) if chan < chans => {}
                    _ => return Err(self.invalid(format!("{} key '{}' is not a channel index", table, key))),
                }
                signal.validate().map_err(|e| self.invalid(e))?;
            }
        }
        Ok(())
    }

    /// Waveform driving analog input `chan`; unconfigured channels read 0.
    pub fn signal(&self, chan: u32) -> Signal {
        self.signals.get(&chan.to_string()).cloned().unwrap_or_default()
    }

    /// Temperature waveform of channel `chan` in degrees Celsius.
    pub fn temperature(&self, chan: u32) -> Signal {
        self.temperatures
            .get(&chan.to_string())
            .cloned()
            .unwrap_or(Signal::new_const(DEFAULT_TEMPERATURE_C))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SAMPLE: &str = r#"
        [library]
        backend = "simulated"
        error_log = "ul_error.log"

        [[board]]
        board_num = 0
        product_name = "USB-1608FS-Plus"
        product_id = 234
        ai_channels = 8
        ai_ranges = ["BIP10VOLTS", "bip5volts"]
        ao_channels = 2
        ao_ranges = ["UNI5VOLTS"]
        dio_ports = [{ port = "FIRSTPORTA" }, { port = "FIRSTPORTB", bits = 4 }]

        [board.signals]
        0 = { kind = "const", value = 1.25 }
        1 = { kind = "sine", freq = 10.0, amplitude = 2.0 }
    "#;

    #[test]
    fn test_parse_sample() {
        let config = UlConfig::from_toml_str(SAMPLE).unwrap();
        assert_eq!(config.library.backend, Backend::Simulated);
        assert_eq!(config.library.error_log, Some(PathBuf::from("ul_error.log")));
        assert_eq!(config.stream, StreamConfig::default());
        let board = config.board(0).unwrap();
        assert_eq!(board.ad_resolution, 16);
        assert_eq!(board.ai_ranges, vec![UlRange::BIP10VOLTS, UlRange::BIP5VOLTS]);
        assert_eq!(board.dio_ports[0].bits, 8);
        assert_eq!(board.dio_ports[1].bits, 4);
        assert_eq!(board.signal(0), Signal::new_const(1.25));
        assert_eq!(board.signal(5), Signal::new_const(0.0));
        assert!(board.installed);
    }

    #[test]
    fn test_empty_config_defaults() {
        let config = UlConfig::from_toml_str("").unwrap();
        assert_eq!(config, UlConfig::default());
        assert_eq!(config.stream.poll_ms, 10);
    }

    #[test]
    fn test_duplicate_board_rejected() {
        let text = r#"
            [[board]]
            board_num = 1
            product_name = "A"
            [[board]]
            board_num = 1
            product_name = "B"
        "#;
        assert!(matches!(UlConfig::from_toml_str(text), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_bad_resolution_rejected() {
        let text = r#"
            [[board]]
            board_num = 0
            product_name = "A"
            ad_resolution = 40
        "#;
        assert!(matches!(UlConfig::from_toml_str(text), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_missing_ranges_rejected() {
        let text = r#"
            [[board]]
            board_num = 0
            product_name = "A"
            ao_channels = 1
        "#;
        assert!(matches!(UlConfig::from_toml_str(text), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_signal_for_missing_channel_rejected() {
        let text = r#"
            [[board]]
            board_num = 0
            product_name = "A"
            ai_channels = 1
            ai_ranges = ["BIP10VOLTS"]
            [board.signals]
            3 = { kind = "const", value = 1.0 }
        "#;
        assert!(matches!(UlConfig::from_toml_str(text), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_daq_channel_types_and_events() {
        let text = r#"
            [[board]]
            board_num = 0
            product_name = "USB-2408"
            ai_channels = 8
            ai_ranges = ["BIP10VOLTS"]
            daqi_chan_types = ["ANALOG_DIFF", "CJC", "TC", "DIGITAL8", "CTR32LOW"]
            events = "ON_DATA_AVAILABLE | ON_END_OF_AI_SCAN"
        "#;
        let config = UlConfig::from_toml_str(text).unwrap();
        let board = config.board(0).unwrap();
        assert_eq!(board.daqi_chan_types.len(), 5);
        assert_eq!(board.daqi_chan_types[1], ChannelType::CJC);
        assert!(board.daqo_chan_types.is_empty());
        assert_eq!(board.events, EventType::ON_DATA_AVAILABLE | EventType::ON_END_OF_AI_SCAN);
        assert!(!board.gain_queue);
    }

    #[test]
    fn test_gain_queue_without_inputs_rejected() {
        let text = r#"
            [[board]]
            board_num = 0
            product_name = "A"
            gain_queue = true
        "#;
        assert!(matches!(UlConfig::from_toml_str(text), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_unknown_range_is_parse_error() {
        let text = r#"
            [[board]]
            board_num = 0
            product_name = "A"
            ai_ranges = ["BIP11VOLTS"]
        "#;
        assert!(matches!(UlConfig::from_toml_str(text), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();
        let config = UlConfig::from_file(file.path()).unwrap();
        assert_eq!(config.boards.len(), 1);
        assert!(matches!(
            UlConfig::from_file(file.path().with_extension("missing")),
            Err(ConfigError::Io(_))
        ));
    }

    #[test]
    fn test_demo_is_valid() {
        UlConfig::demo().validate().unwrap();
    }
}
