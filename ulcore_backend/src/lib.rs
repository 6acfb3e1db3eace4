//! # Universal Library core
//!
//! Hardware-free vocabulary of the Universal Library binding. Nothing in this crate talks to a
//! driver; it defines what the driver layer (`ulctrl_backend`) speaks:
//!
//! - [`error`]: the driver's error numbers, [`UlError`] (code + message) and configuration errors.
//! - [`range`]: range selectors and their engineering limits.
//! - [`enums`] and [`options`]: configuration items, port types, scan option flags and friends.
//! - [`convert`]: raw count to engineering unit conversion.
//! - [`descriptor`]: device descriptors returned by discovery.
//! - [`channel`]: `<board>/<kind><index>` channel addresses.
//! - [`signal`] and [`config`]: the waveforms and TOML configuration of simulated boards.
//! - [`utils`]: stream bookkeeping and timing helpers.
//!
//! The two-step call pattern of the driver reads a raw sample and converts it with the same
//! board and range; the conversion half is pure arithmetic and lives here:
//!
//! ```
//! use ulcore_backend::*;
//!
//! let raw: u16 = 49152;
//! let volts = counts_to_eng(UlRange::BIP10VOLTS, 16, raw as u32).unwrap();
//! assert_eq!(volts, 5.0);
//! ```

pub mod channel;
pub mod config;
pub mod convert;
pub mod descriptor;
pub mod enums;
pub mod error;
pub mod options;
pub mod range;
pub mod signal;
pub mod utils;

pub use channel::*;
pub use config::*;
pub use convert::*;
pub use descriptor::*;
pub use enums::*;
pub use error::*;
pub use options::*;
pub use range::*;
pub use signal::*;
pub use utils::*;
