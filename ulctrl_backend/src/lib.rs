//! # Universal Library driver access
//!
//! Talks to Measurement Computing DAQ boards through the Universal Library, or through an
//! in-memory simulation of it.
//!
//! - [`library`]: the [`UniversalLibrary`] trait and [`open_library`], which picks the backend
//!   named in the configuration.
//! - [`sim`]: [`SimulatedLibrary`], boards described by [`ulcore_backend::BoardConfig`].
//! - `cbw` (feature `hardware`): the vendor library.
//! - [`board`]: [`Board`], the safe per-board API.
//! - [`device_info`], [`discovery`], [`scan`]: capability probing, runtime device binding and
//!   background scans.
//! - `python` (feature `python`): the Python extension module.

pub mod board;
#[cfg(feature = "hardware")]
pub mod cbw;
pub mod device_info;
pub mod discovery;
pub mod library;
#[cfg(feature = "python")]
pub mod python;
pub mod scan;
pub mod sim;
pub mod worker_cmd_chan;

pub use crate::board::Board;
pub use crate::device_info::*;
pub use crate::discovery::*;
pub use crate::library::*;
pub use crate::scan::*;
pub use crate::sim::SimulatedLibrary;
pub use crate::worker_cmd_chan::*;
