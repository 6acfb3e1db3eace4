//! The seam between the safe API and whatever executes Universal Library calls.
//!
//! [`UniversalLibrary`] mirrors the driver entry points one-to-one, but with typed arguments and
//! [`UlResult`] returns instead of integer status codes. Two implementations exist:
//!
//! - `cbw::NativeLibrary` (feature `hardware`): the vendor's `cbw64`/`cbw32` library.
//! - [`crate::sim::SimulatedLibrary`]: in-memory boards described by a [`ulcore_backend::UlConfig`].
//!
//! Everything above this trait ([`crate::board::Board`], device info, discovery, scans) is
//! written against `Arc<dyn UniversalLibrary>` and cannot tell the two apart.

use std::sync::Arc;

use thiserror::Error;
use ulcore_backend::*;

use crate::sim::SimulatedLibrary;

/// Opaque handle of a driver-allocated sample buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MemHandle(usize);

impl MemHandle {
    pub fn from_raw(raw: usize) -> Self {
        MemHandle(raw)
    }

    pub fn raw(self) -> usize {
        self.0
    }

    pub fn is_null(self) -> bool {
        self.0 == 0
    }
}

/// Result of `get_status`: whether a background operation runs, and how far it got.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanStatus {
    pub status: Status,
    /// Samples transferred since the scan started.
    pub cur_count: i64,
    /// Buffer index of the first sample of the last completed channel scan, `-1` before any.
    pub cur_index: i64,
}

impl ScanStatus {
    pub fn idle() -> Self {
        ScanStatus {
            status: Status::IDLE,
            cur_count: 0,
            cur_index: -1,
        }
    }

    pub fn is_running(&self) -> bool {
        self.status == Status::RUNNING
    }
}

pub trait UniversalLibrary: Send + Sync {
    // Configuration
    fn get_config(&self, info_type: InfoType, board_num: i32, dev_num: i32, config_item: i32) -> UlResult<i32>;
    fn set_config(
        &self,
        info_type: InfoType,
        board_num: i32,
        dev_num: i32,
        config_item: i32,
        value: i32,
    ) -> UlResult<()>;
    fn get_config_string(
        &self,
        info_type: InfoType,
        board_num: i32,
        dev_num: i32,
        config_item: i32,
        max_len: usize,
    ) -> UlResult<String>;
    fn get_board_name(&self, board_num: i32) -> UlResult<String>;
    fn flash_led(&self, board_num: i32) -> UlResult<()>;

    // Errors
    fn get_err_msg(&self, code: i32) -> UlResult<String>;
    fn err_handling(&self, reporting: ErrorReporting, handling: ErrorHandling) -> UlResult<()>;

    // Analog input
    fn a_in(&self, board_num: i32, channel: i32, range: UlRange) -> UlResult<u16>;
    fn a_in_32(&self, board_num: i32, channel: i32, range: UlRange, options: i32) -> UlResult<u32>;
    fn v_in(&self, board_num: i32, channel: i32, range: UlRange, options: VInOptions) -> UlResult<f32>;
    fn to_eng_units(&self, board_num: i32, range: UlRange, data_value: u16) -> UlResult<f32>;
    fn to_eng_units_32(&self, board_num: i32, range: UlRange, data_value: u32) -> UlResult<f64>;
    fn from_eng_units(&self, board_num: i32, range: UlRange, eng_units_value: f32) -> UlResult<u16>;
    fn t_in(&self, board_num: i32, channel: i32, scale: TempScale, options: TInOptions) -> UlResult<f32>;
    fn a_chan_input_mode(&self, board_num: i32, channel: i32, input_mode: AnalogInputMode) -> UlResult<()>;
    fn set_trigger(&self, board_num: i32, trig_type: TrigType, low_threshold: u16, high_threshold: u16) -> UlResult<()>;
    /// Loads a channel/gain queue used by the next scans; empty slices clear it.
    fn a_load_queue(&self, board_num: i32, chans: &[i32], gains: &[UlRange]) -> UlResult<()>;

    // Analog output
    fn a_out(&self, board_num: i32, channel: i32, range: UlRange, data_value: u16) -> UlResult<()>;
    fn v_out(&self, board_num: i32, channel: i32, range: UlRange, value: f32, options: VInOptions) -> UlResult<()>;

    // Digital I/O
    fn d_config_port(&self, board_num: i32, port: DigitalPortType, direction: DigitalIODirection) -> UlResult<()>;
    fn d_config_bit(
        &self,
        board_num: i32,
        port_type: DigitalPortType,
        bit_num: i32,
        direction: DigitalIODirection,
    ) -> UlResult<()>;
    fn d_in(&self, board_num: i32, port: DigitalPortType) -> UlResult<u16>;
    fn d_out(&self, board_num: i32, port: DigitalPortType, data_value: u16) -> UlResult<()>;
    fn d_bit_in(&self, board_num: i32, port_type: DigitalPortType, bit_num: i32) -> UlResult<bool>;
    fn d_bit_out(&self, board_num: i32, port_type: DigitalPortType, bit_num: i32, bit_value: bool) -> UlResult<()>;

    // Counters
    fn c_in_32(&self, board_num: i32, counter_num: i32) -> UlResult<u32>;
    fn c_clear(&self, board_num: i32, counter_num: i32) -> UlResult<()>;
    fn c_load_32(&self, board_num: i32, reg_num: i32, load_value: u32) -> UlResult<()>;

    // Buffers and background scans
    fn win_buf_alloc(&self, num_points: usize) -> UlResult<MemHandle>;
    fn win_buf_free(&self, handle: MemHandle) -> UlResult<()>;
    fn win_buf_to_array(&self, handle: MemHandle, first_point: usize, count: usize) -> UlResult<Vec<u16>>;
    /// Starts (or, without `BACKGROUND`, runs) a scan of `low_chan..=high_chan`; returns the
    /// rate the hardware actually uses.
    #[allow(clippy::too_many_arguments)]
    fn a_in_scan(
        &self,
        board_num: i32,
        low_chan: i32,
        high_chan: i32,
        num_points: usize,
        rate: u32,
        range: UlRange,
        handle: MemHandle,
        options: ScanOptions,
    ) -> UlResult<u32>;
    fn get_status(&self, board_num: i32, function: FunctionType) -> UlResult<ScanStatus>;
    fn stop_background(&self, board_num: i32, function: FunctionType) -> UlResult<()>;

    // Events
    fn disable_event(&self, board_num: i32, event_type: EventType) -> UlResult<()>;

    // Device discovery
    fn ignore_instacal(&self) -> UlResult<()>;
    fn get_daq_device_inventory(&self, interface: InterfaceType, max_devices: usize) -> UlResult<Vec<DaqDeviceDescriptor>>;
    fn create_daq_device(&self, board_num: i32, descriptor: &DaqDeviceDescriptor) -> UlResult<()>;
    fn release_daq_device(&self, board_num: i32) -> UlResult<()>;
}

/// Failures while choosing and opening a library implementation.
#[derive(Error, Debug)]
pub enum OpenError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Driver(#[from] UlError),

    #[error("native backend requested but this build has no `hardware` feature")]
    NativeUnavailable,
}

/// Opens the backend selected in `[library] backend`.
pub fn open_library(config: &UlConfig) -> Result<Arc<dyn UniversalLibrary>, OpenError> {
    let lib: Arc<dyn UniversalLibrary> = match config.library.backend {
        Backend::Simulated => Arc::new(SimulatedLibrary::from_config(config)?),
        Backend::Native => open_native(config)?,
    };
    if config.library.ignore_instacal {
        lib.ignore_instacal()?;
    }
    tracing::info!("opened {:?} Universal Library backend", config.library.backend);
    Ok(lib)
}

#[cfg(feature = "hardware")]
fn open_native(config: &UlConfig) -> Result<Arc<dyn UniversalLibrary>, OpenError> {
    let lib = crate::cbw::NativeLibrary::new(config.library.error_log.clone())?;
    Ok(Arc::new(lib))
}

#[cfg(not(feature = "hardware"))]
fn open_native(_config: &UlConfig) -> Result<Arc<dyn UniversalLibrary>, OpenError> {
    Err(OpenError::NativeUnavailable)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_simulated_demo() {
        let lib = open_library(&UlConfig::demo()).unwrap();
        assert_eq!(lib.get_board_name(0).unwrap(), "USB-1608FS-Plus");
    }

    #[cfg(not(feature = "hardware"))]
    #[test]
    fn test_native_requires_feature() {
        let mut config = UlConfig::default();
        config.library.backend = Backend::Native;
        assert!(matches!(open_library(&config), Err(OpenError::NativeUnavailable)));
    }

    #[test]
    fn test_ignore_instacal_unbinds_boards() {
        let mut config = UlConfig::demo();
        config.library.ignore_instacal = true;
        let lib = open_library(&config).unwrap();
        assert!(lib.get_board_name(0).unwrap_err().is(ErrorCode::BADBOARD));
        assert_eq!(lib.get_daq_device_inventory(InterfaceType::ANY, 8).unwrap().len(), 1);
    }
}
