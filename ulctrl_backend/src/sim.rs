//! In-memory stand-in for the Universal Library.
//!
//! ## Overview
//!
//! [`SimulatedLibrary`] implements [`UniversalLibrary`] over boards described by
//! [`BoardConfig`] entries. It exists so that everything above the driver seam (the safe
//! [`crate::board::Board`] API, device info probing, scans, the CLI) can run and be tested on a
//! machine without the vendor library or any hardware attached.
//!
//! Arguments are validated with the same error codes the driver documents: an unknown board is
//! `BADBOARD`, a channel beyond the configured count is `BADADCHAN`/`BADDACHAN`, a range the board
//! does not offer is `BADRANGE`, and so on.
//!
//! ## Board behaviour
//!
//! - **Analog input**: single reads return the channel's [`Signal`] evaluated at `t = 0`,
//!   clamped to the range and quantised at the board's A/D resolution. `a_in` refuses boards
//!   wider than 16 bits (`BADBOARDTYPE`); use `a_in_32` there.
//! - **Fixed ranges**: a board configured with exactly one range ignores the range argument, the
//!   way hardware with jumpered ranges does, and reports that range through `BOARDINFO RANGE` /
//!   `DACRANGE`. Boards with several ranges report `-1` there.
//! - **Analog output**: written counts are stored; [`SimulatedLibrary::ao_value`] reads them back.
//! - **Digital I/O**: ports must be configured with `d_config_port` (or, on AUXPORT types, per bit
//!   with `d_config_bit`) before use. Writing to input bits is `WRONGDIGCONFIG`. Reads return the
//!   last value written.
//! - **Counters**: hold whatever `c_load_32` stored, `c_clear` zeroes them.
//! - **Background scans**: a worker thread fills the buffer paced at the requested rate;
//!   `CONTINUOUS` scans wrap around the buffer until `stop_background`. Scans without
//!   `BACKGROUND` fill the buffer immediately.
//!
//! ## Discovery
//!
//! Boards with `installed = true` are bound to their board number from the start. All others,
//! and every board after `ignore_instacal`, only show up in the device inventory until
//! `create_daq_device` binds them.

use indexmap::IndexMap;
use ndarray::Array1;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};
use tracing::{debug, info};

use ulcore_backend::*;

use crate::library::{MemHandle, ScanStatus, UniversalLibrary};

/// Driver version reported through `GLOBALINFO VERSION`.
const SIM_VERSION: i32 = 6;

/// Board items a caller may overwrite through `set_config`.
const SETTABLE_BOARD_ITEMS: &[BoardInfo] = &[
    BoardInfo::CLOCK,
    BoardInfo::DACUPDATEMODE,
    BoardInfo::ADTRIGCOUNT,
    BoardInfo::DACTRIGCOUNT,
    BoardInfo::SYNCMODE,
    BoardInfo::ADTIMINGMODE,
    BoardInfo::CALTABLETYPE,
];

type SampleBuffer = Arc<Mutex<Vec<u16>>>;

fn full_mask(bits: u32) -> u32 {
    if bits >= 32 {
        u32::MAX
    } else {
        (1u32 << bits) - 1
    }
}

struct SimPort {
    port: DigitalPortType,
    bits: u32,
    configured: bool,
    out_mask: u32,
    value: u32,
}

impl SimPort {
    fn check_bit(&self, bit_num: i32) -> UlResult<u32> {
        if bit_num < 0 || bit_num as u32 >= self.bits {
            return Err(UlError::with_context(
                ErrorCode::BADBITNUMBER,
                format!("bit {} of {}-bit port {}", bit_num, self.bits, self.port),
            ));
        }
        Ok(1u32 << bit_num)
    }

    fn check_configured(&self) -> UlResult<()> {
        if !self.configured {
            return Err(UlError::with_context(
                ErrorCode::WRONGDIGCONFIG,
                format!("port {} has not been configured", self.port),
            ));
        }
        Ok(())
    }
}

#[derive(Default)]
struct ScanProgress {
    running: AtomicBool,
    stop: AtomicBool,
    cur_count: AtomicI64,
    cur_index: AtomicI64,
}

impl ScanProgress {
    fn status(&self) -> ScanStatus {
        ScanStatus {
            status: if self.running.load(Ordering::Acquire) {
                Status::RUNNING
            } else {
                Status::IDLE
            },
            cur_count: self.cur_count.load(Ordering::Acquire),
            cur_index: self.cur_index.load(Ordering::Acquire),
        }
    }
}

/// Everything the scan worker needs, detached from the library state.
struct ScanJob {
    /// Signal and range of each element of a scan, in buffer order.
    channels: Vec<(Signal, UlRange)>,
    resolution: u32,
    rate: u32,
    num_points: usize,
    continuous: bool,
    buffer: SampleBuffer,
    progress: Arc<ScanProgress>,
}

impl ScanJob {
    fn num_chans(&self) -> usize {
        self.channels.len()
    }

    fn scans_per_buffer(&self) -> usize {
        self.num_points / self.num_chans()
    }

    /// Writes buffer scans `start..end`, the first of them being scan number `first_scan`.
    fn fill(&self, first_scan: usize, start: usize, end: usize) {
        let nchan = self.num_chans();
        let rate = self.rate as f64;
        let times = Array1::from_shape_fn(end - start, |k| (first_scan + k) as f64 / rate);
        let mut buffer = self.buffer.lock();
        for (offset, (signal, range)) in self.channels.iter().enumerate() {
            let mut values = times.clone();
            signal.eval_inplace(&mut values.view_mut());
            for (k, &value) in values.iter().enumerate() {
                buffer[(start + k) * nchan + offset] =
                    quantise(*range, self.resolution, value).unwrap_or_default() as u16;
            }
        }
    }

    fn publish(&self, scans_done: usize) {
        let nchan = self.num_chans();
        let last_scan = (scans_done - 1) % self.scans_per_buffer();
        self.progress
            .cur_count
            .store((scans_done * nchan) as i64, Ordering::Release);
        self.progress
            .cur_index
            .store((last_scan * nchan) as i64, Ordering::Release);
    }

    /// Fills the buffer; `paced` holds the worker to the requested rate.
    fn run(&self, paced: bool) {
        let total_scans = self.scans_per_buffer();
        // About 5 ms of data per block
        let block = (self.rate as usize / 200).max(1);
        let mut counter = StreamCounter::new(total_scans, block);
        let start = Instant::now();
        let mut done = 0usize;
        while !self.progress.stop.load(Ordering::Acquire) {
            let (start_pos, end_pos) = counter.tick_next();
            self.fill(done, start_pos, end_pos);
            done += end_pos - start_pos;
            self.publish(done);
            if !self.continuous && done >= total_scans {
                break;
            }
            if paced {
                let due = start + Duration::from_secs_f64(done as f64 / self.rate as f64);
                self.sleep_until(due);
            }
        }
        self.progress.running.store(false, Ordering::Release);
    }

    fn sleep_until(&self, due: Instant) {
        loop {
            let now = Instant::now();
            if now >= due || self.progress.stop.load(Ordering::Acquire) {
                return;
            }
            std::thread::sleep((due - now).min(Duration::from_millis(10)));
        }
    }
}

struct SimScan {
    progress: Arc<ScanProgress>,
    worker: Option<JoinHandle<()>>,
}

impl SimScan {
    fn is_running(&self) -> bool {
        self.progress.running.load(Ordering::Acquire)
    }

    fn stop(&mut self) {
        self.progress.stop.store(true, Ordering::Release);
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                tracing::warn!("simulated scan worker panicked");
            }
        }
        self.progress.running.store(false, Ordering::Release);
    }
}

impl Drop for SimScan {
    fn drop(&mut self) {
        self.stop();
    }
}

struct SimBoard {
    config: BoardConfig,
    ao_values: Vec<u16>,
    input_modes: Vec<AnalogInputMode>,
    ports: Vec<SimPort>,
    counters: Vec<u32>,
    trigger: Option<(TrigType, u16, u16)>,
    /// Channel/gain queue; scans use it instead of `low_chan..=high_chan` while it is loaded.
    queue: Vec<(i32, UlRange)>,
    settings: IndexMap<BoardInfo, i32>,
    ai_scan: Option<SimScan>,
}

impl SimBoard {
    fn new(config: BoardConfig) -> Self {
        let ports = config
            .dio_ports
            .iter()
            .map(|p| SimPort {
                port: p.port,
                bits: p.bits,
                configured: false,
                out_mask: 0,
                value: 0,
            })
            .collect();
        SimBoard {
            ao_values: vec![0; config.ao_channels as usize],
            input_modes: vec![AnalogInputMode::SINGLE_ENDED; config.ai_channels as usize],
            counters: vec![0; config.counters as usize],
            ports,
            trigger: None,
            queue: Vec::new(),
            settings: IndexMap::new(),
            ai_scan: None,
            config,
        }
    }

    fn fixed_range(ranges: &[UlRange]) -> Option<UlRange> {
        match ranges {
            [only] => Some(*only),
            _ => None,
        }
    }

    fn pick_range(ranges: &[UlRange], range: UlRange) -> UlResult<UlRange> {
        if let Some(fixed) = Self::fixed_range(ranges) {
            return Ok(fixed);
        }
        if ranges.contains(&range) {
            Ok(range)
        } else {
            Err(UlError::with_context(
                ErrorCode::BADRANGE,
                format!("{} is not available on this board", range),
            ))
        }
    }

    fn check_ai_chan(&self, channel: i32) -> UlResult<()> {
        if self.config.ai_channels == 0 {
            return Err(ErrorCode::NOTADCONF.into());
        }
        if channel < 0 || channel as u32 >= self.config.ai_channels {
            return Err(UlError::with_context(
                ErrorCode::BADADCHAN,
                format!("channel {} of {}", channel, self.config.ai_channels),
            ));
        }
        Ok(())
    }

    fn has_daq_scans(&self, function: FunctionType) -> bool {
        match function {
            FunctionType::DAQIFUNCTION => !self.config.daqi_chan_types.is_empty(),
            FunctionType::DAQOFUNCTION => !self.config.daqo_chan_types.is_empty(),
            _ => false,
        }
    }

    fn check_ai_idle(&self) -> UlResult<()> {
        match &self.ai_scan {
            Some(scan) if scan.is_running() => Err(ErrorCode::ALREADYACTIVE.into()),
            _ => Ok(()),
        }
    }

    fn read_ai(&self, channel: i32, range: UlRange) -> UlResult<(u32, UlRange)> {
        self.check_ai_chan(channel)?;
        let range = Self::pick_range(&self.config.ai_ranges, range)?;
        self.check_ai_idle()?;
        let signal = self.config.signal(channel as u32);
        let count = quantise(range, self.config.ad_resolution, signal.eval(0.0))?;
        Ok((count, range))
    }

    fn check_ao_chan(&self, channel: i32) -> UlResult<()> {
        if self.config.ao_channels == 0 {
            return Err(ErrorCode::NOTDACONF.into());
        }
        if channel < 0 || channel as u32 >= self.config.ao_channels {
            return Err(UlError::with_context(
                ErrorCode::BADDACHAN,
                format!("channel {} of {}", channel, self.config.ao_channels),
            ));
        }
        Ok(())
    }

    fn check_narrow_dac(&self) -> UlResult<()> {
        if self.config.da_resolution > 16 {
            return Err(UlError::with_context(
                ErrorCode::BADBOARDTYPE,
                format!("{}-bit D/A", self.config.da_resolution),
            ));
        }
        Ok(())
    }

    fn port(&mut self, port: DigitalPortType) -> UlResult<&mut SimPort> {
        if self.ports.is_empty() {
            return Err(ErrorCode::NOTDIGITALCONF.into());
        }
        self.ports
            .iter_mut()
            .find(|p| p.port == port)
            .ok_or_else(|| UlError::with_context(ErrorCode::BADPORTNUM, format!("port {}", port)))
    }

    fn counter(&mut self, counter_num: i32, bad: ErrorCode) -> UlResult<&mut u32> {
        if self.counters.is_empty() {
            return Err(ErrorCode::NOTCOUNTERCONF.into());
        }
        let count = self.counters.len();
        usize::try_from(counter_num)
            .ok()
            .and_then(|i| self.counters.get_mut(i))
            .ok_or_else(|| UlError::with_context(bad, format!("counter {} of {}", counter_num, count)))
    }

    fn chan_type(types: &[ChannelType], item: BoardInfo, index: i32) -> UlResult<i32> {
        usize::try_from(index)
            .ok()
            .and_then(|i| types.get(i))
            .map(|t| t.code())
            .ok_or_else(|| {
                UlError::with_context(
                    ErrorCode::BADCONFIGITEM,
                    format!("BOARDINFO {} index {} of {}", item, index, types.len()),
                )
            })
    }

    fn board_info(&self, dev_num: i32, item: BoardInfo) -> UlResult<i32> {
        let c = &self.config;
        let value = match item {
            BoardInfo::BOARDTYPE => c.product_id as i32,
            BoardInfo::NUMADCHANS => c.ai_channels as i32,
            BoardInfo::ADRES => c.ad_resolution as i32,
            BoardInfo::RANGE => Self::fixed_range(&c.ai_ranges).map_or(-1, |r| r.code()),
            BoardInfo::NUMDACHANS => c.ao_channels as i32,
            BoardInfo::DACRES => c.da_resolution as i32,
            BoardInfo::DACRANGE => Self::fixed_range(&c.ao_ranges).map_or(-1, |r| r.code()),
            BoardInfo::DINUMDEVS => self.ports.len() as i32,
            BoardInfo::CINUMDEVS => self.counters.len() as i32,
            BoardInfo::NUMTEMPCHANS => c.temp_channels as i32,
            BoardInfo::NUMEXPS => 0,
            BoardInfo::ADTRIGSRC => 0,
            BoardInfo::DAQINUMCHANTYPES => c.daqi_chan_types.len() as i32,
            BoardInfo::DAQONUMCHANTYPES => c.daqo_chan_types.len() as i32,
            BoardInfo::DAQICHANTYPE => Self::chan_type(&c.daqi_chan_types, item, dev_num)?,
            BoardInfo::DAQOCHANTYPE => Self::chan_type(&c.daqo_chan_types, item, dev_num)?,
            BoardInfo::ADSCANOPTIONS if c.ai_channels > 0 => ScanOptions::SIMULATED.bits(),
            BoardInfo::ADSCANOPTIONS | BoardInfo::DACSCANOPTIONS | BoardInfo::CTRSCANOPTIONS => 0,
            item if SETTABLE_BOARD_ITEMS.contains(&item) => self.settings.get(&item).copied().unwrap_or(0),
            item => {
                return Err(UlError::with_context(
                    ErrorCode::BADCONFIGITEM,
                    format!("BOARDINFO {}", item),
                ))
            }
        };
        Ok(value)
    }

    fn digital_info(&self, dev_num: i32, item: DigitalInfo) -> UlResult<i32> {
        if self.ports.is_empty() {
            return Err(ErrorCode::NOTDIGITALCONF.into());
        }
        let port = usize::try_from(dev_num)
            .ok()
            .and_then(|i| self.ports.get(i))
            .ok_or_else(|| UlError::with_context(ErrorCode::BADPORTNUM, format!("digital device {}", dev_num)))?;
        let value = match item {
            DigitalInfo::DEVTYPE => port.port.code(),
            DigitalInfo::NUMBITS => port.bits as i32,
            // Every simulated port is configurable, so no bit has a fixed direction
            DigitalInfo::INMASK | DigitalInfo::OUTMASK => 0,
            DigitalInfo::CONFIG => {
                if port.configured && port.out_mask == full_mask(port.bits) {
                    DigitalIODirection::OUT.code()
                } else {
                    DigitalIODirection::IN.code()
                }
            }
            DigitalInfo::CURVAL => port.value as i32,
            DigitalInfo::INITIALIZED => 1,
            item => {
                return Err(UlError::with_context(
                    ErrorCode::BADCONFIGITEM,
                    format!("DIGITALINFO {}", item),
                ))
            }
        };
        Ok(value)
    }

    fn counter_info(&self, dev_num: i32, item: CounterInfo) -> UlResult<i32> {
        if self.counters.is_empty() {
            return Err(ErrorCode::NOTCOUNTERCONF.into());
        }
        if dev_num < 0 || dev_num as usize >= self.counters.len() {
            return Err(UlError::with_context(
                ErrorCode::BADCOUNTERDEVNUM,
                format!("counter {}", dev_num),
            ));
        }
        match item {
            CounterInfo::CTRNUM => Ok(dev_num),
            CounterInfo::CTRTYPE => Ok(CounterChannelType::CTREVENT.code()),
            CounterInfo::INITIALIZED => Ok(1),
            item => Err(UlError::with_context(
                ErrorCode::BADCONFIGITEM,
                format!("COUNTERINFO {}", item),
            )),
        }
    }

    fn descriptor(&self) -> DaqDeviceDescriptor {
        descriptor_for(&self.config)
    }
}

fn descriptor_for(config: &BoardConfig) -> DaqDeviceDescriptor {
    DaqDeviceDescriptor {
        product_name: config.product_name.clone(),
        product_id: config.product_id,
        interface_type: config.interface.bits(),
        dev_string: String::new(),
        unique_id: config.unique_id.clone(),
        nuid: u64::from_str_radix(&config.unique_id, 16).unwrap_or(0),
    }
}

fn same_device(config: &BoardConfig, descriptor: &DaqDeviceDescriptor) -> bool {
    config.product_id == descriptor.product_id && config.unique_id == descriptor.unique_id
}

struct SimState {
    boards: IndexMap<i32, SimBoard>,
    inventory: Vec<BoardConfig>,
    buffers: IndexMap<usize, SampleBuffer>,
    next_handle: usize,
    error_reporting: ErrorReporting,
    error_handling: ErrorHandling,
}

impl SimState {
    fn board(&self, board_num: i32) -> UlResult<&SimBoard> {
        self.boards
            .get(&board_num)
            .ok_or_else(|| UlError::with_context(ErrorCode::BADBOARD, format!("board {}", board_num)))
    }

    fn board_mut(&mut self, board_num: i32) -> UlResult<&mut SimBoard> {
        self.boards
            .get_mut(&board_num)
            .ok_or_else(|| UlError::with_context(ErrorCode::BADBOARD, format!("board {}", board_num)))
    }

    fn buffer(&self, handle: MemHandle) -> UlResult<SampleBuffer> {
        if handle.is_null() {
            return Err(ErrorCode::BADPOINTER.into());
        }
        self.buffers
            .get(&handle.raw())
            .cloned()
            .ok_or_else(|| UlError::with_context(ErrorCode::BAD_MEM_HANDLE, format!("handle {}", handle.raw())))
    }
}

/// Simulated Universal Library; see the module documentation for the board model.
pub struct SimulatedLibrary {
    state: Mutex<SimState>,
}

impl Default for SimulatedLibrary {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulatedLibrary {
    /// A library with no boards at all.
    pub fn new() -> Self {
        SimulatedLibrary {
            state: Mutex::new(SimState {
                boards: IndexMap::new(),
                inventory: Vec::new(),
                buffers: IndexMap::new(),
                next_handle: 1,
                error_reporting: ErrorReporting::PRINTALL,
                error_handling: ErrorHandling::DONTSTOP,
            }),
        }
    }

    pub fn from_config(config: &UlConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let lib = Self::new();
        for board in &config.boards {
            lib.add_board(board.clone());
        }
        Ok(lib)
    }

    /// Adds a board: bound to its board number when `installed`, otherwise only discoverable.
    pub fn add_board(&self, config: BoardConfig) {
        let mut state = self.state.lock();
        if config.installed {
            info!("simulated board {} ({}) installed", config.board_num, config.product_name);
            state.boards.insert(config.board_num, SimBoard::new(config));
        } else {
            debug!("simulated device {} added to inventory", config.product_name);
            state.inventory.push(config);
        }
    }

    /// Replaces the waveform seen by an analog input channel.
    pub fn set_signal(&self, board_num: i32, channel: i32, signal: Signal) -> UlResult<()> {
        let mut state = self.state.lock();
        let board = state.board_mut(board_num)?;
        board.check_ai_chan(channel)?;
        board.config.signals.insert(channel.to_string(), signal);
        Ok(())
    }

    /// Last count written to an analog output channel.
    pub fn ao_value(&self, board_num: i32, channel: i32) -> UlResult<u16> {
        let state = self.state.lock();
        let board = state.board(board_num)?;
        board.check_ao_chan(channel)?;
        Ok(board.ao_values[channel as usize])
    }

    /// Trigger most recently set with `set_trigger`.
    pub fn trigger(&self, board_num: i32) -> UlResult<Option<(TrigType, u16, u16)>> {
        Ok(self.state.lock().board(board_num)?.trigger)
    }

    pub fn input_mode(&self, board_num: i32, channel: i32) -> UlResult<AnalogInputMode> {
        let state = self.state.lock();
        let board = state.board(board_num)?;
        board.check_ai_chan(channel)?;
        Ok(board.input_modes[channel as usize])
    }

    pub fn error_settings(&self) -> (ErrorReporting, ErrorHandling) {
        let state = self.state.lock();
        (state.error_reporting, state.error_handling)
    }

    /// Number of live buffers allocated with `win_buf_alloc`.
    pub fn allocated_buffers(&self) -> usize {
        self.state.lock().buffers.len()
    }
}

impl UniversalLibrary for SimulatedLibrary {
    fn get_config(&self, info_type: InfoType, board_num: i32, dev_num: i32, config_item: i32) -> UlResult<i32> {
        debug!(?info_type, board_num, dev_num, config_item, "get_config");
        let state = self.state.lock();
        match info_type {
            InfoType::GLOBALINFO => match GlobalInfo::try_from(config_item)? {
                GlobalInfo::VERSION => Ok(SIM_VERSION),
                GlobalInfo::NUMBOARDS => Ok(state.boards.len() as i32),
                GlobalInfo::NUMEXPBOARDS => Ok(0),
                item => Err(UlError::with_context(
                    ErrorCode::BADCONFIGITEM,
                    format!("GLOBALINFO {}", item),
                )),
            },
            InfoType::BOARDINFO => state.board(board_num)?.board_info(dev_num, BoardInfo::try_from(config_item)?),
            InfoType::DIGITALINFO => {
                state.board(board_num)?.digital_info(dev_num, DigitalInfo::try_from(config_item)?)
            }
            InfoType::COUNTERINFO => {
                state.board(board_num)?.counter_info(dev_num, CounterInfo::try_from(config_item)?)
            }
            InfoType::EXPANSIONINFO => {
                state.board(board_num)?;
                Err(UlError::with_context(
                    ErrorCode::BADEXPCHAN,
                    format!("expansion {}", dev_num),
                ))
            }
            InfoType::EXPINFOARRAY => Err(UlError::with_context(ErrorCode::BADCONFIGTYPE, info_type)),
        }
    }

    fn set_config(
        &self,
        info_type: InfoType,
        board_num: i32,
        dev_num: i32,
        config_item: i32,
        value: i32,
    ) -> UlResult<()> {
        debug!(?info_type, board_num, dev_num, config_item, value, "set_config");
        let mut state = self.state.lock();
        let board = state.board_mut(board_num)?;
        if info_type != InfoType::BOARDINFO {
            return Err(UlError::with_context(ErrorCode::BADCONFIGTYPE, info_type));
        }
        let item = BoardInfo::try_from(config_item)?;
        if !SETTABLE_BOARD_ITEMS.contains(&item) {
            return Err(UlError::with_context(
                ErrorCode::BADCONFIGITEM,
                format!("BOARDINFO {} is read-only", item),
            ));
        }
        board.settings.insert(item, value);
        Ok(())
    }

    fn get_config_string(
        &self,
        info_type: InfoType,
        board_num: i32,
        dev_num: i32,
        config_item: i32,
        max_len: usize,
    ) -> UlResult<String> {
        debug!(?info_type, board_num, dev_num, config_item, "get_config_string");
        let state = self.state.lock();
        let board = state.board(board_num)?;
        if info_type != InfoType::BOARDINFO {
            return Err(UlError::with_context(ErrorCode::BADCONFIGTYPE, info_type));
        }
        let mut text = match BoardInfo::try_from(config_item)? {
            BoardInfo::DEVUNIQUEID | BoardInfo::DEVSERIALNUM => board.config.unique_id.clone(),
            item => {
                return Err(UlError::with_context(
                    ErrorCode::BADCONFIGITEM,
                    format!("BOARDINFO {} has no string form", item),
                ))
            }
        };
        let mut end = text.len().min(max_len);
        while !text.is_char_boundary(end) {
            end -= 1;
        }
        text.truncate(end);
        Ok(text)
    }

    fn get_board_name(&self, board_num: i32) -> UlResult<String> {
        Ok(self.state.lock().board(board_num)?.config.product_name.clone())
    }

    fn flash_led(&self, board_num: i32) -> UlResult<()> {
        let state = self.state.lock();
        let board = state.board(board_num)?;
        info!("board {} ({}) flashes its LED", board_num, board.config.product_name);
        Ok(())
    }

    fn get_err_msg(&self, code: i32) -> UlResult<String> {
        Ok(UlError::from_code(code).message().to_string())
    }

    fn err_handling(&self, reporting: ErrorReporting, handling: ErrorHandling) -> UlResult<()> {
        let mut state = self.state.lock();
        state.error_reporting = reporting;
        state.error_handling = handling;
        Ok(())
    }

    fn a_in(&self, board_num: i32, channel: i32, range: UlRange) -> UlResult<u16> {
        debug!(board_num, channel, %range, "a_in");
        let state = self.state.lock();
        let board = state.board(board_num)?;
        if board.config.ad_resolution > 16 {
            return Err(UlError::with_context(
                ErrorCode::BADBOARDTYPE,
                format!("{}-bit A/D needs a_in_32", board.config.ad_resolution),
            ));
        }
        let (count, _) = board.read_ai(channel, range)?;
        Ok(count as u16)
    }

    fn a_in_32(&self, board_num: i32, channel: i32, range: UlRange, options: i32) -> UlResult<u32> {
        debug!(board_num, channel, %range, options, "a_in_32");
        let state = self.state.lock();
        let (count, _) = state.board(board_num)?.read_ai(channel, range)?;
        Ok(count)
    }

    fn v_in(&self, board_num: i32, channel: i32, range: UlRange, options: VInOptions) -> UlResult<f32> {
        debug!(board_num, channel, %range, options = options.bits(), "v_in");
        let state = self.state.lock();
        let board = state.board(board_num)?;
        let (count, used) = board.read_ai(channel, range)?;
        Ok(counts_to_eng(used, board.config.ad_resolution, count)? as f32)
    }

    fn to_eng_units(&self, board_num: i32, range: UlRange, data_value: u16) -> UlResult<f32> {
        let state = self.state.lock();
        let resolution = state.board(board_num)?.config.ad_resolution;
        if resolution > 16 {
            return Err(UlError::with_context(
                ErrorCode::BADBOARDTYPE,
                format!("{}-bit A/D needs to_eng_units_32", resolution),
            ));
        }
        Ok(counts_to_eng(range, resolution, data_value as u32)? as f32)
    }

    fn to_eng_units_32(&self, board_num: i32, range: UlRange, data_value: u32) -> UlResult<f64> {
        let state = self.state.lock();
        let resolution = state.board(board_num)?.config.ad_resolution;
        counts_to_eng(range, resolution, data_value)
    }

    fn from_eng_units(&self, board_num: i32, range: UlRange, eng_units_value: f32) -> UlResult<u16> {
        let state = self.state.lock();
        let board = state.board(board_num)?;
        // Prepares data for a_out, so the D/A resolution applies when there is one
        let resolution = if board.config.ao_channels > 0 {
            board.config.da_resolution
        } else {
            board.config.ad_resolution
        };
        if resolution > 16 {
            return Err(UlError::with_context(
                ErrorCode::BADBOARDTYPE,
                format!("{}-bit converter", resolution),
            ));
        }
        Ok(eng_to_counts(range, resolution, eng_units_value as f64)? as u16)
    }

    fn t_in(&self, board_num: i32, channel: i32, scale: TempScale, options: TInOptions) -> UlResult<f32> {
        debug!(board_num, channel, %scale, options = options.bits(), "t_in");
        let state = self.state.lock();
        let board = state.board(board_num)?;
        let chans = board.config.temp_channels;
        if chans == 0 {
            return Err(ErrorCode::NOTMUXCONF.into());
        }
        if channel < 0 || channel as u32 >= chans {
            return Err(UlError::with_context(
                ErrorCode::BADADCHAN,
                format!("temperature channel {} of {}", channel, chans),
            ));
        }
        let celsius = board.config.temperature(channel as u32).eval(0.0);
        let value = match scale {
            TempScale::CELSIUS => celsius,
            TempScale::FAHRENHEIT => celsius * 9.0 / 5.0 + 32.0,
            TempScale::KELVIN => celsius + 273.15,
            scale => {
                return Err(UlError::with_context(
                    ErrorCode::BADTEMPSCALE,
                    format!("{} is not a temperature scale", scale),
                ))
            }
        };
        Ok(value as f32)
    }

    fn a_chan_input_mode(&self, board_num: i32, channel: i32, input_mode: AnalogInputMode) -> UlResult<()> {
        debug!(board_num, channel, %input_mode, "a_chan_input_mode");
        let mut state = self.state.lock();
        let board = state.board_mut(board_num)?;
        board.check_ai_chan(channel)?;
        board.input_modes[channel as usize] = input_mode;
        Ok(())
    }

    fn set_trigger(&self, board_num: i32, trig_type: TrigType, low_threshold: u16, high_threshold: u16) -> UlResult<()> {
        debug!(board_num, %trig_type, low_threshold, high_threshold, "set_trigger");
        let mut state = self.state.lock();
        let board = state.board_mut(board_num)?;
        if board.config.ai_channels == 0 {
            return Err(ErrorCode::NOTADCONF.into());
        }
        if trig_type.code() >= TrigType::TRIG_PATTERN_EQ.code() {
            return Err(UlError::with_context(
                ErrorCode::BADTRIGTYPE,
                format!("{} needs a digital pattern trigger", trig_type),
            ));
        }
        board.trigger = Some((trig_type, low_threshold, high_threshold));
        Ok(())
    }

    fn a_load_queue(&self, board_num: i32, chans: &[i32], gains: &[UlRange]) -> UlResult<()> {
        debug!(board_num, count = chans.len(), "a_load_queue");
        let mut state = self.state.lock();
        let board = state.board_mut(board_num)?;
        if !board.config.gain_queue {
            return Err(ErrorCode::NOQUEUE.into());
        }
        if chans.len() != gains.len() {
            return Err(UlError::with_context(
                ErrorCode::BADCOUNT,
                format!("{} channels but {} gains", chans.len(), gains.len()),
            ));
        }
        board.check_ai_idle()?;
        let mut queue = Vec::with_capacity(chans.len());
        for (&chan, &gain) in chans.iter().zip(gains) {
            board.check_ai_chan(chan)?;
            queue.push((chan, SimBoard::pick_range(&board.config.ai_ranges, gain)?));
        }
        board.queue = queue;
        Ok(())
    }

    fn a_out(&self, board_num: i32, channel: i32, range: UlRange, data_value: u16) -> UlResult<()> {
        debug!(board_num, channel, %range, data_value, "a_out");
        let mut state = self.state.lock();
        let board = state.board_mut(board_num)?;
        board.check_ao_chan(channel)?;
        SimBoard::pick_range(&board.config.ao_ranges, range)?;
        board.check_narrow_dac()?;
        if data_value as u32 > full_mask(board.config.da_resolution) {
            return Err(UlError::with_context(
                ErrorCode::BADDAVAL,
                format!("{} exceeds the {}-bit D/A", data_value, board.config.da_resolution),
            ));
        }
        board.ao_values[channel as usize] = data_value;
        Ok(())
    }

    fn v_out(&self, board_num: i32, channel: i32, range: UlRange, value: f32, options: VInOptions) -> UlResult<()> {
        debug!(board_num, channel, %range, value, options = options.bits(), "v_out");
        let mut state = self.state.lock();
        let board = state.board_mut(board_num)?;
        board.check_ao_chan(channel)?;
        let used = SimBoard::pick_range(&board.config.ao_ranges, range)?;
        board.check_narrow_dac()?;
        if !used.contains(value as f64) {
            return Err(UlError::with_context(
                ErrorCode::BADDAVAL,
                format!("{} V outside {}", value, used),
            ));
        }
        board.ao_values[channel as usize] = eng_to_counts(used, board.config.da_resolution, value as f64)? as u16;
        Ok(())
    }

    fn d_config_port(&self, board_num: i32, port: DigitalPortType, direction: DigitalIODirection) -> UlResult<()> {
        debug!(board_num, %port, %direction, "d_config_port");
        let mut state = self.state.lock();
        let port = state.board_mut(board_num)?.port(port)?;
        port.configured = true;
        port.out_mask = match direction {
            DigitalIODirection::OUT => full_mask(port.bits),
            DigitalIODirection::IN => 0,
        };
        Ok(())
    }

    fn d_config_bit(
        &self,
        board_num: i32,
        port_type: DigitalPortType,
        bit_num: i32,
        direction: DigitalIODirection,
    ) -> UlResult<()> {
        debug!(board_num, %port_type, bit_num, %direction, "d_config_bit");
        let mut state = self.state.lock();
        let port = state.board_mut(board_num)?.port(port_type)?;
        if !port_type.is_aux() {
            return Err(UlError::with_context(
                ErrorCode::BADBOARDTYPE,
                format!("{} is only configurable as a whole port", port_type),
            ));
        }
        let bit = port.check_bit(bit_num)?;
        port.configured = true;
        match direction {
            DigitalIODirection::OUT => port.out_mask |= bit,
            DigitalIODirection::IN => port.out_mask &= !bit,
        }
        Ok(())
    }

    fn d_in(&self, board_num: i32, port: DigitalPortType) -> UlResult<u16> {
        let mut state = self.state.lock();
        let port = state.board_mut(board_num)?.port(port)?;
        port.check_configured()?;
        Ok((port.value & 0xffff) as u16)
    }

    fn d_out(&self, board_num: i32, port: DigitalPortType, data_value: u16) -> UlResult<()> {
        debug!(board_num, %port, data_value, "d_out");
        let mut state = self.state.lock();
        let port = state.board_mut(board_num)?.port(port)?;
        port.check_configured()?;
        if port.out_mask == 0 {
            return Err(UlError::with_context(
                ErrorCode::WRONGDIGCONFIG,
                format!("port {} is configured for input", port.port),
            ));
        }
        let mask = port.out_mask;
        port.value = ((data_value as u32 & mask) | (port.value & !mask)) & full_mask(port.bits);
        Ok(())
    }

    fn d_bit_in(&self, board_num: i32, port_type: DigitalPortType, bit_num: i32) -> UlResult<bool> {
        let mut state = self.state.lock();
        let port = state.board_mut(board_num)?.port(port_type)?;
        let bit = port.check_bit(bit_num)?;
        port.check_configured()?;
        Ok(port.value & bit != 0)
    }

    fn d_bit_out(&self, board_num: i32, port_type: DigitalPortType, bit_num: i32, bit_value: bool) -> UlResult<()> {
        debug!(board_num, %port_type, bit_num, bit_value, "d_bit_out");
        let mut state = self.state.lock();
        let port = state.board_mut(board_num)?.port(port_type)?;
        let bit = port.check_bit(bit_num)?;
        port.check_configured()?;
        if port.out_mask & bit == 0 {
            return Err(UlError::with_context(
                ErrorCode::WRONGDIGCONFIG,
                format!("bit {} of {} is an input", bit_num, port_type),
            ));
        }
        if bit_value {
            port.value |= bit;
        } else {
            port.value &= !bit;
        }
        Ok(())
    }

    fn c_in_32(&self, board_num: i32, counter_num: i32) -> UlResult<u32> {
        let mut state = self.state.lock();
        let counter = state.board_mut(board_num)?.counter(counter_num, ErrorCode::BADCOUNTERDEVNUM)?;
        Ok(*counter)
    }

    fn c_clear(&self, board_num: i32, counter_num: i32) -> UlResult<()> {
        debug!(board_num, counter_num, "c_clear");
        let mut state = self.state.lock();
        *state.board_mut(board_num)?.counter(counter_num, ErrorCode::BADCOUNTERDEVNUM)? = 0;
        Ok(())
    }

    fn c_load_32(&self, board_num: i32, reg_num: i32, load_value: u32) -> UlResult<()> {
        debug!(board_num, reg_num, load_value, "c_load_32");
        let mut state = self.state.lock();
        // Load register n belongs to counter n
        *state.board_mut(board_num)?.counter(reg_num, ErrorCode::BADCTRREG)? = load_value;
        Ok(())
    }

    fn win_buf_alloc(&self, num_points: usize) -> UlResult<MemHandle> {
        if num_points == 0 {
            return Err(UlError::with_context(ErrorCode::BADBUFFERSIZE, "0 points"));
        }
        let mut state = self.state.lock();
        let raw = state.next_handle;
        state.next_handle += 1;
        state.buffers.insert(raw, Arc::new(Mutex::new(vec![0; num_points])));
        debug!(raw, num_points, "win_buf_alloc");
        Ok(MemHandle::from_raw(raw))
    }

    fn win_buf_free(&self, handle: MemHandle) -> UlResult<()> {
        let mut state = self.state.lock();
        state.buffer(handle)?;
        state.buffers.shift_remove(&handle.raw());
        debug!(raw = handle.raw(), "win_buf_free");
        Ok(())
    }

    fn win_buf_to_array(&self, handle: MemHandle, first_point: usize, count: usize) -> UlResult<Vec<u16>> {
        let buffer = self.state.lock().buffer(handle)?;
        let buffer = buffer.lock();
        let end = first_point.checked_add(count).filter(|&end| end <= buffer.len()).ok_or_else(|| {
            UlError::with_context(
                ErrorCode::BADBUFFERSIZE,
                format!("points {}..{}+{} of {}", first_point, first_point, count, buffer.len()),
            )
        })?;
        Ok(buffer[first_point..end].to_vec())
    }

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
    ) -> UlResult<u32> {
        debug!(board_num, low_chan, high_chan, num_points, rate, %range, options = options.bits(), "a_in_scan");
        if !ScanOptions::SIMULATED.contains(options) {
            return Err(UlError::with_context(
                ErrorCode::BADOPTION,
                format!("unsupported scan options {:#x}", options.bits()),
            ));
        }
        let background = options.contains(ScanOptions::BACKGROUND);
        let continuous = options.contains(ScanOptions::CONTINUOUS);
        if continuous && !background {
            return Err(UlError::with_context(ErrorCode::BADOPTION, "CONTINUOUS requires BACKGROUND"));
        }

        let mut state = self.state.lock();
        let buffer = {
            let board = state.board(board_num)?;
            board.check_ai_chan(low_chan)?;
            board.check_ai_chan(high_chan)?;
            if low_chan > high_chan {
                return Err(UlError::with_context(
                    ErrorCode::BADADCHAN,
                    format!("low channel {} above high channel {}", low_chan, high_chan),
                ));
            }
            SimBoard::pick_range(&board.config.ai_ranges, range)?;
            if board.config.ad_resolution > 16 {
                return Err(UlError::with_context(
                    ErrorCode::BADBOARDTYPE,
                    format!("{}-bit A/D cannot scan into 16-bit buffers", board.config.ad_resolution),
                ));
            }
            let nchan = (high_chan - low_chan + 1) as usize;
            if !board.queue.is_empty() && board.queue.len() != nchan {
                return Err(UlError::with_context(
                    ErrorCode::BADADCHAN,
                    format!("{} channels scanned but the gain queue holds {}", nchan, board.queue.len()),
                ));
            }
            if num_points == 0 || num_points % nchan != 0 {
                return Err(UlError::with_context(
                    ErrorCode::BADCOUNT,
                    format!("{} points for {} channels", num_points, nchan),
                ));
            }
            if rate == 0 || rate as f64 * nchan as f64 > board.config.max_rate {
                return Err(UlError::with_context(
                    ErrorCode::BADRATE,
                    format!("{} Hz x {} channels, max {} S/s", rate, nchan, board.config.max_rate),
                ));
            }
            let buffer = state.buffer(handle)?;
            if buffer.lock().len() < num_points {
                return Err(UlError::with_context(
                    ErrorCode::BADBUFFERSIZE,
                    format!("{} points requested", num_points),
                ));
            }
            board.check_ai_idle()?;
            buffer
        };

        let board = state.board_mut(board_num)?;
        let used_range = SimBoard::pick_range(&board.config.ai_ranges, range)?;
        let channels: Vec<(Signal, UlRange)> = if board.queue.is_empty() {
            (low_chan..=high_chan)
                .map(|c| (board.config.signal(c as u32), used_range))
                .collect()
        } else {
            board
                .queue
                .iter()
                .map(|&(c, r)| (board.config.signal(c as u32), r))
                .collect()
        };
        let progress = Arc::new(ScanProgress::default());
        progress.cur_index.store(-1, Ordering::Release);
        progress.running.store(true, Ordering::Release);
        let job = ScanJob {
            channels,
            resolution: board.config.ad_resolution,
            rate,
            num_points,
            continuous,
            buffer,
            progress: progress.clone(),
        };

        // Replacing a finished scan joins its (already exited) worker
        board.ai_scan = None;
        if background {
            info!(board_num, low_chan, high_chan, num_points, rate, continuous, "background scan started");
            let worker = std::thread::Builder::new()
                .name(format!("sim-ai-scan-{}", board_num))
                .spawn(move || job.run(true))
                .map_err(|e| UlError::with_context(ErrorCode::NO_MEMORY_FOR_BUFFER, e))?;
            board.ai_scan = Some(SimScan {
                progress,
                worker: Some(worker),
            });
        } else {
            job.run(false);
            board.ai_scan = Some(SimScan { progress, worker: None });
        }
        Ok(rate)
    }

    fn get_status(&self, board_num: i32, function: FunctionType) -> UlResult<ScanStatus> {
        let state = self.state.lock();
        let board = state.board(board_num)?;
        // DAQ scans are never started, so a board that has them reports them idle
        if board.has_daq_scans(function) {
            return Ok(ScanStatus::idle());
        }
        if function != FunctionType::AIFUNCTION {
            return Err(UlError::with_context(
                ErrorCode::BADBOARDTYPE,
                format!("no {} scans on this board", function),
            ));
        }
        if board.config.ai_channels == 0 {
            return Err(ErrorCode::NOTADCONF.into());
        }
        Ok(board
            .ai_scan
            .as_ref()
            .map_or_else(ScanStatus::idle, |scan| scan.progress.status()))
    }

    fn stop_background(&self, board_num: i32, function: FunctionType) -> UlResult<()> {
        debug!(board_num, %function, "stop_background");
        let mut state = self.state.lock();
        let board = state.board_mut(board_num)?;
        if board.has_daq_scans(function) {
            return Ok(());
        }
        if function != FunctionType::AIFUNCTION {
            return Err(UlError::with_context(
                ErrorCode::BADBOARDTYPE,
                format!("no {} scans on this board", function),
            ));
        }
        if let Some(scan) = board.ai_scan.as_mut() {
            scan.stop();
        }
        Ok(())
    }

    fn disable_event(&self, board_num: i32, event_type: EventType) -> UlResult<()> {
        debug!(board_num, event_type = event_type.bits(), "disable_event");
        let state = self.state.lock();
        let board = state.board(board_num)?;
        if event_type != EventType::ALL_EVENT_TYPES && !board.config.events.contains(event_type) {
            return Err(UlError::with_context(
                ErrorCode::BADEVENTTYPE,
                format!("{:?}", event_type),
            ));
        }
        Ok(())
    }

    fn ignore_instacal(&self) -> UlResult<()> {
        let mut state = self.state.lock();
        let bound: Vec<SimBoard> = state.boards.drain(..).map(|(_, board)| board).collect();
        for board in bound {
            state.inventory.push(board.config.clone());
        }
        info!("stored board configuration ignored; {} device(s) discoverable", state.inventory.len());
        Ok(())
    }

    fn get_daq_device_inventory(&self, interface: InterfaceType, max_devices: usize) -> UlResult<Vec<DaqDeviceDescriptor>> {
        let state = self.state.lock();
        let found: Vec<DaqDeviceDescriptor> = state
            .inventory
            .iter()
            .filter(|config| config.interface.intersects(interface))
            .take(max_devices)
            .map(descriptor_for)
            .collect();
        debug!(?interface, found = found.len(), "get_daq_device_inventory");
        Ok(found)
    }

    fn create_daq_device(&self, board_num: i32, descriptor: &DaqDeviceDescriptor) -> UlResult<()> {
        let mut state = self.state.lock();
        if state.boards.contains_key(&board_num) {
            return Err(UlError::with_context(ErrorCode::BOARDNUMINUSE, format!("board {}", board_num)));
        }
        if state.boards.values().any(|b| same_device(&b.config, descriptor)) {
            return Err(UlError::with_context(ErrorCode::DEVALREADYCREATED, descriptor));
        }
        let pos = state
            .inventory
            .iter()
            .position(|config| same_device(config, descriptor))
            .ok_or_else(|| UlError::with_context(ErrorCode::BADBOARD, format!("{} was not discovered", descriptor)))?;
        let mut config = state.inventory.remove(pos);
        config.board_num = board_num;
        info!("device {} created as board {}", descriptor, board_num);
        state.boards.insert(board_num, SimBoard::new(config));
        Ok(())
    }

    fn release_daq_device(&self, board_num: i32) -> UlResult<()> {
        let mut state = self.state.lock();
        let board = state
            .boards
            .shift_remove(&board_num)
            .ok_or_else(|| UlError::with_context(ErrorCode::BOARDNOTEXIST, format!("board {}", board_num)))?;
        info!("board {} ({}) released", board_num, board.descriptor());
        state.inventory.push(board.config.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lib() -> SimulatedLibrary {
        SimulatedLibrary::from_config(&UlConfig::demo()).unwrap()
    }

    #[test]
    fn test_a_in_reads_signal_at_zero() {
        let lib = lib();
        // Channel 0 holds 1.25 V
        let raw = lib.a_in(0, 0, UlRange::BIP10VOLTS).unwrap();
        let volts = lib.to_eng_units(0, UlRange::BIP10VOLTS, raw).unwrap();
        assert!((volts - 1.25).abs() <= 20.0 / 65536.0);
        // Ramp channel starts at -5 V
        let raw = lib.a_in(0, 2, UlRange::BIP5VOLTS).unwrap();
        assert_eq!(raw, 0);
    }

    #[test]
    fn test_a_in_errors() {
        let lib = lib();
        assert!(lib.a_in(7, 0, UlRange::BIP10VOLTS).unwrap_err().is(ErrorCode::BADBOARD));
        assert!(lib.a_in(0, 8, UlRange::BIP10VOLTS).unwrap_err().is(ErrorCode::BADADCHAN));
        assert!(lib.a_in(0, -1, UlRange::BIP10VOLTS).unwrap_err().is(ErrorCode::BADADCHAN));
        assert!(lib.a_in(0, 0, UlRange::UNI10VOLTS).unwrap_err().is(ErrorCode::BADRANGE));
    }

    #[test]
    fn test_wide_board_requires_32_bit_calls() {
        let mut board = BoardConfig::demo(1);
        board.ad_resolution = 24;
        let lib = SimulatedLibrary::new();
        lib.add_board(board);
        assert!(lib.a_in(1, 0, UlRange::BIP10VOLTS).unwrap_err().is(ErrorCode::BADBOARDTYPE));
        let raw = lib.a_in_32(1, 0, UlRange::BIP10VOLTS, 0).unwrap();
        let volts = lib.to_eng_units_32(1, UlRange::BIP10VOLTS, raw).unwrap();
        assert!((volts - 1.25).abs() < 1e-5);
    }

    #[test]
    fn test_fixed_range_ignores_argument() {
        let lib = lib();
        // Demo AO has the single range UNI5VOLTS
        lib.a_out(0, 0, UlRange::NOTUSED, 1234).unwrap();
        assert_eq!(lib.ao_value(0, 0).unwrap(), 1234);
        assert_eq!(
            lib.get_config(InfoType::BOARDINFO, 0, 0, BoardInfo::DACRANGE.code()).unwrap(),
            UlRange::UNI5VOLTS.code()
        );
        assert_eq!(lib.get_config(InfoType::BOARDINFO, 0, 0, BoardInfo::RANGE.code()).unwrap(), -1);
    }

    #[test]
    fn test_v_out_bounds() {
        let lib = lib();
        lib.v_out(0, 1, UlRange::UNI5VOLTS, 2.5, VInOptions::empty()).unwrap();
        assert_eq!(lib.ao_value(0, 1).unwrap(), 32768);
        let err = lib.v_out(0, 1, UlRange::UNI5VOLTS, 6.0, VInOptions::empty()).unwrap_err();
        assert!(err.is(ErrorCode::BADDAVAL));
        assert!(lib.a_out(0, 2, UlRange::UNI5VOLTS, 0).unwrap_err().is(ErrorCode::BADDACHAN));
    }

    #[test]
    fn test_digital_port_configuration() {
        let lib = lib();
        let port = DigitalPortType::FIRSTPORTA;
        assert!(lib.d_out(0, port, 0x5a).unwrap_err().is(ErrorCode::WRONGDIGCONFIG));
        lib.d_config_port(0, port, DigitalIODirection::IN).unwrap();
        assert!(lib.d_out(0, port, 0x5a).unwrap_err().is(ErrorCode::WRONGDIGCONFIG));
        lib.d_config_port(0, port, DigitalIODirection::OUT).unwrap();
        lib.d_out(0, port, 0x15a).unwrap();
        assert_eq!(lib.d_in(0, port).unwrap(), 0x5a);
        assert!(lib.d_bit_in(0, port, 1).unwrap());
        lib.d_bit_out(0, port, 1, false).unwrap();
        assert_eq!(lib.d_in(0, port).unwrap(), 0x58);
        assert!(lib.d_bit_in(0, port, 8).unwrap_err().is(ErrorCode::BADBITNUMBER));
        assert!(lib.d_in(0, DigitalPortType::FIRSTPORTB).unwrap_err().is(ErrorCode::BADPORTNUM));
        let err = lib.d_config_bit(0, port, 0, DigitalIODirection::OUT).unwrap_err();
        assert!(err.is(ErrorCode::BADBOARDTYPE));
    }

    #[test]
    fn test_aux_port_bits() {
        let mut board = BoardConfig::demo(0);
        board.dio_ports = vec![DioPortConfig {
            port: DigitalPortType::AUXPORT,
            bits: 4,
        }];
        let lib = SimulatedLibrary::new();
        lib.add_board(board);
        let aux = DigitalPortType::AUXPORT;
        lib.d_config_bit(0, aux, 2, DigitalIODirection::OUT).unwrap();
        lib.d_bit_out(0, aux, 2, true).unwrap();
        assert!(lib.d_bit_out(0, aux, 1, true).unwrap_err().is(ErrorCode::WRONGDIGCONFIG));
        // Only bit 2 is an output, so the write keeps just that bit
        lib.d_out(0, aux, 0xf).unwrap();
        assert_eq!(lib.d_in(0, aux).unwrap(), 0x4);
    }

    #[test]
    fn test_counters() {
        let lib = lib();
        lib.c_load_32(0, 1, 1000).unwrap();
        assert_eq!(lib.c_in_32(0, 1).unwrap(), 1000);
        lib.c_clear(0, 1).unwrap();
        assert_eq!(lib.c_in_32(0, 1).unwrap(), 0);
        assert!(lib.c_in_32(0, 2).unwrap_err().is(ErrorCode::BADCOUNTERDEVNUM));
        assert!(lib.c_load_32(0, 5, 0).unwrap_err().is(ErrorCode::BADCTRREG));
    }

    #[test]
    fn test_temperature_scales() {
        let mut board = BoardConfig::demo(0);
        board.temp_channels = 2;
        board.temperatures.insert("1".to_string(), Signal::new_const(100.0));
        let lib = SimulatedLibrary::new();
        lib.add_board(board);
        assert_eq!(lib.t_in(0, 0, TempScale::CELSIUS, TInOptions::empty()).unwrap(), 22.0);
        assert_eq!(lib.t_in(0, 1, TempScale::FAHRENHEIT, TInOptions::empty()).unwrap(), 212.0);
        let err = lib.t_in(0, 1, TempScale::VOLTS, TInOptions::empty()).unwrap_err();
        assert!(err.is(ErrorCode::BADTEMPSCALE));
        assert!(lib.t_in(0, 2, TempScale::KELVIN, TInOptions::empty()).unwrap_err().is(ErrorCode::BADADCHAN));
    }

    #[test]
    fn test_config_items() {
        let lib = lib();
        let item = |i: BoardInfo| lib.get_config(InfoType::BOARDINFO, 0, 0, i.code()).unwrap();
        assert_eq!(item(BoardInfo::BOARDTYPE), 234);
        assert_eq!(item(BoardInfo::NUMADCHANS), 8);
        assert_eq!(item(BoardInfo::ADRES), 16);
        assert_eq!(item(BoardInfo::DINUMDEVS), 1);
        assert_eq!(item(BoardInfo::CINUMDEVS), 2);
        let err = lib.get_config(InfoType::BOARDINFO, 0, 0, BoardInfo::BASEADR.code()).unwrap_err();
        assert!(err.is(ErrorCode::BADCONFIGITEM));
        let err = lib.set_config(InfoType::BOARDINFO, 0, 0, BoardInfo::ADRES.code(), 12).unwrap_err();
        assert!(err.is(ErrorCode::BADCONFIGITEM));
        lib.set_config(InfoType::BOARDINFO, 0, 0, BoardInfo::CLOCK.code(), 40).unwrap();
        assert_eq!(item(BoardInfo::CLOCK), 40);
        let id = lib
            .get_config_string(InfoType::BOARDINFO, 0, 0, BoardInfo::DEVUNIQUEID.code(), 32)
            .unwrap();
        assert_eq!(id, "01ABCD00");
        assert_eq!(lib.get_config(InfoType::GLOBALINFO, 0, 0, GlobalInfo::NUMBOARDS.code()).unwrap(), 1);
    }

    #[test]
    fn test_foreground_scan_fills_buffer() {
        let lib = lib();
        let handle = lib.win_buf_alloc(8).unwrap();
        lib.a_in_scan(0, 0, 1, 8, 1000, UlRange::BIP10VOLTS, handle, ScanOptions::FOREGROUND)
            .unwrap();
        let data = lib.win_buf_to_array(handle, 0, 8).unwrap();
        let expected = eng_to_counts(UlRange::BIP10VOLTS, 16, 1.25).unwrap() as u16;
        assert!(data.iter().step_by(2).all(|&v| v == expected));
        let status = lib.get_status(0, FunctionType::AIFUNCTION).unwrap();
        assert_eq!(status.status, Status::IDLE);
        assert_eq!(status.cur_count, 8);
        assert_eq!(status.cur_index, 6);
        lib.win_buf_free(handle).unwrap();
        assert!(lib.win_buf_free(handle).unwrap_err().is(ErrorCode::BAD_MEM_HANDLE));
    }

    #[test]
    fn test_scan_samples_follow_signal() {
        let lib = lib();
        let handle = lib.win_buf_alloc(10).unwrap();
        lib.a_in_scan(0, 2, 2, 10, 1000, UlRange::BIP10VOLTS, handle, ScanOptions::FOREGROUND)
            .unwrap();
        let data = lib.win_buf_to_array(handle, 0, 10).unwrap();
        let ramp = Signal::new_ramp(-5.0, 5.0, 1.0);
        for (k, &raw) in data.iter().enumerate() {
            let expected = quantise(UlRange::BIP10VOLTS, 16, ramp.eval(k as f64 / 1000.0)).unwrap();
            assert_eq!(raw as u32, expected, "sample {}", k);
        }
    }

    #[test]
    fn test_gain_queue_sets_scan_ranges() {
        let lib = lib();
        lib.a_load_queue(0, &[0, 0], &[UlRange::BIP5VOLTS, UlRange::BIP10VOLTS]).unwrap();
        let handle = lib.win_buf_alloc(4).unwrap();
        lib.a_in_scan(0, 0, 1, 4, 1000, UlRange::BIP1VOLTS, handle, ScanOptions::FOREGROUND)
            .unwrap();
        let data = lib.win_buf_to_array(handle, 0, 4).unwrap();
        assert_eq!(data, vec![40960, 36864, 40960, 36864]);

        // The queue length fixes the channel count
        let err = lib
            .a_in_scan(0, 0, 2, 3, 1000, UlRange::BIP10VOLTS, handle, ScanOptions::FOREGROUND)
            .unwrap_err();
        assert!(err.is(ErrorCode::BADADCHAN));
        lib.a_load_queue(0, &[], &[]).unwrap();
        lib.a_in_scan(0, 0, 2, 3, 1000, UlRange::BIP10VOLTS, handle, ScanOptions::FOREGROUND)
            .unwrap();

        assert!(lib.a_load_queue(0, &[9], &[UlRange::BIP10VOLTS]).unwrap_err().is(ErrorCode::BADADCHAN));
        assert!(lib.a_load_queue(0, &[0], &[UlRange::UNI10VOLTS]).unwrap_err().is(ErrorCode::BADRANGE));
        assert!(lib.a_load_queue(0, &[0, 1], &[UlRange::BIP10VOLTS]).unwrap_err().is(ErrorCode::BADCOUNT));

        let mut board = BoardConfig::demo(1);
        board.gain_queue = false;
        lib.add_board(board);
        assert!(lib.a_load_queue(1, &[], &[]).unwrap_err().is(ErrorCode::NOQUEUE));
    }

    #[test]
    fn test_daq_channel_types_and_events() {
        let mut board = BoardConfig::demo(0);
        board.daqi_chan_types = vec![ChannelType::ANALOG, ChannelType::DIGITAL8, ChannelType::CTR32LOW];
        board.events = EventType::ON_DATA_AVAILABLE;
        let lib = SimulatedLibrary::new();
        lib.add_board(board);

        let item = |index, item: BoardInfo| lib.get_config(InfoType::BOARDINFO, 0, index, item.code());
        assert_eq!(item(0, BoardInfo::DAQINUMCHANTYPES).unwrap(), 3);
        assert_eq!(item(1, BoardInfo::DAQICHANTYPE).unwrap(), ChannelType::DIGITAL8.code());
        assert!(item(3, BoardInfo::DAQICHANTYPE).unwrap_err().is(ErrorCode::BADCONFIGITEM));
        assert_eq!(item(0, BoardInfo::DAQONUMCHANTYPES).unwrap(), 0);

        assert!(!lib.get_status(0, FunctionType::DAQIFUNCTION).unwrap().is_running());
        assert!(lib.get_status(0, FunctionType::DAQOFUNCTION).unwrap_err().is(ErrorCode::BADBOARDTYPE));

        lib.disable_event(0, EventType::ON_DATA_AVAILABLE).unwrap();
        lib.disable_event(0, EventType::ALL_EVENT_TYPES).unwrap();
        let err = lib.disable_event(0, EventType::ON_CHANGE_DI).unwrap_err();
        assert!(err.is(ErrorCode::BADEVENTTYPE));
    }

    #[test]
    fn test_scan_argument_errors() {
        let lib = lib();
        let handle = lib.win_buf_alloc(10).unwrap();
        let scan = |low, high, n, rate, options| {
            lib.a_in_scan(0, low, high, n, rate, UlRange::BIP10VOLTS, handle, options)
                .unwrap_err()
        };
        let bg = ScanOptions::BACKGROUND;
        assert!(scan(2, 1, 10, 100, bg).is(ErrorCode::BADADCHAN));
        assert!(scan(0, 2, 10, 100, bg).is(ErrorCode::BADCOUNT));
        assert!(scan(0, 1, 10, 0, bg).is(ErrorCode::BADRATE));
        assert!(scan(0, 1, 10, 60_000, bg).is(ErrorCode::BADRATE));
        assert!(scan(0, 1, 12, 100, bg).is(ErrorCode::BADBUFFERSIZE));
        assert!(scan(0, 1, 10, 100, ScanOptions::CONTINUOUS).is(ErrorCode::BADOPTION));
        assert!(scan(0, 1, 10, 100, bg | ScanOptions::EXTCLOCK).is(ErrorCode::BADOPTION));
        let err = lib
            .a_in_scan(0, 0, 1, 10, 100, UlRange::BIP10VOLTS, MemHandle::from_raw(0), bg)
            .unwrap_err();
        assert!(err.is(ErrorCode::BADPOINTER));
    }

    #[test]
    fn test_background_scan_blocks_single_reads() {
        let lib = lib();
        let handle = lib.win_buf_alloc(100).unwrap();
        let options = ScanOptions::BACKGROUND | ScanOptions::CONTINUOUS;
        lib.a_in_scan(0, 0, 0, 100, 1000, UlRange::BIP10VOLTS, handle, options)
            .unwrap();
        assert!(lib.get_status(0, FunctionType::AIFUNCTION).unwrap().is_running());
        assert!(lib.a_in(0, 0, UlRange::BIP10VOLTS).unwrap_err().is(ErrorCode::ALREADYACTIVE));
        let err = lib
            .a_in_scan(0, 0, 0, 100, 1000, UlRange::BIP10VOLTS, handle, options)
            .unwrap_err();
        assert!(err.is(ErrorCode::ALREADYACTIVE));
        lib.stop_background(0, FunctionType::AIFUNCTION).unwrap();
        assert!(!lib.get_status(0, FunctionType::AIFUNCTION).unwrap().is_running());
        lib.a_in(0, 0, UlRange::BIP10VOLTS).unwrap();
    }

    #[test]
    fn test_discovery_lifecycle() {
        let mut hidden = BoardConfig::demo(5);
        hidden.installed = false;
        hidden.unique_id = "00FF10".to_string();
        let lib = SimulatedLibrary::new();
        lib.add_board(hidden);

        let inventory = lib.get_daq_device_inventory(InterfaceType::ANY, 4).unwrap();
        assert_eq!(inventory.len(), 1);
        assert_eq!(inventory[0].nuid, 0xFF10);
        assert!(lib.get_daq_device_inventory(InterfaceType::ETHERNET, 4).unwrap().is_empty());

        lib.create_daq_device(2, &inventory[0]).unwrap();
        assert_eq!(lib.get_board_name(2).unwrap(), "USB-1608FS-Plus");
        assert!(lib.get_daq_device_inventory(InterfaceType::ANY, 4).unwrap().is_empty());
        let err = lib.create_daq_device(2, &inventory[0]).unwrap_err();
        assert!(err.is(ErrorCode::BOARDNUMINUSE));
        let err = lib.create_daq_device(3, &inventory[0]).unwrap_err();
        assert!(err.is(ErrorCode::DEVALREADYCREATED));

        lib.release_daq_device(2).unwrap();
        assert!(lib.release_daq_device(2).unwrap_err().is(ErrorCode::BOARDNOTEXIST));
        assert_eq!(lib.get_daq_device_inventory(InterfaceType::USB, 4).unwrap().len(), 1);
    }

    #[test]
    fn test_err_msg_and_handling() {
        let lib = lib();
        assert_eq!(lib.get_err_msg(1).unwrap(), "Invalid board number specified");
        lib.err_handling(ErrorReporting::DONTPRINT, ErrorHandling::DONTSTOP).unwrap();
        assert_eq!(
            lib.error_settings(),
            (ErrorReporting::DONTPRINT, ErrorHandling::DONTSTOP)
        );
    }
}
