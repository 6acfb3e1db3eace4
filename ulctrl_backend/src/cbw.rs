//! Binding to the vendor's Universal Library (`cbw64.dll` / `cbw32.dll`).
//!
//! ## Overview
//!
//! [`NativeLibrary`] implements [`UniversalLibrary`] by forwarding each call to the matching
//! `cb*` C function. Arguments are converted from their typed form (enums, bitflags, ranges) to
//! the integers the driver expects, and outputs come back through out-pointers.
//!
//! ## Error handling
//!
//! Every call goes through [`NativeLibrary::ul_call`]. A non-zero status is turned into a
//! [`UlError`] carrying the driver's own message from `cbGetErrMsg`, logged with
//! `tracing::error!` and, when `[library] error_log` is configured, appended to that file.
//! Construction switches the driver's own reporting off (`DONTPRINT`, `DONTSTOP`) so errors only
//! surface as `Err` values.
//!
//! ## C types
//!
//! The library is built for Windows, where `LONG`/`ULONG` are 32 bits wide on both targets, so
//! they are spelled as `i32`/`u32` here rather than `c_long`.

use libc::{c_char, c_double, c_float, c_int, c_short, c_uint, c_ushort, c_void};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;

use ulcore_backend::*;

use crate::library::{MemHandle, ScanStatus, UniversalLibrary};

type CLong = i32;
type CULong = u32;
type HGlobal = *mut c_void;

const ERRSTRLEN: usize = 256;
const BOARDNAMELEN: usize = 64;
/// Upper bound on devices fetched by one inventory call.
const MAX_INVENTORY: usize = 64;

#[cfg_attr(target_pointer_width = "64", link(name = "cbw64"))]
#[cfg_attr(target_pointer_width = "32", link(name = "cbw32"))]
extern "system" {
    fn cbGetConfig(InfoType: c_int, BoardNum: c_int, DevNum: c_int, ConfigItem: c_int, ConfigVal: *mut c_int) -> c_int;
    fn cbSetConfig(InfoType: c_int, BoardNum: c_int, DevNum: c_int, ConfigItem: c_int, ConfigVal: c_int) -> c_int;
    fn cbGetConfigString(
        InfoType: c_int,
        BoardNum: c_int,
        DevNum: c_int,
        ConfigItem: c_int,
        ConfigVal: *mut c_char,
        maxConfigLen: *mut c_int,
    ) -> c_int;
    fn cbGetBoardName(BoardNum: c_int, BoardName: *mut c_char) -> c_int;
    fn cbFlashLED(BoardNum: c_int) -> c_int;

    fn cbGetErrMsg(ErrCode: c_int, ErrMsg: *mut c_char) -> c_int;
    fn cbErrHandling(ErrReporting: c_int, ErrHandling: c_int) -> c_int;

    fn cbAIn(BoardNum: c_int, Chan: c_int, Gain: c_int, DataValue: *mut c_ushort) -> c_int;
    fn cbAIn32(BoardNum: c_int, Chan: c_int, Gain: c_int, DataValue: *mut CULong, Options: c_int) -> c_int;
    fn cbVIn(BoardNum: c_int, Chan: c_int, Gain: c_int, DataValue: *mut c_float, Options: c_int) -> c_int;
    fn cbToEngUnits(BoardNum: c_int, Range: c_int, DataVal: c_ushort, EngUnits: *mut c_float) -> c_int;
    fn cbToEngUnits32(BoardNum: c_int, Range: c_int, DataVal: CULong, EngUnits: *mut c_double) -> c_int;
    fn cbFromEngUnits(BoardNum: c_int, Range: c_int, EngUnits: c_float, DataVal: *mut c_ushort) -> c_int;
    fn cbTIn(BoardNum: c_int, Chan: c_int, Scale: c_int, TempValue: *mut c_float, Options: c_int) -> c_int;
    fn cbAChanInputMode(BoardNum: c_int, Chan: c_int, InputMode: c_int) -> c_int;
    fn cbSetTrigger(BoardNum: c_int, TrigType: c_int, LowThreshold: c_ushort, HighThreshold: c_ushort) -> c_int;
    fn cbALoadQueue(BoardNum: c_int, ChanArray: *mut c_short, GainArray: *mut c_short, Count: c_int) -> c_int;

    fn cbAOut(BoardNum: c_int, Chan: c_int, Gain: c_int, DataValue: c_ushort) -> c_int;
    fn cbVOut(BoardNum: c_int, Chan: c_int, Gain: c_int, DataValue: c_float, Options: c_int) -> c_int;

    fn cbDConfigPort(BoardNum: c_int, PortNum: c_int, Direction: c_int) -> c_int;
    fn cbDConfigBit(BoardNum: c_int, PortNum: c_int, BitNum: c_int, Direction: c_int) -> c_int;
    fn cbDIn(BoardNum: c_int, PortNum: c_int, DataValue: *mut c_ushort) -> c_int;
    fn cbDOut(BoardNum: c_int, PortNum: c_int, DataValue: c_ushort) -> c_int;
    fn cbDBitIn(BoardNum: c_int, PortType: c_int, BitNum: c_int, BitValue: *mut c_ushort) -> c_int;
    fn cbDBitOut(BoardNum: c_int, PortType: c_int, BitNum: c_int, BitValue: c_ushort) -> c_int;

    fn cbCIn32(BoardNum: c_int, CounterNum: c_int, Count: *mut CULong) -> c_int;
    fn cbCClear(BoardNum: c_int, CounterNum: c_int) -> c_int;
    fn cbCLoad32(BoardNum: c_int, RegNum: c_int, LoadValue: CULong) -> c_int;

    fn cbWinBufAlloc(NumPoints: CLong) -> HGlobal;
    fn cbWinBufFree(MemHandle: HGlobal) -> c_int;
    fn cbWinBufToArray(MemHandle: HGlobal, DataArray: *mut c_ushort, FirstPoint: CLong, Count: CLong) -> c_int;
    fn cbAInScan(
        BoardNum: c_int,
        LowChan: c_int,
        HighChan: c_int,
        Count: CLong,
        Rate: *mut CLong,
        Gain: c_int,
        MemHandle: HGlobal,
        Options: c_int,
    ) -> c_int;
    fn cbGetStatus(
        BoardNum: c_int,
        Status: *mut c_short,
        CurCount: *mut CLong,
        CurIndex: *mut CLong,
        FunctionType: c_int,
    ) -> c_int;
    fn cbStopBackground(BoardNum: c_int, FunctionType: c_int) -> c_int;
    fn cbDisableEvent(BoardNum: c_int, EventType: c_uint) -> c_int;

    fn cbIgnoreInstaCal() -> c_int;
    fn cbGetDaqDeviceInventory(
        InterfaceType: c_int,
        Inventory: *mut NativeDescriptor,
        NumberOfDevices: *mut c_int,
    ) -> c_int;
    fn cbCreateDaqDevice(BdNum: c_int, DeviceDescriptor: NativeDescriptor) -> c_int;
    fn cbReleaseDaqDevice(BdNum: c_int) -> c_int;
}

fn buf_to_string(buf: &[c_char]) -> String {
    let bytes: Vec<u8> = buf.iter().map(|&c| c as u8).collect();
    read_c_string(&bytes)
}

fn to_clong(value: usize, code: ErrorCode) -> UlResult<CLong> {
    CLong::try_from(value).map_err(|_| UlError::with_context(code, format!("{} does not fit a LONG", value)))
}

/// The vendor library, loaded at link time.
pub struct NativeLibrary {
    error_log: Option<PathBuf>,
}

impl NativeLibrary {
    pub fn new(error_log: Option<PathBuf>) -> UlResult<Self> {
        let lib = NativeLibrary { error_log };
        let reporting = ErrorReporting::DONTPRINT.code();
        let handling = ErrorHandling::DONTSTOP.code();
        lib.ul_call(|| unsafe { cbErrHandling(reporting, handling) })?;
        tracing::info!("Universal Library loaded");
        Ok(lib)
    }

    fn driver_message(&self, code: c_int) -> String {
        let mut buf = [0 as c_char; ERRSTRLEN];
        let status = unsafe { cbGetErrMsg(code, buf.as_mut_ptr()) };
        if status != 0 {
            return UlError::from_code(code).message().to_string();
        }
        buf_to_string(&buf)
    }

    /// Runs one driver call and turns a non-zero status into an error.
    ///
    /// The error is logged, and also appended to the error log file when one is configured.
    /// A log file that cannot be written is reported with `warn!` and does not mask the
    /// driver error.
    pub fn ul_call<F: FnOnce() -> c_int>(&self, func: F) -> UlResult<()> {
        let status = func();
        if status == 0 {
            return Ok(());
        }
        let err = UlError::new(status, self.driver_message(status));
        tracing::error!("{}", err);
        if let Some(path) = &self.error_log {
            let written = OpenOptions::new()
                .append(true)
                .create(true)
                .open(path)
                .and_then(|mut file| writeln!(file, "UL {}", err));
            if let Err(io_err) = written {
                tracing::warn!("could not append to {}: {}", path.display(), io_err);
            }
        }
        Err(err)
    }
}

impl UniversalLibrary for NativeLibrary {
    fn get_config(&self, info_type: InfoType, board_num: i32, dev_num: i32, config_item: i32) -> UlResult<i32> {
        let mut value: c_int = 0;
        self.ul_call(|| unsafe { cbGetConfig(info_type.code(), board_num, dev_num, config_item, &mut value) })?;
        Ok(value)
    }

    fn set_config(
        &self,
        info_type: InfoType,
        board_num: i32,
        dev_num: i32,
        config_item: i32,
        value: i32,
    ) -> UlResult<()> {
        self.ul_call(|| unsafe { cbSetConfig(info_type.code(), board_num, dev_num, config_item, value) })
    }

    fn get_config_string(
        &self,
        info_type: InfoType,
        board_num: i32,
        dev_num: i32,
        config_item: i32,
        max_len: usize,
    ) -> UlResult<String> {
        let mut buf = vec![0 as c_char; max_len.max(1)];
        let mut len = to_clong(buf.len(), ErrorCode::BADBUFFERSIZE)?;
        self.ul_call(|| unsafe {
            cbGetConfigString(info_type.code(), board_num, dev_num, config_item, buf.as_mut_ptr(), &mut len)
        })?;
        Ok(buf_to_string(&buf))
    }

    fn get_board_name(&self, board_num: i32) -> UlResult<String> {
        let mut buf = [0 as c_char; BOARDNAMELEN];
        self.ul_call(|| unsafe { cbGetBoardName(board_num, buf.as_mut_ptr()) })?;
        Ok(buf_to_string(&buf))
    }

    fn flash_led(&self, board_num: i32) -> UlResult<()> {
        self.ul_call(|| unsafe { cbFlashLED(board_num) })
    }

    fn get_err_msg(&self, code: i32) -> UlResult<String> {
        let mut buf = [0 as c_char; ERRSTRLEN];
        self.ul_call(|| unsafe { cbGetErrMsg(code, buf.as_mut_ptr()) })?;
        Ok(buf_to_string(&buf))
    }

    fn err_handling(&self, reporting: ErrorReporting, handling: ErrorHandling) -> UlResult<()> {
        self.ul_call(|| unsafe { cbErrHandling(reporting.code(), handling.code()) })
    }

    fn a_in(&self, board_num: i32, channel: i32, range: UlRange) -> UlResult<u16> {
        let mut value: c_ushort = 0;
        self.ul_call(|| unsafe { cbAIn(board_num, channel, range.code(), &mut value) })?;
        Ok(value)
    }

    fn a_in_32(&self, board_num: i32, channel: i32, range: UlRange, options: i32) -> UlResult<u32> {
        let mut value: CULong = 0;
        self.ul_call(|| unsafe { cbAIn32(board_num, channel, range.code(), &mut value, options) })?;
        Ok(value)
    }

    fn v_in(&self, board_num: i32, channel: i32, range: UlRange, options: VInOptions) -> UlResult<f32> {
        let mut value: c_float = 0.0;
        self.ul_call(|| unsafe { cbVIn(board_num, channel, range.code(), &mut value, options.bits()) })?;
        Ok(value)
    }

    fn to_eng_units(&self, board_num: i32, range: UlRange, data_value: u16) -> UlResult<f32> {
        let mut value: c_float = 0.0;
        self.ul_call(|| unsafe { cbToEngUnits(board_num, range.code(), data_value, &mut value) })?;
        Ok(value)
    }

    fn to_eng_units_32(&self, board_num: i32, range: UlRange, data_value: u32) -> UlResult<f64> {
        let mut value: c_double = 0.0;
        self.ul_call(|| unsafe { cbToEngUnits32(board_num, range.code(), data_value, &mut value) })?;
        Ok(value)
    }

    fn from_eng_units(&self, board_num: i32, range: UlRange, eng_units_value: f32) -> UlResult<u16> {
        let mut value: c_ushort = 0;
        self.ul_call(|| unsafe { cbFromEngUnits(board_num, range.code(), eng_units_value, &mut value) })?;
        Ok(value)
    }

    fn t_in(&self, board_num: i32, channel: i32, scale: TempScale, options: TInOptions) -> UlResult<f32> {
        let mut value: c_float = 0.0;
        self.ul_call(|| unsafe { cbTIn(board_num, channel, scale.code(), &mut value, options.bits()) })?;
        Ok(value)
    }

    fn a_chan_input_mode(&self, board_num: i32, channel: i32, input_mode: AnalogInputMode) -> UlResult<()> {
        self.ul_call(|| unsafe { cbAChanInputMode(board_num, channel, input_mode.code()) })
    }

    fn set_trigger(&self, board_num: i32, trig_type: TrigType, low_threshold: u16, high_threshold: u16) -> UlResult<()> {
        self.ul_call(|| unsafe { cbSetTrigger(board_num, trig_type.code(), low_threshold, high_threshold) })
    }

    fn a_load_queue(&self, board_num: i32, chans: &[i32], gains: &[UlRange]) -> UlResult<()> {
        if chans.len() != gains.len() {
            return Err(UlError::with_context(
                ErrorCode::BADCOUNT,
                format!("{} channels but {} gains", chans.len(), gains.len()),
            ));
        }
        let narrow = |value: i32| {
            c_short::try_from(value).map_err(|_| UlError::with_context(ErrorCode::BADADCHAN, value))
        };
        let mut chan_array = chans.iter().map(|&c| narrow(c)).collect::<UlResult<Vec<_>>>()?;
        let mut gain_array = gains.iter().map(|g| narrow(g.code())).collect::<UlResult<Vec<_>>>()?;
        let count = chan_array.len() as c_int;
        self.ul_call(|| unsafe {
            cbALoadQueue(board_num, chan_array.as_mut_ptr(), gain_array.as_mut_ptr(), count)
        })
    }

    fn a_out(&self, board_num: i32, channel: i32, range: UlRange, data_value: u16) -> UlResult<()> {
        self.ul_call(|| unsafe { cbAOut(board_num, channel, range.code(), data_value) })
    }

    fn v_out(&self, board_num: i32, channel: i32, range: UlRange, value: f32, options: VInOptions) -> UlResult<()> {
        self.ul_call(|| unsafe { cbVOut(board_num, channel, range.code(), value, options.bits()) })
    }

    fn d_config_port(&self, board_num: i32, port: DigitalPortType, direction: DigitalIODirection) -> UlResult<()> {
        self.ul_call(|| unsafe { cbDConfigPort(board_num, port.code(), direction.code()) })
    }

    fn d_config_bit(
        &self,
        board_num: i32,
        port_type: DigitalPortType,
        bit_num: i32,
        direction: DigitalIODirection,
    ) -> UlResult<()> {
        self.ul_call(|| unsafe { cbDConfigBit(board_num, port_type.code(), bit_num, direction.code()) })
    }

    fn d_in(&self, board_num: i32, port: DigitalPortType) -> UlResult<u16> {
        let mut value: c_ushort = 0;
        self.ul_call(|| unsafe { cbDIn(board_num, port.code(), &mut value) })?;
        Ok(value)
    }

    fn d_out(&self, board_num: i32, port: DigitalPortType, data_value: u16) -> UlResult<()> {
        self.ul_call(|| unsafe { cbDOut(board_num, port.code(), data_value) })
    }

    fn d_bit_in(&self, board_num: i32, port_type: DigitalPortType, bit_num: i32) -> UlResult<bool> {
        let mut value: c_ushort = 0;
        self.ul_call(|| unsafe { cbDBitIn(board_num, port_type.code(), bit_num, &mut value) })?;
        Ok(value != 0)
    }

    fn d_bit_out(&self, board_num: i32, port_type: DigitalPortType, bit_num: i32, bit_value: bool) -> UlResult<()> {
        self.ul_call(|| unsafe { cbDBitOut(board_num, port_type.code(), bit_num, bit_value as c_ushort) })
    }

    fn c_in_32(&self, board_num: i32, counter_num: i32) -> UlResult<u32> {
        let mut count: CULong = 0;
        self.ul_call(|| unsafe { cbCIn32(board_num, counter_num, &mut count) })?;
        Ok(count)
    }

    fn c_clear(&self, board_num: i32, counter_num: i32) -> UlResult<()> {
        self.ul_call(|| unsafe { cbCClear(board_num, counter_num) })
    }

    fn c_load_32(&self, board_num: i32, reg_num: i32, load_value: u32) -> UlResult<()> {
        self.ul_call(|| unsafe { cbCLoad32(board_num, reg_num, load_value) })
    }

    fn win_buf_alloc(&self, num_points: usize) -> UlResult<MemHandle> {
        let points = to_clong(num_points, ErrorCode::BADBUFFERSIZE)?;
        let handle = unsafe { cbWinBufAlloc(points) };
        if handle.is_null() {
            let err = UlError::with_context(ErrorCode::NO_MEMORY_FOR_BUFFER, format!("{} points", num_points));
            tracing::error!("{}", err);
            return Err(err);
        }
        Ok(MemHandle::from_raw(handle as usize))
    }

    fn win_buf_free(&self, handle: MemHandle) -> UlResult<()> {
        self.ul_call(|| unsafe { cbWinBufFree(handle.raw() as HGlobal) })
    }

    fn win_buf_to_array(&self, handle: MemHandle, first_point: usize, count: usize) -> UlResult<Vec<u16>> {
        if handle.is_null() {
            return Err(ErrorCode::BADPOINTER.into());
        }
        let first = to_clong(first_point, ErrorCode::BADBUFFERSIZE)?;
        let n = to_clong(count, ErrorCode::BADBUFFERSIZE)?;
        let mut data = vec![0u16; count];
        self.ul_call(|| unsafe { cbWinBufToArray(handle.raw() as HGlobal, data.as_mut_ptr(), first, n) })?;
        Ok(data)
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
        let count = to_clong(num_points, ErrorCode::BADCOUNT)?;
        let mut actual_rate = CLong::try_from(rate).map_err(|_| UlError::with_context(ErrorCode::BADRATE, rate))?;
        self.ul_call(|| unsafe {
            cbAInScan(
                board_num,
                low_chan,
                high_chan,
                count,
                &mut actual_rate,
                range.code(),
                handle.raw() as HGlobal,
                options.bits(),
            )
        })?;
        Ok(actual_rate.max(0) as u32)
    }

    fn get_status(&self, board_num: i32, function: FunctionType) -> UlResult<ScanStatus> {
        let mut status: c_short = 0;
        let mut cur_count: CLong = 0;
        let mut cur_index: CLong = 0;
        self.ul_call(|| unsafe {
            cbGetStatus(board_num, &mut status, &mut cur_count, &mut cur_index, function.code())
        })?;
        Ok(ScanStatus {
            status: Status::try_from(status as i32)?,
            cur_count: cur_count as i64,
            cur_index: cur_index as i64,
        })
    }

    fn stop_background(&self, board_num: i32, function: FunctionType) -> UlResult<()> {
        self.ul_call(|| unsafe { cbStopBackground(board_num, function.code()) })
    }

    fn disable_event(&self, board_num: i32, event_type: EventType) -> UlResult<()> {
        self.ul_call(|| unsafe { cbDisableEvent(board_num, event_type.bits() as c_uint) })
    }

    fn ignore_instacal(&self) -> UlResult<()> {
        self.ul_call(|| unsafe { cbIgnoreInstaCal() })
    }

    fn get_daq_device_inventory(&self, interface: InterfaceType, max_devices: usize) -> UlResult<Vec<DaqDeviceDescriptor>> {
        let capacity = max_devices.min(MAX_INVENTORY);
        let mut inventory = vec![NativeDescriptor::zeroed(); capacity];
        let mut found = capacity as c_int;
        self.ul_call(|| unsafe {
            cbGetDaqDeviceInventory(interface.bits() as c_int, inventory.as_mut_ptr(), &mut found)
        })?;
        let found = (found.max(0) as usize).min(capacity);
        Ok(inventory[..found].iter().map(DaqDeviceDescriptor::from).collect())
    }

    fn create_daq_device(&self, board_num: i32, descriptor: &DaqDeviceDescriptor) -> UlResult<()> {
        let native = descriptor.to_native();
        self.ul_call(|| unsafe { cbCreateDaqDevice(board_num, native) })
    }

    fn release_daq_device(&self, board_num: i32) -> UlResult<()> {
        self.ul_call(|| unsafe { cbReleaseDaqDevice(board_num) })
    }
}
