//! Capability discovery for a board.
//!
//! ## Overview
//!
//! [`DaqDeviceInfo::new`] queries a board's configuration tables and probes the operations the
//! configuration does not describe (which ranges are accepted, whether scans or triggers work,
//! whether ports can change direction). The result is a plain snapshot that can be printed or
//! serialized.
//!
//! ## Probing side effects
//!
//! Probes are real calls. Finding the analog output ranges writes `0` to output channel 0,
//! checking port configurability leaves configurable ports set to input, checking analog
//! triggering sets a `TRIG_ABOVE` trigger and checking the gain queue clears it. Event types are
//! found by disabling each event. Build the info before configuring the board for use,
//! or hard-code the values once known.
//!
//! A failing probe simply means "not supported", except for `NETDEVINUSE` and
//! `NETDEVINUSEBYANOTHERPROC`: a network device owned by someone else says nothing about the
//! hardware, so those errors are returned instead.

use serde::Serialize;
use tracing::{debug, warn};

use ulcore_backend::*;

use crate::board::Board;

/// Product ids whose analog trigger compares 12-bit values.
const TRIG_RES_12_BIT_TYPES: &[i32] = &[
    95, 96, 97, 98, 102, 165, 166, 167, 168, 177, 178, 179, 180, 203, 204, 205, 213, 214, 215, 216, 217,
];
const TRIG_RES_8_BIT_TYPES: &[i32] = &[101, 103, 104];

fn is_net_in_use(err: &UlError) -> bool {
    err.error_code().map_or(false, ErrorCode::is_net_device_in_use)
}

/// Maps a probe outcome to "supported?", re-raising network ownership errors.
fn probe<T>(what: &str, result: UlResult<T>) -> UlResult<bool> {
    match result {
        Ok(_) => Ok(true),
        Err(err) if is_net_in_use(&err) => Err(err),
        Err(err) => {
            debug!("probe {} failed: {}", what, err);
            Ok(false)
        }
    }
}

fn non_negative(value: i32) -> u32 {
    value.max(0) as u32
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AiInfo {
    pub board_num: i32,
    pub num_chans: u32,
    pub num_temp_chans: u32,
    pub resolution: u32,
    pub supports_scan: bool,
    pub supported_ranges: Vec<UlRange>,
    /// `a_in_scan` counts in `CONTINUOUS | BLOCKIO` mode must be a multiple of this.
    pub packet_size: u32,
    pub supports_v_in: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub supported_scan_options: Option<ScanOptions>,
    pub analog_trig_resolution: u32,
    pub analog_trig_range: UlRange,
    pub supports_analog_trig: bool,
    /// Accepts a channel/gain queue. Probing loads an empty queue, clearing any loaded one.
    pub supports_gain_queue: bool,
}

impl AiInfo {
    pub fn new(board: &Board) -> UlResult<Self> {
        let board_type = board.board_config(BoardInfo::BOARDTYPE)?;
        let num_chans = non_negative(board.board_config(BoardInfo::NUMADCHANS)?);
        let num_temp_chans = non_negative(board.board_config(BoardInfo::NUMTEMPCHANS)?);
        let resolution = non_negative(board.board_config(BoardInfo::ADRES)?);
        let supports_scan = board.get_status(FunctionType::AIFUNCTION).is_ok();
        let supported_ranges = Self::probe_ranges(board, resolution)?;

        let supports_v_in = match supported_ranges.first() {
            Some(&range) => probe("v_in", board.v_in(0, range, VInOptions::DEFAULT))?,
            None => false,
        };
        let supported_scan_options = if supports_scan {
            Some(ScanOptions::from_bits_retain(board.board_config(BoardInfo::ADSCANOPTIONS)?))
        } else {
            None
        };

        let analog_trig_resolution = Self::trig_resolution(board_type);
        let trig_source = board.board_config(BoardInfo::ADTRIGSRC).unwrap_or(0);
        let analog_trig_range = if analog_trig_resolution > 0 && trig_source <= 0 {
            UlRange::BIP10VOLTS
        } else {
            UlRange::UNKNOWN
        };
        let supports_analog_trig = board.set_trigger(TrigType::TRIG_ABOVE, 0, 0).is_ok();
        let supports_gain_queue = probe("a_load_queue", board.a_load_queue(&[]))?;

        Ok(AiInfo {
            board_num: board.board_num(),
            num_chans,
            num_temp_chans,
            resolution,
            supports_scan,
            supported_ranges,
            packet_size: Self::packet_size(board_type),
            supports_v_in,
            supported_scan_options,
            analog_trig_resolution,
            analog_trig_range,
            supports_analog_trig,
            supports_gain_queue,
        })
    }

    fn probe_ranges(board: &Board, resolution: u32) -> UlResult<Vec<UlRange>> {
        let hard_range = board.board_config(BoardInfo::RANGE)?;
        if hard_range >= 0 {
            return Ok(vec![UlRange::try_from_code(hard_range)?]);
        }
        let mut ranges = Vec::new();
        for range in UlRange::all() {
            let read = if resolution <= 16 {
                board.a_in(0, range).map(|_| ())
            } else {
                board.a_in_32(0, range, 0).map(|_| ())
            };
            if probe("a_in range", read)? {
                ranges.push(range);
            }
        }
        Ok(ranges)
    }

    pub fn packet_size(board_type: i32) -> u32 {
        match board_type {
            122 => 64,
            130 | 161 | 240 => 31,
            _ => 1,
        }
    }

    pub fn trig_resolution(board_type: i32) -> u32 {
        if TRIG_RES_12_BIT_TYPES.contains(&board_type) {
            12
        } else if TRIG_RES_8_BIT_TYPES.contains(&board_type) {
            8
        } else {
            0
        }
    }

    pub fn is_supported(&self) -> bool {
        self.num_chans > 0
    }

    pub fn temp_supported(&self) -> bool {
        self.num_temp_chans > 0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AoInfo {
    pub board_num: i32,
    pub num_chans: u32,
    pub resolution: u32,
    pub supported_ranges: Vec<UlRange>,
    pub supported_scan_options: ScanOptions,
    pub supports_scan: bool,
    pub supports_v_out: bool,
}

impl AoInfo {
    pub fn new(board: &Board) -> UlResult<Self> {
        let num_chans = non_negative(board.board_config(BoardInfo::NUMDACHANS)?);
        let resolution = non_negative(board.board_config(BoardInfo::DACRES)?);
        let supported_scan_options = board
            .board_config(BoardInfo::DACSCANOPTIONS)
            .map(ScanOptions::from_bits_retain)
            .unwrap_or(ScanOptions::empty());
        let supported_ranges = Self::probe_ranges(board)?;
        let supports_v_out = match supported_ranges.first() {
            Some(&range) => board.v_out(0, range, 0.0, VInOptions::DEFAULT).is_ok(),
            None => false,
        };
        Ok(AoInfo {
            board_num: board.board_num(),
            num_chans,
            resolution,
            supported_ranges,
            supports_scan: supported_scan_options.contains(ScanOptions::CONTINUOUS),
            supported_scan_options,
            supports_v_out,
        })
    }

    fn probe_ranges(board: &Board) -> UlResult<Vec<UlRange>> {
        // Boards with jumpered ranges accept any range argument, even one that does not exist
        let range_ignored = probe("a_out bogus range", board.a_out(0, UlRange::NOTUSED, 0))?;
        if range_ignored {
            let current = board
                .board_config(BoardInfo::DACRANGE)
                .and_then(UlRange::try_from_code);
            return match current {
                Ok(range) => Ok(vec![range]),
                Err(err) if is_net_in_use(&err) => Err(err),
                Err(err) => {
                    warn!("board {} ignores the D/A range but reports none: {}", board.board_num(), err);
                    Ok(Vec::new())
                }
            };
        }
        let mut ranges = Vec::new();
        for range in UlRange::all() {
            if probe("a_out range", board.a_out(0, range, 0))? {
                ranges.push(range);
            }
        }
        Ok(ranges)
    }

    pub fn is_supported(&self) -> bool {
        self.num_chans > 0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PortInfo {
    pub port_index: i32,
    pub port_type: DigitalPortType,
    pub num_bits: u32,
    pub in_mask: u32,
    pub out_mask: u32,
    pub first_bit: i32,
    pub is_port_configurable: bool,
    pub is_bit_configurable: bool,
    pub supports_input: bool,
    pub supports_output: bool,
    pub supports_input_scan: bool,
    pub supports_output_scan: bool,
}

impl PortInfo {
    pub fn new(board: &Board, port_index: i32) -> UlResult<Self> {
        let port_type = DigitalPortType::try_from(board.digital_config(port_index, DigitalInfo::DEVTYPE)?)?;
        let num_bits = non_negative(board.digital_config(port_index, DigitalInfo::NUMBITS)?);
        let in_mask = board.digital_config(port_index, DigitalInfo::INMASK)? as u32;
        let out_mask = board.digital_config(port_index, DigitalInfo::OUTMASK)? as u32;
        // The high nibble of the first port C is addressed from bit 16
        let first_bit = if port_index == 0 && port_type == DigitalPortType::FIRSTPORTCL {
            16
        } else {
            0
        };

        let no_fixed_bits = in_mask & out_mask == 0;
        let is_port_configurable = no_fixed_bits
            && board
                .d_config_port(port_type, DigitalIODirection::OUT)
                .and_then(|_| board.d_config_port(port_type, DigitalIODirection::IN))
                .is_ok();
        let is_bit_configurable = no_fixed_bits
            && port_type == DigitalPortType::AUXPORT
            && board
                .d_config_bit(port_type, first_bit, DigitalIODirection::OUT)
                .and_then(|_| board.d_config_bit(port_type, first_bit, DigitalIODirection::IN))
                .is_ok();

        Ok(PortInfo {
            port_index,
            port_type,
            num_bits,
            in_mask,
            out_mask,
            first_bit,
            is_port_configurable,
            is_bit_configurable,
            supports_input: in_mask > 0 || is_port_configurable,
            supports_output: out_mask > 0 || is_port_configurable,
            supports_input_scan: board.get_status(FunctionType::DIFUNCTION).is_ok(),
            supports_output_scan: board.get_status(FunctionType::DOFUNCTION).is_ok(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DioInfo {
    pub board_num: i32,
    pub num_ports: u32,
    pub port_info: Vec<PortInfo>,
}

impl DioInfo {
    pub fn new(board: &Board) -> UlResult<Self> {
        let num_ports = board.board_config(BoardInfo::DINUMDEVS).map_or(0, non_negative);
        let port_info = (0..num_ports as i32)
            .map(|index| PortInfo::new(board, index))
            .collect::<UlResult<Vec<_>>>()?;
        Ok(DioInfo {
            board_num: board.board_num(),
            num_ports,
            port_info,
        })
    }

    pub fn is_supported(&self) -> bool {
        self.num_ports > 0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CtrChanInfo {
    pub channel_num: i32,
    pub counter_type: CounterChannelType,
    pub supported_scan_options: ScanOptions,
}

impl CtrChanInfo {
    pub fn new(board: &Board, chan_index: i32) -> UlResult<Self> {
        let scan_options = board.lib().get_config(
            InfoType::BOARDINFO,
            board.board_num(),
            chan_index,
            BoardInfo::CTRSCANOPTIONS.code(),
        )?;
        Ok(CtrChanInfo {
            channel_num: board.counter_config(chan_index, CounterInfo::CTRNUM)?,
            counter_type: CounterChannelType::try_from(board.counter_config(chan_index, CounterInfo::CTRTYPE)?)?,
            supported_scan_options: ScanOptions::from_bits_retain(scan_options),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CtrInfo {
    pub board_num: i32,
    pub num_chans: u32,
    pub chan_info: Vec<CtrChanInfo>,
}

impl CtrInfo {
    pub fn new(board: &Board) -> UlResult<Self> {
        let num_chans = non_negative(board.board_config(BoardInfo::CINUMDEVS)?);
        let chan_info = (0..num_chans as i32)
            .map(|index| CtrChanInfo::new(board, index))
            .collect::<UlResult<Vec<_>>>()?;
        Ok(CtrInfo {
            board_num: board.board_num(),
            num_chans,
            chan_info,
        })
    }

    pub fn is_supported(&self) -> bool {
        self.num_chans > 0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExpInfo {
    pub board_num: i32,
    pub expansion_num: i32,
    pub board_type: i32,
    pub mux_ad_chan: i32,
}

impl ExpInfo {
    pub fn new(board: &Board, expansion_num: i32) -> UlResult<Self> {
        Ok(ExpInfo {
            board_num: board.board_num(),
            expansion_num,
            board_type: board.expansion_config(expansion_num, ExpansionInfo::BOARDTYPE)?,
            mux_ad_chan: board.expansion_config(expansion_num, ExpansionInfo::MUX_AD_CHAN1)?,
        })
    }
}

/// Whether DAQ scans of `function` work, and the channel types they accept.
fn daq_channel_types(
    board: &Board,
    function: FunctionType,
    count_item: BoardInfo,
    type_item: BoardInfo,
) -> UlResult<(bool, Vec<ChannelType>)> {
    if !probe(function.name(), board.get_status(function))? {
        return Ok((false, Vec::new()));
    }
    let count = board.board_config(count_item)?;
    let types = (0..count)
        .map(|index| {
            let code = board
                .lib()
                .get_config(InfoType::BOARDINFO, board.board_num(), index, type_item.code())?;
            ChannelType::try_from(code)
        })
        .collect::<UlResult<Vec<_>>>()?;
    Ok((true, types))
}

/// DAQ input scans (`daq_in_scan`), which mix analog, digital and counter channels.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DaqiInfo {
    pub board_num: i32,
    pub is_supported: bool,
    pub supported_channel_types: Vec<ChannelType>,
}

impl DaqiInfo {
    pub fn new(board: &Board) -> UlResult<Self> {
        let (is_supported, supported_channel_types) = daq_channel_types(
            board,
            FunctionType::DAQIFUNCTION,
            BoardInfo::DAQINUMCHANTYPES,
            BoardInfo::DAQICHANTYPE,
        )?;
        Ok(DaqiInfo {
            board_num: board.board_num(),
            is_supported,
            supported_channel_types,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DaqoInfo {
    pub board_num: i32,
    pub is_supported: bool,
    pub supported_channel_types: Vec<ChannelType>,
}

impl DaqoInfo {
    pub fn new(board: &Board) -> UlResult<Self> {
        let (is_supported, supported_channel_types) = daq_channel_types(
            board,
            FunctionType::DAQOFUNCTION,
            BoardInfo::DAQONUMCHANTYPES,
            BoardInfo::DAQOCHANTYPE,
        )?;
        Ok(DaqoInfo {
            board_num: board.board_num(),
            is_supported,
            supported_channel_types,
        })
    }
}

/// Events `disable_event` accepts, which are the ones the board can raise.
fn probe_event_types(board: &Board) -> UlResult<Vec<EventType>> {
    let mut events = Vec::new();
    for event in EventType::singles() {
        if probe("disable_event", board.disable_event(event))? {
            events.push(event);
        }
    }
    Ok(events)
}

/// Everything known about one board.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DaqDeviceInfo {
    pub board_num: i32,
    pub product_name: String,
    pub product_id: i32,
    pub unique_id: String,
    pub num_expansions: u32,
    pub supported_event_types: Vec<EventType>,
    pub ai_info: AiInfo,
    pub ao_info: AoInfo,
    pub dio_info: DioInfo,
    pub ctr_info: CtrInfo,
    pub daqi_info: DaqiInfo,
    pub daqo_info: DaqoInfo,
    pub exp_info: Vec<ExpInfo>,
}

impl DaqDeviceInfo {
    pub fn new(board: &Board) -> UlResult<Self> {
        let product_id = board.board_config(BoardInfo::BOARDTYPE)?;
        if product_id == 0 {
            return Err(UlError::with_context(
                ErrorCode::BADBOARD,
                format!("board {} has no device", board.board_num()),
            ));
        }
        let num_expansions = non_negative(board.board_config(BoardInfo::NUMEXPS)?);
        let exp_info = (0..num_expansions as i32)
            .map(|index| ExpInfo::new(board, index))
            .collect::<UlResult<Vec<_>>>()?;
        let info = DaqDeviceInfo {
            board_num: board.board_num(),
            product_name: board.name()?,
            product_id,
            unique_id: board.board_config_string(BoardInfo::DEVUNIQUEID, 32)?,
            num_expansions,
            supported_event_types: probe_event_types(board)?,
            ai_info: AiInfo::new(board)?,
            ao_info: AoInfo::new(board)?,
            dio_info: DioInfo::new(board)?,
            ctr_info: CtrInfo::new(board)?,
            daqi_info: DaqiInfo::new(board)?,
            daqo_info: DaqoInfo::new(board)?,
            exp_info,
        };
        debug!(board_num = info.board_num, product = %info.product_name, "device info collected");
        Ok(info)
    }

    pub fn supports_analog_input(&self) -> bool {
        self.ai_info.is_supported()
    }

    pub fn supports_temp_input(&self) -> bool {
        self.ai_info.temp_supported()
    }

    pub fn supports_analog_output(&self) -> bool {
        self.ao_info.is_supported()
    }

    pub fn supports_digital_io(&self) -> bool {
        self.dio_info.is_supported()
    }

    pub fn supports_counters(&self) -> bool {
        self.ctr_info.is_supported()
    }

    pub fn supports_daq_input(&self) -> bool {
        self.daqi_info.is_supported
    }

    pub fn supports_daq_output(&self) -> bool {
        self.daqo_info.is_supported
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_packet_size_and_trigger_tables() {
        assert_eq!(AiInfo::packet_size(122), 64);
        assert_eq!(AiInfo::packet_size(161), 31);
        assert_eq!(AiInfo::packet_size(234), 1);
        assert_eq!(AiInfo::trig_resolution(102), 12);
        assert_eq!(AiInfo::trig_resolution(104), 8);
        assert_eq!(AiInfo::trig_resolution(234), 0);
    }

    #[test]
    fn test_probe_reraises_net_device_in_use() {
        let err: UlResult<()> = Err(ErrorCode::NETDEVINUSE.into());
        assert!(probe("test", err).is_err());
        let err: UlResult<()> = Err(ErrorCode::BADRANGE.into());
        assert_eq!(probe("test", err).unwrap(), false);
        assert!(probe("test", Ok(())).unwrap());
    }
}
