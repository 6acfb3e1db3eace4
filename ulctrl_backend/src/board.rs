//! Safe handle on one board number.
//!
//! [`Board`] binds a board number to a [`UniversalLibrary`] and forwards every operation with that
//! number filled in. The typical single-read pattern is two calls, a raw read followed by a
//! conversion with the same board and range:
//!
//! ```
//! use ulcore_backend::*;
//! use ulctrl_backend::*;
//!
//! let lib = open_library(&UlConfig::demo()).unwrap();
//! let board = Board::new(0, lib);
//! let raw = board.a_in(0, UlRange::BIP10VOLTS).unwrap();
//! let volts = board.to_eng_units(UlRange::BIP10VOLTS, raw).unwrap();
//! assert!((volts - 1.25).abs() < 1e-3);
//! ```

use std::sync::Arc;

use ulcore_backend::*;

use crate::library::{ScanStatus, UniversalLibrary};

#[derive(Clone)]
pub struct Board {
    board_num: i32,
    lib: Arc<dyn UniversalLibrary>,
}

impl std::fmt::Debug for Board {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.debug_struct("Board").field("board_num", &self.board_num).finish()
    }
}

impl Board {
    pub fn new(board_num: i32, lib: Arc<dyn UniversalLibrary>) -> Self {
        Board { board_num, lib }
    }

    pub fn board_num(&self) -> i32 {
        self.board_num
    }

    pub fn lib(&self) -> &Arc<dyn UniversalLibrary> {
        &self.lib
    }

    pub fn name(&self) -> UlResult<String> {
        self.lib.get_board_name(self.board_num)
    }

    /// A/D resolution in bits.
    pub fn resolution(&self) -> UlResult<u32> {
        let bits = self.board_config(BoardInfo::ADRES)?;
        Ok(bits.max(0) as u32)
    }

    pub fn flash_led(&self) -> UlResult<()> {
        self.lib.flash_led(self.board_num)
    }

    // Configuration
    pub fn board_config(&self, item: BoardInfo) -> UlResult<i32> {
        self.lib.get_config(InfoType::BOARDINFO, self.board_num, 0, item.code())
    }

    pub fn set_board_config(&self, item: BoardInfo, value: i32) -> UlResult<()> {
        self.lib.set_config(InfoType::BOARDINFO, self.board_num, 0, item.code(), value)
    }

    pub fn board_config_string(&self, item: BoardInfo, max_len: usize) -> UlResult<String> {
        self.lib
            .get_config_string(InfoType::BOARDINFO, self.board_num, 0, item.code(), max_len)
    }

    pub fn digital_config(&self, dev_num: i32, item: DigitalInfo) -> UlResult<i32> {
        self.lib.get_config(InfoType::DIGITALINFO, self.board_num, dev_num, item.code())
    }

    pub fn counter_config(&self, dev_num: i32, item: CounterInfo) -> UlResult<i32> {
        self.lib.get_config(InfoType::COUNTERINFO, self.board_num, dev_num, item.code())
    }

    pub fn expansion_config(&self, dev_num: i32, item: ExpansionInfo) -> UlResult<i32> {
        self.lib.get_config(InfoType::EXPANSIONINFO, self.board_num, dev_num, item.code())
    }

    // Analog input
    pub fn a_in(&self, channel: i32, range: UlRange) -> UlResult<u16> {
        self.lib.a_in(self.board_num, channel, range)
    }

    pub fn a_in_32(&self, channel: i32, range: UlRange, options: i32) -> UlResult<u32> {
        self.lib.a_in_32(self.board_num, channel, range, options)
    }

    pub fn v_in(&self, channel: i32, range: UlRange, options: VInOptions) -> UlResult<f32> {
        self.lib.v_in(self.board_num, channel, range, options)
    }

    pub fn to_eng_units(&self, range: UlRange, data_value: u16) -> UlResult<f32> {
        self.lib.to_eng_units(self.board_num, range, data_value)
    }

    pub fn to_eng_units_32(&self, range: UlRange, data_value: u32) -> UlResult<f64> {
        self.lib.to_eng_units_32(self.board_num, range, data_value)
    }

    pub fn from_eng_units(&self, range: UlRange, value: f32) -> UlResult<u16> {
        self.lib.from_eng_units(self.board_num, range, value)
    }

    /// Reads one channel and converts it, using the 32-bit calls on boards wider than 16 bits.
    pub fn a_in_eng(&self, channel: i32, range: UlRange) -> UlResult<f64> {
        if self.resolution()? > 16 {
            let raw = self.a_in_32(channel, range, 0)?;
            self.to_eng_units_32(range, raw)
        } else {
            let raw = self.a_in(channel, range)?;
            Ok(self.to_eng_units(range, raw)? as f64)
        }
    }

    pub fn t_in(&self, channel: i32, scale: TempScale, options: TInOptions) -> UlResult<f32> {
        self.lib.t_in(self.board_num, channel, scale, options)
    }

    pub fn a_chan_input_mode(&self, channel: i32, mode: AnalogInputMode) -> UlResult<()> {
        self.lib.a_chan_input_mode(self.board_num, channel, mode)
    }

    pub fn set_trigger(&self, trig_type: TrigType, low_threshold: u16, high_threshold: u16) -> UlResult<()> {
        self.lib
            .set_trigger(self.board_num, trig_type, low_threshold, high_threshold)
    }

    /// Loads `(channel, range)` pairs into the channel/gain queue; an empty slice clears it.
    pub fn a_load_queue(&self, queue: &[(i32, UlRange)]) -> UlResult<()> {
        let (chans, gains): (Vec<i32>, Vec<UlRange>) = queue.iter().copied().unzip();
        self.lib.a_load_queue(self.board_num, &chans, &gains)
    }

    // Analog output
    pub fn a_out(&self, channel: i32, range: UlRange, data_value: u16) -> UlResult<()> {
        self.lib.a_out(self.board_num, channel, range, data_value)
    }

    pub fn v_out(&self, channel: i32, range: UlRange, value: f32, options: VInOptions) -> UlResult<()> {
        self.lib.v_out(self.board_num, channel, range, value, options)
    }

    // Digital I/O
    pub fn d_config_port(&self, port: DigitalPortType, direction: DigitalIODirection) -> UlResult<()> {
        self.lib.d_config_port(self.board_num, port, direction)
    }

    pub fn d_config_bit(&self, port: DigitalPortType, bit_num: i32, direction: DigitalIODirection) -> UlResult<()> {
        self.lib.d_config_bit(self.board_num, port, bit_num, direction)
    }

    pub fn d_in(&self, port: DigitalPortType) -> UlResult<u16> {
        self.lib.d_in(self.board_num, port)
    }

    pub fn d_out(&self, port: DigitalPortType, data_value: u16) -> UlResult<()> {
        self.lib.d_out(self.board_num, port, data_value)
    }

    pub fn d_bit_in(&self, port: DigitalPortType, bit_num: i32) -> UlResult<bool> {
        self.lib.d_bit_in(self.board_num, port, bit_num)
    }

    pub fn d_bit_out(&self, port: DigitalPortType, bit_num: i32, value: bool) -> UlResult<()> {
        self.lib.d_bit_out(self.board_num, port, bit_num, value)
    }

    // Counters
    pub fn c_in_32(&self, counter_num: i32) -> UlResult<u32> {
        self.lib.c_in_32(self.board_num, counter_num)
    }

    pub fn c_clear(&self, counter_num: i32) -> UlResult<()> {
        self.lib.c_clear(self.board_num, counter_num)
    }

    pub fn c_load_32(&self, reg_num: i32, load_value: u32) -> UlResult<()> {
        self.lib.c_load_32(self.board_num, reg_num, load_value)
    }

    // Background operations
    pub fn get_status(&self, function: FunctionType) -> UlResult<ScanStatus> {
        self.lib.get_status(self.board_num, function)
    }

    pub fn stop_background(&self, function: FunctionType) -> UlResult<()> {
        self.lib.stop_background(self.board_num, function)
    }

    pub fn disable_event(&self, event_type: EventType) -> UlResult<()> {
        self.lib.disable_event(self.board_num, event_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::library::open_library;

    fn demo_board() -> Board {
        Board::new(0, open_library(&UlConfig::demo()).unwrap())
    }

    #[test]
    fn test_a_in_eng_matches_two_step_read() {
        let board = demo_board();
        let raw = board.a_in(0, UlRange::BIP5VOLTS).unwrap();
        let two_step = board.to_eng_units(UlRange::BIP5VOLTS, raw).unwrap() as f64;
        assert_eq!(board.a_in_eng(0, UlRange::BIP5VOLTS).unwrap(), two_step);
        assert_eq!(board.resolution().unwrap(), 16);
    }

    #[test]
    fn test_errors_keep_board_context() {
        let board = Board::new(3, open_library(&UlConfig::demo()).unwrap());
        let err = board.a_in(0, UlRange::BIP10VOLTS).unwrap_err();
        assert_eq!(err.code(), 1);
        assert!(err.message().contains("board 3"));
    }

    #[test]
    fn test_output_round_trip_through_eng_units() {
        let board = demo_board();
        let counts = board.from_eng_units(UlRange::UNI5VOLTS, 1.0).unwrap();
        board.a_out(0, UlRange::UNI5VOLTS, counts).unwrap();
        assert_eq!(counts, eng_to_counts(UlRange::UNI5VOLTS, 16, 1.0).unwrap() as u16);
        board.set_board_config(BoardInfo::DACUPDATEMODE, 1).unwrap();
        assert_eq!(board.board_config(BoardInfo::DACUPDATEMODE).unwrap(), 1);
    }
}
