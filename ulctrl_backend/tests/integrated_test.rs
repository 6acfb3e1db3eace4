use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use ulcore_backend::*;
use ulctrl_backend::*;

fn demo_board() -> Board {
    Board::new(0, open_library(&UlConfig::demo()).unwrap())
}

#[test]
fn single_read_then_convert() {
    let board = demo_board();
    let range = UlRange::BIP10VOLTS;
    let raw = board.a_in(0, range).unwrap();
    let volts = board.to_eng_units(range, raw).unwrap();
    let lsb = (range.span() / 65536.0) as f32;
    assert!((volts - 1.25).abs() <= lsb, "{}", volts);
    // v_in is the same read in one call
    assert_eq!(board.v_in(0, range, VInOptions::DEFAULT).unwrap(), volts);
}

#[test]
fn failed_calls_carry_code_and_message() {
    let lib = open_library(&UlConfig::demo()).unwrap();
    let err = lib.a_in(9, 0, UlRange::BIP10VOLTS).unwrap_err();
    assert_eq!(err.code(), 1);
    assert!(err.to_string().starts_with("Error 1: Invalid board number specified"));

    let err = lib.a_in(0, 8, UlRange::BIP10VOLTS).unwrap_err();
    assert_eq!(err.error_code(), Some(ErrorCode::BADADCHAN));
    let err = lib.a_in(0, 0, UlRange::UNI10VOLTS).unwrap_err();
    assert_eq!(err.error_code(), Some(ErrorCode::BADRANGE));
    assert_eq!(lib.get_err_msg(30).unwrap(), "Invalid range specified");
}

#[test]
fn device_info_reports_configured_capabilities() {
    let board = demo_board();
    let config = BoardConfig::demo(0);
    let info = DaqDeviceInfo::new(&board).unwrap();

    assert_eq!(info.product_name, "USB-1608FS-Plus");
    assert_eq!(info.product_id, 234);
    assert_eq!(info.unique_id, "01ABCD00");
    assert!(info.exp_info.is_empty());

    let ai = &info.ai_info;
    assert_eq!(ai.num_chans, 8);
    assert_eq!(ai.resolution, 16);
    let expected: Vec<UlRange> = UlRange::all().filter(|r| config.ai_ranges.contains(r)).collect();
    assert_eq!(ai.supported_ranges, expected);
    assert!(ai.supports_scan);
    assert!(ai.supports_v_in);
    assert_eq!(ai.supported_scan_options, Some(ScanOptions::SIMULATED));
    assert_eq!(ai.packet_size, 1);
    assert_eq!(ai.analog_trig_range, UlRange::UNKNOWN);
    assert!(ai.supports_gain_queue);
    assert_eq!(ai.board_num, 0);
    assert!(info.supports_analog_input());
    assert!(!info.supports_temp_input());

    let ao = &info.ao_info;
    assert_eq!(ao.supported_ranges, vec![UlRange::UNI5VOLTS]);
    assert!(!ao.supports_scan);
    assert!(ao.supports_v_out);

    assert_eq!(info.dio_info.num_ports, 1);
    let port = &info.dio_info.port_info[0];
    assert_eq!(port.port_type, DigitalPortType::FIRSTPORTA);
    assert_eq!(port.num_bits, 8);
    assert!(port.is_port_configurable);
    assert!(!port.is_bit_configurable);
    assert!(port.supports_input && port.supports_output);
    assert!(!port.supports_input_scan);

    let counters: Vec<(i32, CounterChannelType)> = info
        .ctr_info
        .chan_info
        .iter()
        .map(|c| (c.channel_num, c.counter_type))
        .collect();
    assert_eq!(
        counters,
        vec![(0, CounterChannelType::CTREVENT), (1, CounterChannelType::CTREVENT)]
    );

    assert!(!info.supports_daq_input());
    assert!(!info.supports_daq_output());
    assert!(info.daqi_info.supported_channel_types.is_empty());
    assert_eq!(
        info.supported_event_types,
        vec![
            EventType::ON_SCAN_ERROR,
            EventType::ON_DATA_AVAILABLE,
            EventType::ON_END_OF_AI_SCAN
        ]
    );

    let text = toml::to_string(&info).unwrap();
    assert!(text.contains("USB-1608FS-Plus"));
    assert!(text.contains("ON_END_OF_AI_SCAN"));
}

#[test]
fn device_info_reports_daq_channel_types() {
    let mut config = BoardConfig::demo(0);
    config.daqi_chan_types = vec![ChannelType::ANALOG, ChannelType::DIGITAL8, ChannelType::CTR32LOW];
    config.daqo_chan_types = vec![ChannelType::ANALOG];
    config.gain_queue = false;
    config.events = EventType::empty();
    let lib = SimulatedLibrary::new();
    lib.add_board(config);
    let board = Board::new(0, Arc::new(lib));
    let info = DaqDeviceInfo::new(&board).unwrap();

    assert!(info.supports_daq_input());
    assert_eq!(
        info.daqi_info.supported_channel_types,
        vec![ChannelType::ANALOG, ChannelType::DIGITAL8, ChannelType::CTR32LOW]
    );
    assert!(info.supports_daq_output());
    assert_eq!(info.daqo_info.supported_channel_types, vec![ChannelType::ANALOG]);
    assert_eq!(info.daqo_info.board_num, 0);
    assert!(!info.ai_info.supports_gain_queue);
    assert!(info.supported_event_types.is_empty());
}

#[test]
fn device_info_rejects_empty_board_type() {
    let mut board = BoardConfig::demo(1);
    board.product_id = 0;
    let lib = SimulatedLibrary::new();
    lib.add_board(board);
    let board = Board::new(1, Arc::new(lib));
    assert!(DaqDeviceInfo::new(&board).unwrap_err().is(ErrorCode::BADBOARD));
}

#[test]
fn fixed_range_board_reports_its_range() {
    let mut config = BoardConfig::demo(0);
    config.ai_ranges = vec![UlRange::BIP5VOLTS];
    let lib = SimulatedLibrary::new();
    lib.add_board(config);
    let board = Board::new(0, Arc::new(lib));
    let ai = AiInfo::new(&board).unwrap();
    assert_eq!(ai.supported_ranges, vec![UlRange::BIP5VOLTS]);
    // The range argument is ignored
    let raw = board.a_in(0, UlRange::BIP10VOLTS).unwrap();
    assert_eq!(board.to_eng_units(UlRange::BIP5VOLTS, raw).unwrap(), 1.25);
}

#[test]
fn background_scan_fills_and_deinterleaves() {
    let board = demo_board();
    let scan = AiScan::start(&board, 0, 2, 300, 10_000, UlRange::BIP10VOLTS, ScanOptions::FOREGROUND).unwrap();
    assert_eq!(scan.num_chans(), 3);
    assert!(scan.wait(Duration::from_secs(5)).unwrap());

    let status = scan.status().unwrap();
    assert_eq!(status.status, Status::IDLE);
    assert_eq!(status.cur_count, 300);
    assert_eq!(status.cur_index, 297);

    let data = scan.data().unwrap();
    assert_eq!(data.shape(), &[3, 100]);
    let constant = eng_to_counts(UlRange::BIP10VOLTS, 16, 1.25).unwrap() as u16;
    assert!(data.row(0).iter().all(|&v| v == constant));
    assert_eq!(data[[1, 0]], 32768);
    let ramp = data.row(2).to_vec();
    assert_eq!(ramp[0], 16384);
    assert!(ramp.windows(2).all(|w| w[0] <= w[1]));
}

#[test]
fn dropping_a_scan_stops_it() {
    let board = demo_board();
    let options = ScanOptions::CONTINUOUS;
    let scan = AiScan::start(&board, 0, 0, 100, 1000, UlRange::BIP10VOLTS, options).unwrap();
    assert!(scan.status().unwrap().is_running());
    assert!(board.a_in(0, UlRange::BIP10VOLTS).unwrap_err().is(ErrorCode::ALREADYACTIVE));
    drop(scan);
    assert!(!board.get_status(FunctionType::AIFUNCTION).unwrap().is_running());
    board.a_in(0, UlRange::BIP10VOLTS).unwrap();
}

#[test]
fn continuous_stream_forwards_chunks_until_closed() {
    let board = demo_board();
    let scan = AiScan::start(&board, 0, 0, 100, 1000, UlRange::BIP10VOLTS, ScanOptions::CONTINUOUS).unwrap();
    let streamer = ScanStreamer::start(scan, 5).unwrap();
    let chunks = streamer.chunks().clone();
    let constant = eng_to_counts(UlRange::BIP10VOLTS, 16, 1.25).unwrap() as u16;

    let mut received = Vec::new();
    while received.len() < 5 {
        let chunk = chunks.recv_timeout(Duration::from_secs(2)).unwrap();
        assert_eq!(chunk.samples.nrows(), 1);
        assert!(chunk.samples.iter().all(|&v| v == constant));
        received.push(chunk);
    }
    for pair in received.windows(2) {
        assert_eq!(pair[1].start_index, pair[0].start_index + pair[0].samples.ncols());
    }

    // Nothing is forwarded while paused, and the paused samples are skipped
    streamer.pause();
    std::thread::sleep(Duration::from_millis(50));
    let mut last_end = 0;
    for chunk in chunks.try_iter() {
        last_end = chunk.start_index + chunk.samples.ncols();
        received.push(chunk);
    }
    std::thread::sleep(Duration::from_millis(50));
    assert!(chunks.try_recv().is_err());
    streamer.resume();
    let chunk = chunks.recv_timeout(Duration::from_secs(2)).unwrap();
    assert!(chunk.start_index > last_end);
    received.push(chunk);

    let forwarded = streamer.close().unwrap();
    received.extend(chunks.try_iter());
    let total: usize = received.iter().map(|c| c.samples.ncols()).sum();
    assert_eq!(forwarded, total);
    assert!(!board.get_status(FunctionType::AIFUNCTION).unwrap().is_running());
}

fn streaming_demo() -> (Board, ScanStreamer) {
    let board = demo_board();
    let scan = AiScan::start(&board, 0, 0, 100, 1000, UlRange::BIP10VOLTS, ScanOptions::CONTINUOUS).unwrap();
    let streamer = ScanStreamer::start(scan, 5).unwrap();
    (board, streamer)
}

#[test]
fn close_right_after_pause_ends_stream() {
    let (board, streamer) = streaming_demo();
    let chunks = streamer.chunks().clone();
    chunks.recv_timeout(Duration::from_secs(2)).unwrap();
    streamer.pause();
    let forwarded = streamer.close().unwrap();
    assert!(forwarded > 0);
    assert!(!board.get_status(FunctionType::AIFUNCTION).unwrap().is_running());
}

#[test]
fn quick_pause_resume_close_keeps_totals() {
    let (board, streamer) = streaming_demo();
    let chunks = streamer.chunks().clone();
    let mut received = vec![chunks.recv_timeout(Duration::from_secs(2)).unwrap()];
    streamer.pause();
    streamer.resume();
    let forwarded = streamer.close().unwrap();
    received.extend(chunks.try_iter());
    let total: usize = received.iter().map(|c| c.samples.ncols()).sum();
    assert_eq!(forwarded, total);
    assert!(!board.get_status(FunctionType::AIFUNCTION).unwrap().is_running());
}

#[test]
fn discovered_device_is_bound_while_guard_lives() {
    let mut config = UlConfig::demo();
    config.library.ignore_instacal = true;
    let lib = open_library(&config).unwrap();

    let devices = inventory(&lib, InterfaceType::USB).unwrap();
    assert_eq!(devices.len(), 1);
    assert_eq!(devices[0].unique_id, "01ABCD00");
    {
        let device = DaqDevice::create(lib.clone(), 7, devices[0].clone()).unwrap();
        assert_eq!(device.board_num(), 7);
        let raw = device.board().a_in(0, UlRange::BIP10VOLTS).unwrap();
        assert!(raw > 32768);
        let err = DaqDevice::create(lib.clone(), 8, devices[0].clone()).err().unwrap();
        assert!(err.is(ErrorCode::DEVALREADYCREATED));
    }
    assert!(lib.get_board_name(7).unwrap_err().is(ErrorCode::BADBOARD));
}

#[test]
fn digital_and_counter_io() {
    let board = demo_board();
    let port = DigitalPortType::FIRSTPORTA;
    board.d_config_port(port, DigitalIODirection::OUT).unwrap();
    board.d_out(port, 0xa5).unwrap();
    assert_eq!(board.d_in(port).unwrap(), 0xa5);
    assert!(board.d_bit_in(port, 0).unwrap());
    assert_eq!(board.digital_config(0, DigitalInfo::CURVAL).unwrap(), 0xa5);

    board.c_load_32(0, 42).unwrap();
    assert_eq!(board.c_in_32(0).unwrap(), 42);
    board.c_clear(0).unwrap();
    assert_eq!(board.c_in_32(0).unwrap(), 0);
}

#[test]
fn library_opens_from_config_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        r#"
        [library]
        backend = "simulated"

        [[board]]
        board_num = 2
        product_name = "USB-TC"
        product_id = 144
        temp_channels = 8

        [board.temperatures]
        3 = {{ kind = "const", value = 100.0 }}
        "#
    )
    .unwrap();
    let config = UlConfig::from_file(file.path()).unwrap();
    let board = Board::new(2, open_library(&config).unwrap());
    assert_eq!(board.name().unwrap(), "USB-TC");
    assert_eq!(board.t_in(3, TempScale::KELVIN, TInOptions::empty()).unwrap(), 373.15);
    assert!(board.a_in(0, UlRange::BIP10VOLTS).unwrap_err().is(ErrorCode::NOTADCONF));
}
