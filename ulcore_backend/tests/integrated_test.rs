use ulcore_backend::*;

#[test]
fn raw_sample_to_volts() {
    // The two halves of a single read: a raw 16-bit count and its engineering value
    let range: UlRange = "BIP10VOLTS".parse().unwrap();
    let raw: u16 = 0;
    assert_eq!(counts_to_eng(range, 16, raw as u32).unwrap(), -10.0);
    let raw: u16 = 32768;
    assert_eq!(counts_to_eng(range, 16, raw as u32).unwrap(), 0.0);
    let raw: u16 = 65535;
    let top = counts_to_eng(range, 16, raw as u32).unwrap();
    assert!((top - 9.99969).abs() < 1e-5);
}

#[test]
fn every_selectable_range_converts() {
    for range in UlRange::all() {
        let mid = eng_to_counts(range, 16, (range.min() + range.max()) / 2.0).unwrap();
        assert_eq!(mid, 32768, "{}", range);
        assert_eq!(counts_to_eng(range, 16, 0).unwrap(), range.min());
        // Clamping on both sides
        assert_eq!(eng_to_counts(range, 16, range.max() + 1.0).unwrap(), 65535);
        assert_eq!(eng_to_counts(range, 16, range.min() - 1.0).unwrap(), 0);
    }
}

#[test]
fn errors_report_code_and_message() {
    let err: UlError = UlRange::try_from_code(77).unwrap_err();
    assert_eq!(err.code(), 30);
    assert!(err.message().starts_with("Invalid range specified"));
    assert_eq!(err.error_code(), Some(ErrorCode::BADRANGE));

    let err = UlError::from_code(9999);
    assert_eq!(err.to_string(), "Error 9999: Unknown error code 9999");
    assert_eq!(err.error_code(), None);
}

#[test]
fn channel_address_and_range_from_text() {
    // What the command-line tool receives
    let addr: ChannelAddr = "0/ai3".parse().unwrap();
    assert_eq!(addr.board_num, 0);
    assert_eq!(addr.index, 3);
    assert_eq!(addr.kind.bad_channel_code(), ErrorCode::BADADCHAN);
    assert!("ai3".parse::<ChannelAddr>().is_err());
    assert!("0/xx1".parse::<ChannelAddr>().is_err());
}

#[test]
fn config_signals_drive_eval() {
    let text = r#"
        [stream]
        buffer_ms = 50.0

        [[board]]
        board_num = 3
        product_name = "USB-201"
        ad_resolution = 12
        ai_channels = 2
        ai_ranges = ["BIP10VOLTS"]

        [board.signals]
        1 = { kind = "ramp", start = 0.0, stop = 4.0, period = 2.0 }
    "#;
    let config = UlConfig::from_toml_str(text).unwrap();
    assert_eq!(config.stream.buffer_ms, 50.0);
    let board = config.board(3).unwrap();

    let mut t = ndarray::Array1::linspace(0.0, 1.5, 4);
    board.signal(1).eval_inplace(&mut t.view_mut());
    assert_eq!(t.to_vec(), vec![0.0, 1.0, 2.0, 3.0]);

    // 12-bit quantisation of the same signal
    let count = eng_to_counts(board.ai_ranges[0], board.ad_resolution, 3.0).unwrap();
    let back = counts_to_eng(board.ai_ranges[0], board.ad_resolution, count).unwrap();
    assert!((back - 3.0).abs() <= UlRange::BIP10VOLTS.span() / 4096.0);
}

#[test]
fn stream_counter_walks_a_circular_buffer() {
    let mut counter = StreamCounter::new(1000, 300);
    let chunks: Vec<(usize, usize)> = (0..5).map(|_| counter.tick_next()).collect();
    assert_eq!(
        chunks,
        vec![(0, 300), (300, 600), (600, 900), (900, 1000), (0, 300)]
    );
}
