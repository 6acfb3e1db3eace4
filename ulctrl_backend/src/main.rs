use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use thiserror::Error;
use tracing_subscriber::EnvFilter;

use ulcore_backend::*;
use ulctrl_backend::*;

/// Command-line client for Universal Library boards
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// TOML board configuration; the simulated demo board when omitted
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Channel address, `<board>/<kind><index>`
    #[arg(long, default_value = "0/ai0")]
    channel: ChannelAddr,

    /// Range selector name
    #[arg(long, default_value = "BIP10VOLTS")]
    range: UlRange,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Read one sample: the raw count and its engineering value
    Read,
    /// Print what the board supports
    Info,
    /// List devices found by discovery
    Discover,
    /// Acquire a block of samples from `--channel` up to `--high-chan`
    Scan {
        #[arg(long, default_value_t = 1000)]
        rate: u32,
        /// Samples per channel
        #[arg(long, default_value_t = 100)]
        samples: usize,
        #[arg(long)]
        high_chan: Option<i32>,
        /// Stream continuously for this many milliseconds instead
        #[arg(long)]
        stream_ms: Option<u64>,
    },
}

#[derive(Error, Debug)]
enum CliError {
    #[error(transparent)]
    Ul(#[from] UlError),

    #[error(transparent)]
    Open(#[from] OpenError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Stream(#[from] StreamError),

    #[error("could not format device info: {0}")]
    Format(#[from] toml::ser::Error),
}

fn read(board: &Board, addr: &ChannelAddr, range: UlRange) -> Result<(), CliError> {
    let chan = addr.index;
    match addr.kind {
        ChannelKind::AI if board.resolution()? > 16 => {
            let raw = board.a_in_32(chan, range, 0)?;
            let value = board.to_eng_units_32(range, raw)?;
            println!("{} raw {} = {:.6} ({})", addr, raw, value, range);
        }
        ChannelKind::AI => {
            let raw = board.a_in(chan, range)?;
            let value = board.to_eng_units(range, raw)?;
            println!("{} raw {} = {:.6} ({})", addr, raw, value, range);
        }
        ChannelKind::TEMP => {
            let value = board.t_in(chan, TempScale::CELSIUS, TInOptions::empty())?;
            println!("{} = {:.2} C", addr, value);
        }
        ChannelKind::CTR => {
            println!("{} count {}", addr, board.c_in_32(chan)?);
        }
        ChannelKind::AO => {
            return Err(UlError::with_context(ErrorCode::BADOPTION, format!("{} is an output", addr)).into());
        }
    }
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn scan(
    board: &Board,
    config: &UlConfig,
    addr: &ChannelAddr,
    range: UlRange,
    rate: u32,
    samples: usize,
    high_chan: Option<i32>,
    stream_ms: Option<u64>,
) -> Result<(), CliError> {
    let low = addr.index;
    let high = high_chan.unwrap_or(low);
    let nchan = (high - low + 1).max(1) as usize;
    let mut timer = TickTimer::new();

    if let Some(stream_ms) = stream_ms {
        let buffer_scans = ((rate as f64 * config.stream.buffer_ms / 1000.0) as usize).max(1);
        let bg = AiScan::start(board, low, high, buffer_scans * nchan, rate, range, ScanOptions::CONTINUOUS)?;
        let streamer = ScanStreamer::start(bg, config.stream.poll_ms)?;
        let until = std::time::Instant::now() + Duration::from_millis(stream_ms);
        while std::time::Instant::now() < until {
            if let Some(chunk) = streamer.recv_timeout(Duration::from_millis(config.stream.poll_ms.max(1) * 2)) {
                println!("scans {}..{}", chunk.start_index, chunk.start_index + chunk.samples.ncols());
            }
        }
        let forwarded = streamer.close()?;
        println!("{} scans streamed in {:.1} ms", forwarded, timer.tick());
        return Ok(());
    }

    let bg = AiScan::start(board, low, high, samples * nchan, rate, range, ScanOptions::FOREGROUND)?;
    let expected = samples as f64 / rate as f64;
    if !bg.wait(Duration::from_secs_f64(2.0 * expected + 1.0))? {
        return Err(UlError::with_context(ErrorCode::INPUTTIMEOUT, "scan did not finish").into());
    }
    timer.tick_log("scan");
    let data = bg.data()?;
    for (offset, row) in data.rows().into_iter().enumerate() {
        let mut volts = Vec::with_capacity(row.len());
        for &raw in row.iter() {
            volts.push(board.to_eng_units(range, raw)? as f64);
        }
        let mean = volts.iter().sum::<f64>() / volts.len().max(1) as f64;
        println!(
            "ch{}: {} samples, mean {:.6}, first {:?}",
            low + offset as i32,
            volts.len(),
            mean,
            &volts[..volts.len().min(5)]
        );
    }
    Ok(())
}

fn run(args: Args) -> Result<(), CliError> {
    let config = match &args.config {
        Some(path) => UlConfig::from_file(path)?,
        None => UlConfig::demo(),
    };
    let lib = open_library(&config)?;
    let board = Board::new(args.channel.board_num, lib.clone());

    match args.command {
        Command::Read => read(&board, &args.channel, args.range)?,
        Command::Info => {
            let info = DaqDeviceInfo::new(&board)?;
            print!("{}", toml::to_string_pretty(&info)?);
        }
        Command::Discover => {
            for device in inventory(&lib, InterfaceType::ANY)? {
                println!(
                    "{} (id {}, unique id {}, {:?})",
                    device.product_name,
                    device.product_id,
                    device.unique_id,
                    device.interface()
                );
            }
        }
        Command::Scan {
            rate,
            samples,
            high_chan,
            stream_ms,
        } => scan(&board, &config, &args.channel, args.range, rate, samples, high_chan, stream_ms)?,
    }
    Ok(())
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .init();

    match run(Args::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{}", err);
            ExitCode::FAILURE
        }
    }
}
