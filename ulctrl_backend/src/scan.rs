//! Background analog input scans.
//!
//! ## Overview
//!
//! - [`ScanBuffer`]: a driver-allocated sample buffer, freed on drop.
//! - [`AiScan::start`] validates the scan, allocates its buffer and starts it in the background,
//!   returning a [`BackgroundScan`] that reads the interleaved buffer back as a
//!   `channels x samples` array. Dropping a running scan stops it.
//! - [`ScanStreamer`] moves a (usually `CONTINUOUS`) scan onto a worker thread that polls the
//!   driver and forwards fresh samples as [`ScanChunk`]s over a crossbeam channel. The worker is
//!   paused, resumed and closed through a [`CmdChan`]; it acts on the latest command it sees
//!   and a close always ends it.
//!
//! Samples in the driver buffer are interleaved by channel: scan `s` of an `n`-channel scan
//! occupies points `s*n .. s*n+n`.

use crossbeam::channel::{self, Receiver, RecvTimeoutError, Sender};
use ndarray::Array2;
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, info, warn};

use ulcore_backend::*;

use crate::board::Board;
use crate::library::{MemHandle, ScanStatus, UniversalLibrary};
use crate::worker_cmd_chan::{CmdChan, CmdRecvr, WorkerCmd};

const WAIT_POLL: Duration = Duration::from_millis(5);

pub struct ScanBuffer {
    lib: Arc<dyn UniversalLibrary>,
    handle: MemHandle,
    len: usize,
}

impl ScanBuffer {
    pub fn alloc(lib: Arc<dyn UniversalLibrary>, len: usize) -> UlResult<Self> {
        let handle = lib.win_buf_alloc(len)?;
        Ok(ScanBuffer { lib, handle, len })
    }

    pub fn handle(&self) -> MemHandle {
        self.handle
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn read(&self, first_point: usize, count: usize) -> UlResult<Vec<u16>> {
        self.lib.win_buf_to_array(self.handle, first_point, count)
    }
}

impl Drop for ScanBuffer {
    fn drop(&mut self) {
        if let Err(err) = self.lib.win_buf_free(self.handle) {
            warn!("freeing scan buffer: {}", err);
        }
    }
}

/// De-interleaves `data` into a `num_chans x scans` array.
pub fn deinterleave(data: Vec<u16>, num_chans: usize) -> UlResult<Array2<u16>> {
    let scans = data.len() / num_chans.max(1);
    let by_scan = Array2::from_shape_vec((scans, num_chans), data).map_err(|e| {
        UlError::with_context(ErrorCode::BADBUFFERSIZE, format!("{} channels: {}", num_chans, e))
    })?;
    Ok(by_scan.t().as_standard_layout().into_owned())
}

/// Parameters of an analog input scan.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AiScan {
    pub low_chan: i32,
    pub high_chan: i32,
    /// Total points over all channels; a multiple of the channel count.
    pub count: usize,
    pub rate: u32,
    pub range: UlRange,
    pub options: ScanOptions,
}

impl AiScan {
    pub fn num_chans(&self) -> usize {
        (self.high_chan - self.low_chan + 1).max(0) as usize
    }

    pub fn validate(&self) -> UlResult<()> {
        if self.low_chan > self.high_chan {
            return Err(UlError::with_context(
                ErrorCode::BADADCHAN,
                format!("low channel {} above high channel {}", self.low_chan, self.high_chan),
            ));
        }
        let nchan = self.num_chans();
        if self.count == 0 || self.count % nchan != 0 {
            return Err(UlError::with_context(
                ErrorCode::BADCOUNT,
                format!("{} points is not a positive multiple of {} channels", self.count, nchan),
            ));
        }
        if self.rate == 0 {
            return Err(UlError::with_context(ErrorCode::BADRATE, "0 Hz"));
        }
        Ok(())
    }

    /// Starts the scan in the background (`BACKGROUND` is always added).
    pub fn start(
        board: &Board,
        low_chan: i32,
        high_chan: i32,
        count: usize,
        rate: u32,
        range: UlRange,
        options: ScanOptions,
    ) -> UlResult<BackgroundScan> {
        let mut scan = AiScan {
            low_chan,
            high_chan,
            count,
            rate,
            range,
            options: options | ScanOptions::BACKGROUND,
        };
        scan.validate()?;
        let buffer = ScanBuffer::alloc(board.lib().clone(), count)?;
        scan.rate = board.lib().a_in_scan(
            board.board_num(),
            low_chan,
            high_chan,
            count,
            rate,
            range,
            buffer.handle(),
            scan.options,
        )?;
        info!(
            "board {} scanning channels {}..={} at {} Hz into {} points",
            board.board_num(),
            low_chan,
            high_chan,
            scan.rate,
            count
        );
        Ok(BackgroundScan {
            board: board.clone(),
            scan,
            buffer,
            stopped: false,
        })
    }
}

/// A running (or finished) background scan and its buffer.
pub struct BackgroundScan {
    board: Board,
    scan: AiScan,
    buffer: ScanBuffer,
    stopped: bool,
}

impl BackgroundScan {
    pub fn params(&self) -> &AiScan {
        &self.scan
    }

    pub fn num_chans(&self) -> usize {
        self.scan.num_chans()
    }

    /// Scans held by the buffer.
    pub fn scans_per_buffer(&self) -> usize {
        self.scan.count / self.num_chans()
    }

    pub fn is_continuous(&self) -> bool {
        self.scan.options.contains(ScanOptions::CONTINUOUS)
    }

    pub fn status(&self) -> UlResult<ScanStatus> {
        self.board.get_status(FunctionType::AIFUNCTION)
    }

    /// Polls until the scan stops; `false` if it is still running after `timeout`.
    pub fn wait(&self, timeout: Duration) -> UlResult<bool> {
        let deadline = Instant::now() + timeout;
        loop {
            if !self.status()?.is_running() {
                return Ok(true);
            }
            if Instant::now() >= deadline {
                return Ok(false);
            }
            std::thread::sleep(WAIT_POLL);
        }
    }

    pub fn read(&self, first_point: usize, count: usize) -> UlResult<Vec<u16>> {
        self.buffer.read(first_point, count)
    }

    /// The whole buffer as `channels x samples`.
    pub fn data(&self) -> UlResult<Array2<u16>> {
        deinterleave(self.read(0, self.scan.count)?, self.num_chans())
    }

    /// Scans `first_scan .. first_scan + num_scans`, counted from the start of the scan; wraps
    /// around the buffer.
    fn read_scans(&self, first_scan: usize, num_scans: usize) -> UlResult<Array2<u16>> {
        let nchan = self.num_chans();
        let per_buffer = self.scans_per_buffer();
        let start = first_scan % per_buffer;
        let head = num_scans.min(per_buffer - start);
        let mut data = self.read(start * nchan, head * nchan)?;
        if num_scans > head {
            data.extend(self.read(0, (num_scans - head) * nchan)?);
        }
        deinterleave(data, nchan)
    }

    pub fn stop(&mut self) -> UlResult<()> {
        self.board.stop_background(FunctionType::AIFUNCTION)?;
        self.stopped = true;
        debug!("board {} scan stopped", self.board.board_num());
        Ok(())
    }
}

impl Drop for BackgroundScan {
    fn drop(&mut self) {
        if self.stopped {
            return;
        }
        if let Err(err) = self.stop() {
            warn!("stopping scan on board {}: {}", self.board.board_num(), err);
        }
    }
}

/// Fresh samples forwarded by a [`ScanStreamer`].
#[derive(Debug, Clone, PartialEq)]
pub struct ScanChunk {
    /// Number of the first scan in `samples`, counted from the start of the scan.
    pub start_index: usize,
    /// `channels x scans`.
    pub samples: Array2<u16>,
}

#[derive(Error, Debug)]
pub enum StreamError {
    #[error(transparent)]
    Driver(#[from] UlError),

    #[error("stream worker panicked")]
    Panicked,
}

/// Worker thread forwarding the samples of a background scan.
pub struct ScanStreamer {
    cmd_chan: CmdChan,
    chunks: Receiver<ScanChunk>,
    worker: Option<JoinHandle<Result<usize, StreamError>>>,
}

impl ScanStreamer {
    pub fn start(scan: BackgroundScan, poll_ms: u64) -> Result<Self, StreamError> {
        let cmd_chan = CmdChan::new();
        let recvr = cmd_chan.new_recvr();
        let (sender, chunks) = channel::unbounded();
        let poll = Duration::from_millis(poll_ms.max(1));
        let worker = std::thread::Builder::new()
            .name("ul-scan-stream".to_string())
            .spawn(move || stream_worker(scan, recvr, sender, poll))
            .map_err(|e| UlError::with_context(ErrorCode::NO_MEMORY_FOR_BUFFER, e))?;
        Ok(ScanStreamer {
            cmd_chan,
            chunks,
            worker: Some(worker),
        })
    }

    pub fn chunks(&self) -> &Receiver<ScanChunk> {
        &self.chunks
    }

    pub fn recv_timeout(&self, timeout: Duration) -> Option<ScanChunk> {
        match self.chunks.recv_timeout(timeout) {
            Ok(chunk) => Some(chunk),
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => None,
        }
    }

    /// Stops forwarding; samples acquired while paused are dropped.
    pub fn pause(&self) {
        self.cmd_chan.send(WorkerCmd::Stream(false));
    }

    pub fn resume(&self) {
        self.cmd_chan.send(WorkerCmd::Stream(true));
    }

    /// Closes the worker (which stops the scan) and returns how many scans it forwarded.
    pub fn close(mut self) -> Result<usize, StreamError> {
        self.shutdown()
    }

    fn shutdown(&mut self) -> Result<usize, StreamError> {
        match self.worker.take() {
            Some(worker) => {
                self.cmd_chan.send(WorkerCmd::Close);
                worker.join().map_err(|_| StreamError::Panicked)?
            }
            None => Ok(0),
        }
    }
}

impl Drop for ScanStreamer {
    fn drop(&mut self) {
        if let Err(err) = self.shutdown() {
            warn!("scan streamer: {}", err);
        }
    }
}

fn stream_worker(
    scan: BackgroundScan,
    mut recvr: CmdRecvr,
    sender: Sender<ScanChunk>,
    poll: Duration,
) -> Result<usize, StreamError> {
    let nchan = scan.num_chans();
    let per_buffer = scan.scans_per_buffer();
    let mut streaming = true;
    let mut consumed = 0usize;
    let mut forwarded = 0usize;
    let mut timer = TickTimer::new();

    loop {
        match recvr.recv_timeout(poll) {
            Some(WorkerCmd::Close) => break,
            Some(WorkerCmd::Stream(on)) => {
                debug!("scan stream {}", if on { "resumed" } else { "paused" });
                streaming = on;
            }
            None => {}
        }

        let status = scan.status()?;
        let acquired = status.cur_count.max(0) as usize / nchan;
        if acquired - consumed > per_buffer {
            warn!(
                "scan buffer overrun, {} scans lost",
                acquired - consumed - per_buffer
            );
            consumed = acquired - per_buffer;
        }
        if acquired > consumed {
            if streaming {
                let samples = scan.read_scans(consumed, acquired - consumed)?;
                let chunk = ScanChunk {
                    start_index: consumed,
                    samples,
                };
                if sender.send(chunk).is_err() {
                    debug!("scan chunk receiver dropped");
                    break;
                }
                forwarded += acquired - consumed;
                timer.tick_log(&format!("forwarded scans {}..{}", consumed, acquired));
            }
            consumed = acquired;
        }
        if !status.is_running() && consumed == acquired {
            info!("scan finished after {} scans", acquired);
            break;
        }
    }
    Ok(forwarded)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deinterleave() {
        let data = vec![0, 10, 1, 11, 2, 12];
        let arr = deinterleave(data, 2).unwrap();
        assert_eq!(arr.shape(), &[2, 3]);
        assert_eq!(arr.row(0).to_vec(), vec![0, 1, 2]);
        assert_eq!(arr.row(1).to_vec(), vec![10, 11, 12]);
    }

    #[test]
    fn test_validate() {
        let mut scan = AiScan {
            low_chan: 0,
            high_chan: 2,
            count: 9,
            rate: 100,
            range: UlRange::BIP10VOLTS,
            options: ScanOptions::BACKGROUND,
        };
        scan.validate().unwrap();
        scan.count = 10;
        assert!(scan.validate().unwrap_err().is(ErrorCode::BADCOUNT));
        scan.count = 0;
        assert!(scan.validate().unwrap_err().is(ErrorCode::BADCOUNT));
        scan.count = 9;
        scan.rate = 0;
        assert!(scan.validate().unwrap_err().is(ErrorCode::BADRATE));
        scan.rate = 100;
        scan.low_chan = 3;
        assert!(scan.validate().unwrap_err().is(ErrorCode::BADADCHAN));
    }
}
