//! One-slot broadcast channel for controlling worker threads.
//!
//! The sender overwrites a single `(msg_num, cmd)` slot and wakes every receiver. Each receiver
//! remembers the last message number it saw and acts on the latest command only: commands
//! overwritten before a receiver looked are skipped. [`WorkerCmd::Close`] is final, later
//! commands are dropped so no receiver can miss it.

use parking_lot::{Condvar, Mutex};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerCmd {
    /// `true` resumes forwarding data, `false` pauses it.
    Stream(bool),
    Close,
}

type Slot = Arc<Mutex<(usize, WorkerCmd)>>;

#[derive(Clone)]
pub struct CmdChan {
    cmd: Slot, // (msg_num, worker_cmd)
    condvar: Arc<Condvar>,
}

impl Default for CmdChan {
    fn default() -> Self {
        Self::new()
    }
}

impl CmdChan {
    pub fn new() -> Self {
        Self {
            cmd: Arc::new(Mutex::new((0, WorkerCmd::Close))),
            condvar: Arc::new(Condvar::new()),
        }
    }

    pub fn new_recvr(&self) -> CmdRecvr {
        // A receiver created late must only react to messages posted after it
        let (msg_num, _) = *self.cmd.lock();
        CmdRecvr {
            cmd: self.cmd.clone(),
            condvar: self.condvar.clone(),
            viewed_msg_num: msg_num,
        }
    }

    pub fn send(&self, cmd: WorkerCmd) {
        let mut guard = self.cmd.lock();
        let (msg_num, cmd_val) = &mut *guard;
        if *msg_num > 0 && *cmd_val == WorkerCmd::Close {
            debug!(?cmd, "channel closed, worker command dropped");
            return;
        }
        *cmd_val = cmd;
        *msg_num += 1;
        debug!(msg_num = *msg_num, ?cmd, "worker command posted");
        self.condvar.notify_all();
    }
}

pub struct CmdRecvr {
    cmd: Slot,
    condvar: Arc<Condvar>,
    viewed_msg_num: usize,
}

fn take(viewed_msg_num: &mut usize, slot: &(usize, WorkerCmd)) -> Option<WorkerCmd> {
    let (msg_num, cmd_val) = *slot;
    if msg_num == *viewed_msg_num {
        return None;
    }
    if msg_num > *viewed_msg_num + 1 {
        debug!(
            viewed = *viewed_msg_num,
            published = msg_num,
            "skipped overwritten worker commands"
        );
    }
    *viewed_msg_num = msg_num;
    Some(cmd_val)
}

impl CmdRecvr {
    /// Blocks until a new command is posted.
    pub fn recv(&mut self) -> WorkerCmd {
        let mut guard = self.cmd.lock();
        loop {
            if let Some(cmd) = take(&mut self.viewed_msg_num, &guard) {
                return cmd;
            }
            self.condvar.wait(&mut guard);
        }
    }

    /// Returns the latest command if one was posted since the last look, without blocking.
    pub fn try_recv(&mut self) -> Option<WorkerCmd> {
        let guard = self.cmd.lock();
        take(&mut self.viewed_msg_num, &guard)
    }

    /// Waits at most `timeout` for a new command.
    pub fn recv_timeout(&mut self, timeout: Duration) -> Option<WorkerCmd> {
        let mut guard = self.cmd.lock();
        if let Some(cmd) = take(&mut self.viewed_msg_num, &guard) {
            return Some(cmd);
        }
        self.condvar.wait_for(&mut guard, timeout);
        take(&mut self.viewed_msg_num, &guard)
    }
}
