// Stream bookkeeping and timing helpers shared by the scan streamer and the CLI
use std::cmp::min;
use std::time::Instant;

/// Circular cursor over a buffer of `end_pos` samples, advancing by `interval` per tick.
///
/// Upon reaching the end, starts from the beginning again. The last chunk before wrap-around
/// is shorter when `end_pos` is not a multiple of `interval`.
///
/// ```
/// use ulcore_backend::utils::StreamCounter;
///
/// let mut counter = StreamCounter::new(10, 4);
/// assert_eq!(counter.tick_next(), (0, 4));
/// assert_eq!(counter.tick_next(), (4, 8));
/// assert_eq!(counter.tick_next(), (8, 10));
/// assert_eq!(counter.tick_next(), (0, 4));
/// ```
#[derive(Debug, Clone)]
pub struct StreamCounter {
    pos: usize,
    end_pos: usize,
    interval: usize,
}

impl StreamCounter {
    pub fn new(end_pos: usize, interval: usize) -> Self {
        Self {
            pos: 0,
            end_pos,
            interval: interval.max(1),
        }
    }

    pub fn next_pos(&self) -> usize {
        min(self.pos + self.interval, self.end_pos)
    }

    pub fn pos(&self) -> usize {
        self.pos
    }

    pub fn interval(&self) -> usize {
        self.interval
    }

    pub fn end_pos(&self) -> usize {
        self.end_pos
    }

    pub fn tick_next(&mut self) -> (usize, usize) {
        let result = (self.pos(), self.next_pos());
        self.pos = self.next_pos();
        if self.pos == self.end_pos {
            self.pos = 0
        }
        result
    }
}

/// Millisecond stopwatch for coarse profiling of driver calls.
pub struct TickTimer {
    last: Instant,
}

impl Default for TickTimer {
    fn default() -> Self {
        Self::new()
    }
}

impl TickTimer {
    pub fn new() -> Self {
        Self { last: Instant::now() }
    }

    /// Milliseconds elapsed since construction or the previous tick.
    pub fn tick(&mut self) -> f64 {
        let now = Instant::now();
        let diff = now.duration_since(self.last).as_secs_f64() * 1e3;
        self.last = now;
        diff
    }

    pub fn tick_log(&mut self, msg: &str) -> f64 {
        let diff = self.tick();
        tracing::debug!("{}: {:.3} ms", msg, diff);
        diff
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counter_exact_multiple() {
        let mut counter = StreamCounter::new(8, 4);
        assert_eq!(counter.tick_next(), (0, 4));
        assert_eq!(counter.tick_next(), (4, 8));
        assert_eq!(counter.pos(), 0);
    }

    #[test]
    fn test_counter_zero_interval() {
        let mut counter = StreamCounter::new(3, 0);
        assert_eq!(counter.interval(), 1);
        assert_eq!(counter.tick_next(), (0, 1));
    }

    #[test]
    fn test_timer_monotonic() {
        let mut timer = TickTimer::new();
        std::thread::sleep(std::time::Duration::from_millis(2));
        assert!(timer.tick_log("sleep") >= 2.0);
        assert!(timer.tick() >= 0.0);
    }
}
