use std::time::{Duration, Instant};

/// Periodic scheduling primitive invoked at the host's display cadence.
///
/// `wait_next_tick` blocks (cooperatively yields) until the next tick is due.
pub trait FrameTicker {
    /// Wait for the next tick.
    fn wait_next_tick(&mut self);
}

/// Sleeps so that ticks land on a fixed rate.
///
/// Missed deadlines are not caught up: a late tick resets the schedule from "now".
#[derive(Debug)]
pub struct FixedRateTicker {
    period: Duration,
    next: Option<Instant>,
}

impl FixedRateTicker {
    /// A ticker firing `fps` times per second (`0` is treated as 1).
    pub fn new(fps: u32) -> Self {
        Self {
            period: Duration::from_secs(1) / fps.max(1),
            next: None,
        }
    }

    /// Tick period.
    pub fn period(&self) -> Duration {
        self.period
    }
}

impl FrameTicker for FixedRateTicker {
    fn wait_next_tick(&mut self) {
        let now = Instant::now();
        let due = self.next.unwrap_or(now);
        if due > now {
            std::thread::sleep(due - now);
            self.next = Some(due + self.period);
        } else {
            self.next = Some(now + self.period);
        }
    }
}
