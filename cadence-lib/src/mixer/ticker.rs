use std::time::Duration;

/// Cancellable repeating-task handle driven by an external frame loop.
///
/// While running, every [`advance`](Self::advance) yields the time elapsed since the previous
/// tick. A stopped ticker yields nothing, so no work happens between `stop` and `start`.
#[derive(Debug, Clone, Default)]
pub struct Ticker {
    running: bool,
    last: Duration,
}

impl Ticker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resume ticking from `now`. No-op while already running.
    pub fn start(&mut self, now: Duration) {
        if self.running {
            return;
        }
        self.running = true;
        self.last = now;
    }

    pub fn stop(&mut self) {
        self.running = false;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn advance(&mut self, now: Duration) -> Option<Duration> {
        if !self.running {
            return None;
        }
        let elapsed = now.saturating_sub(self.last);
        self.last = now;
        Some(elapsed)
    }
}
