use chrono::{DateTime, Duration, Local};
use std::cell::Cell;

/// Wall clock used to stamp test starts and result records
pub trait Clock {
    fn now(&self) -> DateTime<Local>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Local> {
        Local::now()
    }
}

/// Clock that only moves when told to
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Cell<DateTime<Local>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Local>) -> Self {
        Self {
            now: Cell::new(start),
        }
    }

    pub fn advance_secs(&self, secs: f64) {
        let step = Duration::milliseconds((secs * 1000.0).round() as i64);
        self.now.set(self.now.get() + step);
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new(Local::now())
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Local> {
        self.now.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_clock_advances() {
        let clock = ManualClock::default();
        let t0 = clock.now();
        clock.advance_secs(6.5);
        assert_eq!((clock.now() - t0).num_milliseconds(), 6500);
    }
}
