/// Characters that make up one "word" for WPM purposes
pub const CHARS_PER_WORD: f64 = 5.0;

/// Elapsed time is never taken to be shorter than this, in seconds
pub const MIN_ELAPSED_SECS: f64 = 1.0;

/// Live metrics for an attempt, recomputed on every input update
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Metrics {
    pub wpm: u32,
    /// Actual seconds since the test started, not floored
    pub elapsed_secs: f64,
}

impl Metrics {
    pub fn compute(input: &str, elapsed_secs: f64) -> Self {
        Self {
            wpm: wpm(input, elapsed_secs),
            elapsed_secs,
        }
    }

    /// Elapsed time as stored in a result record
    pub fn time_taken(&self) -> f64 {
        round_2dp(self.elapsed_secs.max(MIN_ELAPSED_SECS))
    }
}

/// `round((chars / 5) / (max(elapsed, 1) / 60))`, exact halves going to the even neighbour
pub fn wpm(input: &str, elapsed_secs: f64) -> u32 {
    let chars = input.chars().count() as f64;
    let minutes = floored_elapsed(elapsed_secs) / 60.0;
    let wpm = (chars / CHARS_PER_WORD) / minutes;

    wpm.round_ties_even().max(0.0) as u32
}

fn floored_elapsed(elapsed_secs: f64) -> f64 {
    if elapsed_secs.is_nan() {
        MIN_ELAPSED_SECS
    } else {
        elapsed_secs.max(MIN_ELAPSED_SECS)
    }
}

pub fn round_2dp(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
