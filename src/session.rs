//! The typing test session: target text, live input, timing and outcome.
//!
//! Every user action is one method on [`Session`]. Each method mutates the session
//! in place and returns a [`Feedback`] telling the view what to show.

use chrono::{DateTime, Local};
use tracing::{debug, info, warn};

use crate::corpus::TextProvider;
use crate::error::{Error, Result};
use crate::metrics::Metrics;
use crate::results::{ResultRecord, ResultsStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum SessionState {
    #[strum(serialize = "idle")]
    Idle,
    #[strum(serialize = "in progress")]
    InProgress,
    #[strum(serialize = "completed")]
    Completed,
    #[strum(serialize = "failed")]
    Failed,
}

impl SessionState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, SessionState::Completed | SessionState::Failed)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Outcome {
    #[default]
    Pending,
    Correct,
    Incorrect,
}

/// What the view should show after a handler ran
#[derive(Debug, Clone, PartialEq)]
pub enum Feedback {
    /// A fresh target text is live and the clock is running
    Started,
    /// No input yet, so nothing is measured or evaluated
    AwaitingInput,
    Live(Metrics),
    /// The input matched and this record was appended
    Completed(ResultRecord),
    /// The submitted input did not match; nothing was saved
    Failed(Metrics),
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Session {
    pub active: bool,
    pub target_text: String,
    pub input_text: String,
    pub start_time: Option<DateTime<Local>>,
    pub last_outcome: Outcome,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> SessionState {
        match (self.active, self.last_outcome) {
            (true, _) => SessionState::InProgress,
            (false, Outcome::Pending) => SessionState::Idle,
            (false, Outcome::Correct) => SessionState::Completed,
            (false, Outcome::Incorrect) => SessionState::Failed,
        }
    }

    fn require(&self, allowed: &[SessionState], action: &'static str) -> Result<()> {
        let state = self.state();
        if allowed.contains(&state) {
            Ok(())
        } else {
            Err(Error::InvalidTransition {
                from: state,
                action,
            })
        }
    }

    /// Begin the first test of the session
    pub fn start(&mut self, provider: &dyn TextProvider, now: DateTime<Local>) -> Result<Feedback> {
        self.require(&[SessionState::Idle], "start a test")?;
        self.begin(provider, now)
    }

    /// Begin another test after a completed or failed one
    pub fn next(&mut self, provider: &dyn TextProvider, now: DateTime<Local>) -> Result<Feedback> {
        self.require(
            &[SessionState::Completed, SessionState::Failed],
            "start the next test",
        )?;
        self.begin(provider, now)
    }

    fn begin(&mut self, provider: &dyn TextProvider, now: DateTime<Local>) -> Result<Feedback> {
        // Sample before touching any state so a failing corpus leaves the session as it was
        let target = provider.sample()?;

        self.active = true;
        self.target_text = target;
        self.input_text.clear();
        self.start_time = Some(now);
        self.last_outcome = Outcome::Pending;

        info!(target_len = self.target_text.chars().count(), "test started");
        Ok(Feedback::Started)
    }

    /// Replace the live input, recompute metrics, and complete on an exact match
    pub fn update_input(
        &mut self,
        text: impl Into<String>,
        now: DateTime<Local>,
        username: &str,
        store: &dyn ResultsStore,
    ) -> Result<Feedback> {
        self.require(&[SessionState::InProgress], "update the input")?;
        self.input_text = text.into();

        let Some(metrics) = self.live_metrics(now) else {
            return Ok(Feedback::AwaitingInput);
        };
        debug!(chars = self.input_text.chars().count(), wpm = metrics.wpm, "input updated");

        if self.is_match() {
            self.complete(metrics, now, username, store)
        } else {
            Ok(Feedback::Live(metrics))
        }
    }

    /// Evaluate the current input explicitly
    pub fn submit(
        &mut self,
        now: DateTime<Local>,
        username: &str,
        store: &dyn ResultsStore,
    ) -> Result<Feedback> {
        self.require(&[SessionState::InProgress], "submit")?;

        let Some(metrics) = self.live_metrics(now) else {
            return Ok(Feedback::AwaitingInput);
        };

        if self.is_match() {
            return self.complete(metrics, now, username, store);
        }

        self.finish(Outcome::Incorrect);
        warn!(wpm = metrics.wpm, "submitted text does not match");
        Ok(Feedback::Failed(metrics))
    }

    fn complete(
        &mut self,
        metrics: Metrics,
        now: DateTime<Local>,
        username: &str,
        store: &dyn ResultsStore,
    ) -> Result<Feedback> {
        let record = ResultRecord::new(username, now, metrics.wpm, metrics.time_taken());
        // A failed append leaves the test running so another keystroke can retry it
        store.append(&record)?;

        self.finish(Outcome::Correct);
        info!(
            username,
            wpm = record.wpm,
            time_taken = record.time_taken_seconds,
            "test completed"
        );
        Ok(Feedback::Completed(record))
    }

    fn finish(&mut self, outcome: Outcome) {
        self.active = false;
        self.start_time = None;
        self.last_outcome = outcome;
    }

    pub fn is_match(&self) -> bool {
        !self.target_text.is_empty() && self.input_text.trim() == self.target_text
    }

    pub fn elapsed_secs(&self, now: DateTime<Local>) -> Option<f64> {
        self.start_time
            .map(|start| (now - start).num_milliseconds() as f64 / 1000.0)
    }

    /// `None` until a test is running and at least one character was typed
    pub fn live_metrics(&self, now: DateTime<Local>) -> Option<Metrics> {
        if self.input_text.is_empty() {
            return None;
        }
        self.elapsed_secs(now)
            .map(|elapsed| Metrics::compute(&self.input_text, elapsed))
    }
}
