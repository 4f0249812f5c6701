use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tracing::{debug, warn};

use crate::clock::{Clock, SystemClock};
use crate::config::{Config, ConfigStore, NullConfigStore};
use crate::corpus::TextProvider;
use crate::error::{Error, Result};
use crate::history::UserHistory;
use crate::metrics::Metrics;
use crate::results::ResultsStore;
use crate::runtime::AppEvent;
use crate::session::{Feedback, Session, SessionState};

pub const MISSING_NAME_WARNING: &str = "Please enter your name to start the test.";
pub const MISMATCH_WARNING: &str =
    "Incorrect test! The text does not match. Press enter for the next test.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Success,
    Warning,
    Error,
}

/// Banner shown above the test area
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn new(level: NoticeLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    Continue,
    Quit,
}

/// Owns the session context and routes each user action to its handler
pub struct App {
    username: String,
    session: Session,
    history: UserHistory,
    notice: Option<Notice>,
    last_feedback: Option<Feedback>,
    provider: Box<dyn TextProvider>,
    store: Box<dyn ResultsStore>,
    clock: Box<dyn Clock>,
    config_store: Box<dyn ConfigStore>,
    config: Config,
}

impl App {
    pub fn new(provider: Box<dyn TextProvider>, store: Box<dyn ResultsStore>) -> Self {
        let mut app = Self {
            username: String::new(),
            session: Session::new(),
            history: UserHistory::default(),
            notice: None,
            last_feedback: None,
            provider,
            store,
            clock: Box::new(SystemClock),
            config_store: Box::new(NullConfigStore),
            config: Config::default(),
        };
        app.notice = Some(Notice::new(NoticeLevel::Warning, MISSING_NAME_WARNING));
        app
    }

    pub fn with_clock(mut self, clock: Box<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Remember the username in `config` through `store` after each start
    pub fn with_config(mut self, store: Box<dyn ConfigStore>, config: Config) -> Self {
        self.config_store = store;
        self.config = config;
        self
    }

    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = username.into();
        self.on_name_changed();
        self
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn state(&self) -> SessionState {
        self.session.state()
    }

    pub fn history(&self) -> &UserHistory {
        &self.history
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    /// Metrics from the most recent input update or evaluation
    pub fn metrics(&self) -> Option<Metrics> {
        match self.last_feedback.as_ref()? {
            Feedback::Live(m) | Feedback::Failed(m) => Some(*m),
            Feedback::Completed(record) => Some(Metrics {
                wpm: record.wpm,
                elapsed_secs: record.time_taken_seconds,
            }),
            Feedback::Started | Feedback::AwaitingInput => None,
        }
    }

    pub fn handle_event(&mut self, event: AppEvent) -> Control {
        match event {
            AppEvent::Key(key) => self.handle_key(key),
            AppEvent::Resize => Control::Continue,
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> Control {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        if key.code == KeyCode::Esc || (ctrl && key.code == KeyCode::Char('c')) {
            return Control::Quit;
        }

        match self.state() {
            SessionState::Idle => match key.code {
                KeyCode::Enter => self.on_start(),
                KeyCode::Backspace => {
                    self.username.pop();
                    self.on_name_changed();
                }
                KeyCode::Char(c) if !ctrl => {
                    self.username.push(c);
                    self.on_name_changed();
                }
                _ => {}
            },
            SessionState::InProgress => match key.code {
                KeyCode::Enter => self.on_submit(),
                KeyCode::Backspace => {
                    let mut text = self.session.input_text.clone();
                    text.pop();
                    self.on_input(text);
                }
                KeyCode::Char(c) if !ctrl => {
                    let mut text = self.session.input_text.clone();
                    text.push(c);
                    self.on_input(text);
                }
                _ => {}
            },
            SessionState::Completed | SessionState::Failed => match key.code {
                KeyCode::Enter | KeyCode::Right | KeyCode::Char('n') => self.on_next(),
                _ => {}
            },
        }

        Control::Continue
    }

    fn validated_username(&self) -> Result<String> {
        let name = self.username.trim();
        if name.is_empty() {
            return Err(Error::MissingUsername);
        }
        Ok(name.to_string())
    }

    pub fn on_name_changed(&mut self) {
        if self.username.trim().is_empty() {
            self.notice = Some(Notice::new(NoticeLevel::Warning, MISSING_NAME_WARNING));
        } else {
            self.notice = None;
        }
        self.refresh_history();
    }

    pub fn on_start(&mut self) {
        let name = match self.validated_username() {
            Ok(name) => name,
            Err(e) => return self.report(e),
        };
        self.username = name;

        let result = self.session.start(&*self.provider, self.clock.now());
        self.apply(result);

        if self.state() == SessionState::InProgress {
            self.remember_username();
        }
    }

    pub fn on_input(&mut self, text: String) {
        let result = self
            .session
            .update_input(text, self.clock.now(), &self.username, &*self.store);
        self.apply(result);
    }

    pub fn on_submit(&mut self) {
        let result = self
            .session
            .submit(self.clock.now(), &self.username, &*self.store);
        self.apply(result);
    }

    pub fn on_next(&mut self) {
        let result = self.session.next(&*self.provider, self.clock.now());
        self.apply(result);
    }

    fn apply(&mut self, result: Result<Feedback>) {
        let feedback = match result {
            Ok(feedback) => feedback,
            Err(e) => return self.report(e),
        };

        match &feedback {
            Feedback::Started => {
                self.notice = Some(Notice::new(
                    NoticeLevel::Info,
                    "Type the text below, enter submits.",
                ));
            }
            Feedback::AwaitingInput | Feedback::Live(_) => {
                if matches!(self.notice, Some(Notice { level: NoticeLevel::Error, .. })) {
                    self.notice = None;
                }
            }
            Feedback::Completed(record) => {
                self.notice = Some(Notice::new(
                    NoticeLevel::Success,
                    format!("Test completed! Your WPM: {}", record.wpm),
                ));
                self.refresh_history();
            }
            Feedback::Failed(_) => {
                self.notice = Some(Notice::new(NoticeLevel::Warning, MISMATCH_WARNING));
            }
        }
        self.last_feedback = Some(feedback);
    }

    fn report(&mut self, err: Error) {
        let level = match err {
            Error::MissingUsername => NoticeLevel::Warning,
            _ => NoticeLevel::Error,
        };
        warn!(error = %err, "action rejected");
        self.notice = Some(Notice::new(level, err.to_string()));
    }

    /// Reloads the chart for the current name; an unreadable store reads as no history
    pub fn refresh_history(&mut self) {
        let name = self.username.trim();
        if name.is_empty() {
            self.history = UserHistory::default();
            return;
        }

        let all = self.store.load_all().unwrap_or_else(|e| {
            warn!(error = %e, "cannot read results, showing no history");
            Vec::new()
        });
        self.history = UserHistory::from_records(&all, name);
        debug!(username = name, tests = self.history.len(), "history refreshed");
    }

    fn remember_username(&mut self) {
        if self.config.last_username.as_deref() == Some(self.username.as_str()) {
            return;
        }
        self.config.last_username = Some(self.username.clone());
        if let Err(e) = self.config_store.save(&self.config) {
            warn!(error = %e, "cannot save config");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::corpus::{FixedText, SequenceText};
    use crate::results::{MemoryResultsStore, ResultRecord};
    use std::rc::Rc;

    /// Lets tests keep a handle on the store and clock the app owns
    struct Shared<T>(Rc<T>);

    impl<T: ResultsStore> ResultsStore for Shared<T> {
        fn append(&self, record: &ResultRecord) -> Result<()> {
            self.0.append(record)
        }
        fn load_all(&self) -> Result<Vec<ResultRecord>> {
            self.0.load_all()
        }
    }

    impl<T: Clock> Clock for Shared<T> {
        fn now(&self) -> chrono::DateTime<chrono::Local> {
            self.0.now()
        }
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn type_str(app: &mut App, s: &str) {
        for c in s.chars() {
            app.handle_key(key(KeyCode::Char(c)));
        }
    }

    fn app_with(
        provider: Box<dyn TextProvider>,
    ) -> (App, Rc<MemoryResultsStore>, Rc<ManualClock>) {
        let store = Rc::new(MemoryResultsStore::new());
        let clock = Rc::new(ManualClock::default());
        let app = App::new(provider, Box::new(Shared(store.clone())))
            .with_clock(Box::new(Shared(clock.clone())));
        (app, store, clock)
    }

    #[test]
    fn test_start_requires_username() {
        let (mut app, _, _) = app_with(Box::new(FixedText::new("hi")));
        assert_eq!(app.notice().unwrap().message, MISSING_NAME_WARNING);

        app.handle_key(key(KeyCode::Enter));
        assert_eq!(app.state(), SessionState::Idle);
        let notice = app.notice().unwrap();
        assert_eq!(notice.level, NoticeLevel::Warning);

        type_str(&mut app, "   ");
        app.handle_key(key(KeyCode::Enter));
        assert_eq!(app.state(), SessionState::Idle);
    }

    #[test]
    fn test_name_editing() {
        let (mut app, _, _) = app_with(Box::new(FixedText::new("hi")));
        type_str(&mut app, "adx");
        app.handle_key(key(KeyCode::Backspace));
        type_str(&mut app, "a");
        assert_eq!(app.username(), "ada");
        assert!(app.notice().is_none());
    }

    #[test]
    fn test_full_successful_flow() {
        let (mut app, store, clock) = app_with(Box::new(FixedText::new("the quick brown fox")));
        type_str(&mut app, " ada ");
        app.handle_key(key(KeyCode::Enter));
        assert_eq!(app.state(), SessionState::InProgress);
        assert_eq!(app.username(), "ada");
        assert!(app.metrics().is_none());

        clock.advance_secs(6.0);
        type_str(&mut app, "the quick brown fox");

        assert_eq!(app.state(), SessionState::Completed);
        assert_eq!(store.len(), 1);
        let record = &store.load_all().unwrap()[0];
        assert_eq!(record.username, "ada");
        assert_eq!(record.wpm, 38);
        assert_eq!(app.metrics().unwrap().wpm, 38);
        assert_eq!(app.notice().unwrap().level, NoticeLevel::Success);
        assert_eq!(app.history().len(), 1);
    }

    #[test]
    fn test_typing_updates_live_metrics() {
        let (mut app, _, clock) = app_with(Box::new(FixedText::new("hello world")));
        app = app.with_username("ada");
        app.handle_key(key(KeyCode::Enter));

        clock.advance_secs(2.0);
        type_str(&mut app, "hello");
        assert_eq!(app.metrics().unwrap().wpm, 30);

        for _ in 0..5 {
            app.handle_key(key(KeyCode::Backspace));
        }
        assert_eq!(app.session().input_text, "");
        assert!(app.metrics().is_none());
        assert_eq!(app.state(), SessionState::InProgress);
    }

    #[test]
    fn test_mismatch_then_next() {
        let provider = SequenceText::new(["hello world", "fresh text"]);
        let (mut app, store, _) = app_with(Box::new(provider));
        app = app.with_username("ada");
        app.handle_key(key(KeyCode::Enter));

        type_str(&mut app, "hello owrld");
        app.handle_key(key(KeyCode::Enter));

        assert_eq!(app.state(), SessionState::Failed);
        assert_eq!(app.notice().unwrap().message, MISMATCH_WARNING);
        assert!(store.is_empty());

        // typing in a terminal state does nothing
        type_str(&mut app, "x");
        assert_eq!(app.session().input_text, "hello owrld");

        app.handle_key(key(KeyCode::Enter));
        assert_eq!(app.state(), SessionState::InProgress);
        assert_eq!(app.session().target_text, "fresh text");
        assert_eq!(app.session().input_text, "");
    }

    #[test]
    fn test_submit_empty_input_is_ignored() {
        let (mut app, store, _) = app_with(Box::new(FixedText::new("hello")));
        app = app.with_username("ada");
        app.handle_key(key(KeyCode::Enter));
        app.handle_key(key(KeyCode::Enter));
        assert_eq!(app.state(), SessionState::InProgress);
        assert!(store.is_empty());
    }

    #[test]
    fn test_empty_corpus_is_reported() {
        let (mut app, _, _) = app_with(Box::new(SequenceText::new(Vec::<String>::new())));
        app = app.with_username("ada");
        app.handle_key(key(KeyCode::Enter));

        assert_eq!(app.state(), SessionState::Idle);
        let notice = app.notice().unwrap();
        assert_eq!(notice.level, NoticeLevel::Error);
        assert!(notice.message.contains("empty"));
    }

    #[test]
    fn test_quit_keys() {
        let (mut app, _, _) = app_with(Box::new(FixedText::new("hi")));
        assert_eq!(app.handle_key(key(KeyCode::Esc)), Control::Quit);
        assert_eq!(
            app.handle_key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL)),
            Control::Quit
        );
        assert_eq!(app.handle_event(AppEvent::Resize), Control::Continue);
    }

    #[test]
    fn test_history_is_scoped_to_username() {
        let now = chrono::Local::now();
        let store = MemoryResultsStore::with_records(vec![
            ResultRecord::new("ada", now, 40, 6.0),
            ResultRecord::new("bob", now, 70, 3.0),
        ]);
        let app = App::new(Box::new(FixedText::new("hi")), Box::new(store)).with_username("bob");
        assert_eq!(app.history().len(), 1);
        assert_eq!(app.history().records()[0].wpm, 70);
    }

    #[test]
    fn test_username_saved_in_config() {
        use crate::config::FileConfigStore;
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        let mut app = App::new(
            Box::new(FixedText::new("hi")),
            Box::new(MemoryResultsStore::new()),
        )
        .with_config(Box::new(FileConfigStore::with_path(&path)), Config::default())
        .with_username("ada");

        app.handle_key(key(KeyCode::Enter));
        let saved = FileConfigStore::with_path(&path).load();
        assert_eq!(saved.last_username.as_deref(), Some("ada"));
    }
}
