use chrono::{DateTime, Local, NaiveDateTime, TimeZone};
use serde::{Deserialize, Serialize, Serializer};
use std::cell::RefCell;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::error::Result;

pub const HEADER: [&str; 4] = ["Username", "Date", "WPM", "Time_Taken"];

/// One successfully completed typing test
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultRecord {
    #[serde(rename = "Username")]
    pub username: String,
    #[serde(rename = "Date", with = "date_format")]
    pub timestamp: DateTime<Local>,
    #[serde(rename = "WPM")]
    pub wpm: u32,
    #[serde(rename = "Time_Taken", serialize_with = "serialize_2dp")]
    pub time_taken_seconds: f64,
}

impl ResultRecord {
    pub fn new(
        username: impl Into<String>,
        timestamp: DateTime<Local>,
        wpm: u32,
        time_taken_seconds: f64,
    ) -> Self {
        Self {
            username: username.into(),
            timestamp,
            wpm,
            time_taken_seconds: crate::metrics::round_2dp(time_taken_seconds),
        }
    }
}

fn serialize_2dp<S: Serializer>(value: &f64, serializer: S) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_str(&format!("{value:.2}"))
}

mod date_format {
    use chrono::{DateTime, Local};
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        dt: &DateTime<Local>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&dt.to_rfc3339())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<DateTime<Local>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        super::parse_date(&raw).ok_or_else(|| de::Error::custom(format!("unrecognised date {raw:?}")))
    }
}

/// Parses RFC 3339 or a naive local `YYYY-MM-DD HH:MM:SS[.frac]` timestamp
pub fn parse_date(raw: &str) -> Option<DateTime<Local>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Local));
    }

    ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .and_then(|naive| Local.from_local_datetime(&naive).earliest())
}

/// Append-only record of completed tests for every user
pub trait ResultsStore {
    fn append(&self, record: &ResultRecord) -> Result<()>;
    /// Every stored record, for all users, in file order
    fn load_all(&self) -> Result<Vec<ResultRecord>>;
}

impl<T: ResultsStore + ?Sized> ResultsStore for Box<T> {
    fn append(&self, record: &ResultRecord) -> Result<()> {
        (**self).append(record)
    }

    fn load_all(&self) -> Result<Vec<ResultRecord>> {
        (**self).load_all()
    }
}

/// Records belonging to `username`, in their original order
pub fn records_for(records: &[ResultRecord], username: &str) -> Vec<ResultRecord> {
    records
        .iter()
        .filter(|r| r.username == username)
        .cloned()
        .collect()
}

/// Comma separated results file with a `Username,Date,WPM,Time_Taken` header
#[derive(Debug, Clone)]
pub struct CsvResultsStore {
    path: PathBuf,
}

impl CsvResultsStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Creates the file with only a header row if it does not exist yet
    pub fn initialize(&self) -> Result<()> {
        if self.path.exists() {
            return Ok(());
        }
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&self.path);
        match file {
            Ok(file) => {
                let mut writer = csv::Writer::from_writer(file);
                writer.write_record(HEADER)?;
                writer.flush()?;
                debug!(path = %self.path.display(), "created results file");
                Ok(())
            }
            // Another process created it first
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

impl ResultsStore for CsvResultsStore {
    fn append(&self, record: &ResultRecord) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let mut file = OpenOptions::new()
            .append(true)
            .create(true)
            .open(&self.path)?;

        let needs_header = file.metadata()?.len() == 0;

        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(&mut file);
        if needs_header {
            writer.write_record(HEADER)?;
        }
        writer.serialize(record)?;
        writer.flush()?;
        drop(writer);
        file.flush()?;

        debug!(
            username = %record.username,
            wpm = record.wpm,
            "appended result"
        );
        Ok(())
    }

    fn load_all(&self) -> Result<Vec<ResultRecord>> {
        let file = match fs::File::open(&self.path) {
            Ok(f) => f,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(file);

        let mut records = Vec::new();
        for (idx, row) in reader.deserialize::<ResultRecord>().enumerate() {
            match row {
                Ok(record) => records.push(record),
                Err(e) => {
                    // header is line 1
                    warn!(line = idx + 2, error = %e, "skipping malformed results row");
                }
            }
        }
        Ok(records)
    }
}

/// In-process store for tests and headless runs
#[derive(Debug, Default)]
pub struct MemoryResultsStore {
    records: RefCell<Vec<ResultRecord>>,
}

impl MemoryResultsStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_records(records: Vec<ResultRecord>) -> Self {
        Self {
            records: RefCell::new(records),
        }
    }

    pub fn len(&self) -> usize {
        self.records.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ResultsStore for MemoryResultsStore {
    fn append(&self, record: &ResultRecord) -> Result<()> {
        self.records.borrow_mut().push(record.clone());
        Ok(())
    }

    fn load_all(&self) -> Result<Vec<ResultRecord>> {
        Ok(self.records.borrow().clone())
    }
}
