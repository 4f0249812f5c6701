use include_dir::{include_dir, Dir};
use rand::seq::SliceRandom;
use std::cell::RefCell;
use std::collections::VecDeque;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

static TEXTS_DIR: Dir = include_dir!("$CARGO_MANIFEST_DIR/src/texts");

const BUILTIN_CORPUS: &str = "english.txt";

/// Source of target texts for a typing test.
///
/// Implementations keep no memory of previous samples, so repeats are allowed.
pub trait TextProvider {
    fn sample(&self) -> Result<String>;
}

/// Splits a corpus into candidate samples, dropping trailing whitespace and blank lines
pub fn corpus_lines(contents: &str) -> Vec<&str> {
    contents
        .lines()
        .map(str::trim_end)
        .filter(|line| !line.trim().is_empty())
        .collect()
}

fn choose_line(contents: &str) -> Result<String> {
    let lines = corpus_lines(contents);
    lines
        .choose(&mut rand::thread_rng())
        .map(|line| line.trim().to_string())
        .ok_or(Error::EmptyCorpus)
}

/// Corpus backed by a plain text file, re-read on every sample
#[derive(Debug, Clone)]
pub struct FileCorpus {
    path: PathBuf,
}

impl FileCorpus {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TextProvider for FileCorpus {
    fn sample(&self) -> Result<String> {
        let contents = fs::read_to_string(&self.path).map_err(|source| Error::CorpusUnreadable {
            path: self.path.clone(),
            source,
        })?;
        choose_line(&contents)
    }
}

/// Corpus compiled into the binary, used when no corpus file is configured
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinCorpus;

impl BuiltinCorpus {
    fn contents() -> Result<&'static str> {
        TEXTS_DIR
            .get_file(BUILTIN_CORPUS)
            .and_then(|f| f.contents_utf8())
            .ok_or(Error::EmptyCorpus)
    }

    pub fn len(&self) -> usize {
        Self::contents().map(|c| corpus_lines(c).len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl TextProvider for BuiltinCorpus {
    fn sample(&self) -> Result<String> {
        choose_line(Self::contents()?)
    }
}

/// Always yields the same text
#[derive(Debug, Clone)]
pub struct FixedText(pub String);

impl FixedText {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }
}

impl TextProvider for FixedText {
    fn sample(&self) -> Result<String> {
        if self.0.trim().is_empty() {
            return Err(Error::EmptyCorpus);
        }
        Ok(self.0.clone())
    }
}

/// Yields the given texts in order, then reports an empty corpus
#[derive(Debug, Default)]
pub struct SequenceText {
    texts: RefCell<VecDeque<String>>,
}

impl SequenceText {
    pub fn new<I, S>(texts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            texts: RefCell::new(texts.into_iter().map(Into::into).collect()),
        }
    }
}

impl TextProvider for SequenceText {
    fn sample(&self) -> Result<String> {
        self.texts.borrow_mut().pop_front().ok_or(Error::EmptyCorpus)
    }
}

impl<T: TextProvider + ?Sized> TextProvider for Box<T> {
    fn sample(&self) -> Result<String> {
        (**self).sample()
    }
}
