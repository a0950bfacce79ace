//! Persisted record of already-delivered post URLs.
//!
//! The file is a JSON array of strings. Appends are unconditional, so the
//! stored list may contain duplicates; every lookup is a membership test.
use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use relay_logging::{relay_debug, relay_info};
use thiserror::Error;

use crate::persist::{write_json_atomic, PersistError};
use crate::{FailureKind, Post, RelayError};

pub const DEFAULT_LEDGER_FILE: &str = "savedPosts.json";

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("ledger file not found: {0}")]
    NotFound(PathBuf),
    #[error("ledger file is malformed: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("ledger io error: {0}")]
    Io(#[from] io::Error),
    #[error("ledger write failed: {0}")]
    Persist(#[from] PersistError),
}

impl From<LedgerError> for RelayError {
    fn from(err: LedgerError) -> Self {
        let kind = match &err {
            LedgerError::NotFound(_) => FailureKind::NotFound,
            LedgerError::Parse(_) => FailureKind::Parse,
            LedgerError::Io(_) | LedgerError::Persist(_) => FailureKind::Io,
        };
        RelayError::new(kind, err.to_string())
    }
}

/// In-memory copy of the ledger, in file order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LedgerEntries {
    urls: Vec<String>,
    index: HashSet<String>,
}

impl LedgerEntries {
    pub fn from_urls(urls: Vec<String>) -> Self {
        let index = urls.iter().cloned().collect();
        Self { urls, index }
    }

    pub fn contains(&self, url: &str) -> bool {
        self.index.contains(url)
    }

    pub fn len(&self) -> usize {
        self.urls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }

    pub fn urls(&self) -> &[String] {
        &self.urls
    }

    fn push(&mut self, url: String) {
        self.index.insert(url.clone());
        self.urls.push(url);
    }
}

/// Candidates whose url is absent from `ledger`, in input order.
pub fn filter_new(candidates: Vec<Post>, ledger: &LedgerEntries) -> Vec<Post> {
    candidates
        .into_iter()
        .filter(|post| {
            let fresh = !ledger.contains(&post.url);
            if fresh {
                relay_debug!("{} - is a new post", post.url);
            }
            fresh
        })
        .collect()
}

#[derive(Debug, Clone)]
pub struct Ledger {
    path: PathBuf,
}

impl Ledger {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Create the file as an empty list if it does not exist yet.
    pub fn ensure_exists(&self) -> Result<bool, LedgerError> {
        if self.path.exists() {
            return Ok(false);
        }
        relay_info!("Creating empty ledger at {:?}", self.path);
        write_json_atomic(&self.path, &Vec::<String>::new())?;
        Ok(true)
    }

    pub fn load(&self) -> Result<LedgerEntries, LedgerError> {
        let data = match fs::read(&self.path) {
            Ok(data) => data,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                return Err(LedgerError::NotFound(self.path.clone()));
            }
            Err(err) => return Err(err.into()),
        };
        let urls: Vec<String> = serde_json::from_slice(&data)?;
        Ok(LedgerEntries::from_urls(urls))
    }

    /// Append `urls` to `ledger` and rewrite the whole file atomically.
    ///
    /// Entries already present are appended again; see [`Ledger::compact`].
    pub fn append<I>(&self, ledger: &mut LedgerEntries, urls: I) -> Result<(), LedgerError>
    where
        I: IntoIterator<Item = String>,
    {
        let before = ledger.len();
        for url in urls {
            ledger.push(url);
        }
        let added = ledger.len() - before;
        relay_info!("Saving {} new urls to {:?}", added, self.path);
        write_json_atomic(&self.path, ledger.urls())?;
        Ok(())
    }

    /// Maintenance: collapse duplicate entries, keeping the first occurrence.
    /// Returns the number of entries removed.
    pub fn compact(&self) -> Result<usize, LedgerError> {
        let entries = self.load()?;
        let mut seen = HashSet::new();
        let unique: Vec<String> = entries
            .urls
            .iter()
            .filter(|url| seen.insert(url.as_str()))
            .cloned()
            .collect();
        let removed = entries.len() - unique.len();
        if removed > 0 {
            write_json_atomic(&self.path, &unique)?;
        }
        relay_info!("Compacted ledger {:?}: removed {} duplicates", self.path, removed);
        Ok(removed)
    }
}
