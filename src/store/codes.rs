use crate::models::CodeBook;
use crate::store::write_atomic;
use anyhow::{Context, Result};
use std::collections::{BTreeSet, HashSet};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// How the store file was brought into memory
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    /// File parsed and already consistent
    Loaded,
    /// File parsed but held duplicates or codes in both sets; cleaned and rewritten
    Normalized,
    /// File unusable; replaced with an empty book
    Repaired(RepairReason),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RepairReason {
    Missing,
    Malformed(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkOutcome {
    Marked,
    NotFound,
}

/// Persistent record of which promo codes are new and which are used
#[derive(Debug)]
pub struct CodeStore {
    path: PathBuf,
    codes: CodeBook,
}

impl CodeStore {
    /// Load the store, resetting it to empty when the file is missing or unreadable.
    /// Never fails: a failed rewrite of the repaired file is only logged.
    pub fn load(path: impl Into<PathBuf>) -> (Self, LoadOutcome) {
        let path = path.into();

        let (codes, outcome) = match read_book(&path) {
            Ok(book) => {
                let cleaned = normalize(&book);
                if cleaned == book {
                    info!("Loaded {} new and {} used codes", book.new.len(), book.used.len());
                    (book, LoadOutcome::Loaded)
                } else {
                    warn!("Removed duplicate codes from {}", path.display());
                    (cleaned, LoadOutcome::Normalized)
                }
            }
            Err(reason) => {
                match &reason {
                    RepairReason::Missing => {
                        info!("No codes file at {}. Starting fresh.", path.display())
                    }
                    RepairReason::Malformed(detail) => warn!(
                        "Codes file {} is unusable ({}). Resetting it.",
                        path.display(),
                        detail
                    ),
                }
                (CodeBook::default(), LoadOutcome::Repaired(reason))
            }
        };

        let store = Self { path, codes };
        if outcome != LoadOutcome::Loaded {
            if let Err(e) = store.save() {
                warn!("Failed to write codes file: {:#}", e);
            }
        }
        (store, outcome)
    }

    /// Overwrite the file with the in-memory book
    pub fn save(&self) -> Result<()> {
        let json = serde_json::to_string_pretty(&self.codes).context("Failed to serialize codes")?;
        write_atomic(&self.path, json.as_bytes())?;
        debug!("Saved codes to {}", self.path.display());
        Ok(())
    }

    /// Add scraped codes that are neither new nor used yet. Returns what was added.
    pub fn update<I>(&mut self, scraped: I) -> Result<Vec<String>>
    where
        I: IntoIterator<Item = String>,
    {
        let known: HashSet<&str> = self
            .codes
            .new
            .iter()
            .chain(&self.codes.used)
            .map(String::as_str)
            .collect();

        let added: Vec<String> = scraped
            .into_iter()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .filter(|code| !known.contains(code.as_str()))
            .collect();

        if !added.is_empty() {
            self.codes.new.extend(added.iter().cloned());
            self.save()?;
        }
        Ok(added)
    }

    /// Move a code from new to used
    pub fn mark_used(&mut self, code: &str) -> Result<MarkOutcome> {
        let Some(pos) = self.codes.new.iter().position(|c| c == code) else {
            return Ok(MarkOutcome::NotFound);
        };

        let code = self.codes.new.remove(pos);
        self.codes.used.push(code);
        self.save()?;
        Ok(MarkOutcome::Marked)
    }

    pub fn codes(&self) -> &CodeBook {
        &self.codes
    }
}

fn read_book(path: &Path) -> Result<CodeBook, RepairReason> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => return Err(RepairReason::Missing),
        Err(e) => return Err(RepairReason::Malformed(e.to_string())),
    };
    serde_json::from_str(&content).map_err(|e| RepairReason::Malformed(e.to_string()))
}

/// Drop repeated codes and anything in `new` that is already used
fn normalize(book: &CodeBook) -> CodeBook {
    let mut seen_used = HashSet::new();
    let used: Vec<String> = book
        .used
        .iter()
        .filter(|c| seen_used.insert(c.as_str()))
        .cloned()
        .collect();

    let mut seen_new = HashSet::new();
    let new = book
        .new
        .iter()
        .filter(|c| !seen_used.contains(c.as_str()) && seen_new.insert(c.as_str()))
        .cloned()
        .collect();

    CodeBook { new, used }
}
