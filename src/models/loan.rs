//! Loan (lending ledger) model and related types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::book::Isbn;
use super::index::normalize_key;

/// One outstanding loan
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LendingEntry {
    pub isbn: Isbn,
    pub borrower: String,
    pub lent_at: DateTime<Utc>,
}

impl LendingEntry {
    pub fn new(isbn: Isbn, borrower: &str) -> Self {
        Self {
            isbn,
            borrower: borrower.trim().to_string(),
            lent_at: Utc::now(),
        }
    }

    /// Borrower names compare with the same rule as index keys
    pub fn is_borrowed_by(&self, borrower: &str) -> bool {
        normalize_key(&self.borrower) == normalize_key(borrower)
    }
}

/// Outstanding loans in lending order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LendingLedger {
    entries: Vec<LendingEntry>,
}

impl LendingLedger {
    pub fn push(&mut self, entry: LendingEntry) {
        self.entries.push(entry);
    }

    /// Outstanding loans for `isbn`
    pub fn outstanding(&self, isbn: Isbn) -> usize {
        self.entries.iter().filter(|e| e.isbn == isbn).count()
    }

    pub fn for_isbn(&self, isbn: Isbn) -> impl Iterator<Item = &LendingEntry> {
        self.entries.iter().filter(move |e| e.isbn == isbn)
    }

    /// Remove the oldest loan of `isbn` to `borrower`
    pub fn take(&mut self, isbn: Isbn, borrower: &str) -> Option<LendingEntry> {
        let position = self
            .entries
            .iter()
            .position(|e| e.isbn == isbn && e.is_borrowed_by(borrower))?;
        Some(self.entries.remove(position))
    }

    /// Remove the oldest loan of `isbn`, whoever holds it
    pub fn take_any(&mut self, isbn: Isbn) -> Option<LendingEntry> {
        let position = self.entries.iter().position(|e| e.isbn == isbn)?;
        Some(self.entries.remove(position))
    }

    pub fn entries(&self) -> &[LendingEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
