//! In-memory catalog state: the primary catalog, its three indices and the
//! lending ledger.
//!
//! `CatalogState` only knows how to keep the structures coherent with each
//! other. Persistence and rollback are orchestrated by
//! [`CatalogService`](crate::services::catalog::CatalogService).

use serde::Serialize;
use std::collections::BTreeMap;

use crate::error::{AppError, AppResult};

use super::book::{BookRecord, Isbn};
use super::index::{IndexKey, SecondaryIndex};
use super::loan::LendingLedger;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogState {
    books: BTreeMap<Isbn, BookRecord>,
    by_year: SecondaryIndex<u32>,
    by_subject: SecondaryIndex<IndexKey>,
    by_author: SecondaryIndex<IndexKey>,
    loans: LendingLedger,
}

/// Aggregate counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CatalogStats {
    pub books: usize,
    pub copies: u64,
    pub loans: usize,
    pub available: u64,
}

impl CatalogState {
    /// Assemble state from loaded datasets. Duplicate ISBNs in the catalog
    /// dataset are rejected; indices are taken as-is and checked by the caller.
    pub fn from_parts(
        books: Vec<BookRecord>,
        by_year: SecondaryIndex<u32>,
        by_subject: SecondaryIndex<IndexKey>,
        by_author: SecondaryIndex<IndexKey>,
        loans: LendingLedger,
    ) -> AppResult<Self> {
        let mut catalog = BTreeMap::new();
        for record in books {
            let isbn = record.isbn;
            if catalog.insert(isbn, record).is_some() {
                return Err(AppError::InvalidState(format!(
                    "ISBN {} appears twice in the catalog dataset",
                    isbn
                )));
            }
        }
        Ok(Self {
            books: catalog,
            by_year,
            by_subject,
            by_author,
            loans,
        })
    }

    pub fn books(&self) -> &BTreeMap<Isbn, BookRecord> {
        &self.books
    }

    pub fn book(&self, isbn: Isbn) -> Option<&BookRecord> {
        self.books.get(&isbn)
    }

    pub fn contains(&self, isbn: Isbn) -> bool {
        self.books.contains_key(&isbn)
    }

    pub fn by_year(&self) -> &SecondaryIndex<u32> {
        &self.by_year
    }

    pub fn by_subject(&self) -> &SecondaryIndex<IndexKey> {
        &self.by_subject
    }

    pub fn by_author(&self) -> &SecondaryIndex<IndexKey> {
        &self.by_author
    }

    pub fn loans(&self) -> &LendingLedger {
        &self.loans
    }

    pub fn loans_mut(&mut self) -> &mut LendingLedger {
        &mut self.loans
    }

    /// Copies of `isbn` not currently lent
    pub fn available(&self, isbn: Isbn) -> Option<u32> {
        let record = self.books.get(&isbn)?;
        let outstanding = u32::try_from(self.loans.outstanding(isbn)).unwrap_or(u32::MAX);
        Some(record.copy_count.saturating_sub(outstanding))
    }

    /// Insert a record absent from the catalog and index it
    pub fn insert(&mut self, record: BookRecord) {
        self.index(&record);
        self.books.insert(record.isbn, record);
    }

    /// Remove a record and purge it from every index
    pub fn remove(&mut self, isbn: Isbn) -> Option<BookRecord> {
        let record = self.books.remove(&isbn)?;
        self.unindex(&record);
        Some(record)
    }

    /// Replace a record, moving its ISBN between buckets when keys change
    pub fn replace(&mut self, record: BookRecord) -> Option<BookRecord> {
        let previous = self.books.remove(&record.isbn);
        if let Some(previous) = &previous {
            self.unindex(previous);
        }
        self.insert(record);
        previous
    }

    pub fn record_mut(&mut self, isbn: Isbn) -> Option<&mut BookRecord> {
        self.books.get_mut(&isbn)
    }

    fn index(&mut self, record: &BookRecord) {
        self.by_year.insert(record.publication_year, record.isbn);
        self.by_subject.insert(IndexKey::new(&record.subject), record.isbn);
        self.by_author.insert(IndexKey::new(&record.author), record.isbn);
    }

    fn unindex(&mut self, record: &BookRecord) {
        self.by_year.remove(&record.publication_year, record.isbn);
        self.by_subject.remove(&IndexKey::new(&record.subject), record.isbn);
        self.by_author.remove(&IndexKey::new(&record.author), record.isbn);
    }

    /// Drop all three indices and derive them again from the catalog
    pub fn rebuild_indices(&mut self) {
        self.by_year = SecondaryIndex::new();
        self.by_subject = SecondaryIndex::new();
        self.by_author = SecondaryIndex::new();
        let records: Vec<BookRecord> = self.books.values().cloned().collect();
        for record in &records {
            self.index(record);
        }
    }

    /// Check that every catalog record sits in exactly its own bucket of each
    /// index and that no index references anything else.
    pub fn verify_indices(&self) -> AppResult<()> {
        for (isbn, record) in &self.books {
            if *isbn != record.isbn {
                return Err(AppError::InvalidState(format!(
                    "catalog key {} holds record for ISBN {}",
                    isbn, record.isbn
                )));
            }
            if !self.by_year.contains(&record.publication_year, *isbn) {
                return Err(missing_from("by-year", *isbn));
            }
            if !self.by_subject.contains(&IndexKey::new(&record.subject), *isbn) {
                return Err(missing_from("by-subject", *isbn));
            }
            if !self.by_author.contains(&IndexKey::new(&record.author), *isbn) {
                return Err(missing_from("by-author", *isbn));
            }
        }

        // Every book is in its own bucket, so matching totals rule out strays
        // and duplicates, as long as no bucket is empty.
        let expected = self.books.len();
        for (name, entries, has_empty) in [
            ("by-year", self.by_year.entry_count(), has_empty_bucket(&self.by_year)),
            ("by-subject", self.by_subject.entry_count(), has_empty_bucket(&self.by_subject)),
            ("by-author", self.by_author.entry_count(), has_empty_bucket(&self.by_author)),
        ] {
            if has_empty {
                return Err(AppError::InvalidState(format!("{} index keeps an empty bucket", name)));
            }
            if entries != expected {
                return Err(AppError::InvalidState(format!(
                    "{} index holds {} entries for {} books",
                    name, entries, expected
                )));
            }
        }
        Ok(())
    }

    /// Check that every loan references a catalog record and that no record
    /// has more loans than copies.
    pub fn verify_loans(&self) -> AppResult<()> {
        for entry in self.loans.entries() {
            if !self.books.contains_key(&entry.isbn) {
                return Err(AppError::InvalidState(format!(
                    "loan to '{}' references unknown ISBN {}",
                    entry.borrower, entry.isbn
                )));
            }
        }
        for record in self.books.values() {
            let outstanding = self.loans.outstanding(record.isbn);
            if outstanding > record.copy_count as usize {
                return Err(AppError::InvalidState(format!(
                    "ISBN {} has {} loans for {} copies",
                    record.isbn, outstanding, record.copy_count
                )));
            }
        }
        Ok(())
    }

    pub fn verify(&self) -> AppResult<()> {
        self.verify_indices()?;
        self.verify_loans()
    }

    pub fn stats(&self) -> CatalogStats {
        let copies: u64 = self.books.values().map(|r| u64::from(r.copy_count)).sum();
        let loans = self.loans.len();
        CatalogStats {
            books: self.books.len(),
            copies,
            loans,
            available: copies.saturating_sub(loans as u64),
        }
    }
}

fn missing_from(index: &str, isbn: Isbn) -> AppError {
    AppError::InvalidState(format!("ISBN {} is missing from its {} bucket", isbn, index))
}

fn has_empty_bucket<K: Ord>(index: &SecondaryIndex<K>) -> bool {
    index.buckets().any(|(_, bucket)| bucket.is_empty())
}
