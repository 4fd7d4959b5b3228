//! Catalog management service
//!
//! `CatalogService` exclusively owns the catalog, its by-year, by-subject and
//! by-author indices and the lending ledger. Every mutating operation checks
//! its preconditions before touching anything, applies the mutation, then
//! persists all datasets. When persistence fails the in-memory state is rolled
//! back to what it was before the operation.

use std::collections::BTreeSet;
use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::{
        catalog::{CatalogState, CatalogStats},
        BookRecord, BookUpdate, IndexKey, Isbn, NewBook,
    },
    repository::Repository,
};

pub struct CatalogService {
    repository: Repository,
    pub(super) state: CatalogState,
    trusted: bool,
}

impl CatalogService {
    /// Empty catalog over `repository`; nothing is loaded
    pub fn new(repository: Repository) -> Self {
        Self {
            repository,
            state: CatalogState::default(),
            trusted: true,
        }
    }

    /// Reconstruct the catalog from every dataset of `repository`.
    ///
    /// Indices that disagree with the catalog are rebuilt; the catalog is then
    /// untrusted until the next successful [`persist_all`](Self::persist_all).
    /// Loans that break the lending invariants fail the load.
    pub async fn load(repository: Repository) -> AppResult<Self> {
        let mut state = repository.load_state().await?;
        let mut trusted = true;

        if let Err(e) = state.verify_indices() {
            tracing::warn!("Rebuilding catalog indices: {}", e);
            state.rebuild_indices();
            trusted = false;
        }
        state.verify_loans()?;

        let stats = state.stats();
        tracing::info!(
            "Catalog loaded: {} books, {} copies, {} outstanding loans",
            stats.books,
            stats.copies,
            stats.loans
        );

        Ok(Self {
            repository,
            state,
            trusted,
        })
    }

    /// Add a new book
    pub async fn add_book(&mut self, book: NewBook) -> AppResult<BookRecord> {
        let book = book.trimmed();
        book.validate()?;
        if self.state.contains(book.isbn) {
            return Err(AppError::DuplicateKey(format!(
                "Book with ISBN {} already exists",
                book.isbn
            )));
        }

        let record = BookRecord::from(book);
        let previous = self.state.clone();
        self.state.insert(record.clone());
        self.commit(previous, "add_book").await?;

        tracing::info!("Book {} added ({} copies)", record.isbn, record.copy_count);
        Ok(record)
    }

    /// Add one copy of an existing book
    pub async fn add_copy(&mut self, isbn: Isbn) -> AppResult<BookRecord> {
        self.require(isbn)?;

        let previous = self.state.clone();
        let record = match self.state.record_mut(isbn) {
            Some(record) => {
                record.copy_count = record.copy_count.checked_add(1).ok_or_else(|| {
                    AppError::InvalidState(format!("Copy count of {} overflows", isbn))
                })?;
                record.clone()
            }
            None => return Err(not_found(isbn)),
        };
        self.commit(previous, "add_copy").await?;

        tracing::info!("Copy added to {} (now {})", isbn, record.copy_count);
        Ok(record)
    }

    /// Edit an existing book, moving it between index buckets as needed
    pub async fn edit_book(&mut self, isbn: Isbn, update: BookUpdate) -> AppResult<BookRecord> {
        let update = update.trimmed();
        update.validate()?;
        let mut record = self.require(isbn)?.clone();

        if let Some(copies) = update.copy_count {
            let outstanding = self.state.loans().outstanding(isbn);
            if (copies as usize) < outstanding {
                return Err(AppError::InvalidState(format!(
                    "Cannot reduce {} to {} copies with {} outstanding loans",
                    isbn, copies, outstanding
                )));
            }
        }

        update.apply_to(&mut record);
        let previous = self.state.clone();
        self.state.replace(record.clone());
        self.commit(previous, "edit_book").await?;

        tracing::info!("Book {} edited", isbn);
        Ok(record)
    }

    /// Remove a book with no outstanding loans
    pub async fn remove_book(&mut self, isbn: Isbn) -> AppResult<BookRecord> {
        self.require(isbn)?;
        let outstanding = self.state.loans().outstanding(isbn);
        if outstanding > 0 {
            return Err(AppError::InvalidState(format!(
                "Book {} has {} outstanding loans",
                isbn, outstanding
            )));
        }

        let previous = self.state.clone();
        let record = self.state.remove(isbn).ok_or_else(|| not_found(isbn))?;
        self.commit(previous, "remove_book").await?;

        tracing::info!("Book {} removed", isbn);
        Ok(record)
    }

    /// Write every dataset. Clears the untrusted flag on success.
    pub async fn persist_all(&mut self) -> AppResult<()> {
        self.repository.save_state(&self.state).await?;
        if !self.trusted {
            tracing::info!("Catalog persisted in full; in-memory state trusted again");
        }
        self.trusted = true;
        Ok(())
    }

    /// Persist after a mutation; on failure restore `previous`.
    ///
    /// After a partial write the durable copy mixes both states, so the
    /// restored state is written back. If that fails too the catalog stays
    /// untrusted until a full persist succeeds.
    pub(super) async fn commit(&mut self, previous: CatalogState, operation: &str) -> AppResult<()> {
        let err = match self.persist_all().await {
            Ok(()) => return Ok(()),
            Err(e) => e,
        };

        tracing::warn!("{} rolled back: {}", operation, err);
        self.state = previous;

        if matches!(err, AppError::PersistencePartial { .. }) {
            match self.repository.save_state(&self.state).await {
                Ok(()) => {
                    tracing::info!("Durable state restored after failed {}", operation);
                    self.trusted = true;
                }
                Err(e) => {
                    tracing::error!(
                        "Could not restore durable state after failed {}: {}; catalog untrusted",
                        operation,
                        e
                    );
                    self.trusted = false;
                }
            }
        }
        Err(err)
    }

    pub(super) fn require(&self, isbn: Isbn) -> AppResult<&BookRecord> {
        self.state.book(isbn).ok_or_else(|| not_found(isbn))
    }

    pub fn get_book(&self, isbn: Isbn) -> AppResult<&BookRecord> {
        self.require(isbn)
    }

    /// All books, ordered by ISBN
    pub fn books(&self) -> impl Iterator<Item = &BookRecord> {
        self.state.books().values()
    }

    pub fn books_by_year(&self, year: u32) -> Vec<&BookRecord> {
        self.resolve(self.state.by_year().get(&year))
    }

    /// Exact lookup; `subject` is normalized first
    pub fn books_by_subject(&self, subject: &str) -> Vec<&BookRecord> {
        self.resolve(self.state.by_subject().get(&IndexKey::new(subject)))
    }

    /// Exact lookup; `author` is normalized first
    pub fn books_by_author(&self, author: &str) -> Vec<&BookRecord> {
        self.resolve(self.state.by_author().get(&IndexKey::new(author)))
    }

    fn resolve(&self, bucket: Option<&BTreeSet<Isbn>>) -> Vec<&BookRecord> {
        bucket
            .map(|isbns| isbns.iter().filter_map(|isbn| self.state.book(*isbn)).collect())
            .unwrap_or_default()
    }

    /// False after a rollback whose durable restore failed, or after a load
    /// that had to rebuild indices
    pub fn is_trusted(&self) -> bool {
        self.trusted
    }

    /// Check index coherence and the lending bound
    pub fn verify(&self) -> AppResult<()> {
        self.state.verify()
    }

    pub fn stats(&self) -> CatalogStats {
        self.state.stats()
    }

    pub fn state(&self) -> &CatalogState {
        &self.state
    }
}

pub(super) fn not_found(isbn: Isbn) -> AppError {
    AppError::NotFound(format!("Book with ISBN {} not found", isbn))
}
