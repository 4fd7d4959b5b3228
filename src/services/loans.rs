//! Lending operations of the catalog service

use crate::{
    error::{AppError, AppResult},
    models::{Isbn, LendingEntry},
};

use super::catalog::{not_found, CatalogService};

impl CatalogService {
    /// Lend one copy of `isbn` to `borrower`
    pub async fn lend_book(&mut self, isbn: Isbn, borrower: &str) -> AppResult<LendingEntry> {
        if borrower.trim().is_empty() {
            return Err(AppError::Validation("Borrower must not be empty".to_string()));
        }
        let record = self.require(isbn)?;
        let outstanding = self.state.loans().outstanding(isbn);
        if outstanding >= record.copy_count as usize {
            return Err(AppError::Unavailable(format!(
                "All {} copies of {} are lent",
                record.copy_count, isbn
            )));
        }

        let entry = LendingEntry::new(isbn, borrower);
        let previous = self.state.clone();
        self.state.loans_mut().push(entry.clone());
        self.commit(previous, "lend_book").await?;

        tracing::info!("Book {} lent to {}", isbn, entry.borrower);
        Ok(entry)
    }

    /// Return the oldest loan of `isbn` held by `borrower`
    pub async fn return_book(&mut self, isbn: Isbn, borrower: &str) -> AppResult<LendingEntry> {
        let previous = self.state.clone();
        let entry = self.state.loans_mut().take(isbn, borrower).ok_or_else(|| {
            AppError::NotFound(format!("No loan of {} to '{}'", isbn, borrower.trim()))
        })?;
        self.commit(previous, "return_book").await?;

        tracing::info!("Book {} returned by {}", isbn, entry.borrower);
        Ok(entry)
    }

    /// Return the oldest outstanding loan of `isbn`, whoever holds it
    pub async fn return_copy(&mut self, isbn: Isbn) -> AppResult<LendingEntry> {
        let previous = self.state.clone();
        let entry = self
            .state
            .loans_mut()
            .take_any(isbn)
            .ok_or_else(|| AppError::NotFound(format!("No outstanding loan of {}", isbn)))?;
        self.commit(previous, "return_copy").await?;

        tracing::info!("Book {} returned ({} held it)", isbn, entry.borrower);
        Ok(entry)
    }

    /// Outstanding loans of `isbn`, oldest first
    pub fn loans_for(&self, isbn: Isbn) -> Vec<&LendingEntry> {
        self.state.loans().for_isbn(isbn).collect()
    }

    /// Every outstanding loan, oldest first
    pub fn loans(&self) -> &[LendingEntry] {
        self.state.loans().entries()
    }

    pub fn available_copies(&self, isbn: Isbn) -> AppResult<u32> {
        self.state.available(isbn).ok_or_else(|| not_found(isbn))
    }
}
