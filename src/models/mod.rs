//! Data models for the Elidune catalog

pub mod book;
pub mod catalog;
pub mod index;
pub mod loan;

// Re-export commonly used types
pub use book::{BookRecord, BookUpdate, Isbn, NewBook};
pub use catalog::{CatalogState, CatalogStats};
pub use index::{IndexKey, SecondaryIndex};
pub use loan::{LendingEntry, LendingLedger};
