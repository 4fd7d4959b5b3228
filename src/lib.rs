//! Elidune Catalog
//!
//! Book catalog core for the Elidune library management system: the catalog
//! keyed by ISBN, its by-year, by-subject and by-author indices, and the
//! lending ledger, kept consistent with each other and with durable storage.

pub mod config;
pub mod error;
pub mod models;
pub mod repository;
pub mod services;

pub use crate::config::AppConfig;
pub use error::{AppError, AppResult};
pub use services::{CatalogService, SharedCatalog};

