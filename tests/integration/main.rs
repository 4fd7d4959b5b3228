//! Catalog integration tests

mod file_roundtrip;
mod properties;
mod scenario;
