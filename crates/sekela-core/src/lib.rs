//! Core types and storage for the Sekela university catalog.
//!
//! Provides the data model ([`model::Institution`] with its programs and facilities),
//! the versioned catalog dataset, the SQLite-backed [`storage::CatalogStore`], and the
//! idempotent [`seed::Seeder`].

pub mod config;
pub mod dataset;
pub mod error;
pub mod model;
pub mod seed;
pub mod storage;

pub use error::{CatalogError, Result};
