//! Idempotent seeding and destructive refresh of the catalog.
//!
//! `seed` adds dataset records whose name is not already stored and never touches
//! existing rows. `refresh` clears every institution in one transaction and then
//! loads the whole dataset. In both, a record that fails to load is logged and
//! counted, and the loop moves on to the next record.

use crate::dataset::CatalogDataset;
use crate::error::{CatalogError, Result};
use crate::model::NewInstitution;
use crate::storage::Session;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SeedMode {
    Seed,
    Refresh,
}

/// A record that could not be loaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SeedFailure {
    pub name: String,
    pub message: String,
}

/// Outcome of a seed or refresh pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SeedReport {
    pub mode: SeedMode,
    pub added: usize,
    pub skipped: usize,
    pub failed: Vec<SeedFailure>,
}

impl SeedReport {
    fn new(mode: SeedMode) -> Self {
        Self {
            mode,
            added: 0,
            skipped: 0,
            failed: Vec::new(),
        }
    }

    /// Human-readable summary returned to API clients.
    pub fn message(&self) -> String {
        match self.mode {
            SeedMode::Seed => format!(
                "Scraping complete! Added {} new universities, skipped {} existing ones.",
                self.added, self.skipped
            ),
            SeedMode::Refresh => format!(
                "Database refresh complete! Added {} universities total.",
                self.added
            ),
        }
    }
}

/// Loads a [`CatalogDataset`] into the store.
#[derive(Debug, Clone, Copy)]
pub struct Seeder<'a> {
    dataset: &'a CatalogDataset,
}

impl<'a> Seeder<'a> {
    pub fn new(dataset: &'a CatalogDataset) -> Self {
        Self { dataset }
    }

    /// Insert every dataset record whose name is not yet stored.
    pub fn seed(&self, session: &mut Session) -> Result<SeedReport> {
        tracing::info!(
            version = %self.dataset.version,
            records = self.dataset.len(),
            "seeding catalog"
        );
        let mut report = SeedReport::new(SeedMode::Seed);

        for record in self.dataset.records() {
            match session.find_by_name(&record.name) {
                Ok(Some(_)) => {
                    report.skipped += 1;
                    tracing::info!("Skipped (already exists): {}", record.name);
                }
                Ok(None) => load_record(session, record, &mut report),
                Err(e) => record_failure(&mut report, &record.name, e),
            }
        }

        tracing::info!("{}", report.message());
        Ok(report)
    }

    /// Clear the catalog, then load the full dataset.
    ///
    /// If the clear step fails nothing is inserted and the store is left as it was.
    pub fn refresh(&self, session: &mut Session) -> Result<SeedReport> {
        tracing::info!(version = %self.dataset.version, "refreshing catalog");

        let removed = session.delete_all_institutions().map_err(|e| {
            let err = CatalogError::RefreshTransaction(e.to_string());
            tracing::error!("{err}");
            err
        })?;
        tracing::info!(removed, "cleared existing university data");

        let mut report = SeedReport::new(SeedMode::Refresh);
        tracing::info!(
            "Adding {} universities to database...",
            self.dataset.len()
        );
        for record in self.dataset.records() {
            load_record(session, record, &mut report);
        }

        tracing::info!("{}", report.message());
        Ok(report)
    }
}

fn load_record(session: &mut Session, record: &NewInstitution, report: &mut SeedReport) {
    match session.insert_institution(record) {
        Ok(inst) => {
            report.added += 1;
            tracing::info!(
                id = inst.id,
                "Added: {} ({})",
                inst.name,
                inst.ownership.as_deref().unwrap_or("unknown")
            );
        }
        Err(e) => record_failure(report, &record.name, e),
    }
}

fn record_failure(report: &mut SeedReport, name: &str, source: CatalogError) {
    let err = CatalogError::PartialSeed {
        name: name.to_string(),
        source: Box::new(source),
    };
    tracing::warn!("{err}");
    report.failed.push(SeedFailure {
        name: name.to_string(),
        message: err.to_string(),
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seed_message() {
        let report = SeedReport {
            mode: SeedMode::Seed,
            added: 3,
            skipped: 2,
            failed: Vec::new(),
        };
        assert_eq!(
            report.message(),
            "Scraping complete! Added 3 new universities, skipped 2 existing ones."
        );
    }

    #[test]
    fn test_refresh_message() {
        let report = SeedReport {
            mode: SeedMode::Refresh,
            added: 30,
            skipped: 0,
            failed: Vec::new(),
        };
        assert_eq!(
            report.message(),
            "Database refresh complete! Added 30 universities total."
        );
    }
}
