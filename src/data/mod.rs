//! Scored record providers.
//!
//! Defines the `ScoredRecordProvider` trait, the boundary with the
//! scoring pipeline, plus an in-memory and a CSV-backed implementation.
//! Providers only deliver records; validation happens in the core.

pub mod csv;

use anyhow::Result;

use crate::types::LoanRecord;

/// Abstraction over a source of scored loan records.
///
/// Implementors must yield records in a deterministic order so that
/// repeated runs over the same source produce identical curves.
#[cfg_attr(test, mockall::automock)]
pub trait ScoredRecordProvider: Send + Sync {
    /// Load every scored record from the source.
    fn load_records(&self) -> Result<Vec<LoanRecord>>;

    /// Human-readable source name for logging.
    fn source_name(&self) -> String;
}

/// Provider over records already held in memory.
#[derive(Debug, Clone, Default)]
pub struct InMemoryProvider {
    records: Vec<LoanRecord>,
}

impl InMemoryProvider {
    pub fn new(records: Vec<LoanRecord>) -> Self {
        Self { records }
    }
}

impl ScoredRecordProvider for InMemoryProvider {
    fn load_records(&self) -> Result<Vec<LoanRecord>> {
        Ok(self.records.clone())
    }

    fn source_name(&self) -> String {
        format!("memory ({} records)", self.records.len())
    }
}
