//! The authoritative in-memory inventory of uploaded files.
//!
//! The registry is an explicit, injectable object with a defined lifecycle:
//! it starts empty and is seeded by the orchestrator's reconciliation scan
//! of the blob store. Readers get consistent snapshots (records are cloned
//! under the read lock), and `upsert` replaces whole records, so a reader
//! never observes a half-written entry.
//!
//! Ordering is insertion order; replacing a record keeps its position.

use std::sync::RwLock;

use crate::models::{Aggregate, FileRecord, Industry};

/// Industry constraint for [`Registry::list`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IndustryFilter {
    /// Accept every file, classified or not.
    #[default]
    All,
    /// Accept only files classified into this industry.
    Only(Industry),
}

/// Conjunctive filter: a record passes when it matches both constraints.
#[derive(Debug, Clone, Default)]
pub struct ListFilter {
    /// Case-insensitive substring of the file name.
    pub name_contains: Option<String>,
    pub industry: IndustryFilter,
}

impl ListFilter {
    fn matches(&self, record: &FileRecord) -> bool {
        if let Some(ref needle) = self.name_contains {
            if !record
                .name
                .to_lowercase()
                .contains(&needle.to_lowercase())
            {
                return false;
            }
        }
        match self.industry {
            IndustryFilter::All => true,
            IndustryFilter::Only(ind) => record.industry == Some(ind),
        }
    }
}

/// Set of all registered [`FileRecord`]s, keyed by name.
pub struct Registry {
    records: RwLock<Vec<FileRecord>>,
}

impl Registry {
    pub fn new() -> Self {
        Self {
            records: RwLock::new(Vec::new()),
        }
    }

    /// Insert or replace by name. A replacement keeps the record's insertion
    /// position; a new name appends.
    pub fn upsert(&self, record: FileRecord) {
        let mut records = self.records.write().unwrap();
        match records.iter_mut().find(|r| r.name == record.name) {
            Some(existing) => *existing = record,
            None => records.push(record),
        }
    }

    /// Remove by name. Returns whether a record existed and was removed.
    pub fn remove(&self, name: &str) -> bool {
        let mut records = self.records.write().unwrap();
        let before = records.len();
        records.retain(|r| r.name != name);
        records.len() < before
    }

    pub fn get(&self, name: &str) -> Option<FileRecord> {
        let records = self.records.read().unwrap();
        records.iter().find(|r| r.name == name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Records passing the filter, in insertion order.
    pub fn list(&self, filter: &ListFilter) -> Vec<FileRecord> {
        let records = self.records.read().unwrap();
        records.iter().filter(|r| filter.matches(r)).cloned().collect()
    }

    /// Every record, in insertion order.
    pub fn snapshot(&self) -> Vec<FileRecord> {
        let records = self.records.read().unwrap();
        records.clone()
    }

    /// Totals and the per-industry record-count breakdown.
    pub fn aggregate(&self) -> Aggregate {
        let records = self.records.read().unwrap();
        let mut agg = Aggregate {
            total_files: records.len() as u64,
            ..Default::default()
        };
        for record in records.iter() {
            agg.total_records += record.record_count;
            if let Some(industry) = record.industry {
                *agg.per_industry.entry(industry).or_insert(0) += record.record_count;
            }
        }
        agg
    }

    pub fn len(&self) -> usize {
        self.records.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}
