//! Core data models for the lead-file inventory.
//!
//! These types represent the registered files and derived statistics that
//! flow between the blob store, the registry, and the HTTP API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Closed vocabulary of industry tags inferred from filenames.
///
/// The set is fixed; [`Industry::ALL`] gives the canonical order used by the
/// classifier and the `/scraper/industries` endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Industry {
    Plumbing,
    Hvac,
    Electrical,
    Remodeling,
    Landscaping,
    PowerWashing,
    Roofing,
    Painting,
}

impl Industry {
    /// All industries, in classifier vocabulary order.
    pub const ALL: [Industry; 8] = [
        Industry::Plumbing,
        Industry::Hvac,
        Industry::Electrical,
        Industry::Remodeling,
        Industry::Landscaping,
        Industry::PowerWashing,
        Industry::Roofing,
        Industry::Painting,
    ];

    /// The snake_case tag used on the wire and in filenames.
    pub fn as_str(&self) -> &'static str {
        match self {
            Industry::Plumbing => "plumbing",
            Industry::Hvac => "hvac",
            Industry::Electrical => "electrical",
            Industry::Remodeling => "remodeling",
            Industry::Landscaping => "landscaping",
            Industry::PowerWashing => "power_washing",
            Industry::Roofing => "roofing",
            Industry::Painting => "painting",
        }
    }
}

impl fmt::Display for Industry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Industry {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Industry::ALL
            .iter()
            .find(|i| i.as_str() == s)
            .copied()
            .ok_or_else(|| format!("unknown industry: '{}'", s))
    }
}

/// One registered CSV file.
///
/// `industry` is always derivable from `name` via [`crate::classify::classify`];
/// it is carried here so list responses do not re-derive it per read, but the
/// filename remains the source of truth.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileRecord {
    pub name: String,
    #[serde(rename = "size")]
    pub size_bytes: u64,
    #[serde(rename = "records")]
    pub record_count: u64,
    pub industry: Option<Industry>,
    pub uploaded_at: DateTime<Utc>,
}

/// Derived statistics over the whole registry.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Aggregate {
    pub total_files: u64,
    pub total_records: u64,
    /// Record counts summed per classified industry. Files with no industry
    /// match contribute to the totals only.
    pub per_industry: BTreeMap<Industry, u64>,
}
