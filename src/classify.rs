//! Filename-based industry classification.
//!
//! Scraped lead exports are named after the niche they were pulled for
//! (`plumbing_leads_march.csv`, `hvac.csv`), so the industry tag is inferred
//! by substring matching against a fixed keyword vocabulary.
//!
//! The vocabulary is an explicit ordered list: a filename containing keywords
//! of several industries yields the first match in [`VOCABULARY`] order. That
//! ambiguity is inherent to substring inference and is part of the contract,
//! not an implementation accident.

use crate::models::Industry;

/// Ordered keyword vocabulary. Multi-word keywords carry both the spaced and
/// the snake_case spelling so they match either naming style.
pub const VOCABULARY: &[(Industry, &[&str])] = &[
    (
        Industry::Plumbing,
        &["plumb", "rooter", "drain", "sewer", "septic"],
    ),
    (
        Industry::Hvac,
        &["hvac", "heating", "cooling", "air condition", "air_condition", "furnace"],
    ),
    (
        Industry::Electrical,
        &["electric", "wiring", "panel", "circuit"],
    ),
    (
        Industry::Remodeling,
        &["remodel", "renovation", "construction", "contractor"],
    ),
    (
        Industry::Landscaping,
        &["landscap", "lawn", "tree service", "tree_service", "yard"],
    ),
    (
        Industry::PowerWashing,
        &[
            "power wash",
            "power_wash",
            "pressure wash",
            "pressure_wash",
            "soft wash",
            "soft_wash",
        ],
    ),
    (Industry::Roofing, &["roof", "shingle", "gutter"]),
    (Industry::Painting, &["paint", "stain", "finish"]),
];

/// Classify a filename into zero or one industry.
///
/// Lower-cases the name and returns the first industry whose keyword list
/// contains a substring of it, in [`VOCABULARY`] order. Pure and total.
pub fn classify(name: &str) -> Option<Industry> {
    let lower = name.to_lowercase();
    for (industry, keywords) in VOCABULARY {
        if keywords.iter().any(|kw| lower.contains(kw)) {
            return Some(*industry);
        }
    }
    None
}
