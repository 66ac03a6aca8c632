//! Inventory statistics overview.
//!
//! Gives a quick summary of what's stored: file counts, record counts, and
//! the per-industry breakdown. Used by `leads stats` to confirm uploads and
//! reconciliation are doing what's expected.

use anyhow::Result;
use std::collections::BTreeMap;

use crate::config::Config;
use crate::models::Industry;
use crate::registry::ListFilter;
use crate::store::LeadStore;

/// Run the stats command: open the store and print a summary.
pub async fn run_stats(config: &Config) -> Result<()> {
    let store = LeadStore::open(config).await?;
    let agg = store.aggregate();
    let files = store.list(&ListFilter::default());

    let total_bytes: u64 = files.iter().map(|f| f.size_bytes).sum();

    println!("Leadstore — Inventory Stats");
    println!("===========================");
    println!();
    println!("  Storage:     {}", config.storage.root.display());
    println!("  Size:        {}", format_bytes(total_bytes));
    println!();
    println!("  Files:       {}", agg.total_files);
    println!("  Records:     {}", agg.total_records);

    // Per-industry breakdown: file counts come from the records themselves,
    // record counts from the aggregate.
    let mut file_counts: BTreeMap<Industry, u64> = BTreeMap::new();
    let mut unclassified_files = 0u64;
    let mut unclassified_records = 0u64;
    for file in &files {
        match file.industry {
            Some(ind) => *file_counts.entry(ind).or_insert(0) += 1,
            None => {
                unclassified_files += 1;
                unclassified_records += file.record_count;
            }
        }
    }

    if !files.is_empty() {
        println!();
        println!("  By industry:");
        println!("  {:<16} {:>6} {:>10}", "INDUSTRY", "FILES", "RECORDS");
        println!("  {}", "-".repeat(34));

        for ind in Industry::ALL {
            let file_count = file_counts.get(&ind).copied().unwrap_or(0);
            if file_count == 0 {
                continue;
            }
            let records = agg.per_industry.get(&ind).copied().unwrap_or(0);
            println!("  {:<16} {:>6} {:>10}", ind.as_str(), file_count, records);
        }
        if unclassified_files > 0 {
            println!(
                "  {:<16} {:>6} {:>10}",
                "(unclassified)", unclassified_files, unclassified_records
            );
        }
    }

    println!();
    Ok(())
}

/// Format a byte count as a human-readable string.
pub fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else if bytes < 1024 * 1024 * 1024 {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    } else {
        format!("{:.2} GB", bytes as f64 / (1024.0 * 1024.0 * 1024.0))
    }
}
