//! Deduplication against the remote store.

use std::collections::HashSet;

use cfod_core::FundingOpportunity;
use cfod_store::{StoreError, StoreRead};
use tracing::info;

#[derive(Debug, Clone)]
pub struct DedupOutcome {
    pub fresh: Vec<FundingOpportunity>,
    pub duplicates_skipped: usize,
}

/// Drop every candidate whose lower-cased name already exists in the store,
/// or repeats an earlier candidate in this run.
///
/// Exactly one logical read (the store client pages internally until the
/// name column is exhausted). A failed read is fatal for the run: the
/// caller must not fall through to writes as if there were no duplicates.
pub async fn filter_new<S: StoreRead + ?Sized>(
    store: &S,
    table: &str,
    candidates: Vec<FundingOpportunity>,
) -> Result<DedupOutcome, StoreError> {
    let existing: HashSet<String> = store
        .all_column_values(table, "name")
        .await?
        .into_iter()
        .map(|name| name.to_lowercase())
        .collect();

    let mut seen_this_run = HashSet::new();
    let mut fresh = Vec::new();
    let mut duplicates_skipped = 0usize;

    for candidate in candidates {
        let key = candidate.dedup_key();
        if existing.contains(&key) {
            info!(name = %candidate.name, "skipping duplicate already in store");
            duplicates_skipped += 1;
        } else if !seen_this_run.insert(key) {
            info!(name = %candidate.name, "skipping duplicate within this import");
            duplicates_skipped += 1;
        } else {
            fresh.push(candidate);
        }
    }

    Ok(DedupOutcome {
        fresh,
        duplicates_skipped,
    })
}
