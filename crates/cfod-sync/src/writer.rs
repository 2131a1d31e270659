//! Bounded-batch writes with partial-failure accounting.

use std::sync::Arc;

use anyhow::{Context, Result};
use cfod_core::FundingOpportunity;
use cfod_store::{ResponseMode, StoreWrite};
use serde::Serialize;
use serde_json::Value as JsonValue;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{info, warn};

pub const DEFAULT_BATCH_SIZE: usize = 50;
pub const MAX_WORKERS: usize = 8;

#[derive(Debug, Clone, Copy)]
pub struct BatchWriter {
    pub batch_size: usize,
    /// Concurrent in-flight batches. Batches are independent, so bounded
    /// concurrency is purely a throughput knob; 1 means sequential.
    pub workers: usize,
    pub mode: ResponseMode,
}

impl Default for BatchWriter {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            workers: 1,
            mode: ResponseMode::Minimal,
        }
    }
}

/// Aggregate outcome of one run's writes. Batches are not atomic with
/// respect to each other: a failed batch does not roll back earlier ones or
/// stop later ones, so these counts are the only record of partial success.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct WriteOutcome {
    pub rows_inserted: usize,
    pub rows_failed: usize,
    pub batches_attempted: usize,
    pub batches_failed: usize,
}

impl BatchWriter {
    /// Persist all rows, batch by batch. A failed batch is logged with the
    /// store's response, counted whole as failed, and the run continues
    /// with no retry and no backoff. Re-running the import is the retry
    /// mechanism:
    /// failed rows were never persisted, so dedup lets them through again.
    pub async fn write_all<S>(
        &self,
        store: Arc<S>,
        table: &str,
        rows: Vec<FundingOpportunity>,
    ) -> Result<WriteOutcome>
    where
        S: StoreWrite + Send + Sync + 'static,
    {
        let mut outcome = WriteOutcome::default();
        if rows.is_empty() {
            return Ok(outcome);
        }

        let batches: Vec<Vec<FundingOpportunity>> = rows
            .chunks(self.batch_size.max(1))
            .map(<[FundingOpportunity]>::to_vec)
            .collect();
        let semaphore = Arc::new(Semaphore::new(self.workers.clamp(1, MAX_WORKERS)));
        let mut tasks = JoinSet::new();

        for (batch_index, batch) in batches.into_iter().enumerate() {
            let store = Arc::clone(&store);
            let semaphore = Arc::clone(&semaphore);
            let table = table.to_string();
            let mode = self.mode;
            tasks.spawn(async move {
                let _permit = semaphore
                    .acquire_owned()
                    .await
                    .expect("semaphore not closed");
                let batch_len = batch.len();
                let result = insert_batch(store.as_ref(), &table, &batch, mode).await;
                (batch_index, batch_len, result)
            });
        }

        while let Some(joined) = tasks.join_next().await {
            let (batch_index, batch_len, result) = joined.context("batch write task panicked")?;
            outcome.batches_attempted += 1;
            match result {
                Ok(()) => {
                    outcome.rows_inserted += batch_len;
                    info!(batch_index, rows = batch_len, "batch written");
                }
                Err(error) => {
                    outcome.rows_failed += batch_len;
                    outcome.batches_failed += 1;
                    warn!(batch_index, rows = batch_len, %error, "batch failed; continuing");
                }
            }
        }

        Ok(outcome)
    }
}

async fn insert_batch<S: StoreWrite + ?Sized>(
    store: &S,
    table: &str,
    batch: &[FundingOpportunity],
    mode: ResponseMode,
) -> Result<()> {
    let payload: Vec<JsonValue> = batch
        .iter()
        .map(serde_json::to_value)
        .collect::<Result<_, _>>()
        .context("serializing batch rows")?;
    store.insert_rows(table, payload, mode).await?;
    Ok(())
}
