//! One-shot import pipeline orchestration: read → normalize → transform →
//! dedup → write → report. No persistent process; every invocation is
//! independent and stateless apart from the remote store.

pub mod dedup;
pub mod report;
pub mod sql;
pub mod writer;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use cfod_adapters::{transformer_for_schema, RecordReader};
use cfod_core::FundingOpportunity;
use cfod_store::{ResponseMode, StoreRead, StoreWrite};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::fs;
use tracing::warn;
use uuid::Uuid;

use crate::dedup::DedupOutcome;
use crate::report::StoreReport;
use crate::writer::{BatchWriter, WriteOutcome};

pub const CRATE_NAME: &str = "cfod-sync";

/// The one table this pipeline writes.
pub const TABLE: &str = "funding_opportunities";

#[derive(Debug, Clone)]
pub enum SourceInput {
    /// Delimited text export on disk.
    File(PathBuf),
    /// The hand-authored in-code dataset.
    Seed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    /// Call the store's insert endpoint batch by batch.
    Direct(ResponseMode),
    /// Emit literal INSERT statements to stdout for operator review.
    SqlStdout,
}

#[derive(Debug, Clone)]
pub struct ImportConfig {
    pub schema_id: String,
    pub input: SourceInput,
    pub batch_size: usize,
    pub workers: usize,
    pub write_mode: WriteMode,
    /// Per-run JSON summaries land under `<reports_dir>/<run_id>/`.
    pub reports_dir: PathBuf,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum WriteReport {
    Direct {
        #[serde(flatten)]
        outcome: WriteOutcome,
    },
    Sql {
        batches_emitted: usize,
        rows_emitted: usize,
    },
}

/// Everything an operator (or a later tool) needs to know about one run.
#[derive(Debug, Clone, Serialize)]
pub struct ImportSummary {
    pub run_id: Uuid,
    pub schema_id: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub rows_read: usize,
    pub rows_dropped: usize,
    pub candidates: usize,
    pub duplicates_skipped: usize,
    pub write: WriteReport,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub store_after: Option<StoreReport>,
    #[serde(skip_serializing)]
    pub report_path: Option<PathBuf>,
}

struct LoadedSource {
    rows_read: usize,
    rows_dropped: usize,
    candidates: Vec<FundingOpportunity>,
}

pub struct ImportPipeline<S> {
    config: ImportConfig,
    store: Arc<S>,
}

impl<S> ImportPipeline<S>
where
    S: StoreRead + StoreWrite + Send + Sync + 'static,
{
    pub fn new(config: ImportConfig, store: Arc<S>) -> Self {
        Self { config, store }
    }

    pub async fn run_once(&self) -> Result<ImportSummary> {
        let started_at = Utc::now();
        let run_id = Uuid::new_v4();

        let loaded = self.load_candidates().await?;
        let candidates = loaded.candidates.len();

        // A failed dedup read must abort here; proceeding would treat
        // "could not check" as "no duplicates".
        let DedupOutcome {
            fresh,
            duplicates_skipped,
        } = dedup::filter_new(self.store.as_ref(), TABLE, loaded.candidates)
            .await
            .context("dedup read failed; aborting before any writes")?;

        let write = match self.config.write_mode {
            WriteMode::Direct(mode) => {
                let writer = BatchWriter {
                    batch_size: self.config.batch_size,
                    workers: self.config.workers,
                    mode,
                };
                let outcome = writer
                    .write_all(Arc::clone(&self.store), TABLE, fresh)
                    .await?;
                WriteReport::Direct { outcome }
            }
            WriteMode::SqlStdout => {
                let rows_emitted = fresh.len();
                let stdout = std::io::stdout();
                let batches_emitted = sql::emit_batches(
                    &mut stdout.lock(),
                    TABLE,
                    &fresh,
                    self.config.batch_size,
                )
                .context("emitting SQL statements")?;
                WriteReport::Sql {
                    batches_emitted,
                    rows_emitted,
                }
            }
        };

        // Observational only; a count failure after successful writes is
        // worth a warning, not a failed run.
        let store_after = match self.config.write_mode {
            WriteMode::Direct(_) => match report::store_report(self.store.as_ref(), TABLE).await {
                Ok(report) => Some(report),
                Err(error) => {
                    warn!(%error, "store report queries failed after writes");
                    None
                }
            },
            WriteMode::SqlStdout => None,
        };

        let mut summary = ImportSummary {
            run_id,
            schema_id: self.config.schema_id.clone(),
            started_at,
            finished_at: Utc::now(),
            rows_read: loaded.rows_read,
            rows_dropped: loaded.rows_dropped,
            candidates,
            duplicates_skipped,
            write,
            store_after,
            report_path: None,
        };
        summary.report_path = Some(self.write_run_report(&summary).await?);
        Ok(summary)
    }

    async fn load_candidates(&self) -> Result<LoadedSource> {
        match &self.config.input {
            SourceInput::Seed => {
                let candidates = cfod_adapters::seed::seed_opportunities();
                Ok(LoadedSource {
                    rows_read: candidates.len(),
                    rows_dropped: 0,
                    candidates,
                })
            }
            SourceInput::File(path) => {
                let transformer = transformer_for_schema(&self.config.schema_id)
                    .with_context(|| format!("unknown schema id {:?}", self.config.schema_id))?;
                let text = fs::read_to_string(path)
                    .await
                    .with_context(|| format!("reading source file {}", path.display()))?;

                let mut reader = RecordReader::new(&text);
                let mut rows_read = 0usize;
                let mut candidates = Vec::new();
                for record in reader.by_ref() {
                    rows_read += 1;
                    if let Some(opp) = transformer.transform(&record) {
                        candidates.push(opp);
                    }
                }
                Ok(LoadedSource {
                    rows_read,
                    rows_dropped: reader.dropped_rows(),
                    candidates,
                })
            }
        }
    }

    async fn write_run_report(&self, summary: &ImportSummary) -> Result<PathBuf> {
        let run_dir = self.config.reports_dir.join(summary.run_id.to_string());
        fs::create_dir_all(&run_dir)
            .await
            .with_context(|| format!("creating {}", run_dir.display()))?;

        let path = run_dir.join("run_summary.json");
        let bytes = serde_json::to_vec_pretty(summary).context("serializing run summary")?;
        fs::write(&path, bytes)
            .await
            .with_context(|| format!("writing {}", path.display()))?;
        Ok(path)
    }
}
