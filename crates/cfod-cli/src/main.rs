use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use cfod_store::{ResponseMode, StoreClient, StoreConfig, StoreWrite};
use cfod_sync::writer::DEFAULT_BATCH_SIZE;
use cfod_sync::{ImportConfig, ImportPipeline, SourceInput, WriteMode, WriteReport, TABLE};
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "cfod")]
#[command(about = "Funding opportunity import pipeline")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Run one import: read a source export, normalize, dedup, write.
    Import {
        #[arg(long, value_enum)]
        schema: SchemaArg,
        /// Source file; falls back to CFOD_SOURCE_FILE, then the schema's
        /// conventional ~/Downloads filename. Ignored for --schema seed.
        #[arg(long)]
        input: Option<PathBuf>,
        #[arg(long, default_value_t = DEFAULT_BATCH_SIZE)]
        batch_size: usize,
        /// Concurrent in-flight batches (1-8).
        #[arg(long, default_value_t = 1)]
        workers: usize,
        /// Print INSERT statements to stdout instead of calling the store.
        #[arg(long)]
        emit_sql: bool,
        /// Ask the store to return inserted rows (default is minimal).
        #[arg(long)]
        representation: bool,
        #[arg(long, default_value = "./reports")]
        reports_dir: PathBuf,
    },
    /// Print store totals and per-type counts.
    Report,
    /// Delete every row in the table. Refuses without --yes.
    Reset {
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum SchemaArg {
    Sheet,
    Nondilutive,
    Equity,
    Seed,
}

impl SchemaArg {
    fn id(self) -> &'static str {
        match self {
            SchemaArg::Sheet => "sheet",
            SchemaArg::Nondilutive => "nondilutive",
            SchemaArg::Equity => "equity",
            SchemaArg::Seed => "seed",
        }
    }

    fn conventional_filename(self) -> Option<&'static str> {
        match self {
            SchemaArg::Sheet => Some("funding-opportunities-sheet.csv"),
            SchemaArg::Nondilutive => Some("non-dilutive-capital.csv"),
            SchemaArg::Equity => Some("equity-funding.csv"),
            SchemaArg::Seed => None,
        }
    }
}

fn resolve_input(schema: SchemaArg, input: Option<PathBuf>) -> Result<SourceInput> {
    let Some(filename) = schema.conventional_filename() else {
        return Ok(SourceInput::Seed);
    };
    if let Some(path) = input {
        return Ok(SourceInput::File(path));
    }
    if let Ok(path) = std::env::var("CFOD_SOURCE_FILE") {
        return Ok(SourceInput::File(PathBuf::from(path)));
    }
    let home = std::env::var("HOME").context("HOME is not set and no --input was given")?;
    Ok(SourceInput::File(
        PathBuf::from(home).join("Downloads").join(filename),
    ))
}

fn print_import_summary(summary: &cfod_sync::ImportSummary) {
    println!(
        "run {} ({} schema): {} rows read, {} dropped, {} candidates, {} duplicates skipped",
        summary.run_id,
        summary.schema_id,
        summary.rows_read,
        summary.rows_dropped,
        summary.candidates,
        summary.duplicates_skipped
    );
    match &summary.write {
        WriteReport::Direct { outcome } => {
            println!(
                "wrote {} rows in {} batches ({} rows across {} batches failed)",
                outcome.rows_inserted,
                outcome.batches_attempted,
                outcome.rows_failed,
                outcome.batches_failed
            );
        }
        WriteReport::Sql {
            batches_emitted,
            rows_emitted,
        } => {
            println!("emitted {rows_emitted} rows as {batches_emitted} INSERT statements");
        }
    }
    if let Some(report) = &summary.store_after {
        print!("{report}");
    }
    if let Some(path) = &summary.report_path {
        println!("run summary written to {}", path.display());
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    // Credentials are resolved once, before any network call; a missing
    // credential is a fatal configuration error.
    let store = Arc::new(StoreClient::new(StoreConfig::from_env()?)?);

    match cli.command {
        Commands::Import {
            schema,
            input,
            batch_size,
            workers,
            emit_sql,
            representation,
            reports_dir,
        } => {
            let write_mode = if emit_sql {
                WriteMode::SqlStdout
            } else if representation {
                WriteMode::Direct(ResponseMode::Representation)
            } else {
                WriteMode::Direct(ResponseMode::Minimal)
            };
            let config = ImportConfig {
                schema_id: schema.id().to_string(),
                input: resolve_input(schema, input)?,
                batch_size,
                workers,
                write_mode,
                reports_dir,
            };
            let summary = ImportPipeline::new(config, store).run_once().await?;
            print_import_summary(&summary);
            // Failed batches are reported, not escalated: the run is
            // re-runnable and dedup makes re-runs safe.
        }
        Commands::Report => {
            let report = cfod_sync::report::store_report(store.as_ref(), TABLE).await?;
            print!("{report}");
        }
        Commands::Reset { yes } => {
            anyhow::ensure!(yes, "refusing to wipe {TABLE} without --yes");
            store.delete_all(TABLE, "name").await?;
            println!("deleted all rows from {TABLE}");
        }
    }

    Ok(())
}
