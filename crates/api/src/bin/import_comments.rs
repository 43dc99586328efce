//! Bulk comment importer.
//!
//! Reads a JSON document of comment records and inserts them directly
//! into the store, bypassing the API's author forcing and text
//! validation. Bad records are logged and skipped; only an unreadable
//! file or a malformed top-level document fails the run.
//!
//! Usage:
//!
//! ```text
//! import-comments --file comments.json
//! ```

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use comments_core::import::{self, ImportDate};
use comments_db::models::comment::ImportedComment;
use comments_db::repositories::CommentRepo;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "import-comments", version, about = "Import comments from a JSON file")]
struct Cli {
    /// Path to the JSON file containing comments.
    #[arg(long, default_value = "comments.json")]
    file: PathBuf,

    /// Database URL. Falls back to DATABASE_URL, then the dev default.
    #[arg(long)]
    database_url: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "import_comments=info,comments_db=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let database_url = cli
        .database_url
        .or_else(|| std::env::var("DATABASE_URL").ok())
        .unwrap_or_else(|| "sqlite://comments.db".to_string());

    let raw = std::fs::read_to_string(&cli.file)
        .with_context(|| format!("cannot read {}", cli.file.display()))?;
    let document: serde_json::Value =
        serde_json::from_str(&raw).context("import file is not valid JSON")?;
    let records = import::flatten_document(document)?;

    let pool = comments_db::create_pool(&database_url).await?;
    comments_db::run_migrations(&pool).await?;

    tracing::info!(file = %cli.file.display(), records = records.len(), "Starting comment import");

    let mut imported = 0usize;
    let mut skipped = 0usize;
    for value in &records {
        let label = import::record_label(value);
        let record = match import::coerce_record(value) {
            Ok(record) => record,
            Err(err) => {
                tracing::error!(record = %label, error = %err, "Skipping record");
                skipped += 1;
                continue;
            }
        };

        let created_at = match record.date {
            ImportDate::Parsed(date) => Some(date),
            ImportDate::Absent => None,
            ImportDate::Malformed => {
                tracing::warn!(record = %label, "Invalid date format, using current time");
                None
            }
        };

        let input = ImportedComment {
            text: record.text,
            author: record.author,
            likes: record.likes,
            image_url: record.image_url,
            created_at,
        };
        match CommentRepo::insert_imported(&pool, &input).await {
            Ok(_) => imported += 1,
            Err(err) => {
                tracing::error!(record = %label, error = %err, "Failed to import record");
                skipped += 1;
            }
        }
    }

    tracing::info!(imported, skipped, "Comment import finished");
    Ok(())
}
