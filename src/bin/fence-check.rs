//! Batch fence checker for markdown files and directories.
//!
//! Exits with status 1 when any document has an error-severity diagnostic
//! or a file could not be read.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use walkdir::WalkDir;

use fence_language_server::config::CommonArgs;
use fence_language_server::{Config, Document, DocumentScanner, SettingsManager};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

/// Check fenced code blocks in markdown documents
#[derive(Debug, Parser)]
#[command(name = "fence-check")]
#[command(about = "Report unclosed, ambiguous and badly formatted code fences")]
#[command(version)]
struct CheckArgs {
    /// Markdown files or directories to scan
    #[arg(required = true)]
    paths: Vec<PathBuf>,

    #[arg(long, value_enum, default_value = "text", help = "Output format")]
    format: OutputFormat,

    #[command(flatten)]
    common: CommonArgs,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let args = CheckArgs::parse();
    let config = Config::from_common(args.common)?;
    config.init_logging();

    let settings_manager = SettingsManager::new(&config)?;
    settings_manager.load().await?;
    let scanner = DocumentScanner::new(settings_manager.current().await);

    let mut files = Vec::new();
    for path in &args.paths {
        collect_markdown_files(path, &mut files)
            .with_context(|| format!("Failed to read {}", path.display()))?;
    }

    let mut documents = Vec::with_capacity(files.len());
    let mut unreadable = 0;
    for file in files {
        match tokio::fs::read_to_string(&file).await {
            Ok(text) => documents.push(Document::new(file.display().to_string(), text)),
            Err(e) => {
                log::error!("Failed to read {}: {}", file.display(), e);
                unreadable += 1;
            }
        }
    }

    log::info!("Scanning {} documents", documents.len());
    let reports = scanner.scan_all(documents).await;

    match args.format {
        OutputFormat::Text => {
            for report in &reports {
                for line in report.render_text() {
                    println!("{}", line);
                }
            }
        }
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&reports)?),
    }

    if unreadable > 0 || reports.iter().any(|r| r.has_errors()) {
        Ok(ExitCode::FAILURE)
    } else {
        Ok(ExitCode::SUCCESS)
    }
}

/// Collect markdown files under `path` in file-name order; symlinks are not followed
fn collect_markdown_files(path: &Path, files: &mut Vec<PathBuf>) -> Result<()> {
    if !path.is_dir() {
        files.push(path.to_path_buf());
        return Ok(());
    }

    for entry in WalkDir::new(path).follow_links(false).sort_by_file_name() {
        let entry = entry.with_context(|| format!("walk {}", path.display()))?;
        if entry.file_type().is_file() && entry.path().extension().is_some_and(|ext| ext == "md") {
            files.push(entry.into_path());
        }
    }
    Ok(())
}
