// SPDX-License-Identifier: PMPL-1.0-or-later
//
// Run the full pipeline over every file in a directory and print the
// recognised text per job.
//
//     cargo run --release --features ocr,pdfium --example scan_dir -- ./inbox

use std::sync::Arc;

use lesewerk_core::PipelineConfig;
use lesewerk_core::types::InputFile;
use lesewerk_pipeline::{LogReporter, Pipeline};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let dir = std::env::args().nth(1).unwrap_or_else(|| ".".to_string());

    let mut files = Vec::new();
    for entry in std::fs::read_dir(&dir)? {
        let entry = entry?;
        if entry.file_type()?.is_file() {
            files.push(InputFile::from_path(entry.path()));
        }
    }
    if files.is_empty() {
        eprintln!("no files in {dir}");
        return Ok(());
    }

    let config = PipelineConfig::default();
    let pipeline = Pipeline::with_default_backends(&config, Arc::new(LogReporter));

    let report = pipeline.process_batch(files).await?;
    for diagnostic in &report.diagnostics {
        eprintln!("skipped {}: {}", diagnostic.file_name, diagnostic.message);
    }

    for job in pipeline.ledger().snapshot().iter().rev() {
        println!("=== {} [{}] — {:?} ===", job.file_name, job.page_label, job.status);
        if let Some(message) = &job.error_message {
            println!("error: {message}");
        } else {
            println!("{}", job.text);
        }
    }
    Ok(())
}
