//! `hubblet list` and `hubblet ingest`.

use super::{load_config, missing_key_help, print_warnings};
use hubblet_agent::{ChatOrchestrator, TurnError};
use hubblet_memory::{IngestReport, SourceFile};
use std::path::PathBuf;

pub async fn list() -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config()?;
    let orchestrator = ChatOrchestrator::from_config(&config);
    let names = orchestrator.profiles().list();

    if names.is_empty() {
        println!("  No assistants yet. Run `hubblet create` to configure one.");
        return Ok(());
    }
    println!("🤖 Assistants ({})", names.len());
    for name in names {
        println!("   • {name}");
    }
    Ok(())
}

pub async fn ingest(name: &str, paths: &[PathBuf]) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config()?;
    let orchestrator = ChatOrchestrator::from_config(&config);

    let embedder = orchestrator.embedder();
    let mut loaded = orchestrator.profiles().load(name, embedder.as_ref()).await;
    print_warnings(&loaded.warnings);
    if !loaded.found {
        return Err(format!("Assistant '{name}' not found. Run `hubblet list`.").into());
    }

    let files = read_sources(paths);
    let report = match orchestrator.ingest(&mut loaded.knowledge, &files).await {
        Ok(report) => report,
        Err(TurnError::MissingApiKey) => {
            missing_key_help();
            return Err("Documents cannot be embedded without an API key.".into());
        }
        Err(e) => return Err(e.into()),
    };
    print_report(&report);

    orchestrator.save(&loaded.profile, &loaded.knowledge)?;
    println!(
        "  ✅ '{}' now holds {} chunks",
        loaded.profile.name,
        loaded.knowledge.chunks().len()
    );
    Ok(())
}

/// Read local files, reporting the ones that cannot be read.
pub(crate) fn read_sources(paths: &[PathBuf]) -> Vec<SourceFile> {
    paths
        .iter()
        .filter_map(|path| match SourceFile::read(path) {
            Ok(file) => Some(file),
            Err(e) => {
                eprintln!("  ⚠️  {e}");
                None
            }
        })
        .collect()
}

pub(crate) fn print_report(report: &IngestReport) {
    print_warnings(&report.warnings);
    for file in &report.processed_files {
        println!("  📄 {file}");
    }
    println!(
        "  {} chunks added, {} skipped",
        report.chunks_added, report.chunks_skipped
    );
}
