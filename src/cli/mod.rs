// ============================================================
// Layer 1 — CLI / Presentation Layer
// ============================================================
// This is the entry point for all user interaction.
// It uses the `clap` crate to parse command line arguments.
// All business logic is delegated to Layer 2 (application).
//
// Three commands are supported:
//   1. `highlight` — prints a paper's highlight sentences
//   2. `tag`       — prints the tagged sentence table
//   3. `models`    — lists trained tagger variants
//
// Reference: Rust Book §7 (Modules), §12 (CLI programs)

pub mod commands;

use std::io::Write;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, HighlightArgs, ModelsArgs, TagArgs};

use crate::application::extract_use_case::ExtractUseCase;
use crate::domain::error::HighlightError;
use crate::infra::artifacts::ArtifactStore;
use crate::infra::report::TagReport;

#[derive(Parser, Debug)]
#[command(
    name = "sci-highlights",
    version = "0.1.0",
    about = "Tag the discourse role of each sentence in a scientific paper and print its highlights."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Dispatch to the matching handler; the CLI only routes.
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Highlight(args) => run_highlight(args),
            Commands::Tag(args)       => run_tag(args),
            Commands::Models(args)    => run_models(args),
        }
    }
}

fn run_highlight(args: HighlightArgs) -> Result<()> {
    let config   = args.model.into_config()?;
    let use_case = ExtractUseCase::new(&config)?;
    let text     = args.input.read()?;
    tracing::info!("Serving tagger {}", use_case.tagger().variant());

    let highlights = use_case.highlights(&text)?;
    tracing::info!("Selected {} highlights", highlights.len());
    if args.json {
        println!("{}", serde_json::to_string_pretty(&highlights.into_sentences())?);
    } else if highlights.is_empty() {
        eprintln!("No highlights available: the input has no sentences.");
    } else {
        print!("{highlights}");
    }
    Ok(())
}

fn run_tag(args: TagArgs) -> Result<()> {
    let config   = args.model.into_config()?;
    let use_case = ExtractUseCase::new(&config)?;
    let text     = args.input.read()?;
    tracing::info!("Serving tagger {}", use_case.tagger().variant());

    let records = match use_case.tag_document(&text) {
        Ok(records) => records,
        Err(e) if matches!(e.downcast_ref::<HighlightError>(), Some(HighlightError::EmptyInput)) => {
            tracing::info!("No sentences in input");
            Vec::new()
        }
        Err(e) => return Err(e),
    };

    let report = TagReport::new(&records);
    match &args.output {
        Some(path) => {
            report.write_to_path(path, args.format)?;
            println!("Wrote {} tagged sentences to '{}'", records.len(), path.display());
        }
        None => {
            let stdout = std::io::stdout();
            let mut out = stdout.lock();
            report.write(&mut out, args.format)?;
            out.flush()?;
        }
    }
    Ok(())
}

fn run_models(args: ModelsArgs) -> Result<()> {
    let store    = ArtifactStore::new(&args.tagger_dir);
    let variants = store.available_variants()?;

    if variants.is_empty() {
        println!("No trained taggers in '{}'", args.tagger_dir.display());
        return Ok(());
    }
    for v in variants {
        let status = match store.ensure_available(v) {
            Ok(_)  => "complete".to_string(),
            Err(e) => format!("incomplete: {e}"),
        };
        println!("{}  [{}]", v.artifact_stem(), status);
    }
    Ok(())
}
