// ============================================================
// Layer 1 — CLI Commands and Arguments
// ============================================================
// Defines the three subcommands: `highlight`, `tag` and `models`
// and all their configurable flags.
//
// Model and pipeline flags are shared by `highlight` and `tag`
// and override whatever a --config JSON file says.
//
// Reference: Rust Book §12 (Building a CLI Program)

use std::io::Read;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Subcommand};

use crate::application::extract_use_case::ExtractConfig;
use crate::domain::variant::AttentionContext;
use crate::infra::report::ReportFormat;

/// The top-level subcommands available to the user
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the highlight sentences of a paper
    Highlight(HighlightArgs),

    /// Print the tagged sentence table (sentence, tag, prob, tense)
    Tag(TagArgs),

    /// List the trained tagger variants in a directory
    Models(ModelsArgs),
}

/// Where the paper text comes from.
#[derive(Args, Debug)]
pub struct InputArgs {
    /// Text file with the paper; omit or pass "-" to read stdin
    #[arg(long, short)]
    pub input: Option<PathBuf>,
}

impl InputArgs {
    pub fn read(&self) -> Result<String> {
        match &self.input {
            Some(path) if path.as_os_str() != "-" => std::fs::read_to_string(path)
                .with_context(|| format!("Cannot read input '{}'", path.display())),
            _ => {
                let mut text = String::new();
                std::io::stdin()
                    .read_to_string(&mut text)
                    .context("Cannot read input from stdin")?;
                Ok(text)
            }
        }
    }
}

/// Tagger selection and pipeline settings.
#[derive(Args, Debug, Default)]
pub struct ModelArgs {
    /// JSON config file; flags below override its fields
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Directory with trained tagger artifacts
    #[arg(long)]
    pub tagger_dir: Option<PathBuf>,

    /// Word vector text file (GloVe / word2vec layout)
    #[arg(long)]
    pub embeddings: Option<PathBuf>,

    /// HuggingFace tokenizer.json for sub-word tokens
    #[arg(long)]
    pub tokenizer: Option<PathBuf>,

    /// Use the tagger trained with word attention
    #[arg(long)]
    pub attention: bool,

    /// Attention context: word, clause or LSTM_clause
    #[arg(long)]
    pub att_context: Option<AttentionContext>,

    /// Use the tagger with a unidirectional sentence LSTM
    #[arg(long)]
    pub lstm: bool,

    /// Use a tagger trained without the bidirectional LSTM
    #[arg(long)]
    pub unidirectional: bool,

    /// Use the tagger with a CRF output layer
    #[arg(long)]
    pub crf: bool,

    /// Sentences per chunk (keep below the trained max of 40)
    #[arg(long)]
    pub chunk_size: Option<usize>,

    /// Tag at most this many chunks per document
    #[arg(long)]
    pub max_chunks: Option<usize>,

    /// Chunks per forward pass
    #[arg(long)]
    pub batch_size: Option<usize>,

    /// Remove " (...)" groups from highlight sentences
    #[arg(long)]
    pub strip_parentheticals: bool,

    /// Skip root-verb tense parsing (every tense is UNK)
    #[arg(long)]
    pub no_tense: bool,
}

impl ModelArgs {
    /// Config file (or defaults) with every given flag applied.
    pub fn into_config(self) -> Result<ExtractConfig> {
        let mut cfg = match &self.config {
            Some(path) => ExtractConfig::load(path)?,
            None       => ExtractConfig::default(),
        };

        if let Some(dir) = self.tagger_dir     { cfg.tagger_dir = dir; }
        if let Some(path) = self.embeddings    { cfg.embeddings = path; }
        if let Some(path) = self.tokenizer     { cfg.tokenizer  = Some(path); }
        if let Some(ctx) = self.att_context    { cfg.variant.att_context = ctx; }
        if let Some(n) = self.chunk_size       { cfg.chunk_size = n; }
        if let Some(n) = self.max_chunks       { cfg.max_chunks = Some(n); }
        if let Some(n) = self.batch_size       { cfg.batch_size = n; }

        if self.attention            { cfg.variant.use_attention = true; }
        if self.lstm                 { cfg.variant.lstm          = true; }
        if self.unidirectional       { cfg.variant.bidirectional = false; }
        if self.crf                  { cfg.variant.crf           = true; }
        if self.strip_parentheticals { cfg.strip_parentheticals  = true; }
        if self.no_tense             { cfg.classify_tense        = false; }

        Ok(cfg)
    }
}

/// All arguments for the `highlight` command
#[derive(Args, Debug)]
pub struct HighlightArgs {
    #[command(flatten)]
    pub input: InputArgs,

    #[command(flatten)]
    pub model: ModelArgs,

    /// Print the highlights as a JSON array
    #[arg(long)]
    pub json: bool,
}

/// All arguments for the `tag` command
#[derive(Args, Debug)]
pub struct TagArgs {
    #[command(flatten)]
    pub input: InputArgs,

    #[command(flatten)]
    pub model: ModelArgs,

    /// Output format: csv or json
    #[arg(long, default_value_t = ReportFormat::Csv)]
    pub format: ReportFormat,

    /// Write the table here instead of stdout
    #[arg(long, short)]
    pub output: Option<PathBuf>,
}

/// All arguments for the `models` command
#[derive(Args, Debug)]
pub struct ModelsArgs {
    /// Directory with trained tagger artifacts
    #[arg(long, default_value = "models/tagger")]
    pub tagger_dir: PathBuf,
}
