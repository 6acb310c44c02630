// ============================================================
// Layer 2 — ExtractUseCase
// ============================================================
// Orchestrates highlight extraction for one document:
//
//   Step 1: Segment text into sentences   (Layer 4 - data)
//   Step 2: Group sentences into chunks   (Layer 4 - data)
//   Step 3: Tag every chunk               (Layer 5 - ml)
//   Step 4: Aggregate into one table      (Layer 2)
//   Step 5: Select highlights             (Layer 2)
//
// The use case is built once at startup (model, labels and word
// vectors loaded a single time) and then only read: every request
// goes through &self.
//
// Reference: Rust Book §13 (Iterators and Closures)

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use burn::prelude::Backend;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::application::aggregator::ScoreAggregator;
use crate::application::selector::{HighlightSelector, SelectionPolicy};
use crate::data::chunker::{BatchChunker, DEFAULT_CHUNK_SIZE};
use crate::data::segmenter::SentenceSegmenter;
use crate::data::tense::TenseClassifier;
use crate::domain::error::HighlightError;
use crate::domain::record::{HighlightSet, TaggedRecord};
use crate::domain::variant::ModelVariant;
use crate::infra::artifacts::ArtifactStore;
use crate::infra::embeddings::EmbeddingTable;
use crate::infra::tokenizer_store::TokenizerStore;
use crate::ml::tagger::{DiscourseTagger, DEFAULT_BATCH_SIZE};
use crate::ml::InferBackend;

/// Parenthetical groups such as " (Smith et al., 2019)".
const PARENTHETICAL: &str = r" \([^)]*\)";

// ─── Extraction Configuration ────────────────────────────────────────────────
// Loaded from JSON; any field left out keeps its default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractConfig {
    /// Directory holding the trained tagger artifacts
    pub tagger_dir:           PathBuf,
    /// Word vector text file
    pub embeddings:           PathBuf,
    /// Optional HuggingFace tokenizer.json
    pub tokenizer:            Option<PathBuf>,
    pub variant:              ModelVariant,
    pub chunk_size:           usize,
    pub max_chunks:           Option<usize>,
    /// Chunks per forward pass
    pub batch_size:           usize,
    pub lowercase:            bool,
    /// Parse every sentence for the tense of its root verb
    pub classify_tense:       bool,
    pub strip_parentheticals: bool,
    pub selection:            SelectionPolicy,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            tagger_dir:           PathBuf::from("models/tagger"),
            embeddings:           PathBuf::from("models/embeddings.txt"),
            tokenizer:            None,
            variant:              ModelVariant::default(),
            chunk_size:           DEFAULT_CHUNK_SIZE,
            max_chunks:           None,
            batch_size:           DEFAULT_BATCH_SIZE,
            lowercase:            true,
            classify_tense:       true,
            strip_parentheticals: false,
            selection:            SelectionPolicy::default(),
        }
    }
}

impl ExtractConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let json = fs::read_to_string(path)
            .with_context(|| format!("Cannot read config from '{}'", path.display()))?;
        serde_json::from_str(&json)
            .with_context(|| format!("Invalid config in '{}'", path.display()))
    }
}

// ─── ExtractUseCase ──────────────────────────────────────────────────────────
pub struct ExtractUseCase<B: Backend> {
    segmenter:  SentenceSegmenter,
    chunker:    BatchChunker,
    tagger:     DiscourseTagger<B>,
    aggregator: ScoreAggregator,
    selector:   HighlightSelector,
    strip:      Option<Regex>,
}

impl ExtractUseCase<InferBackend> {
    /// Load every artifact named by `config`. A missing tagger fails
    /// before any file is read.
    pub fn new(config: &ExtractConfig) -> Result<Self> {
        let store = ArtifactStore::new(&config.tagger_dir);
        store.ensure_available(config.variant)?;

        let embeddings = EmbeddingTable::load(&config.embeddings)?;
        let tokenizer  = TokenizerStore::load_optional(config.tokenizer.as_deref())?;
        let device     = <InferBackend as Backend>::Device::default();

        let tagger = DiscourseTagger::from_store(
            &store,
            config.variant,
            Arc::new(embeddings),
            tokenizer,
            config.lowercase,
            device,
        )?;
        Self::from_parts(tagger, config)
    }
}

impl<B: Backend> ExtractUseCase<B> {
    pub fn from_parts(tagger: DiscourseTagger<B>, config: &ExtractConfig) -> Result<Self> {
        if config.chunk_size == 0 {
            bail!("chunk_size must be greater than zero");
        }
        if config.chunk_size > tagger.max_seq_len() {
            tracing::warn!(
                "chunk_size {} exceeds the tagger's max_seq_len {}; leading sentences of full chunks will be labelled none",
                config.chunk_size,
                tagger.max_seq_len()
            );
        }
        let aggregator = if config.classify_tense {
            ScoreAggregator::new(TenseClassifier::new())
        } else {
            ScoreAggregator::without_tense()
        };
        let strip = if config.strip_parentheticals {
            Some(Regex::new(PARENTHETICAL)?)
        } else {
            None
        };

        Ok(Self {
            segmenter:  SentenceSegmenter::new(),
            chunker:    BatchChunker::new(config.chunk_size).with_max_chunks(config.max_chunks),
            tagger:     tagger.with_batch_size(config.batch_size),
            aggregator,
            selector:   HighlightSelector::new(config.selection.clone()),
            strip,
        })
    }

    pub fn tagger(&self) -> &DiscourseTagger<B> {
        &self.tagger
    }

    /// Segment, chunk, tag and aggregate. Fails with
    /// HighlightError::EmptyInput when the text has no sentences.
    pub fn tag_document(&self, text: &str) -> Result<Vec<TaggedRecord>> {
        let sentences = self.segmenter.segment(text);
        if sentences.is_empty() {
            return Err(HighlightError::EmptyInput.into());
        }

        let chunks = self.chunker.chunk(&sentences);
        tracing::info!("Tagging {} sentences in {} chunks", sentences.len(), chunks.len());

        let predictions = self.tagger.predict_batch(&chunks)?;
        Ok(self.aggregator.aggregate(chunks.iter().zip(predictions.iter()))?)
    }

    /// Highlight sentences of `text`, lowest probability first.
    /// Text without sentences yields an empty set.
    pub fn highlights(&self, text: &str) -> Result<HighlightSet> {
        let records = match self.tag_document(text) {
            Ok(records) => records,
            Err(e) if matches!(e.downcast_ref::<HighlightError>(), Some(HighlightError::EmptyInput)) => {
                tracing::info!("No sentences in input; no highlights available");
                return Ok(HighlightSet::default());
            }
            Err(e) => return Err(e),
        };

        let set = self.selector.select(&records);
        Ok(match &self.strip {
            Some(re) => set.map_sentences(|s| re.replace_all(s, "").into_owned()),
            None     => set,
        })
    }
}
