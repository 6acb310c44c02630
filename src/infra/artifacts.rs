// ============================================================
// Layer 6 — Artifact Store
// ============================================================
// Saves and restores trained taggers, one set of files per
// ModelVariant, using Burn's CompactRecorder for the weights.
//
// Files per variant (stem = ModelVariant::artifact_stem):
//   <stem>_config.json        TaggerConfig, needed to rebuild the
//                             network before weights can load
//   <stem>_weights.mpk        all learned parameters
//   <stem>_label_ind.json     {"label name": id, ...}
//
// Example:
//   models/tagger/
//     model_att=False_cont=LSTM_clause_lstm=False_bi=True_crf=False_config.json
//     model_att=False_cont=LSTM_clause_lstm=False_bi=True_crf=False_weights.mpk
//     model_att=False_cont=LSTM_clause_lstm=False_bi=True_crf=False_label_ind.json
//
// A missing file for the requested variant is a startup failure
// (HighlightError::ModelArtifactMissing), checked before any
// weights are read.

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use burn::{
    prelude::*,
    record::{CompactRecorder, Recorder},
};

use crate::domain::error::HighlightError;
use crate::domain::label::LabelIndex;
use crate::domain::variant::ModelVariant;
use crate::ml::model::{DiscourseTaggerModel, TaggerConfig};

const CONFIG_SUFFIX:  &str = "_config.json";
const WEIGHTS_SUFFIX: &str = "_weights";
const LABELS_SUFFIX:  &str = "_label_ind.json";

/// Extension CompactRecorder appends to the weights path.
const WEIGHTS_EXT: &str = "mpk";

/// Paths of one variant's artifacts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPaths {
    pub config:  PathBuf,
    /// Without extension; the recorder adds it
    pub weights: PathBuf,
    pub labels:  PathBuf,
}

impl ArtifactPaths {
    pub fn weights_file(&self) -> PathBuf {
        self.weights.with_extension(WEIGHTS_EXT)
    }
}

/// Everything needed to build a DiscourseTagger.
pub struct LoadedTagger<B: Backend> {
    pub config: TaggerConfig,
    pub model:  DiscourseTaggerModel<B>,
    pub labels: LabelIndex,
}

pub struct ArtifactStore {
    dir: PathBuf,
}

impl ArtifactStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn paths(&self, variant: ModelVariant) -> ArtifactPaths {
        let stem = variant.artifact_stem();
        ArtifactPaths {
            config:  self.dir.join(format!("{stem}{CONFIG_SUFFIX}")),
            weights: self.dir.join(format!("{stem}{WEIGHTS_SUFFIX}")),
            labels:  self.dir.join(format!("{stem}{LABELS_SUFFIX}")),
        }
    }

    /// Fail fast when any artifact of `variant` is missing.
    pub fn ensure_available(&self, variant: ModelVariant) -> Result<ArtifactPaths, HighlightError> {
        let paths = self.paths(variant);
        for path in [paths.config.clone(), paths.weights_file(), paths.labels.clone()] {
            if !path.is_file() {
                return Err(HighlightError::ModelArtifactMissing {
                    key: variant.artifact_stem(),
                    path,
                });
            }
        }
        Ok(paths)
    }

    /// Variants with a topology file in the directory, sorted by key.
    pub fn available_variants(&self) -> Result<Vec<ModelVariant>> {
        let entries = fs::read_dir(&self.dir)
            .with_context(|| format!("Cannot list tagger directory '{}'", self.dir.display()))?;

        let mut variants = Vec::new();
        for entry in entries {
            let name = entry?.file_name();
            let Some(stem) = name.to_str().and_then(|n| n.strip_suffix(CONFIG_SUFFIX)) else {
                continue;
            };
            match ModelVariant::from_stem(stem) {
                Ok(v)  => variants.push(v),
                Err(e) => tracing::debug!("Ignoring '{}': {}", stem, e),
            }
        }
        variants.sort_by_key(ModelVariant::artifact_stem);
        Ok(variants)
    }

    pub fn load_config(&self, variant: ModelVariant) -> Result<TaggerConfig> {
        let path = self.paths(variant).config;
        let json = fs::read_to_string(&path)
            .with_context(|| format!("Cannot read tagger topology from '{}'", path.display()))?;
        let config: TaggerConfig = serde_json::from_str(&json)
            .with_context(|| format!("Invalid tagger topology in '{}'", path.display()))?;

        if config.variant != variant {
            tracing::warn!(
                "Topology in '{}' was saved for {}, loading it as {}",
                path.display(),
                config.variant,
                variant
            );
        }
        Ok(config)
    }

    /// Read the label index. Ids may be stored as numbers or as
    /// numeric strings.
    pub fn load_label_index(&self, variant: ModelVariant) -> Result<LabelIndex> {
        let path = self.paths(variant).labels;
        let json = fs::read_to_string(&path)
            .with_context(|| format!("Cannot read label index from '{}'", path.display()))?;
        let raw: HashMap<String, serde_json::Value> = serde_json::from_str(&json)
            .with_context(|| format!("Invalid label index in '{}'", path.display()))?;

        let mut map = HashMap::with_capacity(raw.len());
        for (name, value) in raw {
            let id = match &value {
                serde_json::Value::Number(n) => n.as_u64().map(|v| v as usize),
                serde_json::Value::String(s) => s.trim().parse::<usize>().ok(),
                _                            => None,
            }
            .ok_or_else(|| HighlightError::InvalidLabelIndex(format!("label '{name}' has id {value}")))?;
            map.insert(name, id);
        }
        Ok(LabelIndex::from_map(map)?)
    }

    pub fn load_model<B: Backend>(
        &self,
        variant: ModelVariant,
        config:  &TaggerConfig,
        device:  &B::Device,
    ) -> Result<DiscourseTaggerModel<B>> {
        let path   = self.paths(variant).weights;
        let model  = config.init::<B>(device);
        let record = CompactRecorder::new()
            .load(path.clone(), device)
            .with_context(|| format!("Cannot load tagger weights '{}'", path.display()))?;
        Ok(model.load_record(record))
    }

    /// Check, then load topology, labels and weights of `variant`.
    pub fn load<B: Backend>(&self, variant: ModelVariant, device: &B::Device) -> Result<LoadedTagger<B>> {
        let paths  = self.ensure_available(variant)?;
        let config = self.load_config(variant)?;
        let labels = self.load_label_index(variant)?;
        let model  = self.load_model::<B>(variant, &config, device)?;
        tracing::info!(
            "Loaded tagger '{}' ({} labels) from '{}'",
            variant.artifact_stem(),
            labels.len(),
            paths.weights_file().display()
        );
        Ok(LoadedTagger { config, model, labels })
    }

    /// Write all three artifacts of `variant`.
    #[allow(dead_code)] // export side; the CLI only reads
    pub fn save<B: Backend>(
        &self,
        variant: ModelVariant,
        config:  &TaggerConfig,
        model:   &DiscourseTaggerModel<B>,
        labels:  &LabelIndex,
    ) -> Result<ArtifactPaths> {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("Cannot create tagger directory '{}'", self.dir.display()))?;
        let paths = self.paths(variant);

        fs::write(&paths.config, serde_json::to_string_pretty(config)?)
            .with_context(|| format!("Cannot write topology to '{}'", paths.config.display()))?;

        CompactRecorder::new()
            .record(model.clone().into_record(), paths.weights.clone())
            .with_context(|| format!("Failed to save weights to '{}'", paths.weights.display()))?;

        fs::write(&paths.labels, serde_json::to_string_pretty(&labels.to_map())?)
            .with_context(|| format!("Cannot write label index to '{}'", paths.labels.display()))?;

        tracing::debug!("Saved tagger '{}'", variant.artifact_stem());
        Ok(paths)
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::batcher::ChunkBatcher;
    use crate::data::encoder::EncodedChunk;
    use burn::backend::NdArray;

    type TestBackend = NdArray;

    fn tiny(variant: ModelVariant) -> TaggerConfig {
        TaggerConfig::new(2, 3, 4, variant)
            .with_word_proj_dim(4)
            .with_lstm_dim(3)
    }

    fn labels() -> LabelIndex {
        LabelIndex::from_names(["none", "B_method", "B_result"])
    }

    #[test]
    fn test_paths_use_variant_stem() {
        let store = ArtifactStore::new("models");
        let paths = store.paths(ModelVariant::default());
        assert_eq!(
            paths.config,
            PathBuf::from("models/model_att=False_cont=LSTM_clause_lstm=False_bi=True_crf=False_config.json")
        );
        assert!(paths.weights_file().to_string_lossy().ends_with("_weights.mpk"));
    }

    #[test]
    fn test_missing_variant_names_key_and_path() {
        let dir   = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path());
        let crf   = ModelVariant { crf: true, ..ModelVariant::default() };
        match store.ensure_available(crf) {
            Err(HighlightError::ModelArtifactMissing { key, path }) => {
                assert_eq!(key, crf.artifact_stem());
                assert!(path.to_string_lossy().ends_with("_config.json"));
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_save_then_load_gives_same_outputs() {
        let dir     = tempfile::tempdir().unwrap();
        let store   = ArtifactStore::new(dir.path().join("tagger"));
        let device  = Default::default();
        let variant = ModelVariant { crf: true, ..ModelVariant::default() };
        let cfg     = tiny(variant);
        let model   = cfg.init::<TestBackend>(&device);

        store.save(variant, &cfg, &model, &labels()).unwrap();
        store.ensure_available(variant).unwrap();

        let loaded = store.load::<TestBackend>(variant, &device).unwrap();
        assert_eq!(loaded.labels, labels());
        assert_eq!(loaded.config.variant, variant);

        let chunk = EncodedChunk {
            sentence_count:    4,
            kept:              4,
            max_seq_len:       4,
            max_clause_len:    None,
            rep_dim:           2,
            features:          vec![0.3, -0.2, 0.1, 0.9, -0.5, 0.4, 0.2, 0.2],
            word_weights:      Vec::new(),
            word_penalty:      Vec::new(),
            vocabulary_misses: 0,
        };
        let batcher = ChunkBatcher::<TestBackend>::new(device);
        let a = model.forward(batcher.batch(std::slice::from_ref(&chunk)).unwrap()).into_data().to_vec::<f32>().unwrap();
        let b = loaded.model.forward(batcher.batch(&[chunk]).unwrap()).into_data().to_vec::<f32>().unwrap();
        for (x, y) in a.iter().zip(&b) {
            assert!((x - y).abs() < 1e-3);
        }
    }

    #[test]
    fn test_saved_weights_file_is_the_one_checked() {
        let dir     = tempfile::tempdir().unwrap();
        let store   = ArtifactStore::new(dir.path());
        let device  = Default::default();
        let variant = ModelVariant::default();
        let cfg     = tiny(variant);

        let paths = store.save(variant, &cfg, &cfg.init::<TestBackend>(&device), &labels()).unwrap();
        assert!(paths.weights_file().is_file());

        let mut written: Vec<String> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        written.sort();
        let stem = variant.artifact_stem();
        assert_eq!(
            written,
            vec![
                format!("{stem}_config.json"),
                format!("{stem}_label_ind.json"),
                format!("{stem}_weights.mpk"),
            ]
        );
        assert_eq!(store.ensure_available(variant).unwrap(), paths);
    }

    #[test]
    fn test_label_index_accepts_string_ids() {
        let dir   = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path());
        let v     = ModelVariant::default();
        fs::write(store.paths(v).labels, r#"{"none": "0", "B_method": 1}"#).unwrap();

        let index = store.load_label_index(v).unwrap();
        assert_eq!(index.name(0), Some("none"));
        assert_eq!(index.to_map()["B_method"], 1);
    }

    #[test]
    fn test_label_index_rejects_gaps() {
        let dir   = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path());
        let v     = ModelVariant::default();
        fs::write(store.paths(v).labels, r#"{"none": 0, "B_method": 5}"#).unwrap();
        assert!(store.load_label_index(v).is_err());
    }

    #[test]
    fn test_available_variants_lists_saved_models() {
        let dir    = tempfile::tempdir().unwrap();
        let store  = ArtifactStore::new(dir.path());
        let device = Default::default();

        let plain = ModelVariant::default();
        let crf   = ModelVariant { crf: true, ..ModelVariant::default() };
        for v in [crf, plain] {
            let cfg = tiny(v);
            store.save(v, &cfg, &cfg.init::<TestBackend>(&device), &labels()).unwrap();
        }
        fs::write(dir.path().join("notes_config.json"), "{}").unwrap();

        let found = store.available_variants().unwrap();
        assert_eq!(found.len(), 2);
        assert!(found.contains(&plain) && found.contains(&crf));
    }
}
