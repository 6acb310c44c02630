// ============================================================
// Layer 2 — Score Aggregator
// ============================================================
// Merges per-chunk predictions into one document table.
//
// Chunks are visited in order and, inside each chunk, sentences in
// order, so the table follows document order. A skipped (empty)
// chunk has an empty prediction and simply adds no rows.
//
// Every prediction must carry exactly one label per sentence of its
// chunk; anything else is a ShapeMismatch and no table is built.
//
// Each row also gets the tense of its sentence when a
// TenseClassifier is attached.

use crate::data::tense::TenseClassifier;
use crate::domain::error::HighlightError;
use crate::domain::record::{TaggedRecord, Tense};
use crate::domain::sentence::Chunk;
use crate::ml::tagger::Prediction;

pub struct ScoreAggregator {
    tenses: Option<TenseClassifier>,
}

impl ScoreAggregator {
    pub fn new(tenses: TenseClassifier) -> Self {
        Self { tenses: Some(tenses) }
    }

    /// Aggregator that leaves every tense as UNK
    pub fn without_tense() -> Self {
        Self { tenses: None }
    }

    pub fn aggregate<'a, I>(&self, results: I) -> Result<Vec<TaggedRecord>, HighlightError>
    where
        I: IntoIterator<Item = (&'a Chunk, &'a Prediction)>,
    {
        let mut table = Vec::new();
        for (chunk, prediction) in results {
            if prediction.labels.len() != chunk.len() || prediction.probabilities.len() != chunk.len() {
                return Err(HighlightError::ShapeMismatch {
                    expected: format!("{} labels and probabilities", chunk.len()),
                    actual:   format!(
                        "{} labels and {} probabilities",
                        prediction.labels.len(),
                        prediction.probabilities.len()
                    ),
                });
            }

            let rows = chunk
                .sentences()
                .iter()
                .zip(&prediction.labels)
                .zip(&prediction.probabilities)
                .map(|((sentence, label), &p)| {
                    let tense = match &self.tenses {
                        Some(c) => c.tense(&sentence.text),
                        None    => Tense::Unknown,
                    };
                    TaggedRecord::new(sentence.text.clone(), sentence.index, label.clone(), p, tense)
                });
            table.extend(rows);
        }
        Ok(table)
    }
}
