// ============================================================
// Layer 4 — Sentence Segmenter
// ============================================================
// Turns raw pasted text into an ordered list of Sentences.
//
//   raw text ──Preprocessor──▶ one normalised line
//            ──SentenceBoundaryDetector──▶ sentence strings
//            ──numbering──▶ Vec<Sentence>
//
// The default detector follows Unicode sentence boundaries
// (UAX #29) and then re-joins pieces that were split right after
// an abbreviation. "Fig.", "Eq." and "vs." never close a sentence
// and always re-join. "etc.", "et al." and single initials often
// do, so they only re-join when a lower-case word or a number
// follows.

use unicode_segmentation::UnicodeSegmentation;

use crate::data::preprocessor::Preprocessor;
use crate::domain::sentence::Sentence;
use crate::domain::traits::SentenceBoundaryDetector;

/// Lower-cased abbreviations that never end a sentence in a paper.
const NON_TERMINAL: &[&str] = &[
    "approx.", "ca.", "cf.", "dr.", "e.g.", "eq.", "eqs.", "esp.", "fig.", "figs.",
    "i.e.", "mr.", "mrs.", "ms.", "p.", "pp.", "prof.", "ref.", "refs.", "resp.",
    "sec.", "sect.", "tab.", "vol.", "vs.", "viz.",
];

/// Lower-cased abbreviations that may also close a sentence
/// ("... RNNs, etc." or "Smith et al.").
const MAYBE_TERMINAL: &[&str] = &[
    "al.", "et.", "etc.", "inc.", "jr.", "ltd.", "no.", "nos.", "st.",
];

// ─── UnicodeSentenceDetector ──────────────────────────────────────────────────
#[derive(Debug, Clone, Default)]
pub struct UnicodeSentenceDetector;

impl UnicodeSentenceDetector {
    pub fn new() -> Self {
        Self
    }

    /// True when the break between `prev` and `next` was made inside
    /// a sentence and the two pieces belong together.
    fn continues(prev: &str, next: &str) -> bool {
        let last = match prev.split_whitespace().next_back() {
            Some(w) => w.trim_start_matches(|c: char| !c.is_alphanumeric()).to_ascii_lowercase(),
            None    => return false,
        };
        if NON_TERMINAL.contains(&last.as_str()) {
            return true;
        }

        // Single initials such as "A." end a sentence as often as a name.
        let bytes   = last.as_bytes();
        let initial = bytes.len() == 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b'.';
        if !(initial || MAYBE_TERMINAL.contains(&last.as_str())) {
            return false;
        }

        // Only a lower-case word or a number carries the sentence on.
        next.trim_start_matches(['(', '[', '"', '\''])
            .chars()
            .next()
            .is_some_and(|c| c.is_lowercase() || c.is_ascii_digit())
    }
}

impl SentenceBoundaryDetector for UnicodeSentenceDetector {
    fn sentences(&self, text: &str) -> Vec<String> {
        let mut out: Vec<String> = Vec::new();
        for piece in text.split_sentence_bounds() {
            let piece = piece.trim();
            if piece.is_empty() {
                continue;
            }
            match out.last_mut() {
                Some(prev) if Self::continues(prev, piece) => {
                    prev.push(' ');
                    prev.push_str(piece);
                }
                _ => out.push(piece.to_string()),
            }
        }
        out
    }
}

// ─── SentenceSegmenter ────────────────────────────────────────────────────────
pub struct SentenceSegmenter {
    preprocessor: Preprocessor,
    detector:     Box<dyn SentenceBoundaryDetector + Send + Sync>,
}

impl SentenceSegmenter {
    /// Segmenter backed by the Unicode detector.
    pub fn new() -> Self {
        Self::with_detector(UnicodeSentenceDetector::new())
    }

    pub fn with_detector(detector: impl SentenceBoundaryDetector + Send + Sync + 'static) -> Self {
        Self {
            preprocessor: Preprocessor::new(),
            detector:     Box::new(detector),
        }
    }

    /// Split text into numbered sentences. Empty or whitespace-only
    /// input yields an empty Vec.
    pub fn segment(&self, text: &str) -> Vec<Sentence> {
        let clean = self.preprocessor.clean(text);
        if clean.is_empty() {
            return Vec::new();
        }
        self.detector
            .sentences(&clean)
            .into_iter()
            .filter(|s| !s.trim().is_empty())
            .enumerate()
            .map(|(i, s)| Sentence::new(s, i))
            .collect()
    }
}

impl Default for SentenceSegmenter {
    fn default() -> Self {
        Self::new()
    }
}
