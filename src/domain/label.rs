// ============================================================
// Layer 3 — Discourse Labels
// ============================================================
// The tagger predicts BIO-prefixed labels ("B_method",
// "I_method", "none", ...). Highlight selection only cares about
// the base discourse role, so predictions are collapsed to one
// DiscourseLabel per sentence.
//
// LabelIndex is the trained mapping between label names and the
// integer ids of the network's output layer. Ids must be dense:
// 0..n with no gaps, because id i is output column i.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::domain::error::HighlightError;

/// Name of the fallback label used for padding and dropped sentences.
pub const NONE_LABEL: &str = "none";

/// The role a sentence plays in scientific argumentation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum DiscourseLabel {
    None,
    Goal,
    Fact,
    Background,
    Hypothesis,
    Problem,
    Method,
    Result,
    Implication,
    /// A label the model was trained with that has no dedicated variant
    Other(String),
}

impl DiscourseLabel {
    pub fn as_str(&self) -> &str {
        match self {
            DiscourseLabel::None        => NONE_LABEL,
            DiscourseLabel::Goal        => "goal",
            DiscourseLabel::Fact        => "fact",
            DiscourseLabel::Background  => "background",
            DiscourseLabel::Hypothesis  => "hypothesis",
            DiscourseLabel::Problem     => "problem",
            DiscourseLabel::Method      => "method",
            DiscourseLabel::Result      => "result",
            DiscourseLabel::Implication => "implication",
            DiscourseLabel::Other(s)    => s.as_str(),
        }
    }

    /// Collapse a BIO-tagged label to its base discourse role.
    ///
    /// "B_result", "I_result", "B-result" and "result" all map to
    /// `Result`; the Begin/Inside distinction is discarded.
    pub fn from_bio(label: &str) -> Self {
        let base = ["B_", "I_", "B-", "I-"]
            .iter()
            .find_map(|p| label.strip_prefix(p))
            .unwrap_or(label);
        Self::from_base(base)
    }

    fn from_base(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" | "o" | ""  => DiscourseLabel::None,
            "goal"             => DiscourseLabel::Goal,
            "fact"             => DiscourseLabel::Fact,
            "background"       => DiscourseLabel::Background,
            "hypothesis"       => DiscourseLabel::Hypothesis,
            "problem"          => DiscourseLabel::Problem,
            "method"           => DiscourseLabel::Method,
            "result"           => DiscourseLabel::Result,
            "implication"      => DiscourseLabel::Implication,
            _                  => DiscourseLabel::Other(s.trim().to_string()),
        }
    }
}

impl FromStr for DiscourseLabel {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from_bio(s))
    }
}

impl fmt::Display for DiscourseLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<String> for DiscourseLabel {
    fn from(s: String) -> Self {
        DiscourseLabel::from_bio(&s)
    }
}

impl From<DiscourseLabel> for String {
    fn from(label: DiscourseLabel) -> Self {
        label.as_str().to_string()
    }
}

// ─── LabelIndex ───────────────────────────────────────────────────────────────
/// Bidirectional mapping label name ↔ output column id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelIndex {
    names: Vec<String>,
}

impl LabelIndex {
    /// Build from a name → id map, as stored next to a trained model.
    pub fn from_map(map: HashMap<String, usize>) -> Result<Self, HighlightError> {
        if map.is_empty() {
            return Err(HighlightError::InvalidLabelIndex("label index is empty".into()));
        }
        let mut names = vec![None; map.len()];
        for (name, id) in map {
            let slot = names.get_mut(id).ok_or_else(|| {
                HighlightError::InvalidLabelIndex(format!(
                    "label '{name}' has id {id}, but ids must be dense from 0"
                ))
            })?;
            if let Some(existing) = slot.replace(name.clone()) {
                return Err(HighlightError::InvalidLabelIndex(format!(
                    "labels '{existing}' and '{name}' share id {id}"
                )));
            }
        }
        // Dense ids over a map of size n always fill every slot.
        Ok(Self::from_names(names.into_iter().flatten()))
    }

    /// Build from names listed in id order.
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self { names: names.into_iter().map(Into::into).collect() }
    }

    pub fn to_map(&self) -> BTreeMap<String, usize> {
        self.names.iter().cloned().enumerate().map(|(i, n)| (n, i)).collect()
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn name(&self, id: usize) -> Option<&str> {
        self.names.get(id).map(String::as_str)
    }

    /// Map a predicted id to its collapsed discourse label.
    /// Ids outside the index fall back to `None`.
    pub fn discourse_label(&self, id: usize) -> DiscourseLabel {
        self.name(id).map(DiscourseLabel::from_bio).unwrap_or(DiscourseLabel::None)
    }
}
