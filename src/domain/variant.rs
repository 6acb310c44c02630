// ============================================================
// Layer 3 — Model Variant Key
// ============================================================
// Several taggers can be trained with different architectures.
// Each one is identified by five switches, and the artifacts on
// disk are named after them:
//
//   model_att=False_cont=LSTM_clause_lstm=False_bi=True_crf=False
//
// ModelVariant renders and parses that stem so callers never
// assemble file names by hand.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// What the word-level attention looks at to score each word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AttentionContext {
    /// A single learned query vector shared by every sentence
    #[serde(rename = "word")]
    Word,
    /// A query projected from the sentence's mean word vector
    #[serde(rename = "clause")]
    Clause,
    /// A query projected from an LSTM run over the sentence's words
    #[serde(rename = "LSTM_clause")]
    LstmClause,
}

impl AttentionContext {
    pub fn as_str(&self) -> &'static str {
        match self {
            AttentionContext::Word       => "word",
            AttentionContext::Clause     => "clause",
            AttentionContext::LstmClause => "LSTM_clause",
        }
    }
}

impl FromStr for AttentionContext {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "word"        => Ok(AttentionContext::Word),
            "clause"      => Ok(AttentionContext::Clause),
            "LSTM_clause" => Ok(AttentionContext::LstmClause),
            other         => Err(format!("unknown attention context '{other}'")),
        }
    }
}

impl fmt::Display for AttentionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The architecture switches a tagger was trained with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ModelVariant {
    pub use_attention: bool,
    pub att_context:   AttentionContext,
    pub lstm:          bool,
    pub bidirectional: bool,
    pub crf:           bool,
}

impl Default for ModelVariant {
    fn default() -> Self {
        Self {
            use_attention: false,
            att_context:   AttentionContext::LstmClause,
            lstm:          false,
            bidirectional: true,
            crf:           false,
        }
    }
}

impl ModelVariant {
    /// File stem shared by all artifacts of this variant.
    pub fn artifact_stem(&self) -> String {
        format!("model_{self}")
    }

    /// Parse an artifact stem back into a variant.
    pub fn from_stem(stem: &str) -> Result<Self, String> {
        stem.strip_prefix("model_")
            .ok_or_else(|| format!("'{stem}' does not start with 'model_'"))?
            .parse()
    }
}

/// The key without the "model_" prefix, e.g.
/// `att=False_cont=LSTM_clause_lstm=False_bi=True_crf=False`.
impl fmt::Display for ModelVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "att={}_cont={}_lstm={}_bi={}_crf={}",
            py_bool(self.use_attention),
            self.att_context,
            py_bool(self.lstm),
            py_bool(self.bidirectional),
            py_bool(self.crf),
        )
    }
}

impl FromStr for ModelVariant {
    type Err = String;

    fn from_str(key: &str) -> Result<Self, Self::Err> {
        let rest = key
            .strip_prefix("att=")
            .ok_or_else(|| format!("'{key}' does not start with 'att='"))?;
        let (att, rest)  = split_field(rest, "_cont=")?;
        let (cont, rest) = split_field(rest, "_lstm=")?;
        let (lstm, rest) = split_field(rest, "_bi=")?;
        let (bi, crf)    = split_field(rest, "_crf=")?;
        Ok(Self {
            use_attention: parse_py_bool(att)?,
            att_context:   cont.parse()?,
            lstm:          parse_py_bool(lstm)?,
            bidirectional: parse_py_bool(bi)?,
            crf:           parse_py_bool(crf)?,
        })
    }
}

fn split_field<'a>(s: &'a str, sep: &str) -> Result<(&'a str, &'a str), String> {
    s.split_once(sep).ok_or_else(|| format!("missing '{sep}' in model key"))
}

fn py_bool(b: bool) -> &'static str {
    if b { "True" } else { "False" }
}

fn parse_py_bool(s: &str) -> Result<bool, String> {
    match s {
        "True"  => Ok(true),
        "False" => Ok(false),
        other   => Err(format!("expected True or False, found '{other}'")),
    }
}
