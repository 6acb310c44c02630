// ============================================================
// Layer 5 — Label Decoders
// ============================================================
// Turns the tagger's per-position scores into one label id per
// sentence plus a confidence for that label.
//
//   ArgmaxDecoder  scores are softmax probabilities; each position
//                  independently takes its most likely label and
//                  the confidence is that probability.
//
//   CrfDecoder     scores are emissions; Viterbi finds the single
//                  best label path under the learned transitions,
//                  and the confidence is the forward-backward
//                  marginal of the chosen label at that position.
//
// Both work on the true positions only: the caller slices away
// the left padding before decoding, so a CRF path never starts
// inside the padding.

use anyhow::{anyhow, Result};
use burn::prelude::*;

use crate::ml::crf::CrfLayer;

// ─── ScoreMatrix ──────────────────────────────────────────────────────────────
/// Row-major [positions, labels] scores for one sequence.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreMatrix {
    rows:   usize,
    cols:   usize,
    values: Vec<f32>,
}

impl ScoreMatrix {
    /// # Panics
    /// Panics if `values.len() != rows * cols`.
    pub fn new(rows: usize, cols: usize, values: Vec<f32>) -> Self {
        assert_eq!(values.len(), rows * cols, "score matrix size does not match its shape");
        Self { rows, cols, values }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn row(&self, i: usize) -> &[f32] {
        &self.values[i * self.cols..(i + 1) * self.cols]
    }
}

/// Best label id and its confidence, per position.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DecodedPath {
    pub label_ids:   Vec<usize>,
    pub confidences: Vec<f32>,
}

/// Decoding strategy, chosen once from the loaded topology.
pub trait LabelDecoder {
    fn decode(&self, scores: &ScoreMatrix) -> DecodedPath;
}

// ─── ArgmaxDecoder ────────────────────────────────────────────────────────────
#[derive(Debug, Clone, Copy, Default)]
pub struct ArgmaxDecoder;

impl LabelDecoder for ArgmaxDecoder {
    fn decode(&self, scores: &ScoreMatrix) -> DecodedPath {
        let mut path = DecodedPath::default();
        for i in 0..scores.rows() {
            let (id, p) = argmax(scores.row(i));
            path.label_ids.push(id);
            path.confidences.push(p.clamp(0.0, 1.0));
        }
        path
    }
}

// ─── CrfDecoder ───────────────────────────────────────────────────────────────
/// Host copy of a CRF layer's parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct CrfDecoder {
    num_labels:  usize,
    /// [from * num_labels + to]
    transitions: Vec<f32>,
    start:       Vec<f32>,
    end:         Vec<f32>,
}

impl CrfDecoder {
    pub fn new(num_labels: usize, transitions: Vec<f32>, start: Vec<f32>, end: Vec<f32>) -> Result<Self> {
        if transitions.len() != num_labels * num_labels || start.len() != num_labels || end.len() != num_labels {
            return Err(anyhow!(
                "CRF parameters do not match {num_labels} labels (transitions={}, start={}, end={})",
                transitions.len(),
                start.len(),
                end.len()
            ));
        }
        Ok(Self { num_labels, transitions, start, end })
    }

    /// Copy the learned parameters off the device.
    pub fn from_layer<B: Backend>(layer: &CrfLayer<B>) -> Result<Self> {
        let host = |t: Tensor<B, 1>| {
            t.into_data()
                .to_vec::<f32>()
                .map_err(|e| anyhow!("cannot read CRF parameters: {e:?}"))
        };
        let num_labels  = layer.num_labels();
        let transitions = host(layer.transitions.val().reshape([num_labels * num_labels]))?;
        let start       = host(layer.start.val())?;
        let end         = host(layer.end.val())?;
        Self::new(num_labels, transitions, start, end)
    }

    fn transition(&self, from: usize, to: usize) -> f32 {
        self.transitions[from * self.num_labels + to]
    }

    /// Highest-scoring label path.
    pub fn viterbi(&self, emissions: &ScoreMatrix) -> Vec<usize> {
        let n = emissions.rows();
        let l = self.num_labels;
        if n == 0 {
            return Vec::new();
        }

        let mut score: Vec<f32>          = (0..l).map(|j| self.start[j] + emissions.row(0)[j]).collect();
        let mut back:  Vec<Vec<usize>>   = Vec::with_capacity(n);

        for t in 1..n {
            let row      = emissions.row(t);
            let mut next = vec![f32::NEG_INFINITY; l];
            let mut ptr  = vec![0usize; l];
            for j in 0..l {
                for i in 0..l {
                    let s = score[i] + self.transition(i, j);
                    if s > next[j] {
                        next[j] = s;
                        ptr[j]  = i;
                    }
                }
                next[j] += row[j];
            }
            back.push(ptr);
            score = next;
        }

        let final_scores: Vec<f32> = (0..l).map(|j| score[j] + self.end[j]).collect();
        let (mut best, _)          = argmax(&final_scores);

        let mut path = vec![best; n];
        for t in (1..n).rev() {
            best        = back[t - 1][best];
            path[t - 1] = best;
        }
        path
    }

    /// Per-position label marginals, row-major [positions, labels].
    pub fn marginals(&self, emissions: &ScoreMatrix) -> ScoreMatrix {
        let n = emissions.rows();
        let l = self.num_labels;
        if n == 0 {
            return ScoreMatrix::new(0, l, Vec::new());
        }

        // ── Forward ───────────────────────────────────────────────────────────
        let mut alpha = vec![vec![0.0f32; l]; n];
        for j in 0..l {
            alpha[0][j] = self.start[j] + emissions.row(0)[j];
        }
        for t in 1..n {
            for j in 0..l {
                let terms: Vec<f32> = (0..l).map(|i| alpha[t - 1][i] + self.transition(i, j)).collect();
                alpha[t][j] = log_sum_exp(&terms) + emissions.row(t)[j];
            }
        }

        // ── Backward ──────────────────────────────────────────────────────────
        let mut beta = vec![vec![0.0f32; l]; n];
        beta[n - 1].copy_from_slice(&self.end);
        for t in (0..n - 1).rev() {
            for i in 0..l {
                let terms: Vec<f32> = (0..l)
                    .map(|j| self.transition(i, j) + emissions.row(t + 1)[j] + beta[t + 1][j])
                    .collect();
                beta[t][i] = log_sum_exp(&terms);
            }
        }

        let last: Vec<f32> = (0..l).map(|j| alpha[n - 1][j] + self.end[j]).collect();
        let log_z          = log_sum_exp(&last);

        let values = (0..n)
            .flat_map(|t| {
                let (a, b) = (&alpha[t], &beta[t]);
                (0..l).map(move |j| (a[j] + b[j] - log_z).exp())
            })
            .collect();
        ScoreMatrix::new(n, l, values)
    }
}

impl LabelDecoder for CrfDecoder {
    fn decode(&self, scores: &ScoreMatrix) -> DecodedPath {
        let label_ids   = self.viterbi(scores);
        let marginals   = self.marginals(scores);
        let confidences = label_ids
            .iter()
            .enumerate()
            .map(|(t, &id)| marginals.row(t)[id].clamp(0.0, 1.0))
            .collect();
        DecodedPath { label_ids, confidences }
    }
}

/// Index and value of the largest element; the first wins on ties.
fn argmax(values: &[f32]) -> (usize, f32) {
    values
        .iter()
        .copied()
        .enumerate()
        .fold((0, f32::NEG_INFINITY), |best, (i, v)| if v > best.1 { (i, v) } else { best })
}

fn log_sum_exp(values: &[f32]) -> f32 {
    let max = values.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    if max == f32::NEG_INFINITY {
        return max;
    }
    max + values.iter().map(|v| (v - max).exp()).sum::<f32>().ln()
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    /// Two labels; moving from label 0 to label 1 is heavily penalised.
    fn sticky_crf() -> CrfDecoder {
        CrfDecoder::new(2, vec![0.0, -10.0, 0.0, 0.0], vec![0.0, 0.0], vec![0.0, 0.0]).unwrap()
    }

    #[test]
    fn test_argmax_picks_highest_probability() {
        let scores = ScoreMatrix::new(2, 3, vec![0.1, 0.7, 0.2, 0.5, 0.2, 0.3]);
        let path   = ArgmaxDecoder.decode(&scores);
        assert_eq!(path.label_ids, vec![1, 0]);
        assert_eq!(path.confidences, vec![0.7, 0.5]);
    }

    #[test]
    fn test_argmax_empty_matrix() {
        let path = ArgmaxDecoder.decode(&ScoreMatrix::new(0, 3, Vec::new()));
        assert!(path.label_ids.is_empty());
    }

    #[test]
    fn test_viterbi_respects_transitions() {
        // Position-wise argmax would be [0, 1], which the CRF forbids.
        let emissions = ScoreMatrix::new(2, 2, vec![2.0, 0.0, 0.0, 1.0]);
        assert_eq!(sticky_crf().viterbi(&emissions), vec![0, 0]);
        assert_eq!(ArgmaxDecoder.decode(&emissions).label_ids, vec![0, 1]);
    }

    #[test]
    fn test_viterbi_single_position_uses_start_and_end() {
        let crf       = CrfDecoder::new(2, vec![0.0; 4], vec![0.0, 3.0], vec![0.0, 0.0]).unwrap();
        let emissions = ScoreMatrix::new(1, 2, vec![1.0, 0.0]);
        assert_eq!(crf.viterbi(&emissions), vec![1]);
    }

    #[test]
    fn test_marginals_are_distributions() {
        let emissions = ScoreMatrix::new(3, 2, vec![2.0, 0.0, 0.0, 1.0, 0.5, 0.5]);
        let marginals = sticky_crf().marginals(&emissions);
        for t in 0..3 {
            let sum: f32 = marginals.row(t).iter().sum();
            assert!((sum - 1.0).abs() < 1e-4, "row {t} sums to {sum}");
            assert!(marginals.row(t).iter().all(|p| (0.0..=1.0).contains(p)));
        }
    }

    #[test]
    fn test_uniform_crf_marginals_match_softmax() {
        // With no transition preferences the CRF factorises per position.
        let crf       = CrfDecoder::new(2, vec![0.0; 4], vec![0.0; 2], vec![0.0; 2]).unwrap();
        let emissions = ScoreMatrix::new(1, 2, vec![0.0, (3.0f32).ln()]);
        let path      = crf.decode(&emissions);
        assert_eq!(path.label_ids, vec![1]);
        assert!((path.confidences[0] - 0.75).abs() < 1e-5);
    }

    #[test]
    fn test_crf_parameter_shapes_are_checked() {
        assert!(CrfDecoder::new(2, vec![0.0; 3], vec![0.0; 2], vec![0.0; 2]).is_err());
    }
}
