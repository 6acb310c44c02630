// ============================================================
// Layer 2 — Highlight Selector
// ============================================================
// Picks the paper's highlight sentences from the tagged table.
//
// Stages (thresholds live in SelectionPolicy):
//
//   1. implications  tag=implication, p > 0.50
//                    top 2 by p, then reordered ascending
//   2. results       tag=result, 0.50 < p < 0.95, top 1
//   3. methods-high  tag=method, p > 0.50, top 1
//   4. methods-low   tag=method, 0.40 < p < 0.46,
//                    100 ≤ chars ≤ 150, top 1
//   5. methods       high ++ low, reordered ascending
//   6. combined      methods ++ results ++ implications
//   7. if combined has at least 5 rows: the 5 highest of them
//      otherwise: backfill from the whole table, highest first
//   8. output        ascending by p, sentences only
//
// Every sort is stable, so equal probabilities keep the order in
// which the rows entered that sort. The returned list is
// lowest-probability first.
//
// Backfill skips rows already selected unless
// `deduplicate_backfill` is off, in which case it takes the plain
// tail of the table and the same sentence can appear twice.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::domain::label::DiscourseLabel;
use crate::domain::record::{HighlightSet, TaggedRecord};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectionPolicy {
    pub highlight_count:        usize,

    pub implication_min:        f32,
    pub implication_count:      usize,

    pub result_min:             f32,
    pub result_max:             f32,
    pub result_count:           usize,

    pub method_high_min:        f32,
    pub method_high_count:      usize,

    pub method_low_min:         f32,
    pub method_low_max:         f32,
    /// Inclusive character bounds for methods-low sentences
    pub method_low_min_chars:   usize,
    pub method_low_max_chars:   usize,
    pub method_low_count:       usize,

    pub deduplicate_backfill:   bool,
}

impl Default for SelectionPolicy {
    fn default() -> Self {
        Self {
            highlight_count:      5,
            implication_min:      0.50,
            implication_count:    2,
            result_min:           0.50,
            result_max:           0.95,
            result_count:         1,
            method_high_min:      0.50,
            method_high_count:    1,
            method_low_min:       0.40,
            method_low_max:       0.46,
            method_low_min_chars: 100,
            method_low_max_chars: 150,
            method_low_count:     1,
            deduplicate_backfill: true,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct HighlightSelector {
    policy: SelectionPolicy,
}

impl HighlightSelector {
    pub fn new(policy: SelectionPolicy) -> Self {
        Self { policy }
    }

    pub fn select(&self, records: &[TaggedRecord]) -> HighlightSet {
        let chosen = self.select_records(records);
        HighlightSet::new(chosen.into_iter().map(|r| r.sentence.clone()).collect())
    }

    /// The selected rows, ascending by probability.
    pub fn select_records<'a>(&self, records: &'a [TaggedRecord]) -> Vec<&'a TaggedRecord> {
        let p = &self.policy;

        // ── Stages 1–4: per-role candidates ───────────────────────────────────
        let mut implications = top(
            records.iter().filter(|r| r.tag == DiscourseLabel::Implication && r.probability > p.implication_min),
            p.implication_count,
        );
        sort_ascending(&mut implications);

        let results = top(
            records.iter().filter(|r| {
                r.tag == DiscourseLabel::Result && r.probability > p.result_min && r.probability < p.result_max
            }),
            p.result_count,
        );

        let methods_high = top(
            records.iter().filter(|r| r.tag == DiscourseLabel::Method && r.probability > p.method_high_min),
            p.method_high_count,
        );

        let methods_low = top(
            records.iter().filter(|r| {
                let len = r.char_len();
                r.tag == DiscourseLabel::Method
                    && r.probability > p.method_low_min
                    && r.probability < p.method_low_max
                    && (p.method_low_min_chars..=p.method_low_max_chars).contains(&len)
            }),
            p.method_low_count,
        );

        // ── Stages 5–6: combine ───────────────────────────────────────────────
        let mut methods: Vec<&TaggedRecord> = methods_high.into_iter().chain(methods_low).collect();
        sort_ascending(&mut methods);

        let mut selected: Vec<&TaggedRecord> = methods
            .into_iter()
            .chain(results)
            .chain(implications)
            .collect();

        tracing::debug!("{} role-based highlight candidates", selected.len());

        // ── Stage 7: trim or backfill ─────────────────────────────────────────
        let wanted = p.highlight_count;
        if selected.len() >= wanted {
            sort_ascending(&mut selected);
            return selected.split_off(selected.len() - wanted);
        }

        let mut table: Vec<&TaggedRecord> = records.iter().collect();
        sort_ascending(&mut table);

        let needed = wanted - selected.len();
        let backfill: Vec<&TaggedRecord> = if p.deduplicate_backfill {
            let mut picked: Vec<&TaggedRecord> = table
                .iter()
                .rev()
                .filter(|r| !selected.iter().any(|s| std::ptr::eq(*s, **r)))
                .take(needed)
                .copied()
                .collect();
            picked.reverse();
            picked
        } else {
            let start = table.len().saturating_sub(needed);
            table[start..].to_vec()
        };
        selected.extend(backfill);

        // ── Stage 8: final order ──────────────────────────────────────────────
        sort_ascending(&mut selected);
        selected
    }
}

fn by_probability(a: &&TaggedRecord, b: &&TaggedRecord) -> Ordering {
    a.probability.total_cmp(&b.probability)
}

/// Stable ascending sort by probability.
fn sort_ascending(rows: &mut [&TaggedRecord]) {
    rows.sort_by(by_probability);
}

/// The `k` most probable rows, most probable first; ties keep table order.
fn top<'a>(rows: impl Iterator<Item = &'a TaggedRecord>, k: usize) -> Vec<&'a TaggedRecord> {
    let mut rows: Vec<&TaggedRecord> = rows.collect();
    rows.sort_by(|a, b| by_probability(b, a));
    rows.truncate(k);
    rows
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::record::Tense;

    fn rec(i: usize, tag: DiscourseLabel, p: f32) -> TaggedRecord {
        TaggedRecord::new(format!("s{i}"), i, tag, p, Tense::Unknown)
    }

    fn long_rec(i: usize, tag: DiscourseLabel, p: f32, chars: usize) -> TaggedRecord {
        TaggedRecord::new("x".repeat(chars), i, tag, p, Tense::Unknown)
    }

    fn select(records: &[TaggedRecord]) -> Vec<String> {
        HighlightSelector::default().select(records).into_sentences()
    }

    fn scenario() -> Vec<TaggedRecord> {
        use DiscourseLabel::*;
        vec![
            rec(1, Method, 0.6),
            rec(2, Result, 0.7),
            rec(3, Implication, 0.8),
            rec(4, Implication, 0.6),
            rec(5, Result, 0.4),
        ]
    }

    #[test]
    fn test_paper_scenario() {
        assert_eq!(select(&scenario()), vec!["s5", "s1", "s4", "s2", "s3"]);
    }

    #[test]
    fn test_selection_is_idempotent() {
        let table = scenario();
        assert_eq!(select(&table), select(&table));
    }

    #[test]
    fn test_exactly_five_when_table_is_large() {
        use DiscourseLabel::*;
        let tags  = [None, Method, Result, Implication, Background];
        let table: Vec<TaggedRecord> = (0..23)
            .map(|i| rec(i, tags[i % tags.len()].clone(), (i as f32 * 0.37) % 1.0))
            .collect();
        for n in 5..table.len() {
            let out = select(&table[..n]);
            assert_eq!(out.len(), 5, "table of {n}");
        }
        for n in 0..5 {
            assert_eq!(select(&table[..n]).len(), n);
        }
    }

    #[test]
    fn test_single_sentence_document() {
        let table = vec![rec(0, DiscourseLabel::None, 0.3)];
        assert_eq!(select(&table), vec!["s0"]);
    }

    #[test]
    fn test_empty_document() {
        assert!(select(&[]).is_empty());
    }

    #[test]
    fn test_no_role_candidates_gives_top_five() {
        let table: Vec<TaggedRecord> = (0..8).map(|i| rec(i, DiscourseLabel::Background, i as f32 / 10.0)).collect();
        assert_eq!(select(&table), vec!["s3", "s4", "s5", "s6", "s7"]);
    }

    #[test]
    fn test_result_upper_bound_is_exclusive() {
        use DiscourseLabel::*;
        let table = vec![rec(0, Result, 0.95), rec(1, Result, 0.9)];
        let chosen = HighlightSelector::default();
        let rows   = chosen.select_records(&table);
        // Both appear (the first through backfill), the role stage picked only s1.
        assert_eq!(rows.len(), 2);
        let policy = SelectionPolicy { highlight_count: 1, ..SelectionPolicy::default() };
        assert_eq!(HighlightSelector::new(policy).select(&table).into_sentences(), vec!["s1"]);
    }

    #[test]
    fn test_methods_low_length_bounds() {
        use DiscourseLabel::*;
        let policy = SelectionPolicy { highlight_count: 1, ..SelectionPolicy::default() };
        let sel    = HighlightSelector::new(policy);

        for (chars, expected) in [(99, false), (100, true), (150, true), (151, false)] {
            // A higher-probability filler would win the backfill if methods-low skipped the row.
            let table = vec![long_rec(0, Method, 0.43, chars), rec(1, None, 0.9)];
            let out   = sel.select_records(&table);
            assert_eq!(out[0].position == 0, expected, "{chars} chars");
        }
    }

    #[test]
    fn test_methods_low_probability_window() {
        use DiscourseLabel::*;
        let policy = SelectionPolicy { highlight_count: 1, ..SelectionPolicy::default() };
        let sel    = HighlightSelector::new(policy);
        for (p, expected) in [(0.40, false), (0.41, true), (0.46, false)] {
            let table = vec![long_rec(0, Method, p, 120), rec(1, None, 0.9)];
            assert_eq!(sel.select_records(&table)[0].position == 0, expected, "p={p}");
        }
    }

    #[test]
    fn test_combined_over_five_keeps_highest() {
        use DiscourseLabel::*;
        let table = vec![
            rec(0, Implication, 0.91),
            rec(1, Implication, 0.92),
            rec(2, Implication, 0.55),
            rec(3, Result, 0.9),
            rec(4, Method, 0.99),
            long_rec(5, Method, 0.45, 120),
            rec(6, None, 0.999),
        ];
        let out: Vec<usize> = HighlightSelector::default()
            .select_records(&table)
            .iter()
            .map(|r| r.position)
            .collect();
        // s2 loses the implication stage; s6 has no role and is never needed.
        assert_eq!(out, vec![5, 3, 0, 1, 4]);
    }

    #[test]
    fn test_backfill_without_dedupe_can_repeat() {
        let policy = SelectionPolicy { deduplicate_backfill: false, ..SelectionPolicy::default() };
        let out    = HighlightSelector::new(policy).select(&scenario()).into_sentences();
        assert_eq!(out, vec!["s1", "s4", "s2", "s3", "s3"]);
    }

    #[test]
    fn test_policy_from_partial_json() {
        let policy: SelectionPolicy = serde_json::from_str(r#"{"highlight_count": 3}"#).unwrap();
        assert_eq!(policy.highlight_count, 3);
        assert!(policy.deduplicate_backfill);
        assert_eq!(policy.result_max, 0.95);
    }
}
