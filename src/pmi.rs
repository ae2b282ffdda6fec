//! Pointwise mutual information over pair and unigram tables.
//!
//! `pmi(a, b) = log2(P(a,b) / (P(a) * P(b)))` with `P(a,b) = count / total_pairs` and
//! `P(x) = unigram(x) / total_unigrams`. Scoring only runs on fully merged tables: the
//! probabilities need global totals.

use log::warn;
use serde::Serialize;

use crate::cooccurrence::{CooccurrenceCounts, FrequencyTable, PairKey};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PmiRecord {
    pub pair: PairKey,
    pub score: f64,
    pub count: u64,
}

/// PMI for one pair, or `None` when a count or total is zero.
///
/// With every input at least 1 the ratio is strictly positive, so `log2` is always finite.
/// A zero marginal means the tables are inconsistent; such a pair gets no score at all.
pub fn pmi_value(
    pair_count: u64,
    first_count: u64,
    second_count: u64,
    total_pairs: u64,
    total_unigrams: u64,
) -> Option<f64> {
    if pair_count == 0
        || first_count == 0
        || second_count == 0
        || total_pairs == 0
        || total_unigrams == 0
    {
        return None;
    }
    let p_pair = pair_count as f64 / total_pairs as f64;
    let p_first = first_count as f64 / total_unigrams as f64;
    let p_second = second_count as f64 / total_unigrams as f64;
    Some((p_pair / (p_first * p_second)).log2())
}

/// Score every pair with `count >= min_occurrence`, ranked by PMI descending.
/// Equal scores are ordered by pair key so output is reproducible.
pub fn score(
    pairs: &FrequencyTable<PairKey>,
    unigrams: &FrequencyTable<String>,
    total_pairs: u64,
    total_unigrams: u64,
    min_occurrence: u64,
) -> Vec<PmiRecord> {
    if total_pairs == 0 || total_unigrams == 0 {
        warn!("No pairs or unigrams counted, PMI table is empty");
        return Vec::new();
    }
    let threshold = min_occurrence.max(1);

    let mut records: Vec<PmiRecord> = pairs
        .iter()
        .filter(|(_, count)| **count >= threshold)
        .filter_map(|(pair, &count)| {
            let c1 = unigrams.get(pair.first());
            let c2 = unigrams.get(pair.second());
            match pmi_value(count, c1, c2, total_pairs, total_unigrams) {
                Some(score) => Some(PmiRecord {
                    pair: pair.clone(),
                    score,
                    count,
                }),
                None => {
                    warn!("Skipping {pair}: missing unigram count ({c1}, {c2})");
                    None
                }
            }
        })
        .collect();

    records.sort_by(|a, b| {
        b.score
            .total_cmp(&a.score)
            .then_with(|| a.pair.cmp(&b.pair))
    });
    records
}

/// [`score`] with the totals taken from the counts themselves.
pub fn score_counts(counts: &CooccurrenceCounts, min_occurrence: u64) -> Vec<PmiRecord> {
    score(
        &counts.pairs,
        &counts.unigrams,
        counts.total_pairs(),
        counts.total_unigrams(),
        min_occurrence,
    )
}
