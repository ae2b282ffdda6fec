//! Windowed pair counts and strictly adjacent trigram counts over a lemma stream.
//!
//! Pairs look forward only: position `i` pairs with every `j` in `i+1 .. min(i + window, len)`.
//! Under [`PairOrder::Ordered`] "A then B" and "B then A" are distinct keys; under
//! [`PairOrder::Unordered`] the two lemmas are sorted so both collapse onto one key.
//! Trigrams always use adjacent positions, whatever the pair window.

use clap::ValueEnum;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::collections::HashMap;
use std::collections::hash_map;
use std::fmt;
use std::hash::Hash;

use crate::error::{CollocationError, Result};
use crate::stream::LemmaStream;

/// Pair identity, fixed for a whole analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum, Default)]
#[serde(rename_all = "lowercase")]
pub enum PairOrder {
    /// Keep observed order.
    Ordered,
    /// Sort the two lemmas.
    #[default]
    Unordered,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct PairKey(pub String, pub String);

impl PairKey {
    /// `None` for a self-pair.
    pub fn new(first: &str, second: &str, order: PairOrder) -> Option<PairKey> {
        if first == second {
            return None;
        }
        let (a, b) = match order {
            PairOrder::Unordered if second < first => (second, first),
            _ => (first, second),
        };
        Some(PairKey(a.to_string(), b.to_string()))
    }

    pub fn first(&self) -> &str {
        &self.0
    }

    pub fn second(&self) -> &str {
        &self.1
    }
}

impl fmt::Display for PairKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.0, self.1)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct TrigramKey(pub String, pub String, pub String);

impl TrigramKey {
    /// `None` unless all three lemmas are pairwise distinct.
    pub fn new(w1: &str, w2: &str, w3: &str) -> Option<TrigramKey> {
        if w1 == w2 || w2 == w3 || w1 == w3 {
            return None;
        }
        Some(TrigramKey(w1.to_string(), w2.to_string(), w3.to_string()))
    }
}

impl fmt::Display for TrigramKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.0, self.1, self.2)
    }
}

/// Monotonic counter map. `total` is the sum of all counts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrequencyTable<K: Eq + Hash> {
    counts: HashMap<K, u64>,
    total: u64,
}

impl<K: Eq + Hash> Default for FrequencyTable<K> {
    fn default() -> Self {
        FrequencyTable {
            counts: HashMap::new(),
            total: 0,
        }
    }
}

impl<K: Eq + Hash> FrequencyTable<K> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment(&mut self, key: K) {
        self.add(key, 1);
    }

    pub fn add(&mut self, key: K, n: u64) {
        *self.counts.entry(key).or_insert(0) += n;
        self.total += n;
    }

    pub fn get<Q>(&self, key: &Q) -> u64
    where
        K: Borrow<Q>,
        Q: Eq + Hash + ?Sized,
    {
        self.counts.get(key).copied().unwrap_or(0)
    }

    /// Number of distinct keys.
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    pub fn iter(&self) -> hash_map::Iter<'_, K, u64> {
        self.counts.iter()
    }

    /// Additive merge; counts commute, so merge order does not matter.
    pub fn merge(&mut self, other: FrequencyTable<K>) {
        for (key, n) in other.counts {
            self.add(key, n);
        }
    }
}

impl<K: Eq + Hash + Ord + Clone> FrequencyTable<K> {
    /// Entries sorted by count, descending; equal counts by key, ascending.
    pub fn ranked(&self) -> Vec<(K, u64)> {
        let mut v: Vec<(K, u64)> = self.counts.iter().map(|(k, n)| (k.clone(), *n)).collect();
        v.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        v
    }
}

impl<K: Eq + Hash> FromIterator<K> for FrequencyTable<K> {
    fn from_iter<I: IntoIterator<Item = K>>(iter: I) -> Self {
        let mut table = FrequencyTable::new();
        for key in iter {
            table.increment(key);
        }
        table
    }
}

/// Everything one counting pass produces.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CooccurrenceCounts {
    pub unigrams: FrequencyTable<String>,
    pub pairs: FrequencyTable<PairKey>,
    pub trigrams: FrequencyTable<TrigramKey>,
}

impl CooccurrenceCounts {
    pub fn total_pairs(&self) -> u64 {
        self.pairs.total()
    }

    pub fn total_unigrams(&self) -> u64 {
        self.unigrams.total()
    }

    pub fn merge(&mut self, other: CooccurrenceCounts) {
        self.unigrams.merge(other.unigrams);
        self.pairs.merge(other.pairs);
        self.trigrams.merge(other.trigrams);
    }

    pub fn pair_count(&self, a: &str, b: &str, order: PairOrder) -> u64 {
        PairKey::new(a, b, order).map_or(0, |k| self.pairs.get(&k))
    }
}

/// Source positions `(i, j)` visited by the pair window over a stream of length `len`.
pub fn window_positions(len: usize, window_size: usize) -> impl Iterator<Item = (usize, usize)> {
    (0..len).flat_map(move |i| {
        let end = len.min(i + window_size);
        (i + 1..end).map(move |j| (i, j))
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CooccurrenceCounter {
    window_size: usize,
    order: PairOrder,
}

impl CooccurrenceCounter {
    pub fn new(window_size: usize, order: PairOrder) -> Result<Self> {
        if window_size < 2 {
            return Err(CollocationError::InvalidWindow(window_size));
        }
        Ok(CooccurrenceCounter { window_size, order })
    }

    pub fn window_size(&self) -> usize {
        self.window_size
    }

    pub fn order(&self) -> PairOrder {
        self.order
    }

    /// Count one stream into `counts`.
    pub fn count_into(&self, stream: &[String], counts: &mut CooccurrenceCounts) {
        for lemma in stream {
            counts.unigrams.increment(lemma.clone());
        }

        for (i, j) in window_positions(stream.len(), self.window_size) {
            if let Some(key) = PairKey::new(&stream[i], &stream[j], self.order) {
                counts.pairs.increment(key);
            }
        }

        for w in stream.windows(3) {
            if let Some(key) = TrigramKey::new(&w[0], &w[1], &w[2]) {
                counts.trigrams.increment(key);
            }
        }
    }

    pub fn count(&self, stream: &[String]) -> CooccurrenceCounts {
        let mut counts = CooccurrenceCounts::default();
        self.count_into(stream, &mut counts);
        counts
    }

    /// Count several independent streams in parallel and merge additively.
    pub fn count_streams(&self, streams: &[LemmaStream]) -> CooccurrenceCounts {
        streams
            .par_iter()
            .map(|s| self.count(&s.lemmas))
            .reduce(CooccurrenceCounts::default, |mut acc, part| {
                acc.merge(part);
                acc
            })
    }
}

/// One-shot counting of a single stream.
///
/// ```
/// use lemma_collocations::cooccurrence::{count, PairOrder};
/// let stream: Vec<String> = ["rex", "amat", "rex", "regina"]
///     .iter()
///     .map(|s| s.to_string())
///     .collect();
/// let counts = count(&stream, 3, PairOrder::Unordered).unwrap();
/// assert_eq!(counts.pair_count("amat", "rex", PairOrder::Unordered), 2);
/// assert_eq!(counts.total_pairs(), 4);
/// ```
pub fn count(
    stream: &[String],
    window_size: usize,
    order: PairOrder,
) -> Result<CooccurrenceCounts> {
    Ok(CooccurrenceCounter::new(window_size, order)?.count(stream))
}
