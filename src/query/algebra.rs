//! Relational building blocks
//!
//! Stateless combinators the query engine composes over a snapshot:
//! - `semi_join` / `anti_join`: rows with (or without) a matching row elsewhere
//! - `divide`: rows related to *every* row of a divisor set
//! - `group_by`, `count_per_key`, `sum`, `mean`: grouped aggregation
//! - `driver_score`: composite metric over two aggregates
//!
//! Empty inputs have explicit results per aggregate: counts and sums are 0,
//! a mean is `None`. Nothing here turns missing data into a default value.

use std::collections::{BTreeMap, HashSet};
use std::hash::Hash;

/// Rows of `left` whose key matches at least one row of `right`.
///
/// Preserves the order of `left` and never duplicates a row.
pub fn semi_join<'a, L, R, K>(
    left: &'a [L],
    right: &[R],
    left_key: impl Fn(&L) -> K,
    right_key: impl Fn(&R) -> K,
) -> Vec<&'a L>
where
    K: Eq + Hash,
{
    let present: HashSet<K> = right.iter().map(right_key).collect();
    left.iter().filter(|row| present.contains(&left_key(*row))).collect()
}

/// Rows of `left` whose key matches no row of `right`.
///
/// Preserves the order of `left`.
pub fn anti_join<'a, L, R, K>(
    left: &'a [L],
    right: &[R],
    left_key: impl Fn(&L) -> K,
    right_key: impl Fn(&R) -> K,
) -> Vec<&'a L>
where
    K: Eq + Hash,
{
    let present: HashSet<K> = right.iter().map(right_key).collect();
    left.iter().filter(|row| !present.contains(&left_key(*row))).collect()
}

/// Relational division: candidates related to every member of `divisor`.
///
/// Evaluated as "no divisor member exists that the candidate is unrelated
/// to". When the divisor is empty that condition holds vacuously for every
/// candidate, so an empty divisor yields an empty result instead.
pub fn divide<'a, C, D>(
    candidates: &'a [C],
    divisor: &[D],
    related: impl Fn(&C, &D) -> bool,
) -> Vec<&'a C> {
    if divisor.is_empty() {
        return Vec::new();
    }

    candidates
        .iter()
        .filter(|candidate| !divisor.iter().any(|member| !related(*candidate, member)))
        .collect()
}

/// Group values by key, keys in ascending order.
pub fn group_by<T, K, V>(
    rows: impl IntoIterator<Item = T>,
    mut key_value: impl FnMut(T) -> (K, V),
) -> BTreeMap<K, Vec<V>>
where
    K: Ord,
{
    let mut groups: BTreeMap<K, Vec<V>> = BTreeMap::new();
    for row in rows {
        let (key, value) = key_value(row);
        groups.entry(key).or_default().push(value);
    }
    groups
}

/// Count occurrences per key over a fixed domain.
///
/// Every domain key is reported, with 0 when it never occurs. Occurrences
/// outside the domain are ignored.
pub fn count_per_key<K>(
    domain: impl IntoIterator<Item = K>,
    occurrences: impl IntoIterator<Item = K>,
) -> BTreeMap<K, usize>
where
    K: Ord,
{
    let mut counts: BTreeMap<K, usize> = domain.into_iter().map(|key| (key, 0)).collect();
    for key in occurrences {
        if let Some(count) = counts.get_mut(&key) {
            *count += 1;
        }
    }
    counts
}

/// Sum of values; 0.0 for an empty input
pub fn sum(values: &[f64]) -> f64 {
    values.iter().sum()
}

/// Arithmetic mean; `None` for an empty input, never 0 or NaN
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(sum(values) / values.len() as f64)
    }
}

/// Driver score = rating x number of bookings
pub fn driver_score(rating: f64, bookings: usize) -> f64 {
    rating * bookings as f64
}
