//! Groups artists by the month they play in.

use std::collections::{btree_map, BTreeMap};

use crate::listing::{MonthKey, ShowEntry};

/// Unique artist names per month, for months with enough artists.
///
/// Names within a month are kept in the order they were first seen,
/// and months iterate chronologically.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Months {
    /// The artists of each month.
    inner: BTreeMap<MonthKey, Vec<String>>,
}

impl Months {
    /// Buckets `entries` by month, deduplicating names, and then drops
    /// every month that has less than `min_artists` unique artists.
    ///
    /// Headliners and supporting acts count equally.
    pub fn aggregate(entries: impl IntoIterator<Item = ShowEntry>, min_artists: usize) -> Self {
        let mut inner: BTreeMap<MonthKey, Vec<String>> = BTreeMap::new();

        for entry in entries {
            let artists = inner.entry(entry.month).or_default();
            if !artists.contains(&entry.artist) {
                artists.push(entry.artist);
            }
        }

        inner.retain(|month, artists| {
            let keep = artists.len() >= min_artists;
            if !keep {
                tracing::info!(
                    "dropping {month}, only {} of {min_artists} artists",
                    artists.len()
                );
            }

            keep
        });

        Self { inner }
    }

    /// The artists playing in `month`, if it qualified.
    pub fn get(&self, month: &MonthKey) -> Option<&[String]> {
        self.inner.get(month).map(Vec::as_slice)
    }

    /// Iterates over each month and it's artists.
    pub fn iter(&self) -> impl Iterator<Item = (&MonthKey, &[String])> {
        self.inner.iter().map(|(k, v)| (k, v.as_slice()))
    }

    /// The amount of months which qualified.
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Whether no month qualified.
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

impl IntoIterator for Months {
    type Item = (MonthKey, Vec<String>);
    type IntoIter = btree_map::IntoIter<MonthKey, Vec<String>>;

    fn into_iter(self) -> Self::IntoIter {
        self.inner.into_iter()
    }
}
