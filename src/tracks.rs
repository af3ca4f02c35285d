//! Picks the tracks which represent each artist, and collects them per month.

use std::collections::{btree_map, BTreeMap};

use crate::{
    catalog::{Catalog, Track},
    listing::MonthKey,
    resolver::ResolvedArtist,
};

/// A track chosen for a playlist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selected {
    /// The catalog ID.
    pub id: String,

    /// Popularity, from 0 to 100.
    pub popularity: u32,
}

/// Sorts `tracks` by descending popularity and keeps the first `n`.
///
/// The sort is stable, so equally popular tracks keep the catalog's order.
/// If there are less than `n` tracks, all of them are kept.
pub fn select(mut tracks: Vec<Track>, n: usize) -> Vec<Selected> {
    tracks.sort_by(|a, b| b.popularity.cmp(&a.popularity));
    tracks.truncate(n);

    tracks
        .into_iter()
        .map(|x| Selected {
            id: x.id,
            popularity: x.popularity,
        })
        .collect()
}

/// Fetches an artist's top tracks in `market` and selects up to `n`.
///
/// Returns [`None`] if the catalog couldn't be asked, which
/// just means the artist won't contribute anything.
pub async fn top<C: Catalog>(
    catalog: &C,
    artist: &ResolvedArtist,
    market: &str,
    n: usize,
) -> Option<Vec<Selected>> {
    match catalog.top_tracks(&artist.id, market).await {
        Ok(tracks) => Some(select(tracks, n)),
        Err(error) => {
            tracing::warn!("couldn't get top tracks for {:?}: {error}", artist.name);
            None
        }
    }
}

/// The tracks of each month, in the order they were added.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Buckets {
    /// The tracks of each month.
    inner: BTreeMap<MonthKey, Vec<Selected>>,
}

impl Buckets {
    /// Appends tracks to a month, creating it if needed.
    ///
    /// Nothing happens when `tracks` is empty, so
    /// months never exist without any tracks.
    pub fn extend(&mut self, month: MonthKey, tracks: Vec<Selected>) {
        if tracks.is_empty() {
            return;
        }

        self.inner.entry(month).or_default().extend(tracks);
    }

    /// The tracks of `month`, if it has any.
    pub fn get(&self, month: &MonthKey) -> Option<&[Selected]> {
        self.inner.get(month).map(Vec::as_slice)
    }

    /// Iterates over each month and it's tracks.
    pub fn iter(&self) -> impl Iterator<Item = (&MonthKey, &[Selected])> {
        self.inner.iter().map(|(k, v)| (k, v.as_slice()))
    }

    /// The amount of months with tracks.
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Whether there aren't any tracks at all.
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

impl IntoIterator for Buckets {
    type Item = (MonthKey, Vec<Selected>);
    type IntoIter = btree_map::IntoIter<MonthKey, Vec<Selected>>;

    fn into_iter(self) -> Self::IntoIter {
        self.inner.into_iter()
    }
}
