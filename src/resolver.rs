//! Maps listed artist names onto catalog artists.

use std::collections::HashMap;

use crate::catalog::{Artist, Catalog};

/// An artist name which was found in the catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedArtist {
    /// The name as it was listed by the venue.
    pub name: String,

    /// The catalog ID of the best match.
    pub id: String,

    /// Popularity of the best match, from 0 to 100.
    pub popularity: u32,
}

/// Picks the most popular match, preferring the earlier one on ties.
pub fn best(matches: Vec<Artist>) -> Option<Artist> {
    matches
        .into_iter()
        .reduce(|best, x| if x.popularity > best.popularity { x } else { best })
}

/// Resolves artist names, remembering every answer for the rest of the run.
///
/// Lookups that fail, or find nothing, resolve to [`None`] and are
/// remembered as well, so a name is only ever searched once.
pub struct Resolver<'a, C> {
    /// The catalog to search.
    catalog: &'a C,

    /// Previous answers, by listed name.
    cache: HashMap<String, Option<ResolvedArtist>>,
}

impl<'a, C: Catalog> Resolver<'a, C> {
    /// Creates a resolver with an empty cache.
    pub fn new(catalog: &'a C) -> Self {
        Self {
            catalog,
            cache: HashMap::new(),
        }
    }

    /// Searches the catalog for `name`.
    async fn lookup(&self, name: &str) -> Option<ResolvedArtist> {
        let matches = match self.catalog.search_artists(name).await {
            Ok(x) => x,
            Err(error) => {
                tracing::warn!("couldn't search for {name:?}: {error}");
                return None;
            }
        };

        let Some(artist) = best(matches) else {
            tracing::warn!("artist not found: {name:?}");
            return None;
        };

        tracing::debug!(
            "resolved {name:?} to {:?} ({}, popularity {})",
            artist.name,
            artist.id,
            artist.popularity
        );

        Some(ResolvedArtist {
            name: name.to_owned(),
            id: artist.id,
            popularity: artist.popularity,
        })
    }

    /// Resolves `name`, only asking the catalog if it hasn't been seen before.
    pub async fn resolve(&mut self, name: &str) -> Option<ResolvedArtist> {
        if let Some(cached) = self.cache.get(name) {
            return cached.clone();
        }

        let resolved = self.lookup(name).await;
        self.cache.insert(name.to_owned(), resolved.clone());

        resolved
    }

    /// How many names resolved to an artist.
    pub fn found(&self) -> usize {
        self.cache.values().filter(|x| x.is_some()).count()
    }

    /// How many distinct names have been looked up.
    pub fn seen(&self) -> usize {
        self.cache.len()
    }
}
