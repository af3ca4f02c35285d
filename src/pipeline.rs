//! Turns qualifying months of artists into months of tracks.

use crate::{
    catalog::Catalog,
    months::Months,
    resolver::Resolver,
    tracks::{self, Buckets},
};

/// Settings that shape the playlists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// The minimum amount of unique artists a month needs to get a playlist.
    pub min_artists: usize,

    /// The maximum amount of tracks taken from each artist.
    pub n_tracks: usize,

    /// The market region top tracks are taken from.
    pub market: String,
}

/// Resolves every artist of every month, and gathers their top tracks.
///
/// This runs sequentially, so the tracks of a month are in the same order
/// as it's artists. Artists that can't be resolved, or whose tracks can't
/// be fetched, are skipped.
pub async fn gather<C: Catalog>(catalog: &C, months: Months, settings: &Settings) -> Buckets {
    let mut resolver = Resolver::new(catalog);
    let mut buckets = Buckets::default();

    for (month, artists) in months {
        tracing::info!("resolving {} artists for {month}", artists.len());

        for name in artists {
            let Some(artist) = resolver.resolve(&name).await else {
                continue;
            };

            let Some(selected) =
                tracks::top(catalog, &artist, &settings.market, settings.n_tracks).await
            else {
                continue;
            };

            tracing::debug!("{} tracks from {name:?}", selected.len());
            buckets.extend(month, selected);
        }
    }

    tracing::info!(
        "resolved {} of {} artists",
        resolver.found(),
        resolver.seen()
    );

    buckets
}
