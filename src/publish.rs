//! Creates the monthly playlists on the user's account.

use crate::{
    catalog::{self, Catalog},
    listing::MonthKey,
    tracks::Buckets,
};

/// Things that can go wrong while publishing.
///
/// Only [`Error::User`] stops publishing outright, the rest
/// are collected into the [`Report`] as publishing carries on.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("couldn't get the current user: {0}")]
    User(#[source] catalog::Error),

    #[error("couldn't create playlist {name:?}: {source}")]
    Create {
        name: String,
        source: catalog::Error,
    },

    #[error("couldn't add track {track} to {name:?}: {source}")]
    Add {
        name: String,
        track: String,
        source: catalog::Error,
    },
}

/// A playlist which was created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaylistResult {
    /// The month it covers.
    pub month: MonthKey,

    /// The catalog's ID for it.
    pub id: String,

    /// How many tracks were actually added.
    pub tracks: usize,
}

/// The outcome of publishing every month.
#[derive(Debug, Default)]
pub struct Report {
    /// Every playlist that got created, even partially filled ones.
    pub playlists: Vec<PlaylistResult>,

    /// Everything that failed along the way.
    pub failures: Vec<Error>,
}

impl Report {
    /// Whether everything went through without a single failure.
    pub fn ok(&self) -> bool {
        self.failures.is_empty()
    }
}

/// The name of a month's playlist, like `The Independent March.2024`.
pub fn name(venue: &str, month: MonthKey) -> String {
    format!("{venue} {month}")
}

/// Creates one public playlist per month, adding it's tracks in order.
pub async fn publish<C: Catalog>(
    catalog: &C,
    buckets: Buckets,
    venue: &str,
) -> Result<Report, Error> {
    let user = catalog.current_user().await.map_err(Error::User)?;
    let mut report = Report::default();

    for (month, tracks) in buckets {
        let name = name(venue, month);
        let playlist = match catalog.create_playlist(&user.id, &name, true).await {
            Ok(x) => x,
            Err(source) => {
                let error = Error::Create { name, source };
                tracing::warn!("{error}");
                report.failures.push(error);
                continue;
            }
        };

        let mut added = 0;
        for track in tracks {
            match catalog.add_track(&user.id, &playlist.id, &track.id).await {
                Ok(()) => added += 1,
                Err(source) => {
                    let error = Error::Add {
                        name: name.clone(),
                        track: track.id,
                        source,
                    };
                    tracing::warn!("{error}");
                    report.failures.push(error);
                }
            }
        }

        tracing::info!("created {name:?} with {added} tracks");
        report.playlists.push(PlaylistResult {
            month,
            id: playlist.id,
            tracks: added,
        });
    }

    Ok(report)
}
