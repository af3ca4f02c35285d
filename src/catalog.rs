//! The streaming service's catalog, as far as playlist building needs it.
//!
//! Everything downstream talks to a [`Catalog`], so the resolver, selector
//! and publisher never know which service (or fake) is on the other end.

use std::future::Future;

use serde::Deserialize;

pub mod spotify;

/// Result alias for catalog operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that might occur while talking to the catalog.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("unable to reach catalog: {0}")]
    Request(#[from] reqwest::Error),

    #[error("rate limit reached: {0}")]
    RateLimited(String),

    #[error("non success code {status} from {endpoint}: {message}")]
    Status {
        status: u16,
        endpoint: String,
        message: String,
    },

    #[error("token request rejected: {0}")]
    Token(String),
}

/// An artist search match.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Artist {
    /// The catalog ID.
    pub id: String,

    /// The catalog's spelling of the name.
    pub name: String,

    /// Popularity, from 0 to 100.
    pub popularity: u32,
}

/// A track, as returned from an artist's top tracks.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Track {
    pub id: String,

    #[serde(default)]
    pub name: String,

    pub popularity: u32,
}

/// The authenticated user.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct User {
    pub id: String,
}

/// A freshly created playlist.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Playlist {
    pub id: String,
    pub name: String,
}

/// Operations the pipeline needs from the catalog.
pub trait Catalog: Sync {
    /// Searches for artists matching `name`, in the catalog's own order.
    fn search_artists(&self, name: &str) -> impl Future<Output = Result<Vec<Artist>>> + Send;

    /// Gets an artist's top tracks in `market`.
    fn top_tracks(
        &self,
        artist: &str,
        market: &str,
    ) -> impl Future<Output = Result<Vec<Track>>> + Send;

    /// Gets the user the client is authenticated as.
    fn current_user(&self) -> impl Future<Output = Result<User>> + Send;

    /// Creates a playlist owned by `user`.
    fn create_playlist(
        &self,
        user: &str,
        name: &str,
        public: bool,
    ) -> impl Future<Output = Result<Playlist>> + Send;

    /// Appends a single track to the end of a playlist.
    fn add_track(
        &self,
        user: &str,
        playlist: &str,
        track: &str,
    ) -> impl Future<Output = Result<()>> + Send;
}
