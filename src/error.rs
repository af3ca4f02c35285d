use crate::{auth, catalog, listing, publish};

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("unable to load the venue listing: {0}")]
    Listing(#[from] listing::Error),

    #[error("catalog failure: {0}")]
    Catalog(#[from] catalog::Error),

    #[error("authorization failed: {0}")]
    Auth(#[from] auth::Error),

    #[error("publishing failed: {0}")]
    Publish(#[from] publish::Error),

    #[error("missing client credentials, set SPOTIFY_CLIENT_ID and SPOTIFY_CLIENT_SECRET")]
    Credentials,

    #[error("invalid url: {0}")]
    Url(#[from] url::ParseError),

    #[error("unable to build web client: {0}")]
    Client(#[from] reqwest::Error),
}
