//! The Spotify Web API implementation of [`Catalog`].
//!
//! Lookups (search & top tracks) only need an app token from the
//! client credentials flow, while publishing needs a user token,
//! which is obtained through [`crate::auth`] and [`Accounts::exchange`].

use std::sync::LazyLock;

use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::{de::DeserializeOwned, Deserialize};
use serde_json::json;
use url::Url;

use super::{Artist, Catalog, Error, Playlist, Result, Track, User};

/// Base URL of the Web API.
static API: LazyLock<Url> = LazyLock::new(|| Url::parse("https://api.spotify.com/v1").unwrap());

/// The token endpoint of the accounts service.
const TOKEN: &str = "https://accounts.spotify.com/api/token";

/// The page users authorize the app on.
static AUTHORIZE: LazyLock<Url> =
    LazyLock::new(|| Url::parse("https://accounts.spotify.com/authorize").unwrap());

/// Scopes requested from the user, enough to create public playlists.
const SCOPES: &str = "playlist-modify-public";

/// The registered OAuth client.
#[derive(Clone)]
pub struct Credentials {
    /// Client ID.
    pub id: String,

    /// Client secret.
    pub secret: String,

    /// Where the accounts service sends the user after authorizing.
    pub redirect: Url,
}

/// Builds a Web API URL out of path segments, percent-encoding each of them.
pub(crate) fn endpoint(segments: &[&str]) -> Url {
    let mut url = API.clone();

    // Only fails for URLs without a path, which the API's isn't.
    if let Ok(mut path) = url.path_segments_mut() {
        path.extend(segments);
    }

    url
}

/// Body of a token response.
#[derive(Deserialize)]
struct Token {
    /// The bearer token.
    access_token: String,
}

/// Body of a token error response.
#[derive(Deserialize)]
struct TokenError {
    /// The OAuth error code, like `invalid_grant`.
    error: String,

    /// A human readable explanation, if any.
    #[serde(default)]
    error_description: Option<String>,
}

/// Describes a failed token request from it's status and body.
pub(crate) fn token_error(status: StatusCode, body: &str) -> String {
    match serde_json::from_str::<TokenError>(body) {
        Ok(TokenError {
            error,
            error_description: Some(description),
        }) => format!("{error}: {description}"),
        Ok(TokenError { error, .. }) => error,
        Err(_) => format!("{} {body}", status.as_u16()),
    }
}

/// The accounts service, used to get tokens for [`Spotify`].
#[derive(Clone)]
pub struct Accounts {
    /// The client credentials.
    credentials: Credentials,

    /// The web client to send token requests with.
    client: Client,
}

impl Accounts {
    /// Creates a new accounts client.
    pub fn new(credentials: Credentials, client: Client) -> Self {
        Self {
            credentials,
            client,
        }
    }

    /// Builds the page the user has to visit to authorize, with `state`
    /// being echoed back in the redirect.
    pub fn authorize_url(&self, state: &str) -> Url {
        let mut url = AUTHORIZE.clone();

        url.query_pairs_mut()
            .append_pair("client_id", &self.credentials.id)
            .append_pair("response_type", "code")
            .append_pair("redirect_uri", self.credentials.redirect.as_str())
            .append_pair("scope", SCOPES)
            .append_pair("state", state);

        url
    }

    /// Requests a token, handing back a client which uses it.
    async fn token(&self, form: &[(&str, &str)]) -> Result<Spotify> {
        let response = self
            .client
            .post(TOKEN)
            .basic_auth(&self.credentials.id, Some(&self.credentials.secret))
            .form(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Token(token_error(status, &body)));
        }

        let token: Token = response.json().await?;
        Ok(Spotify::new(self.client.clone(), token.access_token))
    }

    /// Gets an app-only client, which can do lookups but not touch any user data.
    pub async fn client_credentials(&self) -> Result<Spotify> {
        self.token(&[("grant_type", "client_credentials")]).await
    }

    /// Exchanges an authorization code from the redirect for a user client.
    pub async fn exchange(&self, code: &str) -> Result<Spotify> {
        self.token(&[
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", self.credentials.redirect.as_str()),
        ])
        .await
    }
}

impl crate::auth::Exchange for Accounts {
    type Client = Spotify;

    fn authorize_url(&self, state: &str) -> Url {
        Self::authorize_url(self, state)
    }

    async fn exchange(&self, code: &str) -> Result<Spotify> {
        Self::exchange(self, code).await
    }
}

/// Body of an artist search.
#[derive(Deserialize)]
pub(crate) struct Search {
    /// The artist page of the results.
    pub(crate) artists: Page<Artist>,
}

/// A page of results.
#[derive(Deserialize)]
pub(crate) struct Page<T> {
    /// The results themselves.
    pub(crate) items: Vec<T>,
}

/// Body of an artist's top tracks.
#[derive(Deserialize)]
pub(crate) struct TopTracks {
    /// The tracks, in Spotify's order.
    pub(crate) tracks: Vec<Track>,
}

/// An authenticated Web API client.
pub struct Spotify {
    /// The web client.
    client: Client,

    /// The bearer token.
    token: String,
}

impl Spotify {
    /// Creates a client using an already obtained bearer token.
    pub fn new(client: Client, token: String) -> Self {
        Self { client, token }
    }

    /// Sends a request, turning bad status codes into errors.
    pub(crate) async fn send(&self, request: RequestBuilder, endpoint: &str) -> Result<Response> {
        let response = request.bearer_auth(&self.token).send().await?;
        let status = response.status();
        tracing::debug!(endpoint, status = status.as_u16(), "catalog request");

        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(Error::RateLimited(endpoint.to_owned()));
        }

        if !status.is_success() {
            return Err(Error::Status {
                status: status.as_u16(),
                endpoint: endpoint.to_owned(),
                message: response.text().await.unwrap_or_default(),
            });
        }

        Ok(response)
    }

    /// Sends a GET request and decodes the JSON body.
    async fn get<T: DeserializeOwned>(&self, url: Url, query: &[(&str, &str)]) -> Result<T> {
        let endpoint = url.path().to_owned();
        let request = self.client.get(url).query(query);

        Ok(self.send(request, &endpoint).await?.json().await?)
    }

    /// Sends a POST request with a JSON body.
    async fn post(&self, url: Url, body: &serde_json::Value) -> Result<Response> {
        let endpoint = url.path().to_owned();
        let request = self.client.post(url).json(body);

        self.send(request, &endpoint).await
    }
}

impl Catalog for Spotify {
    async fn search_artists(&self, name: &str) -> Result<Vec<Artist>> {
        let search: Search = self
            .get(endpoint(&["search"]), &[("q", name), ("type", "artist")])
            .await?;

        Ok(search.artists.items)
    }

    async fn top_tracks(&self, artist: &str, market: &str) -> Result<Vec<Track>> {
        let url = endpoint(&["artists", artist, "top-tracks"]);
        let top: TopTracks = self.get(url, &[("market", market)]).await?;

        Ok(top.tracks)
    }

    async fn current_user(&self) -> Result<User> {
        self.get(endpoint(&["me"]), &[]).await
    }

    async fn create_playlist(&self, user: &str, name: &str, public: bool) -> Result<Playlist> {
        let url = endpoint(&["users", user, "playlists"]);
        let body = json!({ "name": name, "public": public });

        Ok(self.post(url, &body).await?.json().await?)
    }

    async fn add_track(&self, _user: &str, playlist: &str, track: &str) -> Result<()> {
        let url = endpoint(&["playlists", playlist, "tracks"]);
        let body = json!({ "uris": [format!("spotify:track:{track}")] });

        self.post(url, &body).await?;
        Ok(())
    }
}
