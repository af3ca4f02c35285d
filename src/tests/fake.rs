#![cfg(test)]
//! An in-memory catalog, recording every call made to it.

use std::{
    collections::{HashMap, HashSet},
    net::{Ipv4Addr, SocketAddr},
    sync::Mutex,
};

use tokio::net::TcpListener;

use crate::catalog::{self, Artist, Catalog, Playlist, Track, User};

pub fn artist(id: &str, popularity: u32) -> Artist {
    Artist {
        id: id.into(),
        name: id.into(),
        popularity,
    }
}

pub fn track(id: &str, popularity: u32) -> Track {
    Track {
        id: id.into(),
        name: id.into(),
        popularity,
    }
}

/// Serves `router` on an ephemeral local port, until the test's runtime ends.
pub async fn serve(router: axum::Router) -> SocketAddr {
    let listener = TcpListener::bind((Ipv4Addr::LOCALHOST, 0)).await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move { axum::serve(listener, router).await });

    addr
}

fn failure(endpoint: &str) -> catalog::Error {
    catalog::Error::Status {
        status: 500,
        endpoint: endpoint.into(),
        message: String::from("fake failure"),
    }
}

#[derive(Default)]
pub struct Fake {
    /// Search results, by searched name.
    pub artists: HashMap<String, Vec<Artist>>,

    /// Top tracks, by artist ID.
    pub tracks: HashMap<String, Vec<Track>>,

    /// Names, artist IDs, playlist names and track IDs whose calls fail.
    pub failing: HashSet<String>,

    /// Whether getting the current user fails.
    pub anonymous: bool,

    pub searches: Mutex<Vec<String>>,
    pub playlists: Mutex<Vec<(String, String, bool)>>,
    pub added: Mutex<Vec<(String, String)>>,
}

impl Fake {
    pub fn with_artist(mut self, name: &str, matches: Vec<Artist>) -> Self {
        self.artists.insert(name.into(), matches);
        self
    }

    pub fn with_tracks(mut self, artist: &str, tracks: Vec<Track>) -> Self {
        self.tracks.insert(artist.into(), tracks);
        self
    }

    pub fn failing(mut self, key: &str) -> Self {
        self.failing.insert(key.into());
        self
    }

    pub fn searches(&self) -> Vec<String> {
        self.searches.lock().unwrap().clone()
    }

    pub fn playlists(&self) -> Vec<(String, String, bool)> {
        self.playlists.lock().unwrap().clone()
    }

    pub fn added(&self) -> Vec<(String, String)> {
        self.added.lock().unwrap().clone()
    }
}

impl Catalog for Fake {
    async fn search_artists(&self, name: &str) -> catalog::Result<Vec<Artist>> {
        self.searches.lock().unwrap().push(name.into());
        if self.failing.contains(name) {
            return Err(failure("/search"));
        }

        Ok(self.artists.get(name).cloned().unwrap_or_default())
    }

    async fn top_tracks(&self, artist: &str, market: &str) -> catalog::Result<Vec<Track>> {
        assert_eq!(market, "US");
        if self.failing.contains(artist) {
            return Err(failure("/top-tracks"));
        }

        Ok(self.tracks.get(artist).cloned().unwrap_or_default())
    }

    async fn current_user(&self) -> catalog::Result<User> {
        if self.anonymous {
            return Err(failure("/me"));
        }

        Ok(User { id: "user".into() })
    }

    async fn create_playlist(
        &self,
        user: &str,
        name: &str,
        public: bool,
    ) -> catalog::Result<Playlist> {
        if self.failing.contains(name) {
            return Err(failure("/playlists"));
        }

        let mut playlists = self.playlists.lock().unwrap();
        playlists.push((user.into(), name.into(), public));

        Ok(Playlist {
            id: format!("playlist-{}", playlists.len()),
            name: name.into(),
        })
    }

    async fn add_track(&self, _user: &str, playlist: &str, track: &str) -> catalog::Result<()> {
        if self.failing.contains(track) {
            return Err(failure("/tracks"));
        }

        self.added
            .lock()
            .unwrap()
            .push((playlist.into(), track.into()));

        Ok(())
    }
}
