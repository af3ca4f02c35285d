//! The one-shot OAuth handshake.
//!
//! A [`Coordinator`] starts a session, which binds a tiny local server that
//! waits for the provider to redirect the user's browser back with a code.
//! The first redirect carrying the session's token gets the code exchanged
//! for a client, which is then handed to whoever is [`Pending::wait`]ing.
//!
//! The whole thing is single use: once a redirect has been handled, every
//! later one is turned away, whether the first succeeded or not.

use std::{
    future::{Future, IntoFuture},
    net::{Ipv4Addr, SocketAddr},
    sync::{Arc, Mutex, PoisonError},
    time::Duration,
};

use axum::{
    extract::{self, Query},
    http::StatusCode,
    routing::get,
    Router,
};
use serde::Deserialize;
use tokio::{
    net::TcpListener,
    sync::oneshot,
    task::JoinHandle,
    time,
};
use tokio_util::sync::{CancellationToken, DropGuard};
use url::Url;

use crate::catalog;

pub mod token;

/// Path the provider redirects back to.
pub const CALLBACK: &str = "/callback";

/// How long the listener gets to close gracefully once the wait is over.
const SHUTDOWN: Duration = Duration::from_secs(2);

/// Result alias for the handshake.
pub type Result<T> = std::result::Result<T, Error>;

/// Ways the handshake can fail. All of them are fatal for a run.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("couldn't start the redirect listener: {0}")]
    Listen(#[from] std::io::Error),

    #[error("redirect state doesn't match this session")]
    StateMismatch,

    #[error("redirect is missing the authorization code")]
    MissingCode,

    #[error("authorization was denied: {0}")]
    Denied(String),

    #[error("couldn't exchange the authorization code: {0}")]
    Exchange(#[from] catalog::Error),

    #[error("no authorization within {0:?}")]
    Timeout(Duration),

    #[error("the session ended without a result")]
    Closed,
}

/// Where a started session is at.
///
/// There is no idle state here: an unstarted handshake
/// is a [`Coordinator`], which doesn't have a session yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    /// Waiting for the redirect, or exchanging it's code.
    Pending,

    /// A client was handed off.
    Completed,

    /// The redirect was bad, the exchange failed or nothing came in time.
    Failed,
}

/// Trades authorization codes for clients.
pub trait Exchange: Send + Sync + 'static {
    /// The authenticated client handed out at the end.
    type Client: Send + 'static;

    /// The page the user authorizes on, which will echo `state` back.
    fn authorize_url(&self, state: &str) -> Url;

    /// Exchanges a code from the redirect.
    fn exchange(&self, code: &str) -> impl Future<Output = catalog::Result<Self::Client>> + Send;
}

/// Settings for the handshake.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    /// The local port to listen for the redirect on.
    pub port: u16,

    /// How long to wait for the user before giving up.
    pub timeout: Duration,
}

impl Config {
    /// The redirect URI to register with the provider.
    pub fn redirect_uri(&self) -> std::result::Result<Url, url::ParseError> {
        Url::parse(&format!("http://{}:{}{CALLBACK}", Ipv4Addr::LOCALHOST, self.port))
    }
}

/// Query parameters of the redirect.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct Redirect {
    /// The echoed session token.
    pub state: Option<String>,

    /// The authorization code, present on success.
    pub code: Option<String>,

    /// The provider's error, present if the user declined.
    pub error: Option<String>,
}

/// Mutable part of a [`Session`].
struct Inner<C> {
    /// Current state.
    state: State,

    /// Where the client goes. This is taken by the first redirect,
    /// so a pending session without it has a redirect in flight.
    slot: Option<oneshot::Sender<Result<C>>>,
}

/// A started handshake, shared between the waiter and the listener.
pub struct Session<E: Exchange> {
    /// The expected `state` parameter. Never changes after creation.
    token: String,

    /// Used to exchange the code.
    exchange: E,

    /// State & handoff slot.
    inner: Mutex<Inner<E::Client>>,
}

impl<E: Exchange> Session<E> {
    /// Creates a pending session, returning the receiving end of it's handoff.
    pub fn new(token: String, exchange: E) -> (Self, oneshot::Receiver<Result<E::Client>>) {
        let (tx, rx) = oneshot::channel();
        let session = Self {
            token,
            exchange,
            inner: Mutex::new(Inner {
                state: State::Pending,
                slot: Some(tx),
            }),
        };

        (session, rx)
    }

    /// Locks the mutable part, ignoring poison since it can't be left half-written.
    fn lock(&self) -> std::sync::MutexGuard<'_, Inner<E::Client>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// The session's current state.
    pub fn state(&self) -> State {
        self.lock().state
    }

    /// Takes the handoff slot, if no redirect has claimed it yet.
    fn claim(&self) -> Option<oneshot::Sender<Result<E::Client>>> {
        let mut inner = self.lock();
        if inner.state != State::Pending {
            return None;
        }

        inner.slot.take()
    }

    /// Marks the session as failed if it's still pending, for when nothing came in time.
    ///
    /// This includes a redirect which is still being exchanged, whose result is
    /// then thrown away. Returns whether the session was expired, so `false`
    /// means it had already settled and it's result is in the channel.
    pub fn expire(&self) -> bool {
        let mut inner = self.lock();
        if inner.state != State::Pending {
            return false;
        }

        inner.state = State::Failed;
        inner.slot = None;
        true
    }

    /// Checks a redirect and exchanges it's code.
    async fn verify(&self, redirect: Redirect) -> Result<E::Client> {
        if redirect.state.as_deref() != Some(self.token.as_str()) {
            return Err(Error::StateMismatch);
        }

        if let Some(error) = redirect.error {
            return Err(Error::Denied(error));
        }

        let code = redirect.code.ok_or(Error::MissingCode)?;
        Ok(self.exchange.exchange(&code).await?)
    }

    /// Handles a redirect, returning what the browser should be shown.
    ///
    /// Only the first redirect is processed, and it settles the session
    /// either way. Any others are rejected with [`StatusCode::CONFLICT`].
    /// If the session expires while the code is being exchanged, the browser
    /// is told so with [`StatusCode::REQUEST_TIMEOUT`] and the state is left alone.
    pub async fn redirect(&self, redirect: Redirect) -> (StatusCode, &'static str) {
        let Some(slot) = self.claim() else {
            tracing::warn!("ignoring redirect for an already handled session");
            return (
                StatusCode::CONFLICT,
                "This authorization request was already handled.",
            );
        };

        let result = self.verify(redirect).await;
        let (state, response) = match &result {
            Ok(_) => (
                State::Completed,
                (
                    StatusCode::OK,
                    "Authorized! You can close this window and head back to the terminal.",
                ),
            ),
            Err(error) => {
                tracing::error!("authorization failed: {error}");
                (
                    State::Failed,
                    (
                        StatusCode::BAD_REQUEST,
                        "Authorization failed, check the terminal for details.",
                    ),
                )
            }
        };

        let mut inner = self.lock();
        if inner.state != State::Pending {
            tracing::warn!("authorization finished after the session expired");
            return (
                StatusCode::REQUEST_TIMEOUT,
                "Authorization took too long, check the terminal for details.",
            );
        }

        inner.state = state;
        if slot.send(result).is_err() {
            tracing::debug!("nobody is waiting for the authorization anymore");
        }

        response
    }
}

/// The redirect route handler.
async fn callback<E: Exchange>(
    extract::State(session): extract::State<Arc<Session<E>>>,
    Query(redirect): Query<Redirect>,
) -> (StatusCode, &'static str) {
    session.redirect(redirect).await
}

/// An unstarted handshake. Nothing is bound until [`Coordinator::start`].
pub struct Coordinator<E: Exchange> {
    /// Handshake settings.
    config: Config,

    /// Used to build the authorization URL and exchange the code.
    exchange: E,
}

impl<E: Exchange> Coordinator<E> {
    /// Creates an idle coordinator.
    pub const fn new(config: Config, exchange: E) -> Self {
        Self { config, exchange }
    }

    /// Starts the handshake, generating the session token with `rng`
    /// and binding the redirect listener.
    ///
    /// The returned [`Pending::url`] still has to be opened by the user.
    pub async fn start(self, rng: &mut fastrand::Rng) -> Result<Pending<E>> {
        let token = token::generate(rng);
        let url = self.exchange.authorize_url(&token);
        let (session, rx) = Session::new(token, self.exchange);
        let session = Arc::new(session);

        let listener = TcpListener::bind((Ipv4Addr::LOCALHOST, self.config.port)).await?;
        let addr = listener.local_addr()?;

        let app = Router::new()
            .route(CALLBACK, get(callback::<E>))
            .with_state(Arc::clone(&session));

        let shutdown = CancellationToken::new();
        let server = axum::serve(listener, app)
            .with_graceful_shutdown(shutdown.clone().cancelled_owned())
            .into_future();

        tracing::debug!(%addr, "listening for the authorization redirect");

        Ok(Pending {
            url,
            addr,
            session,
            rx,
            timeout: self.config.timeout,
            server: tokio::spawn(server),
            shutdown: shutdown.drop_guard(),
        })
    }
}

/// A handshake which is waiting for the user.
///
/// Dropping this shuts the redirect listener down.
pub struct Pending<E: Exchange> {
    /// The page the user has to authorize on.
    url: Url,

    /// Where the redirect listener is bound.
    addr: SocketAddr,

    /// The session, shared with the listener.
    session: Arc<Session<E>>,

    /// Receives the client, or the reason there won't be one.
    rx: oneshot::Receiver<Result<E::Client>>,

    /// How long to wait for.
    timeout: Duration,

    /// The listener task.
    server: JoinHandle<std::io::Result<()>>,

    /// Stops the listener when dropped.
    shutdown: DropGuard,
}

impl<E: Exchange> Pending<E> {
    /// The authorization page, to be opened in a browser.
    pub const fn url(&self) -> &Url {
        &self.url
    }

    /// The local address of the redirect listener.
    pub const fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// The session's current state.
    pub fn state(&self) -> State {
        self.session.state()
    }

    /// A handle to the session, which outlives [`Pending::wait`].
    pub fn session(&self) -> Arc<Session<E>> {
        Arc::clone(&self.session)
    }

    /// Waits for the redirect, then stops the listener.
    ///
    /// A redirect still being exchanged when the timeout hits is abandoned,
    /// leaving the session [`State::Failed`].
    pub async fn wait(self) -> Result<E::Client> {
        let mut rx = self.rx;
        let result = match time::timeout(self.timeout, &mut rx).await {
            Ok(Ok(result)) => result,
            Ok(Err(_)) => Err(Error::Closed),
            Err(_) if self.session.expire() => Err(Error::Timeout(self.timeout)),
            Err(_) => rx.try_recv().unwrap_or(Err(Error::Closed)),
        };

        drop(self.shutdown);
        let abort = self.server.abort_handle();
        match time::timeout(SHUTDOWN, self.server).await {
            Ok(Ok(Err(error))) => tracing::debug!("redirect listener failed: {error}"),
            Err(_) => abort.abort(),
            _ => (),
        }

        result
    }
}
