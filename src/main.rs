//! Builds monthly playlists out of a venue's show calendar.
use std::{process::ExitCode, time::Duration};

use chrono::Local;
use clap::{Parser, Subcommand};
use reqwest::Client;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use url::Url;

pub mod auth;
pub mod catalog;
pub mod error;
pub mod listing;
pub mod months;
pub mod pipeline;
pub mod publish;
pub mod resolver;
pub mod tracks;
mod tests;

pub use error::{Error, Result};

use crate::{
    catalog::spotify::{Accounts, Credentials},
    listing::Show,
    months::Months,
    tracks::Buckets,
};

/// Builds monthly playlists out of a venue's show calendar.
#[derive(Parser, Clone)]
#[command(about, version)]
pub struct Args {
    /// Minimum amount of unique artists a month needs to get a playlist.
    #[clap(long = "n_artists", alias = "n-artists", default_value_t = 10)]
    n_artists: usize,

    /// Amount of top tracks taken from each artist.
    #[clap(long = "n_tracks", alias = "n-tracks", default_value_t = 3)]
    n_tracks: usize,

    /// The venue's listing page.
    #[clap(long, default_value = "http://www.theindependentsf.com/")]
    venue_url: Url,

    /// Name of the venue, which prefixes every playlist name.
    #[clap(long, default_value = "The Independent")]
    venue_name: String,

    /// Market region to take top tracks from.
    #[clap(long, short, default_value = "US")]
    market: String,

    /// Local port to receive the authorization redirect on.
    #[clap(long, short, default_value_t = 8888)]
    port: u16,

    /// Seconds to wait for authorization in the browser.
    #[clap(long, default_value_t = 300)]
    auth_timeout: u64,

    /// Timeout in seconds for web requests.
    #[clap(long, default_value_t = 10)]
    timeout: u64,

    /// Print the playlists instead of authorizing & creating them.
    #[clap(long, short = 'n')]
    dry_run: bool,

    /// Include debug logs.
    #[clap(long, short)]
    debug: bool,

    /// Client ID of the registered Spotify app.
    #[clap(long, env = "SPOTIFY_CLIENT_ID", hide_env_values = true)]
    client_id: Option<String>,

    /// Client secret of the registered Spotify app.
    #[clap(long, env = "SPOTIFY_CLIENT_SECRET", hide_env_values = true)]
    client_secret: Option<String>,

    /// The command that was ran.
    /// This is [None] if no command was specified.
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Defines all of the extra commands that can be ran.
#[derive(Subcommand, Clone)]
enum Commands {
    /// Prints the venue's shows, without touching the catalog.
    Scrape,
}

impl Args {
    /// Gets the OAuth client, failing if the credentials weren't provided.
    fn credentials(&self, redirect: Url) -> Result<Credentials> {
        let (Some(id), Some(secret)) = (&self.client_id, &self.client_secret) else {
            return Err(Error::Credentials);
        };

        Ok(Credentials {
            id: id.clone(),
            secret: secret.clone(),
            redirect,
        })
    }

    /// The handshake settings.
    const fn auth(&self) -> auth::Config {
        auth::Config {
            port: self.port,
            timeout: Duration::from_secs(self.auth_timeout),
        }
    }

    /// The playlist settings.
    fn settings(&self) -> pipeline::Settings {
        pipeline::Settings {
            min_artists: self.n_artists,
            n_tracks: self.n_tracks,
            market: self.market.clone(),
        }
    }
}

/// Sets up logging, with `RUST_LOG` taking precedence over `--debug`.
fn logging(debug: bool) {
    let fallback = if debug {
        "venue_playlists=debug"
    } else {
        "venue_playlists=info"
    };

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| fallback.into()))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();
}

/// Prints every show, like a plain dump of the listing.
fn print_shows(shows: &[Show]) {
    for (i, show) in shows.iter().enumerate() {
        match &show.link {
            Some(link) => println!("Show #{i:>3}: {link}"),
            None => println!("Show #{i:>3}"),
        }

        println!("      Date: {} ({})", show.date, show.month());
        for headliner in &show.headliners {
            println!(" Headliner: {headliner}");
        }

        for support in &show.supports {
            println!("   Support: {support}");
        }
    }
}

/// Prints the playlists a real run would create.
fn print_plan(buckets: &Buckets, venue: &str) {
    for (month, tracks) in buckets.iter() {
        println!("{} ({} tracks)", publish::name(venue, *month), tracks.len());
        for track in tracks {
            println!("  spotify:track:{} (popularity {})", track.id, track.popularity);
        }
    }
}

/// Opens the authorization page, or asks the user to if that doesn't work.
fn open(url: &Url) {
    tracing::info!("opening the authorization page in your browser");
    if let Err(error) = webbrowser::open(url.as_str()) {
        tracing::warn!("couldn't open a browser: {error}");
        eprintln!("please visit this page to authorize: {url}");
    }
}

/// Runs everything, returning whether publishing went through without failures.
async fn run(args: Args) -> Result<ExitCode> {
    let client = Client::builder()
        .user_agent(concat!(
            env!("CARGO_PKG_NAME"),
            "/",
            env!("CARGO_PKG_VERSION")
        ))
        .timeout(Duration::from_secs(args.timeout))
        .build()?;

    let today = Local::now().date_naive();
    let shows = listing::load(&client, &args.venue_url, today).await?;

    if let Some(Commands::Scrape) = args.command {
        print_shows(&shows);
        return Ok(ExitCode::SUCCESS);
    }

    let config = args.auth();
    let accounts = Accounts::new(args.credentials(config.redirect_uri()?)?, client);

    let months = Months::aggregate(listing::entries(&shows), args.n_artists);
    tracing::info!(
        "{} months have at least {} artists",
        months.len(),
        args.n_artists
    );

    if months.is_empty() {
        return Ok(ExitCode::SUCCESS);
    }

    // The user can authorize while the artists are being looked up.
    let pending = if args.dry_run {
        None
    } else {
        let pending = auth::Coordinator::new(config, accounts.clone())
            .start(&mut fastrand::Rng::new())
            .await?;

        open(pending.url());
        Some(pending)
    };

    let lookup = accounts.client_credentials().await?;
    let buckets = pipeline::gather(&lookup, months, &args.settings()).await;

    let Some(pending) = pending else {
        print_plan(&buckets, &args.venue_name);
        return Ok(ExitCode::SUCCESS);
    };

    if buckets.is_empty() {
        tracing::warn!("no tracks were found, so there's nothing to publish");
        return Ok(ExitCode::SUCCESS);
    }

    tracing::info!("waiting for authorization");
    let spotify = pending.wait().await?;
    let report = publish::publish(&spotify, buckets, &args.venue_name).await?;

    for playlist in &report.playlists {
        println!(
            "{} ({} tracks)",
            publish::name(&args.venue_name, playlist.month),
            playlist.tracks
        );
    }

    if report.ok() {
        Ok(ExitCode::SUCCESS)
    } else {
        eprintln!(
            "finished with {} failures, some playlists may be incomplete",
            report.failures.len()
        );
        Ok(ExitCode::FAILURE)
    }
}

#[tokio::main]
async fn main() -> eyre::Result<ExitCode> {
    let args = Args::parse();
    logging(args.debug);

    Ok(run(args).await?)
}
