//! Fetches and parses the venue's show calendar.
//!
//! Each listing item on the page is turned into a [`Show`], and each show
//! then expands into one [`ShowEntry`] per performing artist.

use std::sync::LazyLock;

use chrono::NaiveDate;
use reqwest::{Client, StatusCode};
use scraper::{ElementRef, Html, Selector};
use url::Url;

pub mod date;
pub use date::MonthKey;

/// Selects every show on the listing page.
static ITEM: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("div .list-view-item").unwrap());

/// Selects the first link of a show, pointing to it's own page.
static LINK: LazyLock<Selector> = LazyLock::new(|| Selector::parse("a[href]").unwrap());

/// Selects the details block of a show.
static DETAILS: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("div .list-view-details").unwrap());

/// Selects the date of a show, relative to the details block.
static DATES: LazyLock<Selector> = LazyLock::new(|| Selector::parse(".dates").unwrap());

/// Selects each headliner, relative to the details block.
static HEADLINERS: LazyLock<Selector> = LazyLock::new(|| Selector::parse(".headliners").unwrap());

/// Selects each list of supporting acts, relative to the details block.
static SUPPORTS: LazyLock<Selector> = LazyLock::new(|| Selector::parse(".supports").unwrap());

/// Errors that can happen while fetching the listing page.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("unable to fetch listing: {0}")]
    Request(#[from] reqwest::Error),

    #[error("rate limit reached: {0}")]
    RateLimited(Url),

    #[error("non success code {status}: {url}")]
    Status { status: u16, url: Url },
}

/// How an artist appears on a show's bill.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Headliner,
    Support,
}

/// A single artist playing a show in a given month.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShowEntry {
    /// The month the show happens in.
    pub month: MonthKey,

    /// The artist name, exactly as listed.
    pub artist: String,

    /// Whether the artist is headlining or supporting.
    pub role: Role,
}

/// One parsed listing item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Show {
    /// The show's own page, if the item links to one.
    pub link: Option<Url>,

    /// The date of the show, with a guessed year.
    pub date: NaiveDate,

    /// Headlining artists, one per `.headliners` element.
    pub headliners: Vec<String>,

    /// Supporting artists, after splitting each `.supports` element on commas.
    pub supports: Vec<String>,
}

impl Show {
    /// The month key this show is bucketed under.
    pub fn month(&self) -> MonthKey {
        MonthKey::of(self.date)
    }

    /// Expands the show into one entry per artist, headliners first.
    pub fn entries(&self) -> impl Iterator<Item = ShowEntry> + '_ {
        let month = self.month();
        let entry = move |artist: &String, role| ShowEntry {
            month,
            artist: artist.clone(),
            role,
        };

        self.headliners
            .iter()
            .map(move |x| entry(x, Role::Headliner))
            .chain(self.supports.iter().map(move |x| entry(x, Role::Support)))
    }
}

/// Collapses all whitespace runs in an element's text into single spaces.
fn text(element: ElementRef) -> String {
    element
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Parses a single listing item, or returns [`None`] if it should be skipped.
fn item(element: ElementRef, base: &Url, today: NaiveDate) -> Option<Show> {
    let link = element
        .select(&LINK)
        .next()
        .and_then(|x| x.value().attr("href"))
        .and_then(|x| base.join(x).ok());

    let Some(details) = element.select(&DETAILS).next() else {
        tracing::warn!(?link, "skipping show without details");
        return None;
    };

    let raw = details.select(&DATES).next().map(text).unwrap_or_default();
    let date = match date::parse(&raw, today) {
        Ok(date) => date,
        Err(error) => {
            tracing::warn!(?link, "skipping show, unparseable date: {error}");
            return None;
        }
    };

    let headliners = details
        .select(&HEADLINERS)
        .map(text)
        .filter(|x| !x.is_empty())
        .collect();

    let supports = details
        .select(&SUPPORTS)
        .map(text)
        .flat_map(|x| {
            x.split(',')
                .map(str::trim)
                .filter(|x| !x.is_empty())
                .map(ToOwned::to_owned)
                .collect::<Vec<_>>()
        })
        .collect();

    Some(Show {
        link,
        date,
        headliners,
        supports,
    })
}

/// Parses every show out of a listing document.
///
/// Items with missing details or a date that can't be parsed are
/// logged and skipped, they never fail the whole listing.
pub fn parse(document: &Html, base: &Url, today: NaiveDate) -> Vec<Show> {
    document
        .select(&ITEM)
        .filter_map(|x| item(x, base, today))
        .collect()
}

/// Flattens shows into artist entries.
pub fn entries(shows: &[Show]) -> Vec<ShowEntry> {
    shows.iter().flat_map(Show::entries).collect()
}

/// Downloads the raw listing page.
pub async fn fetch(client: &Client, url: &Url) -> Result<String, Error> {
    tracing::debug!(%url, "fetching listing");
    let response = client.get(url.clone()).send().await?;

    let status = response.status();
    if status == StatusCode::TOO_MANY_REQUESTS {
        return Err(Error::RateLimited(url.clone()));
    }

    if !status.is_success() {
        return Err(Error::Status {
            status: status.as_u16(),
            url: url.clone(),
        });
    }

    Ok(response.text().await?)
}

/// Fetches the listing at `url` and parses all of it's shows.
pub async fn load(client: &Client, url: &Url, today: NaiveDate) -> Result<Vec<Show>, Error> {
    let body = fetch(client, url).await?;
    let shows = parse(&Html::parse_document(&body), url, today);
    tracing::info!("found {} shows", shows.len());

    Ok(shows)
}
