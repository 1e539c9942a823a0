//! Live data from the parking open-data feed over HTTP.
use std::{
    fmt,
    pin::Pin,
    task::{Context, Poll},
    time::Duration,
};

use futures::{future::BoxFuture, ready, FutureExt, Stream};
use thiserror::Error;
use tokio::time::{self, Interval, MissedTickBehavior};
#[cfg(feature = "tracing")]
use tracing::{debug, instrument};
use url::Url;

use crate::record::{self, ParkingRecord};

/// Open-data endpoint of the Kaohsiung parking availability feed.
pub const DEFAULT_ENDPOINT: &str = "https://kpp.tbkc.gov.tw/ParkingLocation/GetParkingLocation";

/// How often the feed is fetched.
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(60);

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// An error that can occur when fetching the dataset.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The request failed or the server answered with an error status.
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    /// The body is not a JSON array.
    #[error("decode json failed: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Somewhere the full parking dataset can be fetched from.
pub trait Source {
    /// Fetch every record.
    fn fetch(&self) -> BoxFuture<'static, Result<Vec<ParkingRecord>, FetchError>>;
}

/// Fetches the dataset with a plain `GET`. No authentication, no
/// pagination.
#[derive(Debug, Clone)]
pub struct HttpSource {
    client: reqwest::Client,
    endpoint: Url,
}

impl HttpSource {
    /// Fetch from `endpoint`.
    #[must_use]
    pub fn new(endpoint: Url) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint,
        }
    }

    /// The URL being fetched.
    #[must_use]
    pub const fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

impl Source for HttpSource {
    fn fetch(&self) -> BoxFuture<'static, Result<Vec<ParkingRecord>, FetchError>> {
        fetch_from(self.client.clone(), self.endpoint.clone()).boxed()
    }
}

#[cfg_attr(feature = "tracing", instrument(skip_all, fields(%endpoint)))]
async fn fetch_from(
    client: reqwest::Client,
    endpoint: Url,
) -> Result<Vec<ParkingRecord>, FetchError> {
    #[cfg(feature = "tracing")]
    debug!("fetching");

    let body = client
        .get(endpoint)
        .send()
        .await?
        .error_for_status()?
        .bytes()
        .await?;
    let body = body.strip_prefix(UTF8_BOM).unwrap_or(&body[..]);
    let records = record::from_feed(body)?;

    #[cfg(feature = "tracing")]
    debug!(count = records.len(), "fetched");

    Ok(records)
}

/// A never-ending stream of fetch results, one per tick.
///
/// The first fetch starts as soon as the stream is polled; after that
/// one fetch is made per interval. A failed fetch is yielded as an error
/// and the stream carries on with the next tick. Dropping the stream
/// stops the timer and abandons any request in flight.
pub struct RefreshStream<S> {
    source: S,
    interval: Interval,
    state: State,
}

enum State {
    Waiting,
    Fetching(BoxFuture<'static, Result<Vec<ParkingRecord>, FetchError>>),
}

impl<S> RefreshStream<S>
where
    S: Source,
{
    /// Fetch from `source` every `period`.
    ///
    /// # Panics
    ///
    /// Panics if `period` is zero, or when called outside of a Tokio
    /// runtime.
    #[must_use]
    pub fn new(source: S, period: Duration) -> Self {
        let mut interval = time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        Self {
            source,
            interval,
            state: State::Waiting,
        }
    }

    /// Fetch again right away and restart the schedule from now. A
    /// request already in flight is abandoned.
    pub fn refresh_now(&mut self) {
        #[cfg(feature = "tracing")]
        debug!("refreshing ahead of schedule");

        self.interval.reset();
        self.state = State::Fetching(self.source.fetch());
    }

    /// The period between fetches.
    #[must_use]
    pub fn period(&self) -> Duration {
        self.interval.period()
    }
}

impl<S> Stream for RefreshStream<S>
where
    S: Source + Unpin,
{
    type Item = Result<Vec<ParkingRecord>, FetchError>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = &mut *self;

        loop {
            match &mut this.state {
                State::Waiting => {
                    ready!(this.interval.poll_tick(cx));
                    this.state = State::Fetching(this.source.fetch());
                }
                State::Fetching(fut) => {
                    let result = ready!(fut.poll_unpin(cx));
                    this.state = State::Waiting;
                    return Poll::Ready(Some(result));
                }
            }
        }
    }
}

impl<S: fmt::Debug> fmt::Debug for RefreshStream<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RefreshStream")
            .field("source", &self.source)
            .field("period", &self.interval.period())
            .field("state", &self.state)
            .finish()
    }
}

impl fmt::Debug for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Waiting => f.debug_tuple("Waiting").finish(),
            Self::Fetching(_) => f.debug_tuple("Fetching").finish(),
        }
    }
}

/// Refresh from `source` every [`DEFAULT_INTERVAL`].
///
/// ```no_run
/// use futures::StreamExt;
/// use parkingspot::{live::{self, HttpSource}, refresh::Board};
///
/// # tokio_test::block_on(async {
/// let endpoint = live::DEFAULT_ENDPOINT.parse().unwrap();
/// let mut stream = live::stream(HttpSource::new(endpoint));
/// let mut board = Board::new();
///
/// while let Some(result) = stream.next().await {
///     match board.apply(result) {
///         Ok(count) => println!("{count} facilities"),
///         Err(e) => eprintln!("keeping previous data: {e}"),
///     }
/// }
/// # });
/// ```
#[must_use]
pub fn stream<S>(source: S) -> RefreshStream<S>
where
    S: Source,
{
    RefreshStream::new(source, DEFAULT_INTERVAL)
}
