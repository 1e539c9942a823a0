use std::{future::Future, io, process, time::Duration};

use anyhow::{bail, Context};
use futures::StreamExt;
use location::{ConfiguredLocation, LocationProvider};
use parkingspot::{
    live::{HttpSource, RefreshStream, Source},
    navigation::{navigation_url, Platform},
    refresh::Board,
};
use render::ScreenView;
use structopt::StructOpt;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use url::Url;

mod location;
mod render;

/// Free parking spaces in Kaohsiung, nearest first.
#[derive(Debug, StructOpt)]
#[structopt(name = "parkingwatch")]
struct Opt {
    /// Parking availability feed.
    #[structopt(
        long,
        env = "PARKING_ENDPOINT",
        default_value = "https://kpp.tbkc.gov.tw/ParkingLocation/GetParkingLocation"
    )]
    endpoint: Url,

    /// Seconds between refreshes.
    #[structopt(long, env = "PARKING_INTERVAL", default_value = "60", parse(try_from_str = parse_interval))]
    interval: Duration,

    /// Your latitude in degrees.
    #[structopt(long, env = "PARKING_LAT", allow_hyphen_values = true)]
    lat: Option<f64>,

    /// Your longitude in degrees.
    #[structopt(long, env = "PARKING_LON", allow_hyphen_values = true)]
    lon: Option<f64>,

    /// Maps application for navigation links (ios or android).
    #[structopt(long, env = "PARKING_PLATFORM", default_value = "android")]
    platform: Platform,

    /// Show at most this many facilities.
    #[structopt(long, env = "PARKING_LIMIT")]
    limit: Option<usize>,

    #[structopt(subcommand)]
    cmd: Option<Command>,
}

#[derive(Debug, StructOpt)]
enum Command {
    /// Refresh every interval until interrupted (default).
    Watch,
    /// Fetch once, print and exit.
    Once,
    /// Open driving directions to a facility.
    Navigate {
        /// Facility id as shown in the map section.
        parking_id: String,
    },
}

fn parse_interval(s: &str) -> Result<Duration, String> {
    match s.parse::<u64>() {
        Ok(0) => Err("interval must be at least one second".to_owned()),
        Ok(secs) => Ok(Duration::from_secs(secs)),
        Err(e) => Err(e.to_string()),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let mut opt = Opt::from_args();
    let provider = ConfiguredLocation::new(opt.lat, opt.lon)?;
    let source = HttpSource::new(opt.endpoint.clone());

    match opt.cmd.take().unwrap_or(Command::Watch) {
        Command::Watch => watch(&opt, source, &provider, tokio::signal::ctrl_c()).await,
        Command::Once => {
            let board = fetch_once(&source, &provider).await?;
            print!("{}", view(&board, &opt));
            Ok(())
        }
        Command::Navigate { parking_id } => {
            let board = fetch_once(&source, &provider).await?;
            let Some(record) = board.record(&parking_id) else {
                bail!("no parking facility with id {parking_id:?}");
            };
            let url = navigation_url(record.location(), &record.name, opt.platform)?;
            println!("{url}");
            open_url(&url)
        }
    }
}

const fn view<'a>(board: &'a Board, opt: &Opt) -> ScreenView<'a> {
    ScreenView {
        board,
        platform: opt.platform,
        limit: opt.limit,
    }
}

/// Refresh and print until `shutdown` completes.
async fn watch<S, P, F>(opt: &Opt, source: S, provider: &P, shutdown: F) -> anyhow::Result<()>
where
    S: Source + Unpin,
    P: LocationProvider,
    F: Future<Output = io::Result<()>>,
{
    let mut board = Board::new();
    let mut stream = RefreshStream::new(source, opt.interval);
    let locate = location::resolve(provider);
    tokio::pin!(locate, shutdown);
    let mut located = false;

    loop {
        tokio::select! {
            position = &mut locate, if !located => {
                located = true;
                if let Some(position) = position {
                    if board.locate(position) {
                        print!("{}", view(&board, opt));
                        stream.refresh_now();
                    }
                }
            }
            Some(result) = stream.next() => match board.apply(result) {
                Ok(count) => {
                    info!(count, "refreshed");
                    print!("{}", view(&board, opt));
                }
                Err(e) => error!("failed to fetch parking data, keeping previous data: {e}"),
            },
            res = &mut shutdown => {
                res.context("failed to listen for ctrl-c")?;
                info!("shutting down");
                break;
            }
        }
    }

    Ok(())
}

async fn fetch_once<P>(source: &HttpSource, provider: &P) -> anyhow::Result<Board>
where
    P: LocationProvider,
{
    let mut board = Board::new();
    if let Some(position) = location::resolve(provider).await {
        board.locate(position);
    }
    board
        .apply(source.fetch().await)
        .with_context(|| format!("failed to fetch {}", source.endpoint()))?;
    Ok(board)
}

/// Hand the link to the operating system's URL handler.
fn open_url(url: &Url) -> anyhow::Result<()> {
    let status = opener(url)
        .status()
        .context("failed to launch the URL handler")?;
    if !status.success() {
        bail!("URL handler exited with {status}");
    }
    Ok(())
}

#[cfg(target_os = "macos")]
fn opener(url: &Url) -> process::Command {
    let mut cmd = process::Command::new("open");
    cmd.arg(url.as_str());
    cmd
}

#[cfg(target_os = "windows")]
fn opener(url: &Url) -> process::Command {
    let mut cmd = process::Command::new("cmd");
    cmd.args(["/C", "start", "", url.as_str()]);
    cmd
}

#[cfg(not(any(target_os = "macos", target_os = "windows")))]
fn opener(url: &Url) -> process::Command {
    let mut cmd = process::Command::new("xdg-open");
    cmd.arg(url.as_str());
    cmd
}

#[cfg(test)]
mod tests {
    use std::{
        sync::{
            atomic::{AtomicUsize, Ordering},
            Arc,
        },
        time::Duration,
    };

    use futures::future::{self, BoxFuture, FutureExt};
    use parkingspot::{
        live::{FetchError, Source},
        navigation::Platform,
        Coordinate, ParkingRecord,
    };
    use structopt::StructOpt;
    use tokio::time::{self, Instant};

    use super::{parse_interval, watch, Command, Opt};
    use crate::location::ConfiguredLocation;

    #[derive(Debug, Clone, Default)]
    struct Counting(Arc<AtomicUsize>);

    impl Source for Counting {
        fn fetch(&self) -> BoxFuture<'static, Result<Vec<ParkingRecord>, FetchError>> {
            self.0.fetch_add(1, Ordering::SeqCst);
            let record = ParkingRecord::new("1", "Lot", "", Coordinate::new(22.6, 120.3), 2);
            future::ready(Ok(vec![record])).boxed()
        }
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_outlives_refreshes() {
        let opt = Opt::from_iter_safe(["parkingwatch", "--interval", "1"]).unwrap();
        let source = Counting::default();
        let provider = ConfiguredLocation::new(Some(22.6273), Some(120.3014)).unwrap();
        let start = Instant::now();

        // a shutdown that is recreated on every refresh would never fire
        let shutdown = async {
            time::sleep(Duration::from_millis(3500)).await;
            Ok(())
        };
        watch(&opt, source.clone(), &provider, shutdown)
            .await
            .unwrap();

        assert!(start.elapsed() >= Duration::from_millis(3500));
        assert!(start.elapsed() < Duration::from_secs(4));
        assert!(source.0.load(Ordering::SeqCst) >= 4);
    }

    #[test]
    fn interval() {
        assert_eq!(parse_interval("60"), Ok(Duration::from_secs(60)));
        assert!(parse_interval("0").is_err());
        assert!(parse_interval("-5").is_err());
        assert!(parse_interval("soon").is_err());
    }

    #[test]
    fn args() {
        let opt = Opt::from_iter_safe([
            "parkingwatch",
            "--lat",
            "-33.86",
            "--lon",
            "151.2",
            "--platform",
            "ios",
            "navigate",
            "1023",
        ])
        .unwrap();

        assert_eq!(opt.lat, Some(-33.86));
        assert_eq!(opt.lon, Some(151.2));
        assert_eq!(opt.platform, Platform::Ios);
        assert!(matches!(opt.cmd, Some(Command::Navigate { parking_id }) if parking_id == "1023"));
    }
}
