//! Where the user is.
use anyhow::bail;
use futures::future::{self, BoxFuture, FutureExt};
use parkingspot::Coordinate;
use tracing::{info, warn};

/// Outcome of asking for access to the user's location.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Permission {
    Granted,
    Denied,
}

/// A geolocation service: ask for permission, then read the position
/// once.
pub trait LocationProvider {
    fn request_permission(&self) -> BoxFuture<'_, Permission>;

    fn current_position(&self) -> BoxFuture<'_, anyhow::Result<Coordinate>>;
}

/// Position given on the command line or in the environment. Permission
/// is denied when none was configured.
#[derive(Debug, Clone, Copy)]
pub struct ConfiguredLocation(Option<Coordinate>);

impl ConfiguredLocation {
    pub fn new(latitude: Option<f64>, longitude: Option<f64>) -> anyhow::Result<Self> {
        match (latitude, longitude) {
            (Some(latitude), Some(longitude)) => {
                Ok(Self(Some(Coordinate::new(latitude, longitude))))
            }
            (None, None) => Ok(Self(None)),
            _ => bail!("--lat and --lon must be given together"),
        }
    }
}

impl LocationProvider for ConfiguredLocation {
    fn request_permission(&self) -> BoxFuture<'_, Permission> {
        let permission = if self.0.is_some() {
            Permission::Granted
        } else {
            Permission::Denied
        };
        future::ready(permission).boxed()
    }

    fn current_position(&self) -> BoxFuture<'_, anyhow::Result<Coordinate>> {
        let position = match self.0 {
            Some(position) => Ok(position),
            None => Err(anyhow::anyhow!("no position configured")),
        };
        future::ready(position).boxed()
    }
}

/// Ask for permission and read the position once. Denial and read
/// failures are logged and yield `None`.
pub async fn resolve<P>(provider: &P) -> Option<Coordinate>
where
    P: LocationProvider + ?Sized,
{
    if provider.request_permission().await != Permission::Granted {
        warn!("location permission not granted, list stays unsorted");
        return None;
    }

    match provider.current_position().await {
        Ok(position) => {
            info!(
                latitude = position.latitude,
                longitude = position.longitude,
                "located"
            );
            Some(position)
        }
        Err(e) => {
            warn!("failed to read position: {e:#}");
            None
        }
    }
}
