//! Deep links into the platform's native maps application.
use std::{fmt, str::FromStr};

use thiserror::Error;
use url::{form_urlencoded, Url};

use crate::distance::Coordinate;

/// Mobile platform whose maps application should handle the link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Platform {
    /// Apple Maps.
    Ios,
    /// Google Maps.
    #[default]
    Android,
}

/// Returned when parsing an unknown platform name.
#[derive(Debug, Error)]
#[error("unknown platform {0:?}, expected \"ios\" or \"android\"")]
pub struct ParsePlatformError(String);

impl FromStr for Platform {
    type Err = ParsePlatformError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ios" => Ok(Self::Ios),
            "android" => Ok(Self::Android),
            _ => Err(ParsePlatformError(s.to_owned())),
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ios => f.write_str("ios"),
            Self::Android => f.write_str("android"),
        }
    }
}

/// Build a link that opens driving directions to `destination`.
///
/// Coordinates are not range checked. `label` is only used by Apple Maps
/// and is percent-encoded.
///
/// ```
/// use parkingspot::{navigation::{navigation_url, Platform}, Coordinate};
///
/// let url = navigation_url(Coordinate::new(22.6273, 120.3014), "Central Park", Platform::Ios)?;
/// assert_eq!(url.as_str(), "http://maps.apple.com/?daddr=22.6273,120.3014&q=Central+Park");
/// # Ok::<(), url::ParseError>(())
/// ```
///
/// # Errors
///
/// Fails only if the resulting string is not a valid URL.
pub fn navigation_url(
    destination: Coordinate,
    label: &str,
    platform: Platform,
) -> Result<Url, url::ParseError> {
    let Coordinate {
        latitude,
        longitude,
    } = destination;

    let url = match platform {
        Platform::Ios => {
            let label: String = form_urlencoded::byte_serialize(label.as_bytes()).collect();
            format!("http://maps.apple.com/?daddr={latitude},{longitude}&q={label}")
        }
        Platform::Android => format!(
            "https://www.google.com/maps/dir/?api=1&destination={latitude},{longitude}&travelmode=driving"
        ),
    };

    Url::parse(&url)
}
