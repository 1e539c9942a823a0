//! Parking availability from the Kaohsiung open-data feed, sorted by
//! proximity to the user.
#![warn(
    clippy::pedantic,
    clippy::nursery,
    missing_docs,
    missing_debug_implementations,
    unreachable_pub
)]

pub mod distance;
pub mod navigation;
pub mod record;
pub mod refresh;
pub mod view;

#[cfg(feature = "live")]
pub mod live;

pub use distance::{haversine_km, Coordinate};
pub use record::ParkingRecord;
