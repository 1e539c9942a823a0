//! Text rendering of the board: a map section with markers and the
//! scrollable list.
use std::fmt;

use parkingspot::{
    navigation::{navigation_url, Platform},
    refresh::Board,
    view::Screen,
    ParkingRecord,
};
use time::macros::format_description;

/// The whole screen: map section (once located) followed by the list.
pub struct ScreenView<'a> {
    pub board: &'a Board,
    pub platform: Platform,
    pub limit: Option<usize>,
}

impl<'a> ScreenView<'a> {
    fn records(&self) -> &'a [ParkingRecord] {
        let records = self.board.records();
        &records[..self.limit.unwrap_or(records.len()).min(records.len())]
    }
}

impl fmt::Display for ScreenView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(updated_at) = self.board.updated_at() {
            let updated_at = updated_at
                .format(format_description!(
                    "[year]-[month]-[day] [hour]:[minute]:[second]"
                ))
                .map_err(|_| fmt::Error)?;
            writeln!(
                f,
                "{} facilities, updated {updated_at} UTC",
                self.board.records().len()
            )?;
        } else {
            writeln!(f, "waiting for data")?;
        }

        if let Screen::Ready(position) = self.board.screen() {
            writeln!(
                f,
                "\n== map ({:.4}, {:.4}) ==",
                position.latitude, position.longitude
            )?;
            writeln!(f, "  [you] your location")?;
            for record in self.records() {
                writeln!(f, "{}", Marker::new(record, self.platform))?;
            }
        }

        writeln!(f, "\n== list ==")?;
        for record in self.records() {
            writeln!(f, "{}", Row(record))?;
        }

        Ok(())
    }
}

/// One map marker with its callout and navigation link.
pub struct Marker<'a> {
    record: &'a ParkingRecord,
    platform: Platform,
}

impl<'a> Marker<'a> {
    pub const fn new(record: &'a ParkingRecord, platform: Platform) -> Self {
        Self { record, platform }
    }
}

impl fmt::Display for Marker<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let record = self.record;
        write!(
            f,
            "  [{}] {}  free: {} / ~{} km",
            record.id,
            record.name,
            record.free_spaces,
            Km(record.distance(), 1)
        )?;
        if let Ok(url) = navigation_url(record.location(), &record.name, self.platform) {
            write!(f, "\n        {url}")?;
        }
        Ok(())
    }
}

/// One list row.
pub struct Row<'a>(pub &'a ParkingRecord);

impl fmt::Display for Row<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let record = self.0;
        writeln!(f, "{}", record.name)?;
        writeln!(f, "  address: {}", record.address)?;
        writeln!(f, "  free spaces: {}", record.free_spaces)?;
        write!(f, "  distance: ~{} km", Km(record.distance(), 2))
    }
}

/// A distance with a fixed number of decimals, `-` when unknown.
struct Km(Option<f64>, usize);

impl fmt::Display for Km {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(km) => write!(f, "{km:.prec$}", prec = self.1),
            None => f.write_str("-"),
        }
    }
}
