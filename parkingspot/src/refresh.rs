//! The refresh cycle: turning a fetched dataset into what is displayed.
use time::OffsetDateTime;

use crate::{distance::Coordinate, record::ParkingRecord, view::Screen};

/// Annotate every record with its distance from `position` and sort
/// them nearest first.
///
/// Without a position the records are returned in upstream order,
/// untouched. The sort is stable, so facilities at the same distance
/// keep their upstream order.
#[must_use]
pub fn annotate(records: Vec<ParkingRecord>, position: Option<Coordinate>) -> Vec<ParkingRecord> {
    let Some(position) = position else {
        return records;
    };

    let mut records: Vec<_> = records
        .into_iter()
        .map(|record| {
            let km = position.distance_to(record.location());
            record.with_distance(km)
        })
        .collect();

    records.sort_by(|a, b| {
        let a = a.distance().unwrap_or(f64::INFINITY);
        let b = b.distance().unwrap_or(f64::INFINITY);
        a.total_cmp(&b)
    });

    records
}

/// Everything currently on screen.
#[derive(Debug, Default)]
pub struct Board {
    screen: Screen,
    records: Vec<ParkingRecord>,
    updated_at: Option<OffsetDateTime>,
}

impl Board {
    /// An empty board waiting for data and location.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current screen state.
    #[must_use]
    pub const fn screen(&self) -> &Screen {
        &self.screen
    }

    /// Records in display order.
    #[must_use]
    pub fn records(&self) -> &[ParkingRecord] {
        &self.records
    }

    /// Find a record by its facility id.
    #[must_use]
    pub fn record(&self, id: &str) -> Option<&ParkingRecord> {
        self.records.iter().find(|record| record.id == id)
    }

    /// When the records were last replaced.
    #[must_use]
    pub const fn updated_at(&self) -> Option<OffsetDateTime> {
        self.updated_at
    }

    /// Record the user's position.
    ///
    /// Only the first position is used. The records already on the board
    /// are sorted right away instead of waiting for the next fetch.
    /// Returns whether the position was accepted.
    pub fn locate(&mut self, position: Coordinate) -> bool {
        if !self.screen.locate(position) {
            return false;
        }
        let records = std::mem::take(&mut self.records);
        self.records = annotate(records, Some(position));
        true
    }

    /// Apply the outcome of a fetch.
    ///
    /// On success the working set is replaced and the number of records
    /// is returned. On failure nothing changes and the error is handed
    /// back to the caller for logging.
    ///
    /// # Errors
    ///
    /// Returns the fetch error unchanged.
    pub fn apply<E>(&mut self, result: Result<Vec<ParkingRecord>, E>) -> Result<usize, E> {
        let records = result?;
        self.records = annotate(records, self.screen.position());
        self.updated_at = Some(OffsetDateTime::now_utc());
        Ok(self.records.len())
    }
}
