//! What the screen can show.
use crate::distance::Coordinate;

/// Display state of the screen.
///
/// The map needs a position to center on, so it is only shown once the
/// user's location is known. The screen moves to [`Screen::Ready`]
/// exactly once and never goes back.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Screen {
    /// Location permission or position read still pending, or denied.
    #[default]
    AwaitingLocation,
    /// The user's position is known.
    Ready(Coordinate),
}

impl Screen {
    /// Move to [`Screen::Ready`]. Returns `false` and leaves the state
    /// untouched if the position was already known.
    pub fn locate(&mut self, position: Coordinate) -> bool {
        match self {
            Self::AwaitingLocation => {
                *self = Self::Ready(position);
                true
            }
            Self::Ready(_) => false,
        }
    }

    /// The user's position, if known.
    #[must_use]
    pub const fn position(&self) -> Option<Coordinate> {
        match self {
            Self::AwaitingLocation => None,
            Self::Ready(position) => Some(*position),
        }
    }

    /// Whether the map section is rendered.
    #[must_use]
    pub const fn shows_map(&self) -> bool {
        matches!(self, Self::Ready(_))
    }
}
