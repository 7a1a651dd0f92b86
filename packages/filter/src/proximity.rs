//! Great-circle distance, initial bearing, and their list-view formatting.

use std::fmt;

use geo::{Bearing as _, Distance as _, Haversine, Point};
use sheet_map_sheet_models::Position;
use strum_macros::{AsRefStr, Display, EnumString};

/// Below this distance a feature is shown as "at location" instead of with
/// a direction.
pub const AT_LOCATION_METERS: f64 = 10.0;

/// Distances from this value up are shown in kilometers.
const KILOMETER: f64 = 1_000.0;

fn point(position: Position) -> Point<f64> {
    Point::new(position.longitude, position.latitude)
}

/// One of the eight compass directions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, AsRefStr)]
pub enum Octant {
    /// 337.5° to 22.5°.
    #[strum(serialize = "N")]
    North,
    /// 22.5° to 67.5°.
    #[strum(serialize = "NE")]
    NorthEast,
    /// 67.5° to 112.5°.
    #[strum(serialize = "E")]
    East,
    /// 112.5° to 157.5°.
    #[strum(serialize = "SE")]
    SouthEast,
    /// 157.5° to 202.5°.
    #[strum(serialize = "S")]
    South,
    /// 202.5° to 247.5°.
    #[strum(serialize = "SW")]
    SouthWest,
    /// 247.5° to 292.5°.
    #[strum(serialize = "W")]
    West,
    /// 292.5° to 337.5°.
    #[strum(serialize = "NW")]
    NorthWest,
}

impl Octant {
    const ALL: [Self; 8] = [
        Self::North,
        Self::NorthEast,
        Self::East,
        Self::SouthEast,
        Self::South,
        Self::SouthWest,
        Self::West,
        Self::NorthWest,
    ];

    /// Buckets a bearing in degrees (any range) into an octant. Each octant
    /// is 45° wide and centered on its compass direction.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn from_bearing(bearing: f64) -> Self {
        let normalized = bearing.rem_euclid(360.0);
        let index = ((normalized + 22.5) / 45.0).floor() as usize % 8;
        Self::ALL[index]
    }

    /// Arrow glyph pointing in this direction.
    #[must_use]
    pub const fn arrow(self) -> char {
        match self {
            Self::North => '↑',
            Self::NorthEast => '↗',
            Self::East => '→',
            Self::SouthEast => '↘',
            Self::South => '↓',
            Self::SouthWest => '↙',
            Self::West => '←',
            Self::NorthWest => '↖',
        }
    }
}

/// How a feature's direction is shown in the list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Closer than [`AT_LOCATION_METERS`].
    AtLocation,
    /// Further away, in this direction.
    Toward(Octant),
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AtLocation => f.write_str("at location"),
            Self::Toward(octant) => write!(f, "{} {octant}", octant.arrow()),
        }
    }
}

/// Formats a distance: whole meters under 1 km, otherwise kilometers to one
/// decimal.
#[must_use]
pub fn format_distance(meters: f64) -> String {
    if meters < KILOMETER {
        format!("{meters:.0} m")
    } else {
        format!("{:.1} km", meters / KILOMETER)
    }
}

/// Distance and initial bearing from a reference point to a feature.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Proximity {
    /// Great-circle distance in meters.
    pub distance_meters: f64,
    /// Initial bearing in degrees clockwise from north, in `[0, 360)`.
    pub bearing_degrees: f64,
}

impl Proximity {
    /// Measures from `from` to `to`.
    #[must_use]
    pub fn between(from: Position, to: Position) -> Self {
        let (from, to) = (point(from), point(to));
        Self {
            distance_meters: Haversine.distance(from, to),
            bearing_degrees: Haversine.bearing(from, to).rem_euclid(360.0),
        }
    }

    /// Direction bucket for display.
    #[must_use]
    pub fn direction(&self) -> Direction {
        if self.distance_meters < AT_LOCATION_METERS {
            Direction::AtLocation
        } else {
            Direction::Toward(Octant::from_bearing(self.bearing_degrees))
        }
    }

    /// Formatted distance.
    #[must_use]
    pub fn distance_label(&self) -> String {
        format_distance(self.distance_meters)
    }
}

impl fmt::Display for Proximity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.direction() {
            Direction::AtLocation => f.write_str("at location"),
            direction @ Direction::Toward(_) => {
                write!(f, "{} {direction}", self.distance_label())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn octant_boundaries() {
        assert_eq!(Octant::from_bearing(0.0), Octant::North);
        assert_eq!(Octant::from_bearing(22.4), Octant::North);
        assert_eq!(Octant::from_bearing(22.5), Octant::NorthEast);
        assert_eq!(Octant::from_bearing(67.5), Octant::East);
        assert_eq!(Octant::from_bearing(180.0), Octant::South);
        assert_eq!(Octant::from_bearing(292.5), Octant::NorthWest);
        assert_eq!(Octant::from_bearing(337.4), Octant::NorthWest);
        assert_eq!(Octant::from_bearing(337.5), Octant::North);
        assert_eq!(Octant::from_bearing(-90.0), Octant::West);
        assert_eq!(Octant::from_bearing(720.0), Octant::North);
    }

    #[test]
    fn distances_format_by_magnitude() {
        assert_eq!(format_distance(0.0), "0 m");
        assert_eq!(format_distance(111.19), "111 m");
        assert_eq!(format_distance(999.4), "999 m");
        assert_eq!(format_distance(1_000.0), "1.0 km");
        assert_eq!(format_distance(111_195.0), "111.2 km");
    }

    #[test]
    fn measures_north_and_east() {
        let origin = Position::new(0.0, 0.0);
        let north = Proximity::between(origin, Position::new(0.0, 1.0));
        assert!((north.distance_meters - 111_195.0).abs() < 10.0);
        assert_eq!(Octant::from_bearing(north.bearing_degrees), Octant::North);

        let east = Proximity::between(origin, Position::new(1.0, 0.0));
        assert!((east.bearing_degrees - 90.0).abs() < 1e-6);
        assert_eq!(east.direction(), Direction::Toward(Octant::East));
    }

    #[test]
    fn close_features_are_at_location() {
        let origin = Position::new(73.8, 18.5);
        let near = Proximity::between(origin, Position::new(73.8, 18.500_05));
        assert!(near.distance_meters < AT_LOCATION_METERS);
        assert_eq!(near.direction(), Direction::AtLocation);
        assert_eq!(near.to_string(), "at location");
    }

    #[test]
    fn labels_combine_distance_and_arrow() {
        let p = Proximity {
            distance_meters: 1_500.0,
            bearing_degrees: 45.0,
        };
        assert_eq!(p.to_string(), "1.5 km ↗ NE");
        assert_eq!(Octant::SouthWest.to_string(), "SW");
    }
}
