//! Rectangular viewport bounds and point containment.

use std::str::FromStr;

use geo::{Coord, Intersects as _, Point, Polygon, Rect};
use sheet_map_sheet_models::Position;

/// Errors parsing a `west,south,east,north` bounds string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BoundsParseError {
    /// Not exactly four comma-separated values.
    #[error("expected west,south,east,north but found {0} values")]
    WrongArity(usize),

    /// A value is not a number.
    #[error("invalid coordinate '{0}'")]
    InvalidNumber(String),

    /// South is above north or a value is out of geographic range.
    #[error("bounds out of range: {0}")]
    OutOfRange(String),
}

/// The visible map area in geographic coordinates.
///
/// `west > east` describes a viewport that crosses the antimeridian.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    /// Western longitude.
    pub west: f64,
    /// Southern latitude.
    pub south: f64,
    /// Eastern longitude.
    pub east: f64,
    /// Northern latitude.
    pub north: f64,
}

impl Bounds {
    /// Creates bounds from their four edges.
    #[must_use]
    pub const fn new(west: f64, south: f64, east: f64, north: f64) -> Self {
        Self {
            west,
            south,
            east,
            north,
        }
    }

    fn rect(west: f64, south: f64, east: f64, north: f64) -> Polygon<f64> {
        Rect::new(Coord { x: west, y: south }, Coord { x: east, y: north }).to_polygon()
    }

    /// The viewport as polygons: one, or two when it wraps the
    /// antimeridian.
    #[must_use]
    pub fn polygons(&self) -> Vec<Polygon<f64>> {
        if self.west <= self.east {
            vec![Self::rect(self.west, self.south, self.east, self.north)]
        } else {
            vec![
                Self::rect(self.west, self.south, 180.0, self.north),
                Self::rect(-180.0, self.south, self.east, self.north),
            ]
        }
    }

    /// Whether `position` lies inside the viewport or on its edge.
    #[must_use]
    pub fn contains(&self, position: Position) -> bool {
        let point = Point::new(position.longitude, position.latitude);
        self.polygons().iter().any(|polygon| polygon.intersects(&point))
    }
}

impl FromStr for Bounds {
    type Err = BoundsParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let values = s
            .split(',')
            .map(|part| {
                let part = part.trim();
                part.parse::<f64>()
                    .ok()
                    .filter(|v| v.is_finite())
                    .ok_or_else(|| BoundsParseError::InvalidNumber(part.to_owned()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let &[west, south, east, north] = values.as_slice() else {
            return Err(BoundsParseError::WrongArity(values.len()));
        };

        let lat_ok = |v: f64| (-90.0..=90.0).contains(&v);
        let lon_ok = |v: f64| (-180.0..=180.0).contains(&v);
        if !(lat_ok(south) && lat_ok(north) && lon_ok(west) && lon_ok(east)) || south > north {
            return Err(BoundsParseError::OutOfRange(s.to_owned()));
        }

        Ok(Self::new(west, south, east, north))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contains_interior_and_edges() {
        let bounds = Bounds::new(-10.0, -5.0, 10.0, 5.0);
        assert!(bounds.contains(Position::new(0.0, 0.0)));
        assert!(bounds.contains(Position::new(10.0, 5.0)));
        assert!(bounds.contains(Position::new(-10.0, 0.0)));
        assert!(!bounds.contains(Position::new(10.1, 0.0)));
        assert!(!bounds.contains(Position::new(0.0, -5.1)));
    }

    #[test]
    fn wraps_the_antimeridian() {
        let bounds = Bounds::new(170.0, -10.0, -170.0, 10.0);
        assert_eq!(bounds.polygons().len(), 2);
        assert!(bounds.contains(Position::new(175.0, 0.0)));
        assert!(bounds.contains(Position::new(-175.0, 0.0)));
        assert!(!bounds.contains(Position::new(0.0, 0.0)));
    }

    #[test]
    fn parses_bounds_strings() {
        assert_eq!(
            "-10, -5, 10, 5".parse::<Bounds>().unwrap(),
            Bounds::new(-10.0, -5.0, 10.0, 5.0)
        );
        assert_eq!(
            "1,2,3".parse::<Bounds>(),
            Err(BoundsParseError::WrongArity(3))
        );
        assert_eq!(
            "a,2,3,4".parse::<Bounds>(),
            Err(BoundsParseError::InvalidNumber("a".to_owned()))
        );
        assert!(matches!(
            "0,10,1,5".parse::<Bounds>(),
            Err(BoundsParseError::OutOfRange(_))
        ));
    }
}
