#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Spatial helpers for ZIP code boundaries.
//!
//! Provides the axis-aligned [`BoundingRect`] used to scope a broad places
//! search, ring-point [`centroid`]s for the comparison connector line, and
//! the [`PointInPolygonTester`] capability used to filter search results
//! down to the real polygon, and [`to_multi_polygon`] for exporting a
//! boundary with its holes resolved.

use geo::{Contains, Coord, LineString, MultiPolygon, Point, Polygon};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display};
use zip_map_census_models::{Boundary, LatLng};

/// The smallest axis-aligned rectangle enclosing a set of points.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingRect {
    /// South-west corner.
    pub low: LatLng,
    /// North-east corner.
    pub high: LatLng,
}

impl BoundingRect {
    /// Computes the rectangle enclosing `points`.
    ///
    /// Returns `None` if `points` is empty.
    pub fn from_points<'a>(points: impl IntoIterator<Item = &'a LatLng>) -> Option<Self> {
        let mut points = points.into_iter();
        let first = *points.next()?;

        Some(points.fold(
            Self {
                low: first,
                high: first,
            },
            |rect, p| rect.extend(*p),
        ))
    }

    /// Computes the rectangle enclosing every point of every ring.
    #[must_use]
    pub fn of(boundary: &Boundary) -> Option<Self> {
        Self::from_points(boundary.points())
    }

    /// Returns this rectangle grown to include `point`.
    #[must_use]
    pub fn extend(self, point: LatLng) -> Self {
        Self {
            low: LatLng::new(self.low.lat.min(point.lat), self.low.lng.min(point.lng)),
            high: LatLng::new(self.high.lat.max(point.lat), self.high.lng.max(point.lng)),
        }
    }

    /// Returns the rectangle enclosing both `self` and `other`.
    #[must_use]
    pub fn union(self, other: Self) -> Self {
        self.extend(other.low).extend(other.high)
    }

    /// True if `point` is inside or on the edge of this rectangle.
    #[must_use]
    pub fn contains(&self, point: LatLng) -> bool {
        (self.low.lat..=self.high.lat).contains(&point.lat)
            && (self.low.lng..=self.high.lng).contains(&point.lng)
    }
}

/// Computes the rectangle enclosing several boundaries, skipping any that
/// are absent. This is the viewport a map should fit to.
#[must_use]
pub fn combined_bounds(boundaries: &[Option<&Boundary>]) -> Option<BoundingRect> {
    boundaries
        .iter()
        .flatten()
        .filter_map(|b| BoundingRect::of(b))
        .reduce(BoundingRect::union)
}

/// Averages every ring point of a boundary.
///
/// This is a vertex average, not an area-weighted centroid; it is only
/// used as an anchor for drawing a line between two boundaries.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn centroid(boundary: &Boundary) -> Option<LatLng> {
    let (lat_sum, lng_sum, count) = boundary
        .points()
        .fold((0.0, 0.0, 0usize), |(lat, lng, n), p| {
            (lat + p.lat, lng + p.lng, n + 1)
        });

    if count == 0 {
        return None;
    }

    Some(LatLng::new(lat_sum / count as f64, lng_sum / count as f64))
}

/// How places results were filtered against the ZIP boundary.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, AsRefStr,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum PrecisionMode {
    /// Each result was checked against the actual polygon.
    Exact,
    /// Results were only scoped to the boundary's bounding rectangle.
    BoundingBoxOnly,
}

/// Tests whether a point falls inside a boundary.
///
/// Injected into places filtering so the geometry backend can be swapped
/// or left out entirely.
pub trait PointInPolygonTester: Send + Sync {
    /// True if `point` lies inside `boundary`.
    fn contains(&self, boundary: &Boundary, point: LatLng) -> bool;
}

/// [`PointInPolygonTester`] backed by the `geo` crate.
///
/// Rings are combined with the even-odd rule: a point is inside when it
/// falls within an odd number of rings. Because boundaries are flattened
/// ring lists, this treats inner rings as holes and separate outer rings
/// as separate parts without needing to know which is which.
#[derive(Debug, Clone, Copy, Default)]
pub struct GeoPolygonTester;

impl PointInPolygonTester for GeoPolygonTester {
    fn contains(&self, boundary: &Boundary, point: LatLng) -> bool {
        if !BoundingRect::of(boundary).is_some_and(|rect| rect.contains(point)) {
            return false;
        }

        let geo_point = Point::new(point.lng, point.lat);

        let containing = boundary
            .rings()
            .iter()
            .filter(|ring| ring.len() >= 3)
            .filter(|ring| ring_polygon(ring).contains(&geo_point))
            .count();

        containing % 2 == 1
    }
}

/// Rebuilds polygon structure from a flattened ring list.
///
/// A ring nested inside an odd number of other rings is a hole and is
/// attached to the innermost outer ring containing it; every other ring
/// starts a new polygon. Rings with fewer than three points are dropped.
/// Coordinates are `x = lng`, `y = lat`.
#[must_use]
pub fn to_multi_polygon(boundary: &Boundary) -> MultiPolygon<f64> {
    let rings: Vec<&[LatLng]> = boundary
        .rings()
        .iter()
        .filter(|ring| ring.len() >= 3)
        .map(Vec::as_slice)
        .collect();
    let shells: Vec<Polygon<f64>> = rings.iter().map(|ring| ring_polygon(ring)).collect();

    let containers = |i: usize| -> Vec<usize> {
        let first = rings[i][0];
        let point = Point::new(first.lng, first.lat);
        (0..rings.len())
            .filter(|&j| j != i && shells[j].contains(&point))
            .collect()
    };

    let depths: Vec<usize> = (0..rings.len()).map(|i| containers(i).len()).collect();
    let mut holes: Vec<Vec<LineString<f64>>> = vec![Vec::new(); rings.len()];

    for i in (0..rings.len()).filter(|&i| depths[i] % 2 == 1) {
        let parent = containers(i)
            .into_iter()
            .filter(|&j| depths[j] % 2 == 0)
            .max_by_key(|&j| depths[j]);

        if let Some(parent) = parent {
            holes[parent].push(shells[i].exterior().clone());
        }
    }

    let polygons = (0..rings.len())
        .filter(|&i| depths[i] % 2 == 0)
        .map(|i| Polygon::new(shells[i].exterior().clone(), std::mem::take(&mut holes[i])))
        .collect();

    MultiPolygon::new(polygons)
}

/// Builds a hole-free `geo` polygon from one lat/lng ring.
fn ring_polygon(ring: &[LatLng]) -> Polygon<f64> {
    let coords: Vec<Coord<f64>> = ring.iter().map(|p| Coord { x: p.lng, y: p.lat }).collect();
    Polygon::new(LineString::from(coords), Vec::new())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(lat0: f64, lng0: f64, size: f64) -> Vec<LatLng> {
        vec![
            LatLng::new(lat0, lng0),
            LatLng::new(lat0, lng0 + size),
            LatLng::new(lat0 + size, lng0 + size),
            LatLng::new(lat0 + size, lng0),
            LatLng::new(lat0, lng0),
        ]
    }

    /// An L-shape whose bounding box includes the empty upper-right corner.
    fn l_shape() -> Boundary {
        Boundary::new(vec![vec![
            LatLng::new(0.0, 0.0),
            LatLng::new(0.0, 2.0),
            LatLng::new(1.0, 2.0),
            LatLng::new(1.0, 1.0),
            LatLng::new(2.0, 1.0),
            LatLng::new(2.0, 0.0),
            LatLng::new(0.0, 0.0),
        ]])
    }

    #[test]
    fn bounding_rect_spans_all_rings() {
        let boundary = Boundary::new(vec![square(0.0, 0.0, 1.0), square(5.0, -3.0, 1.0)]);
        let rect = BoundingRect::of(&boundary).unwrap();
        assert_eq!(rect.low, LatLng::new(0.0, -3.0));
        assert_eq!(rect.high, LatLng::new(6.0, 1.0));
    }

    #[test]
    fn bounding_rect_of_empty_boundary_is_none() {
        assert!(BoundingRect::of(&Boundary::default()).is_none());
    }

    #[test]
    fn combined_bounds_skips_missing_boundaries() {
        let a = Boundary::new(vec![square(0.0, 0.0, 1.0)]);
        let b = Boundary::new(vec![square(10.0, 10.0, 2.0)]);

        let only_a = combined_bounds(&[Some(&a), None]).unwrap();
        assert_eq!(only_a.high, LatLng::new(1.0, 1.0));

        let both = combined_bounds(&[Some(&a), Some(&b)]).unwrap();
        assert_eq!(both.low, LatLng::new(0.0, 0.0));
        assert_eq!(both.high, LatLng::new(12.0, 12.0));

        assert!(combined_bounds(&[None, None]).is_none());
    }

    #[test]
    fn centroid_averages_ring_points() {
        let boundary = Boundary::new(vec![vec![
            LatLng::new(0.0, 0.0),
            LatLng::new(0.0, 4.0),
            LatLng::new(2.0, 4.0),
            LatLng::new(2.0, 0.0),
        ]]);
        assert_eq!(centroid(&boundary), Some(LatLng::new(1.0, 2.0)));
        assert_eq!(centroid(&Boundary::new(vec![vec![]])), None);
    }

    #[test]
    fn tester_excludes_bounding_box_only_points() {
        let boundary = l_shape();
        let tester = GeoPolygonTester;

        assert!(tester.contains(&boundary, LatLng::new(0.5, 0.5)));
        assert!(tester.contains(&boundary, LatLng::new(0.5, 1.5)));

        let corner = LatLng::new(1.5, 1.5);
        assert!(BoundingRect::of(&boundary).unwrap().contains(corner));
        assert!(!tester.contains(&boundary, corner));
    }

    #[test]
    fn tester_treats_inner_ring_as_hole() {
        let boundary = Boundary::new(vec![square(0.0, 0.0, 10.0), square(4.0, 4.0, 2.0)]);
        let tester = GeoPolygonTester;

        assert!(tester.contains(&boundary, LatLng::new(1.0, 1.0)));
        assert!(!tester.contains(&boundary, LatLng::new(5.0, 5.0)));
    }

    #[test]
    fn tester_handles_disjoint_parts() {
        let boundary = Boundary::new(vec![square(0.0, 0.0, 1.0), square(5.0, 5.0, 1.0)]);
        let tester = GeoPolygonTester;

        assert!(tester.contains(&boundary, LatLng::new(5.5, 5.5)));
        assert!(!tester.contains(&boundary, LatLng::new(3.0, 3.0)));
    }

    #[test]
    fn multi_polygon_attaches_holes_to_their_shell() {
        let boundary = Boundary::new(vec![
            square(0.0, 0.0, 10.0),
            square(4.0, 4.0, 2.0),
            square(20.0, 20.0, 1.0),
        ]);

        let multi = to_multi_polygon(&boundary);

        assert_eq!(multi.0.len(), 2);
        assert_eq!(multi.0[0].interiors().len(), 1);
        assert!(multi.0[1].interiors().is_empty());
        assert_eq!(multi.0[1].exterior().0[0], Coord { x: 20.0, y: 20.0 });
    }

    #[test]
    fn multi_polygon_treats_island_in_hole_as_shell() {
        let boundary = Boundary::new(vec![
            square(0.0, 0.0, 10.0),
            square(2.0, 2.0, 6.0),
            square(4.0, 4.0, 2.0),
        ]);

        let multi = to_multi_polygon(&boundary);

        assert_eq!(multi.0.len(), 2);
        assert_eq!(multi.0[0].interiors().len(), 1);
        assert!(multi.0[1].interiors().is_empty());
    }

    #[test]
    fn precision_mode_labels() {
        assert_eq!(PrecisionMode::Exact.to_string(), "exact");
        assert_eq!(PrecisionMode::BoundingBoxOnly.as_ref(), "bounding-box-only");
    }
}
