//! GeoJSON map overlay for a [`ViewState`].
//!
//! The overlay is what a map front end draws: the primary ZIP polygon, an
//! optional comparison polygon joined to it by a connector line, and one
//! marker per place. Every feature has a `role` property so a renderer can
//! style it without inspecting geometry.

use geojson::{Feature, FeatureCollection, Geometry, JsonObject, Value};
use serde_json::json;
use zip_map_census_models::{Boundary, LatLng};
use zip_map_places::Place;
use zip_map_session::ViewState;
use zip_map_spatial::{BoundingRect, centroid, combined_bounds, to_multi_polygon};

/// Map center used before anything has been searched (the contiguous U.S.).
pub const DEFAULT_MAP_CENTER: LatLng = LatLng::new(39.8283, -98.5795);

/// Zoom level paired with [`DEFAULT_MAP_CENTER`].
pub const DEFAULT_MAP_ZOOM: u8 = 4;

/// What a feature depicts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// The searched ZIP code.
    Primary,
    /// A doppelganger shown next to it.
    Comparison,
    /// Line between the two polygons' centroids.
    Connector,
    /// A point of interest.
    Place,
}

impl Role {
    /// The `role` property value.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Primary => "primary",
            Self::Comparison => "comparison",
            Self::Connector => "connector",
            Self::Place => "place",
        }
    }
}

fn feature(value: Value, role: Role, mut properties: JsonObject) -> Feature {
    properties.insert("role".to_string(), json!(role.as_str()));

    Feature {
        bbox: None,
        geometry: Some(Geometry::new(value)),
        id: None,
        properties: Some(properties),
        foreign_members: None,
    }
}

fn position(point: LatLng) -> Vec<f64> {
    vec![point.lng, point.lat]
}

fn polygon_feature(boundary: &Boundary, role: Role, zip: &str) -> Option<Feature> {
    let polygons = to_multi_polygon(boundary);
    if polygons.0.is_empty() {
        return None;
    }

    let mut properties = JsonObject::new();
    properties.insert("zip".to_string(), json!(zip));

    Some(feature(Value::from(&polygons), role, properties))
}

fn place_feature(place: &Place, selected: bool) -> Feature {
    let mut properties = JsonObject::new();
    properties.insert("id".to_string(), json!(place.id));
    properties.insert("name".to_string(), json!(place.name()));
    properties.insert("address".to_string(), json!(place.formatted_address));
    if let Some(rating) = place.rating {
        properties.insert("rating".to_string(), json!(rating));
    }
    properties.insert("selected".to_string(), json!(selected));

    feature(Value::Point(position(place.position())), Role::Place, properties)
}

/// `[west, south, east, north]`, the GeoJSON bbox order.
fn bbox(rect: BoundingRect) -> Vec<f64> {
    vec![rect.low.lng, rect.low.lat, rect.high.lng, rect.high.lat]
}

/// Builds the overlay for `state`.
///
/// The collection's bbox covers both polygons and is the viewport a map
/// should fit to. It is absent when there are no polygons.
#[must_use]
pub fn map_overlay(state: &ViewState) -> FeatureCollection {
    let mut features = Vec::new();

    let primary = state.boundary.as_ref().zip(state.zip_code.as_ref());
    let comparison = state.comparison.as_ref();

    if let Some((boundary, zip)) = primary {
        features.extend(polygon_feature(boundary, Role::Primary, zip.as_str()));
    }

    if let Some(comparison) = comparison {
        features.extend(polygon_feature(
            &comparison.boundary,
            Role::Comparison,
            comparison.zip_code.as_str(),
        ));
    }

    let connector = primary
        .and_then(|(boundary, _)| centroid(boundary))
        .zip(comparison.and_then(|c| centroid(&c.boundary)));
    if let Some((from, to)) = connector {
        features.push(feature(
            Value::LineString(vec![position(from), position(to)]),
            Role::Connector,
            JsonObject::new(),
        ));
    }

    let selected = state.selected_place.as_ref().map(|p| p.id.as_str());
    for place in state.places.iter().flatten() {
        features.push(place_feature(place, selected == Some(place.id.as_str())));
    }

    let bounds = combined_bounds(&[
        state.boundary.as_ref(),
        comparison.map(|c| &c.boundary),
    ]);

    FeatureCollection {
        bbox: bounds.map(bbox),
        features,
        foreign_members: None,
    }
}

#[cfg(test)]
mod tests {
    use zip_map_census_models::ZipCode;
    use zip_map_places::PlaceLocation;
    use zip_map_session::Comparison;

    use super::*;

    fn square(lat0: f64, lng0: f64) -> Boundary {
        Boundary::new(vec![vec![
            LatLng::new(lat0, lng0),
            LatLng::new(lat0, lng0 + 1.0),
            LatLng::new(lat0 + 1.0, lng0 + 1.0),
            LatLng::new(lat0 + 1.0, lng0),
            LatLng::new(lat0, lng0),
        ]])
    }

    fn place(id: &str) -> Place {
        Place {
            id: id.to_string(),
            display_name: None,
            formatted_address: String::new(),
            rating: None,
            location: PlaceLocation {
                latitude: 0.5,
                longitude: 0.5,
            },
        }
    }

    fn role(feature: &Feature) -> &str {
        feature
            .properties
            .as_ref()
            .and_then(|p| p.get("role"))
            .and_then(serde_json::Value::as_str)
            .unwrap()
    }

    #[test]
    fn empty_state_has_no_features() {
        let overlay = map_overlay(&ViewState::default());
        assert!(overlay.features.is_empty());
        assert!(overlay.bbox.is_none());
    }

    #[test]
    fn primary_polygon_and_places() {
        let state = ViewState {
            zip_code: Some(ZipCode::parse("94043").unwrap()),
            boundary: Some(square(0.0, 0.0)),
            places: Some(vec![place("a"), place("b")]),
            selected_place: Some(place("b")),
            ..ViewState::default()
        };

        let overlay = map_overlay(&state);
        let roles: Vec<&str> = overlay.features.iter().map(role).collect();
        assert_eq!(roles, ["primary", "place", "place"]);
        assert_eq!(overlay.bbox, Some(vec![0.0, 0.0, 1.0, 1.0]));

        let selected = overlay.features[2].properties.as_ref().unwrap();
        assert_eq!(selected["selected"], json!(true));
        assert_eq!(selected["id"], json!("b"));
        assert!(matches!(
            overlay.features[0].geometry.as_ref().unwrap().value,
            Value::MultiPolygon(_)
        ));
    }

    #[test]
    fn comparison_adds_connector_between_centroids() {
        let state = ViewState {
            zip_code: Some(ZipCode::parse("94043").unwrap()),
            boundary: Some(square(0.0, 0.0)),
            comparison: Some(Comparison {
                zip_code: ZipCode::parse("10001").unwrap(),
                boundary: square(10.0, 20.0),
            }),
            ..ViewState::default()
        };

        let overlay = map_overlay(&state);
        let roles: Vec<&str> = overlay.features.iter().map(role).collect();
        assert_eq!(roles, ["primary", "comparison", "connector"]);
        assert_eq!(overlay.bbox, Some(vec![0.0, 0.0, 21.0, 11.0]));

        let Value::LineString(line) = &overlay.features[2].geometry.as_ref().unwrap().value else {
            panic!("connector should be a line");
        };
        // Vertex average of a closed square counts the first corner twice.
        assert_eq!(line.len(), 2);
        assert!((line[0][0] - 0.4).abs() < 1e-9);
        assert!((line[1][1] - 10.4).abs() < 1e-9);
    }

    #[test]
    fn comparison_alone_has_no_connector() {
        let state = ViewState {
            comparison: Some(Comparison {
                zip_code: ZipCode::parse("10001").unwrap(),
                boundary: square(10.0, 20.0),
            }),
            ..ViewState::default()
        };

        let roles: Vec<String> = map_overlay(&state)
            .features
            .iter()
            .map(|f| role(f).to_string())
            .collect();
        assert_eq!(roles, ["comparison"]);
    }
}
