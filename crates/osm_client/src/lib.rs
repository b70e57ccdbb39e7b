//! OpenStreetMap client.
//!
//! Resolves a city name to its administrative boundary via Nominatim, then
//! pulls green-space features (parks, gardens, forests, …) inside that
//! boundary from the Overpass API.

pub mod area;

use std::collections::HashMap;

use common::config::HttpConfig;
use common::{Error, GreenFeature, GreenSpaceCollection, GreenSpaceData, Result};
use geo::{Coord, Geometry, LineString, MultiPolygon, Point, Polygon};
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::area::{feature_area_m2, total_area_km2};

const NOMINATIM_URL: &str = "https://nominatim.openstreetmap.org/search";
const OVERPASS_URL: &str = "https://overpass-api.de/api/interpreter";

/// Green-space tag values queried from OSM.
const LEISURE_TAGS: &[&str] = &["park", "garden", "playground"];
const LANDUSE_TAGS: &[&str] = &["forest", "grass", "recreation_ground"];
const NATURAL_TAGS: &[&str] = &["wood", "scrub", "heath"];

/// OSM API client with connection pooling and an identifying User-Agent
/// (both Nominatim and Overpass refuse anonymous agents).
#[derive(Debug, Clone)]
pub struct OsmClient {
    client: reqwest::Client,
}

// ── Nominatim response types ──────────────────────────────────────────

/// One place from `/search?format=jsonv2`.
#[derive(Debug, Deserialize)]
pub struct NominatimPlace {
    pub osm_type: String,
    pub osm_id: u64,
    pub display_name: String,
    pub lat: String,
    pub lon: String,
    #[serde(default)]
    pub geojson: Option<geojson::Geometry>,
}

impl NominatimPlace {
    /// Boundary polygon as a geo geometry, when Nominatim returned one.
    pub fn boundary_geometry(&self) -> Option<Geometry<f64>> {
        let gj = self.geojson.as_ref()?;
        Geometry::try_from(gj.clone()).ok()
    }

    /// Overpass area id for `area(..)` queries. Only relations and ways
    /// have derived areas.
    pub fn overpass_area_id(&self) -> Option<u64> {
        match self.osm_type.as_str() {
            "relation" => Some(3_600_000_000 + self.osm_id),
            "way" => Some(2_400_000_000 + self.osm_id),
            _ => None,
        }
    }
}

// ── Overpass response types ───────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct OverpassResponse {
    #[serde(default)]
    pub elements: Vec<OverpassElement>,
}

#[derive(Debug, Deserialize)]
pub struct OverpassElement {
    #[serde(rename = "type")]
    pub kind: String,
    pub id: u64,
    #[serde(default)]
    pub tags: HashMap<String, String>,
    /// Way vertices (`out geom`).
    #[serde(default)]
    pub geometry: Vec<LatLon>,
    /// Relation members with their own geometry.
    #[serde(default)]
    pub members: Vec<OverpassMember>,
    /// Node coordinates.
    #[serde(default)]
    pub lat: Option<f64>,
    #[serde(default)]
    pub lon: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct OverpassMember {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub geometry: Vec<LatLon>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct LatLon {
    pub lat: f64,
    pub lon: f64,
}

// ── Implementation ────────────────────────────────────────────────────

impl OsmClient {
    pub fn new(http: &HttpConfig) -> Self {
        let client = reqwest::Client::builder()
            .user_agent(http.user_agent.clone())
            .pool_max_idle_per_host(4)
            .timeout(std::time::Duration::from_secs(http.request_timeout_secs))
            .build()
            .expect("failed to build OSM HTTP client");

        Self { client }
    }

    /// Resolve a city name to its best Nominatim match.
    pub async fn resolve_place(&self, city: &str) -> Result<NominatimPlace> {
        debug!("Resolving place: {}", city);

        let resp = self
            .client
            .get(NOMINATIM_URL)
            .query(&[
                ("q", city),
                ("format", "jsonv2"),
                ("polygon_geojson", "1"),
                ("limit", "1"),
            ])
            .send()
            .await
            .map_err(|e| Error::Osm(format!("HTTP error for {}: {}", city, e)))?;

        let status = resp.status().as_u16();
        if status != 200 {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Osm(format!(
                "Nominatim returned {} for {}: {}",
                status,
                city,
                truncate(&body, 500)
            )));
        }

        let mut places: Vec<NominatimPlace> = resp
            .json()
            .await
            .map_err(|e| Error::Osm(format!("JSON parse error for {}: {}", city, e)))?;

        if places.is_empty() {
            return Err(Error::PlaceNotFound(city.to_string()));
        }
        Ok(places.remove(0))
    }

    /// Fetch green-space features and area figures for a city.
    ///
    /// Both "place not found" and upstream failures surface as errors here;
    /// the orchestrator treats either as "no data" rather than failing the
    /// whole analysis.
    pub async fn fetch_green_spaces(&self, city: &str) -> Result<GreenSpaceData> {
        let place = self.resolve_place(city).await?;
        debug!("Resolved {} to {}", city, place.display_name);

        let boundary_area_km2 = place
            .boundary_geometry()
            .map(|g| feature_area_m2(&g))
            .filter(|a| *a > 0.0)
            .map(|a| common::round2(a / 1_000_000.0));

        let area_id = place
            .overpass_area_id()
            .ok_or_else(|| Error::PlaceNotFound(format!("{} has no area boundary", city)))?;

        let query = build_green_space_query(area_id);
        let resp = self
            .client
            .post(OVERPASS_URL)
            .form(&[("data", query.as_str())])
            .send()
            .await
            .map_err(|e| Error::Osm(format!("HTTP error for {}: {}", city, e)))?;

        let status = resp.status().as_u16();
        if status != 200 {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Osm(format!(
                "Overpass returned {} for {}: {}",
                status,
                city,
                truncate(&body, 500)
            )));
        }

        let data: OverpassResponse = resp
            .json()
            .await
            .map_err(|e| Error::Osm(format!("JSON parse error for {}: {}", city, e)))?;

        let collection = parse_elements(data.elements);
        if collection.is_empty() {
            warn!("No green features found for {}", city);
        }
        let green_area_km2 =
            total_area_km2(collection.features.iter().map(|f| feature_area_m2(&f.geometry)));

        info!(
            "Found {} green features for {} ({} km²)",
            collection.len(),
            city,
            green_area_km2
        );

        Ok(GreenSpaceData {
            boundary_area_km2,
            green_area_km2,
            collection,
        })
    }
}

/// Overpass QL for every green-space tag inside the resolved area.
fn build_green_space_query(area_id: u64) -> String {
    let mut filters = String::new();
    for (key, values) in [
        ("leisure", LEISURE_TAGS),
        ("landuse", LANDUSE_TAGS),
        ("natural", NATURAL_TAGS),
    ] {
        filters.push_str(&format!(
            "  nwr[\"{}\"~\"^({})$\"](area.searchArea);\n",
            key,
            values.join("|")
        ));
    }
    format!(
        "[out:json][timeout:60];\narea({})->.searchArea;\n(\n{});\nout geom;",
        area_id, filters
    )
}

/// Which green category an element's tags match, if any.
fn category_of(tags: &HashMap<String, String>) -> Option<String> {
    for (key, values) in [
        ("leisure", LEISURE_TAGS),
        ("landuse", LANDUSE_TAGS),
        ("natural", NATURAL_TAGS),
    ] {
        if let Some(v) = tags.get(key) {
            if values.contains(&v.as_str()) {
                return Some(v.clone());
            }
        }
    }
    None
}

/// Convert Overpass elements into green features.
///
/// Closed ways become polygons, open ways and nodes become points.
/// Relations keep their closed outer rings; inner rings are attached as
/// holes only in the unambiguous single-outer case.
pub fn parse_elements(elements: Vec<OverpassElement>) -> GreenSpaceCollection {
    let mut features = Vec::new();

    for el in elements {
        let Some(category) = category_of(&el.tags) else {
            continue;
        };
        let name = el.tags.get("name").cloned();

        let geometry = match el.kind.as_str() {
            "way" => way_geometry(&el.geometry),
            "relation" => relation_geometry(&el.members),
            "node" => match (el.lat, el.lon) {
                (Some(lat), Some(lon)) => Some(Geometry::Point(Point::new(lon, lat))),
                _ => None,
            },
            _ => None,
        };

        if let Some(geometry) = geometry {
            features.push(GreenFeature {
                name,
                category,
                geometry,
            });
        } else {
            debug!("Skipping {} {} with no usable geometry", el.kind, el.id);
        }
    }

    GreenSpaceCollection { features }
}

fn coords(points: &[LatLon]) -> Vec<Coord<f64>> {
    points
        .iter()
        .map(|p| Coord { x: p.lon, y: p.lat })
        .collect()
}

fn is_closed(points: &[LatLon]) -> bool {
    points.len() >= 4
        && points.first().map(|p| (p.lat, p.lon)) == points.last().map(|p| (p.lat, p.lon))
}

fn way_geometry(points: &[LatLon]) -> Option<Geometry<f64>> {
    if points.is_empty() {
        return None;
    }
    if is_closed(points) {
        Some(Geometry::Polygon(Polygon::new(
            LineString::from(coords(points)),
            vec![],
        )))
    } else {
        let first = points[0];
        Some(Geometry::Point(Point::new(first.lon, first.lat)))
    }
}

fn relation_geometry(members: &[OverpassMember]) -> Option<Geometry<f64>> {
    let mut outers: Vec<LineString<f64>> = Vec::new();
    let mut inners: Vec<LineString<f64>> = Vec::new();

    for m in members {
        if m.kind != "way" || !is_closed(&m.geometry) {
            continue;
        }
        let ring = LineString::from(coords(&m.geometry));
        match m.role.as_str() {
            "outer" | "" => outers.push(ring),
            "inner" => inners.push(ring),
            _ => {}
        }
    }

    match outers.len() {
        0 => None,
        1 => Some(Geometry::Polygon(Polygon::new(
            outers.into_iter().next().unwrap(),
            inners,
        ))),
        _ => Some(Geometry::MultiPolygon(MultiPolygon(
            outers.into_iter().map(|o| Polygon::new(o, vec![])).collect(),
        ))),
    }
}

fn truncate(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_overpass() -> &'static str {
        r#"{
            "elements": [
                {
                    "type": "way",
                    "id": 1,
                    "tags": {"leisure": "park", "name": "Kaivopuisto"},
                    "geometry": [
                        {"lat": 60.155, "lon": 24.955},
                        {"lat": 60.155, "lon": 24.960},
                        {"lat": 60.158, "lon": 24.960},
                        {"lat": 60.158, "lon": 24.955},
                        {"lat": 60.155, "lon": 24.955}
                    ]
                },
                {
                    "type": "way",
                    "id": 2,
                    "tags": {"natural": "wood"},
                    "geometry": [
                        {"lat": 60.20, "lon": 24.90},
                        {"lat": 60.21, "lon": 24.91}
                    ]
                },
                {
                    "type": "node",
                    "id": 3,
                    "tags": {"leisure": "playground"},
                    "lat": 60.17,
                    "lon": 24.94
                },
                {
                    "type": "relation",
                    "id": 4,
                    "tags": {"landuse": "forest"},
                    "members": [
                        {
                            "type": "way",
                            "role": "outer",
                            "geometry": [
                                {"lat": 60.30, "lon": 24.80},
                                {"lat": 60.30, "lon": 24.85},
                                {"lat": 60.33, "lon": 24.85},
                                {"lat": 60.33, "lon": 24.80},
                                {"lat": 60.30, "lon": 24.80}
                            ]
                        }
                    ]
                },
                {
                    "type": "way",
                    "id": 5,
                    "tags": {"highway": "residential"},
                    "geometry": [
                        {"lat": 60.1, "lon": 24.9},
                        {"lat": 60.2, "lon": 24.9}
                    ]
                }
            ]
        }"#
    }

    #[test]
    fn parses_ways_nodes_and_relations() {
        let resp: OverpassResponse =
            serde_json::from_str(sample_overpass()).expect("response should deserialize");
        let collection = parse_elements(resp.elements);

        // Untagged highway is dropped; the other four survive.
        assert_eq!(collection.len(), 4);

        let park = &collection.features[0];
        assert_eq!(park.name.as_deref(), Some("Kaivopuisto"));
        assert_eq!(park.category, "park");
        assert!(matches!(park.geometry, Geometry::Polygon(_)));

        // Open way degrades to a point.
        assert!(matches!(collection.features[1].geometry, Geometry::Point(_)));
        assert_eq!(collection.features[1].category, "wood");

        assert!(matches!(collection.features[2].geometry, Geometry::Point(_)));
        assert!(matches!(collection.features[3].geometry, Geometry::Polygon(_)));
    }

    #[test]
    fn polygon_features_carry_area() {
        let resp: OverpassResponse =
            serde_json::from_str(sample_overpass()).expect("response should deserialize");
        let collection = parse_elements(resp.elements);

        let areas: Vec<f64> = collection
            .features
            .iter()
            .map(|f| feature_area_m2(&f.geometry))
            .collect();

        // Two polygons with area, two points without.
        assert!(areas[0] > 0.0);
        assert_eq!(areas[1], 0.0);
        assert_eq!(areas[2], 0.0);
        assert!(areas[3] > 0.0);
    }

    #[test]
    fn nominatim_place_area_ids() {
        let rel = NominatimPlace {
            osm_type: "relation".into(),
            osm_id: 34914,
            display_name: "Helsinki".into(),
            lat: "60.17".into(),
            lon: "24.94".into(),
            geojson: None,
        };
        assert_eq!(rel.overpass_area_id(), Some(3_600_034_914));

        let node = NominatimPlace {
            osm_type: "node".into(),
            osm_id: 1,
            display_name: "Somewhere".into(),
            lat: "0".into(),
            lon: "0".into(),
            geojson: None,
        };
        assert_eq!(node.overpass_area_id(), None);
    }

    #[test]
    fn nominatim_response_with_boundary_polygon() {
        let raw = r#"[{
            "place_id": 235794313,
            "osm_type": "relation",
            "osm_id": 34914,
            "lat": "60.1674881",
            "lon": "24.9427473",
            "display_name": "Helsinki, Uusimaa, Mainland Finland, Finland",
            "geojson": {
                "type": "Polygon",
                "coordinates": [[[24.8, 60.1], [25.2, 60.1], [25.2, 60.3], [24.8, 60.3], [24.8, 60.1]]]
            }
        }]"#;
        let places: Vec<NominatimPlace> =
            serde_json::from_str(raw).expect("places should deserialize");
        assert_eq!(places.len(), 1);

        let place = &places[0];
        assert_eq!(place.overpass_area_id(), Some(3_600_034_914));

        let boundary = place.boundary_geometry().expect("polygon boundary");
        assert!(feature_area_m2(&boundary) > 0.0);
    }

    #[test]
    fn query_covers_all_tag_sets() {
        let q = build_green_space_query(3_600_034_914);
        assert!(q.contains("area(3600034914)"));
        assert!(q.contains("park|garden|playground"));
        assert!(q.contains("forest|grass|recreation_ground"));
        assert!(q.contains("wood|scrub|heath"));
        assert!(q.ends_with("out geom;"));
    }
}
