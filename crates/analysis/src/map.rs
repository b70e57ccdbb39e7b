//! Interactive map rendering.
//!
//! Builds a self-contained Leaflet page and wraps it in an iframe
//! `srcdoc` so callers can embed it as a plain HTML fragment. An empty
//! or absent feature collection always yields the default world view
//! rather than no map.

use common::GreenSpaceCollection;
use geo::{Centroid, GeometryCollection, Point};
use geojson::{Feature, FeatureCollection, JsonObject};
use serde_json::json;

/// Feature fill color.
const FILL_COLOR: &str = "#2a9d8f";
/// Feature stroke color.
const STROKE_COLOR: &str = "#264653";
/// Zoom used when centering on a city.
const CITY_ZOOM: u8 = 11;
/// Zoom for the empty-data world view.
const WORLD_ZOOM: u8 = 2;

/// Render the map fragment for a (possibly absent) feature collection.
pub fn render_map(collection: Option<&GreenSpaceCollection>) -> String {
    let collection = match collection {
        Some(c) if !c.is_empty() => c,
        _ => return world_map(),
    };

    match collection_centroid(collection) {
        Some(center) => {
            let overlay = to_feature_collection(collection);
            leaflet_fragment(center.y(), center.x(), CITY_ZOOM, Some(&overlay))
        }
        None => world_map(),
    }
}

/// The default world-view map.
pub fn world_map() -> String {
    leaflet_fragment(0.0, 0.0, WORLD_ZOOM, None)
}

/// Centroid of all feature geometries combined.
pub fn collection_centroid(collection: &GreenSpaceCollection) -> Option<Point<f64>> {
    let all = GeometryCollection::from_iter(
        collection.features.iter().map(|f| f.geometry.clone()),
    );
    all.centroid()
}

/// Convert the features to GeoJSON for the Leaflet overlay.
fn to_feature_collection(collection: &GreenSpaceCollection) -> FeatureCollection {
    let features = collection
        .features
        .iter()
        .map(|f| {
            let mut properties = JsonObject::new();
            if let Some(name) = &f.name {
                properties.insert("name".into(), json!(name));
            }
            properties.insert("category".into(), json!(f.category));

            Feature {
                bbox: None,
                geometry: Some(geojson::Geometry::new(geojson::Value::from(&f.geometry))),
                id: None,
                properties: Some(properties),
                foreign_members: None,
            }
        })
        .collect();

    FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    }
}

fn leaflet_fragment(lat: f64, lon: f64, zoom: u8, overlay: Option<&FeatureCollection>) -> String {
    let overlay_script = match overlay {
        Some(fc) => format!(
            "L.geoJSON({}, {{style: function() {{ return {{fillColor: \"{}\", color: \"{}\", weight: 1, fillOpacity: 0.6}}; }}}}).addTo(map);",
            geojson::GeoJson::from(fc.clone()),
            FILL_COLOR,
            STROKE_COLOR
        ),
        None => String::new(),
    };

    let page = format!(
        r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8"/>
<link rel="stylesheet" href="https://unpkg.com/leaflet@1.9.4/dist/leaflet.css"/>
<script src="https://unpkg.com/leaflet@1.9.4/dist/leaflet.js"></script>
<style>html, body, #map {{ margin: 0; height: 100%; width: 100%; }}</style>
</head>
<body>
<div id="map"></div>
<script>
var map = L.map("map").setView([{lat}, {lon}], {zoom});
L.tileLayer("https://tile.openstreetmap.org/{{z}}/{{x}}/{{y}}.png", {{
    maxZoom: 19,
    attribution: "&copy; OpenStreetMap contributors"
}}).addTo(map);
{overlay_script}
</script>
</body>
</html>"#
    );

    format!(
        "<iframe srcdoc=\"{}\" style=\"width:100%;height:480px;border:none;\" loading=\"lazy\"></iframe>",
        escape_attr(&page)
    )
}

/// Escape for embedding inside a double-quoted HTML attribute.
fn escape_attr(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('"', "&quot;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::GreenFeature;
    use geo::{polygon, Geometry};

    fn square_collection() -> GreenSpaceCollection {
        let square = polygon![
            (x: 24.955, y: 60.155),
            (x: 24.960, y: 60.155),
            (x: 24.960, y: 60.158),
            (x: 24.955, y: 60.158),
            (x: 24.955, y: 60.155),
        ];
        GreenSpaceCollection {
            features: vec![GreenFeature {
                name: Some("Kaivopuisto".into()),
                category: "park".into(),
                geometry: Geometry::Polygon(square),
            }],
        }
    }

    #[test]
    fn empty_collection_renders_world_view() {
        let html = render_map(None);
        assert!(html.contains("setView([0, 0], 2)"));

        let also_empty = render_map(Some(&GreenSpaceCollection::default()));
        assert!(also_empty.contains("setView([0, 0], 2)"));
    }

    #[test]
    fn features_render_at_city_zoom_with_fixed_style() {
        let html = render_map(Some(&square_collection()));
        assert!(html.contains("], 11)"));
        assert!(html.contains("#2a9d8f"));
        assert!(html.contains("#264653"));
        assert!(html.contains("FeatureCollection"));
        assert!(html.contains("Kaivopuisto"));
    }

    #[test]
    fn centroid_falls_inside_the_square() {
        let center = collection_centroid(&square_collection()).expect("centroid exists");
        assert!(center.x() > 24.955 && center.x() < 24.960);
        assert!(center.y() > 60.155 && center.y() < 60.158);
    }

    #[test]
    fn fragment_is_iframe_wrapped() {
        let html = render_map(None);
        assert!(html.starts_with("<iframe srcdoc=\""));
        assert!(html.ends_with("</iframe>"));
        // Inner markup must be escaped to survive the attribute.
        assert!(html.contains("&lt;!DOCTYPE html&gt;"));
        assert!(html.contains("&quot;map&quot;"));
    }
}
