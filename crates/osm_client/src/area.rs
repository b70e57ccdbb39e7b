//! Geometry area math.
//!
//! The upstream data is WGS84 lon/lat; areas are computed geodesically on
//! the ellipsoid rather than by reprojecting to a planar reference, which
//! gives equal-area-quality results everywhere on the globe.

use common::round2;
use geo::{GeodesicArea, Geometry};

/// Unsigned area of one feature geometry in m².
///
/// Points and lines contribute zero; they still count toward the feature
/// total.
pub fn feature_area_m2(geometry: &Geometry<f64>) -> f64 {
    match geometry {
        Geometry::Polygon(p) => p.geodesic_area_unsigned(),
        Geometry::MultiPolygon(mp) => mp.geodesic_area_unsigned(),
        _ => 0.0,
    }
}

/// Sum per-feature areas (m²) into a km² total, rounded to 2 decimals.
pub fn total_area_km2(areas_m2: impl IntoIterator<Item = f64>) -> f64 {
    round2(areas_m2.into_iter().sum::<f64>() / 1_000_000.0)
}
