//! Zone polygon layers loaded from `GeoJSON`.

use geo::MultiPolygon;
use geojson::{FeatureCollection, GeoJson};

use crate::{Crs, HasGeometry, SpatialDataset, SpatialError};

/// A zone polygon with its code and the rest of its feature properties.
#[derive(Debug, Clone, PartialEq)]
pub struct Zone {
    /// Zone identifier (e.g. an SA2 code).
    pub code: String,
    pub properties: serde_json::Map<String, serde_json::Value>,
    pub geometry: MultiPolygon<f64>,
}

impl HasGeometry for Zone {
    type Geometry = MultiPolygon<f64>;

    fn geometry_mut(&mut self) -> &mut Self::Geometry {
        &mut self.geometry
    }
}

/// Parses a `GeoJSON` `FeatureCollection` of Polygon/MultiPolygon features
/// into a zone layer.
///
/// The layer CRS comes from the legacy top-level `crs` member when present,
/// otherwise `fallback_crs`, otherwise WGS84 as RFC 7946 prescribes.
///
/// # Errors
///
/// * [`SpatialError::GeoJson`] if the document does not parse
/// * [`SpatialError::NotFeatureCollection`] for any other `GeoJSON` type
/// * [`SpatialError::UnsupportedCrs`] if the declared CRS is unknown
/// * [`SpatialError::MissingProperty`] if a feature has no `code_property`
/// * [`SpatialError::InvalidGeometry`] if a feature has no polygon geometry
pub fn load_zones(
    document: &str,
    code_property: &str,
    fallback_crs: Option<Crs>,
) -> Result<SpatialDataset<Zone>, SpatialError> {
    let GeoJson::FeatureCollection(collection) = document.parse::<GeoJson>()? else {
        return Err(SpatialError::NotFeatureCollection);
    };

    let crs = match declared_crs(&collection) {
        Some(name) => name.parse::<Crs>()?,
        None => fallback_crs.unwrap_or(Crs::Wgs84),
    };

    let mut zones = Vec::with_capacity(collection.features.len());

    for (index, feature) in collection.features.into_iter().enumerate() {
        let code = match feature.property(code_property) {
            Some(serde_json::Value::String(s)) => s.clone(),
            Some(serde_json::Value::Number(n)) => n.to_string(),
            _ => {
                return Err(SpatialError::MissingProperty {
                    index,
                    property: code_property.to_string(),
                });
            }
        };

        let Some(geometry) = feature.geometry else {
            return Err(SpatialError::InvalidGeometry {
                index,
                reason: format!("zone {code} has no geometry"),
            });
        };

        let geometry = match geo::Geometry::<f64>::try_from(geometry) {
            Ok(geo::Geometry::MultiPolygon(mp)) => mp,
            Ok(geo::Geometry::Polygon(p)) => MultiPolygon(vec![p]),
            Ok(_) => {
                return Err(SpatialError::InvalidGeometry {
                    index,
                    reason: format!("zone {code} is not a polygon"),
                });
            }
            Err(e) => {
                return Err(SpatialError::InvalidGeometry {
                    index,
                    reason: format!("zone {code}: {e}"),
                });
            }
        };

        zones.push(Zone {
            code,
            properties: feature.properties.unwrap_or_default(),
            geometry,
        });
    }

    log::info!("Loaded {} zones ({crs})", zones.len());

    Ok(SpatialDataset::new(crs, zones))
}

/// Reads `crs.properties.name` from the collection's foreign members.
fn declared_crs(collection: &FeatureCollection) -> Option<&str> {
    collection
        .foreign_members
        .as_ref()?
        .get("crs")?
        .get("properties")?
        .get("name")?
        .as_str()
}
