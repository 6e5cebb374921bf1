//! Catalogue of supported coordinate reference systems.
//!
//! Geographic datums whose offset from WGS84 is below two metres (GDA94,
//! GDA2020, NAD83, ETRS89) are treated as coincident with it, so their
//! transforms are the identity. Projected systems are Web Mercator and
//! the UTM/MGA Transverse Mercator grids.

use std::str::FromStr;

use geo::Coord;

use crate::SpatialError;
use crate::projection::{Ellipsoid, TransverseMercator, web_mercator};

/// A coordinate reference system.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Crs {
    /// WGS84 longitude/latitude, EPSG:4326.
    Wgs84,
    /// A geographic datum treated as coincident with WGS84.
    Geographic {
        /// EPSG code.
        epsg: u32,
    },
    /// Spherical Web Mercator.
    WebMercator {
        /// EPSG code.
        epsg: u32,
    },
    /// A Transverse Mercator grid zone.
    TransverseMercator {
        /// EPSG code.
        epsg: u32,
        /// Grid parameters.
        projection: TransverseMercator,
    },
}

impl Crs {
    /// Looks up a CRS by EPSG code.
    ///
    /// # Errors
    ///
    /// Returns [`SpatialError::UnsupportedCrs`] if the code is not in the
    /// catalogue.
    pub fn from_epsg(epsg: u32) -> Result<Self, SpatialError> {
        let utm = |ellipsoid, zone: u32, south| {
            let zone = u8::try_from(zone).unwrap_or(u8::MAX);
            Self::TransverseMercator {
                epsg,
                projection: TransverseMercator::utm(ellipsoid, zone, south),
            }
        };

        Ok(match epsg {
            4326 => Self::Wgs84,
            4283 | 7844 | 4269 | 4258 => Self::Geographic { epsg },
            3857 | 3785 | 900_913 => Self::WebMercator { epsg },
            32601..=32660 => utm(Ellipsoid::WGS84, epsg - 32600, false),
            32701..=32760 => utm(Ellipsoid::WGS84, epsg - 32700, true),
            // GDA94 / MGA zones 48-58
            28348..=28358 => utm(Ellipsoid::GRS80, epsg - 28300, true),
            // GDA2020 / MGA zones 46-59
            7846..=7859 => utm(Ellipsoid::GRS80, epsg - 7800, true),
            // NAD83 / UTM zones 1N-23N
            26901..=26923 => utm(Ellipsoid::GRS80, epsg - 26900, false),
            _ => {
                return Err(SpatialError::UnsupportedCrs {
                    crs: format!("EPSG:{epsg}"),
                });
            }
        })
    }

    /// The EPSG code of this CRS.
    #[must_use]
    pub const fn epsg(&self) -> u32 {
        match self {
            Self::Wgs84 => 4326,
            Self::Geographic { epsg }
            | Self::WebMercator { epsg }
            | Self::TransverseMercator { epsg, .. } => *epsg,
        }
    }

    /// Converts a coordinate in this CRS to WGS84 longitude/latitude.
    #[must_use]
    pub fn to_wgs84(&self, c: Coord<f64>) -> Coord<f64> {
        match self {
            Self::Wgs84 | Self::Geographic { .. } => c,
            Self::WebMercator { .. } => web_mercator::inverse(c),
            Self::TransverseMercator { projection, .. } => projection.inverse(c),
        }
    }

    /// Converts a WGS84 longitude/latitude coordinate into this CRS.
    #[must_use]
    pub fn from_wgs84(&self, c: Coord<f64>) -> Coord<f64> {
        match self {
            Self::Wgs84 | Self::Geographic { .. } => c,
            Self::WebMercator { .. } => web_mercator::forward(c),
            Self::TransverseMercator { projection, .. } => projection.forward(c),
        }
    }
}

impl std::fmt::Display for Crs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "EPSG:{}", self.epsg())
    }
}

impl FromStr for Crs {
    type Err = SpatialError;

    /// Parses `EPSG:4326`, `epsg:28356`, `+init=epsg:4326`,
    /// `urn:ogc:def:crs:EPSG::4326`, `OGC:CRS84` and bare codes.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_uppercase();
        let unsupported = || SpatialError::UnsupportedCrs { crs: s.to_string() };

        if normalized == "WGS84" || normalized.ends_with("CRS84") {
            return Ok(Self::Wgs84);
        }

        let name = normalized.strip_prefix("+INIT=").unwrap_or(&normalized);
        let code = name
            .strip_prefix("EPSG:")
            .or_else(|| {
                name.strip_prefix("URN:OGC:DEF:CRS:EPSG:")
                    .and_then(|rest| rest.rsplit(':').next())
            })
            .unwrap_or(name);

        code.parse::<u32>()
            .map_err(|_| unsupported())
            .and_then(Self::from_epsg)
    }
}
