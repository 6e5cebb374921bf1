#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Spatial building blocks for geotagged post analysis.
//!
//! - [`Crs`] names the coordinate reference systems we can read and
//!   provides pointwise transforms to and from WGS84.
//! - [`SpatialDataset`] tags a collection of records with a declared CRS
//!   and reprojects every geometry in it.
//! - [`load_zones`] reads zone polygons from a `GeoJSON` feature collection.
//! - [`ZoneIndex`] builds an R-tree over zone polygons and performs the
//!   point-in-zone left join.

pub mod crs;
pub mod dataset;
pub mod index;
pub mod projection;
pub mod zones;

pub use crs::Crs;
pub use dataset::{HasGeometry, SpatialDataset};
pub use index::{Joined, ZoneIndex};
pub use zones::{Zone, load_zones};

use thiserror::Error;

/// Errors that can occur during spatial operations.
#[derive(Debug, Error)]
pub enum SpatialError {
    /// The dataset carries no coordinate reference system.
    #[error("Dataset has no declared coordinate reference system")]
    UndeclaredCrs,

    /// The coordinate reference system is not in the supported catalogue.
    #[error("Unsupported coordinate reference system: {crs}")]
    UnsupportedCrs {
        /// The CRS identifier as given.
        crs: String,
    },

    /// The dataset is declared in a different CRS than the operation needs.
    #[error("Expected CRS {expected}, found {found}")]
    CrsMismatch {
        /// CRS the operation requires.
        expected: Crs,
        /// CRS the dataset declares.
        found: Crs,
    },

    /// A geometry is missing, of the wrong type, or not finite.
    #[error("Invalid geometry at index {index}: {reason}")]
    InvalidGeometry {
        /// Position of the offending record.
        index: usize,
        /// What was wrong with it.
        reason: String,
    },

    /// A zone feature lacks its code property.
    #[error("Feature {index} has no '{property}' property")]
    MissingProperty {
        /// Position of the offending feature.
        index: usize,
        /// The property that was required.
        property: String,
    },

    /// The `GeoJSON` document is not a feature collection.
    #[error("Expected a GeoJSON FeatureCollection")]
    NotFeatureCollection,

    /// `GeoJSON` parsing failed.
    #[error("GeoJSON error: {0}")]
    GeoJson(#[from] geojson::Error),
}
