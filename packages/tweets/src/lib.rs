#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Analysis routines for geotagged posts.
//!
//! Data flows one way: a CSV is read into a [`PostFrame`](geotweets_tweets_models::PostFrame)
//! ([`ingest`]), posts are turned into points ([`geometrize`]), text is
//! scanned for patterns ([`frequency`]), per-user activity is summarised
//! ([`summary`]), and finally [`pipeline`] filters users by activity, joins
//! their posts to zones, derives calendar fields ([`time`]) and infers a
//! home zone per user ([`home`]).

pub mod frequency;
pub mod geometrize;
pub mod home;
pub mod ingest;
pub mod pipeline;
pub mod summary;
pub mod time;

pub use frequency::{FrequencyOptions, find_frequencies};
pub use geometrize::{GeoPost, geometrize};
pub use home::{HomeAssigner, NightHomeAssigner};
pub use pipeline::{EnrichedPost, filter_and_home_assign};
pub use summary::summary_stats;

use geotweets_spatial::SpatialError;
use geotweets_tweets_models::{Column, MissingColumnError};
use thiserror::Error;

/// Errors that can occur while analysing posts.
#[derive(Debug, Error)]
pub enum TweetsError {
    /// A required column is not in the table.
    #[error("{0}")]
    MissingColumn(#[from] MissingColumnError),

    /// A required cell is empty.
    #[error("Row {row} has no value for '{column}'")]
    MissingValue {
        /// The empty column.
        column: Column,
        /// Zero-based row position.
        row: usize,
    },

    /// A cell could not be parsed into its column's type.
    #[error("Row {row} has invalid '{column}' value '{value}'")]
    InvalidValue {
        /// The offending column.
        column: Column,
        /// Zero-based row position.
        row: usize,
        /// The raw cell text.
        value: String,
    },

    /// A post cannot be turned into a point.
    #[error("Row {row} has no valid point (lon {lon:?}, lat {lat:?})")]
    InvalidGeometry {
        /// Zero-based row position.
        row: usize,
        /// Longitude as loaded.
        lon: Option<f64>,
        /// Latitude as loaded.
        lat: Option<f64>,
    },

    /// A frequency ratio was requested over zero texts.
    #[error("Cannot compute a frequency ratio over zero texts")]
    DivisionByZero,

    /// The search pattern is not a valid regular expression.
    #[error("Invalid pattern: {0}")]
    InvalidPattern(#[from] regex::Error),

    /// Post-count bounds that cannot retain any user.
    #[error("Invalid post-count bounds: lower {lower} must be below upper {upper}")]
    InvalidBounds {
        /// Inclusive lower bound.
        lower: usize,
        /// Exclusive upper bound.
        upper: usize,
    },

    /// A `created_at` value outside the representable date range.
    #[error("Row {row} has out-of-range created_at {created_at}")]
    InvalidTimestamp {
        /// Zero-based row position.
        row: usize,
        /// Milliseconds since the epoch.
        created_at: i64,
    },

    /// A UTC offset outside +/-23 hours.
    #[error("Invalid UTC offset: {hours} hours")]
    InvalidUtcOffset {
        /// The configured offset.
        hours: i32,
    },

    /// A home assigner returned the wrong number of values.
    #[error("Home assignment returned {found} values for {expected} posts")]
    HomeAssignment {
        /// Number of posts given.
        expected: usize,
        /// Number of values returned.
        found: usize,
    },

    /// CSV reading failed.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// An I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A spatial operation failed.
    #[error("Spatial error: {0}")]
    Spatial(#[from] SpatialError),
}
