//! TOML configuration for an analysis run.
//!
//! Every section has defaults, so an empty file is a valid config:
//!
//! ```toml
//! [columns]
//! u_id = "user_id"
//!
//! [zones]
//! code_property = "SA2_MAIN16"
//!
//! [bounds]
//! lower = 2
//! upper = 500
//!
//! [home]
//! night_start_hour = 20
//! ```

use serde::{Deserialize, Serialize};

use crate::Column;

/// Top-level analysis configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AnalysisConfig {
    /// CSV header names.
    pub columns: ColumnNames,
    /// Zone layer settings.
    pub zones: ZoneConfig,
    /// Per-user post-count bounds for the home pipeline.
    pub bounds: PostCountBounds,
    /// Time derivation settings.
    pub time: TimeConfig,
    /// Home inference rule.
    pub home: HomeRuleConfig,
}

/// Header names used to locate each [`Column`] in a CSV file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnNames {
    pub u_id: String,
    pub lat: String,
    pub lon: String,
    pub created_at: String,
    pub text: String,
}

impl Default for ColumnNames {
    fn default() -> Self {
        Self {
            u_id: Column::UId.to_string(),
            lat: Column::Lat.to_string(),
            lon: Column::Lon.to_string(),
            created_at: Column::CreatedAt.to_string(),
            text: Column::Text.to_string(),
        }
    }
}

impl ColumnNames {
    /// Returns the header name configured for `column`.
    #[must_use]
    pub fn name(&self, column: Column) -> &str {
        match column {
            Column::UId => &self.u_id,
            Column::Lat => &self.lat,
            Column::Lon => &self.lon,
            Column::CreatedAt => &self.created_at,
            Column::Text => &self.text,
        }
    }
}

/// Zone layer settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ZoneConfig {
    /// Feature property holding the zone code.
    pub code_property: String,
    /// CRS to assume when the zone file declares none (e.g. `"EPSG:28356"`).
    pub crs: Option<String>,
}

impl Default for ZoneConfig {
    fn default() -> Self {
        Self {
            code_property: "SA2_MAIN16".to_string(),
            crs: None,
        }
    }
}

/// Inclusive-lower, exclusive-upper bounds on posts per user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PostCountBounds {
    pub lower: usize,
    pub upper: usize,
}

impl Default for PostCountBounds {
    fn default() -> Self {
        Self {
            lower: 2,
            upper: 1000,
        }
    }
}

impl PostCountBounds {
    #[must_use]
    pub const fn new(lower: usize, upper: usize) -> Self {
        Self { lower, upper }
    }

    /// Whether a user with `count` posts is retained.
    #[must_use]
    pub const fn contains(&self, count: usize) -> bool {
        count >= self.lower && count < self.upper
    }

    /// Whether the bounds can retain anyone at all.
    #[must_use]
    pub const fn is_valid(&self) -> bool {
        self.lower < self.upper
    }
}

/// How calendar fields are derived from `created_at`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeConfig {
    /// Fixed offset from UTC, in whole hours, applied before taking the
    /// date and hour.
    pub utc_offset_hours: i32,
}

/// Night-time home inference parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HomeRuleConfig {
    /// First hour (0-23) counted as night.
    pub night_start_hour: u32,
    /// First hour (0-23) no longer counted as night.
    pub night_end_hour: u32,
    /// Minimum distinct nights in a zone before it can be a home.
    pub min_nights: usize,
}

impl Default for HomeRuleConfig {
    fn default() -> Self {
        Self {
            night_start_hour: 19,
            night_end_hour: 8,
            min_nights: 1,
        }
    }
}

impl HomeRuleConfig {
    /// Whether `hour` falls in the night window. A window whose start is
    /// after its end wraps past midnight.
    #[must_use]
    pub const fn is_night(&self, hour: u32) -> bool {
        if self.night_start_hour <= self.night_end_hour {
            hour >= self.night_start_hour && hour < self.night_end_hour
        } else {
            hour >= self.night_start_hour || hour < self.night_end_hour
        }
    }
}
