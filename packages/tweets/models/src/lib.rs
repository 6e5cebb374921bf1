#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Post record and result types for geotagged post analysis.
//!
//! A [`PostFrame`] is the in-memory table every analysis step consumes:
//! the set of columns the source declared plus one [`Post`] per row.
//! Columns are tracked separately from values so that a column that was
//! never loaded can be told apart from a row with an empty cell.

pub mod config;

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// A named column of the post table.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Column {
    /// User identifier
    UId,
    /// Latitude (WGS84 degrees)
    Lat,
    /// Longitude (WGS84 degrees)
    Lon,
    /// Publication time in milliseconds since the Unix epoch
    CreatedAt,
    /// Free-text content
    Text,
}

impl Column {
    /// Returns all variants of this enum.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::UId, Self::Lat, Self::Lon, Self::CreatedAt, Self::Text]
    }
}

/// Error returned when an operation needs a column the table does not have.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MissingColumnError {
    /// The column that was required.
    pub column: Column,
}

impl std::fmt::Display for MissingColumnError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "missing required column '{}'", self.column)
    }
}

impl std::error::Error for MissingColumnError {}

/// A single geotagged post.
///
/// Every value is optional: a cell may be empty even when its column exists.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Post {
    /// User identifier.
    pub u_id: Option<String>,
    /// Latitude in degrees.
    pub lat: Option<f64>,
    /// Longitude in degrees.
    pub lon: Option<f64>,
    /// Milliseconds since the Unix epoch.
    pub created_at: Option<i64>,
    /// Post content.
    pub text: Option<String>,
}

impl Post {
    /// Creates a post with a user, location and timestamp but no text.
    #[must_use]
    pub fn new(u_id: impl Into<String>, lon: f64, lat: f64, created_at: i64) -> Self {
        Self {
            u_id: Some(u_id.into()),
            lat: Some(lat),
            lon: Some(lon),
            created_at: Some(created_at),
            text: None,
        }
    }

    /// Sets the post content.
    #[must_use]
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }
}

/// An in-memory table of posts with its declared columns.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PostFrame {
    columns: BTreeSet<Column>,
    posts: Vec<Post>,
}

impl PostFrame {
    /// Builds a frame that declares every [`Column`].
    #[must_use]
    pub fn new(posts: Vec<Post>) -> Self {
        Self {
            columns: Column::all().iter().copied().collect(),
            posts,
        }
    }

    /// Builds a frame declaring only the given columns.
    #[must_use]
    pub fn with_columns(columns: impl IntoIterator<Item = Column>, posts: Vec<Post>) -> Self {
        Self {
            columns: columns.into_iter().collect(),
            posts,
        }
    }

    #[must_use]
    pub const fn columns(&self) -> &BTreeSet<Column> {
        &self.columns
    }

    #[must_use]
    pub fn posts(&self) -> &[Post] {
        &self.posts
    }

    #[must_use]
    pub fn into_posts(self) -> Vec<Post> {
        self.posts
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.posts.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.posts.is_empty()
    }

    #[must_use]
    pub fn has(&self, column: Column) -> bool {
        self.columns.contains(&column)
    }

    /// Checks that every listed column is declared.
    ///
    /// # Errors
    ///
    /// Returns [`MissingColumnError`] naming the first absent column.
    pub fn require(&self, columns: &[Column]) -> Result<(), MissingColumnError> {
        columns
            .iter()
            .find(|c| !self.has(**c))
            .map_or(Ok(()), |&column| Err(MissingColumnError { column }))
    }

    /// Iterates the text column. Empty cells yield `None`.
    ///
    /// # Errors
    ///
    /// Returns [`MissingColumnError`] if the frame has no text column.
    pub fn texts(&self) -> Result<impl Iterator<Item = Option<&str>>, MissingColumnError> {
        self.require(&[Column::Text])?;
        Ok(self.posts.iter().map(|p| p.text.as_deref()))
    }

    /// Counts posts per user. Posts without a user are not grouped.
    ///
    /// # Errors
    ///
    /// Returns [`MissingColumnError`] if the frame has no user column.
    pub fn posts_per_user(&self) -> Result<BTreeMap<&str, usize>, MissingColumnError> {
        self.require(&[Column::UId])?;

        let mut counts = BTreeMap::new();
        for u_id in self.posts.iter().filter_map(|p| p.u_id.as_deref()) {
            *counts.entry(u_id).or_insert(0) += 1;
        }
        Ok(counts)
    }

    /// Keeps only the posts matching `predicate`, preserving the columns.
    #[must_use]
    pub fn filter(self, mut predicate: impl FnMut(&Post) -> bool) -> Self {
        Self {
            columns: self.columns,
            posts: self.posts.into_iter().filter(|p| predicate(p)).collect(),
        }
    }
}

/// Descriptive statistics over a post table.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryStats {
    /// Number of rows.
    pub total_posts: usize,
    /// Number of distinct users.
    pub unique_users: usize,
    /// Median of posts per user, `None` when there are no users.
    pub median_posts_per_user: Option<f64>,
    /// 99th percentile of posts per user, `None` when there are no users.
    pub p99_posts_per_user: Option<f64>,
}

impl std::fmt::Display for SummaryStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "{} total tweets", self.total_posts)?;
        writeln!(f, "{} unique users", self.unique_users)?;
        writeln!(f)?;
        write_quantile(f, "Median number of tweets/user", self.median_posts_per_user)?;
        write_quantile(
            f,
            "99th percentile of tweets/user",
            self.p99_posts_per_user,
        )
    }
}

fn write_quantile(
    f: &mut std::fmt::Formatter<'_>,
    label: &str,
    value: Option<f64>,
) -> std::fmt::Result {
    match value {
        Some(v) => writeln!(f, "{label}: {v} tweets"),
        None => writeln!(f, "{label}: n/a"),
    }
}

/// Result of counting pattern matches over a text column.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "type")]
pub enum Frequency {
    /// Raw `(matches, total)` pair.
    Counts {
        /// Number of texts containing a match.
        matches: usize,
        /// Number of texts inspected.
        total: usize,
    },
    /// `matches / total`.
    Ratio {
        /// The ratio in `[0, 1]`.
        value: f64,
    },
}

impl std::fmt::Display for Frequency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Counts { matches, total } => write!(f, "{matches} of {total} posts match"),
            Self::Ratio { value } => write!(f, "{value:.6}"),
        }
    }
}
