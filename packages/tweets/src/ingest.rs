//! Reads posts from CSV into a [`PostFrame`].
//!
//! Header names are resolved through [`ColumnNames`], so exports with
//! different naming (`user_id`, `latitude`, ...) load without renaming.
//! Columns missing from the header are left undeclared on the frame;
//! empty cells load as `None`.

use std::io::Read;
use std::path::Path;

use geotweets_tweets_models::config::ColumnNames;
use geotweets_tweets_models::{Column, Post, PostFrame};

use crate::TweetsError;

/// Reads a headed CSV of posts from any reader.
///
/// # Errors
///
/// * [`TweetsError::Csv`] if the CSV is malformed
/// * [`TweetsError::InvalidValue`] if a `lat`, `lon` or `created_at` cell
///   is not numeric
pub fn read_posts(reader: impl Read, names: &ColumnNames) -> Result<PostFrame, TweetsError> {
    let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(reader);

    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.trim().to_owned())
        .collect();

    let positions: Vec<(Column, usize)> = Column::all()
        .iter()
        .filter_map(|&column| {
            let name = names.name(column);
            let position = headers.iter().position(|h| h == name);
            if position.is_none() {
                log::debug!("CSV has no '{name}' header, {column} will be undeclared");
            }
            position.map(|p| (column, p))
        })
        .collect();

    let mut posts = Vec::new();

    for (row, result) in reader.records().enumerate() {
        let record = result?;
        let mut post = Post::default();

        for &(column, position) in &positions {
            let Some(value) = record
                .get(position)
                .map(str::trim)
                .filter(|v| !v.is_empty())
            else {
                continue;
            };

            match column {
                Column::UId => post.u_id = Some(value.to_owned()),
                Column::Text => post.text = Some(value.to_owned()),
                Column::Lat => post.lat = Some(parse_cell(value, column, row)?),
                Column::Lon => post.lon = Some(parse_cell(value, column, row)?),
                Column::CreatedAt => post.created_at = Some(parse_millis(value, row)?),
            }
        }

        posts.push(post);
    }

    log::info!(
        "Read {} posts with columns [{}]",
        posts.len(),
        positions
            .iter()
            .map(|(c, _)| c.to_string())
            .collect::<Vec<_>>()
            .join(", ")
    );

    Ok(PostFrame::with_columns(
        positions.into_iter().map(|(c, _)| c),
        posts,
    ))
}

/// Reads a headed CSV of posts from a file.
///
/// # Errors
///
/// See [`read_posts`]; also [`TweetsError::Io`] if the file cannot be opened.
pub fn read_posts_path(
    path: impl AsRef<Path>,
    names: &ColumnNames,
) -> Result<PostFrame, TweetsError> {
    let path = path.as_ref();
    log::debug!("Reading posts from {}", path.display());
    let file = std::fs::File::open(path)?;
    read_posts(std::io::BufReader::new(file), names)
}

fn parse_cell<T: std::str::FromStr>(
    value: &str,
    column: Column,
    row: usize,
) -> Result<T, TweetsError> {
    value.parse().map_err(|_| TweetsError::InvalidValue {
        column,
        row,
        value: value.to_owned(),
    })
}

/// Parses `created_at` milliseconds. Integral floats such as
/// `1500000000000.0` are accepted, since exports of a column with gaps
/// often write every value as a float.
#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
fn parse_millis(value: &str, row: usize) -> Result<i64, TweetsError> {
    if let Ok(millis) = value.parse::<i64>() {
        return Ok(millis);
    }

    let float: f64 = parse_cell(value, Column::CreatedAt, row)?;
    if float.is_finite()
        && float.fract() == 0.0
        && float >= i64::MIN as f64
        && float < i64::MAX as f64
    {
        Ok(float as i64)
    } else {
        Err(TweetsError::InvalidValue {
            column: Column::CreatedAt,
            row,
            value: value.to_owned(),
        })
    }
}
