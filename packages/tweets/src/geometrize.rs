//! Turns posts into WGS84 points.

use geo::Point;
use geotweets_spatial::{Crs, HasGeometry, SpatialDataset};
use geotweets_tweets_models::{Column, Post, PostFrame};

use crate::TweetsError;

/// A post with its point geometry.
#[derive(Debug, Clone, PartialEq)]
pub struct GeoPost {
    pub post: Post,
    /// `(lon, lat)` of the post.
    pub geometry: Point<f64>,
}

impl HasGeometry for GeoPost {
    type Geometry = Point<f64>;

    fn geometry_mut(&mut self) -> &mut Self::Geometry {
        &mut self.geometry
    }
}

/// Builds a point from each post's `(lon, lat)` and tags the result as
/// WGS84 (EPSG:4326).
///
/// # Errors
///
/// * [`TweetsError::MissingColumn`] if `lat` or `lon` is not a column
/// * [`TweetsError::InvalidGeometry`] if a post has an empty or non-finite
///   coordinate
pub fn geometrize(frame: PostFrame) -> Result<SpatialDataset<GeoPost>, TweetsError> {
    frame.require(&[Column::Lon, Column::Lat])?;

    let records = frame
        .into_posts()
        .into_iter()
        .enumerate()
        .map(|(row, post)| match (post.lon, post.lat) {
            (Some(lon), Some(lat)) if lon.is_finite() && lat.is_finite() => Ok(GeoPost {
                geometry: Point::new(lon, lat),
                post,
            }),
            (lon, lat) => Err(TweetsError::InvalidGeometry { row, lon, lat }),
        })
        .collect::<Result<Vec<_>, _>>()?;

    log::debug!("Geometrized {} posts", records.len());

    Ok(SpatialDataset::new(Crs::Wgs84, records))
}
