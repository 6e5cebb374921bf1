//! Activity filtering, zone join and home assignment in one pass.

use std::collections::BTreeSet;

use chrono::{NaiveDate, NaiveDateTime};
use geo::Point;
use geotweets_spatial::{SpatialDataset, Zone, ZoneIndex};
use geotweets_tweets_models::{
    Column, Post, PostFrame,
    config::{PostCountBounds, TimeConfig},
};

use crate::{
    TweetsError,
    geometrize::{GeoPost, geometrize},
    home::{self, HomeAssigner},
    time::{post_time, utc_offset},
};

/// A post after the zone join, with its calendar fields and home flags.
#[derive(Debug, Clone, PartialEq)]
pub struct EnrichedPost {
    pub post: Post,
    pub geometry: Point<f64>,
    /// Index into the zone layer the post was joined against.
    pub zone: Option<usize>,
    pub zone_code: Option<String>,
    pub timestamp: NaiveDateTime,
    pub date: NaiveDate,
    pub hour: u32,
    /// The user's inferred home zone code.
    pub home: Option<String>,
    /// `true` only when both `zone_code` and `home` are known and equal.
    pub is_home: bool,
}

/// Keeps users whose post count falls within `bounds`, joins their posts to
/// `zones`, derives the calendar fields and assigns homes with `assigner`.
///
/// A post inside several overlapping zones appears once per zone. A post
/// outside every zone is kept once with no zone.
///
/// # Errors
///
/// * [`TweetsError::InvalidBounds`] if `bounds` cannot retain any user
/// * [`TweetsError::MissingColumn`] if `u_id`, `created_at`, `lat` or `lon`
///   is not a column
/// * [`TweetsError::Spatial`] if `zones` is not in WGS84
/// * [`TweetsError::InvalidUtcOffset`] for an out-of-range offset
/// * [`TweetsError::InvalidGeometry`] if a retained post has no valid point
/// * [`TweetsError::MissingValue`] or [`TweetsError::InvalidTimestamp`] if
///   a retained post has no usable `created_at`
/// * [`TweetsError::HomeAssignment`] if `assigner` returns the wrong number
///   of values
///
/// Row numbers in errors are positions in `frame`.
pub fn filter_and_home_assign(
    frame: PostFrame,
    zones: &SpatialDataset<Zone>,
    bounds: PostCountBounds,
    time: TimeConfig,
    assigner: &dyn HomeAssigner,
) -> Result<Vec<EnrichedPost>, TweetsError> {
    if !bounds.is_valid() {
        return Err(TweetsError::InvalidBounds {
            lower: bounds.lower,
            upper: bounds.upper,
        });
    }

    frame.require(&[Column::UId, Column::CreatedAt, Column::Lat, Column::Lon])?;
    let index = ZoneIndex::new(zones)?;
    let offset = utc_offset(time.utc_offset_hours)?;

    let retained: BTreeSet<String> = frame
        .posts_per_user()?
        .into_iter()
        .filter(|(_, count)| bounds.contains(*count))
        .map(|(u_id, _)| u_id.to_string())
        .collect();

    let keep = |post: &Post| {
        post.u_id
            .as_deref()
            .is_some_and(|u_id| retained.contains(u_id))
    };

    // Input row of each retained post, so errors point at the source line.
    let rows: Vec<usize> = frame
        .posts()
        .iter()
        .enumerate()
        .filter(|(_, post)| keep(*post))
        .map(|(row, _)| row)
        .collect();

    let total_posts = frame.len();
    let frame = frame.filter(keep);

    log::info!(
        "Retained {} users with {} of {total_posts} posts (bounds {}..{})",
        retained.len(),
        frame.len(),
        bounds.lower,
        bounds.upper
    );

    let points = geometrize(frame)
        .map_err(|e| match e {
            TweetsError::InvalidGeometry { row, lon, lat } => TweetsError::InvalidGeometry {
                row: rows[row],
                lon,
                lat,
            },
            e => e,
        })?
        .into_records();
    let points: Vec<(usize, GeoPost)> = rows.iter().copied().zip(points).collect();
    let joined = index.left_join(points, |(_, p)| p.geometry);

    let mut enriched = Vec::with_capacity(joined.len());
    for row_join in joined {
        let (row, geo_post) = row_join.record;
        let post = geo_post.post;
        let created_at = post.created_at.ok_or(TweetsError::MissingValue {
            column: Column::CreatedAt,
            row,
        })?;
        let time = post_time(created_at, offset)
            .ok_or(TweetsError::InvalidTimestamp { row, created_at })?;

        enriched.push(EnrichedPost {
            post,
            geometry: geo_post.geometry,
            zone: row_join.zone,
            zone_code: row_join
                .zone
                .and_then(|i| index.zone(i))
                .map(|zone| zone.code.clone()),
            timestamp: time.timestamp,
            date: time.date,
            hour: time.hour,
            home: None,
            is_home: false,
        });
    }

    let homes = assigner.assign(&enriched);
    if homes.len() != enriched.len() {
        return Err(TweetsError::HomeAssignment {
            expected: enriched.len(),
            found: homes.len(),
        });
    }

    let mut at_home = 0usize;
    for (post, home) in enriched.iter_mut().zip(homes) {
        post.is_home = home::is_home(post.zone_code.as_deref(), home.as_deref());
        post.home = home;
        if post.is_home {
            at_home += 1;
        }
    }

    log::info!("{} enriched posts, {at_home} made at home", enriched.len());

    Ok(enriched)
}

#[cfg(test)]
mod tests {
    use geo::{MultiPolygon, polygon};
    use geotweets_spatial::Crs;
    use geotweets_tweets_models::config::HomeRuleConfig;

    use super::*;
    use crate::NightHomeAssigner;

    /// 2017-07-14 22:00:00 UTC.
    const NIGHT_MS: i64 = 1_500_069_600_000;
    /// 2017-07-14 12:00:00 UTC.
    const NOON_MS: i64 = 1_500_033_600_000;
    const DAY_MS: i64 = 86_400_000;

    fn square(code: &str, x0: f64, y0: f64, size: f64) -> Zone {
        Zone {
            code: code.to_string(),
            properties: serde_json::Map::new(),
            geometry: MultiPolygon(vec![polygon![
                (x: x0, y: y0),
                (x: x0 + size, y: y0),
                (x: x0 + size, y: y0 + size),
                (x: x0, y: y0 + size),
            ]]),
        }
    }

    fn zones() -> SpatialDataset<Zone> {
        SpatialDataset::new(
            Crs::Wgs84,
            vec![square("east", 0.0, 0.0, 1.0), square("west", -1.0, 0.0, 1.0)],
        )
    }

    fn run(frame: PostFrame, bounds: PostCountBounds) -> Result<Vec<EnrichedPost>, TweetsError> {
        filter_and_home_assign(
            frame,
            &zones(),
            bounds,
            TimeConfig::default(),
            &NightHomeAssigner::new(HomeRuleConfig::default()),
        )
    }

    fn posts_for(u_id: &str, n: usize) -> Vec<Post> {
        (0..n)
            .map(|i| {
                let day = i64::try_from(i).unwrap() * DAY_MS;
                Post::new(u_id, 0.5, 0.5, NIGHT_MS + day)
            })
            .collect()
    }

    #[test]
    fn keeps_users_within_bounds() {
        let mut posts = Vec::new();
        for (u_id, n) in [("one", 1), ("two", 2), ("three", 3), ("four", 4), ("five", 5)] {
            posts.extend(posts_for(u_id, n));
        }

        let enriched = run(PostFrame::new(posts), PostCountBounds::new(2, 5)).unwrap();

        let users: BTreeSet<&str> = enriched
            .iter()
            .filter_map(|p| p.post.u_id.as_deref())
            .collect();
        assert_eq!(users, BTreeSet::from(["two", "three", "four"]));
        assert_eq!(enriched.len(), 9);
    }

    #[test]
    fn joins_zones_and_flags_home_posts() {
        let posts = vec![
            Post::new("u", 0.5, 0.5, NIGHT_MS),
            Post::new("u", 0.5, 0.5, NIGHT_MS + DAY_MS),
            Post::new("u", -0.5, 0.5, NOON_MS),
            Post::new("u", 5.0, 5.0, NOON_MS),
        ];

        let enriched = run(PostFrame::new(posts), PostCountBounds::new(1, 10)).unwrap();
        assert_eq!(enriched.len(), 4);

        let codes: Vec<Option<&str>> = enriched.iter().map(|p| p.zone_code.as_deref()).collect();
        assert_eq!(codes, vec![Some("east"), Some("east"), Some("west"), None]);

        assert!(enriched.iter().all(|p| p.home.as_deref() == Some("east")));
        let flags: Vec<bool> = enriched.iter().map(|p| p.is_home).collect();
        assert_eq!(flags, vec![true, true, false, false]);

        assert_eq!(enriched[0].hour, 22);
        assert_eq!(enriched[2].hour, 12);
        assert_eq!(enriched[0].date, NaiveDate::from_ymd_opt(2017, 7, 14).unwrap());
    }

    #[test]
    fn no_home_means_never_at_home() {
        let posts = vec![
            Post::new("day", 0.5, 0.5, NOON_MS),
            Post::new("day", 0.5, 0.5, NOON_MS + DAY_MS),
        ];

        let enriched = run(PostFrame::new(posts), PostCountBounds::default()).unwrap();
        assert_eq!(enriched.len(), 2);
        assert!(enriched.iter().all(|p| p.home.is_none() && !p.is_home));
    }

    #[test]
    fn overlapping_zones_repeat_the_post() {
        let layer = SpatialDataset::new(
            Crs::Wgs84,
            vec![square("small", 0.0, 0.0, 1.0), square("big", 0.0, 0.0, 10.0)],
        );
        let frame = PostFrame::new(posts_for("u", 2));

        let enriched = filter_and_home_assign(
            frame,
            &layer,
            PostCountBounds::default(),
            TimeConfig::default(),
            &NightHomeAssigner::default(),
        )
        .unwrap();

        let codes: Vec<Option<&str>> = enriched.iter().map(|p| p.zone_code.as_deref()).collect();
        assert_eq!(codes, vec![Some("small"), Some("big"), Some("small"), Some("big")]);
    }

    #[test]
    fn rejects_projected_zone_layer() {
        let layer = SpatialDataset::new(
            "EPSG:28356".parse::<Crs>().unwrap(),
            vec![square("z", 0.0, 0.0, 1.0)],
        );
        let result = filter_and_home_assign(
            PostFrame::new(posts_for("u", 2)),
            &layer,
            PostCountBounds::default(),
            TimeConfig::default(),
            &NightHomeAssigner::default(),
        );
        assert!(matches!(result, Err(TweetsError::Spatial(_))));
    }

    #[test]
    fn requires_created_at_column() {
        let frame = PostFrame::with_columns([Column::UId, Column::Lat, Column::Lon], vec![]);
        assert!(matches!(
            run(frame, PostCountBounds::default()),
            Err(TweetsError::MissingColumn(e)) if e.column == Column::CreatedAt
        ));
    }

    #[test]
    fn errors_report_input_rows() {
        let mut undated = Post::new("u", 0.5, 0.5, NIGHT_MS);
        undated.created_at = None;
        let posts = vec![
            Post::new("dropped", 0.5, 0.5, NIGHT_MS),
            Post::new("u", 0.5, 0.5, NIGHT_MS),
            undated,
        ];
        assert!(matches!(
            run(PostFrame::new(posts), PostCountBounds::default()),
            Err(TweetsError::MissingValue {
                column: Column::CreatedAt,
                row: 2
            })
        ));

        let mut unplaced = Post::new("u", 0.5, 0.5, NIGHT_MS);
        unplaced.lat = None;
        let posts = vec![
            Post::new("dropped", 0.5, 0.5, NIGHT_MS),
            Post::new("u", 0.5, 0.5, NIGHT_MS),
            unplaced,
        ];
        assert!(matches!(
            run(PostFrame::new(posts), PostCountBounds::default()),
            Err(TweetsError::InvalidGeometry { row: 2, .. })
        ));
    }

    #[test]
    fn rejects_empty_bounds() {
        assert!(matches!(
            run(PostFrame::new(vec![]), PostCountBounds::new(5, 5)),
            Err(TweetsError::InvalidBounds { lower: 5, upper: 5 })
        ));
    }

    #[test]
    fn wrong_length_assignment_is_an_error() {
        struct Nothing;

        impl HomeAssigner for Nothing {
            fn assign(&self, _posts: &[EnrichedPost]) -> Vec<Option<String>> {
                Vec::new()
            }
        }

        let result = filter_and_home_assign(
            PostFrame::new(posts_for("u", 2)),
            &zones(),
            PostCountBounds::default(),
            TimeConfig::default(),
            &Nothing,
        );
        assert!(matches!(
            result,
            Err(TweetsError::HomeAssignment {
                expected: 2,
                found: 0
            })
        ));
    }
}
