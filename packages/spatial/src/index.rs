//! In-memory R-tree over zone polygons.
//!
//! Built once per zone layer and used for the point-in-zone left join of
//! posts against zones.

use geo::{BoundingRect, Intersects, MultiPolygon, Point};
use rstar::{AABB, RTree, RTreeObject};

use crate::{Crs, SpatialDataset, SpatialError, Zone};

/// A zone's position in the layer plus its bounding box.
struct ZoneEntry {
    index: usize,
    envelope: AABB<[f64; 2]>,
}

impl RTreeObject for ZoneEntry {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        self.envelope
    }
}

/// A record from the left side of a join, paired with the matching zone.
#[derive(Debug, Clone, PartialEq)]
pub struct Joined<R> {
    pub record: R,
    /// Index into the zone layer, `None` when no zone intersects.
    pub zone: Option<usize>,
}

/// Pre-built spatial index over a WGS84 zone layer.
pub struct ZoneIndex<'a> {
    zones: &'a [Zone],
    tree: RTree<ZoneEntry>,
}

impl<'a> ZoneIndex<'a> {
    /// Builds the R-tree over `layer`.
    ///
    /// # Errors
    ///
    /// Returns [`SpatialError::UndeclaredCrs`] or
    /// [`SpatialError::CrsMismatch`] unless the layer is in WGS84.
    pub fn new(layer: &'a SpatialDataset<Zone>) -> Result<Self, SpatialError> {
        layer.require_crs(Crs::Wgs84)?;

        let zones = layer.records();
        let entries = zones
            .iter()
            .enumerate()
            .filter_map(|(index, zone)| {
                let envelope = compute_envelope(&zone.geometry);
                if envelope.is_none() {
                    log::warn!("Zone {} has an empty geometry, skipping", zone.code);
                }
                envelope.map(|envelope| ZoneEntry { index, envelope })
            })
            .collect();

        let tree = RTree::bulk_load(entries);
        log::info!("Indexed {} zones", tree.size());

        Ok(Self { zones, tree })
    }

    #[must_use]
    pub fn zone(&self, index: usize) -> Option<&'a Zone> {
        self.zones.get(index)
    }

    /// Indices of every zone intersecting `point`, ascending. Points on a
    /// shared boundary intersect both zones.
    #[must_use]
    pub fn intersecting(&self, point: Point<f64>) -> Vec<usize> {
        let query_env = AABB::from_point([point.x(), point.y()]);

        let mut hits: Vec<usize> = self
            .tree
            .locate_in_envelope_intersecting(&query_env)
            .filter(|entry| {
                self.zones[entry.index]
                    .geometry
                    .0
                    .iter()
                    .any(|polygon| polygon.intersects(&point.0))
            })
            .map(|entry| entry.index)
            .collect();

        hits.sort_unstable();
        hits
    }

    /// Left-joins `records` to the zones their point intersects.
    ///
    /// A record intersecting several zones is repeated once per zone; a
    /// record intersecting none is kept once with no zone. Output order
    /// follows the input order.
    #[must_use]
    pub fn left_join<R: Clone>(
        &self,
        records: Vec<R>,
        point_of: impl Fn(&R) -> Point<f64>,
    ) -> Vec<Joined<R>> {
        let mut joined = Vec::with_capacity(records.len());
        let mut unmatched = 0usize;
        let mut repeated = 0usize;

        for record in records {
            let hits = self.intersecting(point_of(&record));

            match hits.split_last() {
                None => {
                    unmatched += 1;
                    joined.push(Joined { record, zone: None });
                }
                Some((&last, rest)) => {
                    repeated += rest.len();
                    for &zone in rest {
                        joined.push(Joined {
                            record: record.clone(),
                            zone: Some(zone),
                        });
                    }
                    joined.push(Joined {
                        record,
                        zone: Some(last),
                    });
                }
            }
        }

        log::debug!(
            "Spatial join: {} rows, {unmatched} outside every zone, {repeated} extra rows from overlapping zones",
            joined.len()
        );

        joined
    }
}

/// Compute the bounding box envelope for a [`MultiPolygon`].
fn compute_envelope(mp: &MultiPolygon<f64>) -> Option<AABB<[f64; 2]>> {
    mp.bounding_rect()
        .map(|rect| AABB::from_corners([rect.min().x, rect.min().y], [rect.max().x, rect.max().y]))
}

#[cfg(test)]
mod tests {
    use geo::polygon;

    use super::*;

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

    fn layer() -> SpatialDataset<Zone> {
        SpatialDataset::new(
            Crs::Wgs84,
            vec![
                square("a", 0.0, 0.0, 1.0),
                square("b", 1.0, 0.0, 1.0),
                square("big", 0.0, 0.0, 10.0),
            ],
        )
    }

    #[test]
    fn finds_containing_zones() {
        let layer = layer();
        let index = ZoneIndex::new(&layer).unwrap();

        assert_eq!(index.intersecting(Point::new(0.5, 0.5)), vec![0, 2]);
        assert_eq!(index.intersecting(Point::new(5.0, 5.0)), vec![2]);
        assert!(index.intersecting(Point::new(-1.0, -1.0)).is_empty());
    }

    #[test]
    fn boundary_points_intersect_both_neighbours() {
        let layer = layer();
        let index = ZoneIndex::new(&layer).unwrap();
        assert_eq!(index.intersecting(Point::new(1.0, 0.5)), vec![0, 1, 2]);
    }

    #[test]
    fn left_join_keeps_unmatched_and_repeats_overlaps() {
        let layer = layer();
        let index = ZoneIndex::new(&layer).unwrap();

        let points = vec![Point::new(0.5, 0.5), Point::new(20.0, 20.0), Point::new(5.0, 5.0)];
        let joined = index.left_join(points, |p| *p);

        let zones: Vec<Option<&str>> = joined
            .iter()
            .map(|j| j.zone.and_then(|i| index.zone(i)).map(|z| z.code.as_str()))
            .collect();
        assert_eq!(zones, vec![Some("a"), Some("big"), None, Some("big")]);
        assert_eq!(joined[0].record, joined[1].record);
        assert_eq!(joined[2].record, Point::new(20.0, 20.0));
    }

    #[test]
    fn requires_wgs84_layer() {
        let layer = layer().with_crs(Crs::from_epsg(28356).unwrap());
        assert!(matches!(
            ZoneIndex::new(&layer),
            Err(SpatialError::CrsMismatch { .. })
        ));
    }

    #[test]
    fn skips_empty_zones() {
        let layer = SpatialDataset::new(
            Crs::Wgs84,
            vec![
                Zone {
                    code: "empty".to_string(),
                    properties: serde_json::Map::new(),
                    geometry: MultiPolygon(vec![]),
                },
                square("a", 0.0, 0.0, 1.0),
            ],
        );
        let index = ZoneIndex::new(&layer).unwrap();
        assert_eq!(index.intersecting(Point::new(0.5, 0.5)), vec![1]);
    }
}
