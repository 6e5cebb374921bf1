//! Records tagged with a coordinate reference system.

use geo::{Coord, CoordsIter, MapCoordsInPlace};

use crate::{Crs, SpatialError};

/// A record that owns one geometry.
pub trait HasGeometry {
    /// Geometry type stored on the record.
    type Geometry: MapCoordsInPlace<f64> + CoordsIter<Scalar = f64>;

    fn geometry_mut(&mut self) -> &mut Self::Geometry;
}

impl HasGeometry for geo::Geometry<f64> {
    type Geometry = Self;

    fn geometry_mut(&mut self) -> &mut Self::Geometry {
        self
    }
}

/// A collection of records whose geometries share one declared CRS.
#[derive(Debug, Clone, PartialEq)]
pub struct SpatialDataset<R> {
    crs: Option<Crs>,
    records: Vec<R>,
}

impl<R> SpatialDataset<R> {
    #[must_use]
    pub const fn new(crs: Crs, records: Vec<R>) -> Self {
        Self {
            crs: Some(crs),
            records,
        }
    }

    /// A dataset whose CRS is not known. It cannot be reprojected or joined
    /// until [`Self::with_crs`] declares one.
    #[must_use]
    pub const fn undeclared(records: Vec<R>) -> Self {
        Self { crs: None, records }
    }

    /// Declares (or overrides) the CRS without touching coordinates.
    #[must_use]
    pub fn with_crs(mut self, crs: Crs) -> Self {
        self.crs = Some(crs);
        self
    }

    #[must_use]
    pub const fn crs(&self) -> Option<Crs> {
        self.crs
    }

    #[must_use]
    pub fn records(&self) -> &[R] {
        &self.records
    }

    #[must_use]
    pub fn into_records(self) -> Vec<R> {
        self.records
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Checks the dataset is declared in `expected`.
    ///
    /// # Errors
    ///
    /// * [`SpatialError::UndeclaredCrs`] if no CRS is declared
    /// * [`SpatialError::CrsMismatch`] if a different CRS is declared
    pub fn require_crs(&self, expected: Crs) -> Result<(), SpatialError> {
        match self.crs {
            None => Err(SpatialError::UndeclaredCrs),
            Some(found) if found != expected => Err(SpatialError::CrsMismatch { expected, found }),
            Some(_) => Ok(()),
        }
    }
}

impl<R: HasGeometry> SpatialDataset<R> {
    /// Rewrites every geometry into WGS84 longitude/latitude.
    ///
    /// May take a while for large layers: every vertex goes through the
    /// inverse projection.
    ///
    /// # Errors
    ///
    /// See [`Self::reproject`].
    pub fn to_wgs84(self) -> Result<Self, SpatialError> {
        self.reproject(Crs::Wgs84)
    }

    /// Rewrites every geometry into `target`, pivoting through WGS84.
    ///
    /// A dataset already declared in `target` is returned untouched.
    ///
    /// # Errors
    ///
    /// * [`SpatialError::UndeclaredCrs`] if the dataset has no CRS
    /// * [`SpatialError::InvalidGeometry`] if a transformed coordinate is
    ///   not finite
    pub fn reproject(mut self, target: Crs) -> Result<Self, SpatialError> {
        let source = self.crs.ok_or(SpatialError::UndeclaredCrs)?;

        if source == target {
            log::debug!("Dataset already in {target}, skipping reprojection");
            return Ok(self);
        }

        log::info!(
            "Reprojecting {} geometries from {source} to {target}",
            self.records.len()
        );

        let transform = move |c: Coord<f64>| target.from_wgs84(source.to_wgs84(c));

        for (index, record) in self.records.iter_mut().enumerate() {
            let geometry = record.geometry_mut();
            geometry.map_coords_in_place(transform);

            if let Some(bad) = geometry
                .coords_iter()
                .find(|c| !c.x.is_finite() || !c.y.is_finite())
            {
                return Err(SpatialError::InvalidGeometry {
                    index,
                    reason: format!("non-finite coordinate ({}, {}) in {target}", bad.x, bad.y),
                });
            }
        }

        self.crs = Some(target);
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use geo::{Geometry, LineString, Point, polygon};

    use super::*;

    fn mga56() -> Crs {
        Crs::from_epsg(28356).unwrap()
    }

    #[test]
    fn same_crs_is_untouched() {
        let geometries = vec![
            Geometry::Point(Point::new(151.2, -33.9)),
            Geometry::Polygon(polygon![(x: 0.1, y: 0.2), (x: 1.0, y: 0.0), (x: 0.5, y: 1.0)]),
        ];
        let dataset = SpatialDataset::new(Crs::Wgs84, geometries.clone());

        let reprojected = dataset.to_wgs84().unwrap();
        assert_eq!(reprojected.records(), geometries.as_slice());
        assert_eq!(reprojected.crs(), Some(Crs::Wgs84));
    }

    #[test]
    fn grid_coordinates_become_lon_lat() {
        let dataset = SpatialDataset::new(
            mga56(),
            vec![
                Geometry::Point(Point::new(334_368.634, 6_250_948.345)),
                Geometry::LineString(LineString::from(vec![
                    (500_000.0, 10_000_000.0),
                    (334_368.634, 6_250_948.345),
                ])),
            ],
        );

        let wgs84 = dataset.to_wgs84().unwrap();
        assert_eq!(wgs84.crs(), Some(Crs::Wgs84));

        let Geometry::Point(p) = &wgs84.records()[0] else {
            panic!("point stays a point");
        };
        assert!((p.x() - 151.2093).abs() < 1e-6, "lon was {}", p.x());
        assert!((p.y() - -33.8688).abs() < 1e-6, "lat was {}", p.y());

        let Geometry::LineString(line) = &wgs84.records()[1] else {
            panic!("line stays a line");
        };
        assert!((line.0[0].x - 153.0).abs() < 1e-9);
        assert!(line.0[0].y.abs() < 1e-9);
    }

    #[test]
    fn reprojection_between_grids_round_trips() {
        let original = vec![Geometry::Point(Point::new(151.0, -33.5))];
        let there = SpatialDataset::new(Crs::Wgs84, original.clone())
            .reproject(mga56())
            .unwrap();
        let back = there.to_wgs84().unwrap();

        let (Geometry::Point(a), Geometry::Point(b)) = (&original[0], &back.records()[0]) else {
            panic!("points stay points");
        };
        assert!((a.x() - b.x()).abs() < 1e-7);
        assert!((a.y() - b.y()).abs() < 1e-7);
    }

    #[test]
    fn undeclared_crs_cannot_be_reprojected() {
        let dataset = SpatialDataset::undeclared(vec![Geometry::Point(Point::new(1.0, 2.0))]);
        assert!(matches!(
            dataset.to_wgs84(),
            Err(SpatialError::UndeclaredCrs)
        ));
    }

    #[test]
    fn non_finite_results_are_rejected() {
        let dataset = SpatialDataset::new(
            mga56(),
            vec![
                Geometry::Point(Point::new(334_368.634, 6_250_948.345)),
                Geometry::Point(Point::new(f64::NAN, 6_250_948.345)),
            ],
        );
        match dataset.to_wgs84() {
            Err(SpatialError::InvalidGeometry { index, .. }) => assert_eq!(index, 1),
            other => panic!("expected invalid geometry, got {other:?}"),
        }
    }

    #[test]
    fn require_crs_reports_mismatch() {
        let dataset = SpatialDataset::new(mga56(), Vec::<Geometry<f64>>::new());
        assert!(matches!(
            dataset.require_crs(Crs::Wgs84),
            Err(SpatialError::CrsMismatch { .. })
        ));
        assert!(dataset.with_crs(Crs::Wgs84).require_crs(Crs::Wgs84).is_ok());
    }
}
