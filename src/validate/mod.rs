mod adjacency;
mod correct;
mod overlap;
mod point;

pub use adjacency::{polygons_adjacent, polygons_contiguous, polygons_touch, shared_edge_length, shared_vertex_count};
pub use correct::{correct_geometry_to_boundary, snap_to_boundary};
pub use overlap::{polygon_within_boundary, polygons_overlap, segments_properly_intersect};
pub use point::{point_inside_or_on, point_on_polygon_boundary, point_on_segment, point_strictly_inside_polygon};

use geo::Polygon;

use crate::config::ValidatorConfig;
use crate::geom::is_structurally_valid;

/// Outcome of validating one parcel or a parcel set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    pub valid: bool,
    pub reasons: Vec<String>,
}

impl ValidationReport {
    pub fn ok() -> Self { Self { valid: true, reasons: Vec::new() } }

    /// Record a violation.
    pub fn fail(&mut self, reason: impl Into<String>) {
        self.valid = false;
        self.reasons.push(reason.into());
    }

    /// Fold another report into this one.
    pub fn merge(&mut self, other: ValidationReport) {
        self.valid &= other.valid;
        self.reasons.extend(other.reasons);
    }
}

/// Stateless geometric checks that gate parcel commits.
#[derive(Debug, Clone, Default)]
pub struct Validator {
    config: ValidatorConfig,
}

impl Validator {
    pub fn new(config: ValidatorConfig) -> Self { Self { config } }

    #[inline] pub fn config(&self) -> &ValidatorConfig { &self.config }

    #[inline] pub fn epsilon(&self) -> f64 { self.config.epsilon }

    #[inline]
    pub fn within(&self, inner: &Polygon<f64>, outer: &Polygon<f64>) -> bool {
        polygon_within_boundary(inner, outer, self.config.epsilon)
    }

    #[inline]
    pub fn overlap(&self, a: &Polygon<f64>, b: &Polygon<f64>) -> bool {
        polygons_overlap(a, b, self.config.epsilon)
    }

    #[inline]
    pub fn adjacent(&self, a: &Polygon<f64>, b: &Polygon<f64>) -> bool {
        polygons_adjacent(a, b, self.config.min_shared_edge, self.config.epsilon)
    }

    #[inline]
    pub fn touches(&self, a: &Polygon<f64>, b: &Polygon<f64>) -> bool {
        polygons_touch(a, b, self.config.epsilon)
    }

    #[inline]
    pub fn contiguous(&self, polygons: &[&Polygon<f64>]) -> bool {
        polygons_contiguous(polygons, self.config.min_shared_edge, self.config.epsilon)
    }

    #[inline]
    pub fn correct(&self, parcel: &Polygon<f64>, boundary: &Polygon<f64>) -> Polygon<f64> {
        correct_geometry_to_boundary(parcel, boundary, self.config.correction_tolerance)
    }

    /// Validate one parcel against the boundary and the other committed parcels.
    /// `others` pairs each parcel with its index, used in the messages.
    pub fn validate_parcel(&self, parcel: &Polygon<f64>, boundary: Option<&Polygon<f64>>, others: &[(usize, &Polygon<f64>)]) -> ValidationReport {
        let mut report = ValidationReport::ok();
        if !is_structurally_valid(parcel) {
            report.fail("parcel has fewer than 3 distinct vertices");
            return report
        }

        let corrected = match boundary {
            Some(boundary) => self.correct(parcel, boundary),
            None => parcel.clone(),
        };

        if let Some(boundary) = boundary {
            if !self.within(&corrected, boundary) {
                report.fail("parcel extends outside the boundary");
            }
        }

        for &(idx, other) in others {
            if self.overlap(&corrected, other) {
                report.fail(format!("parcel overlaps parcel {}", idx + 1));
            }
        }

        report
    }

    /// Validate a whole parcel set: each parcel against the boundary, and every
    /// pair against each other. All violations are reported.
    pub fn validate_parcels(&self, parcels: &[&Polygon<f64>], boundary: Option<&Polygon<f64>>) -> ValidationReport {
        let mut report = ValidationReport::ok();

        let corrected = parcels.iter()
            .map(|&p| match boundary {
                Some(boundary) => self.correct(p, boundary),
                None => p.clone(),
            })
            .collect::<Vec<_>>();

        for (i, parcel) in corrected.iter().enumerate() {
            if !is_structurally_valid(parcel) {
                report.fail(format!("parcel {} has fewer than 3 distinct vertices", i + 1));
                continue
            }
            if let Some(boundary) = boundary {
                if !self.within(parcel, boundary) {
                    report.fail(format!("parcel {} extends outside the boundary", i + 1));
                }
            }
        }

        for i in 0..corrected.len() {
            for j in (i + 1)..corrected.len() {
                if self.overlap(&corrected[i], &corrected[j]) {
                    report.fail(format!("parcels {} and {} overlap", i + 1, j + 1));
                }
            }
        }

        report
    }
}
