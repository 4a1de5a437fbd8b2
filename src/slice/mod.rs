mod split;

pub use split::split_polygon;

use geo::{Coord, Line, Polygon};
use log::debug;

use crate::error::EditError;
use crate::geom::distance;
use crate::snap::Snap;
use crate::types::GeometryRef;
use crate::validate::point_on_polygon_boundary;

/// A completed two-click chord, ready to split its target.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Chord {
    pub target: GeometryRef,
    pub from: Coord<f64>,
    pub to: Coord<f64>,
}

/// Result of a slice click.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SliceStep {
    /// The start point was recorded on `target`.
    Started { target: GeometryRef, from: Coord<f64> },
    Finished(Chord),
}

/// Two-click chord picker for splitting the boundary or a parcel.
#[derive(Debug, Clone)]
pub struct SliceTool {
    min_length: f64,
    eps: f64,
    active: bool,
    preselected: Option<GeometryRef>,
    target: Option<GeometryRef>,
    start: Option<Coord<f64>>,
}

impl SliceTool {
    pub fn new(min_length: f64, eps: f64) -> Self {
        Self { min_length, eps, active: false, preselected: None, target: None, start: None }
    }

    #[inline] pub fn is_active(&self) -> bool { self.active }

    #[inline] pub fn min_length(&self) -> f64 { self.min_length }

    /// Distance within which a click counts as on a ring.
    #[inline] pub fn epsilon(&self) -> f64 { self.eps }

    /// The polygon being sliced, once known.
    #[inline] pub fn target(&self) -> Option<GeometryRef> { self.target }

    /// The recorded start point.
    #[inline] pub fn start(&self) -> Option<Coord<f64>> { self.start }

    /// Arm the tool, optionally restricted to one target.
    pub fn begin(&mut self, target: Option<GeometryRef>) {
        self.active = true;
        self.preselected = target;
        self.target = target;
        self.start = None;
    }

    pub fn cancel(&mut self) {
        self.active = false;
        self.preselected = None;
        self.target = None;
        self.start = None;
    }

    /// Handle a click resolved to `snap`. `geometries` lists the committed
    /// polygons a chord may be drawn on.
    pub fn click(&mut self, snap: &Snap, geometries: &[(GeometryRef, &Polygon<f64>)]) -> Result<SliceStep, EditError> {
        if !self.active { return Err(EditError::ToolUnavailable("slice")) }
        let on = |target: GeometryRef| geometries.iter()
            .find(|(g, _)| *g == target)
            .is_some_and(|(_, polygon)| point_on_polygon_boundary(snap.coord, &polygon.exterior().0, self.eps));

        let Some(from) = self.start else {
            let target = self.preselected
                .or(snap.target.map(|t| t.geometry))
                .filter(|&t| on(t))
                .or_else(|| if self.preselected.is_some() { None } else {
                    geometries.iter().map(|(g, _)| *g).find(|&g| on(g))
                })
                .ok_or(EditError::SliceNoTarget)?;
            debug!("[slice] start on {target}");
            self.target = Some(target);
            self.start = Some(snap.coord);
            return Ok(SliceStep::Started { target, from: snap.coord })
        };

        let target = self.target.ok_or(EditError::SliceNoTarget)?;
        if !on(target) { return Err(EditError::SliceWrongTarget) }

        let length = distance(from, snap.coord);
        if length < self.min_length {
            return Err(EditError::SliceTooShort { length, min: self.min_length })
        }

        self.cancel();
        Ok(SliceStep::Finished(Chord { target, from, to: snap.coord }))
    }

    /// Chord from the start point to the pointer, once a start is recorded.
    pub fn preview(&self, pointer: Coord<f64>) -> Option<Line<f64>> {
        self.start.map(|from| Line::new(from, pointer))
    }
}
