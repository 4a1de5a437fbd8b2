mod merge;

pub use merge::merge_polygons;

use geo::{Coord, Polygon};
use log::{debug, info};

use crate::error::{EditError, Notice};
use crate::index::ReferenceIndex;
use crate::types::Parcel;
use crate::validate::Validator;

/// What a fill click does with the polygon under the pointer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FillMode {
    /// Collect adjacent polygons and merge them into the boundary.
    #[default]
    Merge,
    /// Turn each clicked polygon into a parcel of its own.
    Parcels,
}

/// Result of a fill click.
#[derive(Debug, Clone, PartialEq)]
pub enum FillEvent {
    /// Added to the selection; `count` is the new selection size.
    Selected { count: usize },
    /// Clicked again, so removed from the selection.
    Deselected { count: usize },
    /// Not adjacent to the previous selection, which was discarded.
    SelectionReset { notice: Notice },
    /// Accepted as a new parcel (fill-into-parcels mode).
    ParcelAccepted(Polygon<f64>),
}

/// Interactive fill: pick reference polygons and merge them, or adopt them as parcels.
#[derive(Debug, Clone, Default)]
pub struct FillTool {
    validator: Validator,
    mode: FillMode,
    active: bool,
    /// Boundary that existed when the fill began; an implicit first member.
    base: Option<Polygon<f64>>,
    selection: Vec<Polygon<f64>>,
}

impl FillTool {
    pub fn new(validator: Validator) -> Self {
        Self { validator, ..Self::default() }
    }

    #[inline] pub fn is_active(&self) -> bool { self.active }

    #[inline] pub fn mode(&self) -> FillMode { self.mode }

    /// Currently selected reference polygons.
    #[inline] pub fn selection(&self) -> &[Polygon<f64>] { &self.selection }

    /// Check whether the pre-existing boundary is still part of the merge.
    #[inline] pub fn includes_boundary(&self) -> bool { self.base.is_some() }

    /// Start a fill. In merge mode an existing boundary joins the selection implicitly.
    pub fn begin(&mut self, mode: FillMode, boundary: Option<&Polygon<f64>>) {
        self.mode = mode;
        self.active = true;
        self.selection.clear();
        self.base = match mode {
            FillMode::Merge => boundary.cloned(),
            FillMode::Parcels => None,
        };
    }

    pub fn cancel(&mut self) {
        self.active = false;
        self.selection.clear();
        self.base = None;
    }

    /// Handle a click at `point`: look up the reference polygon there and
    /// select it (merge mode) or validate it as a new parcel (parcels mode).
    pub fn click(&mut self, point: Coord<f64>, index: &ReferenceIndex, boundary: Option<&Polygon<f64>>, parcels: &[Parcel]) -> Result<FillEvent, EditError> {
        let polygon = index.polygon_at(point, self.validator.epsilon())
            .and_then(|feature| feature.polygon())
            .map(|polygon| Polygon::new(polygon.exterior().clone(), vec![]))
            .ok_or(EditError::NoPolygonAtPoint)?;

        match self.mode {
            FillMode::Merge => Ok(self.select(polygon)),
            FillMode::Parcels => self.accept_parcel(&polygon, boundary, parcels).map(FillEvent::ParcelAccepted),
        }
    }

    /// Toggle `polygon` in the merge selection, applying the adjacency gate.
    pub fn select(&mut self, polygon: Polygon<f64>) -> FillEvent {
        if let Some(pos) = self.selection.iter().position(|p| *p == polygon) {
            self.selection.remove(pos);
            return FillEvent::Deselected { count: self.selection.len() }
        }

        let accepted = (self.selection.is_empty() && self.base.is_none())
            || self.base.iter().chain(&self.selection).any(|member| self.validator.adjacent(member, &polygon));

        if accepted {
            self.selection.push(polygon);
            return FillEvent::Selected { count: self.selection.len() }
        }

        let touching = self.base.iter().chain(&self.selection).any(|member| self.validator.touches(member, &polygon));
        debug!("[fill] polygon not adjacent to {} selected, resetting selection", self.selection.len());
        self.base = None;
        self.selection = vec![polygon];
        let notice = if touching {
            Notice::warning("polygon only touches the selection at a point; previous selection cleared")
        } else {
            Notice::warning("polygon is not adjacent to the selection; previous selection cleared")
        };
        FillEvent::SelectionReset { notice }
    }

    /// Validate a reference polygon as a new parcel against the boundary and existing parcels.
    /// Returns the polygon corrected onto the boundary.
    pub fn accept_parcel(&self, polygon: &Polygon<f64>, boundary: Option<&Polygon<f64>>, parcels: &[Parcel]) -> Result<Polygon<f64>, EditError> {
        let boundary = boundary.ok_or(EditError::NoBoundary)?;
        let corrected = self.validator.correct(polygon, boundary);

        let others = parcels.iter().enumerate().map(|(i, p)| (i, &p.polygon)).collect::<Vec<_>>();
        let report = self.validator.validate_parcel(&corrected, Some(boundary), &others);
        if !report.valid { return Err(EditError::ParcelRejected(report.reasons)) }
        Ok(corrected)
    }

    /// Merge the selection (and the implicit boundary member) into one polygon
    /// and end the fill. On failure the selection is kept.
    pub fn confirm(&mut self) -> Result<Polygon<f64>, EditError> {
        let members = self.base.iter().chain(&self.selection).collect::<Vec<_>>();
        if self.selection.is_empty() { return Err(EditError::EmptySelection) }
        if members.len() > 1 && !self.validator.contiguous(&members) {
            return Err(EditError::NotContiguous)
        }

        let merged = merge_polygons(&members).ok_or(EditError::DegenerateGeometry)?;
        info!("[fill] merged {} polygons", members.len());
        self.cancel();
        Ok(merged)
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use geo::coord;

    use super::*;
    use crate::geom::{polygon_area, polygon_from_vertices};
    use crate::index::{FeatureGeometry, LayerType, ReferenceFeature};

    fn square(x: f64, y: f64, size: f64) -> Polygon<f64> {
        polygon_from_vertices(&[
            coord! { x: x, y: y }, coord! { x: x + size, y: y },
            coord! { x: x + size, y: y + size }, coord! { x: x, y: y + size },
        ]).unwrap()
    }

    fn buildings(squares: &[Polygon<f64>]) -> ReferenceIndex {
        ReferenceIndex::new(squares.iter()
            .map(|s| ReferenceFeature::new(LayerType::Building, None, FeatureGeometry::Polygon(s.clone())))
            .collect())
    }

    #[test]
    fn non_adjacent_click_resets_selection() {
        let mut tool = FillTool::default();
        tool.begin(FillMode::Merge, None);

        assert_eq!(tool.select(square(0.0, 0.0, 1.0)), FillEvent::Selected { count: 1 });
        let event = tool.select(square(5.0, 5.0, 1.0));
        assert!(matches!(event, FillEvent::SelectionReset { .. }));
        assert_eq!(tool.selection().len(), 1);
        assert_eq!(tool.selection()[0], square(5.0, 5.0, 1.0));
    }

    #[test]
    fn corner_contact_gets_its_own_notice() {
        let mut tool = FillTool::default();
        tool.begin(FillMode::Merge, None);
        tool.select(square(0.0, 0.0, 1.0));

        let FillEvent::SelectionReset { notice } = tool.select(square(1.0, 1.0, 1.0)) else { panic!("expected a reset") };
        assert!(notice.message.contains("touches"));
    }

    #[test]
    fn click_again_deselects() {
        let mut tool = FillTool::default();
        tool.begin(FillMode::Merge, None);
        tool.select(square(0.0, 0.0, 1.0));
        assert_eq!(tool.select(square(1.0, 0.0, 1.0)), FillEvent::Selected { count: 2 });
        assert_eq!(tool.select(square(0.0, 0.0, 1.0)), FillEvent::Deselected { count: 1 });
    }

    #[test]
    fn existing_boundary_gates_first_click() {
        let mut tool = FillTool::default();
        let boundary = square(0.0, 0.0, 1.0);
        tool.begin(FillMode::Merge, Some(&boundary));
        assert!(tool.includes_boundary());

        assert_eq!(tool.select(square(1.0, 0.0, 1.0)), FillEvent::Selected { count: 1 });
        let merged = tool.confirm().unwrap();
        assert_relative_eq!(polygon_area(&merged), 2.0);
        assert!(!tool.is_active());

        tool.begin(FillMode::Merge, Some(&boundary));
        assert!(matches!(tool.select(square(4.0, 0.0, 1.0)), FillEvent::SelectionReset { .. }));
        assert!(!tool.includes_boundary());
    }

    #[test]
    fn gap_in_selection_blocks_merge() {
        let mut tool = FillTool::default();
        tool.begin(FillMode::Merge, None);
        for x in [0.0, 1.0, 2.0] { tool.select(square(x, 0.0, 1.0)); }

        // Dropping the middle square leaves two islands.
        assert_eq!(tool.select(square(1.0, 0.0, 1.0)), FillEvent::Deselected { count: 2 });
        assert_eq!(tool.confirm(), Err(EditError::NotContiguous));
        assert!(tool.is_active());
        assert_eq!(tool.selection().len(), 2);
    }

    #[test]
    fn confirm_requires_selection() {
        let mut tool = FillTool::default();
        tool.begin(FillMode::Merge, None);
        assert_eq!(tool.confirm(), Err(EditError::EmptySelection));
    }

    #[test]
    fn click_looks_up_reference_polygon() {
        let index = buildings(&[square(0.0, 0.0, 1.0), square(1.0, 0.0, 1.0)]);
        let mut tool = FillTool::default();
        tool.begin(FillMode::Merge, None);

        assert_eq!(tool.click(coord! { x: 0.5, y: 0.5 }, &index, None, &[]), Ok(FillEvent::Selected { count: 1 }));
        assert_eq!(tool.click(coord! { x: 1.5, y: 0.5 }, &index, None, &[]), Ok(FillEvent::Selected { count: 2 }));
        assert_eq!(tool.click(coord! { x: 9.0, y: 9.0 }, &index, None, &[]), Err(EditError::NoPolygonAtPoint));
        assert_relative_eq!(polygon_area(&tool.confirm().unwrap()), 2.0);
    }

    #[test]
    fn fill_into_parcels_validates_each_click() {
        let boundary = square(0.0, 0.0, 10.0);
        let index = buildings(&[square(1.0, 1.0, 2.0), square(9.0, 9.0, 2.0)]);
        let mut tool = FillTool::default();
        tool.begin(FillMode::Parcels, Some(&boundary));

        let event = tool.click(coord! { x: 2.0, y: 2.0 }, &index, Some(&boundary), &[]).unwrap();
        let FillEvent::ParcelAccepted(accepted) = event else { panic!("expected a parcel") };
        let parcels = [Parcel::new(accepted, 0)];

        // Already covered by the first parcel.
        let err = tool.click(coord! { x: 2.0, y: 2.0 }, &index, Some(&boundary), &parcels).unwrap_err();
        assert!(matches!(err, EditError::ParcelRejected(_)));

        // Sticks out of the boundary.
        let err = tool.click(coord! { x: 10.5, y: 10.5 }, &index, Some(&boundary), &parcels).unwrap_err();
        assert!(matches!(err, EditError::ParcelRejected(_)));
    }
}
