mod edit;
mod preview;
mod viewport;

pub use preview::{preview, Preview};
pub use viewport::{StaticViewport, Viewport};

use anyhow::Result;
use geo::{Coord, Line, Polygon};
use log::{debug, info, warn};
use serde_json::{Map, Value};

use crate::config::{CrsConfig, DrawConfig, EngineConfig};
use crate::error::EditError;
use crate::fill::{FillEvent, FillMode, FillTool};
use crate::geom::{distinct_vertex_count, is_structurally_valid, polygon_from_vertices, AreaReadout};
use crate::index::ReferenceIndex;
use crate::io::{ParcelStore, boundary_to_geojson, parcels_to_geojson};
use crate::slice::{split_polygon, Chord, SliceStep, SliceTool};
use crate::snap::{Snap, SnapResolver, SnapScene, SnapSources};
use crate::types::{DrawMode, GeometryRef, Parcel};
use crate::validate::{ValidationReport, Validator};
use edit::EditFocus;

/// What the session is currently doing with pointer input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Activity {
    Idle,
    Drawing,
    Editing(GeometryRef),
    Filling(FillMode),
    Slicing,
}

/// Everything the host needs to redraw after a pointer move.
#[derive(Debug, Clone, PartialEq)]
pub struct PointerFeedback {
    pub snap: Snap,
    /// Pending polygon while drawing.
    pub preview: Option<Preview>,
    /// The pointer is close enough to the first vertex to close the ring.
    pub close_highlight: bool,
    /// Vertex of the edited geometry under the pointer.
    pub hovered_vertex: Option<usize>,
    /// Insertable point on an edge of the edited geometry.
    pub ghost: Option<Coord<f64>>,
    /// Slice chord from the start point to the pointer.
    pub chord: Option<Line<f64>>,
    /// Area of the active polygon.
    pub area: Option<AreaReadout>,
}

impl PointerFeedback {
    fn new(snap: Snap) -> Self {
        Self { snap, preview: None, close_highlight: false, hovered_vertex: None, ghost: None, chord: None, area: None }
    }
}

/// Result of a pointer-down.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerDown {
    Ignored,
    DragStarted(usize),
    /// A vertex was inserted at the ghost position and is now being dragged.
    VertexInserted(usize),
}

/// Result of a click.
#[derive(Debug, Clone, PartialEq)]
pub enum ClickOutcome {
    Ignored,
    VertexPlaced { count: usize },
    /// A ring was closed. `report` carries the soft validation of a new parcel.
    Closed { geometry: GeometryRef, report: Option<ValidationReport> },
    Fill(FillEvent),
    ParcelAdded(usize),
    SliceStarted(GeometryRef),
    /// `target` was split; the pieces are the parcels at `parcels`.
    Sliced { target: GeometryRef, parcels: [usize; 2] },
}

/// Assemble a [`DrawingSession`] with optional collaborators.
#[derive(Debug, Clone)]
pub struct SessionBuilder {
    config: EngineConfig,
    mode: DrawMode,
    validator: Option<Validator>,
    fill: Option<FillTool>,
    slice: Option<SliceTool>,
    index: Option<ReferenceIndex>,
}

impl SessionBuilder {
    pub fn new(config: EngineConfig) -> Self {
        Self { config, mode: DrawMode::default(), validator: None, fill: None, slice: None, index: None }
    }

    pub fn mode(mut self, mode: DrawMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn validator(mut self, validator: Validator) -> Self {
        self.validator = Some(validator);
        self
    }

    pub fn fill_tool(mut self, fill: FillTool) -> Self {
        self.fill = Some(fill);
        self
    }

    pub fn slice_tool(mut self, slice: SliceTool) -> Self {
        self.slice = Some(slice);
        self
    }

    pub fn reference_index(mut self, index: ReferenceIndex) -> Self {
        self.index = Some(index);
        self
    }

    /// Install every collaborator, configured from the engine config.
    pub fn with_all_tools(self) -> Self {
        let validator = Validator::new(self.config.validate.clone());
        let slice = SliceTool::new(self.config.draw.min_slice_length, validator.epsilon());
        self.validator(validator.clone())
            .fill_tool(FillTool::new(validator))
            .slice_tool(slice)
            .reference_index(ReferenceIndex::default())
    }

    pub fn build(self) -> DrawingSession {
        DrawingSession {
            config: self.config.draw,
            resolver: SnapResolver::new(self.config.snap),
            mode: self.mode,
            sources: SnapSources::default(),
            validator: self.validator,
            fill: self.fill,
            slice: self.slice,
            index: self.index,
            boundary: None,
            parcels: Vec::new(),
            drawing: false,
            vertices: Vec::new(),
            focus: None,
            next_color: 0,
        }
    }
}

/// Per-map drawing state: the boundary, the parcels, the polygon being drawn
/// and the geometry in edit focus.
#[derive(Debug, Clone)]
pub struct DrawingSession {
    config: DrawConfig,
    resolver: SnapResolver,
    mode: DrawMode,
    sources: SnapSources,
    validator: Option<Validator>,
    fill: Option<FillTool>,
    slice: Option<SliceTool>,
    index: Option<ReferenceIndex>,
    boundary: Option<Polygon<f64>>,
    parcels: Vec<Parcel>,
    drawing: bool,
    vertices: Vec<Coord<f64>>,
    focus: Option<EditFocus>,
    next_color: u8,
}

impl DrawingSession {
    #[inline] pub fn mode(&self) -> DrawMode { self.mode }

    #[inline] pub fn boundary(&self) -> Option<&Polygon<f64>> { self.boundary.as_ref() }

    #[inline] pub fn parcels(&self) -> &[Parcel] { &self.parcels }

    #[inline] pub fn is_drawing(&self) -> bool { self.drawing }

    /// Vertices placed so far for the polygon being drawn.
    #[inline] pub fn vertices(&self) -> &[Coord<f64>] { &self.vertices }

    #[inline] pub fn editing(&self) -> Option<GeometryRef> { self.focus.as_ref().map(|f| f.target) }

    /// Open vertex list of the geometry in edit focus, including unsaved changes.
    #[inline] pub fn edit_vertices(&self) -> Option<&[Coord<f64>]> { self.focus.as_ref().map(|f| f.vertices.as_slice()) }

    #[inline] pub fn snap_sources(&self) -> SnapSources { self.sources }

    #[inline] pub fn validator(&self) -> Option<&Validator> { self.validator.as_ref() }

    #[inline] pub fn fill_tool(&self) -> Option<&FillTool> { self.fill.as_ref() }

    #[inline] pub fn slice_tool(&self) -> Option<&SliceTool> { self.slice.as_ref() }

    #[inline] pub fn reference_index(&self) -> Option<&ReferenceIndex> { self.index.as_ref() }

    /// Mutable access for refreshing the index from the host's scheduler.
    #[inline] pub fn reference_index_mut(&mut self) -> Option<&mut ReferenceIndex> { self.index.as_mut() }

    pub fn activity(&self) -> Activity {
        if self.drawing { return Activity::Drawing }
        if let Some(focus) = &self.focus { return Activity::Editing(focus.target) }
        if let Some(fill) = self.fill.as_ref().filter(|f| f.is_active()) { return Activity::Filling(fill.mode()) }
        if self.slice.as_ref().is_some_and(|s| s.is_active()) { return Activity::Slicing }
        Activity::Idle
    }

    /// Committed polygon for a geometry reference.
    pub fn geometry(&self, target: GeometryRef) -> Option<&Polygon<f64>> {
        match target {
            GeometryRef::Boundary => self.boundary.as_ref(),
            GeometryRef::Parcel(i) => self.parcels.get(i).map(|p| &p.polygon),
        }
    }

    fn require(&self, target: GeometryRef) -> Result<&Polygon<f64>, EditError> {
        self.geometry(target).ok_or(match target {
            GeometryRef::Boundary => EditError::NoBoundary,
            GeometryRef::Parcel(i) => EditError::NoSuchParcel(i),
        })
    }

    /// Switch mode; everything drawn so far is discarded.
    pub fn set_mode(&mut self, mode: DrawMode) {
        self.clear();
        self.mode = mode;
        info!("[draw] mode set to {mode:?}");
    }

    /// Discard the boundary, the parcels and any work in progress.
    pub fn clear(&mut self) {
        self.boundary = None;
        self.parcels.clear();
        self.drawing = false;
        self.vertices.clear();
        self.focus = None;
        self.next_color = 0;
        self.cancel_tools();
    }

    pub fn set_snap_sources(&mut self, sources: SnapSources) { self.sources = sources }

    fn cancel_tools(&mut self) {
        if let Some(fill) = &mut self.fill { fill.cancel() }
        if let Some(slice) = &mut self.slice { slice.cancel() }
    }

    fn take_color(&mut self) -> u8 {
        let color = self.next_color;
        self.next_color = (color + 1) % self.config.palette_size.max(1);
        color
    }

    /// Resolve `pointer` against the committed geometry and the reference index.
    pub fn snap_at(&self, viewport: &dyn Viewport, pointer: Coord<f64>) -> Snap {
        let exclude = self.editing();
        let scene = SnapScene {
            boundary: self.boundary.as_ref(),
            parcels: &self.parcels,
            exclude,
            index: self.index.as_ref(),
            clamp_to_boundary: self.mode == DrawMode::Parcels && exclude != Some(GeometryRef::Boundary),
        };
        self.resolver.resolve(pointer, viewport.resolution(), &self.sources, &scene)
    }

    // Drawing

    /// Begin a new polygon. Refused while drawing, when a single-boundary
    /// session already has its polygon, or when a parcels session has no boundary.
    pub fn start_drawing(&mut self) -> Result<(), EditError> {
        let refused = if self.drawing {
            Some(EditError::AlreadyDrawing)
        } else if self.mode == DrawMode::SingleBoundary && self.boundary.is_some() {
            Some(EditError::BoundaryExists)
        } else if self.mode == DrawMode::Parcels && self.boundary.is_none() {
            Some(EditError::NoBoundary)
        } else {
            None
        };
        if let Some(err) = refused {
            debug!("[draw] start ignored: {err}");
            return Err(err)
        }

        self.end_edit();
        self.cancel_tools();
        self.drawing = true;
        self.vertices.clear();
        Ok(())
    }

    /// Append a vertex to the polygon being drawn. Repeating the last vertex is a no-op.
    pub fn place_vertex(&mut self, coord: Coord<f64>) -> Result<usize, EditError> {
        if !self.drawing { return Err(EditError::NotDrawing) }
        if self.vertices.last() != Some(&coord) { self.vertices.push(coord) }
        Ok(self.vertices.len())
    }

    pub fn undo_last_vertex(&mut self) -> Result<Option<Coord<f64>>, EditError> {
        if !self.drawing { return Err(EditError::NotDrawing) }
        Ok(self.vertices.pop())
    }

    pub fn cancel_drawing(&mut self) {
        self.drawing = false;
        self.vertices.clear();
    }

    /// Close the polygon being drawn.
    ///
    /// In single-boundary mode it becomes the boundary and drawing ends. In
    /// parcels mode it is appended as a parcel even if it fails validation
    /// (flagged invalid), and drawing continues with an empty vertex list.
    pub fn close_polygon(&mut self) -> Result<ClickOutcome, EditError> {
        if !self.drawing { return Err(EditError::NotDrawing) }
        let polygon = polygon_from_vertices(&self.vertices)
            .ok_or(EditError::TooFewVertices(distinct_vertex_count(&self.vertices)))?;
        self.vertices.clear();

        match self.mode {
            DrawMode::SingleBoundary => {
                info!("[draw] boundary closed");
                self.drawing = false;
                self.boundary = Some(polygon);
                Ok(ClickOutcome::Closed { geometry: GeometryRef::Boundary, report: None })
            }
            DrawMode::Parcels => {
                let (idx, report) = self.commit_parcel(polygon);
                Ok(ClickOutcome::Closed { geometry: GeometryRef::Parcel(idx), report })
            }
        }
    }

    /// Append a parcel, correcting it onto the boundary and soft-validating it.
    fn commit_parcel(&mut self, polygon: Polygon<f64>) -> (usize, Option<ValidationReport>) {
        let idx = self.parcels.len();
        let (polygon, report) = match &self.validator {
            Some(validator) => {
                let polygon = match &self.boundary {
                    Some(boundary) => validator.correct(&polygon, boundary),
                    None => polygon,
                };
                let others = self.parcels.iter().enumerate().map(|(i, p)| (i, &p.polygon)).collect::<Vec<_>>();
                let report = validator.validate_parcel(&polygon, self.boundary.as_ref(), &others);
                (polygon, Some(report))
            }
            None => (polygon, None),
        };

        let mut parcel = Parcel::new(polygon, self.take_color());
        if let Some(report) = report.as_ref().filter(|r| !r.valid) {
            warn!("[draw] parcel {} is invalid: {}", idx + 1, report.reasons.join("; "));
            parcel.valid = false;
        }
        info!("[draw] parcel {} added", idx + 1);
        self.parcels.push(parcel);
        (idx, report)
    }

    /// Add an externally supplied parcel (e.g. imported). Requires a boundary.
    pub fn add_parcel(&mut self, polygon: Polygon<f64>) -> Result<(usize, Option<ValidationReport>), EditError> {
        if self.boundary.is_none() { return Err(EditError::NoBoundary) }
        if !is_structurally_valid(&polygon) { return Err(EditError::DegenerateGeometry) }
        Ok(self.commit_parcel(polygon))
    }

    /// Replace the boundary with an externally supplied polygon.
    pub fn load_boundary(&mut self, polygon: Polygon<f64>) -> Result<(), EditError> {
        if self.drawing { return Err(EditError::AlreadyDrawing) }
        if !is_structurally_valid(&polygon) { return Err(EditError::DegenerateGeometry) }
        self.install_boundary(polygon);
        Ok(())
    }

    /// Replace every parcel with a previously saved set. Colours and
    /// attributes are kept; validity is recomputed against the boundary.
    pub fn load_parcels(&mut self, parcels: Vec<Parcel>) -> Result<(), EditError> {
        if self.drawing { return Err(EditError::AlreadyDrawing) }
        if self.boundary.is_none() { return Err(EditError::NoBoundary) }
        if !parcels.iter().all(|p| is_structurally_valid(&p.polygon)) { return Err(EditError::DegenerateGeometry) }

        if matches!(self.editing(), Some(GeometryRef::Parcel(_))) { self.focus = None }
        self.cancel_tools();
        let palette = self.config.palette_size.max(1);
        self.next_color = parcels.last().map_or(0, |p| (p.color % palette + 1) % palette);
        self.parcels = parcels;
        self.revalidate();
        info!("[draw] loaded {} parcels", self.parcels.len());
        Ok(())
    }

    fn install_boundary(&mut self, polygon: Polygon<f64>) {
        if self.editing() == Some(GeometryRef::Boundary) { self.focus = None }
        self.boundary = Some(polygon);
        self.revalidate();
    }

    /// Refresh every parcel's validity flag.
    fn revalidate(&mut self) {
        let Some(validator) = &self.validator else { return };
        let flags = (0..self.parcels.len())
            .map(|i| {
                let others = self.parcels.iter().enumerate()
                    .filter(|&(j, _)| j != i)
                    .map(|(j, p)| (j, &p.polygon))
                    .collect::<Vec<_>>();
                validator.validate_parcel(&self.parcels[i].polygon, self.boundary.as_ref(), &others).valid
            })
            .collect::<Vec<_>>();
        for (parcel, valid) in self.parcels.iter_mut().zip(flags) { parcel.valid = valid }
    }

    pub fn remove_parcel(&mut self, idx: usize) -> Result<Parcel, EditError> {
        if idx >= self.parcels.len() { return Err(EditError::NoSuchParcel(idx)) }

        match self.editing() {
            Some(GeometryRef::Parcel(i)) if i == idx => self.focus = None,
            Some(GeometryRef::Parcel(i)) if i > idx => {
                if let Some(focus) = &mut self.focus { focus.target = GeometryRef::Parcel(i - 1) }
            }
            _ => {}
        }
        if let Some(slice) = &mut self.slice { slice.cancel() }

        let parcel = self.parcels.remove(idx);
        self.revalidate();
        info!("[draw] parcel {} removed", idx + 1);
        Ok(parcel)
    }

    pub fn set_parcel_color(&mut self, idx: usize, color: u8) -> Result<(), EditError> {
        let palette = self.config.palette_size.max(1);
        let parcel = self.parcels.get_mut(idx).ok_or(EditError::NoSuchParcel(idx))?;
        parcel.color = color % palette;
        Ok(())
    }

    pub fn set_parcel_attributes(&mut self, idx: usize, attributes: Map<String, Value>) -> Result<(), EditError> {
        let parcel = self.parcels.get_mut(idx).ok_or(EditError::NoSuchParcel(idx))?;
        parcel.attributes = attributes;
        Ok(())
    }

    // Editing

    /// Put `target` in edit focus, writing back any previous focus first.
    pub fn begin_edit(&mut self, target: GeometryRef) -> Result<(), EditError> {
        if self.drawing { return Err(EditError::AlreadyDrawing) }
        let focus = EditFocus::new(target, self.require(target)?);
        if self.editing() == Some(target) { return Ok(()) }

        self.end_edit();
        self.cancel_tools();
        debug!("[draw] editing {target}");
        self.focus = Some(focus);
        Ok(())
    }

    /// Leave edit focus, writing back pending changes. Returns the geometry that was edited.
    pub fn end_edit(&mut self) -> Option<GeometryRef> {
        let focus = self.focus.take()?;
        if focus.dirty { self.write_back(&focus) }
        Some(focus.target)
    }

    fn write_back(&mut self, focus: &EditFocus) {
        let Some(polygon) = focus.polygon() else {
            warn!("[draw] edit of {} collapsed the polygon, keeping the previous geometry", focus.target);
            return
        };
        match focus.target {
            GeometryRef::Boundary => self.boundary = Some(polygon),
            GeometryRef::Parcel(i) => match self.parcels.get_mut(i) {
                Some(parcel) => parcel.polygon = polygon,
                None => return,
            },
        }
        self.revalidate();
    }

    // Pointer input

    pub fn pointer_move(&mut self, viewport: &dyn Viewport, pointer: Coord<f64>) -> PointerFeedback {
        let snap = self.snap_at(viewport, pointer);
        let mut feedback = PointerFeedback::new(snap);

        if let Some(focus) = &mut self.focus {
            match focus.drag {
                Some(i) => { focus.move_vertex(i, snap.coord); }
                None => {
                    feedback.hovered_vertex = focus.hit_vertex(viewport, pointer, self.config.vertex_hit_px);
                    if feedback.hovered_vertex.is_none() {
                        feedback.ghost = focus.ghost(pointer, self.config.ghost_tolerance).map(|g| g.coord);
                    }
                }
            }
            feedback.area = Some(focus.area());
        } else if self.drawing {
            feedback.preview = preview(&self.vertices, Some(snap.coord));
            feedback.close_highlight = self.near_first_vertex(viewport, pointer);
            feedback.area = feedback.preview.as_ref().and_then(Preview::area);
        } else if let Some(slice) = self.slice.as_ref().filter(|s| s.is_active()) {
            feedback.chord = slice.preview(snap.coord);
        }

        feedback
    }

    fn near_first_vertex(&self, viewport: &dyn Viewport, pointer: Coord<f64>) -> bool {
        self.vertices.len() >= 3
            && viewport.pixel_distance(pointer, self.vertices[0]) <= self.config.close_px
    }

    /// Start dragging a vertex, or insert one at the ghost position and drag it.
    /// Panning is suspended until [`pointer_up`](Self::pointer_up).
    pub fn pointer_down(&mut self, viewport: &mut dyn Viewport, pointer: Coord<f64>) -> PointerDown {
        let Some(focus) = &mut self.focus else { return PointerDown::Ignored };

        let down = if let Some(i) = focus.hit_vertex(viewport, pointer, self.config.vertex_hit_px) {
            focus.drag = Some(i);
            PointerDown::DragStarted(i)
        } else if let Some(ghost) = focus.ghost(pointer, self.config.ghost_tolerance) {
            // A ghost clamped onto a corner grabs that corner instead of doubling it.
            if let Some(i) = focus.vertex_at(ghost.coord) {
                focus.drag = Some(i);
                PointerDown::DragStarted(i)
            } else {
                let i = focus.insert(&ghost);
                focus.drag = Some(i);
                PointerDown::VertexInserted(i)
            }
        } else {
            return PointerDown::Ignored
        };

        viewport.set_panning(false);
        down
    }

    /// End a vertex drag, writing the change back and resuming panning.
    pub fn pointer_up(&mut self, viewport: &mut dyn Viewport) -> bool {
        let Some(mut focus) = self.focus.take() else { return false };
        if focus.drag.take().is_none() {
            self.focus = Some(focus);
            return false
        }

        if focus.dirty { self.write_back(&focus) }
        if let Some(committed) = self.geometry(focus.target) { focus.reset(committed) }
        self.focus = Some(focus);
        viewport.set_panning(true);
        true
    }

    /// Route a click to whatever is active: fill, slice or drawing.
    pub fn click(&mut self, viewport: &dyn Viewport, pointer: Coord<f64>) -> Result<ClickOutcome, EditError> {
        if let Some(fill) = self.fill.as_mut().filter(|f| f.is_active()) {
            let index = self.index.as_ref().ok_or(EditError::ToolUnavailable("reference index"))?;
            let event = fill.click(pointer, index, self.boundary.as_ref(), &self.parcels)?;
            return match event {
                FillEvent::ParcelAccepted(polygon) => Ok(ClickOutcome::ParcelAdded(self.commit_parcel(polygon).0)),
                event => Ok(ClickOutcome::Fill(event)),
            }
        }

        if self.slice.as_ref().is_some_and(|s| s.is_active()) {
            let snap = self.snap_at(viewport, pointer);
            let step = {
                let geometries = self.boundary.iter().map(|b| (GeometryRef::Boundary, b))
                    .chain(self.parcels.iter().enumerate().map(|(i, p)| (GeometryRef::Parcel(i), &p.polygon)))
                    .collect::<Vec<_>>();
                match self.slice.as_mut() {
                    Some(slice) => slice.click(&snap, &geometries)?,
                    None => return Ok(ClickOutcome::Ignored),
                }
            };
            return match step {
                SliceStep::Started { target, .. } => Ok(ClickOutcome::SliceStarted(target)),
                SliceStep::Finished(chord) => self.apply_chord(chord),
            }
        }

        if self.drawing {
            if self.near_first_vertex(viewport, pointer) { return self.close_polygon() }
            let snap = self.snap_at(viewport, pointer);
            let count = self.place_vertex(snap.coord)?;
            return Ok(ClickOutcome::VertexPlaced { count })
        }

        Ok(ClickOutcome::Ignored)
    }

    // Fill

    pub fn begin_fill(&mut self, mode: FillMode) -> Result<(), EditError> {
        if self.fill.is_none() { return Err(EditError::ToolUnavailable("fill")) }
        if self.index.is_none() { return Err(EditError::ToolUnavailable("reference index")) }
        if self.drawing { return Err(EditError::AlreadyDrawing) }
        if mode == FillMode::Parcels && self.boundary.is_none() { return Err(EditError::NoBoundary) }

        self.end_edit();
        self.cancel_tools();
        if let Some(fill) = &mut self.fill { fill.begin(mode, self.boundary.as_ref()) }
        Ok(())
    }

    /// Finish the fill. In merge mode the merged polygon replaces the boundary.
    pub fn confirm_fill(&mut self) -> Result<(), EditError> {
        let fill = self.fill.as_mut()
            .filter(|f| f.is_active())
            .ok_or(EditError::ToolUnavailable("fill"))?;
        match fill.mode() {
            FillMode::Merge => {
                let merged = fill.confirm()?;
                self.install_boundary(merged);
                info!("[draw] boundary replaced by fill");
            }
            FillMode::Parcels => fill.cancel(),
        }
        Ok(())
    }

    pub fn cancel_fill(&mut self) {
        if let Some(fill) = &mut self.fill { fill.cancel() }
    }

    // Slice

    /// Arm the slice tool, optionally on a preselected target.
    pub fn begin_slice(&mut self, target: Option<GeometryRef>) -> Result<(), EditError> {
        if self.slice.is_none() { return Err(EditError::ToolUnavailable("slice")) }
        if self.drawing { return Err(EditError::AlreadyDrawing) }
        if let Some(target) = target { self.require(target)?; }

        self.end_edit();
        self.cancel_tools();
        if let Some(slice) = &mut self.slice { slice.begin(target) }
        Ok(())
    }

    pub fn cancel_slice(&mut self) {
        if let Some(slice) = &mut self.slice { slice.cancel() }
    }

    /// Split the chord's target. Slicing the boundary adds two parcels and
    /// keeps the boundary; slicing a parcel replaces it by its two pieces.
    fn apply_chord(&mut self, chord: Chord) -> Result<ClickOutcome, EditError> {
        let eps = self.slice.as_ref().map_or(0.0, |s| s.epsilon());
        let (a, b) = split_polygon(self.require(chord.target)?, chord.from, chord.to, eps)?;

        let parcels = match chord.target {
            GeometryRef::Boundary => {
                let first = self.commit_parcel(a).0;
                let second = self.commit_parcel(b).0;
                [first, second]
            }
            GeometryRef::Parcel(i) => {
                let old = self.parcels.remove(i);
                let color = self.take_color();
                let mut second = Parcel::new(b, color);
                second.attributes = old.attributes.clone();
                self.parcels.insert(i, Parcel { polygon: a, ..old });
                self.parcels.insert(i + 1, second);
                self.revalidate();
                [i, i + 1]
            }
        };
        info!("[draw] {} sliced into parcels {} and {}", chord.target, parcels[0] + 1, parcels[1] + 1);
        Ok(ClickOutcome::Sliced { target: chord.target, parcels })
    }

    // Saving

    /// Validate the whole parcel set. Without a validator only structure is checked.
    pub fn validate_all(&self) -> ValidationReport {
        let polygons = self.parcels.iter().map(|p| &p.polygon).collect::<Vec<_>>();
        match &self.validator {
            Some(validator) => validator.validate_parcels(&polygons, self.boundary.as_ref()),
            None => {
                let mut report = ValidationReport::ok();
                for (i, polygon) in polygons.iter().enumerate() {
                    if !is_structurally_valid(polygon) {
                        report.fail(format!("parcel {} has fewer than 3 distinct vertices", i + 1));
                    }
                }
                report
            }
        }
    }

    /// Hand the boundary and parcels to `store`, refusing an invalid parcel set.
    pub fn save(&self, store: &mut dyn ParcelStore, crs: &CrsConfig) -> Result<()> {
        let report = self.validate_all();
        if !report.valid {
            warn!("[draw] save refused: {}", report.reasons.join("; "));
            return Err(EditError::InvalidParcels(report.reasons).into())
        }
        if let Some(boundary) = &self.boundary {
            store.save_boundary(&boundary_to_geojson(boundary, crs.working_epsg))?;
        }
        store.save_parcels(&parcels_to_geojson(&self.parcels, crs.working_epsg))?;
        info!("[draw] saved {} parcels", self.parcels.len());
        Ok(())
    }
}
