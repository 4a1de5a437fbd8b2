use std::fmt;

use thiserror::Error;

/// How prominently a message should be shown to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Error => "error",
        })
    }
}

/// A caller-visible message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub severity: Severity,
    pub message: String,
}

impl Notice {
    pub fn new(severity: Severity, message: impl Into<String>) -> Self {
        Self { severity, message: message.into() }
    }

    #[inline] pub fn info(message: impl Into<String>) -> Self { Self::new(Severity::Info, message) }
    #[inline] pub fn warning(message: impl Into<String>) -> Self { Self::new(Severity::Warning, message) }
    #[inline] pub fn error(message: impl Into<String>) -> Self { Self::new(Severity::Error, message) }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.severity, self.message)
    }
}

/// Recoverable failures of an editing operation. The operation that
/// returns one of these has not changed any committed geometry.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EditError {
    #[error("a polygon is already being drawn")]
    AlreadyDrawing,
    #[error("a boundary already exists; clear it before drawing another")]
    BoundaryExists,
    #[error("draw or load a boundary before adding parcels")]
    NoBoundary,
    #[error("nothing is being drawn")]
    NotDrawing,
    #[error("a polygon needs at least 3 vertices, only {0} placed")]
    TooFewVertices(usize),
    #[error("no parcel with index {0}")]
    NoSuchParcel(usize),
    #[error("the {0} tool is not available")]
    ToolUnavailable(&'static str),
    #[error("no reference polygon at this location")]
    NoPolygonAtPoint,
    #[error("nothing is selected")]
    EmptySelection,
    #[error("selected polygons do not form one connected area")]
    NotContiguous,
    #[error("parcel rejected: {}", .0.join("; "))]
    ParcelRejected(Vec<String>),
    #[error("slice must start on the boundary or a parcel")]
    SliceNoTarget,
    #[error("slice must end on the same polygon it started on")]
    SliceWrongTarget,
    #[error("slice is too short ({length:.2} < {min:.2})")]
    SliceTooShort { length: f64, min: f64 },
    #[error("slice would leave a piece with fewer than 3 vertices")]
    SliceDegenerate,
    #[error("could not locate the slice points on the polygon ring")]
    SliceNotLocated,
    #[error("the resulting geometry is degenerate")]
    DegenerateGeometry,
    #[error("parcels are invalid: {}", .0.join("; "))]
    InvalidParcels(Vec<String>),
}

impl EditError {
    /// Severity the caller should present this failure with.
    pub fn severity(&self) -> Severity {
        match self {
            EditError::AlreadyDrawing
            | EditError::BoundaryExists
            | EditError::NotDrawing
            | EditError::TooFewVertices(_)
            | EditError::NoPolygonAtPoint
            | EditError::EmptySelection => Severity::Info,
            EditError::ParcelRejected(_)
            | EditError::SliceNoTarget
            | EditError::SliceWrongTarget
            | EditError::SliceTooShort { .. } => Severity::Warning,
            EditError::NoBoundary
            | EditError::NoSuchParcel(_)
            | EditError::ToolUnavailable(_)
            | EditError::NotContiguous
            | EditError::SliceDegenerate
            | EditError::SliceNotLocated
            | EditError::DegenerateGeometry
            | EditError::InvalidParcels(_) => Severity::Error,
        }
    }

    /// Convert into a caller-visible message.
    pub fn notice(&self) -> Notice {
        Notice::new(self.severity(), self.to_string())
    }
}
