use serde::{Deserialize, Serialize};

mod archive;
mod archive_file;
mod canvas;
mod config;
mod events;
mod export;
pub mod headless;
mod selection;
mod selector;
mod transform;
mod viewer;
mod zoom;

pub use archive::SelectionArchive;
pub use archive_file::{
    decode_archive_file, encode_archive_file, ArchiveFileDecodeError, ARCHIVE_FILE_MAGIC,
    ARCHIVE_FILE_VERSION,
};
pub use canvas::{OverlayCanvas, RasterCanvas, SelectionStyle};
pub use config::{ConfigError, ViewerConfig};
pub use events::{StateChangeEmitter, SubscriptionId};
pub use export::SelectionExport;
pub use selection::{Bounds, RectSelection, SliceSelection};
pub use selector::{RectSelector, Selector};
pub use transform::{AffineTransform, TransformError, TransformHandle};
pub use viewer::{SelectionStatus, Viewer, ViewerError, ViewerMode};
pub use zoom::ZoomController;

/// Index of a slice within a scan volume.
pub type SliceIndex = u32;

/// Pointer position, in canvas pixels when captured and in slice pixels once
/// mapped through the inverse view transform.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

pub fn normalize_point(point: Point) -> Option<Point> {
    if !point.is_finite() {
        return None;
    }
    Some(point)
}
