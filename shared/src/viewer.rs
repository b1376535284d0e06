use std::fmt;

use crate::canvas::{OverlayCanvas, RasterCanvas};
use crate::config::ViewerConfig;
use crate::selection::RectSelection;
use crate::selector::{RectSelector, Selector};
use crate::transform::{AffineTransform, TransformHandle};
use crate::zoom::ZoomController;
use crate::{Point, SliceIndex};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ViewerMode {
    Selecting,
    Zooming,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ViewerError {
    /// The magnified view is baked back pixel for pixel, so both rasters
    /// must have the same size.
    SurfaceSizeMismatch {
        primary: (f64, f64),
        magnified: (f64, f64),
    },
}

impl fmt::Display for ViewerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ViewerError::SurfaceSizeMismatch { primary, magnified } => write!(
                f,
                "primary canvas is {}x{} but magnified canvas is {}x{}",
                primary.0, primary.1, magnified.0, magnified.1
            ),
        }
    }
}

impl std::error::Error for ViewerError {}

/// Flags the surrounding UI enables its controls from.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SelectionStatus {
    pub is_valid: bool,
    pub is_2d: bool,
    pub has_archive: bool,
}

/// Owns both views of a slice: the primary view (raster plus selection
/// overlay) and the magnified view. Pointer input reaches the selector or
/// the zoom controller depending on which surface it came from, and only
/// while the mode lets that surface act: selecting on the primary view,
/// panning and zoom steps on the magnified one.
pub struct Viewer<O: OverlayCanvas, R: RasterCanvas> {
    config: ViewerConfig,
    mode: ViewerMode,
    transform: TransformHandle,
    selector: RectSelector<O>,
    zoom: ZoomController<R>,
    primary: R,
    slice_image: Option<R::Image>,
}

impl<O: OverlayCanvas, R: RasterCanvas> Viewer<O, R> {
    pub fn new(
        config: ViewerConfig,
        overlay: O,
        primary: R,
        magnified: R,
    ) -> Result<Self, ViewerError> {
        if primary.size() != magnified.size() {
            return Err(ViewerError::SurfaceSizeMismatch {
                primary: primary.size(),
                magnified: magnified.size(),
            });
        }
        let transform = TransformHandle::default();
        let selector = RectSelector::new(overlay, transform.clone(), &config);
        let zoom = ZoomController::new(magnified, transform.clone(), &config);
        Ok(Self {
            config,
            mode: ViewerMode::Selecting,
            transform,
            selector,
            zoom,
            primary,
            slice_image: None,
        })
    }

    pub fn config(&self) -> &ViewerConfig {
        &self.config
    }

    pub fn mode(&self) -> ViewerMode {
        self.mode
    }

    pub fn transform(&self) -> AffineTransform {
        self.transform.get()
    }

    pub fn selector(&self) -> &RectSelector<O> {
        &self.selector
    }

    pub fn selector_mut(&mut self) -> &mut RectSelector<O> {
        &mut self.selector
    }

    pub fn zoom(&self) -> &ZoomController<R> {
        &self.zoom
    }

    pub fn primary(&self) -> &R {
        &self.primary
    }

    pub fn current_slice(&self) -> SliceIndex {
        self.selector.current_slice()
    }

    /// Toggle input: `true` means selecting, `false` means zooming.
    pub fn on_mode_toggle(&mut self, selecting: bool) {
        let mode = if selecting {
            ViewerMode::Selecting
        } else {
            ViewerMode::Zooming
        };
        self.set_mode(mode);
    }

    pub fn set_mode(&mut self, mode: ViewerMode) {
        if mode == self.mode {
            return;
        }
        log::debug!("viewer: {:?} -> {:?}", self.mode, mode);
        self.mode = mode;
        match mode {
            ViewerMode::Zooming => {
                self.selector.cancel_drag();
                self.zoom.set_source(self.slice_image.clone());
                self.zoom.reset();
                self.redraw_primary();
            }
            ViewerMode::Selecting => self.bake_magnified_view(),
        }
    }

    /// Replaces the primary image with what the magnified view shows, so
    /// selection continues against the zoomed pixels.
    fn bake_magnified_view(&mut self) {
        match self.zoom.commit() {
            Some(baked) => {
                self.primary.clear();
                self.primary.set_transform(&AffineTransform::IDENTITY);
                self.primary.draw_image(&baked);
            }
            None => self.redraw_primary(),
        }
        self.redraw_overlay();
    }

    /// New pixels for the current slice, from the image loader.
    pub fn set_slice_image(&mut self, image: R::Image) {
        self.slice_image = Some(image);
        if self.mode == ViewerMode::Zooming {
            self.zoom.set_source(self.slice_image.clone());
            self.zoom.redraw();
        }
        self.redraw_primary();
    }

    /// Slider input. Any drag in progress is dropped; the image for the new
    /// slice arrives separately through `set_slice_image`.
    pub fn on_slice_change(&mut self, slice_index: SliceIndex) {
        log::debug!("viewer: slice {slice_index}");
        self.selector.update_current_slice(slice_index);
        self.redraw_overlay();
    }

    fn redraw_primary(&mut self) {
        self.primary.clear();
        if let Some(image) = &self.slice_image {
            self.primary.set_transform(&self.transform.get());
            self.primary.draw_image(image);
        }
        self.redraw_overlay();
    }

    fn redraw_overlay(&mut self) {
        self.selector.clear_canvas_selection();
        self.selector.draw_previous_selections();
    }

    fn selecting(&self) -> bool {
        self.mode == ViewerMode::Selecting
    }

    pub fn primary_pointer_down(&mut self, point: Point) {
        if self.selecting() {
            self.selector.on_pointer_down(point);
        }
    }

    pub fn primary_pointer_move(&mut self, point: Point) {
        if self.selecting() {
            self.selector.on_pointer_move(point);
        }
    }

    pub fn primary_pointer_up(&mut self, point: Point) {
        if self.selecting() {
            self.selector.on_pointer_up(point);
        }
    }

    pub fn zoom_pointer_down(&mut self, point: Point) {
        if !self.selecting() {
            self.zoom.on_pointer_down(point);
        }
    }

    pub fn zoom_pointer_move(&mut self, point: Point) {
        if !self.selecting() {
            self.zoom.on_pointer_move(point);
        }
    }

    pub fn zoom_pointer_up(&mut self, point: Point) {
        self.zoom.on_pointer_up(point);
    }

    pub fn is_panning(&self) -> bool {
        self.zoom.is_panning()
    }

    /// Zoom steps only apply while zooming; returns whether one was applied.
    pub fn zoom_in(&mut self) -> bool {
        if self.selecting() {
            log::debug!("viewer: zoom in ignored while selecting");
            return false;
        }
        self.zoom.zoom_in()
    }

    pub fn zoom_out(&mut self) -> bool {
        if self.selecting() {
            log::debug!("viewer: zoom out ignored while selecting");
            return false;
        }
        self.zoom.zoom_out()
    }

    pub fn remove_current_selection(&mut self) {
        self.selector.remove_current_selection();
    }

    /// Archives the per-slice selections and hands them over, leaving the
    /// per-slice map empty and the archive drawn for the current slice.
    pub fn take_selection_batch(&mut self) -> Vec<RectSelection> {
        self.selector.archive_selections(None);
        self.selector.clear_canvas_selection();
        let batch = self.selector.selections();
        self.selector.clear_selections();
        self.selector.draw_previous_selections();
        log::debug!("viewer: took {} selection(s)", batch.len());
        batch
    }

    pub fn selection_status(&self) -> SelectionStatus {
        SelectionStatus {
            is_valid: self.selector.has_valid_selection(&[]),
            is_2d: self.selector.has_slice_selection(),
            has_archive: self.selector.has_archived_selections(),
        }
    }

    /// Clears selections, archive and view transform and returns to
    /// selecting before another scan is shown. State-change listeners stay
    /// registered.
    pub fn prepare_for_new_scan(&mut self) {
        self.mode = ViewerMode::Selecting;
        self.selector.clear_data();
        self.transform.reset();
        self.slice_image = None;
        self.zoom.set_source(None);
        self.zoom.reset();
        self.primary.clear();
        self.selector.update_current_slice(0);
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use super::*;
    use crate::headless::{HeadlessImage, HeadlessOverlay, HeadlessRaster};

    type TestViewer = Viewer<HeadlessOverlay, HeadlessRaster>;

    fn viewer() -> TestViewer {
        let mut viewer = Viewer::new(
            ViewerConfig::default(),
            HeadlessOverlay::new(),
            HeadlessRaster::new(512.0, 512.0),
            HeadlessRaster::new(512.0, 512.0),
        )
        .unwrap();
        viewer.set_slice_image(HeadlessImage::new("slice-0"));
        viewer
    }

    fn drag_primary(viewer: &mut TestViewer, from: (f64, f64), to: (f64, f64)) {
        viewer.primary_pointer_down(Point::new(from.0, from.1));
        viewer.primary_pointer_move(Point::new(to.0, to.1));
        viewer.primary_pointer_up(Point::new(to.0, to.1));
    }

    #[test]
    fn entering_zoom_resets_transform_and_draws_source() {
        let mut viewer = viewer();
        viewer.set_mode(ViewerMode::Zooming);
        viewer.zoom_in();
        viewer.set_mode(ViewerMode::Selecting);
        viewer.set_mode(ViewerMode::Zooming);
        assert!(viewer.transform().is_identity());
        let shown = viewer.zoom().view().snapshot().unwrap();
        assert_eq!(shown, HeadlessImage::new("slice-0"));
    }

    #[test]
    fn leaving_zoom_bakes_magnified_view_into_primary() {
        let mut viewer = viewer();
        viewer.on_mode_toggle(false);
        assert_eq!(viewer.mode(), ViewerMode::Zooming);
        viewer.zoom_in();
        viewer.zoom_pointer_down(Point::new(0.0, 0.0));
        viewer.zoom_pointer_move(Point::new(8.0, 4.0));
        viewer.zoom_pointer_up(Point::new(8.0, 4.0));
        let zoomed = viewer.transform();

        viewer.on_mode_toggle(true);
        let primary = viewer.primary().snapshot().unwrap();
        assert_eq!(primary.source, "slice-0");
        assert_eq!(primary.transform, zoomed);
        assert_eq!(viewer.selector().translation_matrix(), zoomed.get());
    }

    #[test]
    fn selections_after_zoom_are_in_slice_coordinates() {
        let mut viewer = viewer();
        viewer.set_mode(ViewerMode::Zooming);
        viewer.zoom_in();
        viewer.set_mode(ViewerMode::Selecting);
        drag_primary(&mut viewer, (256.0, 256.0), (300.0, 320.0));
        let selection = *viewer.selector().current_selection().unwrap();
        assert_eq!(selection, RectSelection::new(0, 256.0, 256.0, 22.0, 32.0));
    }

    #[test]
    fn zoom_steps_and_pans_are_ignored_while_selecting() {
        let mut viewer = viewer();
        assert!(!viewer.zoom_in());
        assert!(!viewer.zoom_out());
        viewer.zoom_pointer_down(Point::new(0.0, 0.0));
        viewer.zoom_pointer_move(Point::new(30.0, 30.0));
        viewer.zoom_pointer_up(Point::new(30.0, 30.0));
        assert!(viewer.transform().is_identity());

        drag_primary(&mut viewer, (0.0, 0.0), (40.0, 40.0));
        let shown = viewer.primary().snapshot().unwrap();
        assert_eq!(shown.transform, viewer.transform());
        assert_eq!(
            viewer.selector().current_selection(),
            Some(&RectSelection::new(0, 0.0, 0.0, 40.0, 40.0))
        );
    }

    #[test]
    fn primary_drags_are_ignored_while_zooming() {
        let mut viewer = viewer();
        viewer.set_mode(ViewerMode::Zooming);
        assert!(viewer.zoom_in());
        drag_primary(&mut viewer, (0.0, 0.0), (40.0, 40.0));
        assert!(viewer.selector().selections().is_empty());
        assert_eq!(viewer.selector().current_selection(), None);
        assert!(!viewer.selector().is_dragging());
    }

    #[test]
    fn switching_to_zoom_mid_drag_drops_the_drag() {
        let mut viewer = viewer();
        viewer.primary_pointer_down(Point::new(0.0, 0.0));
        viewer.primary_pointer_move(Point::new(40.0, 40.0));
        viewer.set_mode(ViewerMode::Zooming);
        assert!(!viewer.selector().is_dragging());
        viewer.set_mode(ViewerMode::Selecting);
        viewer.primary_pointer_up(Point::new(40.0, 40.0));
        assert!(viewer.selector().selections().is_empty());
    }

    #[test]
    fn panning_reports_gesture_state() {
        let mut viewer = viewer();
        viewer.set_mode(ViewerMode::Zooming);
        viewer.zoom_pointer_down(Point::new(10.0, 10.0));
        assert!(viewer.is_panning());
        viewer.zoom_pointer_up(Point::new(10.0, 10.0));
        assert!(!viewer.is_panning());
    }

    #[test]
    fn surfaces_of_different_sizes_are_refused() {
        let result = Viewer::new(
            ViewerConfig::default(),
            HeadlessOverlay::new(),
            HeadlessRaster::new(512.0, 512.0),
            HeadlessRaster::new(600.0, 600.0),
        );
        assert_eq!(
            result.err(),
            Some(ViewerError::SurfaceSizeMismatch {
                primary: (512.0, 512.0),
                magnified: (600.0, 600.0),
            })
        );
    }

    #[test]
    fn toggling_to_the_same_mode_is_a_no_op() {
        let mut viewer = viewer();
        let draws = viewer.primary().draw_count;
        viewer.on_mode_toggle(true);
        assert_eq!(viewer.primary().draw_count, draws);
    }

    #[test]
    fn slice_change_redraws_that_slices_archive() {
        let mut viewer = viewer();
        viewer.on_slice_change(2);
        drag_primary(&mut viewer, (0.0, 0.0), (10.0, 10.0));
        viewer.take_selection_batch();
        viewer.on_slice_change(5);
        assert!(viewer.selector().canvas().visible_rects().is_empty());
        viewer.on_slice_change(2);
        let visible = viewer.selector().canvas().visible_rects();
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].1, viewer.config().archived_color);
    }

    #[test]
    fn batch_take_archives_and_empties_selections() {
        let mut viewer = viewer();
        viewer.on_slice_change(1);
        drag_primary(&mut viewer, (0.0, 0.0), (10.0, 10.0));
        viewer.on_slice_change(4);
        drag_primary(&mut viewer, (5.0, 5.0), (25.0, 15.0));
        assert_eq!(
            viewer.selection_status(),
            SelectionStatus {
                is_valid: true,
                is_2d: true,
                has_archive: false
            }
        );

        let batch = viewer.take_selection_batch();
        assert_eq!(batch.iter().map(|s| s.slice_index).collect::<Vec<_>>(), vec![1, 4]);
        assert!(viewer.selector().selections().is_empty());
        assert_eq!(
            viewer.selection_status(),
            SelectionStatus {
                is_valid: true,
                is_2d: false,
                has_archive: true
            }
        );
    }

    #[test]
    fn state_changes_reach_subscribers() {
        let mut viewer = viewer();
        let hits = Rc::new(Cell::new(0));
        let counter = hits.clone();
        viewer
            .selector_mut()
            .state_change_emitter()
            .subscribe(move || counter.set(counter.get() + 1));
        drag_primary(&mut viewer, (0.0, 0.0), (10.0, 10.0));
        assert_eq!(hits.get(), 1);
        viewer.remove_current_selection();
        assert_eq!(hits.get(), 2);
    }

    #[test]
    fn new_scan_clears_everything_but_listeners() {
        let mut viewer = viewer();
        let counter = Rc::new(Cell::new(0));
        let hits = counter.clone();
        viewer
            .selector_mut()
            .state_change_emitter()
            .subscribe(move || hits.set(hits.get() + 1));
        viewer.on_slice_change(3);
        drag_primary(&mut viewer, (0.0, 0.0), (10.0, 10.0));
        viewer.take_selection_batch();
        viewer.set_mode(ViewerMode::Zooming);
        viewer.zoom_in();

        viewer.prepare_for_new_scan();
        assert_eq!(viewer.mode(), ViewerMode::Selecting);
        assert!(!viewer.zoom_in());
        assert_eq!(viewer.selection_status(), SelectionStatus::default());
        assert!(viewer.transform().is_identity());
        assert_eq!(viewer.current_slice(), 0);
        assert!(viewer.primary().snapshot().is_none());
        assert_eq!(viewer.selector_mut().state_change_emitter().listener_count(), 1);
    }
}
