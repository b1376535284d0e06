use crate::canvas::RasterCanvas;
use crate::config::ViewerConfig;
use crate::transform::{AffineTransform, TransformError, TransformHandle};
use crate::{normalize_point, Point};

#[derive(Clone, Copy, Debug, PartialEq)]
enum PanMode {
    Idle,
    Active { last: Point },
}

/// Drives the magnified view: pointer drags pan it, zoom steps scale it
/// about its centre. Every change goes through the shared transform handle
/// before the view is redrawn.
pub struct ZoomController<R: RasterCanvas> {
    view: R,
    transform: TransformHandle,
    source: Option<R::Image>,
    pan: PanMode,
    zoom_in_factor: f64,
    zoom_out_factor: f64,
}

impl<R: RasterCanvas> ZoomController<R> {
    pub fn new(view: R, transform: TransformHandle, config: &ViewerConfig) -> Self {
        Self {
            view,
            transform,
            source: None,
            pan: PanMode::Idle,
            zoom_in_factor: config.zoom_in_factor,
            zoom_out_factor: config.zoom_out_factor,
        }
    }

    pub fn view(&self) -> &R {
        &self.view
    }

    pub fn is_panning(&self) -> bool {
        matches!(self.pan, PanMode::Active { .. })
    }

    pub fn transform(&self) -> AffineTransform {
        self.transform.get()
    }

    pub fn set_source(&mut self, image: Option<R::Image>) {
        self.source = image;
    }

    /// Back to the identity transform, redrawn from the source image.
    pub fn reset(&mut self) {
        self.pan = PanMode::Idle;
        self.transform.reset();
        self.redraw();
    }

    pub fn on_pointer_down(&mut self, point: Point) {
        let Some(point) = normalize_point(point) else {
            return;
        };
        self.pan = PanMode::Active { last: point };
    }

    pub fn on_pointer_move(&mut self, point: Point) {
        let PanMode::Active { last } = self.pan else {
            return;
        };
        let Some(point) = normalize_point(point) else {
            return;
        };
        self.pan = PanMode::Active { last: point };
        let (dx, dy) = (point.x - last.x, point.y - last.y);
        if dx == 0.0 && dy == 0.0 {
            return;
        }
        let moved = self.transform.update(|transform| {
            let (lx, ly) = transform.inverse_vector(dx, dy);
            transform.translate(lx, ly)
        });
        match moved {
            Ok(_) => self.redraw(),
            Err(err) => log::warn!("zoom: pan by ({dx}, {dy}) refused: {err}"),
        }
    }

    /// Ends the gesture. The offset reached so far stays in the transform.
    pub fn on_pointer_up(&mut self, _point: Point) {
        self.pan = PanMode::Idle;
    }

    pub fn zoom_in(&mut self) -> bool {
        self.zoom_by(self.zoom_in_factor)
    }

    pub fn zoom_out(&mut self) -> bool {
        self.zoom_by(self.zoom_out_factor)
    }

    /// Scales about the centre of the view. A zero or non-finite factor is
    /// refused and leaves the transform as it was.
    pub fn zoom_by(&mut self, factor: f64) -> bool {
        let (width, height) = self.view.size();
        let centre = Point::new(width / 2.0, height / 2.0);
        let zoomed = self.transform.update(|transform| {
            let pivot = transform.apply_inverse(centre);
            transform.translate(pivot.x, pivot.y)?;
            transform.scale(factor, factor)?;
            transform.translate(-pivot.x, -pivot.y)
        });
        match zoomed {
            Ok(transform) => {
                log::debug!("zoom: factor {factor} -> {:?}", transform.get());
                self.redraw();
                true
            }
            Err(err) => {
                log::warn!("zoom: factor {factor} refused: {}", describe(err));
                false
            }
        }
    }

    pub fn redraw(&mut self) {
        self.view.clear();
        let Some(source) = &self.source else {
            return;
        };
        self.view.set_transform(&self.transform.get());
        self.view.draw_image(source);
    }

    /// Raster copy of the magnified view as currently shown.
    pub fn commit(&self) -> Option<R::Image> {
        self.view.snapshot()
    }
}

fn describe(err: TransformError) -> String {
    match err {
        TransformError::Degenerate { .. } => "would collapse the view".to_string(),
        TransformError::NonFinite => err.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::headless::{HeadlessImage, HeadlessRaster};

    fn controller() -> ZoomController<HeadlessRaster> {
        let mut zoom = ZoomController::new(
            HeadlessRaster::new(600.0, 600.0),
            TransformHandle::default(),
            &ViewerConfig::default(),
        );
        zoom.set_source(Some(HeadlessImage::new("slice-0")));
        zoom
    }

    #[test]
    fn zoom_in_keeps_centre_fixed() {
        let mut zoom = controller();
        assert!(zoom.zoom_in());
        let transform = zoom.transform();
        assert_eq!(transform.get(), [2.0, 0.0, 0.0, 2.0, -300.0, -300.0]);
        let centre = transform.apply(Point::new(300.0, 300.0));
        assert_eq!(centre, Point::new(300.0, 300.0));
    }

    #[test]
    fn zoom_in_then_out_round_trips() {
        let mut zoom = controller();
        zoom.zoom_in();
        zoom.zoom_in();
        zoom.zoom_out();
        zoom.zoom_out();
        assert!(zoom.transform().approx_eq(&AffineTransform::IDENTITY, 1e-9));
    }

    #[test]
    fn zero_factor_is_refused() {
        let mut zoom = controller();
        zoom.zoom_in();
        let before = zoom.transform();
        let draws = zoom.view().draw_count;
        assert!(!zoom.zoom_by(0.0));
        assert!(!zoom.zoom_by(f64::INFINITY));
        assert_eq!(zoom.transform(), before);
        assert_eq!(zoom.view().draw_count, draws);
    }

    #[test]
    fn pan_follows_pointer_at_any_scale() {
        let mut zoom = controller();
        zoom.zoom_in();
        zoom.on_pointer_down(Point::new(100.0, 100.0));
        zoom.on_pointer_move(Point::new(110.0, 95.0));
        zoom.on_pointer_move(Point::new(130.0, 90.0));
        zoom.on_pointer_up(Point::new(130.0, 90.0));
        let [a, _, _, d, e, f] = zoom.transform().get();
        assert_eq!((a, d), (2.0, 2.0));
        assert!((e - (-300.0 + 30.0)).abs() < 1e-9);
        assert!((f - (-300.0 - 10.0)).abs() < 1e-9);
        assert!(!zoom.is_panning());
    }

    #[test]
    fn pan_offset_persists_across_gestures() {
        let mut zoom = controller();
        for _ in 0..2 {
            zoom.on_pointer_down(Point::new(0.0, 0.0));
            zoom.on_pointer_move(Point::new(5.0, 5.0));
            zoom.on_pointer_up(Point::new(5.0, 5.0));
        }
        assert_eq!(zoom.transform().get(), [1.0, 0.0, 0.0, 1.0, 10.0, 10.0]);
    }

    #[test]
    fn move_without_press_does_nothing() {
        let mut zoom = controller();
        zoom.on_pointer_move(Point::new(40.0, 40.0));
        assert!(zoom.transform().is_identity());
        assert_eq!(zoom.view().draw_count, 0);
    }

    #[test]
    fn redraw_uses_current_transform_and_commit_bakes_it() {
        let mut zoom = controller();
        zoom.zoom_in();
        let baked = zoom.commit().unwrap();
        assert_eq!(baked.source, "slice-0");
        assert_eq!(baked.transform, zoom.transform());
    }

    #[test]
    fn reset_restores_identity() {
        let mut zoom = controller();
        zoom.zoom_in();
        zoom.on_pointer_down(Point::new(0.0, 0.0));
        zoom.reset();
        assert!(zoom.transform().is_identity());
        assert!(!zoom.is_panning());
        assert_eq!(zoom.commit().unwrap().transform, AffineTransform::IDENTITY);
    }

    #[test]
    fn commit_without_source_is_empty() {
        let mut zoom = ZoomController::new(
            HeadlessRaster::new(10.0, 10.0),
            TransformHandle::default(),
            &ViewerConfig::default(),
        );
        zoom.redraw();
        assert!(zoom.commit().is_none());
    }
}
