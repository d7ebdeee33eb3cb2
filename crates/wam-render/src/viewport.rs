//! Viewport: zoom and pan between device pixels and scene coordinates.
//!
//! Both spaces have their origin at the top-left with y growing downward:
//!
//! ```text
//! device = scene * zoom + pan
//! scene  = (device - pan) / zoom
//! ```

use wam_core::{Bounds, Point};

pub const MIN_ZOOM: f64 = 0.1;
pub const MAX_ZOOM: f64 = 8.0;
const ZOOM_STEP: f64 = 1.2;

/// Zoom and pan of the visible surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    zoom: f64,
    pan: Point,
    width: f64,
    height: f64,
}

/// Saved zoom/pan, restored after an export.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewState {
    pub zoom: f64,
    pub pan: Point,
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(1280.0, 800.0)
    }
}

impl Viewport {
    /// A viewport over a `width`×`height` device surface at 100% zoom.
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            zoom: 1.0,
            pan: Point::ZERO,
            width,
            height,
        }
    }

    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    pub fn pan(&self) -> Point {
        self.pan
    }

    pub fn width(&self) -> f64 {
        self.width
    }

    pub fn height(&self) -> f64 {
        self.height
    }

    pub fn set_surface_size(&mut self, width: f64, height: f64) {
        self.width = width;
        self.height = height;
    }

    /// Set the zoom, clamped to `MIN_ZOOM..=MAX_ZOOM`.
    pub fn set_zoom(&mut self, zoom: f64) {
        if zoom.is_finite() {
            self.zoom = zoom.clamp(MIN_ZOOM, MAX_ZOOM);
        }
    }

    /// Zoom by `factor` keeping the scene point under `anchor` (device
    /// coordinates) fixed on screen.
    pub fn zoom_at(&mut self, anchor: Point, factor: f64) {
        let fixed = self.device_to_scene(anchor);
        self.set_zoom(self.zoom * factor);
        self.pan = Point::new(anchor.x - fixed.x * self.zoom, anchor.y - fixed.y * self.zoom);
    }

    pub fn zoom_in(&mut self) {
        self.zoom_at(self.center(), ZOOM_STEP);
    }

    pub fn zoom_out(&mut self) {
        self.zoom_at(self.center(), 1.0 / ZOOM_STEP);
    }

    pub fn set_pan(&mut self, pan: Point) {
        self.pan = pan;
    }

    pub fn pan_by(&mut self, dx: f64, dy: f64) {
        self.pan = self.pan.translate(dx, dy);
    }

    /// Back to 100% zoom with the scene origin at the device origin.
    pub fn reset(&mut self) {
        self.zoom = 1.0;
        self.pan = Point::ZERO;
    }

    pub fn is_identity(&self) -> bool {
        self.zoom == 1.0 && self.pan == Point::ZERO
    }

    pub fn state(&self) -> ViewState {
        ViewState {
            zoom: self.zoom,
            pan: self.pan,
        }
    }

    pub fn restore(&mut self, state: ViewState) {
        self.zoom = state.zoom;
        self.pan = state.pan;
    }

    pub fn device_to_scene(&self, p: Point) -> Point {
        Point::new((p.x - self.pan.x) / self.zoom, (p.y - self.pan.y) / self.zoom)
    }

    pub fn scene_to_device(&self, p: Point) -> Point {
        Point::new(p.x * self.zoom + self.pan.x, p.y * self.zoom + self.pan.y)
    }

    /// Scene-space rectangle currently visible on the surface.
    pub fn visible_scene_rect(&self) -> Bounds {
        Bounds::from_corners(
            self.device_to_scene(Point::ZERO),
            self.device_to_scene(Point::new(self.width, self.height)),
        )
    }

    fn center(&self) -> Point {
        Point::new(self.width / 2.0, self.height / 2.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn identity_mapping() {
        let vp = Viewport::new(800.0, 600.0);
        let p = Point::new(12.0, 34.0);
        assert_eq!(vp.device_to_scene(p), p);
        assert_eq!(vp.scene_to_device(p), p);
        assert!(vp.is_identity());
    }

    #[test]
    fn zoom_and_pan_roundtrip() {
        let mut vp = Viewport::new(800.0, 600.0);
        vp.set_zoom(2.0);
        vp.pan_by(100.0, 50.0);
        let scene = Point::new(10.0, 20.0);
        let device = vp.scene_to_device(scene);
        assert_eq!(device, Point::new(120.0, 90.0));
        assert_eq!(vp.device_to_scene(device), scene);
    }

    #[test]
    fn zoom_at_keeps_anchor_fixed() {
        let mut vp = Viewport::new(800.0, 600.0);
        let anchor = Point::new(200.0, 100.0);
        let before = vp.device_to_scene(anchor);
        vp.zoom_at(anchor, 2.0);
        let after = vp.device_to_scene(anchor);
        assert!((before.x - after.x).abs() < 1e-9);
        assert!((before.y - after.y).abs() < 1e-9);
    }

    #[test]
    fn zoom_is_clamped() {
        let mut vp = Viewport::default();
        vp.set_zoom(100.0);
        assert_eq!(vp.zoom(), MAX_ZOOM);
        vp.set_zoom(0.0);
        assert_eq!(vp.zoom(), MIN_ZOOM);
        vp.set_zoom(f64::NAN);
        assert_eq!(vp.zoom(), MIN_ZOOM);
    }

    #[test]
    fn save_reset_restore() {
        let mut vp = Viewport::default();
        vp.set_zoom(1.5);
        vp.pan_by(-40.0, 10.0);
        let saved = vp.state();
        vp.reset();
        assert!(vp.is_identity());
        vp.restore(saved);
        assert_eq!(vp.zoom(), 1.5);
        assert_eq!(vp.pan(), Point::new(-40.0, 10.0));
    }
}
