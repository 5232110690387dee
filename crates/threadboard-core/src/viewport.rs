//! Pan/zoom mapping between screen and canvas coordinates.

use crate::config::ViewportConfig;
use kurbo::{Affine, Point, Size, Vec2};
use serde::{Deserialize, Serialize};

/// The view onto the canvas.
///
/// `screen = canvas * zoom + pan`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    /// Current translation offset in screen pixels.
    pub pan: Vec2,
    pub zoom: f64,
    pub min_zoom: f64,
    pub max_zoom: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            pan: Vec2::ZERO,
            zoom: 1.0,
            min_zoom: 0.1,
            max_zoom: 5.0,
        }
    }
}

impl Viewport {
    pub fn new(config: &ViewportConfig) -> Self {
        Self {
            min_zoom: config.min_zoom,
            max_zoom: config.max_zoom,
            ..Self::default()
        }
    }

    /// Canvas to screen transform, for rendering.
    pub fn transform(&self) -> Affine {
        Affine::translate(self.pan) * Affine::scale(self.zoom)
    }

    pub fn screen_to_canvas(&self, screen: Point) -> Point {
        Point::new((screen.x - self.pan.x) / self.zoom, (screen.y - self.pan.y) / self.zoom)
    }

    pub fn canvas_to_screen(&self, canvas: Point) -> Point {
        self.transform() * canvas
    }

    /// Canvas point shown at the top-left of the screen.
    pub fn visible_origin(&self) -> Point {
        self.screen_to_canvas(Point::ZERO)
    }

    /// Convert a length in screen pixels to canvas units.
    pub fn screen_len(&self, pixels: f64) -> f64 {
        pixels / self.zoom
    }

    /// Pan by a delta in screen pixels.
    pub fn pan_by(&mut self, delta: Vec2) {
        self.pan += delta;
    }

    /// Zoom by `factor`, keeping the canvas point under `screen` fixed.
    pub fn zoom_at(&mut self, screen: Point, factor: f64) {
        let new_zoom = (self.zoom * factor).clamp(self.min_zoom, self.max_zoom);
        if (new_zoom - self.zoom).abs() < f64::EPSILON {
            return;
        }
        let anchor = self.screen_to_canvas(screen);
        self.zoom = new_zoom;
        self.pan += screen - self.canvas_to_screen(anchor);
    }

    /// Scroll the view the way a plain wheel does: content moves against the delta.
    pub fn scroll(&mut self, delta: Vec2) {
        self.pan -= delta;
    }

    /// Zoom by a vertical wheel delta: positive `delta` zooms out, as a
    /// scroll-down does.
    pub fn wheel_zoom(&mut self, delta: f64, screen: Point, factor_per_unit: f64) {
        let target = (self.zoom - delta * factor_per_unit).clamp(self.min_zoom, self.max_zoom);
        self.zoom_at(screen, target / self.zoom);
    }

    /// Show an image of `image` size centered in a `view` sized screen,
    /// never magnifying past 100%.
    pub fn fit_image(&mut self, image: Size, view: Size, padding: f64) {
        if image.width <= 0.0 || image.height <= 0.0 {
            self.reset();
            return;
        }
        let available = Size::new(
            (view.width - padding * 2.0).max(1.0),
            (view.height - padding * 2.0).max(1.0),
        );
        let scale = (available.width / image.width)
            .min(available.height / image.height)
            .min(1.0);
        self.zoom = scale.clamp(self.min_zoom, self.max_zoom);
        self.pan = Vec2::new(
            (view.width - image.width * self.zoom) / 2.0,
            (view.height - image.height * self.zoom) / 2.0,
        );
    }

    pub fn reset(&mut self) {
        self.pan = Vec2::ZERO;
        self.zoom = 1.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(a: Point, b: Point) {
        assert!((a - b).hypot() < 1e-9, "expected {b:?}, got {a:?}");
    }

    #[test]
    fn test_identity_by_default() {
        let viewport = Viewport::default();
        assert_close(viewport.screen_to_canvas(Point::new(10.0, 20.0)), Point::new(10.0, 20.0));
    }

    #[test]
    fn test_screen_canvas_round_trip() {
        let viewport = Viewport {
            pan: Vec2::new(40.0, -30.0),
            zoom: 2.5,
            ..Viewport::default()
        };
        let canvas = viewport.screen_to_canvas(Point::new(140.0, 70.0));
        assert_close(canvas, Point::new(40.0, 40.0));
        assert_close(viewport.canvas_to_screen(canvas), Point::new(140.0, 70.0));
    }

    #[test]
    fn test_zoom_at_keeps_cursor_fixed() {
        let mut viewport = Viewport::default();
        let cursor = Point::new(200.0, 100.0);
        let before = viewport.screen_to_canvas(cursor);
        viewport.zoom_at(cursor, 2.0);
        assert!((viewport.zoom - 2.0).abs() < f64::EPSILON);
        assert_close(viewport.screen_to_canvas(cursor), before);
    }

    #[test]
    fn test_zoom_is_clamped() {
        let mut viewport = Viewport::default();
        viewport.zoom_at(Point::ZERO, 100.0);
        assert!((viewport.zoom - 5.0).abs() < f64::EPSILON);
        viewport.wheel_zoom(1e6, Point::ZERO, 0.001);
        assert!((viewport.zoom - 0.1).abs() < 1e-12);
    }

    #[test]
    fn test_wheel_down_zooms_out() {
        let mut viewport = Viewport::default();
        viewport.wheel_zoom(100.0, Point::new(50.0, 50.0), 0.001);
        assert!((viewport.zoom - 0.9).abs() < 1e-12);
    }

    #[test]
    fn test_scroll_moves_content_against_delta() {
        let mut viewport = Viewport::default();
        viewport.scroll(Vec2::new(30.0, 100.0));
        assert!((viewport.zoom - 1.0).abs() < f64::EPSILON);
        assert_eq!(viewport.pan, Vec2::new(-30.0, -100.0));
        assert_close(viewport.screen_to_canvas(Point::ZERO), Point::new(30.0, 100.0));
    }

    #[test]
    fn test_fit_large_image() {
        let mut viewport = Viewport::default();
        viewport.fit_image(Size::new(2000.0, 1000.0), Size::new(1100.0, 800.0), 50.0);
        assert!((viewport.zoom - 0.5).abs() < 1e-12);
        assert_close(viewport.pan.to_point(), Point::new(50.0, 150.0));
    }

    #[test]
    fn test_fit_small_image_does_not_magnify() {
        let mut viewport = Viewport::default();
        viewport.fit_image(Size::new(200.0, 100.0), Size::new(1000.0, 800.0), 50.0);
        assert!((viewport.zoom - 1.0).abs() < f64::EPSILON);
        assert_close(viewport.pan.to_point(), Point::new(400.0, 350.0));
    }

    #[test]
    fn test_visible_origin() {
        let viewport = Viewport {
            pan: Vec2::new(-200.0, -100.0),
            zoom: 2.0,
            ..Viewport::default()
        };
        assert_close(viewport.visible_origin(), Point::new(100.0, 50.0));
    }
}
