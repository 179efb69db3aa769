//! Viewport transform between screen pixels and world units
//!
//! `world = (screen - canvas_origin - pan) / zoom`. Zoom scales uniformly
//! from the world origin; it does not recentre on the cursor.

use flow_engine::Point;
use serde::{Deserialize, Serialize};

/// Zoom limits and step size
pub mod defaults {
    pub const ZOOM_MIN: f64 = 0.2;
    pub const ZOOM_MAX: f64 = 3.0;
    pub const ZOOM_STEP: f64 = 0.1;
    pub const ZOOM_INITIAL: f64 = 1.0;
}

/// Zoom bounds for a viewport
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ViewportConfig {
    pub zoom_min: f64,
    pub zoom_max: f64,
    pub zoom_step: f64,
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self {
            zoom_min: defaults::ZOOM_MIN,
            zoom_max: defaults::ZOOM_MAX,
            zoom_step: defaults::ZOOM_STEP,
        }
    }
}

impl ViewportConfig {
    /// Bounds that are safe to clamp with
    ///
    /// Non-finite or non-positive bounds fall back to the defaults, inverted
    /// bounds are swapped, and an unusable step falls back to the default.
    pub fn normalized(&self) -> Self {
        let usable = |v: f64| v.is_finite() && v > 0.0;
        let (zoom_min, zoom_max) = if !usable(self.zoom_min) || !usable(self.zoom_max) {
            (defaults::ZOOM_MIN, defaults::ZOOM_MAX)
        } else if self.zoom_min > self.zoom_max {
            (self.zoom_max, self.zoom_min)
        } else {
            (self.zoom_min, self.zoom_max)
        };
        let zoom_step = if usable(self.zoom_step) {
            self.zoom_step
        } else {
            defaults::ZOOM_STEP
        };
        Self {
            zoom_min,
            zoom_max,
            zoom_step,
        }
    }
}

/// Wire form of a viewport; zoom is clamped when converted
#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct ViewportParts {
    pan: Point,
    zoom: Option<f64>,
    canvas_origin: Point,
    canvas_size: Point,
}

impl From<ViewportParts> for Viewport {
    /// Deserialized viewports use the default zoom bounds
    fn from(parts: ViewportParts) -> Self {
        let config = ViewportConfig::default();
        let zoom = parts
            .zoom
            .filter(|z| z.is_finite())
            .unwrap_or(defaults::ZOOM_INITIAL)
            .clamp(config.zoom_min, config.zoom_max);
        Self {
            pan: parts.pan,
            zoom,
            canvas_origin: parts.canvas_origin,
            canvas_size: parts.canvas_size,
            config,
        }
    }
}

/// Pan/zoom state of one editor canvas
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "ViewportParts")]
pub struct Viewport {
    pan: Point,
    zoom: f64,
    /// Screen position of the canvas' top-left corner
    canvas_origin: Point,
    /// Canvas width and height in pixels
    canvas_size: Point,
    #[serde(skip)]
    config: ViewportConfig,
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(ViewportConfig::default())
    }
}

impl Viewport {
    pub fn new(config: ViewportConfig) -> Self {
        let config = {
            let normalized = config.normalized();
            if normalized != config {
                log::warn!("Adjusted unusable zoom bounds {:?} to {:?}", config, normalized);
            }
            normalized
        };
        Self {
            pan: Point::ORIGIN,
            zoom: defaults::ZOOM_INITIAL.clamp(config.zoom_min, config.zoom_max),
            canvas_origin: Point::ORIGIN,
            canvas_size: Point::ORIGIN,
            config,
        }
    }

    pub fn pan(&self) -> Point {
        self.pan
    }

    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    pub fn canvas_origin(&self) -> Point {
        self.canvas_origin
    }

    pub fn config(&self) -> &ViewportConfig {
        &self.config
    }

    /// Record where the canvas sits on screen and how large it is
    pub fn set_canvas_rect(&mut self, origin: Point, size: Point) {
        self.canvas_origin = origin;
        self.canvas_size = size;
    }

    pub fn screen_to_world(&self, screen: Point) -> Point {
        (screen - self.canvas_origin - self.pan) / self.zoom
    }

    pub fn world_to_screen(&self, world: Point) -> Point {
        world * self.zoom + self.pan + self.canvas_origin
    }

    /// Shift the pan offset by a screen-space delta
    pub fn pan_by(&mut self, delta: Point) {
        self.pan = self.pan + delta;
    }

    /// Step zoom up (`direction > 0`) or down (`direction < 0`), clamped
    pub fn zoom_step(&mut self, direction: f64) -> f64 {
        let target = self.zoom + direction.signum() * self.config.zoom_step;
        self.zoom = target.clamp(self.config.zoom_min, self.config.zoom_max);
        self.zoom
    }

    /// Apply a wheel scroll: scrolling down (`delta_y > 0`) zooms out
    pub fn zoom_wheel(&mut self, delta_y: f64) -> f64 {
        let direction = if delta_y > 0.0 { -1.0 } else { 1.0 };
        self.zoom_step(direction)
    }

    pub fn zoom_in(&mut self) -> f64 {
        self.zoom_step(1.0)
    }

    pub fn zoom_out(&mut self) -> f64 {
        self.zoom_step(-1.0)
    }

    /// Back to no pan and the initial zoom
    pub fn reset(&mut self) {
        self.pan = Point::ORIGIN;
        self.zoom = defaults::ZOOM_INITIAL.clamp(self.config.zoom_min, self.config.zoom_max);
    }

    /// World point currently under the centre of the canvas
    pub fn canvas_center_world(&self) -> Point {
        self.screen_to_world(self.canvas_origin + self.canvas_size / 2.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx_eq(a: Point, b: Point) -> bool {
        (a.x - b.x).abs() < 1e-9 && (a.y - b.y).abs() < 1e-9
    }

    #[test]
    fn test_screen_to_world_formula() {
        let mut viewport = Viewport::default();
        viewport.set_canvas_rect(Point::new(256.0, 64.0), Point::new(800.0, 600.0));
        viewport.pan_by(Point::new(40.0, -20.0));
        viewport.zoom_step(1.0);

        let world = viewport.screen_to_world(Point::new(406.0, 154.0));
        // (406 - 256 - 40) / 1.1, (154 - 64 + 20) / 1.1
        assert!(approx_eq(world, Point::new(100.0, 100.0)));
    }

    #[test]
    fn test_round_trip() {
        let mut viewport = Viewport::default();
        viewport.set_canvas_rect(Point::new(13.0, 7.0), Point::new(640.0, 480.0));
        viewport.pan_by(Point::new(-123.5, 88.25));
        viewport.zoom_out();
        viewport.zoom_out();
        viewport.zoom_out();

        for p in [
            Point::new(0.0, 0.0),
            Point::new(450.0, 250.0),
            Point::new(-1200.5, 3.75),
        ] {
            assert!(approx_eq(viewport.screen_to_world(viewport.world_to_screen(p)), p));
        }
    }

    #[test]
    fn test_zoom_stays_clamped() {
        let mut viewport = Viewport::default();
        for _ in 0..100 {
            viewport.zoom_wheel(120.0);
            assert!(viewport.zoom() >= defaults::ZOOM_MIN);
        }
        assert!((viewport.zoom() - defaults::ZOOM_MIN).abs() < 1e-9);

        for _ in 0..100 {
            viewport.zoom_wheel(-120.0);
            assert!(viewport.zoom() <= defaults::ZOOM_MAX);
        }
        assert_eq!(viewport.zoom(), defaults::ZOOM_MAX);
    }

    #[test]
    fn test_wheel_direction() {
        let mut viewport = Viewport::default();
        assert!(viewport.zoom_wheel(-1.0) > 1.0);
        viewport.reset();
        assert!(viewport.zoom_wheel(1.0) < 1.0);
        viewport.reset();
        // A zero delta counts as scrolling up.
        assert!(viewport.zoom_wheel(0.0) > 1.0);
    }

    #[test]
    fn test_pan_accumulates() {
        let mut viewport = Viewport::default();
        viewport.pan_by(Point::new(10.0, 5.0));
        viewport.pan_by(Point::new(-3.0, 2.0));
        assert_eq!(viewport.pan(), Point::new(7.0, 7.0));

        viewport.reset();
        assert_eq!(viewport.pan(), Point::ORIGIN);
        assert_eq!(viewport.zoom(), 1.0);
    }

    #[test]
    fn test_inverted_or_invalid_bounds_are_normalized() {
        let config: ViewportConfig =
            serde_json::from_str(r#"{"zoomMin": 3.0, "zoomMax": 0.2}"#).unwrap();
        let mut viewport = Viewport::new(config);
        assert_eq!(viewport.config().zoom_min, 0.2);
        assert_eq!(viewport.config().zoom_max, 3.0);
        assert_eq!(viewport.zoom(), 1.0);
        for _ in 0..50 {
            viewport.zoom_in();
        }
        assert_eq!(viewport.zoom(), 3.0);
        viewport.reset();
        assert_eq!(viewport.zoom(), 1.0);

        let viewport = Viewport::new(ViewportConfig {
            zoom_min: f64::NAN,
            zoom_max: 2.0,
            zoom_step: -1.0,
        });
        assert_eq!(*viewport.config(), ViewportConfig::default());
    }

    #[test]
    fn test_deserialized_zoom_is_clamped() {
        let viewport: Viewport = serde_json::from_str(
            r#"{"pan": {"x": 5.0, "y": 6.0}, "zoom": 10.0,
                "canvasOrigin": {"x": 0.0, "y": 0.0}, "canvasSize": {"x": 800.0, "y": 600.0}}"#,
        )
        .unwrap();
        assert_eq!(viewport.zoom(), defaults::ZOOM_MAX);
        assert_eq!(viewport.pan(), Point::new(5.0, 6.0));

        let viewport: Viewport = serde_json::from_str(r#"{"zoom": 0.01}"#).unwrap();
        assert_eq!(viewport.zoom(), defaults::ZOOM_MIN);

        let original = {
            let mut v = Viewport::default();
            v.pan_by(Point::new(-40.0, 12.5));
            v.zoom_out();
            v
        };
        let json = serde_json::to_string(&original).unwrap();
        let restored: Viewport = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, original);
    }

    #[test]
    fn test_canvas_center_world() {
        let mut viewport = Viewport::default();
        viewport.set_canvas_rect(Point::new(100.0, 50.0), Point::new(800.0, 600.0));
        viewport.zoom_step(1.0);
        viewport.zoom_step(1.0);
        viewport.pan_by(Point::new(120.0, 0.0));

        let center = viewport.canvas_center_world();
        assert!(approx_eq(center, Point::new(280.0 / 1.2, 300.0 / 1.2)));
    }
}
