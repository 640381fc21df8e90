//! Canvas transform: maps canvas space to screen space and back.
//!
//! ```text
//! screen = (canvas - scroll) * scale + viewport_origin + viewport_size / 2
//! ```
//!
//! `scroll` is therefore the canvas point shown at the viewport center.
//! Animated transitions move the current scale/scroll toward a target pair
//! in `advance()`; instantaneous operations set both.

use crate::config::InteractionConfig;
use kurbo::{Point, Rect, Size, Vec2};
use serde::{Deserialize, Serialize};

/// How a new scale/scroll pair is reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Transition {
    /// Set immediately.
    #[default]
    Instant,
    /// Entering a nested composition: start zoomed out around the anchor.
    JumpIn,
    /// Leaving to a parent composition: start zoomed in around the anchor.
    JumpOut,
    /// Ease from the current transform.
    Smooth,
}

/// How the canvas reacts to content it is asked to fit every frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ViewMode {
    /// Re-fit the content each frame until the user pans or zooms.
    #[default]
    Fitted,
    /// One canvas unit per screen pixel until the user zooms.
    Pixel,
    /// Whatever the user left it at.
    Custom,
}

/// A remembered view (the target transform), e.g. per composition.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewProperties {
    pub scale: Vec2,
    pub scroll: Vec2,
}

impl Default for ViewProperties {
    fn default() -> Self {
        Self {
            scale: Vec2::new(1.0, 1.0),
            scroll: Vec2::ZERO,
        }
    }
}

const SCALE_SETTLE_EPSILON: f64 = 1e-4;
const SCROLL_SETTLE_EPSILON: f64 = 1e-3;

/// Scale/scroll state of one canvas plus its viewport geometry.
#[derive(Debug, Clone)]
pub struct CanvasTransform {
    scale: Vec2,
    scroll: Vec2,
    scale_target: Vec2,
    scroll_target: Vec2,
    viewport_origin: Point,
    viewport_size: Size,
    view_mode: ViewMode,
    user_scrolled: bool,
    user_zoomed: bool,
    min_scale: f64,
    max_scale: f64,
    zoom_step: f64,
    fit_max_scale: f64,
    transition_speed: f64,
    jump_scale_factor: f64,
}

impl Default for CanvasTransform {
    fn default() -> Self {
        Self::new(&InteractionConfig::default())
    }
}

impl CanvasTransform {
    pub fn new(config: &InteractionConfig) -> Self {
        Self {
            scale: Vec2::new(1.0, 1.0),
            scroll: Vec2::ZERO,
            scale_target: Vec2::new(1.0, 1.0),
            scroll_target: Vec2::ZERO,
            viewport_origin: Point::ZERO,
            viewport_size: Size::ZERO,
            view_mode: ViewMode::Custom,
            user_scrolled: false,
            user_zoomed: false,
            min_scale: config.min_scale,
            max_scale: config.max_scale,
            zoom_step: config.zoom_step,
            fit_max_scale: config.fit_max_scale,
            transition_speed: config.transition_speed,
            jump_scale_factor: config.jump_scale_factor,
        }
    }

    // ─── Accessors ───────────────────────────────────────────────────────

    pub fn scale(&self) -> Vec2 {
        self.scale
    }

    pub fn scroll(&self) -> Vec2 {
        self.scroll
    }

    pub fn scale_target(&self) -> Vec2 {
        self.scale_target
    }

    pub fn scroll_target(&self) -> Vec2 {
        self.scroll_target
    }

    pub fn viewport(&self) -> Rect {
        Rect::from_origin_size(self.viewport_origin, self.viewport_size)
    }

    pub fn viewport_center(&self) -> Point {
        self.viewport_origin + self.viewport_size.to_vec2() * 0.5
    }

    /// Refresh the viewport geometry; called by the hosting view every frame.
    pub fn set_viewport(&mut self, origin: Point, size: Size) {
        if !(origin.is_finite() && size.is_finite()) || size.width < 0.0 || size.height < 0.0 {
            log::debug!("ignoring invalid viewport {origin:?} {size:?}");
            return;
        }
        self.viewport_origin = origin;
        self.viewport_size = size;
    }

    /// The remembered view: the target transform.
    pub fn view_properties(&self) -> ViewProperties {
        ViewProperties {
            scale: self.scale_target,
            scroll: self.scroll_target,
        }
    }

    pub fn is_animating(&self) -> bool {
        self.scale != self.scale_target || self.scroll != self.scroll_target
    }

    // ─── Coordinate mapping ──────────────────────────────────────────────

    pub fn transform_position(&self, canvas: Point) -> Point {
        map_to_screen(
            canvas,
            self.scale,
            self.scroll,
            self.viewport_origin,
            self.viewport_size,
        )
    }

    pub fn inverse_transform_position(&self, screen: Point) -> Point {
        map_to_canvas(
            screen,
            self.scale,
            self.scroll,
            self.viewport_origin,
            self.viewport_size,
        )
    }

    /// Map a canvas-space vector (size, offset) to screen space.
    pub fn transform_direction(&self, canvas: Vec2) -> Vec2 {
        mul(canvas, self.scale)
    }

    pub fn inverse_transform_direction(&self, screen: Vec2) -> Vec2 {
        div(screen, self.scale)
    }

    /// x-axis only mapping, used by time-based canvases.
    pub fn transform_x(&self, x: f64) -> f64 {
        (x - self.scroll.x) * self.scale.x + self.viewport_origin.x + self.viewport_size.width / 2.0
    }

    pub fn inverse_transform_x(&self, screen_x: f64) -> f64 {
        (screen_x - self.viewport_origin.x - self.viewport_size.width / 2.0) / self.scale.x
            + self.scroll.x
    }

    /// Map a screen rectangle into canvas space.
    pub fn inverse_transform_rect(&self, screen: Rect) -> Rect {
        Rect::from_points(
            self.inverse_transform_position(Point::new(screen.x0, screen.y0)),
            self.inverse_transform_position(Point::new(screen.x1, screen.y1)),
        )
    }

    /// The canvas-space area currently visible in the viewport.
    pub fn visible_canvas_area(&self) -> Rect {
        self.inverse_transform_rect(self.viewport())
    }

    // ─── Instant updates ─────────────────────────────────────────────────

    /// Set scale immediately. Invalid scales are rejected and the last valid
    /// value is kept; returns whether the scale was accepted.
    pub fn set_scale(&mut self, scale: Vec2) -> bool {
        if !is_valid_scale(scale) {
            log::debug!("rejecting invalid canvas scale {scale:?}");
            return false;
        }
        self.scale = scale;
        self.scale_target = scale;
        true
    }

    pub fn set_scroll(&mut self, scroll: Vec2) {
        if !scroll.is_finite() {
            log::debug!("rejecting non-finite canvas scroll {scroll:?}");
            return;
        }
        self.scroll = scroll;
        self.scroll_target = scroll;
    }

    /// Fit `bounds` into the viewport immediately.
    pub fn fit_area_on_canvas(&mut self, bounds: Rect) {
        self.fit_area_with_transition(bounds, Transition::Instant);
    }

    /// Fit `bounds` into the viewport preserving aspect ratio. Degenerate
    /// bounds or an empty viewport leave the transform unchanged.
    pub fn fit_area_with_transition(&mut self, bounds: Rect, transition: Transition) {
        let bounds = bounds.abs();
        if !bounds.is_finite() || bounds.width() <= 0.0 || bounds.height() <= 0.0 {
            log::trace!("fit skipped for degenerate bounds {bounds:?}");
            return;
        }
        if self.viewport_size.width <= 0.0 || self.viewport_size.height <= 0.0 {
            log::trace!("fit skipped for empty viewport");
            return;
        }

        let scale = (self.viewport_size.width / bounds.width())
            .min(self.viewport_size.height / bounds.height())
            .min(self.fit_max_scale);

        let anchor = self.viewport_center();
        self.set_area_with_transition(
            Vec2::new(scale, scale),
            bounds.center().to_vec2(),
            anchor,
            transition,
        );
    }

    /// Move to a new scale/scroll pair.
    ///
    /// For `JumpIn`/`JumpOut` the starting transform is chosen so that the
    /// canvas point under `anchor` is the same at the start and at the end of
    /// the transition.
    pub fn set_area_with_transition(
        &mut self,
        scale: Vec2,
        scroll: Vec2,
        anchor: Point,
        transition: Transition,
    ) {
        let scale = if is_valid_scale(scale) {
            scale
        } else {
            log::debug!("rejecting invalid target scale {scale:?}");
            self.scale_target
        };
        let scroll = if scroll.is_finite() {
            scroll
        } else {
            self.scroll_target
        };

        self.scale_target = scale;
        self.scroll_target = scroll;

        match transition {
            Transition::Instant => {
                self.scale = scale;
                self.scroll = scroll;
            }
            Transition::Smooth => {}
            Transition::JumpIn | Transition::JumpOut => {
                let factor = if transition == Transition::JumpIn {
                    1.0 / self.jump_scale_factor
                } else {
                    self.jump_scale_factor
                };
                let start_scale = scale * factor;
                let anchor_on_canvas = map_to_canvas(
                    anchor,
                    scale,
                    scroll,
                    self.viewport_origin,
                    self.viewport_size,
                );
                let from_center = anchor - self.viewport_center();
                self.scale = start_scale;
                self.scroll = anchor_on_canvas.to_vec2() - div(from_center, start_scale);
            }
        }
        log::debug!(
            "canvas transition {transition:?} to scale {:?} scroll {:?}",
            self.scale_target,
            self.scroll_target
        );
    }

    /// Ease the current transform toward the target by `dt` seconds.
    pub fn advance(&mut self, dt: f64) {
        if !(dt.is_finite() && dt > 0.0) || !self.is_animating() {
            return;
        }
        let t = (dt * self.transition_speed).min(1.0);
        self.scale = self.scale.lerp(self.scale_target, t);
        self.scroll = self.scroll.lerp(self.scroll_target, t);

        if (self.scale - self.scale_target).hypot() < SCALE_SETTLE_EPSILON {
            self.scale = self.scale_target;
        }
        if (self.scroll - self.scroll_target).hypot() < SCROLL_SETTLE_EPSILON {
            self.scroll = self.scroll_target;
        }
    }

    // ─── User interaction ────────────────────────────────────────────────

    /// Reset per-frame interaction flags.
    pub fn begin_frame(&mut self) {
        self.user_scrolled = false;
        self.user_zoomed = false;
    }

    pub fn user_scrolled(&self) -> bool {
        self.user_scrolled
    }

    pub fn user_zoomed(&self) -> bool {
        self.user_zoomed
    }

    /// Pan by a pointer movement given in screen pixels.
    pub fn pan_by_screen_delta(&mut self, delta: Vec2) {
        if delta == Vec2::ZERO || !delta.is_finite() {
            return;
        }
        let scroll = self.scroll - self.inverse_transform_direction(delta);
        self.scroll = scroll;
        self.scroll_target = scroll;
        self.user_scrolled = true;
    }

    /// Zoom by `wheel_steps` notches, keeping the canvas point under
    /// `cursor` fixed on screen.
    pub fn zoom_at(&mut self, cursor: Point, wheel_steps: f64) {
        if wheel_steps == 0.0 || !wheel_steps.is_finite() || !cursor.is_finite() {
            return;
        }
        let factor = self.zoom_step.powf(wheel_steps);
        let scale = Vec2::new(
            (self.scale.x * factor).clamp(self.min_scale, self.max_scale),
            (self.scale.y * factor).clamp(self.min_scale, self.max_scale),
        );
        if !is_valid_scale(scale) || scale == self.scale {
            return;
        }

        let anchor_on_canvas = self.inverse_transform_position(cursor);
        let from_center = cursor - self.viewport_center();
        self.scale = scale;
        self.scroll = anchor_on_canvas.to_vec2() - div(from_center, scale);
        self.scale_target = self.scale;
        self.scroll_target = self.scroll;
        self.user_zoomed = true;
    }

    // ─── View modes ──────────────────────────────────────────────────────

    pub fn view_mode(&self) -> ViewMode {
        self.view_mode
    }

    pub fn set_view_mode(&mut self, mode: ViewMode) {
        self.view_mode = mode;
        if mode == ViewMode::Pixel {
            self.set_scale(Vec2::new(1.0, 1.0));
        }
    }

    /// Drop out of `Fitted`/`Pixel` once the user interacted this frame.
    pub fn update_view_mode(&mut self) {
        match self.view_mode {
            ViewMode::Fitted if self.user_scrolled || self.user_zoomed => {
                self.view_mode = ViewMode::Custom;
            }
            ViewMode::Pixel if self.user_zoomed => {
                self.view_mode = ViewMode::Custom;
            }
            _ => {}
        }
    }

    /// Fit `content` if the canvas is in `Fitted` mode.
    pub fn fit_content(&mut self, content: Rect) {
        if self.view_mode == ViewMode::Fitted {
            self.fit_area_on_canvas(content);
        }
    }
}

fn is_valid_scale(scale: Vec2) -> bool {
    scale.x.is_finite() && scale.y.is_finite() && scale.x > 0.0 && scale.y > 0.0
}

fn mul(a: Vec2, b: Vec2) -> Vec2 {
    Vec2::new(a.x * b.x, a.y * b.y)
}

fn div(a: Vec2, b: Vec2) -> Vec2 {
    Vec2::new(a.x / b.x, a.y / b.y)
}

fn map_to_screen(canvas: Point, scale: Vec2, scroll: Vec2, origin: Point, size: Size) -> Point {
    origin + mul(canvas.to_vec2() - scroll, scale) + size.to_vec2() * 0.5
}

fn map_to_canvas(screen: Point, scale: Vec2, scroll: Vec2, origin: Point, size: Size) -> Point {
    (div(screen - origin - size.to_vec2() * 0.5, scale) + scroll).to_point()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn canvas() -> CanvasTransform {
        let mut c = CanvasTransform::default();
        c.set_viewport(Point::new(40.0, 30.0), Size::new(800.0, 600.0));
        c
    }

    fn assert_near(a: Point, b: Point, eps: f64) {
        assert!(
            (a - b).hypot() < eps,
            "expected {b:?}, got {a:?} (eps {eps})"
        );
    }

    #[test]
    fn roundtrip_over_several_transforms() {
        let mut c = canvas();
        let transforms = [
            (Vec2::new(1.0, 1.0), Vec2::ZERO),
            (Vec2::new(0.25, 0.25), Vec2::new(-300.0, 1200.0)),
            (Vec2::new(3.5, 0.8), Vec2::new(17.5, -4.25)),
        ];
        let points = [
            Point::new(0.0, 0.0),
            Point::new(-1e5, 3.3),
            Point::new(123.456, -987.5),
        ];
        for (scale, scroll) in transforms {
            assert!(c.set_scale(scale));
            c.set_scroll(scroll);
            for p in points {
                let back = c.inverse_transform_position(c.transform_position(p));
                assert_near(back, p, 1e-4);
            }
        }
    }

    #[test]
    fn scroll_is_viewport_center() {
        let mut c = canvas();
        c.set_scroll(Vec2::new(500.0, -200.0));
        assert_near(
            c.transform_position(Point::new(500.0, -200.0)),
            c.viewport_center(),
            1e-9,
        );
    }

    #[test]
    fn direction_ignores_scroll() {
        let mut c = canvas();
        c.set_scale(Vec2::new(2.0, 4.0));
        c.set_scroll(Vec2::new(99.0, 99.0));
        assert_eq!(c.transform_direction(Vec2::new(10.0, 10.0)), Vec2::new(20.0, 40.0));
        assert_eq!(
            c.inverse_transform_direction(Vec2::new(20.0, 0.0)),
            Vec2::new(10.0, 0.0)
        );
    }

    #[test]
    fn x_axis_matches_position_mapping() {
        let mut c = canvas();
        c.set_scale(Vec2::new(1.7, 1.0));
        c.set_scroll(Vec2::new(12.0, 0.0));
        let screen = c.transform_position(Point::new(33.0, 0.0));
        assert!((c.transform_x(33.0) - screen.x).abs() < 1e-9);
        assert!((c.inverse_transform_x(screen.x) - 33.0).abs() < 1e-9);
    }

    #[test]
    fn zoom_keeps_point_under_cursor() {
        let mut c = canvas();
        c.set_scroll(Vec2::new(250.0, 75.0));
        let cursor = Point::new(612.0, 101.0);
        for steps in [1.0, 2.0, -3.0, 0.5] {
            let before = c.inverse_transform_position(cursor);
            c.zoom_at(cursor, steps);
            let after = c.inverse_transform_position(cursor);
            assert_near(after, before, 1e-6);
        }
        assert!(c.user_zoomed());
    }

    #[test]
    fn zoom_is_clamped() {
        let mut c = canvas();
        c.zoom_at(Point::new(100.0, 100.0), 500.0);
        assert_eq!(c.scale(), Vec2::new(10.0, 10.0));
        c.zoom_at(Point::new(100.0, 100.0), -500.0);
        assert_eq!(c.scale(), Vec2::new(0.1, 0.1));
    }

    #[test]
    fn fit_centers_bounds() {
        let mut c = canvas();
        let bounds = Rect::new(-1000.0, 200.0, 3000.0, 900.0);
        c.fit_area_on_canvas(bounds);
        assert_near(c.transform_position(bounds.center()), c.viewport_center(), 1.0);

        // Whole area visible, aspect ratio preserved.
        assert_eq!(c.scale().x, c.scale().y);
        let visible = c.visible_canvas_area();
        assert!(visible.x0 <= bounds.x0 + 1e-6 && visible.x1 >= bounds.x1 - 1e-6);
        assert!(visible.y0 <= bounds.y0 + 1e-6 && visible.y1 >= bounds.y1 - 1e-6);
    }

    #[test]
    fn fit_does_not_magnify_small_bounds() {
        let mut c = canvas();
        c.fit_area_on_canvas(Rect::new(0.0, 0.0, 2.0, 1.0));
        assert_eq!(c.scale(), Vec2::new(1.0, 1.0));
    }

    #[test]
    fn fit_ignores_degenerate_bounds() {
        let mut c = canvas();
        c.set_scale(Vec2::new(2.0, 2.0));
        c.set_scroll(Vec2::new(5.0, 6.0));
        c.fit_area_on_canvas(Rect::new(10.0, 10.0, 10.0, 50.0));
        c.fit_area_on_canvas(Rect::ZERO);
        c.fit_area_on_canvas(Rect::new(0.0, 0.0, f64::NAN, 3.0));
        assert_eq!(c.scale(), Vec2::new(2.0, 2.0));
        assert_eq!(c.scroll(), Vec2::new(5.0, 6.0));
    }

    #[test]
    fn invalid_scale_keeps_last_valid() {
        let mut c = canvas();
        c.set_scale(Vec2::new(2.0, 3.0));
        for bad in [
            Vec2::new(0.0, 1.0),
            Vec2::new(-1.0, 1.0),
            Vec2::new(f64::NAN, 1.0),
            Vec2::new(1.0, f64::INFINITY),
        ] {
            assert!(!c.set_scale(bad));
            assert_eq!(c.scale(), Vec2::new(2.0, 3.0));
        }
        c.set_area_with_transition(
            Vec2::new(0.0, 0.0),
            Vec2::ZERO,
            Point::ZERO,
            Transition::Instant,
        );
        assert_eq!(c.scale(), Vec2::new(2.0, 3.0));
    }

    #[test]
    fn smooth_transition_converges() {
        let mut c = canvas();
        c.set_area_with_transition(
            Vec2::new(2.0, 2.0),
            Vec2::new(100.0, 50.0),
            c.viewport_center(),
            Transition::Smooth,
        );
        assert_eq!(c.scale(), Vec2::new(1.0, 1.0));
        assert!(c.is_animating());
        for _ in 0..200 {
            c.advance(1.0 / 60.0);
        }
        assert!(!c.is_animating());
        assert_eq!(c.scale(), Vec2::new(2.0, 2.0));
        assert_eq!(c.scroll(), Vec2::new(100.0, 50.0));
    }

    #[test]
    fn jump_keeps_anchor_fixed() {
        for transition in [Transition::JumpIn, Transition::JumpOut] {
            let mut c = canvas();
            let anchor = Point::new(200.0, 450.0);
            let scale = Vec2::new(0.5, 0.5);
            let scroll = Vec2::new(40.0, -80.0);
            c.set_area_with_transition(scale, scroll, anchor, transition);

            let at_start = c.inverse_transform_position(anchor);
            let expected = map_to_canvas(anchor, scale, scroll, c.viewport_origin, c.viewport_size);
            assert_near(at_start, expected, 1e-6);

            if transition == Transition::JumpIn {
                assert!(c.scale().x < scale.x);
            } else {
                assert!(c.scale().x > scale.x);
            }

            c.advance(1.0);
            assert_eq!(c.scale(), scale);
            assert_near(c.inverse_transform_position(anchor), expected, 1e-6);
        }
    }

    #[test]
    fn pan_moves_scroll_in_canvas_units() {
        let mut c = canvas();
        c.set_scale(Vec2::new(2.0, 2.0));
        c.pan_by_screen_delta(Vec2::new(20.0, -10.0));
        assert_eq!(c.scroll(), Vec2::new(-10.0, 5.0));
        assert!(c.user_scrolled());
        c.begin_frame();
        assert!(!c.user_scrolled());
    }

    #[test]
    fn fitted_mode_drops_to_custom_on_interaction() {
        let mut c = canvas();
        c.set_view_mode(ViewMode::Fitted);
        c.fit_content(Rect::new(0.0, 0.0, 1600.0, 1200.0));
        assert_eq!(c.scale(), Vec2::new(0.5, 0.5));

        c.begin_frame();
        c.pan_by_screen_delta(Vec2::new(3.0, 0.0));
        c.update_view_mode();
        assert_eq!(c.view_mode(), ViewMode::Custom);

        let scale = c.scale();
        c.fit_content(Rect::new(0.0, 0.0, 100.0, 100.0));
        assert_eq!(c.scale(), scale);
    }

    #[test]
    fn pixel_mode_survives_panning_but_not_zooming() {
        let mut c = canvas();
        c.set_scale(Vec2::new(3.0, 3.0));
        c.set_view_mode(ViewMode::Pixel);
        assert_eq!(c.scale(), Vec2::new(1.0, 1.0));

        c.begin_frame();
        c.pan_by_screen_delta(Vec2::new(3.0, 0.0));
        c.update_view_mode();
        assert_eq!(c.view_mode(), ViewMode::Pixel);

        c.begin_frame();
        c.zoom_at(Point::new(10.0, 10.0), 1.0);
        c.update_view_mode();
        assert_eq!(c.view_mode(), ViewMode::Custom);
    }
}
