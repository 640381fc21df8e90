//! Per-frame interaction context.
//!
//! Handlers receive the canvas, selection and input of the frame being
//! processed explicitly; nothing is reachable outside of `update()`.

use crate::input::FrameInput;
use crate::selection::SelectionRegistry;
use trellis_core::{CanvasTransform, InteractionConfig, Point, Vec2};

pub struct FrameContext<'a> {
    pub canvas: &'a mut CanvasTransform,
    pub selection: &'a mut SelectionRegistry,
    pub input: &'a FrameInput,
    pub config: &'a InteractionConfig,
}

impl<'a> FrameContext<'a> {
    pub fn new(
        canvas: &'a mut CanvasTransform,
        selection: &'a mut SelectionRegistry,
        input: &'a FrameInput,
        config: &'a InteractionConfig,
    ) -> Self {
        Self {
            canvas,
            selection,
            input,
            config,
        }
    }

    /// Pointer position in canvas space.
    pub fn pointer_on_canvas(&self) -> Point {
        self.canvas.inverse_transform_position(self.input.pointer)
    }

    /// A screen-pixel distance along x expressed in canvas units.
    pub fn screen_distance_on_canvas(&self, pixels: f64) -> f64 {
        self.canvas
            .inverse_transform_direction(Vec2::new(pixels, 0.0))
            .x
            .abs()
    }

    /// Pan with middle/secondary drag and zoom with the wheel while the
    /// pointer is over the viewport.
    pub fn update_canvas(&mut self) {
        self.canvas.begin_frame();
        if self.input.hovered {
            if self.input.middle.down || self.input.secondary.down {
                self.canvas.pan_by_screen_delta(self.input.pointer_delta);
            }
            if self.input.wheel != 0.0 {
                self.canvas.zoom_at(self.input.pointer, self.input.wheel);
            }
        }
        self.canvas.update_view_mode();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use trellis_core::{Size, ViewMode};

    fn canvas() -> CanvasTransform {
        let mut canvas = CanvasTransform::default();
        canvas.set_viewport(Point::ZERO, Size::new(200.0, 100.0));
        canvas
    }

    #[test]
    fn middle_drag_pans() {
        let mut canvas = canvas();
        let mut selection = SelectionRegistry::new();
        let config = InteractionConfig::default();
        let mut input = FrameInput {
            hovered: true,
            pointer_delta: Vec2::new(10.0, -5.0),
            ..FrameInput::default()
        };
        input.middle.down = true;

        let mut cx = FrameContext::new(&mut canvas, &mut selection, &input, &config);
        cx.update_canvas();
        assert!(cx.canvas.user_scrolled());
        assert_eq!(canvas.scroll(), Vec2::new(-10.0, 5.0));
    }

    #[test]
    fn wheel_outside_viewport_is_ignored() {
        let mut canvas = canvas();
        let mut selection = SelectionRegistry::new();
        let config = InteractionConfig::default();
        let input = FrameInput {
            hovered: false,
            wheel: 2.0,
            ..FrameInput::default()
        };

        FrameContext::new(&mut canvas, &mut selection, &input, &config).update_canvas();
        assert_eq!(canvas.scale(), Vec2::new(1.0, 1.0));
    }

    #[test]
    fn interaction_leaves_fitted_mode() {
        let mut canvas = canvas();
        canvas.set_view_mode(ViewMode::Fitted);
        let mut selection = SelectionRegistry::new();
        let config = InteractionConfig::default();
        let input = FrameInput {
            hovered: true,
            wheel: 1.0,
            pointer: Point::new(50.0, 50.0),
            ..FrameInput::default()
        };

        FrameContext::new(&mut canvas, &mut selection, &input, &config).update_canvas();
        assert_eq!(canvas.view_mode(), ViewMode::Custom);
    }

    #[test]
    fn pixel_distance_scales_with_zoom() {
        let mut canvas = canvas();
        canvas.set_scale(Vec2::new(2.0, 2.0));
        let mut selection = SelectionRegistry::new();
        let config = InteractionConfig::default();
        let input = FrameInput::default();
        let cx = FrameContext::new(&mut canvas, &mut selection, &input, &config);
        assert_eq!(cx.screen_distance_on_canvas(20.0), 10.0);
    }
}
