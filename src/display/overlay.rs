// Overlay compositor - Haptic feedback indicator bars
//
// The handheld has no rumble motor, so feedback is shown visually: the frame
// is drawn shifted up or down by a few rows and the two bars just outside the
// image are cleared every frame so the shifted content never leaves residue.
//
// The compositor runs before scaling. Under Integer2x it draws on the panel at
// 2× coordinates; under Interpolated2_5x it draws on the scratch canvas at 1×
// coordinates, so the bars are scaled together with the image.

use super::framebuffer::{NativeFrame, PanelFrame, Rect, BLACK};
use super::scaler::{ScaleGeometry, Scaler};

/// Height of each indicator bar in destination canvas rows
pub const BAR_HEIGHT: usize = 2;

/// Indicator bar pair for one scaling mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OverlayRect {
    /// Bar directly above the image
    pub top: Rect,
    /// Bar directly below the image
    pub bottom: Rect,
}

impl OverlayRect {
    /// Derive the bar pair from a validated scaling geometry
    pub fn for_geometry(geometry: &ScaleGeometry) -> Self {
        let image = geometry.image;
        Self {
            top: Rect::new(image.x, image.y - BAR_HEIGHT, image.width, BAR_HEIGHT),
            bottom: Rect::new(image.x, image.bottom(), image.width, BAR_HEIGHT),
        }
    }
}

/// Haptic feedback state sampled from the core for one frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Feedback {
    /// No feedback: the frame sits at its resting position
    #[default]
    Idle,
    /// Feedback active: shift the frame by this many canvas rows
    Shake(i32),
}

impl Feedback {
    /// Row shift to apply, clamped so shifted content stays within the bars
    pub fn shift(self) -> isize {
        match self {
            Feedback::Idle => 0,
            Feedback::Shake(rows) => {
                (rows as isize).clamp(-(BAR_HEIGHT as isize), BAR_HEIGHT as isize)
            }
        }
    }
}

/// Draws the frame and its indicator bars into the destination canvas
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OverlayCompositor {
    rects: OverlayRect,
}

impl OverlayCompositor {
    /// Create a compositor for the scaler's geometry
    pub fn new(scaler: &Scaler) -> Self {
        Self {
            rects: OverlayRect::for_geometry(scaler.geometry()),
        }
    }

    /// Current bar geometry
    pub fn rects(&self) -> &OverlayRect {
        &self.rects
    }

    /// Compose one frame into the destination canvas
    ///
    /// Clears both bars, places the frame (shifted when feedback is active)
    /// and blanks the rows the shift uncovered inside the image window.
    ///
    /// # Arguments
    /// * `scaler` - Scaler whose geometry this compositor was built from
    /// * `frame` - Native frame from the core
    /// * `canvas` - Destination canvas (panel or scratch)
    /// * `feedback` - Feedback state for this frame
    pub fn compose(
        &self,
        scaler: &Scaler,
        frame: &NativeFrame,
        canvas: &mut PanelFrame,
        feedback: Feedback,
    ) {
        canvas.fill_rect(self.rects.top, BLACK);
        canvas.fill_rect(self.rects.bottom, BLACK);

        let shift = feedback.shift();
        scaler.place(frame, canvas, shift);

        let image = scaler.geometry().image;
        let rows = shift.unsigned_abs();
        if shift > 0 {
            canvas.fill_rect(Rect::new(image.x, image.y, image.width, rows), BLACK);
        } else if shift < 0 {
            canvas.fill_rect(
                Rect::new(image.x, image.bottom() - rows, image.width, rows),
                BLACK,
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::scaler::ScalingMode;

    #[test]
    fn test_overlay_rects_integer_2x() {
        let scaler = Scaler::new(ScalingMode::Integer2x).unwrap();
        let rects = OverlayCompositor::new(&scaler).rects;
        assert_eq!(rects.top, Rect::new(24, 14, 192, 2));
        assert_eq!(rects.bottom, Rect::new(24, 144, 192, 2));
    }

    #[test]
    fn test_overlay_rects_interpolated() {
        let scaler = Scaler::new(ScalingMode::Interpolated2_5x).unwrap();
        let rects = OverlayCompositor::new(&scaler).rects;
        assert_eq!(rects.top, Rect::new(24, 14, 96, 2));
        assert_eq!(rects.bottom, Rect::new(24, 80, 96, 2));
    }

    #[test]
    fn test_feedback_shift_is_clamped() {
        assert_eq!(Feedback::Idle.shift(), 0);
        assert_eq!(Feedback::Shake(1).shift(), 1);
        assert_eq!(Feedback::Shake(-2).shift(), -2);
        assert_eq!(Feedback::Shake(40).shift(), 2);
        assert_eq!(Feedback::Shake(-40).shift(), -2);
    }

    #[test]
    fn test_compose_clears_bars() {
        let scaler = Scaler::new(ScalingMode::Integer2x).unwrap();
        let compositor = OverlayCompositor::new(&scaler);
        let mut frame = NativeFrame::new();
        frame.clear(0x7777);
        let mut canvas = PanelFrame::new();
        canvas.clear(0xFFFF);

        compositor.compose(&scaler, &frame, &mut canvas, Feedback::Idle);

        for x in 24..216 {
            assert_eq!(canvas.get_pixel(x, 14), BLACK);
            assert_eq!(canvas.get_pixel(x, 15), BLACK);
            assert_eq!(canvas.get_pixel(x, 144), BLACK);
            assert_eq!(canvas.get_pixel(x, 145), BLACK);
            assert_eq!(canvas.get_pixel(x, 16), 0x7777);
            assert_eq!(canvas.get_pixel(x, 143), 0x7777);
        }
        // Outside the bars and image nothing is touched
        assert_eq!(canvas.get_pixel(0, 0), 0xFFFF);
        assert_eq!(canvas.get_pixel(24, 13), 0xFFFF);
    }

    #[test]
    fn test_compose_shift_down_blanks_uncovered_rows() {
        let scaler = Scaler::new(ScalingMode::Integer2x).unwrap();
        let compositor = OverlayCompositor::new(&scaler);
        let mut frame = NativeFrame::new();
        frame.clear(0x7777);
        let mut canvas = PanelFrame::new();
        canvas.clear(0xFFFF);

        compositor.compose(&scaler, &frame, &mut canvas, Feedback::Shake(2));

        assert_eq!(canvas.get_pixel(100, 15), BLACK);
        assert_eq!(canvas.get_pixel(100, 16), BLACK);
        assert_eq!(canvas.get_pixel(100, 17), BLACK);
        assert_eq!(canvas.get_pixel(100, 18), 0x7777);
        // Shifted image now covers the bottom bar
        assert_eq!(canvas.get_pixel(100, 145), 0x7777);
    }

    #[test]
    fn test_compose_shift_up_blanks_uncovered_rows() {
        let scaler = Scaler::new(ScalingMode::Interpolated2_5x).unwrap();
        let compositor = OverlayCompositor::new(&scaler);
        let mut frame = NativeFrame::new();
        frame.clear(0x7777);
        let mut canvas = PanelFrame::new();
        canvas.clear(0xFFFF);

        compositor.compose(&scaler, &frame, &mut canvas, Feedback::Shake(-1));

        assert_eq!(canvas.get_pixel(30, 15), 0x7777);
        assert_eq!(canvas.get_pixel(30, 78), 0x7777);
        assert_eq!(canvas.get_pixel(30, 79), BLACK);
        assert_eq!(canvas.get_pixel(30, 80), BLACK);
    }
}
