// Frame Buffer - RGB565 pixel grids for the core frame, scratch canvas and panel
//
// The emulation core renders a 96×64 image; the panel is 240×160. Both are
// stored as row-major RGB565 samples. Buffers are heap-allocated once at
// construction and never resized.

use super::pixel::rgb565_to_rgba;

/// Native (core) frame width in pixels
pub const NATIVE_WIDTH: usize = 96;

/// Native (core) frame height in pixels
pub const NATIVE_HEIGHT: usize = 64;

/// Physical panel width in pixels
pub const PANEL_WIDTH: usize = 240;

/// Physical panel height in pixels
pub const PANEL_HEIGHT: usize = 160;

/// Color used for cleared areas and bars
pub const BLACK: u16 = 0x0000;

/// Axis-aligned rectangle in pixel coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    /// Left edge
    pub x: usize,
    /// Top edge
    pub y: usize,
    /// Width in pixels
    pub width: usize,
    /// Height in pixels
    pub height: usize,
}

impl Rect {
    /// Create a new rectangle
    pub const fn new(x: usize, y: usize, width: usize, height: usize) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// One past the bottom row
    pub const fn bottom(&self) -> usize {
        self.y + self.height
    }

    /// One past the right column
    pub const fn right(&self) -> usize {
        self.x + self.width
    }
}

/// Fixed-size RGB565 frame
///
/// `W` and `H` are the frame dimensions; the row stride always equals `W`.
pub struct Frame<const W: usize, const H: usize> {
    /// Pixel data, `W * H` RGB565 samples
    pixels: Box<[u16]>,
}

/// Frame produced by the emulation core (96×64)
pub type NativeFrame = Frame<NATIVE_WIDTH, NATIVE_HEIGHT>;

/// Frame at panel resolution (240×160), used for the panel and the scratch canvas
pub type PanelFrame = Frame<PANEL_WIDTH, PANEL_HEIGHT>;

impl<const W: usize, const H: usize> Frame<W, H> {
    /// Frame width in pixels
    pub const WIDTH: usize = W;

    /// Frame height in pixels
    pub const HEIGHT: usize = H;

    /// Total number of samples
    pub const SIZE: usize = W * H;

    /// Create a new frame cleared to black
    pub fn new() -> Self {
        Self {
            pixels: vec![BLACK; W * H].into_boxed_slice(),
        }
    }

    /// Set a pixel at the given coordinates
    ///
    /// # Panics
    /// Panics if coordinates are out of bounds
    #[inline]
    pub fn set_pixel(&mut self, x: usize, y: usize, color: u16) {
        assert!(x < W, "X coordinate {} out of bounds", x);
        assert!(y < H, "Y coordinate {} out of bounds", y);

        self.pixels[y * W + x] = color;
    }

    /// Get a pixel at the given coordinates
    ///
    /// # Panics
    /// Panics if coordinates are out of bounds
    #[inline]
    pub fn get_pixel(&self, x: usize, y: usize) -> u16 {
        assert!(x < W, "X coordinate {} out of bounds", x);
        assert!(y < H, "Y coordinate {} out of bounds", y);

        self.pixels[y * W + x]
    }

    /// Clear the whole frame to a color
    pub fn clear(&mut self, color: u16) {
        self.pixels.fill(color);
    }

    /// Fill a rectangle, clipped to the frame
    pub fn fill_rect(&mut self, rect: Rect, color: u16) {
        let right = rect.right().min(W);
        let bottom = rect.bottom().min(H);
        if rect.x >= right {
            return;
        }
        for y in rect.y..bottom {
            self.pixels[y * W + rect.x..y * W + right].fill(color);
        }
    }

    /// Borrow one row
    #[inline]
    pub fn row(&self, y: usize) -> &[u16] {
        &self.pixels[y * W..(y + 1) * W]
    }

    /// Borrow one row mutably
    #[inline]
    pub fn row_mut(&mut self, y: usize) -> &mut [u16] {
        &mut self.pixels[y * W..(y + 1) * W]
    }

    /// Get the raw samples
    pub fn as_slice(&self) -> &[u16] {
        &self.pixels
    }

    /// Get mutable access to the raw samples
    pub fn as_mut_slice(&mut self) -> &mut [u16] {
        &mut self.pixels
    }

    /// Copy pixel data from another frame of the same size
    pub fn copy_from(&mut self, other: &Self) {
        self.pixels.copy_from_slice(&other.pixels);
    }

    /// Convert the frame to RGBA8888 for display
    ///
    /// # Arguments
    /// * `output` - Output buffer (must be at least `W * H * 4` bytes)
    ///
    /// # Panics
    /// Panics if output buffer is too small
    pub fn to_rgba(&self, output: &mut [u8]) {
        assert!(
            output.len() >= W * H * 4,
            "Output buffer too small for RGBA conversion"
        );

        for (&pixel, rgba) in self.pixels.iter().zip(output.chunks_exact_mut(4)) {
            rgba.copy_from_slice(&rgb565_to_rgba(pixel));
        }
    }
}

impl<const W: usize, const H: usize> Default for Frame<W, H> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const W: usize, const H: usize> std::fmt::Debug for Frame<W, H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Frame<{}x{}>", W, H)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_creation() {
        let native = NativeFrame::new();
        assert_eq!(native.as_slice().len(), NATIVE_WIDTH * NATIVE_HEIGHT);

        let panel = PanelFrame::new();
        assert_eq!(panel.as_slice().len(), PANEL_WIDTH * PANEL_HEIGHT);
        assert!(panel.as_slice().iter().all(|&p| p == BLACK));
    }

    #[test]
    fn test_set_get_pixel() {
        let mut frame = NativeFrame::new();
        frame.set_pixel(95, 63, 0xABCD);
        assert_eq!(frame.get_pixel(95, 63), 0xABCD);
        assert_eq!(frame.row(63)[95], 0xABCD);
    }

    #[test]
    fn test_clear() {
        let mut frame = PanelFrame::new();
        frame.set_pixel(0, 0, 0x1234);
        frame.clear(0x5555);
        assert_eq!(frame.get_pixel(0, 0), 0x5555);
        assert_eq!(frame.get_pixel(239, 159), 0x5555);
    }

    #[test]
    fn test_fill_rect_is_clipped() {
        let mut frame = NativeFrame::new();
        frame.fill_rect(Rect::new(90, 60, 20, 20), 0xFFFF);

        assert_eq!(frame.get_pixel(90, 60), 0xFFFF);
        assert_eq!(frame.get_pixel(95, 63), 0xFFFF);
        assert_eq!(frame.get_pixel(89, 60), BLACK);
        assert_eq!(frame.get_pixel(90, 59), BLACK);
    }

    #[test]
    fn test_fill_rect_outside_frame() {
        let mut frame = NativeFrame::new();
        frame.fill_rect(Rect::new(200, 0, 4, 4), 0xFFFF);
        assert!(frame.as_slice().iter().all(|&p| p == BLACK));
    }

    #[test]
    fn test_to_rgba() {
        let mut frame = NativeFrame::new();
        frame.set_pixel(0, 0, 0xF800);

        let mut rgba = vec![0u8; NativeFrame::SIZE * 4];
        frame.to_rgba(&mut rgba);

        assert_eq!(&rgba[0..4], &[0xFF, 0x00, 0x00, 0xFF]);
        assert_eq!(&rgba[4..8], &[0x00, 0x00, 0x00, 0xFF]);
    }

    #[test]
    #[should_panic]
    fn test_set_pixel_out_of_bounds_x() {
        let mut frame = NativeFrame::new();
        frame.set_pixel(NATIVE_WIDTH, 0, 0);
    }

    #[test]
    #[should_panic]
    fn test_set_pixel_out_of_bounds_y() {
        let mut frame = PanelFrame::new();
        frame.set_pixel(0, PANEL_HEIGHT, 0);
    }
}
