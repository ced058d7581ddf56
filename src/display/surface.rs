// Presentation surface - Panel frame, scratch canvas and the backend swap
//
// The surface owns both pixel buffers. A frame is produced by acquiring the
// destination for the active scaling mode, drawing into it and presenting.
// Present is the only call that may block on vertical sync.
//
// Per-frame failures are reported as transient so the caller can skip the
// frame; a run of consecutive failures is escalated as `SurfaceError::Lost`.

use super::framebuffer::{PanelFrame, BLACK, PANEL_HEIGHT, PANEL_WIDTH};
use log::{debug, warn};
use thiserror::Error;

/// Consecutive acquire/present failures tolerated before the surface is lost
pub const MAX_CONSECUTIVE_SURFACE_FAILURES: u32 = 30;

/// Number of clear+present cycles used to flush every physical back buffer
pub const CLEAR_CYCLES: usize = 3;

/// Pixel format of the panel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelFormat {
    /// 16-bit 5-6-5 RGB
    Rgb565,
}

/// Display mode requested from the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PanelMode {
    /// Width in pixels
    pub width: usize,
    /// Height in pixels
    pub height: usize,
    /// Pixel format
    pub format: PixelFormat,
    /// Present on vertical blank (multi-buffered)
    pub vsync: bool,
}

impl PanelMode {
    /// Mode for the fixed 240×160 RGB565 panel
    pub fn panel(vsync: bool) -> Self {
        Self {
            width: PANEL_WIDTH,
            height: PANEL_HEIGHT,
            format: PixelFormat::Rgb565,
            vsync,
        }
    }
}

/// Errors raised by the presentation layer
#[derive(Debug, Error)]
pub enum SurfaceError {
    /// The backend cannot provide the requested mode
    #[error("unsupported display mode {width}x{height} {format:?}")]
    Unsupported {
        /// Requested width
        width: usize,
        /// Requested height
        height: usize,
        /// Requested pixel format
        format: PixelFormat,
    },

    /// The backend is temporarily unable to accept a frame
    #[error("display surface not ready")]
    NotReady,

    /// Backend specific failure
    #[error("display backend error: {0}")]
    Backend(String),

    /// Too many consecutive failures; the surface is unusable
    #[error("display surface lost after {0} consecutive failures")]
    Lost(u32),
}

/// Physical display the surface presents to
pub trait PanelBackend {
    /// Negotiate the display mode; failure here is fatal to the pipeline
    fn configure(&mut self, mode: PanelMode) -> Result<(), SurfaceError>;

    /// Prepare to accept a new frame
    fn begin_frame(&mut self) -> Result<(), SurfaceError> {
        Ok(())
    }

    /// Show the panel frame (swap/flip)
    fn present(&mut self, frame: &PanelFrame) -> Result<(), SurfaceError>;
}

/// Which buffer the compositor writes into
///
/// Resolved once when a scaling mode is selected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DestinationHandle {
    /// Draw straight onto the panel frame
    Panel,
    /// Draw onto the scratch canvas, then upscale onto the panel
    Scratch,
}

/// Panel frame, scratch canvas and backend
#[derive(Debug)]
pub struct PresentationSurface<B: PanelBackend> {
    backend: B,
    mode: PanelMode,
    panel: PanelFrame,
    scratch: PanelFrame,
    consecutive_failures: u32,
    frames_presented: u64,
}

impl<B: PanelBackend> PresentationSurface<B> {
    /// Create a surface and negotiate the display mode
    ///
    /// # Arguments
    /// * `backend` - Physical display backend
    /// * `vsync` - Whether presents wait for vertical blank
    ///
    /// # Returns
    /// The surface, or the backend's refusal of the mode
    pub fn new(mut backend: B, vsync: bool) -> Result<Self, SurfaceError> {
        let mode = PanelMode::panel(vsync);
        backend.configure(mode)?;

        Ok(Self {
            backend,
            mode,
            panel: PanelFrame::new(),
            scratch: PanelFrame::new(),
            consecutive_failures: 0,
            frames_presented: 0,
        })
    }

    /// Re-negotiate the display mode (e.g. after a vsync change)
    pub fn reconfigure(&mut self, vsync: bool) -> Result<(), SurfaceError> {
        let mode = PanelMode::panel(vsync);
        self.backend.configure(mode)?;
        self.mode = mode;
        Ok(())
    }

    /// Currently negotiated mode
    pub fn mode(&self) -> PanelMode {
        self.mode
    }

    /// Acquire the writable destination for this frame
    pub fn acquire(&mut self, handle: DestinationHandle) -> Result<&mut PanelFrame, SurfaceError> {
        match self.backend.begin_frame() {
            Ok(()) => Ok(match handle {
                DestinationHandle::Panel => &mut self.panel,
                DestinationHandle::Scratch => &mut self.scratch,
            }),
            Err(err) => Err(self.record_failure(err)),
        }
    }

    /// Borrow the scratch canvas and the panel frame together
    pub fn scratch_and_panel(&mut self) -> (&PanelFrame, &mut PanelFrame) {
        (&self.scratch, &mut self.panel)
    }

    /// Mutable access to the scratch canvas (shared with the menu)
    pub fn scratch_mut(&mut self) -> &mut PanelFrame {
        &mut self.scratch
    }

    /// The panel frame as it will be or was last presented
    pub fn panel(&self) -> &PanelFrame {
        &self.panel
    }

    /// Copy the whole scratch canvas onto the panel frame
    pub fn blit_scratch(&mut self) {
        self.panel.copy_from(&self.scratch);
    }

    /// Present the panel frame
    pub fn present(&mut self) -> Result<(), SurfaceError> {
        match self.backend.present(&self.panel) {
            Ok(()) => {
                self.consecutive_failures = 0;
                self.frames_presented += 1;
                Ok(())
            }
            Err(err) => Err(self.record_failure(err)),
        }
    }

    /// Clear both buffers and present, repeated once per physical back buffer
    pub fn clear_cycles(&mut self) -> Result<(), SurfaceError> {
        for cycle in 0..CLEAR_CYCLES {
            self.panel.clear(BLACK);
            self.scratch.clear(BLACK);
            match self.present() {
                Ok(()) => {}
                Err(SurfaceError::Lost(n)) => return Err(SurfaceError::Lost(n)),
                Err(err) => debug!("clear cycle {} not presented: {}", cycle, err),
            }
        }
        Ok(())
    }

    /// Reset the scratch canvas after a scaling mode change
    pub fn reset_scratch(&mut self) {
        self.scratch.clear(BLACK);
    }

    /// Total successful presents
    pub fn frames_presented(&self) -> u64 {
        self.frames_presented
    }

    /// Get a reference to the backend
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Get a mutable reference to the backend
    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    fn record_failure(&mut self, err: SurfaceError) -> SurfaceError {
        if let SurfaceError::Lost(_) = err {
            return err;
        }
        self.consecutive_failures += 1;
        if self.consecutive_failures >= MAX_CONSECUTIVE_SURFACE_FAILURES {
            SurfaceError::Lost(self.consecutive_failures)
        } else {
            warn!(
                "skipping frame ({} consecutive surface failures): {}",
                self.consecutive_failures, err
            );
            err
        }
    }
}

/// Backend that keeps presented frames in memory
///
/// Used for tests, benchmarks and runs without a display. Failures can be
/// injected to exercise the skip/escalate path.
#[derive(Debug, Default)]
pub struct HeadlessPanel {
    last_frame: Option<PanelFrame>,
    presents: u64,
    configured: Vec<PanelMode>,
    pending_failures: u32,
    supported: Option<PanelMode>,
}

impl HeadlessPanel {
    /// Create a headless panel accepting the 240×160 RGB565 mode
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a headless panel that only accepts the given dimensions
    pub fn supporting(width: usize, height: usize) -> Self {
        Self {
            supported: Some(PanelMode {
                width,
                height,
                format: PixelFormat::Rgb565,
                vsync: false,
            }),
            ..Self::default()
        }
    }

    /// Make the next `count` begin/present calls fail with `NotReady`
    pub fn fail_next(&mut self, count: u32) {
        self.pending_failures = count;
    }

    /// Number of successful presents
    pub fn presents(&self) -> u64 {
        self.presents
    }

    /// Last presented frame
    pub fn last_frame(&self) -> Option<&PanelFrame> {
        self.last_frame.as_ref()
    }

    /// Every mode that was negotiated, oldest first
    pub fn configured_modes(&self) -> &[PanelMode] {
        &self.configured
    }

    fn take_failure(&mut self) -> Result<(), SurfaceError> {
        if self.pending_failures > 0 {
            self.pending_failures -= 1;
            Err(SurfaceError::NotReady)
        } else {
            Ok(())
        }
    }
}

impl PanelBackend for HeadlessPanel {
    fn configure(&mut self, mode: PanelMode) -> Result<(), SurfaceError> {
        let (width, height) = self
            .supported
            .map(|m| (m.width, m.height))
            .unwrap_or((PANEL_WIDTH, PANEL_HEIGHT));
        if mode.width != width || mode.height != height {
            return Err(SurfaceError::Unsupported {
                width: mode.width,
                height: mode.height,
                format: mode.format,
            });
        }
        self.configured.push(mode);
        Ok(())
    }

    fn begin_frame(&mut self) -> Result<(), SurfaceError> {
        self.take_failure()
    }

    fn present(&mut self, frame: &PanelFrame) -> Result<(), SurfaceError> {
        self.take_failure()?;
        match &mut self.last_frame {
            Some(last) => last.copy_from(frame),
            None => {
                let mut copy = PanelFrame::new();
                copy.copy_from(frame);
                self.last_frame = Some(copy);
            }
        }
        self.presents += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_surface_negotiates_mode() {
        let surface = PresentationSurface::new(HeadlessPanel::new(), true).unwrap();
        assert_eq!(surface.mode(), PanelMode::panel(true));
        assert_eq!(surface.backend().configured_modes().len(), 1);
    }

    #[test]
    fn test_surface_rejects_unsupported_mode() {
        let result = PresentationSurface::new(HeadlessPanel::supporting(320, 240), true);
        assert!(matches!(result, Err(SurfaceError::Unsupported { .. })));
    }

    #[test]
    fn test_acquire_resolves_handle() {
        let mut surface = PresentationSurface::new(HeadlessPanel::new(), false).unwrap();
        surface
            .acquire(DestinationHandle::Scratch)
            .unwrap()
            .set_pixel(0, 0, 0xAAAA);
        assert_eq!(surface.panel().get_pixel(0, 0), BLACK);

        surface.blit_scratch();
        assert_eq!(surface.panel().get_pixel(0, 0), 0xAAAA);

        surface
            .acquire(DestinationHandle::Panel)
            .unwrap()
            .set_pixel(1, 0, 0xBBBB);
        assert_eq!(surface.panel().get_pixel(1, 0), 0xBBBB);
    }

    #[test]
    fn test_present_reaches_backend() {
        let mut surface = PresentationSurface::new(HeadlessPanel::new(), false).unwrap();
        surface
            .acquire(DestinationHandle::Panel)
            .unwrap()
            .set_pixel(5, 5, 0x1234);
        surface.present().unwrap();

        assert_eq!(surface.frames_presented(), 1);
        let last = surface.backend().last_frame().unwrap();
        assert_eq!(last.get_pixel(5, 5), 0x1234);
    }

    #[test]
    fn test_clear_cycles_present_three_black_frames() {
        let mut surface = PresentationSurface::new(HeadlessPanel::new(), true).unwrap();
        surface.scratch_mut().clear(0xFFFF);
        surface
            .acquire(DestinationHandle::Panel)
            .unwrap()
            .clear(0xFFFF);

        surface.clear_cycles().unwrap();

        assert_eq!(surface.backend().presents(), CLEAR_CYCLES as u64);
        assert!(surface.panel().as_slice().iter().all(|&p| p == BLACK));
        let (scratch, _) = surface.scratch_and_panel();
        assert!(scratch.as_slice().iter().all(|&p| p == BLACK));
    }

    #[test]
    fn test_transient_failure_then_recovery() {
        let mut surface = PresentationSurface::new(HeadlessPanel::new(), false).unwrap();
        surface.backend_mut().fail_next(2);

        assert!(matches!(
            surface.acquire(DestinationHandle::Panel),
            Err(SurfaceError::NotReady)
        ));
        assert!(matches!(surface.present(), Err(SurfaceError::NotReady)));
        assert!(surface.present().is_ok());
    }

    #[test]
    fn test_repeated_failures_escalate() {
        let mut surface = PresentationSurface::new(HeadlessPanel::new(), false).unwrap();
        surface
            .backend_mut()
            .fail_next(MAX_CONSECUTIVE_SURFACE_FAILURES);

        for _ in 0..MAX_CONSECUTIVE_SURFACE_FAILURES - 1 {
            assert!(matches!(surface.present(), Err(SurfaceError::NotReady)));
        }
        assert!(matches!(
            surface.present(),
            Err(SurfaceError::Lost(MAX_CONSECUTIVE_SURFACE_FAILURES))
        ));
    }
}
