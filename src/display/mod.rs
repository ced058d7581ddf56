// Display module - Scaling, compositing and presentation
//
// This module provides:
// - RGB565 pixel mixing
// - Native (96×64) and panel (240×160) frame buffers
// - Integer 2x and interpolated 2.5x scalers
// - Haptic feedback overlay bars
// - Presentation surface with panel and scratch canvases
// - Desktop window backend using winit + pixels

pub mod framebuffer;
pub mod overlay;
pub mod pixel;
pub mod scaler;
pub mod surface;
pub mod window;

pub use framebuffer::{
    Frame, NativeFrame, PanelFrame, Rect, BLACK, NATIVE_HEIGHT, NATIVE_WIDTH, PANEL_HEIGHT,
    PANEL_WIDTH,
};
pub use overlay::{Feedback, OverlayCompositor, OverlayRect, BAR_HEIGHT};
pub use pixel::{mix, rgb565};
pub use scaler::{GeometryError, ScaleGeometry, Scaler, ScalingMode};
pub use surface::{
    DestinationHandle, HeadlessPanel, PanelBackend, PanelMode, PixelFormat, PresentationSurface,
    SurfaceError, CLEAR_CYCLES, MAX_CONSECUTIVE_SURFACE_FAILURES,
};
pub use window::{run_platform, WindowConfig, WindowPanel};
