// Window module - Desktop panel backend and event loop
//
// The desktop build stands in for the handheld's panel with a winit window.
// Frames are converted from RGB565 to RGBA and handed to the pixels crate,
// which owns the swap chain. The vsync flag of the requested mode selects the
// present mode; changing it rebuilds the pixel surface.

use super::framebuffer::{PanelFrame, PANEL_HEIGHT, PANEL_WIDTH};
use super::surface::{PanelBackend, PanelMode, SurfaceError};
use crate::audio::AudioEngine;
use crate::host::EmulationCore;
use crate::menu::{MenuKey, PlatformMenu};
use crate::pacing::{PacingConfig, SystemClock};
use crate::pipeline::{Collaborators, PipelineContext, PipelineError, TickOutcome, VideoSettings};
use log::{debug, error, info};
use pixels::{Pixels, PixelsBuilder, SurfaceTexture};
use std::sync::Arc;
use winit::application::ApplicationHandler;
use winit::dpi::LogicalSize;
use winit::event::{ElementState, KeyEvent, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowId};

/// Window configuration
#[derive(Debug, Clone, Copy)]
pub struct WindowConfig {
    /// Integer scale factor applied to the 240×160 panel
    pub scale: u32,
}

impl WindowConfig {
    /// Create a new window configuration with default values
    ///
    /// Default: 3x scale
    pub fn new() -> Self {
        Self { scale: 3 }
    }

    /// Set the scale factor
    pub fn with_scale(mut self, scale: u32) -> Self {
        self.scale = scale.clamp(1, 8);
        self
    }

    /// Get the window width in pixels
    pub fn window_width(&self) -> u32 {
        PANEL_WIDTH as u32 * self.scale
    }

    /// Get the window height in pixels
    pub fn window_height(&self) -> u32 {
        PANEL_HEIGHT as u32 * self.scale
    }
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Panel backend drawing into a desktop window
pub struct WindowPanel {
    window: Arc<Window>,
    pixels: Option<Pixels<'static>>,
    mode: Option<PanelMode>,
}

impl WindowPanel {
    /// Wrap an already created window
    pub fn new(window: Arc<Window>) -> Self {
        Self {
            window,
            pixels: None,
            mode: None,
        }
    }

    fn build_pixels(&self, vsync: bool) -> Result<Pixels<'static>, SurfaceError> {
        let size = self.window.inner_size();
        let surface_texture = SurfaceTexture::new(size.width, size.height, self.window.clone());

        PixelsBuilder::new(PANEL_WIDTH as u32, PANEL_HEIGHT as u32, surface_texture)
            .enable_vsync(vsync)
            .build()
            .map_err(|e| SurfaceError::Backend(format!("failed to create pixel buffer: {}", e)))
    }
}

impl PanelBackend for WindowPanel {
    fn configure(&mut self, mode: PanelMode) -> Result<(), SurfaceError> {
        if mode.width != PANEL_WIDTH || mode.height != PANEL_HEIGHT {
            return Err(SurfaceError::Unsupported {
                width: mode.width,
                height: mode.height,
                format: mode.format,
            });
        }

        let rebuild = match (&self.pixels, self.mode) {
            (Some(_), Some(current)) => current.vsync != mode.vsync,
            _ => true,
        };
        if rebuild {
            // Release the old surface before creating a new one on the same window
            self.pixels = None;
            self.pixels = Some(self.build_pixels(mode.vsync)?);
            info!(
                "Panel configured: {}x{} {:?}, vsync {}",
                mode.width, mode.height, mode.format, mode.vsync
            );
        }
        self.mode = Some(mode);
        Ok(())
    }

    fn begin_frame(&mut self) -> Result<(), SurfaceError> {
        if self.pixels.is_some() {
            Ok(())
        } else {
            Err(SurfaceError::NotReady)
        }
    }

    fn present(&mut self, frame: &PanelFrame) -> Result<(), SurfaceError> {
        let pixels = self.pixels.as_mut().ok_or(SurfaceError::NotReady)?;
        frame.to_rgba(pixels.frame_mut());
        pixels
            .render()
            .map_err(|e| SurfaceError::Backend(e.to_string()))
    }
}

/// Map a physical key to a menu key
pub fn menu_key_for(key: PhysicalKey) -> Option<MenuKey> {
    match key {
        PhysicalKey::Code(KeyCode::Escape) => Some(MenuKey::Toggle),
        PhysicalKey::Code(KeyCode::ArrowUp) => Some(MenuKey::Up),
        PhysicalKey::Code(KeyCode::ArrowDown) => Some(MenuKey::Down),
        PhysicalKey::Code(KeyCode::ArrowLeft) => Some(MenuKey::Left),
        PhysicalKey::Code(KeyCode::ArrowRight) => Some(MenuKey::Right),
        PhysicalKey::Code(KeyCode::Enter) | PhysicalKey::Code(KeyCode::Space) => {
            Some(MenuKey::Confirm)
        }
        PhysicalKey::Code(KeyCode::Backspace) => Some(MenuKey::Cancel),
        _ => None,
    }
}

/// Desktop application: window, pipeline and collaborators
struct PlatformWindow<C: EmulationCore, A: AudioEngine> {
    config: WindowConfig,
    video: VideoSettings,
    pacing: PacingConfig,
    window: Option<Arc<Window>>,
    pipeline: Option<PipelineContext<WindowPanel, SystemClock>>,
    core: C,
    audio: A,
    menu: PlatformMenu,
    fatal: Option<PipelineError>,
}

impl<C: EmulationCore, A: AudioEngine> PlatformWindow<C, A> {
    fn shutdown(&mut self, event_loop: &ActiveEventLoop) {
        if let Some(pipeline) = &mut self.pipeline {
            pipeline.shutdown(&mut Collaborators {
                core: &mut self.core,
                audio: &mut self.audio,
                menu: &mut self.menu,
            });
        }
        event_loop.exit();
    }
}

impl<C: EmulationCore, A: AudioEngine> ApplicationHandler for PlatformWindow<C, A> {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let window_attributes = Window::default_attributes()
            .with_title(format!(
                "PokeMini RS-90 - {}x{}",
                self.config.window_width(),
                self.config.window_height()
            ))
            .with_inner_size(LogicalSize::new(
                self.config.window_width(),
                self.config.window_height(),
            ))
            .with_resizable(false);

        let window = match event_loop.create_window(window_attributes) {
            Ok(window) => Arc::new(window),
            Err(e) => {
                error!("Failed to create window: {}", e);
                self.fatal = Some(PipelineError::DisplayMode(SurfaceError::Backend(
                    e.to_string(),
                )));
                event_loop.exit();
                return;
            }
        };

        match PipelineContext::new(
            WindowPanel::new(window.clone()),
            SystemClock::new(),
            self.video,
            self.pacing,
        ) {
            Ok(pipeline) => self.pipeline = Some(pipeline),
            Err(e) => {
                error!("{}", e);
                self.fatal = Some(e);
                event_loop.exit();
            }
        }
        self.window = Some(window);
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => {
                info!("Close requested, exiting...");
                self.shutdown(event_loop);
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key,
                        state: ElementState::Pressed,
                        repeat,
                        ..
                    },
                ..
            } => {
                if let Some(key) = menu_key_for(physical_key) {
                    // Key repeat only navigates while the menu is open
                    if !repeat || self.menu.is_open() {
                        self.menu.handle_key(key);
                    }
                }
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        let Some(pipeline) = &mut self.pipeline else {
            return;
        };

        let result = pipeline.tick(&mut Collaborators {
            core: &mut self.core,
            audio: &mut self.audio,
            menu: &mut self.menu,
        });

        match result {
            Ok(TickOutcome::Quit) => {
                info!("Exit requested from menu");
                self.shutdown(event_loop);
            }
            Ok(outcome) => debug!("tick: {:?}", outcome),
            Err(e) => {
                error!("{}", e);
                self.fatal = Some(e);
                self.shutdown(event_loop);
            }
        }
    }
}

/// Run the pipeline in a desktop window until it quits
///
/// # Arguments
/// * `config` - Window configuration
/// * `video` - Initial scaling mode and vsync
/// * `pacing` - Pacing constants
/// * `core` - Emulation core
/// * `audio` - Audio engine
/// * `menu` - Settings menu
///
/// # Returns
/// The menu with the settings chosen during the run, or the fatal error
pub fn run_platform<C: EmulationCore, A: AudioEngine>(
    config: WindowConfig,
    video: VideoSettings,
    pacing: PacingConfig,
    core: C,
    audio: A,
    menu: PlatformMenu,
) -> Result<PlatformMenu, Box<dyn std::error::Error>> {
    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    info!("Starting display window...");
    info!("  Panel: {}x{}", PANEL_WIDTH, PANEL_HEIGHT);
    info!(
        "  Window size: {}x{}",
        config.window_width(),
        config.window_height()
    );
    info!("  Scaling: {}", video.scaling);
    info!("  VSync: {}", video.vsync);

    let mut app = PlatformWindow {
        config,
        video,
        pacing,
        window: None,
        pipeline: None,
        core,
        audio,
        menu,
        fatal: None,
    };

    event_loop.run_app(&mut app)?;

    match app.fatal {
        Some(e) => Err(e.into()),
        None => Ok(app.menu),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_config_defaults() {
        let config = WindowConfig::new();
        assert_eq!(config.scale, 3);
    }

    #[test]
    fn test_window_dimensions() {
        let config = WindowConfig::new().with_scale(2);
        assert_eq!(config.window_width(), 480);
        assert_eq!(config.window_height(), 320);
    }

    #[test]
    fn test_scale_clamping() {
        let config = WindowConfig::new().with_scale(100);
        assert_eq!(config.scale, 8);

        let config = WindowConfig::new().with_scale(0);
        assert_eq!(config.scale, 1);
    }

    #[test]
    fn test_menu_key_mapping() {
        assert_eq!(
            menu_key_for(PhysicalKey::Code(KeyCode::Escape)),
            Some(MenuKey::Toggle)
        );
        assert_eq!(
            menu_key_for(PhysicalKey::Code(KeyCode::Enter)),
            Some(MenuKey::Confirm)
        );
        assert_eq!(
            menu_key_for(PhysicalKey::Code(KeyCode::ArrowLeft)),
            Some(MenuKey::Left)
        );
        assert_eq!(menu_key_for(PhysicalKey::Code(KeyCode::KeyZ)), None);
    }
}
