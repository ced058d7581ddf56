// Pipeline module - Per-tick coordinator
//
// This module owns everything the display loop needs between ticks: the
// presentation surface, the active scaler and overlay geometry, the pacing
// scheduler, the clock and the Running/Menu mode. Collaborators (core, audio
// engine, menu) are borrowed for the duration of a single tick.
//
// A Running tick is: emulate, plan, compose + scale + present (unless the
// frame is dropped or unchanged), wait, then check for a menu request.

mod config;
mod mode;

pub use config::{
    AudioSettings, ConfigError, PacingSettings, PlatformConfig, VideoConfig, CONFIG_FILE,
};
pub use mode::Mode;

use crate::audio::AudioEngine;
use crate::display::{
    DestinationHandle, Feedback, OverlayCompositor, OverlayRect, PanelBackend,
    PresentationSurface, Scaler, ScalingMode, SurfaceError,
};
use crate::host::{EmulationCore, MenuHost};
use crate::pacing::{Clock, PacingConfig, PacingScheduler};
use log::{debug, info};
use thiserror::Error;

/// Display settings applied at startup and on every menu exit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VideoSettings {
    /// Scaling mode
    pub scaling: ScalingMode,
    /// Vertical sync
    pub vsync: bool,
}

impl From<VideoConfig> for VideoSettings {
    fn from(config: VideoConfig) -> Self {
        Self {
            scaling: config.scaling,
            vsync: config.vsync,
        }
    }
}

/// Errors that stop the pipeline
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The panel refused the requested display mode
    #[error("display mode negotiation failed: {0}")]
    DisplayMode(#[source] SurfaceError),

    /// The surface kept failing and was given up on
    #[error("presentation surface lost: {0}")]
    SurfaceLost(#[source] SurfaceError),

    /// Configuration rejected
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// What a tick did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// A new frame was presented
    Presented,
    /// The drop counter skipped this frame
    Dropped,
    /// Nothing changed and no feedback was active
    Unchanged,
    /// Acquire or present failed; the frame stays dirty
    RenderSkipped,
    /// A menu frame was presented
    MenuFrame,
    /// The menu closed and emulation resumes next tick
    Resumed,
    /// The menu requested exit
    Quit,
}

/// Collaborators borrowed for one tick
pub struct Collaborators<'a> {
    /// Emulation core
    pub core: &'a mut dyn EmulationCore,
    /// Audio engine
    pub audio: &'a mut dyn AudioEngine,
    /// Settings menu
    pub menu: &'a mut dyn MenuHost,
}

/// Display pipeline state
pub struct PipelineContext<B: PanelBackend, K: Clock> {
    surface: PresentationSurface<B>,
    scaler: Scaler,
    compositor: OverlayCompositor,
    destination: DestinationHandle,
    scheduler: PacingScheduler,
    clock: K,
    mode: Mode,
    vsync: bool,
    running: bool,
    // Last presented frame was drawn shifted
    panel_shifted: bool,
}

impl<B: PanelBackend, K: Clock> PipelineContext<B, K> {
    /// Create the pipeline and negotiate the panel mode
    ///
    /// # Arguments
    /// * `backend` - Panel backend
    /// * `clock` - Time source for pacing
    /// * `video` - Initial scaling mode and vsync
    /// * `pacing` - Pacing constants
    ///
    /// # Returns
    /// The pipeline, or `DisplayMode` if the panel refuses the mode
    pub fn new(
        backend: B,
        clock: K,
        video: VideoSettings,
        pacing: PacingConfig,
    ) -> Result<Self, PipelineError> {
        let scaler = Scaler::new(video.scaling).map_err(ConfigError::from)?;
        let surface =
            PresentationSurface::new(backend, video.vsync).map_err(PipelineError::DisplayMode)?;

        info!(
            "Pipeline ready: {} scaling, vsync {}, tick {:?}, drop 1/{}",
            video.scaling, video.vsync, pacing.tick_quantum, pacing.drop_interval
        );

        Ok(Self {
            surface,
            compositor: OverlayCompositor::new(&scaler),
            destination: video.scaling.destination(),
            scaler,
            scheduler: PacingScheduler::new(pacing),
            clock,
            mode: Mode::Running,
            vsync: video.vsync,
            running: true,
            panel_shifted: false,
        })
    }

    /// Run one tick
    ///
    /// # Returns
    /// What the tick did, or a fatal error
    pub fn tick(&mut self, io: &mut Collaborators<'_>) -> Result<TickOutcome, PipelineError> {
        if !self.running {
            return Ok(TickOutcome::Quit);
        }

        match self.mode {
            Mode::Running => {
                let outcome = self.run_frame(io)?;
                if io.menu.is_menu_active() {
                    self.enter_menu(io)?;
                }
                Ok(outcome)
            }
            Mode::Menu { audio_was_enabled } => self.menu_tick(io, audio_was_enabled),
        }
    }

    fn run_frame(&mut self, io: &mut Collaborators<'_>) -> Result<TickOutcome, PipelineError> {
        io.core.emulate_frame();

        let plan = self.scheduler.begin_tick(&*io.audio, self.vsync);
        let outcome = if plan.drop_frame {
            TickOutcome::Dropped
        } else if io.core.is_dirty() || io.core.is_feedback_active() || self.panel_shifted {
            self.render(&mut *io.core)?
        } else {
            TickOutcome::Unchanged
        };

        self.scheduler.wait(&plan, &mut *io.audio, &self.clock);
        Ok(outcome)
    }

    fn render(&mut self, core: &mut dyn EmulationCore) -> Result<TickOutcome, PipelineError> {
        let feedback = if core.is_feedback_active() {
            Feedback::Shake(core.feedback_offset())
        } else {
            Feedback::Idle
        };

        let canvas = match self.surface.acquire(self.destination) {
            Ok(canvas) => canvas,
            Err(err) => return skip_frame(err),
        };
        self.compositor.compose(&self.scaler, core.frame(), canvas, feedback);

        if self.scaler.needs_upscale() {
            let (scratch, panel) = self.surface.scratch_and_panel();
            self.scaler.upscale(scratch, panel);
        }

        match self.surface.present() {
            Ok(()) => {
                core.clear_dirty();
                self.panel_shifted = feedback.shift() != 0;
                Ok(TickOutcome::Presented)
            }
            Err(err) => skip_frame(err),
        }
    }

    /// Select a scaling mode: re-point the destination and recompute the overlay
    ///
    /// On error the previous mode stays in force.
    pub fn select_scaling(&mut self, mode: ScalingMode) -> Result<(), ConfigError> {
        let scaler = Scaler::new(mode)?;
        self.compositor = OverlayCompositor::new(&scaler);
        self.destination = mode.destination();
        self.scaler = scaler;
        self.surface.reset_scratch();
        Ok(())
    }

    /// Stop the loop: silence audio and persist the core's volatile state
    pub fn shutdown(&mut self, io: &mut Collaborators<'_>) {
        if self.running || io.audio.is_enabled() {
            info!("Shutting down pipeline");
        }
        self.running = false;
        io.audio.set_enabled(false);
        io.core.flush_volatile_state();
    }

    /// Current mode
    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Whether the loop should keep ticking
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Active scaling mode
    pub fn scaling_mode(&self) -> ScalingMode {
        self.scaler.mode()
    }

    /// Buffer the compositor writes into
    pub fn destination(&self) -> DestinationHandle {
        self.destination
    }

    /// Current indicator bar geometry
    pub fn overlay_rects(&self) -> OverlayRect {
        *self.compositor.rects()
    }

    /// Whether presents are locked to the refresh
    pub fn vsync(&self) -> bool {
        self.vsync
    }

    /// Pacing state
    pub fn scheduler(&self) -> &PacingScheduler {
        &self.scheduler
    }

    /// Presentation surface
    pub fn surface(&self) -> &PresentationSurface<B> {
        &self.surface
    }

    /// Mutable presentation surface
    pub fn surface_mut(&mut self) -> &mut PresentationSurface<B> {
        &mut self.surface
    }

    /// Time source
    pub fn clock(&self) -> &K {
        &self.clock
    }
}

fn skip_frame(err: SurfaceError) -> Result<TickOutcome, PipelineError> {
    match err {
        SurfaceError::Lost(_) => Err(PipelineError::SurfaceLost(err)),
        other => {
            debug!("frame skipped: {}", other);
            Ok(TickOutcome::RenderSkipped)
        }
    }
}
