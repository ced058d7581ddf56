// Mode controller - Running/Menu transitions
//
// Entering the menu silences audio, flushes the core's volatile state and
// clears every back buffer. While the menu is open the loop runs at a fixed
// delay and presents the menu canvas. Leaving the menu clears the buffers
// again and re-applies the display configuration, even when nothing changed.

use super::{Collaborators, PipelineContext, PipelineError, TickOutcome, VideoSettings};
use crate::display::{PanelBackend, SurfaceError};
use crate::host::MenuStatus;
use crate::pacing::Clock;
use log::{debug, info, warn};

/// Pipeline mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Emulating and presenting frames
    Running,
    /// Settings menu owns the display
    Menu {
        /// Audio state to restore on resume
        audio_was_enabled: bool,
    },
}

impl Mode {
    /// Whether the menu owns the display
    pub fn is_menu(&self) -> bool {
        matches!(self, Mode::Menu { .. })
    }
}

impl<B: PanelBackend, K: Clock> PipelineContext<B, K> {
    pub(super) fn enter_menu(&mut self, io: &mut Collaborators<'_>) -> Result<(), PipelineError> {
        let audio_was_enabled = io.audio.is_enabled();
        io.audio.set_enabled(false);
        io.core.flush_volatile_state();
        self.clear_cycles()?;

        self.mode = Mode::Menu { audio_was_enabled };
        info!("Entered menu (audio was {})", on_off(audio_was_enabled));
        Ok(())
    }

    pub(super) fn menu_tick(
        &mut self,
        io: &mut Collaborators<'_>,
        audio_was_enabled: bool,
    ) -> Result<TickOutcome, PipelineError> {
        self.clock.sleep(self.scheduler.config().menu_frame);

        let mut status = io.menu.process();
        io.menu.render(self.surface.scratch_mut());
        self.surface.blit_scratch();
        if let Err(err) = self.surface.present() {
            match err {
                SurfaceError::Lost(_) => return Err(PipelineError::SurfaceLost(err)),
                other => debug!("menu frame skipped: {}", other),
            }
        }

        if status == MenuStatus::Open && !io.menu.is_menu_active() {
            status = MenuStatus::Resume;
        }

        match status {
            MenuStatus::Open => Ok(TickOutcome::MenuFrame),
            MenuStatus::Resume => {
                self.exit_menu(io, status, audio_was_enabled)?;
                Ok(TickOutcome::Resumed)
            }
            MenuStatus::Quit => {
                self.exit_menu(io, status, audio_was_enabled)?;
                Ok(TickOutcome::Quit)
            }
        }
    }

    fn exit_menu(
        &mut self,
        io: &mut Collaborators<'_>,
        status: MenuStatus,
        audio_was_enabled: bool,
    ) -> Result<(), PipelineError> {
        self.clear_cycles()?;

        self.apply_display_config(VideoSettings {
            scaling: io.menu.scaling_mode(),
            vsync: io.menu.vertical_sync(),
        })?;
        io.menu.acknowledge_config_change();

        if status == MenuStatus::Quit {
            self.running = false;
        } else {
            io.audio.set_enabled(audio_was_enabled);
        }
        self.scheduler.resync(&self.clock);
        self.mode = Mode::Running;

        info!(
            "Left menu: {} scaling, vsync {}",
            self.scaler.mode(),
            on_off(self.vsync)
        );
        Ok(())
    }

    /// Re-negotiate the panel mode and select the scaling mode
    ///
    /// A rejected panel mode is fatal. A rejected scaling mode keeps the
    /// previous one.
    pub fn apply_display_config(&mut self, video: VideoSettings) -> Result<(), PipelineError> {
        self.surface
            .reconfigure(video.vsync)
            .map_err(PipelineError::DisplayMode)?;
        self.vsync = video.vsync;

        if let Err(e) = self.select_scaling(video.scaling) {
            warn!("Keeping {} scaling: {}", self.scaler.mode(), e);
        }
        Ok(())
    }

    fn clear_cycles(&mut self) -> Result<(), PipelineError> {
        self.panel_shifted = false;
        self.surface
            .clear_cycles()
            .map_err(PipelineError::SurfaceLost)
    }
}

fn on_off(flag: bool) -> &'static str {
    if flag {
        "on"
    } else {
        "off"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_is_menu() {
        assert!(!Mode::Running.is_menu());
        assert!(Mode::Menu {
            audio_was_enabled: true
        }
        .is_menu());
    }
}
