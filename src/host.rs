// Host seams - Emulation core and settings menu as seen by the pipeline

use crate::display::{NativeFrame, PanelFrame, ScalingMode};

/// Emulation core driving the pipeline
///
/// The pipeline reads the core's frame but never mutates it; the only write
/// it performs is clearing the dirty flag after a successful present.
pub trait EmulationCore {
    /// Run the core for one emulated frame
    fn emulate_frame(&mut self);

    /// Latest native frame
    fn frame(&self) -> &NativeFrame;

    /// Whether the frame changed since it was last presented
    fn is_dirty(&self) -> bool;

    /// Mark the frame as presented
    fn clear_dirty(&mut self);

    /// Whether haptic feedback is active this frame
    fn is_feedback_active(&self) -> bool;

    /// Vertical shift in destination canvas rows while feedback is active
    fn feedback_offset(&self) -> i32;

    /// Persist state that must survive an exit (e.g. EEPROM)
    fn flush_volatile_state(&mut self);
}

/// Result of one menu processing step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuStatus {
    /// Menu stays open
    Open,
    /// Menu closed; resume emulation
    Resume,
    /// Menu closed; exit the application
    Quit,
}

/// Settings menu and the configuration it edits
pub trait MenuHost {
    /// Whether the menu wants to take over the display
    fn is_menu_active(&self) -> bool;

    /// Scaling mode currently selected
    fn scaling_mode(&self) -> ScalingMode;

    /// Vertical sync currently selected
    fn vertical_sync(&self) -> bool;

    /// Handle pending input and report whether the menu stays open
    fn process(&mut self) -> MenuStatus;

    /// Draw the menu into the shared menu canvas
    fn render(&mut self, canvas: &mut PanelFrame);

    /// Called once the pipeline has applied the selected configuration
    fn acknowledge_config_change(&mut self);
}
