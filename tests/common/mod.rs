// Common test utilities for pipeline integration tests
//
// Scriptable stand-ins for the emulation core, audio engine and menu, plus a
// pipeline builder on a headless panel and a manual clock.

#![allow(dead_code)]

use std::cell::Cell;

use pokemini_rs90::display::{HeadlessPanel, NativeFrame, PanelBackend, PanelFrame, ScalingMode};
use pokemini_rs90::host::{EmulationCore, MenuHost, MenuStatus};
use pokemini_rs90::pacing::{ManualClock, PacingConfig};
use pokemini_rs90::pipeline::{
    Collaborators, PipelineContext, PipelineError, TickOutcome, VideoSettings,
};
use pokemini_rs90::AudioEngine;

/// Pipeline type used throughout the integration tests
pub type TestPipeline = PipelineContext<HeadlessPanel, ManualClock>;

/// Build a pipeline on a headless panel
pub fn pipeline(scaling: ScalingMode, vsync: bool) -> TestPipeline {
    pipeline_with(HeadlessPanel::new(), scaling, vsync)
}

/// Build a pipeline on a prepared headless panel
pub fn pipeline_with(panel: HeadlessPanel, scaling: ScalingMode, vsync: bool) -> TestPipeline {
    PipelineContext::new(
        panel,
        ManualClock::new(),
        VideoSettings { scaling, vsync },
        PacingConfig::default(),
    )
    .expect("headless pipeline")
}

/// Run one tick with freshly borrowed collaborators
pub fn tick<B: PanelBackend>(
    ctx: &mut PipelineContext<B, ManualClock>,
    core: &mut FakeCore,
    audio: &mut FakeAudio,
    menu: &mut ScriptedMenu,
) -> Result<TickOutcome, PipelineError> {
    let mut io = Collaborators { core, audio, menu };
    ctx.tick(&mut io)
}

/// Core whose frame changes on demand
pub struct FakeCore {
    pub frame: NativeFrame,
    pub dirty: bool,
    /// Mark the frame dirty on every emulated frame
    pub always_dirty: bool,
    /// Feedback offset while active
    pub feedback: Option<i32>,
    pub emulated: u64,
    pub flushes: u32,
}

impl FakeCore {
    /// Core that produces a new frame every tick
    pub fn animated() -> Self {
        Self {
            always_dirty: true,
            ..Self::still()
        }
    }

    /// Core whose frame never changes after the first
    pub fn still() -> Self {
        let mut frame = NativeFrame::new();
        frame.clear(0x4208);
        Self {
            frame,
            dirty: true,
            always_dirty: false,
            feedback: None,
            emulated: 0,
            flushes: 0,
        }
    }
}

impl EmulationCore for FakeCore {
    fn emulate_frame(&mut self) {
        self.emulated += 1;
        if self.always_dirty {
            self.dirty = true;
        }
    }

    fn frame(&self) -> &NativeFrame {
        &self.frame
    }

    fn is_dirty(&self) -> bool {
        self.dirty
    }

    fn clear_dirty(&mut self) {
        self.dirty = false;
    }

    fn is_feedback_active(&self) -> bool {
        self.feedback.is_some()
    }

    fn feedback_offset(&self) -> i32 {
        self.feedback.unwrap_or(0)
    }

    fn flush_volatile_state(&mut self) {
        self.flushes += 1;
    }
}

/// Audio engine with scriptable sync and headroom
///
/// Each tick's wait needs `steps_per_frame` steps before headroom appears;
/// once reported, the next frame's samples fill the ring again.
pub struct FakeAudio {
    pub sync: bool,
    pub enabled: bool,
    pub steps_per_frame: u32,
    pending_steps: Cell<u32>,
    pub total_steps: u64,
}

impl FakeAudio {
    /// Engine that never asks for sync
    pub fn unsynced() -> Self {
        Self {
            sync: false,
            enabled: true,
            steps_per_frame: 0,
            pending_steps: Cell::new(0),
            total_steps: 0,
        }
    }

    /// Engine that asks for sync and needs `steps` wait steps per frame
    pub fn synced(steps: u32) -> Self {
        Self {
            sync: true,
            steps_per_frame: steps,
            pending_steps: Cell::new(steps),
            ..Self::unsynced()
        }
    }
}

impl AudioEngine for FakeAudio {
    fn requires_sync(&self) -> bool {
        self.sync && self.enabled
    }

    fn has_headroom(&self) -> bool {
        if self.pending_steps.get() > 0 {
            return false;
        }
        self.pending_steps.set(self.steps_per_frame);
        true
    }

    fn wait_step(&mut self) {
        self.total_steps += 1;
        let pending = self.pending_steps.get();
        self.pending_steps.set(pending.saturating_sub(1));
    }

    fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }
}

/// Menu driven directly by the test
pub struct ScriptedMenu {
    pub active: bool,
    pub scaling: ScalingMode,
    pub vsync: bool,
    /// Status returned by the next `process` calls, front first
    pub script: Vec<MenuStatus>,
    pub processed: u32,
    pub rendered: u32,
    pub acknowledged: u32,
    pub fill: u16,
}

impl ScriptedMenu {
    /// Closed menu with the given settings
    pub fn new(scaling: ScalingMode, vsync: bool) -> Self {
        Self {
            active: false,
            scaling,
            vsync,
            script: Vec::new(),
            processed: 0,
            rendered: 0,
            acknowledged: 0,
            fill: 0x7BEF,
        }
    }
}

impl MenuHost for ScriptedMenu {
    fn is_menu_active(&self) -> bool {
        self.active
    }

    fn scaling_mode(&self) -> ScalingMode {
        self.scaling
    }

    fn vertical_sync(&self) -> bool {
        self.vsync
    }

    fn process(&mut self) -> MenuStatus {
        self.processed += 1;
        let status = if self.script.is_empty() {
            MenuStatus::Open
        } else {
            self.script.remove(0)
        };
        if status != MenuStatus::Open {
            self.active = false;
        }
        status
    }

    fn render(&mut self, canvas: &mut PanelFrame) {
        self.rendered += 1;
        canvas.clear(self.fill);
    }

    fn acknowledge_config_change(&mut self) {
        self.acknowledged += 1;
    }
}
