// Pacing module - Frame timing for the emulation loop
//
// This module provides:
// - Clock abstraction (system and manual clocks)
// - Per-tick pacing policy, drop counter and deadline tracking

pub mod clock;
pub mod scheduler;

pub use clock::{Clock, ManualClock, SystemClock};
pub use scheduler::{
    PacingConfig, PacingPolicy, PacingScheduler, PacingStats, TickPlan, DEFAULT_DROP_INTERVAL,
    DEFAULT_MAX_AUDIO_WAIT_STEPS, DEFAULT_MENU_FRAME, DEFAULT_SLACK_QUANTA, DEFAULT_TICK_QUANTUM,
    DEFAULT_WAIT_STEP,
};
