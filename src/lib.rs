// PokeMini RS-90 Library
// Real-time display pipeline for a 96×64 handheld core on a 240×160 panel

// Public modules
pub mod audio;
pub mod demo;
pub mod display;
pub mod host;
pub mod menu;
pub mod pacing;
pub mod pipeline;

// Re-export main types for convenience
pub use audio::{AudioEngine, AudioError, NullAudio, SampleQueue};
#[cfg(feature = "audio")]
pub use audio::{AudioConfig, CpalAudio};
pub use demo::DemoCore;
pub use display::{
    mix, HeadlessPanel, NativeFrame, PanelBackend, PanelFrame, PresentationSurface, Scaler,
    ScalingMode, SurfaceError, WindowConfig,
};
pub use host::{EmulationCore, MenuHost, MenuStatus};
pub use menu::{MenuKey, PlatformMenu};
pub use pacing::{Clock, ManualClock, PacingConfig, PacingPolicy, PacingScheduler, SystemClock};
pub use pipeline::{
    Collaborators, ConfigError, Mode, PipelineContext, PipelineError, PlatformConfig, TickOutcome,
    VideoSettings,
};
