// Audio module - Audio engine seam and implementations
//
// This module provides:
// - The `AudioEngine` trait polled by the pacing loop
// - A silent engine used when no device is available
// - A shared sample ring between the core and the device callback
// - Cross-platform audio output using cpal (feature "audio")
//
// The pipeline never writes samples. It only asks whether the engine needs
// the loop to wait for it and whether there is room for another frame.

pub mod buffer;
#[cfg(feature = "audio")]
pub mod output;

pub use buffer::{SampleQueue, SampleRing};
#[cfg(feature = "audio")]
pub use output::{AudioConfig, CpalAudio};

use thiserror::Error;

/// Audio device errors
#[derive(Debug, Error)]
pub enum AudioError {
    /// No output device on the default host
    #[error("no output device available")]
    NoDevice,

    /// The output stream could not be created
    #[error("failed to build audio stream: {0}")]
    Build(String),

    /// The output stream could not be started
    #[error("failed to start audio stream: {0}")]
    Play(String),

    /// The output stream could not be paused
    #[error("failed to pause audio stream: {0}")]
    Pause(String),
}

/// Audio engine as seen by the pacing loop
pub trait AudioEngine {
    /// Whether the loop must pace itself on audio buffer pressure
    fn requires_sync(&self) -> bool;

    /// Whether the ring has room for at least one more frame of samples
    fn has_headroom(&self) -> bool;

    /// Sleep one bounded step while waiting for headroom
    fn wait_step(&mut self);

    /// Start or stop playback
    fn set_enabled(&mut self, enabled: bool);

    /// Whether playback is enabled
    fn is_enabled(&self) -> bool;
}

/// Engine without a device: never requires sync, always has headroom
#[derive(Debug, Clone, Copy, Default)]
pub struct NullAudio {
    enabled: bool,
}

impl NullAudio {
    /// Create a disabled silent engine
    pub fn new() -> Self {
        Self::default()
    }
}

impl AudioEngine for NullAudio {
    fn requires_sync(&self) -> bool {
        false
    }

    fn has_headroom(&self) -> bool {
        true
    }

    fn wait_step(&mut self) {}

    fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }
}

impl<A: AudioEngine + ?Sized> AudioEngine for Box<A> {
    fn requires_sync(&self) -> bool {
        (**self).requires_sync()
    }

    fn has_headroom(&self) -> bool {
        (**self).has_headroom()
    }

    fn wait_step(&mut self) {
        (**self).wait_step()
    }

    fn set_enabled(&mut self, enabled: bool) {
        (**self).set_enabled(enabled)
    }

    fn is_enabled(&self) -> bool {
        (**self).is_enabled()
    }
}
