// Configuration management
//
// Handles platform settings persistence: scaling and vsync, audio device
// parameters and pacing constants.

use crate::display::{GeometryError, ScalingMode};
use crate::pacing::{
    PacingConfig, DEFAULT_DROP_INTERVAL, DEFAULT_MAX_AUDIO_WAIT_STEPS, DEFAULT_SLACK_QUANTA,
};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Default configuration file path
pub const CONFIG_FILE: &str = "platform_rs90.toml";

/// Longest accepted emulated frame period
pub const MAX_TICK_QUANTUM_MS: u64 = 1000;

/// Most quanta of lag accepted before resynchronising
pub const MAX_SLACK_QUANTA: u32 = 64;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Scaling mode cannot map the native frame onto the panel
    #[error(transparent)]
    Geometry(#[from] GeometryError),

    /// Reading or writing the file failed
    #[error("configuration I/O error: {0}")]
    Io(#[from] io::Error),

    /// The file is not valid TOML for this schema
    #[error("invalid configuration file: {0}")]
    Parse(#[from] toml::de::Error),

    /// The configuration could not be serialized
    #[error("failed to serialize configuration: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// A value is out of range
    #[error("invalid value for {field}: {reason}")]
    Invalid {
        /// Offending field
        field: &'static str,
        /// What is wrong with it
        reason: &'static str,
    },
}

/// Platform configuration
///
/// Stores all user-configurable settings for the platform front-end.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlatformConfig {
    /// Video settings
    pub video: VideoConfig,

    /// Audio settings
    pub audio: AudioSettings,

    /// Frame pacing
    pub pacing: PacingSettings,
}

/// Video configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VideoConfig {
    /// Scaling mode
    pub scaling: ScalingMode,

    /// Enable VSync (multi-buffered presents)
    pub vsync: bool,

    /// Desktop window scale (1-8)
    pub window_scale: u32,
}

/// Audio configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioSettings {
    /// Enable audio
    pub enabled: bool,

    /// Pace emulation on audio buffer headroom
    pub sync: bool,

    /// Output sample rate in Hz
    pub sample_rate: u32,

    /// Output channels
    pub channels: u16,

    /// Ring capacity in samples
    pub buffer_samples: usize,
}

/// Pacing configuration, in milliseconds where applicable
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PacingSettings {
    /// Emulated frame period
    pub tick_quantum_ms: u64,

    /// Lag tolerated before resynchronising, in quanta
    pub slack_quanta: u32,

    /// Drop one of every N frames under vsync (0 disables)
    pub drop_interval: u32,

    /// Delay per menu frame
    pub menu_frame_ms: u64,

    /// Sleep granularity while waiting
    pub wait_step_ms: u64,

    /// Bound on audio wait steps per tick
    pub max_audio_wait_steps: u32,
}

impl Default for VideoConfig {
    fn default() -> Self {
        Self {
            scaling: ScalingMode::Integer2x,
            vsync: true,
            window_scale: 3,
        }
    }
}

impl Default for AudioSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            sync: true,
            sample_rate: 44100,
            channels: 1,
            buffer_samples: 2048,
        }
    }
}

impl Default for PacingSettings {
    fn default() -> Self {
        Self {
            tick_quantum_ms: 14,
            slack_quanta: DEFAULT_SLACK_QUANTA,
            drop_interval: DEFAULT_DROP_INTERVAL,
            menu_frame_ms: 16,
            wait_step_ms: 1,
            max_audio_wait_steps: DEFAULT_MAX_AUDIO_WAIT_STEPS,
        }
    }
}

impl Default for PlatformConfig {
    fn default() -> Self {
        PlatformConfig {
            video: VideoConfig::default(),
            audio: AudioSettings::default(),
            pacing: PacingSettings::default(),
        }
    }
}

impl PacingSettings {
    /// Convert to the scheduler's representation
    pub fn to_pacing_config(&self) -> PacingConfig {
        PacingConfig {
            tick_quantum: Duration::from_millis(self.tick_quantum_ms),
            slack_quanta: self.slack_quanta,
            drop_interval: self.drop_interval,
            menu_frame: Duration::from_millis(self.menu_frame_ms),
            wait_step: Duration::from_millis(self.wait_step_ms),
            max_audio_wait_steps: self.max_audio_wait_steps,
        }
    }
}

impl AudioSettings {
    /// Samples the core produces per emulated frame at this rate
    ///
    /// Saturates at `usize::MAX` for periods no ring could hold.
    pub fn frame_samples(&self, tick_quantum_ms: u64) -> usize {
        (self.sample_rate as u64)
            .checked_mul(self.channels as u64)
            .and_then(|rate| rate.checked_mul(tick_quantum_ms))
            .and_then(|total| usize::try_from(total / 1000).ok())
            .unwrap_or(usize::MAX)
    }
}

impl PlatformConfig {
    /// Load configuration from file or create default
    ///
    /// A missing file is created with the defaults. A file that can't be
    /// read, parsed or validated is left untouched and the defaults are used
    /// for this run.
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the TOML configuration file
    ///
    /// # Returns
    ///
    /// The loaded or default configuration
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        match Self::load(path) {
            Ok(config) => config,
            Err(ConfigError::Io(e)) if e.kind() == io::ErrorKind::NotFound => {
                info!("Creating default configuration at {}", path.display());
                let config = Self::default();
                // Try to save the default config, but don't fail if we can't
                if let Err(e) = config.save(path) {
                    warn!("Could not write default configuration: {}", e);
                }
                config
            }
            Err(e) => {
                warn!("Using default configuration ({}): {}", path.display(), e);
                Self::default()
            }
        }
    }

    /// Load and validate configuration from file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        let config: Self = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let contents = toml::to_string_pretty(self)?;
        fs::write(path, contents)?;
        Ok(())
    }

    /// Reject values the pipeline cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |field: &'static str, reason: &'static str| -> Result<(), ConfigError> {
            Err(ConfigError::Invalid { field, reason })
        };

        if !(1..=MAX_TICK_QUANTUM_MS).contains(&self.pacing.tick_quantum_ms) {
            return invalid("pacing.tick_quantum_ms", "must be between 1 and 1000");
        }
        if self.pacing.slack_quanta > MAX_SLACK_QUANTA {
            return invalid("pacing.slack_quanta", "must be at most 64");
        }
        if self.pacing.drop_interval == 1 {
            return invalid("pacing.drop_interval", "would drop every frame");
        }
        if self.pacing.wait_step_ms == 0 {
            return invalid("pacing.wait_step_ms", "must be at least 1");
        }
        if !(1..=2).contains(&self.audio.channels) {
            return invalid("audio.channels", "must be 1 or 2");
        }
        if self.audio.sample_rate == 0 {
            return invalid("audio.sample_rate", "must be non-zero");
        }
        if self.audio.buffer_samples < self.audio.frame_samples(self.pacing.tick_quantum_ms) {
            return invalid("audio.buffer_samples", "smaller than one frame of samples");
        }
        if !(1..=8).contains(&self.video.window_scale) {
            return invalid("video.window_scale", "must be between 1 and 8");
        }
        Ok(())
    }
}
