// Audio output - Playback through cpal
//
// The device callback drains the shared sample ring; the core fills it once
// per emulated frame. When sync is requested the pacing loop waits on the
// ring's free space, which ties the emulation rate to the device clock.

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, Stream, StreamConfig};
use log::{error, info, warn};
use std::time::Duration;

use super::buffer::SampleQueue;
use super::{AudioEngine, AudioError};

/// Audio output configuration
#[derive(Debug, Clone)]
pub struct AudioConfig {
    /// Sample rate in Hz (44100 or 48000)
    pub sample_rate: u32,

    /// Number of channels (1 = mono, 2 = stereo)
    pub channels: u16,

    /// Ring capacity in samples (affects latency)
    pub buffer_samples: usize,

    /// Samples the core produces per emulated frame
    pub frame_samples: usize,

    /// Pace the emulation loop on buffer headroom
    pub sync: bool,

    /// Sleep per wait step while waiting for headroom
    pub wait_step: Duration,
}

impl AudioConfig {
    /// Create default audio configuration
    ///
    /// - Sample rate: 44.1 kHz
    /// - Channels: 1 (mono)
    /// - Ring: 2048 samples
    /// - Sync enabled, 1 ms wait step
    pub fn new() -> Self {
        Self {
            sample_rate: 44100,
            channels: 1,
            buffer_samples: 2048,
            frame_samples: 44100 / 72,
            sync: true,
            wait_step: Duration::from_millis(1),
        }
    }

    /// Set the sample rate
    pub fn with_sample_rate(mut self, sample_rate: u32) -> Self {
        self.sample_rate = sample_rate;
        self
    }

    /// Set the number of channels (1 = mono, 2 = stereo)
    pub fn with_channels(mut self, channels: u16) -> Self {
        self.channels = channels;
        self
    }

    /// Set the ring capacity in samples
    pub fn with_buffer_samples(mut self, samples: usize) -> Self {
        self.buffer_samples = samples;
        self
    }

    /// Set how many samples the core writes per frame
    pub fn with_frame_samples(mut self, samples: usize) -> Self {
        self.frame_samples = samples;
        self
    }

    /// Enable or disable audio sync
    pub fn with_sync(mut self, sync: bool) -> Self {
        self.sync = sync;
        self
    }

    /// Set the wait step
    pub fn with_wait_step(mut self, step: Duration) -> Self {
        self.wait_step = step;
        self
    }
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Audio engine backed by the default cpal output device
pub struct CpalAudio {
    /// Audio configuration
    config: AudioConfig,

    /// Audio device
    _device: Device,

    /// Audio stream
    stream: Stream,

    /// Shared sample ring
    queue: SampleQueue,

    enabled: bool,
}

impl CpalAudio {
    /// Open the default output device
    ///
    /// The stream is created paused; call `set_enabled(true)` to start it.
    ///
    /// # Arguments
    ///
    /// * `config` - Audio configuration
    ///
    /// # Returns
    ///
    /// The engine, or the reason the device could not be opened
    pub fn new(config: AudioConfig) -> Result<Self, AudioError> {
        let host = cpal::default_host();
        let device = host.default_output_device().ok_or(AudioError::NoDevice)?;

        info!("Audio device: {}", device.name().unwrap_or_default());

        let stream_config = StreamConfig {
            channels: config.channels,
            sample_rate: cpal::SampleRate(config.sample_rate),
            buffer_size: cpal::BufferSize::Default,
        };

        let queue = SampleQueue::new(config.buffer_samples);
        let consumer = queue.clone();

        let stream = device
            .build_output_stream(
                &stream_config,
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                    consumer.pop_into(data);
                },
                move |err| {
                    error!("Audio stream error: {}", err);
                },
                None,
            )
            .map_err(|e| AudioError::Build(e.to_string()))?;

        stream
            .pause()
            .map_err(|e| AudioError::Pause(e.to_string()))?;

        info!(
            "Audio output initialized: {} Hz, {} channel(s), {} sample ring",
            config.sample_rate, config.channels, config.buffer_samples
        );

        Ok(Self {
            config,
            _device: device,
            stream,
            queue,
            enabled: false,
        })
    }

    /// Producer handle for the core
    pub fn queue(&self) -> SampleQueue {
        self.queue.clone()
    }

    /// Get the audio configuration
    pub fn config(&self) -> &AudioConfig {
        &self.config
    }
}

impl AudioEngine for CpalAudio {
    fn requires_sync(&self) -> bool {
        self.enabled && self.config.sync
    }

    fn has_headroom(&self) -> bool {
        self.queue.free() >= self.config.frame_samples
    }

    fn wait_step(&mut self) {
        std::thread::sleep(self.config.wait_step);
    }

    fn set_enabled(&mut self, enabled: bool) {
        if enabled == self.enabled {
            return;
        }
        let result = if enabled {
            self.stream
                .play()
                .map_err(|e| AudioError::Play(e.to_string()))
        } else {
            self.queue.clear();
            self.stream
                .pause()
                .map_err(|e| AudioError::Pause(e.to_string()))
        };
        match result {
            Ok(()) => self.enabled = enabled,
            Err(e) => warn!("{}", e),
        }
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }
}
