// PokeMini RS-90 - Main Entry Point
//
// Runs the display pipeline in a desktop window with the demo core.
// Usage: pokemini-rs90 [config.toml]

use log::{error, info, warn};
use pokemini_rs90::audio::AudioEngine;
use pokemini_rs90::display::{run_platform, WindowConfig};
use pokemini_rs90::pipeline::{PlatformConfig, CONFIG_FILE};
use pokemini_rs90::{DemoCore, NullAudio, PlatformMenu, VideoSettings};

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    info!("PokeMini RS-90 v{}", env!("CARGO_PKG_VERSION"));

    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| CONFIG_FILE.to_string());
    let mut config = PlatformConfig::load_or_default(&config_path);
    info!("Configuration loaded from '{}'", config_path);

    let pacing = config.pacing.to_pacing_config();
    let (core, audio) = open_audio(&config);
    let menu = PlatformMenu::from_config(&config.video);
    let window = WindowConfig::new().with_scale(config.video.window_scale);

    match run_platform(
        window,
        VideoSettings::from(config.video),
        pacing,
        core,
        audio,
        menu,
    ) {
        Ok(menu) => {
            menu.apply_to(&mut config.video);
            if let Err(e) = config.save(&config_path) {
                warn!("Could not save configuration: {}", e);
            }
            info!("Shutdown complete");
        }
        Err(e) => {
            error!("Fatal: {}", e);
            std::process::exit(1);
        }
    }
}

/// Open the audio device, falling back to silence when it is unavailable
#[cfg(feature = "audio")]
fn open_audio(config: &PlatformConfig) -> (DemoCore, Box<dyn AudioEngine>) {
    use pokemini_rs90::{AudioConfig, CpalAudio};
    use std::time::Duration;

    let core = DemoCore::new();
    if !config.audio.enabled {
        info!("Audio disabled by configuration");
        return (core, Box::new(NullAudio::new()));
    }

    let frame_samples = config.audio.frame_samples(config.pacing.tick_quantum_ms);
    let audio_config = AudioConfig::new()
        .with_sample_rate(config.audio.sample_rate)
        .with_channels(config.audio.channels)
        .with_buffer_samples(config.audio.buffer_samples)
        .with_frame_samples(frame_samples)
        .with_sync(config.audio.sync)
        .with_wait_step(Duration::from_millis(config.pacing.wait_step_ms));

    match CpalAudio::new(audio_config) {
        Ok(mut audio) => {
            let core = core.with_audio(
                audio.queue(),
                frame_samples,
                config.audio.sample_rate,
                config.audio.channels,
            );
            audio.set_enabled(true);
            (core, Box::new(audio))
        }
        Err(e) => {
            warn!("Audio unavailable, continuing without sound: {}", e);
            let mut audio = NullAudio::new();
            audio.set_enabled(true);
            (core, Box::new(audio))
        }
    }
}

#[cfg(not(feature = "audio"))]
fn open_audio(_config: &PlatformConfig) -> (DemoCore, Box<dyn AudioEngine>) {
    info!("Built without audio support");
    (DemoCore::new(), Box::new(NullAudio::new()))
}
