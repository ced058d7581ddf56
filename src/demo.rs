// Demo core - Stand-in emulation core for running the pipeline
//
// Draws scrolling colour bars, shakes the screen periodically and feeds a
// sine tone to the audio ring so every path of the pipeline gets exercised
// without a ROM.

use crate::audio::SampleQueue;
use crate::display::{rgb565, NativeFrame, NATIVE_HEIGHT, NATIVE_WIDTH};
use crate::host::EmulationCore;
use log::debug;

const BARS: [u16; 8] = [
    rgb565(0xFF, 0xFF, 0xFF),
    rgb565(0xFF, 0xFF, 0x00),
    rgb565(0x00, 0xFF, 0xFF),
    rgb565(0x00, 0xFF, 0x00),
    rgb565(0xFF, 0x00, 0xFF),
    rgb565(0xFF, 0x00, 0x00),
    rgb565(0x00, 0x00, 0xFF),
    rgb565(0x00, 0x00, 0x00),
];

/// Frames between feedback bursts
pub const FEEDBACK_PERIOD: u64 = 240;

/// Length of a feedback burst in frames
pub const FEEDBACK_FRAMES: u64 = 24;

/// The picture only changes every this many frames
pub const REDRAW_INTERVAL: u64 = 2;

const TONE_HZ: f32 = 440.0;
const TONE_AMPLITUDE: f32 = 0.1;

#[derive(Debug)]
struct ToneOutput {
    queue: SampleQueue,
    sample_rate: u32,
    channels: usize,
}

/// Animated test pattern with haptic bursts and a tone
#[derive(Debug)]
pub struct DemoCore {
    frame: NativeFrame,
    frame_count: u64,
    dirty: bool,
    audio: Option<ToneOutput>,
    tone: Vec<f32>,
    phase: f32,
    flushes: u32,
}

impl DemoCore {
    /// Create a demo core without audio
    pub fn new() -> Self {
        let mut core = Self {
            frame: NativeFrame::new(),
            frame_count: 0,
            dirty: true,
            audio: None,
            tone: Vec::new(),
            phase: 0.0,
            flushes: 0,
        };
        core.draw();
        core
    }

    /// Feed a tone into `queue` every frame
    ///
    /// # Arguments
    /// * `queue` - Producer side of the audio ring
    /// * `frame_samples` - Interleaved samples to push per emulated frame
    /// * `sample_rate` - Output rate, for the tone frequency
    /// * `channels` - Interleaved channel count; every channel plays the tone
    pub fn with_audio(
        mut self,
        queue: SampleQueue,
        frame_samples: usize,
        sample_rate: u32,
        channels: u16,
    ) -> Self {
        self.tone = vec![0.0; frame_samples];
        self.audio = Some(ToneOutput {
            queue,
            sample_rate,
            channels: usize::from(channels.max(1)),
        });
        self
    }

    /// Frames emulated so far
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Times volatile state was flushed
    pub fn flushes(&self) -> u32 {
        self.flushes
    }

    fn draw(&mut self) {
        let scroll = (self.frame_count / REDRAW_INTERVAL) as usize;
        let bar_width = NATIVE_WIDTH / BARS.len();
        for y in 0..NATIVE_HEIGHT {
            let row = self.frame.row_mut(y);
            if y < NATIVE_HEIGHT * 3 / 4 {
                for (x, pixel) in row.iter_mut().enumerate() {
                    *pixel = BARS[((x + scroll) / bar_width) % BARS.len()];
                }
            } else {
                for (x, pixel) in row.iter_mut().enumerate() {
                    let checker = ((x + scroll) / 4 + y / 4) % 2 == 0;
                    *pixel = if checker { BARS[0] } else { BARS[7] };
                }
            }
        }
    }

    fn produce_audio(&mut self) {
        let Some(output) = &self.audio else {
            return;
        };
        let step = TONE_HZ / output.sample_rate as f32;
        for frame in self.tone.chunks_mut(output.channels) {
            frame.fill((self.phase * std::f32::consts::TAU).sin() * TONE_AMPLITUDE);
            self.phase = (self.phase + step).fract();
        }
        let accepted = output.queue.push_samples(&self.tone);
        if accepted < self.tone.len() {
            debug!("audio ring full, {} samples dropped", self.tone.len() - accepted);
        }
    }

    fn feedback_frame(&self) -> Option<u64> {
        let in_period = self.frame_count % FEEDBACK_PERIOD;
        (self.frame_count >= FEEDBACK_PERIOD && in_period < FEEDBACK_FRAMES).then_some(in_period)
    }
}

impl Default for DemoCore {
    fn default() -> Self {
        Self::new()
    }
}

impl EmulationCore for DemoCore {
    fn emulate_frame(&mut self) {
        self.frame_count += 1;
        if self.frame_count % REDRAW_INTERVAL == 0 {
            self.draw();
            self.dirty = true;
        }
        self.produce_audio();
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
        self.feedback_frame().is_some()
    }

    fn feedback_offset(&self) -> i32 {
        match self.feedback_frame() {
            Some(n) if n % 2 == 0 => 2,
            Some(_) => -2,
            None => 0,
        }
    }

    fn flush_volatile_state(&mut self) {
        self.flushes += 1;
        debug!("demo core flushed at frame {}", self.frame_count);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_demo_core_redraws_on_interval() {
        let mut core = DemoCore::new();
        assert!(core.is_dirty());
        core.clear_dirty();

        core.emulate_frame();
        assert!(!core.is_dirty());
        core.emulate_frame();
        assert!(core.is_dirty());
    }

    #[test]
    fn test_demo_core_pattern_scrolls() {
        let mut core = DemoCore::new();
        let before = core.frame().get_pixel(11, 0);
        for _ in 0..REDRAW_INTERVAL * 2 {
            core.emulate_frame();
        }
        assert_ne!(core.frame().get_pixel(11, 0), before);
    }

    #[test]
    fn test_demo_core_feedback_bursts() {
        let mut core = DemoCore::new();
        for _ in 0..FEEDBACK_PERIOD - 1 {
            core.emulate_frame();
            assert!(!core.is_feedback_active());
        }
        core.emulate_frame();
        assert!(core.is_feedback_active());
        assert_eq!(core.feedback_offset(), 2);
        core.emulate_frame();
        assert_eq!(core.feedback_offset(), -2);

        for _ in 0..FEEDBACK_FRAMES {
            core.emulate_frame();
        }
        assert!(!core.is_feedback_active());
        assert_eq!(core.feedback_offset(), 0);
    }

    #[test]
    fn test_demo_core_feeds_audio() {
        let queue = SampleQueue::new(4096);
        let mut core = DemoCore::new().with_audio(queue.clone(), 612, 44100, 1);
        core.emulate_frame();
        core.emulate_frame();
        assert_eq!(queue.len(), 1224);
    }

    #[test]
    fn test_demo_core_stereo_tone_keeps_pitch() {
        let mono = SampleQueue::new(4096);
        let stereo = SampleQueue::new(4096);
        let mut mono_core = DemoCore::new().with_audio(mono.clone(), 100, 44100, 1);
        let mut stereo_core = DemoCore::new().with_audio(stereo.clone(), 200, 44100, 2);
        mono_core.emulate_frame();
        stereo_core.emulate_frame();

        let mut left_right = [0.0f32; 200];
        stereo.pop_into(&mut left_right);
        let mut expected = [0.0f32; 100];
        mono.pop_into(&mut expected);

        for (frame, sample) in left_right.chunks_exact(2).zip(expected) {
            assert_eq!(frame[0], frame[1]);
            assert_eq!(frame[0], sample);
        }
        assert!(expected.iter().any(|&s| s != 0.0));
    }

    #[test]
    fn test_demo_core_counts_flushes() {
        let mut core = DemoCore::new();
        core.flush_volatile_state();
        core.flush_volatile_state();
        assert_eq!(core.flushes(), 2);
    }
}
