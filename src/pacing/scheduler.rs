// Pacing scheduler - Reconciles emulation cadence, audio pressure and refresh
//
// The emulated frame rate (~72 Hz) does not match the panel refresh. Each tick
// picks one of two policies:
// - AudioDriven: the audio engine needs sync, so wait until its ring buffer
//   has room for another frame of samples. Never drops.
// - TickDriven: sleep towards a fixed-quantum deadline. With vsync on, one of
//   every N frames is dropped so the presents line up with the refresh.
//
// The deadline is allowed to lag by a few quanta; beyond that it is
// resynchronised to the current time instead of trying to catch up.

use super::clock::Clock;
use crate::audio::AudioEngine;
use log::{debug, warn};
use std::time::Duration;

/// Emulated frame period (~72 Hz)
pub const DEFAULT_TICK_QUANTUM: Duration = Duration::from_millis(14);

/// Lag tolerated before the deadline is resynchronised, in quanta
pub const DEFAULT_SLACK_QUANTA: u32 = 4;

/// One of every this many frames is dropped under TickDriven + vsync
pub const DEFAULT_DROP_INTERVAL: u32 = 5;

/// Fixed delay between menu frames
pub const DEFAULT_MENU_FRAME: Duration = Duration::from_millis(16);

/// Granularity of pacing sleeps
pub const DEFAULT_WAIT_STEP: Duration = Duration::from_millis(1);

/// Upper bound on audio wait steps per tick
pub const DEFAULT_MAX_AUDIO_WAIT_STEPS: u32 = 100;

/// Pacing policy chosen for a tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PacingPolicy {
    /// Wait for audio buffer headroom
    AudioDriven,
    /// Wait for the tick deadline
    TickDriven,
}

/// Pacing constants
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PacingConfig {
    /// Deadline increment per tick
    pub tick_quantum: Duration,
    /// Quanta of lag tolerated before resynchronising
    pub slack_quanta: u32,
    /// Drop one of every N frames under TickDriven + vsync (0 disables)
    pub drop_interval: u32,
    /// Fixed delay per menu frame
    pub menu_frame: Duration,
    /// Sleep granularity while waiting for the deadline
    pub wait_step: Duration,
    /// Maximum audio wait steps per tick
    pub max_audio_wait_steps: u32,
}

impl PacingConfig {
    /// Lag tolerated before resynchronising
    pub fn slack(&self) -> Duration {
        self.tick_quantum
            .checked_mul(self.slack_quanta)
            .unwrap_or(Duration::MAX)
    }
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self {
            tick_quantum: DEFAULT_TICK_QUANTUM,
            slack_quanta: DEFAULT_SLACK_QUANTA,
            drop_interval: DEFAULT_DROP_INTERVAL,
            menu_frame: DEFAULT_MENU_FRAME,
            wait_step: DEFAULT_WAIT_STEP,
            max_audio_wait_steps: DEFAULT_MAX_AUDIO_WAIT_STEPS,
        }
    }
}

/// Decision for one tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickPlan {
    /// Policy used for this tick's wait
    pub policy: PacingPolicy,
    /// Whether rendering is skipped to absorb the refresh mismatch
    pub drop_frame: bool,
}

/// Running totals, for logging and tests
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PacingStats {
    /// Ticks planned
    pub ticks: u64,
    /// Frames dropped by the drop counter
    pub drops: u64,
    /// Deadline resynchronisations
    pub resyncs: u64,
    /// Audio waits that hit the step bound
    pub audio_wait_timeouts: u64,
}

/// Per-tick pacing state
#[derive(Debug, Clone)]
pub struct PacingScheduler {
    config: PacingConfig,
    policy: PacingPolicy,
    drop_counter: u32,
    next_deadline: Duration,
    stats: PacingStats,
}

impl PacingScheduler {
    /// Create a scheduler with the deadline at the clock origin
    pub fn new(config: PacingConfig) -> Self {
        Self {
            config,
            policy: PacingPolicy::TickDriven,
            drop_counter: config.drop_interval,
            next_deadline: Duration::ZERO,
            stats: PacingStats::default(),
        }
    }

    /// Pacing constants
    pub fn config(&self) -> &PacingConfig {
        &self.config
    }

    /// Policy chosen by the most recent tick
    pub fn policy(&self) -> PacingPolicy {
        self.policy
    }

    /// Frames left until the next drop
    pub fn drop_counter(&self) -> u32 {
        self.drop_counter
    }

    /// Deadline of the next TickDriven wait
    pub fn next_deadline(&self) -> Duration {
        self.next_deadline
    }

    /// Running totals
    pub fn stats(&self) -> PacingStats {
        self.stats
    }

    /// Choose the policy and decide whether this tick's frame is dropped
    ///
    /// # Arguments
    /// * `audio` - Audio engine, polled for its sync requirement
    /// * `vsync` - Whether presents are locked to the panel refresh
    pub fn begin_tick<A: AudioEngine + ?Sized>(&mut self, audio: &A, vsync: bool) -> TickPlan {
        self.policy = if audio.requires_sync() {
            PacingPolicy::AudioDriven
        } else {
            PacingPolicy::TickDriven
        };
        self.stats.ticks += 1;

        let drop_frame =
            self.policy == PacingPolicy::TickDriven && vsync && self.advance_drop_counter();
        if drop_frame {
            self.stats.drops += 1;
        }

        TickPlan {
            policy: self.policy,
            drop_frame,
        }
    }

    fn advance_drop_counter(&mut self) -> bool {
        if self.config.drop_interval == 0 {
            return false;
        }
        self.drop_counter = self.drop_counter.saturating_sub(1);
        if self.drop_counter == 0 {
            self.drop_counter = self.config.drop_interval;
            true
        } else {
            false
        }
    }

    /// Block according to the tick's policy
    ///
    /// Called after rendering, whether or not a frame was presented.
    pub fn wait<A: AudioEngine + ?Sized, K: Clock + ?Sized>(
        &mut self,
        plan: &TickPlan,
        audio: &mut A,
        clock: &K,
    ) {
        match plan.policy {
            PacingPolicy::AudioDriven => self.wait_for_audio(audio),
            PacingPolicy::TickDriven => self.wait_for_deadline(clock),
        }
    }

    fn wait_for_audio<A: AudioEngine + ?Sized>(&mut self, audio: &mut A) {
        let mut steps = 0;
        while !audio.has_headroom() {
            if steps >= self.config.max_audio_wait_steps {
                self.stats.audio_wait_timeouts += 1;
                warn!("audio headroom not reached after {} wait steps", steps);
                return;
            }
            audio.wait_step();
            steps += 1;
        }
    }

    fn wait_for_deadline<K: Clock + ?Sized>(&mut self, clock: &K) {
        let deadline = self.next_deadline;
        let mut now = clock.now();
        while now < deadline {
            clock.sleep(self.config.wait_step.min(deadline - now));
            now = clock.now();
        }

        if deadline.saturating_add(self.config.slack()) < now {
            debug!(
                "pacing resync: {:?} behind deadline",
                now.saturating_sub(deadline)
            );
            self.next_deadline = now;
            self.stats.resyncs += 1;
        } else {
            self.next_deadline = deadline.saturating_add(self.config.tick_quantum);
        }
    }

    /// Restart the deadline from the current time (after a pause)
    pub fn resync<K: Clock + ?Sized>(&mut self, clock: &K) {
        self.next_deadline = clock.now();
    }
}
