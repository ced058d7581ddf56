// Sample ring - Shared buffer between the core and the audio callback
//
// The core pushes one frame's worth of samples per tick; the device callback
// drains them. Headroom (free space) is what the pacing loop polls under
// AudioDriven.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Bounded FIFO of f32 samples, filled and drained in slices
#[derive(Debug, Clone)]
pub struct SampleRing {
    samples: VecDeque<f32>,
    limit: usize,
}

impl SampleRing {
    /// Create a ring holding at most `limit` samples
    pub fn new(limit: usize) -> Self {
        Self {
            samples: VecDeque::with_capacity(limit),
            limit,
        }
    }

    /// Append as much of `input` as fits
    ///
    /// # Returns
    /// Number of samples accepted; the rest of `input` is discarded
    pub fn extend_from(&mut self, input: &[f32]) -> usize {
        let accepted = input.len().min(self.free());
        self.samples.extend(&input[..accepted]);
        accepted
    }

    /// Move the oldest samples into `out`, zero-filling whatever is left
    ///
    /// # Returns
    /// Number of samples that came from the ring
    pub fn drain_into(&mut self, out: &mut [f32]) -> usize {
        let taken = out.len().min(self.samples.len());
        for (slot, sample) in out.iter_mut().zip(self.samples.drain(..taken)) {
            *slot = sample;
        }
        out[taken..].fill(0.0);
        taken
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Maximum number of queued samples
    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Samples that can still be pushed
    pub fn free(&self) -> usize {
        self.limit - self.samples.len()
    }

    pub fn clear(&mut self) {
        self.samples.clear();
    }
}

/// Cloneable handle to a shared sample ring
///
/// The producer side (the core) and the consumer side (the device callback)
/// each hold a clone.
#[derive(Debug, Clone)]
pub struct SampleQueue {
    inner: Arc<Mutex<SampleRing>>,
}

impl SampleQueue {
    /// Create a queue holding up to `capacity` samples
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Arc::new(Mutex::new(SampleRing::new(capacity))),
        }
    }

    fn lock(&self) -> MutexGuard<'_, SampleRing> {
        // A panicking callback leaves the ring structurally intact
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Push as many samples as fit; returns how many were accepted
    pub fn push_samples(&self, samples: &[f32]) -> usize {
        self.lock().extend_from(samples)
    }

    /// Fill `out` from the ring, padding with silence on underrun
    ///
    /// Returns the number of samples that came from the ring.
    pub fn pop_into(&self, out: &mut [f32]) -> usize {
        self.lock().drain_into(out)
    }

    /// Samples currently queued
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether the ring is empty
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Free slots left
    pub fn free(&self) -> usize {
        self.lock().free()
    }

    /// Ring capacity
    pub fn capacity(&self) -> usize {
        self.lock().limit()
    }

    /// Drop everything queued
    pub fn clear(&self) {
        self.lock().clear();
    }
}
