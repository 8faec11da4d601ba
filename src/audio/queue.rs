//! Control samples handed from the audio thread to the simulation thread.
//!
//! The audio thread appends one [`ControlSample`] per analysed block; the
//! simulation thread collapses everything new since its last tick into a
//! single peak. Both sides hold the lock only for a copy, never while
//! analysing.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Result of analysing one audio block
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ControlSample {
    /// Smoothed deviation from the adaptive pitch centre (ln Hz); 0 when unvoiced
    pub deviation: f32,
    /// Log pitch for display; repeats the last voiced value when unvoiced
    pub pitch_log: f32,
    /// Whether a pitch was detected in this block
    pub voiced: bool,
}

impl ControlSample {
    pub fn unvoiced(pitch_log: f32) -> Self {
        Self {
            deviation: 0.0,
            pitch_log,
            voiced: false,
        }
    }
}

struct QueueState {
    /// Most recent samples, oldest first (bounded by `history_len`)
    samples: VecDeque<ControlSample>,
    history_len: usize,
    /// Samples ever appended
    appended: u64,
    /// Value of `appended` at the last drain
    drained: u64,
    /// Gated voice-band spectrum of the latest block
    spectrum: Vec<f32>,
}

/// Shared, append-only control channel (clone to share between threads)
#[derive(Clone)]
pub struct ControlQueue {
    inner: Arc<Mutex<QueueState>>,
}

impl ControlQueue {
    pub fn new(history_len: usize, spectrum_len: usize) -> Self {
        let history_len = history_len.max(1);
        Self {
            inner: Arc::new(Mutex::new(QueueState {
                samples: VecDeque::with_capacity(history_len),
                history_len,
                appended: 0,
                drained: 0,
                spectrum: vec![0.0; spectrum_len],
            })),
        }
    }

    /// A panicking holder cannot leave the state half-written (every
    /// critical section is a plain copy), so poisoning is ignored.
    fn lock(&self) -> MutexGuard<'_, QueueState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Append a sample, evicting the oldest once the history is full
    pub fn push(&self, sample: ControlSample) {
        let mut state = self.lock();
        if state.samples.len() == state.history_len {
            state.samples.pop_front();
        }
        state.samples.push_back(sample);
        state.appended += 1;
    }

    /// Collapse every sample appended since the previous drain into the one
    /// with the largest magnitude (sign kept), and mark them consumed.
    ///
    /// A single fresh sample already counts as new input. Returns `None`
    /// when nothing new arrived.
    pub fn drain_peak(&self) -> Option<f32> {
        let mut state = self.lock();
        let fresh = state.appended - state.drained;
        if fresh == 0 {
            return None;
        }
        state.drained = state.appended;

        let retained = (fresh as usize).min(state.samples.len());
        let skip = state.samples.len() - retained;
        state
            .samples
            .iter()
            .skip(skip)
            .map(|s| s.deviation)
            .filter(|d| d.is_finite())
            .fold(None, |peak: Option<f32>, d| match peak {
                Some(p) if p.abs() >= d.abs() => Some(p),
                _ => Some(d),
            })
            .or(Some(0.0))
    }

    /// Most recently appended sample
    pub fn last(&self) -> Option<ControlSample> {
        self.lock().samples.back().copied()
    }

    /// Total samples appended since creation
    pub fn appended(&self) -> u64 {
        self.lock().appended
    }

    /// Copy the retained history (oldest first) into `out`
    pub fn copy_history(&self, out: &mut Vec<ControlSample>) {
        let state = self.lock();
        out.clear();
        out.extend(state.samples.iter().copied());
    }

    /// Replace the diagnostic spectrum snapshot
    pub fn publish_spectrum(&self, magnitudes: &[f32]) {
        let mut state = self.lock();
        if state.spectrum.len() != magnitudes.len() {
            state.spectrum.resize(magnitudes.len(), 0.0);
        }
        state.spectrum.copy_from_slice(magnitudes);
    }

    /// Copy the latest spectrum snapshot into `out`
    pub fn copy_spectrum(&self, out: &mut Vec<f32>) {
        let state = self.lock();
        out.clear();
        out.extend_from_slice(&state.spectrum);
    }
}
