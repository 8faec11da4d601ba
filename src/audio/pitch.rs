//! Time-domain fundamental frequency estimation.
//!
//! YIN: squared difference function, cumulative mean normalisation, first
//! dip under an absolute threshold, parabolic refinement of the lag.

use std::ops::Range;

/// Single-voice pitch tracker with preallocated scratch
pub struct PitchExtractor {
    sample_rate: f32,
    block_size: usize,
    lags: Range<usize>,
    threshold: f32,
    /// Normalised difference, indexed by lag (0..=lags.end)
    cmnd: Vec<f32>,
}

impl PitchExtractor {
    /// `lags` bounds the period search in samples; it is clamped to half
    /// the block so every lag compares two full half-blocks.
    pub fn new(sample_rate: f32, block_size: usize, lags: Range<usize>, threshold: f32) -> Self {
        let end = lags.end.min(block_size / 2);
        let start = lags.start.clamp(2, end.max(2));
        Self {
            sample_rate,
            block_size,
            lags: start..end,
            threshold,
            cmnd: vec![0.0; end + 1],
        }
    }

    /// Estimate the fundamental of `samples` in Hz.
    ///
    /// Returns `None` for silence, aperiodic blocks, blocks shorter than the
    /// analysis size and any non-finite estimate.
    pub fn detect(&mut self, samples: &[f32]) -> Option<f32> {
        if samples.len() < self.block_size || self.lags.is_empty() {
            return None;
        }
        let peak = samples.iter().fold(0.0f32, |m, s| m.max(s.abs()));
        if !(peak.is_finite() && peak > 0.0) {
            return None;
        }

        let window = self.block_size / 2;
        let max_lag = self.lags.end;

        self.cmnd[0] = 1.0;
        let mut running = 0.0f32;
        for tau in 1..=max_lag {
            let d: f32 = samples[..window]
                .iter()
                .zip(&samples[tau..tau + window])
                .map(|(a, b)| (a - b) * (a - b))
                .sum();
            running += d;
            self.cmnd[tau] = if running > 0.0 {
                d * tau as f32 / running
            } else {
                1.0
            };
        }

        let tau = self.first_dip()?;
        let refined = self.refine(tau);
        let freq = self.sample_rate / refined;

        (freq.is_finite() && freq > 0.0).then_some(freq)
    }

    /// First lag under the threshold, walked down to its local minimum.
    ///
    /// A minimum on the last searchable lag means the true period lies
    /// beyond the range, so it counts as no pitch.
    fn first_dip(&self) -> Option<usize> {
        let last = self.lags.end - 1;
        let mut tau = self.lags.start;
        while tau < self.lags.end {
            if self.cmnd[tau] < self.threshold {
                while tau < last && self.cmnd[tau + 1] < self.cmnd[tau] {
                    tau += 1;
                }
                return (tau < last).then_some(tau);
            }
            tau += 1;
        }
        None
    }

    fn refine(&self, tau: usize) -> f32 {
        if tau == 0 || tau + 1 >= self.cmnd.len() {
            return tau as f32;
        }
        let (s0, s1, s2) = (self.cmnd[tau - 1], self.cmnd[tau], self.cmnd[tau + 1]);
        let denom = 2.0 * (s0 - 2.0 * s1 + s2);
        if denom.abs() < f32::EPSILON {
            return tau as f32;
        }
        let shift = ((s0 - s2) / denom).clamp(-1.0, 1.0);
        tau as f32 + shift
    }
}
