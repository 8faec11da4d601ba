//! Audio analysis configuration and constants.

use std::ops::Range;

use serde::Deserialize;

use crate::error::{Error, Result};

/// Pitch analysis configuration (block geometry, voice band, adaptation)
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Nominal sample rate (Hz). Replaced by the device rate when a stream opens.
    pub sample_rate_hz: u32,

    /// Samples per analysis block (must be power of 2)
    /// 1024 @ 44.1kHz = 23ms, long enough for two periods of an 86 Hz tone
    pub block_size: usize,

    /// Lowest fundamental considered a voice (Hz)
    pub min_voice_hz: f32,

    /// Highest fundamental considered a voice (Hz)
    pub max_voice_hz: f32,

    /// Amplitude gate as a fraction of the block's mean absolute amplitude.
    /// Samples at or below `mean * gate_ratio` are zeroed.
    pub gate_ratio: f32,

    /// Per-block relative decay of the adaptive pitch range (dimensionless)
    pub range_decay: f32,

    /// Pitch tracker aperiodicity threshold (0..1, lower = stricter)
    pub pitch_threshold: f32,

    /// Control samples retained for display and late draining
    pub history_len: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            sample_rate_hz: 44100,
            block_size: 1024,
            min_voice_hz: 90.0,
            max_voice_hz: 1100.0,
            gate_ratio: 0.5,
            range_decay: 0.001,
            pitch_threshold: 0.15,
            history_len: 512,
        }
    }
}

impl AnalysisConfig {
    /// Same config with the sample rate of an opened device.
    ///
    /// The block grows (never shrinks) to the next power of two that holds
    /// two periods of `min_voice_hz`, so high device rates keep the whole
    /// voice band inside the pitch search.
    pub fn with_sample_rate(&self, sample_rate_hz: u32) -> Self {
        let mut config = Self {
            sample_rate_hz,
            ..self.clone()
        };
        let needed = config.min_block_size();
        if needed > config.block_size {
            log::info!(
                "analysis block {} -> {} samples for {} Hz at {}Hz",
                config.block_size,
                needed,
                config.min_voice_hz,
                sample_rate_hz
            );
            config.block_size = needed;
        }
        config
    }

    /// Smallest power-of-two block whose half covers the longest voice period
    pub fn min_block_size(&self) -> usize {
        if !(self.min_voice_hz > 0.0 && self.sample_rate_hz > 0) {
            return self.block_size;
        }
        let longest = (self.sample_rate_hz as f32 / self.min_voice_hz).ceil() as usize;
        (2 * longest).next_power_of_two()
    }

    /// Convert frequency (Hz) to FFT bin index
    pub fn hz_to_bin(&self, hz: f32) -> usize {
        ((hz * self.block_size as f32) / self.sample_rate_hz as f32) as usize
    }

    /// Number of magnitude bins produced per block (DC up to Nyquist, exclusive)
    pub fn spectrum_len(&self) -> usize {
        self.block_size / 2
    }

    /// FFT bin range covering the voice band, clamped to the spectrum
    pub fn voice_bins(&self) -> Range<usize> {
        let len = self.spectrum_len();
        let start = self.hz_to_bin(self.min_voice_hz).min(len);
        let end = (self.hz_to_bin(self.max_voice_hz) + 1).clamp(start, len);
        start..end
    }

    /// Lag range (samples) the pitch tracker searches, clamped to half a block
    pub fn voice_lags(&self) -> Range<usize> {
        let half = self.block_size / 2;
        let sr = self.sample_rate_hz as f32;
        let shortest = ((sr / self.max_voice_hz).floor() as usize).max(2);
        let longest = ((sr / self.min_voice_hz).ceil() as usize).min(half);
        shortest.min(longest)..longest
    }

    /// Validate configuration (block size must be power of 2, etc.)
    pub fn validate(&self) -> Result<()> {
        if !self.block_size.is_power_of_two() || self.block_size < 64 {
            return Err(Error::invalid(
                "analysis.block_size",
                format!("must be a power of 2 >= 64, got {}", self.block_size),
            ));
        }
        if self.sample_rate_hz == 0 {
            return Err(Error::invalid("analysis.sample_rate_hz", "must be > 0"));
        }
        if !(self.min_voice_hz > 0.0 && self.min_voice_hz < self.max_voice_hz) {
            return Err(Error::invalid(
                "analysis.min_voice_hz",
                format!(
                    "voice band must satisfy 0 < min < max, got {}..{}",
                    self.min_voice_hz, self.max_voice_hz
                ),
            ));
        }
        if !(0.0..1.0).contains(&self.range_decay) {
            return Err(Error::invalid(
                "analysis.range_decay",
                format!("must be in [0, 1), got {}", self.range_decay),
            ));
        }
        if !(self.gate_ratio >= 0.0 && self.gate_ratio.is_finite()) {
            return Err(Error::invalid("analysis.gate_ratio", "must be finite and >= 0"));
        }
        if !(self.pitch_threshold > 0.0 && self.pitch_threshold < 1.0) {
            return Err(Error::invalid("analysis.pitch_threshold", "must be in (0, 1)"));
        }
        if self.min_block_size() > self.block_size {
            return Err(Error::invalid(
                "analysis.block_size",
                format!(
                    "{} samples cannot hold two periods of {} Hz at {}Hz (need {})",
                    self.block_size,
                    self.min_voice_hz,
                    self.sample_rate_hz,
                    self.min_block_size()
                ),
            ));
        }
        if self.history_len < 2 {
            return Err(Error::invalid("analysis.history_len", "must be >= 2"));
        }
        Ok(())
    }
}

/// Audio constants (compile-time, match Glicol engine setup)
pub mod audio_constants {
    /// Glicol render block size (samples per engine block)
    /// 128 = 2.9ms @ 44.1kHz
    pub const SYNTH_BLOCK_SIZE: usize = 128;
}
