//! Per-block analysis: gate → spectrum → pitch → adaptive range → smoothing.

use super::frame::SpectralFrame;
use super::pitch::PitchExtractor;
use super::queue::{ControlQueue, ControlSample};
use super::range::{AdaptiveRangeTracker, RangeState};
use super::smoother::ControlSignalSmoother;
use crate::params::AnalysisConfig;

/// Audio-thread side of the control channel.
///
/// Owns all analysis scratch; one instance per stream, driven from the
/// audio callback (or a feeder thread) with whole blocks.
pub struct AudioPipeline {
    config: AnalysisConfig,
    frame: SpectralFrame,
    pitch: PitchExtractor,
    range: AdaptiveRangeTracker,
    smoother: ControlSignalSmoother,
    last_pitch_log: f32,
}

impl AudioPipeline {
    pub fn new(config: &AnalysisConfig) -> Self {
        Self {
            config: config.clone(),
            frame: SpectralFrame::new(config.block_size),
            pitch: PitchExtractor::new(
                config.sample_rate_hz as f32,
                config.block_size,
                config.voice_lags(),
                config.pitch_threshold,
            ),
            range: AdaptiveRangeTracker::new(config.range_decay),
            smoother: ControlSignalSmoother::new(),
            last_pitch_log: 0.0,
        }
    }

    pub fn block_size(&self) -> usize {
        self.config.block_size
    }

    pub fn sample_rate_hz(&self) -> u32 {
        self.config.sample_rate_hz
    }

    /// Analyse one mono block.
    ///
    /// Unvoiced blocks yield a zero deviation flagged `voiced: false`; the
    /// range tracker is not updated and the display pitch repeats the last
    /// voiced value.
    pub fn process_block(&mut self, block: &[f32]) -> ControlSample {
        self.frame.load(block);
        self.frame.gate(self.config.gate_ratio);
        self.frame.gated_spectrum(self.config.voice_bins());

        let observed = self
            .pitch
            .detect(self.frame.samples())
            .and_then(|freq| self.range.observe(freq));

        match observed {
            Some((raw, freq_log)) => {
                self.last_pitch_log = freq_log;
                ControlSample {
                    deviation: self.smoother.smooth(raw),
                    pitch_log: freq_log,
                    voiced: true,
                }
            }
            None => {
                self.smoother.hold(0.0);
                ControlSample::unvoiced(self.last_pitch_log)
            }
        }
    }

    /// Analyse a block and publish the result and spectrum to `queue`
    pub fn process_into(&mut self, block: &[f32], queue: &ControlQueue) -> ControlSample {
        let sample = self.process_block(block);
        queue.push(sample);
        queue.publish_spectrum(self.frame.magnitudes());
        sample
    }

    /// Gated voice-band spectrum of the last block
    pub fn spectrum(&self) -> &[f32] {
        self.frame.magnitudes()
    }

    pub fn range(&self) -> RangeState {
        self.range.state()
    }
}

/// Collects de-interleaved first-channel samples into fixed-size blocks.
///
/// Device callbacks deliver arbitrary buffer lengths; the pipeline only
/// ever sees complete blocks.
pub struct BlockAssembler {
    block: Vec<f32>,
    filled: usize,
}

impl BlockAssembler {
    pub fn new(block_size: usize) -> Self {
        Self {
            block: vec![0.0; block_size.max(1)],
            filled: 0,
        }
    }

    /// Append interleaved frames, keeping only channel 0, and call
    /// `on_block` for every completed block.
    pub fn push_interleaved(
        &mut self,
        data: &[f32],
        channels: usize,
        mut on_block: impl FnMut(&[f32]),
    ) {
        for &sample in data.iter().step_by(channels.max(1)) {
            self.block[self.filled] = sample;
            self.filled += 1;
            if self.filled == self.block.len() {
                on_block(&self.block);
                self.filled = 0;
            }
        }
    }

    /// Samples waiting for the current block to complete
    pub fn pending(&self) -> usize {
        self.filled
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::PI;

    fn config() -> AnalysisConfig {
        AnalysisConfig::default()
    }

    fn tone(freq: f32, cfg: &AnalysisConfig) -> Vec<f32> {
        let sr = cfg.sample_rate_hz as f32;
        (0..cfg.block_size)
            .map(|i| 0.5 * (2.0 * PI * freq * i as f32 / sr).sin())
            .collect()
    }

    #[test]
    fn test_dc_block_queues_neutral_sample() {
        let cfg = config();
        let mut pipeline = AudioPipeline::new(&cfg);
        let queue = ControlQueue::new(cfg.history_len, cfg.spectrum_len());

        let sample = pipeline.process_into(&vec![0.3; cfg.block_size], &queue);
        assert_eq!(sample.deviation, 0.0);
        assert!(!sample.voiced);
        assert_eq!(queue.drain_peak(), Some(0.0));
        assert_eq!(pipeline.range(), RangeState::NEUTRAL);
    }

    #[test]
    fn test_silence_gates_everything() {
        let cfg = config();
        let mut pipeline = AudioPipeline::new(&cfg);
        let sample = pipeline.process_block(&vec![0.0; cfg.block_size]);

        assert_eq!(sample, ControlSample::unvoiced(0.0));
        assert!(pipeline.spectrum().iter().all(|&m| m == 0.0));
    }

    #[test]
    fn test_first_voiced_block_is_centred() {
        let cfg = config();
        let mut pipeline = AudioPipeline::new(&cfg);
        let sample = pipeline.process_block(&tone(220.0, &cfg));

        assert!(sample.voiced);
        assert!((sample.pitch_log - 220.0f32.ln()).abs() < 0.01);
        assert!(sample.deviation.abs() < 1e-4);
    }

    #[test]
    fn test_pitch_jump_gives_signed_deviation() {
        let cfg = config();
        let mut pipeline = AudioPipeline::new(&cfg);

        // Establish a low-high range, then sit in the middle
        pipeline.process_block(&tone(150.0, &cfg));
        pipeline.process_block(&tone(600.0, &cfg));
        let high = pipeline.process_block(&tone(600.0, &cfg));
        assert!(high.deviation > 0.0);

        let mut low = high;
        for _ in 0..4 {
            low = pipeline.process_block(&tone(150.0, &cfg));
        }
        assert!(low.deviation < 0.0);
    }

    #[test]
    fn test_unvoiced_block_keeps_display_pitch() {
        let cfg = config();
        let mut pipeline = AudioPipeline::new(&cfg);
        let voiced = pipeline.process_block(&tone(330.0, &cfg));
        let silent = pipeline.process_block(&vec![0.0; cfg.block_size]);

        assert!(!silent.voiced);
        assert_eq!(silent.pitch_log, voiced.pitch_log);
        assert_eq!(silent.deviation, 0.0);
    }

    #[test]
    fn test_low_voice_detected_at_high_device_rates() {
        for rate in [48000, 96000] {
            let cfg = config().with_sample_rate(rate);
            let mut pipeline = AudioPipeline::new(&cfg);
            assert_eq!(pipeline.block_size(), cfg.block_size);

            for freq in [95.0, 120.0, 180.0, 700.0] {
                let sample = pipeline.process_block(&tone(freq, &cfg));
                assert!(sample.voiced, "{} Hz at {} Hz unvoiced", freq, rate);
                assert!(
                    (sample.pitch_log - freq.ln()).abs() < 0.01,
                    "{} Hz at {} Hz read as {}",
                    freq,
                    rate,
                    sample.pitch_log.exp()
                );
            }
        }
    }

    #[test]
    fn test_assembler_takes_first_channel() {
        let mut assembler = BlockAssembler::new(4);
        let mut blocks: Vec<Vec<f32>> = Vec::new();

        // Stereo: left = 1,2,3..., right = -1
        let stereo: Vec<f32> = (1..=6).flat_map(|i| [i as f32, -1.0]).collect();
        assembler.push_interleaved(&stereo, 2, |b| blocks.push(b.to_vec()));
        assert_eq!(blocks, vec![vec![1.0, 2.0, 3.0, 4.0]]);
        assert_eq!(assembler.pending(), 2);

        let more: Vec<f32> = (7..=8).flat_map(|i| [i as f32, -1.0]).collect();
        assembler.push_interleaved(&more, 2, |b| blocks.push(b.to_vec()));
        assert_eq!(blocks[1], vec![5.0, 6.0, 7.0, 8.0]);
        assert_eq!(assembler.pending(), 0);
    }
}
