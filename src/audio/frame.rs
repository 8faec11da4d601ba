//! Fixed-size analysis block with amplitude gating and a band-limited,
//! gated magnitude spectrum.

use std::f32::consts::PI;
use std::ops::Range;
use std::sync::Arc;

use rustfft::{num_complex::Complex, Fft, FftPlanner};

/// One audio block plus the scratch space to analyse it.
///
/// All buffers are sized once at construction; loading and analysing a
/// block never allocates.
pub struct SpectralFrame {
    samples: Vec<f32>,
    window: Vec<f32>,
    fft: Arc<dyn Fft<f32>>,
    fft_buffer: Vec<Complex<f32>>,
    fft_scratch: Vec<Complex<f32>>,
    magnitudes: Vec<f32>,
}

impl SpectralFrame {
    pub fn new(block_size: usize) -> Self {
        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(block_size);
        let scratch_len = fft.get_inplace_scratch_len();

        Self {
            samples: vec![0.0; block_size],
            window: (0..block_size).map(|i| hann_window(i, block_size)).collect(),
            fft,
            fft_buffer: vec![Complex::new(0.0, 0.0); block_size],
            fft_scratch: vec![Complex::new(0.0, 0.0); scratch_len],
            magnitudes: vec![0.0; block_size / 2],
        }
    }

    pub fn block_size(&self) -> usize {
        self.samples.len()
    }

    /// Copy a mono block in, zero-padding or truncating to the block size
    pub fn load(&mut self, block: &[f32]) {
        let n = block.len().min(self.samples.len());
        self.samples[..n].copy_from_slice(&block[..n]);
        self.samples[n..].fill(0.0);
    }

    /// Time-domain samples (gated once [`gate`](Self::gate) has run)
    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    /// Zero every sample whose magnitude does not exceed `ratio` times the
    /// block's mean absolute amplitude. Returns that mean.
    ///
    /// Non-finite input samples are zeroed first so they cannot poison the
    /// mean.
    pub fn gate(&mut self, ratio: f32) -> f32 {
        for s in &mut self.samples {
            if !s.is_finite() {
                *s = 0.0;
            }
        }

        let mean = self.samples.iter().map(|s| s.abs()).sum::<f32>() / self.samples.len() as f32;
        let threshold = mean * ratio;

        for s in &mut self.samples {
            if s.abs() <= threshold {
                *s = 0.0;
            }
        }
        mean
    }

    /// Hann-windowed magnitude spectrum of the current samples, restricted
    /// to `band` and spectrally gated.
    ///
    /// Bins outside `band` are zeroed. Inside it, bins above the band's
    /// average magnitude are squared and the rest zeroed. Returns the band
    /// average (0 for an empty band or a silent block).
    pub fn gated_spectrum(&mut self, band: Range<usize>) -> f32 {
        for ((dst, &s), &w) in self
            .fft_buffer
            .iter_mut()
            .zip(&self.samples)
            .zip(&self.window)
        {
            *dst = Complex::new(s * w, 0.0);
        }
        self.fft
            .process_with_scratch(&mut self.fft_buffer, &mut self.fft_scratch);

        let len = self.magnitudes.len();
        let band = band.start.min(len)..band.end.min(len);

        for (i, (mag, c)) in self.magnitudes.iter_mut().zip(&self.fft_buffer).enumerate() {
            *mag = if band.contains(&i) { c.norm() } else { 0.0 };
        }

        let average = if band.is_empty() {
            0.0
        } else {
            self.magnitudes[band.clone()].iter().sum::<f32>() / band.len() as f32
        };
        if !(average.is_finite() && average > 0.0) {
            self.magnitudes.fill(0.0);
            return 0.0;
        }

        for mag in &mut self.magnitudes[band] {
            *mag = if *mag > average { *mag * *mag } else { 0.0 };
        }
        average
    }

    /// Spectrum produced by the last [`gated_spectrum`](Self::gated_spectrum)
    pub fn magnitudes(&self) -> &[f32] {
        &self.magnitudes
    }
}

/// Hann window function for FFT analysis
pub fn hann_window(index: usize, size: usize) -> f32 {
    0.5 * (1.0 - ((2.0 * PI * index as f32) / (size as f32 - 1.0)).cos())
}
