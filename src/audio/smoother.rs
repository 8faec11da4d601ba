//! Single-pole jitter suppression for the control signal.

/// Averages each deviation with the previously emitted value.
///
/// The previous value is whatever was last queued, including the neutral
/// zeros queued for unvoiced blocks, so silence pulls the signal back to
/// rest.
#[derive(Clone, Debug, Default)]
pub struct ControlSignalSmoother {
    last: Option<f32>,
}

impl ControlSignalSmoother {
    pub fn new() -> Self {
        Self::default()
    }

    /// Smooth a raw deviation; the first sample passes through unchanged
    pub fn smooth(&mut self, raw: f32) -> f32 {
        let smoothed = match self.last {
            Some(last) => (last + raw) / 2.0,
            None => raw,
        };
        self.last = Some(smoothed);
        smoothed
    }

    /// Record a value queued without smoothing (unvoiced blocks)
    pub fn hold(&mut self, value: f32) {
        self.last = Some(value);
    }

    pub fn last(&self) -> Option<f32> {
        self.last
    }
}
