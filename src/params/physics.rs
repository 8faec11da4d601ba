//! Body dynamics parameters and the audio-to-force mapping.

use serde::Deserialize;

use crate::error::{Error, Result};

/// Mapping from the smoothed pitch deviation to the force on the body.
///
/// Swapped wholesale on reload; the integrator observes the new values on
/// its next tick.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct SignalConfig {
    /// Force per unit of log-frequency deviation (px/s² per ln Hz)
    /// Formula: control = peak_deviation * signal_amplitude
    pub signal_amplitude: f32,

    /// Spring constant pulling the body back to the centre line (1/s²)
    /// Formula: elastic = -elastic_coefficient * position
    pub elastic_coefficient: f32,

    /// Quadratic drag coefficient (1/px)
    /// Formula: resistance = -sign(v) * v² * resistance_coefficient
    pub resistance_coefficient: f32,
}

impl Default for SignalConfig {
    fn default() -> Self {
        Self {
            signal_amplitude: 3000.0,
            elastic_coefficient: 4.0,
            resistance_coefficient: 0.02,
        }
    }
}

impl SignalConfig {
    pub fn validate(&self) -> Result<()> {
        if !self.signal_amplitude.is_finite() {
            return Err(Error::invalid("signal.signal_amplitude", "must be finite"));
        }
        if !(self.elastic_coefficient.is_finite() && self.elastic_coefficient >= 0.0) {
            return Err(Error::invalid(
                "signal.elastic_coefficient",
                format!("must be finite and >= 0, got {}", self.elastic_coefficient),
            ));
        }
        if !(self.resistance_coefficient.is_finite() && self.resistance_coefficient >= 0.0) {
            return Err(Error::invalid(
                "signal.resistance_coefficient",
                format!("must be finite and >= 0, got {}", self.resistance_coefficient),
            ));
        }
        Ok(())
    }
}

/// Fixed properties of the steered body
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct BodyParams {
    /// Gain applied to the net force before integration (must be > 0)
    pub mass: f32,
}

impl Default for BodyParams {
    fn default() -> Self {
        Self { mass: 1.0 }
    }
}

impl BodyParams {
    pub fn validate(&self) -> Result<()> {
        if !(self.mass.is_finite() && self.mass > 0.0) {
            return Err(Error::invalid(
                "body.mass",
                format!("must be finite and > 0, got {}", self.mass),
            ));
        }
        Ok(())
    }
}
