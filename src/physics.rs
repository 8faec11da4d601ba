//! Spring-damper body steered by the audio control signal.

use crate::audio::ControlQueue;
use crate::params::{BodyParams, SignalConfig};

/// Vertical state of the steered body (pixels, up is positive)
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct MovableBody {
    pub mass: f32,
    pub position: f32,
    pub velocity: f32,
    /// Spring force from the last tick
    pub elastic_force: f32,
    /// Drag force from the last tick
    pub resistance_force: f32,
}

impl MovableBody {
    pub fn at_rest(mass: f32) -> Self {
        Self {
            mass,
            ..Self::default()
        }
    }
}

/// Quadratic drag, always opposing `velocity`
pub fn resistance_force(velocity: f32, coefficient: f32) -> f32 {
    -velocity.signum() * velocity * velocity * coefficient
}

/// Hooke restoring force toward zero
pub fn elastic_force(position: f32, coefficient: f32) -> f32 {
    -coefficient * position
}

/// Per-tick integrator for a [`MovableBody`].
///
/// Drains the control queue once per tick: the strongest new deviation
/// scaled by `signal_amplitude` is the driving force; no new samples means
/// no drive this tick.
pub struct PhysicsIntegrator {
    body: MovableBody,
    signal: SignalConfig,
    queue: ControlQueue,
    last_control: f32,
}

impl PhysicsIntegrator {
    pub fn new(body: BodyParams, signal: SignalConfig, queue: ControlQueue) -> Self {
        Self {
            body: MovableBody::at_rest(body.mass),
            signal,
            queue,
            last_control: 0.0,
        }
    }

    /// Drain new control samples and integrate one tick of `dt` seconds
    pub fn advance(&mut self, dt: f32) {
        let control = self
            .queue
            .drain_peak()
            .map(|peak| peak * self.signal.signal_amplitude)
            .unwrap_or(0.0);
        self.step(control, dt);
    }

    /// Integrate one tick with an explicit control force.
    ///
    /// A non-finite control is treated as 0 so a corrupt sample cannot
    /// poison the body state.
    pub fn step(&mut self, control: f32, dt: f32) {
        let control = if control.is_finite() { control } else { 0.0 };
        let dt = if dt.is_finite() { dt.max(0.0) } else { 0.0 };
        self.last_control = control;

        let body = &mut self.body;
        body.elastic_force = elastic_force(body.position, self.signal.elastic_coefficient);
        body.resistance_force = resistance_force(body.velocity, self.signal.resistance_coefficient);

        let acceleration = (control + body.elastic_force + body.resistance_force) * body.mass;

        let position = body.position + body.velocity * dt + acceleration * dt * dt;
        let velocity = body.velocity + acceleration * dt;
        if position.is_finite() && velocity.is_finite() {
            body.position = position;
            body.velocity = velocity;
        } else {
            log::warn!("body state diverged (a = {}), resetting to rest", acceleration);
            *body = MovableBody::at_rest(body.mass);
        }
    }

    /// Replace the signal mapping; takes effect on the next tick
    pub fn set_signal_config(&mut self, signal: SignalConfig) {
        self.signal = signal;
    }

    pub fn signal_config(&self) -> SignalConfig {
        self.signal
    }

    pub fn body(&self) -> &MovableBody {
        &self.body
    }

    /// Control force applied on the last tick
    pub fn last_control(&self) -> f32 {
        self.last_control
    }

    #[cfg(test)]
    fn body_mut(&mut self) -> &mut MovableBody {
        &mut self.body
    }
}
