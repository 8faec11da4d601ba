//! Per-frame driver tying the terrain scroll to the body physics.

use crate::audio::ControlQueue;
use crate::params::{Settings, SignalConfig};
use crate::physics::{MovableBody, PhysicsIntegrator};
use crate::terrain::{Rect, TerrainScroller};

/// Longest step a single tick may take (seconds)
pub const MAX_TICK_S: f32 = 0.1;

/// Simulation-thread state: the terrain window and the steered body
pub struct Simulation {
    terrain: TerrainScroller,
    physics: PhysicsIntegrator,
    ticks: u64,
}

impl Simulation {
    /// Build a simulation from validated settings, draining `queue` each tick
    pub fn new(settings: &Settings, queue: ControlQueue) -> Self {
        Self::from_parts(
            TerrainScroller::new(settings.terrain.clone()),
            PhysicsIntegrator::new(settings.body, settings.signal, queue),
        )
    }

    pub fn from_parts(terrain: TerrainScroller, physics: PhysicsIntegrator) -> Self {
        Self {
            terrain,
            physics,
            ticks: 0,
        }
    }

    /// Advance one frame.
    ///
    /// `dt` is clamped to `[0, MAX_TICK_S]`. An empty viewport freezes the
    /// whole simulation for this tick.
    pub fn tick(&mut self, viewport: &Rect, dt: f32) {
        if viewport.is_empty() {
            return;
        }
        let dt = clamp_dt(dt);

        self.terrain.advance(viewport, dt);
        self.physics.advance(dt);
        self.ticks += 1;
    }

    /// Swap in reloaded signal settings; takes effect next tick
    pub fn set_signal_config(&mut self, signal: SignalConfig) {
        self.physics.set_signal_config(signal);
    }

    pub fn terrain(&self) -> &TerrainScroller {
        &self.terrain
    }

    pub fn body(&self) -> &MovableBody {
        self.physics.body()
    }

    pub fn physics(&self) -> &PhysicsIntegrator {
        &self.physics
    }

    /// Ticks that actually advanced
    pub fn ticks(&self) -> u64 {
        self.ticks
    }
}

fn clamp_dt(dt: f32) -> f32 {
    if dt.is_finite() {
        dt.clamp(0.0, MAX_TICK_S)
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::ControlSample;
    use crate::params::HeightProfile;

    fn settings() -> Settings {
        let mut settings = Settings::default();
        settings.terrain.height_profile = HeightProfile::Uniform { seed: Some(11) };
        settings
    }

    fn viewport() -> Rect {
        Rect::new(0.0, 0.0, 1280.0, 720.0)
    }

    #[test]
    fn test_dt_clamped() {
        assert_eq!(clamp_dt(5.0), MAX_TICK_S);
        assert_eq!(clamp_dt(-1.0), 0.0);
        assert_eq!(clamp_dt(f32::NAN), 0.0);
        assert_eq!(clamp_dt(0.016), 0.016);
    }

    #[test]
    fn test_stall_does_not_jump_terrain() {
        let mut sim = Simulation::new(&settings(), ControlQueue::new(8, 0));
        sim.tick(&viewport(), 30.0);

        let max_offset = settings().terrain.speed_segments_per_s * MAX_TICK_S as f64;
        assert!(sim.terrain().begin_offset() <= max_offset + 1e-9);
    }

    #[test]
    fn test_empty_viewport_freezes() {
        let queue = ControlQueue::new(8, 0);
        let mut sim = Simulation::new(&settings(), queue.clone());
        queue.push(ControlSample {
            deviation: 0.5,
            pitch_log: 5.0,
            voiced: true,
        });

        sim.tick(&Rect::new(0.0, 0.0, 0.0, 0.0), 0.016);
        assert_eq!(sim.ticks(), 0);
        assert_eq!(*sim.body(), MovableBody::at_rest(1.0));

        // The pending sample is still there for the next real tick
        sim.tick(&viewport(), 0.016);
        assert!(sim.body().velocity > 0.0);
    }

    #[test]
    fn test_signal_reload_changes_drive() {
        let queue = ControlQueue::new(8, 0);
        let mut sim = Simulation::new(&settings(), queue.clone());
        sim.set_signal_config(SignalConfig {
            signal_amplitude: 0.0,
            ..SignalConfig::default()
        });
        queue.push(ControlSample {
            deviation: 1.0,
            pitch_log: 5.0,
            voiced: true,
        });
        sim.tick(&viewport(), 0.016);
        assert_eq!(sim.physics().last_control(), 0.0);
        assert_eq!(sim.body().position, 0.0);
    }
}
