//! Headless end-to-end runs: synthetic voice → pipeline → queue → simulation.

use std::f32::consts::PI;
use std::path::Path;

use pitchflight::audio::{AudioPipeline, ControlQueue};
use pitchflight::params::{AnalysisConfig, HeightProfile, Settings};
use pitchflight::scene::SceneBuilder;
use pitchflight::simulation::Simulation;
use pitchflight::terrain::Rect;

const DT: f32 = 1.0 / 60.0;

fn tone(freq: f32, cfg: &AnalysisConfig) -> Vec<f32> {
    let sr = cfg.sample_rate_hz as f32;
    (0..cfg.block_size)
        .map(|i| 0.4 * (2.0 * PI * freq * i as f32 / sr).sin())
        .collect()
}

fn seeded_settings() -> Settings {
    let mut settings = Settings::default();
    settings.terrain.height_profile = HeightProfile::Uniform { seed: Some(2024) };
    settings
}

fn viewport() -> Rect {
    Rect::new(0.0, 0.0, 1280.0, 720.0)
}

#[test]
fn test_singing_high_then_low_steers_body() {
    let settings = seeded_settings();
    let cfg = settings.analysis.clone();
    let queue = ControlQueue::new(cfg.history_len, cfg.spectrum_len());
    let mut pipeline = AudioPipeline::new(&cfg);
    let mut sim = Simulation::new(&settings, queue.clone());

    let low = tone(150.0, &cfg);
    let high = tone(600.0, &cfg);

    // Calibrate the range on the low note, body stays near rest
    for _ in 0..3 {
        pipeline.process_into(&low, &queue);
        sim.tick(&viewport(), DT);
    }
    assert!(sim.body().position.abs() < 1.0);

    for _ in 0..20 {
        pipeline.process_into(&high, &queue);
        sim.tick(&viewport(), DT);
    }
    let peak = sim.body().position;
    assert!(peak > 0.0, "high pitch should climb, got {}", peak);
    assert!(sim.body().velocity > 0.0);

    let mut lowest = peak;
    for _ in 0..60 {
        pipeline.process_into(&low, &queue);
        sim.tick(&viewport(), DT);
        lowest = lowest.min(sim.body().position);
    }
    assert!(lowest < 0.0, "low pitch should dive, lowest {}", lowest);
}

#[test]
fn test_silence_leaves_body_at_rest() {
    let settings = seeded_settings();
    let cfg = settings.analysis.clone();
    let queue = ControlQueue::new(cfg.history_len, cfg.spectrum_len());
    let mut pipeline = AudioPipeline::new(&cfg);
    let mut sim = Simulation::new(&settings, queue.clone());

    let silence = vec![0.0; cfg.block_size];
    for _ in 0..120 {
        pipeline.process_into(&silence, &queue);
        sim.tick(&viewport(), DT);
    }

    assert_eq!(sim.body().position, 0.0);
    assert_eq!(sim.body().velocity, 0.0);
    assert_eq!(sim.ticks(), 120);
}

#[test]
fn test_long_session_terrain_stays_contiguous() {
    let text = r#"
        [terrain]
        speed_segments_per_s = 6.0

        [terrain.height_profile]
        kind = "smooth"
        seed = 5
        frequency = 0.25
    "#;
    let settings = Settings::from_toml(text, Path::new("session.toml")).unwrap();
    let queue = ControlQueue::new(8, 0);
    let mut sim = Simulation::new(&settings, queue);
    let mut scene = SceneBuilder::new(4096, 0..0);

    for frame in 0..3000 {
        // Resize half-way through
        let view = if frame < 1500 {
            viewport()
        } else {
            Rect::new(0.0, 0.0, 1920.0, 1200.0)
        };
        sim.tick(&view, DT);

        let terrain = sim.terrain();
        let width = terrain.segment_width();
        let bounds = terrain.height_bounds();
        let segments: Vec<_> = terrain.segments().collect();
        assert_eq!(segments.len(), terrain.capacity());

        for pair in segments.windows(2) {
            assert!((pair[1].start_x - pair[0].start_x - width).abs() < 1e-2);
        }
        // Heights keep the bounds they were generated under until recycled
        if frame < 1500 {
            for seg in &segments {
                assert!(bounds.contains(seg.top_height) && bounds.contains(seg.bottom_height));
            }
        }

        // Window always covers the field
        let field = terrain.field();
        assert!(segments[0].start_x <= field.x);
        let last = segments[segments.len() - 1];
        assert!(last.start_x + width >= field.max().x);

        let quads = scene.build(&sim, None).len() / 6;
        assert_eq!(quads, 2 * segments.len() + 1);
    }

    assert!(sim.terrain().current_index() > 250);
}
