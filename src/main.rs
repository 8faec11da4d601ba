//! Pitchflight - steer a ball through a scrolling cave with your voice
//!
//! Sing higher to climb, lower to dive. The pitch range adapts to whoever
//! is playing, so any voice covers the whole cave.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use anyhow::Context;
use clap::Parser;
use winit::{
    application::ApplicationHandler,
    event::*,
    event_loop::{ActiveEventLoop, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowId},
};

use pitchflight::audio::{AudioSource, AudioSystem, ControlQueue};
use pitchflight::cli::Args;
use pitchflight::params::{RecordingConfig, RenderConfig, Settings};
use pitchflight::rendering::RenderSystem;
use pitchflight::scene::SceneBuilder;
use pitchflight::simulation::Simulation;
use pitchflight::terrain::Rect;

/// Main application state
struct App {
    // Window and rendering
    window: Option<Arc<Window>>,
    render_system: Option<RenderSystem>,
    scene: SceneBuilder,

    // Simulation systems
    simulation: Simulation,
    queue: ControlQueue,
    audio: Option<AudioSystem>,
    audio_source: AudioSource,

    // Configuration
    settings: Settings,
    settings_path: PathBuf,
    render_config: RenderConfig,
    recording_config: Option<RecordingConfig>,

    // Time tracking
    last_frame: Option<Instant>,
    frame_count: usize,

    /// First fatal error seen inside the event loop
    failure: Option<anyhow::Error>,
}

impl App {
    fn new(args: &Args) -> anyhow::Result<Self> {
        let mut settings = Settings::load(&args.config)
            .with_context(|| format!("loading settings from {}", args.config.display()))?;
        args.apply_overrides(&mut settings);
        settings.validate().context("command-line overrides")?;

        let audio_source = args.audio_source()?;
        let render_config = args.render_config();
        let recording_config = args.recording_config()?;

        let queue = ControlQueue::new(
            settings.analysis.history_len,
            settings.analysis.spectrum_len(),
        );
        let simulation = Simulation::new(&settings, queue.clone());
        // Band is retargeted once the audio device reports its rate
        let scene = SceneBuilder::new(render_config.max_quads, settings.analysis.voice_bins());

        Ok(Self {
            window: None,
            render_system: None,
            scene,
            simulation,
            queue,
            audio: None,
            audio_source,
            settings,
            settings_path: args.config.clone(),
            render_config,
            recording_config,
            last_frame: None,
            frame_count: 0,
            failure: None,
        })
    }

    fn init(&mut self, event_loop: &ActiveEventLoop) -> anyhow::Result<()> {
        let window_attributes = Window::default_attributes()
            .with_title("Pitchflight")
            .with_inner_size(winit::dpi::LogicalSize::new(
                self.render_config.window_width,
                self.render_config.window_height,
            ));
        let window = Arc::new(
            event_loop
                .create_window(window_attributes)
                .context("creating window")?,
        );

        let render_system = pollster::block_on(RenderSystem::new(
            Arc::clone(&window),
            &self.render_config,
            self.recording_config.clone(),
        ))?;

        let audio = AudioSystem::start(&self.audio_source, &self.settings.analysis, self.queue.clone())
            .with_context(|| format!("starting audio source {:?}", self.audio_source))?;
        // Spectra are published at the device rate
        self.scene.set_band(audio.analysis().voice_bins());

        log::info!("Pitchflight is running: sing to steer, R reloads settings, ESC quits");
        if let Some(config) = &self.recording_config {
            log::info!(
                "Recording {} frames to {}",
                config.total_frames(),
                config.frames_dir()
            );
        }

        self.window = Some(window);
        self.render_system = Some(render_system);
        self.audio = Some(audio);
        Ok(())
    }

    /// Re-read the settings file; the running signal mapping is replaced
    /// only if the new file is valid.
    fn reload_settings(&mut self) {
        match Settings::load(&self.settings_path) {
            Ok(settings) => {
                self.simulation.set_signal_config(settings.signal);
                log::info!("Reloaded signal settings: {:?}", settings.signal);
                self.settings.signal = settings.signal;
            }
            Err(e) => log::warn!("Settings reload failed, keeping previous: {}", e),
        }
    }

    fn frame_dt(&mut self) -> f32 {
        if let Some(config) = &self.recording_config {
            return 1.0 / config.fps as f32;
        }
        let now = Instant::now();
        let dt = self
            .last_frame
            .map(|last| now.duration_since(last).as_secs_f32())
            .unwrap_or(0.0);
        self.last_frame = Some(now);
        dt
    }

    /// Advance the simulation and draw a single frame
    fn render_frame(&mut self, event_loop: &ActiveEventLoop) {
        let Some(window) = self.window.as_ref() else {
            return;
        };
        let size = window.inner_size();
        let viewport = Rect::new(0.0, 0.0, size.width as f32, size.height as f32);

        let dt = self.frame_dt();
        self.simulation.tick(&viewport, dt);

        let diagnostics = self.render_config.diagnostics.then_some(&self.queue);
        let vertices = self.scene.build(&self.simulation, diagnostics);

        let Some(render_system) = self.render_system.as_mut() else {
            return;
        };
        render_system.update_vertices(vertices);

        match render_system.render(self.frame_count) {
            Ok(()) => {}
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                render_system.resize(size.width, size.height);
            }
            Err(wgpu::SurfaceError::OutOfMemory) => {
                self.failure = Some(anyhow::anyhow!("GPU out of memory"));
                event_loop.exit();
                return;
            }
            Err(e) => log::warn!("Render error: {:?}", e),
        }
        self.frame_count += 1;

        if let Some(config) = &self.recording_config {
            if self.frame_count >= config.total_frames() {
                log::info!("Recording complete ({} frames)", self.frame_count);
                event_loop.exit();
            }
        }
    }
}

impl ApplicationHandler for App {
    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }

    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return; // Already initialized
        }

        if let Err(e) = self.init(event_loop) {
            self.failure = Some(e);
            event_loop.exit();
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _window_id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        state: ElementState::Pressed,
                        physical_key: PhysicalKey::Code(code),
                        repeat: false,
                        ..
                    },
                ..
            } => match code {
                KeyCode::Escape => event_loop.exit(),
                KeyCode::KeyR => self.reload_settings(),
                _ => {}
            },
            WindowEvent::Resized(size) => {
                if let Some(render_system) = self.render_system.as_mut() {
                    render_system.resize(size.width, size.height);
                }
            }
            WindowEvent::RedrawRequested => self.render_frame(event_loop),
            _ => {}
        }
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let mut app = App::new(&args)?;

    let event_loop = EventLoop::new().context("creating event loop")?;
    event_loop.run_app(&mut app)?;

    match app.failure.take() {
        Some(e) => Err(e),
        None => Ok(()),
    }
}
