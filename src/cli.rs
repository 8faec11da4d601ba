//! Command-line argument parsing.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::audio::AudioSource;
use crate::error::{Error, Result};
use crate::params::{HeightProfile, RecordingConfig, RenderConfig, Settings};

/// Where to take control audio from
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum AudioSourceArg {
    /// Default microphone
    Mic,
    /// Built-in synthesized melody
    Demo,
    /// WAV file given with --wav
    Wav,
}

/// Command line arguments
#[derive(Parser, Debug)]
#[command(name = "pitchflight")]
#[command(about = "Steer through a scrolling cave with the pitch of your voice", long_about = None)]
pub struct Args {
    /// Settings file (missing file = defaults; press R to reload)
    #[arg(long, value_name = "PATH", default_value = "pitchflight.toml")]
    pub config: PathBuf,

    /// Control audio source
    #[arg(long, value_enum, default_value_t = AudioSourceArg::Mic)]
    pub source: AudioSourceArg,

    /// WAV file for --source wav
    #[arg(long, value_name = "PATH")]
    pub wav: Option<PathBuf>,

    /// Overlay the voice-band spectrum and pitch trace
    #[arg(long)]
    pub diagnostics: bool,

    /// Record frames to PNG (duration in seconds)
    #[arg(long, value_name = "SECONDS")]
    pub record: Option<f32>,

    /// Seed the terrain generator for a repeatable course
    #[arg(long, value_name = "N")]
    pub seed: Option<u64>,
}

impl Args {
    /// Resolve the audio source; `wav` needs a path
    pub fn audio_source(&self) -> Result<AudioSource> {
        match self.source {
            AudioSourceArg::Mic => Ok(AudioSource::Microphone),
            AudioSourceArg::Demo => Ok(AudioSource::Demo),
            AudioSourceArg::Wav => self
                .wav
                .clone()
                .map(AudioSource::WavFile)
                .ok_or_else(|| Error::invalid("wav", "--source wav requires --wav PATH")),
        }
    }

    /// Apply command-line overrides on top of loaded settings
    pub fn apply_overrides(&self, settings: &mut Settings) {
        if let Some(seed) = self.seed {
            settings.terrain.height_profile = match settings.terrain.height_profile {
                HeightProfile::Uniform { .. } => HeightProfile::Uniform { seed: Some(seed) },
                HeightProfile::Smooth { frequency, .. } => HeightProfile::Smooth {
                    seed: seed as u32,
                    frequency,
                },
            };
        }
    }

    pub fn render_config(&self) -> RenderConfig {
        RenderConfig {
            diagnostics: self.diagnostics,
            ..RenderConfig::default()
        }
    }

    /// Create recording configuration if recording mode is enabled
    pub fn recording_config(&self) -> Result<Option<RecordingConfig>> {
        let Some(duration) = self.record else {
            return Ok(None);
        };
        if !(duration.is_finite() && duration > 0.0) {
            return Err(Error::invalid("record", "duration must be positive"));
        }

        let config = RecordingConfig::new(duration);
        let frames_dir = config.frames_dir();
        std::fs::create_dir_all(&frames_dir).map_err(|e| {
            Error::invalid("record", format!("cannot create {}: {}", frames_dir, e))
        })?;
        Ok(Some(config))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Args {
        Args::try_parse_from(std::iter::once("pitchflight").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_defaults() {
        let args = parse(&[]);
        assert_eq!(args.config, PathBuf::from("pitchflight.toml"));
        assert_eq!(args.audio_source().unwrap(), AudioSource::Microphone);
        assert!(!args.render_config().diagnostics);
        assert!(args.recording_config().unwrap().is_none());
    }

    #[test]
    fn test_wav_source_needs_path() {
        let args = parse(&["--source", "wav"]);
        assert!(matches!(
            args.audio_source(),
            Err(Error::InvalidParameter { name: "wav", .. })
        ));

        let args = parse(&["--source", "wav", "--wav", "voice.wav"]);
        assert_eq!(
            args.audio_source().unwrap(),
            AudioSource::WavFile(PathBuf::from("voice.wav"))
        );
    }

    #[test]
    fn test_seed_override_keeps_profile_kind() {
        let args = parse(&["--seed", "42", "--diagnostics"]);
        let mut settings = Settings::default();
        args.apply_overrides(&mut settings);
        assert_eq!(
            settings.terrain.height_profile,
            HeightProfile::Uniform { seed: Some(42) }
        );
        assert!(args.render_config().diagnostics);

        settings.terrain.height_profile = HeightProfile::Smooth {
            seed: 1,
            frequency: 0.2,
        };
        args.apply_overrides(&mut settings);
        assert_eq!(
            settings.terrain.height_profile,
            HeightProfile::Smooth {
                seed: 42,
                frequency: 0.2
            }
        );
    }

    #[test]
    fn test_bad_record_duration() {
        let args = parse(&["--record=-1"]);
        assert!(args.recording_config().is_err());
    }
}
