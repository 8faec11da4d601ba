//! Error type for the outer layers (settings, audio devices, rendering).
//!
//! The simulation core never returns errors: degenerate input is recovered
//! where it happens. Everything that touches files, devices or the GPU
//! reports through [`Error`].

use std::path::PathBuf;

/// Errors raised while setting up or reconfiguring a session.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Settings file exists but could not be read.
    #[error("failed to read settings from {path}: {source}")]
    SettingsRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Settings file is not valid TOML for [`crate::params::Settings`].
    #[error("failed to parse settings from {path}: {source}")]
    SettingsParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    /// A parameter is outside the range the simulation can work with.
    #[error("invalid parameter `{name}`: {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    /// No usable audio device was found.
    #[error("audio device unavailable: {0}")]
    NoDevice(&'static str),

    /// Device reports a sample format the pipeline does not accept.
    #[error("unsupported sample format {0:?} (only f32 streams are supported)")]
    UnsupportedFormat(cpal::SampleFormat),

    #[error("failed to query device config: {0}")]
    DeviceConfig(#[from] cpal::DefaultStreamConfigError),

    #[error("failed to build audio stream: {0}")]
    BuildStream(#[from] cpal::BuildStreamError),

    #[error("failed to start audio stream: {0}")]
    PlayStream(#[from] cpal::PlayStreamError),

    /// WAV input could not be opened or decoded.
    #[error("wav input: {0}")]
    Wav(#[from] hound::Error),

    /// Glicol rejected the demo composition.
    #[error("synth engine init failed: {0}")]
    Synth(String),

    /// GPU surface, adapter or device setup failed.
    #[error("renderer setup failed: {0}")]
    Renderer(String),
}

impl Error {
    pub(crate) fn invalid(name: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name,
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
