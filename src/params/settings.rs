//! Settings file loading (`pitchflight.toml`).
//!
//! Every section and key is optional; anything missing falls back to the
//! compile-time defaults, so a minimal file can override a single value:
//!
//! ```toml
//! [signal]
//! signal_amplitude = 4500.0
//! ```

use std::path::Path;

use serde::Deserialize;

use super::{AnalysisConfig, BodyParams, SignalConfig, TerrainParams};
use crate::error::{Error, Result};

/// Everything a session reads from the settings file
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub signal: SignalConfig,
    pub body: BodyParams,
    pub analysis: AnalysisConfig,
    pub terrain: TerrainParams,
}

impl Settings {
    /// Parse settings from TOML text and validate them
    pub fn from_toml(text: &str, origin: &Path) -> Result<Self> {
        let settings: Settings = toml::from_str(text).map_err(|source| Error::SettingsParse {
            path: origin.to_path_buf(),
            source,
        })?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load settings from `path`; a missing file yields the defaults
    pub fn load(path: &Path) -> Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(text) => Self::from_toml(&text, path),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::info!("no settings at {}, using defaults", path.display());
                Ok(Self::default())
            }
            Err(source) => Err(Error::SettingsRead {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    pub fn validate(&self) -> Result<()> {
        self.signal.validate()?;
        self.body.validate()?;
        self.analysis.validate()?;
        self.terrain.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::HeightProfile;

    #[test]
    fn test_partial_file_keeps_defaults() {
        let text = r#"
            [signal]
            signal_amplitude = 4500.0

            [terrain]
            speed_segments_per_s = 3.5
        "#;
        let settings = Settings::from_toml(text, Path::new("inline.toml")).unwrap();

        assert_eq!(settings.signal.signal_amplitude, 4500.0);
        assert_eq!(
            settings.signal.elastic_coefficient,
            SignalConfig::default().elastic_coefficient
        );
        assert_eq!(settings.terrain.speed_segments_per_s, 3.5);
        assert_eq!(settings.analysis.block_size, 1024);
        assert_eq!(settings.body.mass, 1.0);
    }

    #[test]
    fn test_height_profile_tagged() {
        let text = r#"
            [terrain.height_profile]
            kind = "smooth"
            seed = 7
            frequency = 0.3
        "#;
        let settings = Settings::from_toml(text, Path::new("inline.toml")).unwrap();
        assert_eq!(
            settings.terrain.height_profile,
            HeightProfile::Smooth {
                seed: 7,
                frequency: 0.3
            }
        );
    }

    #[test]
    fn test_invalid_values_rejected() {
        let text = "[body]\nmass = 0.0\n";
        let err = Settings::from_toml(text, Path::new("inline.toml")).unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidParameter {
                name: "body.mass",
                ..
            }
        ));

        let garbage = "[signal\nsignal_amplitude = ";
        assert!(matches!(
            Settings::from_toml(garbage, Path::new("inline.toml")),
            Err(Error::SettingsParse { .. })
        ));
    }

    #[test]
    fn test_missing_file_is_default() {
        let settings = Settings::load(Path::new("/nonexistent/pitchflight.toml")).unwrap();
        assert_eq!(settings.signal, SignalConfig::default());
    }
}
