//! Parameter definitions with physical units and documented semantics.
//!
//! All tunables live here with:
//! - Units (pixels, seconds, Hz, segments)
//! - Documented ranges and meanings
//! - Validation before a session starts

mod audio;
mod physics;
mod render;
mod settings;
mod terrain;

// Re-export all types
pub use audio::{audio_constants, AnalysisConfig};
pub use physics::{BodyParams, SignalConfig};
pub use render::{RecordingConfig, RenderConfig};
pub use settings::Settings;
pub use terrain::{HeightProfile, TerrainParams, FIELD_ASPECT, SEGMENTS_PER_VIEWPORT};
