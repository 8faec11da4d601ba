//! Pitchflight library - voice-steered cave flight

pub mod audio;
pub mod cli;
pub mod error;
pub mod params;
pub mod physics;
pub mod rendering;
pub mod scene;
pub mod simulation;
pub mod terrain;

pub use error::{Error, Result};
