//! Pitch-to-control analysis and audio sources.
//!
//! The audio thread turns each block into a [`ControlSample`]:
//! amplitude gate → band-limited spectral gate → YIN pitch → adaptive
//! log-range centring → smoothing, then appends it to the [`ControlQueue`]
//! that the simulation thread drains once per tick.

mod frame;
mod pipeline;
mod pitch;
mod queue;
mod range;
mod smoother;
mod synthesis;
mod system;

// Re-export public types
pub use frame::{hann_window, SpectralFrame};
pub use pipeline::{AudioPipeline, BlockAssembler};
pub use pitch::PitchExtractor;
pub use queue::{ControlQueue, ControlSample};
pub use range::{AdaptiveRangeTracker, RangeState};
pub use smoother::ControlSignalSmoother;
pub use system::{read_wav_mono, AudioSource, AudioSystem};
