//! Samples elementary functions and plays them as a frequency-modulated tone.

pub mod analysis;
pub mod config;
pub mod console;
pub mod equation;
pub mod logging;
pub mod output;
pub mod sampler;
pub mod scheduler;
pub mod session;
pub mod tone;

pub use equation::EquationKind;
pub use sampler::{sample, Sample, Sequence};
pub use scheduler::{map_frequency, Playback, PlaybackState, Scheduler};
pub use session::Session;
