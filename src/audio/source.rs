//! Capture-source abstraction over the platform audio stack.
//!
//! The recorder and the session machine only ever see this trait, so the
//! whole pipeline can be exercised with fake sources in tests.

use anyhow::Result;

/// A single capture input (microphone, system-audio monitor, ...).
///
/// Sources capture independently and hand back their samples when stopped.
/// Sample rates may differ between sources; the mixer resamples.
pub trait CaptureSource {
    /// Begin capturing audio.
    fn start(&mut self) -> Result<()>;

    /// Stop capturing and return everything captured since `start`.
    fn stop(&mut self) -> Result<Vec<f32>>;

    /// Whether this source is currently capturing.
    fn is_active(&self) -> bool;

    /// Sample rate of the returned samples.
    fn sample_rate(&self) -> u32;
}
