//! Session recorder: acquires capture sources, finalizes them into a single
//! WAV blob, and guarantees every exit path releases the capture resources.

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use tracing::{info, warn};

use super::mixer;
use super::source::CaptureSource;

#[derive(Debug, Clone, Copy)]
pub struct CaptureOptions {
    pub use_microphone: bool,
    pub capture_system_audio: bool,
}

/// Which sources actually contributed audio to the session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SourceFlags {
    pub microphone: bool,
    pub system: bool,
}

/// Finalized recording. The audio is an opaque blob as far as the rest of
/// the pipeline is concerned; only the capture layer knows it is WAV.
#[derive(Debug, Clone)]
pub struct RecordingResult {
    pub audio: Vec<u8>,
    pub mime_type: String,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
    pub sources: SourceFlags,
}

impl RecordingResult {
    pub fn duration_ms(&self) -> i64 {
        (self.ended_at - self.started_at).num_milliseconds().max(0)
    }
}

struct ActiveCapture {
    started_at: DateTime<Utc>,
    mic_active: bool,
    system_active: bool,
}

pub struct MeetingRecorder {
    mic: Box<dyn CaptureSource>,
    system: Box<dyn CaptureSource>,
    target_sample_rate: u32,
    session: Option<ActiveCapture>,
}

impl MeetingRecorder {
    pub fn new(
        mic: Box<dyn CaptureSource>,
        system: Box<dyn CaptureSource>,
        target_sample_rate: u32,
    ) -> Self {
        Self {
            mic,
            system,
            target_sample_rate,
            session: None,
        }
    }

    pub fn is_recording(&self) -> bool {
        self.session.is_some()
    }

    /// Begin capture. Each requested source is attempted independently; a
    /// source that fails to start downgrades the session with a warning.
    /// Only zero successfully started sources is an error.
    pub fn start(&mut self, options: CaptureOptions) -> Result<SourceFlags> {
        if self.session.is_some() {
            bail!("Recording is already in progress");
        }

        let mut mic_active = false;
        let mut system_active = false;

        if options.use_microphone {
            match self.mic.start() {
                Ok(()) => mic_active = true,
                Err(e) => warn!(
                    "Unable to access the microphone, continuing without it: {}",
                    e
                ),
            }
        }

        if options.capture_system_audio {
            match self.system.start() {
                Ok(()) => system_active = true,
                Err(e) => warn!(
                    "Unable to capture system audio, continuing without it: {}",
                    e
                ),
            }
        }

        if !mic_active && !system_active {
            bail!(
                "No audio sources are available. Enable at least one capture option in the settings."
            );
        }

        self.session = Some(ActiveCapture {
            started_at: Utc::now(),
            mic_active,
            system_active,
        });

        info!(
            "Recording started (microphone: {}, system audio: {})",
            mic_active, system_active
        );

        Ok(SourceFlags {
            microphone: mic_active,
            system: system_active,
        })
    }

    /// Finalize the capture into a single WAV blob. Capture resources are
    /// released unconditionally, whether or not encoding succeeds.
    pub fn stop(&mut self) -> Result<RecordingResult> {
        let Some(session) = self.session.take() else {
            bail!("Recording has not been started");
        };

        let mic_samples = if session.mic_active {
            self.mic.stop().unwrap_or_else(|e| {
                warn!("Failed to stop microphone source: {}", e);
                Vec::new()
            })
        } else {
            Vec::new()
        };
        let mic_rate = self.mic.sample_rate();

        let system_samples = if session.system_active {
            self.system.stop().unwrap_or_else(|e| {
                warn!("Failed to stop system audio source: {}", e);
                Vec::new()
            })
        } else {
            Vec::new()
        };
        let system_rate = self.system.sample_rate();

        let ended_at = Utc::now();

        if mic_samples.is_empty() && system_samples.is_empty() {
            bail!("No audio samples were captured during the session");
        }

        let mixed = mixer::mix(&[
            mixer::resample(&mic_samples, mic_rate, self.target_sample_rate),
            mixer::resample(&system_samples, system_rate, self.target_sample_rate),
        ]);

        let audio = encode_wav(&mixed, self.target_sample_rate)?;

        info!(
            "Recording stopped: {} mixed samples, {} bytes",
            mixed.len(),
            audio.len()
        );

        Ok(RecordingResult {
            audio,
            mime_type: "audio/wav".to_string(),
            started_at: session.started_at,
            ended_at,
            sources: SourceFlags {
                microphone: session.mic_active && !mic_samples.is_empty(),
                system: session.system_active && !system_samples.is_empty(),
            },
        })
    }

    /// Discard any in-flight capture. Safe to call on every exit path;
    /// releasing twice is a no-op.
    pub fn release(&mut self) {
        let Some(session) = self.session.take() else {
            return;
        };

        if session.mic_active {
            if let Err(e) = self.mic.stop() {
                warn!("Failed to release microphone source: {}", e);
            }
        }
        if session.system_active {
            if let Err(e) = self.system.stop() {
                warn!("Failed to release system audio source: {}", e);
            }
        }

        info!("Recording discarded");
    }
}

fn encode_wav(samples: &[f32], sample_rate: u32) -> Result<Vec<u8>> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 32,
        sample_format: hound::SampleFormat::Float,
    };

    let mut cursor = std::io::Cursor::new(Vec::new());
    {
        let mut writer =
            hound::WavWriter::new(&mut cursor, spec).context("Failed to create WAV writer")?;
        for &sample in samples {
            writer.write_sample(sample)?;
        }
        writer.finalize().context("Failed to finalize WAV data")?;
    }

    Ok(cursor.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    struct FakeSource {
        samples: Vec<f32>,
        rate: u32,
        fail_start: bool,
        active: bool,
        stops: Rc<Cell<u32>>,
    }

    impl FakeSource {
        fn new(samples: Vec<f32>, rate: u32) -> Self {
            Self {
                samples,
                rate,
                fail_start: false,
                active: false,
                stops: Rc::new(Cell::new(0)),
            }
        }

        fn failing() -> Self {
            let mut source = Self::new(Vec::new(), 16000);
            source.fail_start = true;
            source
        }
    }

    impl CaptureSource for FakeSource {
        fn start(&mut self) -> Result<()> {
            if self.fail_start {
                bail!("device unavailable");
            }
            self.active = true;
            Ok(())
        }

        fn stop(&mut self) -> Result<Vec<f32>> {
            if !self.active {
                bail!("not recording");
            }
            self.active = false;
            self.stops.set(self.stops.get() + 1);
            Ok(self.samples.clone())
        }

        fn is_active(&self) -> bool {
            self.active
        }

        fn sample_rate(&self) -> u32 {
            self.rate
        }
    }

    fn options(mic: bool, system: bool) -> CaptureOptions {
        CaptureOptions {
            use_microphone: mic,
            capture_system_audio: system,
        }
    }

    #[test]
    fn test_start_stop_produces_wav_blob() {
        let mut recorder = MeetingRecorder::new(
            Box::new(FakeSource::new(vec![0.1, 0.2, 0.3], 16000)),
            Box::new(FakeSource::new(vec![0.3, 0.2, 0.1], 16000)),
            16000,
        );

        let flags = recorder.start(options(true, true)).unwrap();
        assert!(flags.microphone);
        assert!(flags.system);

        let result = recorder.stop().unwrap();
        assert_eq!(result.mime_type, "audio/wav");
        assert_eq!(&result.audio[..4], b"RIFF");
        assert!(result.sources.microphone);
        assert!(result.sources.system);
        assert!(!recorder.is_recording());
    }

    #[test]
    fn test_start_while_active_fails_without_side_effects() {
        let mut recorder = MeetingRecorder::new(
            Box::new(FakeSource::new(vec![0.1], 16000)),
            Box::new(FakeSource::new(Vec::new(), 16000)),
            16000,
        );

        recorder.start(options(true, false)).unwrap();
        assert!(recorder.start(options(true, false)).is_err());
        assert!(recorder.is_recording());

        // The original session is still intact and stoppable.
        assert!(recorder.stop().is_ok());
    }

    #[test]
    fn test_stop_without_start_fails() {
        let mut recorder = MeetingRecorder::new(
            Box::new(FakeSource::new(vec![0.1], 16000)),
            Box::new(FakeSource::new(Vec::new(), 16000)),
            16000,
        );
        assert!(recorder.stop().is_err());
    }

    #[test]
    fn test_system_failure_downgrades_to_mic_only() {
        let mut recorder = MeetingRecorder::new(
            Box::new(FakeSource::new(vec![0.5, 0.5], 16000)),
            Box::new(FakeSource::failing()),
            16000,
        );

        let flags = recorder.start(options(true, true)).unwrap();
        assert!(flags.microphone);
        assert!(!flags.system);

        let result = recorder.stop().unwrap();
        assert!(result.sources.microphone);
        assert!(!result.sources.system);
    }

    #[test]
    fn test_all_sources_failing_is_an_error() {
        let mut recorder = MeetingRecorder::new(
            Box::new(FakeSource::failing()),
            Box::new(FakeSource::failing()),
            16000,
        );
        assert!(recorder.start(options(true, true)).is_err());
        assert!(!recorder.is_recording());
    }

    #[test]
    fn test_release_is_idempotent() {
        let mic = FakeSource::new(vec![0.1], 16000);
        let stops = mic.stops.clone();
        let mut recorder = MeetingRecorder::new(
            Box::new(mic),
            Box::new(FakeSource::new(Vec::new(), 16000)),
            16000,
        );

        recorder.start(options(true, false)).unwrap();
        recorder.release();
        recorder.release();
        assert_eq!(stops.get(), 1);
        assert!(!recorder.is_recording());
    }

    #[test]
    fn test_resamples_sources_with_different_rates() {
        let mut recorder = MeetingRecorder::new(
            Box::new(FakeSource::new(vec![0.1; 48], 48000)),
            Box::new(FakeSource::new(vec![0.1; 16], 16000)),
            16000,
        );

        recorder.start(options(true, true)).unwrap();
        let result = recorder.stop().unwrap();
        // 48 samples at 48kHz resample to ~16 at 16kHz, matching the system track.
        assert!(result.audio.len() > 44);
    }
}
