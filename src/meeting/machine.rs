//! Meeting session state machine.
//!
//! Drives the full pipeline: record → save audio → transcribe → summarize →
//! write note. Every stage is wrapped so a failure surfaces a distinct
//! status message and leaves the artifacts of earlier stages on disk.
//!
//! All dependencies are injected via the constructor; no concrete backend
//! types are hardcoded.

use anyhow::{bail, Result};
use std::path::PathBuf;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::audio::{CaptureOptions, MeetingRecorder, SourceFlags};
use crate::note::{self, NoteContext, NotePolicy, NoteStore};
use crate::summarization::{SummarizationResult, Summarizer, SummaryRequest};
use crate::transcription::TranscriptionBackend;

use super::status::{MeetingPhase, MeetingStatusHandle};

#[derive(Debug, Clone)]
pub struct MachineOptions {
    pub capture: CaptureOptions,
    pub note: NotePolicy,
}

/// Result returned from starting a session.
#[derive(Debug, Clone)]
pub struct MeetingStartResult {
    pub session_id: Uuid,
    pub sources: SourceFlags,
}

/// Immutable snapshot of a completed session.
#[derive(Debug, Clone)]
pub struct MeetingOutcome {
    pub session_id: Uuid,
    pub note_path: PathBuf,
    pub audio_path: PathBuf,
    pub transcript_path: PathBuf,
    pub summary: SummarizationResult,
    pub duration_ms: i64,
}

/// Outcome of a toggle operation.
pub enum ToggleOutcome {
    Started(MeetingStartResult),
    Stopped(Box<MeetingOutcome>),
}

pub struct MeetingMachine {
    recorder: MeetingRecorder,
    transcription: Box<dyn TranscriptionBackend>,
    summarizer: Summarizer,
    store: NoteStore,
    options: MachineOptions,
    status: MeetingStatusHandle,
}

impl MeetingMachine {
    pub fn new(
        recorder: MeetingRecorder,
        transcription: Box<dyn TranscriptionBackend>,
        summarizer: Summarizer,
        store: NoteStore,
        options: MachineOptions,
        status: MeetingStatusHandle,
    ) -> Self {
        Self {
            recorder,
            transcription,
            summarizer,
            store,
            options,
            status,
        }
    }

    pub fn status(&self) -> MeetingStatusHandle {
        self.status.clone()
    }

    /// Start a recording session. Only one session may be recording or
    /// processing at a time; a second start fails without touching the
    /// active session.
    pub async fn start(&mut self) -> Result<MeetingStartResult> {
        let state = self.status.get().await;
        if state.phase.is_busy() {
            bail!(
                "A recording session is already active (phase: {}). Stop it first.",
                state.phase.as_str()
            );
        }

        let sources = self.recorder.start(self.options.capture)?;
        let session_id = Uuid::new_v4();

        self.status
            .start_recording(
                session_id,
                chrono::Utc::now(),
                format!("Recording started ({})", note::describe_sources(&sources)),
            )
            .await;

        info!("Session {} recording started", session_id);

        Ok(MeetingStartResult {
            session_id,
            sources,
        })
    }

    /// Stop the session and run the processing pipeline to completion.
    ///
    /// Capture resources are released unconditionally. A failure in a later
    /// stage aborts the remaining stages but leaves every artifact already
    /// persisted (audio, transcript) in place.
    pub async fn stop(&mut self) -> Result<MeetingOutcome> {
        let state = self.status.get().await;
        if state.phase != MeetingPhase::Recording {
            bail!(
                "No active recording session to stop (current phase: {})",
                state.phase.as_str()
            );
        }
        let session_id = state.session_id.unwrap_or_else(Uuid::new_v4);

        self.status
            .transition(MeetingPhase::Stopping, "Finalizing audio capture")
            .await;
        let recording = match self.recorder.stop() {
            Ok(recording) => recording,
            Err(e) => {
                self.recorder.release();
                return Err(self.fail("Stopping the recording failed", e).await);
            }
        };

        self.status
            .transition(MeetingPhase::SavingAudio, "Saving audio recording")
            .await;
        let base_name = format!(
            "meeting-{}",
            recording.started_at.format("%Y%m%d-%H%M%S")
        );
        let audio_path = match self
            .store
            .write_audio(&base_name, "wav", &recording.audio)
            .await
        {
            Ok(path) => path,
            Err(e) => return Err(self.fail("Saving the audio recording failed", e).await),
        };
        self.status.set_audio_path(audio_path.clone()).await;

        // Collision handling may have renamed the audio file; every later
        // artifact is named after what actually landed on disk.
        let artifact_base = audio_path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or(base_name);

        self.status
            .transition(MeetingPhase::Transcribing, "Transcribing audio")
            .await;
        let transcription = match self.transcription.transcribe(&audio_path).await {
            Ok(result) => result,
            Err(e) => {
                return Err(self
                    .fail("Transcription failed (the audio recording was kept)", e)
                    .await);
            }
        };
        let transcript_path = match transcription.transcript_path.clone() {
            Some(path) => path,
            None => match self
                .store
                .write_transcript(&artifact_base, "txt", &transcription.text)
                .await
            {
                Ok(path) => path,
                Err(e) => {
                    return Err(self
                        .fail("Saving the transcript failed (the audio recording was kept)", e)
                        .await);
                }
            },
        };
        self.status.set_transcript_path(transcript_path.clone()).await;

        self.status
            .transition(MeetingPhase::Summarizing, "Summarizing transcript")
            .await;
        let summary = self
            .summarizer
            .summarize(&SummaryRequest {
                transcript: &transcription.text,
                transcript_path: Some(&transcript_path),
                base_name: &artifact_base,
            })
            .await;
        if summary.used_fallback {
            warn!(
                "Summary for session {} used the heuristic fallback: {}",
                session_id,
                summary.error_message.as_deref().unwrap_or("unknown reason")
            );
        }

        self.status
            .transition(MeetingPhase::WritingNote, "Writing meeting note")
            .await;
        let context = NoteContext {
            title: note::default_title(recording.started_at),
            created_at: recording.started_at,
            duration_ms: recording.duration_ms(),
            sources: recording.sources,
            audio_path: Some(audio_path.clone()),
            transcript_path: Some(transcript_path.clone()),
            summary: summary.summary.clone(),
            action_items: summary.action_items.clone(),
            summary_used_fallback: summary.used_fallback,
            summary_error: summary.error_message.clone(),
            transcript: transcription.text.clone(),
        };
        let body = note::build_note_content(&context, &self.options.note);
        let note_path = match self.store.write_note(&artifact_base, &body).await {
            Ok(path) => path,
            Err(e) => {
                return Err(self
                    .fail(
                        "Writing the meeting note failed (audio and transcript were kept)",
                        e,
                    )
                    .await);
            }
        };

        self.status
            .complete(
                note_path.clone(),
                format!("Meeting note created: {}", note_path.display()),
            )
            .await;

        info!("Session {} completed: {:?}", session_id, note_path);

        Ok(MeetingOutcome {
            session_id,
            note_path,
            audio_path,
            transcript_path,
            summary,
            duration_ms: recording.duration_ms(),
        })
    }

    /// Discard the active session without running any processing.
    pub async fn cancel(&mut self) -> Result<()> {
        let state = self.status.get().await;
        if state.phase != MeetingPhase::Recording {
            bail!(
                "No active recording session to cancel (current phase: {})",
                state.phase.as_str()
            );
        }

        self.recorder.release();
        self.status.reset("Recording cancelled, nothing was saved").await;

        info!("Session cancelled");
        Ok(())
    }

    /// Start when idle, stop when recording.
    pub async fn toggle(&mut self) -> Result<ToggleOutcome> {
        let state = self.status.get().await;
        match state.phase {
            MeetingPhase::Recording => Ok(ToggleOutcome::Stopped(Box::new(self.stop().await?))),
            phase if phase.is_busy() => {
                bail!("Cannot toggle while {}, please wait", phase.as_str())
            }
            _ => Ok(ToggleOutcome::Started(self.start().await?)),
        }
    }

    async fn fail(&mut self, message: &str, err: anyhow::Error) -> anyhow::Error {
        error!("{}: {:#}", message, err);
        self.status.set_error(format!("{}: {}", message, err)).await;
        err.context(message.to_string())
    }
}
