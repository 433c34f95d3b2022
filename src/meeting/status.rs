//! Session phases and the shared status handle.
//!
//! The handle is the observable surface of the state machine: API handlers
//! read it, and registered listeners get a callback with the phase and a
//! human-readable message on every transition.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Mutex;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MeetingPhase {
    Idle,
    Recording,
    Stopping,
    SavingAudio,
    Transcribing,
    Summarizing,
    WritingNote,
    Completed,
    Error,
}

impl MeetingPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Recording => "recording",
            Self::Stopping => "stopping",
            Self::SavingAudio => "saving_audio",
            Self::Transcribing => "transcribing",
            Self::Summarizing => "summarizing",
            Self::WritingNote => "writing_note",
            Self::Completed => "completed",
            Self::Error => "error",
        }
    }

    /// A session currently occupies the single active slot.
    pub fn is_busy(&self) -> bool {
        matches!(
            self,
            Self::Recording
                | Self::Stopping
                | Self::SavingAudio
                | Self::Transcribing
                | Self::Summarizing
                | Self::WritingNote
        )
    }
}

/// Current session state, readable by API handlers.
#[derive(Debug, Clone)]
pub struct MeetingState {
    pub phase: MeetingPhase,
    pub session_id: Option<uuid::Uuid>,
    pub started_at: Option<chrono::DateTime<chrono::Utc>>,
    pub message: Option<String>,
    pub audio_path: Option<PathBuf>,
    pub transcript_path: Option<PathBuf>,
    pub note_path: Option<PathBuf>,
    pub last_error: Option<String>,
}

impl Default for MeetingState {
    fn default() -> Self {
        Self {
            phase: MeetingPhase::Idle,
            session_id: None,
            started_at: None,
            message: None,
            audio_path: None,
            transcript_path: None,
            note_path: None,
            last_error: None,
        }
    }
}

impl MeetingState {
    /// Seconds since recording started.
    pub fn duration_seconds(&self) -> Option<u64> {
        self.started_at.map(|started| {
            let elapsed = chrono::Utc::now() - started;
            elapsed.num_seconds().max(0) as u64
        })
    }
}

pub type StatusListener = Arc<dyn Fn(MeetingPhase, &str) + Send + Sync>;

/// Thread-safe handle shared between the machine, API handlers, and status
/// listeners.
#[derive(Clone, Default)]
pub struct MeetingStatusHandle {
    inner: Arc<Mutex<MeetingState>>,
    listeners: Arc<std::sync::Mutex<Vec<StatusListener>>>,
}

impl MeetingStatusHandle {
    pub async fn get(&self) -> MeetingState {
        self.inner.lock().await.clone()
    }

    /// Register a callback invoked on every transition.
    pub fn subscribe(&self, listener: StatusListener) {
        self.listeners.lock().unwrap().push(listener);
    }

    fn notify(&self, phase: MeetingPhase, message: &str) {
        for listener in self.listeners.lock().unwrap().iter() {
            listener(phase, message);
        }
    }

    pub async fn start_recording(
        &self,
        session_id: uuid::Uuid,
        started_at: chrono::DateTime<chrono::Utc>,
        message: impl Into<String>,
    ) {
        let message = message.into();
        {
            let mut state = self.inner.lock().await;
            *state = MeetingState {
                phase: MeetingPhase::Recording,
                session_id: Some(session_id),
                started_at: Some(started_at),
                message: Some(message.clone()),
                ..Default::default()
            };
        }
        self.notify(MeetingPhase::Recording, &message);
    }

    pub async fn transition(&self, phase: MeetingPhase, message: impl Into<String>) {
        let message = message.into();
        {
            let mut state = self.inner.lock().await;
            state.phase = phase;
            state.message = Some(message.clone());
        }
        self.notify(phase, &message);
    }

    pub async fn set_audio_path(&self, path: PathBuf) {
        self.inner.lock().await.audio_path = Some(path);
    }

    pub async fn set_transcript_path(&self, path: PathBuf) {
        self.inner.lock().await.transcript_path = Some(path);
    }

    pub async fn set_error(&self, error: impl Into<String>) {
        let error = error.into();
        {
            let mut state = self.inner.lock().await;
            state.phase = MeetingPhase::Error;
            state.message = Some(error.clone());
            state.last_error = Some(error.clone());
        }
        self.notify(MeetingPhase::Error, &error);
    }

    pub async fn complete(&self, note_path: PathBuf, message: impl Into<String>) {
        let message = message.into();
        {
            let mut state = self.inner.lock().await;
            state.phase = MeetingPhase::Completed;
            state.message = Some(message.clone());
            state.note_path = Some(note_path);
        }
        self.notify(MeetingPhase::Completed, &message);
    }

    pub async fn reset(&self, message: impl Into<String>) {
        let message = message.into();
        {
            let mut state = self.inner.lock().await;
            *state = MeetingState {
                message: Some(message.clone()),
                ..Default::default()
            };
        }
        self.notify(MeetingPhase::Idle, &message);
    }
}
