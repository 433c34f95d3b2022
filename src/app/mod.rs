//! Service wiring: configuration → capture sources → backends → machine →
//! control API.

use anyhow::{Context, Result};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

use crate::api::{ApiCommand, ApiServer};
use crate::audio::{CaptureOptions, MeetingRecorder, MicSource, SystemSource};
use crate::config::Config;
use crate::meeting::{MachineOptions, MeetingMachine, MeetingStatusHandle, ToggleOutcome};
use crate::note::{NotePolicy, NoteStore};
use crate::summarization::Summarizer;
use crate::transcription;

pub async fn run_service() -> Result<()> {
    info!("Starting meetnote service");

    let config = Config::load()?;
    let mut machine = build_machine(&config).context("Failed to initialize the pipeline")?;
    let status = machine.status();

    // Surface every stage transition in the service log.
    status.subscribe(Arc::new(|phase, message| {
        info!("[{}] {}", phase.as_str(), message);
    }));

    let (tx, mut rx) = mpsc::channel::<ApiCommand>(10);
    let api_server = ApiServer::new(tx, status.clone(), config.api.listen_addr.clone());
    tokio::spawn(async move {
        if let Err(e) = api_server.start().await {
            error!("API server failed: {}", e);
        }
    });

    info!("meetnote is ready");
    info!(
        "Try: curl -X POST http://{}/meetings/toggle",
        config.api.listen_addr
    );

    // The machine owns non-Send capture streams, so it stays on this task
    // and commands come in over the channel.
    let open_after_creation = config.note.open_note_after_creation;
    while let Some(command) = rx.recv().await {
        let result = match command {
            ApiCommand::Start => machine.start().await.map(|_| None),
            ApiCommand::Stop => machine.stop().await.map(|outcome| Some(outcome.note_path)),
            ApiCommand::Cancel => machine.cancel().await.map(|_| None),
            ApiCommand::Toggle => machine.toggle().await.map(|outcome| match outcome {
                ToggleOutcome::Started(_) => None,
                ToggleOutcome::Stopped(outcome) => Some(outcome.note_path),
            }),
        };
        match result {
            Ok(Some(note_path)) if open_after_creation => open_note(&note_path),
            Ok(_) => {}
            Err(e) => error!("Session command failed: {:#}", e),
        }
    }

    Ok(())
}

/// Best-effort: hand the finished note to the desktop's default opener.
fn open_note(path: &std::path::Path) {
    let Ok(opener) = which::which("xdg-open") else {
        info!("xdg-open not available, note left at {:?}", path);
        return;
    };
    match std::process::Command::new(opener).arg(path).spawn() {
        Ok(_) => info!("Opened note {:?}", path),
        Err(e) => warn!("Failed to open note {:?}: {}", path, e),
    }
}

fn build_machine(config: &Config) -> Result<MeetingMachine> {
    let sample_rate = config.capture.sample_rate;
    let recorder = MeetingRecorder::new(
        Box::new(MicSource::new(sample_rate)?),
        Box::new(SystemSource::new(sample_rate)),
        sample_rate,
    );

    let transcripts_dir = config.storage.transcripts_path()?;
    let transcription_backend = transcription::build_backend(
        &config.transcription,
        &config.command,
        transcripts_dir.clone(),
    )?;
    let summarizer =
        Summarizer::from_config(&config.summarization, &config.command, transcripts_dir.clone())?;

    let store = NoteStore::new(
        config.storage.recordings_path()?,
        transcripts_dir,
        config.storage.notes_path()?,
    );

    Ok(MeetingMachine::new(
        recorder,
        transcription_backend,
        summarizer,
        store,
        MachineOptions {
            capture: CaptureOptions {
                use_microphone: config.capture.use_microphone,
                capture_system_audio: config.capture.capture_system_audio,
            },
            note: NotePolicy {
                include_transcript: config.note.include_transcript,
                embed_audio: config.note.embed_audio,
                summary_heading: config.note.summary_heading.clone(),
                action_items_heading: config.note.action_items_heading.clone(),
                transcript_heading: config.note.transcript_heading.clone(),
            },
        },
        MeetingStatusHandle::default(),
    ))
}
