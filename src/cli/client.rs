//! CLI client for a running meetnote service.
//!
//! Commands talk to the local HTTP API so they work from hotkey daemons and
//! shell scripts alike.

use anyhow::{bail, Context, Result};
use serde_json::Value;

use crate::cli::args::CliCommand;
use crate::config::Config;

pub async fn handle_session_command(command: &CliCommand, config: &Config) -> Result<()> {
    let base_url = format!("http://{}", config.api.listen_addr);
    match command {
        CliCommand::Start => start_session(&base_url).await,
        CliCommand::Stop => stop_session(&base_url).await,
        CliCommand::Cancel => cancel_session(&base_url).await,
        CliCommand::Toggle => toggle_session(&base_url).await,
        CliCommand::Status => show_status(&base_url).await,
        _ => bail!("Not a session command"),
    }
}

async fn start_session(base_url: &str) -> Result<()> {
    let json = post(base_url, "/meetings/start").await?;
    println!(
        "Recording started{}",
        json.get("session_id")
            .and_then(|v| v.as_str())
            .map(|id| format!(" (session {})", id))
            .unwrap_or_default()
    );
    Ok(())
}

async fn stop_session(base_url: &str) -> Result<()> {
    let json = post(base_url, "/meetings/stop").await?;
    println!(
        "{}",
        json.get("message")
            .and_then(|v| v.as_str())
            .unwrap_or("Recording stopped, processing")
    );
    Ok(())
}

async fn cancel_session(base_url: &str) -> Result<()> {
    post(base_url, "/meetings/cancel").await?;
    println!("Recording cancelled");
    Ok(())
}

async fn toggle_session(base_url: &str) -> Result<()> {
    let json = post(base_url, "/meetings/toggle").await?;
    println!(
        "{}",
        json.get("message")
            .and_then(|v| v.as_str())
            .unwrap_or("Toggled")
    );
    Ok(())
}

async fn show_status(base_url: &str) -> Result<()> {
    let client = reqwest::Client::new();
    let response = client
        .get(format!("{}/meetings/status", base_url))
        .send()
        .await
        .context("Failed to connect to the meetnote service. Is it running?")?;
    let json: Value = response.json().await?;

    println!(
        "Phase: {}",
        json.get("phase").and_then(|v| v.as_str()).unwrap_or("unknown")
    );
    if let Some(message) = json.get("message").and_then(|v| v.as_str()) {
        println!("Message: {}", message);
    }
    if let Some(seconds) = json.get("duration_seconds").and_then(|v| v.as_u64()) {
        println!("Duration: {}s", seconds);
    }
    for (label, key) in [
        ("Audio", "audio_path"),
        ("Transcript", "transcript_path"),
        ("Note", "note_path"),
    ] {
        if let Some(path) = json.get(key).and_then(|v| v.as_str()) {
            println!("{}: {}", label, path);
        }
    }
    if let Some(error) = json.get("last_error").and_then(|v| v.as_str()) {
        println!("Last error: {}", error);
    }
    Ok(())
}

async fn post(base_url: &str, path: &str) -> Result<Value> {
    let client = reqwest::Client::new();
    let response = client
        .post(format!("{}{}", base_url, path))
        .send()
        .await
        .context("Failed to connect to the meetnote service. Is it running?")?;

    let status = response.status();
    let json: Value = response
        .json()
        .await
        .context("Service returned an unreadable response")?;

    if !status.is_success() {
        bail!(
            "{}",
            json.get("message")
                .and_then(|m| m.as_str())
                .unwrap_or("Request failed")
        );
    }

    Ok(json)
}
