//! HTTP backend tests against a local mock server.

use meetnote::config::{SummarizationConfig, TranscriptionConfig};
use meetnote::summarization::{HttpSummarizer, Summarizer, SummaryRequest};
use meetnote::transcription::{HttpTranscriber, TranscriptionBackend};
use serde_json::json;
use wiremock::matchers::{header_exists, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn transcription_config(endpoint: String) -> TranscriptionConfig {
    TranscriptionConfig {
        backend: "http".to_string(),
        endpoint: Some(endpoint),
        model: Some("base".to_string()),
        timeout_seconds: 5,
        ..Default::default()
    }
}

fn summarization_config(endpoint: String) -> SummarizationConfig {
    SummarizationConfig {
        backend: "http".to_string(),
        endpoint: Some(endpoint),
        timeout_seconds: 5,
        ..Default::default()
    }
}

async fn temp_audio() -> (tempfile::TempDir, std::path::PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("meeting.wav");
    tokio::fs::write(&path, b"RIFF fake wav bytes").await.unwrap();
    (dir, path)
}

#[tokio::test]
async fn transcriber_extracts_text_field() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/transcribe"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"text": " Hello world. "})),
        )
        .mount(&server)
        .await;

    let backend =
        HttpTranscriber::new(&transcription_config(format!("{}/transcribe", server.uri())))
            .unwrap();
    let (_dir, audio) = temp_audio().await;

    let result = backend.transcribe(&audio).await.unwrap();
    assert_eq!(result.text, "Hello world.");
    assert!(result.transcript_path.is_none());
    assert!(result.raw_output.contains("Hello world."));
}

#[tokio::test]
async fn transcriber_falls_through_candidate_fields() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"status": "ok", "transcript": "from transcript field"})),
        )
        .mount(&server)
        .await;

    let backend = HttpTranscriber::new(&transcription_config(server.uri())).unwrap();
    let (_dir, audio) = temp_audio().await;

    let result = backend.transcribe(&audio).await.unwrap();
    assert_eq!(result.text, "from transcript field");
}

#[tokio::test]
async fn transcriber_sends_authorization_header() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(header_exists("authorization"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"text": "authorized"})))
        .mount(&server)
        .await;

    let mut config = transcription_config(server.uri());
    config.auth_token = Some("Bearer secret".to_string());
    let backend = HttpTranscriber::new(&config).unwrap();
    let (_dir, audio) = temp_audio().await;

    assert_eq!(backend.transcribe(&audio).await.unwrap().text, "authorized");
}

#[tokio::test]
async fn transcriber_rejects_non_2xx() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500).set_body_string("backend exploded"))
        .mount(&server)
        .await;

    let backend = HttpTranscriber::new(&transcription_config(server.uri())).unwrap();
    let (_dir, audio) = temp_audio().await;

    let err = backend.transcribe(&audio).await.unwrap_err();
    let message = format!("{:#}", err);
    assert!(message.contains("500"));
    assert!(message.contains("backend exploded"));
}

#[tokio::test]
async fn transcriber_rejects_unparseable_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json at all"))
        .mount(&server)
        .await;

    let backend = HttpTranscriber::new(&transcription_config(server.uri())).unwrap();
    let (_dir, audio) = temp_audio().await;

    assert!(backend.transcribe(&audio).await.is_err());
}

#[tokio::test]
async fn transcriber_rejects_empty_candidates() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"text": "   "})))
        .mount(&server)
        .await;

    let backend = HttpTranscriber::new(&transcription_config(server.uri())).unwrap();
    let (_dir, audio) = temp_audio().await;

    let err = backend.transcribe(&audio).await.unwrap_err();
    assert!(format!("{:#}", err).contains("did not return a transcript"));
}

#[tokio::test]
async fn transcriber_times_out_on_slow_backend() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"text": "too late"}))
                .set_delay(std::time::Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let mut config = transcription_config(server.uri());
    config.timeout_seconds = 1;
    let backend = HttpTranscriber::new(&config).unwrap();
    let (_dir, audio) = temp_audio().await;

    assert!(backend.transcribe(&audio).await.is_err());
}

#[tokio::test]
async fn summarizer_parses_summary_and_action_items() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "summary": "Team aligned on the launch.",
            "actionItems": ["Write release notes", "Ping legal"],
        })))
        .mount(&server)
        .await;

    let summarizer = Summarizer::new(Some(Box::new(
        HttpSummarizer::new(&summarization_config(server.uri())).unwrap(),
    )));

    let result = summarizer
        .summarize(&SummaryRequest {
            transcript: "long transcript",
            transcript_path: None,
            base_name: "meeting",
        })
        .await;

    assert!(!result.used_fallback);
    assert_eq!(result.summary, "Team aligned on the launch.");
    assert_eq!(
        result.action_items,
        vec!["Write release notes", "Ping legal"]
    );
}

#[tokio::test]
async fn summarizer_takes_response_alias_verbatim() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "response": "A concise model answer.",
        })))
        .mount(&server)
        .await;

    let summarizer = Summarizer::new(Some(Box::new(
        HttpSummarizer::new(&summarization_config(server.uri())).unwrap(),
    )));

    let result = summarizer
        .summarize(&SummaryRequest {
            transcript: "ignored",
            transcript_path: None,
            base_name: "meeting",
        })
        .await;

    assert!(!result.used_fallback);
    assert_eq!(result.summary, "A concise model answer.");
}

#[tokio::test]
async fn summarizer_falls_back_on_http_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
        .mount(&server)
        .await;

    let summarizer = Summarizer::new(Some(Box::new(
        HttpSummarizer::new(&summarization_config(server.uri())).unwrap(),
    )));

    let result = summarizer
        .summarize(&SummaryRequest {
            transcript: "First point. Second point. Third point. Fourth point.",
            transcript_path: None,
            base_name: "meeting",
        })
        .await;

    assert!(result.used_fallback);
    assert_eq!(
        result.summary,
        "First point. Second point. Third point."
    );
    let reason = result.error_message.unwrap();
    assert!(reason.contains("503"));
}

#[tokio::test]
async fn summarizer_falls_back_on_non_json_response() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string("plain text answer"))
        .mount(&server)
        .await;

    let summarizer = Summarizer::new(Some(Box::new(
        HttpSummarizer::new(&summarization_config(server.uri())).unwrap(),
    )));

    let result = summarizer
        .summarize(&SummaryRequest {
            transcript: "Some transcript.",
            transcript_path: None,
            base_name: "meeting",
        })
        .await;

    assert!(result.used_fallback);
    assert!(result.error_message.unwrap().contains("non-JSON"));
}

#[tokio::test]
async fn summarizer_falls_back_on_timeout() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"summary": "late"}))
                .set_delay(std::time::Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let mut config = summarization_config(server.uri());
    config.timeout_seconds = 1;
    let summarizer = Summarizer::new(Some(Box::new(HttpSummarizer::new(&config).unwrap())));

    let result = summarizer
        .summarize(&SummaryRequest {
            transcript: "Still useful content.",
            transcript_path: None,
            base_name: "meeting",
        })
        .await;

    assert!(result.used_fallback);
    assert_eq!(result.summary, "Still useful content.");
}

#[tokio::test]
async fn summarizer_falls_back_when_no_summary_field() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "ok"})))
        .mount(&server)
        .await;

    let summarizer = Summarizer::new(Some(Box::new(
        HttpSummarizer::new(&summarization_config(server.uri())).unwrap(),
    )));

    let result = summarizer
        .summarize(&SummaryRequest {
            transcript: "The only sentence.",
            transcript_path: None,
            base_name: "meeting",
        })
        .await;

    assert!(result.used_fallback);
    assert!(result
        .error_message
        .unwrap()
        .contains("empty summary"));
}
