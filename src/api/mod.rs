//! Local control API.
//!
//! The session machine owns non-Send capture streams and lives on the main
//! task; handlers talk to it through a command channel and read results from
//! the shared status handle.

pub mod routes;

use anyhow::Result;
use axum::{response::Json, routing::get, Router};
use serde_json::{json, Value};
use tokio::sync::mpsc;
use tower::ServiceBuilder;
use tracing::info;

use crate::meeting::MeetingStatusHandle;

pub use routes::{ApiCommand, MeetingApiState};

pub struct ApiServer {
    listen_addr: String,
    state: MeetingApiState,
}

impl ApiServer {
    pub fn new(
        tx: mpsc::Sender<ApiCommand>,
        status: MeetingStatusHandle,
        listen_addr: String,
    ) -> Self {
        Self {
            listen_addr,
            state: MeetingApiState { tx, status },
        }
    }

    pub async fn start(self) -> Result<()> {
        let app = Router::new()
            .route("/", get(service_info))
            .merge(routes::router(self.state))
            .layer(ServiceBuilder::new());

        let listener = tokio::net::TcpListener::bind(&self.listen_addr).await?;

        info!("API server listening on http://{}", self.listen_addr);
        info!("Endpoints:");
        info!("  GET  /                 - Service info");
        info!("  POST /meetings/start   - Start a recording session");
        info!("  POST /meetings/stop    - Stop and process the session");
        info!("  POST /meetings/cancel  - Discard the session");
        info!("  POST /meetings/toggle  - Start or stop depending on state");
        info!("  GET  /meetings/status  - Session status");

        axum::serve(listener, app).await?;

        Ok(())
    }
}

async fn service_info() -> Json<Value> {
    Json(json!({
        "service": "meetnote",
        "version": env!("CARGO_PKG_VERSION"),
        "status": "running"
    }))
}
