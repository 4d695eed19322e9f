//! Lottie View - browser editor for Lottie animations
//!
//! Serves a single-page editor and a JSON API over one session thread that
//! owns every loaded document (see `actor`).
//!
//! ## API
//! - `POST /api/load/url`, `POST /api/load/upload`
//! - `GET /api/session/:id`, `DELETE /api/session/:id`
//! - `POST /api/session/:id/edit`, `POST /api/session/:id/reset`
//! - `GET /api/session/:id/frame`, `GET /api/session/:id/download`
//! - `POST /api/session/:id/gif`
//! - `GET /api/health`

mod actor;
mod config;
mod routes;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::Serialize;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::ViewConfig;

#[derive(Clone, Debug, Serialize)]
pub struct ApiError {
    #[serde(skip)]
    pub status: StatusCode,
    pub error: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            error: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn internal<E: std::fmt::Display>(err: E) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self)).into_response()
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("lottie_view=info,tower_http=info")),
        )
        .init();

    let config = ViewConfig::from_env();
    let tx = actor::spawn(config.max_sessions);
    let app = routes::router(routes::AppState::new(tx, &config), &config);

    info!("Starting Lottie View server on http://{}", config.addr);
    info!("Default animation: {}", config.default_url);

    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
