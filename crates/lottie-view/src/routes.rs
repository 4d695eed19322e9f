use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, Path, Query, State},
    http::{header, HeaderValue, Method, StatusCode},
    response::{Html, IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use lottie_core::export::{GifRequest, JSON_FILE_NAME};
use lottie_core::loader::parse_document;
use lottie_core::playback::DEFAULT_HEIGHT;
use lottie_core::{CachedLoader, EditCommand, HttpFetcher, LoadError};
use lottie_data::Document;
use serde::Deserialize;
use tokio::sync::{mpsc, oneshot};
use tower_http::cors::CorsLayer;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;
use tracing::warn;

use crate::actor::{CreatedSession, Reply, SessionMessage};
use crate::config::ViewConfig;
use crate::ApiError;

#[derive(Clone)]
pub struct AppState {
    tx: mpsc::Sender<SessionMessage>,
    loader: Arc<CachedLoader<HttpFetcher>>,
    default_url: Arc<str>,
}

impl AppState {
    pub fn new(tx: mpsc::Sender<SessionMessage>, config: &ViewConfig) -> Self {
        Self {
            tx,
            loader: Arc::new(CachedLoader::new(HttpFetcher::new())),
            default_url: Arc::from(config.default_url.as_str()),
        }
    }
}

pub fn router(state: AppState, config: &ViewConfig) -> Router {
    let allow_origin = config
        .allow_origin
        .parse::<HeaderValue>()
        .unwrap_or_else(|_| HeaderValue::from_static("*"));

    Router::new()
        .route("/", get(index_handler))
        .route("/api/load/url", post(load_url_handler))
        .route("/api/load/upload", post(upload_handler))
        .route("/api/session/:id", get(view_handler).delete(close_handler))
        .route("/api/session/:id/edit", post(edit_handler))
        .route("/api/session/:id/reset", post(reset_handler))
        .route("/api/session/:id/frame", get(frame_handler))
        .route("/api/session/:id/download", get(download_handler))
        .route("/api/session/:id/gif", post(gif_handler))
        .route("/api/health", get(health_handler))
        .layer(DefaultBodyLimit::max(config.max_upload_bytes))
        .layer(RequestBodyLimitLayer::new(config.max_upload_bytes))
        .layer(
            CorsLayer::new()
                .allow_origin(allow_origin)
                .allow_methods([Method::GET, Method::POST, Method::DELETE])
                .allow_headers([header::CONTENT_TYPE]),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn load_error(err: LoadError) -> ApiError {
    let status = match &err {
        LoadError::Status { .. } | LoadError::Transport { .. } => StatusCode::BAD_GATEWAY,
        _ => StatusCode::BAD_REQUEST,
    };
    warn!("Load failed: {}", err);
    ApiError::new(status, err.to_string())
}

/// Sends a message built around a reply channel and waits for the answer.
async fn ask<T>(
    tx: &mpsc::Sender<SessionMessage>,
    message: impl FnOnce(Reply<T>) -> SessionMessage,
) -> Result<T, ApiError> {
    let (resp, rx) = oneshot::channel();
    tx.send(message(resp))
        .await
        .map_err(|_| ApiError::internal("Session channel closed"))?;
    rx.await
        .map_err(|_| ApiError::internal("Session channel closed"))?
}

async fn create_session(
    state: &AppState,
    document: Document,
    source: String,
) -> Result<CreatedSession, ApiError> {
    let (resp, rx) = oneshot::channel();
    state
        .tx
        .send(SessionMessage::Create {
            document,
            source,
            resp,
        })
        .await
        .map_err(|_| ApiError::internal("Session channel closed"))?;
    rx.await
        .map_err(|_| ApiError::internal("Session channel closed"))
}

// --- Handlers ---

async fn index_handler() -> Html<&'static str> {
    Html(include_str!("../static/index.html"))
}

#[derive(Deserialize)]
struct LoadUrlRequest {
    #[serde(default)]
    url: String,
}

async fn load_url_handler(
    State(state): State<AppState>,
    Json(params): Json<LoadUrlRequest>,
) -> Result<Json<CreatedSession>, ApiError> {
    let url = match params.url.trim() {
        "" => state.default_url.to_string(),
        url => url.to_string(),
    };
    let document = state.loader.load_url(&url).await.map_err(load_error)?;
    Ok(Json(create_session(&state, document, url).await?))
}

async fn upload_handler(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<CreatedSession>, ApiError> {
    if body.is_empty() {
        return Err(ApiError::bad_request("Upload is empty"));
    }
    let document = parse_document(&body).map_err(load_error)?;
    Ok(Json(create_session(&state, document, "upload".to_string()).await?))
}

#[derive(Deserialize)]
struct LayerParams {
    #[serde(default)]
    layer: usize,
}

async fn view_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(params): Query<LayerParams>,
) -> Response {
    match ask(&state.tx, |resp| SessionMessage::View {
        id,
        layer: params.layer,
        resp,
    })
    .await
    {
        Ok(view) => Json(view).into_response(),
        Err(err) => err.into_response(),
    }
}

async fn close_handler(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    match ask(&state.tx, |resp| SessionMessage::Close { id, resp }).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => err.into_response(),
    }
}

#[derive(Deserialize)]
struct EditRequest {
    #[serde(default)]
    layer: usize,
    commands: Vec<EditCommand>,
}

async fn edit_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(params): Json<EditRequest>,
) -> Response {
    match ask(&state.tx, |resp| SessionMessage::Edit {
        id,
        layer: params.layer,
        commands: params.commands,
        resp,
    })
    .await
    {
        Ok(response) => Json(response).into_response(),
        Err(err) => err.into_response(),
    }
}

async fn reset_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(params): Query<LayerParams>,
) -> Response {
    match ask(&state.tx, |resp| SessionMessage::Reset {
        id,
        layer: params.layer,
        resp,
    })
    .await
    {
        Ok(view) => Json(view).into_response(),
        Err(err) => err.into_response(),
    }
}

#[derive(Deserialize)]
struct FrameParams {
    frame: Option<f64>,
    height: Option<u32>,
}

async fn frame_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(params): Query<FrameParams>,
) -> Response {
    match ask(&state.tx, |resp| SessionMessage::RenderFrame {
        id,
        frame: params.frame,
        height: params.height.unwrap_or(DEFAULT_HEIGHT),
        resp,
    })
    .await
    {
        Ok(bytes) => (StatusCode::OK, [(header::CONTENT_TYPE, "image/png")], bytes).into_response(),
        Err(err) => err.into_response(),
    }
}

async fn download_handler(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    match ask(&state.tx, |resp| SessionMessage::Download { id, resp }).await {
        Ok(json) => (
            StatusCode::OK,
            [
                (header::CONTENT_TYPE, "application/json".to_string()),
                (
                    header::CONTENT_DISPOSITION,
                    format!("attachment; filename=\"{}\"", JSON_FILE_NAME),
                ),
            ],
            json,
        )
            .into_response(),
        Err(err) => err.into_response(),
    }
}

async fn gif_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<GifRequest>,
) -> Response {
    match ask(&state.tx, |resp| SessionMessage::Gif { id, request, resp }).await {
        Ok(export) => Json(export).into_response(),
        Err(err) => err.into_response(),
    }
}

async fn health_handler() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actor;
    use serde_json::{json, Value};
    use std::net::SocketAddr;

    const DOCUMENT: &str = r#"{
        "fr": 30, "ip": 0, "op": 60, "w": 40, "h": 40, "nm": "Square",
        "layers": [{
            "ty": 4, "nm": "Shape", "ip": 0, "op": 60,
            "ks": { "p": { "a": 0, "k": [20, 20, 0] }, "s": { "a": 0, "k": [100, 100, 100] } },
            "shapes": [
                { "ty": "rc", "s": { "k": [10, 10] }, "p": { "k": [0, 0] } },
                { "ty": "fl", "c": { "a": 0, "k": [1, 0, 0, 1] } }
            ]
        }]
    }"#;

    async fn serve(app: Router) -> SocketAddr {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        addr
    }

    async fn start(config: ViewConfig) -> String {
        let tx = actor::spawn(config.max_sessions);
        let app = router(AppState::new(tx, &config), &config);
        format!("http://{}", serve(app).await)
    }

    async fn upload(client: &reqwest::Client, base: &str) -> Value {
        let response = client
            .post(format!("{base}/api/load/upload"))
            .body(DOCUMENT)
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 200);
        response.json().await.unwrap()
    }

    #[tokio::test]
    async fn upload_edit_and_download() {
        let base = start(ViewConfig::default()).await;
        let client = reqwest::Client::new();
        let created = upload(&client, &base).await;
        let id = created["id"].as_str().unwrap().to_string();
        assert_eq!(created["view"]["summary"]["name"], "Square");

        let edited: Value = client
            .post(format!("{base}/api/session/{id}/edit"))
            .json(&json!({
                "layer": 0,
                "commands": [
                    { "op": "set_color", "layer": 0, "path": "Layer 0/1", "color": "#00FF00" },
                    { "op": "set_position", "layer": 0, "value": [5, 6] }
                ]
            }))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(edited["warnings"], json!([]));
        assert_eq!(edited["view"]["selected"]["colors"][0]["hex"], "#00ff00");

        let response = client
            .get(format!("{base}/api/session/{id}/download"))
            .send()
            .await
            .unwrap();
        assert_eq!(
            response.headers()[header::CONTENT_DISPOSITION.as_str()],
            "attachment; filename=\"edited_lottie_animation.json\""
        );
        let saved: Value = response.json().await.unwrap();
        assert_eq!(saved["layers"][0]["shapes"][1]["c"]["k"], json!([0.0, 1.0, 0, 1]));
        assert_eq!(saved["layers"][0]["ks"]["p"]["k"], json!([5.0, 6.0, 0]));

        let reset: Value = client
            .post(format!("{base}/api/session/{id}/reset"))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(reset["selected"]["colors"][0]["hex"], "#ff0000");
    }

    #[tokio::test]
    async fn out_of_range_layer_is_rejected() {
        let base = start(ViewConfig::default()).await;
        let client = reqwest::Client::new();
        let id = upload(&client, &base).await["id"].as_str().unwrap().to_string();

        let response = client
            .post(format!("{base}/api/session/{id}/edit"))
            .json(&json!({ "commands": [{ "op": "set_rotation", "layer": 4, "degrees": 10 }] }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 400);
        let body: Value = response.json().await.unwrap();
        assert!(body["error"].as_str().unwrap().contains("out of range"));
    }

    #[tokio::test]
    async fn preview_frame_and_gif() {
        let base = start(ViewConfig::default()).await;
        let client = reqwest::Client::new();
        let id = upload(&client, &base).await["id"].as_str().unwrap().to_string();

        let response = client
            .get(format!("{base}/api/session/{id}/frame?frame=10&height=40"))
            .send()
            .await
            .unwrap();
        assert_eq!(response.headers()[header::CONTENT_TYPE.as_str()], "image/png");
        assert!(response.bytes().await.unwrap().starts_with(b"\x89PNG"));

        let gif: Value = client
            .post(format!("{base}/api/session/{id}/gif"))
            .json(&json!({ "frames": 10, "playback": { "height": 16, "quality": "high" } }))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(gif["file_name"], "lottie_animation.gif");
        assert!(gif["data_uri"].as_str().unwrap().starts_with("data:image/gif;base64,"));
    }

    #[tokio::test]
    async fn unknown_session_is_not_found() {
        let base = start(ViewConfig::default()).await;
        let response = reqwest::get(format!("{base}/api/session/0123456789abcdef"))
            .await
            .unwrap();
        assert_eq!(response.status(), 404);
    }

    #[tokio::test]
    async fn closed_sessions_are_gone() {
        let base = start(ViewConfig::default()).await;
        let client = reqwest::Client::new();
        let id = upload(&client, &base).await["id"].as_str().unwrap().to_string();

        let response = client
            .delete(format!("{base}/api/session/{id}"))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 204);

        let response = client
            .get(format!("{base}/api/session/{id}"))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 404);

        let response = client
            .delete(format!("{base}/api/session/{id}"))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 404);
    }

    #[tokio::test]
    async fn oldest_session_is_dropped_at_the_limit() {
        let config = ViewConfig {
            max_sessions: 2,
            ..ViewConfig::default()
        };
        let base = start(config).await;
        let client = reqwest::Client::new();
        let mut ids = Vec::new();
        for _ in 0..3 {
            ids.push(upload(&client, &base).await["id"].as_str().unwrap().to_string());
        }

        let status = |id: String| {
            let client = client.clone();
            let url = format!("{base}/api/session/{id}");
            async move { client.get(url).send().await.unwrap().status() }
        };
        assert_eq!(status(ids[0].clone()).await, 404);
        assert_eq!(status(ids[1].clone()).await, 200);
        assert_eq!(status(ids[2].clone()).await, 200);
    }

    #[tokio::test]
    async fn invalid_upload_is_a_bad_request() {
        let base = start(ViewConfig::default()).await;
        let response = reqwest::Client::new()
            .post(format!("{base}/api/load/upload"))
            .body("[1, 2, 3]")
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 400);
    }

    #[tokio::test]
    async fn oversized_upload_is_refused() {
        let config = ViewConfig {
            max_upload_bytes: 64,
            ..ViewConfig::default()
        };
        let base = start(config).await;
        let response = reqwest::Client::new()
            .post(format!("{base}/api/load/upload"))
            .body(DOCUMENT)
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 413);
    }

    #[tokio::test]
    async fn url_loads_use_default_and_report_upstream_failures() {
        let upstream = serve(
            Router::new()
                .route("/square.json", get(|| async { DOCUMENT }))
                .route("/gone.json", get(|| async { StatusCode::NOT_FOUND })),
        )
        .await;
        let config = ViewConfig {
            default_url: format!("http://{upstream}/square.json"),
            ..ViewConfig::default()
        };
        let base = start(config).await;
        let client = reqwest::Client::new();

        let response = client
            .post(format!("{base}/api/load/url"))
            .json(&json!({ "url": "" }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 200);
        let created: Value = response.json().await.unwrap();
        assert_eq!(created["view"]["summary"]["layer_count"], 1);

        let response = client
            .post(format!("{base}/api/load/url"))
            .json(&json!({ "url": format!("http://{upstream}/gone.json") }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 502);
        let body: Value = response.json().await.unwrap();
        assert!(body["error"].as_str().unwrap().contains("404"));
    }

    #[tokio::test]
    async fn health_reports_ok() {
        let base = start(ViewConfig::default()).await;
        let body: Value = reqwest::get(format!("{base}/api/health"))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(body["status"], "ok");
    }
}
