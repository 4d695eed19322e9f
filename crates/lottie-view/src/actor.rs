//! The session thread.
//!
//! Every `EditSession` lives on one dedicated thread. HTTP handlers send it
//! messages and await the reply on a oneshot channel, so interactions with a
//! session are processed one at a time in arrival order.
//!
//! At most `max_sessions` stay open. Opening one more closes the oldest.

use std::collections::{HashMap, VecDeque};
use std::thread;

use axum::http::StatusCode;
use lottie_core::export::{self, GifRequest};
use lottie_core::{EditCommand, EditSession, EditorView, GifExport, PlaybackOptions};
use lottie_data::Document;
use lottie_render::RasterGifRenderer;
use serde::Serialize;
use tokio::sync::{mpsc, oneshot};
use tracing::{info, warn};

use crate::config::DEFAULT_MAX_SESSIONS;
use crate::ApiError;

pub type Reply<T> = oneshot::Sender<Result<T, ApiError>>;

pub enum SessionMessage {
    Create {
        document: Document,
        source: String,
        resp: oneshot::Sender<CreatedSession>,
    },
    View {
        id: String,
        layer: usize,
        resp: Reply<EditorView>,
    },
    Edit {
        id: String,
        layer: usize,
        commands: Vec<EditCommand>,
        resp: Reply<EditResponse>,
    },
    Reset {
        id: String,
        layer: usize,
        resp: Reply<EditorView>,
    },
    RenderFrame {
        id: String,
        frame: Option<f64>,
        height: u32,
        resp: Reply<Vec<u8>>,
    },
    Download {
        id: String,
        resp: Reply<String>,
    },
    Gif {
        id: String,
        request: GifRequest,
        resp: Reply<GifExport>,
    },
    Close {
        id: String,
        resp: Reply<()>,
    },
}

#[derive(Debug, Clone, Serialize)]
pub struct CreatedSession {
    pub id: String,
    pub view: EditorView,
}

#[derive(Debug, Clone, Serialize)]
pub struct EditResponse {
    pub view: EditorView,
    pub warnings: Vec<String>,
}

/// Owns every open session.
pub struct Sessions {
    sessions: HashMap<String, EditSession>,
    /// Open ids, oldest first.
    order: VecDeque<String>,
    max_sessions: usize,
}

impl Default for Sessions {
    fn default() -> Self {
        Self::with_limit(DEFAULT_MAX_SESSIONS)
    }
}

impl Sessions {
    /// A limit of zero is treated as one.
    pub fn with_limit(max_sessions: usize) -> Self {
        Self {
            sessions: HashMap::new(),
            order: VecDeque::new(),
            max_sessions: max_sessions.max(1),
        }
    }

    pub fn create(&mut self, document: Document) -> CreatedSession {
        while self.sessions.len() >= self.max_sessions {
            let Some(oldest) = self.order.pop_front() else {
                break;
            };
            self.sessions.remove(&oldest);
            info!(session = %oldest, limit = self.max_sessions, "session evicted");
        }

        let id = loop {
            let candidate = format!("{:016x}", rand::random::<u64>());
            if !self.sessions.contains_key(&candidate) {
                break candidate;
            }
        };
        let session = EditSession::new(document);
        let view = session.view(0);
        self.sessions.insert(id.clone(), session);
        self.order.push_back(id.clone());
        CreatedSession { id, view }
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn close(&mut self, id: &str) -> Result<(), ApiError> {
        self.sessions.remove(id).ok_or_else(|| unknown_session(id))?;
        self.order.retain(|open| open != id);
        Ok(())
    }

    fn get(&self, id: &str) -> Result<&EditSession, ApiError> {
        self.sessions.get(id).ok_or_else(|| unknown_session(id))
    }

    fn get_mut(&mut self, id: &str) -> Result<&mut EditSession, ApiError> {
        self.sessions.get_mut(id).ok_or_else(|| unknown_session(id))
    }

    pub fn view(&self, id: &str, layer: usize) -> Result<EditorView, ApiError> {
        Ok(self.get(id)?.view(layer))
    }

    /// Applies `commands` as one unit; a failing command leaves the session
    /// as it was.
    pub fn edit(
        &mut self,
        id: &str,
        layer: usize,
        commands: &[EditCommand],
    ) -> Result<EditResponse, ApiError> {
        let session = self.get_mut(id)?;
        let warnings = session
            .apply(commands)
            .map_err(|e| ApiError::new(StatusCode::BAD_REQUEST, e.to_string()))?;
        for warning in &warnings {
            warn!(session = id, "{}", warning);
        }
        Ok(EditResponse {
            view: session.view(layer),
            warnings: warnings.iter().map(ToString::to_string).collect(),
        })
    }

    pub fn reset(&mut self, id: &str, layer: usize) -> Result<EditorView, ApiError> {
        let session = self.get_mut(id)?;
        session.reset();
        Ok(session.view(layer))
    }

    /// PNG of `frame` (the document's in point when absent).
    pub fn render_frame(
        &self,
        id: &str,
        frame: Option<f64>,
        height: u32,
    ) -> Result<Vec<u8>, ApiError> {
        let doc = self.get(id)?.document();
        let frame = frame.unwrap_or_else(|| doc.in_point());
        let height = PlaybackOptions {
            height,
            ..Default::default()
        }
        .height();
        lottie_render::render_png(doc, frame, height).map_err(ApiError::internal)
    }

    pub fn download(&self, id: &str) -> Result<String, ApiError> {
        export::export_json(self.get(id)?.document()).map_err(ApiError::internal)
    }

    pub fn gif(&self, id: &str, request: &GifRequest) -> Result<GifExport, ApiError> {
        export::export_gif(&RasterGifRenderer, self.get(id)?.document(), request)
            .map_err(ApiError::internal)
    }

    fn handle(&mut self, msg: SessionMessage) {
        match msg {
            SessionMessage::Create {
                document,
                source,
                resp,
            } => {
                let created = self.create(document);
                info!(
                    session = %created.id,
                    source = %source,
                    open = self.len(),
                    "session created"
                );
                let _ = resp.send(created);
            }
            SessionMessage::View { id, layer, resp } => {
                let _ = resp.send(self.view(&id, layer));
            }
            SessionMessage::Edit {
                id,
                layer,
                commands,
                resp,
            } => {
                let _ = resp.send(self.edit(&id, layer, &commands));
            }
            SessionMessage::Reset { id, layer, resp } => {
                let _ = resp.send(self.reset(&id, layer));
            }
            SessionMessage::RenderFrame {
                id,
                frame,
                height,
                resp,
            } => {
                let _ = resp.send(self.render_frame(&id, frame, height));
            }
            SessionMessage::Download { id, resp } => {
                let _ = resp.send(self.download(&id));
            }
            SessionMessage::Gif { id, request, resp } => {
                let _ = resp.send(self.gif(&id, &request));
            }
            SessionMessage::Close { id, resp } => {
                let closed = self.close(&id);
                if closed.is_ok() {
                    info!(session = %id, open = self.len(), "session closed");
                }
                let _ = resp.send(closed);
            }
        }
    }
}

fn unknown_session(id: &str) -> ApiError {
    ApiError::new(StatusCode::NOT_FOUND, format!("Unknown session '{}'", id))
}

/// Starts the session thread and returns its mailbox.
pub fn spawn(max_sessions: usize) -> mpsc::Sender<SessionMessage> {
    let (tx, mut rx) = mpsc::channel::<SessionMessage>(100);
    thread::spawn(move || {
        let mut sessions = Sessions::with_limit(max_sessions);
        info!(max_sessions, "Session thread started.");
        while let Some(msg) = rx.blocking_recv() {
            sessions.handle(msg);
        }
        info!("Session thread stopped.");
    });
    tx
}
