//! Server settings read from `LOTTIE_VIEW_*` environment variables.

use std::net::SocketAddr;

use tracing::warn;

pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;
pub const DEFAULT_MAX_SESSIONS: usize = 64;
pub const DEFAULT_ANIMATION_URL: &str = "https://assets5.lottiefiles.com/packages/lf20_V9t630.json";

#[derive(Debug, Clone, PartialEq)]
pub struct ViewConfig {
    pub addr: SocketAddr,
    pub allow_origin: String,
    pub max_upload_bytes: usize,
    /// Open sessions kept before the oldest is dropped.
    pub max_sessions: usize,
    /// Loaded when a URL request arrives with an empty URL.
    pub default_url: String,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            addr: SocketAddr::from(([0, 0, 0, 0], 3000)),
            allow_origin: "*".to_string(),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            max_sessions: DEFAULT_MAX_SESSIONS,
            default_url: DEFAULT_ANIMATION_URL.to_string(),
        }
    }
}

impl ViewConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Unparseable values are logged and replaced by their default.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let read = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let addr = match read("LOTTIE_VIEW_ADDR") {
            Some(raw) => raw.parse::<SocketAddr>().unwrap_or_else(|e| {
                warn!("Ignoring LOTTIE_VIEW_ADDR '{}': {}", raw, e);
                defaults.addr
            }),
            None => defaults.addr,
        };
        let max_upload_bytes = match read("LOTTIE_VIEW_MAX_UPLOAD_BYTES") {
            Some(raw) => raw.parse::<usize>().unwrap_or_else(|e| {
                warn!("Ignoring LOTTIE_VIEW_MAX_UPLOAD_BYTES '{}': {}", raw, e);
                defaults.max_upload_bytes
            }),
            None => defaults.max_upload_bytes,
        };
        let max_sessions = match read("LOTTIE_VIEW_MAX_SESSIONS") {
            Some(raw) => match raw.parse::<usize>() {
                Ok(n) if n > 0 => n,
                Ok(_) => {
                    warn!("Ignoring LOTTIE_VIEW_MAX_SESSIONS '{}': must be at least 1", raw);
                    defaults.max_sessions
                }
                Err(e) => {
                    warn!("Ignoring LOTTIE_VIEW_MAX_SESSIONS '{}': {}", raw, e);
                    defaults.max_sessions
                }
            },
            None => defaults.max_sessions,
        };

        Self {
            addr,
            allow_origin: read("LOTTIE_VIEW_ALLOW_ORIGIN").unwrap_or(defaults.allow_origin),
            max_upload_bytes,
            max_sessions,
            default_url: read("LOTTIE_VIEW_DEFAULT_URL").unwrap_or(defaults.default_url),
        }
    }
}
