use std::{
    collections::{HashMap, HashSet},
    sync::Arc,
    time::{Duration, Instant},
};

use axum::{
    extract::{Request, State},
    http::{header, HeaderValue},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::api::ApiError;

const API_KEYS_VAR: &str = "POSTPLAN_API_KEYS";
const REQUEST_ID_HEADER: &str = "x-request-id";
const MAX_REQUEST_ID_LEN: usize = 128;
const ANONYMOUS_CALLER: &str = "anonymous";
const MAX_TRACKED_CALLERS: usize = 1024;

/// Request ID stored as a request extension.
#[derive(Debug, Clone)]
pub struct RequestId(pub String);

/// Bearer-token settings for the recommendation routes.
#[derive(Debug, Clone)]
pub struct AuthState {
    api_keys: Arc<HashSet<String>>,
    pub enabled: bool,
}

impl AuthState {
    /// Reads `POSTPLAN_API_KEYS` (comma-separated bearer tokens).
    ///
    /// # Errors
    ///
    /// Fails outside development when no keys are configured.
    pub fn from_env(is_development: bool) -> anyhow::Result<Self> {
        let raw = std::env::var(API_KEYS_VAR).unwrap_or_default();
        Self::from_keys(&raw, is_development)
    }

    /// Builds auth from a comma-separated key list. An empty list disables
    /// auth in development and is rejected everywhere else.
    ///
    /// # Errors
    ///
    /// Fails outside development when `raw` holds no keys.
    pub fn from_keys(raw: &str, is_development: bool) -> anyhow::Result<Self> {
        let api_keys: HashSet<String> = raw
            .split(',')
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .map(ToOwned::to_owned)
            .collect();

        let enabled = !api_keys.is_empty();
        if !enabled {
            anyhow::ensure!(
                is_development,
                "{API_KEYS_VAR} is required outside development; provide comma-separated bearer tokens"
            );
            tracing::warn!("{API_KEYS_VAR} not set; bearer auth disabled in development");
        }

        Ok(Self {
            api_keys: Arc::new(api_keys),
            enabled,
        })
    }

    fn allows(&self, token: &str) -> bool {
        self.api_keys.contains(token)
    }
}

#[derive(Debug, Clone, Copy)]
struct Window {
    started_at: Instant,
    count: usize,
}

/// Fixed-window request limiter. Each configured API key gets its own
/// window; every other caller shares the anonymous one.
#[derive(Debug, Clone)]
pub struct RateLimitState {
    max_requests: usize,
    window: Duration,
    windows: Arc<Mutex<HashMap<String, Window>>>,
}

impl RateLimitState {
    #[must_use]
    pub fn new(max_requests: usize, window: Duration) -> Self {
        Self {
            max_requests,
            window,
            windows: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Counts one request for `caller`. Returns the time left in the window
    /// when the caller is over the limit.
    ///
    /// At most `MAX_TRACKED_CALLERS` windows are held; once full, callers
    /// without a live window are counted as anonymous.
    async fn admit(&self, caller: &str, now: Instant) -> Result<(), Duration> {
        let mut windows = self.windows.lock().await;
        // One slot stays free for the anonymous window.
        let full = |w: &HashMap<String, Window>| {
            w.len() + 1 >= MAX_TRACKED_CALLERS && !w.contains_key(caller)
        };
        if full(&*windows) {
            windows.retain(|_, w| now.saturating_duration_since(w.started_at) < self.window);
        }
        let key = if full(&*windows) {
            ANONYMOUS_CALLER
        } else {
            caller
        };
        let window = windows.entry(key.to_owned()).or_insert(Window {
            started_at: now,
            count: 0,
        });

        let elapsed = now.saturating_duration_since(window.started_at);
        if elapsed >= self.window {
            *window = Window {
                started_at: now,
                count: 0,
            };
        }

        if window.count >= self.max_requests {
            return Err(self.window.saturating_sub(elapsed));
        }
        window.count += 1;
        Ok(())
    }
}

fn request_id_of(req: &Request) -> String {
    req.extensions()
        .get::<RequestId>()
        .map(|id| id.0.clone())
        .unwrap_or_default()
}

/// Accepts the caller's `x-request-id` when it is short printable ASCII,
/// otherwise assigns a `UUIDv4`. The id is stored as a [`RequestId`]
/// extension and echoed on the response.
pub async fn request_id(mut req: Request, next: Next) -> Response {
    let id = req
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty() && v.len() <= MAX_REQUEST_ID_LEN)
        .map_or_else(|| Uuid::new_v4().to_string(), ToOwned::to_owned);

    req.extensions_mut().insert(RequestId(id.clone()));
    let mut res = next.run(req).await;
    if let Ok(value) = HeaderValue::from_str(&id) {
        res.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    res
}

pub async fn require_bearer_auth(
    State(auth): State<AuthState>,
    req: Request,
    next: Next,
) -> Response {
    if !auth.enabled {
        return next.run(req).await;
    }

    let authorized = extract_bearer_token(req.headers().get(header::AUTHORIZATION))
        .is_some_and(|token| auth.allows(token));
    if authorized {
        next.run(req).await
    } else {
        ApiError::new(
            request_id_of(&req),
            "unauthorized",
            "missing or invalid bearer token",
        )
        .into_response()
    }
}

/// Limits the protected routes. Only tokens that pass auth get their own
/// window, so rotating unknown tokens cannot open fresh ones.
pub async fn enforce_rate_limit(
    State((auth, rate_limit)): State<(AuthState, RateLimitState)>,
    req: Request,
    next: Next,
) -> Response {
    let caller = caller_key(&auth, req.headers().get(header::AUTHORIZATION)).to_owned();

    match rate_limit.admit(&caller, Instant::now()).await {
        Ok(()) => next.run(req).await,
        Err(retry_after) => {
            tracing::warn!(retry_after_secs = retry_after.as_secs(), "rate limit exceeded");
            let mut res =
                ApiError::new(request_id_of(&req), "rate_limited", "rate limit exceeded")
                    .into_response();
            res.headers_mut().insert(
                header::RETRY_AFTER,
                HeaderValue::from(retry_after.as_secs().max(1)),
            );
            res
        }
    }
}

fn caller_key<'a>(auth: &AuthState, value: Option<&'a HeaderValue>) -> &'a str {
    extract_bearer_token(value)
        .filter(|token| auth.enabled && auth.allows(token))
        .unwrap_or(ANONYMOUS_CALLER)
}

fn extract_bearer_token(value: Option<&HeaderValue>) -> Option<&str> {
    value
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}
