//! HTTP backend for the PSX Dashboard

use axum::{
    extract::{FromRequestParts, Path, State},
    http::{header, request::Parts, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use psx_dashboard::config::DEFAULT_SECRETS_FILE;
use psx_dashboard::{
    csv_template, run_analysis, AnalysisReport, AnalysisRequest, AnalysisType, DashboardError,
    GeminiClient, ImportResult, SessionRegistry, SessionStatus, Settings, StockSummary,
    StockView,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::CorsLayer;

/// Header carrying the session id returned by `POST /api/session`
pub const SESSION_HEADER: &str = "x-session-id";

const INDEX_HTML: &str = include_str!("../static/index.html");

/// Application state shared by every handler
pub struct AppState {
    sessions: SessionRegistry,
    /// Gemini client, or the reason it could not be configured
    gemini: std::result::Result<GeminiClient, String>,
    secrets_file: String,
}

impl AppState {
    pub fn new(gemini: std::result::Result<GeminiClient, String>) -> Arc<Self> {
        Self::with_sessions(gemini, SessionRegistry::new(), DEFAULT_SECRETS_FILE.to_string())
    }

    fn with_sessions(
        gemini: std::result::Result<GeminiClient, String>,
        sessions: SessionRegistry,
        secrets_file: String,
    ) -> Arc<Self> {
        Arc::new(Self {
            sessions,
            gemini,
            secrets_file,
        })
    }

    /// Build state from settings. A missing API key only disables analysis.
    pub fn from_settings(settings: &Settings) -> Arc<Self> {
        let gemini = settings
            .api_key()
            .and_then(|key| GeminiClient::new(&key))
            .map(|client| client.with_model(&settings.model))
            .map_err(|e| e.to_string());

        match &gemini {
            Ok(_) => log::info!("Gemini configured with model {}", settings.model),
            Err(e) => log::warn!("Failed to configure Gemini API: {}", e),
        }

        Self::with_sessions(
            gemini,
            SessionRegistry::with_idle_timeout(settings.session_idle_timeout),
            settings.secrets_file.display().to_string(),
        )
    }

    fn gemini(&self) -> std::result::Result<&GeminiClient, DashboardError> {
        self.gemini
            .as_ref()
            .map_err(|reason| DashboardError::GeminiUnavailable {
                reason: reason.clone(),
                secrets_file: self.secrets_file.clone(),
            })
    }
}

type SharedState = Arc<AppState>;

// ============================================================================
// Errors
// ============================================================================

/// Error response wrapper
#[derive(Debug)]
pub struct ApiError(DashboardError);

#[derive(Serialize)]
struct ErrorBody {
    error: &'static str,
    message: String,
}

impl From<DashboardError> for ApiError {
    fn from(err: DashboardError) -> Self {
        ApiError(err)
    }
}

impl ApiError {
    fn status_and_kind(&self) -> (StatusCode, &'static str) {
        match &self.0 {
            DashboardError::AlreadyRegistered(_) => (StatusCode::CONFLICT, "already_registered"),
            DashboardError::InvalidLogin => (StatusCode::UNAUTHORIZED, "invalid_login"),
            DashboardError::NotAuthenticated => (StatusCode::UNAUTHORIZED, "not_authenticated"),
            DashboardError::EmptySymbol => (StatusCode::BAD_REQUEST, "warning"),
            DashboardError::MissingColumns(_)
            | DashboardError::MalformedField { .. }
            | DashboardError::Csv(_) => (StatusCode::BAD_REQUEST, "malformed_csv"),
            DashboardError::InvalidInput(_) => (StatusCode::BAD_REQUEST, "bad_request"),
            DashboardError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            DashboardError::Config(_) | DashboardError::GeminiUnavailable { .. } => {
                (StatusCode::SERVICE_UNAVAILABLE, "config")
            }
            DashboardError::Api(_) | DashboardError::Http(_) => {
                (StatusCode::BAD_GATEWAY, "api_failure")
            }
            _ => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, kind) = self.status_and_kind();
        if self.0.is_user_error() {
            log::warn!("{}: {}", kind, self.0);
        } else {
            log::error!("{}: {}", kind, self.0);
        }

        let body = ErrorBody {
            error: kind,
            message: self.0.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

type ApiResult<T> = std::result::Result<T, ApiError>;

// ============================================================================
// Session extractor
// ============================================================================

/// Session id taken from the `x-session-id` header
pub struct SessionId(pub String);

impl<S: Send + Sync> FromRequestParts<S> for SessionId {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> ApiResult<Self> {
        parts
            .headers
            .get(SESSION_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .map(SessionId)
            .ok_or_else(|| {
                ApiError(DashboardError::InvalidInput(format!(
                    "missing {} header",
                    SESSION_HEADER
                )))
            })
    }
}

// ============================================================================
// Request / response bodies
// ============================================================================

/// Command result
#[derive(Serialize)]
struct CommandResult {
    success: bool,
    message: String,
}

#[derive(Serialize)]
struct SessionCreated {
    session_id: String,
}

#[derive(Deserialize)]
struct RegisterRequest {
    email: String,
    name: String,
    password: String,
}

#[derive(Deserialize)]
struct LoginRequest {
    email: String,
    password: String,
}

#[derive(Serialize)]
struct AnalysisTypeInfo {
    label: &'static str,
    sections: &'static [&'static str],
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
    analysis_available: bool,
    sessions: usize,
}

fn csv_response(body: String, filename: &str) -> Response {
    (
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", filename),
            ),
        ],
        body,
    )
        .into_response()
}

// ============================================================================
// Handlers
// ============================================================================

async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

async fn health(State(state): State<SharedState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        analysis_available: state.gemini.is_ok(),
        sessions: state.sessions.len(),
    })
}

/// Start a session with a fresh seeded store
async fn create_session(State(state): State<SharedState>) -> ApiResult<Json<SessionCreated>> {
    let session_id = state.sessions.create()?;
    Ok(Json(SessionCreated { session_id }))
}

/// End the session and drop everything it held
async fn end_session(
    State(state): State<SharedState>,
    SessionId(id): SessionId,
) -> ApiResult<Json<CommandResult>> {
    if !state.sessions.remove(&id)? {
        return Err(DashboardError::NotFound(format!("session {}", id)).into());
    }
    Ok(Json(CommandResult {
        success: true,
        message: "Session ended".to_string(),
    }))
}

async fn register(
    State(state): State<SharedState>,
    SessionId(id): SessionId,
    Json(req): Json<RegisterRequest>,
) -> ApiResult<Json<CommandResult>> {
    state
        .sessions
        .with_session(&id, |s| s.register(&req.email, &req.name, &req.password))?;

    Ok(Json(CommandResult {
        success: true,
        message: "Registration successful! Please login.".to_string(),
    }))
}

async fn login(
    State(state): State<SharedState>,
    SessionId(id): SessionId,
    Json(req): Json<LoginRequest>,
) -> ApiResult<Json<SessionStatus>> {
    let status = state.sessions.with_session(&id, |s| {
        s.login(&req.email, &req.password)?;
        s.status()
    })?;
    Ok(Json(status))
}

async fn logout(
    State(state): State<SharedState>,
    SessionId(id): SessionId,
) -> ApiResult<Json<CommandResult>> {
    state.sessions.with_session(&id, |s| {
        s.logout();
        Ok(())
    })?;

    Ok(Json(CommandResult {
        success: true,
        message: "Logged out".to_string(),
    }))
}

async fn me(
    State(state): State<SharedState>,
    SessionId(id): SessionId,
) -> ApiResult<Json<SessionStatus>> {
    let status = state.sessions.with_session(&id, |s| s.status())?;
    Ok(Json(status))
}

async fn list_stocks(
    State(state): State<SharedState>,
    SessionId(id): SessionId,
) -> ApiResult<Json<Vec<StockSummary>>> {
    let stocks = state.sessions.with_session(&id, |s| s.list_stocks())?;
    Ok(Json(stocks))
}

async fn get_stock(
    State(state): State<SharedState>,
    SessionId(id): SessionId,
    Path(symbol): Path<String>,
) -> ApiResult<Json<StockView>> {
    let view = state.sessions.with_session(&id, |s| s.stock_view(&symbol))?;
    Ok(Json(view))
}

/// Import a CSV body. Any bad row rejects the whole file.
async fn import_stocks(
    State(state): State<SharedState>,
    SessionId(id): SessionId,
    body: String,
) -> ApiResult<Json<ImportResult>> {
    let result = state.sessions.with_session(&id, |s| s.import_csv(&body))?;
    Ok(Json(result))
}

async fn export_stocks(
    State(state): State<SharedState>,
    SessionId(id): SessionId,
) -> ApiResult<Response> {
    let csv = state.sessions.with_session(&id, |s| s.export_csv())?;
    Ok(csv_response(csv, "psx_stocks.csv"))
}

async fn stock_template() -> ApiResult<Response> {
    Ok(csv_response(csv_template()?, "psx_stock_template.csv"))
}

async fn analysis_types() -> Json<Vec<AnalysisTypeInfo>> {
    Json(
        AnalysisType::ALL
            .iter()
            .map(|t| AnalysisTypeInfo {
                label: t.label(),
                sections: t.sections(),
            })
            .collect(),
    )
}

/// Template the prompt and return whatever the model says
async fn analyze(
    State(state): State<SharedState>,
    Json(req): Json<AnalysisRequest>,
) -> ApiResult<Json<AnalysisReport>> {
    let gemini = state.gemini()?;
    let report = run_analysis(gemini, &req).await?;
    Ok(Json(report))
}

/// Build the application router
pub fn router(state: SharedState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/health", get(health))
        .route("/api/session", post(create_session).delete(end_session))
        .route("/api/register", post(register))
        .route("/api/login", post(login))
        .route("/api/logout", post(logout))
        .route("/api/me", get(me))
        .route("/api/stocks", get(list_stocks))
        .route("/api/stocks/import", post(import_stocks))
        .route("/api/stocks/export.csv", get(export_stocks))
        .route("/api/stocks/template.csv", get(stock_template))
        .route("/api/stocks/{symbol}", get(get_stock))
        .route("/api/analysis/types", get(analysis_types))
        .route("/api/analysis", post(analyze))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Periodically end sessions whose page went away without `DELETE /api/session`
async fn evict_idle_sessions(state: SharedState) {
    let period = (state.sessions.idle_timeout() / 4).max(Duration::from_secs(1));
    let mut ticker = tokio::time::interval(period);
    loop {
        ticker.tick().await;
        match state.sessions.evict_idle() {
            Ok(0) => {}
            Ok(n) => log::info!("Evicted {} idle session(s)", n),
            Err(e) => log::error!("Session eviction failed: {}", e),
        }
    }
}

/// Bind and serve until Ctrl-C
pub async fn run(settings: Settings) -> anyhow::Result<()> {
    let state = AppState::from_settings(&settings);
    tokio::spawn(evict_idle_sessions(state.clone()));
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(&settings.bind_addr).await?;
    log::info!("PSX Dashboard listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            log::info!("Shutting down");
        })
        .await?;
    Ok(())
}
