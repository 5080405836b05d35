use axum::{
    Json, Router,
    body::Bytes,
    extract::State,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::Serialize;
use serde_json::Value;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::error::{AuthError, InfraError};
use crate::models::credential::VerifyResult;
use crate::services::CredentialService;

const MSG_REQUIRED: &str = "Username and password are required.";
const MSG_INVALID_JSON: &str = "Invalid JSON payload.";
const MSG_INVALID_CREDENTIALS: &str = "Invalid credentials.";
const MSG_INTERNAL: &str = "Login failed.";
const MSG_METHOD: &str = "Method not allowed. Use POST.";

#[derive(Clone)]
pub struct HttpAppCtx {
    pub credentials: Arc<CredentialService>,
}

impl HttpAppCtx {
    pub fn new(credentials: Arc<CredentialService>) -> Self {
        Self { credentials }
    }
}

pub fn router(ctx: HttpAppCtx) -> Router {
    Router::new()
        .route("/api/login", post(login).fallback(method_not_allowed))
        .route("/api/health", get(health))
        .with_state(ctx)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any))
}

/// Run the HTTP server until Ctrl-C
pub async fn serve(addr: SocketAddr, ctx: HttpAppCtx) -> Result<(), InfraError> {
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(%addr, "auth server (http) listening");

    axum::serve(listener, router(ctx))
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("shutdown requested"),
        Err(e) => {
            tracing::error!(error = %e, "cannot listen for ctrl-c, running until killed");
            std::future::pending::<()>().await;
        }
    }
}

/// Login payload. Field values are coerced the way a browser route does with
/// `String(value || "")`, so the emptiness check happens in one place.
#[derive(Debug, Default)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

impl LoginRequest {
    /// An empty body, or a JSON value that is not an object, carries no fields.
    pub fn from_body(body: &[u8]) -> Result<Self, AuthError> {
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self::default());
        }

        let value: Value = serde_json::from_slice(body).map_err(|e| AuthError::InvalidPayload(e.to_string()))?;
        let Value::Object(fields) = value else {
            return Ok(Self::default());
        };

        Ok(Self {
            username: fields.get("username").map(field_text).unwrap_or_default(),
            password: fields.get("password").map(field_text).unwrap_or_default(),
        })
    }
}

/// Falsy values (`null`, `false`, `0`, `""`) become empty.
fn field_text(value: &Value) -> String {
    match value {
        Value::Null | Value::Bool(false) => String::new(),
        Value::Number(n) if n.as_f64() == Some(0.0) => String::new(),
        other => display_text(other),
    }
}

/// String conversion of a (truthy) JSON value: arrays join their elements
/// with commas, objects render as `[object Object]`.
fn display_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => match n.as_f64() {
            Some(f) if n.is_f64() && f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", f as i64),
            _ => n.to_string(),
        },
        Value::String(s) => s.clone(),
        Value::Array(items) => items.iter().map(display_text).collect::<Vec<_>>().join(","),
        Value::Object(_) => "[object Object]".to_string(),
    }
}

#[derive(Debug, Serialize)]
struct LoginOk {
    ok: bool,
    user: String,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: &'static str,
}

#[derive(Debug)]
pub enum ApiError {
    InvalidCredentials,
    Auth(AuthError),
}

impl From<AuthError> for ApiError {
    fn from(e: AuthError) -> Self {
        ApiError::Auth(e)
    }
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            ApiError::Auth(e) if e.is_client_error() => StatusCode::BAD_REQUEST,
            ApiError::Auth(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn message(&self) -> &'static str {
        match self {
            ApiError::InvalidCredentials => MSG_INVALID_CREDENTIALS,
            ApiError::Auth(AuthError::Validation { .. }) => MSG_REQUIRED,
            ApiError::Auth(AuthError::InvalidPayload(_)) => MSG_INVALID_JSON,
            ApiError::Auth(_) => MSG_INTERNAL,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        match &self {
            ApiError::Auth(e) if status.is_server_error() => tracing::error!(error = %e, "login failed"),
            ApiError::Auth(e) => tracing::debug!(error = %e, "login rejected"),
            ApiError::InvalidCredentials => {}
        }

        (status, Json(ErrorBody { error: self.message() })).into_response()
    }
}

async fn login(State(ctx): State<HttpAppCtx>, body: Bytes) -> Result<Json<LoginOk>, ApiError> {
    let req = LoginRequest::from_body(&body)?;

    match ctx.credentials.verify(&req.username, &req.password).await? {
        VerifyResult::Valid(user) => Ok(Json(LoginOk { ok: true, user })),
        VerifyResult::Invalid => Err(ApiError::InvalidCredentials),
    }
}

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn method_not_allowed() -> impl IntoResponse {
    (
        StatusCode::METHOD_NOT_ALLOWED,
        [(header::ALLOW, "POST")],
        Json(ErrorBody { error: MSG_METHOD }),
    )
}
