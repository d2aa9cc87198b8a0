//! A stand-in for the Formspree form relay.
//!
//! `POST /f/{form_id}` behaves depending on the form id:
//! - the configured form id validates the submission and answers like Formspree
//! - `blocked` answers 403, `limited` answers 429
//! - `unavailable` always answers 503 with a plain text body
//! - `flaky-N` answers 500 for the first `N` requests, then behaves like the
//!   configured form
//! - anything else answers 404

use std::{
    collections::HashMap,
    net::{IpAddr, Ipv4Addr, SocketAddr},
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use anyhow::Context;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing, Json, Router,
};
use serde::Serialize;
use serde_json::{Map, Value};
use tokio::net::TcpListener;
use tracing::info;

pub const DEFAULT_FORM_ID: &str = "test-form";

const SUBMIT_ROUTE: &str = "/f/:form_id";

#[derive(Debug, Clone)]
pub struct RelayState {
    form_id: Arc<str>,
    attempts: Arc<Mutex<HashMap<String, usize>>>,
    submissions: Arc<Mutex<Vec<Map<String, Value>>>>,
}

impl RelayState {
    pub fn new(form_id: impl Into<Arc<str>>) -> Self {
        Self {
            form_id: form_id.into(),
            attempts: Default::default(),
            submissions: Default::default(),
        }
    }

    /// Returns the bodies of all accepted submissions.
    pub fn submissions(&self) -> Vec<Map<String, Value>> {
        lock(&self.submissions).clone()
    }

    /// Returns how many requests have been made for the given form id.
    pub fn attempts(&self, form_id: &str) -> usize {
        lock(&self.attempts).get(form_id).copied().unwrap_or(0)
    }
}

pub fn router(state: RelayState) -> Router<()> {
    Router::new()
        .route(SUBMIT_ROUTE, routing::post(submit))
        .with_state(state)
}

pub async fn start_server(host: IpAddr, port: u16, form_id: String) -> anyhow::Result<()> {
    info!("Starting form relay testing server on {host}:{port}");
    info!("Form endpoint: http://{host}:{port}/f/{form_id}");
    info!(
        "Special form ids are \"blocked\" (403), \"limited\" (429), \"unavailable\" (503) and \
         \"flaky-N\" (N times 500, then success)"
    );

    let listener = TcpListener::bind((host, port))
        .await
        .with_context(|| format!("Failed to bind to {host}:{port}"))?;
    axum::serve(listener, router(RelayState::new(form_id)))
        .await
        .context("Failed to start HTTP server")
}

/// Starts a relay on an ephemeral localhost port in the background.
pub async fn spawn(form_id: &str) -> anyhow::Result<(SocketAddr, RelayState)> {
    let state = RelayState::new(form_id);
    let listener = TcpListener::bind((Ipv4Addr::LOCALHOST, 0))
        .await
        .context("Failed to bind to localhost")?;
    let addr = listener.local_addr()?;

    let app = router(state.clone());
    tokio::spawn(async move { axum::serve(listener, app).await });

    Ok((addr, state))
}

#[derive(Serialize)]
struct SuccessResponse {
    ok: bool,
    next: &'static str,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: &'static str,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    errors: Vec<FieldError>,
}

#[derive(Serialize)]
struct FieldError {
    code: &'static str,
    field: &'static str,
    message: &'static str,
}

async fn submit(
    State(state): State<RelayState>,
    Path(form_id): Path<String>,
    Json(body): Json<Map<String, Value>>,
) -> Response {
    let attempt = {
        let mut attempts = lock(&state.attempts);
        let counter = attempts.entry(form_id.clone()).or_default();
        *counter += 1;
        *counter
    };

    match form_id.as_str() {
        "blocked" => return error(StatusCode::FORBIDDEN, "Form is disabled"),
        "limited" => return error(StatusCode::TOO_MANY_REQUESTS, "Too many submissions"),
        "unavailable" => {
            return (StatusCode::SERVICE_UNAVAILABLE, "Service Unavailable").into_response()
        }
        id => {
            let failures = id
                .strip_prefix("flaky-")
                .and_then(|n| n.parse::<usize>().ok());
            match failures {
                Some(failures) if attempt <= failures => {
                    return error(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
                }
                Some(_) => {}
                None if id == &*state.form_id => {}
                None => return error(StatusCode::NOT_FOUND, "Form not found"),
            }
        }
    }

    let errors = validate(&body);
    if !errors.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: "Validation errors",
                errors,
            }),
        )
            .into_response();
    }

    lock(&state.submissions).push(body);

    Json(SuccessResponse {
        ok: true,
        next: "/thanks",
    })
    .into_response()
}

fn validate(body: &Map<String, Value>) -> Vec<FieldError> {
    let text = |key: &str| body.get(key).and_then(Value::as_str).unwrap_or_default();

    let mut errors = Vec::new();
    if !text("email").contains('@') {
        errors.push(FieldError {
            code: "TYPE_EMAIL",
            field: "email",
            message: "should be an email",
        });
    }
    if text("message").trim().is_empty() {
        errors.push(FieldError {
            code: "REQUIRED_FIELD_EMPTY",
            field: "message",
            message: "is required",
        });
    }
    errors
}

fn error(status: StatusCode, error: &'static str) -> Response {
    (
        status,
        Json(ErrorResponse {
            error,
            errors: Vec::new(),
        }),
    )
        .into_response()
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
