// ============================================================
// Layer 1 — Web Presentation Layer
// ============================================================
// A single-page form served with axum:
//
//   GET  /                → empty form
//   GET  /?example=<n>    → form pre-filled with example n
//   POST /                → run the QA system, re-render with
//                           inputs kept and both panels filled
//
// Inference is CPU/GPU-bound and synchronous, so each
// submission runs on tokio's blocking pool.
//
// Reference: Rust Book §16 (Fearless Concurrency)

/// HTML rendering of the single page
pub mod page;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::extract::{Query, State};
use axum::response::Html;
use axum::routing::get;
use axum::{Form, Router};
use serde::Deserialize;

use crate::application::qa_system::QaSystem;
use crate::domain::examples::example;
use crate::domain::query::QueryInput;
use page::{render, PageState};

/// Where the server listens.
#[derive(Debug, Clone, PartialEq)]
pub struct ServeConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Clone)]
pub struct AppState {
    pub system: Arc<QaSystem>,
}

/// `?example=` is kept as text so a bad value falls back to the empty form.
#[derive(Debug, Deserialize)]
pub struct ExampleQuery {
    pub example: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SubmitForm {
    #[serde(default)]
    question: String,
    #[serde(default)]
    context:  String,
}

pub fn router(system: Arc<QaSystem>) -> Router {
    Router::new()
        .route("/", get(show_form).post(submit))
        .with_state(AppState { system })
}

async fn show_form(Query(query): Query<ExampleQuery>) -> Html<String> {
    let chosen = query.example.and_then(|raw| raw.parse::<usize>().ok());
    let state = match chosen.and_then(example) {
        Some(e) => PageState {
            question: e.question.to_string(),
            context:  e.context.to_string(),
            ..PageState::default()
        },
        None => PageState::default(),
    };
    Html(render(&state))
}

async fn submit(State(app): State<AppState>, Form(form): Form<SubmitForm>) -> Html<String> {
    let input  = QueryInput::new(form.question, form.context);
    let system = Arc::clone(&app.system);
    let (question, context) = (input.question.clone(), input.context.clone());

    tracing::debug!("Submission: {} question chars, {} context chars",
        question.chars().count(), context.chars().count());

    let (answer, explanation) = tokio::task::spawn_blocking(move || {
        system.answer(&input.question, &input.context)
    })
    .await
    .unwrap_or_else(|e| {
        tracing::warn!("QA worker failed: {e}");
        (format!("❌ Error: {e}"), String::new())
    });

    Html(render(&PageState { question, context, answer, explanation }))
}

pub async fn serve(config: ServeConfig, system: Arc<QaSystem>) -> Result<()> {
    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Cannot bind {addr}"))?;
    let local: SocketAddr = listener.local_addr()?;
    tracing::info!("Running on http://{local}");

    axum::serve(listener, router(system))
        .await
        .context("HTTP server stopped")
}
