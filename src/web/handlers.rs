//! # Handlers HTTP — Los Endpoints del Orientador
//!
//! Cada función pública es un handler Axum registrado en
//! [`super::create_router()`].
//!
//! | Handler | Método | Retorno | Uso |
//! |---------|--------|---------|-----|
//! | `index` | GET | HTML completo | página de prueba con sesión nueva |
//! | `status` | GET | JSON | disponibilidad y conteos de tablas |
//! | `chat` | POST | fragmento HTMX | turno desde la página |
//! | `api_message` | POST | JSON | turno desde cualquier canal |
//! | `reset_session` | POST | JSON | descarta la sesión |
//!
//! `chat` y `api_message` comparten [`run_turn`]: toman la conversación de
//! la sesión, esperan su turno en el `Mutex` y procesan el mensaje.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Html;
use axum::Json;
use serde::{Deserialize, Serialize};

use super::state::{AppState, SessionStore};
use super::templates;
use crate::nlu::QuestionGenerator;
use crate::orchestrator::Reply;
use crate::persistence::LoadReport;

/// Respuesta de `/status`.
#[derive(Serialize)]
pub struct StatusResponse {
    pub ready: bool,
    pub classifier: &'static str,
    pub tables: LoadReport,
    pub active_sessions: usize,
}

/// Campos del formulario de chat.
#[derive(Deserialize)]
pub struct ChatForm {
    pub session: String,
    pub message: String,
}

/// Cuerpo de `POST /api/messages`.
#[derive(Deserialize)]
pub struct MessageRequest {
    pub session_id: String,
    pub text: String,
}

/// Cuerpo de la respuesta de reinicio.
#[derive(Serialize)]
pub struct ResetResponse {
    pub session_id: String,
    pub existed: bool,
}

fn markup_to_html(m: maud::Markup) -> Html<String> {
    Html(m.into_string())
}

async fn run_turn(state: &AppState, session: &str, text: &str) -> Reply {
    let conversation = state.conversation(session);
    let mut conversation = conversation.lock().await;
    let reply = conversation.process_message(text).await;
    tracing::debug!(session, state = ?reply.state, "Turno procesado");
    reply
}

/// GET `/` — Página de prueba con una sesión nueva.
pub async fn index() -> Html<String> {
    let session = SessionStore::new_id();
    markup_to_html(templates::full_page(&session, &QuestionGenerator::new().welcome()))
}

/// GET `/status` — Siempre `ready`: las tablas se cargan antes de escuchar.
pub async fn status(State(state): State<AppState>) -> Json<StatusResponse> {
    Json(StatusResponse {
        ready: true,
        classifier: state.classifier.name(),
        tables: state.report.clone(),
        active_sessions: state.sessions.len(),
    })
}

/// POST `/chat` — Turno desde la página; devuelve el fragmento a insertar
/// al final de `#chat-messages`.
pub async fn chat(State(state): State<AppState>, axum::Form(form): axum::Form<ChatForm>) -> Html<String> {
    let user_text = form.message.trim().to_string();
    if form.session.trim().is_empty() {
        return markup_to_html(maud::html! {
            div class="message system-message error" {
                div class="message-content" { "Sesión inválida. Recarga la página." }
            }
        });
    }
    let reply = run_turn(&state, &form.session, &user_text).await;
    markup_to_html(templates::exchange(&user_text, &reply, &form.session))
}

/// POST `/api/messages` — Turno desde un canal externo.
pub async fn api_message(
    State(state): State<AppState>,
    Json(request): Json<MessageRequest>,
) -> Result<Json<Reply>, (StatusCode, String)> {
    if request.session_id.trim().is_empty() {
        return Err((StatusCode::BAD_REQUEST, "session_id vacío".into()));
    }
    Ok(Json(run_turn(&state, &request.session_id, &request.text).await))
}

/// POST `/api/sessions/{id}/reset` — Descarta la sesión; el próximo
/// mensaje empieza una consulta nueva.
pub async fn reset_session(State(state): State<AppState>, Path(id): Path<String>) -> Json<ResetResponse> {
    let existed = state.sessions.remove(&id);
    tracing::info!(session = %id, existed, "Sesión reiniciada");
    Json(ResetResponse { session_id: id, existed })
}
