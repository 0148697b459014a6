//! # Módulo Web — La Superficie HTTP del Orientador
//!
//! Construida con **Axum** + **HTMX** + **Maud**.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │ Navegador (HTMX)          Canal de mensajería (JSON)     │
//! ├──────────────────────────────────────────────────────────┤
//! │ Axum Router (este módulo)                                │
//! │  ├── GET  /                          → página de prueba  │
//! │  ├── GET  /status                    → JSON: conteos     │
//! │  ├── POST /chat                      → fragmento HTMX    │
//! │  ├── POST /api/messages              → JSON: Reply       │
//! │  └── POST /api/sessions/{id}/reset   → JSON              │
//! ├──────────────────────────────────────────────────────────┤
//! │ Estáticos (tower_http::ServeDir → /assets/)              │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! | Módulo | Responsabilidad |
//! |--------|-----------------|
//! | [`state`] | `AppState` y almacén de sesiones |
//! | [`handlers`] | un handler por ruta |
//! | [`templates`] | HTML con Maud |

pub mod handlers;
pub mod state;
pub mod templates;

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;

use state::AppState;

/// Router con todas las rutas. CORS abierto para que un canal externo
/// pueda llamar a la API JSON.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // ── Página de prueba ─────────────────────────────────
        .route("/", get(handlers::index))
        .route("/chat", post(handlers::chat))
        // ── API JSON ──────────────────────────────────────────
        .route("/status", get(handlers::status))
        .route("/api/messages", post(handlers::api_message))
        .route("/api/sessions/{id}/reset", post(handlers::reset_session))
        // ── Archivos estáticos ────────────────────────────────
        .nest_service("/assets", ServeDir::new("assets"))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request, StatusCode};
    use serde_json::Value;
    use tower::ServiceExt;

    use super::*;
    use crate::config::Config;
    use crate::core::tables::fixtures;
    use crate::nlu::KeywordClassifier;
    use crate::persistence::LoadReport;

    fn app() -> (Router, AppState) {
        let report = LoadReport { districts: 7, offices: 14, ..LoadReport::default() };
        let state = AppState::new(fixtures::sample(), report, Arc::new(KeywordClassifier), Config::default());
        (create_router(state.clone()), state)
    }

    async fn body_text(response: axum::response::Response) -> String {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    fn json_post(uri: &str, body: Value) -> Request<Body> {
        Request::post(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn index_renders_page_with_session() {
        let (app, _) = app();
        let response = app.oneshot(Request::get("/").body(Body::empty()).unwrap()).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let html = body_text(response).await;
        assert!(html.contains(r#"name="session""#));
        assert!(html.contains("Ministerio Público"));
    }

    #[tokio::test]
    async fn status_reports_tables_and_classifier() {
        let (app, _) = app();
        let response = app.oneshot(Request::get("/status").body(Body::empty()).unwrap()).await.unwrap();
        let json: Value = serde_json::from_str(&body_text(response).await).unwrap();
        assert_eq!(json["ready"], true);
        assert_eq!(json["classifier"], "keywords");
        assert_eq!(json["tables"]["districts"], 7);
    }

    #[tokio::test]
    async fn api_message_resolves_in_one_turn() {
        let (app, _) = app();
        let request = json_post(
            "/api/messages",
            serde_json::json!({
                "session_id": "api-1",
                "text": "me robaron con un arma, fue un robo agravado en Cajamarca"
            }),
        );
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json: Value = serde_json::from_str(&body_text(response).await).unwrap();
        assert_eq!(json["state"], "resolved");
        assert_eq!(json["outcome"]["status"], "OK");
        assert_eq!(json["outcome"]["office"]["code"], "FPPC-CAJ");
    }

    #[tokio::test]
    async fn api_message_rejects_blank_session() {
        let (app, _) = app();
        let request = json_post("/api/messages", serde_json::json!({ "session_id": " ", "text": "hola" }));
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn chat_form_keeps_session_between_turns() {
        let (app, state) = app();
        let first = Request::post("/chat")
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from("session=web-1&message=quiero+denunciar+un+hurto"))
            .unwrap();
        let html = body_text(app.clone().oneshot(first).await.unwrap()).await;
        assert!(html.contains("quiero denunciar un hurto"));

        let second = Request::post("/chat")
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from("session=web-1&message=Celend%C3%ADn"))
            .unwrap();
        let html = body_text(app.oneshot(second).await.unwrap()).await;
        assert!(html.contains("Fiscalía Provincial Mixta de Celendín"));
        assert_eq!(state.sessions.len(), 1);
    }

    #[tokio::test]
    async fn reset_discards_session() {
        let (app, state) = app();
        state.conversation("r-1");
        let response = app
            .oneshot(Request::post("/api/sessions/r-1/reset").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let json: Value = serde_json::from_str(&body_text(response).await).unwrap();
        assert_eq!(json["existed"], true);
        assert_eq!(state.sessions.len(), 0);
    }
}
