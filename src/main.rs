//! # Orientador Fiscal — Derivación a la Fiscalía Competente
//!
//! **Punto de entrada** del asistente de orientación del distrito fiscal de
//! Cajamarca. A partir del relato del ciudadano determina la materia, el
//! distrito de los hechos y la fiscalía que debe recibir la denuncia.
//!
//! ## Flujo de Inicialización
//!
//! ```text
//! main()
//!   ├── Configura tracing/logging
//!   ├── Lee Config desde el entorno
//!   ├── Carga y valida knowledge.json (falla → el proceso termina)
//!   ├── Elige clasificador: OpenAI si hay clave, heurística si no
//!   ├── Monta AppState y Router
//!   └── Escucha en BIND_ADDR:PORT
//! ```
//!
//! ## Ejemplo de Uso
//!
//! ```bash
//! # Sin clasificador externo
//! cargo run
//!
//! # Con clasificador externo y logs detallados
//! OPENAI_API_KEY=sk-... RUST_LOG=debug cargo run
//! ```

/// Módulo `config` — variables de entorno.
mod config;

/// Módulo `core` — tablas de referencia, contexto del caso y normalización de texto.
mod core;

/// Módulo `derivation` — motor determinista de derivación.
mod derivation;

/// Módulo `error` — errores de carga y del clasificador externo.
mod error;

/// Módulo `nlu` — del texto libre a materia, distrito e intención.
mod nlu;

/// Módulo `orchestrator` — máquina de estados de la conversación.
mod orchestrator;

/// Módulo `persistence` — lectura de knowledge.json.
mod persistence;

/// Módulo `web` — servidor axum, handlers y plantillas.
mod web;

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::nlu::{CaseClassifier, KeywordClassifier, OpenAiClassifier};
use crate::web::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // RUST_LOG=debug cargo run
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    tracing::info!("⚖️ Orientador Fiscal — Iniciando...");

    let config = Config::from_env().context("Configuración inválida")?;
    let (tables, report) = persistence::load_knowledge(&config.knowledge_path)?;

    let classifier: Arc<dyn CaseClassifier> = match &config.openai_api_key {
        Some(key) => {
            let offenses = tables.competencies.iter().map(|c| c.offense.clone()).collect();
            tracing::info!(model = %config.openai_model, "Clasificador externo habilitado");
            Arc::new(OpenAiClassifier::new(
                &config.openai_base_url,
                key.clone(),
                config.openai_model.clone(),
                offenses,
            ))
        }
        None => {
            tracing::warn!("OPENAI_API_KEY no definida, se usa la heurística local");
            Arc::new(KeywordClassifier)
        }
    };

    let addr = config.listen_addr();
    let state = AppState::new(tables, report, classifier, config);
    let app = web::create_router(state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("No se pudo escuchar en {addr}"))?;
    tracing::info!("🚀 Servidor en http://{addr}");

    axum::serve(listener, app).await?;

    Ok(())
}
