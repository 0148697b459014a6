//! # Errores — Fronteras que Pueden Fallar
//!
//! El motor de derivación es total: nunca devuelve error. Solo fallan las
//! fronteras con el mundo exterior:
//!
//! | Error | Frontera |
//! |-------|----------|
//! | [`KnowledgeError`] | lectura y validación de `knowledge.json` |
//! | [`ClassifierError`] | llamada al clasificador externo |
//!
//! La configuración tiene su propio error en [`crate::config::ConfigError`].

use thiserror::Error;

/// Fallo al cargar las tablas de referencia.
#[derive(Error, Debug)]
pub enum KnowledgeError {
    #[error("no se pudo leer {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("JSON inválido: {0}")]
    Json(#[from] serde_json::Error),
    /// Una tabla sin la cual el motor no puede derivar quedó vacía tras validar.
    #[error("la tabla obligatoria '{0}' está vacía")]
    EmptyTable(&'static str),
}

/// Fallo del clasificador externo. Nunca llega al ciudadano: la
/// conversación continúa con señales deterministas.
#[derive(Error, Debug)]
pub enum ClassifierError {
    #[error("petición HTTP fallida: {0}")]
    Http(#[from] reqwest::Error),
    #[error("el servicio respondió {status}: {body}")]
    Server { status: u16, body: String },
    #[error("respuesta sin contenido JSON utilizable")]
    Unparsable,
}
