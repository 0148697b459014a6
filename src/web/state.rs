//! # Estado de la Aplicación Web
//!
//! ```text
//! AppState (Clone, compartido por todos los handlers)
//!   ├── tables      Arc<ReferenceTables>   solo lectura
//!   ├── report      LoadReport             conteos de la carga
//!   ├── classifier  Arc<dyn CaseClassifier>
//!   ├── sessions    Arc<SessionStore>
//!   └── config      Arc<Config>
//! ```
//!
//! ## Sesiones
//!
//! Cada sesión es una [`Conversation`] propia detrás de un
//! `tokio::sync::Mutex`: los turnos de una misma sesión se procesan en
//! orden y sesiones distintas avanzan en paralelo. El mapa exterior usa
//! `parking_lot::Mutex` y nunca se mantiene tomado a través de un `.await`.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use uuid::Uuid;

use crate::config::Config;
use crate::core::ReferenceTables;
use crate::nlu::CaseClassifier;
use crate::orchestrator::Conversation;
use crate::persistence::LoadReport;

/// Conversación compartida de una sesión.
pub type SharedConversation = Arc<tokio::sync::Mutex<Conversation>>;

struct Session {
    conversation: SharedConversation,
    touched: DateTime<Utc>,
}

/// Sesiones en memoria con caducidad por inactividad.
pub struct SessionStore {
    sessions: Mutex<HashMap<String, Session>>,
    ttl: chrono::Duration,
}

impl SessionStore {
    pub fn new(ttl: chrono::Duration) -> Self {
        Self { sessions: Mutex::new(HashMap::new()), ttl }
    }

    /// Identificador nuevo para una sesión que aún no existe.
    pub fn new_id() -> String {
        Uuid::new_v4().to_string()
    }

    /// Devuelve la conversación de `id`, creándola con `create` si no existe.
    /// Antes barre las sesiones inactivas.
    pub fn get_or_create(&self, id: &str, create: impl FnOnce() -> Conversation) -> SharedConversation {
        let now = Utc::now();
        let mut sessions = self.sessions.lock();
        self.sweep(&mut sessions, now);
        let session = sessions.entry(id.to_string()).or_insert_with(|| {
            tracing::debug!(session = id, "Sesión creada");
            Session { conversation: Arc::new(tokio::sync::Mutex::new(create())), touched: now }
        });
        session.touched = now;
        session.conversation.clone()
    }

    /// Descarta una sesión. `true` si existía.
    pub fn remove(&self, id: &str) -> bool {
        self.sessions.lock().remove(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.sessions.lock().len()
    }

    fn sweep(&self, sessions: &mut HashMap<String, Session>, now: DateTime<Utc>) {
        let before = sessions.len();
        sessions.retain(|_, s| now - s.touched <= self.ttl);
        let expired = before - sessions.len();
        if expired > 0 {
            tracing::debug!(expired, "Sesiones inactivas descartadas");
        }
    }
}

/// Estado compartido de la aplicación Axum.
#[derive(Clone)]
pub struct AppState {
    pub tables: Arc<ReferenceTables>,
    pub report: LoadReport,
    pub classifier: Arc<dyn CaseClassifier>,
    pub sessions: Arc<SessionStore>,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(
        tables: ReferenceTables,
        report: LoadReport,
        classifier: Arc<dyn CaseClassifier>,
        config: Config,
    ) -> Self {
        Self {
            tables: Arc::new(tables),
            report,
            classifier,
            sessions: Arc::new(SessionStore::new(config.session_ttl)),
            config: Arc::new(config),
        }
    }

    /// Conversación de la sesión `id`, nueva si no existía o había caducado.
    pub fn conversation(&self, id: &str) -> SharedConversation {
        self.sessions.get_or_create(id, || {
            Conversation::new(self.tables.clone(), self.classifier.clone(), self.config.classifier_timeout)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::tables::fixtures;
    use crate::nlu::KeywordClassifier;

    fn state_with_ttl(ttl: chrono::Duration) -> AppState {
        let config = Config { session_ttl: ttl, ..Config::default() };
        AppState::new(fixtures::sample(), LoadReport::default(), Arc::new(KeywordClassifier), config)
    }

    #[tokio::test]
    async fn same_id_returns_same_conversation() {
        let state = state_with_ttl(chrono::Duration::minutes(30));
        let first = state.conversation("abc");
        first.lock().await.process_message("quiero denunciar un hurto").await;

        let again = state.conversation("abc");
        assert!(Arc::ptr_eq(&first, &again));
        assert!(again.lock().await.case().category.is_some());
        assert_eq!(state.sessions.len(), 1);
    }

    #[test]
    fn expired_sessions_are_swept_on_access() {
        let state = state_with_ttl(chrono::Duration::zero());
        let first = state.conversation("abc");
        std::thread::sleep(std::time::Duration::from_millis(5));
        let second = state.conversation("xyz");
        assert!(!Arc::ptr_eq(&first, &second));
        assert_eq!(state.sessions.len(), 1);
    }

    #[test]
    fn remove_reports_existence() {
        let state = state_with_ttl(chrono::Duration::minutes(30));
        state.conversation("abc");
        assert!(state.sessions.remove("abc"));
        assert!(!state.sessions.remove("abc"));
        assert_ne!(SessionStore::new_id(), SessionStore::new_id());
    }
}
