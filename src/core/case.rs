//! # Contexto del Caso — Lo que Sabemos de la Consulta Actual
//!
//! Un [`CaseContext`] acumula los datos confirmados de **una** consulta
//! ciudadana: materia, delito, distrito y respuesta sobre el vínculo
//! familiar. Lo posee la conversación; el motor de derivación solo lo lee.
//!
//! ## Ciclo de Vida
//!
//! ```text
//! primer relato ──► CaseContext::new()
//!                        │  (cada componente completa sus campos)
//!                        ▼
//!                 resultado terminal (OK / NO_MATCH)
//!                        │  "nuevo caso"
//!                        ▼
//!                 CaseContext::new()  ← reemplazo completo, sin arrastrar campos
//! ```

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::tables::{District, ReferenceTables};
use super::text;

/// Respuesta del ciudadano a "¿el denunciado es su familiar o pareja?".
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum LinkAnswer {
    Si,
    No,
}

/// Estado mutable de una consulta en curso.
#[derive(Clone, Debug, Serialize)]
pub struct CaseContext {
    /// Materia detectada (o materia final tras la respuesta de vínculo).
    pub category: Option<String>,
    /// Delito específico de la hoja de competencias, si se identificó.
    pub offense: Option<String>,
    /// Texto de lugar tal como llegó (del ciudadano o del clasificador).
    pub raw_district: Option<String>,
    /// Distrito resuelto de forma única.
    pub district: Option<District>,
    pub link_answer: Option<LinkAnswer>,
    /// Candidatos ofrecidos en una pregunta de desambiguación.
    pub pending_options: Option<Vec<District>>,
    /// Relato acumulado mientras la materia sigue sin identificarse.
    pub narrative: String,
    /// Resumen ciudadano sugerido por el clasificador externo.
    pub summary: Option<String>,
    pub opened_at: DateTime<Utc>,
}

impl Default for CaseContext {
    fn default() -> Self {
        Self::new()
    }
}

impl CaseContext {
    pub fn new() -> Self {
        Self {
            category: None,
            offense: None,
            raw_district: None,
            district: None,
            link_answer: None,
            pending_options: None,
            narrative: String::new(),
            summary: None,
            opened_at: Utc::now(),
        }
    }

    /// Añade un fragmento de relato al texto acumulado.
    pub fn append_narrative(&mut self, utterance: &str) {
        let utterance = utterance.trim();
        if utterance.is_empty() {
            return;
        }
        if !self.narrative.is_empty() {
            self.narrative.push(' ');
        }
        self.narrative.push_str(utterance);
    }

    /// Fija el distrito resuelto y descarta cualquier desambiguación pendiente.
    pub fn set_district(&mut self, district: District) {
        self.pending_options = None;
        self.district = Some(district);
    }

    /// Registra la respuesta de vínculo familiar.
    ///
    /// Con `Si`, la materia se reemplaza **en el mismo paso** por la
    /// "categoría si familiar" del delito, cuando la hoja la declara. Así
    /// el contexto nunca queda con `Si` y una materia final pendiente.
    pub fn record_link_answer(&mut self, answer: LinkAnswer, tables: &ReferenceTables) {
        self.link_answer = Some(answer);
        if answer != LinkAnswer::Si {
            return;
        }
        let familial = self
            .offense
            .as_deref()
            .and_then(|offense| tables.competency_by_offense(offense))
            .map(|c| c.category_if_familial.as_str())
            .filter(|c| !text::is_blank(c));
        if let Some(category) = familial {
            tracing::debug!(category, "Materia final por vínculo familiar");
            self.category = Some(category.to_string());
        }
    }
}
