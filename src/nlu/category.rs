//! # Clasificador de Materia — Del Relato al Delito de la Hoja
//!
//! El [`CategoryClassifier`] identifica la materia (y, cuando puede, el
//! delito específico) a partir del relato del ciudadano, usando **solo**
//! la hoja de competencias. Es deliberadamente conservador: ante la duda
//! devuelve `None` y la conversación pide más detalles.
//!
//! ## Etapas
//!
//! ```text
//! (relato, delito explícito?)
//!   ├── 1. Delito explícito == delito de la hoja      → esa fila (siempre gana)
//!   ├── 2. Relato contiene el nombre de un delito      → el nombre MÁS LARGO
//!   └── 3. Solapamiento de tokens con la descripción
//!         ├── < 3 tokens de contenido                  → None (sin puntuar)
//!         ├── compartidos ≥ 4 y razón ≥ 0.33           → candidato
//!         └── mejor vs segundo < 0.05                  → None (casi empate)
//! ```
//!
//! La razón es `compartidos / min(tokens del relato, 12)`: un relato largo
//! no se penaliza por encima de doce palabras de contenido.

use crate::core::text;
use crate::core::{Competency, ReferenceTables};

/// Tokens de contenido mínimos para intentar el solapamiento.
pub const MIN_INPUT_TOKENS: usize = 3;

/// Tokens compartidos mínimos para aceptar un candidato.
pub const MIN_SHARED_TOKENS: usize = 4;

/// Tope del denominador de la razón de solapamiento.
pub const TOKEN_CAP: usize = 12;

/// Razón mínima de solapamiento.
pub const MIN_RATIO: f32 = 0.33;

/// Diferencia mínima entre el mejor candidato y el segundo, sea cual sea
/// su materia: dos delitos de la misma materia pueden pedir distinto
/// vínculo o llevar a otra fiscalía.
pub const MIN_MARGIN: f32 = 0.05;

/// Materia y delito identificados.
#[derive(Clone, Debug, PartialEq)]
pub struct CategoryMatch {
    pub category: String,
    pub offense: String,
}

impl From<&Competency> for CategoryMatch {
    fn from(row: &Competency) -> Self {
        Self {
            category: row.category.clone(),
            offense: row.offense.clone(),
        }
    }
}

/// Candidato de la etapa de solapamiento.
struct Scored<'a> {
    row: &'a Competency,
    ratio: f32,
}

/// Clasificador de materia sobre la hoja de competencias.
pub struct CategoryClassifier<'a> {
    tables: &'a ReferenceTables,
}

impl<'a> CategoryClassifier<'a> {
    pub fn new(tables: &'a ReferenceTables) -> Self {
        Self { tables }
    }

    /// Clasifica un relato. `explicit_offense` es un nombre de delito
    /// proveniente de otra fuente (botón, clasificador externo).
    pub fn classify(&self, freetext: &str, explicit_offense: Option<&str>) -> Option<CategoryMatch> {
        // ─── 1. Delito explícito ──────────────────────────────────
        if let Some(row) = explicit_offense.and_then(|o| self.tables.competency_by_offense(o)) {
            tracing::debug!(offense = %row.offense, "Materia por delito explícito");
            return Some(row.into());
        }

        // ─── 2. Nombre de delito dentro del relato ───────────────
        if let Some(row) = self.longest_contained_offense(freetext) {
            tracing::debug!(offense = %row.offense, "Materia por nombre de delito en el relato");
            return Some(row.into());
        }

        // ─── 3. Solapamiento de tokens ───────────────────────────
        self.token_overlap(freetext)
    }

    fn longest_contained_offense(&self, freetext: &str) -> Option<&'a Competency> {
        let haystack = text::simplify(freetext);
        if haystack.is_empty() {
            return None;
        }
        let mut best: Option<(&'a Competency, usize)> = None;
        for row in &self.tables.competencies {
            let name = text::simplify(&row.offense);
            if name.is_empty() || !text::contains_phrase(&haystack, &name) {
                continue;
            }
            let len = name.chars().count();
            // Estrictamente mayor: ante igual longitud gana la primera fila.
            if best.map_or(true, |(_, best_len)| len > best_len) {
                best = Some((row, len));
            }
        }
        best.map(|(row, _)| row)
    }

    fn token_overlap(&self, freetext: &str) -> Option<CategoryMatch> {
        let input = text::content_tokens(freetext);
        if input.len() < MIN_INPUT_TOKENS {
            return None;
        }
        let denominator = input.len().min(TOKEN_CAP) as f32;

        let mut qualifying: Vec<Scored> = self
            .tables
            .competencies
            .iter()
            .filter_map(|row| {
                let description = text::content_tokens(&row.description);
                let shared = input.intersection(&description).count();
                let ratio = shared as f32 / denominator;
                (shared >= MIN_SHARED_TOKENS && ratio >= MIN_RATIO).then_some(Scored { row, ratio })
            })
            .collect();

        // Orden estable: en empate exacto se conserva el orden de la hoja.
        qualifying.sort_by(|a, b| b.ratio.partial_cmp(&a.ratio).unwrap_or(std::cmp::Ordering::Equal));

        let best = qualifying.first()?;
        if let Some(rival) = qualifying.get(1) {
            if best.ratio - rival.ratio < MIN_MARGIN {
                tracing::debug!(
                    best = %best.row.offense,
                    rival = %rival.row.offense,
                    "Casi empate entre delitos, sin clasificar"
                );
                return None;
            }
        }

        tracing::debug!(offense = %best.row.offense, ratio = best.ratio, "Materia por solapamiento");
        Some(best.row.into())
    }
}
