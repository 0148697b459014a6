//! # Motor de Derivación — `resolve(contexto) → resultado`
//!
//! Función pura y total: mismo contexto y mismas tablas, mismo resultado.
//! Nunca muta el [`CaseContext`]; la conversación aplica las respuestas y
//! vuelve a llamar.
//!
//! ## Orden de Evaluación
//!
//! ```text
//! 1. ¿hay desambiguación pendiente?         → AskDistrictAmbiguous
//! 2. ¿falta la materia?                     → AskCategory
//! 3. ¿falta el distrito resuelto?           → AskDistrict
//! 4. ¿el delito admite vínculo, no hay
//!    respuesta y la política lo exige?      → AskLink
//! 5. RuleMatcher                            → Ok | NoMatch
//! ```

use serde::Serialize;

use super::policy::needs_link_question;
use super::rules::{MatchSource, RuleMatcher};
use crate::core::{CaseContext, District, LinkRequirement, Office, ReferenceTables};

/// Resultado de una evaluación del motor.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResolutionResult {
    Ok {
        office: Office,
        category: String,
        district: District,
        source: MatchSource,
    },
    AskCategory,
    AskDistrict,
    AskDistrictAmbiguous { candidates: Vec<District> },
    AskLink,
    NoMatch,
}

impl ResolutionResult {
    /// `Ok` y `NoMatch` terminan la consulta.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Ok { .. } | Self::NoMatch)
    }
}

/// Evalúa el contexto contra las tablas.
pub fn resolve(case: &CaseContext, tables: &ReferenceTables) -> ResolutionResult {
    if let Some(candidates) = case.pending_options.as_ref().filter(|c| !c.is_empty()) {
        return ResolutionResult::AskDistrictAmbiguous { candidates: candidates.clone() };
    }

    let Some(category) = case.category.as_deref() else {
        return ResolutionResult::AskCategory;
    };

    let Some(district) = case.district.as_ref() else {
        return ResolutionResult::AskDistrict;
    };

    let requirement = case
        .offense
        .as_deref()
        .and_then(|o| tables.competency_by_offense(o))
        .map_or(LinkRequirement::No, |c| c.link_requirement);
    if case.link_answer.is_none() && needs_link_question(requirement, district) {
        return ResolutionResult::AskLink;
    }

    match RuleMatcher::new(tables).find(category, district, case.link_answer) {
        Some(m) => {
            tracing::info!(
                category,
                district = %district.label(),
                office = %m.office.code,
                source = ?m.source,
                "Fiscalía resuelta"
            );
            ResolutionResult::Ok {
                office: m.office.clone(),
                category: category.to_string(),
                district: district.clone(),
                source: m.source,
            }
        }
        None => ResolutionResult::NoMatch,
    }
}
