//! # Orquestador — La Conversación con el Ciudadano
//!
//! Una [`Conversation`] rige el diálogo de **una** sesión: recibe un mensaje
//! por turno, actualiza el [`CaseContext`], consulta al motor de derivación
//! y devuelve una [`Reply`] con el texto y los botones a mostrar.
//!
//! ## Estados
//!
//! ```text
//!                      ┌──────────────────────────────┐
//!                      ▼                              │ "nuevo caso"
//!            AwaitingNarrative ──┬──► AwaitingDistrict ──┐
//!                 │  ▲ (falta    ├──► AwaitingDisambiguation ─┤
//!                 │  └ materia)  ├──► AwaitingLink ───────────┤
//!                 │              │                            ▼
//!                 └──────────────┴──────────────► Resolved | NoMatch
//! ```
//!
//! | Estado | El mensaje se interpreta como |
//! |--------|-------------------------------|
//! | `AwaitingNarrative` | relato (clasificador externo + materia + lugar) |
//! | `AwaitingDistrict` | nombre de distrito |
//! | `AwaitingDisambiguation` | elección entre candidatos |
//! | `AwaitingLink` | sí / no |
//! | `Resolved` / `NoMatch` | solo "nuevo caso" abre otra consulta |
//!
//! ## Re-evaluación
//!
//! Tras cada respuesta se llama a [`resolve`]. Si el motor pide un distrito
//! y quedan lugares mencionados antes (relato o pista externa) sin probar,
//! se prueban en orden hasta que uno nombre un distrito y se vuelve a
//! evaluar, con un máximo de [`MAX_REEVALUATIONS`] evaluaciones por turno.
//! La cola guarda solo los últimos lugares; si ninguno sirve, se prueba el
//! relato acumulado completo.
//!
//! ## Clasificador Externo
//!
//! Es la única operación que suspende. Cada llamada se limita con
//! `tokio::time::timeout`; fallos y vencimientos se registran y la
//! conversación sigue con las señales deterministas.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::core::{CaseContext, Office, ReferenceTables};
use crate::derivation::{resolve, ResolutionResult};
use crate::nlu::category::CategoryClassifier;
use crate::nlu::district::{DistrictMatch, DistrictResolver};
use crate::nlu::external::{CaseClassifier, ClassifierHints, PriorHints};
use crate::nlu::intent::{select_candidate, Intent, IntentClassifier};
use crate::nlu::question::{Prompt, QuestionGenerator};

/// Evaluaciones del motor por turno, como máximo.
pub const MAX_REEVALUATIONS: usize = 4;

/// Lugares mencionados que se guardan para probar más tarde.
const MAX_PENDING_LOCATIONS: usize = 4;

/// Estado de la conversación. Conjunto cerrado.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversationState {
    AwaitingNarrative,
    AwaitingDistrict,
    AwaitingDisambiguation,
    AwaitingLink,
    Resolved,
    NoMatch,
}

impl ConversationState {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Resolved | Self::NoMatch)
    }

    /// Tabla de transiciones permitidas. Volver a `AwaitingNarrative`
    /// (nuevo caso) siempre está permitido.
    pub fn can_transition_to(self, next: Self) -> bool {
        use ConversationState::*;
        match (self, next) {
            (_, AwaitingNarrative) => true,
            (AwaitingNarrative, _) => true,
            (AwaitingDistrict, AwaitingDistrict | AwaitingDisambiguation | AwaitingLink | Resolved | NoMatch) => true,
            (AwaitingDisambiguation, AwaitingDistrict | AwaitingDisambiguation | AwaitingLink | Resolved | NoMatch) => {
                true
            }
            (AwaitingLink, AwaitingLink | Resolved | NoMatch) => true,
            (AwaitingLink, AwaitingDistrict | AwaitingDisambiguation) => false,
            (Resolved | NoMatch, _) => false,
        }
    }

    /// Estado que corresponde a un resultado del motor.
    fn after(result: &ResolutionResult) -> Self {
        match result {
            ResolutionResult::Ok { .. } => Self::Resolved,
            ResolutionResult::NoMatch => Self::NoMatch,
            ResolutionResult::AskCategory => Self::AwaitingNarrative,
            ResolutionResult::AskDistrict => Self::AwaitingDistrict,
            ResolutionResult::AskDistrictAmbiguous { .. } => Self::AwaitingDisambiguation,
            ResolutionResult::AskLink => Self::AwaitingLink,
        }
    }
}

/// Respuesta de un turno.
#[derive(Clone, Debug, Serialize)]
pub struct Reply {
    pub text: String,
    pub quick_replies: Vec<String>,
    pub state: ConversationState,
    /// Resultado del motor en este turno, si se evaluó.
    pub outcome: Option<ResolutionResult>,
}

/// Pregunta emitida en el último turno, para el anti-bucle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Asked {
    Category,
    District,
    Disambiguation,
    Link,
}

/// Diálogo de una sesión.
pub struct Conversation {
    tables: Arc<ReferenceTables>,
    classifier: Arc<dyn CaseClassifier>,
    classifier_timeout: Duration,
    intents: IntentClassifier,
    questions: QuestionGenerator,
    state: ConversationState,
    case: CaseContext,
    /// Textos de lugar aún no probados, en orden de llegada.
    pending_locations: VecDeque<String>,
    last_asked: Option<Asked>,
    repeats: u32,
    last_office: Option<Office>,
    last_active: DateTime<Utc>,
}

impl Conversation {
    pub fn new(
        tables: Arc<ReferenceTables>,
        classifier: Arc<dyn CaseClassifier>,
        classifier_timeout: Duration,
    ) -> Self {
        Self {
            tables,
            classifier,
            classifier_timeout,
            intents: IntentClassifier::new(),
            questions: QuestionGenerator::new(),
            state: ConversationState::AwaitingNarrative,
            case: CaseContext::new(),
            pending_locations: VecDeque::new(),
            last_asked: None,
            repeats: 0,
            last_office: None,
            last_active: Utc::now(),
        }
    }

    pub fn state(&self) -> ConversationState {
        self.state
    }

    pub fn case(&self) -> &CaseContext {
        &self.case
    }

    pub fn last_active(&self) -> DateTime<Utc> {
        self.last_active
    }

    /// Descarta la consulta en curso. El contexto se reemplaza entero.
    pub fn reset(&mut self) {
        self.case = CaseContext::new();
        self.pending_locations.clear();
        self.last_asked = None;
        self.repeats = 0;
        self.last_office = None;
        self.transition(ConversationState::AwaitingNarrative);
    }

    /// Procesa un mensaje del ciudadano.
    pub async fn process_message(&mut self, message: &str) -> Reply {
        self.last_active = Utc::now();
        let message = message.trim();
        if message.is_empty() {
            return self.reply(self.questions.empty_message(), None);
        }

        let intent = self.intents.classify(message);
        if intent == Intent::NewCase {
            tracing::debug!(from = ?self.state, "Nuevo caso");
            self.reset();
            return self.reply(self.questions.ask_narrative(), None);
        }

        match self.state {
            ConversationState::Resolved | ConversationState::NoMatch => {
                let prompt = self.questions.terminal_reminder(self.last_office.as_ref());
                return self.reply(prompt, None);
            }
            ConversationState::AwaitingNarrative => {
                if intent == Intent::Greeting && self.case.narrative.is_empty() {
                    return self.reply(self.questions.welcome(), None);
                }
                self.on_narrative(message).await;
            }
            ConversationState::AwaitingDistrict => {
                self.pending_locations.clear();
                self.apply_location(message);
            }
            ConversationState::AwaitingDisambiguation => self.on_selection(message),
            ConversationState::AwaitingLink => {
                if let Some(answer) = intent.link_answer() {
                    self.case.record_link_answer(answer, &self.tables);
                }
            }
        }

        let result = self.advance();
        self.respond(result)
    }

    // ─── Handlers por estado ─────────────────────────────────────

    async fn on_narrative(&mut self, message: &str) {
        self.case.append_narrative(message);
        self.remember_location(message.to_string());

        let narrative = self.case.narrative.clone();
        let hints = self.consult_classifier(&narrative).await;
        if let Some(summary) = hints.summary {
            self.case.summary = Some(summary);
        }
        if let Some(hint) = hints.district_hint {
            self.remember_location(hint);
        }

        let classifier = CategoryClassifier::new(&self.tables);
        if let Some(found) = classifier.classify(&narrative, hints.offense.as_deref()) {
            self.case.category = Some(found.category);
            self.case.offense = Some(found.offense);
        } else if let Some(category) = hints.category.as_deref().and_then(|c| self.tables.canonical_category(c)) {
            tracing::debug!(category, "Materia tomada de la pista externa");
            self.case.category = Some(category.to_string());
        }
    }

    fn on_selection(&mut self, message: &str) {
        let options = self.case.pending_options.clone().unwrap_or_default();
        if let Some(idx) = select_candidate(message, &options) {
            self.case.set_district(options[idx].clone());
            return;
        }
        // Puede haber escrito otro distrito en lugar de elegir.
        if let DistrictMatch::Unique(district) = DistrictResolver::new(&self.tables).resolve(message) {
            self.case.raw_district = Some(message.to_string());
            self.case.set_district(district);
        }
    }

    async fn consult_classifier(&self, text: &str) -> ClassifierHints {
        let prior = PriorHints {
            category: self.case.category.clone(),
            district: self.case.district.as_ref().map(|d| d.label()),
            state: format!("{:?}", self.state),
        };
        let name = self.classifier.name();
        match tokio::time::timeout(self.classifier_timeout, self.classifier.classify(text, &prior)).await {
            Ok(Ok(hints)) => hints,
            Ok(Err(e)) => {
                tracing::warn!(classifier = name, error = %e, "Clasificador externo falló, se continúa sin pistas");
                ClassifierHints::default()
            }
            Err(_) => {
                tracing::warn!(
                    classifier = name,
                    timeout_ms = self.classifier_timeout.as_millis() as u64,
                    "Clasificador externo sin respuesta, se continúa sin pistas"
                );
                ClassifierHints::default()
            }
        }
    }

    // ─── Lugar ───────────────────────────────────────────────────

    fn remember_location(&mut self, raw: String) {
        if self.pending_locations.len() == MAX_PENDING_LOCATIONS {
            self.pending_locations.pop_front();
        }
        self.pending_locations.push_back(raw);
    }

    /// Resuelve un texto de lugar y lo aplica al contexto. `false` si no
    /// nombra ningún distrito conocido.
    fn apply_location(&mut self, raw: &str) -> bool {
        match DistrictResolver::new(&self.tables).resolve(raw) {
            DistrictMatch::Unique(district) => self.case.set_district(district),
            DistrictMatch::Ambiguous(candidates) => self.case.pending_options = Some(candidates),
            DistrictMatch::None => return false,
        }
        self.case.raw_district = Some(raw.to_string());
        true
    }

    /// Prueba los lugares guardados hasta que uno nombre un distrito. Si
    /// ninguno sirve, prueba el relato acumulado (una vez por turno): un
    /// lugar dicho varios turnos atrás puede haber salido de la cola.
    fn try_pending_locations(&mut self, narrative_tried: &mut bool) -> bool {
        while let Some(location) = self.pending_locations.pop_front() {
            if self.apply_location(&location) {
                return true;
            }
        }
        if *narrative_tried || self.case.narrative.is_empty() {
            return false;
        }
        *narrative_tried = true;
        let narrative = self.case.narrative.clone();
        let found = self.apply_location(&narrative);
        if found {
            tracing::debug!("Distrito tomado del relato acumulado");
        }
        found
    }

    /// Evalúa el contexto; mientras falte el distrito y algún lugar
    /// mencionado lo resuelva, re-evalúa.
    fn advance(&mut self) -> ResolutionResult {
        let mut result = resolve(&self.case, &self.tables);
        let mut narrative_tried = false;
        for _ in 1..MAX_REEVALUATIONS {
            if result != ResolutionResult::AskDistrict || !self.try_pending_locations(&mut narrative_tried) {
                break;
            }
            result = resolve(&self.case, &self.tables);
        }
        result
    }

    // ─── Salida ──────────────────────────────────────────────────

    fn respond(&mut self, result: ResolutionResult) -> Reply {
        let asked = match &result {
            ResolutionResult::AskCategory => Some(Asked::Category),
            ResolutionResult::AskDistrict => Some(Asked::District),
            ResolutionResult::AskDistrictAmbiguous { .. } => Some(Asked::Disambiguation),
            ResolutionResult::AskLink => Some(Asked::Link),
            ResolutionResult::Ok { .. } | ResolutionResult::NoMatch => None,
        };
        self.repeats = if asked.is_some() && asked == self.last_asked { self.repeats + 1 } else { 0 };
        self.last_asked = asked;
        let attempt = self.repeats;

        let prompt = match &result {
            ResolutionResult::AskCategory => self.questions.ask_category(attempt),
            ResolutionResult::AskDistrict => self.questions.ask_district(attempt),
            ResolutionResult::AskDistrictAmbiguous { candidates } => {
                self.questions.ask_disambiguation(candidates, attempt)
            }
            ResolutionResult::AskLink => self.questions.ask_link(attempt),
            ResolutionResult::Ok { office, .. } => {
                self.last_office = Some(office.clone());
                self.questions.resolved(&self.case, office)
            }
            ResolutionResult::NoMatch => self.questions.no_match(&self.case),
        };

        self.transition(ConversationState::after(&result));
        self.reply(prompt, Some(result))
    }

    fn transition(&mut self, next: ConversationState) {
        if !self.state.can_transition_to(next) {
            tracing::warn!(from = ?self.state, to = ?next, "Transición no prevista");
        }
        if self.state != next {
            tracing::debug!(from = ?self.state, to = ?next, "Transición de estado");
        }
        self.state = next;
    }

    fn reply(&self, prompt: Prompt, outcome: Option<ResolutionResult>) -> Reply {
        Reply {
            text: prompt.text,
            quick_replies: prompt.quick_replies,
            state: self.state,
            outcome,
        }
    }
}
