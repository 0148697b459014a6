//! # Intención de la Respuesta — ¿Qué Quiso Decir el Ciudadano?
//!
//! El [`IntentClassifier`] interpreta respuestas cortas: saludos, la señal
//! de "nuevo caso", y el sí/no de la pregunta de vínculo familiar.
//!
//! | Intent | Significado | Ejemplo |
//! |--------|-------------|---------|
//! | [`NewCase`](Intent::NewCase) | Empezar otra consulta | "Nuevo caso", "Denuncia" |
//! | [`Greeting`](Intent::Greeting) | Solo saluda | "hola, buenas tardes" |
//! | [`Confirming`](Intent::Confirming) | Responde sí | "sí, es mi pareja" |
//! | [`Denying`](Intent::Denying) | Responde no | "no, es un desconocido" |
//! | [`Narrating`](Intent::Narrating) | Cualquier otra cosa | "me robaron el celular" |
//!
//! Todas las comparaciones pasan por [`text::simplify`]: "SÍ", "si" y "Sí."
//! son la misma respuesta.
//!
//! [`select_candidate`] resuelve la respuesta a una pregunta de
//! desambiguación (por posición, etiqueta o provincia).

use crate::core::lexicon::{
    is_greeting_word, GREETING_OPENERS, NOT_AN_ANSWER, NO_WORDS, YES_PHRASES, YES_WORDS,
};
use crate::core::text;
use crate::core::{District, LinkAnswer};

/// Intención de una respuesta del ciudadano.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Intent {
    NewCase,
    Greeting,
    Confirming,
    Denying,
    /// El default: relato, lugar o respuesta libre.
    Narrating,
}

impl Intent {
    /// Respuesta de vínculo familiar, si la intención la expresa.
    pub fn link_answer(self) -> Option<LinkAnswer> {
        match self {
            Self::Confirming => Some(LinkAnswer::Si),
            Self::Denying => Some(LinkAnswer::No),
            _ => None,
        }
    }
}

/// Mensajes completos que piden empezar otra consulta. Incluye los
/// payloads de los botones ("NUEVO_CASO", "DENUNCIA").
const NEW_CASE_PHRASES: &[&str] = &[
    "nuevo caso",
    "nueva consulta",
    "otro caso",
    "otra consulta",
    "denuncia",
    "nueva denuncia",
    "empezar de nuevo",
    "reiniciar",
    "get started",
];

/// Clasificador de intención por palabras clave (sin estado).
#[derive(Clone, Copy, Debug, Default)]
pub struct IntentClassifier;

impl IntentClassifier {
    pub fn new() -> Self {
        Self
    }

    /// Clasifica una respuesta. Siempre devuelve un valor; `Narrating` es
    /// el default.
    pub fn classify(&self, message: &str) -> Intent {
        let simple = text::simplify(message);
        if simple.is_empty() {
            return Intent::Narrating;
        }

        if NEW_CASE_PHRASES.contains(&simple.as_str()) {
            return Intent::NewCase;
        }

        let words: Vec<&str> = simple.split(' ').collect();

        if GREETING_OPENERS.contains(&words[0]) && words.iter().all(|w| is_greeting_word(w)) {
            return Intent::Greeting;
        }

        if NOT_AN_ANSWER.iter().any(|p| starts_with_phrase(&simple, p)) {
            return Intent::Narrating;
        }

        if YES_WORDS.contains(&words[0]) {
            return Intent::Confirming;
        }

        if NO_WORDS.contains(&words[0]) || starts_with_phrase(&simple, "para nada") {
            return Intent::Denying;
        }

        if YES_PHRASES.iter().any(|p| affirms(&simple, p)) {
            return Intent::Confirming;
        }

        Intent::Narrating
    }
}

/// La frase aparece y no está negada: "ya te dije que no es mi pareja"
/// no afirma nada.
fn affirms(simple: &str, phrase: &str) -> bool {
    text::contains_phrase(simple, phrase) && !text::contains_phrase(simple, &format!("no {phrase}"))
}

fn starts_with_phrase(simple: &str, phrase: &str) -> bool {
    simple == phrase || simple.starts_with(&format!("{phrase} "))
}

/// Ordinales aceptados como posición (1-based).
const ORDINALS: &[(&str, usize)] = &[
    ("uno", 1), ("primero", 1), ("primera", 1), ("primer", 1),
    ("dos", 2), ("segundo", 2), ("segunda", 2),
    ("tres", 3), ("tercero", 3), ("tercera", 3), ("tercer", 3),
    ("cuatro", 4), ("cuarto", 4), ("cuarta", 4),
    ("cinco", 5), ("quinto", 5), ("quinta", 5),
];

/// Palabras que pueden preceder a la posición: "la 2", "opción 1".
const POSITION_PREFIXES: &[&str] = &["el", "la", "opcion", "numero", "nro"];

/// Elige uno de los `candidates` ofrecidos en una desambiguación.
///
/// En orden: posición ("2", "la segunda", "1. Bambamarca (Hualgayoc)"),
/// etiqueta completa, provincia mencionada, nombre del distrito. Cada
/// criterio debe señalar **un solo** candidato; si no, `None`.
pub fn select_candidate(message: &str, candidates: &[District]) -> Option<usize> {
    let simple = text::simplify(message);
    if simple.is_empty() || candidates.is_empty() {
        return None;
    }

    if let Some(position) = leading_position(&simple) {
        if (1..=candidates.len()).contains(&position) {
            return Some(position - 1);
        }
    }

    if let Some(idx) = candidates.iter().position(|d| text::same(&d.label(), &simple)) {
        return Some(idx);
    }

    let by_province: Vec<usize> = candidates
        .iter()
        .enumerate()
        .filter(|(_, d)| text::contains_phrase(&simple, &text::simplify(&d.province)))
        .map(|(i, _)| i)
        .collect();
    if by_province.len() == 1 {
        return Some(by_province[0]);
    }

    let by_name: Vec<usize> = candidates
        .iter()
        .enumerate()
        .filter(|(_, d)| text::contains_phrase(&simple, &text::simplify(&d.name)))
        .map(|(i, _)| i)
        .collect();
    (by_name.len() == 1).then(|| by_name[0])
}

/// Posición indicada al inicio del mensaje, si la hay.
fn leading_position(simple: &str) -> Option<usize> {
    let mut words = simple.split(' ').skip_while(|w| POSITION_PREFIXES.contains(w));
    let first = words.next()?;
    if let Ok(n) = first.parse::<usize>() {
        return Some(n);
    }
    ORDINALS.iter().find(|(word, _)| *word == first).map(|(_, n)| *n)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::tables::fixtures;

    #[test]
    fn yes_no_variants() {
        let c = IntentClassifier::new();
        assert_eq!(c.classify("Sí"), Intent::Confirming);
        assert_eq!(c.classify("SI"), Intent::Confirming);
        assert_eq!(c.classify("sí, es mi esposo"), Intent::Confirming);
        assert_eq!(c.classify("claro"), Intent::Confirming);
        assert_eq!(c.classify("No."), Intent::Denying);
        assert_eq!(c.classify("no, era un desconocido"), Intent::Denying);
        assert_eq!(c.classify("para nada"), Intent::Denying);
    }

    #[test]
    fn uncertainty_is_not_a_denial() {
        let c = IntentClassifier::new();
        assert_eq!(c.classify("no sé"), Intent::Narrating);
        assert_eq!(c.classify("No estoy segura"), Intent::Narrating);
        assert_eq!(c.classify("no, señor"), Intent::Denying);
        assert_eq!(c.classify("No me acuerdo"), Intent::Narrating);
        assert_eq!(c.classify("no sabría decirle"), Intent::Narrating);
        assert_eq!(c.classify("no lo recuerdo bien"), Intent::Narrating);
    }

    #[test]
    fn negated_relationship_is_a_denial() {
        let c = IntentClassifier::new();
        assert_eq!(c.classify("no es mi pareja"), Intent::Denying);
        assert_eq!(c.classify("No es mi esposo."), Intent::Denying);
        assert_eq!(c.classify("no es mi familiar, es un vecino"), Intent::Denying);
        assert_eq!(c.classify("ya le dije que no es mi expareja"), Intent::Narrating);
        assert_eq!(c.classify("es mi conviviente"), Intent::Confirming);
        assert_eq!(c.classify("bueno, así es"), Intent::Confirming);
    }

    #[test]
    fn new_case_signals_include_button_payloads() {
        let c = IntentClassifier::new();
        assert_eq!(c.classify("Nuevo caso"), Intent::NewCase);
        assert_eq!(c.classify("NUEVO_CASO"), Intent::NewCase);
        assert_eq!(c.classify("DENUNCIA"), Intent::NewCase);
        // Una denuncia con contenido es relato, no un reinicio.
        assert_eq!(c.classify("denuncia por robo en Chota"), Intent::Narrating);
    }

    #[test]
    fn greeting_only_when_nothing_else_is_said() {
        let c = IntentClassifier::new();
        assert_eq!(c.classify("Hola"), Intent::Greeting);
        assert_eq!(c.classify("buenas tardes señor"), Intent::Greeting);
        assert_eq!(c.classify("hola, me robaron el celular"), Intent::Narrating);
    }

    #[test]
    fn link_answer_mapping() {
        assert_eq!(Intent::Confirming.link_answer(), Some(LinkAnswer::Si));
        assert_eq!(Intent::Denying.link_answer(), Some(LinkAnswer::No));
        assert_eq!(Intent::Narrating.link_answer(), None);
    }

    #[test]
    fn select_candidate_by_position() {
        let tables = fixtures::sample();
        let options = vec![tables.districts[2].clone(), tables.districts[3].clone()];
        assert_eq!(select_candidate("2", &options), Some(1));
        assert_eq!(select_candidate("la primera", &options), Some(0));
        assert_eq!(select_candidate("1. Bambamarca (Hualgayoc)", &options), Some(0));
        assert_eq!(select_candidate("3", &options), None);
    }

    #[test]
    fn select_candidate_by_label_or_province() {
        let tables = fixtures::sample();
        let options = vec![tables.districts[2].clone(), tables.districts[3].clone()];
        assert_eq!(select_candidate("Bambamarca (Bolívar)", &options), Some(1));
        assert_eq!(select_candidate("la de hualgayoc", &options), Some(0));
        assert_eq!(select_candidate("bolivar", &options), Some(1));
    }

    #[test]
    fn select_candidate_rejects_non_distinguishing_terms() {
        let tables = fixtures::sample();
        let options = vec![tables.districts[2].clone(), tables.districts[3].clone()];
        assert_eq!(select_candidate("Bambamarca", &options), None);
        assert_eq!(select_candidate("no sé", &options), None);
        assert_eq!(select_candidate("", &options), None);
    }

    #[test]
    fn select_candidate_by_name_when_names_differ() {
        let tables = fixtures::sample();
        let options = vec![tables.districts[5].clone(), tables.districts[6].clone()];
        assert_eq!(select_candidate("Chota", &options), Some(1));
    }
}
