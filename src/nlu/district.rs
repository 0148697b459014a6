//! # Resolutor de Distritos — Del Texto Libre al Registro Oficial
//!
//! El [`DistrictResolver`] convierte lo que el ciudadano escribe como lugar
//! ("en los baños", "Bambamarca", "cajamarka") en cero, uno o varios
//! registros [`District`].
//!
//! ## Etapas (la primera que acierta termina)
//!
//! | Etapa | Estrategia | Ejemplo |
//! |-------|-----------|---------|
//! | 1 | Alias exacto → reinicia con el destino | "Los Baños" → "Baños del Inca" |
//! | 2 | Nombre exacto (sin artículo ni paréntesis) | "Bambamarca (Hualgayoc)" |
//! | 3 | Contención por palabras completas | "me robaron en Chota ayer" |
//! | 4 | Levenshtein ≤ 2, mínimo único | "Cajamarka" → "Cajamarca" |
//!
//! ## Nunca Adivinar
//!
//! Hay distritos homónimos en provincias distintas. Cualquier empate real
//! (dos nombres exactos, dos contenciones, dos distancias mínimas iguales)
//! se devuelve como [`DistrictMatch::Ambiguous`] para que la conversación
//! pregunte, en lugar de derivar al ciudadano a la fiscalía equivocada.

use strsim::levenshtein;

use crate::core::text;
use crate::core::{District, ReferenceTables};

/// Máximo de candidatos ofrecidos en una desambiguación.
pub const MAX_CANDIDATES: usize = 5;

/// Distancia de edición máxima aceptada en la etapa difusa.
pub const MAX_EDIT_DISTANCE: usize = 2;

/// Longitud mínima (en caracteres) para intentar contención inversa o
/// coincidencia difusa. Con menos, casi cualquier nombre estaría "cerca".
const MIN_FUZZY_LEN: usize = 4;

/// Saltos de alias permitidos; protege contra alias cíclicos en la hoja.
const MAX_ALIAS_HOPS: usize = 3;

/// Palabras iniciales que se ignoran al comparar nombres.
const LEADING_WORDS: &[&str] = &["el", "la", "los", "las", "en", "distrito", "de", "del"];

/// Resultado de resolver un texto de lugar.
#[derive(Clone, Debug, PartialEq)]
pub enum DistrictMatch {
    None,
    Unique(District),
    /// Candidatos en orden de la tabla de origen, como máximo [`MAX_CANDIDATES`].
    Ambiguous(Vec<District>),
}

/// Nombre de distrito precomputado en sus formas de comparación.
struct NameKey<'a> {
    district: &'a District,
    /// Nombre simplificado completo ("la encanada").
    full: String,
    /// Nombre sin palabras iniciales ("encanada").
    bare: String,
    province: String,
}

/// Resolutor de distritos sobre unas tablas de referencia.
///
/// Las claves de comparación se calculan una sola vez en [`new()`](Self::new).
pub struct DistrictResolver<'a> {
    tables: &'a ReferenceTables,
    keys: Vec<NameKey<'a>>,
}

impl<'a> DistrictResolver<'a> {
    pub fn new(tables: &'a ReferenceTables) -> Self {
        let keys = tables
            .districts
            .iter()
            .map(|district| {
                let full = text::simplify(&district.name);
                NameKey {
                    district,
                    bare: strip_leading_words(&full),
                    full,
                    province: text::simplify(&district.province),
                }
            })
            .collect();
        Self { tables, keys }
    }

    /// Resuelve un texto de lugar. Función total: entrada vacía o sin
    /// coincidencias devuelve [`DistrictMatch::None`].
    pub fn resolve(&self, raw: &str) -> DistrictMatch {
        let mut current = raw.to_string();

        for hop in 0..=MAX_ALIAS_HOPS {
            let (base, qualifier) = split_qualifier(&current);
            if base.is_empty() {
                return DistrictMatch::None;
            }

            if hop < MAX_ALIAS_HOPS {
                if let Some(target) = self.alias_target(&base) {
                    tracing::debug!(alias = %base, target = %target, "Alias de distrito aplicado");
                    current = match qualifier {
                        Some(q) => format!("{} ({})", target, q),
                        None => target.to_string(),
                    };
                    continue;
                }
            }

            return self.match_names(&base, qualifier.as_deref());
        }

        DistrictMatch::None
    }

    /// Destino del alias cuyo texto coincide exactamente con `base`
    /// (con o sin palabras iniciales). Ignora alias que apuntan a sí mismos.
    fn alias_target(&self, base: &str) -> Option<&'a str> {
        let bare = strip_leading_words(base);
        self.tables
            .aliases
            .iter()
            .find(|a| {
                let alias = text::simplify(&a.alias);
                !alias.is_empty() && (alias == base || alias == bare)
            })
            .map(|a| a.target.as_str())
            .filter(|target| text::simplify(target) != base)
    }

    fn match_names(&self, base: &str, qualifier: Option<&str>) -> DistrictMatch {
        let bare = strip_leading_words(base);

        // ─── Etapa 2: nombre exacto ──────────────────────────────
        let mut exact: Vec<&NameKey> = self
            .keys
            .iter()
            .filter(|k| k.full == base || (!bare.is_empty() && k.bare == bare))
            .collect();
        if let Some(q) = qualifier {
            let narrowed: Vec<&NameKey> = exact
                .iter()
                .copied()
                .filter(|k| k.province == q || k.full == q)
                .collect();
            if !narrowed.is_empty() {
                exact = narrowed;
            }
        }
        if !exact.is_empty() {
            tracing::debug!(input = %base, hits = exact.len(), "Distrito por nombre exacto");
            return to_match(exact);
        }

        // ─── Etapa 3: contención por palabras completas ──────────
        let contained: Vec<&NameKey> = self
            .keys
            .iter()
            .filter(|k| {
                text::contains_phrase(base, &k.full)
                    || (bare.chars().count() >= MIN_FUZZY_LEN && text::contains_phrase(&k.full, &bare))
            })
            .collect();
        if !contained.is_empty() {
            let pruned = prune_containment(contained, base);
            tracing::debug!(input = %base, hits = pruned.len(), "Distrito por contención");
            return to_match(pruned);
        }

        // ─── Etapa 4: distancia de edición acotada ───────────────
        if bare.chars().count() < MIN_FUZZY_LEN {
            return DistrictMatch::None;
        }
        let scored: Vec<(&NameKey, usize)> = self
            .keys
            .iter()
            .map(|k| (k, levenshtein(&bare, &k.bare).min(levenshtein(base, &k.full))))
            .collect();
        let Some(best) = scored.iter().map(|(_, d)| *d).min() else {
            return DistrictMatch::None;
        };
        if best > MAX_EDIT_DISTANCE {
            return DistrictMatch::None;
        }
        let nearest: Vec<&NameKey> = scored
            .into_iter()
            .filter(|(_, d)| *d == best)
            .map(|(k, _)| k)
            .collect();
        tracing::debug!(input = %base, distance = best, hits = nearest.len(), "Distrito por similitud");
        to_match(nearest)
    }
}

/// Depura los candidatos de contención:
///
/// 1. Descarta nombres contenidos en otro candidato más largo
///    ("inca" frente a "baños del inca").
/// 2. Descarta un candidato cuyo nombre es la provincia de otro candidato
///    ("cajamarca" en "baños del inca, cajamarca").
/// 3. Si el texto menciona la provincia de algunos homónimos, se queda con ellos.
fn prune_containment<'k, 'a>(candidates: Vec<&'k NameKey<'a>>, input: &str) -> Vec<&'k NameKey<'a>> {
    let longest: Vec<&NameKey> = candidates
        .iter()
        .copied()
        .filter(|k| {
            !candidates
                .iter()
                .any(|other| other.full != k.full && text::contains_phrase(&other.full, &k.full))
        })
        .collect();

    let without_provinces: Vec<&NameKey> = longest
        .iter()
        .copied()
        .filter(|k| {
            !longest
                .iter()
                .any(|other| other.full != k.full && other.province == k.full)
        })
        .collect();
    let remaining = if without_provinces.is_empty() { longest } else { without_provinces };

    if remaining.len() > 1 {
        let by_province: Vec<&NameKey> = remaining
            .iter()
            .copied()
            .filter(|k| !k.province.is_empty() && k.province != k.full && text::contains_phrase(input, &k.province))
            .collect();
        if !by_province.is_empty() {
            return by_province;
        }
    }
    remaining
}

fn to_match(keys: Vec<&NameKey>) -> DistrictMatch {
    match keys.as_slice() {
        [] => DistrictMatch::None,
        [only] => DistrictMatch::Unique(only.district.clone()),
        many => DistrictMatch::Ambiguous(
            many.iter()
                .take(MAX_CANDIDATES)
                .map(|k| k.district.clone())
                .collect(),
        ),
    }
}

/// Separa un calificador entre paréntesis: "Bambamarca (Hualgayoc)" →
/// ("bambamarca", Some("hualgayoc")). Ambas partes salen simplificadas.
fn split_qualifier(raw: &str) -> (String, Option<String>) {
    let normalized = text::normalize(raw);
    match (normalized.find('('), normalized.rfind(')')) {
        (Some(open), Some(close)) if open < close => {
            let inner = text::simplify(&normalized[open + 1..close]);
            let outer = format!("{} {}", &normalized[..open], &normalized[close + 1..]);
            let qualifier = (!inner.is_empty()).then_some(inner);
            (text::simplify(&outer), qualifier)
        }
        _ => (text::simplify(&normalized), None),
    }
}

fn strip_leading_words(simplified: &str) -> String {
    let words: Vec<&str> = simplified.split(' ').collect();
    let skip = words
        .iter()
        .take_while(|w| LEADING_WORDS.contains(w))
        .count();
    // Un nombre formado solo por palabras iniciales se deja intacto.
    if skip == words.len() {
        return simplified.to_string();
    }
    words[skip..].join(" ")
}
