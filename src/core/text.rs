//! # Normalizador de Texto — Forma Canónica para Toda Comparación
//!
//! Todas las comparaciones del motor (distritos, alias, delitos, materias,
//! respuestas sí/no) pasan por [`normalize()`]. Ningún componente compara
//! cadenas "a mano" con `to_lowercase()` propio: así el mismo texto produce
//! el mismo resultado en todo el sistema.
//!
//! ## Transformaciones
//!
//! ```text
//! "  Baños   del INCA "
//!   ├── 1. NFD (descomposición Unicode)   → "  Ban\u{303}os   del INCA "
//!   ├── 2. Quita marcas combinantes      → "  Banos   del INCA "
//!   ├── 3. Minúsculas                    → "  banos   del inca "
//!   └── 4. Colapsa espacios + trim       → "banos del inca"
//! ```
//!
//! ## Funciones Auxiliares
//!
//! | Función | Uso |
//! |---------|-----|
//! | [`normalize()`] | Forma canónica (pura, total) |
//! | [`simplify()`] | `normalize` + puntuación → espacios |
//! | [`content_tokens()`] | Palabras de contenido (sin [stopwords](super::lexicon::STOPWORDS), ≥ 3 chars) |
//! | [`contains_phrase()`] | Contención respetando límites de palabra |
//! | [`slug()`] | Identificador estable (`hualgayoc_bambamarca`) |

use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex::Regex;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

use super::lexicon::STOPWORDS;

/// Longitud mínima de un token de contenido.
pub const MIN_TOKEN_LEN: usize = 3;

static TOKEN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[a-z0-9]+").expect("patrón de token válido"));

/// Devuelve la forma canónica de un texto.
///
/// Descompone (NFD), elimina diacríticos, pasa a minúsculas y colapsa
/// cualquier secuencia de espacios en blanco a un único espacio.
/// Entrada vacía produce salida vacía; la función nunca falla.
pub fn normalize(text: &str) -> String {
    let folded: String = text
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(char::to_lowercase)
        .collect();
    folded.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Igual que [`normalize()`], pero además reemplaza toda puntuación por
/// espacios. Usado para comparar nombres de lugares y de delitos, donde
/// "Baños del Inca," y "baños del inca" deben ser idénticos.
pub fn simplify(text: &str) -> String {
    let normalized = normalize(text);
    let replaced: String = normalized
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect();
    replaced.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// `true` si el valor solo contiene espacios (celdas en blanco del Excel).
pub fn is_blank(text: &str) -> bool {
    text.trim().is_empty()
}

/// Compara dos textos en su forma canónica.
pub fn same(a: &str, b: &str) -> bool {
    simplify(a) == simplify(b)
}

/// Verifica si `haystack` contiene `phrase` como secuencia de palabras
/// completas. Ambos deben venir ya simplificados.
///
/// Evita falsos positivos como encontrar "ica" dentro de "cajamarca".
pub fn contains_phrase(haystack: &str, phrase: &str) -> bool {
    if phrase.is_empty() {
        return false;
    }
    let padded_haystack = format!(" {} ", haystack);
    let padded_phrase = format!(" {} ", phrase);
    padded_haystack.contains(&padded_phrase)
}

/// Extrae los tokens de contenido de un texto: normalizados, sin stopwords
/// y con al menos [`MIN_TOKEN_LEN`] caracteres. El conjunto está ordenado
/// para que los resultados sean deterministas.
pub fn content_tokens(text: &str) -> BTreeSet<String> {
    let normalized = normalize(text);
    TOKEN_RE
        .find_iter(&normalized)
        .map(|m| m.as_str())
        .filter(|t| t.chars().count() >= MIN_TOKEN_LEN && !is_stopword(t))
        .map(str::to_string)
        .collect()
}

fn is_stopword(token: &str) -> bool {
    STOPWORDS.contains(&token)
}

/// Identificador estable en minúsculas, sin tildes, con `_` como separador.
pub fn slug(text: &str) -> String {
    simplify(text).replace(' ', "_")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_strips_diacritics_and_case() {
        assert_eq!(normalize("  Baños   del INCA "), "banos del inca");
        assert_eq!(normalize("Violación"), "violacion");
        assert_eq!(normalize("Sí"), "si");
    }

    #[test]
    fn normalize_empty_is_empty() {
        assert_eq!(normalize(""), "");
        assert_eq!(normalize("   \t\n "), "");
    }

    #[test]
    fn normalize_is_idempotent() {
        let once = normalize("  Extorsión AGRAVADA ");
        assert_eq!(normalize(&once), once);
    }

    #[test]
    fn simplify_removes_punctuation() {
        assert_eq!(simplify("Baños del Inca, Cajamarca."), "banos del inca cajamarca");
        assert_eq!(simplify("(Hualgayoc)"), "hualgayoc");
    }

    #[test]
    fn contains_phrase_respects_word_boundaries() {
        assert!(contains_phrase("me robaron en banos del inca", "banos del inca"));
        assert!(!contains_phrase("cajamarca", "ica"));
        assert!(!contains_phrase("algo", ""));
    }

    #[test]
    fn content_tokens_drop_stopwords_and_short_words() {
        let tokens = content_tokens("Ayer me robaron el celular en la plaza");
        assert!(tokens.contains("robaron"));
        assert!(tokens.contains("celular"));
        assert!(tokens.contains("plaza"));
        assert!(!tokens.contains("ayer"));
        assert!(!tokens.contains("me"));
        assert!(!tokens.contains("en"));
    }

    #[test]
    fn slug_joins_with_underscore() {
        assert_eq!(slug("Hualgayoc_Bambamarca"), "hualgayoc_bambamarca");
        assert_eq!(slug("San Marcos / Pedro Gálvez"), "san_marcos_pedro_galvez");
    }
}
