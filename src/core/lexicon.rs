//! # Léxico — Listas de Palabras del Orientador
//!
//! Único lugar donde viven las listas de palabras que usan el tokenizador
//! ([`super::text`]) y el clasificador de intención
//! ([`crate::nlu::intent`]). Todas están en forma simplificada: minúsculas,
//! sin tildes ni puntuación.
//!
//! | Lista | Consumidor | Uso |
//! |-------|------------|-----|
//! | [`STOPWORDS`] | `text::content_tokens` | palabras sin valor para distinguir delitos |
//! | [`GREETING_OPENERS`] | `IntentClassifier` | primera palabra de un saludo |
//! | [`GREETING_FILLERS`] | `IntentClassifier` | palabras que pueden seguir al saludo |
//! | [`YES_WORDS`] / [`YES_PHRASES`] | `IntentClassifier` | respuesta afirmativa |
//! | [`NO_WORDS`] | `IntentClassifier` | respuesta negativa |
//! | [`NOT_AN_ANSWER`] | `IntentClassifier` | empieza con "no" pero no niega |
//!
//! Las palabras de saludo de tres o más letras también son stopwords: un
//! "buenas tardes" al inicio del relato nunca aporta tokens de contenido.

/// Stopwords en español para la tokenización de relatos.
///
/// Además de artículos, preposiciones y pronombres, incluye muletillas
/// frecuentes en los relatos ciudadanos ("señor", "fiscalia", "quiero")
/// que no ayudan a distinguir un delito de otro.
pub const STOPWORDS: &[&str] = &[
    "the", "los", "las", "una", "uno", "unos", "unas", "del", "con", "sin", "por", "para",
    "que", "quien", "quienes", "cual", "cuales", "como", "cuando", "donde", "pero", "mas",
    "sus", "mis", "tus", "nos", "les", "ese", "esa", "esos", "esas", "este", "esta", "estos",
    "estas", "eso", "esto", "aquel", "aquella", "muy", "hay", "fue", "era", "son", "ser",
    "estar", "estan", "estaba", "tiene", "tengo", "tenia", "han", "hemos", "habia",
    "ella", "ellos", "ellas", "usted", "ustedes", "nosotros", "yo", "tambien", "desde",
    "hasta", "entre", "sobre", "ante", "bajo", "tras", "segun", "durante", "mediante",
    "porque", "pues", "aunque", "entonces", "luego", "despues", "antes", "ahora", "ayer",
    "hoy", "todo", "toda", "todos", "todas", "otro", "otra", "otros", "otras", "mismo",
    "misma", "cada", "algo", "alguien", "nada", "nadie", "solo", "aqui", "alli", "ahi",
    "asi", "quiero", "queria", "puedo", "puede", "hacer", "hizo", "dijo", "senor", "senora",
    "senorita", "hola", "ola", "alo", "buen", "buenos", "buenas", "dia", "dias", "tardes",
    "noches", "saludos", "tal", "gracias", "favor", "fiscalia", "denuncia", "denunciar",
    "caso", "persona", "personas", "parte", "vez", "veces",
];

/// Palabras con las que empieza un saludo.
pub const GREETING_OPENERS: &[&str] = &["hola", "ola", "alo", "buenas", "buenos", "buen", "saludos", "hi"];

/// Palabras que pueden acompañar a un saludo sin convertirlo en relato.
pub const GREETING_FILLERS: &[&str] = &[
    "dia", "dias", "tardes", "noches", "que", "tal", "como", "esta", "estas", "senor", "senora",
    "senorita",
];

pub const YES_WORDS: &[&str] = &["si", "sip", "claro", "correcto", "efectivamente", "exacto", "afirmativo"];

/// Frases afirmativas que pueden aparecer en cualquier parte de la
/// respuesta. Precedidas por "no" dejan de afirmar.
pub const YES_PHRASES: &[&str] = &[
    "asi es",
    "es mi pareja",
    "es mi expareja",
    "es mi esposo",
    "es mi esposa",
    "es mi conviviente",
    "es mi familiar",
];

pub const NO_WORDS: &[&str] = &["no", "nop", "negativo", "ninguno", "ninguna"];

/// Respuestas que empiezan con "no" pero no niegan nada.
pub const NOT_AN_ANSWER: &[&str] = &[
    "no se",
    "no lo se",
    "no sabria",
    "no estoy seguro",
    "no estoy segura",
    "no recuerdo",
    "no lo recuerdo",
    "no me acuerdo",
];

/// `true` si la palabra forma parte del vocabulario de saludo.
pub fn is_greeting_word(word: &str) -> bool {
    GREETING_OPENERS.contains(&word) || GREETING_FILLERS.contains(&word)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::text::{simplify, MIN_TOKEN_LEN};

    fn all_lists() -> Vec<&'static [&'static str]> {
        vec![STOPWORDS, GREETING_OPENERS, GREETING_FILLERS, YES_WORDS, YES_PHRASES, NO_WORDS, NOT_AN_ANSWER]
    }

    #[test]
    fn every_entry_is_already_simplified() {
        for list in all_lists() {
            for entry in list {
                assert_eq!(&simplify(entry), entry);
            }
        }
    }

    #[test]
    fn greeting_openers_and_fillers_do_not_overlap() {
        for opener in GREETING_OPENERS {
            assert!(!GREETING_FILLERS.contains(opener), "{opener} repetido");
        }
    }

    #[test]
    fn greeting_words_are_stopwords() {
        for word in GREETING_OPENERS.iter().chain(GREETING_FILLERS) {
            if word.chars().count() >= MIN_TOKEN_LEN {
                assert!(STOPWORDS.contains(word), "{word} no es stopword");
            }
        }
    }

    #[test]
    fn yes_and_no_words_are_disjoint() {
        for word in YES_WORDS {
            assert!(!NO_WORDS.contains(word));
        }
    }

    #[test]
    fn non_answers_start_with_a_no_word() {
        for phrase in NOT_AN_ANSWER {
            let first = phrase.split(' ').next().unwrap_or_default();
            assert!(NO_WORDS.contains(&first), "{phrase}");
        }
    }
}
