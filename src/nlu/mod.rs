//! # Comprensión del Mensaje — Del Texto Libre a Datos del Caso
//!
//! Este módulo convierte lo que escribe el ciudadano en datos que el motor
//! de derivación entiende. Todo es determinista salvo [`external`], cuyas
//! pistas son solo consultivas.
//!
//! ## Flujo en el Turno de Relato
//!
//! ```text
//! Mensaje del ciudadano
//!   ├── 1. IntentClassifier        → ¿saludo? ¿nuevo caso? ¿sí/no?
//!   ├── 2. CaseClassifier (externo) → pistas: materia, delito, lugar, resumen
//!   ├── 3. CategoryClassifier      → materia + delito (la pista de delito
//!   │                                 entra como delito explícito)
//!   └── 4. DistrictResolver        → NONE | UNIQUE | AMBIGUOUS
//! ```
//!
//! ## Sub-módulos
//!
//! | Módulo | Responsabilidad |
//! |--------|-----------------|
//! | [`category`] | materia por delito exacto, nombre contenido o solapamiento |
//! | [`district`] | alias, coincidencia exacta, contención y distancia de edición |
//! | [`external`] | cliente del clasificador externo y heurística sin red |
//! | [`intent`] | saludos, nuevo caso, sí/no y elección de candidatos |
//! | [`question`] | redacción de preguntas y del mensaje final |

pub mod category;
pub mod district;
pub mod external;
pub mod intent;
pub mod question;

pub use category::{CategoryClassifier, CategoryMatch};
pub use district::{DistrictMatch, DistrictResolver};
pub use external::{CaseClassifier, ClassifierHints, KeywordClassifier, OpenAiClassifier, PriorHints};
pub use intent::{Intent, IntentClassifier};
pub use question::{Prompt, QuestionGenerator};
