//! # Módulo Derivation — De los Datos del Caso a la Fiscalía
//!
//! Capa determinista que convierte un [`CaseContext`](crate::core::CaseContext)
//! en un [`ResolutionResult`]: una fiscalía, una pregunta de aclaración o
//! "sin coincidencia".
//!
//! | Sub-módulo | Responsabilidad |
//! |------------|-----------------|
//! | [`policy`] | ¿hay que preguntar por el vínculo familiar? |
//! | [`rules`] | materia + distrito → código de fiscalía |
//! | [`engine`] | orden de evaluación y resultado final |
//!
//! Nada aquí hace E/S ni guarda estado entre llamadas.

pub mod engine;
pub mod policy;
pub mod rules;

pub use engine::{resolve, ResolutionResult};
pub use policy::needs_link_question;
pub use rules::{MatchSource, RuleMatcher, FAMILY_CATEGORY};
