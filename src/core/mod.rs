//! # Módulo Core — Tipos Fundamentales del Dominio
//!
//! Agrupa los tipos sobre los que trabaja todo el motor de derivación:
//!
//! - [`text`] — normalizador de texto (forma canónica para comparar)
//! - [`lexicon`] — stopwords, saludos y respuestas sí/no
//! - [`ReferenceTables`] — distritos, fiscalías, competencias, reglas y alias
//! - [`CaseContext`] — datos confirmados de la consulta en curso
//! - [`LinkAnswer`] / [`LinkRequirement`] — la pregunta de vínculo familiar
//!
//! ## Analogía con la Mesa de Partes
//!
//! Las [`ReferenceTables`] son el **directorio institucional** pegado en la
//! pared: no cambian durante el día. El [`CaseContext`] es la **ficha** que
//! el orientador llena con cada ciudadano y que se archiva al terminar.

/// Normalización y tokenización de texto.
pub mod text;

/// Listas de palabras compartidas por el tokenizador y la intención.
pub mod lexicon;

/// Registros canónicos y tablas de referencia.
pub mod tables;

/// Contexto mutable de una consulta.
pub mod case;

pub use case::{CaseContext, LinkAnswer};
pub use tables::{
    Competency, District, DistrictAlias, LinkRequirement, Office, ReferenceTables, Scope,
    ScopeRule,
};
