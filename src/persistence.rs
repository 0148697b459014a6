//! # Persistencia — Carga de `knowledge.json`
//!
//! Lee el archivo exportado desde la hoja de cálculo institucional y lo
//! convierte en [`ReferenceTables`] validadas. Se ejecuta una vez al
//! arrancar; el motor nunca escribe de vuelta.
//!
//! ## Formato de Entrada
//!
//! | Clave JSON | Tabla | Clave de fila |
//! |------------|-------|---------------|
//! | `distritos` | [`District`] | `provincia` + `distrito` |
//! | `fiscalias` | [`Office`] | `codigo_fiscalia` |
//! | `competencias` | [`Competency`] | `especifico` + `categoria` |
//! | `reglasCompetencia` | [`ScopeRule`] | `materia` + `fiscalia_destino_codigo` |
//! | `aliasDistritos` | [`DistrictAlias`] | `alias` + `distrito_destino` |
//!
//! `procedimientos`, `faq` y `contactos` se aceptan y se ignoran.
//!
//! ## Validación
//!
//! Las filas crudas se leen de forma tolerante (números y booleanos se
//! aceptan como texto). Después:
//!
//! - Filas sin su clave → descartadas con `warn`, contadas en [`LoadReport`].
//! - Duplicados (código de fiscalía, provincia + distrito) → gana el primero.
//! - Requisito de vínculo desconocido → `NO` con `warn`.
//! - Alcance desconocido, o alcance que no concuerda con el distrito → descartada.
//! - Tabla de distritos o de fiscalías vacía → [`KnowledgeError::EmptyTable`].

use std::collections::HashSet;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::core::text;
use crate::core::{Competency, District, DistrictAlias, LinkRequirement, Office, ReferenceTables, Scope, ScopeRule};
use crate::error::KnowledgeError;

// ─── Filas crudas ────────────────────────────────────────────────

#[derive(Deserialize, Default)]
#[serde(default)]
struct RawKnowledge {
    distritos: Vec<RawDistrict>,
    fiscalias: Vec<RawOffice>,
    competencias: Vec<RawCompetency>,
    #[serde(rename = "reglasCompetencia", alias = "reglas_competencia")]
    reglas: Vec<RawRule>,
    #[serde(rename = "aliasDistritos", alias = "alias_distritos")]
    aliases: Vec<RawAlias>,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct RawDistrict {
    #[serde(deserialize_with = "lenient_string")]
    provincia: String,
    #[serde(deserialize_with = "lenient_string")]
    distrito: String,
    #[serde(deserialize_with = "lenient_string")]
    distrito_id: String,
    #[serde(deserialize_with = "lenient_string")]
    tiene_fiscalia_violencia: String,
    #[serde(deserialize_with = "lenient_string")]
    fiscalia_violencia_codigo: String,
    #[serde(deserialize_with = "lenient_string")]
    fiscalia_penal_mixta_codigo: String,
    #[serde(deserialize_with = "lenient_string")]
    fiscalia_prevencion_codigo: String,
    #[serde(deserialize_with = "lenient_string")]
    fiscalia_familia_codigo: String,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct RawOffice {
    #[serde(deserialize_with = "lenient_string")]
    codigo_fiscalia: String,
    #[serde(deserialize_with = "lenient_string")]
    nombre_fiscalia: String,
    #[serde(deserialize_with = "lenient_string")]
    tipo: String,
    #[serde(deserialize_with = "lenient_string")]
    distrito_fiscal: String,
    #[serde(deserialize_with = "lenient_string")]
    direccion: String,
    #[serde(deserialize_with = "lenient_string")]
    telefono: String,
    #[serde(deserialize_with = "lenient_string")]
    horario: String,
    #[serde(deserialize_with = "lenient_list")]
    competencias: Vec<String>,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct RawCompetency {
    #[serde(deserialize_with = "lenient_string")]
    categoria: String,
    #[serde(deserialize_with = "lenient_string")]
    generico: String,
    #[serde(deserialize_with = "lenient_string")]
    subgenerico: String,
    #[serde(deserialize_with = "lenient_string")]
    especifico: String,
    #[serde(deserialize_with = "lenient_string")]
    descripcion: String,
    #[serde(deserialize_with = "lenient_string")]
    requiere_vinculo_familiar: String,
    #[serde(deserialize_with = "lenient_string")]
    categoria_si_familiar: String,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct RawRule {
    #[serde(deserialize_with = "lenient_string")]
    materia: String,
    #[serde(deserialize_with = "lenient_string")]
    alcance: String,
    #[serde(deserialize_with = "lenient_string")]
    distrito: String,
    #[serde(deserialize_with = "lenient_string")]
    observacion_opcional: String,
    #[serde(deserialize_with = "lenient_string")]
    fiscalia_destino_codigo: String,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct RawAlias {
    #[serde(deserialize_with = "lenient_string")]
    alias: String,
    #[serde(deserialize_with = "lenient_string", alias = "distrito")]
    distrito_destino: String,
}

/// Texto recortado desde cualquier escalar JSON; `null`, listas y objetos → "".
fn lenient_string<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    Ok(scalar_text(&Value::deserialize(d)?))
}

/// Lista de texto desde un arreglo o desde "a, b, c".
fn lenient_list<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<String>, D::Error> {
    let items: Vec<String> = match Value::deserialize(d)? {
        Value::Array(values) => values.iter().map(scalar_text).collect(),
        Value::String(s) => s.split(',').map(|x| x.trim().to_string()).collect(),
        _ => Vec::new(),
    };
    Ok(items.into_iter().filter(|s| !s.is_empty()).collect())
}

fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => String::new(),
    }
}

/// Celda booleana de la hoja: "SI", "sí", "x", "1", "true".
fn parse_flag(raw: &str) -> bool {
    matches!(text::simplify(raw).as_str(), "si" | "s" | "x" | "1" | "true" | "yes")
}

// ─── Resultado ───────────────────────────────────────────────────

/// Conteos de la carga, para logs y `/status`.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct LoadReport {
    pub districts: usize,
    pub offices: usize,
    pub competencies: usize,
    pub rules: usize,
    pub aliases: usize,
    /// Filas descartadas por falta de clave o valores inválidos.
    pub rejected: usize,
    /// Filas ignoradas por repetir una clave ya cargada.
    pub duplicates: usize,
}

/// Lee y valida `knowledge.json` desde disco.
pub fn load_knowledge(path: impl AsRef<Path>) -> Result<(ReferenceTables, LoadReport)> {
    let path = path.as_ref();
    let json = std::fs::read_to_string(path)
        .map_err(|source| KnowledgeError::Io { path: path.display().to_string(), source })
        .with_context(|| format!("Falla al leer las tablas de referencia de {}", path.display()))?;
    let loaded = parse_knowledge(&json)
        .with_context(|| format!("Falla al interpretar {}", path.display()))?;
    let report = &loaded.1;
    tracing::info!(
        districts = report.districts,
        offices = report.offices,
        competencies = report.competencies,
        rules = report.rules,
        aliases = report.aliases,
        rejected = report.rejected,
        duplicates = report.duplicates,
        "Tablas de referencia cargadas"
    );
    Ok(loaded)
}

/// Convierte el contenido JSON en tablas canónicas.
pub fn parse_knowledge(json: &str) -> Result<(ReferenceTables, LoadReport), KnowledgeError> {
    let raw: RawKnowledge = serde_json::from_str(json)?;
    let mut report = LoadReport::default();

    let districts = canonical_districts(raw.distritos, &mut report);
    let offices = canonical_offices(raw.fiscalias, &mut report);
    let competencies = canonical_competencies(raw.competencias, &mut report);
    let rules = canonical_rules(raw.reglas, &mut report);
    let aliases = canonical_aliases(raw.aliases, &mut report);

    if districts.is_empty() {
        return Err(KnowledgeError::EmptyTable("distritos"));
    }
    if offices.is_empty() {
        return Err(KnowledgeError::EmptyTable("fiscalias"));
    }

    report.districts = districts.len();
    report.offices = offices.len();
    report.competencies = competencies.len();
    report.rules = rules.len();
    report.aliases = aliases.len();

    Ok((ReferenceTables { districts, offices, competencies, rules, aliases }, report))
}

fn reject(report: &mut LoadReport, table: &str, index: usize, reason: &str) {
    tracing::warn!(table, row = index + 1, reason, "Fila descartada");
    report.rejected += 1;
}

fn canonical_districts(rows: Vec<RawDistrict>, report: &mut LoadReport) -> Vec<District> {
    let mut seen = HashSet::new();
    let mut out = Vec::with_capacity(rows.len());
    for (i, row) in rows.into_iter().enumerate() {
        if text::is_blank(&row.distrito) {
            reject(report, "distritos", i, "distrito vacío");
            continue;
        }
        if !seen.insert((text::simplify(&row.provincia), text::simplify(&row.distrito))) {
            tracing::warn!(province = %row.provincia, district = %row.distrito, "Distrito duplicado, se conserva el primero");
            report.duplicates += 1;
            continue;
        }
        let id = if text::is_blank(&row.distrito_id) {
            text::slug(&format!("{}_{}", row.provincia, row.distrito))
        } else {
            row.distrito_id
        };
        out.push(District {
            has_violence_office: parse_flag(&row.tiene_fiscalia_violencia),
            province: row.provincia,
            name: row.distrito,
            id,
            general_office: row.fiscalia_penal_mixta_codigo,
            family_office: row.fiscalia_familia_codigo,
            violence_office: row.fiscalia_violencia_codigo,
            prevention_office: row.fiscalia_prevencion_codigo,
        });
    }
    out
}

fn canonical_offices(rows: Vec<RawOffice>, report: &mut LoadReport) -> Vec<Office> {
    let mut seen = HashSet::new();
    let mut out = Vec::with_capacity(rows.len());
    for (i, row) in rows.into_iter().enumerate() {
        if text::is_blank(&row.codigo_fiscalia) {
            reject(report, "fiscalias", i, "codigo_fiscalia vacío");
            continue;
        }
        if !seen.insert(text::simplify(&row.codigo_fiscalia)) {
            tracing::warn!(code = %row.codigo_fiscalia, "Fiscalía duplicada, se conserva la primera");
            report.duplicates += 1;
            continue;
        }
        out.push(Office {
            code: row.codigo_fiscalia,
            name: row.nombre_fiscalia,
            office_type: row.tipo,
            district_fiscal: row.distrito_fiscal,
            address: row.direccion,
            phone: row.telefono,
            hours: row.horario,
            competencies: row.competencias,
        });
    }
    out
}

fn canonical_competencies(rows: Vec<RawCompetency>, report: &mut LoadReport) -> Vec<Competency> {
    let mut out = Vec::with_capacity(rows.len());
    for (i, row) in rows.into_iter().enumerate() {
        if text::is_blank(&row.especifico) || text::is_blank(&row.categoria) {
            reject(report, "competencias", i, "categoria o especifico vacío");
            continue;
        }
        let link_requirement = LinkRequirement::parse(&row.requiere_vinculo_familiar).unwrap_or_else(|| {
            tracing::warn!(
                offense = %row.especifico,
                value = %row.requiere_vinculo_familiar,
                "Requisito de vínculo desconocido, se asume NO"
            );
            LinkRequirement::No
        });
        out.push(Competency {
            category: row.categoria,
            generic: row.generico,
            subcategory: row.subgenerico,
            offense: row.especifico,
            description: row.descripcion,
            link_requirement,
            category_if_familial: row.categoria_si_familiar,
        });
    }
    out
}

fn canonical_rules(rows: Vec<RawRule>, report: &mut LoadReport) -> Vec<ScopeRule> {
    let mut out = Vec::with_capacity(rows.len());
    for (i, row) in rows.into_iter().enumerate() {
        if text::is_blank(&row.materia) || text::is_blank(&row.fiscalia_destino_codigo) {
            reject(report, "reglasCompetencia", i, "materia o destino vacío");
            continue;
        }
        let Some(scope) = Scope::parse(&row.alcance) else {
            reject(report, "reglasCompetencia", i, "alcance desconocido");
            continue;
        };
        match (scope, text::is_blank(&row.distrito)) {
            (Scope::District, true) => {
                reject(report, "reglasCompetencia", i, "alcance distrito sin distrito");
                continue;
            }
            (Scope::DistrictWide, false) => {
                reject(report, "reglasCompetencia", i, "alcance distrito fiscal con distrito");
                continue;
            }
            _ => {}
        }
        out.push(ScopeRule {
            category: row.materia,
            scope,
            district: row.distrito,
            destination: row.fiscalia_destino_codigo,
            note: row.observacion_opcional,
        });
    }
    out
}

fn canonical_aliases(rows: Vec<RawAlias>, report: &mut LoadReport) -> Vec<DistrictAlias> {
    let mut out = Vec::with_capacity(rows.len());
    for (i, row) in rows.into_iter().enumerate() {
        if text::is_blank(&row.alias) || text::is_blank(&row.distrito_destino) {
            reject(report, "aliasDistritos", i, "alias o destino vacío");
            continue;
        }
        out.push(DistrictAlias { alias: row.alias, target: row.distrito_destino });
    }
    out
}
