//! # Tablas de Referencia — El Conocimiento Institucional en Memoria
//!
//! Las [`ReferenceTables`] agrupan las cinco tablas que el motor consulta:
//!
//! | Tabla | Registro | Clave |
//! |-------|----------|-------|
//! | Distritos | [`District`] | (provincia, distrito) |
//! | Fiscalías | [`Office`] | `code` |
//! | Competencias | [`Competency`] | delito específico |
//! | Reglas de competencia | [`ScopeRule`] | (materia, alcance, distrito) |
//! | Alias de distritos | [`DistrictAlias`] | alias |
//!
//! Se cargan una sola vez por proceso (ver [`crate::persistence`]) y se
//! comparten en un `Arc` de solo lectura entre todas las conversaciones.
//! Ningún método de este módulo muta las tablas.
//!
//! ## Orden de las Filas
//!
//! El orden de cada `Vec` es el orden de la hoja de cálculo de origen.
//! Varias reglas del motor dependen de él ("la primera coincidencia gana",
//! candidatos ambiguos en orden de tabla), así que nunca se reordena.

use serde::Serialize;

use super::text;

/// Requisito de vínculo familiar de un delito.
///
/// - `No` — el vínculo no cambia la materia; nunca se pregunta.
/// - `Si` — el delito exige conocer el vínculo.
/// - `Depende` — la materia final depende de la respuesta del ciudadano.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum LinkRequirement {
    No,
    Si,
    Depende,
}

impl LinkRequirement {
    /// Interpreta la celda "Requiere vinculo familiar". `None` si el valor
    /// no es reconocible (el cargador decide qué hacer con la fila).
    pub fn parse(raw: &str) -> Option<Self> {
        match text::simplify(raw).as_str() {
            "" | "no" => Some(Self::No),
            "si" | "s" | "x" => Some(Self::Si),
            "depende" | "d" => Some(Self::Depende),
            _ => None,
        }
    }

    /// `true` para `Si` y `Depende` — los únicos casos en que la política
    /// de vínculo familiar llega a ser consultada.
    pub fn may_ask(self) -> bool {
        !matches!(self, Self::No)
    }
}

/// Alcance de una regla de competencia.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum Scope {
    /// Aplica a un distrito concreto (`distrito`).
    District,
    /// Aplica a todo el distrito fiscal (`distrito_fiscal`), como respaldo.
    DistrictWide,
}

impl Scope {
    /// Acepta `distrito`, `distrito_fiscal` y `distrito fiscal`.
    pub fn parse(raw: &str) -> Option<Self> {
        match text::simplify(raw).as_str() {
            "distrito" => Some(Self::District),
            "distrito fiscal" => Some(Self::DistrictWide),
            _ => None,
        }
    }
}

/// Distrito administrativo con los códigos de fiscalía que lo atienden.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct District {
    pub province: String,
    pub name: String,
    /// `slug(provincia_distrito)`, estable entre cargas.
    pub id: String,
    /// Columna "Tiene fiscalia violencia".
    pub has_violence_office: bool,
    pub general_office: String,
    pub family_office: String,
    pub violence_office: String,
    pub prevention_office: String,
}

impl District {
    /// Etiqueta para desambiguación: "Bambamarca (Hualgayoc)".
    pub fn label(&self) -> String {
        if text::is_blank(&self.province) {
            self.name.clone()
        } else {
            format!("{} ({})", self.name, self.province)
        }
    }

    /// `true` si el distrito cuenta con una fiscalía especializada en
    /// violencia familiar: bandera explícita o código no vacío.
    pub fn offers_violence_office(&self) -> bool {
        self.has_violence_office || !text::is_blank(&self.violence_office)
    }
}

/// Alias coloquial o histórico de un distrito.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DistrictAlias {
    pub alias: String,
    pub target: String,
}

/// Fiscalía de destino.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Office {
    pub code: String,
    pub name: String,
    pub office_type: String,
    pub district_fiscal: String,
    pub address: String,
    pub phone: String,
    pub hours: String,
    /// Materias declaradas en la hoja (informativo).
    pub competencies: Vec<String>,
}

/// Fila de la hoja "Competencias": un delito específico y su materia.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Competency {
    pub category: String,
    pub generic: String,
    pub subcategory: String,
    pub offense: String,
    pub description: String,
    pub link_requirement: LinkRequirement,
    /// Materia que aplica si el agresor es familiar (vacío si no aplica).
    pub category_if_familial: String,
}

/// Regla de derivación: materia + alcance → fiscalía de destino.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ScopeRule {
    pub category: String,
    pub scope: Scope,
    /// Obligatorio si `scope == District`; vacío si `DistrictWide`.
    pub district: String,
    pub destination: String,
    pub note: String,
}

/// Las cinco tablas inmutables del motor.
#[derive(Clone, Debug, Default, Serialize)]
pub struct ReferenceTables {
    pub districts: Vec<District>,
    pub offices: Vec<Office>,
    pub competencies: Vec<Competency>,
    pub rules: Vec<ScopeRule>,
    pub aliases: Vec<DistrictAlias>,
}

impl ReferenceTables {
    /// Busca una fiscalía por código (normalizado). Un código vacío nunca
    /// encuentra nada.
    pub fn office(&self, code: &str) -> Option<&Office> {
        if text::is_blank(code) {
            return None;
        }
        self.offices.iter().find(|o| text::same(&o.code, code))
    }

    /// Busca un distrito por su identificador estable.
    pub fn district_by_id(&self, id: &str) -> Option<&District> {
        self.districts.iter().find(|d| d.id == id)
    }

    /// Fila de competencia cuyo delito específico coincide exactamente
    /// (forma canónica) con `offense`.
    pub fn competency_by_offense(&self, offense: &str) -> Option<&Competency> {
        if text::is_blank(offense) {
            return None;
        }
        self.competencies
            .iter()
            .find(|c| text::same(&c.offense, offense))
    }

    /// Devuelve el nombre canónico de una materia conocida (presente en
    /// competencias o reglas), o `None` si la materia no existe en las tablas.
    ///
    /// Usado para validar la materia sugerida por el clasificador externo.
    pub fn canonical_category(&self, category: &str) -> Option<&str> {
        if text::is_blank(category) {
            return None;
        }
        let wanted = text::simplify(category).replace('_', " ");
        let known = self
            .competencies
            .iter()
            .flat_map(|c| [c.category.as_str(), c.category_if_familial.as_str()])
            .chain(self.rules.iter().map(|r| r.category.as_str()));
        for candidate in known {
            if !text::is_blank(candidate) && text::simplify(candidate).replace('_', " ") == wanted {
                return Some(candidate);
            }
        }
        None
    }
}

/// Tablas de ejemplo compartidas por las pruebas de todos los módulos.
///
/// Modelan el distrito fiscal de Cajamarca, incluyendo dos distritos
/// llamados "Bambamarca" en provincias distintas.
#[cfg(test)]
pub mod fixtures {
    use super::*;

    pub fn district(province: &str, name: &str, codes: [&str; 4], violence_flag: bool) -> District {
        District {
            province: province.into(),
            name: name.into(),
            id: text::slug(&format!("{}_{}", province, name)),
            has_violence_office: violence_flag,
            general_office: codes[0].into(),
            family_office: codes[1].into(),
            violence_office: codes[2].into(),
            prevention_office: codes[3].into(),
        }
    }

    pub fn office(code: &str, name: &str) -> Office {
        Office {
            code: code.into(),
            name: name.into(),
            office_type: "Fiscalía".into(),
            district_fiscal: "Cajamarca".into(),
            address: format!("Jr. {} 123", name),
            phone: "076-000000".into(),
            hours: "08:00-16:45".into(),
            competencies: Vec::new(),
        }
    }

    pub fn competency(
        category: &str,
        offense: &str,
        description: &str,
        requirement: LinkRequirement,
        if_familial: &str,
    ) -> Competency {
        Competency {
            category: category.into(),
            generic: String::new(),
            subcategory: String::new(),
            offense: offense.into(),
            description: description.into(),
            link_requirement: requirement,
            category_if_familial: if_familial.into(),
        }
    }

    pub fn rule(category: &str, scope: Scope, district: &str, destination: &str) -> ScopeRule {
        ScopeRule {
            category: category.into(),
            scope,
            district: district.into(),
            destination: destination.into(),
            note: String::new(),
        }
    }

    pub fn sample() -> ReferenceTables {
        ReferenceTables {
            districts: vec![
                district("Cajamarca", "Cajamarca", ["FPPC-CAJ", "FPF-CAJ", "FPV-CAJ", "FPP-CAJ"], true),
                district("Cajamarca", "Baños del Inca", ["FPM-BI", "", "", ""], false),
                district("Hualgayoc", "Bambamarca", ["FPM-BAM", "", "FPV-BAM", ""], true),
                district("Bolívar", "Bambamarca", ["FPM-BOL", "", "", ""], false),
                district("San Marcos", "Pedro Gálvez", ["FPM-SM", "", "", ""], false),
                district("Celendín", "Celendín", ["FPM-CEL", "", "", ""], false),
                district("Chota", "Chota", ["FPM-CHO", "FPF-CHO", "", ""], false),
            ],
            offices: vec![
                office("FPPC-CAJ", "Fiscalía Provincial Penal Corporativa de Cajamarca"),
                office("FPF-CAJ", "Fiscalía Provincial de Familia de Cajamarca"),
                office("FPV-CAJ", "Fiscalía Especializada en Violencia contra la Mujer de Cajamarca"),
                office("FPP-CAJ", "Fiscalía de Prevención del Delito de Cajamarca"),
                office("FPM-BI", "Fiscalía Provincial Mixta de Baños del Inca"),
                office("FPM-BAM", "Fiscalía Provincial Mixta de Hualgayoc"),
                office("FPV-BAM", "Fiscalía de Violencia Familiar de Hualgayoc"),
                office("FPM-BOL", "Fiscalía Provincial Mixta de Bolívar"),
                office("FPM-SM", "Fiscalía Provincial Mixta de San Marcos"),
                office("FPM-CEL", "Fiscalía Provincial Mixta de Celendín"),
                office("FPM-CHO", "Fiscalía Provincial Mixta de Chota"),
                office("FPF-CHO", "Fiscalía Provincial de Familia de Chota"),
                office("FEMA", "Fiscalía Especializada en Materia Ambiental"),
                office("FECOF", "Fiscalía Anticorrupción de Cajamarca"),
            ],
            competencies: vec![
                competency(
                    "Penal",
                    "Hurto",
                    "apoderamiento ilegitimo de un bien mueble ajeno sustrayendolo del lugar donde se encuentra sin violencia",
                    LinkRequirement::No,
                    "",
                ),
                competency(
                    "Penal",
                    "Robo agravado",
                    "apoderamiento de bien mueble ajeno empleando violencia amenaza arma cuchillo pistola asalto",
                    LinkRequirement::No,
                    "",
                ),
                competency(
                    "Penal",
                    "Robo",
                    "apoderamiento de bien mueble ajeno empleando violencia amenaza contra la persona",
                    LinkRequirement::No,
                    "",
                ),
                competency(
                    "Penal",
                    "Lesiones",
                    "golpes heridas agresion fisica que causan dano en el cuerpo o la salud de una persona",
                    LinkRequirement::Depende,
                    "Violencia Familiar",
                ),
                competency(
                    "Penal",
                    "Agresiones contra las mujeres o integrantes del grupo familiar",
                    "agresion fisica psicologica contra pareja conviviente esposa hijos integrantes del hogar",
                    LinkRequirement::Si,
                    "Violencia Familiar",
                ),
                competency(
                    "Ambiental",
                    "Contaminación del ambiente",
                    "vertimiento de residuos relaves mineros contaminacion del rio agua suelo aire mineria",
                    LinkRequirement::No,
                    "",
                ),
                competency(
                    "Corrupcion",
                    "Cohecho pasivo",
                    "funcionario publico solicita acepta dinero soborno coima para realizar omitir acto",
                    LinkRequirement::No,
                    "",
                ),
                competency(
                    "familia",
                    "Tenencia",
                    "tenencia custodia regimen visitas hijo hija menor padre madre impide ver",
                    LinkRequirement::No,
                    "",
                ),
            ],
            rules: vec![
                rule("Penal", Scope::DistrictWide, "", "FPPC-CAJ"),
                rule("Penal", Scope::District, "Bambamarca (Hualgayoc)", "FPM-BAM"),
                rule("Penal", Scope::District, "Celendín", "FPM-CEL"),
                rule("Ambiental", Scope::DistrictWide, "", "FEMA"),
                rule("Corrupcion", Scope::DistrictWide, "", "FECOF"),
                rule("familia", Scope::District, "Cajamarca", "FPPC-CAJ"),
                rule("Violencia Familiar", Scope::District, "Cajamarca", "FPV-CAJ"),
                rule("Violencia Familiar", Scope::District, "Bambamarca (Hualgayoc)", "FPV-BAM"),
                rule("Penal", Scope::District, "Chota", "NO-EXISTE"),
            ],
            aliases: vec![
                DistrictAlias { alias: "Baños".into(), target: "Baños del Inca".into() },
                DistrictAlias { alias: "Los Baños".into(), target: "Baños del Inca".into() },
                DistrictAlias { alias: "San Marcos".into(), target: "Pedro Gálvez".into() },
                DistrictAlias { alias: "Caxamarca".into(), target: "Cajamarca".into() },
            ],
        }
    }
}
