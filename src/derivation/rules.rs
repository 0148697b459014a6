//! # Emparejador de Reglas — Materia + Distrito → Fiscalía
//!
//! El [`RuleMatcher`] aplica, en orden, cuatro fuentes de destino. La
//! primera que **elige un código** decide; si ese código no existe en la
//! tabla de fiscalías el resultado es `None` (NO_MATCH), sin probar las
//! siguientes.
//!
//! ```text
//! (materia, distrito resuelto, respuesta de vínculo)
//!   ├── 1. Prioridad familia: materia "familia" y el distrito declara
//!   │      fiscalía de familia              → esa fiscalía
//!   ├── 2. Regla de alcance DISTRITO (materia, distrito)
//!   ├── 3. Regla de alcance DISTRITO FISCAL (materia, distrito vacío)
//!   └── 4. Campos del distrito según la materia
//!          violencia → violencia | familia → familia | prevención → prevención
//!          otra → penal/mixta (con vínculo SI se prefiere violencia)
//! ```
//!
//! La prioridad de familia es absoluta: gana aunque exista una regla de
//! distrito para "familia" con otro destino. Si su código no está en la
//! tabla de fiscalías, se sigue con las reglas.

use serde::Serialize;

use crate::core::text;
use crate::core::{District, LinkAnswer, Office, ReferenceTables, Scope, ScopeRule};

/// Materia con prioridad absoluta.
pub const FAMILY_CATEGORY: &str = "familia";

/// De dónde salió el código de la fiscalía.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum MatchSource {
    FamilyPriority,
    DistrictRule,
    DistrictWideRule,
    DistrictFallback,
}

/// Fiscalía elegida y su origen.
#[derive(Clone, Debug, PartialEq)]
pub struct RuleMatch<'a> {
    pub office: &'a Office,
    pub source: MatchSource,
}

pub struct RuleMatcher<'a> {
    tables: &'a ReferenceTables,
}

impl<'a> RuleMatcher<'a> {
    pub fn new(tables: &'a ReferenceTables) -> Self {
        Self { tables }
    }

    pub fn find(&self, category: &str, district: &District, link: Option<LinkAnswer>) -> Option<RuleMatch<'a>> {
        if text::same(category, FAMILY_CATEGORY) {
            if let Some(office) = self.tables.office(&district.family_office) {
                return Some(RuleMatch { office, source: MatchSource::FamilyPriority });
            }
        }

        let (code, source) = if let Some(rule) = self.district_rule(category, district) {
            (rule.destination.as_str(), MatchSource::DistrictRule)
        } else if let Some(rule) = self.district_wide_rule(category) {
            (rule.destination.as_str(), MatchSource::DistrictWideRule)
        } else {
            (fallback_code(category, district, link), MatchSource::DistrictFallback)
        };

        match self.tables.office(code) {
            Some(office) => Some(RuleMatch { office, source }),
            None => {
                tracing::warn!(
                    category,
                    district = %district.label(),
                    code,
                    ?source,
                    "Código de fiscalía vacío o inexistente"
                );
                None
            }
        }
    }

    fn district_rule(&self, category: &str, district: &District) -> Option<&'a ScopeRule> {
        self.tables.rules.iter().find(|r| {
            r.scope == Scope::District && text::same(&r.category, category) && names_district(&r.district, district)
        })
    }

    fn district_wide_rule(&self, category: &str) -> Option<&'a ScopeRule> {
        self.tables.rules.iter().find(|r| {
            r.scope == Scope::DistrictWide && text::is_blank(&r.district) && text::same(&r.category, category)
        })
    }
}

/// Una regla nombra un distrito por nombre, etiqueta "Nombre (Provincia)"
/// o identificador.
fn names_district(rule_district: &str, district: &District) -> bool {
    text::same(rule_district, &district.name)
        || text::same(rule_district, &district.label())
        || text::same(rule_district, &district.id)
}

fn fallback_code<'d>(category: &str, district: &'d District, link: Option<LinkAnswer>) -> &'d str {
    let simple = text::simplify(category);
    let preferred = if simple.contains("violencia") || link == Some(LinkAnswer::Si) {
        &district.violence_office
    } else if simple == FAMILY_CATEGORY {
        &district.family_office
    } else if simple.contains("prevencion") {
        &district.prevention_office
    } else {
        &district.general_office
    };
    if text::is_blank(preferred) {
        &district.general_office
    } else {
        preferred
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::tables::fixtures;

    fn code(m: Option<RuleMatch>) -> Option<&str> {
        m.map(|m| m.office.code.as_str())
    }

    #[test]
    fn district_wide_rule_for_cajamarca_penal() {
        let tables = fixtures::sample();
        let matcher = RuleMatcher::new(&tables);
        let m = matcher.find("Penal", &tables.districts[0], None).unwrap();
        assert_eq!(m.office.code, "FPPC-CAJ");
        assert_eq!(m.source, MatchSource::DistrictWideRule);
    }

    #[test]
    fn district_rule_beats_district_wide() {
        let tables = fixtures::sample();
        let matcher = RuleMatcher::new(&tables);
        let m = matcher.find("penal", &tables.districts[5], None).unwrap();
        assert_eq!(m.office.code, "FPM-CEL");
        assert_eq!(m.source, MatchSource::DistrictRule);
    }

    #[test]
    fn qualified_rule_applies_only_to_its_province() {
        let tables = fixtures::sample();
        let matcher = RuleMatcher::new(&tables);
        assert_eq!(code(matcher.find("Penal", &tables.districts[2], None)), Some("FPM-BAM"));
        // Bambamarca (Bolívar) no tiene regla propia: cae en la regla del distrito fiscal.
        assert_eq!(code(matcher.find("Penal", &tables.districts[3], None)), Some("FPPC-CAJ"));
    }

    #[test]
    fn family_priority_overrides_conflicting_rule() {
        let tables = fixtures::sample();
        let matcher = RuleMatcher::new(&tables);
        // Existe familia/Cajamarca → FPPC-CAJ, pero el distrito declara FPF-CAJ.
        let m = matcher.find("Familia", &tables.districts[0], None).unwrap();
        assert_eq!(m.office.code, "FPF-CAJ");
        assert_eq!(m.source, MatchSource::FamilyPriority);
    }

    #[test]
    fn family_without_family_office_uses_rules_then_fallback() {
        let tables = fixtures::sample();
        let matcher = RuleMatcher::new(&tables);
        let m = matcher.find("familia", &tables.districts[4], None).unwrap();
        assert_eq!(m.office.code, "FPM-SM");
        assert_eq!(m.source, MatchSource::DistrictFallback);
    }

    #[test]
    fn missing_destination_is_no_match() {
        let tables = fixtures::sample();
        let matcher = RuleMatcher::new(&tables);
        // Regla Penal/Chota apunta a un código inexistente.
        assert_eq!(code(matcher.find("Penal", &tables.districts[6], None)), None);
    }

    #[test]
    fn fallback_fields_follow_category() {
        let tables = fixtures::sample();
        let matcher = RuleMatcher::new(&tables);
        let cajamarca = &tables.districts[0];
        assert_eq!(code(matcher.find("Prevención del delito", cajamarca, None)), Some("FPP-CAJ"));
        assert_eq!(code(matcher.find("Tributario", cajamarca, None)), Some("FPPC-CAJ"));
        // Violencia en un distrito sin fiscalía de violencia → penal/mixta.
        assert_eq!(code(matcher.find("Violencia Familiar", &tables.districts[1], None)), Some("FPM-BI"));
    }

    #[test]
    fn link_si_prefers_violence_office_in_fallback() {
        let tables = fixtures::sample();
        let matcher = RuleMatcher::new(&tables);
        assert_eq!(
            code(matcher.find("Tributario", &tables.districts[0], Some(LinkAnswer::Si))),
            Some("FPV-CAJ")
        );
        assert_eq!(
            code(matcher.find("Tributario", &tables.districts[0], Some(LinkAnswer::No))),
            Some("FPPC-CAJ")
        );
    }

    #[test]
    fn blank_fallback_code_is_no_match() {
        let mut tables = fixtures::sample();
        tables.districts[1].general_office = String::new();
        let matcher = RuleMatcher::new(&tables);
        assert_eq!(code(matcher.find("Tributario", &tables.districts[1], None)), None);
    }
}
