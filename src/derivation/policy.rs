//! Política de vínculo familiar: ¿hace falta preguntar?

use crate::core::{District, LinkRequirement};

/// `true` solo si el delito admite el vínculo (`Si`/`Depende`) **y** el
/// distrito cuenta con fiscalía de violencia familiar. Si no hay tal
/// fiscalía, la respuesta no cambiaría el destino y no se pregunta.
pub fn needs_link_question(requirement: LinkRequirement, district: &District) -> bool {
    requirement.may_ask() && district.offers_violence_office()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::tables::fixtures;

    #[test]
    fn gating_by_requirement_and_district() {
        let tables = fixtures::sample();
        let cajamarca = &tables.districts[0];
        let banos = &tables.districts[1];

        assert!(!needs_link_question(LinkRequirement::No, cajamarca));
        assert!(needs_link_question(LinkRequirement::Si, cajamarca));
        assert!(needs_link_question(LinkRequirement::Depende, cajamarca));
        assert!(!needs_link_question(LinkRequirement::Si, banos));
        assert!(!needs_link_question(LinkRequirement::Depende, banos));
    }
}
