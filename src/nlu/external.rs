//! # Clasificador Externo — Pistas Consultivas sobre el Relato
//!
//! Un [`CaseClassifier`] lee el relato libre y devuelve [`ClassifierHints`]:
//! materia, delito, lugar y un resumen para el ciudadano. Las pistas son
//! **consultivas**: el resolvedor de distritos y el clasificador de materia
//! las refinan o las descartan. Cualquier campo puede venir vacío o errado.
//!
//! | Implementación | Cuándo se usa |
//! |----------------|---------------|
//! | [`OpenAiClassifier`] | hay `OPENAI_API_KEY` configurada |
//! | [`KeywordClassifier`] | sin clave: heurística local de familia |
//!
//! El límite de tiempo de cada llamada lo impone la conversación
//! ([`crate::orchestrator`]), no el cliente.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::core::text;
use crate::error::ClassifierError;

/// Pistas devueltas por el clasificador externo.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct ClassifierHints {
    pub category: Option<String>,
    pub offense: Option<String>,
    pub district_hint: Option<String>,
    /// Resumen humano para anteponer a la respuesta final.
    pub summary: Option<String>,
}

/// Lo que la conversación ya sabe, enviado como contexto.
#[derive(Clone, Debug, Default, Serialize)]
pub struct PriorHints {
    pub category: Option<String>,
    pub district: Option<String>,
    pub state: String,
}

/// Frontera con el servicio de clasificación.
#[async_trait]
pub trait CaseClassifier: Send + Sync {
    /// Nombre corto para logs y `/status`.
    fn name(&self) -> &'static str;

    async fn classify(&self, text: &str, prior: &PriorHints) -> Result<ClassifierHints, ClassifierError>;
}

/// Materias que el modelo puede devolver.
pub const MODEL_CATEGORIES: &[&str] = &[
    "penal",
    "familia",
    "ambiental",
    "corrupcion",
    "derechos_humanos",
    "crimen_organizado",
    "extincion_dominio",
    "otra",
];

// ─── OpenAI ──────────────────────────────────────────────────────

/// Cliente de chat completions compatible con OpenAI.
pub struct OpenAiClassifier {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
    /// Delitos de la hoja de competencias, listados en el prompt para que
    /// el modelo devuelva nombres exactos.
    known_offenses: Vec<String>,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Deserialize)]
struct ChatMessage {
    #[serde(default)]
    content: Option<String>,
}

impl OpenAiClassifier {
    /// `base_url` sin barra final, p. ej. `https://api.openai.com/v1`.
    pub fn new(base_url: &str, api_key: String, model: String, known_offenses: Vec<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            model,
            known_offenses,
        }
    }

    fn system_prompt(&self, prior: &PriorHints) -> String {
        let offenses = if self.known_offenses.is_empty() {
            String::new()
        } else {
            format!(
                "\nSi el relato corresponde a uno de estos delitos, copia su nombre EXACTO en delito_especifico: {}.",
                self.known_offenses.join("; ")
            )
        };
        format!(
            "Eres un asistente institucional del Ministerio Público (Perú). Tu tarea es CLASIFICAR la \
             consulta del ciudadano para orientar el flujo del chatbot. NO des asesoría legal ni cites artículos.\n\
             Devuelve SIEMPRE un JSON válido (sin markdown) con estas claves:\n\
             - materia: una de {:?}\n\
             - delito_especifico: texto corto o null\n\
             - distrito: lugar de los hechos mencionado por el ciudadano, o null\n\
             - resumen_ciudadano: 1 o 2 oraciones humanas e institucionales, sin tecnicismos.\n\
             Si menciona no poder ver a su hijo o hija, visitas, tenencia, pensión de alimentos o custodia: materia=\"familia\".\n\
             Si habla de delitos ambientales: \"ambiental\". Corrupción de funcionarios: \"corrupcion\".\n\
             Si no estás seguro, usa \"otra\".{}\n\
             Contexto: materia_actual={}, distrito={}, etapa={}",
            MODEL_CATEGORIES,
            offenses,
            json!(prior.category),
            json!(prior.district),
            json!(prior.state),
        )
    }
}

#[async_trait]
impl CaseClassifier for OpenAiClassifier {
    fn name(&self) -> &'static str {
        "openai"
    }

    async fn classify(&self, text: &str, prior: &PriorHints) -> Result<ClassifierHints, ClassifierError> {
        let url = format!("{}/chat/completions", self.base_url);
        let payload = json!({
            "model": self.model,
            "temperature": 0.2,
            "response_format": { "type": "json_object" },
            "messages": [
                { "role": "system", "content": self.system_prompt(prior) },
                { "role": "user", "content": format!("Texto del ciudadano:\n{}", text) },
            ],
        });

        tracing::debug!(model = %self.model, "Consultando clasificador externo");
        let resp = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ClassifierError::Server { status: status.as_u16(), body });
        }

        let chat: ChatResponse = resp.json().await?;
        let content = chat
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or(ClassifierError::Unparsable)?;
        parse_hints(&content)
    }
}

/// Interpreta el contenido devuelto por el modelo. Tolera cercas de
/// código markdown; descarta campos que no sean texto o estén vacíos.
pub fn parse_hints(content: &str) -> Result<ClassifierHints, ClassifierError> {
    let value: Value =
        serde_json::from_str(strip_code_fences(content)).map_err(|_| ClassifierError::Unparsable)?;
    let object = value.as_object().ok_or(ClassifierError::Unparsable)?;

    let field = |keys: &[&str]| -> Option<String> {
        keys.iter()
            .filter_map(|k| object.get(*k))
            .filter_map(Value::as_str)
            .map(str::trim)
            .find(|s| !text::is_blank(s) && !text::same(s, "null"))
            .map(str::to_string)
    };

    Ok(ClassifierHints {
        category: field(&["materia", "categoria"]),
        offense: field(&["delito_especifico", "delito", "caso"]),
        district_hint: field(&["distrito", "lugar"]),
        summary: field(&["resumen_ciudadano", "resumen"]),
    })
}

fn strip_code_fences(content: &str) -> &str {
    let trimmed = content.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Salta la etiqueta de lenguaje ("json") de la primera línea.
    let rest = rest.split_once('\n').map_or("", |(_, body)| body);
    rest.trim_end().strip_suffix("```").unwrap_or(rest).trim()
}

// ─── Heurística local ────────────────────────────────────────────

/// Frases que señalan un asunto de familia (visitas, tenencia, alimentos).
const FAMILY_PHRASES: &[&str] = &[
    "no puedo ver a mi hijo",
    "no puedo ver a mi hija",
    "no me deja ver",
    "no me dejan ver",
    "tenencia",
    "visitas",
    "regimen de visitas",
    "pension",
    "alimentos",
    "custodia",
];

/// Clasificador sin red: solo reconoce asuntos de familia.
#[derive(Clone, Copy, Debug, Default)]
pub struct KeywordClassifier;

#[async_trait]
impl CaseClassifier for KeywordClassifier {
    fn name(&self) -> &'static str {
        "keywords"
    }

    async fn classify(&self, text: &str, _prior: &PriorHints) -> Result<ClassifierHints, ClassifierError> {
        let simple = text::simplify(text);
        let family = FAMILY_PHRASES.iter().any(|p| text::contains_phrase(&simple, p));
        Ok(ClassifierHints {
            category: family.then(|| "familia".to_string()),
            ..ClassifierHints::default()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_fenced_json() {
        let content = "```json\n{\"materia\": \"ambiental\", \"distrito\": \"Celendín\", \"resumen_ciudadano\": \"Gracias.\"}\n```";
        let hints = parse_hints(content).unwrap();
        assert_eq!(hints.category.as_deref(), Some("ambiental"));
        assert_eq!(hints.district_hint.as_deref(), Some("Celendín"));
        assert_eq!(hints.summary.as_deref(), Some("Gracias."));
        assert_eq!(hints.offense, None);
    }

    #[test]
    fn drops_non_string_and_blank_fields() {
        let content = r#"{"materia": 3, "delito_especifico": "  ", "distrito": null, "resumen_ciudadano": "Hola"}"#;
        let hints = parse_hints(content).unwrap();
        assert_eq!(hints.category, None);
        assert_eq!(hints.offense, None);
        assert_eq!(hints.district_hint, None);
        assert_eq!(hints.summary.as_deref(), Some("Hola"));
    }

    #[test]
    fn rejects_non_object_content() {
        assert!(matches!(parse_hints("no es json"), Err(ClassifierError::Unparsable)));
        assert!(matches!(parse_hints("[1, 2]"), Err(ClassifierError::Unparsable)));
    }

    #[test]
    fn strip_code_fences_variants() {
        assert_eq!(strip_code_fences("  {\"a\":1} "), "{\"a\":1}");
        assert_eq!(strip_code_fences("```\n{}\n```"), "{}");
        assert_eq!(strip_code_fences("```json\n{}```"), "{}");
    }

    #[tokio::test]
    async fn keyword_classifier_detects_family_matters() {
        let c = KeywordClassifier;
        let prior = PriorHints::default();
        let hints = c.classify("Mi expareja no me deja ver a mi hija", &prior).await.unwrap();
        assert_eq!(hints.category.as_deref(), Some("familia"));

        let hints = c.classify("me robaron el celular", &prior).await.unwrap();
        assert_eq!(hints, ClassifierHints::default());
    }

    #[test]
    fn system_prompt_lists_known_offenses() {
        let c = OpenAiClassifier::new(
            "https://api.example.test/v1/",
            "k".into(),
            "m".into(),
            vec!["Hurto".into(), "Robo".into()],
        );
        let prompt = c.system_prompt(&PriorHints::default());
        assert!(prompt.contains("Hurto; Robo"));
        assert!(prompt.contains("derechos_humanos"));
        assert_eq!(c.base_url, "https://api.example.test/v1");
    }
}
