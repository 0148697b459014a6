//! # Generador de Mensajes — La Voz del Orientador
//!
//! El [`QuestionGenerator`] redacta cada mensaje que el ciudadano recibe:
//! las preguntas de aclaración, el mensaje final con la fiscalía y los
//! recordatorios de estado terminal. Cada mensaje es un [`Prompt`]: texto
//! más botones de respuesta rápida.
//!
//! ## Anti-bucle
//!
//! Las preguntas reciben un contador `attempt` (cuántas veces seguidas se
//! hizo la misma pregunta). La plantilla se elige con `attempt % n`, de
//! modo que dos preguntas consecutivas iguales nunca tienen el mismo texto:
//! la segunda incluye un ejemplo.
//!
//! | Método | Cuándo |
//! |--------|--------|
//! | `welcome` | saludo o inicio |
//! | `ask_category` | la materia sigue sin identificarse |
//! | `ask_district` | falta el distrito |
//! | `ask_disambiguation` | varios distritos posibles |
//! | `ask_link` | falta la respuesta de vínculo familiar |
//! | `resolved` / `no_match` | resultados terminales |

use serde::Serialize;

use crate::core::text;
use crate::core::{CaseContext, District, Office};

/// Botón para empezar otra consulta.
pub const NEW_CASE_REPLY: &str = "Nuevo caso";

/// Botón del menú inicial.
pub const MENU_REPLY: &str = "Denuncia";

/// Mensaje de salida: texto y respuestas rápidas opcionales.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Prompt {
    pub text: String,
    pub quick_replies: Vec<String>,
}

impl Prompt {
    pub fn plain(text: impl Into<String>) -> Self {
        Self { text: text.into(), quick_replies: Vec::new() }
    }

    pub fn with_replies(text: impl Into<String>, replies: &[&str]) -> Self {
        Self {
            text: text.into(),
            quick_replies: replies.iter().map(|r| r.to_string()).collect(),
        }
    }
}

/// Redactor de mensajes (sin estado).
#[derive(Clone, Copy, Debug, Default)]
pub struct QuestionGenerator;

impl QuestionGenerator {
    pub fn new() -> Self {
        Self
    }

    pub fn welcome(&self) -> Prompt {
        Prompt::with_replies(
            "Hola 👋 Soy el asistente virtual de orientación del Ministerio Público (Cajamarca). \
             Cuéntame, por favor, ¿qué ocurrió? Puedes describirlo con tus palabras.",
            &[MENU_REPLY],
        )
    }

    /// Pide el relato después de pulsar "Denuncia" o "Nuevo caso".
    pub fn ask_narrative(&self) -> Prompt {
        Prompt::plain("Cuéntame, por favor, ¿qué ocurrió? Puedes describirlo con tus palabras.")
    }

    pub fn ask_category(&self, attempt: u32) -> Prompt {
        let templates = [
            "Gracias. Para orientarte bien necesito un poco más de detalle: ¿qué ocurrió exactamente?",
            "Todavía no logro identificar el tipo de caso. ¿Podrías contarlo con otras palabras? \
             Por ejemplo: \"me robaron el celular con un cuchillo\" o \"no me dejan ver a mi hijo\".",
        ];
        Prompt::plain(pick(&templates, attempt))
    }

    pub fn ask_district(&self, attempt: u32) -> Prompt {
        let templates = [
            "Para orientarte mejor, ¿en qué distrito ocurrieron los hechos?",
            "No reconocí ese lugar. Escribe solo el nombre del distrito, por ejemplo: \
             Cajamarca, Baños del Inca o Bambamarca.",
        ];
        Prompt::plain(pick(&templates, attempt))
    }

    /// Lista numerada de candidatos; los botones repiten la numeración.
    pub fn ask_disambiguation(&self, candidates: &[District], attempt: u32) -> Prompt {
        let heading = if attempt == 0 {
            "Encontré varios distritos posibles. ¿Cuál es el tuyo?"
        } else {
            "No logré identificar tu elección. Responde con el número de la lista o el nombre de la provincia:"
        };
        let options: Vec<String> = candidates
            .iter()
            .enumerate()
            .map(|(i, d)| format!("{}. {}", i + 1, d.label()))
            .collect();
        Prompt {
            text: format!("{}\n{}", heading, options.join("\n")),
            quick_replies: options,
        }
    }

    pub fn ask_link(&self, attempt: u32) -> Prompt {
        let templates = [
            "¿La persona denunciada es tu familiar, tu pareja o expareja?",
            "Por favor responde \"Sí\" o \"No\": ¿la persona denunciada es integrante de tu familia, \
             tu pareja o expareja?",
        ];
        Prompt::with_replies(pick(&templates, attempt), &["Sí", "No"])
    }

    /// Mensaje final con la fiscalía de destino. Los campos vacíos de la
    /// fiscalía se omiten.
    pub fn resolved(&self, case: &CaseContext, office: &Office) -> Prompt {
        let mut out = String::new();
        if let Some(summary) = case.summary.as_deref().filter(|s| !text::is_blank(s)) {
            out.push_str(summary.trim());
            out.push_str("\n\n");
        }
        if let Some(category) = case.category.as_deref() {
            out.push_str(&format!(
                "Según la información brindada, tu caso correspondería a la materia *{}*.\n",
                category
            ));
        }
        if let Some(district) = &case.district {
            out.push_str(&format!("Distrito indicado: *{}*.\n", district.label()));
        }
        out.push_str(&format!("\n📌 *Fiscalía sugerida:* {}", office.name));
        for (label, value) in [
            ("📍 Dirección", &office.address),
            ("☎️ Teléfono", &office.phone),
            ("🕒 Horario", &office.hours),
        ] {
            if !text::is_blank(value) {
                out.push_str(&format!("\n{}: {}", label, value.trim()));
            }
        }
        out.push_str(
            "\n\nAcude a Mesa de Partes o Atención al Usuario para presentar tu denuncia. \
             Si deseas hacer otra consulta, escribe \"Nuevo caso\".",
        );
        Prompt::with_replies(out, &[NEW_CASE_REPLY])
    }

    pub fn no_match(&self, case: &CaseContext) -> Prompt {
        let place = case
            .district
            .as_ref()
            .map(|d| format!(" para hechos ocurridos en *{}*", d.label()))
            .unwrap_or_default();
        Prompt::with_replies(
            format!(
                "No encontré una fiscalía registrada{}. Te recomiendo acudir a la sede fiscal más \
                 cercana (Mesa de Partes o Atención al Usuario), donde recibirán tu denuncia y te \
                 orientarán. Si deseas hacer otra consulta, escribe \"Nuevo caso\".",
                place
            ),
            &[NEW_CASE_REPLY],
        )
    }

    /// Respuesta en estado terminal cuando el mensaje no pide un caso nuevo.
    pub fn terminal_reminder(&self, office: Option<&Office>) -> Prompt {
        let text = match office {
            Some(o) => format!(
                "Tu consulta ya fue orientada a: {}. Si deseas hacer otra consulta, escribe \"Nuevo caso\".",
                o.name
            ),
            None => "Tu consulta anterior ya terminó. Si deseas hacer otra consulta, escribe \"Nuevo caso\"."
                .to_string(),
        };
        Prompt::with_replies(text, &[NEW_CASE_REPLY])
    }

    pub fn empty_message(&self) -> Prompt {
        Prompt::plain("¿Podrías escribir tu consulta en texto, por favor?")
    }
}

fn pick(templates: &[&str], attempt: u32) -> String {
    templates[attempt as usize % templates.len()].to_string()
}
