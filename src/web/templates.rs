//! # Plantillas Maud — Página de Prueba del Orientador
//!
//! HTML renderizado en el servidor con [`maud`]. La página solo sirve para
//! probar la conversación desde un navegador; los canales de mensajería
//! usan `POST /api/messages`.
//!
//! | Función | Tipo | Descripción |
//! |---------|------|-------------|
//! | [`full_page()`] | Página completa | chat con identificador de sesión |
//! | [`exchange()`] | Fragmento HTMX | mensaje del ciudadano + respuesta |
//!
//! ```text
//! ┌──────────── nav-bar ─────────────────────┐
//! │ MP │ Orientación Fiscal · Cajamarca      │
//! ├──────────────────────────────────────────┤
//! │  Bienvenida                              │
//! │  Ciudadano ▸ mensaje                     │
//! │  Asistente ▸ respuesta  [Sí] [No]        │
//! ├──────────────────────────────────────────┤
//! │ [Reiniciar] [______________] [Enviar]    │
//! └──────────────────────────────────────────┘
//! ```

use maud::{html, Markup, DOCTYPE};

use crate::nlu::question::NEW_CASE_REPLY;
use crate::nlu::Prompt;
use crate::orchestrator::Reply;

/// Página principal. `session` viaja como campo oculto en cada envío.
pub fn full_page(session: &str, welcome: &Prompt) -> Markup {
    html! {
        (DOCTYPE)
        html lang="es-PE" {
            head {
                meta charset="UTF-8";
                meta name="viewport" content="width=device-width, initial-scale=1.0";
                title { "Orientación Fiscal — Cajamarca" }
                link rel="stylesheet" href="/assets/style.css";
                script src="https://unpkg.com/htmx.org@2.0.4" {}
            }
            body {
                div class="app-shell" {
                    nav class="nav-bar" {
                        a href="/" class="nav-brand" {
                            span class="nav-brand-icon" { "MP" }
                            span class="nav-brand-text" { "Orientación Fiscal · Cajamarca" }
                        }
                    }

                    div class="chat-panel" {
                        div id="chat-messages" class="chat-messages" {
                            (bot_message(&welcome.text, &welcome.quick_replies, session))
                        }

                        div class="chat-input-area" {
                            button class="secondary-btn"
                                hx-post="/chat"
                                hx-target="#chat-messages"
                                hx-swap="beforeend"
                                hx-vals=(quick_reply_vals(session, NEW_CASE_REPLY)) {
                                "Reiniciar"
                            }

                            form id="chat-form"
                                hx-post="/chat"
                                hx-target="#chat-messages"
                                hx-swap="beforeend"
                                hx-on--after-request="this.reset()" {
                                input type="hidden" name="session" value=(session);
                                input type="text" name="message"
                                    placeholder="Describe lo que ocurrió..."
                                    autocomplete="off"
                                    autofocus;
                                button type="submit" { "Enviar" }
                            }
                        }
                    }
                }
                script {
                    "new MutationObserver(() => { const c = document.getElementById('chat-messages'); \
                     c.scrollTop = c.scrollHeight; }).observe(document.getElementById('chat-messages'), { childList: true });"
                }
            }
        }
    }
}

/// Fragmento de un turno: lo que escribió el ciudadano y la respuesta.
pub fn exchange(user_text: &str, reply: &Reply, session: &str) -> Markup {
    html! {
        div class="message user-message" {
            div class="message-role" { "Ciudadano" }
            div class="message-content" { (user_text) }
        }
        (bot_message(&reply.text, &reply.quick_replies, session))
    }
}

/// Mensaje del asistente. Los saltos de línea se conservan y cada respuesta
/// rápida es un botón que envía su texto como mensaje.
fn bot_message(text: &str, quick_replies: &[String], session: &str) -> Markup {
    html! {
        div class="message bot-message" {
            div class="message-role" { "Asistente" }
            div class="message-content" {
                @for (i, line) in text.lines().enumerate() {
                    @if i > 0 { br; }
                    (line)
                }
            }
            @if !quick_replies.is_empty() {
                div class="quick-replies" {
                    @for option in quick_replies {
                        button class="quick-reply"
                            hx-post="/chat"
                            hx-target="#chat-messages"
                            hx-swap="beforeend"
                            hx-vals=(quick_reply_vals(session, option)) {
                            (option)
                        }
                    }
                }
            }
        }
    }
}

/// `hx-vals` en JSON; serde_json escapa comillas del texto.
fn quick_reply_vals(session: &str, message: &str) -> String {
    serde_json::json!({ "session": session, "message": message }).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orchestrator::ConversationState;

    #[test]
    fn page_carries_session_and_welcome() {
        let welcome = Prompt::with_replies("Hola\nCuéntame", &["Denuncia"]);
        let page = full_page("s-1", &welcome).into_string();
        assert!(page.contains(r#"name="session" value="s-1""#));
        assert!(page.contains("Hola<br>Cuéntame"));
        assert!(page.contains("&quot;message&quot;:&quot;Nuevo caso&quot;"));
        assert!(page.contains(">Denuncia</button>"));
    }

    #[test]
    fn exchange_escapes_user_text_and_renders_buttons() {
        let reply = Reply {
            text: "¿El agresor es familiar?".into(),
            quick_replies: vec!["Sí".into(), "No".into()],
            state: ConversationState::AwaitingLink,
            outcome: None,
        };
        let html = exchange("<b>golpe</b>", &reply, "s-1").into_string();
        assert!(html.contains("&lt;b&gt;golpe&lt;/b&gt;"));
        assert!(html.contains(">Sí</button>"));
        assert!(html.contains(">No</button>"));
        assert!(html.contains("&quot;message&quot;:&quot;Sí&quot;"));
    }
}
