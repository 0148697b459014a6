//! # Configuración — Variables de Entorno
//!
//! | Variable | Default | Uso |
//! |----------|---------|-----|
//! | `PORT` | `3000` | puerto HTTP |
//! | `BIND_ADDR` | `0.0.0.0` | interfaz de escucha |
//! | `KNOWLEDGE_PATH` | `data/knowledge.json` | tablas de referencia |
//! | `OPENAI_API_KEY` | — | sin clave se usa la heurística local |
//! | `OPENAI_MODEL` | `gpt-4o-mini` | modelo del clasificador |
//! | `OPENAI_BASE_URL` | `https://api.openai.com/v1` | endpoint compatible |
//! | `CLASSIFIER_TIMEOUT_SECS` | `8` | límite por llamada al clasificador |
//! | `SESSION_TTL_MINUTES` | `30` | inactividad antes de descartar una sesión |

use std::time::Duration;

use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("{name} debe ser un número positivo, se recibió '{value}'")]
    InvalidNumber { name: &'static str, value: String },
}

#[derive(Clone, Debug)]
pub struct Config {
    pub port: u16,
    pub bind_addr: String,
    pub knowledge_path: String,
    pub openai_api_key: Option<String>,
    pub openai_model: String,
    pub openai_base_url: String,
    pub classifier_timeout: Duration,
    pub session_ttl: chrono::Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 3000,
            bind_addr: "0.0.0.0".into(),
            knowledge_path: "data/knowledge.json".into(),
            openai_api_key: None,
            openai_model: "gpt-4o-mini".into(),
            openai_base_url: "https://api.openai.com/v1".into(),
            classifier_timeout: Duration::from_secs(8),
            session_ttl: chrono::Duration::minutes(30),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Construye la configuración desde cualquier fuente clave → valor.
    /// Los valores vacíos cuentan como ausentes.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |name: &str| lookup(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let defaults = Self::default();

        Ok(Self {
            port: match get("PORT") {
                Some(v) => parse_positive("PORT", &v)?,
                None => defaults.port,
            },
            bind_addr: get("BIND_ADDR").unwrap_or(defaults.bind_addr),
            knowledge_path: get("KNOWLEDGE_PATH").unwrap_or(defaults.knowledge_path),
            openai_api_key: get("OPENAI_API_KEY"),
            openai_model: get("OPENAI_MODEL").unwrap_or(defaults.openai_model),
            openai_base_url: get("OPENAI_BASE_URL").unwrap_or(defaults.openai_base_url),
            classifier_timeout: match get("CLASSIFIER_TIMEOUT_SECS") {
                Some(v) => Duration::from_secs(parse_positive("CLASSIFIER_TIMEOUT_SECS", &v)?),
                None => defaults.classifier_timeout,
            },
            session_ttl: match get("SESSION_TTL_MINUTES") {
                Some(v) => chrono::Duration::try_minutes(parse_positive("SESSION_TTL_MINUTES", &v)?)
                    .ok_or(ConfigError::InvalidNumber { name: "SESSION_TTL_MINUTES", value: v })?,
                None => defaults.session_ttl,
            },
        })
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.bind_addr, self.port)
    }
}

fn parse_positive<T>(name: &'static str, value: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr + PartialOrd + Default,
{
    match value.parse::<T>() {
        Ok(n) if n > T::default() => Ok(n),
        _ => Err(ConfigError::InvalidNumber { name, value: value.to_string() }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> =
            pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn defaults_when_unset() {
        let config = Config::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.port, 3000);
        assert_eq!(config.listen_addr(), "0.0.0.0:3000");
        assert_eq!(config.knowledge_path, "data/knowledge.json");
        assert_eq!(config.openai_api_key, None);
        assert_eq!(config.classifier_timeout, Duration::from_secs(8));
        assert_eq!(config.session_ttl, chrono::Duration::minutes(30));
    }

    #[test]
    fn reads_overrides_and_treats_blank_as_unset() {
        let config = Config::from_lookup(lookup(&[
            ("PORT", "8080"),
            ("OPENAI_API_KEY", "  "),
            ("OPENAI_MODEL", "gpt-4.1-mini"),
            ("CLASSIFIER_TIMEOUT_SECS", "3"),
        ]))
        .unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.openai_api_key, None);
        assert_eq!(config.openai_model, "gpt-4.1-mini");
        assert_eq!(config.classifier_timeout, Duration::from_secs(3));
    }

    #[test]
    fn rejects_invalid_numbers() {
        let err = Config::from_lookup(lookup(&[("SESSION_TTL_MINUTES", "media hora")])).unwrap_err();
        assert_eq!(
            err,
            ConfigError::InvalidNumber { name: "SESSION_TTL_MINUTES", value: "media hora".into() }
        );
        assert!(Config::from_lookup(lookup(&[("PORT", "0")])).is_err());
    }
}
