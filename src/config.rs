//! Configuration types.
//!
//! Everything is read from environment variables (a `.env` file is loaded
//! first by the binary). Unset variables fall back to defaults; set but
//! unparseable ones are errors.

use std::net::SocketAddr;
use std::path::PathBuf;

use secrecy::SecretString;

use crate::error::ConfigError;
use crate::llm::{DEFAULT_MODEL, LlmConfig};

/// Service configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Address the REST server binds to.
    pub host: String,
    pub port: u16,
    /// Key for the answering model. Q&A requests fail while unset.
    pub api_key: Option<SecretString>,
    pub qa_model: String,
    /// Subject the retrieval index covers; steers intent classification.
    pub qa_topic: String,
    /// Search endpoint for grounding passages. Q&A answers directly when unset.
    pub retriever_url: Option<String>,
    pub retriever_top_k: usize,
    /// First-message keyword that starts the intake flow.
    pub flow_keyword: String,
    /// First-message keyword that starts Q&A mode.
    pub qa_keyword: String,
    /// Run the stdin REPL alongside the server.
    pub cli_enabled: bool,
    /// Directory for daily-rolling log files, in addition to stderr.
    pub log_dir: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
            api_key: None,
            qa_model: DEFAULT_MODEL.to_string(),
            qa_topic: "Jordan Peterson".to_string(),
            retriever_url: None,
            retriever_top_k: 3,
            flow_keyword: "flow".to_string(),
            qa_keyword: "rag".to_string(),
            cli_enabled: true,
            log_dir: None,
        }
    }
}

impl AppConfig {
    /// Build config from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build config from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let var = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let port = match var("INTAKE_PORT") {
            Some(raw) => parse_value("INTAKE_PORT", &raw)?,
            None => defaults.port,
        };
        let retriever_top_k = match var("INTAKE_RETRIEVER_TOP_K") {
            Some(raw) => {
                let k: usize = parse_value("INTAKE_RETRIEVER_TOP_K", &raw)?;
                if k == 0 {
                    return Err(ConfigError::InvalidValue {
                        key: "INTAKE_RETRIEVER_TOP_K".to_string(),
                        message: "must be at least 1".to_string(),
                    });
                }
                k
            }
            None => defaults.retriever_top_k,
        };
        let cli_enabled = match var("INTAKE_CLI") {
            Some(raw) => parse_bool("INTAKE_CLI", &raw)?,
            None => defaults.cli_enabled,
        };

        Ok(Self {
            host: var("INTAKE_HOST").unwrap_or(defaults.host),
            port,
            api_key: var("GROQ_API_KEY").map(SecretString::from),
            qa_model: var("INTAKE_QA_MODEL").unwrap_or(defaults.qa_model),
            qa_topic: var("INTAKE_QA_TOPIC").unwrap_or(defaults.qa_topic),
            retriever_url: var("INTAKE_RETRIEVER_URL"),
            retriever_top_k,
            flow_keyword: var("INTAKE_FLOW_KEYWORD").unwrap_or(defaults.flow_keyword),
            qa_keyword: var("INTAKE_QA_KEYWORD").unwrap_or(defaults.qa_keyword),
            cli_enabled,
            log_dir: var("INTAKE_LOG_DIR").map(PathBuf::from),
        })
    }

    /// Socket address for the REST server.
    pub fn bind_addr(&self) -> Result<SocketAddr, ConfigError> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| ConfigError::InvalidValue {
                key: "INTAKE_HOST".to_string(),
                message: format!("{e}"),
            })
    }

    /// LLM settings, or `None` when no API key is configured.
    pub fn llm_config(&self) -> Option<LlmConfig> {
        let api_key = self.api_key.clone()?;
        Some(LlmConfig {
            api_key,
            model: self.qa_model.clone(),
        })
    }
}

fn parse_value<T>(key: &str, raw: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    raw.parse().map_err(|e: T::Err| ConfigError::InvalidValue {
        key: key.to_string(),
        message: format!("{raw:?}: {e}"),
    })
}

fn parse_bool(key: &str, raw: &str) -> Result<bool, ConfigError> {
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            key: key.to_string(),
            message: format!("{raw:?} is not a boolean"),
        }),
    }
}
