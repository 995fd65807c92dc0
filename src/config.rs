//! Environment-driven configuration

use std::path::PathBuf;

const DEFAULT_PORT: u16 = 8000;
const DEFAULT_MODEL: &str = "gemini-pro";

/// Configuration for the generative-text client
#[derive(Debug, Clone, Default)]
pub struct LlmConfig {
    pub google_api_key: Option<String>,
    /// Model name, e.g. `gemini-pro`
    pub model: String,
    /// Alternate base URL; the gateway handles authentication
    pub gateway: Option<String>,
}

/// Server configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub db_path: PathBuf,
    pub port: u16,
    pub llm: LlmConfig,
}

impl AppConfig {
    /// Read configuration from the process environment
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let db_path = non_empty("LEARNING_DB_PATH").map_or_else(
            || {
                let home = non_empty("HOME").unwrap_or_else(|| "/tmp".to_string());
                PathBuf::from(home).join(".adaptive-learning/chat_history.db")
            },
            PathBuf::from,
        );

        let port = non_empty("LEARNING_PORT")
            .and_then(|p| p.parse().ok())
            .unwrap_or(DEFAULT_PORT);

        Self {
            db_path,
            port,
            llm: LlmConfig {
                google_api_key: non_empty("GOOGLE_API_KEY"),
                model: non_empty("GEMINI_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
                gateway: non_empty("LLM_GATEWAY"),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> AppConfig {
        let env: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        AppConfig::from_lookup(|key| env.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[("HOME", "/home/ada")]);
        assert_eq!(
            config.db_path,
            PathBuf::from("/home/ada/.adaptive-learning/chat_history.db")
        );
        assert_eq!(config.port, 8000);
        assert_eq!(config.llm.model, "gemini-pro");
        assert!(config.llm.google_api_key.is_none());
        assert!(config.llm.gateway.is_none());
    }

    #[test]
    fn test_overrides() {
        let config = config_from(&[
            ("LEARNING_DB_PATH", "/data/chat.db"),
            ("LEARNING_PORT", "9100"),
            ("GOOGLE_API_KEY", "abc"),
            ("GEMINI_MODEL", "gemini-1.5-flash"),
            ("LLM_GATEWAY", "http://gw"),
        ]);
        assert_eq!(config.db_path, PathBuf::from("/data/chat.db"));
        assert_eq!(config.port, 9100);
        assert_eq!(config.llm.google_api_key.as_deref(), Some("abc"));
        assert_eq!(config.llm.model, "gemini-1.5-flash");
        assert_eq!(config.llm.gateway.as_deref(), Some("http://gw"));
    }

    #[test]
    fn test_blank_and_invalid_values_fall_back() {
        let config = config_from(&[("GOOGLE_API_KEY", "  "), ("LEARNING_PORT", "not-a-port")]);
        assert!(config.llm.google_api_key.is_none());
        assert_eq!(config.port, 8000);
        assert_eq!(config.db_path, PathBuf::from("/tmp/.adaptive-learning/chat_history.db"));
    }
}
