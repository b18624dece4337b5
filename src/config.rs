use std::{env, path::PathBuf};

/// Backend origin used when `FRAUDDETECT_API_URL` is not set.
pub const DEFAULT_API_URL: &str = "http://127.0.0.1:8000";

const DEFAULT_SESSION_FILE: &str = ".frauddetect/session.json";

/// Runtime settings sourced from the environment (`.env` supported).
#[derive(Clone, Debug)]
pub struct AppConfig {
    /// Origin of the fraud-analysis backend.
    pub api_base_url: String,
    /// Location of the persisted session file.
    pub session_file: PathBuf,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_values(
            env::var("FRAUDDETECT_API_URL").ok(),
            env::var("FRAUDDETECT_SESSION_FILE").ok(),
        )
    }

    fn from_values(api_url: Option<String>, session_file: Option<String>) -> Self {
        let api_base_url = api_url
            .filter(|value| !value.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_API_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        let session_file = session_file
            .filter(|value| !value.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_SESSION_FILE));

        Self {
            api_base_url,
            session_file,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_when_nothing_is_set() {
        let config = AppConfig::from_values(None, None);
        assert_eq!(config.api_base_url, DEFAULT_API_URL);
        assert_eq!(config.session_file, PathBuf::from(DEFAULT_SESSION_FILE));
    }

    #[test]
    fn trailing_slash_is_trimmed_from_the_origin() {
        let config = AppConfig::from_values(Some("https://fraud.example.com/".to_string()), None);
        assert_eq!(config.api_base_url, "https://fraud.example.com");
    }

    #[test]
    fn blank_values_fall_back_to_defaults() {
        let config = AppConfig::from_values(Some("   ".to_string()), Some(String::new()));
        assert_eq!(config.api_base_url, DEFAULT_API_URL);
        assert_eq!(config.session_file, PathBuf::from(DEFAULT_SESSION_FILE));
    }
}
