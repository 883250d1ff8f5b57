pub const DEFAULT_API_URL: &str = "http://localhost:8000";
pub const API_URL_ENV: &str = "BARQ_API_URL";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsoleConfig {
    pub api_url: String,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
        }
    }
}

impl ConsoleConfig {
    pub fn new(api_url: impl Into<String>) -> Self {
        let api_url = api_url.into();
        let trimmed = api_url.trim().trim_end_matches('/');
        if trimmed.is_empty() {
            return Self::default();
        }
        Self {
            api_url: trimmed.to_string(),
        }
    }

    /// Reads `BARQ_API_URL`, falling back to the local default.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        match lookup(API_URL_ENV) {
            Some(url) => Self::new(url),
            None => Self::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_local() {
        let config = ConsoleConfig::from_lookup(|_| None);
        assert_eq!(config.api_url, "http://localhost:8000");
    }

    #[test]
    fn test_env_override_trims_trailing_slash() {
        let config = ConsoleConfig::from_lookup(|key| {
            (key == API_URL_ENV).then(|| "https://barq.example.com/api/".to_string())
        });
        assert_eq!(config.api_url, "https://barq.example.com/api");
    }

    #[test]
    fn test_blank_value_uses_default() {
        let config = ConsoleConfig::from_lookup(|_| Some("   ".to_string()));
        assert_eq!(config, ConsoleConfig::default());
    }
}
