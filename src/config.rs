use std::time::Duration;

#[derive(Clone)]
pub struct Config {
    pub database_url: String,
    pub llm_api_key: String,
    pub llm_base_url: String,
    pub llm_model: String,
    pub llm_timeout: Duration,
    pub llm_max_attempts: u32,
    pub llm_retry_delay: Duration,
    pub public_api_base_url: String,
    pub allowed_origins: Vec<String>,
    pub host: String,
    pub port: u16,
}

impl Config {
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        dotenvy::dotenv().ok();

        let database_url = std::env::var("DATABASE_URL")
            .unwrap_or_else(|_| "sqlite://feedback.db".to_string());

        let llm_api_key = resolve_api_key(
            std::env::var("LLM_API_KEY").ok(),
            std::env::var("OPENROUTER_API_KEY").ok(),
        )
        .ok_or("LLM_API_KEY (or OPENROUTER_API_KEY) must be set")?;

        let llm_base_url = std::env::var("LLM_BASE_URL")
            .unwrap_or_else(|_| "https://openrouter.ai/api/v1".to_string());
        let llm_model =
            std::env::var("LLM_MODEL").unwrap_or_else(|_| "openai/gpt-3.5-turbo".to_string());

        let llm_timeout = Duration::from_secs(env_number("LLM_TIMEOUT_SECS", 30));
        let llm_max_attempts = env_number("LLM_MAX_ATTEMPTS", 3u32).max(1);
        let llm_retry_delay = Duration::from_millis(env_number("LLM_RETRY_DELAY_MS", 1000));

        let public_api_base_url = std::env::var("PUBLIC_API_BASE_URL")
            .map(|url| url.trim_end_matches('/').to_string())
            .unwrap_or_default();

        let allowed_origins = parse_origins(
            &std::env::var("ALLOWED_ORIGINS").unwrap_or_else(|_| "*".to_string()),
        );

        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port: u16 = env_number("PORT", 8000);

        Ok(Self {
            database_url,
            llm_api_key,
            llm_base_url,
            llm_model,
            llm_timeout,
            llm_max_attempts,
            llm_retry_delay,
            public_api_base_url,
            allowed_origins,
            host,
            port,
        })
    }

    /// True when any origin may call the API.
    pub fn allows_any_origin(&self) -> bool {
        self.allowed_origins.is_empty() || self.allowed_origins.iter().any(|o| o == "*")
    }
}

/// First non-blank key wins; an empty `LLM_API_KEY=` line does not shadow the fallback.
fn resolve_api_key(primary: Option<String>, fallback: Option<String>) -> Option<String> {
    let usable = |key: Option<String>| {
        key.map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty())
    };
    usable(primary).or_else(|| usable(fallback))
}

fn env_number<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|origin| origin.trim().trim_end_matches('/'))
        .filter(|origin| !origin.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
impl Config {
    pub fn for_tests() -> Self {
        Self {
            database_url: "sqlite::memory:".to_string(),
            llm_api_key: "test-key".to_string(),
            llm_base_url: "http://127.0.0.1:9".to_string(),
            llm_model: "test-model".to_string(),
            llm_timeout: Duration::from_secs(5),
            llm_max_attempts: 3,
            llm_retry_delay: Duration::ZERO,
            public_api_base_url: String::new(),
            allowed_origins: vec!["*".to_string()],
            host: "127.0.0.1".to_string(),
            port: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_origins_splits_and_trims() {
        let origins = parse_origins(" https://a.example/ , https://b.example,, ");
        assert_eq!(origins, vec!["https://a.example", "https://b.example"]);
    }

    #[test]
    fn test_blank_primary_key_falls_back_to_openrouter_key() {
        let key = resolve_api_key(Some(String::new()), Some("sk-or-real".to_string()));
        assert_eq!(key.as_deref(), Some("sk-or-real"));

        let key = resolve_api_key(Some("  ".to_string()), Some("sk-or-real".to_string()));
        assert_eq!(key.as_deref(), Some("sk-or-real"));
    }

    #[test]
    fn test_primary_key_wins_and_blank_keys_are_missing() {
        let key = resolve_api_key(Some("sk-primary".to_string()), Some("sk-or".to_string()));
        assert_eq!(key.as_deref(), Some("sk-primary"));

        assert_eq!(resolve_api_key(Some(String::new()), Some(" ".to_string())), None);
        assert_eq!(resolve_api_key(None, None), None);
    }

    #[test]
    fn test_wildcard_allows_any_origin() {
        let mut config = Config::for_tests();
        assert!(config.allows_any_origin());

        config.allowed_origins = vec!["https://admin.example".to_string()];
        assert!(!config.allows_any_origin());
    }
}
