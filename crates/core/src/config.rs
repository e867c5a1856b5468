use std::env;
use std::time::Duration;

use crate::error::{AppError, Result};
use crate::generation::RetryPolicy;
use dotenvy::dotenv;

pub const DEFAULT_TEXT_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_IMAGE_MODEL: &str = "gemini-2.5-flash-image";
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/";
pub const DEFAULT_MAX_PROMPT_CHARS: usize = 1500;
pub const MAX_RETRY_DELAY_MS: u64 = 60_000;

#[derive(Clone, Debug)]
pub struct Config {
    pub text_model: String,
    pub image_model: String,
    pub base_url: String,
    /// Refined descriptions are cut to this many characters before synthesis.
    pub max_prompt_chars: usize,
    pub retry: RetryPolicy,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            text_model: DEFAULT_TEXT_MODEL.to_string(),
            image_model: DEFAULT_IMAGE_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            max_prompt_chars: DEFAULT_MAX_PROMPT_CHARS,
            retry: RetryPolicy::default(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        // Load .env file if it exists, ignore if it doesn't
        let _ = dotenv();
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds a config from `lookup`, which maps variable names to values.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Config`] for a prompt limit that is not a positive
    /// integer or a retry delay outside `0..=MAX_RETRY_DELAY_MS`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(model) = lookup("ARCHSKETCH_TEXT_MODEL") {
            config.text_model = model;
        }
        if let Some(model) = lookup("ARCHSKETCH_IMAGE_MODEL") {
            config.image_model = model;
        }
        if let Some(url) = lookup("ARCHSKETCH_BASE_URL") {
            config.base_url = url;
        }
        if let Some(raw) = lookup("ARCHSKETCH_MAX_PROMPT_CHARS") {
            config.max_prompt_chars = raw.trim().parse().ok().filter(|&n: &usize| n > 0).ok_or_else(|| {
                AppError::config(format!("ARCHSKETCH_MAX_PROMPT_CHARS must be a positive integer, got '{}'", raw))
            })?;
        }
        if let Some(raw) = lookup("ARCHSKETCH_RETRY_DELAY_MS") {
            let millis = raw
                .trim()
                .parse()
                .ok()
                .filter(|&ms: &u64| ms <= MAX_RETRY_DELAY_MS)
                .ok_or_else(|| {
                    AppError::config(format!(
                        "ARCHSKETCH_RETRY_DELAY_MS must be 0..={} milliseconds, got '{}'",
                        MAX_RETRY_DELAY_MS, raw
                    ))
                })?;
            config.retry.base_delay = Duration::from_millis(millis);
        }

        Ok(config)
    }
}

/// Supplies the API secret to whoever builds a remote client.
///
/// Core logic never reads credentials from the environment itself; a provider
/// is handed in at construction time and asked exactly once.
pub trait CredentialProvider {
    fn api_key(&self) -> Result<String>;
}

/// Reads `GEMINI_API_KEY`, then `API_KEY`, from the process environment.
#[derive(Clone, Copy, Debug, Default)]
pub struct EnvCredentials;

impl CredentialProvider for EnvCredentials {
    fn api_key(&self) -> Result<String> {
        let _ = dotenv();

        ["GEMINI_API_KEY", "API_KEY"]
            .iter()
            .find_map(|name| env::var(name).ok().filter(|v| !v.trim().is_empty()))
            .ok_or_else(|| {
                AppError::MissingEnvVar(
                    "GEMINI_API_KEY must be set in environment or .env file".to_string(),
                )
            })
    }
}

/// A key that is already known, e.g. entered by the user.
#[derive(Clone, Debug)]
pub struct StaticCredentials(pub String);

impl CredentialProvider for StaticCredentials {
    fn api_key(&self) -> Result<String> {
        if self.0.trim().is_empty() {
            return Err(AppError::config("API key is empty"));
        }
        Ok(self.0.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn defaults_match_the_retry_contract() {
        let config = Config::default();
        assert_eq!(config.retry.max_attempts, 3);
        assert_eq!(config.retry.base_delay, Duration::from_millis(2000));
        assert_eq!(config.max_prompt_chars, DEFAULT_MAX_PROMPT_CHARS);
    }

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn empty_environment_gives_defaults() {
        let config = Config::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.text_model, DEFAULT_TEXT_MODEL);
        assert_eq!(config.image_model, DEFAULT_IMAGE_MODEL);
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
    }

    #[test]
    fn overrides_apply() {
        let config = Config::from_lookup(lookup(&[
            ("ARCHSKETCH_TEXT_MODEL", "text-x"),
            ("ARCHSKETCH_IMAGE_MODEL", "image-y"),
            ("ARCHSKETCH_BASE_URL", "http://localhost:8080/"),
            ("ARCHSKETCH_MAX_PROMPT_CHARS", " 800 "),
            ("ARCHSKETCH_RETRY_DELAY_MS", "250"),
        ]))
        .unwrap();
        assert_eq!(config.text_model, "text-x");
        assert_eq!(config.image_model, "image-y");
        assert_eq!(config.base_url, "http://localhost:8080/");
        assert_eq!(config.max_prompt_chars, 800);
        assert_eq!(config.retry.base_delay, Duration::from_millis(250));
        assert_eq!(config.retry.max_attempts, 3);
    }

    #[test]
    fn malformed_numbers_are_config_errors() {
        for (name, value) in [
            ("ARCHSKETCH_MAX_PROMPT_CHARS", "lots"),
            ("ARCHSKETCH_MAX_PROMPT_CHARS", "0"),
            ("ARCHSKETCH_MAX_PROMPT_CHARS", "-5"),
            ("ARCHSKETCH_RETRY_DELAY_MS", "soon"),
            ("ARCHSKETCH_RETRY_DELAY_MS", "60001"),
            ("ARCHSKETCH_RETRY_DELAY_MS", "18446744073709551615"),
        ] {
            let result = Config::from_lookup(lookup(&[(name, value)]));
            assert!(matches!(result, Err(AppError::Config(_))), "{name}={value}");
        }
        let zero_delay = Config::from_lookup(lookup(&[("ARCHSKETCH_RETRY_DELAY_MS", "0")])).unwrap();
        assert_eq!(zero_delay.retry.base_delay, Duration::ZERO);
    }

    #[test]
    fn static_credentials_reject_blank_keys() {
        assert!(StaticCredentials("   ".into()).api_key().is_err());
        assert_eq!(StaticCredentials("abc".into()).api_key().unwrap(), "abc");
    }
}
