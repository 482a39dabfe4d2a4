//! Provider credentials.
//!
//! # Security
//! - Keys are loaded ONLY from the process environment (optionally seeded from `.env`)
//! - Keys are never logged in full or serialized
//! - A missing key disables the matching provider client, it never aborts startup

/// Environment variable holding the financial-data API key.
pub const FINANCIAL_KEY_ENV_VAR: &str = "ALPHA_VANTAGE_API_KEY";

/// Environment variable holding the generative-text API key.
pub const GENERATIVE_KEY_ENV_VAR: &str = "GEMINI_API_KEY";

/// Immutable provider secrets, read once at startup.
#[derive(Clone, Default)]
pub struct Credentials {
    pub financial_api_key: Option<String>,
    pub generative_api_key: Option<String>,
}

impl Credentials {
    /// Read both keys from the environment. Empty values count as absent.
    pub fn from_env() -> Self {
        Self {
            financial_api_key: read_key(FINANCIAL_KEY_ENV_VAR),
            generative_api_key: read_key(GENERATIVE_KEY_ENV_VAR),
        }
    }

    /// Log which keys were found, masked.
    pub fn log_summary(&self) {
        tracing::info!(
            env_var = FINANCIAL_KEY_ENV_VAR,
            key = %mask_key(self.financial_api_key.as_deref()),
            "Financial-data API key loaded"
        );
        tracing::info!(
            env_var = GENERATIVE_KEY_ENV_VAR,
            key = %mask_key(self.generative_api_key.as_deref()),
            "Generative-text API key loaded"
        );
        if self.financial_api_key.is_none() {
            tracing::warn!("{} is not set. Financial data requests will fail.", FINANCIAL_KEY_ENV_VAR);
        }
        if self.generative_api_key.is_none() {
            tracing::warn!("{} is not set. AI generation will not work.", GENERATIVE_KEY_ENV_VAR);
        }
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("financial_api_key", &mask_key(self.financial_api_key.as_deref()))
            .field("generative_api_key", &mask_key(self.generative_api_key.as_deref()))
            .finish()
    }
}

fn read_key(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// Render a key as `abcd...wxyz`, or `(not set)`.
///
/// Keys too short to mask without revealing most of them are fully hidden.
pub fn mask_key(key: Option<&str>) -> String {
    match key {
        None => "(not set)".to_string(),
        Some(key) if key.chars().count() <= 8 => "****".to_string(),
        Some(key) => {
            let chars: Vec<char> = key.chars().collect();
            let head: String = chars[..4].iter().collect();
            let tail: String = chars[chars.len() - 4..].iter().collect();
            format!("{}...{}", head, tail)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask_key() {
        assert_eq!(mask_key(None), "(not set)");
        assert_eq!(mask_key(Some("short")), "****");
        assert_eq!(mask_key(Some("ABCD1234567890WXYZ")), "ABCD...WXYZ");
    }

    #[test]
    fn test_debug_never_prints_keys() {
        let credentials = Credentials {
            financial_api_key: Some("SECRETSECRETSECRET".to_string()),
            generative_api_key: None,
        };
        let rendered = format!("{:?}", credentials);
        assert!(!rendered.contains("SECRETSECRETSECRET"));
        assert!(rendered.contains("SECR...CRET"));
        assert!(rendered.contains("(not set)"));
    }
}
