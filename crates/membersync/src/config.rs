use std::env;

use activecampaign::AcConfig;

const DEFAULT_URL_PARAM_NAME: &str = "source";
const DEFAULT_DEBUG_LOGGING: bool = false;

/// Integration configuration, loaded once from the environment.
///
/// Tagging and sync are inert unless both the API base URL and the API key
/// are present; everything else has a default.
#[derive(Debug, Clone)]
pub struct Config {
    /// API base URL, stored without a trailing slash.
    pub api_base_url: Option<String>,
    pub api_key: Option<String>,
    /// Query parameter whose value becomes the attribution tag.
    pub url_param_name: String,
    pub debug_logging: bool,
    /// Optional prefix applied to every resolved tag before sync.
    pub tag_prefix: Option<String>,
}

impl Config {
    #[must_use]
    pub fn from_env() -> Self {
        let api_base_url = env::var("MSYNC_API_BASE_URL")
            .ok()
            .map(|value| value.trim().trim_end_matches('/').to_string())
            .filter(|value| !value.is_empty());

        let api_key = env::var("MSYNC_API_KEY")
            .ok()
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty());

        let url_param_name = env::var("MSYNC_URL_PARAM")
            .ok()
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| DEFAULT_URL_PARAM_NAME.to_string());

        let debug_logging = env::var("MSYNC_DEBUG")
            .ok()
            .map(|value| matches!(value.trim().to_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(DEFAULT_DEBUG_LOGGING);

        let tag_prefix = env::var("MSYNC_TAG_PREFIX")
            .ok()
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty());

        Self {
            api_base_url,
            api_key,
            url_param_name,
            debug_logging,
            tag_prefix,
        }
    }

    /// Both credentials present; the gate for every sync feature.
    #[must_use]
    pub fn is_configured(&self) -> bool {
        self.api_base_url.is_some() && self.api_key.is_some()
    }

    /// Client configuration, when the credentials are present.
    #[must_use]
    pub fn ac_config(&self) -> Option<AcConfig> {
        match (&self.api_base_url, &self.api_key) {
            (Some(base_url), Some(api_key)) => Some(AcConfig::new(base_url, api_key)),
            _ => None,
        }
    }
}

#[cfg(test)]
impl Config {
    #[must_use]
    pub fn for_tests() -> Self {
        Self {
            api_base_url: Some("https://account.api-us1.com".to_string()),
            api_key: Some("key-123".to_string()),
            url_param_name: DEFAULT_URL_PARAM_NAME.to_string(),
            debug_logging: false,
            tag_prefix: None,
        }
    }
}
