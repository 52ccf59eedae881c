use secrecy::SecretString;
use serde::Deserialize;
use url::Url;

use crate::headers::HeaderRuleConfig;

/// Configuration for a single upstream provider deployment
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProviderEntry {
    /// Provider slug (e.g. `openai`, `azure`, `xai`, `github_copilot`)
    #[serde(rename = "type")]
    pub provider_type: String,
    /// API key for authentication
    #[serde(default)]
    pub api_key: Option<SecretString>,
    /// Base URL override
    #[serde(default)]
    pub base_url: Option<Url>,
    /// API version query parameter (Azure-style endpoints)
    #[serde(default)]
    pub api_version: Option<String>,
    /// Header rules applied to outbound calls for this provider
    #[serde(default)]
    pub headers: Vec<HeaderRuleConfig>,
    /// Forward the caller's bearer token to the provider
    #[serde(default)]
    pub forward_authorization: bool,
    /// Per-provider override of the process-wide `drop_params` flag
    #[serde(default)]
    pub drop_params: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_entry_parses_with_defaults() {
        let entry: ProviderEntry = toml::from_str(
            r#"
            type = "azure"
            base_url = "https://foo.openai.azure.com"
            api_version = "2024-05-01-preview"
            "#,
        )
        .unwrap();

        assert_eq!(entry.provider_type, "azure");
        assert!(entry.api_key.is_none());
        assert!(!entry.forward_authorization);
        assert!(entry.drop_params.is_none());
        assert_eq!(entry.api_version.as_deref(), Some("2024-05-01-preview"));
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let result: Result<ProviderEntry, _> = toml::from_str(
            r#"
            type = "openai"
            api_keey = "typo"
            "#,
        );
        assert!(result.is_err());
    }
}
