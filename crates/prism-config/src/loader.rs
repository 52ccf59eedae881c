use std::path::Path;

use crate::Config;

impl Config {
    /// Load configuration from a TOML file
    ///
    /// Reads the file, expands `{{ env.VAR }}` placeholders, then
    /// deserializes and validates the result.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, environment variable
    /// expansion fails, TOML parsing fails, or validation fails
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("failed to read config file {}: {e}", path.display()))?;

        let expanded =
            crate::env::expand_env(&raw).map_err(|e| anyhow::anyhow!("config variable expansion failed: {e}"))?;

        let config: Self = toml::from_str(&expanded).map_err(|e| anyhow::anyhow!("failed to parse config: {e}"))?;

        config.validate()?;

        Ok(config)
    }

    /// Validate that the configuration is internally consistent
    ///
    /// # Errors
    ///
    /// Returns an error if a provider entry is malformed
    pub fn validate(&self) -> anyhow::Result<()> {
        for (name, provider) in &self.providers {
            if provider.provider_type.trim().is_empty() {
                anyhow::bail!("provider '{name}' has an empty type");
            }

            if let Some(url) = &provider.base_url
                && !matches!(url.scheme(), "http" | "https")
            {
                anyhow::bail!("provider '{name}' base_url must be http or https, got '{}'", url.scheme());
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::Config;

    #[test]
    fn full_config_round_trip() {
        let raw = r#"
            drop_params = true

            [server]
            listen_address = "127.0.0.1:4000"

            [oauth]
            token_dir = "/tmp/prism-oauth"

            [providers.azure-prod]
            type = "azure"
            base_url = "https://foo.openai.azure.com"
            api_version = "2024-05-01-preview"

            [providers.grok]
            type = "xai"
            forward_authorization = true
        "#;

        let config: Config = toml::from_str(raw).unwrap();
        config.validate().unwrap();

        assert!(config.drop_params);
        assert_eq!(config.providers.len(), 2);
        assert_eq!(config.providers["grok"].provider_type, "xai");
    }

    #[test]
    fn rejects_non_http_base_url() {
        let raw = r#"
            [providers.bad]
            type = "openai"
            base_url = "ftp://example.com"
        "#;

        let config: Config = toml::from_str(raw).unwrap();
        assert!(config.validate().is_err());
    }
}
