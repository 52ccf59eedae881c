use std::path::PathBuf;

use serde::Deserialize;

/// OAuth token persistence configuration
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OauthConfig {
    /// Directory holding one persisted token record per provider
    ///
    /// Defaults to `prism/oauth` under the user's config home.
    #[serde(default)]
    pub token_dir: Option<PathBuf>,
}
