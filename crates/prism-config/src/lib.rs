#![allow(clippy::must_use_candidate)]

mod env;
pub mod headers;
mod loader;
pub mod oauth;
pub mod providers;
pub mod server;

use indexmap::IndexMap;
use serde::Deserialize;

pub use headers::*;
pub use oauth::OauthConfig;
pub use providers::ProviderEntry;
pub use server::ServerConfig;

/// Top-level prism configuration
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,
    /// Silently drop request parameters the target provider does not
    /// support instead of rejecting the request
    #[serde(default)]
    pub drop_params: bool,
    /// OAuth token persistence configuration
    #[serde(default)]
    pub oauth: OauthConfig,
    /// Provider configurations keyed by deployment name
    #[serde(default)]
    pub providers: IndexMap<String, ProviderEntry>,
}
