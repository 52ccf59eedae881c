use serde::Deserialize;

/// Header rule configuration for a provider
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum HeaderRuleConfig {
    /// Forward a header from the inbound request
    Forward(HeaderForwardConfig),
    /// Insert a static header
    Insert(HeaderInsertConfig),
    /// Remove a header
    Remove(HeaderRemoveConfig),
}

/// Forward a header, optionally renaming it
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HeaderForwardConfig {
    /// Header name or pattern
    pub name: String,
    /// Rename the header
    #[serde(default)]
    pub rename: Option<String>,
    /// Default value if not present
    #[serde(default)]
    pub default: Option<String>,
}

/// Insert a static header
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HeaderInsertConfig {
    /// Header name
    pub name: String,
    /// Header value
    pub value: String,
}

/// Remove a header by name or pattern
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HeaderRemoveConfig {
    /// Header name or pattern
    pub name: String,
}
