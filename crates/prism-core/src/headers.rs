use std::sync::OnceLock;

use http::header::{self, HeaderMap, HeaderName, HeaderValue};
use regex::Regex;

/// Rule for shaping headers on outbound provider requests
#[derive(Debug, Clone)]
pub enum HeaderRule {
    /// Carry a header over from the inbound request
    Forward(HeaderForward),
    /// Insert a static header value
    Insert(HeaderInsert),
    /// Drop a header
    Remove(HeaderRemove),
}

/// Forward an inbound header, optionally renaming it
#[derive(Debug, Clone)]
pub struct HeaderForward {
    /// Header name or pattern to match
    pub name: NameOrPattern,
    /// Name to use in the outbound request
    pub rename: Option<HeaderName>,
    /// Value to use when the inbound header is absent
    pub default: Option<HeaderValue>,
}

/// Insert a static header value
#[derive(Debug, Clone)]
pub struct HeaderInsert {
    /// Header name
    pub name: HeaderName,
    /// Header value
    pub value: HeaderValue,
}

/// Remove a header by name or pattern
#[derive(Debug, Clone)]
pub struct HeaderRemove {
    /// Header name or pattern
    pub name: NameOrPattern,
}

/// Either an exact header name or a regex over header names
#[derive(Debug, Clone)]
pub enum NameOrPattern {
    /// Exact header name
    Name(HeaderName),
    /// Compiled pattern matched against header names
    Pattern(HeaderPattern),
}

/// Compiled regex for matching header names
#[derive(Debug, Clone)]
pub struct HeaderPattern(pub Regex);

/// Hop-by-hop and transport headers that never cross to a provider
static DENY_LIST: OnceLock<[HeaderName; 10]> = OnceLock::new();

fn deny_list() -> &'static [HeaderName] {
    DENY_LIST.get_or_init(|| {
        [
            header::ACCEPT_ENCODING,
            header::AUTHORIZATION,
            header::CONNECTION,
            header::CONTENT_LENGTH,
            header::CONTENT_TYPE,
            header::HOST,
            header::PROXY_AUTHORIZATION,
            header::TE,
            header::TRANSFER_ENCODING,
            header::UPGRADE,
        ]
    })
}

/// Whether a header name is barred from forwarding
#[must_use]
pub fn is_header_denied(name: &HeaderName) -> bool {
    deny_list().contains(name)
}

/// Apply rules in order, producing the extra headers for an outbound call
///
/// Starts from an empty map; only headers a rule explicitly produces are
/// returned. Auth headers are handled separately by each provider's
/// environment validation, which is why `authorization` sits on the deny
/// list here.
#[must_use]
pub fn apply_header_rules(inbound: &HeaderMap, rules: &[HeaderRule]) -> HeaderMap {
    let mut outbound = HeaderMap::new();

    for rule in rules {
        match rule {
            HeaderRule::Forward(forward) => apply_forward(inbound, forward, &mut outbound),
            HeaderRule::Insert(insert) => {
                outbound.insert(insert.name.clone(), insert.value.clone());
            }
            HeaderRule::Remove(remove) => apply_remove(remove, &mut outbound),
        }
    }

    outbound
}

fn apply_forward(inbound: &HeaderMap, forward: &HeaderForward, outbound: &mut HeaderMap) {
    match &forward.name {
        NameOrPattern::Name(name) => {
            if is_header_denied(name) {
                return;
            }

            let value = inbound
                .get(name)
                .cloned()
                .or_else(|| forward.default.clone());

            if let Some(value) = value {
                let target = forward.rename.clone().unwrap_or_else(|| name.clone());
                outbound.insert(target, value);
            }
        }
        NameOrPattern::Pattern(pattern) => {
            let matched: Vec<_> = inbound
                .keys()
                .filter(|name| !is_header_denied(name) && pattern.0.is_match(name.as_str()))
                .cloned()
                .collect();

            for name in matched {
                if let Some(value) = inbound.get(&name).cloned() {
                    let target = forward.rename.clone().unwrap_or_else(|| name.clone());
                    outbound.insert(target, value);
                }
            }
        }
    }
}

fn apply_remove(remove: &HeaderRemove, outbound: &mut HeaderMap) {
    match &remove.name {
        NameOrPattern::Name(name) => {
            outbound.remove(name);
        }
        NameOrPattern::Pattern(pattern) => {
            let matched: Vec<_> = outbound
                .keys()
                .filter(|name| pattern.0.is_match(name.as_str()))
                .cloned()
                .collect();

            for name in matched {
                outbound.remove(&name);
            }
        }
    }
}
