use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde_json::{Map, Value};

/// Decode the payload claims of a JWT without verifying its signature
///
/// This is a cache heuristic only — expiry timestamps and account ids are
/// read from the claims to avoid needless refreshes. It is never used as
/// an authorization check; the upstream provider validates the token.
#[must_use]
pub fn decode_claims(token: &str) -> Option<Map<String, Value>> {
    let payload = token.split('.').nth(1)?;
    let bytes = URL_SAFE_NO_PAD.decode(payload).ok()?;

    match serde_json::from_slice::<Value>(&bytes) {
        Ok(Value::Object(map)) => Some(map),
        _ => None,
    }
}

/// Read the `exp` claim as epoch seconds
#[must_use]
pub fn expiry_claim(token: &str) -> Option<i64> {
    decode_claims(token)?.get("exp")?.as_i64()
}

/// Read a (possibly nested) string claim by path segments
#[must_use]
pub fn string_claim(claims: &Map<String, Value>, path: &[&str]) -> Option<String> {
    let (first, rest) = path.split_first()?;
    let mut current = claims.get(*first)?;

    for segment in rest {
        current = current.get(segment)?;
    }

    current.as_str().map(ToOwned::to_owned)
}
