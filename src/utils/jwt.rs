use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde_json::Value;

use crate::models::Role;

/// Decodes the claims (middle segment) of a JWT-shaped token without verifying it.
/// Only a UI hint: the backend stays the authority for every privileged call.
pub fn decode_claims(token: &str) -> Option<Value> {
    let mut segments = token.split('.');
    let (_header, payload) = (segments.next()?, segments.next()?);

    // Tolerate standard-alphabet and padded encodings
    let normalized: String = payload
        .trim_end_matches('=')
        .chars()
        .map(|c| match c {
            '+' => '-',
            '/' => '_',
            other => other,
        })
        .collect();

    let bytes = URL_SAFE_NO_PAD.decode(normalized.as_bytes()).ok()?;
    serde_json::from_slice(&bytes).ok()
}

/// `role` claim of the token, when it is one of the allowed roles
pub fn role_claim(token: &str) -> Option<Role> {
    let claims = decode_claims(token)?;
    Role::from_json(claims.get("role"))
}

#[cfg(test)]
pub(crate) fn token_with_claims(claims: &Value) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
    let payload = URL_SAFE_NO_PAD.encode(claims.to_string());
    format!("{}.{}.signature", header, payload)
}
