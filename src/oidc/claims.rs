//! Unverified claim extraction.
//!
//! Reads `iss` and `aud` from a JWT payload without checking the signature.
//! The result only selects a provider and a candidate audience; every value
//! read here is checked again by the provider's verifier before it is trusted.

use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde::{Deserialize, Deserializer};

use crate::auth::AuthError;

/// Routing claims read from an unverified token.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UnverifiedClaims {
    /// `iss` claim
    #[serde(rename = "iss", default)]
    pub issuer: String,
    /// `aud` claim, normalized to a list
    #[serde(rename = "aud", default, deserialize_with = "deserialize_audience")]
    pub audience: Vec<String>,
}

/// `aud` may be a single string or an array of strings.
fn deserialize_audience<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum StringOrVec {
        String(String),
        Vec(Vec<String>),
    }

    match Option::<StringOrVec>::deserialize(deserializer)? {
        Some(StringOrVec::String(s)) => Ok(vec![s]),
        Some(StringOrVec::Vec(v)) => Ok(v),
        None => Ok(Vec::new()),
    }
}

/// Base64url-decode the second segment of a compact JWS.
pub(crate) fn payload_bytes(token: &str) -> Option<Vec<u8>> {
    let mut parts = token.split('.');
    let (Some(_header), Some(payload)) = (parts.next(), parts.next()) else {
        return None;
    };
    URL_SAFE_NO_PAD.decode(payload).ok()
}

/// Decode the payload segment of `token` without verification.
///
/// # Errors
///
/// - [`AuthError::MalformedToken`] if the token has fewer than two segments
///   or the payload is not base64url JSON
/// - [`AuthError::MissingIssuer`] if `iss` is absent or empty
/// - [`AuthError::MissingAudience`] if `aud` is absent or empty
pub fn parse_unverified(token: &str) -> Result<UnverifiedClaims, AuthError> {
    let bytes = payload_bytes(token).ok_or(AuthError::MalformedToken)?;
    let claims: UnverifiedClaims =
        serde_json::from_slice(&bytes).map_err(|_| AuthError::MalformedToken)?;

    if claims.issuer.is_empty() {
        return Err(AuthError::MissingIssuer);
    }
    if claims.audience.is_empty() {
        return Err(AuthError::MissingAudience);
    }

    Ok(claims)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn token_with(payload: &serde_json::Value) -> String {
        let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"RS256","typ":"JWT"}"#);
        let body = URL_SAFE_NO_PAD.encode(payload.to_string());
        format!("{header}.{body}.c2ln")
    }

    #[test]
    fn reads_issuer_and_audience_array() {
        let token = token_with(&json!({
            "iss": "https://idp.example.com",
            "aud": ["ror-api", "ror-cli"],
        }));

        let claims = parse_unverified(&token).unwrap();

        assert_eq!(claims.issuer, "https://idp.example.com");
        assert_eq!(claims.audience, vec!["ror-api", "ror-cli"]);
    }

    #[test]
    fn single_string_audience_becomes_list() {
        let token = token_with(&json!({"iss": "https://idp.example.com", "aud": "ror-api"}));

        let claims = parse_unverified(&token).unwrap();

        assert_eq!(claims.audience, vec!["ror-api"]);
    }

    #[test]
    fn two_segments_are_enough() {
        let token = token_with(&json!({"iss": "https://idp.example.com", "aud": "ror-api"}));
        let (head, rest) = token.split_once('.').unwrap();
        let payload = rest.split('.').next().unwrap();

        assert!(parse_unverified(&format!("{head}.{payload}")).is_ok());
    }

    #[test]
    fn rejects_single_segment() {
        assert!(matches!(parse_unverified("not-a-jwt"), Err(AuthError::MalformedToken)));
        assert!(matches!(parse_unverified(""), Err(AuthError::MalformedToken)));
    }

    #[test]
    fn rejects_bad_base64_and_bad_json() {
        assert!(matches!(parse_unverified("a.!!!.c"), Err(AuthError::MalformedToken)));

        let not_json = URL_SAFE_NO_PAD.encode("not json");
        assert!(matches!(
            parse_unverified(&format!("a.{not_json}.c")),
            Err(AuthError::MalformedToken)
        ));
    }

    #[test]
    fn padded_payload_is_malformed() {
        let padded = base64::engine::general_purpose::URL_SAFE
            .encode(json!({"iss": "x", "aud": "ab"}).to_string());
        assert!(padded.ends_with('='));
        assert!(matches!(
            parse_unverified(&format!("a.{padded}.c")),
            Err(AuthError::MalformedToken)
        ));
    }

    #[test]
    fn missing_or_empty_issuer() {
        let token = token_with(&json!({"aud": "ror-api"}));
        assert!(matches!(parse_unverified(&token), Err(AuthError::MissingIssuer)));

        let token = token_with(&json!({"iss": "", "aud": "ror-api"}));
        assert!(matches!(parse_unverified(&token), Err(AuthError::MissingIssuer)));
    }

    #[test]
    fn missing_or_empty_audience() {
        let token = token_with(&json!({"iss": "https://idp.example.com"}));
        assert!(matches!(parse_unverified(&token), Err(AuthError::MissingAudience)));

        let token = token_with(&json!({"iss": "https://idp.example.com", "aud": []}));
        assert!(matches!(parse_unverified(&token), Err(AuthError::MissingAudience)));
    }

    #[test]
    fn wrong_claim_types_are_malformed() {
        let token = token_with(&json!({"iss": 42, "aud": "ror-api"}));
        assert!(matches!(parse_unverified(&token), Err(AuthError::MalformedToken)));

        let token = token_with(&json!({"iss": "https://idp.example.com", "aud": [1, 2]}));
        assert!(matches!(parse_unverified(&token), Err(AuthError::MalformedToken)));
    }
}
