//! Bearer token expiry inspection.
//!
//! Reads the `exp` claim from the payload segment of a JWT-shaped token
//! without verifying the signature. The result is only a hint for deciding
//! when to refresh; the server remains the authority.

use base64::Engine;
use base64::engine::general_purpose::{STANDARD, STANDARD_NO_PAD, URL_SAFE, URL_SAFE_NO_PAD};
use thiserror::Error;

/// Fail-closed policy: a token whose expiry cannot be read counts as expired.
pub const UNREADABLE_IS_EXPIRED: bool = true;

/// Why a token's expiry could not be read.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenDecodeError {
    #[error("token does not have three dot-separated segments")]
    Malformed,
    #[error("token payload is not valid base64")]
    Base64,
    #[error("token payload is not valid JSON")]
    Json,
    #[error("token payload has no numeric exp claim")]
    MissingExp,
}

/// Result of inspecting a token against a point in time.
#[derive(Debug, Clone, PartialEq)]
pub enum Expiry {
    Valid { exp: f64 },
    Expired { exp: f64 },
    Unreadable(TokenDecodeError),
}

impl Expiry {
    pub fn is_expired(&self) -> bool {
        match self {
            Expiry::Valid { .. } => false,
            Expiry::Expired { .. } => true,
            Expiry::Unreadable(_) => UNREADABLE_IS_EXPIRED,
        }
    }

    /// The `exp` claim in seconds since epoch, when readable.
    pub fn exp(&self) -> Option<f64> {
        match self {
            Expiry::Valid { exp } | Expiry::Expired { exp } => Some(*exp),
            Expiry::Unreadable(_) => None,
        }
    }
}

/// Extracts the `exp` claim (seconds since epoch).
///
/// # Errors
/// Returns the first decoding step that failed.
pub fn decode_exp(token: &str) -> Result<f64, TokenDecodeError> {
    let segments: Vec<&str> = token.trim().split('.').collect();
    let [_, payload, _] = segments.as_slice() else {
        return Err(TokenDecodeError::Malformed);
    };
    if payload.is_empty() {
        return Err(TokenDecodeError::Malformed);
    }

    let bytes = [URL_SAFE_NO_PAD, URL_SAFE, STANDARD, STANDARD_NO_PAD]
        .iter()
        .find_map(|engine| engine.decode(payload).ok())
        .ok_or(TokenDecodeError::Base64)?;

    let claims: serde_json::Value =
        serde_json::from_slice(&bytes).map_err(|_| TokenDecodeError::Json)?;

    claims
        .get("exp")
        .and_then(serde_json::Value::as_f64)
        .filter(|exp| exp.is_finite())
        .ok_or(TokenDecodeError::MissingExp)
}

/// Inspects `token` against `now_secs`.
pub fn inspect_at(token: &str, now_secs: f64) -> Expiry {
    match decode_exp(token) {
        Ok(exp) if exp < now_secs => Expiry::Expired { exp },
        Ok(exp) => Expiry::Valid { exp },
        Err(err) => Expiry::Unreadable(err),
    }
}

/// Inspects `token` against the current wall clock.
pub fn inspect(token: &str) -> Expiry {
    inspect_at(token, now_secs())
}

/// Returns true if the token is expired at `now_secs` or cannot be decoded.
pub fn is_expired_at(token: &str, now_secs: f64) -> bool {
    inspect_at(token, now_secs).is_expired()
}

/// Returns true if the token is expired now or cannot be decoded.
pub fn is_expired(token: &str) -> bool {
    inspect(token).is_expired()
}

/// Masks a token for display (shows first 12 chars).
pub fn mask_token(token: &str) -> String {
    if token.chars().count() > 12 {
        let prefix: String = token.chars().take(12).collect();
        format!("{prefix}...")
    } else {
        "***".to_string()
    }
}

fn now_secs() -> f64 {
    chrono::Utc::now().timestamp_millis() as f64 / 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token_with_payload(payload: &str) -> String {
        format!(
            "eyJhbGciOiJIUzI1NiJ9.{}.c2lnbmF0dXJl",
            URL_SAFE_NO_PAD.encode(payload)
        )
    }

    #[test]
    fn test_past_exp_is_expired_future_is_not() {
        let now = 1_700_000_000.0;
        assert!(is_expired_at(
            &token_with_payload(r#"{"exp": 1699999999}"#),
            now
        ));
        assert!(!is_expired_at(
            &token_with_payload(r#"{"exp": 1700000600}"#),
            now
        ));
    }

    #[test]
    fn test_exp_equal_to_now_is_still_valid() {
        let now = 1_700_000_000.0;
        let token = token_with_payload(r#"{"exp": 1700000000}"#);
        assert_eq!(
            inspect_at(&token, now),
            Expiry::Valid {
                exp: 1_700_000_000.0
            }
        );
    }

    #[test]
    fn test_undecodable_tokens_fail_closed() {
        let now = 1_700_000_000.0;
        let cases = [
            ("", TokenDecodeError::Malformed),
            ("opaque-token", TokenDecodeError::Malformed),
            ("a.b", TokenDecodeError::Malformed),
            ("a.b.c.d", TokenDecodeError::Malformed),
            ("head..sig", TokenDecodeError::Malformed),
            ("head.!!!.sig", TokenDecodeError::Base64),
        ];
        for (token, expected) in cases {
            let expiry = inspect_at(token, now);
            assert_eq!(expiry, Expiry::Unreadable(expected), "token {token:?}");
            assert!(expiry.is_expired());
        }

        let not_json = format!("h.{}.s", URL_SAFE_NO_PAD.encode("not json"));
        assert_eq!(
            inspect_at(&not_json, now),
            Expiry::Unreadable(TokenDecodeError::Json)
        );
    }

    #[test]
    fn test_missing_or_non_numeric_exp_is_expired() {
        let now = 1_700_000_000.0;
        for payload in [
            r#"{"sub": "42"}"#,
            r#"{"exp": "tomorrow"}"#,
            r#"{"exp": null}"#,
            "[]",
        ] {
            let token = token_with_payload(payload);
            assert_eq!(
                inspect_at(&token, now),
                Expiry::Unreadable(TokenDecodeError::MissingExp),
                "payload {payload}"
            );
            assert!(is_expired_at(&token, now));
        }
    }

    #[test]
    fn test_standard_alphabet_with_padding_is_accepted() {
        let payload = STANDARD.encode(r#"{"exp": 4102444800, "n": "??>"}"#);
        let token = format!("h.{payload}.s");
        assert_eq!(decode_exp(&token), Ok(4_102_444_800.0));
        assert!(!is_expired(&token));
    }

    #[test]
    fn test_float_exp_is_accepted() {
        let token = token_with_payload(r#"{"exp": 1700000000.5}"#);
        assert!(!is_expired_at(&token, 1_700_000_000.0));
        assert!(is_expired_at(&token, 1_700_000_001.0));
    }

    #[test]
    fn test_mask_token() {
        assert_eq!(mask_token("eyJhbGciOiJIUzI1NiJ9.payload"), "eyJhbGciOiJI...");
        assert_eq!(mask_token("short"), "***");
    }
}
