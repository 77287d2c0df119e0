//! Session claims carried by the bearer token

use base64::prelude::*;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use sha3::{Digest, Sha3_256};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Token has no payload segment")]
    MissingPayload,
    #[error("Token payload is not valid base64")]
    Encoding(#[from] base64::DecodeError),
    #[error("Token payload is not a valid claims set")]
    Payload(#[from] serde_json::Error),
}

/// Identity claims of the logged in user
///
/// Only the payload of the token is read. Signatures are verified by the backend on every
/// request, the client trusts the token it was handed at login.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SessionClaims {
    /// Opaque user identifier
    #[serde(rename = "sub")]
    pub subject: String,
    /// Display name
    #[serde(default)]
    pub username: String,
    /// Contact address
    #[serde(default)]
    pub email: String,
    /// Expiry instant, seconds since epoch
    #[serde(rename = "exp")]
    pub expires_at: i64,
}

impl SessionClaims {
    /// Decodes claims from the payload segment of a JWT
    pub fn decode(token: &str) -> Result<Self, Error> {
        let payload = token.split('.').nth(1).ok_or(Error::MissingPayload)?;
        let payload = BASE64_URL_SAFE_NO_PAD.decode(payload.trim_end_matches('='))?;
        let claims = serde_json::from_slice(&payload)?;
        Ok(claims)
    }

    /// Checks if the token is expired at the given instant
    ///
    /// Expiry is compared with millisecond precision, a token expiring exactly now is expired.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.saturating_mul(1000) <= now.timestamp_millis()
    }
}

/// Short, stable token identifier safe to put in logs
pub fn fingerprint(token: &str) -> String {
    let mut hasher = Sha3_256::new();
    hasher.update(token.as_bytes());
    let digest: [u8; 32] = hasher.finalize().into();
    BASE64_URL_SAFE_NO_PAD.encode(&digest[..6])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token(payload: &str) -> String {
        let header = BASE64_URL_SAFE_NO_PAD.encode(r#"{"alg":"HS256","typ":"JWT"}"#);
        let payload = BASE64_URL_SAFE_NO_PAD.encode(payload);
        format!("{header}.{payload}.signature")
    }

    #[test]
    fn decode_full_claims() {
        let claims = SessionClaims::decode(&token(
            r#"{"sub":"u1","username":"alice","email":"a@x.com","exp":1700000000,"iss":"rux"}"#,
        ))
        .unwrap();

        assert_eq!(
            claims,
            SessionClaims {
                subject: "u1".to_owned(),
                username: "alice".to_owned(),
                email: "a@x.com".to_owned(),
                expires_at: 1700000000,
            }
        );
    }

    #[test]
    fn decode_without_profile_claims() {
        let claims = SessionClaims::decode(&token(r#"{"sub":"u1","exp":1}"#)).unwrap();
        assert_eq!(claims.username, "");
        assert_eq!(claims.email, "");
    }

    #[test]
    fn decode_padded_payload() {
        let header = BASE64_URL_SAFE.encode("{}");
        let payload = BASE64_URL_SAFE.encode(r#"{"sub":"u","exp":10}"#);
        let claims = SessionClaims::decode(&format!("{header}.{payload}.sig")).unwrap();
        assert_eq!(claims.subject, "u");
    }

    #[test]
    fn decode_garbage_fails() {
        assert!(matches!(
            SessionClaims::decode("not-a-token"),
            Err(Error::MissingPayload)
        ));
        assert!(matches!(
            SessionClaims::decode("a.!!!.b"),
            Err(Error::Encoding(_))
        ));
        assert!(matches!(
            SessionClaims::decode(&token("[1, 2, 3]")),
            Err(Error::Payload(_))
        ));
        // Subject and expiry are mandatory
        assert!(matches!(
            SessionClaims::decode(&token(r#"{"username":"alice"}"#)),
            Err(Error::Payload(_))
        ));
    }

    #[test]
    fn expiry_boundary() {
        let claims = SessionClaims::decode(&token(r#"{"sub":"u","exp":100}"#)).unwrap();

        let before = DateTime::from_timestamp_millis(99_999).unwrap();
        let at = DateTime::from_timestamp_millis(100_000).unwrap();

        assert!(!claims.is_expired_at(before));
        assert!(claims.is_expired_at(at));
    }

    #[test]
    fn fingerprint_is_stable_and_short() {
        let a = fingerprint("token-a");
        assert_eq!(a, fingerprint("token-a"));
        assert_ne!(a, fingerprint("token-b"));
        assert_eq!(a.len(), 8);
    }
}
