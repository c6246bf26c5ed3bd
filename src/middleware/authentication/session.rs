//! HMAC-signed session tokens: `username:expiry_unix:signature`.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{Duration, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("malformed session token")]
    Malformed,
    #[error("session expired")]
    Expired,
    #[error("session signature mismatch")]
    BadSignature,
    #[error("invalid signing key")]
    BadKey,
}

pub fn issue(username: &str, key: &str, ttl_days: i64) -> Result<String, SessionError> {
    let expiry = (Utc::now() + Duration::days(ttl_days)).timestamp();
    let payload = format!("{username}:{expiry}");
    let signature = sign(&payload, key)?;

    Ok(format!("{payload}:{signature}"))
}

/// Returns the username when the token is intact and unexpired.
pub fn verify(token: &str, key: &str) -> Result<String, SessionError> {
    // Split from the right: usernames are validated not to contain ':'
    // at registration, but don't depend on it.
    let mut parts = token.rsplitn(3, ':');
    let signature = parts.next().ok_or(SessionError::Malformed)?;
    let expiry = parts.next().ok_or(SessionError::Malformed)?;
    let username = parts.next().ok_or(SessionError::Malformed)?;

    let payload = format!("{username}:{expiry}");
    let mut mac =
        HmacSha256::new_from_slice(key.as_bytes()).map_err(|_| SessionError::BadKey)?;
    mac.update(payload.as_bytes());
    let signature = URL_SAFE_NO_PAD
        .decode(signature)
        .map_err(|_| SessionError::Malformed)?;
    mac.verify_slice(&signature)
        .map_err(|_| SessionError::BadSignature)?;

    let expiry: i64 = expiry.parse().map_err(|_| SessionError::Malformed)?;
    if expiry < Utc::now().timestamp() {
        return Err(SessionError::Expired);
    }

    Ok(username.to_string())
}

fn sign(payload: &str, key: &str) -> Result<String, SessionError> {
    let mut mac =
        HmacSha256::new_from_slice(key.as_bytes()).map_err(|_| SessionError::BadKey)?;
    mac.update(payload.as_bytes());

    Ok(URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY: &str = "a long random signing key";

    #[test]
    fn roundtrip() {
        let token = issue("xyarian", KEY, 1).unwrap();
        assert_eq!(verify(&token, KEY).unwrap(), "xyarian");
    }

    #[test]
    fn tampered_username_is_rejected() {
        let token = issue("xyarian", KEY, 1).unwrap();
        let forged = token.replacen("xyarian", "admin", 1);
        assert!(matches!(
            verify(&forged, KEY),
            Err(SessionError::BadSignature)
        ));
    }

    #[test]
    fn wrong_key_is_rejected() {
        let token = issue("xyarian", KEY, 1).unwrap();
        assert!(matches!(
            verify(&token, "other key"),
            Err(SessionError::BadSignature)
        ));
    }

    #[test]
    fn expired_token_is_rejected() {
        let token = issue("xyarian", KEY, -1).unwrap();
        assert!(matches!(verify(&token, KEY), Err(SessionError::Expired)));
    }

    #[test]
    fn garbage_is_malformed() {
        assert!(matches!(
            verify("not a token", KEY),
            Err(SessionError::Malformed)
        ));
    }
}
