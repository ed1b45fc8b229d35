//! Signed session cookie.
//!
//! The cookie value is `{session_id}.{signature}`, where the signature is the base64url
//! HMAC-SHA256 of the session id keyed by the configured `secret_key`. A value whose signature
//! does not verify is treated as if no cookie had been sent.

use axum::http::{HeaderMap, header};
use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::{config::SessionConfig, errors::Error, types::SessionId};

type HmacSha256 = Hmac<Sha256>;

#[derive(Clone)]
pub struct CookieCodec {
    mac: HmacSha256,
}

impl CookieCodec {
    pub fn new(secret_key: &str) -> Result<Self, Error> {
        let mac = HmacSha256::new_from_slice(secret_key.as_bytes()).map_err(|e| Error::Internal {
            operation: format!("create cookie signing key: {e}"),
        })?;
        Ok(Self { mac })
    }

    fn mac(&self) -> HmacSha256 {
        self.mac.clone()
    }

    /// Signed cookie value for a session id
    pub fn sign(&self, id: &SessionId) -> String {
        let mut mac = self.mac();
        mac.update(id.as_str().as_bytes());
        let signature = mac.finalize().into_bytes();
        format!("{}.{}", id.as_str(), URL_SAFE_NO_PAD.encode(signature))
    }

    /// Verify a cookie value, returning the session id it carries.
    pub fn unsign(&self, value: &str) -> Option<SessionId> {
        let (id, signature) = value.rsplit_once('.')?;
        if id.is_empty() {
            return None;
        }
        let signature = URL_SAFE_NO_PAD.decode(signature).ok()?;

        let mut mac = self.mac();
        mac.update(id.as_bytes());
        // Constant-time comparison
        mac.verify_slice(&signature).ok()?;

        Some(SessionId::new(id))
    }
}

/// Value of the named cookie in the request headers, if present.
pub fn read_cookie<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value)
}

fn attributes(config: &SessionConfig) -> String {
    let same_site = match config.cookie_same_site.to_ascii_lowercase().as_str() {
        "strict" => "Strict",
        "none" => "None",
        _ => "Lax",
    };
    let secure = if config.cookie_secure { "; Secure" } else { "" };
    format!("Path=/; HttpOnly; SameSite={same_site}{secure}")
}

/// `Set-Cookie` value carrying a signed session id
pub fn set_cookie_header(config: &SessionConfig, signed_value: &str) -> String {
    format!(
        "{}={}; {}; Max-Age={}",
        config.cookie_name,
        signed_value,
        attributes(config),
        config.timeout.as_secs()
    )
}

/// `Set-Cookie` value removing the session cookie
pub fn clear_cookie_header(config: &SessionConfig) -> String {
    format!("{}=; {}; Max-Age=0", config.cookie_name, attributes(config))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use std::time::Duration;

    const SECRET: &str = "0123456789abcdef0123456789abcdef";

    #[test]
    fn test_sign_and_unsign() {
        let codec = CookieCodec::new(SECRET).unwrap();
        let id = SessionId::new("abc123_-XYZ");

        let signed = codec.sign(&id);
        assert!(signed.starts_with("abc123_-XYZ."));
        assert_eq!(codec.unsign(&signed), Some(id));
    }

    #[test]
    fn test_unsign_rejects_tampering() {
        let codec = CookieCodec::new(SECRET).unwrap();
        let signed = codec.sign(&SessionId::new("session-a"));
        let (_, signature) = signed.rsplit_once('.').unwrap();

        let cases = vec![
            format!("session-b.{signature}"),
            "session-a".to_string(),
            "session-a.".to_string(),
            "session-a.!!!not-base64!!!".to_string(),
            format!(".{signature}"),
            String::new(),
        ];
        for value in cases {
            assert_eq!(codec.unsign(&value), None, "value {value:?}");
        }
    }

    #[test]
    fn test_unsign_rejects_other_key() {
        let signed = CookieCodec::new(SECRET).unwrap().sign(&SessionId::new("session-a"));
        let other = CookieCodec::new("fedcba9876543210fedcba9876543210").unwrap();
        assert_eq!(other.unsign(&signed), None);
    }

    #[test]
    fn test_read_cookie() {
        let mut headers = HeaderMap::new();
        headers.append(header::COOKIE, HeaderValue::from_static("theme=dark; passgate_session=abc.def"));
        headers.append(header::COOKIE, HeaderValue::from_static("other=1"));

        assert_eq!(read_cookie(&headers, "passgate_session"), Some("abc.def"));
        assert_eq!(read_cookie(&headers, "other"), Some("1"));
        assert_eq!(read_cookie(&headers, "missing"), None);
    }

    #[test]
    fn test_cookie_headers() {
        let config = SessionConfig {
            timeout: Duration::from_secs(3600),
            cookie_secure: true,
            cookie_same_site: "strict".to_string(),
            ..Default::default()
        };

        let set = set_cookie_header(&config, "abc.def");
        assert_eq!(
            set,
            "passgate_session=abc.def; Path=/; HttpOnly; SameSite=Strict; Secure; Max-Age=3600"
        );

        let clear = clear_cookie_header(&SessionConfig {
            cookie_secure: false,
            ..Default::default()
        });
        assert_eq!(clear, "passgate_session=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0");
    }
}
