//! The session codec.

use hmac::{Hmac, Mac};
use miniweb_core::{Error, Result};
use sha2::Sha256;
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

/// Name of the session cookie.
pub const SESSION_COOKIE: &str = "miniweb_session";

/// Fixed cookie lifetime: 30 days.
const MAX_AGE_SECS: u64 = 30 * 24 * 60 * 60;

/// Signing configuration for the session cookie.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    secret: String,
    domain: String,
}

impl SessionConfig {
    /// A missing or empty secret is a fatal configuration error; sessions
    /// must never run unsigned.
    pub fn new(secret: Option<String>, domain: impl Into<String>) -> Result<Self> {
        match secret {
            Some(secret) if !secret.is_empty() => Ok(Self {
                secret,
                domain: domain.into(),
            }),
            _ => Err(Error::config("SESSION_SECRET is not set")),
        }
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }
}

/// One request's session state.
pub struct Session {
    config: SessionConfig,
    data: serde_json::Map<String, serde_json::Value>,
    dirty: bool,
}

impl Session {
    /// An empty session with no pending cookie write.
    pub fn empty(config: SessionConfig) -> Self {
        Self {
            config,
            data: serde_json::Map::new(),
            dirty: false,
        }
    }

    /// Decode a session from the raw cookie value.
    ///
    /// Any defect in the cookie yields an empty session. This is the only
    /// sane response to client-controlled input: a tampered cookie is not
    /// an application error.
    pub fn load(config: SessionConfig, cookie: Option<&str>) -> Self {
        let Some(raw) = cookie else {
            return Self::empty(config);
        };
        let decoded = percent_decode(raw);

        let Some((signature, payload)) = decoded.split_once('|') else {
            return Self::empty(config);
        };

        let expected = sign(&config, payload);
        if !constant_time_eq(signature.as_bytes(), expected.as_bytes()) {
            tracing::debug!(target: "miniweb::session", "session cookie signature mismatch");
            return Self::empty(config);
        }

        match serde_json::from_str::<serde_json::Value>(payload) {
            Ok(serde_json::Value::Object(data)) => Self {
                config,
                data,
                dirty: false,
            },
            _ => Self::empty(config),
        }
    }

    pub fn get(&self, key: &str) -> Option<&serde_json::Value> {
        self.data.get(key)
    }

    /// Set a key. Writing a value identical to the stored one changes
    /// nothing and queues no cookie write.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) {
        let key = key.into();
        let value = value.into();
        if self.data.get(&key) == Some(&value) {
            return;
        }
        self.data.insert(key, value);
        self.dirty = true;
    }

    /// Remove a key. Absent keys are a no-op.
    pub fn delete(&mut self, key: &str) {
        if self.data.remove(key).is_some() {
            self.dirty = true;
        }
    }

    /// Is a cookie write pending?
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// The pending `Set-Cookie` header value, `None` when no mutation
    /// happened this request.
    pub fn cookie_header(&self) -> Option<String> {
        if !self.dirty {
            return None;
        }
        let payload = serde_json::Value::Object(self.data.clone()).to_string();
        let signature = sign(&self.config, &payload);
        let value = percent_encode(&format!("{signature}|{payload}"));
        Some(format!(
            "{SESSION_COOKIE}={value}; Max-Age={MAX_AGE_SECS}; Path=/; Domain={}; Secure",
            self.config.domain
        ))
    }
}

/// Hex HMAC-SHA256 over the payload and the cookie domain, keyed with
/// the configured secret. Binding the domain into the signature keeps a
/// cookie minted for one deployment from validating on another that
/// shares the secret.
fn sign(config: &SessionConfig, payload: &str) -> String {
    let mut mac = HmacSha256::new_from_slice(config.secret.as_bytes())
        .expect("HMAC accepts keys of any length");
    mac.update(payload.as_bytes());
    mac.update(config.domain.as_bytes());
    hex_encode(&mac.finalize().into_bytes())
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    a.len() == b.len() && bool::from(a.ct_eq(b))
}

fn hex_encode(bytes: &[u8]) -> String {
    const HEX: &[u8; 16] = b"0123456789abcdef";
    let mut out = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        out.push(HEX[(byte >> 4) as usize] as char);
        out.push(HEX[(byte & 0x0f) as usize] as char);
    }
    out
}

/// Percent-encode a cookie value. Everything outside the unreserved set
/// is escaped, which keeps the `|` separator and JSON punctuation legal
/// inside a cookie.
fn percent_encode(input: &str) -> String {
    const HEX: &[u8; 16] = b"0123456789ABCDEF";
    let mut out = String::with_capacity(input.len());
    for byte in input.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(byte as char);
            }
            _ => {
                out.push('%');
                out.push(HEX[(byte >> 4) as usize] as char);
                out.push(HEX[(byte & 0x0f) as usize] as char);
            }
        }
    }
    out
}

fn percent_decode(input: &str) -> String {
    let bytes = input.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' && i + 2 < bytes.len() {
            let hi = (bytes[i + 1] as char).to_digit(16);
            let lo = (bytes[i + 2] as char).to_digit(16);
            if let (Some(hi), Some(lo)) = (hi, lo) {
                out.push((hi * 16 + lo) as u8);
                i += 3;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> SessionConfig {
        SessionConfig::new(Some("test-secret".to_string()), "example.com").unwrap()
    }

    fn header_value(header: &str) -> &str {
        let start = header.find('=').unwrap() + 1;
        let end = header.find(';').unwrap();
        &header[start..end]
    }

    #[test]
    fn missing_secret_is_fatal() {
        assert!(SessionConfig::new(None, "example.com").is_err());
        assert!(SessionConfig::new(Some(String::new()), "example.com").is_err());
    }

    #[test]
    fn set_get_round_trip() {
        let mut session = Session::empty(config());
        assert!(session.get("user_id").is_none());

        session.set("user_id", 7);
        assert_eq!(session.get("user_id"), Some(&serde_json::json!(7)));
        assert!(session.is_dirty());
    }

    #[test]
    fn identical_set_queues_no_write() {
        let mut session = Session::empty(config());
        session.set("lang", "en");
        let header = session.cookie_header().unwrap();

        let restored = Session::load(config(), Some(header_value(&header)));
        assert!(!restored.is_dirty());

        let mut restored = restored;
        restored.set("lang", "en");
        assert!(!restored.is_dirty());
        assert!(restored.cookie_header().is_none());

        restored.set("lang", "fr");
        assert!(restored.is_dirty());
    }

    #[test]
    fn cookie_round_trip_through_header() {
        let mut session = Session::empty(config());
        session.set("user", serde_json::json!({"id": 1, "name": "Ada"}));
        let header = session.cookie_header().unwrap();

        assert!(header.starts_with("miniweb_session="));
        assert!(header.contains("Max-Age=2592000"));
        assert!(header.contains("Path=/"));
        assert!(header.contains("Domain=example.com"));
        assert!(header.contains("Secure"));

        let restored = Session::load(config(), Some(header_value(&header)));
        assert_eq!(
            restored.get("user"),
            Some(&serde_json::json!({"id": 1, "name": "Ada"}))
        );
    }

    #[test]
    fn tampered_payload_loads_empty() {
        let mut session = Session::empty(config());
        session.set("admin", false);
        let header = session.cookie_header().unwrap();
        let value = percent_decode(header_value(&header));

        let (signature, payload) = value.split_once('|').unwrap();
        let forged = format!("{signature}|{}", payload.replace("false", "true"));

        let restored = Session::load(config(), Some(&percent_encode(&forged)));
        assert!(restored.get("admin").is_none());
        assert!(!restored.is_dirty());
    }

    #[test]
    fn malformed_cookies_load_empty() {
        for raw in ["", "no-separator", "|", "sig|not json", "sig|[1,2]", "%GG"] {
            let session = Session::load(config(), Some(raw));
            assert!(session.get("anything").is_none(), "cookie {raw:?}");
        }
        let session = Session::load(config(), None);
        assert!(session.get("anything").is_none());
    }

    #[test]
    fn signature_binds_the_domain() {
        let mut session = Session::empty(config());
        session.set("k", "v");
        let header = session.cookie_header().unwrap();

        let other =
            SessionConfig::new(Some("test-secret".to_string()), "evil.example").unwrap();
        let restored = Session::load(other, Some(header_value(&header)));
        assert!(restored.get("k").is_none());
    }

    #[test]
    fn delete_marks_dirty_only_when_present() {
        let mut session = Session::empty(config());
        session.delete("ghost");
        assert!(!session.is_dirty());

        session.set("k", 1);
        let header = session.cookie_header().unwrap();
        let mut restored = Session::load(config(), Some(header_value(&header)));
        restored.delete("k");
        assert!(restored.is_dirty());
        assert!(restored.get("k").is_none());
    }
}
