//! Signed-cookie sessions for miniweb.
//!
//! Session state lives entirely in one cookie whose value is
//! `<hex HMAC-SHA256 signature>|<JSON object payload>`. Loading never
//! fails: a cookie that is absent, malformed, or carries a bad signature
//! simply yields an empty session.

pub mod session;

pub use session::{SESSION_COOKIE, Session, SessionConfig};
