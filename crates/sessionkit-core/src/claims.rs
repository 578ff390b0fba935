//! Best-effort decoding of the claims embedded in a credential.
//!
//! A credential is a three-part, dot-separated token whose middle part is a
//! base64url-encoded JSON object. Decoding needs no secret and verifies
//! nothing: the claims are only used to pick a display name, so any
//! malformed input simply yields `None`.

use base64::engine::general_purpose::{STANDARD_NO_PAD, URL_SAFE_NO_PAD};
use base64::Engine as _;
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

/// Display name used when the credential carries no usable username claim
pub const DEFAULT_DISPLAY_NAME: &str = "unknown user";

/// Claims decoded from a credential payload.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Claims {
    pub username: Option<String>,
    /// Expiry, seconds since the Unix epoch
    pub exp: Option<i64>,
    /// Issued-at, seconds since the Unix epoch
    pub iat: Option<i64>,
    /// Every other member of the payload object
    pub extra: Map<String, Value>,
}

impl Claims {
    fn from_object(mut object: Map<String, Value>) -> Self {
        let username = match object.remove("username") {
            Some(Value::String(name)) => Some(name),
            Some(other) => {
                object.insert("username".to_string(), other);
                None
            }
            None => None,
        };
        let exp = take_timestamp(&mut object, "exp");
        let iat = take_timestamp(&mut object, "iat");

        Self {
            username,
            exp,
            iat,
            extra: object,
        }
    }

    /// Username claim, or `DEFAULT_DISPLAY_NAME` when missing or empty
    pub fn display_name(&self) -> &str {
        self.username
            .as_deref()
            .filter(|name| !name.is_empty())
            .unwrap_or(DEFAULT_DISPLAY_NAME)
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.exp.and_then(|secs| DateTime::from_timestamp(secs, 0))
    }

    /// Whether the `exp` claim is in the past. Tokens without `exp` never expire
    /// locally; the server remains the authority via 401 responses.
    pub fn is_expired(&self) -> bool {
        self.expires_at()
            .map(|expiry| Utc::now() >= expiry)
            .unwrap_or(false)
    }
}

fn take_timestamp(object: &mut Map<String, Value>, key: &str) -> Option<i64> {
    let secs = object
        .get(key)
        .and_then(|v| v.as_i64().or_else(|| v.as_f64().map(|f| f as i64)))?;
    object.remove(key);
    Some(secs)
}

/// Decode the claims of a `header.payload.signature` token.
///
/// Total: returns `None` for anything other than exactly three segments with
/// a base64 (url-safe or standard, padding optional) JSON object in the middle.
pub fn decode_claims(credential: &str) -> Option<Claims> {
    let mut segments = credential.split('.');
    let (_header, payload, _signature) = (segments.next()?, segments.next()?, segments.next()?);
    if segments.next().is_some() || payload.is_empty() {
        return None;
    }

    let payload = payload.trim_end_matches('=');
    let bytes = URL_SAFE_NO_PAD
        .decode(payload)
        .or_else(|_| STANDARD_NO_PAD.decode(payload))
        .ok()?;

    match serde_json::from_slice::<Value>(&bytes).ok()? {
        Value::Object(object) => Some(Claims::from_object(object)),
        _ => None,
    }
}

/// Display name for a credential, falling back to `DEFAULT_DISPLAY_NAME`
pub fn display_name_for(credential: &str) -> String {
    decode_claims(credential)
        .map(|claims| claims.display_name().to_string())
        .unwrap_or_else(|| DEFAULT_DISPLAY_NAME.to_string())
}
