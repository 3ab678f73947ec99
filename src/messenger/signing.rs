//! Request signing and webhook signature verification.
//!
//! Two independent keyed hashes share the app secret:
//! - `appsecret_proof`: HMAC-SHA256 of the access token, sent on every API call.
//! - `x-hub-signature`: HMAC-SHA1 of the raw webhook body, sent by the platform.

use std::borrow::Cow;
use std::fmt::Write as _;

use hmac::{Hmac, Mac};
use sha1::Sha1;
use sha2::Sha256;
use tracing::debug;

use super::MessengerError;

type HmacSha1 = Hmac<Sha1>;
type HmacSha256 = Hmac<Sha256>;

/// Header carrying the platform's webhook body signature.
pub const SIGNATURE_HEADER: &str = "x-hub-signature";

/// Algorithm prefix of the signature header value.
const SIGNATURE_PREFIX: &str = "SHA1=";

/// Compute the `appsecret_proof` for an access token.
///
/// Returns the lower-case hex encoding of `HMAC-SHA256(app_secret, access_token)`.
/// The value is derived on every call so a rotated token never reuses a proof.
///
/// # Errors
///
/// Returns [`MessengerError::MissingCredential`] when either input is empty.
pub fn compute_proof(app_secret: &str, access_token: &str) -> Result<String, MessengerError> {
    if app_secret.is_empty() {
        return Err(MessengerError::MissingCredential(
            "app secret is empty".to_owned(),
        ));
    }
    if access_token.is_empty() {
        return Err(MessengerError::MissingCredential(
            "access token is empty".to_owned(),
        ));
    }

    let mut mac = HmacSha256::new_from_slice(app_secret.as_bytes())
        .map_err(|e| MessengerError::Configuration(format!("invalid app secret: {e}")))?;
    mac.update(access_token.as_bytes());
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Escape every non-ASCII character as `\uXXXX` (lower-case, zero padded).
///
/// Characters outside the Basic Multilingual Plane become two escapes, one per
/// UTF-16 surrogate unit. ASCII input is returned borrowed and unchanged.
pub fn escape_non_ascii(body: &str) -> Cow<'_, str> {
    if body.is_ascii() {
        return Cow::Borrowed(body);
    }

    let mut escaped = String::with_capacity(body.len().saturating_mul(2));
    let mut units = [0_u16; 2];
    for ch in body.chars() {
        if ch.is_ascii() {
            escaped.push(ch);
            continue;
        }
        for unit in ch.encode_utf16(&mut units).iter() {
            // Writing into a String is infallible.
            let _ = write!(escaped, "\\u{unit:04x}");
        }
    }
    Cow::Owned(escaped)
}

/// Build the `x-hub-signature` value the platform would send for `raw_body`.
///
/// Format: `SHA1=` followed by 40 upper-case hex digits.
///
/// # Errors
///
/// Returns [`MessengerError::MissingCredential`] for an empty app secret and
/// [`MessengerError::Configuration`] when the body is not valid UTF-8.
pub fn signature_for(app_secret: &str, raw_body: &[u8]) -> Result<String, MessengerError> {
    if app_secret.is_empty() {
        return Err(MessengerError::MissingCredential(
            "app secret is empty".to_owned(),
        ));
    }
    let body = std::str::from_utf8(raw_body)
        .map_err(|e| MessengerError::Configuration(format!("body is not UTF-8: {e}")))?;

    let mut mac = HmacSha1::new_from_slice(app_secret.as_bytes())
        .map_err(|e| MessengerError::Configuration(format!("invalid app secret: {e}")))?;
    mac.update(escape_non_ascii(body).as_bytes());
    Ok(format!(
        "{SIGNATURE_PREFIX}{}",
        hex::encode_upper(mac.finalize().into_bytes())
    ))
}

/// Verify a webhook body against its `x-hub-signature` header value.
///
/// Must be called on the raw, unparsed body. The header comparison is
/// case-insensitive and runs in constant time over the digest. A mismatch is
/// a `false` result, not an error.
pub fn verify_signature(app_secret: &str, raw_body: &[u8], signature_header: &str) -> bool {
    if app_secret.is_empty() {
        debug!("signature rejected: no app secret configured");
        return false;
    }
    let Ok(body) = std::str::from_utf8(raw_body) else {
        debug!("signature rejected: body is not UTF-8");
        return false;
    };
    let Some(hex_digest) = strip_prefix_ignore_case(signature_header, SIGNATURE_PREFIX) else {
        debug!("signature rejected: unexpected header format");
        return false;
    };
    let Ok(expected) = hex::decode(hex_digest) else {
        debug!("signature rejected: digest is not hex");
        return false;
    };
    let Ok(mut mac) = HmacSha1::new_from_slice(app_secret.as_bytes()) else {
        return false;
    };

    mac.update(escape_non_ascii(body).as_bytes());
    mac.verify_slice(&expected).is_ok()
}

fn strip_prefix_ignore_case<'a>(value: &'a str, prefix: &str) -> Option<&'a str> {
    let head = value.get(..prefix.len())?;
    if head.eq_ignore_ascii_case(prefix) {
        value.get(prefix.len()..)
    } else {
        None
    }
}

/// An inbound webhook call captured verbatim: raw body plus signature header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebhookRequest {
    body: Vec<u8>,
    signature: Option<String>,
}

impl WebhookRequest {
    /// Capture a webhook call. `signature` is the `x-hub-signature` value, if sent.
    pub fn new(body: impl Into<Vec<u8>>, signature: Option<String>) -> Self {
        Self {
            body: body.into(),
            signature,
        }
    }

    /// The raw body bytes, exactly as received.
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// The signature header value, if one was sent.
    pub fn signature(&self) -> Option<&str> {
        self.signature.as_deref()
    }

    /// Whether the body was signed by the platform with `app_secret`.
    ///
    /// A request without a signature header is never authentic.
    pub fn is_authentic(&self, app_secret: &str) -> bool {
        self.signature
            .as_deref()
            .is_some_and(|sig| verify_signature(app_secret, &self.body, sig))
    }
}
