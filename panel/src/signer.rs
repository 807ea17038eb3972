//! Request signing.
//!
//! Every panel request carries two parameters: `request_time`, the Unix
//! time in seconds at signing, and `request_token`, an MD5 digest derived
//! from the shared API key and that time:
//!
//! ```text
//! request_token = md5_hex(request_time + md5_hex(api_key))
//! ```

use std::fmt;

use md5::{Digest, Md5};

use crate::request::Params;

/// Parameter carrying the signing timestamp.
pub const REQUEST_TIME: &str = "request_time";
/// Parameter carrying the signature.
pub const REQUEST_TOKEN: &str = "request_token";

fn md5_hex(input: &[u8]) -> String {
    hex::encode(Md5::digest(input))
}

/// Derives the token for `secret` at `unix_seconds`.
///
/// Pure and deterministic.
pub fn sign(secret: &str, unix_seconds: i64) -> String {
    let key_digest = md5_hex(secret.as_bytes());
    md5_hex(format!("{unix_seconds}{key_digest}").as_bytes())
}

/// Signs requests with a fixed API key.
///
/// The key digest is computed once at construction.
#[derive(Clone)]
pub struct RequestSigner {
    key_digest: String,
}

impl fmt::Debug for RequestSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestSigner").finish_non_exhaustive()
    }
}

impl RequestSigner {
    pub fn new(secret: &str) -> Self {
        Self {
            key_digest: md5_hex(secret.as_bytes()),
        }
    }

    /// Returns the token for the given timestamp.
    pub fn sign(&self, unix_seconds: i64) -> String {
        md5_hex(format!("{unix_seconds}{}", self.key_digest).as_bytes())
    }

    /// Inserts `request_time` and `request_token` into `params`.
    pub fn sign_params(&self, params: &mut Params, unix_seconds: i64) {
        params.insert(REQUEST_TIME.to_string(), unix_seconds.to_string());
        params.insert(REQUEST_TOKEN.to_string(), self.sign(unix_seconds));
    }

    /// Signs `params` with the current wall-clock time.
    pub fn sign_now(&self, params: &mut Params) {
        self.sign_params(params, chrono::Utc::now().timestamp());
    }
}
