//! Request signing for the Volcengine CV API.
//!
//! The scheme is the Volcengine variant of AWS Signature V4: a canonical
//! request is hashed into a string to sign, which is signed with a key
//! derived from the secret by four chained HMAC-SHA256 steps. The only
//! differences from stock SigV4 are the algorithm name (`HMAC-SHA256`),
//! the bare secret as the first HMAC key (no `AWS4` prefix), the literal
//! `request` terminating the scope, and a fixed, hand-ordered header
//! block instead of a sorted one.

use crate::constants::{
    ALGORITHM, DEFAULT_HOST, QUERY_ENCODE_SET, REGION, SCOPE_TERMINATOR, SERVICE, SIGNED_HEADERS,
    X_CONTENT_SHA_256, X_DATE,
};
use crate::credential::Credential;
use crate::hash::{hex_hmac_sha256, hex_sha256, hmac_sha256};
use crate::time::{format_date, format_iso8601, now, DateTime};
use http::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE, HOST};
use http::Method;
use log::debug;
use percent_encoding::utf8_percent_encode;

/// Signer that produces the `Authorization` header for CV requests.
///
/// Pure aside from the clock: identical inputs with a pinned timestamp
/// yield a byte-identical header. The signing key is recomputed for every
/// request since it is a function of the current date.
#[derive(Debug, Clone)]
pub struct Signer {
    host: String,
    region: String,
    service: String,

    time: Option<DateTime>,
}

/// Output of a signing pass.
#[derive(Debug)]
pub struct SignedRequest {
    /// Canonical query string, ready to append to the request path.
    pub query_string: String,
    /// Outgoing headers: `Host`, `X-Date`, `X-Content-Sha256`,
    /// `Content-Type` and `Authorization`.
    pub headers: HeaderMap,
}

impl Signer {
    /// Create a new signer for the given endpoint and scope.
    pub fn new(host: &str, region: &str, service: &str) -> Self {
        Self {
            host: host.into(),
            region: region.into(),
            service: service.into(),

            time: None,
        }
    }

    /// The endpoint host this signer signs for.
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Specify the signing time.
    ///
    /// # Note
    ///
    /// We should always take current time to sign requests.
    /// Only use this function for testing.
    #[cfg(test)]
    pub(crate) fn with_time(mut self, time: DateTime) -> Self {
        self.time = Some(time);
        self
    }

    /// Sign a JSON POST request described by method, path, query
    /// parameters and payload.
    pub fn sign(
        &self,
        cred: &Credential,
        method: &Method,
        path: &str,
        query: &[(&str, &str)],
        payload: &str,
    ) -> crate::Result<SignedRequest> {
        let now = self.time.unwrap_or_else(now);
        let timestamp = format_iso8601(now);
        let date = format_date(now);

        let payload_hash = hex_sha256(payload.as_bytes());
        let query_string = canonical_query_string(query);

        let creq = canonical_request(method, path, &query_string, &self.host, &timestamp, &payload_hash);
        debug!("calculated canonical request:\n{creq}");

        // Scope: "20220313/<region>/<service>/request"
        let scope = format!("{date}/{}/{}/{SCOPE_TERMINATOR}", self.region, self.service);
        debug!("calculated scope: {scope}");

        let string_to_sign = string_to_sign(&timestamp, &scope, &creq);
        debug!("calculated string to sign:\n{string_to_sign}");

        let signing_key = signing_key(&cred.secret_access_key, &date, &self.region, &self.service);
        let signature = hex_hmac_sha256(&signing_key, string_to_sign.as_bytes());

        let mut authorization = HeaderValue::from_str(&format!(
            "{ALGORITHM} Credential={}/{scope}, SignedHeaders={SIGNED_HEADERS}, Signature={signature}",
            cred.access_key_id
        ))?;
        authorization.set_sensitive(true);

        let mut headers = HeaderMap::with_capacity(5);
        headers.insert(HOST, self.host.parse()?);
        headers.insert(X_DATE, timestamp.parse()?);
        headers.insert(X_CONTENT_SHA_256, payload_hash.parse()?);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(AUTHORIZATION, authorization);

        Ok(SignedRequest {
            query_string,
            headers,
        })
    }
}

impl Default for Signer {
    fn default() -> Self {
        Self::new(DEFAULT_HOST, REGION, SERVICE)
    }
}

/// Percent-encode per RFC 3986 with only `-`, `_`, `.` and `~` left
/// unescaped: space becomes `%20` and `!`, `'`, `(`, `)`, `*` are forced
/// to their `%XX` form.
pub fn percent_encode(value: &str) -> String {
    utf8_percent_encode(value, &QUERY_ENCODE_SET).to_string()
}

/// Encode each key and value independently, then sort the pairs by
/// encoded key and join them with `&`. Output is independent of input
/// order.
fn canonical_query_string(query: &[(&str, &str)]) -> String {
    let mut pairs = query
        .iter()
        .map(|(k, v)| (percent_encode(k), percent_encode(v)))
        .collect::<Vec<_>>();
    pairs.sort();

    pairs
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&")
}

/// Seven lines joined by newline: method, path, canonical query string,
/// the fixed four-line header block, an empty separator line, the
/// signed-headers constant and the payload hash.
///
/// The header block order is a protocol constant and there is no trailing
/// newline between it and the separator line.
fn canonical_request(
    method: &Method,
    path: &str,
    query_string: &str,
    host: &str,
    timestamp: &str,
    payload_hash: &str,
) -> String {
    let canonical_headers = format!(
        "host:{host}\nx-date:{timestamp}\nx-content-sha256:{payload_hash}\ncontent-type:application/json"
    );

    format!("{method}\n{path}\n{query_string}\n{canonical_headers}\n\n{SIGNED_HEADERS}\n{payload_hash}")
}

/// Four lines: algorithm name, timestamp, credential scope and the hex
/// SHA256 of the canonical request.
fn string_to_sign(timestamp: &str, scope: &str, canonical_request: &str) -> String {
    format!(
        "{ALGORITHM}\n{timestamp}\n{scope}\n{}",
        hex_sha256(canonical_request.as_bytes())
    )
}

/// Derive the signing key: each HMAC step is keyed by the previous
/// step's output, ending with the literal `request`.
fn signing_key(secret: &str, date: &str, region: &str, service: &str) -> Vec<u8> {
    // Sign date
    let sign_date = hmac_sha256(secret.as_bytes(), date.as_bytes());
    // Sign region
    let sign_region = hmac_sha256(sign_date.as_slice(), region.as_bytes());
    // Sign service
    let sign_service = hmac_sha256(sign_region.as_slice(), service.as_bytes());
    // Sign request
    hmac_sha256(sign_service.as_slice(), SCOPE_TERMINATOR.as_bytes())
}
