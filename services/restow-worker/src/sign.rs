// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright 2026 Edgecast Cloud LLC.

//! AWS Signature Version 4 request signing
//!
//! The search capability sits behind an IAM-authenticated endpoint, so
//! queries are signed with SigV4:
//!
//! ```text
//! Authorization: AWS4-HMAC-SHA256 Credential=<akid>/<scope>, SignedHeaders=..., Signature=<hex>
//! ```
//!
//! Only the subset this worker needs is implemented: requests with a known
//! payload and content type, signed headers limited to `content-type`,
//! `host`, `x-amz-date`, and `x-amz-security-token` when temporary
//! credentials carry a session token.

use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};
use thiserror::Error;
use url::Url;

type HmacSha256 = Hmac<Sha256>;

/// Timestamp format for the `x-amz-date` header
const AMZ_DATE_FORMAT: &str = "%Y%m%dT%H%M%SZ";

/// Date-only format used in the credential scope
const SCOPE_DATE_FORMAT: &str = "%Y%m%d";

/// Signing errors
#[derive(Debug, Error)]
pub enum SignError {
    #[error("invalid HMAC key: {0}")]
    InvalidKey(String),
}

/// Static credentials used to sign requests
#[derive(Clone)]
pub struct Credentials {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub session_token: Option<String>,
}

impl Credentials {
    /// Resolve credentials from the environment
    ///
    /// Reads `AWS_ACCESS_KEY_ID`, `AWS_SECRET_ACCESS_KEY`, and the optional
    /// `AWS_SESSION_TOKEN`. Returns `None` when either required variable is
    /// absent; callers fall back to sending unsigned requests. Resolution
    /// happens per request so rotated session credentials are picked up
    /// without a restart.
    pub fn from_env() -> Option<Self> {
        let access_key_id = std::env::var("AWS_ACCESS_KEY_ID").ok()?;
        let secret_access_key = std::env::var("AWS_SECRET_ACCESS_KEY").ok()?;
        let session_token = std::env::var("AWS_SESSION_TOKEN").ok();

        Some(Self {
            access_key_id,
            secret_access_key,
            session_token,
        })
    }
}

// Credentials deliberately has no Debug derive so the secret key cannot
// leak through debug formatting in logs.

/// SigV4 request signer
///
/// Holds the signing region and service name; credentials are supplied per
/// call so they can rotate between requests.
pub struct RequestSigner {
    region: String,
    service: String,
}

impl RequestSigner {
    /// Create a new signer for a region and service
    pub fn new(region: &str, service: &str) -> Self {
        Self {
            region: region.to_string(),
            service: service.to_string(),
        }
    }

    /// Sign a request, returning the headers to attach to it
    ///
    /// The returned list always carries `x-amz-date` and `authorization`,
    /// plus `x-amz-security-token` when the credentials hold a session
    /// token. The caller is responsible for also sending the content type
    /// that was signed.
    pub fn sign(
        &self,
        credentials: &Credentials,
        method: &str,
        url: &Url,
        content_type: &str,
        payload: &[u8],
        now: DateTime<Utc>,
    ) -> Result<Vec<(String, String)>, SignError> {
        let amz_date = now.format(AMZ_DATE_FORMAT).to_string();
        let scope_date = now.format(SCOPE_DATE_FORMAT).to_string();

        let mut headers = vec![
            ("content-type".to_string(), content_type.to_string()),
            ("host".to_string(), host_header(url)),
            ("x-amz-date".to_string(), amz_date.clone()),
        ];
        if let Some(token) = &credentials.session_token {
            headers.push(("x-amz-security-token".to_string(), token.clone()));
        }
        // Canonical headers must be sorted by name.
        headers.sort_by(|a, b| a.0.cmp(&b.0));

        let signed_headers = headers
            .iter()
            .map(|(name, _)| name.as_str())
            .collect::<Vec<_>>()
            .join(";");

        let canonical = canonical_request(method, url, &headers, &signed_headers, payload);
        let scope = format!(
            "{}/{}/{}/aws4_request",
            scope_date, self.region, self.service
        );
        let to_sign = string_to_sign(&amz_date, &scope, &canonical);

        let key = signing_key(
            &credentials.secret_access_key,
            &scope_date,
            &self.region,
            &self.service,
        )?;
        let signature = hex(&hmac_sha256(&key, to_sign.as_bytes())?);

        let authorization = format!(
            "AWS4-HMAC-SHA256 Credential={}/{}, SignedHeaders={}, Signature={}",
            credentials.access_key_id, scope, signed_headers, signature
        );

        let mut out = vec![
            ("x-amz-date".to_string(), amz_date),
            ("authorization".to_string(), authorization),
        ];
        if let Some(token) = &credentials.session_token {
            out.push(("x-amz-security-token".to_string(), token.clone()));
        }
        Ok(out)
    }
}

/// Build the canonical request string
///
/// `headers` must already be sorted by name and `signed_headers` must be
/// the matching semicolon-joined name list.
fn canonical_request(
    method: &str,
    url: &Url,
    headers: &[(String, String)],
    signed_headers: &str,
    payload: &[u8],
) -> String {
    let canonical_headers: String = headers
        .iter()
        .map(|(name, value)| format!("{}:{}\n", name, value.trim()))
        .collect();

    format!(
        "{}\n{}\n{}\n{}\n{}\n{}",
        method.to_uppercase(),
        url.path(),
        canonical_query(url),
        canonical_headers,
        signed_headers,
        hex(Sha256::digest(payload).as_slice())
    )
}

/// Build the canonical query string: percent-encoded pairs sorted by name
fn canonical_query(url: &Url) -> String {
    let mut pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(name, value)| {
            (
                urlencoding::encode(&name).into_owned(),
                urlencoding::encode(&value).into_owned(),
            )
        })
        .collect();
    pairs.sort();

    pairs
        .iter()
        .map(|(name, value)| format!("{}={}", name, value))
        .collect::<Vec<_>>()
        .join("&")
}

/// Build the string to sign from the request digest and credential scope
fn string_to_sign(amz_date: &str, scope: &str, canonical_request: &str) -> String {
    format!(
        "AWS4-HMAC-SHA256\n{}\n{}\n{}",
        amz_date,
        scope,
        hex(Sha256::digest(canonical_request.as_bytes()).as_slice())
    )
}

/// Derive the signing key through the SigV4 HMAC chain
fn signing_key(
    secret: &str,
    scope_date: &str,
    region: &str,
    service: &str,
) -> Result<Vec<u8>, SignError> {
    let k_date = hmac_sha256(format!("AWS4{}", secret).as_bytes(), scope_date.as_bytes())?;
    let k_region = hmac_sha256(&k_date, region.as_bytes())?;
    let k_service = hmac_sha256(&k_region, service.as_bytes())?;
    hmac_sha256(&k_service, b"aws4_request")
}

fn hmac_sha256(key: &[u8], data: &[u8]) -> Result<Vec<u8>, SignError> {
    let mut mac =
        HmacSha256::new_from_slice(key).map_err(|e| SignError::InvalidKey(e.to_string()))?;
    mac.update(data);
    Ok(mac.finalize().into_bytes().to_vec())
}

/// Host header value for a URL, including the port when it is non-default
fn host_header(url: &Url) -> String {
    let host = url.host_str().unwrap_or_default();
    match url.port() {
        Some(port) => format!("{}:{}", host, port),
        None => host.to_string(),
    }
}

fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}
