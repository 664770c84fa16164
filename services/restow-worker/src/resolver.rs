// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright 2026 Edgecast Cloud LLC.

//! Identity resolution against the search capability
//!
//! The catalog indexes every file set with its content digests. Resolution
//! asks the search endpoint for the file sets whose recorded sha256 matches
//! the digest extracted from the object key, projecting each hit down to
//! its identity. Zero hits is a valid answer at this layer; the processor
//! decides what it means.

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use serde::Deserialize;
use thiserror::Error;
use url::Url;

use crate::sign::{Credentials, RequestSigner, SignError};

/// Entity type filter applied to every identity query
const ENTITY_TYPE: &str = "FileSet";

/// Service name used in the signing scope for search requests
const SIGNING_SERVICE: &str = "es";

const CONTENT_TYPE_JSON: &str = "application/json";

/// Search client errors
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid search URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("search returned status {0}")]
    Status(reqwest::StatusCode),

    #[error("malformed search response: {0}")]
    Malformed(String),

    #[error("failed to sign search request: {0}")]
    Sign(#[from] SignError),
}

/// Trait abstraction for the search capability used by the processor.
#[async_trait]
pub trait SearchClientTrait: Send + Sync {
    /// Resolve the identities whose catalogued digest matches `digest`
    ///
    /// Returns at most `max_results` identities; an empty list means the
    /// digest is unknown to the catalog.
    async fn resolve(
        &self,
        digest: &str,
        max_results: usize,
    ) -> Result<Vec<String>, SearchError>;
}

/// Concrete search client backed by an HTTP search endpoint
pub struct SearchClient {
    client: Client,
    endpoint: String,
    index: String,
    signer: RequestSigner,
}

impl SearchClient {
    /// Create a new search client
    pub fn new(
        endpoint: String,
        index: String,
        region: &str,
        timeout_secs: u64,
    ) -> Result<Self, SearchError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;

        Ok(Self {
            client,
            endpoint,
            index,
            signer: RequestSigner::new(region, SIGNING_SERVICE),
        })
    }
}

#[async_trait]
impl SearchClientTrait for SearchClient {
    async fn resolve(
        &self,
        digest: &str,
        max_results: usize,
    ) -> Result<Vec<String>, SearchError> {
        let url = Url::parse(&format!("{}/{}/_search", self.endpoint, self.index))?;
        let payload = build_query(digest, max_results).to_string().into_bytes();

        let mut request = self
            .client
            .post(url.clone())
            .header("content-type", CONTENT_TYPE_JSON);

        // Sign when credentials resolve; otherwise send unsigned and let the
        // endpoint decide. Unsigned operation is degraded, not fatal.
        match Credentials::from_env() {
            Some(credentials) => {
                let signed = self.signer.sign(
                    &credentials,
                    "POST",
                    &url,
                    CONTENT_TYPE_JSON,
                    &payload,
                    Utc::now(),
                )?;
                for (name, value) in signed {
                    request = request.header(name.as_str(), value.as_str());
                }
            }
            None => {
                tracing::warn!("No signing credentials resolved, sending unsigned search request");
            }
        }

        let response = request.body(payload).send().await?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(
                status = %status,
                digest = %digest,
                "Search query returned non-success status"
            );
            return Err(SearchError::Status(status));
        }

        let body = response.text().await?;
        let identities = parse_identities(&body)?;

        tracing::debug!(
            digest = %digest,
            count = identities.len(),
            "Resolved identities for digest"
        );

        Ok(identities)
    }
}

/// Build the identity query document
///
/// Filters on the fixed entity type and an exact digest match, projecting
/// hits down to their `id` field.
fn build_query(digest: &str, max_results: usize) -> serde_json::Value {
    serde_json::json!({
        "_source": ["id"],
        "size": max_results,
        "query": {
            "bool": {
                "must": [
                    { "match": { "model.name.keyword": ENTITY_TYPE } },
                    { "match": { "digests.sha256.keyword": digest } },
                ]
            }
        }
    })
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    hits: HitsEnvelope,
}

#[derive(Debug, Deserialize)]
struct HitsEnvelope {
    hits: Vec<Hit>,
}

#[derive(Debug, Deserialize)]
struct Hit {
    #[serde(rename = "_source")]
    source: HitSource,
}

#[derive(Debug, Deserialize)]
struct HitSource {
    id: String,
}

/// Project a search response body down to its hit identities, in rank order
fn parse_identities(body: &str) -> Result<Vec<String>, SearchError> {
    let response: SearchResponse =
        serde_json::from_str(body).map_err(|e| SearchError::Malformed(e.to_string()))?;

    Ok(response
        .hits
        .hits
        .into_iter()
        .map(|hit| hit.source.id)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_document_has_the_expected_shape() {
        let query = build_query("abc123", 1000);

        assert_eq!(query["_source"], serde_json::json!(["id"]));
        assert_eq!(query["size"], 1000);

        let must = &query["query"]["bool"]["must"];
        assert_eq!(must[0]["match"]["model.name.keyword"], "FileSet");
        assert_eq!(must[1]["match"]["digests.sha256.keyword"], "abc123");
    }

    #[test]
    fn query_size_follows_max_results() {
        assert_eq!(build_query("d", 1)["size"], 1);
        assert_eq!(build_query("d", 250)["size"], 250);
    }

    #[test]
    fn parse_projects_hits_to_identities_in_order() {
        let body = r#"{
            "took": 3,
            "hits": {
                "total": { "value": 2 },
                "hits": [
                    { "_index": "catalog", "_source": { "id": "1a2b3c4d5e" } },
                    { "_index": "catalog", "_source": { "id": "f00dfaceca" } }
                ]
            }
        }"#;

        let identities = parse_identities(body).unwrap();
        assert_eq!(identities, vec!["1a2b3c4d5e", "f00dfaceca"]);
    }

    #[test]
    fn parse_accepts_zero_hits() {
        let body = r#"{ "hits": { "hits": [] } }"#;
        assert!(parse_identities(body).unwrap().is_empty());
    }

    #[test]
    fn parse_rejects_malformed_bodies() {
        assert!(matches!(
            parse_identities("not json"),
            Err(SearchError::Malformed(_))
        ));
        assert!(matches!(
            parse_identities(r#"{ "took": 3 }"#),
            Err(SearchError::Malformed(_))
        ));
        assert!(matches!(
            parse_identities(r#"{ "hits": { "hits": [ { "_source": {} } ] } }"#),
            Err(SearchError::Malformed(_))
        ));
    }
}
