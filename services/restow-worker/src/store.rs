// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright 2026 Edgecast Cloud LLC.

//! Object store client
//!
//! Speaks the S3-compatible REST dialect the blob store exposes: HEAD for
//! metadata, PUT with `x-amz-copy-source` for server-side copies, DELETE
//! for removal. Copies replace the destination's tag set wholesale via
//! `x-amz-tagging-directive: REPLACE`.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use thiserror::Error;

/// Metadata header carrying the recorded sha1 checksum
const META_SHA1: &str = "x-amz-meta-sha1";

/// Metadata header carrying the recorded sha256 checksum
const META_SHA256: &str = "x-amz-meta-sha256";

/// Object store errors
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{operation} {bucket}/{key} returned status {status}")]
    Status {
        operation: &'static str,
        bucket: String,
        key: String,
        status: reqwest::StatusCode,
    },
}

/// User metadata recorded on a stored object
#[derive(Debug, Clone, Default)]
pub struct ObjectMetadata {
    /// Recorded sha1 checksum, when present
    pub sha1: Option<String>,
    /// Recorded sha256 checksum, when present
    pub sha256: Option<String>,
}

/// Trait abstraction for the object store used by the processor.
#[async_trait]
pub trait ObjectStoreTrait: Send + Sync {
    /// Fetch the user metadata recorded on an object
    async fn head_object(&self, bucket: &str, key: &str) -> Result<ObjectMetadata, StoreError>;

    /// Server-side copy within a bucket, replacing destination tags
    async fn copy_object(
        &self,
        bucket: &str,
        source_key: &str,
        dest_key: &str,
        tagging: &str,
    ) -> Result<(), StoreError>;

    /// Delete an object
    async fn delete_object(&self, bucket: &str, key: &str) -> Result<(), StoreError>;
}

/// Concrete object store client backed by an S3-compatible endpoint
pub struct ObjectStore {
    client: Client,
    endpoint: String,
}

impl ObjectStore {
    /// Create a new object store client
    pub fn new(endpoint: String, timeout_secs: u64) -> Result<Self, StoreError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;

        Ok(Self { client, endpoint })
    }

    fn object_url(&self, bucket: &str, key: &str) -> String {
        format!("{}/{}/{}", self.endpoint, bucket, encode_key(key))
    }
}

#[async_trait]
impl ObjectStoreTrait for ObjectStore {
    async fn head_object(&self, bucket: &str, key: &str) -> Result<ObjectMetadata, StoreError> {
        let response = self
            .client
            .head(self.object_url(bucket, key))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(StoreError::Status {
                operation: "HEAD",
                bucket: bucket.to_string(),
                key: key.to_string(),
                status,
            });
        }

        Ok(metadata_from_headers(response.headers()))
    }

    async fn copy_object(
        &self,
        bucket: &str,
        source_key: &str,
        dest_key: &str,
        tagging: &str,
    ) -> Result<(), StoreError> {
        let response = self
            .client
            .put(self.object_url(bucket, dest_key))
            .header("x-amz-copy-source", copy_source(bucket, source_key))
            .header("x-amz-tagging", tagging)
            .header("x-amz-tagging-directive", "REPLACE")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(StoreError::Status {
                operation: "PUT",
                bucket: bucket.to_string(),
                key: dest_key.to_string(),
                status,
            });
        }

        Ok(())
    }

    async fn delete_object(&self, bucket: &str, key: &str) -> Result<(), StoreError> {
        let response = self
            .client
            .delete(self.object_url(bucket, key))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(StoreError::Status {
                operation: "DELETE",
                bucket: bucket.to_string(),
                key: key.to_string(),
                status,
            });
        }

        Ok(())
    }
}

/// Project the recorded checksums out of a HEAD response's headers
///
/// A value that is not valid UTF-8 is treated as absent.
fn metadata_from_headers(headers: &reqwest::header::HeaderMap) -> ObjectMetadata {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|value| value.to_str().ok())
            .map(String::from)
    };

    ObjectMetadata {
        sha1: header(META_SHA1),
        sha256: header(META_SHA256),
    }
}

/// Percent-encode each segment of an object key, preserving the slashes
fn encode_key(key: &str) -> String {
    key.split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

/// The `x-amz-copy-source` value for an object: `/{bucket}/{key}`
fn copy_source(bucket: &str, key: &str) -> String {
    format!("/{}/{}", bucket, encode_key(key))
}
