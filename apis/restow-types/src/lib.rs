// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright 2026 Edgecast Cloud LLC.

//! Shared types for the restow worker.
//!
//! This crate contains the wire contract between the bulk-job orchestrator
//! and the restow worker: the per-task invocation envelope the orchestrator
//! sends, and the result envelope the worker returns. The field names follow
//! the orchestrator's fixed JSON schema (camelCase, `s3Key`/`s3BucketArn`
//! style), so the structs here carry `rename_all` attributes and must not be
//! renamed casually.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use strum::Display;

/// Value of `treatMissingKeysAs` in every reply envelope.
///
/// The orchestrator interprets any task missing from the results list using
/// this policy, which also covers the case where the worker times out and
/// never replies at all.
pub const TREAT_MISSING_KEYS_AS: &str = "PermanentFailure";

/// Tag key for the sha1 checksum carried onto every destination copy.
pub const TAG_SHA1: &str = "computed-sha1";

/// Tag key for the sha256 checksum carried onto every destination copy.
pub const TAG_SHA256: &str = "computed-sha256";

/// One unit of work within a batch invocation.
///
/// Identifies exactly one object to relocate. Produced by the orchestrator;
/// read-only to the worker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct WorkItem {
    /// Opaque task identifier, echoed back in the result
    pub task_id: String,
    /// Key of the object to relocate; its trailing segment is the content digest
    pub s3_key: String,
    /// ARN (or plain name) of the container holding the object
    pub s3_bucket_arn: String,
}

impl WorkItem {
    /// Bucket name from the container reference.
    ///
    /// The reference is an ARN whose final colon-separated piece is the
    /// bucket name; a reference with no colons is taken as a bare name.
    pub fn bucket(&self) -> &str {
        self.s3_bucket_arn
            .rsplit(':')
            .next()
            .unwrap_or(&self.s3_bucket_arn)
    }
}

/// The envelope the orchestrator POSTs for each invocation.
///
/// The orchestrator always supplies exactly one task per envelope today, but
/// the contract is a sequence for forward compatibility. Only the first task
/// is processed; an empty sequence is a model-breaking fault.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct InvocationEnvelope {
    /// Opaque invocation identifier, echoed back in the reply
    pub invocation_id: String,
    /// Schema version string, echoed back in the reply
    pub invocation_schema_version: String,
    /// Work items; only `tasks[0]` is processed
    pub tasks: Vec<WorkItem>,
}

/// Terminal disposition of a single task.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema, Display,
)]
pub enum ResultCode {
    /// All destination copies landed (and cleanup, when enabled, succeeded)
    Succeeded,
    /// Reserved by the orchestrator contract; this worker never produces it.
    /// Transient failures are reported as permanent and retried by
    /// re-invocation, which is safe because destination keys are
    /// deterministic and tagging uses a replace directive.
    TemporaryFailure,
    /// The task failed and re-invocation is the only recourse
    PermanentFailure,
}

/// Per-task result reported back to the orchestrator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct TaskResult {
    /// The task this result answers
    pub task_id: String,
    /// Terminal disposition
    pub result_code: ResultCode,
    /// Comma-joined destination list on success; `code: detail` on failure
    pub result_string: String,
}

/// The reply envelope returned for every invocation.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct InvocationResponse {
    /// Echo of the request's schema version
    pub invocation_schema_version: String,
    /// Always [`TREAT_MISSING_KEYS_AS`]
    pub treat_missing_keys_as: String,
    /// Echo of the request's invocation id
    pub invocation_id: String,
    /// Exactly one entry: the result for `tasks[0]`
    pub results: Vec<TaskResult>,
}

impl InvocationResponse {
    /// Build the reply envelope for a single-task invocation.
    pub fn single(envelope: &InvocationEnvelope, result: TaskResult) -> Self {
        Self {
            invocation_schema_version: envelope.invocation_schema_version.clone(),
            treat_missing_keys_as: TREAT_MISSING_KEYS_AS.to_string(),
            invocation_id: envelope.invocation_id.clone(),
            results: vec![result],
        }
    }
}

/// Checksum metadata read from the source object and reattached, as tags, to
/// every destination copy.
///
/// Both fields must be present on the source before any copy is attempted;
/// a missing field fails the whole task, since a destination tagged with an
/// incomplete set could not be trusted for later deduplication.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ChecksumTags {
    /// Hex sha1 digest recorded on the source object
    pub sha1: String,
    /// Hex sha256 digest recorded on the source object
    pub sha256: String,
}

impl ChecksumTags {
    /// Render the form-encoded tag set applied to destination copies.
    ///
    /// Values are hex digests, so no percent-encoding is required.
    pub fn as_tagging(&self) -> String {
        format!("{}={}&{}={}", TAG_SHA1, self.sha1, TAG_SHA256, self.sha256)
    }
}

// ============================================================================
// Tests
// ============================================================================
