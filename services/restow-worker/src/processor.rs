// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright 2026 Edgecast Cloud LLC.

//! Task processing pipeline
//!
//! Runs one work item through the full relocation sequence: extract the
//! digest from the object key, resolve the identities catalogued for it,
//! validate the recorded checksums, copy the object to every identity's
//! canonical location, and finally delete the original when configured to
//! and only when every copy landed.
//!
//! Business failures never escape as errors; they collapse into the task
//! result so the orchestrator can account for them per task. Re-invoking a
//! failed task is always safe: destination keys are deterministic and the
//! tag replace directive makes repeated copies converge.

use std::sync::Arc;
use std::time::Instant;

use thiserror::Error;

use restow_types::{ChecksumTags, ResultCode, TaskResult, WorkItem};

use crate::config::WorkerConfig;
use crate::layout;
use crate::metrics;
use crate::resolver::{SearchClientTrait, SearchError};
use crate::store::{ObjectStoreTrait, StoreError};

/// Task-fatal processing errors
///
/// Every variant collapses to `PermanentFailure` at the envelope boundary;
/// [`TaskError::code`] supplies the stable identifier that leads the
/// orchestrator-facing result string.
#[derive(Debug, Error)]
pub enum TaskError {
    #[error("object key {key:?} has no usable digest segment")]
    InvalidSourceKey { key: String },

    #[error("identity resolution failed: {0}")]
    Resolution(#[from] SearchError),

    #[error("no catalogued identity matches digest {digest}")]
    NoIdentity { digest: String },

    #[error("checksum metadata unavailable for {bucket}/{key}: {detail}")]
    MissingChecksum {
        bucket: String,
        key: String,
        detail: String,
    },

    #[error("{failed} of {total} copies failed; attempted destinations: {destinations}")]
    PartialCopy {
        failed: usize,
        total: usize,
        destinations: String,
    },

    #[error("failed to delete original {bucket}/{key} after copy: {source}")]
    Cleanup {
        bucket: String,
        key: String,
        source: StoreError,
    },
}

impl TaskError {
    /// Stable identifier reported to the orchestrator and metrics
    pub fn code(&self) -> &'static str {
        match self {
            TaskError::InvalidSourceKey { .. } => "InvalidSourceKey",
            TaskError::Resolution(_) => "ResolutionError",
            TaskError::NoIdentity { .. } => "NoIdentityError",
            TaskError::MissingChecksum { .. } => "MissingChecksumError",
            TaskError::PartialCopy { .. } => "PartialCopyFailure",
            TaskError::Cleanup { .. } => "CleanupError",
        }
    }
}

/// Outcome of one destination copy
#[derive(Debug, Clone)]
pub struct CopyOutcome {
    /// Canonical key the copy targeted
    pub destination: String,
    /// Whether the copy landed
    pub succeeded: bool,
}

/// Task processor that relocates objects to their canonical locations
pub struct TaskProcessor {
    config: WorkerConfig,
    search: Arc<dyn SearchClientTrait>,
    store: Arc<dyn ObjectStoreTrait>,
}

impl TaskProcessor {
    /// Create a new task processor
    pub fn new(
        config: WorkerConfig,
        search: Arc<dyn SearchClientTrait>,
        store: Arc<dyn ObjectStoreTrait>,
    ) -> Self {
        Self {
            config,
            search,
            store,
        }
    }

    /// Process a single work item, producing its task result
    ///
    /// Never fails: pipeline errors are folded into the result with a
    /// `PermanentFailure` code and a `code: detail` result string.
    pub async fn process_task(&self, item: &WorkItem) -> TaskResult {
        let started = Instant::now();
        let outcome = self.run_pipeline(item).await;
        metrics::record_task_duration(started.elapsed().as_secs_f64());

        match outcome {
            Ok(destinations) => {
                metrics::record_task_succeeded();
                tracing::info!(
                    task_id = %item.task_id,
                    destinations = %destinations,
                    "Task succeeded"
                );
                TaskResult {
                    task_id: item.task_id.clone(),
                    result_code: ResultCode::Succeeded,
                    result_string: destinations,
                }
            }
            Err(error) => {
                metrics::record_task_failed(error.code());
                tracing::warn!(
                    task_id = %item.task_id,
                    error = %error,
                    "Task failed"
                );
                TaskResult {
                    task_id: item.task_id.clone(),
                    result_code: ResultCode::PermanentFailure,
                    result_string: format!("{}: {}", error.code(), error),
                }
            }
        }
    }

    /// Run the pipeline stages in order, returning the joined destination
    /// list on success
    async fn run_pipeline(&self, item: &WorkItem) -> Result<String, TaskError> {
        let bucket = item.bucket();
        let digest =
            layout::digest_from_key(&item.s3_key).ok_or_else(|| TaskError::InvalidSourceKey {
                key: item.s3_key.clone(),
            })?;

        let identities = self
            .search
            .resolve(digest, self.config.max_identities)
            .await?;

        let tags = self.validate_checksums(bucket, &item.s3_key).await?;

        let outcomes = self
            .relocate(bucket, &item.s3_key, digest, &identities, &tags)
            .await?;

        self.aggregate(&outcomes, identities.len(), bucket, &item.s3_key)
            .await
    }

    /// Fetch source metadata and require both checksum fields
    async fn validate_checksums(&self, bucket: &str, key: &str) -> Result<ChecksumTags, TaskError> {
        let missing_checksum = |detail: String| TaskError::MissingChecksum {
            bucket: bucket.to_string(),
            key: key.to_string(),
            detail,
        };

        let metadata = self
            .store
            .head_object(bucket, key)
            .await
            .map_err(|e| missing_checksum(format!("metadata fetch failed: {}", e)))?;

        let sha1 = metadata
            .sha1
            .ok_or_else(|| missing_checksum("no sha1 field in object metadata".to_string()))?;
        let sha256 = metadata
            .sha256
            .ok_or_else(|| missing_checksum("no sha256 field in object metadata".to_string()))?;

        Ok(ChecksumTags { sha1, sha256 })
    }

    /// Copy the object to the canonical location of every identity
    ///
    /// Copies run concurrently and independently: one failure must not
    /// disturb the others, and the routine always yields one outcome per
    /// identity. Fails fast with `NoIdentity` when there is nothing to copy
    /// to.
    async fn relocate(
        &self,
        bucket: &str,
        source_key: &str,
        digest: &str,
        identities: &[String],
        tags: &ChecksumTags,
    ) -> Result<Vec<CopyOutcome>, TaskError> {
        if identities.is_empty() {
            return Err(TaskError::NoIdentity {
                digest: digest.to_string(),
            });
        }

        let tagging = tags.as_tagging();
        let mut handles = Vec::with_capacity(identities.len());

        for identity in identities {
            let destination = layout::canonical_path(identity);
            let store = Arc::clone(&self.store);
            let bucket = bucket.to_string();
            let source_key = source_key.to_string();
            let tagging = tagging.clone();

            handles.push(tokio::spawn(async move {
                match store
                    .copy_object(&bucket, &source_key, &destination, &tagging)
                    .await
                {
                    Ok(()) => {
                        metrics::record_copy_succeeded();
                        tracing::debug!(destination = %destination, "Copy landed");
                        CopyOutcome {
                            destination,
                            succeeded: true,
                        }
                    }
                    Err(e) => {
                        metrics::record_copy_failed();
                        tracing::warn!(
                            destination = %destination,
                            error = %e,
                            "Copy failed"
                        );
                        CopyOutcome {
                            destination,
                            succeeded: false,
                        }
                    }
                }
            }));
        }

        // Join barrier: every copy settles before aggregation reads anything.
        let mut outcomes = Vec::with_capacity(handles.len());
        for (handle, identity) in handles.into_iter().zip(identities) {
            match handle.await {
                Ok(outcome) => outcomes.push(outcome),
                Err(e) => {
                    // A panicked copy task still yields a failed outcome for
                    // its destination.
                    metrics::record_copy_failed();
                    tracing::error!(identity = %identity, error = %e, "Copy task panicked");
                    outcomes.push(CopyOutcome {
                        destination: layout::canonical_path(identity),
                        succeeded: false,
                    });
                }
            }
        }

        Ok(outcomes)
    }

    /// Tally the outcomes and clean up the original when everything landed
    async fn aggregate(
        &self,
        outcomes: &[CopyOutcome],
        identity_count: usize,
        bucket: &str,
        source_key: &str,
    ) -> Result<String, TaskError> {
        let destinations = outcomes
            .iter()
            .map(|outcome| outcome.destination.as_str())
            .collect::<Vec<_>>()
            .join(",");

        // An outcome the fan-out somehow dropped counts as a failure.
        let missing = identity_count.saturating_sub(outcomes.len());
        let failed = outcomes.iter().filter(|o| !o.succeeded).count() + missing;

        if failed > 0 {
            return Err(TaskError::PartialCopy {
                failed,
                total: identity_count,
                destinations,
            });
        }

        if self.config.delete_originals {
            if let Err(e) = self.store.delete_object(bucket, source_key).await {
                metrics::record_cleanup_failure();
                return Err(TaskError::Cleanup {
                    bucket: bucket.to_string(),
                    key: source_key.to_string(),
                    source: e,
                });
            }
            tracing::info!(
                bucket = %bucket,
                key = %source_key,
                "Deleted original after successful copies"
            );
        }

        Ok(destinations)
    }
}
