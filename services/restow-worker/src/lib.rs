// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright 2026 Edgecast Cloud LLC.

//! Restow Worker Library
//!
//! This library provides the core functionality for the restow worker
//! service. The worker receives single-task batch invocations from the bulk
//! orchestrator and relocates each staged blob to the canonical location of
//! every catalogued identity whose content digest matches the blob.
//!
//! # Modules
//!
//! - [`config`] - Worker configuration (endpoints, deletion switch, limits)
//! - [`context`] - API context for request handlers
//! - [`layout`] - Digest extraction and canonical key layout
//! - [`metrics`] - Prometheus metrics
//! - [`processor`] - Task pipeline (resolve, validate, copy, clean up)
//! - [`resolver`] - Identity resolution against the search endpoint
//! - [`sign`] - Request signing for the search endpoint
//! - [`store`] - Object store client (metadata, server-side copy, delete)

pub mod config;
pub mod context;
pub mod layout;
pub mod metrics;
pub mod processor;
pub mod resolver;
pub mod sign;
pub mod store;

use dropshot::{HttpError, HttpResponseOk, RequestContext};
use restow_api::RestowWorkerApi;
use restow_types::{InvocationEnvelope, InvocationResponse};

use crate::context::ApiContext;

/// Restow Worker API implementation
///
/// This enum serves as the implementation type for the `RestowWorkerApi`
/// trait. It contains no data - all state is stored in the `ApiContext`.
pub enum RestowWorkerImpl {}

impl RestowWorkerApi for RestowWorkerImpl {
    type Context = ApiContext;

    async fn handle_invocation(
        rqctx: RequestContext<Self::Context>,
        body: dropshot::TypedBody<InvocationEnvelope>,
    ) -> Result<HttpResponseOk<InvocationResponse>, HttpError> {
        let ctx = rqctx.context();
        let envelope = body.into_inner();

        // The orchestrator contract is one task per invocation; the sequence
        // form exists for forward compatibility. An empty sequence has no
        // task to answer for, so it is a request-level fault rather than a
        // task failure.
        let Some(item) = envelope.tasks.first() else {
            tracing::warn!(
                invocation_id = %envelope.invocation_id,
                "Invocation envelope carries no tasks"
            );
            return Err(HttpError::for_bad_request(
                None,
                "invocation envelope carries no tasks".to_string(),
            ));
        };

        tracing::info!(
            invocation_id = %envelope.invocation_id,
            task_id = %item.task_id,
            key = %item.s3_key,
            "Received invocation"
        );

        let result = ctx.process_task(item).await;

        Ok(HttpResponseOk(InvocationResponse::single(&envelope, result)))
    }
}
