// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright 2026 Edgecast Cloud LLC.

//! Dropshot API trait for the restow worker service.
//!
//! The restow worker relocates content-addressed objects from a landing
//! bucket into their canonical sharded locations. For each invocation the
//! worker:
//!
//! - Extracts the content digest from the submitted object key
//! - Looks up every catalogued identity bearing that digest
//! - Validates that the object's metadata records both checksums
//! - Copies the object to one canonical location per identity, tagging each
//!   copy with its checksums
//! - Optionally deletes the original once every copy has landed
//!
//! ## Endpoints
//!
//! - `POST /invocations` - Process a batch invocation

use dropshot::{HttpError, HttpResponseOk, RequestContext};
use restow_types::{InvocationEnvelope, InvocationResponse};

/// Restow Worker API
///
/// This API is driven by the batch orchestrator, which submits one
/// invocation per object to relocate and consumes the per-task results
/// from the response envelope.
#[dropshot::api_description]
pub trait RestowWorkerApi {
    /// Context type for request handlers
    type Context: Send + Sync + 'static;

    /// Process a batch invocation
    ///
    /// Processes the first task in the envelope: resolves the identities
    /// registered for the object's digest, copies the object to each
    /// canonical location, and reports a single task result. Task-level
    /// failures (unresolvable digests, missing checksum metadata, failed
    /// copies) are reported in the result envelope with a 200 response; the
    /// orchestrator distinguishes them by `resultCode`.
    ///
    /// Returns 400 if the envelope carries no tasks.
    #[endpoint {
        method = POST,
        path = "/invocations",
        tags = ["invocations"],
    }]
    async fn handle_invocation(
        rqctx: RequestContext<Self::Context>,
        body: dropshot::TypedBody<InvocationEnvelope>,
    ) -> Result<HttpResponseOk<InvocationResponse>, HttpError>;
}
