// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright 2026 Edgecast Cloud LLC.

//! API context for the restow worker

use std::sync::Arc;

use anyhow::Result;

use restow_types::{TaskResult, WorkItem};

use crate::config::WorkerConfig;
use crate::processor::TaskProcessor;
use crate::resolver::SearchClient;
use crate::store::ObjectStore;

/// API context shared across all request handlers
pub struct ApiContext {
    processor: TaskProcessor,
}

impl ApiContext {
    /// Create a new API context wired to the live search and store endpoints
    pub fn new(config: WorkerConfig) -> Result<Self> {
        let search = SearchClient::new(
            config.search_endpoint.clone(),
            config.search_index.clone(),
            &config.signing_region,
            config.http_timeout_secs,
        )?;

        let store = ObjectStore::new(config.store_endpoint.clone(), config.http_timeout_secs)?;

        let processor = TaskProcessor::new(config, Arc::new(search), Arc::new(store));

        Ok(Self { processor })
    }

    /// Process one work item through the relocation pipeline
    pub async fn process_task(&self, item: &WorkItem) -> TaskResult {
        self.processor.process_task(item).await
    }
}
