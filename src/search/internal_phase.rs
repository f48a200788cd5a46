// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Internal (first-party API) search phase

use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

use super::aggregator::ResultAggregator;
use super::bilibili::clean_title;
use super::provider::VideoSearchApi;
use super::quota::RequestQuota;
use super::types::{PhaseError, SourceId, TargetId};
use crate::pipeline::WorkHandler;

/// Looks up each source ID through the video search API
pub struct InternalSearchPhase {
    api: Arc<dyn VideoSearchApi>,
    aggregator: Arc<ResultAggregator>,
    quota: Option<RequestQuota>,
}

impl InternalSearchPhase {
    pub fn new(api: Arc<dyn VideoSearchApi>, aggregator: Arc<ResultAggregator>) -> Self {
        Self {
            api,
            aggregator,
            quota: None,
        }
    }

    /// Share a requests-per-minute cap across all workers of the phase
    pub fn with_quota(mut self, quota: Option<RequestQuota>) -> Self {
        self.quota = quota;
        self
    }
}

#[async_trait]
impl WorkHandler<SourceId> for InternalSearchPhase {
    type Error = PhaseError;

    async fn handle(&self, source: SourceId) -> Result<(), PhaseError> {
        if let Some(quota) = &self.quota {
            quota.wait().await;
        }

        let response = self.api.search_videos(source.as_str()).await?;

        if !response.is_success() {
            debug!(
                source = %source,
                code = response.code,
                message = response.message.as_deref().unwrap_or(""),
                "{} search rejected query",
                self.api.name()
            );
            return Ok(());
        }

        let entries = response.entries();
        if entries.is_empty() {
            debug!(source = %source, "No internal search results");
            return Ok(());
        }

        let hits = entries
            .iter()
            .map(|entry| (TargetId::from_aid(entry.aid), clean_title(&entry.title)))
            .collect();
        let added = self.aggregator.record_internal(&source, hits)?;

        debug!(
            source = %source,
            results = entries.len(),
            new_targets = added,
            "Internal search matched"
        );
        Ok(())
    }
}
