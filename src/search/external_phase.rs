// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! External (scraped search engine) search phase
//!
//! Runs one source at a time. Every candidate link of a source is resolved
//! before anything is recorded, so a failure part-way through leaves the
//! source unresolved.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

use super::aggregator::ResultAggregator;
use super::provider::WebSearchEngine;
use super::types::{PhaseError, SourceId, TargetId};
use crate::pipeline::WorkHandler;

/// Destinations with a query string are ads or tracking links
pub fn is_organic_destination(destination: &str) -> bool {
    !destination.contains('?')
}

/// Looks up each unresolved source ID through the web search engine
pub struct ExternalSearchPhase {
    engine: Arc<dyn WebSearchEngine>,
    aggregator: Arc<ResultAggregator>,
}

impl ExternalSearchPhase {
    pub fn new(engine: Arc<dyn WebSearchEngine>, aggregator: Arc<ResultAggregator>) -> Self {
        Self { engine, aggregator }
    }
}

#[async_trait]
impl WorkHandler<SourceId> for ExternalSearchPhase {
    type Error = PhaseError;

    async fn handle(&self, source: SourceId) -> Result<(), PhaseError> {
        let links = self.engine.result_links(&source).await?;
        if links.is_empty() {
            debug!(
                source = %source,
                "No {} results; the engine may be throttling",
                self.engine.name()
            );
            return Ok(());
        }

        let mut destinations = Vec::new();
        for href in &links {
            match self.engine.resolve_link(href).await? {
                None => debug!(source = %source, href = %href, "Result link has no redirect target"),
                Some(destination) if !is_organic_destination(&destination) => {
                    debug!(source = %source, destination = %destination, "Skipping non-organic destination")
                }
                Some(destination) => destinations.push(destination),
            }
        }

        if destinations.is_empty() {
            return Ok(());
        }

        let hits = destinations
            .iter()
            .map(|destination| TargetId::extract(destination))
            .collect();
        let added = self.aggregator.record_external(&source, hits)?;

        debug!(
            source = %source,
            destinations = destinations.len(),
            new_targets = added,
            "External search matched"
        );
        Ok(())
    }
}
