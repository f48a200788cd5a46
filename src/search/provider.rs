// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Lookup backend contracts

use async_trait::async_trait;

use super::bilibili::VideoSearchResponse;
use super::types::{FetchError, SourceId};

/// First-party video search API queried by the internal phase
#[async_trait]
pub trait VideoSearchApi: Send + Sync {
    /// Search videos by keyword
    async fn search_videos(&self, keyword: &str) -> Result<VideoSearchResponse, FetchError>;

    /// Backend name for logging
    fn name(&self) -> &'static str;
}

/// Third-party web search engine scraped by the external phase
#[async_trait]
pub trait WebSearchEngine: Send + Sync {
    /// Candidate result links (as found in the page, possibly relative)
    async fn result_links(&self, source: &SourceId) -> Result<Vec<String>, FetchError>;

    /// Destination of a result link without following the redirect
    ///
    /// Returns `Ok(None)` when the response carries no `Location` header.
    async fn resolve_link(&self, href: &str) -> Result<Option<String>, FetchError>;

    /// Backend name for logging
    fn name(&self) -> &'static str;
}
