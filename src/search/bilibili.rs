// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Bilibili web-interface video search
//!
//! `GET <endpoint>?keyword=<sm>&search_type=video` answers with
//! `{code, data?: {result?: [{aid, title}]}}`; `code == 0` means success.

use async_trait::async_trait;
use reqwest::Client;
use scraper::Html;
use serde::{Deserialize, Serialize};

use super::http::HttpSession;
use super::provider::VideoSearchApi;
use super::types::FetchError;

/// Search API response envelope
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoSearchResponse {
    pub code: i64,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub data: Option<VideoSearchData>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoSearchData {
    #[serde(default)]
    pub result: Option<Vec<VideoEntry>>,
}

/// One video in the search result list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoEntry {
    pub aid: u64,
    #[serde(default)]
    pub title: String,
}

impl VideoSearchResponse {
    pub fn is_success(&self) -> bool {
        self.code == 0
    }

    /// Result entries of a successful response
    ///
    /// Empty when the API reported failure or returned no result list.
    pub fn entries(&self) -> &[VideoEntry] {
        if !self.is_success() {
            return &[];
        }
        self.data
            .as_ref()
            .and_then(|data| data.result.as_deref())
            .unwrap_or(&[])
    }
}

/// Reqwest-backed [`VideoSearchApi`]
pub struct BilibiliSearchClient {
    client: Client,
    endpoint: String,
}

impl BilibiliSearchClient {
    pub fn new(session: &HttpSession, endpoint: impl Into<String>) -> Self {
        Self {
            client: session.client().clone(),
            endpoint: endpoint.into(),
        }
    }
}

#[async_trait]
impl VideoSearchApi for BilibiliSearchClient {
    async fn search_videos(&self, keyword: &str) -> Result<VideoSearchResponse, FetchError> {
        let response = self
            .client
            .get(&self.endpoint)
            .query(&[("keyword", keyword), ("search_type", "video")])
            .send()
            .await
            .map_err(|e| FetchError::from_reqwest(&self.endpoint, e))?;

        if !response.status().is_success() {
            return Err(FetchError::Status {
                status: response.status().as_u16(),
                url: self.endpoint.clone(),
            });
        }

        response
            .json::<VideoSearchResponse>()
            .await
            .map_err(|e| FetchError::Decode {
                url: self.endpoint.clone(),
                reason: e.to_string(),
            })
    }

    fn name(&self) -> &'static str {
        "bilibili"
    }
}

/// Strip keyword highlight markup and decode entities in a result title
///
/// Titles arrive as e.g. `【MAD】<em class="keyword">sm9</em> &amp; more`.
pub fn clean_title(raw: &str) -> String {
    let fragment = Html::parse_fragment(raw);
    let text: String = fragment.root_element().text().collect();
    text.trim().to_string()
}
