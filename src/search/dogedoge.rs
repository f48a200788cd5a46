// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! DogeDoge search engine scraper
//!
//! Result pages list organic hits as
//! `<a class="result__url js-result-extras-url" href="/rd/...">`. Each link is
//! a redirect whose `Location` header is the real destination.

use async_trait::async_trait;
use reqwest::header::LOCATION;
use reqwest::Client;
use scraper::{Html, Selector};
use url::Url;

use super::config::{ConfigError, EndpointConfig};
use super::http::HttpSession;
use super::provider::WebSearchEngine;
use super::types::{FetchError, SourceId};

/// Organic result link anchors (exact class attribute match)
const RESULT_LINK_SELECTOR: &str = r#"a[class="result__url js-result-extras-url"]"#;

/// Reqwest-backed [`WebSearchEngine`]
pub struct DogeSearchClient {
    client: Client,
    no_redirect: Client,
    search_url: String,
    origin: Url,
    site_filter: String,
}

impl DogeSearchClient {
    pub fn new(session: &HttpSession, endpoints: &EndpointConfig) -> Result<Self, ConfigError> {
        let origin =
            Url::parse(&endpoints.external_origin).map_err(|e| ConfigError::InvalidUrl {
                name: "external origin",
                value: endpoints.external_origin.clone(),
                reason: e.to_string(),
            })?;

        Ok(Self {
            client: session.client().clone(),
            no_redirect: session.no_redirect().clone(),
            search_url: endpoints.external_search_url.clone(),
            origin,
            site_filter: endpoints.site_filter.clone(),
        })
    }

    /// Absolute URL of a result link
    pub fn link_url(&self, href: &str) -> Result<Url, FetchError> {
        self.origin.join(href).map_err(|e| FetchError::InvalidUrl {
            href: href.to_string(),
            reason: e.to_string(),
        })
    }
}

/// Query text restricting results to the target site
pub fn build_query(source: &SourceId, site_filter: &str) -> String {
    format!("{} site:{}", source, site_filter)
}

/// Extract the `href` of every organic result link
pub fn parse_result_links(html: &str) -> Vec<String> {
    let document = Html::parse_document(html);
    let Ok(selector) = Selector::parse(RESULT_LINK_SELECTOR) else {
        return Vec::new();
    };

    document
        .select(&selector)
        .filter_map(|anchor| anchor.value().attr("href"))
        .map(str::to_string)
        .collect()
}

#[async_trait]
impl WebSearchEngine for DogeSearchClient {
    async fn result_links(&self, source: &SourceId) -> Result<Vec<String>, FetchError> {
        let query = build_query(source, &self.site_filter);
        let response = self
            .client
            .get(&self.search_url)
            .query(&[("q", query.as_str()), ("lang", "cn")])
            .send()
            .await
            .map_err(|e| FetchError::from_reqwest(&self.search_url, e))?;

        if !response.status().is_success() {
            return Err(FetchError::Status {
                status: response.status().as_u16(),
                url: self.search_url.clone(),
            });
        }

        let html = response
            .text()
            .await
            .map_err(|e| FetchError::from_reqwest(&self.search_url, e))?;

        Ok(parse_result_links(&html))
    }

    async fn resolve_link(&self, href: &str) -> Result<Option<String>, FetchError> {
        let url = self.link_url(href)?;
        let response = self
            .no_redirect
            .get(url.clone())
            .send()
            .await
            .map_err(|e| FetchError::from_reqwest(url.as_str(), e))?;

        let Some(location) = response.headers().get(LOCATION) else {
            return Ok(None);
        };

        location
            .to_str()
            .map(|destination| Some(destination.to_string()))
            .map_err(|_| FetchError::InvalidHeader {
                url: url.to_string(),
            })
    }

    fn name(&self) -> &'static str {
        "dogedoge"
    }
}
