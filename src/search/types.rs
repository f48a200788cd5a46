// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Core types for sm → av resolution

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::sync::OnceLock;
use thiserror::Error;

/// An input identifier to resolve (a Niconico `sm` number)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SourceId(String);

impl SourceId {
    /// Build a source ID from user input; blank tokens yield `None`
    pub fn new(raw: impl AsRef<str>) -> Option<Self> {
        let trimmed = raw.as_ref().trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Collapse raw input into the working set of source IDs
pub fn collect_sources<I, S>(raw: I) -> BTreeSet<SourceId>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    raw.into_iter().filter_map(SourceId::new).collect()
}

/// A resolved video identifier (a Bilibili `av` number)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TargetId(String);

fn target_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"av\d+").expect("target ID pattern is valid"))
}

impl TargetId {
    /// Target ID for a numeric archive ID returned by the search API
    pub fn from_aid(aid: u64) -> Self {
        Self(format!("av{}", aid))
    }

    /// First `av<digits>` occurrence in `text`
    pub fn extract(text: &str) -> Option<Self> {
        target_pattern()
            .find(text)
            .map(|m| Self(m.as_str().to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TargetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A match found by the internal search API
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchRecord {
    pub source: SourceId,
    pub target: TargetId,
    pub title: String,
}

/// A match found through the external search engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExternalMatchRecord {
    pub source: SourceId,
    pub target: TargetId,
}

/// Final, immutable result of a search run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchReport {
    /// Number of distinct source IDs searched
    pub total_sources: usize,
    /// Number of distinct target IDs found
    pub matched_targets: usize,
    /// Source IDs neither phase could resolve
    pub unmatched: Vec<SourceId>,
    pub internal_matches: Vec<MatchRecord>,
    pub external_matches: Vec<ExternalMatchRecord>,
    /// Wall time of the whole run in milliseconds
    pub elapsed_ms: u64,
}

/// Transient failure fetching or decoding one backend response
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchError {
    #[error("Request to {url} timed out")]
    Timeout { url: String },

    #[error("Request to {url} failed: {message}")]
    Request { url: String, message: String },

    #[error("HTTP {status} from {url}")]
    Status { status: u16, url: String },

    #[error("Malformed response from {url}: {reason}")]
    Decode { url: String, reason: String },

    #[error("Invalid result link '{href}': {reason}")]
    InvalidUrl { href: String, reason: String },

    #[error("Unreadable Location header from {url}")]
    InvalidHeader { url: String },
}

impl FetchError {
    pub(crate) fn from_reqwest(url: &str, e: reqwest::Error) -> Self {
        if e.is_timeout() {
            FetchError::Timeout {
                url: url.to_string(),
            }
        } else if e.is_decode() {
            FetchError::Decode {
                url: url.to_string(),
                reason: e.to_string(),
            }
        } else {
            FetchError::Request {
                url: url.to_string(),
                message: e.to_string(),
            }
        }
    }
}

/// Rejected attempt to record a result
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RecordError {
    #[error("Source {0} is not part of this search")]
    UnknownSource(SourceId),

    #[error("Results were already finalized")]
    Finalized,
}

/// Failure of one phase handler for one source ID
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PhaseError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Record(#[from] RecordError),
}
