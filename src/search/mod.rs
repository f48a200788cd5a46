// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! sm → av search
//!
//! Resolves Niconico `sm` numbers to Bilibili `av` numbers in two phases:
//! - Internal: Bilibili's video search API, N concurrent workers
//! - External: DogeDoge results scraped one source at a time, for whatever
//!   the internal phase left unresolved
//!
//! Both phases feed one [`ResultAggregator`]; the [`SearchCoordinator`]
//! sequences them and produces the final [`SearchReport`].

pub mod aggregator;
pub mod bilibili;
pub mod config;
pub mod coordinator;
pub mod dogedoge;
pub mod external_phase;
pub mod http;
pub mod internal_phase;
pub mod provider;
pub mod quota;
pub mod types;

// Re-export commonly used types
pub use aggregator::ResultAggregator;
pub use bilibili::{BilibiliSearchClient, VideoEntry, VideoSearchData, VideoSearchResponse};
pub use config::{ConfigError, EndpointConfig, HttpConfig, SearchConfig};
pub use coordinator::{CoordinatorError, CoordinatorState, SearchCoordinator};
pub use dogedoge::DogeSearchClient;
pub use external_phase::ExternalSearchPhase;
pub use http::{HttpSession, SessionError};
pub use internal_phase::InternalSearchPhase;
pub use provider::{VideoSearchApi, WebSearchEngine};
pub use quota::RequestQuota;
pub use types::{
    collect_sources, ExternalMatchRecord, FetchError, MatchRecord, PhaseError, RecordError,
    SearchReport, SourceId, TargetId,
};
