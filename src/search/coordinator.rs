// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Search coordination
//!
//! Runs the internal phase over every source ID, then the external phase over
//! whatever the internal phase left unresolved, then seals the results.

use std::fmt;
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tracing::{debug, info};

use super::aggregator::ResultAggregator;
use super::bilibili::BilibiliSearchClient;
use super::config::{ConfigError, HttpConfig, SearchConfig};
use super::dogedoge::DogeSearchClient;
use super::external_phase::ExternalSearchPhase;
use super::http::{HttpSession, SessionError};
use super::internal_phase::InternalSearchPhase;
use super::provider::{VideoSearchApi, WebSearchEngine};
use super::quota::RequestQuota;
use super::types::{collect_sources, RecordError, SearchReport, SourceId};
use crate::pipeline::{PoolError, PoolReport, RateLimiter, WorkHandler, WorkQueue, WorkerPool};

/// The external engine throttles concurrent access, so it gets one worker
const EXTERNAL_CONCURRENCY: usize = 1;

/// Coordinator lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoordinatorState {
    Idle,
    InternalRunning,
    ExternalRunning,
    Aggregating,
    Done,
}

impl fmt::Display for CoordinatorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::InternalRunning => "internal-running",
            Self::ExternalRunning => "external-running",
            Self::Aggregating => "aggregating",
            Self::Done => "done",
        };
        f.write_str(name)
    }
}

/// Fatal coordinator-level failures
#[derive(Debug, Error)]
pub enum CoordinatorError {
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    HttpClient(#[from] SessionError),

    #[error(transparent)]
    Pool(#[from] PoolError),

    #[error("Failed to finalize results: {0}")]
    Record(#[from] RecordError),

    #[error("Search already ran; create a new coordinator for another search")]
    AlreadyRun,
}

/// Single-use orchestrator of both search phases
pub struct SearchCoordinator {
    config: SearchConfig,
    internal: Arc<dyn VideoSearchApi>,
    external: Arc<dyn WebSearchEngine>,
    state: CoordinatorState,
    internal_report: Option<PoolReport>,
    external_report: Option<PoolReport>,
}

impl SearchCoordinator {
    /// Create a coordinator over explicit backends
    pub fn new(
        config: SearchConfig,
        internal: Arc<dyn VideoSearchApi>,
        external: Arc<dyn WebSearchEngine>,
    ) -> Result<Self, CoordinatorError> {
        config.validate()?;
        Ok(Self {
            config,
            internal,
            external,
            state: CoordinatorState::Idle,
            internal_report: None,
            external_report: None,
        })
    }

    /// Create a coordinator using the Bilibili and DogeDoge clients
    pub fn from_session(
        config: SearchConfig,
        session: &HttpSession,
    ) -> Result<Self, CoordinatorError> {
        config.validate()?;
        let internal = Arc::new(BilibiliSearchClient::new(
            session,
            config.endpoints.internal_search_url.clone(),
        ));
        let external = Arc::new(DogeSearchClient::new(session, &config.endpoints)?);
        Self::new(config, internal, external)
    }

    /// Build a session from `http` and create a coordinator over it
    pub fn connect(config: SearchConfig, http: &HttpConfig) -> Result<Self, CoordinatorError> {
        config.validate()?;
        let session = HttpSession::new(http)?;
        Self::from_session(config, &session)
    }

    pub fn state(&self) -> CoordinatorState {
        self.state
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Pool outcome of the internal phase, once it ran
    pub fn internal_report(&self) -> Option<&PoolReport> {
        self.internal_report.as_ref()
    }

    /// Pool outcome of the external phase, once it ran
    pub fn external_report(&self) -> Option<&PoolReport> {
        self.external_report.as_ref()
    }

    fn transition(&mut self, next: CoordinatorState) {
        debug!(from = %self.state, to = %next, "Coordinator state change");
        self.state = next;
    }

    /// Resolve every source ID and return the report
    ///
    /// Duplicate and blank IDs are collapsed. Can only be called once.
    pub async fn run<I, S>(&mut self, sources: I) -> Result<SearchReport, CoordinatorError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        if self.state != CoordinatorState::Idle {
            return Err(CoordinatorError::AlreadyRun);
        }

        let start = Instant::now();
        let all_sources = collect_sources(sources);
        let aggregator = Arc::new(ResultAggregator::new(
            all_sources.clone(),
            self.config.dedup_across_phases,
        ));

        self.transition(CoordinatorState::InternalRunning);
        info!(
            sources = all_sources.len(),
            concurrency = self.config.internal_concurrency,
            "Starting {} search",
            self.internal.name()
        );
        let pool = WorkerPool::new("internal", self.config.internal_concurrency)?
            .with_rate_limiter(RateLimiter::internal(self.config.internal_delay()));
        let quota = self
            .config
            .internal_rate_limit_per_minute
            .and_then(RequestQuota::per_minute);
        let phase = InternalSearchPhase::new(Arc::clone(&self.internal), Arc::clone(&aggregator))
            .with_quota(quota);
        let report = run_phase(&pool, all_sources.iter().cloned(), phase).await;
        info!(
            found = aggregator.found_sources().len(),
            failed = report.failed,
            "{} search finished",
            self.internal.name()
        );
        self.internal_report = Some(report);

        self.transition(CoordinatorState::ExternalRunning);
        let remaining = aggregator.unresolved();
        info!(
            sources = remaining.len(),
            "Starting {} search; this may take a while",
            self.external.name()
        );
        let pool = WorkerPool::new("external", EXTERNAL_CONCURRENCY)?
            .with_rate_limiter(RateLimiter::external(self.config.external_max_delay_secs));
        let phase = ExternalSearchPhase::new(Arc::clone(&self.external), Arc::clone(&aggregator));
        let report = run_phase(&pool, remaining, phase).await;
        info!(
            found = aggregator.found_sources().len(),
            failed = report.failed,
            "{} search finished",
            self.external.name()
        );
        self.external_report = Some(report);

        self.transition(CoordinatorState::Aggregating);
        let report = aggregator.finalize(start.elapsed())?;
        self.transition(CoordinatorState::Done);

        info!(
            total = report.total_sources,
            matched = report.matched_targets,
            unmatched = report.unmatched.len(),
            elapsed_ms = report.elapsed_ms,
            "Search complete"
        );
        Ok(report)
    }
}

async fn run_phase<I, H>(pool: &WorkerPool, sources: I, handler: H) -> PoolReport
where
    I: IntoIterator<Item = SourceId>,
    H: WorkHandler<SourceId>,
{
    let queue = Arc::new(WorkQueue::new());
    queue.submit_all(sources);
    pool.run(queue, Arc::new(handler)).await
}
