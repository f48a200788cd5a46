// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Shared result state for both search phases
//!
//! All mutation goes through one mutex. The lock is never held across an
//! `.await`.

use std::collections::{BTreeSet, HashSet};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tracing::warn;

use super::types::{
    ExternalMatchRecord, MatchRecord, RecordError, SearchReport, SourceId, TargetId,
};

#[derive(Default)]
struct AggregatorState {
    found_targets: HashSet<TargetId>,
    found_sources: HashSet<SourceId>,
    external_found_targets: HashSet<TargetId>,
    internal_matches: Vec<MatchRecord>,
    external_matches: Vec<ExternalMatchRecord>,
    finalized: bool,
}

/// Deduplicating accumulator of matches from both phases
pub struct ResultAggregator {
    all_sources: BTreeSet<SourceId>,
    dedup_across_phases: bool,
    state: Mutex<AggregatorState>,
}

impl ResultAggregator {
    pub fn new(all_sources: BTreeSet<SourceId>, dedup_across_phases: bool) -> Self {
        Self {
            all_sources,
            dedup_across_phases,
            state: Mutex::new(AggregatorState::default()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, AggregatorState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Lock the state for a write on behalf of `source`
    fn writable(&self, source: &SourceId) -> Result<MutexGuard<'_, AggregatorState>, RecordError> {
        if !self.all_sources.contains(source) {
            return Err(RecordError::UnknownSource(source.clone()));
        }
        let state = self.lock();
        if state.finalized {
            warn!(source = %source, "Result recorded after finalization, ignoring");
            return Err(RecordError::Finalized);
        }
        Ok(state)
    }

    pub fn all_sources(&self) -> &BTreeSet<SourceId> {
        &self.all_sources
    }

    /// Record internal-phase hits for a source that returned results
    ///
    /// Marks `source` found and appends a record for every target not seen
    /// before in this phase. Returns the number of new records.
    pub fn record_internal(
        &self,
        source: &SourceId,
        hits: Vec<(TargetId, String)>,
    ) -> Result<usize, RecordError> {
        let mut state = self.writable(source)?;
        state.found_sources.insert(source.clone());

        let mut added = 0;
        for (target, title) in hits {
            if state.found_targets.insert(target.clone()) {
                state.internal_matches.push(MatchRecord {
                    source: source.clone(),
                    target,
                    title,
                });
                added += 1;
            }
        }
        Ok(added)
    }

    /// Record external-phase destinations for a source
    ///
    /// Each entry is one accepted destination; `None` means the destination
    /// carried no target ID but still confirms the source. Returns the number
    /// of new records.
    pub fn record_external(
        &self,
        source: &SourceId,
        hits: Vec<Option<TargetId>>,
    ) -> Result<usize, RecordError> {
        let mut state = self.writable(source)?;
        state.found_sources.insert(source.clone());

        let mut added = 0;
        for target in hits.into_iter().flatten() {
            if self.dedup_across_phases && state.found_targets.contains(&target) {
                continue;
            }
            if state.external_found_targets.insert(target.clone()) {
                state.external_matches.push(ExternalMatchRecord {
                    source: source.clone(),
                    target,
                });
                added += 1;
            }
        }
        Ok(added)
    }

    pub fn is_found(&self, source: &SourceId) -> bool {
        self.lock().found_sources.contains(source)
    }

    /// Sources without a confirmed match so far, in sorted order
    pub fn unresolved(&self) -> Vec<SourceId> {
        let state = self.lock();
        self.all_sources
            .iter()
            .filter(|source| !state.found_sources.contains(*source))
            .cloned()
            .collect()
    }

    pub fn found_sources(&self) -> BTreeSet<SourceId> {
        self.lock().found_sources.iter().cloned().collect()
    }

    pub fn found_targets(&self) -> BTreeSet<TargetId> {
        self.lock().found_targets.iter().cloned().collect()
    }

    pub fn external_found_targets(&self) -> BTreeSet<TargetId> {
        self.lock().external_found_targets.iter().cloned().collect()
    }

    /// Seal the state and produce the report
    ///
    /// Any later record attempt is rejected.
    pub fn finalize(&self, elapsed: Duration) -> Result<SearchReport, RecordError> {
        let mut state = self.lock();
        if state.finalized {
            return Err(RecordError::Finalized);
        }
        state.finalized = true;

        let matched_targets = if self.dedup_across_phases {
            state
                .found_targets
                .union(&state.external_found_targets)
                .count()
        } else {
            state.found_targets.len() + state.external_found_targets.len()
        };

        let unmatched = self
            .all_sources
            .iter()
            .filter(|source| !state.found_sources.contains(*source))
            .cloned()
            .collect();

        Ok(SearchReport {
            total_sources: self.all_sources.len(),
            matched_targets,
            unmatched,
            internal_matches: std::mem::take(&mut state.internal_matches),
            external_matches: std::mem::take(&mut state.external_matches),
            elapsed_ms: elapsed.as_millis() as u64,
        })
    }
}
