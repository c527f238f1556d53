//! Fallback chain.
//!
//! Runs the map sources in a fixed order of trust. The order and the
//! conditions under which each source runs are data (`PolicyEntry`), not
//! control flow:
//! - direct OS-reported maps are trusted alone
//! - otherwise loader-derived evidence forms the base
//! - the shared library report extends it when the loader evidence was found,
//!   the files/sections report when it was not
//! - stacks are always added

use crate::cache::Memo;
use crate::config::Config;
use crate::events::LifecycleEvent;
use crate::page::Page;
use crate::source::Target;
use crate::strategy::{default_strategies, SourceKind, Strategy};

use std::collections::HashMap;

/// When a policy entry runs, judged by what earlier entries produced
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gate {
    Always,
    /// Only if the given source produced at least one page
    IfProduced(SourceKind),
    /// Only if the given source produced nothing or did not run
    IfEmpty(SourceKind),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PolicyEntry {
    pub source: SourceKind,
    pub gate: Gate,
    /// A non-empty result ends the chain and is used alone
    pub exclusive: bool,
}

pub const DEFAULT_POLICY: &[PolicyEntry] = &[
    PolicyEntry {
        source: SourceKind::ProcMaps,
        gate: Gate::Always,
        exclusive: true,
    },
    PolicyEntry {
        source: SourceKind::AuxvDerived,
        gate: Gate::Always,
        exclusive: false,
    },
    PolicyEntry {
        source: SourceKind::SharedLibraryInfo,
        gate: Gate::IfProduced(SourceKind::AuxvDerived),
        exclusive: false,
    },
    PolicyEntry {
        source: SourceKind::FileInfo,
        gate: Gate::IfEmpty(SourceKind::AuxvDerived),
        exclusive: false,
    },
    PolicyEntry {
        source: SourceKind::Stacks,
        gate: Gate::Always,
        exclusive: false,
    },
];

/// Ordered policy plus the sources it refers to and their memoized output
pub struct Chain {
    policy: Vec<PolicyEntry>,
    strategies: HashMap<SourceKind, Box<dyn Strategy>>,
    results: HashMap<SourceKind, Memo<Vec<Page>>>,
}

impl Default for Chain {
    fn default() -> Self {
        Chain::new(DEFAULT_POLICY.to_vec(), default_strategies())
    }
}

impl Chain {
    pub fn new(policy: Vec<PolicyEntry>, strategies: Vec<Box<dyn Strategy>>) -> Self {
        let strategies: HashMap<_, _> = strategies.into_iter().map(|s| (s.kind(), s)).collect();
        let results = strategies
            .keys()
            .map(|kind| (*kind, Memo::new(kind.scope())))
            .collect();

        Chain {
            policy,
            strategies,
            results,
        }
    }

    pub fn policy(&self) -> &[PolicyEntry] {
        &self.policy
    }

    /// Output of one source, from cache when still valid
    ///
    /// Failures are logged and count as an empty result; they are not cached.
    pub fn run(&mut self, kind: SourceKind, target: &Target, config: &Config) -> Vec<Page> {
        let Some(strategy) = self.strategies.get(&kind) else {
            tracing::warn!("No strategy registered for {}", kind);
            return Vec::new();
        };

        if let Some(pages) = self.results.get(&kind).and_then(|m| m.get()) {
            return pages.clone();
        }

        match strategy.collect(target, config) {
            Ok(pages) => {
                tracing::debug!("{} produced {} pages", kind, pages.len());
                if let Some(memo) = self.results.get_mut(&kind) {
                    memo.set(pages.clone());
                }
                pages
            }
            Err(e) => {
                tracing::warn!("{} unavailable: {:#}", kind, e);
                Vec::new()
            }
        }
    }

    /// Walk the policy and concatenate what each admitted source produced
    pub fn assemble(&mut self, target: &Target, config: &Config) -> Vec<Page> {
        let mut produced: HashMap<SourceKind, usize> = HashMap::new();
        let mut pages = Vec::new();

        for entry in self.policy.clone() {
            let admitted = match entry.gate {
                Gate::Always => true,
                Gate::IfProduced(kind) => produced.get(&kind).copied().unwrap_or(0) > 0,
                Gate::IfEmpty(kind) => produced.get(&kind).copied().unwrap_or(0) == 0,
            };
            if !admitted {
                continue;
            }

            let result = self.run(entry.source, target, config);
            produced.insert(entry.source, result.len());

            if entry.exclusive && !result.is_empty() {
                return result;
            }
            pages.extend(result);
        }

        pages
    }

    /// Drop memoized source output the event makes stale
    pub fn notify(&mut self, event: LifecycleEvent) {
        for (kind, memo) in self.results.iter_mut() {
            if memo.notify(event) {
                tracing::debug!("Cleared cached {} on {}", kind, event);
            }
        }
    }
}
