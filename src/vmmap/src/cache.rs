//! Lifecycle-scoped caches.
//!
//! Every cache carries the set of events that clear it. Exit clears all of them.

use crate::events::LifecycleEvent;
use crate::page::Page;
use std::collections::HashMap;
use std::hash::Hash;

bitflags::bitflags! {
    /// Events that invalidate a cache
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Scope: u8 {
        const STOP = 0b001;
        const NEW_OBJFILE = 0b010;
        const EXIT = 0b100;
    }
}

impl Scope {
    pub fn of(event: LifecycleEvent) -> Scope {
        match event {
            LifecycleEvent::Stopped => Scope::STOP,
            LifecycleEvent::NewObjfile => Scope::NEW_OBJFILE,
            LifecycleEvent::Exited => Scope::EXIT,
        }
    }

    /// Whether a cache tagged with `self` is cleared by `event`
    pub fn cleared_by(self, event: LifecycleEvent) -> bool {
        self.contains(Scope::of(event))
    }
}

/// A single memoized value
#[derive(Debug)]
pub struct Memo<T> {
    scope: Scope,
    value: Option<T>,
}

impl<T> Memo<T> {
    pub fn new(scope: Scope) -> Self {
        Memo {
            scope: scope | Scope::EXIT,
            value: None,
        }
    }

    pub fn scope(&self) -> Scope {
        self.scope
    }

    pub fn get(&self) -> Option<&T> {
        self.value.as_ref()
    }

    pub fn set(&mut self, value: T) {
        self.value = Some(value);
    }

    pub fn clear(&mut self) {
        self.value = None;
    }

    /// Clear if `event` is in scope; returns whether anything was dropped
    pub fn notify(&mut self, event: LifecycleEvent) -> bool {
        self.scope.cleared_by(event) && self.value.take().is_some()
    }
}

/// Memoized results keyed by argument
#[derive(Debug)]
pub struct MemoMap<K, V> {
    scope: Scope,
    values: HashMap<K, V>,
}

impl<K: Eq + Hash, V> MemoMap<K, V> {
    pub fn new(scope: Scope) -> Self {
        MemoMap {
            scope: scope | Scope::EXIT,
            values: HashMap::new(),
        }
    }

    pub fn get(&self, key: &K) -> Option<&V> {
        self.values.get(key)
    }

    pub fn insert(&mut self, key: K, value: V) {
        self.values.insert(key, value);
    }

    pub fn clear(&mut self) {
        self.values.clear();
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn notify(&mut self, event: LifecycleEvent) -> bool {
        if self.scope.cleared_by(event) && !self.values.is_empty() {
            self.values.clear();
            return true;
        }
        false
    }
}

/// Pages found by active probing
///
/// Append-only for the lifetime of the inspected process: entries survive
/// stops and library loads even if the memory is later unmapped.
#[derive(Debug, Default)]
pub struct ExplorationCache {
    pages: Vec<Page>,
}

impl ExplorationCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, page: Page) {
        self.pages.push(page);
    }

    /// First recorded page containing `address`
    pub fn find(&self, address: u64) -> Option<&Page> {
        self.pages.iter().find(|p| p.contains(address))
    }

    pub fn pages(&self) -> &[Page] {
        &self.pages
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    pub fn notify(&mut self, event: LifecycleEvent) -> bool {
        if event == LifecycleEvent::Exited && !self.pages.is_empty() {
            self.pages.clear();
            return true;
        }
        false
    }
}
