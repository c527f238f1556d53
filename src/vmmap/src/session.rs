//! Memory map session.
//!
//! Owns every piece of state scoped to one inspected process instance and
//! answers map queries from it:
//! - `get` - the full, sorted, best-effort map
//! - `find` - the page holding one address, probing if nothing reported it
//! - `explore` - forced probing, remembered until the process exits
//! - `aslr_enabled` - whether randomization is in effect
//!
//! Wrap a session in `SharedSession` to query it from several threads; the
//! mutex covers every cache read and update.

use crate::aslr::AslrDetector;
use crate::cache::{ExplorationCache, Memo, MemoMap, Scope};
use crate::chain::Chain;
use crate::config::Config;
use crate::events::{LifecycleEvent, LifecycleEvents, LifecycleListener};
use crate::page::{page_align, sort_by_start, Page};
use crate::prober::Prober;
use crate::source::Target;

use std::sync::{Arc, Mutex};

pub type SharedSession = Arc<Mutex<Session>>;

pub struct Session {
    target: Target,
    config: Config,
    chain: Chain,
    full_map: Memo<Vec<Page>>,
    found: MemoMap<u64, Option<Page>>,
    explored: ExplorationCache,
    aslr: AslrDetector,
}

impl Session {
    pub fn new(target: Target, config: Config) -> Self {
        Self::with_chain(target, config, Chain::default())
    }

    pub fn with_chain(target: Target, config: Config, chain: Chain) -> Self {
        Session {
            target,
            config,
            chain,
            full_map: Memo::new(Scope::STOP | Scope::NEW_OBJFILE),
            found: MemoMap::new(Scope::STOP | Scope::NEW_OBJFILE),
            explored: ExplorationCache::new(),
            aslr: AslrDetector::new(),
        }
    }

    /// Share the session and subscribe it to `events`
    pub fn subscribe(self, events: &mut dyn LifecycleEvents) -> SharedSession {
        let shared = Arc::new(Mutex::new(self));
        events.subscribe(shared.clone());
        shared
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn target(&self) -> &Target {
        &self.target
    }

    /// Pages recorded by probing so far
    pub fn explored(&self) -> &[Page] {
        self.explored.pages()
    }

    /// Full memory map sorted by start address
    ///
    /// Overlapping pages from different sources are all kept.
    pub fn get(&mut self) -> Vec<Page> {
        if let Some(pages) = self.full_map.get() {
            return pages.clone();
        }

        let mut pages = self.chain.assemble(&self.target, &self.config);
        pages.extend(self.explored.pages().iter().cloned());
        sort_by_start(&mut pages);

        self.full_map.set(pages.clone());
        pages
    }

    /// Page containing `address`, probing the target when no source knows it
    pub fn find(&mut self, address: Option<u64>) -> Option<Page> {
        let address = address?;
        if address < self.config.mmap_min_addr {
            return None;
        }

        if let Some(found) = self.found.get(&address) {
            return found.clone();
        }

        let found = match self.get().into_iter().find(|p| p.contains(address)) {
            Some(page) => Some(page),
            None => self.explore(address),
        };

        self.found.insert(address, found.clone());
        found
    }

    /// Probe the mapping around `address` and remember it
    ///
    /// An address inside an already explored page returns that page without
    /// touching target memory.
    pub fn explore(&mut self, address: u64) -> Option<Page> {
        let aligned = page_align(address, self.config.page_size);
        if let Some(page) = self.explored.find(aligned) {
            return Some(page.clone());
        }

        let prober = Prober::new(self.target.memory.as_ref(), &self.config);
        let page = prober.probe(aligned, self.target.regs.stack_nx())?;

        self.explored.push(page.clone());
        self.full_map.clear();
        Some(page)
    }

    /// Look up every register value so the pages they point into get explored
    pub fn explore_registers(&mut self) {
        let registers = match self.target.regs.registers() {
            Ok(registers) => registers,
            Err(e) => {
                tracing::debug!("No registers to explore: {:#}", e);
                return;
            }
        };

        for (name, value) in registers {
            if let Some(page) = self.find(Some(value)) {
                tracing::trace!("{} = {:#x} in {:#x}-{:#x}", name, value, page.start, page.end());
            }
        }
    }

    pub fn aslr_enabled(&mut self) -> bool {
        self.aslr.enabled(&self.target, &self.config)
    }

    /// Re-run ASLR detection
    pub fn check_aslr(&mut self) -> bool {
        self.aslr.check(&self.target, &self.config)
    }
}

impl LifecycleListener for Session {
    fn on_event(&mut self, event: LifecycleEvent) {
        self.chain.notify(event);
        self.full_map.notify(event);
        self.found.notify(event);
        if self.explored.notify(event) {
            tracing::debug!("Dropped explored pages on {}", event);
        }

        match event {
            LifecycleEvent::Stopped => self.explore_registers(),
            LifecycleEvent::NewObjfile => {
                self.check_aslr();
            }
            LifecycleEvent::Exited => self.aslr.reset(),
        }
    }
}
