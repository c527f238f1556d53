//! Map Sources
//!
//! Each source independently turns one kind of evidence into pages:
//! - `ProcMaps` - the process-maps pseudo-file
//! - `AuxvDerived` - executable and vDSO located through the auxiliary vector
//! - `SharedLibraryInfo` - the debugger's shared library report
//! - `FileInfo` - the debugger's loaded files/sections report
//! - `Stacks` - stack regions from the register/stack provider

mod auxv_derived;
mod files;
mod proc_maps;
mod sharedlib;
mod stacks;

use crate::cache::Scope;
use crate::config::Config;
use crate::page::Page;
use crate::source::Target;

use anyhow::Result;
use std::fmt;

pub use auxv_derived::AuxvDerived;
pub use files::{parse_info_files, FileInfo};
pub use proc_maps::{parse_maps, ProcMaps};
pub use sharedlib::{parse_sharedlibrary, SharedLibraryInfo};
pub use stacks::Stacks;

/// Identity of a map source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceKind {
    ProcMaps,
    AuxvDerived,
    SharedLibraryInfo,
    FileInfo,
    Stacks,
}

impl SourceKind {
    /// Events that make a memoized result of this source stale
    pub fn scope(self) -> Scope {
        match self {
            SourceKind::ProcMaps | SourceKind::Stacks => Scope::STOP,
            SourceKind::SharedLibraryInfo | SourceKind::FileInfo => Scope::NEW_OBJFILE,
            SourceKind::AuxvDerived => Scope::EXIT,
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SourceKind::ProcMaps => "procmaps",
            SourceKind::AuxvDerived => "auxv_derived",
            SourceKind::SharedLibraryInfo => "sharedlib",
            SourceKind::FileInfo => "fileinfo",
            SourceKind::Stacks => "stacks",
        };
        f.write_str(name)
    }
}

/// One evidence source producing zero or more pages
pub trait Strategy: Send + Sync {
    fn kind(&self) -> SourceKind;

    /// Pages recovered from this source; `Err` means the source was unavailable
    fn collect(&self, target: &Target, config: &Config) -> Result<Vec<Page>>;
}

/// Map each (address, object) pair, skipping objects the mapper rejects
pub(crate) fn map_objects(target: &Target, objects: &[(u64, String)]) -> Vec<Page> {
    let mut pages = Vec::new();
    for (address, name) in objects {
        match target.mapper.map(*address, name) {
            Ok(mapped) => pages.extend(mapped),
            Err(e) => tracing::warn!("Cannot map {} at {:#x}: {}", name, address, e),
        }
    }
    pages
}

/// The standard set of sources
pub fn default_strategies() -> Vec<Box<dyn Strategy>> {
    vec![
        Box::new(ProcMaps),
        Box::new(AuxvDerived::default()),
        Box::new(SharedLibraryInfo),
        Box::new(FileInfo),
        Box::new(Stacks),
    ]
}
