//! Virtual memory map reconstruction for debugged processes
//!
//! Recovers the set of mapped, permission-tagged address ranges of a live
//! process even when `/proc/pid/maps` cannot be read, by falling back to
//! weaker evidence:
//!
//! 1. The process-maps pseudo-file (trusted alone when readable)
//! 2. The auxiliary vector (executable entry point and vDSO)
//! 3. The debugger's shared library or loaded files report
//! 4. Known stack regions
//! 5. Pages discovered by probing target memory
//!
//! # Example
//!
//! ```no_run
//! use vmmap::{Config, EventBus, LifecycleEvent, Session, Target};
//!
//! fn attach(target: Target) -> anyhow::Result<()> {
//!     let mut bus = EventBus::new();
//!     let session = Session::new(target, Config::load()?).subscribe(&mut bus);
//!
//!     bus.fire(LifecycleEvent::Stopped);
//!     for page in session.lock().unwrap().get() {
//!         println!("{}", page);
//!     }
//!     Ok(())
//! }
//! ```

pub mod aslr;
pub mod auxv;
pub mod cache;
pub mod chain;
pub mod config;
pub mod events;
pub mod page;
pub mod prober;
pub mod report;
pub mod session;
pub mod source;
pub mod strategy;

pub use aslr::AslrDetector;
pub use auxv::{AuxvInfo, AuxvValue};
pub use chain::{Chain, Gate, PolicyEntry, DEFAULT_POLICY};
pub use config::Config;
pub use events::{EventBus, LifecycleEvent, LifecycleEvents, LifecycleListener};
pub use page::{page_align, Page, PageFlags, MMAP_MIN_ADDR, PAGE_SIZE};
pub use prober::Prober;
pub use report::{ParseWarning, Parsed};
pub use session::{Session, SharedSession};
pub use source::{
    DebuggerCommands, LiveProcess, ObjfileMapper, RegisterStackProvider, Target, TargetFs,
    TargetMemory,
};
pub use strategy::{SourceKind, Strategy};

/// Errors from map reconstruction
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Parse error on line {line}: {reason}")]
    Parse { line: usize, reason: String },

    #[error("Source unavailable: {0}")]
    Unavailable(String),
}

pub type Result<T> = std::result::Result<T, Error>;
