//! Target Access
//!
//! Abstractions over everything the map reconstruction reads from:
//! - The target filesystem, memory, debugger, object-file mapper and register state
//! - A live Linux process via `LiveProcess`
//! - Mock collaborators for testing

#[cfg(test)]
pub mod mock;
mod process;
mod traits;

use std::sync::Arc;

pub use process::LiveProcess;
pub use traits::{DebuggerCommands, ObjfileMapper, RegisterStackProvider, TargetFs, TargetMemory};

/// Every collaborator one inspected process is reached through
#[derive(Clone)]
pub struct Target {
    pub fs: Arc<dyn TargetFs>,
    pub memory: Arc<dyn TargetMemory>,
    pub debugger: Arc<dyn DebuggerCommands>,
    pub mapper: Arc<dyn ObjfileMapper>,
    pub regs: Arc<dyn RegisterStackProvider>,
}

impl Target {
    pub fn new(
        fs: Arc<dyn TargetFs>,
        memory: Arc<dyn TargetMemory>,
        debugger: Arc<dyn DebuggerCommands>,
        mapper: Arc<dyn ObjfileMapper>,
        regs: Arc<dyn RegisterStackProvider>,
    ) -> Self {
        Target {
            fs,
            memory,
            debugger,
            mapper,
            regs,
        }
    }
}
