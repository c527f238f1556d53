//! Live Process Access
//!
//! Filesystem and memory access for a process running on the local machine.

use super::{TargetFs, TargetMemory};

use anyhow::{Context, Result};
use process_memory::{CopyAddress, ProcessHandle, PutAddress, TryIntoProcessHandle};

/// A local process reached through `/proc` and cross-process memory calls
pub struct LiveProcess {
    pub pid: u32,
    pub handle: ProcessHandle,
}

// SAFETY: the handle is a plain pid on Linux and a process-wide HANDLE on Windows,
// both usable from any thread.
unsafe impl Send for LiveProcess {}
unsafe impl Sync for LiveProcess {}

impl LiveProcess {
    /// Attach to a running process by pid
    pub fn attach(pid: u32) -> Result<Self> {
        let handle = (pid as process_memory::Pid)
            .try_into_process_handle()
            .with_context(|| format!("Failed to attach to process {}", pid))?;

        Ok(LiveProcess { pid, handle })
    }
}

impl TargetFs for LiveProcess {
    fn read(&self, path: &str) -> Result<Vec<u8>> {
        std::fs::read(path).with_context(|| format!("Failed to read {}", path))
    }
}

impl TargetMemory for LiveProcess {
    fn read_bytes(&self, address: u64, size: usize) -> Result<Vec<u8>> {
        let mut buffer = vec![0u8; size];
        self.handle
            .copy_address(address as usize, &mut buffer)
            .with_context(|| format!("Failed to read {} bytes at {:#x}", size, address))?;
        Ok(buffer)
    }

    fn write_bytes(&self, address: u64, data: &[u8]) -> Result<()> {
        self.handle
            .put_address(address as usize, data)
            .with_context(|| format!("Failed to write {} bytes at {:#x}", data.len(), address))?;
        Ok(())
    }
}
