//! Collaborator Traits
//!
//! The services the map reconstruction consumes but does not implement.

use crate::page::{Page, PAGE_SIZE};
use anyhow::Result;
use byteorder::{ByteOrder, NativeEndian};

/// Read-only access to files on the machine hosting the inspected process
pub trait TargetFs: Send + Sync {
    /// Read a whole file
    fn read(&self, path: &str) -> Result<Vec<u8>>;
}

/// Byte-level access to the inspected process's memory
pub trait TargetMemory: Send + Sync {
    /// Read bytes from a virtual address
    fn read_bytes(&self, address: u64, size: usize) -> Result<Vec<u8>>;

    /// Write bytes to a virtual address
    fn write_bytes(&self, address: u64, data: &[u8]) -> Result<()>;

    /// Read a target-endian u64
    fn read_u64(&self, address: u64) -> Result<u64> {
        let bytes = self.read_bytes(address, 8)?;
        Ok(NativeEndian::read_u64(&bytes))
    }

    /// Read a null-terminated string, never reading past `max_len` bytes
    ///
    /// Reads page by page so a string ending just before an unmapped page is
    /// still recovered.
    fn read_cstring(&self, address: u64, max_len: usize) -> Result<String> {
        let mut bytes = Vec::new();
        let mut cursor = address;

        while bytes.len() < max_len {
            let to_page_end = (PAGE_SIZE - cursor % PAGE_SIZE) as usize;
            let chunk = self.read_bytes(cursor, to_page_end.min(max_len - bytes.len()))?;
            if chunk.is_empty() {
                break;
            }
            if let Some(end) = chunk.iter().position(|&b| b == 0) {
                bytes.extend_from_slice(&chunk[..end]);
                return Ok(String::from_utf8_lossy(&bytes).to_string());
            }
            cursor += chunk.len() as u64;
            bytes.extend_from_slice(&chunk);
        }

        Ok(String::from_utf8_lossy(&bytes).to_string())
    }
}

/// Textual command channel into the debugger
pub trait DebuggerCommands: Send + Sync {
    /// Run a command and capture its output
    fn execute(&self, command: &str) -> Result<String>;

    /// PID of the inspected process, if one is running
    fn pid(&self) -> Option<u32>;
}

/// Reconstructs every page of one backing object from an address inside it
pub trait ObjfileMapper: Send + Sync {
    fn map(&self, address: u64, name: &str) -> Result<Vec<Page>>;
}

/// Current register values and known stack regions
pub trait RegisterStackProvider: Send + Sync {
    /// General purpose registers as (name, value)
    fn registers(&self) -> Result<Vec<(String, u64)>>;

    /// Stack regions discovered for every thread
    fn stacks(&self) -> Result<Vec<Page>>;

    /// Whether the stack is mapped non-executable
    fn stack_nx(&self) -> bool;
}
