//! Mock Collaborators
//!
//! In-memory stand-ins for every collaborator, with call counters so tests can
//! assert which sources were consulted.

use super::{DebuggerCommands, ObjfileMapper, RegisterStackProvider, Target, TargetFs, TargetMemory};
use crate::page::Page;

use anyhow::{anyhow, bail, Result};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Filesystem backed by a path -> contents table
#[derive(Default)]
pub struct MockFs {
    pub files: HashMap<String, Vec<u8>>,
    pub reads: AtomicUsize,
}

impl MockFs {
    pub fn with_file(mut self, path: &str, contents: &[u8]) -> Self {
        self.files.insert(path.to_string(), contents.to_vec());
        self
    }

    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }
}

impl TargetFs for MockFs {
    fn read(&self, path: &str) -> Result<Vec<u8>> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.files
            .get(path)
            .cloned()
            .ok_or_else(|| anyhow!("No such file: {}", path))
    }
}

/// Sparse address space made of readable (and optionally writable) ranges
#[derive(Default)]
pub struct MockMemory {
    /// (start, end, writable)
    pub ranges: Vec<(u64, u64, bool)>,
    /// Non-zero bytes; everything else mapped reads as 0
    pub bytes: HashMap<u64, u8>,
    pub reads: AtomicUsize,
    pub writes: AtomicUsize,
}

impl MockMemory {
    pub fn with_range(mut self, start: u64, end: u64, writable: bool) -> Self {
        self.ranges.push((start, end, writable));
        self
    }

    pub fn with_bytes(mut self, address: u64, data: &[u8]) -> Self {
        for (i, b) in data.iter().enumerate() {
            self.bytes.insert(address + i as u64, *b);
        }
        self
    }

    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    fn covered(&self, address: u64, size: usize, need_write: bool) -> bool {
        (address..address + size as u64).all(|a| {
            self.ranges
                .iter()
                .any(|&(s, e, w)| s <= a && a < e && (w || !need_write))
        })
    }
}

impl TargetMemory for MockMemory {
    fn read_bytes(&self, address: u64, size: usize) -> Result<Vec<u8>> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        if !self.covered(address, size, false) {
            bail!("Cannot access memory at {:#x}", address);
        }
        Ok((0..size as u64)
            .map(|i| self.bytes.get(&(address + i)).copied().unwrap_or(0))
            .collect())
    }

    fn write_bytes(&self, address: u64, data: &[u8]) -> Result<()> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        if !self.covered(address, data.len(), true) {
            bail!("Cannot write memory at {:#x}", address);
        }
        Ok(())
    }
}

/// Debugger answering commands from a canned table
#[derive(Default)]
pub struct MockDebugger {
    pub outputs: HashMap<String, String>,
    pub pid: Option<u32>,
    pub calls: Mutex<Vec<String>>,
}

impl MockDebugger {
    pub fn with_pid(mut self, pid: u32) -> Self {
        self.pid = Some(pid);
        self
    }

    pub fn with_output(mut self, command: &str, output: &str) -> Self {
        self.outputs.insert(command.to_string(), output.to_string());
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self, command: &str) -> usize {
        self.calls().iter().filter(|c| c.as_str() == command).count()
    }
}

impl DebuggerCommands for MockDebugger {
    fn execute(&self, command: &str) -> Result<String> {
        self.calls.lock().unwrap().push(command.to_string());
        self.outputs
            .get(command)
            .cloned()
            .ok_or_else(|| anyhow!("Undefined command: \"{}\"", command))
    }

    fn pid(&self) -> Option<u32> {
        self.pid
    }
}

/// Object-file mapper returning fixed pages per object name
#[derive(Default)]
pub struct MockMapper {
    pub objects: HashMap<String, Vec<Page>>,
    pub calls: Mutex<Vec<(u64, String)>>,
}

impl MockMapper {
    pub fn with_object(mut self, name: &str, pages: Vec<Page>) -> Self {
        self.objects.insert(name.to_string(), pages);
        self
    }

    pub fn calls(&self) -> Vec<(u64, String)> {
        self.calls.lock().unwrap().clone()
    }
}

impl ObjfileMapper for MockMapper {
    fn map(&self, address: u64, name: &str) -> Result<Vec<Page>> {
        self.calls.lock().unwrap().push((address, name.to_string()));
        self.objects
            .get(name)
            .cloned()
            .ok_or_else(|| anyhow!("Cannot map {} at {:#x}", name, address))
    }
}

/// Register/stack provider with fixed state
#[derive(Default)]
pub struct MockRegs {
    pub registers: Vec<(String, u64)>,
    pub stacks: Vec<Page>,
    pub nx: bool,
    pub stack_calls: AtomicUsize,
}

impl MockRegs {
    pub fn with_register(mut self, name: &str, value: u64) -> Self {
        self.registers.push((name.to_string(), value));
        self
    }

    pub fn with_stack(mut self, page: Page) -> Self {
        self.stacks.push(page);
        self
    }

    pub fn with_nx(mut self, nx: bool) -> Self {
        self.nx = nx;
        self
    }
}

impl RegisterStackProvider for MockRegs {
    fn registers(&self) -> Result<Vec<(String, u64)>> {
        Ok(self.registers.clone())
    }

    fn stacks(&self) -> Result<Vec<Page>> {
        self.stack_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.stacks.clone())
    }

    fn stack_nx(&self) -> bool {
        self.nx
    }
}

/// Handles to every mock so tests can inspect them after building a `Target`
#[derive(Clone)]
pub struct MockTarget {
    pub fs: Arc<MockFs>,
    pub memory: Arc<MockMemory>,
    pub debugger: Arc<MockDebugger>,
    pub mapper: Arc<MockMapper>,
    pub regs: Arc<MockRegs>,
}

impl MockTarget {
    pub fn new(
        fs: MockFs,
        memory: MockMemory,
        debugger: MockDebugger,
        mapper: MockMapper,
        regs: MockRegs,
    ) -> Self {
        MockTarget {
            fs: Arc::new(fs),
            memory: Arc::new(memory),
            debugger: Arc::new(debugger),
            mapper: Arc::new(mapper),
            regs: Arc::new(regs),
        }
    }

    pub fn target(&self) -> Target {
        Target::new(
            self.fs.clone(),
            self.memory.clone(),
            self.debugger.clone(),
            self.mapper.clone(),
            self.regs.clone(),
        )
    }
}

impl Default for MockTarget {
    fn default() -> Self {
        MockTarget::new(
            MockFs::default(),
            MockMemory::default(),
            MockDebugger::default(),
            MockMapper::default(),
            MockRegs::default(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page::PageFlags;

    #[test]
    fn test_mock_memory_ranges() {
        let memory = MockMemory::default().with_range(0x1000, 0x3000, false);
        assert!(memory.read_bytes(0x1000, 1).is_ok());
        assert!(memory.read_bytes(0x2fff, 1).is_ok());
        assert!(memory.read_bytes(0x2fff, 2).is_err());
        assert!(memory.write_bytes(0x1000, &[0]).is_err());
        assert_eq!(memory.reads(), 3);
    }

    #[test]
    fn test_mock_memory_read_cstring_stops_at_page_end() {
        let memory = MockMemory::default()
            .with_range(0x1000, 0x2000, false)
            .with_bytes(0x1ffa, b"bash");
        // Only 6 bytes remain before the unmapped page; the NUL is the last one
        assert_eq!(memory.read_cstring(0x1ffa, 256).unwrap(), "bash");
    }

    #[test]
    fn test_mock_debugger_records_calls() {
        let debugger = MockDebugger::default().with_output("info files", "");
        assert!(debugger.execute("info files").is_ok());
        assert!(debugger.execute("info auxv").is_err());
        assert_eq!(debugger.call_count("info files"), 1);
        assert_eq!(debugger.calls().len(), 2);
    }

    #[test]
    fn test_mock_mapper_records_calls() {
        let page = Page::new(0x400000, 0x1000, PageFlags::READ, 0, "/bin/ls");
        let mapper = MockMapper::default().with_object("/bin/ls", vec![page.clone()]);
        assert_eq!(mapper.map(0x400100, "/bin/ls").unwrap(), vec![page]);
        assert!(mapper.map(0x1, "/missing").is_err());
        assert_eq!(mapper.calls()[0], (0x400100, "/bin/ls".to_string()));
    }
}
