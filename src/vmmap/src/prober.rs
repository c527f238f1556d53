//! Boundary probing.
//!
//! Recovers the extent and permissions of a mapping nobody reported by
//! touching target memory one page at a time. A failed probe only means the
//! page is unmapped.

use crate::config::Config;
use crate::page::{page_align, Page, PageFlags};
use crate::source::TargetMemory;

pub struct Prober<'a> {
    memory: &'a dyn TargetMemory,
    page_size: u64,
    max_pages: u64,
}

impl<'a> Prober<'a> {
    pub fn new(memory: &'a dyn TargetMemory, config: &Config) -> Self {
        Prober {
            memory,
            page_size: config.page_size,
            max_pages: config.max_probe_pages,
        }
    }

    /// Whether one byte at `address` can be read
    pub fn peek(&self, address: u64) -> bool {
        let ok = self.memory.read_bytes(address, 1).is_ok();
        tracing::trace!("peek {:#x}: {}", address, ok);
        ok
    }

    /// Whether one byte at `address` can be written, by writing back what is there
    pub fn poke(&self, address: u64) -> bool {
        let ok = match self.memory.read_bytes(address, 1) {
            Ok(byte) => self.memory.write_bytes(address, &byte).is_ok(),
            Err(_) => false,
        };
        tracing::trace!("poke {:#x}: {}", address, ok);
        ok
    }

    /// Start of the lowest page still mapped contiguously below `address`
    pub fn find_lower_boundary(&self, address: u64) -> u64 {
        let mut start = page_align(address, self.page_size);

        for _ in 0..self.max_pages {
            let Some(below) = start.checked_sub(self.page_size) else {
                break;
            };
            if !self.peek(below) {
                break;
            }
            start = below;
        }

        start
    }

    /// End (exclusive) of the contiguous mapping holding `address`
    pub fn find_upper_boundary(&self, address: u64) -> u64 {
        let mut end = page_align(address, self.page_size);

        for _ in 0..self.max_pages {
            if !self.peek(end) {
                break;
            }
            match end.checked_add(self.page_size) {
                Some(next) => end = next,
                None => break,
            }
        }

        end
    }

    /// Readable page covering the contiguous mapping around `address`
    pub fn find_boundaries(&self, address: u64, name: &str) -> Page {
        let start = self.find_lower_boundary(address);
        let end = self.find_upper_boundary(address);
        Page::new(start, end - start, PageFlags::READ, 0, name)
    }

    /// Probe the mapping around `address`, `None` if it cannot be read
    ///
    /// Execute permission cannot be probed safely; it is taken to follow the
    /// stack's NX setting.
    pub fn probe(&self, address: u64, stack_nx: bool) -> Option<Page> {
        let address = page_align(address, self.page_size);

        if !self.peek(address) {
            tracing::debug!("{:#x} is not mapped", address);
            return None;
        }

        let mut flags = PageFlags::READ;
        if self.poke(address) {
            flags |= PageFlags::WRITE;
        }
        if !stack_nx {
            flags |= PageFlags::EXECUTE;
        }

        let mut page = self.find_boundaries(address, "");
        page.flags = flags;
        tracing::debug!("Explored {:#x}-{:#x} {}", page.start, page.end(), page.permstr());
        Some(page)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::mock::MockMemory;

    fn config() -> Config {
        Config::default()
    }

    #[test]
    fn test_boundaries_of_contiguous_range() {
        let memory = MockMemory::default().with_range(0x10000, 0x14000, false);
        let config = config();
        let prober = Prober::new(&memory, &config);

        assert_eq!(prober.find_lower_boundary(0x12345), 0x10000);
        assert_eq!(prober.find_upper_boundary(0x12345), 0x14000);
    }

    #[test]
    fn test_adjacent_ranges_merge() {
        // Two touching mappings are indistinguishable by probing
        let memory = MockMemory::default()
            .with_range(0x10000, 0x12000, false)
            .with_range(0x12000, 0x13000, true);
        let config = config();
        let page = Prober::new(&memory, &config).find_boundaries(0x10000, "x");

        assert_eq!((page.start, page.end()), (0x10000, 0x13000));
        assert_eq!(page.flags, PageFlags::READ);
        assert_eq!(page.objfile, "x");
    }

    #[test]
    fn test_boundary_search_is_capped() {
        let memory = MockMemory::default().with_range(0x100000, 0x200000, false);
        let mut config = config();
        config.max_probe_pages = 4;
        let prober = Prober::new(&memory, &config);

        assert_eq!(prober.find_lower_boundary(0x150000), 0x14c000);
        assert_eq!(prober.find_upper_boundary(0x150000), 0x154000);
    }

    #[test]
    fn test_lower_boundary_at_zero() {
        let memory = MockMemory::default().with_range(0, 0x2000, false);
        let config = config();
        assert_eq!(Prober::new(&memory, &config).find_lower_boundary(0x1800), 0);
    }

    #[test]
    fn test_probe_flags() {
        let memory = MockMemory::default()
            .with_range(0x10000, 0x11000, false)
            .with_range(0x20000, 0x22000, true);
        let config = config();
        let prober = Prober::new(&memory, &config);

        let ro = prober.probe(0x10010, true).unwrap();
        assert_eq!(ro.flags, PageFlags::READ);
        assert_eq!((ro.start, ro.size), (0x10000, 0x1000));
        assert!(ro.is_anonymous());

        let rwx = prober.probe(0x21fff, false).unwrap();
        assert_eq!(rwx.flags, PageFlags::all());
        assert_eq!((rwx.start, rwx.end()), (0x20000, 0x22000));
    }

    #[test]
    fn test_probe_unmapped() {
        let memory = MockMemory::default();
        let config = config();
        assert!(Prober::new(&memory, &config).probe(0x10000, true).is_none());
        assert_eq!(memory.reads(), 1);
    }
}
