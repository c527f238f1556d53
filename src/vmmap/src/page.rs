//! Memory Page Types
//!
//! The value type describing one contiguous mapping in the inspected process.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Default page granularity used for alignment and probing
pub const PAGE_SIZE: u64 = 0x1000;

/// Lowest address the kernel lets a process map by default
pub const MMAP_MIN_ADDR: u64 = 0x8000;

bitflags::bitflags! {
    /// Access permissions of a mapping, numbered like `PROT_*` reversed (r=4, w=2, x=1)
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
    pub struct PageFlags: u8 {
        const EXECUTE = 0b001;
        const WRITE = 0b010;
        const READ = 0b100;
    }
}

impl PageFlags {
    /// Build flags from a permission string such as `r-xp`
    ///
    /// Each of `r`, `w` and `x` sets its bit independently of position; the
    /// sharing indicator is ignored.
    pub fn from_perms(perms: &str) -> Self {
        let mut flags = PageFlags::empty();
        if perms.contains('r') {
            flags |= PageFlags::READ;
        }
        if perms.contains('w') {
            flags |= PageFlags::WRITE;
        }
        if perms.contains('x') {
            flags |= PageFlags::EXECUTE;
        }
        flags
    }
}

/// Round an address down to the start of its page
pub fn page_align(address: u64, page_size: u64) -> u64 {
    address & !(page_size - 1)
}

/// One contiguous mapped range of virtual memory
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Page {
    pub start: u64,
    pub size: u64,
    pub flags: PageFlags,
    /// Offset into the backing object, 0 when anonymous
    pub offset: u64,
    /// Backing object path, empty for anonymous mappings
    pub objfile: String,
}

impl Page {
    pub fn new(
        start: u64,
        size: u64,
        flags: PageFlags,
        offset: u64,
        objfile: impl Into<String>,
    ) -> Self {
        Page {
            start,
            size,
            flags,
            offset,
            objfile: objfile.into(),
        }
    }

    pub fn end(&self) -> u64 {
        self.start.saturating_add(self.size)
    }

    /// True iff `start <= address < end`
    pub fn contains(&self, address: u64) -> bool {
        self.start <= address && address < self.end()
    }

    pub fn is_readable(&self) -> bool {
        self.flags.contains(PageFlags::READ)
    }

    pub fn is_writable(&self) -> bool {
        self.flags.contains(PageFlags::WRITE)
    }

    pub fn is_executable(&self) -> bool {
        self.flags.contains(PageFlags::EXECUTE)
    }

    pub fn is_anonymous(&self) -> bool {
        self.objfile.is_empty()
    }

    /// Permissions in `/proc/pid/maps` notation, always private (`p`)
    pub fn permstr(&self) -> String {
        let mut s = String::with_capacity(4);
        s.push(if self.is_readable() { 'r' } else { '-' });
        s.push(if self.is_writable() { 'w' } else { '-' });
        s.push(if self.is_executable() { 'x' } else { '-' });
        s.push('p');
        s
    }
}

impl PartialOrd for Page {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Page {
    fn cmp(&self, other: &Self) -> Ordering {
        self.start
            .cmp(&other.start)
            .then(self.size.cmp(&other.size))
            .then(self.flags.cmp(&other.flags))
            .then(self.offset.cmp(&other.offset))
            .then_with(|| self.objfile.cmp(&other.objfile))
    }
}

impl fmt::Display for Page {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:#18x} {:#18x} {} {:>8x} {:<6x} {}",
            self.start,
            self.end(),
            self.permstr(),
            self.size,
            self.offset,
            self.objfile
        )
    }
}

/// Stable sort by start address; pages sharing a start keep their input order
pub fn sort_by_start(pages: &mut [Page]) {
    pages.sort_by_key(|p| p.start);
}
