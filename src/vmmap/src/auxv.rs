//! Auxiliary vector.
//!
//! Startup information the OS loader hands a process, recovered either from
//! the debugger's `info auxv` report or from the raw `/proc/pid/auxv` file.

use crate::config::{expand_pid, Config};
use crate::report::{parse_hex, Parsed};
use crate::source::{Target, TargetMemory};

use byteorder::{ByteOrder, NativeEndian};
use std::collections::BTreeMap;

/// Longest string read when resolving a string-valued entry
const MAX_STRING_LEN: usize = 4096;

/// Well-known `AT_*` keys and their numeric tags
const AT_NAMES: &[(u64, &str)] = &[
    (0, "AT_NULL"),
    (3, "AT_PHDR"),
    (4, "AT_PHENT"),
    (5, "AT_PHNUM"),
    (6, "AT_PAGESZ"),
    (7, "AT_BASE"),
    (8, "AT_FLAGS"),
    (9, "AT_ENTRY"),
    (11, "AT_UID"),
    (12, "AT_EUID"),
    (13, "AT_GID"),
    (14, "AT_EGID"),
    (15, "AT_PLATFORM"),
    (16, "AT_HWCAP"),
    (17, "AT_CLKTCK"),
    (23, "AT_SECURE"),
    (24, "AT_BASE_PLATFORM"),
    (25, "AT_RANDOM"),
    (26, "AT_HWCAP2"),
    (31, "AT_EXECFN"),
    (32, "AT_SYSINFO"),
    (33, "AT_SYSINFO_EHDR"),
    (51, "AT_MINSIGSTKSZ"),
];

/// Entries whose raw value is a pointer to a NUL-terminated string
const STRING_KEYS: &[&str] = &["AT_EXECFN", "AT_PLATFORM", "AT_BASE_PLATFORM"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuxvValue {
    Int(u64),
    Str(String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuxvInfo {
    entries: BTreeMap<String, AuxvValue>,
}

impl AuxvInfo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: AuxvValue) {
        self.entries.insert(key.into(), value);
    }

    pub fn get(&self, key: &str) -> Option<&AuxvValue> {
        self.entries.get(key)
    }

    /// Integer value of `key`, 0 when absent or string-valued
    pub fn int(&self, key: &str) -> u64 {
        match self.entries.get(key) {
            Some(AuxvValue::Int(v)) => *v,
            _ => 0,
        }
    }

    pub fn string(&self, key: &str) -> Option<&str> {
        match self.entries.get(key) {
            Some(AuxvValue::Str(s)) if !s.is_empty() => Some(s),
            _ => None,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Replace pointer-valued string entries with the strings they point to
    pub fn resolve_strings(&mut self, memory: &dyn TargetMemory) {
        for key in STRING_KEYS {
            let Some(AuxvValue::Int(ptr)) = self.entries.get(*key) else {
                continue;
            };
            let ptr = *ptr;
            match memory.read_cstring(ptr, MAX_STRING_LEN) {
                Ok(s) => {
                    self.entries.insert(key.to_string(), AuxvValue::Str(s));
                }
                Err(e) => tracing::debug!("Cannot resolve {} at {:#x}: {}", key, ptr, e),
            }
        }
    }
}

fn name_of(tag: u64) -> String {
    AT_NAMES
        .iter()
        .find(|(t, _)| *t == tag)
        .map(|(_, n)| n.to_string())
        .unwrap_or_else(|| format!("AT_UNKNOWN_{}", tag))
}

/// Parse the debugger's `info auxv` report
///
/// ```text
/// 33   AT_SYSINFO_EHDR      System-supplied DSO's ELF header 0x7ffff7fc1000
/// 9    AT_ENTRY             Entry point of program         0x555555556040
/// 31   AT_EXECFN            File name of executable        0x7fffffffefc4 "/usr/bin/ls"
/// ```
pub fn parse_info_auxv(text: &str) -> Parsed<AuxvInfo> {
    let mut parsed = Parsed::new(AuxvInfo::new());

    for (idx, raw) in text.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }

        let tokens: Vec<&str> = line.split_whitespace().collect();
        let Some(name) = tokens.iter().find(|t| t.starts_with("AT_")) else {
            parsed.warn(idx + 1, line, "no AT_ key");
            continue;
        };

        if line.ends_with('"') {
            // A lone trailing quote leaves no string, so `get` yields None
            let quoted = line
                .find('"')
                .and_then(|open| line.get(open + 1..line.len() - 1));
            if let Some(value) = quoted {
                parsed.value.insert(*name, AuxvValue::Str(value.to_string()));
                continue;
            }
        }

        let Some(last) = tokens.last() else {
            continue;
        };
        let value = if last.starts_with("0x") {
            parse_hex(last)
        } else {
            last.parse::<u64>().ok()
        };

        match value {
            Some(v) => parsed.value.insert(*name, AuxvValue::Int(v)),
            None => parsed.warn(idx + 1, line, format!("bad value for {}", name)),
        }
    }

    parsed
}

/// Parse a raw auxiliary vector: native-endian (tag, value) u64 pairs up to `AT_NULL`
pub fn parse_raw_auxv(data: &[u8]) -> AuxvInfo {
    let mut info = AuxvInfo::new();

    for pair in data.chunks_exact(16) {
        let tag = NativeEndian::read_u64(&pair[..8]);
        let value = NativeEndian::read_u64(&pair[8..]);
        if tag == 0 {
            break;
        }
        info.insert(name_of(tag), AuxvValue::Int(value));
    }

    info
}

/// Best available auxiliary vector, empty if no source answers
pub fn fetch(target: &Target, config: &Config) -> AuxvInfo {
    match target.debugger.execute(&config.commands.auxv) {
        Ok(text) => {
            let info = parse_info_auxv(&text).log_warnings("auxv");
            if !info.is_empty() {
                return info;
            }
        }
        Err(e) => tracing::debug!("'{}' failed: {}", config.commands.auxv, e),
    }

    let Some(pid) = target.debugger.pid() else {
        return AuxvInfo::new();
    };

    let path = expand_pid(&config.auxv_path, pid);
    match target.fs.read(&path) {
        Ok(data) => {
            let mut info = parse_raw_auxv(&data);
            info.resolve_strings(target.memory.as_ref());
            info
        }
        Err(e) => {
            tracing::debug!("Cannot read {}: {}", path, e);
            AuxvInfo::new()
        }
    }
}
