//! The debugger's shared library report.

use super::{map_objects, SourceKind, Strategy};
use crate::config::Config;
use crate::page::{sort_by_start, Page};
use crate::report::{parse_hex, Parsed};
use crate::source::Target;

pub struct SharedLibraryInfo;

impl Strategy for SharedLibraryInfo {
    fn kind(&self) -> SourceKind {
        SourceKind::SharedLibraryInfo
    }

    fn collect(&self, target: &Target, config: &Config) -> anyhow::Result<Vec<Page>> {
        let report = target.debugger.execute(&config.commands.shared_libraries)?;
        let libraries = parse_sharedlibrary(&report).log_warnings("info sharedlibrary");

        let mut pages = map_objects(target, &libraries);
        sort_by_start(&mut pages);
        Ok(pages)
    }
}

/// (address inside the library, library path) for every loaded library
///
/// ```text
/// From                To                  Syms Read   Shared Object Library
/// 0x00007ffff7ddaae0  0x00007ffff7df54e0  Yes         /lib64/ld-linux-x86-64.so.2
/// (*): Shared library is missing debugging information.
/// ```
pub fn parse_sharedlibrary(text: &str) -> Parsed<Vec<(u64, String)>> {
    let mut parsed = Parsed::new(Vec::new());

    for (idx, raw) in text.lines().enumerate() {
        let line = raw.trim();
        if !line.starts_with("0x") {
            continue;
        }

        let tokens: Vec<&str> = line.split_whitespace().collect();
        if tokens.len() < 2 {
            parsed.warn(idx + 1, line, "no library path");
            continue;
        }

        match parse_hex(tokens[0]) {
            Some(address) => parsed.value.push((address, tokens[tokens.len() - 1].to_string())),
            None => parsed.warn(idx + 1, line, "bad address"),
        }
    }

    parsed
}
