//! The process-maps pseudo-file, the authoritative source when readable.

use super::{SourceKind, Strategy};
use crate::config::Config;
use crate::page::{Page, PageFlags};
use crate::report::{parse_hex, splitn_whitespace};
use crate::source::Target;
use crate::{Error, Result};

pub struct ProcMaps;

impl Strategy for ProcMaps {
    fn kind(&self) -> SourceKind {
        SourceKind::ProcMaps
    }

    fn collect(&self, target: &Target, config: &Config) -> anyhow::Result<Vec<Page>> {
        let Some(pid) = target.debugger.pid() else {
            return Err(Error::Unavailable("no running process".to_string()).into());
        };

        for path in config.maps_paths_for(pid) {
            match target.fs.read(&path) {
                Ok(data) => {
                    tracing::debug!("Reading mappings from {}", path);
                    return Ok(parse_maps(&String::from_utf8_lossy(&data))?);
                }
                Err(e) => tracing::debug!("Cannot read {}: {}", path, e),
            }
        }

        Ok(Vec::new())
    }
}

/// Parse `/proc/pid/maps` text
///
/// ```text
/// 7f95266fa000-7f95268b5000 r-xp 00000000 08:01 418404   /lib/x86_64-linux-gnu/libc-2.19.so
/// 7f9526abb000-7f9526ac0000 rw-p 00000000 00:00 0
/// ```
///
/// Any malformed line fails the whole parse.
pub fn parse_maps(text: &str) -> Result<Vec<Page>> {
    let mut pages = Vec::new();

    for (idx, line) in text.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }

        let bad = |reason: &str| Error::Parse {
            line: idx + 1,
            reason: format!("{} in {:?}", reason, line),
        };

        // range perm offset dev [inode [path]]
        let fields = splitn_whitespace(line, 6);
        if fields.len() < 4 {
            return Err(bad("too few fields"));
        }

        let (start, stop) = fields[0]
            .split_once('-')
            .ok_or_else(|| bad("address range without '-'"))?;
        let start = parse_hex(start).ok_or_else(|| bad("bad start address"))?;
        let stop = parse_hex(stop).ok_or_else(|| bad("bad end address"))?;
        if stop < start {
            return Err(bad("range ends before it starts"));
        }

        let offset = parse_hex(fields[2]).ok_or_else(|| bad("bad offset"))?;
        let objfile = fields.get(5).copied().unwrap_or("");

        pages.push(Page::new(
            start,
            stop - start,
            PageFlags::from_perms(fields[1]),
            offset,
            objfile,
        ));
    }

    Ok(pages)
}
