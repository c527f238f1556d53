//! The debugger's loaded files/sections report.

use super::{map_objects, SourceKind, Strategy};
use crate::config::Config;
use crate::page::Page;
use crate::report::{parse_hex, splitn_whitespace, Parsed};
use crate::source::Target;

use std::collections::HashSet;

/// Fields in a `start - stop is section` line
const SECTION_FIELDS: usize = 5;
/// Fields in a `start - stop is section in file` line
const SECTION_IN_FILE_FIELDS: usize = 7;

pub struct FileInfo;

impl Strategy for FileInfo {
    fn kind(&self) -> SourceKind {
        SourceKind::FileInfo
    }

    fn collect(&self, target: &Target, config: &Config) -> anyhow::Result<Vec<Page>> {
        let report = target.debugger.execute(&config.commands.files)?;
        let objects = parse_info_files(&report).log_warnings("info files");
        Ok(map_objects(target, &objects))
    }
}

/// One (section address, object name) per distinct object, in report order
///
/// ```text
/// `/bin/bash', file type elf64-x86-64.
/// 0x0000000000400238 - 0x0000000000400254 is .interp
/// 0x00007ffff7dda1c8 - 0x00007ffff7dda1ec is .note.gnu.build-id in /lib64/ld-linux-x86-64.so.2
/// ```
///
/// Sections without a trailing filename belong to the main executable named
/// by the most recent quoted line.
pub fn parse_info_files(text: &str) -> Parsed<Vec<(u64, String)>> {
    let mut parsed = Parsed::new(Vec::new());
    let mut seen = HashSet::new();
    let mut main_exe = String::new();

    for (idx, raw) in text.lines().enumerate() {
        let line = raw.trim();

        if line.starts_with('`') || line.starts_with('\'') || line.starts_with('"') {
            let name = line.split_whitespace().next().unwrap_or("");
            main_exe = name.trim_matches(|c: char| matches!(c, '`' | '\'' | '"' | ',')).to_string();
            continue;
        }

        if !line.starts_with("0x") {
            continue;
        }

        let fields = splitn_whitespace(line, SECTION_IN_FILE_FIELDS);
        let Some(address) = parse_hex(fields[0]) else {
            parsed.warn(idx + 1, line, "bad address");
            continue;
        };

        let objfile = match fields.len() {
            SECTION_FIELDS if main_exe.is_empty() => {
                parsed.warn(idx + 1, line, "section before any executable was named");
                continue;
            }
            SECTION_FIELDS => main_exe.clone(),
            SECTION_IN_FILE_FIELDS => fields[SECTION_IN_FILE_FIELDS - 1].to_string(),
            n => {
                parsed.warn(idx + 1, line, format!("unexpected field count {}", n));
                continue;
            }
        };

        if seen.insert(objfile.clone()) {
            parsed.value.push((address, objfile));
        }
    }

    parsed
}
