//! Executable and vDSO pages located through the auxiliary vector.
//!
//! Only a partial map: shared libraries are not covered.

use super::{map_objects, SourceKind, Strategy};
use crate::auxv;
use crate::config::Config;
use crate::page::{sort_by_start, Page};
use crate::prober::Prober;
use crate::source::Target;

#[derive(Debug, Default)]
pub struct AuxvDerived {
    /// Leave out the executable's own pages
    pub skip_exe: bool,
}

impl AuxvDerived {
    pub fn skipping_exe() -> Self {
        AuxvDerived { skip_exe: true }
    }
}

impl Strategy for AuxvDerived {
    fn kind(&self) -> SourceKind {
        SourceKind::AuxvDerived
    }

    fn collect(&self, target: &Target, config: &Config) -> anyhow::Result<Vec<Page>> {
        let info = auxv::fetch(target, config);
        if info.is_empty() {
            return Ok(Vec::new());
        }

        let exe_name = info
            .string("AT_EXECFN")
            .unwrap_or(config.placeholder_exe_name.as_str())
            .to_string();
        let entry = info.int("AT_ENTRY");
        let vdso = info.int("AT_SYSINFO_EHDR");
        let phdr = info.int("AT_PHDR");

        let mut pages = Vec::new();

        if !self.skip_exe && (entry != 0 || phdr != 0) {
            let address = if entry != 0 { entry } else { phdr };
            pages.extend(map_objects(target, &[(address, exe_name)]));
        }

        if vdso != 0 {
            let prober = Prober::new(target.memory.as_ref(), config);
            pages.push(prober.find_boundaries(vdso, "[vdso]"));
        }

        sort_by_start(&mut pages);
        Ok(pages)
    }
}
