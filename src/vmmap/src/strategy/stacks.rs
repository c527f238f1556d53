//! Stack regions reported by the register/stack provider.

use super::{SourceKind, Strategy};
use crate::config::Config;
use crate::page::Page;
use crate::source::Target;

pub struct Stacks;

impl Strategy for Stacks {
    fn kind(&self) -> SourceKind {
        SourceKind::Stacks
    }

    fn collect(&self, target: &Target, _config: &Config) -> anyhow::Result<Vec<Page>> {
        target.regs.stacks()
    }
}
