//! ASLR detection.

use crate::config::Config;
use crate::source::Target;

/// Whether address randomization is in effect for the inspected process
///
/// Randomization is off when the system toggle reads `0`. Otherwise it is on
/// unless the debugger launched the process with randomization disabled.
#[derive(Debug, Default)]
pub struct AslrDetector {
    aslr: bool,
    checked: bool,
}

impl AslrDetector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Re-evaluate from scratch and store the result
    pub fn check(&mut self, target: &Target, config: &Config) -> bool {
        self.aslr = false;
        self.checked = true;

        let data = match target.fs.read(&config.aslr_toggle_path) {
            Ok(data) => data,
            Err(e) => {
                tracing::debug!("Cannot read {}: {:#}", config.aslr_toggle_path, e);
                Vec::new()
            }
        };

        if data.contains(&b'0') {
            tracing::debug!("Randomization disabled system-wide");
            return false;
        }

        let command = &config.commands.disable_randomization;
        let output = match target.debugger.execute(command) {
            Ok(output) => output,
            Err(e) => {
                tracing::warn!("'{}' failed: {:#}", command, e);
                return false;
            }
        };

        // "Disabling randomization of debuggee's virtual address space is off."
        if output.contains("is off.") {
            self.aslr = true;
        }

        self.aslr
    }

    /// Stored result, checking first if nothing was checked yet
    pub fn enabled(&mut self, target: &Target, config: &Config) -> bool {
        if !self.checked {
            return self.check(target, config);
        }
        self.aslr
    }

    pub fn is_checked(&self) -> bool {
        self.checked
    }

    /// Forget everything about the current process instance
    pub fn reset(&mut self) {
        self.aslr = false;
        self.checked = false;
    }
}
