//! Configuration management for vmmap

use crate::page::{MMAP_MIN_ADDR, PAGE_SIZE};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Debugger commands whose reports feed the fallback sources
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Commands {
    pub shared_libraries: String,
    pub files: String,
    pub auxv: String,
    pub disable_randomization: String,
}

impl Default for Commands {
    fn default() -> Self {
        Commands {
            shared_libraries: "info sharedlibrary".to_string(),
            files: "info files".to_string(),
            auxv: "info auxv".to_string(),
            disable_randomization: "show disable-randomization".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Candidate map files, tried in order; `{pid}` is substituted
    pub maps_paths: Vec<String>,
    /// Raw auxiliary vector file; `{pid}` is substituted
    pub auxv_path: String,
    pub aslr_toggle_path: String,
    pub page_size: u64,
    /// Addresses below this are never looked up
    pub mmap_min_addr: u64,
    /// Page limit for each direction of a boundary search
    pub max_probe_pages: u64,
    /// Executable name used when the auxiliary vector carries none
    pub placeholder_exe_name: String,
    pub commands: Commands,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            maps_paths: vec![
                "/proc/{pid}/maps".to_string(),
                "/proc/{pid}/map".to_string(),
                "/usr/compat/linux/proc/{pid}/maps".to_string(),
            ],
            auxv_path: "/proc/{pid}/auxv".to_string(),
            aslr_toggle_path: "/proc/sys/kernel/randomize_va_space".to_string(),
            page_size: PAGE_SIZE,
            mmap_min_addr: MMAP_MIN_ADDR,
            max_probe_pages: 1024,
            placeholder_exe_name: "main.exe".to_string(),
            commands: Commands::default(),
        }
    }
}

/// Substitute `{pid}` in a path template
pub fn expand_pid(template: &str, pid: u32) -> String {
    template.replace("{pid}", &pid.to_string())
}

impl Config {
    /// Get the path to the config file
    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Could not determine config directory")?
            .join("vmmap");

        Ok(config_dir.join("config.toml"))
    }

    /// Load configuration from the default location, or defaults if it doesn't exist
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    /// Load configuration from a specific file, or defaults if it doesn't exist
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Config::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {}", path.display()))?;

        let config: Config = toml::from_str(&contents).context("Failed to parse config file")?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a specific file
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory at {}", parent.display())
            })?;
        }

        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;

        fs::write(path, contents)
            .with_context(|| format!("Failed to write config to {}", path.display()))?;

        Ok(())
    }

    /// Save configuration to the default location
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    fn validate(&self) -> Result<()> {
        if !self.page_size.is_power_of_two() {
            anyhow::bail!("page_size must be a power of two, got {:#x}", self.page_size);
        }
        Ok(())
    }

    /// Candidate map-file paths for a process
    pub fn maps_paths_for(&self, pid: u32) -> Vec<String> {
        self.maps_paths.iter().map(|t| expand_pid(t, pid)).collect()
    }
}
