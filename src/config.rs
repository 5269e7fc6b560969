/*
 * This file is part of acer4736-bl.
 *
 * Copyright (C) 2025 acer4736-bl contributors
 *
 * acer4736-bl is free software: you can redistribute it and/or modify
 * it under the terms of the GNU General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * acer4736-bl is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
 * GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License
 * along with acer4736-bl. If not, see <https://www.gnu.org/licenses/>.
 */

use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::constants::paths;
use crate::error::{BacklightError, Result};

const LOG_LEVELS: &[&str] = &["error", "warn", "info", "debug", "trace"];

fn default_sysfs_root() -> PathBuf { PathBuf::from(paths::SYSFS_ROOT) }

fn default_log_level() -> String { "info".to_string() }

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DriverConfig {
    /// Where sysfs is mounted. DMI and PCI lookups are resolved below it.
    #[serde(default = "default_sysfs_root")]
    pub sysfs_root: PathBuf,
    /// Override for the JSON event log location
    #[serde(default)]
    pub log_path: Option<PathBuf>,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            sysfs_root: default_sysfs_root(),
            log_path: None,
            log_level: default_log_level(),
        }
    }
}

impl DriverConfig {
    pub fn dmi_dir(&self) -> PathBuf {
        self.sysfs_root.join(paths::DMI_ID_DIR)
    }

    pub fn pci_devices_dir(&self) -> PathBuf {
        self.sysfs_root.join(paths::PCI_DEVICES_DIR)
    }
}

/// Resolve the config file: explicit path, then `$ACER4736_BL_CONFIG`, then /etc.
pub fn config_path(explicit: Option<&Path>) -> PathBuf {
    if let Some(p) = explicit {
        return p.to_path_buf();
    }
    if let Ok(p) = env::var(paths::CONFIG_ENV) {
        if !p.trim().is_empty() {
            return PathBuf::from(p);
        }
    }
    PathBuf::from(paths::CONFIG_FILE)
}

/// Load and validate a config file. A missing file yields the defaults.
pub fn load_config(path: &Path) -> Result<DriverConfig> {
    let data = match fs::read_to_string(path) {
        Ok(d) => d,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(DriverConfig::default()),
        Err(e) => return Err(e.into()),
    };
    let cfg: DriverConfig = serde_json::from_str(&data)?;
    validate_config(&cfg)?;
    Ok(cfg)
}

pub fn validate_config(cfg: &DriverConfig) -> Result<()> {
    if !cfg.sysfs_root.is_absolute() {
        return Err(BacklightError::config(format!(
            "sysfs_root must be absolute: {}",
            cfg.sysfs_root.display()
        )));
    }
    if let Some(p) = &cfg.log_path {
        if p.as_os_str().is_empty() {
            return Err(BacklightError::config("log_path must not be empty"));
        }
    }
    if !LOG_LEVELS.contains(&cfg.log_level.as_str()) {
        return Err(BacklightError::config(format!(
            "log_level must be one of {:?}, got {}",
            LOG_LEVELS, cfg.log_level
        )));
    }
    Ok(())
}
