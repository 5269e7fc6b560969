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

//! Platform identification through the DMI (SMBIOS) strings the firmware
//! reports, as exported under `/sys/class/dmi/id`.

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::json;
use tracing::{debug, info};

use crate::constants::names;
use crate::logger;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DmiField {
    SysVendor,
    ProductName,
    ProductVersion,
    BoardVendor,
    BoardName,
    BiosVendor,
}

impl DmiField {
    pub const ALL: [DmiField; 6] = [
        DmiField::SysVendor,
        DmiField::ProductName,
        DmiField::ProductVersion,
        DmiField::BoardVendor,
        DmiField::BoardName,
        DmiField::BiosVendor,
    ];

    /// File name under /sys/class/dmi/id
    pub fn file_name(self) -> &'static str {
        match self {
            DmiField::SysVendor => "sys_vendor",
            DmiField::ProductName => "product_name",
            DmiField::ProductVersion => "product_version",
            DmiField::BoardVendor => "board_vendor",
            DmiField::BoardName => "board_name",
            DmiField::BiosVendor => "bios_vendor",
        }
    }
}

/// One condition of a table entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DmiMatch {
    pub field: DmiField,
    pub pattern: &'static str,
    /// Whole-string comparison instead of substring search
    pub exact: bool,
}

impl DmiMatch {
    pub const fn contains(field: DmiField, pattern: &'static str) -> Self {
        Self { field, pattern, exact: false }
    }

    pub const fn exact(field: DmiField, pattern: &'static str) -> Self {
        Self { field, pattern, exact: true }
    }

    fn matches(&self, value: &str) -> bool {
        if self.exact {
            value == self.pattern
        } else {
            value.contains(self.pattern)
        }
    }
}

/// A machine the driver supports. All `matches` must hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DmiSystemId {
    pub ident: &'static str,
    pub matches: &'static [DmiMatch],
}

impl DmiSystemId {
    pub fn matches_system(&self, source: &dyn DmiSource) -> bool {
        if self.matches.is_empty() {
            return false;
        }
        self.matches.iter().all(|m| {
            source
                .field(m.field)
                .map(|value| m.matches(&value))
                .unwrap_or(false)
        })
    }
}

#[cfg_attr(test, mockall::automock)]
pub trait DmiSource {
    /// Field value with surrounding whitespace removed, or None if unreadable.
    fn field(&self, field: DmiField) -> Option<String>;
}

/// Reads DMI strings from a `class/dmi/id` directory.
#[derive(Debug, Clone)]
pub struct SysfsDmi {
    dir: PathBuf,
}

impl SysfsDmi {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl DmiSource for SysfsDmi {
    fn field(&self, field: DmiField) -> Option<String> {
        let path = self.dir.join(field.file_name());
        match fs::read_to_string(&path) {
            Ok(s) => Some(s.trim().to_string()),
            Err(e) => {
                debug!("Cannot read {}: {}", path.display(), e);
                None
            }
        }
    }
}

/// Return the first entry of `table` that matches the running system.
pub fn check_system<'a>(
    table: &'a [DmiSystemId],
    source: &dyn DmiSource,
) -> Option<&'a DmiSystemId> {
    let found = table.iter().find(|id| id.matches_system(source))?;
    info!("{}: {} detected", names::DRIVER_NAME, found.ident);
    logger::log_event("dmi_match", json!({ "ident": found.ident }));
    Some(found)
}
