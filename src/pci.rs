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

//! PCI device lookup and configuration-space access through sysfs.
//!
//! Devices live under `/sys/bus/pci/devices/<DDDD:BB:DD.F>/`, each with
//! `vendor` and `device` id files and a binary `config` file that maps the
//! configuration space byte for byte.

use std::fmt;
use std::fs::{self, OpenOptions};
use std::io;
use std::os::unix::fs::FileExt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde_json::json;
use tracing::{debug, trace};

use crate::constants::UNPRIVILEGED_CONFIG_BYTES;
use crate::error::{BacklightError, Result};
use crate::logger;

/// Bus address in `domain:bus:device.function` form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PciAddress {
    pub domain: u16,
    pub bus: u8,
    pub device: u8,
    pub function: u8,
}

impl fmt::Display for PciAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:04x}:{:02x}:{:02x}.{:x}",
            self.domain, self.bus, self.device, self.function
        )
    }
}

impl FromStr for PciAddress {
    type Err = BacklightError;

    fn from_str(s: &str) -> Result<Self> {
        let bad = || BacklightError::parse(format!("invalid PCI address: {:?}", s));

        let (domain, rest) = s.split_once(':').ok_or_else(bad)?;
        let (bus, rest) = rest.split_once(':').ok_or_else(bad)?;
        let (device, function) = rest.split_once('.').ok_or_else(bad)?;
        if domain.len() != 4 || bus.len() != 2 || device.len() != 2 || function.len() != 1 {
            return Err(bad());
        }

        let addr = PciAddress {
            domain: u16::from_str_radix(domain, 16).map_err(|_| bad())?,
            bus: u8::from_str_radix(bus, 16).map_err(|_| bad())?,
            device: u8::from_str_radix(device, 16).map_err(|_| bad())?,
            function: u8::from_str_radix(function, 16).map_err(|_| bad())?,
        };
        if addr.device > 0x1f || addr.function > 7 {
            return Err(bad());
        }
        Ok(addr)
    }
}

/// Vendor/device id pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PciId {
    pub vendor: u16,
    pub device: u16,
}

impl PciId {
    pub const fn new(vendor: u16, device: u16) -> Self {
        Self { vendor, device }
    }
}

impl fmt::Display for PciId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04x}:{:04x}", self.vendor, self.device)
    }
}

/// Parse a sysfs id file value such as `0x8086`.
pub fn parse_id(raw: &str) -> Result<u16> {
    let t = raw.trim();
    let hex = t
        .strip_prefix("0x")
        .or_else(|| t.strip_prefix("0X"))
        .unwrap_or(t);
    u16::from_str_radix(hex, 16).map_err(|_| BacklightError::parse(format!("invalid PCI id: {:?}", t)))
}

/// Single-byte access to a device's configuration space.
#[cfg_attr(test, mockall::automock)]
pub trait ConfigSpace {
    fn read_config_byte(&self, offset: u8) -> Result<u8>;
    fn write_config_byte(&self, offset: u8, value: u8) -> Result<()>;
}

/// Device lookup by id.
pub trait PciBus {
    type Device: ConfigSpace;

    /// First device with `id`, in ascending address order.
    fn get_device(&self, id: PciId) -> Result<Option<Self::Device>>;
}

/// A PCI device found through sysfs. Config space is opened per access.
#[derive(Debug, Clone)]
pub struct PciDevice {
    address: PciAddress,
    id: PciId,
    dir: PathBuf,
}

impl PciDevice {
    /// Open a device directory, reading its ids.
    pub fn open(dir: &Path) -> Result<Self> {
        let name = dir
            .file_name()
            .and_then(|s| s.to_str())
            .ok_or_else(|| BacklightError::parse(format!("bad device dir {}", dir.display())))?;
        let address: PciAddress = name.parse()?;
        let vendor = parse_id(&fs::read_to_string(dir.join("vendor"))?)?;
        let device = parse_id(&fs::read_to_string(dir.join("device"))?)?;
        Ok(Self {
            address,
            id: PciId::new(vendor, device),
            dir: dir.to_path_buf(),
        })
    }

    pub fn address(&self) -> PciAddress {
        self.address
    }

    pub fn id(&self) -> PciId {
        self.id
    }

    pub fn config_path(&self) -> PathBuf {
        self.dir.join("config")
    }

    fn read_err(&self, offset: u8, reason: impl Into<String>) -> BacklightError {
        BacklightError::ConfigRead {
            address: self.address.to_string(),
            offset,
            reason: reason.into(),
        }
    }

    fn write_err(&self, offset: u8, reason: impl Into<String>) -> BacklightError {
        BacklightError::ConfigWrite {
            address: self.address.to_string(),
            offset,
            reason: reason.into(),
        }
    }
}

impl ConfigSpace for PciDevice {
    fn read_config_byte(&self, offset: u8) -> Result<u8> {
        let file = OpenOptions::new()
            .read(true)
            .open(self.config_path())
            .map_err(|e| self.read_err(offset, e.to_string()))?;
        let mut buf = [0u8; 1];
        let n = file
            .read_at(&mut buf, u64::from(offset))
            .map_err(|e| self.read_err(offset, e.to_string()))?;
        if n != 1 {
            let reason = if u64::from(offset) >= UNPRIVILEGED_CONFIG_BYTES {
                "short read (bytes past 0x3f need root)"
            } else {
                "short read"
            };
            return Err(self.read_err(offset, reason));
        }
        trace!("config read {} @0x{:02x} = {}", self.address, offset, buf[0]);
        Ok(buf[0])
    }

    fn write_config_byte(&self, offset: u8, value: u8) -> Result<()> {
        let file = OpenOptions::new()
            .write(true)
            .open(self.config_path())
            .map_err(|e| self.write_err(offset, e.to_string()))?;
        let n = file
            .write_at(&[value], u64::from(offset))
            .map_err(|e| self.write_err(offset, e.to_string()))?;
        if n != 1 {
            return Err(self.write_err(offset, "short write"));
        }
        trace!("config write {} @0x{:02x} = {}", self.address, offset, value);
        Ok(())
    }
}

/// Scans a `bus/pci/devices` directory.
#[derive(Debug, Clone)]
pub struct SysfsPci {
    devices_dir: PathBuf,
}

impl SysfsPci {
    pub fn new(devices_dir: impl Into<PathBuf>) -> Self {
        Self { devices_dir: devices_dir.into() }
    }

    /// Every readable device, sorted by address. Malformed entries are skipped.
    pub fn devices(&self) -> Result<Vec<PciDevice>> {
        let entries = match fs::read_dir(&self.devices_dir) {
            Ok(e) => e,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!("{} does not exist", self.devices_dir.display());
                return Ok(Vec::new());
            }
            Err(e) => return Err(e.into()),
        };

        let mut out = Vec::new();
        for ent in entries.flatten() {
            match PciDevice::open(&ent.path()) {
                Ok(dev) => out.push(dev),
                Err(e) => debug!("Skipping {}: {}", ent.path().display(), e),
            }
        }
        out.sort_by_key(|d| d.address);
        Ok(out)
    }
}

impl PciBus for SysfsPci {
    type Device = PciDevice;

    fn get_device(&self, id: PciId) -> Result<Option<PciDevice>> {
        let found = self.devices()?.into_iter().find(|d| d.id == id);
        if let Some(dev) = &found {
            logger::log_event(
                "pci_device",
                json!({ "address": dev.address.to_string(), "id": id.to_string() }),
            );
        }
        Ok(found)
    }
}
