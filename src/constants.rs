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

//! Constants for the Aspire 4736 backlight.
//!
//! Everything that has to match the hardware lives in [`hw`]. Changing any of
//! these breaks interoperability with the machine.

/// Hardware contract for the LBB (legacy backlight brightness) register.
pub mod hw {
    /// Intel
    pub const VENDOR_ID: u16 = 0x8086;

    /// GM45 integrated graphics controller
    pub const DEVICE_ID: u16 = 0x2a42;

    /// LBB offset in PCI configuration space
    pub const LBB_OFFSET: u8 = 0xF4;

    /// Largest value the LBB register accepts
    pub const MAX_BRIGHTNESS: u8 = 0xFF;
}

/// Names the driver uses when talking to the registry and in log lines.
pub mod names {
    /// Name registered with the backlight registry
    pub const BACKLIGHT_NAME: &str = "acer_backlight";

    /// Prefix for log messages
    pub const DRIVER_NAME: &str = "acer4736_bl";
}

/// Filesystem locations
pub mod paths {
    /// Default sysfs mount point
    pub const SYSFS_ROOT: &str = "/sys";

    /// DMI identity files, relative to the sysfs root
    pub const DMI_ID_DIR: &str = "class/dmi/id";

    /// PCI device directories, relative to the sysfs root
    pub const PCI_DEVICES_DIR: &str = "bus/pci/devices";

    /// System-wide configuration file
    pub const CONFIG_FILE: &str = "/etc/acer4736-bl/config.json";

    /// Environment variable that overrides the configuration file path
    pub const CONFIG_ENV: &str = "ACER4736_BL_CONFIG";

    /// Default JSON event log
    pub const EVENT_LOG: &str = "/var/log/acer4736-bl/events.json";

    /// Used when the default event log cannot be opened
    pub const EVENT_LOG_FALLBACK: &str = "/tmp/acer4736_bl_events.json";
}

/// Unprivileged readers only see this many bytes of a device's `config` file.
pub const UNPRIVILEGED_CONFIG_BYTES: u64 = 64;

/// Size of the conventional PCI configuration space
pub const PCI_CONFIG_SPACE_SIZE: u64 = 256;
