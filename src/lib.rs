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

//! acer4736-bl - backlight control for the Acer Aspire 4736
//!
//! The panel brightness of this machine lives in one byte (LBB, offset 0xF4)
//! of the integrated graphics controller's PCI configuration space. This
//! library detects the machine from its DMI strings, finds the graphics
//! device through sysfs and registers a raw 0-255 backlight with a registry
//! that forwards reads and writes to that byte.

pub mod constants;
pub mod error;
pub mod logger;
pub mod config;
pub mod dmi;
pub mod pci;
pub mod backlight;
pub mod controller;
pub mod driver;

pub use error::{BacklightError, Result};

#[cfg(test)]
pub mod test_utils;
