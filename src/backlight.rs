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

//! Backlight registry.
//!
//! Controllers register a [`BacklightOps`] implementation under a unique
//! name and get a [`BacklightHandle`] back. The registry keeps the
//! user-visible properties and forwards reads and writes to the controller,
//! mirroring the attributes of `/sys/class/backlight/<name>/`.
//!
//! Every mutating call takes `&mut self`. Callers that share a registry
//! between threads must serialize access themselves (e.g. with a `Mutex`).

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde_json::json;
use tracing::{debug, warn};

use crate::error::{BacklightError, Result};
use crate::logger;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BacklightType {
    /// Direct hardware register control
    Raw,
    Platform,
    Firmware,
}

impl BacklightType {
    pub fn as_str(self) -> &'static str {
        match self {
            BacklightType::Raw => "raw",
            BacklightType::Platform => "platform",
            BacklightType::Firmware => "firmware",
        }
    }
}

impl fmt::Display for BacklightType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BacklightType {
    type Err = BacklightError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "raw" => Ok(BacklightType::Raw),
            "platform" => Ok(BacklightType::Platform),
            "firmware" => Ok(BacklightType::Firmware),
            other => Err(BacklightError::parse(format!("unknown backlight type {:?}", other))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BacklightProperties {
    /// Last requested brightness
    pub brightness: u32,
    pub max_brightness: u32,
    pub kind: BacklightType,
}

impl BacklightProperties {
    pub fn new(kind: BacklightType, max_brightness: u32) -> Self {
        Self { brightness: 0, max_brightness, kind }
    }
}

/// What a controller provides to the registry.
pub trait BacklightOps {
    /// Brightness as the hardware currently reports it.
    fn get_brightness(&self) -> Result<u32>;

    /// Push `props.brightness` to the hardware.
    fn update_status(&self, props: &BacklightProperties) -> Result<()>;

    /// Give up hardware resources. Called once, before unregistering.
    fn release(&mut self) {}
}

/// Proof of registration. Not `Clone`: whoever holds it owns the registration.
#[derive(Debug, PartialEq, Eq)]
pub struct BacklightHandle {
    name: String,
    id: u64,
}

impl BacklightHandle {
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Attributes exposed per backlight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Attribute {
    Brightness,
    ActualBrightness,
    MaxBrightness,
    Type,
}

impl Attribute {
    pub const ALL: [Attribute; 4] = [
        Attribute::Brightness,
        Attribute::ActualBrightness,
        Attribute::MaxBrightness,
        Attribute::Type,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Attribute::Brightness => "brightness",
            Attribute::ActualBrightness => "actual_brightness",
            Attribute::MaxBrightness => "max_brightness",
            Attribute::Type => "type",
        }
    }

    pub fn writable(self) -> bool {
        matches!(self, Attribute::Brightness)
    }
}

impl FromStr for Attribute {
    type Err = BacklightError;

    fn from_str(s: &str) -> Result<Self> {
        Attribute::ALL
            .iter()
            .copied()
            .find(|a| a.as_str() == s)
            .ok_or_else(|| BacklightError::UnknownAttribute(s.to_string()))
    }
}

struct BacklightDevice {
    id: u64,
    props: BacklightProperties,
    ops: Box<dyn BacklightOps>,
}

#[derive(Default)]
pub struct BacklightRegistry {
    devices: BTreeMap<String, BacklightDevice>,
    next_id: u64,
}

impl fmt::Debug for BacklightRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BacklightRegistry")
            .field("names", &self.names())
            .finish()
    }
}

impl BacklightRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(
        &mut self,
        name: &str,
        ops: Box<dyn BacklightOps>,
        props: BacklightProperties,
    ) -> Result<BacklightHandle> {
        if name.is_empty() || name.contains('/') {
            return Err(BacklightError::InvalidArgument(format!("bad backlight name {:?}", name)));
        }
        if self.devices.contains_key(name) {
            return Err(BacklightError::AlreadyRegistered(name.to_string()));
        }
        let id = self.next_id;
        self.next_id += 1;
        self.devices.insert(name.to_string(), BacklightDevice { id, props, ops });
        debug!("Registered backlight {} (id {})", name, id);
        Ok(BacklightHandle { name: name.to_string(), id })
    }

    pub fn unregister(&mut self, handle: BacklightHandle) -> Result<()> {
        self.device_for(&handle)?;
        self.devices.remove(&handle.name);
        debug!("Unregistered backlight {}", handle.name);
        Ok(())
    }

    pub fn is_registered(&self, name: &str) -> bool {
        self.devices.contains_key(name)
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<String> {
        self.devices.keys().cloned().collect()
    }

    pub fn properties(&self, name: &str) -> Result<&BacklightProperties> {
        Ok(&self.device(name)?.props)
    }

    /// Mutable properties for the owner of `handle`. Nothing reaches the
    /// hardware until [`update_status`](Self::update_status).
    pub fn properties_mut(&mut self, handle: &BacklightHandle) -> Result<&mut BacklightProperties> {
        Ok(&mut self.device_for_mut(handle)?.props)
    }

    /// Push the current properties to the controller.
    pub fn update_status(&mut self, handle: &BacklightHandle) -> Result<()> {
        let dev = self.device_for(handle)?;
        dev.ops.update_status(&dev.props)
    }

    /// Ask the controller to drop its hardware resources.
    pub fn release(&mut self, handle: &BacklightHandle) -> Result<()> {
        self.device_for_mut(handle)?.ops.release();
        Ok(())
    }

    /// Cached brightness, as last requested.
    pub fn get_brightness(&self, name: &str) -> Result<u32> {
        Ok(self.device(name)?.props.brightness)
    }

    /// Brightness re-read from the hardware.
    pub fn actual_brightness(&self, name: &str) -> Result<u32> {
        self.device(name)?.ops.get_brightness()
    }

    /// Request a new brightness. Values above the maximum are rejected
    /// before the controller sees them. The cached value is rolled back if
    /// the controller fails.
    pub fn set_brightness(&mut self, name: &str, value: u32) -> Result<()> {
        let dev = self.device_mut(name)?;
        let max = dev.props.max_brightness;
        if value > max {
            warn!("{}: Invalid parameter. Maximum value is {}", name, max);
            logger::log_event(
                "invalid_brightness",
                json!({ "name": name, "requested": value, "max": max }),
            );
            return Err(BacklightError::InvalidBrightness { value, max });
        }
        let previous = dev.props.brightness;
        dev.props.brightness = value;
        if let Err(e) = dev.ops.update_status(&dev.props) {
            dev.props.brightness = previous;
            return Err(e);
        }
        Ok(())
    }

    /// Attribute value as text, like reading the sysfs file (no newline).
    pub fn show(&self, name: &str, attr: &str) -> Result<String> {
        let attr: Attribute = attr.parse()?;
        let dev = self.device(name)?;
        Ok(match attr {
            Attribute::Brightness => dev.props.brightness.to_string(),
            Attribute::ActualBrightness => dev.ops.get_brightness()?.to_string(),
            Attribute::MaxBrightness => dev.props.max_brightness.to_string(),
            Attribute::Type => dev.props.kind.to_string(),
        })
    }

    /// Write an attribute from text, like writing the sysfs file.
    pub fn store(&mut self, name: &str, attr: &str, text: &str) -> Result<()> {
        let attr: Attribute = attr.parse()?;
        self.device(name)?;
        if !attr.writable() {
            return Err(BacklightError::ReadOnlyAttribute(attr.as_str().to_string()));
        }
        let value: u32 = text
            .trim()
            .parse()
            .map_err(|_| BacklightError::InvalidArgument(format!("not a number: {:?}", text.trim())))?;
        self.set_brightness(name, value)
    }

    fn device(&self, name: &str) -> Result<&BacklightDevice> {
        self.devices
            .get(name)
            .ok_or_else(|| BacklightError::NotRegistered(name.to_string()))
    }

    fn device_mut(&mut self, name: &str) -> Result<&mut BacklightDevice> {
        self.devices
            .get_mut(name)
            .ok_or_else(|| BacklightError::NotRegistered(name.to_string()))
    }

    // A handle from an earlier registration under the same name is stale.
    fn device_for(&self, handle: &BacklightHandle) -> Result<&BacklightDevice> {
        match self.devices.get(&handle.name) {
            Some(dev) if dev.id == handle.id => Ok(dev),
            _ => Err(BacklightError::NotRegistered(handle.name.clone())),
        }
    }

    fn device_for_mut(&mut self, handle: &BacklightHandle) -> Result<&mut BacklightDevice> {
        match self.devices.get_mut(&handle.name) {
            Some(dev) if dev.id == handle.id => Ok(dev),
            _ => Err(BacklightError::NotRegistered(handle.name.clone())),
        }
    }
}
