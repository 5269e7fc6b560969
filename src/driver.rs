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

//! Activation and shutdown of the Aspire 4736 backlight.
//!
//! [`Acer4736Backlight::init`] either returns an active driver or an error
//! with nothing left behind. An active driver owns its registration;
//! [`Acer4736Backlight::shutdown`] consumes it.

use serde_json::json;
use tracing::{info, warn};

use crate::backlight::{BacklightHandle, BacklightProperties, BacklightRegistry, BacklightType};
use crate::constants::{hw, names};
use crate::controller::LbbBacklight;
use crate::dmi::{self, DmiField, DmiMatch, DmiSource, DmiSystemId};
use crate::error::{BacklightError, Result};
use crate::logger;
use crate::pci::{PciBus, PciId};

/// Machines this driver supports.
pub static ACER_DEVICE_TABLE: &[DmiSystemId] = &[DmiSystemId {
    ident: "Aspire 4736",
    matches: &[
        DmiMatch::contains(DmiField::SysVendor, "Acer"),
        DmiMatch::contains(DmiField::ProductName, "Aspire 4736"),
    ],
}];

/// The device holding the LBB register.
pub const LBB_DEVICE: PciId = PciId::new(hw::VENDOR_ID, hw::DEVICE_ID);

/// Platform gate only; touches no hardware.
pub fn match_platform(source: &dyn DmiSource) -> Option<&'static DmiSystemId> {
    dmi::check_system(ACER_DEVICE_TABLE, source)
}

/// An active backlight, registered under [`names::BACKLIGHT_NAME`].
#[derive(Debug)]
pub struct Acer4736Backlight {
    handle: BacklightHandle,
    ident: &'static str,
}

impl Acer4736Backlight {
    pub fn init<B>(
        dmi_source: &dyn DmiSource,
        bus: &B,
        registry: &mut BacklightRegistry,
    ) -> Result<Self>
    where
        B: PciBus,
        B::Device: 'static,
    {
        let platform = match_platform(dmi_source)
            .ok_or_else(|| BacklightError::no_such_device("platform is not an Acer Aspire 4736"))?;

        let device = bus
            .get_device(LBB_DEVICE)?
            .ok_or_else(|| BacklightError::no_such_device(format!("no PCI device {}", LBB_DEVICE)))?;

        info!("Loading Acer 4736 backlight driver");

        let props = BacklightProperties::new(BacklightType::Raw, u32::from(hw::MAX_BRIGHTNESS));
        let handle = registry.register(
            names::BACKLIGHT_NAME,
            Box::new(LbbBacklight::new(device)),
            props,
        )?;

        let driver = Self { handle, ident: platform.ident };
        if let Err(e) = driver.sync_initial_brightness(registry) {
            warn!("{}: initial brightness sync failed: {}", names::DRIVER_NAME, e);
            if let Err(teardown_err) = driver.teardown(registry) {
                warn!("{}: teardown after failed sync: {}", names::DRIVER_NAME, teardown_err);
            }
            return Err(e);
        }

        logger::log_event(
            "driver_load",
            json!({
                "ident": driver.ident,
                "name": names::BACKLIGHT_NAME,
                "brightness": registry.get_brightness(names::BACKLIGHT_NAME)?,
            }),
        );
        Ok(driver)
    }

    // Report what the register holds right now, then push it back out
    // through the normal update path.
    fn sync_initial_brightness(&self, registry: &mut BacklightRegistry) -> Result<()> {
        let current = registry.actual_brightness(self.handle.name())?;
        registry.properties_mut(&self.handle)?.brightness = current;
        registry.update_status(&self.handle)
    }

    pub fn name(&self) -> &str {
        self.handle.name()
    }

    /// DMI ident of the matched machine
    pub fn ident(&self) -> &'static str {
        self.ident
    }

    /// Brightness read back from the register.
    pub fn brightness(&self, registry: &BacklightRegistry) -> Result<u8> {
        let v = registry.actual_brightness(self.handle.name())?;
        u8::try_from(v).map_err(|_| BacklightError::parse(format!("register value {} out of range", v)))
    }

    pub fn set_brightness(&self, registry: &mut BacklightRegistry, value: u32) -> Result<()> {
        registry.set_brightness(self.handle.name(), value)
    }

    /// Release the device, then unregister.
    pub fn shutdown(self, registry: &mut BacklightRegistry) -> Result<()> {
        self.teardown(registry)?;
        info!("Unloading Acer 4736 backlight driver");
        logger::log_event("driver_unload", json!({ "name": names::BACKLIGHT_NAME }));
        Ok(())
    }

    fn teardown(self, registry: &mut BacklightRegistry) -> Result<()> {
        registry.release(&self.handle)?;
        registry.unregister(self.handle)
    }
}
