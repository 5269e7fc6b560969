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

//! Brightness controller backed by the LBB byte in PCI configuration space.
//!
//! The register is the only state: every read goes to the hardware and no
//! value is cached here.

use serde_json::json;
use tracing::{debug, warn};

use crate::backlight::{BacklightOps, BacklightProperties};
use crate::constants::{hw, names};
use crate::error::{BacklightError, Result};
use crate::logger;
use crate::pci::ConfigSpace;

pub struct LbbBacklight<C: ConfigSpace> {
    device: Option<C>,
}

impl<C: ConfigSpace> LbbBacklight<C> {
    pub fn new(device: C) -> Self {
        Self { device: Some(device) }
    }

    /// False once the device handle has been released.
    pub fn is_active(&self) -> bool {
        self.device.is_some()
    }

    fn device(&self) -> Result<&C> {
        self.device.as_ref().ok_or(BacklightError::DeviceReleased)
    }

    pub fn read_brightness(&self) -> Result<u8> {
        self.device()?.read_config_byte(hw::LBB_OFFSET)
    }

    /// Write `requested` to the register. Values above the maximum are
    /// rejected, never clamped.
    pub fn update_brightness(&self, requested: u32) -> Result<()> {
        let max = u32::from(hw::MAX_BRIGHTNESS);
        if requested > max {
            warn!(
                "{}: Invalid parameter. Maximum value is {}",
                names::DRIVER_NAME,
                max
            );
            logger::log_event(
                "invalid_brightness",
                json!({ "requested": requested, "max": max }),
            );
            return Err(BacklightError::InvalidBrightness { value: requested, max });
        }
        let intensity = requested as u8;

        self.device()?.write_config_byte(hw::LBB_OFFSET, intensity)?;
        debug!("LBB <- {}", intensity);
        logger::log_event("brightness_write", json!({ "value": intensity }));
        Ok(())
    }

    /// Hand back the device handle. Later reads and writes fail with
    /// `DeviceReleased`.
    pub fn release_device(&mut self) -> Option<C> {
        let dev = self.device.take();
        if dev.is_some() {
            debug!("{}: device handle released", names::DRIVER_NAME);
            logger::log_event("device_release", json!({}));
        }
        dev
    }
}

impl<C: ConfigSpace> BacklightOps for LbbBacklight<C> {
    fn get_brightness(&self) -> Result<u32> {
        self.read_brightness().map(u32::from)
    }

    fn update_status(&self, props: &BacklightProperties) -> Result<()> {
        self.update_brightness(props.brightness)
    }

    fn release(&mut self) {
        drop(self.release_device());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backlight::BacklightType;
    use crate::pci::MockConfigSpace;
    use crate::test_utils::test_utils::FakeConfigSpace;
    use mockall::predicate::eq;

    #[test]
    fn test_every_valid_value_reads_back() {
        let space = FakeConfigSpace::new();
        let ctl = LbbBacklight::new(space.clone());
        for v in 0..=255u32 {
            ctl.update_brightness(v).unwrap();
            assert_eq!(u32::from(ctl.read_brightness().unwrap()), v);
        }
        assert_eq!(space.peek(hw::LBB_OFFSET), 255);
    }

    #[test]
    fn test_out_of_range_rejected_without_write() {
        let space = FakeConfigSpace::with_byte(hw::LBB_OFFSET, 77);
        let ctl = LbbBacklight::new(space.clone());
        for v in [256u32, 300, 1000, u32::MAX] {
            match ctl.update_brightness(v) {
                Err(BacklightError::InvalidBrightness { value, max }) => {
                    assert_eq!(value, v);
                    assert_eq!(max, 255);
                }
                other => panic!("expected InvalidBrightness, got {:?}", other),
            }
            assert_eq!(space.peek(hw::LBB_OFFSET), 77);
        }
    }

    #[test]
    fn test_repeated_write_is_idempotent() {
        let once = FakeConfigSpace::new();
        let twice = FakeConfigSpace::new();
        LbbBacklight::new(once.clone()).update_brightness(90).unwrap();
        let ctl = LbbBacklight::new(twice.clone());
        ctl.update_brightness(90).unwrap();
        ctl.update_brightness(90).unwrap();
        assert_eq!(once.peek(hw::LBB_OFFSET), twice.peek(hw::LBB_OFFSET));
        assert_eq!(ctl.read_brightness().unwrap(), 90);
    }

    #[test]
    fn test_only_lbb_offset_is_touched() {
        let mut mock = MockConfigSpace::new();
        mock.expect_write_config_byte()
            .with(eq(0xF4u8), eq(12u8))
            .times(1)
            .returning(|_, _| Ok(()));
        mock.expect_read_config_byte()
            .with(eq(0xF4u8))
            .times(1)
            .returning(|_| Ok(12));

        let ctl = LbbBacklight::new(mock);
        ctl.update_brightness(12).unwrap();
        assert_eq!(ctl.read_brightness().unwrap(), 12);
    }

    #[test]
    fn test_invalid_value_never_reaches_hardware() {
        let mut mock = MockConfigSpace::new();
        mock.expect_write_config_byte().never();
        let ctl = LbbBacklight::new(mock);
        assert!(ctl.update_brightness(256).is_err());
    }

    #[test]
    fn test_io_errors_are_not_values() {
        let mut mock = MockConfigSpace::new();
        mock.expect_read_config_byte().returning(|offset| {
            Err(BacklightError::ConfigRead {
                address: "0000:00:02.0".into(),
                offset,
                reason: "bus error".into(),
            })
        });
        mock.expect_write_config_byte().returning(|offset, _| {
            Err(BacklightError::ConfigWrite {
                address: "0000:00:02.0".into(),
                offset,
                reason: "device removed".into(),
            })
        });

        let ctl = LbbBacklight::new(mock);
        assert!(matches!(ctl.read_brightness(), Err(BacklightError::ConfigRead { .. })));
        assert!(matches!(ctl.update_brightness(1), Err(BacklightError::ConfigWrite { .. })));
    }

    #[test]
    fn test_released_device_rejects_io() {
        let space = FakeConfigSpace::with_byte(hw::LBB_OFFSET, 3);
        let mut ctl = LbbBacklight::new(space.clone());
        assert!(ctl.is_active());

        assert!(ctl.release_device().is_some());
        assert!(!ctl.is_active());
        assert!(ctl.release_device().is_none());

        assert!(matches!(ctl.read_brightness(), Err(BacklightError::DeviceReleased)));
        assert!(matches!(ctl.update_brightness(4), Err(BacklightError::DeviceReleased)));
        assert_eq!(space.peek(hw::LBB_OFFSET), 3);
    }

    #[test]
    fn test_ops_forward_to_register() {
        let space = FakeConfigSpace::with_byte(hw::LBB_OFFSET, 128);
        let mut ctl = LbbBacklight::new(space.clone());
        assert_eq!(ctl.get_brightness().unwrap(), 128);

        let mut props = BacklightProperties::new(BacklightType::Raw, 255);
        props.brightness = 64;
        ctl.update_status(&props).unwrap();
        assert_eq!(space.peek(hw::LBB_OFFSET), 64);

        ctl.release();
        assert!(ctl.get_brightness().is_err());
    }
}
