/*
 * Test utilities and fakes for acer4736-bl
 *
 * Helpers for building throwaway sysfs trees and an in-memory
 * configuration space, shared by the unit test modules.
 */

#[cfg(test)]
pub mod test_utils {
    use crate::error::{BacklightError, Result};
    use crate::pci::{ConfigSpace, PciBus, PciId};
    use std::cell::{Cell, RefCell};
    use std::fs;
    use std::path::Path;
    use std::rc::Rc;
    use tempfile::TempDir;

    /// Config space backed by a shared 256-byte buffer. Clones share storage,
    /// so a test can keep one clone and inspect what the controller wrote.
    #[derive(Debug, Clone)]
    pub struct FakeConfigSpace {
        bytes: Rc<RefCell<[u8; 256]>>,
    }

    impl FakeConfigSpace {
        pub fn new() -> Self {
            Self { bytes: Rc::new(RefCell::new([0u8; 256])) }
        }

        pub fn with_byte(offset: u8, value: u8) -> Self {
            let fake = Self::new();
            fake.poke(offset, value);
            fake
        }

        pub fn peek(&self, offset: u8) -> u8 {
            self.bytes.borrow()[offset as usize]
        }

        pub fn poke(&self, offset: u8, value: u8) {
            self.bytes.borrow_mut()[offset as usize] = value;
        }
    }

    impl ConfigSpace for FakeConfigSpace {
        fn read_config_byte(&self, offset: u8) -> Result<u8> {
            Ok(self.peek(offset))
        }

        fn write_config_byte(&self, offset: u8, value: u8) -> Result<()> {
            self.poke(offset, value);
            Ok(())
        }
    }

    /// Bus holding at most one device, with a counter of lookups.
    pub struct FakePciBus {
        pub device: Option<(PciId, FakeConfigSpace)>,
        pub lookups: Cell<u32>,
    }

    impl FakePciBus {
        pub fn with_device(id: PciId, space: FakeConfigSpace) -> Self {
            Self { device: Some((id, space)), lookups: Cell::new(0) }
        }

        pub fn empty() -> Self {
            Self { device: None, lookups: Cell::new(0) }
        }
    }

    impl PciBus for FakePciBus {
        type Device = FakeConfigSpace;

        fn get_device(&self, id: PciId) -> Result<Option<FakeConfigSpace>> {
            self.lookups.set(self.lookups.get() + 1);
            Ok(self
                .device
                .as_ref()
                .filter(|(dev_id, _)| *dev_id == id)
                .map(|(_, space)| space.clone()))
        }
    }

    /// Bus whose scan always fails.
    pub struct BrokenPciBus;

    impl PciBus for BrokenPciBus {
        type Device = FakeConfigSpace;

        fn get_device(&self, _id: PciId) -> Result<Option<FakeConfigSpace>> {
            Err(BacklightError::Io(std::io::Error::new(
                std::io::ErrorKind::PermissionDenied,
                "scan denied",
            )))
        }
    }

    /// Creates an empty sysfs skeleton (class/dmi/id and bus/pci/devices)
    pub fn create_mock_sysfs() -> TempDir {
        let temp_dir = TempDir::new().unwrap();
        fs::create_dir_all(temp_dir.path().join("class/dmi/id")).unwrap();
        fs::create_dir_all(temp_dir.path().join("bus/pci/devices")).unwrap();
        temp_dir
    }

    /// Writes sys_vendor and product_name below `root/class/dmi/id`
    pub fn write_dmi(root: &Path, vendor: &str, product: &str) {
        let dir = root.join("class/dmi/id");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("sys_vendor"), format!("{}\n", vendor)).unwrap();
        fs::write(dir.join("product_name"), format!("{}\n", product)).unwrap();
    }

    /// Adds a device directory with a 256-byte config file whose LBB byte is `lbb`
    pub fn add_pci_device(devices_dir: &Path, address: &str, vendor: u16, device: u16, lbb: u8) {
        let dir = devices_dir.join(address);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("vendor"), format!("0x{:04x}\n", vendor)).unwrap();
        fs::write(dir.join("device"), format!("0x{:04x}\n", device)).unwrap();
        let mut config = vec![0u8; 256];
        config[0xF4] = lbb;
        fs::write(dir.join("config"), config).unwrap();
    }
}

#[cfg(test)]
mod tests {
    use super::test_utils::*;
    use crate::pci::{ConfigSpace, PciBus, PciId};

    #[test]
    fn test_fake_config_space_shares_storage() {
        let a = FakeConfigSpace::with_byte(0xF4, 9);
        let b = a.clone();
        b.write_config_byte(0xF4, 10).unwrap();
        assert_eq!(a.peek(0xF4), 10);
        assert_eq!(a.read_config_byte(0x00).unwrap(), 0);
    }

    #[test]
    fn test_fake_bus_filters_by_id() {
        let bus = FakePciBus::with_device(PciId::new(0x8086, 0x2a42), FakeConfigSpace::new());
        assert!(bus.get_device(PciId::new(0x8086, 0x2a42)).unwrap().is_some());
        assert!(bus.get_device(PciId::new(0x8086, 0x0001)).unwrap().is_none());
        assert_eq!(bus.lookups.get(), 2);
        assert!(FakePciBus::empty().get_device(PciId::new(0x8086, 0x2a42)).unwrap().is_none());
    }

    #[test]
    fn test_mock_sysfs_layout() {
        let sys = create_mock_sysfs();
        write_dmi(sys.path(), "Acer", "Aspire 4736");
        add_pci_device(&sys.path().join("bus/pci/devices"), "0000:00:02.0", 0x8086, 0x2a42, 5);

        let dev = sys.path().join("bus/pci/devices/0000:00:02.0");
        assert_eq!(std::fs::read_to_string(dev.join("vendor")).unwrap(), "0x8086\n");
        assert_eq!(std::fs::read(dev.join("config")).unwrap()[0xF4], 5);
        assert_eq!(
            std::fs::read_to_string(sys.path().join("class/dmi/id/product_name")).unwrap(),
            "Aspire 4736\n"
        );
    }
}
