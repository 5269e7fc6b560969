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

//! Error type shared by every module of the crate.

use std::io;

/// Result type alias using BacklightError
pub type Result<T> = std::result::Result<T, BacklightError>;

#[derive(thiserror::Error, Debug)]
pub enum BacklightError {
    // ============================================================================
    // Activation
    // ============================================================================
    #[error("No such device: {0}")]
    NoSuchDevice(String),

    // ============================================================================
    // Hardware Access
    // ============================================================================
    #[error("Invalid parameter. Maximum value is {max} (got {value})")]
    InvalidBrightness {
        value: u32,
        max: u32,
    },

    #[error("Failed to read config byte 0x{offset:02x} of {address}: {reason}")]
    ConfigRead {
        address: String,
        offset: u8,
        reason: String,
    },

    #[error("Failed to write config byte 0x{offset:02x} of {address}: {reason}")]
    ConfigWrite {
        address: String,
        offset: u8,
        reason: String,
    },

    #[error("Device handle already released")]
    DeviceReleased,

    // ============================================================================
    // Registry
    // ============================================================================
    #[error("Backlight {0} is already registered")]
    AlreadyRegistered(String),

    #[error("Backlight {0} is not registered")]
    NotRegistered(String),

    #[error("Unknown attribute: {0}")]
    UnknownAttribute(String),

    #[error("Attribute is read-only: {0}")]
    ReadOnlyAttribute(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    // ============================================================================
    // Ambient
    // ============================================================================
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),
}

impl BacklightError {
    pub fn no_such_device(msg: impl Into<String>) -> Self {
        Self::NoSuchDevice(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }

    /// Kernel-style errno for the error, as the in-kernel driver would return it.
    pub fn errno(&self) -> i32 {
        match self {
            Self::NoSuchDevice(_) | Self::DeviceReleased => libc::ENODEV,
            Self::InvalidBrightness { .. } | Self::InvalidArgument(_) => libc::EINVAL,
            Self::ReadOnlyAttribute(_) => libc::EACCES,
            Self::AlreadyRegistered(_) => libc::EEXIST,
            Self::NotRegistered(_) | Self::UnknownAttribute(_) => libc::ENOENT,
            Self::ConfigRead { .. } | Self::ConfigWrite { .. } | Self::Io(_) => libc::EIO,
            Self::Parse(_) | Self::Config(_) | Self::JsonParse(_) => libc::EINVAL,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_brightness_display() {
        let err = BacklightError::InvalidBrightness { value: 300, max: 255 };
        assert_eq!(
            err.to_string(),
            "Invalid parameter. Maximum value is 255 (got 300)"
        );
    }

    #[test]
    fn test_config_read_display() {
        let err = BacklightError::ConfigRead {
            address: "0000:00:02.0".to_string(),
            offset: 0xF4,
            reason: "short read".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Failed to read config byte 0xf4 of 0000:00:02.0: short read"
        );
    }

    #[test]
    fn test_from_io() {
        let io_err = io::Error::new(io::ErrorKind::PermissionDenied, "test");
        let err: BacklightError = io_err.into();
        assert!(matches!(err, BacklightError::Io(_)));
        assert_eq!(err.errno(), libc::EIO);
    }

    #[test]
    fn test_errno_mapping() {
        assert_eq!(BacklightError::no_such_device("x").errno(), libc::ENODEV);
        assert_eq!(BacklightError::DeviceReleased.errno(), libc::ENODEV);
        assert_eq!(
            BacklightError::InvalidBrightness { value: 256, max: 255 }.errno(),
            libc::EINVAL
        );
        assert_eq!(
            BacklightError::AlreadyRegistered("a".into()).errno(),
            libc::EEXIST
        );
    }
}
