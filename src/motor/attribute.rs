// Attribute file I/O
//
// The driver exposes every parameter as a small text file. `AttributeIo` is
// the seam between the motor API and the filesystem; `SysfsAttributes` is the
// real implementation.

use std::fmt::Display;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use tracing::{debug, trace};

use super::error::{MotorError, Result};
use super::protocol::{Attribute, Token};

/// Read and write raw attribute values under a device directory
pub trait AttributeIo {
    /// Read an attribute, with trailing whitespace trimmed
    fn read_attribute(&self, dir: &Path, attribute: Attribute) -> Result<String>;

    /// Write a raw value to an attribute
    fn write_attribute(&self, dir: &Path, attribute: Attribute, value: &str) -> Result<()>;

    /// Read a signed 16-bit attribute
    fn read_i16(&self, dir: &Path, attribute: Attribute) -> Result<i16> {
        self.read_parsed(dir, attribute)
    }

    /// Read a signed 32-bit attribute
    fn read_i32(&self, dir: &Path, attribute: Attribute) -> Result<i32> {
        self.read_parsed(dir, attribute)
    }

    /// Write a decimal integer
    fn write_int<T: Into<i64>>(&self, dir: &Path, attribute: Attribute, value: T) -> Result<()> {
        self.write_attribute(dir, attribute, &value.into().to_string())
    }

    /// Write a protocol token to the attribute it belongs to
    fn write_token<T: Token>(&self, dir: &Path, token: T) -> Result<()> {
        self.write_attribute(dir, T::ATTRIBUTE, token.token())
    }

    fn read_parsed<T>(&self, dir: &Path, attribute: Attribute) -> Result<T>
    where
        T: FromStr,
        T::Err: Display,
    {
        let raw = self.read_attribute(dir, attribute)?;
        raw.trim().parse().map_err(|e: T::Err| MotorError::InvalidValue {
            attribute,
            value: raw.clone(),
            reason: e.to_string(),
        })
    }
}

/// Attribute access through the real filesystem
#[derive(Debug, Clone, Copy, Default)]
pub struct SysfsAttributes;

impl AttributeIo for SysfsAttributes {
    fn read_attribute(&self, dir: &Path, attribute: Attribute) -> Result<String> {
        let path = dir.join(attribute.file_name());
        let mut value = fs::read_to_string(&path).map_err(|source| MotorError::Io {
            attribute,
            dir: dir.to_path_buf(),
            source,
        })?;
        value.truncate(value.trim_end().len());
        trace!("Read {}: {:?}", path.display(), value);
        Ok(value)
    }

    fn write_attribute(&self, dir: &Path, attribute: Attribute, value: &str) -> Result<()> {
        let path = dir.join(attribute.file_name());
        debug!("Write {}: {}", path.display(), value);
        fs::write(&path, value).map_err(|source| MotorError::Io {
            attribute,
            dir: dir.to_path_buf(),
            source,
        })
    }
}
