// Fake device trees and a recording attribute double for tests

use std::cell::RefCell;
use std::fs;
use std::path::{Path, PathBuf};

use super::attribute::{AttributeIo, SysfsAttributes};
use super::error::Result;
use super::port::OutPort;
use super::protocol::Attribute;

/// One attribute access observed by `RecordingAttributes`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Access {
    Read(Attribute),
    Write(Attribute, String),
}

/// Delegates to the real filesystem and records every access in order
#[derive(Debug, Default)]
pub struct RecordingAttributes {
    log: RefCell<Vec<Access>>,
}

impl RecordingAttributes {
    pub fn accesses(&self) -> Vec<Access> {
        self.log.borrow().clone()
    }

    /// Writes only, skipping the `address` reads done by port resolution
    pub fn writes(&self) -> Vec<(Attribute, String)> {
        self.log
            .borrow()
            .iter()
            .filter_map(|a| match a {
                Access::Write(attr, value) => Some((*attr, value.clone())),
                Access::Read(_) => None,
            })
            .collect()
    }

    /// Reads of anything other than `address`
    pub fn parameter_reads(&self) -> Vec<Attribute> {
        self.log
            .borrow()
            .iter()
            .filter_map(|a| match a {
                Access::Read(Attribute::Address) | Access::Write(..) => None,
                Access::Read(attr) => Some(*attr),
            })
            .collect()
    }

    pub fn clear(&self) {
        self.log.borrow_mut().clear();
    }
}

impl AttributeIo for RecordingAttributes {
    fn read_attribute(&self, dir: &Path, attribute: Attribute) -> Result<String> {
        self.log.borrow_mut().push(Access::Read(attribute));
        SysfsAttributes.read_attribute(dir, attribute)
    }

    fn write_attribute(&self, dir: &Path, attribute: Attribute, value: &str) -> Result<()> {
        self.log
            .borrow_mut()
            .push(Access::Write(attribute, value.to_string()));
        SysfsAttributes.write_attribute(dir, attribute, value)
    }
}

/// Create a device directory reporting `port`, with idle telemetry files
pub fn add_motor(root: &Path, name: &str, port: OutPort) -> PathBuf {
    let dir = root.join(name);
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join("address"), format!("{}\n", port.address())).unwrap();
    for (attr, value) in [
        (Attribute::Speed, "0"),
        (Attribute::DutyCycle, "0"),
        (Attribute::Position, "0"),
        (Attribute::State, ""),
    ] {
        fs::write(dir.join(attr.file_name()), format!("{}\n", value)).unwrap();
    }
    dir
}

/// Read back an attribute file of a fake device
pub fn read_back(dir: &Path, attribute: Attribute) -> String {
    fs::read_to_string(dir.join(attribute.file_name())).unwrap()
}
