// Output ports and device discovery
//
// The kernel names device directories (motor0, motor1, ...) in enumeration
// order, so the directory for a port changes across replugs. Resolution is
// redone on every call and never cached.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::attribute::AttributeIo;
use super::error::{MotorError, Result};
use super::protocol::Attribute;

/// EV3 output ports
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum OutPort {
    A,
    B,
    C,
    D,
}

impl OutPort {
    pub const ALL: [OutPort; 4] = [OutPort::A, OutPort::B, OutPort::C, OutPort::D];

    /// Canonical identity as reported by the `address` attribute
    pub const fn address(self) -> &'static str {
        match self {
            OutPort::A => "ev3-ports:outA",
            OutPort::B => "ev3-ports:outB",
            OutPort::C => "ev3-ports:outC",
            OutPort::D => "ev3-ports:outD",
        }
    }
}

impl fmt::Display for OutPort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.address())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("Unknown output port '{0}' (expected A-D or ev3-ports:outA-D)")]
pub struct ParsePortError(String);

impl FromStr for OutPort {
    type Err = ParsePortError;

    /// Accepts "A", "outA" or "ev3-ports:outA" (letter case-insensitive)
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let short = s.strip_prefix("ev3-ports:").unwrap_or(s);
        let letter = short.strip_prefix("out").unwrap_or(short);
        match letter.to_ascii_uppercase().as_str() {
            "A" => Ok(OutPort::A),
            "B" => Ok(OutPort::B),
            "C" => Ok(OutPort::C),
            "D" => Ok(OutPort::D),
            _ => Err(ParsePortError(s.to_string())),
        }
    }
}

/// Maps output ports to device directories under a class root
#[derive(Debug, Clone)]
pub struct PortResolver {
    root: PathBuf,
}

impl PortResolver {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Find the device directory whose `address` matches `port`.
    ///
    /// Fails with `NoMotorsConnected` if the root is missing or holds no
    /// devices, and with `PortNotConnected` if no device reports this port.
    pub fn resolve<A: AttributeIo>(&self, io: &A, port: OutPort) -> Result<PathBuf> {
        for dir in self.devices()? {
            let address = io.read_attribute(&dir, Attribute::Address)?;
            if address == port.address() {
                debug!("Port {} resolved to {}", port, dir.display());
                return Ok(dir);
            }
        }

        Err(MotorError::PortNotConnected { port })
    }

    /// List device directories, sorted by name
    pub fn devices(&self) -> Result<Vec<PathBuf>> {
        if !self.root.is_dir() {
            return Err(MotorError::NoMotorsConnected {
                root: self.root.clone(),
            });
        }

        let scan_err = |source| MotorError::Scan {
            root: self.root.clone(),
            source,
        };
        let mut dirs = Vec::new();
        for entry in fs::read_dir(&self.root).map_err(scan_err)? {
            let path = entry.map_err(scan_err)?.path();
            // Entries under /sys/class are symlinks; is_dir follows them
            if path.is_dir() {
                dirs.push(path);
            }
        }

        if dirs.is_empty() {
            return Err(MotorError::NoMotorsConnected {
                root: self.root.clone(),
            });
        }

        dirs.sort();
        Ok(dirs)
    }
}
