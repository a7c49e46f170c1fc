// Error types for tacho-motor access

use std::path::PathBuf;

use super::port::OutPort;
use super::protocol::Attribute;

/// Coarse classification of a [`MotorError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// No hardware present at all; nothing can proceed
    Environment,
    /// Devices exist but none sits on the requested port
    PortNotFound,
    /// Reading or writing a parameter file failed
    AttributeIo,
}

#[derive(Debug, thiserror::Error)]
pub enum MotorError {
    #[error("There are no motors connected (no devices under {root})")]
    NoMotorsConnected { root: PathBuf },

    #[error("Failed to list motor devices under {root}: {source}")]
    Scan {
        root: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("No motor is connected to port {port}")]
    PortNotConnected { port: OutPort },

    #[error("IO error on attribute '{attribute}' of {dir}: {source}")]
    Io {
        attribute: Attribute,
        dir: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid value {value:?} in attribute '{attribute}': {reason}")]
    InvalidValue {
        attribute: Attribute,
        value: String,
        reason: String,
    },
}

impl MotorError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            MotorError::NoMotorsConnected { .. } | MotorError::Scan { .. } => ErrorKind::Environment,
            MotorError::PortNotConnected { .. } => ErrorKind::PortNotFound,
            MotorError::Io { .. } | MotorError::InvalidValue { .. } => ErrorKind::AttributeIo,
        }
    }

    /// The attribute involved, if the failure happened on a parameter file
    pub fn attribute(&self) -> Option<Attribute> {
        match self {
            MotorError::Io { attribute, .. } | MotorError::InvalidValue { attribute, .. } => {
                Some(*attribute)
            }
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, MotorError>;
