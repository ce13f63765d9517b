use std::{fmt::Display, io};

use mboot::MbootError;

pub enum CliError {
    IO(io::Error),
    Mboot(MbootError),
    InvalidHex(hex::FromHexError),
    UnknownProperty(String),
    NoDevice,
    ManyDevices,
}

impl From<io::Error> for CliError {
    fn from(value: io::Error) -> Self {
        CliError::IO(value)
    }
}

impl From<MbootError> for CliError {
    fn from(value: MbootError) -> Self {
        CliError::Mboot(value)
    }
}

impl From<hex::FromHexError> for CliError {
    fn from(value: hex::FromHexError) -> Self {
        CliError::InvalidHex(value)
    }
}

impl Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CliError::IO(err) => write!(f, "IO error: {err}"),
            CliError::Mboot(err) => write!(f, "{err}"),
            CliError::InvalidHex(err) => write!(f, "Invalid hex data: {err}"),
            CliError::UnknownProperty(name) => {
                write!(f, "Unknown property \"{name}\"")
            }
            CliError::NoDevice => write!(f, "No bootloader device"),
            CliError::ManyDevices => {
                write!(f, "More than one bootloader device")
            }
        }
    }
}
