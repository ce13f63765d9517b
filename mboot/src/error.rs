#[derive(Debug)]
pub enum MbootError {
    Usb(nusb::Error),
    Transfer(nusb::transfer::TransferError),
    Timeout,
    NoHidInterface,
    InvalidReportId(u8),
    Status { code: u32, name: &'static str },
    MalformedResponse,
    ShortTransfer { expected: usize, actual: usize },
    TransferStalled { sent: usize, total: usize },
}

impl MbootError {
    pub(crate) fn status(code: u32) -> Self {
        MbootError::Status {
            code,
            name: crate::status::status_name(code),
        }
    }

    /// Numeric status code for errors reported by the bootloader
    pub fn status_code(&self) -> Option<u32> {
        match self {
            MbootError::Status { code, .. } => Some(*code),
            _ => None,
        }
    }
}

impl std::error::Error for MbootError {}

impl std::fmt::Display for MbootError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MbootError::Usb(err) => write!(f, "USB error: {}", err),
            MbootError::Transfer(err) => write!(f, "Transfer error: {}", err),
            MbootError::Timeout => write!(f, "Timeout"),
            MbootError::NoHidInterface => {
                write!(f, "No HID interface with interrupt endpoints")
            }
            MbootError::InvalidReportId(id) => {
                write!(f, "Invalid HID report id {:#04x}", id)
            }
            MbootError::Status { code, name } => {
                write!(f, "Bootloader error: {} ({})", name, code)
            }
            MbootError::MalformedResponse => {
                write!(f, "Bootloader returned no parameters")
            }
            MbootError::ShortTransfer { expected, actual } => {
                write!(
                    f,
                    "Got less data than expected: {} of {} bytes",
                    actual, expected
                )
            }
            MbootError::TransferStalled { sent, total } => {
                write!(
                    f,
                    "Transport stopped accepting data after {} of {} bytes",
                    sent, total
                )
            }
        }
    }
}

impl From<nusb::Error> for MbootError {
    fn from(err: nusb::Error) -> Self {
        MbootError::Usb(err)
    }
}

impl From<nusb::transfer::TransferError> for MbootError {
    fn from(err: nusb::transfer::TransferError) -> Self {
        MbootError::Transfer(err)
    }
}
