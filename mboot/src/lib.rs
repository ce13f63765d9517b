//! Client for the NXP MCU bootloader (MCUBoot) protocol over USB HID,
//! based on [`nusb`]
//!
//! Covers the packet and HID report framing, command/response exchanges
//! with chunked data phases, discovery of the device memory map through
//! its indexed properties, and a stable per-device identity derived from
//! the unique device id.
//!
//! Useful references:
//! - [MCU Bootloader Reference Manual](https://www.nxp.com/docs/en/reference-manual/MCUBOOTRM.pdf)
//!
//! # Example
//!
//! The following example lists the flash regions of the first bootloader
//! found with the default vendor and product ids:
//! ```no_run
//! use mboot::{HidOpener, McuBoot, Opener, find_hid_devices};
//!
//! let devices = find_hid_devices(Some(mboot::DEFAULT_VID), Some(mboot::DEFAULT_PID))?;
//! if let Some(device) = devices.first() {
//!     let mut client = McuBoot::new(HidOpener::default().open(&device.handle)?);
//!     for (index, region) in client.get_memories()?.flash {
//!         println!("{index}: {:#010x} ({} bytes)", region.start_addr(), region.size());
//!     }
//!     client.close()?;
//! }
//! # Ok::<(), mboot::MbootError>(())
//! ```
//!
//! [`nusb`]: https://docs.rs/nusb

pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(5000u64);
pub const DEFAULT_REPORT_SIZE: usize = 60;
pub const DEFAULT_VID: u16 = 0x1fc9;
pub const DEFAULT_PID: u16 = 0x0021;

#[macro_use]
mod macros;

mod client;
mod command;
mod device;
mod error;
mod hid;
mod memory;
mod packet;
mod property;
mod report;
mod status;
mod transport;

#[cfg(test)]
mod mock;

use std::time::Duration;

// Re-exports
pub use client::{McuBoot, PROGRESS_THROTTLE, Progress};
pub use command::{CommandFlags, CommandTag, KeyProvOperation, ResponseTag};
pub use device::{
    Device, DeviceEnumerator, IdentifiedDevice, Opener, device_identity, enumerate,
};
pub use error::MbootError;
pub use hid::{HidEnumerator, HidOpener, HidTransport, find_hid_devices};
pub use memory::{MemoryMap, MemoryRegion};
pub use packet::{CommandPacket, HEADER_LEN, Header, Response, decode_params, encode_params};
pub use property::Property;
pub use report::{
    HidReport, REPORT_HEADER_LEN, ReportId, decode_report, encode_report, max_payload,
};
pub use status::{StatusCode, status_name};
pub use transport::Transport;
