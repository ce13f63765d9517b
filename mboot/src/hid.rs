use std::time::Duration;

use log::{debug, trace};
use nusb::{
    Endpoint, MaybeFuture,
    descriptors::TransferType,
    transfer::{Buffer, BulkOrInterrupt, EndpointDirection, In, Interrupt, Out},
};

use crate::{Device, DeviceEnumerator, MbootError, Opener, Transport};

const HID_CLASS: u8 = 0x03;
const ENDPOINT_DIR_IN: u8 = 0x80;

/// HID transport over the interrupt endpoints of a bootloader's HID
/// interface
///
/// Reports are written and read raw, the report id being the first byte
/// of every frame.
///
/// The interface is claimed directly from the USB stack, detaching the
/// kernel HID driver first. That only works on Linux: Windows and macOS keep
/// HID-class interfaces bound to the OS HID driver, and opening fails there.
pub struct HidTransport {
    ep_in: Endpoint<Interrupt, In>,
    ep_out: Endpoint<Interrupt, Out>,
    frame_size: usize,
    timeout: Duration,
}

impl HidTransport {
    /// Open the HID interface of `device`, detaching a kernel driver if one
    /// is bound to it.
    pub fn open(
        device: &nusb::DeviceInfo,
        frame_size: usize,
        timeout: Duration,
    ) -> Result<Self, MbootError> {
        let intf_number = device
            .interfaces()
            .find(|i| i.class() == HID_CLASS)
            .map(|i| i.interface_number())
            .ok_or(MbootError::NoHidInterface)?;

        let dev = device.open().wait()?;
        let interface = dev.detach_and_claim_interface(intf_number).wait()?;

        let (mut addr_in, mut addr_out) = (None, None);
        if let Some(desc) = interface.descriptor() {
            for ep in desc.endpoints() {
                if ep.transfer_type() != TransferType::Interrupt {
                    continue;
                }
                if ep.address() & ENDPOINT_DIR_IN != 0 {
                    addr_in.get_or_insert(ep.address());
                } else {
                    addr_out.get_or_insert(ep.address());
                }
            }
        }
        let (Some(addr_in), Some(addr_out)) = (addr_in, addr_out) else {
            return Err(MbootError::NoHidInterface);
        };
        debug!(
            "claimed HID interface {} (in {:#04x}, out {:#04x})",
            intf_number, addr_in, addr_out
        );

        Ok(HidTransport {
            ep_in: interface.endpoint::<Interrupt, In>(addr_in)?,
            ep_out: interface.endpoint::<Interrupt, Out>(addr_out)?,
            frame_size,
            timeout,
        })
    }

    pub fn set_timeout(&mut self, timeout: Duration) {
        self.timeout = timeout;
    }
}

impl Transport for HidTransport {
    fn frame_size(&self) -> usize {
        self.frame_size
    }

    fn write(&mut self, frame: &[u8]) -> Result<usize, MbootError> {
        trace!("<< ({}) {}", frame.len(), hex::encode(frame));
        self.ep_out.submit(Buffer::from(frame.to_vec()));
        let Some(completion) = self.ep_out.wait_next_complete(self.timeout) else {
            cancel_pending(&mut self.ep_out, self.timeout);
            return Err(MbootError::Timeout);
        };
        completion.status?;
        Ok(completion.actual_len)
    }

    fn read(&mut self) -> Result<Vec<u8>, MbootError> {
        let len = in_transfer_len(self.frame_size, self.ep_in.max_packet_size());
        self.ep_in.submit(self.ep_in.allocate(len));
        let Some(completion) = self.ep_in.wait_next_complete(self.timeout) else {
            cancel_pending(&mut self.ep_in, self.timeout);
            return Err(MbootError::Timeout);
        };
        completion.status?;
        let actual_len = completion.actual_len;
        let mut frame = completion.buffer.into_vec();
        frame.truncate(actual_len);
        trace!(">> {}", hex::encode(&frame));
        Ok(frame)
    }

    fn close(self) -> Result<(), MbootError> {
        // Endpoints and the claimed interface are released on drop
        Ok(())
    }
}

/// IN transfers must request a whole number of max-size packets
fn in_transfer_len(frame_size: usize, max_packet_size: usize) -> usize {
    let mps = max_packet_size.max(1);
    frame_size.max(1).div_ceil(mps) * mps
}

/// Transfer queue of one endpoint
trait TransferQueue {
    fn cancel_all(&mut self);
    fn pending(&self) -> usize;
    /// Wait for the oldest queued transfer, false on timeout
    fn reap(&mut self, timeout: Duration) -> bool;
}

impl<EpType, Dir> TransferQueue for Endpoint<EpType, Dir>
where
    EpType: BulkOrInterrupt,
    Dir: EndpointDirection,
{
    fn cancel_all(&mut self) {
        Endpoint::cancel_all(self);
    }

    fn pending(&self) -> usize {
        Endpoint::pending(self)
    }

    fn reap(&mut self, timeout: Duration) -> bool {
        match self.wait_next_complete(timeout) {
            Some(completion) => {
                trace!("reaped cancelled transfer: {:?}", completion.status);
                true
            }
            None => false,
        }
    }
}

/// Cancel the transfers still queued on `queue` and reap their completions,
/// so the next transfer is not answered with a stale one.
fn cancel_pending(queue: &mut impl TransferQueue, timeout: Duration) {
    queue.cancel_all();
    while queue.pending() > 0 {
        if !queue.reap(timeout) {
            debug!("{} transfers still pending after cancel", queue.pending());
            break;
        }
    }
}

/// Lists USB devices exposing a HID interface, optionally filtered by
/// vendor and product id
#[derive(Clone, Copy, Debug, Default)]
pub struct HidEnumerator {
    pub vid: Option<u16>,
    pub pid: Option<u16>,
}

impl DeviceEnumerator for HidEnumerator {
    type Handle = nusb::DeviceInfo;

    fn enumerate(&mut self) -> Result<Vec<Device<nusb::DeviceInfo>>, MbootError> {
        find_hid_devices(self.vid, self.pid)
    }
}

/// Opens [HidTransport] sessions with a fixed frame size and timeout
#[derive(Clone, Copy, Debug)]
pub struct HidOpener {
    pub frame_size: usize,
    pub timeout: Duration,
}

impl Default for HidOpener {
    fn default() -> Self {
        HidOpener {
            frame_size: crate::DEFAULT_REPORT_SIZE,
            timeout: crate::DEFAULT_TIMEOUT,
        }
    }
}

impl Opener<nusb::DeviceInfo> for HidOpener {
    type Transport = HidTransport;

    fn open(&mut self, handle: &nusb::DeviceInfo) -> Result<HidTransport, MbootError> {
        HidTransport::open(handle, self.frame_size, self.timeout)
    }
}

fn is_hid_device(dev: &nusb::DeviceInfo) -> bool {
    dev.interfaces().any(|i| i.class() == HID_CLASS)
}

pub fn find_hid_devices(
    vid: Option<u16>,
    pid: Option<u16>,
) -> Result<Vec<Device<nusb::DeviceInfo>>, MbootError> {
    Ok(nusb::list_devices()
        .wait()?
        .filter(|dev| {
            vid.is_none_or(|id| dev.vendor_id() == id)
                && pid.is_none_or(|id| dev.product_id() == id)
        })
        .filter(is_hid_device)
        .map(|dev| Device {
            location: format!("{}:{:03}", dev.bus_id(), dev.device_address()),
            product_name: dev.product_string().unwrap_or_default().to_string(),
            serial_number: dev.serial_number().unwrap_or_default().to_string(),
            handle: dev,
        })
        .collect())
}
