use log::debug;

use crate::{McuBoot, MbootError, Transport, packet::encode_params, property::Property};

/// Bootloader device as reported by the OS
///
/// `handle` is whatever the enumerator needs to open the device later, it
/// is not stable across re-enumeration.
#[derive(Clone, Debug)]
pub struct Device<H> {
    pub handle: H,
    pub location: String,
    pub product_name: String,
    pub serial_number: String,
}

/// Device together with the identity derived from its unique device id
#[derive(Clone, Debug)]
pub struct IdentifiedDevice<H> {
    pub device: Device<H>,
    pub identity: String,
}

impl<H> IdentifiedDevice<H> {
    pub fn handle(&self) -> &H {
        &self.device.handle
    }

    /// Lowercase hex identity, stable for a physical device
    pub fn identity(&self) -> &str {
        &self.identity
    }
}

/// Source of candidate bootloader devices
pub trait DeviceEnumerator {
    type Handle;

    fn enumerate(&mut self) -> Result<Vec<Device<Self::Handle>>, MbootError>;
}

/// Opens a transport session to an enumerated device
pub trait Opener<H> {
    type Transport: Transport;

    fn open(&mut self, handle: &H) -> Result<Self::Transport, MbootError>;
}

impl<H, F> DeviceEnumerator for F
where
    F: FnMut() -> Result<Vec<Device<H>>, MbootError>,
{
    type Handle = H;

    fn enumerate(&mut self) -> Result<Vec<Device<H>>, MbootError> {
        self()
    }
}

impl<H, T, F> Opener<H> for F
where
    T: Transport,
    F: FnMut(&H) -> Result<T, MbootError>,
{
    type Transport = T;

    fn open(&mut self, handle: &H) -> Result<T, MbootError> {
        self(handle)
    }
}

/// Render unique device id words as lowercase hex, each word little-endian
pub fn device_identity(words: &[u32]) -> String {
    hex::encode(encode_params(words))
}

/// Open every enumerated device once to read its unique device id.
///
/// Each session is closed again before the next device is opened.
pub fn enumerate<E, O>(
    mut enumerator: E,
    mut opener: O,
) -> Result<Vec<IdentifiedDevice<E::Handle>>, MbootError>
where
    E: DeviceEnumerator,
    O: Opener<E::Handle>,
{
    let devices = enumerator.enumerate()?;
    let mut identified = Vec::with_capacity(devices.len());
    for device in devices {
        let mut client = McuBoot::new(opener.open(&device.handle)?);
        let words = client.get_property(Property::UniqueDeviceId, 0)?;
        client.close()?;

        let identity = device_identity(&words);
        debug!("{} at {}: {}", device.product_name, device.location, identity);
        identified.push(IdentifiedDevice { device, identity });
    }
    Ok(identified)
}
