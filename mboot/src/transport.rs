use crate::MbootError;

/// Framed, half-duplex channel to a bootloader
///
/// Every call blocks until the underlying device completes it or the
/// transport gives up with its own timeout. A transport is owned by a single
/// [McuBoot](crate::McuBoot) client for the lifetime of a session.
pub trait Transport {
    /// Size in bytes of every frame written to the device
    fn frame_size(&self) -> usize;

    /// Write one frame, returning the number of frame bytes accepted
    fn write(&mut self, frame: &[u8]) -> Result<usize, MbootError>;

    /// Read one frame
    fn read(&mut self) -> Result<Vec<u8>, MbootError>;

    fn close(self) -> Result<(), MbootError>
    where
        Self: Sized;
}
