use log::{debug, trace, warn};

use crate::{
    MbootError, Transport,
    command::{CommandFlags, CommandTag, KeyProvOperation},
    packet::{CommandPacket, Response},
    property::Property,
    report::{REPORT_HEADER_LEN, ReportId, decode_report, encode_report, max_payload},
};

/// Data frames sent between two progress notifications
pub const PROGRESS_THROTTLE: usize = 25;

/// Per-call progress callback, receives the completed fraction in `[0, 1]`
pub type Progress<'a> = Option<&'a mut dyn FnMut(f32)>;

fn notify(progress: &mut Progress, fraction: f32) {
    if let Some(sink) = progress {
        sink(fraction);
    }
}

fn check_response(res: &Response) -> Result<(), MbootError> {
    if res.is_empty() {
        Err(MbootError::MalformedResponse)
    } else if !res.success() {
        Err(MbootError::status(res.status()))
    } else {
        Ok(())
    }
}

fn declared_length(res: &Response) -> Result<usize, MbootError> {
    if res.params().len() < 2 {
        return Err(MbootError::MalformedResponse);
    }
    Ok(res.declared_length() as usize)
}

/// Bootloader client
///
/// Owns its transport for the whole session. Every exchange is strictly
/// half-duplex: one frame written, then the response read, before the next
/// command goes out.
pub struct McuBoot<T: Transport> {
    transport: T,
}

impl<T: Transport> McuBoot<T> {
    pub fn new(transport: T) -> Self {
        McuBoot { transport }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn frame_size(&self) -> usize {
        self.transport.frame_size()
    }

    /// End the session and release the transport
    pub fn close(self) -> Result<(), MbootError> {
        self.transport.close()
    }

    /// Send a command and read its response.
    ///
    /// Fails if the response carries no parameters or a non-success status.
    pub fn send_recv(&mut self, cmd: &CommandPacket) -> Result<Response, MbootError> {
        let res = self.exchange(cmd)?;
        check_response(&res)?;
        Ok(res)
    }

    /// Send `data` as a data phase, split into as many frames as needed, and
    /// read the final response.
    pub fn send_data(
        &mut self,
        data: &[u8],
        mut progress: Progress,
    ) -> Result<bool, MbootError> {
        let frame_size = self.transport.frame_size();
        let chunk_size = max_payload(frame_size);
        let total = data.len();
        let mut sent = 0;
        let mut chunks = 0;

        notify(&mut progress, 0.0);
        while sent < total {
            let chunk = &data[sent..total.min(sent + chunk_size)];
            let frame = encode_report(ReportId::DataOut, chunk, frame_size);
            let accepted = self
                .transport
                .write(&frame)?
                .saturating_sub(REPORT_HEADER_LEN)
                .min(chunk.len());
            if accepted == 0 {
                return Err(MbootError::TransferStalled { sent, total });
            }
            sent += accepted;
            chunks += 1;
            trace!("writing {} / {}", sent, total);
            if chunks % PROGRESS_THROTTLE == 0 {
                notify(&mut progress, sent as f32 / total as f32);
            }
        }

        let res = self.read_response()?;
        check_response(&res)?;
        notify(&mut progress, 1.0);
        Ok(res.success())
    }

    /// Collect a data phase until the device reports completion of `tag`.
    ///
    /// Data frames are appended in arrival order. Only a response echoing
    /// `tag` ends the transfer, responses for any other command are skipped.
    /// The result holds at least `length` bytes.
    pub fn read_data(
        &mut self,
        tag: CommandTag,
        length: usize,
        mut progress: Progress,
    ) -> Result<Vec<u8>, MbootError> {
        let mut data = Vec::with_capacity(length);
        notify(&mut progress, 0.0);

        let status = loop {
            let frame = self.transport.read()?;
            let report = decode_report(&frame)?;
            match report.id {
                ReportId::DataIn => {
                    data.extend_from_slice(&report.payload);
                    let fraction = if length == 0 {
                        1.0
                    } else {
                        data.len() as f32 / length as f32
                    };
                    notify(&mut progress, fraction);
                }
                ReportId::CommandIn => {
                    let res = Response::from_bytes(&report.payload);
                    if res.params().len() < 2 {
                        return Err(MbootError::MalformedResponse);
                    }
                    if res.command_tag() == u32::from(tag) {
                        break res.status();
                    }
                    warn!(
                        "skipping response for command {:#04x} while reading {}",
                        res.command_tag(),
                        tag.name()
                    );
                }
                other => trace!("ignoring {:?} report", other),
            }
        };

        if data.len() < length {
            debug!("short read: {:02x?}", data);
            return Err(MbootError::ShortTransfer {
                expected: length,
                actual: data.len(),
            });
        }
        if status != 0 {
            return Err(MbootError::status(status));
        }
        Ok(data)
    }

    /// Read a property value.
    ///
    /// Absent properties and indexes are reported by the device with an
    /// error status, which yields an empty list here.
    pub fn get_property(
        &mut self,
        property: Property,
        index: u32,
    ) -> Result<Vec<u32>, MbootError> {
        debug!("get property {} [{}]", property.name(), index);
        let cmd = CommandPacket::new(
            CommandTag::GetProperty,
            CommandFlags::NONE,
            &[u32::from(property), index],
        );
        let res = self.exchange(&cmd)?;
        if res.success() {
            Ok(res.values().to_vec())
        } else {
            debug!(
                "property {} [{}] unavailable: {} ({})",
                property.name(),
                index,
                res.status_name(),
                res.status()
            );
            Ok(Vec::new())
        }
    }

    pub fn set_property(
        &mut self,
        property: Property,
        value: u32,
    ) -> Result<bool, MbootError> {
        debug!("set property {} = {:#x}", property.name(), value);
        self.command_ok(CommandTag::SetProperty, &[u32::from(property), value])
    }

    pub fn flash_erase_all(&mut self, mem_id: u32) -> Result<bool, MbootError> {
        self.command_ok(CommandTag::FlashEraseAll, &[mem_id])
    }

    pub fn flash_erase_region(
        &mut self,
        address: u32,
        length: u32,
        mem_id: u32,
    ) -> Result<bool, MbootError> {
        self.command_ok(CommandTag::FlashEraseRegion, &[address, length, mem_id])
    }

    pub fn flash_erase_all_unsecure(&mut self) -> Result<bool, MbootError> {
        self.command_ok(CommandTag::FlashEraseAllUnsecure, &[])
    }

    pub fn read_memory(
        &mut self,
        address: u32,
        length: u32,
        mem_id: u32,
        progress: Progress,
    ) -> Result<Vec<u8>, MbootError> {
        let res = self.command(
            CommandTag::ReadMemory,
            CommandFlags::NONE,
            &[address, length, mem_id],
        )?;
        let length = declared_length(&res)?;
        self.read_data(CommandTag::ReadMemory, length, progress)
    }

    pub fn write_memory(
        &mut self,
        address: u32,
        data: &[u8],
        mem_id: u32,
        progress: Progress,
    ) -> Result<bool, MbootError> {
        self.command(
            CommandTag::WriteMemory,
            CommandFlags::HAS_DATA_PHASE,
            &[address, data.len() as u32, mem_id],
        )?;
        self.send_data(data, progress)
    }

    /// Fill `length` bytes at `address` with the 32-bit `pattern`
    pub fn fill_memory(
        &mut self,
        address: u32,
        length: u32,
        pattern: u32,
    ) -> Result<bool, MbootError> {
        self.command_ok(CommandTag::FillMemory, &[address, length, pattern])
    }

    /// Unlock flash security with the 8-byte backdoor key
    pub fn flash_security_disable(&mut self, key: &[u8; 8]) -> Result<bool, MbootError> {
        let lo = u32::from_le_bytes([key[0], key[1], key[2], key[3]]);
        let hi = u32::from_le_bytes([key[4], key[5], key[6], key[7]]);
        self.command_ok(CommandTag::FlashSecurityDisable, &[lo, hi])
    }

    pub fn receive_sb_file(
        &mut self,
        data: &[u8],
        progress: Progress,
    ) -> Result<bool, MbootError> {
        self.command(
            CommandTag::ReceiveSbFile,
            CommandFlags::HAS_DATA_PHASE,
            &[data.len() as u32],
        )?;
        self.send_data(data, progress)
    }

    pub fn execute(
        &mut self,
        address: u32,
        argument: u32,
        stack_pointer: u32,
    ) -> Result<bool, MbootError> {
        self.command_ok(CommandTag::Execute, &[address, argument, stack_pointer])
    }

    pub fn call(&mut self, address: u32, argument: u32) -> Result<bool, MbootError> {
        self.command_ok(CommandTag::Call, &[address, argument])
    }

    /// Reset the device and end the session, the device re-enumerates
    pub fn reset(mut self) -> Result<(), MbootError> {
        self.command(CommandTag::Reset, CommandFlags::NONE, &[])?;
        self.close()
    }

    pub fn flash_program_once(&mut self, index: u32, word: u32) -> Result<bool, MbootError> {
        self.command_ok(CommandTag::FlashProgramOnce, &[index, 4, word])
    }

    pub fn flash_read_once(
        &mut self,
        index: u32,
        count: u32,
    ) -> Result<Vec<u8>, MbootError> {
        let res = self.command(
            CommandTag::FlashReadOnce,
            CommandFlags::NONE,
            &[index, count],
        )?;
        let length = declared_length(&res)?.min(count as usize);
        let mut data = res.raw_bytes();
        data.truncate(length);
        Ok(data)
    }

    pub fn flash_read_resource(
        &mut self,
        address: u32,
        length: u32,
        option: u32,
        progress: Progress,
    ) -> Result<Vec<u8>, MbootError> {
        let res = self.command(
            CommandTag::FlashReadResource,
            CommandFlags::NONE,
            &[address, length, option],
        )?;
        let length = declared_length(&res)?;
        self.read_data(CommandTag::FlashReadResource, length, progress)
    }

    pub fn configure_memory(&mut self, mem_id: u32, address: u32) -> Result<bool, MbootError> {
        self.command_ok(CommandTag::ConfigureMemory, &[mem_id, address])
    }

    pub fn reliable_update(&mut self, address: u32) -> Result<bool, MbootError> {
        self.command_ok(CommandTag::ReliableUpdate, &[address])
    }

    pub fn key_prov_enroll(&mut self) -> Result<bool, MbootError> {
        self.key_prov(KeyProvOperation::Enroll, &[])
    }

    pub fn key_prov_set_user_key(
        &mut self,
        key_type: u32,
        key: &[u8],
        progress: Progress,
    ) -> Result<bool, MbootError> {
        self.command(
            CommandTag::KeyProvisioning,
            CommandFlags::HAS_DATA_PHASE,
            &[
                u32::from(KeyProvOperation::SetUserKey),
                key_type,
                key.len() as u32,
            ],
        )?;
        self.send_data(key, progress)
    }

    pub fn key_prov_set_intrinsic_key(
        &mut self,
        key_type: u32,
        key_size: u32,
    ) -> Result<bool, MbootError> {
        self.key_prov(KeyProvOperation::SetIntrinsicKey, &[key_type, key_size])
    }

    pub fn key_prov_write_nonvolatile(&mut self, mem_id: u32) -> Result<bool, MbootError> {
        self.key_prov(KeyProvOperation::WriteNonVolatile, &[mem_id])
    }

    pub fn key_prov_read_nonvolatile(&mut self, mem_id: u32) -> Result<bool, MbootError> {
        self.key_prov(KeyProvOperation::ReadNonVolatile, &[mem_id])
    }

    pub fn key_prov_write_key_store(
        &mut self,
        data: &[u8],
        progress: Progress,
    ) -> Result<bool, MbootError> {
        self.command(
            CommandTag::KeyProvisioning,
            CommandFlags::HAS_DATA_PHASE,
            &[u32::from(KeyProvOperation::WriteKeyStore)],
        )?;
        self.send_data(data, progress)
    }

    pub fn key_prov_read_key_store(
        &mut self,
        progress: Progress,
    ) -> Result<Vec<u8>, MbootError> {
        let res = self.command(
            CommandTag::KeyProvisioning,
            CommandFlags::NONE,
            &[u32::from(KeyProvOperation::ReadKeyStore)],
        )?;
        let length = declared_length(&res)?;
        self.read_data(CommandTag::KeyProvisioning, length, progress)
    }

    fn key_prov(
        &mut self,
        operation: KeyProvOperation,
        args: &[u32],
    ) -> Result<bool, MbootError> {
        let mut params = vec![u32::from(operation)];
        params.extend_from_slice(args);
        self.command_ok(CommandTag::KeyProvisioning, &params)
    }

    fn command(
        &mut self,
        tag: CommandTag,
        flags: u8,
        params: &[u32],
    ) -> Result<Response, MbootError> {
        self.send_recv(&CommandPacket::new(tag, flags, params))
    }

    fn command_ok(&mut self, tag: CommandTag, params: &[u32]) -> Result<bool, MbootError> {
        Ok(self.command(tag, CommandFlags::NONE, params)?.success())
    }

    /// Write a command frame and read one response, rejecting only
    /// responses without a status word.
    fn exchange(&mut self, cmd: &CommandPacket) -> Result<Response, MbootError> {
        let tag = cmd.header().tag;
        debug!(
            "command {} params {:x?}",
            CommandTag::from_code(tag as u32).map_or("Unknown", CommandTag::name),
            cmd.params()
        );
        let frame = encode_report(
            ReportId::CommandOut,
            &cmd.to_bytes(),
            self.transport.frame_size(),
        );
        self.transport.write(&frame)?;
        let res = self.read_response()?;
        if res.is_empty() {
            return Err(MbootError::MalformedResponse);
        }
        Ok(res)
    }

    fn read_response(&mut self) -> Result<Response, MbootError> {
        let frame = self.transport.read()?;
        let report = decode_report(&frame)?;
        Ok(Response::from_bytes(&report.payload))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{command::ResponseTag, mock::MockTransport, status::StatusCode};

    const FRAME: usize = 64;

    fn generic(transport: &MockTransport, status: StatusCode, tag: CommandTag) -> Vec<u8> {
        transport.command_in(ResponseTag::Generic, &[u32::from(status), u32::from(tag)])
    }

    #[test]
    fn test_send_recv_success() {
        let mut transport = MockTransport::new(FRAME);
        transport.push_read(generic(&transport, StatusCode::Success, CommandTag::Reset));
        let mut client = McuBoot::new(transport);

        let res = client
            .send_recv(&CommandPacket::new(CommandTag::Reset, 0, &[]))
            .unwrap();
        assert!(res.success());
        assert_eq!(res.command_tag(), CommandTag::Reset as u32);

        let written = client.transport().reports_written();
        assert_eq!(written.len(), 1);
        assert_eq!(written[0].id, ReportId::CommandOut);
        assert_eq!(written[0].payload, vec![0x0b, 0, 0, 0]);
    }

    #[test]
    fn test_send_recv_status_error() {
        let mut transport = MockTransport::new(FRAME);
        transport.push_read(generic(&transport, StatusCode::OutOfRange, CommandTag::FillMemory));
        let mut client = McuBoot::new(transport);

        let err = client.fill_memory(0x2000_0000, 16, 0xffff_ffff).unwrap_err();
        assert_eq!(err.status_code(), Some(3));
        assert!(matches!(err, MbootError::Status { name: "OutOfRange", .. }));
    }

    #[test]
    fn test_send_recv_without_params_is_malformed() {
        let mut transport = MockTransport::new(FRAME);
        transport.push_read(transport.command_in(ResponseTag::Generic, &[]));
        let mut client = McuBoot::new(transport);

        assert!(matches!(
            client.call(0x1000, 0),
            Err(MbootError::MalformedResponse)
        ));
    }

    #[test]
    fn test_transport_error_propagates() {
        let mut client = McuBoot::new(MockTransport::new(FRAME));
        assert!(matches!(
            client.get_property(Property::CurrentVersion, 0),
            Err(MbootError::Timeout)
        ));
    }

    #[test]
    fn test_get_property_soft_fail() {
        let mut transport = MockTransport::new(FRAME);
        transport.push_read(transport.command_in(ResponseTag::GetProperty, &[1]));
        transport.push_read(
            transport.command_in(ResponseTag::GetProperty, &[0, 0x4b030000]),
        );
        let mut client = McuBoot::new(transport);

        assert_eq!(
            client.get_property(Property::FlashStartAddress, 4).unwrap(),
            Vec::<u32>::new()
        );
        assert_eq!(
            client.get_property(Property::CurrentVersion, 0).unwrap(),
            vec![0x4b030000]
        );

        let written = client.transport().reports_written();
        let cmd = Response::from_bytes(&written[0].payload);
        assert_eq!(cmd.header().tag, CommandTag::GetProperty.as_u8());
        assert_eq!(cmd.params(), &[3, 4]);
    }

    #[test]
    fn test_set_property() {
        let mut transport = MockTransport::new(FRAME);
        transport.push_read(generic(&transport, StatusCode::Success, CommandTag::SetProperty));
        let mut client = McuBoot::new(transport);

        assert!(client.set_property(Property::VerifyWrites, 1).unwrap());
        let written = client.transport().reports_written();
        let cmd = Response::from_bytes(&written[0].payload);
        assert_eq!(cmd.params(), &[10, 1]);
    }

    #[test]
    fn test_send_data_chunks() {
        let data: Vec<u8> = (0..1000u32).map(|i| i as u8).collect();
        let mut transport = MockTransport::new(FRAME);
        transport.push_read(generic(&transport, StatusCode::Success, CommandTag::WriteMemory));
        let mut client = McuBoot::new(transport);

        let mut progress = Vec::new();
        assert!(client.send_data(&data, Some(&mut |p| progress.push(p))).unwrap());
        assert_eq!(progress, vec![0.0, 1.0]);

        let written = client.transport().reports_written();
        assert_eq!(written.len(), data.len().div_ceil(FRAME - 4));
        assert!(written.iter().all(|r| r.id == ReportId::DataOut));
        let sent: Vec<u8> = written.into_iter().flat_map(|r| r.payload).collect();
        assert_eq!(sent, data);
    }

    #[test]
    fn test_send_data_partial_acceptance() {
        let data: Vec<u8> = (0..95u8).collect();
        let mut transport = MockTransport::new(FRAME).with_accept(|frame| {
            let len = u16::from_le_bytes([frame[2], frame[3]]) as usize;
            REPORT_HEADER_LEN + len.min(10)
        });
        transport.push_read(generic(&transport, StatusCode::Success, CommandTag::ReceiveSbFile));
        let mut client = McuBoot::new(transport);

        assert!(client.send_data(&data, None).unwrap());

        let written = client.transport().reports_written();
        assert_eq!(written.len(), 10);
        let accepted: Vec<u8> = written
            .iter()
            .flat_map(|r| r.payload.iter().take(10).copied())
            .collect();
        assert_eq!(accepted, data);
    }

    #[test]
    fn test_send_data_stalled() {
        let transport = MockTransport::new(FRAME).with_accept(|_| REPORT_HEADER_LEN);
        let mut client = McuBoot::new(transport);

        assert!(matches!(
            client.send_data(&[1, 2, 3], None),
            Err(MbootError::TransferStalled { sent: 0, total: 3 })
        ));
    }

    #[test]
    fn test_send_data_progress_throttle() {
        let data = vec![0x5a; (FRAME - 4) * 2 * PROGRESS_THROTTLE];
        let mut transport = MockTransport::new(FRAME);
        transport.push_read(generic(&transport, StatusCode::Success, CommandTag::WriteMemory));
        let mut client = McuBoot::new(transport);

        let mut progress = Vec::new();
        client.send_data(&data, Some(&mut |p| progress.push(p))).unwrap();
        assert_eq!(progress, vec![0.0, 0.5, 1.0, 1.0]);
    }

    #[test]
    fn test_send_data_final_status_error() {
        let mut transport = MockTransport::new(FRAME);
        transport.push_read(generic(
            &transport,
            StatusCode::MemoryWriteFailed,
            CommandTag::WriteMemory,
        ));
        let mut client = McuBoot::new(transport);

        let err = client.send_data(&[0; 8], None).unwrap_err();
        assert_eq!(err.status_code(), Some(10202));
    }

    fn scripted_read(transport: &mut MockTransport, terminal_status: StatusCode) {
        for i in 0..3u8 {
            transport.push_read(transport.data_in(&[i; 20]));
        }
        transport.push_read(generic(transport, terminal_status, CommandTag::ReadMemory));
    }

    #[test]
    fn test_read_data_collects_frames() {
        let mut transport = MockTransport::new(FRAME);
        scripted_read(&mut transport, StatusCode::Success);
        let mut client = McuBoot::new(transport);

        let mut progress = Vec::new();
        let data = client
            .read_data(CommandTag::ReadMemory, 60, Some(&mut |p| progress.push(p)))
            .unwrap();
        assert_eq!(data.len(), 60);
        assert_eq!(&data[..20], &[0; 20]);
        assert_eq!(&data[40..], &[2; 20]);
        assert_eq!(progress.len(), 4);
        assert_eq!(progress.last(), Some(&1.0));
    }

    #[test]
    fn test_read_data_short_transfer() {
        let mut transport = MockTransport::new(FRAME);
        scripted_read(&mut transport, StatusCode::Success);
        let mut client = McuBoot::new(transport);

        assert!(matches!(
            client.read_data(CommandTag::ReadMemory, 61, None),
            Err(MbootError::ShortTransfer {
                expected: 61,
                actual: 60
            })
        ));
    }

    #[test]
    fn test_read_data_not_trimmed() {
        let mut transport = MockTransport::new(FRAME);
        scripted_read(&mut transport, StatusCode::Success);
        let mut client = McuBoot::new(transport);

        let data = client.read_data(CommandTag::ReadMemory, 50, None).unwrap();
        assert_eq!(data.len(), 60);
    }

    #[test]
    fn test_read_data_skips_responses_for_other_commands() {
        let mut transport = MockTransport::new(FRAME);
        transport.push_read(transport.data_in(&[1; 20]));
        transport.push_read(generic(&transport, StatusCode::Fail, CommandTag::GetProperty));
        transport.push_read(transport.data_in(&[2; 20]));
        transport.push_read(generic(&transport, StatusCode::Success, CommandTag::ReadMemory));
        let mut client = McuBoot::new(transport);

        let data = client.read_data(CommandTag::ReadMemory, 40, None).unwrap();
        assert_eq!(&data[..20], &[1; 20]);
        assert_eq!(&data[20..], &[2; 20]);
    }

    #[test]
    fn test_read_data_terminal_status_error() {
        let mut transport = MockTransport::new(FRAME);
        scripted_read(&mut transport, StatusCode::MemoryReadFailed);
        let mut client = McuBoot::new(transport);

        let err = client.read_data(CommandTag::ReadMemory, 60, None).unwrap_err();
        assert_eq!(err.status_code(), Some(10201));
    }

    #[test]
    fn test_read_memory() {
        let mut transport = MockTransport::new(FRAME);
        transport.push_read(transport.command_in(ResponseTag::ReadMemory, &[0, 60]));
        scripted_read(&mut transport, StatusCode::Success);
        let mut client = McuBoot::new(transport);

        let data = client.read_memory(0x1000, 60, 0, None).unwrap();
        assert_eq!(data.len(), 60);

        let written = client.transport().reports_written();
        assert_eq!(written.len(), 1);
        let cmd = Response::from_bytes(&written[0].payload);
        assert_eq!(cmd.header().tag, CommandTag::ReadMemory.as_u8());
        assert_eq!(cmd.params(), &[0x1000, 60, 0]);
    }

    #[test]
    fn test_write_memory() {
        let mut transport = MockTransport::new(FRAME);
        transport.push_read(generic(&transport, StatusCode::Success, CommandTag::WriteMemory));
        transport.push_read(generic(&transport, StatusCode::Success, CommandTag::WriteMemory));
        let mut client = McuBoot::new(transport);

        assert!(client.write_memory(0x8000, &[0xaa; 100], 0, None).unwrap());

        let written = client.transport().reports_written();
        assert_eq!(written.len(), 3);
        let cmd = Response::from_bytes(&written[0].payload);
        assert_eq!(cmd.header().flags, CommandFlags::HAS_DATA_PHASE);
        assert_eq!(cmd.params(), &[0x8000, 100, 0]);
        assert_eq!(written[1].payload.len(), 60);
        assert_eq!(written[2].payload.len(), 40);
    }

    #[test]
    fn test_flash_read_once() {
        let mut transport = MockTransport::new(FRAME);
        transport.push_read(transport.command_in(
            ResponseTag::FlashReadOnce,
            &[0, 4, 0x44332211, 0xffffffff],
        ));
        let mut client = McuBoot::new(transport);

        assert_eq!(
            client.flash_read_once(1, 4).unwrap(),
            vec![0x11, 0x22, 0x33, 0x44]
        );
    }

    #[test]
    fn test_key_prov_read_key_store() {
        let mut transport = MockTransport::new(FRAME);
        transport.push_read(transport.command_in(ResponseTag::KeyProvisioning, &[0, 20]));
        transport.push_read(transport.data_in(&[0x5a; 20]));
        transport.push_read(generic(
            &transport,
            StatusCode::Success,
            CommandTag::KeyProvisioning,
        ));
        let mut client = McuBoot::new(transport);

        assert_eq!(client.key_prov_read_key_store(None).unwrap(), vec![0x5a; 20]);
        let written = client.transport().reports_written();
        let cmd = Response::from_bytes(&written[0].payload);
        assert_eq!(cmd.params(), &[KeyProvOperation::ReadKeyStore as u32]);
    }

    /// Decode the command frame written at `index`
    fn command_sent(client: &McuBoot<MockTransport>, index: usize) -> Response {
        let written = client.transport().reports_written();
        assert_eq!(written[index].id, ReportId::CommandOut);
        Response::from_bytes(&written[index].payload)
    }

    fn acked(tag: CommandTag, frames: usize) -> MockTransport {
        let mut transport = MockTransport::new(FRAME);
        for _ in 0..frames {
            transport.push_read(generic(&transport, StatusCode::Success, tag));
        }
        transport
    }

    #[test]
    fn test_receive_sb_file() {
        let mut client = McuBoot::new(acked(CommandTag::ReceiveSbFile, 2));

        assert!(client.receive_sb_file(&[0x11; 70], None).unwrap());

        let cmd = command_sent(&client, 0);
        assert_eq!(cmd.header().tag, CommandTag::ReceiveSbFile.as_u8());
        assert_eq!(cmd.header().flags, CommandFlags::HAS_DATA_PHASE);
        assert_eq!(cmd.params(), &[70]);
        let written = client.transport().reports_written();
        assert_eq!(written.len(), 3);
        assert!(written[1..].iter().all(|r| r.id == ReportId::DataOut));
    }

    #[test]
    fn test_key_prov_set_user_key() {
        let mut client = McuBoot::new(acked(CommandTag::KeyProvisioning, 2));

        assert!(client.key_prov_set_user_key(3, &[0xc3; 32], None).unwrap());

        let cmd = command_sent(&client, 0);
        assert_eq!(cmd.header().tag, CommandTag::KeyProvisioning.as_u8());
        assert_eq!(cmd.header().flags, CommandFlags::HAS_DATA_PHASE);
        assert_eq!(cmd.params(), &[KeyProvOperation::SetUserKey as u32, 3, 32]);
        let written = client.transport().reports_written();
        assert_eq!(written[1].payload, vec![0xc3; 32]);
    }

    #[test]
    fn test_key_prov_write_key_store() {
        let mut client = McuBoot::new(acked(CommandTag::KeyProvisioning, 2));

        assert!(client.key_prov_write_key_store(&[0x5a; 40], None).unwrap());

        let cmd = command_sent(&client, 0);
        assert_eq!(cmd.header().flags, CommandFlags::HAS_DATA_PHASE);
        assert_eq!(cmd.params(), &[KeyProvOperation::WriteKeyStore as u32]);
    }

    #[test]
    fn test_commands_without_data_out_clear_flags() {
        let mut client = McuBoot::new(acked(CommandTag::KeyProvisioning, 1));

        assert!(client.key_prov_set_intrinsic_key(2, 256).unwrap());

        let cmd = command_sent(&client, 0);
        assert_eq!(cmd.header().flags, CommandFlags::NONE);
        assert_eq!(
            cmd.params(),
            &[KeyProvOperation::SetIntrinsicKey as u32, 2, 256]
        );
    }

    #[test]
    fn test_flash_security_disable_key_words() {
        let mut client = McuBoot::new(acked(CommandTag::FlashSecurityDisable, 1));

        assert!(
            client
                .flash_security_disable(&[1, 2, 3, 4, 5, 6, 7, 8])
                .unwrap()
        );

        let cmd = command_sent(&client, 0);
        assert_eq!(cmd.header().tag, CommandTag::FlashSecurityDisable.as_u8());
        assert_eq!(cmd.header().flags, CommandFlags::NONE);
        assert_eq!(cmd.params(), &[0x04030201, 0x08070605]);
    }

    #[test]
    fn test_flash_read_resource() {
        let mut transport = MockTransport::new(FRAME);
        transport.push_read(transport.command_in(ResponseTag::FlashReadResource, &[0, 24]));
        transport.push_read(transport.data_in(&[0xa5; 24]));
        transport.push_read(generic(
            &transport,
            StatusCode::Success,
            CommandTag::FlashReadResource,
        ));
        let mut client = McuBoot::new(transport);

        assert_eq!(
            client.flash_read_resource(0x400, 24, 1, None).unwrap(),
            vec![0xa5; 24]
        );

        let cmd = command_sent(&client, 0);
        assert_eq!(cmd.header().tag, CommandTag::FlashReadResource.as_u8());
        assert_eq!(cmd.header().flags, CommandFlags::NONE);
        assert_eq!(cmd.params(), &[0x400, 24, 1]);
        assert_eq!(client.transport().reports_written().len(), 1);
    }

    #[test]
    fn test_flash_read_resource_ends_on_its_own_response() {
        let mut transport = MockTransport::new(FRAME);
        transport.push_read(transport.command_in(ResponseTag::FlashReadResource, &[0, 8]));
        transport.push_read(transport.data_in(&[1; 8]));
        transport.push_read(generic(&transport, StatusCode::Success, CommandTag::ReadMemory));
        transport.push_read(generic(
            &transport,
            StatusCode::Success,
            CommandTag::FlashReadResource,
        ));
        let mut client = McuBoot::new(transport);

        assert_eq!(
            client.flash_read_resource(0, 8, 0, None).unwrap(),
            vec![1; 8]
        );
    }

    #[test]
    fn test_reset_closes_transport() {
        let mut transport = MockTransport::new(FRAME);
        transport.push_read(generic(&transport, StatusCode::Success, CommandTag::Reset));
        let closed = transport.closed_flag();

        McuBoot::new(transport).reset().unwrap();
        assert!(closed.get());
    }
}
