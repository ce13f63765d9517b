use crate::MbootError;

/// Size of the report header: report id, padding byte and payload length
pub const REPORT_HEADER_LEN: usize = 4;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum ReportId {
    CommandOut = 0x01,
    DataOut = 0x02,
    CommandIn = 0x03,
    DataIn = 0x04,
}

impl TryFrom<u8> for ReportId {
    type Error = MbootError;

    fn try_from(id: u8) -> Result<Self, MbootError> {
        match id {
            0x01 => Ok(ReportId::CommandOut),
            0x02 => Ok(ReportId::DataOut),
            0x03 => Ok(ReportId::CommandIn),
            0x04 => Ok(ReportId::DataIn),
            other => Err(MbootError::InvalidReportId(other)),
        }
    }
}

/// HID report carrying a command, a response or one chunk of a data phase
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HidReport {
    pub id: ReportId,
    pub payload: Vec<u8>,
}

/// Number of payload bytes a frame of `frame_size` bytes can carry
pub fn max_payload(frame_size: usize) -> usize {
    frame_size.saturating_sub(REPORT_HEADER_LEN)
}

/// Wrap `payload` into a frame of exactly `frame_size` bytes.
///
/// Payloads longer than the frame can carry are truncated, splitting a
/// transfer into frames is up to the caller.
pub fn encode_report(id: ReportId, payload: &[u8], frame_size: usize) -> Vec<u8> {
    let len = payload.len().min(max_payload(frame_size)).min(u16::MAX as usize);
    let mut frame = vec![0u8; frame_size.max(REPORT_HEADER_LEN)];
    frame[0] = id as u8;
    frame[1] = 0;
    frame[2..4].copy_from_slice(&(len as u16).to_le_bytes());
    frame[REPORT_HEADER_LEN..REPORT_HEADER_LEN + len].copy_from_slice(&payload[..len]);
    frame
}

/// Unwrap a frame read from the transport.
///
/// The declared length is clamped to the bytes actually present.
pub fn decode_report(frame: &[u8]) -> Result<HidReport, MbootError> {
    let id = ReportId::try_from(frame.first().copied().unwrap_or(0))?;
    let len = match frame.get(2..4) {
        Some(len) => u16::from_le_bytes([len[0], len[1]]) as usize,
        None => 0,
    };
    let end = (REPORT_HEADER_LEN + len).min(frame.len());
    let payload = frame.get(REPORT_HEADER_LEN..end).unwrap_or(&[]).to_vec();
    Ok(HidReport { id, payload })
}
