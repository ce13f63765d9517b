use crate::command::CommandTag;
use crate::status::{StatusCode, status_name};

pub const HEADER_LEN: usize = 4;

/// Packet header shared by commands and responses
///
/// Byte 2 is reserved and always encoded as zero.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Header {
    pub tag: u8,
    pub flags: u8,
    pub param_count: u8,
}

impl Header {
    pub fn new(tag: u8, flags: u8, param_count: u8) -> Self {
        Header {
            tag,
            flags,
            param_count,
        }
    }

    pub fn to_bytes(&self) -> [u8; HEADER_LEN] {
        [self.tag, self.flags, 0, self.param_count]
    }

    /// Decode a header from the first four bytes of `bytes`.
    /// Missing bytes read as zero.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        let byte = |i: usize| bytes.get(i).copied().unwrap_or(0);
        Header {
            tag: byte(0),
            flags: byte(1),
            param_count: byte(3),
        }
    }
}

pub fn encode_params(params: &[u32]) -> Vec<u8> {
    params.iter().flat_map(|p| p.to_le_bytes()).collect()
}

/// Decode little-endian words. Trailing bytes that do not form a full
/// word are ignored.
pub fn decode_params(bytes: &[u8]) -> Vec<u32> {
    bytes
        .chunks_exact(4)
        .map(|w| u32::from_le_bytes([w[0], w[1], w[2], w[3]]))
        .collect()
}

/// Command packet: header followed by `param_count` parameter words
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommandPacket {
    header: Header,
    params: Vec<u32>,
}

impl CommandPacket {
    /// Build a command packet. The parameter count is derived from `params`,
    /// which may hold at most 255 words.
    pub fn new(tag: CommandTag, flags: u8, params: &[u32]) -> Self {
        Self::with_raw_tag(tag.as_u8(), flags, params)
    }

    pub fn with_raw_tag(tag: u8, flags: u8, params: &[u32]) -> Self {
        debug_assert!(params.len() <= u8::MAX as usize);
        CommandPacket {
            header: Header::new(tag, flags, params.len() as u8),
            params: params.to_vec(),
        }
    }

    pub fn header(&self) -> &Header {
        &self.header
    }

    pub fn params(&self) -> &[u32] {
        &self.params
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(HEADER_LEN + 4 * self.params.len());
        bytes.extend_from_slice(&self.header.to_bytes());
        bytes.extend(encode_params(&self.params));
        bytes
    }
}

/// Bootloader response
///
/// A single record for all response kinds. The kind-specific accessors
/// ([Response::command_tag], [Response::values], [Response::declared_length],
/// [Response::raw_bytes]) are views over the same parameter list and require
/// it to be long enough for that kind; they panic otherwise, like slice
/// indexing does. Word 0 is always the status.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Response {
    header: Header,
    params: Vec<u32>,
}

impl Response {
    pub fn new(header: Header, params: Vec<u32>) -> Self {
        Response { header, params }
    }

    pub fn from_bytes(bytes: &[u8]) -> Self {
        let header = Header::from_bytes(bytes);
        let params = decode_params(bytes.get(HEADER_LEN..).unwrap_or(&[]));
        Response { header, params }
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = self.header.to_bytes().to_vec();
        bytes.extend(encode_params(&self.params));
        bytes
    }

    pub fn header(&self) -> &Header {
        &self.header
    }

    pub fn params(&self) -> &[u32] {
        &self.params
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    pub fn status(&self) -> u32 {
        self.params[0]
    }

    pub fn status_name(&self) -> &'static str {
        status_name(self.status())
    }

    pub fn success(&self) -> bool {
        self.status() == StatusCode::Success as u32
    }

    /// Tag of the command this generic response answers
    pub fn command_tag(&self) -> u32 {
        self.params[1]
    }

    /// Property values of a `GetProperty` response
    pub fn values(&self) -> &[u32] {
        &self.params[1..]
    }

    /// Length of the data phase announced by a `ReadMemory`,
    /// `FlashReadResource` or `KeyProvisioning` response
    pub fn declared_length(&self) -> u32 {
        self.params[1]
    }

    /// Data of a `FlashReadOnce` response, words 2.. as little-endian bytes
    pub fn raw_bytes(&self) -> Vec<u8> {
        encode_params(&self.params[2..])
    }
}
