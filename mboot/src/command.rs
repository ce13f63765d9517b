wire_enum! {
    /// Command tag, byte 0 of a command packet
    pub enum CommandTag {
        FlashEraseAll = 0x01,
        FlashEraseRegion = 0x02,
        ReadMemory = 0x03,
        WriteMemory = 0x04,
        FillMemory = 0x05,
        FlashSecurityDisable = 0x06,
        GetProperty = 0x07,
        ReceiveSbFile = 0x08,
        Execute = 0x09,
        Call = 0x0a,
        Reset = 0x0b,
        SetProperty = 0x0c,
        FlashEraseAllUnsecure = 0x0d,
        FlashProgramOnce = 0x0e,
        FlashReadOnce = 0x0f,
        FlashReadResource = 0x10,
        ConfigureMemory = 0x11,
        ReliableUpdate = 0x12,
        GenerateKeyBlob = 0x13,
        KeyProvisioning = 0x15,
    }
}

wire_enum! {
    /// Response tag, byte 0 of a response packet
    pub enum ResponseTag {
        Generic = 0xa0,
        ReadMemory = 0xa3,
        GetProperty = 0xa7,
        FlashReadOnce = 0xaf,
        FlashReadResource = 0xb0,
        KeyProvisioning = 0xb5,
    }
}

wire_enum! {
    /// Operation selector, parameter 0 of a `KeyProvisioning` command
    pub enum KeyProvOperation {
        Enroll = 0,
        SetUserKey = 1,
        SetIntrinsicKey = 2,
        WriteNonVolatile = 3,
        ReadNonVolatile = 4,
        WriteKeyStore = 5,
        ReadKeyStore = 6,
    }
}

/// Command packet flags (byte 1 of the header)
pub struct CommandFlags;

impl CommandFlags {
    pub const NONE: u8 = 0;
    /// The command is followed by a data-out phase
    pub const HAS_DATA_PHASE: u8 = 1 << 0;
}

impl CommandTag {
    pub fn as_u8(self) -> u8 {
        self as u8
    }
}
