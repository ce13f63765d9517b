wire_enum! {
    /// Bootloader property identifier, used with `GetProperty`/`SetProperty`
    pub enum Property {
        CurrentVersion = 0x01,
        AvailablePeripherals = 0x02,
        FlashStartAddress = 0x03,
        FlashSize = 0x04,
        FlashSectorSize = 0x05,
        FlashBlockCount = 0x06,
        AvailableCommands = 0x07,
        CrcCheckStatus = 0x08,
        LastError = 0x09,
        VerifyWrites = 0x0a,
        MaxPacketSize = 0x0b,
        ReservedRegions = 0x0c,
        ValidateRegions = 0x0d,
        RamStartAddress = 0x0e,
        RamSize = 0x0f,
        SystemDeviceId = 0x10,
        FlashSecurityState = 0x11,
        UniqueDeviceId = 0x12,
        FlashFacSupport = 0x13,
        FlashAccessSegmentSize = 0x14,
        FlashAccessSegmentCount = 0x15,
        FlashReadMargin = 0x16,
        QspiInitStatus = 0x17,
        TargetVersion = 0x18,
        ExternalMemoryAttributes = 0x19,
        ReliableUpdateStatus = 0x1a,
        FlashPageSize = 0x1b,
        IrqNotifierPin = 0x1c,
        PfrKeyStoreUpdateOpt = 0x1d,
    }
}

impl Property {
    /// Parse a property given either by name (case-insensitive) or number
    pub fn parse(s: &str) -> Option<Self> {
        let num = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
            Some(hex) => u32::from_str_radix(hex, 16).ok(),
            None => s.parse::<u32>().ok(),
        };
        match num {
            Some(code) => Property::from_code(code),
            None => (1..=0x1d)
                .filter_map(Property::from_code)
                .find(|p| p.name().eq_ignore_ascii_case(s)),
        }
    }
}
