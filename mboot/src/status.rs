wire_enum! {
    /// Status code returned in word 0 of every response
    pub enum StatusCode {
        Success = 0,
        Fail = 1,
        ReadOnly = 2,
        OutOfRange = 3,
        InvalidArgument = 4,
        Timeout = 5,
        NoTransferInProgress = 6,

        FlashSizeError = 100,
        FlashAlignmentError = 101,
        FlashAddressError = 102,
        FlashAccessError = 103,
        FlashProtectionViolation = 104,
        FlashCommandFailure = 105,
        FlashUnknownProperty = 106,
        FlashRegionExecuteOnly = 108,
        FlashExecInRamNotReady = 109,
        FlashCommandNotSupported = 111,
        FlashOutOfDateCfpaPage = 132,

        I2cTxUnderrun = 200,
        I2cRxOverrun = 201,
        I2cArbitrationLost = 202,

        SpiTxUnderrun = 300,
        SpiRxOverrun = 301,

        QspiFlashSizeError = 400,
        QspiFlashAlignmentError = 401,
        QspiFlashAddressError = 402,
        QspiFlashCommandError = 403,
        QspiFlashUnknownProperty = 404,
        QspiNotConfigured = 405,
        QspiCommandNotSupported = 406,
        QspiCommandTimeout = 407,
        QspiWriteFailure = 408,

        OtfadSecurityViolation = 500,
        OtfadLogicallyDisabled = 501,
        OtfadInvalidKey = 502,
        OtfadInvalidKeyBlob = 503,

        UnknownCommand = 10000,
        SecurityViolation = 10001,
        AbortDataPhase = 10002,
        PingError = 10003,
        NoResponse = 10004,
        NoResponseExpected = 10005,
        UnsupportedCommand = 10006,

        SbSectionOverrun = 10100,
        SbSignatureBad = 10101,
        SbSectionLength = 10102,
        SbUnencryptedOnly = 10103,
        SbEofReached = 10104,
        SbChecksumBad = 10105,
        SbCrc32Bad = 10106,
        SbUnknownCommand = 10107,
        SbIdNotFound = 10108,
        SbDataUnderrun = 10109,
        SbJumpReturned = 10110,
        SbCallFailed = 10111,
        SbKeyNotFound = 10112,
        SbSecureOnly = 10113,
        SbResetReturned = 10114,
        SbRollbackBlocked = 10115,
        SbInvalidSectionMacCount = 10116,
        SbUnexpectedCommand = 10117,

        MemoryRangeInvalid = 10200,
        MemoryReadFailed = 10201,
        MemoryWriteFailed = 10202,
        MemoryCumulativeWrite = 10203,
        MemoryNotConfigured = 10205,

        UnknownProperty = 10300,
        ReadOnlyProperty = 10301,
        InvalidPropertyValue = 10302,

        AppCrcPassed = 10400,
        AppCrcFailed = 10401,
        AppCrcInactive = 10402,
        AppCrcInvalid = 10403,
        AppCrcOutOfRange = 10404,
    }
}

/// Symbolic name of a raw status word, `"Unknown"` for codes outside the table
pub fn status_name(code: u32) -> &'static str {
    StatusCode::from_code(code).map_or("Unknown", StatusCode::name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_names() {
        assert_eq!(status_name(0), "Success");
        assert_eq!(status_name(3), "OutOfRange");
        assert_eq!(status_name(10104), "SbEofReached");
        assert_eq!(status_name(107), "Unknown");
        assert_eq!(StatusCode::QspiWriteFailure.to_string(), "QspiWriteFailure (408)");
    }

    #[test]
    fn test_status_codes_convert() {
        assert_eq!(StatusCode::try_from(10300), Ok(StatusCode::UnknownProperty));
        assert_eq!(StatusCode::try_from(7), Err(7));
        assert_eq!(u32::from(StatusCode::FlashOutOfDateCfpaPage), 132);
    }
}
