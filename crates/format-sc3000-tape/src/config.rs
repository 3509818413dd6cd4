//! Tape record configuration.
//!
//! All timing is derived from the 19.2 kHz output sample rate, which gives
//! exactly 16 samples per tape bit (1200 baud).

use std::fmt;

use crate::error::{Result, TapeError};

/// Output sample rate in Hz.
pub const SAMPLE_RATE: u32 = 19_200;

/// Samples emitted per tape bit.
pub const SAMPLES_PER_BIT: usize = 16;

/// Bits per framed byte: start bit, 8 data bits, 2 stop bits.
pub const BITS_PER_BYTE: usize = 11;

/// `1` bits in each leader tone.
pub const LEADER_BITS: usize = 3600;

/// Silence before the header leader and after the data record (ms).
pub const EDGE_SILENCE_MS: u32 = 10;

/// Silence between the header and data records (ms).
pub const RECORD_GAP_MS: u32 = 1000;

/// Fixed width of the name field in the header record.
pub const NAME_LEN: usize = 16;

/// Largest program the 16-bit length field can describe.
pub const MAX_PROGRAM_LEN: usize = 0xFFFF;

/// What kind of program the tape carries.
///
/// The start address only exists for machine code, so it lives inside that
/// variant rather than next to the mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TapeMode {
    /// Executable binary loaded and run at `start_address`.
    MachineCode { start_address: u16 },
    /// Tokenised BASIC program.
    Basic,
}

/// Record type announced by the header key-code, before any field is read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TapeKind {
    MachineCode,
    Basic,
}

impl TapeKind {
    /// Look up the kind from a header key-code.
    #[must_use]
    pub fn from_header_key_code(code: u8) -> Option<Self> {
        [Self::MachineCode, Self::Basic]
            .into_iter()
            .find(|kind| kind.header_key_code() == code)
    }

    #[must_use]
    pub fn header_key_code(self) -> u8 {
        match self {
            Self::MachineCode => 0x26,
            Self::Basic => 0x16,
        }
    }

    #[must_use]
    pub fn data_key_code(self) -> u8 {
        match self {
            Self::MachineCode => 0x27,
            Self::Basic => 0x17,
        }
    }
}

impl TapeMode {
    #[must_use]
    pub fn kind(self) -> TapeKind {
        match self {
            Self::MachineCode { .. } => TapeKind::MachineCode,
            Self::Basic => TapeKind::Basic,
        }
    }

    /// Key-code that opens the header record.
    #[must_use]
    pub fn header_key_code(self) -> u8 {
        self.kind().header_key_code()
    }

    /// Key-code that opens the data record.
    #[must_use]
    pub fn data_key_code(self) -> u8 {
        self.kind().data_key_code()
    }

    #[must_use]
    pub fn start_address(self) -> Option<u16> {
        match self {
            Self::MachineCode { start_address } => Some(start_address),
            Self::Basic => None,
        }
    }

    /// Bytes in the header record between the key-code and the parity byte.
    #[must_use]
    pub fn header_field_len(self) -> usize {
        match self {
            Self::MachineCode { .. } => NAME_LEN + 4,
            Self::Basic => NAME_LEN + 2,
        }
    }
}

/// The 16-byte name field, space padded or truncated.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct TapeName([u8; NAME_LEN]);

impl TapeName {
    /// Build a name field from arbitrary bytes. Bytes past index 15 are
    /// never examined.
    #[must_use]
    pub fn new(name: &[u8]) -> Self {
        let mut field = [b' '; NAME_LEN];
        for (slot, &byte) in field.iter_mut().zip(name) {
            *slot = byte;
        }
        Self(field)
    }

    /// Wrap a raw field read back from tape.
    #[must_use]
    pub fn from_field(field: [u8; NAME_LEN]) -> Self {
        Self(field)
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8; NAME_LEN] {
        &self.0
    }
}

impl fmt::Display for TapeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(String::from_utf8_lossy(&self.0).trim_end())
    }
}

impl fmt::Debug for TapeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TapeName({:?})", String::from_utf8_lossy(&self.0))
    }
}

/// Program bytes whose length is known to fit the 16-bit length field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgramImage {
    bytes: Vec<u8>,
}

impl ProgramImage {
    /// Wrap program bytes.
    ///
    /// # Errors
    ///
    /// Returns `InputTooLarge` if the program is longer than 65535 bytes.
    pub fn new(bytes: Vec<u8>) -> Result<Self> {
        if bytes.len() > MAX_PROGRAM_LEN {
            return Err(TapeError::InputTooLarge { len: bytes.len() });
        }
        Ok(Self { bytes })
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Length as stored in the header. Cannot truncate: checked on construction.
    #[must_use]
    pub fn len_u16(&self) -> u16 {
        self.bytes.len() as u16
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Configuration for one tape file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TapeConfig {
    pub mode: TapeMode,
    pub name: TapeName,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_name_is_space_padded() {
        let name = TapeName::new(b"TEST");
        assert_eq!(name.as_bytes(), b"TEST            ");
        assert_eq!(name.to_string(), "TEST");
    }

    #[test]
    fn long_name_is_truncated() {
        let name = TapeName::new(b"ABCDEFGHIJKLMNOPQRSTUVWXYZ");
        assert_eq!(name.as_bytes(), b"ABCDEFGHIJKLMNOP");
    }

    #[test]
    fn empty_name_is_all_spaces() {
        assert_eq!(TapeName::new(b"").as_bytes(), &[b' '; NAME_LEN]);
    }

    #[test]
    fn key_codes_per_mode() {
        let mc = TapeMode::MachineCode {
            start_address: 0x8000,
        };
        assert_eq!(mc.header_key_code(), 0x26);
        assert_eq!(mc.data_key_code(), 0x27);
        assert_eq!(mc.start_address(), Some(0x8000));
        assert_eq!(TapeMode::Basic.header_key_code(), 0x16);
        assert_eq!(TapeMode::Basic.data_key_code(), 0x17);
        assert_eq!(TapeMode::Basic.start_address(), None);
    }

    #[test]
    fn kind_from_header_key_code() {
        assert_eq!(
            TapeKind::from_header_key_code(0x26),
            Some(TapeKind::MachineCode)
        );
        assert_eq!(TapeKind::from_header_key_code(0x16), Some(TapeKind::Basic));
        // Data key-codes never open a header
        assert_eq!(TapeKind::from_header_key_code(0x27), None);
        assert_eq!(TapeKind::from_header_key_code(0x17), None);
        assert_eq!(TapeKind::from_header_key_code(0x00), None);
        assert_eq!(TapeMode::Basic.kind(), TapeKind::Basic);
    }

    #[test]
    fn program_length_limit() {
        let max = ProgramImage::new(vec![0; MAX_PROGRAM_LEN]).expect("65535 bytes fits");
        assert_eq!(max.len_u16(), 0xFFFF);

        let err = ProgramImage::new(vec![0; MAX_PROGRAM_LEN + 1]).unwrap_err();
        assert!(matches!(err, TapeError::InputTooLarge { len: 65536 }));
    }

    #[test]
    fn samples_per_bit_matches_rate() {
        // 1200 baud
        assert_eq!(SAMPLE_RATE as usize / SAMPLES_PER_BIT, 1200);
    }
}
