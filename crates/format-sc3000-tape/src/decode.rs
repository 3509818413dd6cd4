//! Tape reader: recovers the records from a sample stream.
//!
//! Works on the clean square wave this crate produces, not on recordings
//! of real cassettes. Each 16-sample cell is classified by counting level
//! changes: a `1` cell has three, a `0` cell has one. Silence between
//! records is skipped, and the leader tone ends at the first `0` bit,
//! which is the start bit of the key-code.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use crate::config::{NAME_LEN, SAMPLES_PER_BIT, TapeKind, TapeMode, TapeName};
use crate::error::{Result, TapeError};
use crate::modulator::{Checksum, LEVEL_SILENCE};
use crate::wav::WAV_SPEC;

/// The contents of one tape file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TapeImage {
    pub mode: TapeMode,
    pub name: TapeName,
    pub program: Vec<u8>,
    /// Parity bytes as read from the header and data records.
    pub header_parity: u8,
    pub data_parity: u8,
}

impl TapeImage {
    /// Parse a tape file from unsigned 8-bit samples.
    ///
    /// # Errors
    ///
    /// Returns an error if the stream is truncated, a frame is malformed, a
    /// key-code is unknown, or a record checksum does not match.
    pub fn parse(samples: &[u8]) -> Result<Self> {
        let mut reader = BitReader::new(samples);

        reader.sync()?;
        let code = reader.read_byte()?;
        let kind =
            TapeKind::from_header_key_code(code).ok_or(TapeError::UnknownKeyCode { code })?;

        let mut record = Record::new(&mut reader);
        let mut name = [0u8; NAME_LEN];
        for slot in &mut name {
            *slot = record.byte()?;
        }
        let program_len = record.u16_be()?;
        let mode = match kind {
            TapeKind::MachineCode => TapeMode::MachineCode {
                start_address: record.u16_be()?,
            },
            TapeKind::Basic => TapeMode::Basic,
        };
        let header_parity = record.close("header")?;

        reader.sync()?;
        let code = reader.read_byte()?;
        if code != mode.data_key_code() {
            return Err(TapeError::UnknownKeyCode { code });
        }

        let mut record = Record::new(&mut reader);
        let mut program = Vec::with_capacity(usize::from(program_len));
        for _ in 0..program_len {
            program.push(record.byte()?);
        }
        let data_parity = record.close("data")?;

        Ok(Self {
            mode,
            name: TapeName::from_field(name),
            program,
            header_parity,
            data_parity,
        })
    }

    /// Read a tape file from a WAV container.
    pub fn from_wav<R: Read>(reader: R) -> Result<Self> {
        let mut wav =
            hound::WavReader::new(reader).map_err(|e| TapeError::InvalidContainer(e.to_string()))?;
        let spec = wav.spec();
        if spec != WAV_SPEC {
            return Err(TapeError::InvalidContainer(format!(
                "expected 8-bit mono {} Hz PCM, found {}-bit {}-channel {} Hz",
                WAV_SPEC.sample_rate, spec.bits_per_sample, spec.channels, spec.sample_rate
            )));
        }
        let samples = wav
            .samples::<i8>()
            .map(|s| s.map(|s| (s as u8) ^ 0x80))
            .collect::<std::result::Result<Vec<u8>, _>>()
            .map_err(|e| TapeError::InvalidContainer(e.to_string()))?;
        Self::parse(&samples)
    }

    /// Read a tape file from a WAV file on disk.
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|source| TapeError::InputUnreadable {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_wav(BufReader::new(file))
    }
}

/// Bytes of one record between the key-code and the parity byte.
struct Record<'r, 'a> {
    reader: &'r mut BitReader<'a>,
    checksum: Checksum,
}

impl<'r, 'a> Record<'r, 'a> {
    fn new(reader: &'r mut BitReader<'a>) -> Self {
        Self {
            reader,
            checksum: Checksum::new(),
        }
    }

    fn byte(&mut self) -> Result<u8> {
        let value = self.reader.read_byte()?;
        self.checksum.add(value);
        Ok(value)
    }

    fn u16_be(&mut self) -> Result<u16> {
        let hi = self.byte()?;
        let lo = self.byte()?;
        Ok(u16::from_be_bytes([hi, lo]))
    }

    /// Check the parity byte and consume the two trailer bytes.
    fn close(self, record: &'static str) -> Result<u8> {
        let expected = self.checksum.parity();
        let found = self.reader.read_byte()?;
        if found != expected {
            return Err(TapeError::ChecksumMismatch {
                record,
                expected,
                found,
            });
        }
        for _ in 0..2 {
            self.reader.read_byte()?;
        }
        Ok(found)
    }
}

struct BitReader<'a> {
    samples: &'a [u8],
    pos: usize,
}

impl<'a> BitReader<'a> {
    fn new(samples: &'a [u8]) -> Self {
        Self { samples, pos: 0 }
    }

    /// Skip silence and leader, stopping on the first start bit.
    fn sync(&mut self) -> Result<()> {
        while self.samples.get(self.pos) == Some(&LEVEL_SILENCE) {
            self.pos += 1;
        }
        loop {
            let cell_start = self.pos;
            if !self.read_bit()? {
                self.pos = cell_start;
                return Ok(());
            }
        }
    }

    fn read_bit(&mut self) -> Result<bool> {
        let offset = self.pos;
        let cell = self
            .samples
            .get(offset..offset + SAMPLES_PER_BIT)
            .ok_or(TapeError::Truncated { offset })?;
        if cell.contains(&LEVEL_SILENCE) {
            return Err(TapeError::Framing { offset });
        }
        self.pos += SAMPLES_PER_BIT;
        let changes = cell
            .windows(2)
            .filter(|w| (w[0] > LEVEL_SILENCE) != (w[1] > LEVEL_SILENCE))
            .count();
        Ok(changes >= 2)
    }

    fn read_byte(&mut self) -> Result<u8> {
        let offset = self.pos;
        if self.read_bit()? {
            return Err(TapeError::Framing { offset });
        }
        let mut value = 0u8;
        for i in 0..8 {
            if self.read_bit()? {
                value |= 1 << i;
            }
        }
        if !self.read_bit()? || !self.read_bit()? {
            return Err(TapeError::Framing { offset });
        }
        Ok(value)
    }
}
