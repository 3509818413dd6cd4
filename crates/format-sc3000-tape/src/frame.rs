//! Tape frame assembler.
//!
//! A tape file is two records, each preceded by a leader tone and opened
//! by a key-code byte:
//!
//! ```text
//!   silence 10ms
//!   leader (3600 x 1)  key  name[16] len_hi len_lo [addr_hi addr_lo] parity 00 00
//!   silence 1000ms
//!   leader (3600 x 1)  key  program...                                parity 00 00
//!   silence 10ms
//! ```
//!
//! The checksum restarts after each key-code, so the key-code itself is not
//! covered. Every other byte goes through [`TapeAssembler::write_byte`].

use std::io;

use tracing::debug;

use crate::config::{
    BITS_PER_BYTE, EDGE_SILENCE_MS, LEADER_BITS, ProgramImage, RECORD_GAP_MS, SAMPLES_PER_BIT,
    TapeConfig, TapeMode, TapeName,
};
use crate::error::{Result, TapeError};
use crate::modulator::{Checksum, Modulator, SampleSink, silence_samples};

/// Bytes written after each parity byte.
pub const TRAILER: [u8; 2] = [0x00, 0x00];

/// Drives a [`Modulator`] through one tape file, tracking the checksum of
/// the record being written.
pub struct TapeAssembler<S> {
    modulator: Modulator<S>,
    checksum: Checksum,
}

impl<S: SampleSink> TapeAssembler<S> {
    #[must_use]
    pub fn new(sink: S) -> Self {
        Self {
            modulator: Modulator::new(sink),
            checksum: Checksum::new(),
        }
    }

    /// Write one framed byte and add it to the record checksum.
    pub fn write_byte(&mut self, value: u8) -> io::Result<()> {
        self.modulator.emit_byte(value)?;
        self.checksum.add(value);
        Ok(())
    }

    fn write_u16_be(&mut self, value: u16) -> io::Result<()> {
        let [hi, lo] = value.to_be_bytes();
        self.write_byte(hi)?;
        self.write_byte(lo)
    }

    /// Leader tone then key-code; the checksum starts from zero after it.
    fn open_record(&mut self, key_code: u8) -> io::Result<()> {
        self.modulator.emit_leader(LEADER_BITS)?;
        self.write_byte(key_code)?;
        self.checksum.reset();
        Ok(())
    }

    /// Parity byte then the two trailer bytes.
    fn close_record(&mut self) -> io::Result<u8> {
        let parity = self.checksum.parity();
        self.write_byte(parity)?;
        for byte in TRAILER {
            self.write_byte(byte)?;
        }
        Ok(parity)
    }

    /// Header record: key-code, name, length and (machine code only) start
    /// address. Returns the parity byte written.
    pub fn write_header_record(
        &mut self,
        mode: TapeMode,
        name: &TapeName,
        program_len: u16,
    ) -> io::Result<u8> {
        self.open_record(mode.header_key_code())?;
        for &byte in name.as_bytes() {
            self.write_byte(byte)?;
        }
        self.write_u16_be(program_len)?;
        if let Some(start_address) = mode.start_address() {
            self.write_u16_be(start_address)?;
        }
        let parity = self.close_record()?;
        debug!(name = %name, program_len, parity, "header record written");
        Ok(parity)
    }

    /// Data record: key-code then every program byte. Returns the parity
    /// byte written.
    pub fn write_data_record(&mut self, mode: TapeMode, program: &[u8]) -> io::Result<u8> {
        self.open_record(mode.data_key_code())?;
        for &byte in program {
            self.write_byte(byte)?;
        }
        let parity = self.close_record()?;
        debug!(len = program.len(), parity, "data record written");
        Ok(parity)
    }

    /// The complete tape file, silences included.
    pub fn write_tape(&mut self, config: &TapeConfig, program: &ProgramImage) -> io::Result<()> {
        self.modulator.emit_silence(EDGE_SILENCE_MS)?;
        self.write_header_record(config.mode, &config.name, program.len_u16())?;
        self.modulator.emit_silence(RECORD_GAP_MS)?;
        self.write_data_record(config.mode, program.as_bytes())?;
        self.modulator.emit_silence(EDGE_SILENCE_MS)
    }

    #[must_use]
    pub fn samples_written(&self) -> u64 {
        self.modulator.samples_written()
    }

    #[must_use]
    pub fn into_sink(self) -> S {
        self.modulator.into_sink()
    }
}

/// Encode a tape file onto `sink`. Returns the sink and the number of
/// samples written.
///
/// # Errors
///
/// `UnsupportedMode` for BASIC, before any sample is written; `Sink` if
/// the sink fails part way through.
pub fn encode_tape<S: SampleSink>(
    sink: S,
    config: &TapeConfig,
    program: &ProgramImage,
) -> Result<(S, u64)> {
    if config.mode == TapeMode::Basic {
        return Err(TapeError::UnsupportedMode);
    }
    let mut assembler = TapeAssembler::new(sink);
    assembler.write_tape(config, program)?;
    let samples = assembler.samples_written();
    Ok((assembler.into_sink(), samples))
}

/// Sample counts for each section of a tape file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TapeLayout {
    pub lead_in: usize,
    pub header: usize,
    pub gap: usize,
    pub data: usize,
    pub lead_out: usize,
}

impl TapeLayout {
    #[must_use]
    pub fn new(mode: TapeMode, program_len: usize) -> Self {
        let leader = LEADER_BITS * SAMPLES_PER_BIT;
        let byte = BITS_PER_BYTE * SAMPLES_PER_BIT;
        // key-code + fields + parity + trailer
        let record = |fields: usize| leader + (1 + fields + 1 + TRAILER.len()) * byte;
        Self {
            lead_in: silence_samples(EDGE_SILENCE_MS),
            header: record(mode.header_field_len()),
            gap: silence_samples(RECORD_GAP_MS),
            data: record(program_len),
            lead_out: silence_samples(EDGE_SILENCE_MS),
        }
    }

    /// Sample offset of the first data-record sample.
    #[must_use]
    pub fn data_start(&self) -> usize {
        self.lead_in + self.header + self.gap
    }

    #[must_use]
    pub fn total(&self) -> usize {
        self.lead_in + self.header + self.gap + self.data + self.lead_out
    }
}
