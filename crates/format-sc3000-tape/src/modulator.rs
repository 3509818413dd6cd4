//! Bitstream modulator: bits and bytes to 8-bit unsigned PCM samples.
//!
//! The SC-3000 tape format is FSK at 1200 baud. Every bit occupies 16
//! samples at 19.2 kHz:
//!
//! ```text
//!   1:  HHHHLLLLHHHHLLLL   (2400 Hz, two cycles)
//!   0:  HHHHHHHHLLLLLLLL   (1200 Hz, one cycle)
//! ```
//!
//! The square wave swings between 0xFF and 0x00; silence sits at 0x80.
//! Bytes are framed as one `0` start bit, eight data bits LSB first, and
//! two `1` stop bits.

use std::io::{self, Seek, Write};

use crate::config::{SAMPLES_PER_BIT, SAMPLE_RATE};

/// Sample value for the high half of a cycle.
pub const LEVEL_HIGH: u8 = 0xFF;
/// Sample value for the low half of a cycle.
pub const LEVEL_LOW: u8 = 0x00;
/// Sample value for silence.
pub const LEVEL_SILENCE: u8 = 0x80;

const H: u8 = LEVEL_HIGH;
const L: u8 = LEVEL_LOW;

/// Sample pattern for a `1` bit.
pub const ONE_BIT: [u8; SAMPLES_PER_BIT] = [H, H, H, H, L, L, L, L, H, H, H, H, L, L, L, L];
/// Sample pattern for a `0` bit.
pub const ZERO_BIT: [u8; SAMPLES_PER_BIT] = [H, H, H, H, H, H, H, H, L, L, L, L, L, L, L, L];

/// Samples per 10 ms (19.2 samples/ms).
const SAMPLES_PER_10_MS: u32 = SAMPLE_RATE / 100;

/// Number of silence samples for a duration, truncated.
#[must_use]
pub fn silence_samples(duration_ms: u32) -> usize {
    (u64::from(duration_ms) * u64::from(SAMPLES_PER_10_MS) / 10) as usize
}

/// The eleven line bits for one framed byte, in transmission order.
#[must_use]
pub fn frame_bits(value: u8) -> [bool; 11] {
    let mut bits = [true; 11];
    bits[0] = false;
    for (i, bit) in bits[1..9].iter_mut().enumerate() {
        *bit = (value >> i) & 1 != 0;
    }
    bits
}

/// Destination for the sample stream.
pub trait SampleSink {
    /// Append samples to the stream.
    fn put(&mut self, samples: &[u8]) -> io::Result<()>;
}

impl SampleSink for Vec<u8> {
    fn put(&mut self, samples: &[u8]) -> io::Result<()> {
        self.extend_from_slice(samples);
        Ok(())
    }
}

/// Streams straight into the WAV container. `hound` stores 8-bit samples
/// as offset binary, so the unsigned value is recentred to `i8` here.
impl<W: Write + Seek> SampleSink for hound::WavWriter<W> {
    fn put(&mut self, samples: &[u8]) -> io::Result<()> {
        for &sample in samples {
            self.write_sample((sample ^ 0x80) as i8)
                .map_err(hound_to_io)?;
        }
        Ok(())
    }
}

pub(crate) fn hound_to_io(err: hound::Error) -> io::Error {
    match err {
        hound::Error::IoError(e) => e,
        other => io::Error::other(other),
    }
}

/// Running 8-bit sum of the bytes written within one record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Checksum(u8);

impl Checksum {
    #[must_use]
    pub fn new() -> Self {
        Self(0)
    }

    pub fn reset(&mut self) {
        self.0 = 0;
    }

    pub fn add(&mut self, value: u8) {
        self.0 = self.0.wrapping_add(value);
    }

    /// The parity byte: two's-complement of the sum, so that sum + parity
    /// is zero mod 256.
    #[must_use]
    pub fn parity(self) -> u8 {
        self.0.wrapping_neg()
    }
}

/// Turns bits, bytes and silences into samples on a [`SampleSink`].
pub struct Modulator<S> {
    sink: S,
    samples_written: u64,
}

impl<S: SampleSink> Modulator<S> {
    #[must_use]
    pub fn new(sink: S) -> Self {
        Self {
            sink,
            samples_written: 0,
        }
    }

    /// Emit one bit as 16 samples.
    pub fn emit_bit(&mut self, value: bool) -> io::Result<()> {
        let pattern = if value { &ONE_BIT } else { &ZERO_BIT };
        self.write(pattern)
    }

    /// Emit one framed byte (176 samples). Checksumming is the caller's job.
    pub fn emit_byte(&mut self, value: u8) -> io::Result<()> {
        for bit in frame_bits(value) {
            self.emit_bit(bit)?;
        }
        Ok(())
    }

    /// Emit a run of `1` bits.
    pub fn emit_leader(&mut self, bits: usize) -> io::Result<()> {
        for _ in 0..bits {
            self.emit_bit(true)?;
        }
        Ok(())
    }

    /// Emit `duration_ms * 19.2` samples at the silence level.
    pub fn emit_silence(&mut self, duration_ms: u32) -> io::Result<()> {
        const CHUNK: [u8; 256] = [LEVEL_SILENCE; 256];
        let mut remaining = silence_samples(duration_ms);
        while remaining > 0 {
            let n = remaining.min(CHUNK.len());
            self.write(&CHUNK[..n])?;
            remaining -= n;
        }
        Ok(())
    }

    /// Total samples emitted so far.
    #[must_use]
    pub fn samples_written(&self) -> u64 {
        self.samples_written
    }

    #[must_use]
    pub fn into_sink(self) -> S {
        self.sink
    }

    fn write(&mut self, samples: &[u8]) -> io::Result<()> {
        self.sink.put(samples)?;
        self.samples_written += samples.len() as u64;
        Ok(())
    }
}
