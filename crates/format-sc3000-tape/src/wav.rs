//! WAV container output.
//!
//! The tape is stored as 8-bit unsigned mono PCM at 19.2 kHz. `hound`
//! writes the 44-byte RIFF header with zeroed size fields, and `finalize()`
//! seeks back to patch them once the sample count is known.

use std::fs::{self, File};
use std::io::{BufWriter, Cursor, Seek, Write};
use std::path::Path;

use tracing::{info, warn};

use crate::config::{ProgramImage, SAMPLE_RATE, TapeConfig, TapeMode};
use crate::error::{Result, TapeError};
use crate::frame::{TapeLayout, encode_tape};
use crate::modulator::hound_to_io;

/// Output format: mono, 19.2 kHz, 8-bit.
pub const WAV_SPEC: hound::WavSpec = hound::WavSpec {
    channels: 1,
    sample_rate: SAMPLE_RATE,
    bits_per_sample: 8,
    sample_format: hound::SampleFormat::Int,
};

/// Bytes before the first sample.
pub const HEADER_LEN: usize = 44;
/// Offset of the RIFF chunk size (file length - 8).
pub const RIFF_SIZE_OFFSET: usize = 4;
/// Offset of the data chunk size (file length - 44).
pub const DATA_SIZE_OFFSET: usize = 40;

/// Encode a tape file as a WAV container onto any seekable writer.
/// Returns the number of samples written.
pub fn write_wav_to<W: Write + Seek>(
    writer: W,
    config: &TapeConfig,
    program: &ProgramImage,
) -> Result<u64> {
    ensure_supported(config.mode)?;
    let wav = hound::WavWriter::new(writer, WAV_SPEC).map_err(hound_to_io)?;
    let (wav, samples) = encode_tape(wav, config, program)?;
    wav.finalize().map_err(hound_to_io)?;
    Ok(samples)
}

/// Encode a tape file into an in-memory WAV image.
pub fn encode_wav_bytes(config: &TapeConfig, program: &ProgramImage) -> Result<Vec<u8>> {
    let capacity = HEADER_LEN + TapeLayout::new(config.mode, program.len()).total();
    let mut cursor = Cursor::new(Vec::with_capacity(capacity));
    write_wav_to(&mut cursor, config, program)?;
    Ok(cursor.into_inner())
}

/// Encode a tape file to `path`, truncating any existing file.
///
/// A failed write leaves no file behind.
pub fn write_wav(path: &Path, config: &TapeConfig, program: &ProgramImage) -> Result<u64> {
    ensure_supported(config.mode)?;

    let file = File::create(path).map_err(|source| TapeError::OutputUnwritable {
        path: path.to_path_buf(),
        source,
    })?;

    match write_wav_to(BufWriter::new(file), config, program) {
        Ok(samples) => {
            info!(
                path = %path.display(),
                name = %config.name,
                program_len = program.len(),
                samples,
                "tape written"
            );
            Ok(samples)
        }
        Err(err) => {
            if let Err(e) = fs::remove_file(path) {
                warn!(path = %path.display(), "could not remove partial output: {e}");
            }
            Err(match err {
                TapeError::Sink(source) => TapeError::OutputUnwritable {
                    path: path.to_path_buf(),
                    source,
                },
                other => other,
            })
        }
    }
}

fn ensure_supported(mode: TapeMode) -> Result<()> {
    match mode {
        TapeMode::MachineCode { .. } => Ok(()),
        TapeMode::Basic => Err(TapeError::UnsupportedMode),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TapeName;

    fn le_u32(bytes: &[u8], offset: usize) -> u32 {
        u32::from_le_bytes([
            bytes[offset],
            bytes[offset + 1],
            bytes[offset + 2],
            bytes[offset + 3],
        ])
    }

    fn le_u16(bytes: &[u8], offset: usize) -> u16 {
        u16::from_le_bytes([bytes[offset], bytes[offset + 1]])
    }

    fn config() -> TapeConfig {
        TapeConfig {
            mode: TapeMode::MachineCode {
                start_address: 0x8000,
            },
            name: TapeName::new(b"TEST"),
        }
    }

    #[test]
    fn header_fields() {
        let program = ProgramImage::new(vec![0x01, 0x02]).expect("small program");
        let wav = encode_wav_bytes(&config(), &program).expect("encode");

        assert_eq!(&wav[0..4], b"RIFF");
        assert_eq!(&wav[8..12], b"WAVE");
        assert_eq!(&wav[12..16], b"fmt ");
        assert_eq!(le_u32(&wav, 16), 16);
        assert_eq!(le_u16(&wav, 20), 1, "PCM");
        assert_eq!(le_u16(&wav, 22), 1, "mono");
        assert_eq!(le_u32(&wav, 24), 19_200, "sample rate");
        assert_eq!(le_u32(&wav, 28), 19_200, "byte rate");
        assert_eq!(le_u16(&wav, 32), 1, "block align");
        assert_eq!(le_u16(&wav, 34), 8, "bits per sample");
        assert_eq!(&wav[36..40], b"data");
    }

    #[test]
    fn size_fields_are_patched() {
        let program = ProgramImage::new(vec![0x55; 300]).expect("small program");
        let wav = encode_wav_bytes(&config(), &program).expect("encode");
        let len = wav.len() as u32;

        assert_eq!(le_u32(&wav, RIFF_SIZE_OFFSET), len - 8);
        assert_eq!(le_u32(&wav, DATA_SIZE_OFFSET), len - 44);
        assert_eq!(
            wav.len(),
            HEADER_LEN + TapeLayout::new(config().mode, 300).total()
        );
    }

    #[test]
    fn samples_are_stored_unsigned() {
        let program = ProgramImage::new(Vec::new()).expect("empty program");
        let wav = encode_wav_bytes(&config(), &program).expect("encode");

        // 10ms of silence, then the first leader bit
        assert!(wav[HEADER_LEN..HEADER_LEN + 192].iter().all(|&s| s == 0x80));
        assert_eq!(
            wav[HEADER_LEN + 192..HEADER_LEN + 208],
            [
                0xFF, 0xFF, 0xFF, 0xFF, 0x00, 0x00, 0x00, 0x00, 0xFF, 0xFF, 0xFF, 0xFF, 0x00, 0x00,
                0x00, 0x00
            ]
        );
    }

    #[test]
    fn basic_is_rejected_before_writing() {
        let config = TapeConfig {
            mode: TapeMode::Basic,
            name: TapeName::new(b"PROG"),
        };
        let program = ProgramImage::new(vec![1]).expect("small program");
        let mut cursor = Cursor::new(Vec::new());
        let err = write_wav_to(&mut cursor, &config, &program).unwrap_err();
        assert!(matches!(err, TapeError::UnsupportedMode));
        assert!(cursor.into_inner().is_empty());
    }
}
