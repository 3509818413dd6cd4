//! One encode run: argument validation, input loading, output writing.
//!
//! Every check that can fail without touching the output file runs before
//! the output is created, in the order: mode, start address, output
//! extension, input file, input size.

use std::fs::File;
use std::io::{self, Read};
use std::num::IntErrorKind;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::{MAX_PROGRAM_LEN, ProgramImage, TapeConfig, TapeMode, TapeName};
use crate::error::{Result, TapeError};
use crate::wav::write_wav;

/// The tape mode as given on the command line, before validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModeRequest {
    /// `--machine-code <start-address-hex>`
    MachineCode { start_address: String },
    /// `--basic`
    Basic,
}

/// Parse a hexadecimal start address. Accepts an optional `0x` or `$`
/// prefix.
pub fn parse_start_address(text: &str) -> Result<u16> {
    let digits = text
        .strip_prefix("0x")
        .or_else(|| text.strip_prefix("0X"))
        .or_else(|| text.strip_prefix('$'))
        .unwrap_or(text);

    let value = u32::from_str_radix(digits, 16).map_err(|e| match e.kind() {
        IntErrorKind::PosOverflow => TapeError::AddressOutOfRange {
            address: text.to_string(),
        },
        _ => TapeError::InvalidArguments(format!("'{text}' is not a hexadecimal address")),
    })?;

    u16::try_from(value).map_err(|_| TapeError::AddressOutOfRange {
        address: text.to_string(),
    })
}

/// Require a `.wav` extension, any case.
///
/// Only the bytes after the last `.` of the file name count, so `.wav` on
/// its own and names that are not valid UTF-8 are accepted.
pub fn check_output_extension(path: &Path) -> Result<()> {
    let is_wav = path.file_name().is_some_and(|name| {
        let name = name.as_encoded_bytes();
        name.iter()
            .rposition(|&b| b == b'.')
            .is_some_and(|dot| name[dot + 1..].eq_ignore_ascii_case(b"wav"))
    });
    if is_wav {
        Ok(())
    } else {
        Err(TapeError::OutputExtensionInvalid {
            path: path.to_path_buf(),
        })
    }
}

/// Read the program file and check it fits on tape.
///
/// At most one byte past the limit is read, so an oversized input is
/// rejected without loading it.
pub fn read_program(path: &Path) -> Result<ProgramImage> {
    let unreadable = |source: io::Error| {
        if source.kind() == io::ErrorKind::NotFound {
            TapeError::InputNotFound {
                path: path.to_path_buf(),
            }
        } else {
            TapeError::InputUnreadable {
                path: path.to_path_buf(),
                source,
            }
        }
    };

    let file = File::open(path).map_err(unreadable)?;
    let mut bytes = Vec::new();
    (&file)
        .take(MAX_PROGRAM_LEN as u64 + 1)
        .read_to_end(&mut bytes)
        .map_err(unreadable)?;

    if bytes.len() > MAX_PROGRAM_LEN {
        let len = file
            .metadata()
            .ok()
            .and_then(|meta| usize::try_from(meta.len()).ok())
            .unwrap_or(bytes.len());
        debug!(len, "program too large");
        return Err(TapeError::InputTooLarge { len });
    }
    ProgramImage::new(bytes)
}

/// A validated encode request.
#[derive(Debug, Clone)]
pub struct EncodeJob {
    pub config: TapeConfig,
    pub input: PathBuf,
    pub output: PathBuf,
}

impl EncodeJob {
    /// Validate the command-line arguments. No file is touched.
    pub fn new(
        mode: &ModeRequest,
        name: &[u8],
        input: impl Into<PathBuf>,
        output: impl Into<PathBuf>,
    ) -> Result<Self> {
        let mode = match mode {
            ModeRequest::Basic => return Err(TapeError::UnsupportedMode),
            ModeRequest::MachineCode { start_address } => TapeMode::MachineCode {
                start_address: parse_start_address(start_address)?,
            },
        };
        let output = output.into();
        check_output_extension(&output)?;

        Ok(Self {
            config: TapeConfig {
                mode,
                name: TapeName::new(name),
            },
            input: input.into(),
            output,
        })
    }

    /// Read the input and write the WAV. Returns the number of samples
    /// written.
    pub fn run(&self) -> Result<u64> {
        let program = read_program(&self.input)?;
        debug!(
            input = %self.input.display(),
            len = program.len(),
            mode = ?self.config.mode,
            "program loaded"
        );
        write_wav(&self.output, &self.config, &program)
    }
}
