//! Sega SC-3000 cassette tape encoder.
//!
//! Turns a program image into 8-bit 19.2 kHz WAV audio that the SC-3000's
//! tape loader accepts. The encoder is three layers: [`modulator`] turns
//! bits into FSK samples, [`frame`] lays out the header and data records
//! with their checksums, and [`wav`] wraps the samples in a RIFF container.
//! [`decode`] reads the result back.

pub mod config;
pub mod decode;
mod error;
pub mod frame;
pub mod job;
pub mod modulator;
pub mod wav;

pub use config::{ProgramImage, TapeConfig, TapeKind, TapeMode, TapeName};
pub use decode::TapeImage;
pub use error::{Result, TapeError};
pub use frame::{TapeAssembler, TapeLayout, encode_tape};
pub use job::{EncodeJob, ModeRequest};
pub use modulator::{Modulator, SampleSink};
pub use wav::{encode_wav_bytes, write_wav};
