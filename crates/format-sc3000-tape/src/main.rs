//! `sc-tapewave`: write an SC-3000 program as cassette audio.
//!
//! ```text
//! sc-tapewave --machine-code <start-address> <name-on-tape> <input-file> <output-file.wav>
//! sc-tapewave --basic <name-on-tape> <input-file> <output-file.wav>
//! ```

use std::ffi::OsString;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{ArgGroup, Parser};
use format_sc3000_tape::{EncodeJob, ModeRequest};

/// Generate SC-3000 tape audio from a program file.
#[derive(Parser)]
#[command(name = "sc-tapewave", version, about)]
#[command(group(ArgGroup::new("mode").required(true).args(["machine_code", "basic"])))]
struct Cli {
    /// Machine-code program, run from START_ADDRESS (hexadecimal)
    #[arg(long, value_name = "START_ADDRESS")]
    machine_code: Option<String>,

    /// Tokenised BASIC program (not yet supported)
    #[arg(long)]
    basic: bool,

    /// Name stored in the tape header (padded or truncated to 16 bytes)
    #[arg(allow_hyphen_values = true)]
    name: OsString,

    /// Program image to encode
    input: PathBuf,

    /// Output WAV file
    output: PathBuf,
}

impl Cli {
    fn mode(&self) -> ModeRequest {
        match &self.machine_code {
            Some(start_address) => ModeRequest::MachineCode {
                start_address: start_address.clone(),
            },
            None => ModeRequest::Basic,
        }
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = EncodeJob::new(
        &cli.mode(),
        cli.name.as_encoded_bytes(),
        cli.input,
        cli.output,
    )
    .and_then(|job| job.run());

    match result {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}
