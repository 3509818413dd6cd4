//! Property tests for the modulator and frame assembler.

use format_sc3000_tape::config::{NAME_LEN, SAMPLES_PER_BIT};
use format_sc3000_tape::modulator::{LEVEL_SILENCE, ONE_BIT, ZERO_BIT, frame_bits};
use format_sc3000_tape::{
    Modulator, ProgramImage, TapeAssembler, TapeConfig, TapeImage, TapeLayout, TapeMode, TapeName,
};
use proptest::prelude::*;

fn encode(start_address: u16, name: &[u8], program: &[u8]) -> Vec<u8> {
    let config = TapeConfig {
        mode: TapeMode::MachineCode { start_address },
        name: TapeName::new(name),
    };
    let program = ProgramImage::new(program.to_vec()).expect("program fits");
    let mut assembler = TapeAssembler::new(Vec::new());
    assembler.write_tape(&config, &program).expect("vec sink");
    assembler.into_sink()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// The data parity byte cancels the sum of the program bytes.
    #[test]
    fn data_checksum_is_negated_sum(program in prop::collection::vec(any::<u8>(), 0..1024)) {
        let samples = encode(0x8000, b"PROP", &program);
        let image = TapeImage::parse(&samples).expect("valid tape");

        let sum = program.iter().fold(0u8, |acc, &b| acc.wrapping_add(b));
        prop_assert_eq!(image.data_parity, sum.wrapping_neg());
        prop_assert_eq!(image.program, program);
    }

    /// The name field is the name truncated or space padded to 16 bytes.
    #[test]
    fn name_field_is_sixteen_bytes(name in prop::collection::vec(any::<u8>(), 0..40)) {
        let field = TapeName::new(&name);
        for (i, &byte) in field.as_bytes().iter().enumerate() {
            let expected = name.get(i).copied().unwrap_or(b' ');
            prop_assert_eq!(byte, expected);
        }

        let samples = encode(0x0000, &name, &[]);
        let image = TapeImage::parse(&samples).expect("valid tape");
        prop_assert_eq!(image.name.as_bytes().len(), NAME_LEN);
        prop_assert_eq!(image.name, field);
    }

    /// Every byte is 11 bits: 0, the data bits LSB first, then 1 1.
    #[test]
    fn byte_frame_layout(value in any::<u8>()) {
        let bits = frame_bits(value);
        prop_assert_eq!(bits.len(), 11);
        prop_assert!(!bits[0]);
        for i in 0..8 {
            prop_assert_eq!(bits[i + 1], (value >> i) & 1 == 1);
        }
        prop_assert!(bits[9] && bits[10]);

        let mut m = Modulator::new(Vec::new());
        m.emit_byte(value).expect("vec sink");
        let samples = m.into_sink();
        prop_assert_eq!(samples.len(), 11 * SAMPLES_PER_BIT);
        for (cell, &bit) in samples.chunks(SAMPLES_PER_BIT).zip(&bits) {
            let pattern: &[u8] = if bit { &ONE_BIT } else { &ZERO_BIT };
            prop_assert_eq!(cell, pattern);
        }
    }

    /// D ms of silence is exactly D*192/10 samples at the mid level.
    #[test]
    fn silence_length(duration_ms in 0u32..5000) {
        let mut m = Modulator::new(Vec::new());
        m.emit_silence(duration_ms).expect("vec sink");
        let samples = m.into_sink();
        prop_assert_eq!(samples.len(), (duration_ms * 192 / 10) as usize);
        prop_assert!(samples.iter().all(|&s| s == LEVEL_SILENCE));
    }

    /// Start address round-trips through the header.
    #[test]
    fn start_address_in_header(start_address in any::<u16>()) {
        let samples = encode(start_address, b"ADDR", &[0xC9]);
        prop_assert_eq!(samples.len(), TapeLayout::new(TapeMode::MachineCode { start_address }, 1).total());
        let image = TapeImage::parse(&samples).expect("valid tape");
        prop_assert_eq!(image.mode, TapeMode::MachineCode { start_address });
    }
}
