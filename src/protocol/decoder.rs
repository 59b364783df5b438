// Decoder for the ASCII-hex register frames sent by the device
//
// Word layout (bit 0 = LSB):
//   bit 12     bank select, 1 = A, 0 = B
//   bits 8-11  address, transmitted MSB-first (bit 8 is the address MSB)
//   bits 0-7   value, transmitted MSB-first (bit 0 is the value MSB)
//   bits 13-15 unused

use super::frame::{Address, Bank, Frame};
use thiserror::Error;

const BANK_BIT: u16 = 1 << 12;
const ADDRESS_MASK: u16 = 0x0F00;
const ADDRESS_SHIFT: u16 = 8;
const VALUE_MASK: u16 = 0x00FF;

/// Bits of the word that carry information
pub const FRAME_BITS_MASK: u16 = BANK_BIT | ADDRESS_MASK | VALUE_MASK;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FrameError {
    #[error("Malformed frame {line:?}: {reason}")]
    MalformedFrame { line: String, reason: &'static str },
}

pub type Result<T> = std::result::Result<T, FrameError>;

fn malformed(line: &str, reason: &'static str) -> FrameError {
    FrameError::MalformedFrame {
        line: line.to_string(),
        reason,
    }
}

/// Reverse the order of the low `width` bits of `bits`
fn reverse_field(bits: u8, width: u32) -> u8 {
    bits.reverse_bits() >> (u8::BITS - width)
}

/// Strip a trailing `\r\n` (or bare `\n`/`\r`) from a received line
pub fn strip_terminator(line: &str) -> &str {
    line.trim_end_matches(['\r', '\n'])
}

/// Parse the hex text of one frame into its 16-bit word
pub fn parse_word(line: &str) -> Result<u16> {
    if line.is_empty() {
        return Err(malformed(line, "empty line"));
    }
    // from_str_radix also accepts a leading sign, which is not valid on the wire
    if !line.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(malformed(line, "non-hex character"));
    }
    u16::from_str_radix(line, 16).map_err(|_| malformed(line, "value exceeds 16 bits"))
}

/// Decode the fields of a 16-bit word. Total over all inputs.
pub fn decode_word(word: u16) -> Frame {
    let bank = if word & BANK_BIT != 0 { Bank::A } else { Bank::B };

    let address_bits = ((word & ADDRESS_MASK) >> ADDRESS_SHIFT) as u8;
    let address = Address::from_nibble(reverse_field(address_bits, 4));

    let value = ((word & VALUE_MASK) as u8).reverse_bits();

    Frame::new(bank, address, value)
}

/// Inverse of [`decode_word`] over the bits that carry information
pub fn encode_word(frame: &Frame) -> u16 {
    let bank = match frame.bank {
        Bank::A => BANK_BIT,
        Bank::B => 0,
    };
    let address = (reverse_field(frame.address.value(), 4) as u16) << ADDRESS_SHIFT;
    let value = frame.value.reverse_bits() as u16;

    bank | address | value
}

/// Decode one received line, with or without its terminator
pub fn decode_line(line: &str) -> Result<Frame> {
    parse_word(strip_terminator(line)).map(decode_word)
}

/// Render a frame as it appears on the wire, terminator included
pub fn encode_line(frame: &Frame) -> String {
    format!("{:04X}\r\n", encode_word(frame))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(n: u8) -> Address {
        Address::new(n).unwrap()
    }

    #[test]
    fn test_reverse_field() {
        assert_eq!(reverse_field(0b0001, 4), 0b1000);
        assert_eq!(reverse_field(0b0110, 4), 0b0110);
        assert_eq!(reverse_field(0b1011, 4), 0b1101);
        assert_eq!(reverse_field(0b1000_0000, 8), 0b0000_0001);
    }

    #[test]
    fn test_decode_known_frames() {
        // bit 12 set, every other field zero
        assert_eq!(decode_line("1000").unwrap(), Frame::new(Bank::A, addr(0), 0));
        // bit 8 is the address MSB
        assert_eq!(decode_line("0100").unwrap(), Frame::new(Bank::B, addr(8), 0));
        // bit 7 is the value LSB; bit 15 is ignored
        assert_eq!(decode_line("9080").unwrap(), Frame::new(Bank::A, addr(0), 1));
        // bit 11 is the address LSB, bit 0 the value MSB
        assert_eq!(decode_line("0801").unwrap(), Frame::new(Bank::B, addr(1), 128));
        assert_eq!(decode_line("1FFF").unwrap(), Frame::new(Bank::A, addr(15), 255));
    }

    #[test]
    fn test_decode_strips_terminator() {
        assert_eq!(decode_line("9080\r\n").unwrap(), decode_line("9080").unwrap());
        assert_eq!(decode_line("9080\n").unwrap(), decode_line("9080").unwrap());
    }

    #[test]
    fn test_decode_accepts_short_and_lowercase() {
        assert_eq!(decode_line("0").unwrap(), Frame::new(Bank::B, addr(0), 0));
        assert_eq!(decode_line("80").unwrap(), Frame::new(Bank::B, addr(0), 1));
        assert_eq!(decode_line("1fff").unwrap(), decode_line("1FFF").unwrap());
        assert_eq!(decode_line("00001000").unwrap(), decode_line("1000").unwrap());
    }

    #[test]
    fn test_decode_malformed() {
        for line in ["", "\r\n", "zzzz", "+100", "-1", "0x10", "12 34", "10000", "FFFFF"] {
            let err = decode_line(line).unwrap_err();
            assert!(
                matches!(err, FrameError::MalformedFrame { .. }),
                "{:?} should be malformed",
                line
            );
        }
    }

    #[test]
    fn test_malformed_reason() {
        assert_eq!(
            parse_word("").unwrap_err(),
            FrameError::MalformedFrame {
                line: String::new(),
                reason: "empty line"
            }
        );
        let err = parse_word("12G4").unwrap_err();
        assert!(err.to_string().contains("non-hex character"));
    }

    #[test]
    fn test_round_trip_all_words() {
        for word in 0..=u16::MAX {
            let frame = decode_word(word);
            assert_eq!(encode_word(&frame), word & FRAME_BITS_MASK, "word {:04X}", word);
        }
    }

    #[test]
    fn test_encode_line() {
        let frame = Frame::new(Bank::A, addr(0), 1);
        assert_eq!(encode_line(&frame), "1080\r\n");
        assert_eq!(decode_line(&encode_line(&frame)).unwrap(), frame);
    }
}
