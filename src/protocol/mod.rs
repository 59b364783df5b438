// PP-1 register stream protocol: frame types and the line decoder
pub mod decoder;
pub mod frame;

pub use decoder::{decode_line, decode_word, encode_line, encode_word, FrameError};
pub use frame::{
    Address, Bank, Frame, RegisterKey, RegisterValue, ADDRESSES_PER_BANK, BANK_COUNT,
    REGISTER_COUNT,
};
