// Frame and register addressing types for the PP-1 register stream

use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of register slots in each bank
pub const ADDRESSES_PER_BANK: usize = 16;

/// Number of banks on the device
pub const BANK_COUNT: usize = 2;

/// Total number of registers mirrored from the device
pub const REGISTER_COUNT: usize = ADDRESSES_PER_BANK * BANK_COUNT;

/// Decoded payload of one register
pub type RegisterValue = u8;

/// One of the two parallel register groups
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Bank {
    A,
    B,
}

impl Bank {
    pub const ALL: [Bank; BANK_COUNT] = [Bank::A, Bank::B];

    /// Row index of this bank inside the register table
    pub fn index(self) -> usize {
        match self {
            Bank::A => 0,
            Bank::B => 1,
        }
    }

    pub fn letter(self) -> char {
        match self {
            Bank::A => 'A',
            Bank::B => 'B',
        }
    }
}

impl fmt::Display for Bank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.letter())
    }
}

/// Register slot within a bank, always in 0..=15
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Address(u8);

impl Address {
    pub const MAX: u8 = (ADDRESSES_PER_BANK - 1) as u8;

    /// Create an address, returning None when out of range
    pub fn new(value: u8) -> Option<Self> {
        (value <= Self::MAX).then_some(Self(value))
    }

    /// Build from the low nibble of `bits`; the upper bits are discarded
    pub(crate) fn from_nibble(bits: u8) -> Self {
        Self(bits & 0x0F)
    }

    pub fn value(self) -> u8 {
        self.0
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }

    /// Iterate over every address of a bank in ascending order
    pub fn all() -> impl Iterator<Item = Address> {
        (0..=Self::MAX).map(Address)
    }
}

impl TryFrom<u8> for Address {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Address::new(value).ok_or_else(|| format!("Address {} out of range 0-{}", value, Self::MAX))
    }
}

impl From<Address> for u8 {
    fn from(address: Address) -> Self {
        address.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A (bank, address) pair naming one register
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RegisterKey {
    pub bank: Bank,
    pub address: Address,
}

impl RegisterKey {
    pub fn new(bank: Bank, address: Address) -> Self {
        Self { bank, address }
    }

    /// All 32 keys, bank A first
    pub fn all() -> impl Iterator<Item = RegisterKey> {
        Bank::ALL
            .into_iter()
            .flat_map(|bank| Address::all().map(move |address| RegisterKey::new(bank, address)))
    }
}

// Registers are named address-first on the device, e.g. "3A" or "15B"
impl fmt::Display for RegisterKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.address, self.bank)
    }
}

/// One decoded frame of the wire protocol
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Frame {
    pub bank: Bank,
    pub address: Address,
    pub value: RegisterValue,
}

impl Frame {
    pub fn new(bank: Bank, address: Address, value: RegisterValue) -> Self {
        Self {
            bank,
            address,
            value,
        }
    }

    pub fn key(&self) -> RegisterKey {
        RegisterKey::new(self.bank, self.address)
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} = {} (0x{:02X})", self.key(), self.value, self.value)
    }
}
