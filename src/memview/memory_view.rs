// Live mirror of the device's register banks
// Written by the serial poller, read concurrently by any number of display tasks

use crate::protocol::{
    Address, Bank, Frame, RegisterKey, RegisterValue, ADDRESSES_PER_BANK, BANK_COUNT,
};
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::fmt;
use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};

/// Register table shared between the poller and its readers
///
/// Each entry is a separate atomic, so a reader can never see a half-written
/// value and never blocks the writer. There is no cross-entry consistency.
#[derive(Debug)]
pub struct MemoryView {
    banks: [[AtomicU8; ADDRESSES_PER_BANK]; BANK_COUNT],
    updates: AtomicU64,
}

impl MemoryView {
    /// Create a view with every register set to 0
    pub fn new() -> Self {
        Self {
            banks: std::array::from_fn(|_| std::array::from_fn(|_| AtomicU8::new(0))),
            updates: AtomicU64::new(0),
        }
    }

    fn entry(&self, bank: Bank, address: Address) -> &AtomicU8 {
        &self.banks[bank.index()][address.index()]
    }

    /// Current value of one register
    pub fn get(&self, bank: Bank, address: Address) -> RegisterValue {
        self.entry(bank, address).load(Ordering::Acquire)
    }

    /// Overwrite one register
    pub fn set(&self, bank: Bank, address: Address, value: RegisterValue) {
        self.entry(bank, address).store(value, Ordering::Release);
        self.updates.fetch_add(1, Ordering::Release);
    }

    /// Store a decoded frame
    pub fn apply(&self, frame: &Frame) {
        self.set(frame.bank, frame.address, frame.value);
    }

    /// Number of `set` calls since creation
    ///
    /// Readers compare this against the count they last rendered to skip
    /// redundant refreshes.
    pub fn update_count(&self) -> u64 {
        self.updates.load(Ordering::Acquire)
    }

    /// Copy all registers. Each entry is read atomically; entries may come
    /// from different points in the update stream.
    pub fn snapshot(&self) -> Snapshot {
        let mut values = [[0u8; ADDRESSES_PER_BANK]; BANK_COUNT];
        for (row, bank) in values.iter_mut().zip(self.banks.iter()) {
            for (value, entry) in row.iter_mut().zip(bank.iter()) {
                *value = entry.load(Ordering::Acquire);
            }
        }
        Snapshot { values }
    }
}

impl Default for MemoryView {
    fn default() -> Self {
        Self::new()
    }
}

/// Point-in-time copy of the register table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Snapshot {
    values: [[RegisterValue; ADDRESSES_PER_BANK]; BANK_COUNT],
}

impl Snapshot {
    pub fn get(&self, bank: Bank, address: Address) -> RegisterValue {
        self.values[bank.index()][address.index()]
    }

    /// Values of one bank, indexed by address
    pub fn bank(&self, bank: Bank) -> &[RegisterValue; ADDRESSES_PER_BANK] {
        &self.values[bank.index()]
    }

    /// Iterate over every register, bank A first
    pub fn iter(&self) -> impl Iterator<Item = (RegisterKey, RegisterValue)> + '_ {
        RegisterKey::all().map(move |key| (key, self.get(key.bank, key.address)))
    }
}

impl Serialize for Snapshot {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(ADDRESSES_PER_BANK * BANK_COUNT))?;
        for (key, value) in self.iter() {
            map.serialize_entry(&key.to_string(), &value)?;
        }
        map.end()
    }
}

/// Renders the two banks side by side, one address per row
impl fmt::Display for Snapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "ADR |  BANK A    |  BANK B")?;
        writeln!(f, "----+------------+-----------")?;
        for address in Address::all() {
            let a = self.get(Bank::A, address);
            let b = self.get(Bank::B, address);
            writeln!(
                f,
                "{:>3} | {:>3} (0x{:02X}) | {:>3} (0x{:02X})",
                address.value(),
                a,
                a,
                b,
                b
            )?;
        }
        Ok(())
    }
}
