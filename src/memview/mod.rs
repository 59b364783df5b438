// Shared register table mirrored from the device
pub mod memory_view;

pub use memory_view::{MemoryView, Snapshot};
