// # Subscriber Store Implementations
//
// This module provides implementations of the SubscriberStore trait for
// different persistence strategies.

pub mod file;
pub mod memory;

pub use file::FileSubscriberStore;
pub use memory::MemorySubscriberStore;
