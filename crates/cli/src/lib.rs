//! Honeywell shopper CLI library.
//!
//! Exposes the file-backed durable slot and the shopper commands so they
//! can be tested without spawning the binary.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod catalog;
pub mod commands;
pub mod file_slot;

pub use catalog::ProductLookup;
pub use commands::CommandError;
pub use file_slot::FileSlot;
