//! Fundamental types for the pledge delegation ledger.
//!
//! This crate defines the core types shared across every other crate in the
//! workspace: account addresses, denominated token amounts, epochs, block
//! heights, and the stake-target / stake-kind enums used by the ledger.

pub mod address;
pub mod amount;
pub mod epoch;
pub mod target;

pub use address::{AccountAddress, AddressError};
pub use amount::{AmountError, TokenAmount};
pub use epoch::{BlockHeight, Epoch};
pub use target::{StakeKind, StakeTarget};
