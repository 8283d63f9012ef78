//! Nullable collaborators for deterministic testing.
//!
//! The delegation ledger reaches every external subsystem (epoch schedule,
//! stake registry, chain specs, validator staking) through traits. This
//! crate provides test-friendly implementations that:
//! - Return deterministic, programmable values
//! - Never touch the filesystem or network
//! - Record the calls tests want to assert on (e.g. unbonding-hold
//!   duration queries)
//!
//! Usage: swap real implementations for nullables in tests.

pub mod epoch;
pub mod spec;
pub mod stake;
pub mod validator;

pub use epoch::NullEpochSource;
pub use spec::NullSpecRegistry;
pub use stake::NullStakeRegistry;
pub use validator::NullValidatorStaking;
