//! Nullable epoch source — a programmable logical clock.

use pledge_ledger::EpochSource;
use pledge_types::{BlockHeight, Epoch};
use std::sync::Mutex;

/// An epoch source whose next-epoch boundary and block height are set
/// programmatically. Thread-safe.
pub struct NullEpochSource {
    next_epoch: Mutex<Epoch>,
    block: Mutex<BlockHeight>,
}

impl NullEpochSource {
    pub fn new(next_epoch: Epoch) -> Self {
        Self {
            next_epoch: Mutex::new(next_epoch),
            block: Mutex::new(BlockHeight::new(0)),
        }
    }

    /// Convenience constructor from a raw epoch number.
    pub fn at(next_epoch: u64) -> Self {
        Self::new(Epoch::new(next_epoch))
    }

    pub fn set_next_epoch(&self, epoch: Epoch) {
        *self.next_epoch.lock().unwrap() = epoch;
    }

    /// Move the boundary one epoch forward.
    pub fn advance(&self) {
        let mut epoch = self.next_epoch.lock().unwrap();
        *epoch = epoch.next();
    }

    pub fn set_block(&self, block: BlockHeight) {
        *self.block.lock().unwrap() = block;
    }
}

impl Default for NullEpochSource {
    fn default() -> Self {
        Self::at(1)
    }
}

impl EpochSource for NullEpochSource {
    fn current_next_epoch(&self) -> Epoch {
        *self.next_epoch.lock().unwrap()
    }

    fn current_block(&self) -> BlockHeight {
        *self.block.lock().unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn advance_moves_the_boundary() {
        let epochs = NullEpochSource::at(5);
        assert_eq!(epochs.current_next_epoch(), Epoch::new(5));
        epochs.advance();
        assert_eq!(epochs.current_next_epoch(), Epoch::new(6));
    }
}
