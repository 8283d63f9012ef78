//! Nullable chain-spec registry.

use pledge_ledger::{ProviderKind, SpecInfo, SpecRegistry};
use pledge_types::TokenAmount;
use std::collections::HashMap;
use std::sync::Mutex;

/// An in-memory spec registry for testing. Every seeded spec is active.
#[derive(Default)]
pub struct NullSpecRegistry {
    specs: Mutex<HashMap<String, (ProviderKind, SpecInfo)>>,
}

impl NullSpecRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an active spec for `chain_id`.
    pub fn add_spec(&self, chain_id: &str, kind: ProviderKind, min_stake_provider: TokenAmount) {
        self.specs.lock().unwrap().insert(
            chain_id.to_string(),
            (kind, SpecInfo { min_stake_provider }),
        );
    }
}

impl SpecRegistry for NullSpecRegistry {
    fn is_spec_active(&self, chain_id: &str) -> Option<ProviderKind> {
        self.specs
            .lock()
            .unwrap()
            .get(chain_id)
            .map(|(kind, _)| *kind)
    }

    fn spec(&self, chain_id: &str) -> Option<SpecInfo> {
        self.specs
            .lock()
            .unwrap()
            .get(chain_id)
            .map(|(_, info)| info.clone())
    }
}
