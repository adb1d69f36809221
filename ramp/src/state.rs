use std::collections::{BTreeMap, BTreeSet};

use alloy::primitives::Address;
use serde::{Deserialize, Serialize};

use crate::error::RampError;

/// Bumped whenever the layout of [`PersistentState`] changes. A logic module upgrade never
/// changes it.
pub const STATE_VERSION: u32 = 1;

/// The storage of a bridge instance. It outlives every logic module and holds no behaviour of
/// its own; the component modules mutate it through their operations. Its size is bounded by the
/// configuration: the ids of forwarded messages live in their own table, see
/// [`ForwardedIds`](crate::db::ForwardedIds).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistentState {
    pub version: u32,
    pub owner: Address,
    /// The address of the logic module every call is forwarded to.
    pub implementation: Address,
    pub oracle_nodes: Vec<Address>,
    pub signature_threshold: usize,
    /// Source chain id to the set of target chain ids it may send to.
    pub chain_whitelist: BTreeMap<u64, BTreeSet<u64>>,
    pub ramp_senders: BTreeSet<Address>,
    /// The next sequence number to hand out, per source chain.
    pub sequences: BTreeMap<u64, u64>,
}

impl PersistentState {
    pub fn new(owner: Address, implementation: Address) -> PersistentState {
        PersistentState {
            version: STATE_VERSION,
            owner,
            implementation,
            oracle_nodes: Vec::new(),
            signature_threshold: 0,
            chain_whitelist: BTreeMap::new(),
            ramp_senders: BTreeSet::new(),
            sequences: BTreeMap::new(),
        }
    }

    pub fn ensure_owner(&self, caller: Address) -> Result<(), RampError> {
        if caller != self.owner {
            return Err(RampError::NotOwner(caller));
        }
        Ok(())
    }

    pub fn sequence(&self, source_chain_id: u64) -> u64 {
        self.sequences.get(&source_chain_id).copied().unwrap_or_default()
    }
}
