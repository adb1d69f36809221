//! Which chain pairs the bridge serves and who may originate requests.

use alloy::primitives::Address;
use tracing::info;

use crate::{error::RampError, state::PersistentState};

/// Whitelists `source_chain_ids[i] -> target_chain_ids[i]` for every `i`. Pairs which are
/// already whitelisted are kept. Returns the pairs in the order given.
pub fn update_chain_id_whitelist(
    state: &mut PersistentState,
    source_chain_ids: &[u64],
    target_chain_ids: &[u64],
) -> Result<Vec<(u64, u64)>, RampError> {
    if source_chain_ids.len() != target_chain_ids.len() {
        return Err(RampError::LengthMismatch {
            left: source_chain_ids.len(),
            right: target_chain_ids.len(),
        });
    }

    let pairs: Vec<_> = source_chain_ids
        .iter()
        .copied()
        .zip(target_chain_ids.iter().copied())
        .collect();
    for &(source, target) in &pairs {
        state.chain_whitelist.entry(source).or_default().insert(target);
    }
    info!(?pairs, "chain whitelist updated");
    Ok(pairs)
}

pub fn is_whitelisted(state: &PersistentState, source_chain_id: u64, target_chain_id: u64) -> bool {
    state
        .chain_whitelist
        .get(&source_chain_id)
        .is_some_and(|targets| targets.contains(&target_chain_id))
}

pub fn ensure_whitelisted(
    state: &PersistentState,
    source_chain_id: u64,
    target_chain_id: u64,
) -> Result<(), RampError> {
    if !is_whitelisted(state, source_chain_id, target_chain_id) {
        return Err(RampError::ChainPairNotWhitelisted {
            source_chain_id,
            target_chain_id,
        });
    }
    Ok(())
}

/// Returns `false` if `sender` was already allowed.
pub fn add_ramp_sender(state: &mut PersistentState, sender: Address) -> Result<bool, RampError> {
    if sender.is_zero() {
        return Err(RampError::ZeroAddress);
    }
    let added = state.ramp_senders.insert(sender);
    info!(%sender, added, "ramp sender allowed");
    Ok(added)
}

pub fn is_ramp_sender(state: &PersistentState, sender: &Address) -> bool {
    state.ramp_senders.contains(sender)
}
