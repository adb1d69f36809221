//! The oracle node committee and the number of its members that must sign a report.

use alloy::primitives::Address;
use itertools::Itertools;
use tracing::info;

use crate::{error::RampError, state::PersistentState};

/// The strict majority of the committee, `floor(n / 2) + 1`. For an even `n` this is the same as
/// `floor((n + 1) / 2) + 1`.
pub fn signature_threshold(committee_size: usize) -> usize {
    committee_size / 2 + 1
}

/// Replaces the whole committee and recomputes the threshold. Returns the new threshold.
pub fn update_oracle_nodes(
    state: &mut PersistentState,
    oracle_nodes: Vec<Address>,
) -> Result<usize, RampError> {
    if oracle_nodes.is_empty() {
        return Err(RampError::EmptyCommittee);
    }
    if oracle_nodes.contains(&Address::ZERO) {
        return Err(RampError::ZeroAddress);
    }
    if let Some(duplicate) = oracle_nodes.iter().duplicates().next() {
        return Err(RampError::DuplicateOracleNode(*duplicate));
    }

    let threshold = signature_threshold(oracle_nodes.len());
    info!(size = oracle_nodes.len(), threshold, "oracle committee replaced");
    state.oracle_nodes = oracle_nodes;
    state.signature_threshold = threshold;
    Ok(threshold)
}

pub fn is_oracle_node(state: &PersistentState, address: &Address) -> bool {
    state.oracle_nodes.contains(address)
}
