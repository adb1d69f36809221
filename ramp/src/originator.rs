//! Outbound requests: sequencing, message identity and the `RequestSent` announcement.

use alloy::{
    primitives::{Address, B256, Bytes, U256, keccak256},
    sol_types::SolValue,
};
use tracing::info;

use crate::{
    error::RampError,
    message::{RampEvent, TokenAmount},
    policy,
    proxy::CallContext,
};

/// `keccak256(abi.encode(sender, sourceChainId, targetChainId, receiver, message, tokenAmount,
/// sequence))`.
pub fn message_id(
    sender: Address,
    source_chain_id: u64,
    target_chain_id: u64,
    receiver: Address,
    message: &Bytes,
    token_amount: &TokenAmount,
    sequence: u64,
) -> B256 {
    let preimage = (
        sender,
        U256::from(source_chain_id),
        U256::from(target_chain_id),
        receiver,
        message.clone(),
        token_amount.clone(),
        U256::from(sequence),
    )
        .abi_encode_params();
    keccak256(preimage)
}

/// Accepts a request from `ctx.caller` on the bridge's own chain and announces it. Returns the
/// message id and the sequence number assigned to it.
pub fn send_request(
    ctx: &mut CallContext<'_>,
    target_chain_id: u64,
    receiver: Address,
    message: Bytes,
    token_amount: TokenAmount,
) -> Result<(B256, u64), RampError> {
    let sender = ctx.caller;
    let source_chain_id = ctx.chain_id;

    if !policy::is_ramp_sender(ctx.state, &sender) {
        return Err(RampError::SenderNotAllowed(sender));
    }
    policy::ensure_whitelisted(ctx.state, source_chain_id, target_chain_id)?;

    let sequence = ctx.state.sequence(source_chain_id);
    let next = sequence
        .checked_add(1)
        .ok_or(RampError::SequenceOverflow(source_chain_id))?;
    ctx.state.sequences.insert(source_chain_id, next);

    let message_id = message_id(
        sender,
        source_chain_id,
        target_chain_id,
        receiver,
        &message,
        &token_amount,
        sequence,
    );
    info!(%message_id, sequence, %sender, %receiver, target_chain_id, "request sent");

    ctx.emit(RampEvent::RequestSent {
        message_id,
        sequence,
        sender,
        receiver,
        source_chain_id,
        target_chain_id,
        message,
        token_amount,
    });
    Ok((message_id, sequence))
}
