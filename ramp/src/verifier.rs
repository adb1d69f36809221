//! Admission of relayed reports.
//!
//! A report is accepted when at least `signature_threshold` distinct members of the current
//! committee have signed its transmit digest. Signatures from non-members and repeated
//! signatures from the same member are ignored rather than rejected, so a relayer can submit
//! whatever it has collected as long as enough of it is valid. A signature that cannot be parsed
//! at all fails the whole report.

use alloy::primitives::Address;
use tracing::{debug, info};

use crate::{
    committee,
    crypto::{MAX_SIGNATURES, OracleSignature},
    db::ForwardedIds,
    digest::{Report, TransmitDomain},
    error::RampError,
    message::{ForwardedMessage, ReportContext},
    policy,
    state::PersistentState,
};

/// Returns the distinct committee members which signed `report`, in the order their signatures
/// were given.
pub fn verify_signatures(
    state: &PersistentState,
    domain: &TransmitDomain,
    report: &Report,
    signatures: &[OracleSignature],
) -> Result<Vec<Address>, RampError> {
    if state.oracle_nodes.is_empty() {
        return Err(RampError::EmptyCommittee);
    }
    if signatures.len() > MAX_SIGNATURES {
        return Err(RampError::MalformedReport(format!(
            "{} signatures given but at most {MAX_SIGNATURES} are accepted",
            signatures.len()
        )));
    }

    let digest = report.digest(domain);
    let mut signers = Vec::with_capacity(signatures.len());
    for (index, signature) in signatures.iter().enumerate() {
        let signer = signature
            .recover(&digest)
            .map_err(|source| RampError::InvalidSignature { index, source })?;
        if !committee::is_oracle_node(state, &signer) {
            debug!(index, %signer, "signer is not an oracle node");
            continue;
        }
        if signers.contains(&signer) {
            debug!(index, %signer, "duplicate signer");
            continue;
        }
        signers.push(signer);
    }

    if signers.len() < state.signature_threshold {
        return Err(RampError::InsufficientSignatures {
            valid: signers.len(),
            threshold: state.signature_threshold,
        });
    }
    Ok(signers)
}

/// Verifies `report` and records its message in `forwarded`. Nothing is recorded if any check
/// fails.
pub fn accept(
    state: &PersistentState,
    forwarded: &mut ForwardedIds<'_>,
    domain: &TransmitDomain,
    report: &Report,
    signatures: &[OracleSignature],
) -> Result<ForwardedMessage, RampError> {
    let signers = verify_signatures(state, domain, report, signatures)?;

    let context = ReportContext::decode(&report.report_context)?;
    let source_chain_id = context.source_chain_id()?;
    let target_chain_id = context.target_chain_id()?;
    policy::ensure_whitelisted(state, source_chain_id, target_chain_id)?;

    let message_id = context.messageId;
    if !forwarded.insert(message_id)? {
        return Err(RampError::MessageAlreadyForwarded(message_id));
    }
    info!(%message_id, source_chain_id, target_chain_id, signers = signers.len(), "report accepted");

    Ok(ForwardedMessage {
        message_id,
        source_chain_id,
        target_chain_id,
        sender: context.sender,
        receiver: context.receiver,
        message: report.message.clone(),
    })
}
