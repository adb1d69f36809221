//! The first version of the bridge logic.

use alloy::primitives::Address;
use tracing::info;

use crate::{
    committee,
    crypto::OracleSignature,
    digest::{Report, TransmitDomain},
    error::RampError,
    forwarder,
    message::{RampCall, RampEvent, RampOutput},
    originator, policy,
    proxy::{CallContext, LogicModule},
    verifier,
};

#[derive(Debug, Clone)]
pub struct RampImplementation {
    /// EIP-712 domain name.
    name: String,
    /// EIP-712 domain version, also reported by `version()`.
    version: String,
}

impl RampImplementation {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> RampImplementation {
        RampImplementation {
            name: name.into(),
            version: version.into(),
        }
    }

    pub fn domain(&self, chain_id: u64, verifying_contract: Address) -> TransmitDomain {
        TransmitDomain {
            name: self.name.clone(),
            version: self.version.clone(),
            chain_id,
            verifying_contract,
        }
    }

    fn transmit(
        &self,
        ctx: &mut CallContext<'_>,
        report: Report,
        signatures: &[OracleSignature],
    ) -> Result<RampOutput, RampError> {
        let domain = self.domain(ctx.chain_id, ctx.address);
        let message =
            verifier::accept(ctx.state, &mut ctx.forwarded, &domain, &report, signatures)?;
        forwarder::forward(ctx, message.clone());
        Ok(RampOutput::Forwarded(message))
    }

    fn update_oracle_nodes(
        &self,
        ctx: &mut CallContext<'_>,
        oracle_nodes: Vec<Address>,
    ) -> Result<RampOutput, RampError> {
        ctx.state.ensure_owner(ctx.caller)?;
        let signature_threshold = committee::update_oracle_nodes(ctx.state, oracle_nodes)?;
        let oracle_nodes = ctx.state.oracle_nodes.clone();
        ctx.emit(RampEvent::OracleNodesUpdated {
            oracle_nodes,
            signature_threshold,
        });
        Ok(RampOutput::Unit)
    }

    fn transfer_ownership(
        &self,
        ctx: &mut CallContext<'_>,
        new_owner: Address,
    ) -> Result<RampOutput, RampError> {
        ctx.state.ensure_owner(ctx.caller)?;
        if new_owner.is_zero() {
            return Err(RampError::ZeroAddress);
        }
        let previous_owner = std::mem::replace(&mut ctx.state.owner, new_owner);
        info!(%previous_owner, %new_owner, "ownership transferred");
        ctx.emit(RampEvent::OwnershipTransferred {
            previous_owner,
            new_owner,
        });
        Ok(RampOutput::Unit)
    }
}

impl LogicModule for RampImplementation {
    fn version(&self) -> String {
        self.version.clone()
    }

    fn execute(&self, ctx: &mut CallContext<'_>, call: RampCall) -> Result<RampOutput, RampError> {
        match call {
            RampCall::SendRequest {
                target_chain_id,
                receiver,
                message,
                token_amount,
            } => {
                let (message_id, sequence) = originator::send_request(
                    ctx,
                    target_chain_id,
                    receiver,
                    message,
                    token_amount,
                )?;
                Ok(RampOutput::RequestSent {
                    message_id,
                    sequence,
                })
            }
            RampCall::Transmit {
                report_context,
                message,
                token_amount,
                signatures,
            } => {
                let report = Report {
                    report_context,
                    message,
                    token_amount,
                };
                self.transmit(ctx, report, &signatures)
            }
            RampCall::UpdateOracleNodes(oracle_nodes) => self.update_oracle_nodes(ctx, oracle_nodes),
            RampCall::GetOracleNodes => Ok(RampOutput::OracleNodes(ctx.state.oracle_nodes.clone())),
            RampCall::SignatureThreshold => {
                Ok(RampOutput::SignatureThreshold(ctx.state.signature_threshold))
            }
            RampCall::UpdateChainIdWhitelist {
                source_chain_ids,
                target_chain_ids,
            } => {
                ctx.state.ensure_owner(ctx.caller)?;
                let pairs =
                    policy::update_chain_id_whitelist(ctx.state, &source_chain_ids, &target_chain_ids)?;
                ctx.emit(RampEvent::ChainWhitelistUpdated { pairs });
                Ok(RampOutput::Unit)
            }
            RampCall::AddRampSender(sender) => {
                ctx.state.ensure_owner(ctx.caller)?;
                if policy::add_ramp_sender(ctx.state, sender)? {
                    ctx.emit(RampEvent::RampSenderAdded { sender });
                }
                Ok(RampOutput::Unit)
            }
            RampCall::Owner => Ok(RampOutput::Owner(ctx.state.owner)),
            RampCall::TransferOwnership(new_owner) => self.transfer_ownership(ctx, new_owner),
            RampCall::Version => Ok(RampOutput::Version(self.version.clone())),
        }
    }
}
