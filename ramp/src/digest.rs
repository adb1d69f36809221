//! The EIP-712 typed-data digest that oracle nodes sign and the verifier recomputes.
//!
//! ```text
//! domainSeparator = keccak256(domainTypeHash, keccak256(name), keccak256(version), chainId, verifyingContract)
//! structHash      = keccak256(transmitTypeHash, keccak256(reportContext), keccak256(message),
//!                             keccak256(tokenAmount), verifyingContract)
//! digest          = keccak256(0x19 0x01 || domainSeparator || structHash)
//! ```

use std::borrow::Cow;

use alloy::{
    primitives::{Address, B256, Bytes, U256},
    sol,
    sol_types::{Eip712Domain, SolStruct},
};
use anyhow::Result;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::crypto::{OracleSignature, SecretKey};

sol! {
    struct Transmit {
        bytes reportContext;
        bytes message;
        bytes tokenAmount;
        address verifyingContract;
    }
}

/// Everything that binds a digest to one bridge instance on one chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransmitDomain {
    pub name: String,
    pub version: String,
    pub chain_id: u64,
    pub verifying_contract: Address,
}

impl TransmitDomain {
    pub fn eip712(&self) -> Eip712Domain {
        Eip712Domain::new(
            Some(Cow::Owned(self.name.clone())),
            Some(Cow::Owned(self.version.clone())),
            Some(U256::from(self.chain_id)),
            Some(self.verifying_contract),
            None,
        )
    }

    pub fn separator(&self) -> B256 {
        self.eip712().separator()
    }
}

/// A report as submitted to `transmit`: three opaque byte strings which are only ever hashed
/// before the signatures over them have been checked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Report {
    pub report_context: Bytes,
    pub message: Bytes,
    pub token_amount: Bytes,
}

impl Report {
    pub fn digest(&self, domain: &TransmitDomain) -> B256 {
        let transmit = Transmit {
            reportContext: self.report_context.clone(),
            message: self.message.clone(),
            tokenAmount: self.token_amount.clone(),
            verifyingContract: domain.verifying_contract,
        };
        let digest = transmit.eip712_signing_hash(&domain.eip712());
        trace!(%digest, chain_id = domain.chain_id, verifying_contract = %domain.verifying_contract, "transmit digest");
        digest
    }

    pub fn sign(&self, domain: &TransmitDomain, key: &SecretKey) -> Result<OracleSignature> {
        key.sign_digest(&self.digest(domain))
    }
}
