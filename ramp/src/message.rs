use alloy::{
    primitives::{Address, B256, Bytes, U256},
    sol,
    sol_types::SolValue,
};
use serde::{Deserialize, Serialize};

use crate::{crypto::OracleSignature, error::RampError};

sol! {
    /// Describes the tokens that travel with a request. The bridge treats it as opaque data
    /// and only hashes it.
    #[derive(Debug, PartialEq, Eq, Serialize, Deserialize)]
    struct TokenAmount {
        uint256 targetChainId;
        string tokenAddress;
        string symbol;
        uint256 amount;
        bytes extraData;
    }

    /// Identifies a relayed message. Oracle nodes sign over its ABI encoding.
    #[derive(Debug, PartialEq, Eq, Serialize, Deserialize)]
    struct ReportContext {
        bytes32 messageId;
        uint256 sourceChainId;
        uint256 targetChainId;
        string sender;
        address receiver;
    }
}

impl TokenAmount {
    pub fn encode(&self) -> Bytes {
        self.abi_encode_params().into()
    }

    pub fn decode(data: &[u8]) -> Result<TokenAmount, RampError> {
        Self::abi_decode_params(data)
            .map_err(|e| RampError::MalformedReport(format!("token amount: {e}")))
    }
}

impl ReportContext {
    pub fn encode(&self) -> Bytes {
        self.abi_encode_params().into()
    }

    pub fn decode(data: &[u8]) -> Result<ReportContext, RampError> {
        Self::abi_decode_params(data)
            .map_err(|e| RampError::MalformedReport(format!("report context: {e}")))
    }

    pub fn source_chain_id(&self) -> Result<u64, RampError> {
        chain_id(self.sourceChainId)
    }

    pub fn target_chain_id(&self) -> Result<u64, RampError> {
        chain_id(self.targetChainId)
    }
}

fn chain_id(id: U256) -> Result<u64, RampError> {
    u64::try_from(id).map_err(|_| RampError::MalformedReport(format!("chain id {id} out of range")))
}

/// The tuple handed to the destination router once a report has been accepted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForwardedMessage {
    pub message_id: B256,
    pub source_chain_id: u64,
    pub target_chain_id: u64,
    /// The sender on the source chain, in that chain's own address format.
    pub sender: String,
    pub receiver: Address,
    pub message: Bytes,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RampEvent {
    RequestSent {
        message_id: B256,
        sequence: u64,
        sender: Address,
        receiver: Address,
        source_chain_id: u64,
        target_chain_id: u64,
        message: Bytes,
        token_amount: TokenAmount,
    },
    ForwardMessageCalled(ForwardedMessage),
    OracleNodesUpdated {
        oracle_nodes: Vec<Address>,
        signature_threshold: usize,
    },
    ChainWhitelistUpdated {
        pairs: Vec<(u64, u64)>,
    },
    RampSenderAdded {
        sender: Address,
    },
    OwnershipTransferred {
        previous_owner: Address,
        new_owner: Address,
    },
    ImplementationUpdated {
        previous: Address,
        implementation: Address,
    },
}

impl RampEvent {
    pub fn name(&self) -> &'static str {
        match self {
            RampEvent::RequestSent { .. } => "RequestSent",
            RampEvent::ForwardMessageCalled(_) => "ForwardMessageCalled",
            RampEvent::OracleNodesUpdated { .. } => "OracleNodesUpdated",
            RampEvent::ChainWhitelistUpdated { .. } => "ChainWhitelistUpdated",
            RampEvent::RampSenderAdded { .. } => "RampSenderAdded",
            RampEvent::OwnershipTransferred { .. } => "OwnershipTransferred",
            RampEvent::ImplementationUpdated { .. } => "ImplementationUpdated",
        }
    }
}

/// An event together with its position in the bridge's append-only log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexedEvent {
    pub index: u64,
    pub event: RampEvent,
}

/// A call forwarded by the proxy to the active logic module.
#[derive(Debug, Clone)]
pub enum RampCall {
    SendRequest {
        target_chain_id: u64,
        receiver: Address,
        message: Bytes,
        token_amount: TokenAmount,
    },
    Transmit {
        report_context: Bytes,
        message: Bytes,
        token_amount: Bytes,
        signatures: Vec<OracleSignature>,
    },
    UpdateOracleNodes(Vec<Address>),
    GetOracleNodes,
    SignatureThreshold,
    UpdateChainIdWhitelist {
        source_chain_ids: Vec<u64>,
        target_chain_ids: Vec<u64>,
    },
    AddRampSender(Address),
    Owner,
    TransferOwnership(Address),
    Version,
}

impl RampCall {
    pub fn name(&self) -> &'static str {
        match self {
            RampCall::SendRequest { .. } => "sendRequest",
            RampCall::Transmit { .. } => "transmit",
            RampCall::UpdateOracleNodes(_) => "updateOracleNodes",
            RampCall::GetOracleNodes => "getOracleNodes",
            RampCall::SignatureThreshold => "signatureThreshold",
            RampCall::UpdateChainIdWhitelist { .. } => "updateChainIdWhitelist",
            RampCall::AddRampSender(_) => "addRampSender",
            RampCall::Owner => "owner",
            RampCall::TransferOwnership(_) => "transferOwnership",
            RampCall::Version => "version",
        }
    }
}

/// The data returned by a logic module for a [`RampCall`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RampOutput {
    Unit,
    RequestSent { message_id: B256, sequence: u64 },
    Forwarded(ForwardedMessage),
    OracleNodes(Vec<Address>),
    SignatureThreshold(usize),
    Owner(Address),
    Version(String),
}
