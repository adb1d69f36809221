//! The bridge instance callers talk to.
//!
//! [`Ramp`] owns the [`PersistentState`] and forwards every call to the [`LogicModule`] deployed
//! at the address recorded in that state. Swapping the module only rewrites that address. Each
//! call runs against a copy of the state; the copy and the events the call emitted are committed
//! to the database together with the ids of the messages it accepted, and only then are those
//! messages delivered to their routers. A failed call is discarded as a whole.

use std::fmt::Debug;

use alloy::primitives::{Address, B256, Bytes};
use tracing::{debug, info, warn};

use crate::{
    committee,
    crypto::OracleSignature,
    db::{Db, ForwardedIds},
    error::RampError,
    forwarder::{self, Delivery},
    host::Host,
    message::{ForwardedMessage, IndexedEvent, RampCall, RampEvent, RampOutput, TokenAmount},
    policy,
    state::PersistentState,
};

/// Executable bridge logic. A module keeps no state of its own between calls: everything it
/// needs is reachable from the [`CallContext`].
pub trait LogicModule: Debug + Send + Sync {
    fn version(&self) -> String;

    fn execute(&self, ctx: &mut CallContext<'_>, call: RampCall) -> Result<RampOutput, RampError>;
}

/// The environment a [`LogicModule`] runs a single call in.
pub struct CallContext<'a> {
    pub caller: Address,
    /// The chain the bridge is deployed on.
    pub chain_id: u64,
    /// The bridge's own address, which is also the EIP-712 verifying contract.
    pub address: Address,
    pub state: &'a mut PersistentState,
    /// Messages forwarded so far, including by this call.
    pub forwarded: ForwardedIds<'a>,
    events: &'a mut Vec<RampEvent>,
    outbox: &'a mut Vec<ForwardedMessage>,
}

impl CallContext<'_> {
    pub fn emit(&mut self, event: RampEvent) {
        debug!(event = event.name(), "event emitted");
        self.events.push(event);
    }

    /// Queues a message for delivery after the call has been committed.
    pub(crate) fn enqueue(&mut self, message: ForwardedMessage) {
        self.outbox.push(message);
    }
}

/// The initial configuration of a newly deployed bridge.
#[derive(Debug, Clone)]
pub struct Genesis {
    pub owner: Address,
    pub implementation: Address,
    pub oracle_nodes: Vec<Address>,
    pub chain_whitelist: Vec<(u64, u64)>,
    pub ramp_senders: Vec<Address>,
}

/// The result of a committed call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Receipt {
    pub output: RampOutput,
    /// How each message accepted by the call fared with its router, in acceptance order.
    pub deliveries: Vec<Delivery>,
}

#[derive(Debug)]
pub struct Ramp {
    chain_id: u64,
    address: Address,
    host: Host,
    state: PersistentState,
    db: Db,
}

impl Ramp {
    /// Opens the bridge stored in `db`, deploying it from `genesis` if the database is empty.
    pub fn new(
        chain_id: u64,
        address: Address,
        host: Host,
        mut db: Db,
        genesis: Genesis,
    ) -> Result<Ramp, RampError> {
        let state = match db.load_state()? {
            Some(state) => {
                info!(%address, implementation = %state.implementation, "resuming bridge");
                state
            }
            None => {
                let (state, events) = Self::deploy(&host, genesis)?;
                db.commit(&state, &[], &events)?;
                info!(%address, chain_id, implementation = %state.implementation, "bridge deployed");
                state
            }
        };

        Ok(Ramp {
            chain_id,
            address,
            host,
            state,
            db,
        })
    }

    fn deploy(host: &Host, genesis: Genesis) -> Result<(PersistentState, Vec<RampEvent>), RampError> {
        if genesis.owner.is_zero() {
            return Err(RampError::ZeroAddress);
        }
        ensure_module(host, &genesis.implementation)?;

        let mut state = PersistentState::new(genesis.owner, genesis.implementation);
        let mut events = vec![
            RampEvent::OwnershipTransferred {
                previous_owner: Address::ZERO,
                new_owner: genesis.owner,
            },
            RampEvent::ImplementationUpdated {
                previous: Address::ZERO,
                implementation: genesis.implementation,
            },
        ];

        let signature_threshold = committee::update_oracle_nodes(&mut state, genesis.oracle_nodes)?;
        events.push(RampEvent::OracleNodesUpdated {
            oracle_nodes: state.oracle_nodes.clone(),
            signature_threshold,
        });

        if !genesis.chain_whitelist.is_empty() {
            let (sources, targets): (Vec<_>, Vec<_>) = genesis.chain_whitelist.into_iter().unzip();
            let pairs = policy::update_chain_id_whitelist(&mut state, &sources, &targets)?;
            events.push(RampEvent::ChainWhitelistUpdated { pairs });
        }
        for sender in genesis.ramp_senders {
            if policy::add_ramp_sender(&mut state, sender)? {
                events.push(RampEvent::RampSenderAdded { sender });
            }
        }

        Ok((state, events))
    }

    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn state(&self) -> &PersistentState {
        &self.state
    }

    pub fn host(&self) -> &Host {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut Host {
        &mut self.host
    }

    /// The address of the logic module calls are currently forwarded to.
    pub fn implementation(&self) -> Address {
        self.state.implementation
    }

    /// Whether the message with `message_id` has been accepted and forwarded.
    pub fn is_forwarded(&self, message_id: &B256) -> Result<bool, RampError> {
        Ok(self.db.is_forwarded(message_id)?)
    }

    pub fn forwarded_count(&self) -> Result<u64, RampError> {
        Ok(self.db.forwarded_count()?)
    }

    /// Forwards `call` to the active logic module on behalf of `caller`.
    pub fn call(&mut self, caller: Address, call: RampCall) -> Result<Receipt, RampError> {
        let name = call.name();
        let module = ensure_module(&self.host, &self.state.implementation)?;
        debug!(%caller, call = name, version = module.version(), "call");

        let mut state = self.state.clone();
        let mut events = Vec::new();
        let mut outbox = Vec::new();
        let mut ctx = CallContext {
            caller,
            chain_id: self.chain_id,
            address: self.address,
            state: &mut state,
            forwarded: ForwardedIds::new(&self.db),
            events: &mut events,
            outbox: &mut outbox,
        };

        let output = match module.execute(&mut ctx, call) {
            Ok(output) => output,
            Err(e) => {
                warn!(%caller, call = name, error = %e, "call rejected");
                return Err(e);
            }
        };
        let forwarded = ctx.forwarded.into_pending();

        if state != self.state || !forwarded.is_empty() || !events.is_empty() {
            self.db.commit(&state, &forwarded, &events)?;
            self.state = state;
        }
        let deliveries = outbox
            .iter()
            .map(|message| forwarder::deliver(&self.host, message))
            .collect();
        Ok(Receipt { output, deliveries })
    }

    /// Points the bridge at a new logic module. The persistent state is kept as it is.
    pub fn update_implementation(
        &mut self,
        caller: Address,
        implementation: Address,
    ) -> Result<(), RampError> {
        self.state.ensure_owner(caller)?;
        ensure_module(&self.host, &implementation)?;

        let previous = self.state.implementation;
        let mut state = self.state.clone();
        state.implementation = implementation;
        self.db.commit(
            &state,
            &[],
            &[RampEvent::ImplementationUpdated {
                previous,
                implementation,
            }],
        )?;
        self.state = state;
        info!(%previous, %implementation, "implementation updated");
        Ok(())
    }

    pub fn events_since(&self, index: u64) -> Result<Vec<IndexedEvent>, RampError> {
        Ok(self.db.events_since(index)?)
    }

    pub fn send_request(
        &mut self,
        caller: Address,
        target_chain_id: u64,
        receiver: Address,
        message: Bytes,
        token_amount: TokenAmount,
    ) -> Result<(B256, u64), RampError> {
        let call = RampCall::SendRequest {
            target_chain_id,
            receiver,
            message,
            token_amount,
        };
        match self.call(caller, call)?.output {
            RampOutput::RequestSent {
                message_id,
                sequence,
            } => Ok((message_id, sequence)),
            other => Err(unexpected("sendRequest", other)),
        }
    }

    /// Returns the forwarded message and the outcome of handing it to its router.
    pub fn transmit(
        &mut self,
        caller: Address,
        report_context: Bytes,
        message: Bytes,
        token_amount: Bytes,
        signatures: Vec<OracleSignature>,
    ) -> Result<(ForwardedMessage, Delivery), RampError> {
        let call = RampCall::Transmit {
            report_context,
            message,
            token_amount,
            signatures,
        };
        let Receipt { output, deliveries } = self.call(caller, call)?;
        match (output, <[Delivery; 1]>::try_from(deliveries)) {
            (RampOutput::Forwarded(message), Ok([delivery])) => Ok((message, delivery)),
            (other, _) => Err(unexpected("transmit", other)),
        }
    }

    pub fn update_oracle_nodes(
        &mut self,
        caller: Address,
        oracle_nodes: Vec<Address>,
    ) -> Result<(), RampError> {
        self.call(caller, RampCall::UpdateOracleNodes(oracle_nodes))?;
        Ok(())
    }

    pub fn oracle_nodes(&mut self) -> Result<Vec<Address>, RampError> {
        match self.call(Address::ZERO, RampCall::GetOracleNodes)?.output {
            RampOutput::OracleNodes(nodes) => Ok(nodes),
            other => Err(unexpected("getOracleNodes", other)),
        }
    }

    pub fn signature_threshold(&mut self) -> Result<usize, RampError> {
        match self.call(Address::ZERO, RampCall::SignatureThreshold)?.output {
            RampOutput::SignatureThreshold(threshold) => Ok(threshold),
            other => Err(unexpected("signatureThreshold", other)),
        }
    }

    pub fn update_chain_id_whitelist(
        &mut self,
        caller: Address,
        source_chain_ids: Vec<u64>,
        target_chain_ids: Vec<u64>,
    ) -> Result<(), RampError> {
        let call = RampCall::UpdateChainIdWhitelist {
            source_chain_ids,
            target_chain_ids,
        };
        self.call(caller, call)?;
        Ok(())
    }

    pub fn add_ramp_sender(&mut self, caller: Address, sender: Address) -> Result<(), RampError> {
        self.call(caller, RampCall::AddRampSender(sender))?;
        Ok(())
    }

    pub fn owner(&mut self) -> Result<Address, RampError> {
        match self.call(Address::ZERO, RampCall::Owner)?.output {
            RampOutput::Owner(owner) => Ok(owner),
            other => Err(unexpected("owner", other)),
        }
    }

    pub fn transfer_ownership(
        &mut self,
        caller: Address,
        new_owner: Address,
    ) -> Result<(), RampError> {
        self.call(caller, RampCall::TransferOwnership(new_owner))?;
        Ok(())
    }

    pub fn version(&mut self) -> Result<String, RampError> {
        match self.call(Address::ZERO, RampCall::Version)?.output {
            RampOutput::Version(version) => Ok(version),
            other => Err(unexpected("version", other)),
        }
    }
}

fn ensure_module(
    host: &Host,
    address: &Address,
) -> Result<std::sync::Arc<dyn LogicModule>, RampError> {
    if !host.has_code(address) {
        return Err(RampError::NotAContract(*address));
    }
    host.module(address)
        .ok_or(RampError::NotALogicModule(*address))
}

fn unexpected(call: &'static str, output: RampOutput) -> RampError {
    RampError::UnexpectedOutput {
        call,
        output: format!("{output:?}"),
    }
}
