use std::sync::Arc;

use alloy::primitives::{Address, Bytes, address};
use ramp::{
    error::{ErrorKind, RampError},
    implementation::RampImplementation,
    message::{RampCall, RampEvent, RampOutput},
    proxy::{CallContext, LogicModule},
};

use crate::{CHAIN_ID, Fixture, IMPLEMENTATION_ADDRESS, RAMP_ADDRESS, ROUTER_ADDRESS, token_amount};

const V2_ADDRESS: Address = address!("0xcf7ed3acca5a467e9e704c703e8d87f634fb0fc9");

/// A second logic module which signs under a new domain version and refuses new senders.
#[derive(Debug)]
struct RampV2 {
    inner: RampImplementation,
}

impl LogicModule for RampV2 {
    fn version(&self) -> String {
        "2".to_owned()
    }

    fn execute(&self, ctx: &mut CallContext<'_>, call: RampCall) -> Result<RampOutput, RampError> {
        match call {
            RampCall::AddRampSender(_) => Err(RampError::NotOwner(ctx.caller)),
            call => self.inner.execute(ctx, call),
        }
    }
}

fn deploy_v2(fixture: &mut Fixture) {
    fixture.ramp.host_mut().deploy_module(
        V2_ADDRESS,
        Arc::new(RampV2 {
            inner: RampImplementation::new("Ramp", "2"),
        }),
    );
}

#[test]
fn not_a_contract() {
    let mut fixture = Fixture::deploy();
    let owner = fixture.owner();
    let err = fixture.ramp.update_implementation(owner, owner).unwrap_err();
    assert_eq!(err.to_string(), "DESTINATION_ADDRESS_IS_NOT_A_CONTRACT");
    assert_eq!(err.kind(), ErrorKind::PolicyViolation);
    assert_eq!(fixture.ramp.implementation(), IMPLEMENTATION_ADDRESS);
}

#[test]
fn router_is_not_a_logic_module() {
    let mut fixture = Fixture::deploy();
    let owner = fixture.owner();
    let err = fixture
        .ramp
        .update_implementation(owner, ROUTER_ADDRESS)
        .unwrap_err();
    assert!(matches!(err, RampError::NotALogicModule(a) if a == ROUTER_ADDRESS));
    assert_eq!(fixture.ramp.implementation(), IMPLEMENTATION_ADDRESS);
}

#[test]
fn only_owner_upgrades() {
    let mut fixture = Fixture::deploy();
    deploy_v2(&mut fixture);
    let err = fixture
        .ramp
        .update_implementation(fixture.addr1, V2_ADDRESS)
        .unwrap_err();
    assert!(matches!(err, RampError::NotOwner(_)));
    assert_eq!(fixture.ramp.version().unwrap(), "1");
}

#[test]
fn upgrade_keeps_state() {
    let mut fixture = Fixture::deploy();
    let owner = fixture.owner();
    fixture
        .ramp
        .update_chain_id_whitelist(owner, vec![CHAIN_ID, 1], vec![2, 2])
        .unwrap();
    fixture.ramp.add_ramp_sender(owner, fixture.addr1).unwrap();
    let (_, sequence) = fixture
        .ramp
        .send_request(fixture.addr1, 2, ROUTER_ADDRESS, Bytes::new(), token_amount())
        .unwrap();
    assert_eq!(sequence, 0);
    let nodes = fixture.ramp.oracle_nodes().unwrap();
    let state = fixture.ramp.state().clone();

    deploy_v2(&mut fixture);
    fixture.ramp.update_implementation(owner, V2_ADDRESS).unwrap();
    assert_eq!(fixture.ramp.implementation(), V2_ADDRESS);
    assert_eq!(fixture.ramp.version().unwrap(), "2");

    // Only the implementation address changed.
    let mut expected = state;
    expected.implementation = V2_ADDRESS;
    assert_eq!(*fixture.ramp.state(), expected);

    // Calls are now served by the new module, against the old state.
    assert_eq!(fixture.ramp.oracle_nodes().unwrap(), nodes);
    assert_eq!(fixture.ramp.signature_threshold().unwrap(), 2);
    assert!(matches!(
        fixture.ramp.add_ramp_sender(owner, fixture.addr2),
        Err(RampError::NotOwner(_))
    ));
    let (_, sequence) = fixture
        .ramp
        .send_request(fixture.addr1, 2, ROUTER_ADDRESS, Bytes::new(), token_amount())
        .unwrap();
    assert_eq!(sequence, 1);

    let last = fixture.ramp.events_since(0).unwrap();
    assert!(last.iter().any(|e| e.event
        == RampEvent::ImplementationUpdated {
            previous: IMPLEMENTATION_ADDRESS,
            implementation: V2_ADDRESS,
        }));
}

#[test]
fn upgrade_changes_signing_domain() {
    let mut fixture = Fixture::deploy();
    let owner = fixture.owner();
    fixture
        .ramp
        .update_chain_id_whitelist(owner, vec![1], vec![2])
        .unwrap();
    deploy_v2(&mut fixture);
    fixture.ramp.update_implementation(owner, V2_ADDRESS).unwrap();

    // Signatures under the version 1 domain no longer verify.
    let report = crate::report("Valid Message");
    let v1_signatures = fixture.sign(&report, &[0, 1]);
    assert!(matches!(
        fixture.transmit(&report, v1_signatures),
        Err(RampError::InsufficientSignatures { valid: 0, .. })
    ));

    let v2_domain = RampImplementation::new("Ramp", "2").domain(CHAIN_ID, RAMP_ADDRESS);
    let v2_signatures = fixture.oracles[..2]
        .iter()
        .map(|key| report.sign(&v2_domain, key).unwrap())
        .collect();
    fixture.transmit(&report, v2_signatures).unwrap();
}

#[test]
fn downgrade_is_an_ordinary_upgrade() {
    let mut fixture = Fixture::deploy();
    let owner = fixture.owner();
    deploy_v2(&mut fixture);
    fixture.ramp.update_implementation(owner, V2_ADDRESS).unwrap();
    fixture
        .ramp
        .update_implementation(owner, IMPLEMENTATION_ADDRESS)
        .unwrap();
    assert_eq!(fixture.ramp.version().unwrap(), "1");
}
