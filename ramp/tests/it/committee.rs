use alloy::primitives::{Address, B256};
use ramp::{
    crypto::SecretKey,
    error::{ErrorKind, RampError},
    message::RampEvent,
};

use crate::{Fixture, report_context};

#[test]
fn initial_committee() {
    let mut fixture = Fixture::deploy();
    let nodes = fixture.ramp.oracle_nodes().unwrap();
    assert_eq!(nodes.len(), 3);
    assert!(nodes.contains(&fixture.addr1));
    assert!(nodes.contains(&fixture.addr2));
    assert_eq!(fixture.ramp.signature_threshold().unwrap(), 2);
}

#[test]
fn owner_replaces_committee() {
    let mut fixture = Fixture::deploy();
    let owner = fixture.owner();
    let nodes: Vec<_> = (1..=5).map(Address::repeat_byte).collect();

    fixture.ramp.update_oracle_nodes(owner, nodes.clone()).unwrap();
    assert_eq!(fixture.ramp.oracle_nodes().unwrap(), nodes);
    assert_eq!(fixture.ramp.signature_threshold().unwrap(), 3);

    let events = fixture.ramp.events_since(0).unwrap();
    assert_eq!(
        events.last().unwrap().event,
        RampEvent::OracleNodesUpdated {
            oracle_nodes: nodes,
            signature_threshold: 3
        }
    );
}

#[test]
fn only_owner_replaces_committee() {
    let mut fixture = Fixture::deploy();
    let before = fixture.ramp.oracle_nodes().unwrap();

    let err = fixture
        .ramp
        .update_oracle_nodes(fixture.addr1, vec![fixture.addr1])
        .unwrap_err();
    assert!(matches!(err, RampError::NotOwner(caller) if caller == fixture.addr1));
    assert_eq!(err.kind(), ErrorKind::Authorization);
    assert_eq!(fixture.ramp.oracle_nodes().unwrap(), before);
}

#[test]
fn invalid_committees_are_rejected() {
    let mut fixture = Fixture::deploy();
    let owner = fixture.owner();

    let err = fixture.ramp.update_oracle_nodes(owner, vec![]).unwrap_err();
    assert!(matches!(err, RampError::EmptyCommittee));
    assert_eq!(err.kind(), ErrorKind::InvariantViolation);

    let err = fixture
        .ramp
        .update_oracle_nodes(owner, vec![fixture.addr1, fixture.addr2, fixture.addr1])
        .unwrap_err();
    assert!(matches!(err, RampError::DuplicateOracleNode(a) if a == fixture.addr1));

    assert_eq!(fixture.ramp.oracle_nodes().unwrap().len(), 3);
    assert_eq!(fixture.ramp.signature_threshold().unwrap(), 2);
}

#[test]
fn single_node_committee_can_attest() {
    let mut fixture = Fixture::deploy();
    let owner = fixture.owner();
    let node = fixture.oracles[2].address();
    fixture.ramp.update_oracle_nodes(owner, vec![node]).unwrap();
    assert_eq!(fixture.ramp.signature_threshold().unwrap(), 1);

    fixture
        .ramp
        .update_chain_id_whitelist(owner, vec![1], vec![2])
        .unwrap();
    let report = crate::report("single");
    let signatures = fixture.sign(&report, &[2]);
    fixture.transmit(&report, signatures).unwrap();
}

/// A committee change only affects reports submitted after it.
#[test]
fn committee_change_applies_to_later_reports() {
    let mut fixture = Fixture::deploy();
    let owner = fixture.owner();
    fixture
        .ramp
        .update_chain_id_whitelist(owner, vec![1], vec![2])
        .unwrap();

    let first = crate::report("first");
    let signatures = fixture.sign(&first, &[0, 1]);
    fixture.transmit(&first, signatures).unwrap();

    // Grow the committee to five: two signatures are no longer enough.
    let mut nodes: Vec<_> = fixture.oracles.iter().map(SecretKey::address).collect();
    nodes.extend([Address::repeat_byte(0x11), Address::repeat_byte(0x12)]);
    fixture.ramp.update_oracle_nodes(owner, nodes).unwrap();
    assert_eq!(fixture.ramp.signature_threshold().unwrap(), 3);

    let mut second = crate::report("second");
    second.report_context = report_context(B256::repeat_byte(2)).encode();
    let err = fixture
        .transmit(&second, fixture.sign(&second, &[0, 1]))
        .unwrap_err();
    assert!(matches!(
        err,
        RampError::InsufficientSignatures {
            valid: 2,
            threshold: 3
        }
    ));
    fixture
        .transmit(&second, fixture.sign(&second, &[0, 1, 2]))
        .unwrap();

    assert_eq!(fixture.events().len(), 2);
    assert_eq!(fixture.router.received.lock().len(), 2);
}
