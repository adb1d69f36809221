use alloy::primitives::{Address, Bytes};
use ramp::{
    error::{ErrorKind, RampError},
    message::RampEvent,
    originator,
};

use crate::{CHAIN_ID, Fixture, ROUTER_ADDRESS, token_amount};

fn allow_addr1(fixture: &mut Fixture) {
    let owner = fixture.owner();
    fixture
        .ramp
        .update_chain_id_whitelist(owner, vec![CHAIN_ID], vec![2])
        .unwrap();
    fixture.ramp.add_ramp_sender(owner, fixture.addr1).unwrap();
}

#[test]
fn request_sent_with_sequence() {
    let mut fixture = Fixture::deploy();
    allow_addr1(&mut fixture);
    let message = Bytes::from_static(b"Hello Receiver");

    let (message_id, sequence) = fixture
        .ramp
        .send_request(fixture.addr1, 2, ROUTER_ADDRESS, message.clone(), token_amount())
        .unwrap();
    assert_eq!(sequence, 0);
    assert_eq!(
        message_id,
        originator::message_id(
            fixture.addr1,
            CHAIN_ID,
            2,
            ROUTER_ADDRESS,
            &message,
            &token_amount(),
            0
        )
    );

    assert_eq!(
        fixture.events(),
        vec![RampEvent::RequestSent {
            message_id,
            sequence: 0,
            sender: fixture.addr1,
            receiver: ROUTER_ADDRESS,
            source_chain_id: CHAIN_ID,
            target_chain_id: 2,
            message: message.clone(),
            token_amount: token_amount(),
        }]
    );

    let (second_id, sequence) = fixture
        .ramp
        .send_request(fixture.addr1, 2, ROUTER_ADDRESS, message, token_amount())
        .unwrap();
    assert_eq!(sequence, 1);
    assert_ne!(second_id, message_id);
    assert_eq!(fixture.ramp.state().sequence(CHAIN_ID), 2);
}

#[test]
fn sender_must_be_allowed() {
    let mut fixture = Fixture::deploy();
    allow_addr1(&mut fixture);

    let err = fixture
        .ramp
        .send_request(
            fixture.addr2,
            2,
            ROUTER_ADDRESS,
            Bytes::from_static(b"hi"),
            token_amount(),
        )
        .unwrap_err();
    assert!(matches!(err, RampError::SenderNotAllowed(sender) if sender == fixture.addr2));
    assert_eq!(err.kind(), ErrorKind::Authorization);
    assert!(fixture.events().is_empty());
    assert_eq!(fixture.ramp.state().sequence(CHAIN_ID), 0);
}

#[test]
fn target_chain_must_be_whitelisted() {
    let mut fixture = Fixture::deploy();
    allow_addr1(&mut fixture);

    let err = fixture
        .ramp
        .send_request(
            fixture.addr1,
            56,
            ROUTER_ADDRESS,
            Bytes::from_static(b"hi"),
            token_amount(),
        )
        .unwrap_err();
    assert!(matches!(
        err,
        RampError::ChainPairNotWhitelisted {
            source_chain_id: CHAIN_ID,
            target_chain_id: 56
        }
    ));
    assert_eq!(err.kind(), ErrorKind::PolicyViolation);
    assert!(fixture.events().is_empty());
}

#[test]
fn only_owner_configures_policy() {
    let mut fixture = Fixture::deploy();
    let err = fixture
        .ramp
        .add_ramp_sender(fixture.addr1, fixture.addr1)
        .unwrap_err();
    assert!(matches!(err, RampError::NotOwner(_)));
    let err = fixture
        .ramp
        .update_chain_id_whitelist(fixture.addr1, vec![CHAIN_ID], vec![2])
        .unwrap_err();
    assert!(matches!(err, RampError::NotOwner(_)));

    let owner = fixture.owner();
    let err = fixture
        .ramp
        .update_chain_id_whitelist(owner, vec![CHAIN_ID, 1], vec![2])
        .unwrap_err();
    assert!(matches!(err, RampError::LengthMismatch { left: 2, right: 1 }));
    assert!(fixture.ramp.state().chain_whitelist.is_empty());
    assert!(fixture.ramp.state().ramp_senders.is_empty());
}

#[test]
fn identical_requests_get_distinct_ids() {
    let mut fixture = Fixture::deploy();
    allow_addr1(&mut fixture);
    let ids: Vec<_> = (0..5)
        .map(|_| {
            fixture
                .ramp
                .send_request(
                    fixture.addr1,
                    2,
                    Address::repeat_byte(9),
                    Bytes::new(),
                    token_amount(),
                )
                .unwrap()
                .0
        })
        .collect();
    for (i, id) in ids.iter().enumerate() {
        assert!(!ids[i + 1..].contains(id));
    }
}
