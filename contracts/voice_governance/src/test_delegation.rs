extern crate std;

use soroban_sdk::{testutils::Address as _, vec, Address};

use crate::testutils::Setup;
use crate::{Error, Fund, MemberStatus, VoiceScope, VoteOption};

const GENERAL: VoiceScope = VoiceScope::General;

fn open_proposal(s: &Setup) -> u64 {
    let creator = s.account(MemberStatus::Resident, 1_000);
    let id = s.propose(&creator, 1_000);
    s.client.stake(&creator, &Some(id), &100);
    s.fund(Fund::Campaigns, 1_000);
    s.next_cycle();
    id
}

#[test]
fn test_delegator_mirrors_spent_fraction() {
    let s = Setup::new();
    let id = open_proposal(&s);
    let delegator = s.voter(200);
    let delegatee = s.voter(1_000);
    s.client.delegate(&delegator, &delegatee, &GENERAL);

    s.client.favour(&delegatee, &id, &500);
    // the mirrored vote waits in the queue
    assert!(s.client.get_vote(&id, &delegator).is_none());
    s.client.crank(&10);

    let vote = s.client.get_vote(&id, &delegator).unwrap();
    assert_eq!(vote.amount, 100);
    assert_eq!(vote.option, VoteOption::Trust);
    assert_eq!(s.client.voice_of(&delegator, &GENERAL), 100);
    assert_eq!(s.client.get_proposal(&id).favour, 600);
    // delegated votes earn half the vote bonus
    assert_eq!(s.hub.reputation_of(&delegatee), 2);
    assert_eq!(s.hub.reputation_of(&delegator), 1);
}

#[test]
fn test_mimic_follows_chains() {
    let s = Setup::new();
    let id = open_proposal(&s);
    let leaf = s.voter(200);
    let middle = s.voter(200);
    let root = s.voter(1_000);
    s.client.delegate(&leaf, &middle, &GENERAL);
    s.client.delegate(&middle, &root, &GENERAL);

    s.client.against(&root, &id, &500);
    s.client.crank(&u32::MAX);

    assert_eq!(s.client.get_vote(&id, &middle).unwrap().amount, 100);
    assert_eq!(s.client.get_vote(&id, &leaf).unwrap().amount, 100);
    assert_eq!(s.client.get_proposal(&id).against, 700);
}

#[test]
fn test_neutral_is_mirrored_without_voice() {
    let s = Setup::new();
    let id = open_proposal(&s);
    let delegator = s.voter(200);
    let delegatee = s.voter(1_000);
    s.client.delegate(&delegator, &delegatee, &GENERAL);

    s.client.neutral(&delegatee, &id);
    s.client.crank(&10);

    let vote = s.client.get_vote(&id, &delegator).unwrap();
    assert_eq!(vote.option, VoteOption::Abstain);
    assert_eq!(vote.amount, 0);
    assert_eq!(s.client.voice_of(&delegator, &GENERAL), 200);
}

#[test]
fn test_failing_delegator_is_skipped() {
    let s = Setup::new();
    let id = open_proposal(&s);
    let early = s.voter(200);
    let follower = s.voter(300);
    let delegatee = s.voter(1_000);

    s.client.favour(&early, &id, &50);
    s.client.delegate(&early, &delegatee, &GENERAL);
    s.client.delegate(&follower, &delegatee, &GENERAL);

    s.client.favour(&delegatee, &id, &500);
    s.client.crank(&10);

    // the early direct vote stands, the chunk carried on
    assert_eq!(s.client.get_vote(&id, &early).unwrap().amount, 50);
    assert_eq!(s.client.get_vote(&id, &follower).unwrap().amount, 150);
    assert_eq!(s.client.get_proposal(&id).favour, 700);
}

#[test]
fn test_delegated_voice_cannot_vote_directly() {
    let s = Setup::new();
    let id = open_proposal(&s);
    let delegator = s.voter(200);
    let delegatee = s.voter(1_000);
    s.client.delegate(&delegator, &delegatee, &GENERAL);

    assert_eq!(
        s.client.try_favour(&delegator, &id, &10),
        Err(Ok(Error::VoiceDelegated))
    );

    // the alliance scope is independent
    assert!(s.client.delegation_of(&VoiceScope::Alliance, &delegator).is_none());

    s.client.undelegate(&delegator, &delegator, &GENERAL);
    s.client.favour(&delegator, &id, &10);
}

#[test]
fn test_self_delegation_and_cycles_are_rejected() {
    let s = Setup::new();
    let a = s.voter(10);
    let b = s.voter(10);
    let c = s.voter(10);

    assert_eq!(
        s.client.try_delegate(&a, &a, &GENERAL),
        Err(Ok(Error::SelfDelegation))
    );

    s.client.delegate(&a, &b, &GENERAL);
    s.client.delegate(&b, &c, &GENERAL);
    assert_eq!(
        s.client.try_delegate(&c, &a, &GENERAL),
        Err(Ok(Error::DelegationCycle))
    );
    assert!(s.client.delegation_of(&GENERAL, &c).is_none());
    assert!(s.client.delegators_of(&GENERAL, &a, &0, &10).is_empty());

    let stranger = Address::generate(&s.env);
    assert_eq!(
        s.client.try_delegate(&stranger, &a, &GENERAL),
        Err(Ok(Error::NoVoice))
    );
}

#[test]
fn test_chains_longer_than_max_depth_are_rejected() {
    let s = Setup::new();
    let chain: std::vec::Vec<Address> = (0..7).map(|_| s.voter(10)).collect();
    // 1 -> 2 -> 3 -> 4 -> 5 -> 6
    for pair in chain[1..].windows(2) {
        s.client.delegate(&pair[0], &pair[1], &GENERAL);
    }
    assert_eq!(
        s.client.try_delegate(&chain[0], &chain[1], &GENERAL),
        Err(Ok(Error::DelegationCycle))
    );
    s.client.delegate(&chain[0], &chain[2], &GENERAL);
}

#[test]
fn test_redelegation_moves_the_reverse_edge() {
    let s = Setup::new();
    let a = s.voter(10);
    let b = s.voter(10);
    let c = s.voter(10);

    s.client.delegate(&a, &b, &GENERAL);
    assert_eq!(
        s.client.delegators_of(&GENERAL, &b, &0, &10),
        vec![&s.env, a.clone()]
    );

    s.client.delegate(&a, &c, &GENERAL);
    assert!(s.client.delegators_of(&GENERAL, &b, &0, &10).is_empty());
    assert_eq!(
        s.client.delegators_of(&GENERAL, &c, &0, &10),
        vec![&s.env, a.clone()]
    );
    let edge = s.client.delegation_of(&GENERAL, &a).unwrap();
    assert_eq!(edge.delegatee, c);
    assert_eq!(edge.weight_bps, 10_000);
}

#[test]
fn test_delegators_are_listed_by_slot() {
    let s = Setup::new();
    let delegatee = s.voter(10);
    let d: std::vec::Vec<Address> = (0..3).map(|_| s.voter(10)).collect();
    for delegator in d.iter() {
        s.client.delegate(delegator, &delegatee, &GENERAL);
    }

    assert_eq!(
        s.client.delegators_of(&GENERAL, &delegatee, &0, &2),
        vec![&s.env, d[0].clone(), d[1].clone()]
    );
    assert_eq!(
        s.client.delegators_of(&GENERAL, &delegatee, &2, &2),
        vec![&s.env, d[2].clone()]
    );

    // a removed delegator leaves an empty slot behind it
    s.client.undelegate(&d[1], &d[1], &GENERAL);
    assert!(s.client.delegators_of(&GENERAL, &delegatee, &1, &1).is_empty());
    assert_eq!(
        s.client.delegators_of(&GENERAL, &delegatee, &0, &10),
        vec![&s.env, d[0].clone(), d[2].clone()]
    );
}

#[test]
fn test_undelegate_by_either_end() {
    let s = Setup::new();
    let a = s.voter(10);
    let b = s.voter(10);
    let stranger = s.voter(10);

    assert_eq!(
        s.client.try_undelegate(&a, &a, &GENERAL),
        Err(Ok(Error::DelegationNotFound))
    );

    s.client.delegate(&a, &b, &GENERAL);
    assert_eq!(
        s.client.try_undelegate(&stranger, &a, &GENERAL),
        Err(Ok(Error::NotAuthorized))
    );

    s.client.undelegate(&b, &a, &GENERAL);
    assert!(s.client.delegation_of(&GENERAL, &a).is_none());
    assert!(s.client.delegators_of(&GENERAL, &b, &0, &10).is_empty());
}

#[test]
fn test_mimic_vote_restarts_a_cancelled_chain() {
    let s = Setup::new();
    let id = open_proposal(&s);
    let d1 = s.voter(200);
    let d2 = s.voter(400);
    let delegatee = s.voter(1_000);
    s.client.delegate(&d1, &delegatee, &GENERAL);
    s.client.delegate(&d2, &delegatee, &GENERAL);

    s.client.favour(&delegatee, &id, &500);
    let queued = s.client.task_queue().tail - 1;
    s.client.cancel_task(&queued);
    s.client.crank(&10);
    assert!(s.client.get_vote(&id, &d1).is_none());
    assert!(s.client.get_vote(&id, &d2).is_none());

    // one delegator inline, the other from the queue
    let next = s.client.mimic_vote(&delegatee, &id, &0, &1);
    assert!(next.is_some());
    let inline_votes = [&d1, &d2]
        .iter()
        .filter(|d| s.client.get_vote(&id, d).is_some())
        .count();
    assert_eq!(inline_votes, 1);

    s.client.crank(&10);
    assert_eq!(s.client.get_vote(&id, &d1).unwrap().amount, 100);
    assert_eq!(s.client.get_vote(&id, &d2).unwrap().amount, 200);

    let nobody = s.voter(10);
    assert_eq!(
        s.client.try_mimic_vote(&nobody, &id, &0, &1),
        Err(Ok(Error::VoteNotFound))
    );
}
