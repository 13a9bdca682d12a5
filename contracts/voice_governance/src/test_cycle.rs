extern crate std;

use soroban_sdk::{
    symbol_short,
    testutils::{Address as _, Events},
    vec, Address, Symbol, TryIntoVal,
};

use crate::config::tests::sample;
use crate::events::EvaluationHeld;
use crate::invariants;
use crate::testutils::Setup;
use crate::{CounterKind, Error, Fund, InviteTerms, MemberStatus, Stage, Status, VoiceScope};

/// A campaign proposal for 1000 with the minimum stake met, activated in
/// cycle 1. Returns `(creator, recipient, proposal id)`.
fn active_proposal(s: &Setup) -> (Address, Address, u64) {
    let creator = s.account(MemberStatus::Resident, 1_000);
    let recipient = Address::generate(&s.env);
    let id = s.client.create_proposal(
        &creator,
        &recipient,
        &1_000,
        &Fund::Campaigns,
        &s.text("community garden"),
        &None,
    );
    s.client.stake(&creator, &Some(id), &100);
    s.fund(Fund::Campaigns, 1_000);
    s.next_cycle();
    assert_eq!(s.client.get_proposal(&id).stage, Stage::Active);
    (creator, recipient, id)
}

#[test]
fn test_on_period_freezes_quorum_for_the_new_cycle() {
    let s = Setup::new();
    s.client.set_counter(&CounterKind::ActiveUsers, &0, &40);

    let cycle = s.client.on_period();
    assert_eq!(cycle, 1);

    let stats = s.client.get_stats(&1).unwrap();
    // no history: 40 eligible * 50 / 2
    assert_eq!(stats.quorum_vote_base, 1_000);
    // zero proposals clamp to the 5% floor
    assert_eq!(stats.quorum_votes_needed, 50);
    assert_eq!(stats.unity_needed_pct, 50);
    assert_eq!(stats.total_eligible_voters, 40);
    assert_eq!(s.client.get_cycle().cycle, 1);
    assert_eq!(s.client.get_cycle().last_period, s.env.ledger().timestamp());

    // evaluation, refresh and reward are queued
    assert_eq!(s.client.task_queue().tail, 3);
}

#[test]
fn test_scenario_favour_passes_first_slice() {
    let s = Setup::new();
    s.client.set_counter(&CounterKind::ActiveUsers, &0, &40);
    let (creator, recipient, id) = active_proposal(&s);

    let stats = s.client.get_stats(&1).unwrap();
    assert_eq!(stats.active_props, vec![&s.env, id]);
    assert_eq!(stats.num_proposals, 1);
    assert_eq!(stats.quorum_votes_needed, 500);
    assert_eq!(s.client.counter(&CounterKind::ActiveProposals, &0), 1);

    let voter = s.voter(600);
    let before = s.client.get_proposal(&id);
    s.client.favour(&voter, &id, &600);
    s.next_cycle();

    let p = s.client.get_proposal(&id);
    invariants::check_step(&before, &p);
    assert_eq!(p.status, Status::Evaluate);
    assert_eq!(p.age, 0);
    assert_eq!(p.current_payout, 250);
    assert_eq!(p.staked, 0);
    // the cycle the votes were cast in
    assert_eq!(p.passed_cycle, 1);
    assert_eq!(s.token.balance(&recipient), 250);
    assert_eq!(s.token.balance(&creator), 1_000);
    assert_eq!(s.client.fund_balance(&Fund::Campaigns), 750);
    assert_eq!(s.hub.reputation_of(&creator), 10);
    assert_eq!(s.client.get_stats(&2).unwrap().eval_props, vec![&s.env, id]);
    assert_eq!(s.client.counter(&CounterKind::ActiveProposals, &0), 0);
}

#[test]
fn test_scenario_majority_failure_burns_stake() {
    let s = Setup::new();
    let (creator, _, id) = active_proposal(&s);
    let supply_before = s.token.balance(&s.client.address);

    let fan = s.voter(100);
    let critic = s.voter(500);
    s.client.favour(&fan, &id, &100);
    s.client.against(&critic, &id, &500);
    s.next_cycle();

    let p = s.client.get_proposal(&id);
    assert_eq!(p.status, Status::Rejected);
    assert_eq!(p.stage, Stage::Done);
    assert_eq!(p.staked, 0);
    assert_eq!(s.token.balance(&s.client.address), supply_before - 100);
    assert_eq!(s.token.balance(&creator), 900);
    assert!(s.client.stage_ids(&Stage::Active, &0, &10).is_empty());
    invariants::check_proposal(&p);
}

#[test]
fn test_quorum_failure_rejects_open_proposal() {
    let s = Setup::new();
    s.client.set_counter(&CounterKind::ActiveUsers, &0, &40);
    let (_, _, id) = active_proposal(&s);

    // unanimous but short of the 500 needed
    let voter = s.voter(499);
    s.client.favour(&voter, &id, &499);
    s.next_cycle();

    assert_eq!(s.client.get_proposal(&id).status, Status::Rejected);
}

#[test]
fn test_full_schedule_pays_out_and_passes() {
    let s = Setup::new();
    let (_, recipient, id) = active_proposal(&s);
    let voter = s.voter(600);
    s.client.favour(&voter, &id, &600);

    let mut previous = s.client.get_proposal(&id);
    for _ in 0..4 {
        s.next_cycle();
        let p = s.client.get_proposal(&id);
        invariants::check_step(&previous, &p);
        previous = p;
    }

    let p = s.client.get_proposal(&id);
    assert_eq!(p.status, Status::Passed);
    assert_eq!(p.stage, Stage::Done);
    assert!(p.executed);
    assert_eq!(p.age, 3);
    assert_eq!(p.current_payout, 1_000);
    assert_eq!(s.token.balance(&recipient), 1_000);
    assert!(s.client.stage_ids(&Stage::Active, &0, &10).is_empty());
}

#[test]
fn test_distrust_during_evaluate_replaces_trust_and_punishes() {
    let s = Setup::new();
    let (creator, _, id) = active_proposal(&s);
    let voter = s.voter(600);
    s.client.favour(&voter, &id, &600);
    s.next_cycle();
    assert_eq!(s.client.get_proposal(&id).status, Status::Evaluate);

    // a fresh trust vote is not accepted while paying out
    let latecomer = s.voter(100);
    assert_eq!(
        s.client.try_favour(&latecomer, &id, &100),
        Err(Ok(Error::VotingClosed))
    );
    // nor a second trust from the same voter
    assert_eq!(
        s.client.try_favour(&voter, &id, &10),
        Err(Ok(Error::AlreadyVoted))
    );

    s.client.against(&voter, &id, &300);
    let p = s.client.get_proposal(&id);
    assert_eq!(p.favour, 0);
    assert_eq!(p.against, 300);
    invariants::assert_tally_consistent(&p);

    s.next_cycle();
    let p = s.client.get_proposal(&id);
    assert_eq!(p.status, Status::Rejected);
    assert_eq!(p.stage, Stage::Done);
    assert_eq!(p.current_payout, 250);
    assert_eq!(s.hub.punished(&creator), 5);
}

#[test]
fn test_alliance_payout_goes_to_escrow() {
    let s = Setup::new();
    let creator = s.account(MemberStatus::Resident, 1_000);
    let recipient = Address::generate(&s.env);
    let id = s.client.create_proposal(
        &creator,
        &recipient,
        &2_000,
        &Fund::Alliance,
        &s.text("alliance"),
        &Some(vec![&s.env, 10u32, 30, 30, 30]),
    );
    // 10% of 2000 = 200, inside [20, 200]
    assert_eq!(s.client.min_stake(&id), 200);
    s.client.stake(&creator, &Some(id), &200);
    s.fund(Fund::Alliance, 2_000);
    s.next_cycle();

    let voter = s.voter(300);
    s.client.favour(&voter, &id, &300);
    assert_eq!(s.client.voice_of(&voter, &crate::VoiceScope::Alliance), 0);
    assert_eq!(s.client.voice_of(&voter, &crate::VoiceScope::General), 300);
    s.next_cycle();

    assert_eq!(s.client.get_proposal(&id).current_payout, 200);
    assert_eq!(s.hub.locked(&recipient), 200);
    assert_eq!(s.token.balance(&s.hub.address), 200);
    assert_eq!(s.token.balance(&recipient), 0);
}

#[test]
fn test_invite_first_pass_funds_campaign() {
    let s = Setup::new();
    let creator = s.account(MemberStatus::Resident, 1_000);
    let recipient = Address::generate(&s.env);
    let terms = InviteTerms {
        max_amount_per_invite: 20,
        planted: 5,
        reward: 10,
    };
    let id = s
        .client
        .create_invite(&creator, &recipient, &700, &s.text("invites"), &terms);
    s.client.stake(&creator, &Some(id), &35);
    s.fund(Fund::Campaigns, 700);
    s.next_cycle();

    let voter = s.voter(100);
    s.client.favour(&voter, &id, &100);
    s.next_cycle();

    let p = s.client.get_proposal(&id);
    assert_eq!(p.status, Status::Evaluate);
    assert_eq!(p.campaign_id, 1);
    assert_eq!(p.current_payout, 700);
    let campaign = s.hub.campaign(&1).unwrap();
    assert_eq!(campaign.total, 700);
    assert_eq!(campaign.owner, creator);
    assert_eq!(campaign.reward_owner, recipient);
    assert_eq!(campaign.proposal_id, id);
    assert_eq!(s.token.balance(&s.hub.address), 700);

    // a later rejection hands the campaign funds back
    s.client.against(&voter, &id, &50);
    s.next_cycle();
    assert_eq!(s.client.get_proposal(&id).status, Status::Rejected);
    assert!(s.hub.returned(&1));
}

/// Proposal ids carried by `held` events, in order.
fn held_ids(s: &Setup) -> std::vec::Vec<u64> {
    let mut ids = std::vec::Vec::new();
    for (contract, topics, data) in s.env.events().all().iter() {
        if contract != s.client.address {
            continue;
        }
        let first: Symbol = topics.get_unchecked(0).try_into_val(&s.env).unwrap();
        if first == symbol_short!("held") {
            let held: EvaluationHeld = data.try_into_val(&s.env).unwrap();
            ids.push(held.proposal_id);
        }
    }
    ids
}

#[test]
fn test_exhausted_fund_holds_the_proposal() {
    let s = Setup::new();
    let creator = s.account(MemberStatus::Resident, 1_000);
    let id = s.propose(&creator, 1_000);
    s.client.stake(&creator, &Some(id), &100);
    s.fund(Fund::Campaigns, 100);
    s.next_cycle();

    let voter = s.voter(600);
    s.client.favour(&voter, &id, &600);
    s.advance_time(60);
    s.client.on_period();
    s.client.crank(&u32::MAX);
    assert_eq!(held_ids(&s), std::vec![id]);

    // nothing moved: stake, fund and stage are as before
    let p = s.client.get_proposal(&id);
    assert_eq!(p.status, Status::Open);
    assert_eq!(p.stage, Stage::Active);
    assert_eq!(p.staked, 100);
    assert_eq!(p.current_payout, 0);
    assert_eq!(s.client.fund_balance(&Fund::Campaigns), 100);
    assert_eq!(s.client.stage_ids(&Stage::Active, &0, &10), vec![&s.env, id]);

    // topped up, the next cycle picks it up (600 clears 5% of 600)
    s.fund(Fund::Campaigns, 1_000);
    s.next_cycle();
    let p = s.client.get_proposal(&id);
    assert_eq!(p.status, Status::Evaluate);
    assert_eq!(p.current_payout, 250);
    assert_eq!(p.passed_cycle, 2);
}

#[test]
fn test_mimic_chain_behind_a_held_evaluation_completes() {
    let s = Setup::new();
    let creator = s.account(MemberStatus::Resident, 1_000);
    let short = s.propose(&creator, 1_000);
    let other = s.propose(&creator, 1_000);
    s.client.stake(&creator, &Some(short), &100);
    s.client.stake(&creator, &Some(other), &100);
    s.fund(Fund::Campaigns, 100);
    s.next_cycle();

    let voter = s.voter(600);
    s.client.favour(&voter, &short, &600);
    let delegator = s.voter(200);
    let delegatee = s.voter(1_000);
    s.client.delegate(&delegator, &delegatee, &VoiceScope::General);

    s.advance_time(60);
    s.client.on_period();
    // queued after the evaluation, refresh and reward chains
    s.client.favour(&delegatee, &other, &500);
    let queue = s.client.task_queue();
    s.client.crank(&u32::MAX);

    assert!(s.client.task_queue().head >= queue.tail);
    assert_eq!(held_ids(&s).len(), 2);
    let mirrored = s.client.get_vote(&other, &delegator).unwrap();
    assert_eq!(mirrored.amount, 100);
    assert_eq!(s.client.get_proposal(&short).status, Status::Open);
}

#[test]
fn test_zero_eligible_voters_parks_evaluation_until_retried() {
    let s = Setup::new();
    let (_, _, id) = active_proposal(&s);

    s.advance_time(60);
    let evaluation = s.client.task_queue().tail;
    s.client.on_period();
    // the refresh and reward tasks behind it still run
    assert_eq!(s.client.crank(&u32::MAX), 3);
    assert!(s.client.pending_task(&evaluation).is_none());
    assert!(s.client.parked_task(&evaluation).is_some());
    assert_eq!(s.client.task_queue().head, s.client.task_queue().tail);
    assert_eq!(s.client.get_proposal(&id).status, Status::Open);

    s.client.set_counter(&CounterKind::ActiveUsers, &0, &3);
    let retried = s.client.retry_task(&evaluation);
    assert!(s.client.parked_task(&evaluation).is_none());
    assert!(s.client.pending_task(&retried).is_some());
    s.client.crank(&u32::MAX);

    // nobody voted: majority fails
    let p = s.client.get_proposal(&id);
    assert_eq!(p.status, Status::Rejected);
    assert_eq!(p.passed_cycle, 1);
    assert_eq!(
        s.client.try_retry_task(&evaluation),
        Err(Ok(Error::TaskNotFound))
    );
}

#[test]
fn test_staged_promotion_needs_no_eligible_voters() {
    let s = Setup::new();
    let creator = s.account(MemberStatus::Resident, 1_000);
    let id = s.propose(&creator, 1_000);
    s.client.stake(&creator, &Some(id), &100);
    assert_eq!(s.client.counter(&CounterKind::ActiveUsers, &0), 0);

    s.advance_time(60);
    s.client.on_period();
    s.client.crank(&u32::MAX);

    assert_eq!(s.client.get_proposal(&id).stage, Stage::Active);
    for task in 0..s.client.task_queue().tail {
        assert!(s.client.parked_task(&task).is_none());
    }
}

#[test]
fn test_sweeps_span_more_proposals_than_one_chunk() {
    let mut cfg = sample();
    cfg.batch_size = 2;
    let s = Setup::with_config(cfg);
    let creator = s.account(MemberStatus::Resident, 1_000);
    let ids: std::vec::Vec<u64> = (0..5)
        .map(|_| {
            let id = s.propose(&creator, 1_000);
            s.client.stake(&creator, &Some(id), &100);
            id
        })
        .collect();
    s.fund(Fund::Campaigns, 1_250);
    s.next_cycle();

    assert_eq!(s.client.stage_ids(&Stage::Active, &0, &10).len(), 5);
    assert!(s.client.stage_ids(&Stage::Staged, &0, &10).is_empty());
    assert_eq!(s.client.get_stats(&1).unwrap().num_proposals, 5);

    let voter = s.voter(1_000);
    for id in ids.iter() {
        s.client.favour(&voter, id, &100);
    }
    s.next_cycle();

    for id in ids.iter() {
        let p = s.client.get_proposal(id);
        assert_eq!(p.status, Status::Evaluate);
        assert_eq!(p.current_payout, 250);
    }
    assert_eq!(s.client.fund_balance(&Fund::Campaigns), 0);
    assert_eq!(s.client.get_stats(&2).unwrap().eval_props.len(), 5);
}

#[test]
fn test_oversized_quantity_is_refused() {
    let s = Setup::new();
    let creator = s.account(MemberStatus::Resident, 1_000);
    let recipient = Address::generate(&s.env);
    assert_eq!(
        s.client.try_create_proposal(
            &creator,
            &recipient,
            &(i128::MAX / 2),
            &Fund::Campaigns,
            &s.text("too much"),
            &None,
        ),
        Err(Ok(Error::InvalidQuantity))
    );
}

#[test]
fn test_quorum_base_averages_recent_cycles() {
    let s = Setup::new();
    let (_, _, id) = active_proposal(&s);
    let a = s.voter(300);
    s.client.favour(&a, &id, &300);
    s.next_cycle();
    assert_eq!(s.client.get_stats(&1).unwrap().total_voice_cast, 300);
    assert_eq!(s.client.get_stats(&2).unwrap().quorum_vote_base, 300);

    // distrust replacing the earlier trust is the only vote still accepted
    s.client.against(&a, &id, &100);
    s.next_cycle();
    // (300 + 100) / 2
    assert_eq!(s.client.get_stats(&3).unwrap().quorum_vote_base, 200);
}

#[test]
fn test_recompute_active_count() {
    let s = Setup::new();
    let (_, _, id) = active_proposal(&s);
    s.client.set_counter(&CounterKind::ActiveProposals, &0, &9);
    assert_eq!(s.client.recompute_active_count(), 1);
    assert_eq!(s.client.counter(&CounterKind::ActiveProposals, &0), 1);

    let voter = s.voter(600);
    s.client.favour(&voter, &id, &600);
    s.next_cycle();
    assert_eq!(s.client.recompute_active_count(), 0);
}

#[test]
fn test_participation_reward_for_full_coverage() {
    let s = Setup::new();
    let (_, _, id) = active_proposal(&s);
    let diligent = s.voter(100);
    let neutral = s.voter(100);
    s.client.favour(&diligent, &id, &50);
    s.client.neutral(&neutral, &id);
    assert_eq!(s.client.participant(&1, &diligent).unwrap().count, 1);

    s.next_cycle();

    // vote bonus 2 plus participation 3
    assert_eq!(s.hub.reputation_of(&diligent), 5);
    // abstaining earns neither
    assert_eq!(s.hub.reputation_of(&neutral), 0);
    assert!(s.client.participant(&1, &diligent).is_none());
    assert!(s.client.participant(&1, &neutral).is_none());
}

#[test]
fn test_votes_after_close_count_toward_the_new_cycle() {
    let s = Setup::new();
    let (_, _, id) = active_proposal(&s);
    let early = s.voter(100);
    s.client.favour(&early, &id, &50);

    s.advance_time(60);
    s.client.on_period();
    let late = s.voter(100);
    s.client.favour(&late, &id, &50);
    s.client.crank(&u32::MAX);

    assert!(s.client.participant(&1, &early).is_none());
    assert_eq!(s.hub.reputation_of(&early), 5);
    // recorded for cycle 2 and not rewarded yet
    assert_eq!(s.client.participant(&2, &late).unwrap().count, 1);
    assert_eq!(s.hub.reputation_of(&late), 2);
}
