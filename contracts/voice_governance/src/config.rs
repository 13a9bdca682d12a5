//! Governance parameter validation and the derived quantities read from it.

use crate::types::{FundType, GovernanceConfig, StakeRule};
use crate::Error;

const BPS: i128 = 10_000;

/// Reject configurations the cycle controller cannot run with.
pub fn validate(cfg: &GovernanceConfig) -> Result<(), Error> {
    let ok = cfg.batch_size > 0
        && cfg.majority_pct <= 100
        && cfg.decay_pct <= 100
        && cfg.quorum_min_pct <= cfg.quorum_max_pct
        && cfg.quorum_max_pct <= 100
        && cfg.decay_period_secs > 0
        && cfg.delegated_rep_pct <= 100
        && cfg.invite_min_planted >= 0
        && cfg.invite_max_reward > 0
        && valid_rule(&cfg.campaign_stake)
        && valid_rule(&cfg.milestone_stake)
        && valid_rule(&cfg.alliance_stake);
    if ok {
        Ok(())
    } else {
        Err(Error::InvalidConfig)
    }
}

fn valid_rule(rule: &StakeRule) -> bool {
    rule.min >= 0 && rule.min <= rule.max && rule.max <= rule.cap && rule.pct_bps <= 10_000
}

pub fn stake_rule(cfg: &GovernanceConfig, fund_type: FundType) -> &StakeRule {
    match fund_type {
        FundType::Campaign => &cfg.campaign_stake,
        FundType::Milestone => &cfg.milestone_stake,
        FundType::Alliance => &cfg.alliance_stake,
    }
}

/// `quantity * pct` clamped into `[min, max]`.
pub fn min_stake(rule: &StakeRule, quantity: i128) -> i128 {
    let share = quantity.saturating_mul(rule.pct_bps as i128) / BPS;
    share.max(rule.min).min(rule.max)
}

/// Quorum percentage for `active` proposals. Zero proposals yield 0 before clamping.
pub fn quorum_pct(cfg: &GovernanceConfig, active: u32) -> u64 {
    let raw = if active == 0 {
        0
    } else {
        cfg.quorum_base / active
    };
    raw.clamp(cfg.quorum_min_pct, cfg.quorum_max_pct) as u64
}

/// Inactivity window in seconds.
pub fn inactivity_secs(cfg: &GovernanceConfig) -> u64 {
    (cfg.inactive_cycles as u64).saturating_mul(cfg.cycle_secs)
}
