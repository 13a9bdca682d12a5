//! Test harness: a single mock contract standing in for every external
//! collaborator, and a fixture that deploys the governance contract against
//! it with a Stellar asset as the staking token.

extern crate std;

use soroban_sdk::{
    contract, contractimpl, contracttype,
    testutils::{Address as _, Ledger},
    token::{self, StellarAssetClient},
    Address, Env, String, Symbol,
};

use crate::config::tests::sample;
use crate::{
    Collaborators, GovernanceConfig, MemberStatus, ProposalText, VoiceGovernance,
    VoiceGovernanceClient,
};

pub const START_TIME: u64 = 1_000_000;

// ── Mock collaborator ────────────────────────────────────────────────

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum HubKey {
    Status(Address),
    Rank(Address),
    Reputation(Address),
    Punished(Address),
    Locked(Address),
    NextCampaign,
    Campaign(u64),
    Returned(u64),
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CampaignRecord {
    pub owner: Address,
    pub reward_owner: Address,
    pub total: i128,
    pub proposal_id: u64,
}

/// Membership registry, rank source, reputation service, escrow and
/// campaign service in one contract.
#[contract]
pub struct MockHub;

#[contractimpl]
impl MockHub {
    pub fn set_status(env: Env, account: Address, status: MemberStatus) {
        env.storage().instance().set(&HubKey::Status(account), &status);
    }

    pub fn status_of(env: Env, account: Address) -> MemberStatus {
        env.storage()
            .instance()
            .get(&HubKey::Status(account))
            .unwrap_or(MemberStatus::Visitor)
    }

    pub fn set_rank(env: Env, account: Address, rank: u64) {
        env.storage().instance().set(&HubKey::Rank(account), &rank);
    }

    pub fn rank_of(env: Env, account: Address) -> u64 {
        env.storage()
            .instance()
            .get(&HubKey::Rank(account))
            .unwrap_or(0)
    }

    pub fn add_reputation(env: Env, account: Address, points: u32) {
        let key = HubKey::Reputation(account);
        let current: u32 = env.storage().instance().get(&key).unwrap_or(0);
        env.storage().instance().set(&key, &(current + points));
    }

    pub fn reputation_of(env: Env, account: Address) -> u32 {
        env.storage()
            .instance()
            .get(&HubKey::Reputation(account))
            .unwrap_or(0)
    }

    pub fn punish(env: Env, account: Address, points: u32) {
        let key = HubKey::Punished(account);
        let current: u32 = env.storage().instance().get(&key).unwrap_or(0);
        env.storage().instance().set(&key, &(current + points));
    }

    pub fn punished(env: Env, account: Address) -> u32 {
        env.storage()
            .instance()
            .get(&HubKey::Punished(account))
            .unwrap_or(0)
    }

    #[allow(clippy::too_many_arguments)]
    pub fn lock(
        env: Env,
        _category: Symbol,
        _funder: Address,
        recipient: Address,
        amount: i128,
        _condition: Symbol,
        _arbiter: Address,
        _expiry: u64,
        _memo: String,
    ) {
        let key = HubKey::Locked(recipient);
        let current: i128 = env.storage().instance().get(&key).unwrap_or(0);
        env.storage().instance().set(&key, &(current + amount));
    }

    pub fn locked(env: Env, recipient: Address) -> i128 {
        env.storage()
            .instance()
            .get(&HubKey::Locked(recipient))
            .unwrap_or(0)
    }

    #[allow(clippy::too_many_arguments)]
    pub fn create_campaign(
        env: Env,
        _origin: Address,
        owner: Address,
        _max_amount_per_invite: i128,
        _planted: i128,
        reward_owner: Address,
        _reward: i128,
        total: i128,
        proposal_id: u64,
    ) -> u64 {
        let id: u64 = env
            .storage()
            .instance()
            .get(&HubKey::NextCampaign)
            .unwrap_or(1);
        env.storage().instance().set(&HubKey::NextCampaign, &(id + 1));
        env.storage().instance().set(
            &HubKey::Campaign(id),
            &CampaignRecord {
                owner,
                reward_owner,
                total,
                proposal_id,
            },
        );
        id
    }

    pub fn campaign(env: Env, id: u64) -> Option<CampaignRecord> {
        env.storage().instance().get(&HubKey::Campaign(id))
    }

    pub fn return_funds(env: Env, campaign_id: u64) {
        env.storage()
            .instance()
            .set(&HubKey::Returned(campaign_id), &true);
    }

    pub fn returned(env: Env, campaign_id: u64) -> bool {
        env.storage()
            .instance()
            .get(&HubKey::Returned(campaign_id))
            .unwrap_or(false)
    }
}

// ── Fixture ──────────────────────────────────────────────────────────

pub struct Setup {
    pub env: Env,
    pub client: VoiceGovernanceClient<'static>,
    pub hub: MockHubClient<'static>,
    pub token: token::Client<'static>,
    pub minter: StellarAssetClient<'static>,
    pub admin: Address,
    pub arbiter: Address,
    pub milestone_recipient: Address,
}

impl Setup {
    pub fn new() -> Self {
        Self::with_config(sample())
    }

    pub fn with_config(config: GovernanceConfig) -> Self {
        let env = Env::default();
        env.mock_all_auths();
        env.ledger().with_mut(|l| l.timestamp = START_TIME);

        let contract_id = env.register(VoiceGovernance, ());
        let client = VoiceGovernanceClient::new(&env, &contract_id);
        let hub_id = env.register(MockHub, ());
        let hub = MockHubClient::new(&env, &hub_id);

        let token_admin = Address::generate(&env);
        let sac = env.register_stellar_asset_contract_v2(token_admin);
        let token = token::Client::new(&env, &sac.address());
        let minter = StellarAssetClient::new(&env, &sac.address());

        let admin = Address::generate(&env);
        let arbiter = Address::generate(&env);
        let milestone_recipient = Address::generate(&env);

        client.init(
            &admin,
            &config,
            &Collaborators {
                token: sac.address(),
                membership: hub_id.clone(),
                reputation: hub_id.clone(),
                rank_source: hub_id.clone(),
                escrow: hub_id.clone(),
                escrow_arbiter: arbiter.clone(),
                campaigns: hub_id,
                milestone_recipient: milestone_recipient.clone(),
            },
        );

        Setup {
            env,
            client,
            hub,
            token,
            minter,
            admin,
            arbiter,
            milestone_recipient,
        }
    }

    pub fn account(&self, status: MemberStatus, tokens: i128) -> Address {
        let account = Address::generate(&self.env);
        self.hub.set_status(&account, &status);
        if tokens > 0 {
            self.minter.mint(&account, &tokens);
        }
        account
    }

    /// A citizen holding `voice` in both scopes, with a matching rank so a
    /// refresh keeps the balance.
    pub fn voter(&self, voice: u64) -> Address {
        let account = self.account(MemberStatus::Citizen, 0);
        self.hub.set_rank(&account, &voice);
        self.client.grant_voice(&account, &voice);
        account
    }

    pub fn text(&self, title: &str) -> ProposalText {
        ProposalText {
            title: String::from_str(&self.env, title),
            summary: String::from_str(&self.env, "summary"),
            description: String::from_str(&self.env, "description"),
            image: String::from_str(&self.env, ""),
            url: String::from_str(&self.env, "https://example.org"),
        }
    }

    pub fn fund(&self, fund: crate::Fund, amount: i128) {
        let donor = self.account(MemberStatus::Visitor, amount);
        self.client.fund_deposit(&donor, &fund, &amount);
    }

    /// Campaign proposal with the default schedule.
    pub fn propose(&self, creator: &Address, quantity: i128) -> u64 {
        let recipient = Address::generate(&self.env);
        self.client.create_proposal(
            creator,
            &recipient,
            &quantity,
            &crate::Fund::Campaigns,
            &self.text("proposal"),
            &None,
        )
    }

    pub fn advance_time(&self, secs: u64) {
        self.env.ledger().with_mut(|l| l.timestamp += secs);
    }

    /// Close the cycle and drain every due task.
    pub fn next_cycle(&self) -> u32 {
        self.advance_time(60);
        let cycle = self.client.on_period();
        self.client.crank(&u32::MAX);
        cycle
    }
}
