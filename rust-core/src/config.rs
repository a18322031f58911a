use crate::error::{LedgerError, Result};
use crate::types::{Address, Amount, ONE_ETHER};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GenesisConfig {
    pub owner: Address,
    /// Registered, funded and accepted at genesis without a stake.
    pub first_airline: Address,
    #[serde(default)]
    pub authorized_callers: Vec<Address>,
    #[serde(default)]
    pub airlines: AirlinePolicy,
    #[serde(default)]
    pub insurance: InsurancePolicy,
    #[serde(default)]
    pub oracles: OraclePolicy,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AirlinePolicy {
    #[serde(default = "default_min_stake")]
    pub min_stake: Amount,
    /// The first N airlines are accepted on registration.
    #[serde(default = "default_bootstrap_airlines")]
    pub bootstrap_airlines: u32,
    /// Acceptance requires strictly more votes than this.
    #[serde(default = "default_acceptance_threshold")]
    pub acceptance_threshold: u32,
}

fn default_min_stake() -> Amount {
    10 * ONE_ETHER
}

fn default_bootstrap_airlines() -> u32 {
    4
}

fn default_acceptance_threshold() -> u32 {
    1
}

impl Default for AirlinePolicy {
    fn default() -> Self {
        Self {
            min_stake: default_min_stake(),
            bootstrap_airlines: default_bootstrap_airlines(),
            acceptance_threshold: default_acceptance_threshold(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayoutTier {
    pub name: String,
    /// Smallest premium that lands in this tier.
    pub min_premium: Amount,
    /// Payout as a percentage of the premium (150 = 1.5x).
    pub multiplier_pct: u64,
}

impl PayoutTier {
    pub fn new(name: &str, min_premium: Amount, multiplier_pct: u64) -> Self {
        Self {
            name: name.to_string(),
            min_premium,
            multiplier_pct,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct InsurancePolicy {
    /// Ascending by `min_premium`, first tier starts at 0.
    #[serde(default = "default_tiers")]
    pub tiers: Vec<PayoutTier>,
    /// `None` disables the cap.
    #[serde(default = "default_max_premium")]
    pub max_premium: Option<Amount>,
}

fn default_tiers() -> Vec<PayoutTier> {
    vec![
        PayoutTier::new("simple", 0, 150),
        PayoutTier::new("plus", ONE_ETHER / 2, 200),
    ]
}

fn default_max_premium() -> Option<Amount> {
    Some(ONE_ETHER)
}

impl Default for InsurancePolicy {
    fn default() -> Self {
        Self {
            tiers: default_tiers(),
            max_premium: default_max_premium(),
        }
    }
}

impl InsurancePolicy {
    /// Tier with the largest `min_premium` not above `amount`.
    pub fn tier_for(&self, amount: Amount) -> &PayoutTier {
        self.tiers
            .iter()
            .rev()
            .find(|t| t.min_premium <= amount)
            .unwrap_or(&self.tiers[0])
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct OraclePolicy {
    #[serde(default = "default_registration_fee")]
    pub registration_fee: Amount,
    /// Indexes are drawn from `0..index_range`.
    #[serde(default = "default_index_range")]
    pub index_range: u8,
    /// Matching reports needed to finalize a request.
    #[serde(default = "default_min_responses")]
    pub min_responses: usize,
    /// Seed for index draws; OS entropy when absent.
    #[serde(default)]
    pub seed: Option<u64>,
}

fn default_registration_fee() -> Amount {
    ONE_ETHER
}

fn default_index_range() -> u8 {
    10
}

fn default_min_responses() -> usize {
    3
}

impl Default for OraclePolicy {
    fn default() -> Self {
        Self {
            registration_fee: default_registration_fee(),
            index_range: default_index_range(),
            min_responses: default_min_responses(),
            seed: None,
        }
    }
}

impl GenesisConfig {
    pub fn new(owner: Address, first_airline: Address) -> Self {
        Self {
            owner,
            first_airline,
            authorized_callers: Vec::new(),
            airlines: AirlinePolicy::default(),
            insurance: InsurancePolicy::default(),
            oracles: OraclePolicy::default(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.oracles.index_range < 3 {
            return Err(invalid("oracles.index_range must allow three distinct indexes"));
        }
        if self.oracles.min_responses == 0 {
            return Err(invalid("oracles.min_responses must be at least 1"));
        }
        let tiers = &self.insurance.tiers;
        let Some(first) = tiers.first() else {
            return Err(invalid("insurance.tiers must not be empty"));
        };
        if first.min_premium != 0 {
            return Err(invalid("first insurance tier must start at 0"));
        }
        if tiers.windows(2).any(|w| w[0].min_premium >= w[1].min_premium) {
            return Err(invalid("insurance.tiers must be strictly ascending by min_premium"));
        }
        if self.insurance.max_premium == Some(0) {
            return Err(invalid("insurance.max_premium of 0 rejects every premium"));
        }
        Ok(())
    }
}

fn invalid(msg: &str) -> LedgerError {
    LedgerError::InvalidConfig(msg.to_string())
}
