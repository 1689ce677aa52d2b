use crate::error::VaultError;
use crate::math::tick_math::{MAX_TICK, MIN_TICK};
use alloy_primitives::{Address, U256};
use serde::{Deserialize, Serialize};

/// When the protocol fee is taken out of collected trading fees.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeeSkim {
    /// Every zero-burn forwards `collected / fee` per range.
    #[default]
    OnZeroBurn,
    /// Only the fees collected while rebalancing are skimmed.
    OnRebalance,
}

/// A `[tick_lower, tick_upper)` range aligned to the pool's tick spacing.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PositionRange {
    pub tick_lower: i32,
    pub tick_upper: i32,
}

impl PositionRange {
    pub fn new(tick_lower: i32, tick_upper: i32, tick_spacing: i32) -> Result<Self, VaultError> {
        let range = Self {
            tick_lower,
            tick_upper,
        };
        range.validate(tick_spacing)?;
        Ok(range)
    }

    pub fn validate(&self, tick_spacing: i32) -> Result<(), VaultError> {
        let invalid = VaultError::InvalidRange(self.tick_lower, self.tick_upper);
        if tick_spacing <= 0
            || self.tick_lower >= self.tick_upper
            || self.tick_lower < MIN_TICK
            || self.tick_upper > MAX_TICK
            || self.tick_lower % tick_spacing != 0
            || self.tick_upper % tick_spacing != 0
        {
            return Err(invalid);
        }
        Ok(())
    }

    pub fn contains(&self, tick: i32) -> bool {
        self.tick_lower <= tick && tick < self.tick_upper
    }
}

fn default_deposit_max() -> U256 {
    U256::MAX
}

fn default_fee() -> u8 {
    10
}

/// Owner-controlled settings of a vault.
///
/// Loaded from JSON (or any serde format) with omitted fields falling back
/// to their defaults. Run [`HypervisorConfig::validate`] after loading.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HypervisorConfig {
    pub owner: Address,
    /// The only account allowed to deposit. Zero disables deposits.
    #[serde(default)]
    pub whitelisted_address: Address,
    #[serde(default = "default_deposit_max")]
    pub deposit0_max: U256,
    #[serde(default = "default_deposit_max")]
    pub deposit1_max: U256,
    /// Zero means uncapped.
    #[serde(default)]
    pub max_total_supply: U256,
    #[serde(default)]
    pub direct_deposit: bool,
    /// Protocol fee denominator: `1 / fee` of collected fees is skimmed.
    #[serde(default = "default_fee")]
    pub fee: u8,
    pub fee_recipient: Address,
    #[serde(default)]
    pub fee_skim: FeeSkim,
}

impl HypervisorConfig {
    pub fn new(owner: Address) -> Self {
        Self {
            owner,
            whitelisted_address: Address::ZERO,
            deposit0_max: default_deposit_max(),
            deposit1_max: default_deposit_max(),
            max_total_supply: U256::ZERO,
            direct_deposit: false,
            fee: default_fee(),
            fee_recipient: owner,
            fee_skim: FeeSkim::default(),
        }
    }

    pub fn validate(&self) -> Result<(), VaultError> {
        if self.owner.is_zero() || self.fee_recipient.is_zero() {
            return Err(VaultError::InvalidRecipient);
        }
        if self.fee == 0 {
            return Err(VaultError::InvalidFee);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const OWNER: Address = Address::repeat_byte(0x01);

    #[test]
    fn new_config_uses_defaults() {
        let config = HypervisorConfig::new(OWNER);
        assert_eq!(config.fee, 10);
        assert_eq!(config.fee_recipient, OWNER);
        assert_eq!(config.deposit0_max, U256::MAX);
        assert!(config.whitelisted_address.is_zero());
        assert_eq!(config.fee_skim, FeeSkim::OnZeroBurn);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn zero_fee_is_rejected() {
        let mut config = HypervisorConfig::new(OWNER);
        config.fee = 0;
        assert_eq!(config.validate(), Err(VaultError::InvalidFee));
    }

    #[test]
    fn zero_owner_is_rejected() {
        let mut config = HypervisorConfig::new(OWNER);
        config.owner = Address::ZERO;
        assert_eq!(config.validate(), Err(VaultError::InvalidRecipient));
    }

    #[test]
    fn config_deserializes_with_defaults() {
        let json = r#"{
            "owner": "0x0101010101010101010101010101010101010101",
            "fee_recipient": "0x0202020202020202020202020202020202020202",
            "fee_skim": "on_rebalance"
        }"#;
        let config: HypervisorConfig = serde_json::from_str(json).unwrap();

        assert_eq!(config.owner, OWNER);
        assert_eq!(config.fee, 10);
        assert_eq!(config.deposit1_max, U256::MAX);
        assert_eq!(config.max_total_supply, U256::ZERO);
        assert_eq!(config.fee_skim, FeeSkim::OnRebalance);
        assert!(!config.direct_deposit);
    }

    #[test]
    fn config_survives_a_json_round_trip() {
        let mut config = HypervisorConfig::new(OWNER);
        config.direct_deposit = true;
        config.max_total_supply = U256::from(1_000_000u64);

        let json = serde_json::to_string(&config).unwrap();
        let back: HypervisorConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
    }

    #[test]
    fn range_must_be_ordered_and_aligned() {
        assert!(PositionRange::new(-600, 600, 60).is_ok());
        assert_eq!(
            PositionRange::new(600, -600, 60),
            Err(VaultError::InvalidRange(600, -600))
        );
        assert_eq!(
            PositionRange::new(-600, -600, 60),
            Err(VaultError::InvalidRange(-600, -600))
        );
        assert_eq!(
            PositionRange::new(-610, 600, 60),
            Err(VaultError::InvalidRange(-610, 600))
        );
        assert!(PositionRange::new(-887280, 600, 60).is_err());
    }

    #[test]
    fn range_contains_is_half_open() {
        let range = PositionRange::new(-60, 60, 60).unwrap();
        assert!(range.contains(-60));
        assert!(range.contains(59));
        assert!(!range.contains(60));
    }
}
