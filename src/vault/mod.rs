//! The Hypervisor vault and its parts.

pub mod accessor;
pub mod config;
pub mod guard;
pub mod hooks;
pub mod hypervisor;
pub mod settlement;
pub mod shares;

pub use config::{FeeSkim, HypervisorConfig, PositionRange};
pub use hooks::{GaugeRewards, NoRewards, RewardHook, StakedRange};
pub use hypervisor::{Hypervisor, PositionAmounts, PulledLiquidity};
