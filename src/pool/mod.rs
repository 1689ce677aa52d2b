pub mod interface;
#[cfg(feature = "onchain")]
pub mod onchain;
pub mod v3_pool;

pub use interface::{ConcentratedPool, MintCallback, PositionInfo, PositionKeyFormat, Slot0};
