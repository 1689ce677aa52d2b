use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum MathError {
    #[error("Math error - overflow")]
    Overflow,
    #[error("Math error - underflow")]
    Underflow,
    #[error("Math error - out of bounds")]
    OutOfBounds,
    #[error("Math error - division by zero")]
    DivisionByZero,
    #[error("BitMath error - zero input value")]
    ZeroValue,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum StateError {
    #[error("State error - sqrtPrice out of bounds")]
    SqrtPriceOutOfBounds,
    #[error("State error - sqrtRatio is 0")]
    SqrtRatioIsZero,

    #[error("State error - tick out of bounds")]
    TickOutOfBounds,

    #[error("State error - tickLower must be below tickUpper")]
    InvalidTickRange,
    #[error("State error - tick {0} is not a multiple of the tick spacing")]
    TickMisaligned(i32),

    #[error("State error - no position with liquidity at this range")]
    NoPosition,
    #[error("State error - liquidity exceeds the maximum per tick")]
    LiquidityExceedsMax,

    #[error("State error - mint callback paid too little token0")]
    InsufficientPayment0,
    #[error("State error - mint callback paid too little token1")]
    InsufficientPayment1,

    #[error("State error - observation older than the oldest recorded")]
    ObservationTooOld,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TokenError {
    #[error("Token error - insufficient balance")]
    InsufficientBalance,
    #[error("Token error - insufficient allowance")]
    InsufficientAllowance,
}

/// Caller-supplied preconditions. Always detected before any state changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum VaultError {
    #[error("Vault error - both deposit amounts are zero")]
    ZeroDeposit,
    #[error("Vault error - deposit exceeds the configured maximum")]
    DepositExceedsMax,
    #[error("Vault error - invalid recipient")]
    InvalidRecipient,
    #[error("Vault error - caller is not authorized")]
    Unauthorized,
    #[error("Vault error - shares must be non-zero")]
    ZeroShares,
    #[error("Vault error - holder owns fewer shares than requested")]
    InsufficientShares,
    #[error("Vault error - range [{0}, {1}) is malformed or misaligned")]
    InvalidRange(i32, i32),
    #[error("Vault error - base and limit ranges are identical")]
    IdenticalRanges,
    #[error("Vault error - deposit would exceed the max total supply")]
    MaxTotalSupplyExceeded,
    #[error("Vault error - fee denominator must be at least 1")]
    InvalidFee,
    #[error("Vault error - reentrant call")]
    Reentrancy,
    #[error("Vault error - twap window must be non-zero")]
    InvalidTwapWindow,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SlippageError {
    #[error("Slippage error - minted amounts below minimum")]
    MintBelowMinimum,
    #[error("Slippage error - burned amounts below minimum")]
    BurnBelowMinimum,
}

/// Security-critical failures of the mint payment protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum IntegrityError {
    #[error("Integrity error - mint callback from unexpected caller")]
    UnexpectedCallbackCaller,
    #[error("Integrity error - mint callback without a mint in flight")]
    NoMintInFlight,
    #[error("Integrity error - mint callback payload does not match the pending mint")]
    CallbackMismatch,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Error {
    #[error(transparent)]
    MathError(#[from] MathError),

    #[error(transparent)]
    StateError(#[from] StateError),

    #[error(transparent)]
    TokenError(#[from] TokenError),

    #[error(transparent)]
    VaultError(#[from] VaultError),

    #[error(transparent)]
    SlippageError(#[from] SlippageError),

    #[error(transparent)]
    IntegrityError(#[from] IntegrityError),
}

impl Error {
    /// Integrity violations must never be retried.
    pub fn is_integrity_violation(&self) -> bool {
        matches!(self, Error::IntegrityError(_))
    }
}

#[cfg(feature = "onchain")]
#[derive(Debug, Error)]
pub enum OnchainError {
    #[error("Onchain error - failed to get slot0: {0}")]
    FailedToGetSlot0(String),
    #[error("Onchain error - failed to get tick spacing: {0}")]
    FailedToGetTickSpacing(String),
    #[error("Onchain error - failed to get position: {0}")]
    FailedToGetPosition(String),
    #[error("Onchain error - failed to get token: {0}")]
    FailedToGetToken(String),
}
