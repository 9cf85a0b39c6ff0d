use anchor_lang::prelude::*;

#[error_code]
pub enum StablehedgeError {
    #[msg("Math overflow")]
    MathOverflow,
    #[msg("Invalid oracle account")]
    InvalidOracleAccount,
    #[msg("Stale oracle rate")]
    StaleOracleRate,
    #[msg("Invalid oracle rate")]
    InvalidOracleRate,
    #[msg("Amount cannot be zero")]
    ZeroAmount,
    #[msg("Fee curve breakpoints are malformed")]
    InvalidFeeCurve,
    #[msg("Parameter out of range")]
    InvalidParameter,
    #[msg("Instruction is not allowed for this pool")]
    InstructionNotAllowed,
    #[msg("Returned amount is below the requested minimum")]
    SlippageExceeded,
    #[msg("Oracle rate is above the caller's maximum")]
    RateAboveMax,
    #[msg("Cap on stablecoin issuance for this pool exceeded")]
    StocksUsersCapExceeded,
    #[msg("Burn amount exceeds collateral attributed to stable holders")]
    BurnExceedsStocksUsers,
    #[msg("Pool reserves cannot cover the requested amount")]
    InsufficientReserves,
    #[msg("Position leverage exceeds the maximum")]
    MaxLeverageExceeded,
    #[msg("Position value is at or below the maintenance margin")]
    BelowMaintenanceMargin,
    #[msg("Position is not liquidatable")]
    PositionNotLiquidatable,
    #[msg("Position lock time has not elapsed")]
    LockTimeNotElapsed,
    #[msg("Hedging market is at or above its target coverage")]
    OverHedged,
    #[msg("Hedging market is within its limit coverage")]
    NotOverHedged,
    #[msg("Requested amount exceeds the position's value")]
    TooMuchRequested,
    #[msg("Reward exceeds the distributor's balance")]
    RewardExceedsBalance,
    #[msg("Previous reward period has not finished")]
    DurationNotElapsed,
    #[msg("Aggregate strategy debt ratio exceeds 100%")]
    DebtRatioTooHigh,
    #[msg("Caller is not authorized for this operation")]
    UnauthorizedCaller,
    #[msg("San rate hit its floor; SLP actions are paused")]
    SanRateFloored,
    #[msg("Reported amounts are not backed by the strategy balance")]
    UnbackedReport,
}
