//! SetOracleRate instruction handler
//!
//! The pool's oracle authority pushes a fresh rate bracket (spot, EMA and
//! confidence) on-chain. Consumers validate staleness and confidence at
//! read time.

use {
    crate::{
        error::StablehedgeError,
        state::{collateral::CollateralPool, core::StableController, oracle::RateOracle},
    },
    anchor_lang::prelude::*,
};

/// Accounts required for pushing an oracle rate
#[derive(Accounts)]
pub struct SetOracleRate<'info> {
    /// Oracle authority for this pool (signer)
    pub authority: Signer<'info>,

    /// Controller account
    #[account(
        seeds = [b"controller"],
        bump = controller.bump
    )]
    pub controller: Box<Account<'info, StableController>>,

    /// Collateral pool owning the oracle
    #[account(
        seeds = [b"pool", pool.collateral_mint.as_ref()],
        bump = pool.bump,
        constraint = pool.oracle.oracle_authority == authority.key()
            @ StablehedgeError::UnauthorizedCaller
    )]
    pub pool: Box<Account<'info, CollateralPool>>,

    /// Rate oracle account (mutable)
    #[account(
        mut,
        seeds = [b"rate_oracle", pool.key().as_ref()],
        bump = rate_oracle.bump,
        constraint = rate_oracle.key() == pool.oracle.oracle_account
    )]
    pub rate_oracle: Box<Account<'info, RateOracle>>,
}

/// Parameters for pushing an oracle rate
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy)]
pub struct SetOracleRateParams {
    /// Spot rate mantissa
    pub rate: u64,
    /// EMA rate mantissa
    pub ema_rate: u64,
    /// Shared exponent
    pub expo: i32,
    /// Confidence interval around the spot rate
    pub conf: u64,
}

pub fn set_oracle_rate(ctx: Context<SetOracleRate>, params: &SetOracleRateParams) -> Result<()> {
    require!(
        params.rate > 0 && params.ema_rate > 0,
        StablehedgeError::InvalidOracleRate
    );

    let publish_time = ctx.accounts.controller.get_time()?;
    ctx.accounts.rate_oracle.set(
        params.rate,
        params.ema_rate,
        params.expo,
        params.conf,
        publish_time,
    );

    Ok(())
}
