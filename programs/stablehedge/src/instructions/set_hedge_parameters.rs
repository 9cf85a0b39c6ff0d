//! SetHedgeParameters instruction handler
//!
//! Governor-gated updates to the hedging market's risk and keeper
//! parameters. The rewards duration can only change between distribution
//! periods.

use {
    crate::{
        error::StablehedgeError,
        state::{collateral::CollateralPool, core::StableController, hedge_market::HedgeMarket},
    },
    anchor_lang::prelude::*,
};

/// Accounts required for updating hedge parameters
#[derive(Accounts)]
pub struct SetHedgeParameters<'info> {
    /// Governor (signer)
    pub governor: Signer<'info>,

    /// Controller account
    #[account(
        seeds = [b"controller"],
        bump = controller.bump,
        constraint = controller.is_governor(&governor.key()) @ StablehedgeError::UnauthorizedCaller
    )]
    pub controller: Box<Account<'info, StableController>>,

    /// Collateral pool of the market
    #[account(
        seeds = [b"pool", pool.collateral_mint.as_ref()],
        bump = pool.bump
    )]
    pub pool: Box<Account<'info, CollateralPool>>,

    /// Hedging market (mutable)
    #[account(
        mut,
        seeds = [b"hedge_market", pool.key().as_ref()],
        bump = hedge_market.bump
    )]
    pub hedge_market: Box<Account<'info, HedgeMarket>>,
}

/// Parameters for updating a market; omitted fields are unchanged
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy)]
pub struct SetHedgeParametersParams {
    /// Fraction of stocks_users that should be hedged (RATE)
    pub target_hedge_ratio: Option<u64>,
    /// Force-close trigger (RATE, >= target)
    pub limit_hedge_ratio: Option<u64>,
    /// Maximum committed/margin leverage (RATE)
    pub max_leverage: Option<u64>,
    /// Liquidation threshold (RATE)
    pub maintenance_margin: Option<u64>,
    /// Minimum holding period in seconds
    pub lock_time: Option<i64>,
    /// Keeper liquidation fee fraction (RATE)
    pub keeper_fees_liquidation_ratio: Option<u64>,
    /// Keeper liquidation fee cap, collateral units
    pub keeper_fees_liquidation_cap: Option<u64>,
    /// Keeper force-close fee fraction of exit fees (RATE)
    pub keeper_fees_closing_ratio: Option<u64>,
    /// Keeper force-close fee cap, collateral units
    pub keeper_fees_closing_cap: Option<u64>,
    /// Reward period length in seconds (only between periods)
    pub rewards_duration: Option<i64>,
}

pub fn set_hedge_parameters(
    ctx: Context<SetHedgeParameters>,
    params: &SetHedgeParametersParams,
) -> Result<()> {
    let market = ctx.accounts.hedge_market.as_mut();

    if let Some(target) = params.target_hedge_ratio {
        market.target_hedge_ratio = target;
    }
    if let Some(limit) = params.limit_hedge_ratio {
        market.limit_hedge_ratio = limit;
    }
    if let Some(max_leverage) = params.max_leverage {
        market.max_leverage = max_leverage;
    }
    if let Some(maintenance) = params.maintenance_margin {
        market.maintenance_margin = maintenance;
    }
    if let Some(lock_time) = params.lock_time {
        market.lock_time = lock_time;
    }
    if let Some(ratio) = params.keeper_fees_liquidation_ratio {
        market.keeper_fees_liquidation_ratio = ratio;
    }
    if let Some(cap) = params.keeper_fees_liquidation_cap {
        market.keeper_fees_liquidation_cap = cap;
    }
    if let Some(ratio) = params.keeper_fees_closing_ratio {
        market.keeper_fees_closing_ratio = ratio;
    }
    if let Some(cap) = params.keeper_fees_closing_cap {
        market.keeper_fees_closing_cap = cap;
    }
    if let Some(duration) = params.rewards_duration {
        let curtime = ctx.accounts.controller.get_time()?;
        market.rewards.set_rewards_duration(duration, curtime)?;
    }

    if !market.validate() {
        return err!(StablehedgeError::InvalidParameter);
    }

    Ok(())
}
