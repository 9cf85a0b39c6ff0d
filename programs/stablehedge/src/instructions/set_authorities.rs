//! SetAuthorities instruction handler
//!
//! Governor-gated rotation of protocol authorities: the governor and
//! guardian on the controller, a pool's oracle authority, and a market's
//! rewards distributor.

use {
    crate::{
        error::StablehedgeError,
        state::{collateral::CollateralPool, core::StableController, hedge_market::HedgeMarket},
    },
    anchor_lang::prelude::*,
};

/// Accounts required for rotating authorities
#[derive(Accounts)]
pub struct SetAuthorities<'info> {
    /// Current governor (signer)
    pub governor: Signer<'info>,

    /// Controller account (mutable)
    #[account(
        mut,
        seeds = [b"controller"],
        bump = controller.bump,
        constraint = controller.is_governor(&governor.key()) @ StablehedgeError::UnauthorizedCaller
    )]
    pub controller: Box<Account<'info, StableController>>,

    /// Collateral pool (mutable)
    #[account(
        mut,
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

/// Parameters for rotating authorities; omitted fields are unchanged
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy)]
pub struct SetAuthoritiesParams {
    /// New governor
    pub governor: Option<Pubkey>,
    /// New guardian
    pub guardian: Option<Pubkey>,
    /// New oracle authority for this pool
    pub oracle_authority: Option<Pubkey>,
    /// New rewards distributor for this market
    pub rewards_distributor: Option<Pubkey>,
}

pub fn set_authorities(ctx: Context<SetAuthorities>, params: &SetAuthoritiesParams) -> Result<()> {
    let controller = ctx.accounts.controller.as_mut();
    let pool = ctx.accounts.pool.as_mut();
    let market = ctx.accounts.hedge_market.as_mut();

    if let Some(governor) = params.governor {
        require!(
            governor != Pubkey::default(),
            StablehedgeError::InvalidParameter
        );
        controller.governor = governor;
    }
    if let Some(guardian) = params.guardian {
        require!(
            guardian != Pubkey::default(),
            StablehedgeError::InvalidParameter
        );
        controller.guardian = guardian;
    }
    if let Some(authority) = params.oracle_authority {
        pool.oracle.oracle_authority = authority;
    }
    if let Some(distributor) = params.rewards_distributor {
        market.rewards.rewards_distributor = distributor;
    }

    Ok(())
}
