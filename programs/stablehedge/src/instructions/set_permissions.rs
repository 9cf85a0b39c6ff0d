//! SetPermissions instruction handler
//!
//! Guardian-gated pause registry: the stable (mint/burn), SLP
//! (deposit/withdraw) and hedging (open/close) action classes are paused
//! and resumed independently, per pool. Liquidations and force closes
//! stay permissionless regardless.

use {
    crate::{
        error::StablehedgeError,
        state::{collateral::CollateralPool, core::StableController, hedge_market::HedgeMarket},
    },
    anchor_lang::prelude::*,
};

/// Accounts required for updating permissions
#[derive(Accounts)]
pub struct SetPermissions<'info> {
    /// Guardian or governor (signer)
    pub guardian: Signer<'info>,

    /// Controller account
    #[account(
        seeds = [b"controller"],
        bump = controller.bump,
        constraint = controller.is_guardian(&guardian.key()) @ StablehedgeError::UnauthorizedCaller
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

/// Parameters for updating permissions; omitted flags are unchanged
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy)]
pub struct SetPermissionsParams {
    /// Allow stablecoin minting
    pub allow_mint: Option<bool>,
    /// Allow stablecoin burning
    pub allow_burn: Option<bool>,
    /// Allow SLP deposits
    pub allow_deposit: Option<bool>,
    /// Allow SLP withdrawals
    pub allow_withdraw: Option<bool>,
    /// Allow opening positions and adding margin
    pub allow_open: Option<bool>,
    /// Allow cashing out and removing margin
    pub allow_close: Option<bool>,
}

pub fn set_permissions(ctx: Context<SetPermissions>, params: &SetPermissionsParams) -> Result<()> {
    let pool = ctx.accounts.pool.as_mut();
    let market = ctx.accounts.hedge_market.as_mut();

    if let Some(allow) = params.allow_mint {
        pool.allow_mint = allow;
    }
    if let Some(allow) = params.allow_burn {
        pool.allow_burn = allow;
    }
    if let Some(allow) = params.allow_deposit {
        pool.allow_deposit = allow;
    }
    if let Some(allow) = params.allow_withdraw {
        pool.allow_withdraw = allow;
    }
    if let Some(allow) = params.allow_open {
        market.allow_open = allow;
    }
    if let Some(allow) = params.allow_close {
        market.allow_close = allow;
    }

    Ok(())
}
