//! SetFeeCurves instruction handler
//!
//! Governor-gated replacement of the piecewise-linear fee curves. All
//! monotonicity and length checks happen here, at the configuration
//! boundary; the interpolation hot path assumes valid curves.

use {
    crate::{
        error::StablehedgeError,
        state::{
            collateral::CollateralPool, core::StableController, fee_curve::PiecewiseCurve,
            hedge_market::HedgeMarket,
        },
    },
    anchor_lang::prelude::*,
};

/// Accounts required for replacing fee curves
#[derive(Accounts)]
pub struct SetFeeCurves<'info> {
    /// Governor (signer)
    pub governor: Signer<'info>,

    /// Controller account
    #[account(
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

/// Parameters for replacing fee curves; omitted curves are unchanged
#[derive(AnchorSerialize, AnchorDeserialize, Clone)]
pub struct SetFeeCurvesParams {
    /// Mint fee curve keyed on the hedge ratio
    pub mint_fee_curve: Option<PiecewiseCurve>,
    /// Burn fee curve keyed on the post-burn hedge ratio
    pub burn_fee_curve: Option<PiecewiseCurve>,
    /// Hedging-agent entry fee curve keyed on coverage room
    pub entry_fee_curve: Option<PiecewiseCurve>,
    /// Hedging-agent exit fee curve keyed on post-removal hedge ratio
    pub exit_fee_curve: Option<PiecewiseCurve>,
}

pub fn set_fee_curves(ctx: Context<SetFeeCurves>, params: &SetFeeCurvesParams) -> Result<()> {
    let pool = ctx.accounts.pool.as_mut();
    let market = ctx.accounts.hedge_market.as_mut();

    if let Some(curve) = &params.mint_fee_curve {
        require!(curve.validate(), StablehedgeError::InvalidFeeCurve);
        pool.mint_fee_curve = curve.clone();
    }
    if let Some(curve) = &params.burn_fee_curve {
        require!(curve.validate(), StablehedgeError::InvalidFeeCurve);
        pool.burn_fee_curve = curve.clone();
    }
    if let Some(curve) = &params.entry_fee_curve {
        require!(curve.validate(), StablehedgeError::InvalidFeeCurve);
        market.entry_fee_curve = curve.clone();
    }
    if let Some(curve) = &params.exit_fee_curve {
        require!(curve.validate(), StablehedgeError::InvalidFeeCurve);
        market.exit_fee_curve = curve.clone();
    }

    Ok(())
}
