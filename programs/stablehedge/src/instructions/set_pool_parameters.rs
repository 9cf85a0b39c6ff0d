//! SetPoolParameters instruction handler
//!
//! Governor-gated updates to a pool's issuance and SLP parameters.
//! Omitted fields are unchanged; everything set is range-checked before
//! being persisted.

use {
    crate::{
        error::StablehedgeError,
        state::{collateral::CollateralPool, core::StableController},
    },
    anchor_lang::prelude::*,
};

/// Accounts required for updating pool parameters
#[derive(Accounts)]
pub struct SetPoolParameters<'info> {
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
}

/// Parameters for updating a pool; omitted fields are unchanged
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy)]
pub struct SetPoolParametersParams {
    /// Hard cap on stocks_users
    pub cap_on_stocks_users: Option<u64>,
    /// Per-slot cap on san rate increases (RATE)
    pub max_san_rate_update: Option<u64>,
    /// Share of mint/burn fees for SLPs (RATE)
    pub fees_for_slps: Option<u64>,
    /// Share of strategy interest for SLPs (RATE)
    pub interests_for_slps: Option<u64>,
    /// Share of strategy gains kept as surplus (RATE)
    pub interests_for_surplus: Option<u64>,
    /// Flat SLP withdrawal haircut (RATE)
    pub slippage: Option<u64>,
}

pub fn set_pool_parameters(
    ctx: Context<SetPoolParameters>,
    params: &SetPoolParametersParams,
) -> Result<()> {
    let pool = ctx.accounts.pool.as_mut();

    if let Some(cap) = params.cap_on_stocks_users {
        pool.cap_on_stocks_users = cap;
    }
    if let Some(max_update) = params.max_san_rate_update {
        pool.max_san_rate_update = max_update;
    }
    if let Some(fees) = params.fees_for_slps {
        pool.fees_for_slps = fees;
    }
    if let Some(interests) = params.interests_for_slps {
        pool.interests_for_slps = interests;
    }
    if let Some(surplus) = params.interests_for_surplus {
        pool.interests_for_surplus = surplus;
    }
    if let Some(slippage) = params.slippage {
        pool.slippage = slippage;
    }

    if !pool.validate() {
        return err!(StablehedgeError::InvalidParameter);
    }

    Ok(())
}
