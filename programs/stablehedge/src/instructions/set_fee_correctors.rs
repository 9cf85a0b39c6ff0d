//! SetFeeCorrectors instruction handler
//!
//! Guardian-gated entry point for the fee policy: bonus/malus correction
//! scalars on top of the fee curves and the collateral-ratio-driven
//! slippage settings. Off-chain policy watches the collateral ratio and
//! pushes corrections here; the curves themselves stay under the
//! governor.

use {
    crate::{
        error::StablehedgeError,
        state::{collateral::CollateralPool, core::StableController, hedge_market::HedgeMarket},
    },
    anchor_lang::prelude::*,
};

/// Accounts required for updating fee correctors
#[derive(Accounts)]
pub struct SetFeeCorrectors<'info> {
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

/// Parameters for updating fee correctors; omitted fields are unchanged
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy)]
pub struct SetFeeCorrectorsParams {
    /// Correction scalar on mint fees (RATE)
    pub bonus_malus_mint: Option<u64>,
    /// Correction scalar on burn fees (RATE)
    pub bonus_malus_burn: Option<u64>,
    /// Correction scalar on hedging-agent entry fees (RATE)
    pub ha_bonus_malus_deposit: Option<u64>,
    /// Correction scalar on hedging-agent exit fees (RATE)
    pub ha_bonus_malus_withdraw: Option<u64>,
    /// Fraction of incoming SLP interest set aside (RATE)
    pub slippage_fee: Option<u64>,
}

pub fn set_fee_correctors(
    ctx: Context<SetFeeCorrectors>,
    params: &SetFeeCorrectorsParams,
) -> Result<()> {
    let pool = ctx.accounts.pool.as_mut();
    let market = ctx.accounts.hedge_market.as_mut();

    if let Some(bonus_malus) = params.bonus_malus_mint {
        pool.bonus_malus_mint = bonus_malus;
    }
    if let Some(bonus_malus) = params.bonus_malus_burn {
        pool.bonus_malus_burn = bonus_malus;
    }
    if let Some(bonus_malus) = params.ha_bonus_malus_deposit {
        market.ha_bonus_malus_deposit = bonus_malus;
    }
    if let Some(bonus_malus) = params.ha_bonus_malus_withdraw {
        market.ha_bonus_malus_withdraw = bonus_malus;
    }
    if let Some(slippage_fee) = params.slippage_fee {
        require!(
            slippage_fee as u128 <= StableController::RATE_POWER,
            StablehedgeError::InvalidParameter
        );
        pool.slippage_fee = slippage_fee;
    }

    Ok(())
}
