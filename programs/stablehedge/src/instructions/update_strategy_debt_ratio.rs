//! UpdateStrategyDebtRatio instruction handler
//!
//! Governor-gated debt ratio changes; the guardian may flip a strategy
//! into emergency exit (debt ratio treated as zero, everything recalled
//! at the next report) without being able to raise ratios.

use {
    crate::{
        error::StablehedgeError,
        math,
        state::{collateral::CollateralPool, core::StableController, strategy::Strategy},
    },
    anchor_lang::prelude::*,
};

/// Accounts required for updating a strategy's debt ratio
#[derive(Accounts)]
pub struct UpdateStrategyDebtRatio<'info> {
    /// Governor, or guardian for emergency exit only (signer)
    pub authority: Signer<'info>,

    /// Controller account
    #[account(
        seeds = [b"controller"],
        bump = controller.bump
    )]
    pub controller: Box<Account<'info, StableController>>,

    /// Collateral pool (mutable, aggregate debt ratio changes)
    #[account(
        mut,
        seeds = [b"pool", pool.collateral_mint.as_ref()],
        bump = pool.bump
    )]
    pub pool: Box<Account<'info, CollateralPool>>,

    /// Strategy account (mutable)
    #[account(
        mut,
        seeds = [b"strategy",
                 pool.key().as_ref(),
                 strategy.authority.as_ref()],
        bump = strategy.bump
    )]
    pub strategy: Box<Account<'info, Strategy>>,
}

/// Parameters for updating a strategy's debt ratio
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy)]
pub struct UpdateStrategyDebtRatioParams {
    /// New share of pool assets (RATE); governor only
    pub debt_ratio: Option<u64>,
    /// Emergency exit flag; guardian or governor
    pub emergency_exit: Option<bool>,
}

pub fn update_strategy_debt_ratio(
    ctx: Context<UpdateStrategyDebtRatio>,
    params: &UpdateStrategyDebtRatioParams,
) -> Result<()> {
    let controller = ctx.accounts.controller.as_ref();
    let pool = ctx.accounts.pool.as_mut();
    let strategy = ctx.accounts.strategy.as_mut();
    let caller = ctx.accounts.authority.key();

    if let Some(debt_ratio) = params.debt_ratio {
        require!(
            controller.is_governor(&caller),
            StablehedgeError::UnauthorizedCaller
        );
        let new_total = math::checked_add(
            math::checked_sub(pool.debt_ratio_total, strategy.debt_ratio)?,
            debt_ratio,
        )?;
        require!(
            new_total as u128 <= StableController::RATE_POWER,
            StablehedgeError::DebtRatioTooHigh
        );
        pool.debt_ratio_total = new_total;
        strategy.debt_ratio = debt_ratio;
    }

    if let Some(emergency_exit) = params.emergency_exit {
        require!(
            controller.is_guardian(&caller),
            StablehedgeError::UnauthorizedCaller
        );
        strategy.emergency_exit = emergency_exit;
    }

    Ok(())
}
