//! AddStrategy instruction handler
//!
//! Governor-gated registration of a yield strategy for a pool. Aggregate
//! debt ratios across a pool's strategies can never exceed 100%.

use {
    crate::{
        error::StablehedgeError,
        math,
        state::{collateral::CollateralPool, core::StableController, strategy::Strategy},
    },
    anchor_lang::prelude::*,
    anchor_spl::token::TokenAccount,
};

/// Accounts required for registering a strategy
#[derive(Accounts)]
pub struct AddStrategy<'info> {
    /// Governor (signer, pays for the strategy account)
    #[account(mut)]
    pub governor: Signer<'info>,

    /// Controller account
    #[account(
        seeds = [b"controller"],
        bump = controller.bump,
        constraint = controller.is_governor(&governor.key()) @ StablehedgeError::UnauthorizedCaller
    )]
    pub controller: Box<Account<'info, StableController>>,

    /// Collateral pool (mutable, aggregate debt ratio grows)
    #[account(
        mut,
        seeds = [b"pool", pool.collateral_mint.as_ref()],
        bump = pool.bump
    )]
    pub pool: Box<Account<'info, CollateralPool>>,

    /// Authority that will report for this strategy
    ///
    /// CHECK: Stored as the reporting authority, never dereferenced
    pub strategy_authority: AccountInfo<'info>,

    /// Strategy's working token account
    #[account(
        constraint = strategy_token_account.mint == pool.collateral_mint,
        constraint = strategy_token_account.owner == strategy_authority.key()
    )]
    pub strategy_token_account: Box<Account<'info, TokenAccount>>,

    /// Strategy account to be initialized
    #[account(
        init,
        payer = governor,
        space = Strategy::LEN,
        seeds = [b"strategy",
                 pool.key().as_ref(),
                 strategy_authority.key().as_ref()],
        bump
    )]
    pub strategy: Box<Account<'info, Strategy>>,

    system_program: Program<'info, System>,
}

/// Parameters for registering a strategy
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy)]
pub struct AddStrategyParams {
    /// Share of pool assets this strategy may hold (RATE)
    pub debt_ratio: u64,
}

pub fn add_strategy(ctx: Context<AddStrategy>, params: &AddStrategyParams) -> Result<()> {
    let pool = ctx.accounts.pool.as_mut();
    let strategy = ctx.accounts.strategy.as_mut();

    let new_total = math::checked_add(pool.debt_ratio_total, params.debt_ratio)?;
    require!(
        new_total as u128 <= StableController::RATE_POWER,
        StablehedgeError::DebtRatioTooHigh
    );
    pool.debt_ratio_total = new_total;

    strategy.pool = pool.key();
    strategy.authority = ctx.accounts.strategy_authority.key();
    strategy.token_account = ctx.accounts.strategy_token_account.key();
    strategy.debt_ratio = params.debt_ratio;
    strategy.total_strategy_debt = 0;
    strategy.last_report = ctx.accounts.controller.get_time()?;
    strategy.emergency_exit = false;
    strategy.bump = ctx.bumps.strategy;

    Ok(())
}
