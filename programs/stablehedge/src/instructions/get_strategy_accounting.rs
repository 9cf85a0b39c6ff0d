//! GetStrategyAccounting instruction handler
//!
//! View: the rebalancing numbers a strategy uses to self-limit its
//! borrowing and repayments.

use {
    crate::state::{collateral::CollateralPool, strategy::Strategy},
    anchor_lang::prelude::*,
    anchor_spl::token::TokenAccount,
};

/// Accounts required for reading strategy accounting
#[derive(Accounts)]
pub struct GetStrategyAccounting<'info> {
    /// Collateral pool
    #[account(
        seeds = [b"pool", pool.collateral_mint.as_ref()],
        bump = pool.bump
    )]
    pub pool: Box<Account<'info, CollateralPool>>,

    /// Strategy account
    #[account(
        seeds = [b"strategy",
                 pool.key().as_ref(),
                 strategy.authority.as_ref()],
        bump = strategy.bump
    )]
    pub strategy: Box<Account<'info, Strategy>>,

    /// Pool's collateral token account
    #[account(
        seeds = [b"pool_token_account", pool.key().as_ref()],
        bump = pool.token_account_bump
    )]
    pub pool_token_account: Box<Account<'info, TokenAccount>>,
}

/// Parameters for reading strategy accounting
///
/// Empty, kept for consistency with other instructions.
#[derive(AnchorSerialize, AnchorDeserialize)]
pub struct GetStrategyAccountingParams {}

/// Strategy accounting snapshot
#[derive(AnchorSerialize, AnchorDeserialize, Copy, Clone, PartialEq, Default, Debug)]
pub struct StrategyAccounting {
    /// Idle reserves plus lent-out debt
    pub total_assets: u64,
    /// Collateral the strategy may still borrow
    pub credit_available: u64,
    /// Debt the strategy should repay
    pub debt_outstanding: u64,
}

pub fn get_strategy_accounting(
    ctx: Context<GetStrategyAccounting>,
    _params: &GetStrategyAccountingParams,
) -> Result<StrategyAccounting> {
    let pool = ctx.accounts.pool.as_ref();
    let strategy = ctx.accounts.strategy.as_ref();
    let idle = ctx.accounts.pool_token_account.amount;

    let ratio = strategy.effective_debt_ratio();
    Ok(StrategyAccounting {
        total_assets: pool.total_assets(idle)?,
        credit_available: pool.credit_available(ratio, strategy.total_strategy_debt, idle)?,
        debt_outstanding: pool.debt_outstanding(ratio, strategy.total_strategy_debt, idle)?,
    })
}
