//! StrategyReport instruction handler
//!
//! A registered strategy reports its gain or loss and offers a repayment.
//! The ledger routing (admin debt, surplus, SLP interest carryover, loss
//! socialization) happens in the state layer; this handler verifies the
//! report is backed by real tokens and executes the resulting transfers
//! in whichever direction the rebalance points.

use {
    crate::{
        error::StablehedgeError,
        math,
        state::{collateral::CollateralPool, core::StableController, strategy::Strategy},
    },
    anchor_lang::prelude::*,
    anchor_spl::token::{Mint, Token, TokenAccount},
};

/// Accounts required for a strategy report
#[derive(Accounts)]
pub struct StrategyReport<'info> {
    /// Strategy authority (signer)
    pub strategy_authority: Signer<'info>,

    /// Transfer authority PDA
    ///
    /// CHECK: Empty PDA, authority for token accounts
    #[account(
        seeds = [b"transfer_authority"],
        bump = controller.transfer_authority_bump
    )]
    pub transfer_authority: AccountInfo<'info>,

    /// Controller account
    #[account(
        seeds = [b"controller"],
        bump = controller.bump
    )]
    pub controller: Box<Account<'info, StableController>>,

    /// Collateral pool (mutable, debt ledger changes)
    #[account(
        mut,
        seeds = [b"pool", pool.collateral_mint.as_ref()],
        bump = pool.bump
    )]
    pub pool: Box<Account<'info, CollateralPool>>,

    /// Strategy account (mutable, gated on the signing authority)
    #[account(
        mut,
        seeds = [b"strategy",
                 pool.key().as_ref(),
                 strategy_authority.key().as_ref()],
        bump = strategy.bump,
        constraint = strategy.authority == strategy_authority.key()
            @ StablehedgeError::UnauthorizedCaller
    )]
    pub strategy: Box<Account<'info, Strategy>>,

    /// Strategy's working token account
    #[account(
        mut,
        constraint = strategy_token_account.key() == strategy.token_account
    )]
    pub strategy_token_account: Box<Account<'info, TokenAccount>>,

    /// Pool's collateral token account
    #[account(
        mut,
        seeds = [b"pool_token_account", pool.key().as_ref()],
        bump = pool.token_account_bump
    )]
    pub pool_token_account: Box<Account<'info, TokenAccount>>,

    /// San mint, read for the SLP supply backing interest routing
    #[account(
        seeds = [b"san_mint", pool.key().as_ref()],
        bump = pool.san_mint_bump
    )]
    pub san_mint: Box<Account<'info, Mint>>,

    token_program: Program<'info, Token>,
}

/// Parameters for a strategy report
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy)]
pub struct StrategyReportParams {
    /// Realized gain since the last report
    pub gain: u64,
    /// Realized loss since the last report
    pub loss: u64,
    /// Debt the strategy makes available for repayment
    pub debt_payment: u64,
}

pub fn strategy_report(ctx: Context<StrategyReport>, params: &StrategyReportParams) -> Result<()> {
    let controller = ctx.accounts.controller.as_ref();
    let pool = ctx.accounts.pool.as_mut();
    let strategy = ctx.accounts.strategy.as_mut();

    // a report must be backed: the strategy cannot claim gains or offer
    // repayments it does not hold
    require!(
        math::checked_add(params.gain, params.debt_payment)?
            <= ctx.accounts.strategy_token_account.amount,
        StablehedgeError::UnbackedReport
    );

    let curtime = controller.get_time()?;
    let current_slot = controller.get_slot()?;
    let idle = ctx.accounts.pool_token_account.amount;

    msg!(
        "Report: gain {}, loss {}, debt payment {}",
        params.gain,
        params.loss,
        params.debt_payment
    );
    let outcome = strategy.process_report(
        pool,
        params.gain,
        params.loss,
        params.debt_payment,
        idle,
        ctx.accounts.san_mint.supply,
        current_slot,
        curtime,
    )?;

    msg!("Transfer tokens");
    if outcome.to_pool > 0 {
        controller.transfer_tokens_from_user(
            ctx.accounts.strategy_token_account.to_account_info(),
            ctx.accounts.pool_token_account.to_account_info(),
            ctx.accounts.strategy_authority.to_account_info(),
            ctx.accounts.token_program.to_account_info(),
            outcome.to_pool,
        )?;
    }
    if outcome.to_strategy > 0 {
        controller.transfer_tokens(
            ctx.accounts.pool_token_account.to_account_info(),
            ctx.accounts.strategy_token_account.to_account_info(),
            ctx.accounts.transfer_authority.to_account_info(),
            ctx.accounts.token_program.to_account_info(),
            outcome.to_strategy,
        )?;
    }

    Ok(())
}
