//! WithdrawProtocolFees instruction handler
//!
//! Governor-gated collection of protocol revenue: accumulated fee shares,
//! strategy surplus and interest set aside by the slippage fee. Bounded
//! by what the ledgers have booked and by the idle reserves.

use {
    crate::{
        error::StablehedgeError,
        math,
        state::{collateral::CollateralPool, core::StableController},
    },
    anchor_lang::prelude::*,
    anchor_spl::token::{Token, TokenAccount},
};

/// Accounts required for withdrawing protocol fees
#[derive(Accounts)]
pub struct WithdrawProtocolFees<'info> {
    /// Governor (signer)
    pub governor: Signer<'info>,

    /// Destination collateral token account
    #[account(
        mut,
        constraint = receiving_account.mint == pool.collateral_mint
    )]
    pub receiving_account: Box<Account<'info, TokenAccount>>,

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
        bump = controller.bump,
        constraint = controller.is_governor(&governor.key()) @ StablehedgeError::UnauthorizedCaller
    )]
    pub controller: Box<Account<'info, StableController>>,

    /// Collateral pool (mutable, fee ledgers are drained)
    #[account(
        mut,
        seeds = [b"pool", pool.collateral_mint.as_ref()],
        bump = pool.bump
    )]
    pub pool: Box<Account<'info, CollateralPool>>,

    /// Pool's collateral token account, debited
    #[account(
        mut,
        seeds = [b"pool_token_account", pool.key().as_ref()],
        bump = pool.token_account_bump
    )]
    pub pool_token_account: Box<Account<'info, TokenAccount>>,

    token_program: Program<'info, Token>,
}

/// Parameters for withdrawing protocol fees
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy)]
pub struct WithdrawProtocolFeesParams {
    /// Collateral amount to withdraw
    pub amount: u64,
}

pub fn withdraw_protocol_fees(
    ctx: Context<WithdrawProtocolFees>,
    params: &WithdrawProtocolFeesParams,
) -> Result<()> {
    let controller = ctx.accounts.controller.as_ref();
    let pool = ctx.accounts.pool.as_mut();
    require!(params.amount > 0, StablehedgeError::ZeroAmount);

    let booked = math::checked_add(
        math::checked_add(pool.protocol_fees, pool.interests_accumulated)?,
        pool.fees_aside,
    )?;
    require!(params.amount <= booked, StablehedgeError::TooMuchRequested);
    require!(
        params.amount <= ctx.accounts.pool_token_account.amount,
        StablehedgeError::InsufficientReserves
    );

    // drain the fee ledgers in order: fee share, then surplus, then the
    // slippage set-aside
    let mut remaining = params.amount;
    let from_fees = std::cmp::min(remaining, pool.protocol_fees);
    pool.protocol_fees = math::checked_sub(pool.protocol_fees, from_fees)?;
    remaining = math::checked_sub(remaining, from_fees)?;
    let from_surplus = std::cmp::min(remaining, pool.interests_accumulated);
    pool.interests_accumulated = math::checked_sub(pool.interests_accumulated, from_surplus)?;
    remaining = math::checked_sub(remaining, from_surplus)?;
    pool.fees_aside = math::checked_sub(pool.fees_aside, remaining)?;

    msg!("Amount out: {}", params.amount);
    controller.transfer_tokens(
        ctx.accounts.pool_token_account.to_account_info(),
        ctx.accounts.receiving_account.to_account_info(),
        ctx.accounts.transfer_authority.to_account_info(),
        ctx.accounts.token_program.to_account_info(),
        params.amount,
    )?;

    Ok(())
}
