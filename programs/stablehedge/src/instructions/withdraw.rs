//! Withdraw instruction handler
//!
//! An SLP burns san tokens and receives collateral at the current san rate
//! minus the flat slippage haircut. When idle reserves cannot cover the
//! full redemption (funds lent to strategies), the withdrawal degrades
//! instead of failing: the provider is paid what the reserves can honor
//! and only the corresponding share of san tokens is burned.

use {
    crate::{
        error::StablehedgeError,
        math,
        state::{collateral::CollateralPool, core::StableController},
    },
    anchor_lang::prelude::*,
    anchor_spl::token::{Mint, Token, TokenAccount},
};

/// Accounts required for an SLP withdrawal
#[derive(Accounts)]
pub struct Withdraw<'info> {
    /// Liquidity provider (signer)
    #[account(mut)]
    pub user: Signer<'info>,

    /// Provider's san token account, debited
    #[account(
        mut,
        constraint = san_account.mint == san_mint.key(),
        constraint = san_account.owner == user.key()
    )]
    pub san_account: Box<Account<'info, TokenAccount>>,

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
        bump = controller.bump
    )]
    pub controller: Box<Account<'info, StableController>>,

    /// Collateral pool (mutable, san rate may advance)
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

    /// San mint (mutable, supply shrinks)
    #[account(
        mut,
        seeds = [b"san_mint", pool.key().as_ref()],
        bump = pool.san_mint_bump
    )]
    pub san_mint: Box<Account<'info, Mint>>,

    token_program: Program<'info, Token>,
}

/// Parameters for an SLP withdrawal
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy)]
pub struct WithdrawParams {
    /// San token amount to redeem
    pub san_amount: u64,
}

pub fn withdraw(ctx: Context<Withdraw>, params: &WithdrawParams) -> Result<()> {
    msg!("Check permissions");
    let controller = ctx.accounts.controller.as_ref();
    let pool = ctx.accounts.pool.as_mut();
    require!(pool.allow_withdraw, StablehedgeError::InstructionNotAllowed);
    require!(params.san_amount > 0, StablehedgeError::ZeroAmount);

    // flush pending interest before quoting the rate
    let current_slot = controller.get_slot()?;
    pool.update_san_rate(0, ctx.accounts.san_mint.supply, current_slot)?;

    let due = pool.collateral_for_withdraw(params.san_amount)?;
    require!(due > 0, StablehedgeError::ZeroAmount);

    let idle = ctx.accounts.pool_token_account.amount;
    let (payout, san_burned) = if due <= idle {
        (due, params.san_amount)
    } else {
        // best-effort payout: honor what the reserves allow and burn the
        // matching share of san tokens, rounded against the provider
        let honored = math::checked_as_u64(math::checked_ceil_div(
            math::checked_mul(params.san_amount as u128, idle as u128)?,
            due as u128,
        )?)?;
        (idle, std::cmp::min(honored, params.san_amount))
    };
    msg!("Amount out: {}", payout);
    msg!("San tokens burned: {}", san_burned);
    require!(payout > 0, StablehedgeError::InsufficientReserves);

    msg!("Burn san tokens");
    controller.burn_tokens(
        ctx.accounts.san_mint.to_account_info(),
        ctx.accounts.san_account.to_account_info(),
        ctx.accounts.user.to_account_info(),
        ctx.accounts.token_program.to_account_info(),
        san_burned,
    )?;

    msg!("Transfer tokens");
    controller.transfer_tokens(
        ctx.accounts.pool_token_account.to_account_info(),
        ctx.accounts.receiving_account.to_account_info(),
        ctx.accounts.transfer_authority.to_account_info(),
        ctx.accounts.token_program.to_account_info(),
        payout,
    )?;

    Ok(())
}
