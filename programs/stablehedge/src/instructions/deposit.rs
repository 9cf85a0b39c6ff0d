//! Deposit instruction handler
//!
//! An SLP deposits collateral and receives san tokens at the current san
//! rate. Pending interest is flushed into the rate first so depositors
//! cannot buy into interest that accrued before them at yesterday's rate.

use {
    crate::{
        error::StablehedgeError,
        state::{collateral::CollateralPool, core::StableController},
    },
    anchor_lang::prelude::*,
    anchor_spl::token::{Mint, Token, TokenAccount},
};

/// Accounts required for an SLP deposit
#[derive(Accounts)]
pub struct Deposit<'info> {
    /// Liquidity provider (signer)
    #[account(mut)]
    pub user: Signer<'info>,

    /// Provider's collateral token account, debited
    #[account(
        mut,
        constraint = funding_account.mint == pool.collateral_mint,
        constraint = funding_account.owner == user.key()
    )]
    pub funding_account: Box<Account<'info, TokenAccount>>,

    /// Provider's san token account, credited
    #[account(
        mut,
        constraint = san_account.mint == san_mint.key()
    )]
    pub san_account: Box<Account<'info, TokenAccount>>,

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

    /// Pool's collateral token account, credited
    #[account(
        mut,
        seeds = [b"pool_token_account", pool.key().as_ref()],
        bump = pool.token_account_bump
    )]
    pub pool_token_account: Box<Account<'info, TokenAccount>>,

    /// San mint (mutable, supply grows)
    #[account(
        mut,
        seeds = [b"san_mint", pool.key().as_ref()],
        bump = pool.san_mint_bump
    )]
    pub san_mint: Box<Account<'info, Mint>>,

    token_program: Program<'info, Token>,
}

/// Parameters for an SLP deposit
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy)]
pub struct DepositParams {
    /// Collateral amount to deposit, native decimals
    pub amount: u64,
}

pub fn deposit(ctx: Context<Deposit>, params: &DepositParams) -> Result<()> {
    msg!("Check permissions");
    let controller = ctx.accounts.controller.as_ref();
    let pool = ctx.accounts.pool.as_mut();
    require!(pool.allow_deposit, StablehedgeError::InstructionNotAllowed);
    require!(params.amount > 0, StablehedgeError::ZeroAmount);

    // flush pending interest before quoting the rate
    let current_slot = controller.get_slot()?;
    pool.update_san_rate(0, ctx.accounts.san_mint.supply, current_slot)?;

    let san_amount = pool.san_amount_for_deposit(params.amount)?;
    require!(san_amount > 0, StablehedgeError::ZeroAmount);
    msg!("San tokens to mint: {}", san_amount);

    msg!("Transfer tokens");
    controller.transfer_tokens_from_user(
        ctx.accounts.funding_account.to_account_info(),
        ctx.accounts.pool_token_account.to_account_info(),
        ctx.accounts.user.to_account_info(),
        ctx.accounts.token_program.to_account_info(),
        params.amount,
    )?;

    controller.mint_tokens(
        ctx.accounts.san_mint.to_account_info(),
        ctx.accounts.san_account.to_account_info(),
        ctx.accounts.transfer_authority.to_account_info(),
        ctx.accounts.token_program.to_account_info(),
        san_amount,
    )?;

    Ok(())
}
