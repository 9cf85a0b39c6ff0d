//! BurnStable instruction handler
//!
//! A holder burns stablecoins and receives collateral at the upper oracle
//! rate (the protocol-favorable side of the bracket). The burn fee follows
//! the pool's burn curve keyed on the hedge ratio AFTER the burn, so that
//! burns which leave the hedging agents over-covered pay for the
//! imbalance they create. The burned amount is debited from stocks_users.

use {
    crate::{
        error::StablehedgeError,
        math,
        state::{
            collateral::CollateralPool,
            core::StableController,
            hedge_market::HedgeMarket,
            oracle::{OracleRate, RateBound},
        },
    },
    anchor_lang::prelude::*,
    anchor_spl::token::{Mint, Token, TokenAccount},
};

/// Accounts required for burning stablecoins
#[derive(Accounts)]
pub struct BurnStable<'info> {
    /// Holder burning stablecoins (signer)
    #[account(mut)]
    pub user: Signer<'info>,

    /// Holder's stablecoin token account, debited
    #[account(
        mut,
        constraint = stable_account.mint == controller.stable_mint,
        constraint = stable_account.owner == user.key()
    )]
    pub stable_account: Box<Account<'info, TokenAccount>>,

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

    /// Collateral pool (mutable, issuance ledger will be updated)
    #[account(
        mut,
        seeds = [b"pool", pool.collateral_mint.as_ref()],
        bump = pool.bump
    )]
    pub pool: Box<Account<'info, CollateralPool>>,

    /// Hedging market, read for the post-burn hedge ratio
    #[account(
        seeds = [b"hedge_market", pool.key().as_ref()],
        bump = hedge_market.bump
    )]
    pub hedge_market: Box<Account<'info, HedgeMarket>>,

    /// Rate oracle for this pool
    ///
    /// CHECK: Oracle account, validated by constraint
    #[account(
        constraint = rate_oracle.key() == pool.oracle.oracle_account
    )]
    pub rate_oracle: AccountInfo<'info>,

    /// Pool's collateral token account, debited
    #[account(
        mut,
        seeds = [b"pool_token_account", pool.key().as_ref()],
        bump = pool.token_account_bump
    )]
    pub pool_token_account: Box<Account<'info, TokenAccount>>,

    /// San mint, read for the SLP supply backing the san-rate update
    #[account(
        seeds = [b"san_mint", pool.key().as_ref()],
        bump = pool.san_mint_bump
    )]
    pub san_mint: Box<Account<'info, Mint>>,

    /// Stablecoin mint (mutable, supply shrinks)
    #[account(
        mut,
        seeds = [b"stable_mint"],
        bump = controller.stable_mint_bump
    )]
    pub stable_mint: Box<Account<'info, Mint>>,

    token_program: Program<'info, Token>,
}

/// Parameters for burning stablecoins
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy)]
pub struct BurnStableParams {
    /// Stablecoin amount to burn
    pub amount: u64,
    /// Minimum collateral amount expected (slippage protection)
    pub min_collateral_out: u64,
}

pub fn burn_stable(ctx: Context<BurnStable>, params: &BurnStableParams) -> Result<()> {
    msg!("Check permissions");
    let controller = ctx.accounts.controller.as_ref();
    let pool = ctx.accounts.pool.as_mut();
    let market = ctx.accounts.hedge_market.as_ref();
    require!(pool.allow_burn, StablehedgeError::InstructionNotAllowed);
    require!(params.amount > 0, StablehedgeError::ZeroAmount);

    // a burn can never take out more than stable holders are owed here
    let amount_signed = math::checked_as_i64(params.amount)?;
    require!(
        amount_signed <= pool.stocks_users,
        StablehedgeError::BurnExceedsStocksUsers
    );

    let curtime = controller.get_time()?;
    let current_slot = controller.get_slot()?;

    // holders are quoted the upper bound of the oracle bracket
    let rate = OracleRate::new_from_oracle(
        &ctx.accounts.rate_oracle.to_account_info(),
        &pool.oracle,
        curtime,
        RateBound::Upper,
    )?;

    // fee keyed on the hedge ratio this burn leaves behind
    let stocks_after = math::checked_sub(pool.stocks_users, amount_signed)?;
    let hedge_ratio = market.hedge_ratio(stocks_after, 0)?;
    let fee_rate = pool.burn_fee_rate(hedge_ratio)?;

    let gross_collateral = rate.get_collateral_amount(params.amount, pool.collateral_decimals)?;
    let fee_amount = HedgeMarket::fee_amount(fee_rate, gross_collateral)?;
    let net_collateral = math::checked_sub(gross_collateral, fee_amount)?;
    msg!("Collected fee: {}", fee_amount);
    msg!("Amount out: {}", net_collateral);

    require!(
        net_collateral >= params.min_collateral_out,
        StablehedgeError::SlippageExceeded
    );
    require!(
        net_collateral <= ctx.accounts.pool_token_account.amount,
        StablehedgeError::InsufficientReserves
    );

    pool.propagate_stocks_delta(math::checked_sub(0i64, amount_signed)?)?;

    let slp_share = math::checked_as_u64(math::checked_div(
        math::checked_mul(fee_amount as u128, pool.fees_for_slps as u128)?,
        StableController::RATE_POWER,
    )?)?;
    pool.update_san_rate(slp_share, ctx.accounts.san_mint.supply, current_slot)?;
    pool.protocol_fees = math::checked_add(
        pool.protocol_fees,
        math::checked_sub(fee_amount, slp_share)?,
    )?;

    msg!("Burn stablecoins");
    controller.burn_tokens(
        ctx.accounts.stable_mint.to_account_info(),
        ctx.accounts.stable_account.to_account_info(),
        ctx.accounts.user.to_account_info(),
        ctx.accounts.token_program.to_account_info(),
        params.amount,
    )?;

    msg!("Transfer tokens");
    controller.transfer_tokens(
        ctx.accounts.pool_token_account.to_account_info(),
        ctx.accounts.receiving_account.to_account_info(),
        ctx.accounts.transfer_authority.to_account_info(),
        ctx.accounts.token_program.to_account_info(),
        net_collateral,
    )?;

    Ok(())
}
