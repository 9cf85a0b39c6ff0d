//! MintStable instruction handler
//!
//! A user deposits collateral and receives freshly minted stablecoins at
//! the lower oracle rate. The mint fee follows the pool's fee curve keyed
//! on the current hedge ratio: the better the hedging agents cover the
//! pool, the cheaper it is to mint. The net minted amount is credited to
//! stocks_users, bounded by the pool cap.

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

/// Accounts required for minting stablecoins
#[derive(Accounts)]
pub struct MintStable<'info> {
    /// User minting stablecoins (signer)
    #[account(mut)]
    pub user: Signer<'info>,

    /// User's collateral token account, debited
    #[account(
        mut,
        constraint = funding_account.mint == pool.collateral_mint,
        constraint = funding_account.owner == user.key()
    )]
    pub funding_account: Box<Account<'info, TokenAccount>>,

    /// User's stablecoin token account, credited
    #[account(
        mut,
        constraint = stable_account.mint == controller.stable_mint
    )]
    pub stable_account: Box<Account<'info, TokenAccount>>,

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

    /// Hedging market, read for the hedge ratio
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

    /// Pool's collateral token account, credited
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

    /// Stablecoin mint (mutable, supply grows)
    #[account(
        mut,
        seeds = [b"stable_mint"],
        bump = controller.stable_mint_bump
    )]
    pub stable_mint: Box<Account<'info, Mint>>,

    token_program: Program<'info, Token>,
}

/// Parameters for minting stablecoins
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy)]
pub struct MintStableParams {
    /// Collateral amount to deposit, native decimals
    pub amount: u64,
    /// Minimum stablecoin amount expected (slippage protection)
    pub min_stable_out: u64,
}

pub fn mint_stable(ctx: Context<MintStable>, params: &MintStableParams) -> Result<()> {
    msg!("Check permissions");
    let controller = ctx.accounts.controller.as_ref();
    let pool = ctx.accounts.pool.as_mut();
    let market = ctx.accounts.hedge_market.as_ref();
    require!(pool.allow_mint, StablehedgeError::InstructionNotAllowed);
    require!(params.amount > 0, StablehedgeError::ZeroAmount);

    let curtime = controller.get_time()?;
    let current_slot = controller.get_slot()?;

    // users are quoted the lower bound of the oracle bracket
    let rate = OracleRate::new_from_oracle(
        &ctx.accounts.rate_oracle.to_account_info(),
        &pool.oracle,
        curtime,
        RateBound::Lower,
    )?;

    // fee keyed on how well hedging agents currently cover the pool
    let hedge_ratio = market.hedge_ratio(pool.stocks_users, 0)?;
    let fee_rate = pool.mint_fee_rate(hedge_ratio)?;
    let fee_amount = HedgeMarket::fee_amount(fee_rate, params.amount)?;
    let net_amount = math::checked_sub(params.amount, fee_amount)?;
    msg!("Collected fee: {}", fee_amount);

    let stable_minted = rate.get_stable_amount(net_amount, pool.collateral_decimals)?;
    require!(stable_minted > 0, StablehedgeError::ZeroAmount);
    require!(
        stable_minted >= params.min_stable_out,
        StablehedgeError::SlippageExceeded
    );
    msg!("Stable minted: {}", stable_minted);

    // issuance ledger: the net minted amount is what stable holders are
    // now owed from this pool
    pool.propagate_stocks_delta(math::checked_as_i64(stable_minted)?)?;

    // SLP share of the fee enters the san-rate carryover; the rest is
    // protocol revenue
    let slp_share = math::checked_as_u64(math::checked_div(
        math::checked_mul(fee_amount as u128, pool.fees_for_slps as u128)?,
        StableController::RATE_POWER,
    )?)?;
    pool.update_san_rate(slp_share, ctx.accounts.san_mint.supply, current_slot)?;
    pool.protocol_fees = math::checked_add(
        pool.protocol_fees,
        math::checked_sub(fee_amount, slp_share)?,
    )?;

    msg!("Transfer tokens");
    controller.transfer_tokens_from_user(
        ctx.accounts.funding_account.to_account_info(),
        ctx.accounts.pool_token_account.to_account_info(),
        ctx.accounts.user.to_account_info(),
        ctx.accounts.token_program.to_account_info(),
        params.amount,
    )?;

    controller.mint_tokens(
        ctx.accounts.stable_mint.to_account_info(),
        ctx.accounts.stable_account.to_account_info(),
        ctx.accounts.transfer_authority.to_account_info(),
        ctx.accounts.token_program.to_account_info(),
        stable_minted,
    )?;

    Ok(())
}
