//! LiquidatePerpetual instruction handler
//!
//! Permissionless: anyone may burn a position whose value is zero or at
//! or under the maintenance margin, against the lower oracle rate. The
//! keeper earns a bounded fraction of the remaining value; whatever is
//! left of the position's margin after the keeper fee is absorbed into
//! stocks_users. Accrued rewards still go to the position owner.

use {
    crate::{
        error::StablehedgeError,
        math,
        state::{
            collateral::CollateralPool,
            core::StableController,
            hedge_market::HedgeMarket,
            oracle::{OracleRate, RateBound},
            perpetual::Perpetual,
        },
    },
    anchor_lang::{prelude::*, AccountsClose},
    anchor_spl::token::{Token, TokenAccount},
};

/// Accounts required for liquidating a position
#[derive(Accounts)]
pub struct LiquidatePerpetual<'info> {
    /// Liquidator (signer, receives the keeper fee and the account rent)
    #[account(mut)]
    pub keeper: Signer<'info>,

    /// Liquidator's collateral token account, credited with the keeper fee
    #[account(
        mut,
        constraint = keeper_account.mint == pool.collateral_mint,
        constraint = keeper_account.owner == keeper.key()
    )]
    pub keeper_account: Box<Account<'info, TokenAccount>>,

    /// Position owner's reward token account, credited with accrued
    /// rewards
    #[account(
        mut,
        constraint = owner_reward_account.mint == controller.reward_mint,
        constraint = owner_reward_account.owner == perpetual.owner
    )]
    pub owner_reward_account: Box<Account<'info, TokenAccount>>,

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

    /// Collateral pool (mutable, the residual books into stocks_users)
    #[account(
        mut,
        seeds = [b"pool", pool.collateral_mint.as_ref()],
        bump = pool.bump
    )]
    pub pool: Box<Account<'info, CollateralPool>>,

    /// Hedging market (mutable, hedge total shrinks)
    #[account(
        mut,
        seeds = [b"hedge_market", pool.key().as_ref()],
        bump = hedge_market.bump
    )]
    pub hedge_market: Box<Account<'info, HedgeMarket>>,

    /// Position to liquidate (mutable, closed at the end, rent to keeper)
    #[account(
        mut,
        seeds = [b"perpetual",
                 hedge_market.key().as_ref(),
                 perpetual.id.to_le_bytes().as_ref()],
        bump = perpetual.bump
    )]
    pub perpetual: Box<Account<'info, Perpetual>>,

    /// Rate oracle for this pool
    ///
    /// CHECK: Oracle account, validated by constraint
    #[account(
        constraint = rate_oracle.key() == pool.oracle.oracle_account
    )]
    pub rate_oracle: AccountInfo<'info>,

    /// Pool's collateral token account, debited for the keeper fee
    #[account(
        mut,
        seeds = [b"pool_token_account", pool.key().as_ref()],
        bump = pool.token_account_bump
    )]
    pub pool_token_account: Box<Account<'info, TokenAccount>>,

    /// Vault holding undistributed rewards
    #[account(
        mut,
        seeds = [b"reward_vault", hedge_market.key().as_ref()],
        bump = hedge_market.reward_vault_bump
    )]
    pub reward_vault: Box<Account<'info, TokenAccount>>,

    token_program: Program<'info, Token>,
}

/// Parameters for liquidating a position
///
/// Empty, kept for consistency with other instructions.
#[derive(AnchorSerialize, AnchorDeserialize)]
pub struct LiquidatePerpetualParams {}

pub fn liquidate_perpetual(
    ctx: Context<LiquidatePerpetual>,
    _params: &LiquidatePerpetualParams,
) -> Result<()> {
    let controller = ctx.accounts.controller.as_ref();
    let pool = ctx.accounts.pool.as_mut();
    let market = ctx.accounts.hedge_market.as_mut();

    let curtime = controller.get_time()?;

    msg!("Check position state");
    let rate = OracleRate::new_from_oracle(
        &ctx.accounts.rate_oracle.to_account_info(),
        &pool.oracle,
        curtime,
        RateBound::Lower,
    )?;
    let perpetual = ctx.accounts.perpetual.as_mut();
    let (value, liquidatable) = perpetual.cash_out_value(&rate, market.maintenance_margin)?;
    require!(liquidatable, StablehedgeError::PositionNotLiquidatable);

    msg!("Settle position");
    let total_hedge_amount = market.total_hedge_amount;
    market
        .rewards
        .checkpoint(perpetual, total_hedge_amount, curtime)?;
    let rewards_owed = market.rewards.claim(perpetual);
    market.release_hedge(perpetual.hedge_amount)?;
    market.open_positions = math::checked_sub(market.open_positions, 1)?;

    // keeper fee bounded by ratio, cap and idle reserves
    let keeper_fee = std::cmp::min(
        market.keeper_liquidation_fee(value)?,
        ctx.accounts.pool_token_account.amount,
    );
    msg!("Keeper fee: {}", keeper_fee);

    // whatever the keeper does not take of the margin is absorbed by the
    // stable holders
    let collateral_decimals = pool.collateral_decimals;
    pool.propagate_stocks_delta(perpetual.stocks_delta(&rate, keeper_fee, collateral_decimals)?)?;

    msg!("Transfer tokens");
    if keeper_fee > 0 {
        controller.transfer_tokens(
            ctx.accounts.pool_token_account.to_account_info(),
            ctx.accounts.keeper_account.to_account_info(),
            ctx.accounts.transfer_authority.to_account_info(),
            ctx.accounts.token_program.to_account_info(),
            keeper_fee,
        )?;
    }
    if rewards_owed > 0 {
        controller.transfer_tokens(
            ctx.accounts.reward_vault.to_account_info(),
            ctx.accounts.owner_reward_account.to_account_info(),
            ctx.accounts.transfer_authority.to_account_info(),
            ctx.accounts.token_program.to_account_info(),
            rewards_owed,
        )?;
    }

    ctx.accounts
        .perpetual
        .close(ctx.accounts.keeper.to_account_info())
}
