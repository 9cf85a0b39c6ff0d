//! AddCollateralPool instruction handler
//!
//! Registers a collateral token with the protocol: creates the collateral
//! pool, its token account and san (SLP share) mint, the hedging market
//! with its reward vault, and the pool's rate oracle. Fee curves and risk
//! parameters are set here and validated before anything is persisted.

use {
    crate::{
        error::StablehedgeError,
        state::{
            collateral::CollateralPool,
            core::StableController,
            fee_curve::PiecewiseCurve,
            hedge_market::HedgeMarket,
            oracle::RateOracle,
        },
    },
    anchor_lang::prelude::*,
    anchor_spl::token::{Mint, Token, TokenAccount},
};

/// Accounts required for registering a new collateral pool
#[derive(Accounts)]
pub struct AddCollateralPool<'info> {
    /// Governor (signer, pays for account creation)
    #[account(mut)]
    pub governor: Signer<'info>,

    /// Transfer authority PDA
    ///
    /// CHECK: Empty PDA, authority for token accounts
    #[account(
        seeds = [b"transfer_authority"],
        bump = controller.transfer_authority_bump
    )]
    pub transfer_authority: AccountInfo<'info>,

    /// Controller account (mutable, pool registry will be updated)
    #[account(
        mut,
        seeds = [b"controller"],
        bump = controller.bump,
        constraint = controller.is_governor(&governor.key()) @ StablehedgeError::UnauthorizedCaller
    )]
    pub controller: Box<Account<'info, StableController>>,

    /// Mint of the collateral token being registered
    pub collateral_mint: Box<Account<'info, Mint>>,

    /// Collateral pool account to be initialized
    #[account(
        init,
        payer = governor,
        space = CollateralPool::LEN,
        seeds = [b"pool", collateral_mint.key().as_ref()],
        bump
    )]
    pub pool: Box<Account<'info, CollateralPool>>,

    /// Pool's token account holding collateral reserves
    #[account(
        init,
        payer = governor,
        token::mint = collateral_mint,
        token::authority = transfer_authority,
        seeds = [b"pool_token_account", pool.key().as_ref()],
        bump
    )]
    pub pool_token_account: Box<Account<'info, TokenAccount>>,

    /// San (SLP share) token mint for this pool
    #[account(
        init,
        payer = governor,
        mint::decimals = collateral_mint.decimals,
        mint::authority = transfer_authority,
        seeds = [b"san_mint", pool.key().as_ref()],
        bump
    )]
    pub san_mint: Box<Account<'info, Mint>>,

    /// Hedging market account to be initialized
    #[account(
        init,
        payer = governor,
        space = HedgeMarket::LEN,
        seeds = [b"hedge_market", pool.key().as_ref()],
        bump
    )]
    pub hedge_market: Box<Account<'info, HedgeMarket>>,

    /// Reward token mint (must match the controller's)
    #[account(
        constraint = reward_mint.key() == controller.reward_mint @ StablehedgeError::InvalidParameter
    )]
    pub reward_mint: Box<Account<'info, Mint>>,

    /// Vault holding undistributed hedging-agent rewards
    #[account(
        init,
        payer = governor,
        token::mint = reward_mint,
        token::authority = transfer_authority,
        seeds = [b"reward_vault", hedge_market.key().as_ref()],
        bump
    )]
    pub reward_vault: Box<Account<'info, TokenAccount>>,

    /// Rate oracle account for this pool
    #[account(
        init,
        payer = governor,
        space = RateOracle::LEN,
        seeds = [b"rate_oracle", pool.key().as_ref()],
        bump
    )]
    pub rate_oracle: Box<Account<'info, RateOracle>>,

    system_program: Program<'info, System>,
    token_program: Program<'info, Token>,
}

/// Parameters for registering a new collateral pool
#[derive(AnchorSerialize, AnchorDeserialize, Clone)]
pub struct AddCollateralPoolParams {
    /// Authority allowed to push oracle rates
    pub oracle_authority: Pubkey,
    /// Maximum oracle confidence interval (RATE)
    pub max_rate_error: u64,
    /// Maximum oracle quote age in seconds
    pub max_rate_age_sec: u32,

    /// Hard cap on stocks_users for this pool
    pub cap_on_stocks_users: u64,
    /// Per-slot cap on san rate increases (RATE)
    pub max_san_rate_update: u64,
    /// Share of mint/burn fees for SLPs (RATE)
    pub fees_for_slps: u64,
    /// Share of strategy interest for SLPs (RATE)
    pub interests_for_slps: u64,
    /// Share of strategy gains kept as surplus (RATE)
    pub interests_for_surplus: u64,
    /// Flat SLP withdrawal haircut (RATE)
    pub slippage: u64,
    /// Mint fee curve keyed on the hedge ratio
    pub mint_fee_curve: PiecewiseCurve,
    /// Burn fee curve keyed on the post-burn hedge ratio
    pub burn_fee_curve: PiecewiseCurve,

    /// Fraction of stocks_users that should be hedged (RATE)
    pub target_hedge_ratio: u64,
    /// Force-close trigger (RATE, >= target)
    pub limit_hedge_ratio: u64,
    /// Maximum committed/margin leverage (RATE)
    pub max_leverage: u64,
    /// Liquidation threshold (RATE)
    pub maintenance_margin: u64,
    /// Minimum holding period in seconds
    pub lock_time: i64,
    /// Entry fee curve keyed on coverage room
    pub entry_fee_curve: PiecewiseCurve,
    /// Exit fee curve keyed on post-removal hedge ratio
    pub exit_fee_curve: PiecewiseCurve,
    /// Keeper liquidation fee fraction (RATE)
    pub keeper_fees_liquidation_ratio: u64,
    /// Keeper liquidation fee cap, collateral units
    pub keeper_fees_liquidation_cap: u64,
    /// Keeper force-close fee fraction of exit fees (RATE)
    pub keeper_fees_closing_ratio: u64,
    /// Keeper force-close fee cap, collateral units
    pub keeper_fees_closing_cap: u64,
    /// Authority allowed to notify rewards
    pub rewards_distributor: Pubkey,
    /// Reward period length in seconds
    pub rewards_duration: i64,
}

pub fn add_collateral_pool(
    ctx: Context<AddCollateralPool>,
    params: &AddCollateralPoolParams,
) -> Result<()> {
    let controller = ctx.accounts.controller.as_mut();
    let pool = ctx.accounts.pool.as_mut();
    let market = ctx.accounts.hedge_market.as_mut();

    msg!("Initialize collateral pool");
    pool.collateral_mint = ctx.accounts.collateral_mint.key();
    pool.collateral_decimals = ctx.accounts.collateral_mint.decimals;
    pool.oracle.oracle_account = ctx.accounts.rate_oracle.key();
    pool.oracle.oracle_authority = params.oracle_authority;
    pool.oracle.max_rate_error = params.max_rate_error;
    pool.oracle.max_rate_age_sec = params.max_rate_age_sec;

    pool.stocks_users = 0;
    pool.cap_on_stocks_users = params.cap_on_stocks_users;
    pool.san_rate = StableController::RATE_POWER as u64;
    pool.max_san_rate_update = params.max_san_rate_update;
    pool.fees_for_slps = params.fees_for_slps;
    pool.interests_for_slps = params.interests_for_slps;
    pool.interests_for_surplus = params.interests_for_surplus;
    pool.slippage = params.slippage;
    pool.slippage_fee = 0;
    pool.mint_fee_curve = params.mint_fee_curve.clone();
    pool.burn_fee_curve = params.burn_fee_curve.clone();
    pool.bonus_malus_mint = StableController::RATE_POWER as u64;
    pool.bonus_malus_burn = StableController::RATE_POWER as u64;
    pool.allow_mint = true;
    pool.allow_burn = true;
    pool.allow_deposit = true;
    pool.allow_withdraw = true;
    pool.bump = ctx.bumps.pool;
    pool.token_account_bump = ctx.bumps.pool_token_account;
    pool.san_mint_bump = ctx.bumps.san_mint;

    if !pool.validate() {
        return err!(StablehedgeError::InvalidFeeCurve);
    }

    msg!("Initialize hedging market");
    market.pool = pool.key();
    market.target_hedge_ratio = params.target_hedge_ratio;
    market.limit_hedge_ratio = params.limit_hedge_ratio;
    market.max_leverage = params.max_leverage;
    market.maintenance_margin = params.maintenance_margin;
    market.lock_time = params.lock_time;
    market.entry_fee_curve = params.entry_fee_curve.clone();
    market.exit_fee_curve = params.exit_fee_curve.clone();
    market.ha_bonus_malus_deposit = StableController::RATE_POWER as u64;
    market.ha_bonus_malus_withdraw = StableController::RATE_POWER as u64;
    market.keeper_fees_liquidation_ratio = params.keeper_fees_liquidation_ratio;
    market.keeper_fees_liquidation_cap = params.keeper_fees_liquidation_cap;
    market.keeper_fees_closing_ratio = params.keeper_fees_closing_ratio;
    market.keeper_fees_closing_cap = params.keeper_fees_closing_cap;
    market.rewards.rewards_distributor = params.rewards_distributor;
    market.rewards.rewards_duration = params.rewards_duration;
    market.allow_open = true;
    market.allow_close = true;
    market.bump = ctx.bumps.hedge_market;
    market.reward_vault_bump = ctx.bumps.reward_vault;

    if !market.validate() {
        return err!(StablehedgeError::InvalidParameter);
    }

    ctx.accounts.rate_oracle.bump = ctx.bumps.rate_oracle;

    controller.pools.push(pool.key());

    Ok(())
}
