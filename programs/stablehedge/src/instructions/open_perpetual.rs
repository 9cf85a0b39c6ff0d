//! OpenPerpetual instruction handler
//!
//! A hedging agent posts margin and commits collateral to hedge the
//! pool's price exposure. Admission is bounded by the target coverage:
//! the position's stable-denominated hedge contribution, frozen at the
//! entry rate, must fit under `target_hedge_ratio * stocks_users`. The
//! entry fee follows the market's curve keyed on the remaining coverage
//! room, and leverage is checked on the margin NET of that fee.

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
    anchor_lang::prelude::*,
    anchor_spl::token::{Mint, Token, TokenAccount},
};

/// Accounts required for opening a perpetual
#[derive(Accounts)]
pub struct OpenPerpetual<'info> {
    /// Hedging agent (signer, pays for the position account)
    #[account(mut)]
    pub owner: Signer<'info>,

    /// Agent's collateral token account, debited for the margin
    #[account(
        mut,
        constraint = funding_account.mint == pool.collateral_mint,
        constraint = funding_account.owner == owner.key()
    )]
    pub funding_account: Box<Account<'info, TokenAccount>>,

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

    /// Collateral pool (mutable, fee routing touches the san-rate carry)
    #[account(
        mut,
        seeds = [b"pool", pool.collateral_mint.as_ref()],
        bump = pool.bump
    )]
    pub pool: Box<Account<'info, CollateralPool>>,

    /// Hedging market (mutable, hedge total and position counter grow)
    #[account(
        mut,
        seeds = [b"hedge_market", pool.key().as_ref()],
        bump = hedge_market.bump
    )]
    pub hedge_market: Box<Account<'info, HedgeMarket>>,

    /// New position account (PDA keyed by the market's next id)
    #[account(
        init,
        payer = owner,
        space = Perpetual::LEN,
        seeds = [b"perpetual",
                 hedge_market.key().as_ref(),
                 hedge_market.next_position_id.to_le_bytes().as_ref()],
        bump
    )]
    pub perpetual: Box<Account<'info, Perpetual>>,

    /// Rate oracle for this pool
    ///
    /// CHECK: Oracle account, validated by constraint
    #[account(
        constraint = rate_oracle.key() == pool.oracle.oracle_account
    )]
    pub rate_oracle: AccountInfo<'info>,

    /// Pool's collateral token account, credited with the margin
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

    system_program: Program<'info, System>,
    token_program: Program<'info, Token>,
}

/// Parameters for opening a perpetual
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy)]
pub struct OpenPerpetualParams {
    /// Margin to post, collateral native decimals
    pub margin: u64,
    /// Collateral amount committed as hedge; immutable afterwards
    pub committed_amount: u64,
    /// Maximum acceptable entry rate, scaled to PRICE_DECIMALS
    /// (slippage protection against the upper oracle bound)
    pub max_rate: u64,
}

pub fn open_perpetual(ctx: Context<OpenPerpetual>, params: &OpenPerpetualParams) -> Result<()> {
    msg!("Check permissions");
    let controller = ctx.accounts.controller.as_ref();
    let pool = ctx.accounts.pool.as_mut();
    let market = ctx.accounts.hedge_market.as_mut();
    require!(market.allow_open, StablehedgeError::InstructionNotAllowed);
    require!(
        params.margin > 0 && params.committed_amount > 0,
        StablehedgeError::ZeroAmount
    );

    let curtime = controller.get_time()?;
    let current_slot = controller.get_slot()?;

    // agents enter against the upper bound of the oracle bracket
    let rate = OracleRate::new_from_oracle(
        &ctx.accounts.rate_oracle.to_account_info(),
        &pool.oracle,
        curtime,
        RateBound::Upper,
    )?;
    let entry_rate = rate
        .scale_to_exponent(-(StableController::PRICE_DECIMALS as i32))?
        .rate;
    msg!("Entry rate: {}", entry_rate);
    require!(entry_rate <= params.max_rate, StablehedgeError::RateAboveMax);

    // entry fee from the remaining coverage room, charged on the
    // committed amount and taken out of the margin
    let fee_rate = market.entry_fee_rate(pool.stocks_users)?;
    let fee_amount = HedgeMarket::fee_amount(fee_rate, params.committed_amount)?;
    let net_margin = math::checked_sub(params.margin, fee_amount)?;
    msg!("Collected fee: {}", fee_amount);

    require!(
        market.check_leverage(params.committed_amount, net_margin)?,
        StablehedgeError::MaxLeverageExceeded
    );

    // the hedge contribution is frozen in stable terms at the entry rate
    let hedge_amount = rate.get_stable_amount(params.committed_amount, pool.collateral_decimals)?;
    require!(hedge_amount > 0, StablehedgeError::ZeroAmount);

    // reward checkpoint before the stake weight changes
    let total_hedge_amount = market.total_hedge_amount;
    market
        .rewards
        .checkpoint_global(total_hedge_amount, curtime)?;

    market.admit_hedge(hedge_amount, pool.stocks_users)?;

    msg!("Initialize new position");
    let position_id = market.next_position_id;
    market.next_position_id = math::checked_add(market.next_position_id, 1)?;
    market.open_positions = math::checked_add(market.open_positions, 1)?;

    let perpetual = ctx.accounts.perpetual.as_mut();
    perpetual.owner = ctx.accounts.owner.key();
    perpetual.market = market.key();
    perpetual.id = position_id;
    perpetual.entry_rate = entry_rate;
    perpetual.margin = net_margin;
    perpetual.committed_amount = params.committed_amount;
    perpetual.hedge_amount = hedge_amount;
    perpetual.entry_time = curtime;
    perpetual.reward_per_token_paid = market.rewards.reward_per_token_stored;
    perpetual.rewards_owed = 0;
    perpetual.bump = ctx.bumps.perpetual;

    // fee routing: SLP share into the san-rate carryover, rest to the
    // protocol
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
        ctx.accounts.owner.to_account_info(),
        ctx.accounts.token_program.to_account_info(),
        params.margin,
    )?;

    Ok(())
}
