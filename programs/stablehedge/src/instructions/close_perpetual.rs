//! ClosePerpetual instruction handler
//!
//! A hedging agent cashes out an open position at the lower oracle rate.
//! A position price movements have already pushed to or under its
//! maintenance margin takes the liquidation path instead of a normal cash
//! out: the owner gets nothing back but the accrued rewards. Otherwise
//! the agent receives the position value minus the exit fee; if idle
//! reserves cannot cover the payout, the shortfall converts into san
//! tokens at the current rate instead of failing the close.

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
    anchor_spl::token::{Mint, Token, TokenAccount},
};

/// Accounts required for cashing out a position
#[derive(Accounts)]
pub struct ClosePerpetual<'info> {
    /// Position owner (signer, receives the account rent back)
    #[account(mut)]
    pub owner: Signer<'info>,

    /// Destination collateral token account
    #[account(
        mut,
        constraint = receiving_account.mint == pool.collateral_mint
    )]
    pub receiving_account: Box<Account<'info, TokenAccount>>,

    /// Owner's san token account, credited when reserves cannot cover the
    /// payout
    #[account(
        mut,
        constraint = san_account.mint == san_mint.key(),
        constraint = san_account.owner == owner.key()
    )]
    pub san_account: Box<Account<'info, TokenAccount>>,

    /// Owner's reward token account
    #[account(
        mut,
        constraint = reward_account.mint == controller.reward_mint,
        constraint = reward_account.owner == owner.key()
    )]
    pub reward_account: Box<Account<'info, TokenAccount>>,

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

    /// Collateral pool (mutable, the realized PnL books into stocks_users)
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

    /// Position to cash out (mutable, owned by the signer, closed at the
    /// end)
    #[account(
        mut,
        has_one = owner,
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

    /// Pool's collateral token account, debited
    #[account(
        mut,
        seeds = [b"pool_token_account", pool.key().as_ref()],
        bump = pool.token_account_bump
    )]
    pub pool_token_account: Box<Account<'info, TokenAccount>>,

    /// San mint (mutable, supply may grow on the degraded path)
    #[account(
        mut,
        seeds = [b"san_mint", pool.key().as_ref()],
        bump = pool.san_mint_bump
    )]
    pub san_mint: Box<Account<'info, Mint>>,

    /// Vault holding undistributed rewards
    #[account(
        mut,
        seeds = [b"reward_vault", hedge_market.key().as_ref()],
        bump = hedge_market.reward_vault_bump
    )]
    pub reward_vault: Box<Account<'info, TokenAccount>>,

    token_program: Program<'info, Token>,
}

/// Parameters for cashing out a position
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy)]
pub struct ClosePerpetualParams {
    /// Minimum acceptable exit rate, scaled to PRICE_DECIMALS
    /// (slippage protection against the lower oracle bound)
    pub min_rate: u64,
}

pub fn close_perpetual(ctx: Context<ClosePerpetual>, params: &ClosePerpetualParams) -> Result<()> {
    msg!("Check permissions");
    let controller = ctx.accounts.controller.as_ref();
    let pool = ctx.accounts.pool.as_mut();
    let market = ctx.accounts.hedge_market.as_mut();
    require!(market.allow_close, StablehedgeError::InstructionNotAllowed);

    let curtime = controller.get_time()?;
    let current_slot = controller.get_slot()?;

    // agents exit against the lower bound of the oracle bracket
    let rate = OracleRate::new_from_oracle(
        &ctx.accounts.rate_oracle.to_account_info(),
        &pool.oracle,
        curtime,
        RateBound::Lower,
    )?;
    let exit_rate = rate
        .scale_to_exponent(-(StableController::PRICE_DECIMALS as i32))?
        .rate;
    require!(exit_rate >= params.min_rate, StablehedgeError::SlippageExceeded);

    msg!("Settle position");
    let perpetual = ctx.accounts.perpetual.as_mut();
    let (value, liquidatable) = perpetual.cash_out_value(&rate, market.maintenance_margin)?;

    // rewards settle before the stake weight changes, on every path
    let total_hedge_amount = market.total_hedge_amount;
    market
        .rewards
        .checkpoint(perpetual, total_hedge_amount, curtime)?;
    let rewards_owed = market.rewards.claim(perpetual);

    let payout = if liquidatable {
        // auto-liquidation path: the position is worthless or under its
        // maintenance margin, the owner keeps nothing
        msg!("Position is liquidated");
        0
    } else {
        require!(
            math::checked_sub(curtime, perpetual.entry_time)? >= market.lock_time,
            StablehedgeError::LockTimeNotElapsed
        );

        let fee_rate = market.exit_fee_rate(pool.stocks_users, perpetual.hedge_amount)?;
        let fee_amount = HedgeMarket::fee_amount(fee_rate, value)?;
        msg!("Collected fee: {}", fee_amount);

        let slp_share = math::checked_as_u64(math::checked_div(
            math::checked_mul(fee_amount as u128, pool.fees_for_slps as u128)?,
            StableController::RATE_POWER,
        )?)?;
        pool.update_san_rate(slp_share, ctx.accounts.san_mint.supply, current_slot)?;
        pool.protocol_fees = math::checked_add(
            pool.protocol_fees,
            math::checked_sub(fee_amount, slp_share)?,
        )?;

        math::checked_sub(value, fee_amount)?
    };
    msg!("Amount out: {}", payout);

    // the delta between the margin the agent leaves behind and the gross
    // value taken out belongs to the stable holders
    let gross_out = if liquidatable { 0 } else { value };
    let collateral_decimals = pool.collateral_decimals;
    pool.propagate_stocks_delta(perpetual.stocks_delta(&rate, gross_out, collateral_decimals)?)?;

    market.release_hedge(perpetual.hedge_amount)?;
    market.open_positions = math::checked_sub(market.open_positions, 1)?;

    msg!("Transfer tokens");
    let idle = ctx.accounts.pool_token_account.amount;
    let covered = std::cmp::min(payout, idle);
    if covered > 0 {
        controller.transfer_tokens(
            ctx.accounts.pool_token_account.to_account_info(),
            ctx.accounts.receiving_account.to_account_info(),
            ctx.accounts.transfer_authority.to_account_info(),
            ctx.accounts.token_program.to_account_info(),
            covered,
        )?;
    }
    let shortfall = math::checked_sub(payout, covered)?;
    if shortfall > 0 {
        // degraded success: reserves are lent out, the remainder becomes a
        // claim on the pool as san tokens at the current rate
        let san_amount = pool.san_amount_for_deposit(shortfall)?;
        msg!("Shortfall converted to san tokens: {}", san_amount);
        controller.mint_tokens(
            ctx.accounts.san_mint.to_account_info(),
            ctx.accounts.san_account.to_account_info(),
            ctx.accounts.transfer_authority.to_account_info(),
            ctx.accounts.token_program.to_account_info(),
            san_amount,
        )?;
    }

    if rewards_owed > 0 {
        controller.transfer_tokens(
            ctx.accounts.reward_vault.to_account_info(),
            ctx.accounts.reward_account.to_account_info(),
            ctx.accounts.transfer_authority.to_account_info(),
            ctx.accounts.token_program.to_account_info(),
            rewards_owed,
        )?;
    }

    ctx.accounts
        .perpetual
        .close(ctx.accounts.owner.to_account_info())
}
