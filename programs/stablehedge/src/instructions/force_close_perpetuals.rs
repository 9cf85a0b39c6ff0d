//! ForceClosePerpetuals instruction handler
//!
//! Permissionless rebalancing of an over-hedged market. When burns have
//! shrunk stocks_users so far that the total hedge exceeds the limit
//! coverage, anyone may cash positions out, in the order given, until the
//! total is back at or under the target. Closed owners are paid their
//! value net of exit fees (the lock time does not gate an involuntary
//! close); positions that are liquidatable anyway are liquidated with no
//! owner payout.
//!
//! The keeper earns a bounded fraction of the exit fees, capped by an
//! absolute ceiling AND by the estimated cost of moving stocks_users
//! through a burn at the assumed burn-fee rate, so that a burn-then-force-
//! close manipulation can never pay for itself.
//!
//! remaining accounts: triplets of
//!   [perpetual, owner collateral token account, owner reward token account]

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

/// Accounts required for force closing positions
#[derive(Accounts)]
pub struct ForceClosePerpetuals<'info> {
    /// Keeper (signer, receives the closing fee and closed accounts' rent)
    #[account(mut)]
    pub keeper: Signer<'info>,

    /// Keeper's collateral token account, credited with the closing fee
    #[account(
        mut,
        constraint = keeper_account.mint == pool.collateral_mint,
        constraint = keeper_account.owner == keeper.key()
    )]
    pub keeper_account: Box<Account<'info, TokenAccount>>,

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

    /// Collateral pool (mutable, realized deltas book into stocks_users)
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

    /// Rate oracle for this pool
    ///
    /// CHECK: Oracle account, validated by constraint
    #[account(
        constraint = rate_oracle.key() == pool.oracle.oracle_account
    )]
    pub rate_oracle: AccountInfo<'info>,

    /// Pool's collateral token account, debited for payouts and the fee
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

    /// Vault holding undistributed rewards
    #[account(
        mut,
        seeds = [b"reward_vault", hedge_market.key().as_ref()],
        bump = hedge_market.reward_vault_bump
    )]
    pub reward_vault: Box<Account<'info, TokenAccount>>,

    token_program: Program<'info, Token>,
    // remaining accounts: triplets of
    //   [perpetual, owner collateral token account, owner reward token account]
}

/// Parameters for force closing positions
///
/// Empty: the positions to close arrive as remaining accounts.
#[derive(AnchorSerialize, AnchorDeserialize)]
pub struct ForceClosePerpetualsParams {}

pub fn force_close_perpetuals<'info>(
    ctx: Context<'_, '_, 'info, 'info, ForceClosePerpetuals<'info>>,
    _params: &ForceClosePerpetualsParams,
) -> Result<()> {
    let controller = ctx.accounts.controller.as_ref();
    let pool = ctx.accounts.pool.as_mut();
    let market = ctx.accounts.hedge_market.as_mut();

    msg!("Check coverage");
    require!(
        market.total_hedge_amount > market.limit_hedge(pool.stocks_users)?,
        StablehedgeError::NotOverHedged
    );
    let target = market.target_hedge(pool.stocks_users)?;

    let curtime = controller.get_time()?;
    let current_slot = controller.get_slot()?;
    let rate = OracleRate::new_from_oracle(
        &ctx.accounts.rate_oracle.to_account_info(),
        &pool.oracle,
        curtime,
        RateBound::Lower,
    )?;

    let mut exit_fees_total: u64 = 0;
    let mut idle = ctx.accounts.pool_token_account.amount;

    for accounts in ctx.remaining_accounts.chunks(3) {
        if market.total_hedge_amount <= target {
            break;
        }
        require!(accounts.len() == 3, StablehedgeError::InvalidParameter);

        let mut perpetual = Account::<Perpetual>::try_from(&accounts[0])?;
        require!(
            perpetual.market == market.key(),
            StablehedgeError::InvalidParameter
        );
        let owner_collateral = Account::<TokenAccount>::try_from(&accounts[1])?;
        require!(
            owner_collateral.mint == pool.collateral_mint
                && owner_collateral.owner == perpetual.owner,
            StablehedgeError::InvalidParameter
        );
        let owner_reward = Account::<TokenAccount>::try_from(&accounts[2])?;
        require!(
            owner_reward.mint == controller.reward_mint
                && owner_reward.owner == perpetual.owner,
            StablehedgeError::InvalidParameter
        );

        msg!("Force close position {}", perpetual.id);
        let total_hedge_amount = market.total_hedge_amount;
        market
            .rewards
            .checkpoint(&mut perpetual, total_hedge_amount, curtime)?;
        let rewards_owed = market.rewards.claim(&mut perpetual);

        let (value, liquidatable) =
            perpetual.cash_out_value(&rate, market.maintenance_margin)?;
        let payout = if liquidatable {
            0
        } else {
            let fee_rate = market.exit_fee_rate(pool.stocks_users, perpetual.hedge_amount)?;
            let fee_amount = HedgeMarket::fee_amount(fee_rate, value)?;
            exit_fees_total = math::checked_add(exit_fees_total, fee_amount)?;
            math::checked_sub(value, fee_amount)?
        };
        require!(payout <= idle, StablehedgeError::InsufficientReserves);
        idle = math::checked_sub(idle, payout)?;

        let gross_out = if liquidatable { 0 } else { value };
        let collateral_decimals = pool.collateral_decimals;
        pool.propagate_stocks_delta(perpetual.stocks_delta(
            &rate,
            gross_out,
            collateral_decimals,
        )?)?;

        market.release_hedge(perpetual.hedge_amount)?;
        market.open_positions = math::checked_sub(market.open_positions, 1)?;

        if payout > 0 {
            controller.transfer_tokens(
                ctx.accounts.pool_token_account.to_account_info(),
                accounts[1].clone(),
                ctx.accounts.transfer_authority.to_account_info(),
                ctx.accounts.token_program.to_account_info(),
                payout,
            )?;
        }
        if rewards_owed > 0 {
            controller.transfer_tokens(
                ctx.accounts.reward_vault.to_account_info(),
                accounts[2].clone(),
                ctx.accounts.transfer_authority.to_account_info(),
                ctx.accounts.token_program.to_account_info(),
                rewards_owed,
            )?;
        }

        perpetual.close(ctx.accounts.keeper.to_account_info())?;
    }

    // keeper reward: min(fee fraction, absolute cap, estimated cost of a
    // burn-driven stocks_users manipulation)
    let attack_cost = rate.get_collateral_amount(
        market.estimated_attack_cost(pool.stocks_users)?,
        pool.collateral_decimals,
    )?;
    let keeper_reward = std::cmp::min(
        market.keeper_closing_fee(exit_fees_total, attack_cost)?,
        idle,
    );
    msg!("Keeper reward: {}", keeper_reward);

    // the rest of the exit fees is split like any other fee flow
    let fees_kept = math::checked_sub(exit_fees_total, keeper_reward)?;
    let slp_share = math::checked_as_u64(math::checked_div(
        math::checked_mul(fees_kept as u128, pool.fees_for_slps as u128)?,
        StableController::RATE_POWER,
    )?)?;
    pool.update_san_rate(slp_share, ctx.accounts.san_mint.supply, current_slot)?;
    pool.protocol_fees = math::checked_add(
        pool.protocol_fees,
        math::checked_sub(fees_kept, slp_share)?,
    )?;

    if keeper_reward > 0 {
        controller.transfer_tokens(
            ctx.accounts.pool_token_account.to_account_info(),
            ctx.accounts.keeper_account.to_account_info(),
            ctx.accounts.transfer_authority.to_account_info(),
            ctx.accounts.token_program.to_account_info(),
            keeper_reward,
        )?;
    }

    Ok(())
}
