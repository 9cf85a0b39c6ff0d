//! NotifyRewardAmount instruction handler
//!
//! The rewards distributor funds the reward vault and starts (or tops up)
//! a distribution period. A still-running period rolls its undistributed
//! remainder into the new rate.

use {
    crate::{
        error::StablehedgeError,
        state::{collateral::CollateralPool, core::StableController, hedge_market::HedgeMarket},
    },
    anchor_lang::prelude::*,
    anchor_spl::token::{Token, TokenAccount},
};

/// Accounts required for notifying a reward amount
#[derive(Accounts)]
pub struct NotifyRewardAmount<'info> {
    /// Rewards distributor (signer)
    #[account(mut)]
    pub distributor: Signer<'info>,

    /// Distributor's reward token account, debited
    #[account(
        mut,
        constraint = funding_account.mint == controller.reward_mint,
        constraint = funding_account.owner == distributor.key()
    )]
    pub funding_account: Box<Account<'info, TokenAccount>>,

    /// Controller account
    #[account(
        seeds = [b"controller"],
        bump = controller.bump
    )]
    pub controller: Box<Account<'info, StableController>>,

    /// Collateral pool of the market
    #[account(
        seeds = [b"pool", pool.collateral_mint.as_ref()],
        bump = pool.bump
    )]
    pub pool: Box<Account<'info, CollateralPool>>,

    /// Hedging market (mutable, distribution state changes)
    #[account(
        mut,
        seeds = [b"hedge_market", pool.key().as_ref()],
        bump = hedge_market.bump,
        constraint = hedge_market.rewards.rewards_distributor == distributor.key()
            @ StablehedgeError::UnauthorizedCaller
    )]
    pub hedge_market: Box<Account<'info, HedgeMarket>>,

    /// Vault holding undistributed rewards, credited
    #[account(
        mut,
        seeds = [b"reward_vault", hedge_market.key().as_ref()],
        bump = hedge_market.reward_vault_bump
    )]
    pub reward_vault: Box<Account<'info, TokenAccount>>,

    token_program: Program<'info, Token>,
}

/// Parameters for notifying a reward amount
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy)]
pub struct NotifyRewardAmountParams {
    /// Reward tokens to add to the distribution
    pub reward: u64,
}

pub fn notify_reward_amount(
    ctx: Context<NotifyRewardAmount>,
    params: &NotifyRewardAmountParams,
) -> Result<()> {
    let controller = ctx.accounts.controller.as_ref();
    let market = ctx.accounts.hedge_market.as_mut();
    require!(params.reward > 0, StablehedgeError::ZeroAmount);

    let curtime = controller.get_time()?;

    msg!("Transfer tokens");
    controller.transfer_tokens_from_user(
        ctx.accounts.funding_account.to_account_info(),
        ctx.accounts.reward_vault.to_account_info(),
        ctx.accounts.distributor.to_account_info(),
        ctx.accounts.token_program.to_account_info(),
        params.reward,
    )?;
    ctx.accounts.reward_vault.reload()?;

    msg!("Update distribution");
    let total_hedge_amount = market.total_hedge_amount;
    market.rewards.notify_reward_amount(
        params.reward,
        ctx.accounts.reward_vault.amount,
        total_hedge_amount,
        curtime,
    )?;
    msg!("Reward rate: {}", market.rewards.reward_rate);

    Ok(())
}
