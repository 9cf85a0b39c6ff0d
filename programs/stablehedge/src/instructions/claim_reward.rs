//! ClaimReward instruction handler
//!
//! A hedging agent collects the staking rewards accrued by an open
//! position. The position's checkpoint is refreshed first, then the owed
//! amount is paid from the reward vault and zeroed.

use {
    crate::{
        state::{
            collateral::CollateralPool, core::StableController, hedge_market::HedgeMarket,
            perpetual::Perpetual,
        },
    },
    anchor_lang::prelude::*,
    anchor_spl::token::{Token, TokenAccount},
};

/// Accounts required for claiming rewards
#[derive(Accounts)]
pub struct ClaimReward<'info> {
    /// Position owner (signer)
    #[account(mut)]
    pub owner: Signer<'info>,

    /// Owner's reward token account, credited
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

    /// Collateral pool of the market
    #[account(
        seeds = [b"pool", pool.collateral_mint.as_ref()],
        bump = pool.bump
    )]
    pub pool: Box<Account<'info, CollateralPool>>,

    /// Hedging market (mutable, accrual checkpoint advances)
    #[account(
        mut,
        seeds = [b"hedge_market", pool.key().as_ref()],
        bump = hedge_market.bump
    )]
    pub hedge_market: Box<Account<'info, HedgeMarket>>,

    /// Position whose rewards are claimed (mutable, owned by the signer)
    #[account(
        mut,
        has_one = owner,
        seeds = [b"perpetual",
                 hedge_market.key().as_ref(),
                 perpetual.id.to_le_bytes().as_ref()],
        bump = perpetual.bump
    )]
    pub perpetual: Box<Account<'info, Perpetual>>,

    /// Vault holding undistributed rewards, debited
    #[account(
        mut,
        seeds = [b"reward_vault", hedge_market.key().as_ref()],
        bump = hedge_market.reward_vault_bump
    )]
    pub reward_vault: Box<Account<'info, TokenAccount>>,

    token_program: Program<'info, Token>,
}

/// Parameters for claiming rewards
///
/// Empty, kept for consistency with other instructions.
#[derive(AnchorSerialize, AnchorDeserialize)]
pub struct ClaimRewardParams {}

pub fn claim_reward(ctx: Context<ClaimReward>, _params: &ClaimRewardParams) -> Result<()> {
    let controller = ctx.accounts.controller.as_ref();
    let market = ctx.accounts.hedge_market.as_mut();
    let perpetual = ctx.accounts.perpetual.as_mut();

    let curtime = controller.get_time()?;

    let total_hedge_amount = market.total_hedge_amount;
    market
        .rewards
        .checkpoint(perpetual, total_hedge_amount, curtime)?;
    let amount = market.rewards.claim(perpetual);
    msg!("Reward paid: {}", amount);

    if amount > 0 {
        controller.transfer_tokens(
            ctx.accounts.reward_vault.to_account_info(),
            ctx.accounts.reward_account.to_account_info(),
            ctx.accounts.transfer_authority.to_account_info(),
            ctx.accounts.token_program.to_account_info(),
            amount,
        )?;
    }

    Ok(())
}
