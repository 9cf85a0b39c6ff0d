//! AddToPerpetual instruction handler
//!
//! Adds margin to an open position. Touching a position re-checks its
//! liquidation state first: a position that price movements have pushed
//! at or under the maintenance margin is settled and burned on the spot
//! instead of being topped up.

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

/// Accounts required for adding margin to a position
#[derive(Accounts)]
pub struct AddToPerpetual<'info> {
    /// Position owner (signer)
    #[account(mut)]
    pub owner: Signer<'info>,

    /// Owner's collateral token account, debited
    #[account(
        mut,
        constraint = funding_account.mint == pool.collateral_mint,
        constraint = funding_account.owner == owner.key()
    )]
    pub funding_account: Box<Account<'info, TokenAccount>>,

    /// Owner's reward token account, credited if the touch liquidates
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

    /// Collateral pool (mutable, a touch-liquidation books into stocks_users)
    #[account(
        mut,
        seeds = [b"pool", pool.collateral_mint.as_ref()],
        bump = pool.bump
    )]
    pub pool: Box<Account<'info, CollateralPool>>,

    /// Hedging market (mutable)
    #[account(
        mut,
        seeds = [b"hedge_market", pool.key().as_ref()],
        bump = hedge_market.bump
    )]
    pub hedge_market: Box<Account<'info, HedgeMarket>>,

    /// Position to top up (mutable, owned by the signer)
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

    /// Pool's collateral token account, credited
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

/// Parameters for adding margin to a position
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy)]
pub struct AddToPerpetualParams {
    /// Margin to add, collateral native decimals
    pub amount: u64,
}

pub fn add_to_perpetual(ctx: Context<AddToPerpetual>, params: &AddToPerpetualParams) -> Result<()> {
    msg!("Check permissions");
    let controller = ctx.accounts.controller.as_ref();
    let pool = ctx.accounts.pool.as_mut();
    let market = ctx.accounts.hedge_market.as_mut();
    require!(market.allow_open, StablehedgeError::InstructionNotAllowed);
    require!(params.amount > 0, StablehedgeError::ZeroAmount);

    let curtime = controller.get_time()?;

    // lazy liquidation on touch
    msg!("Check position state");
    let rate = OracleRate::new_from_oracle(
        &ctx.accounts.rate_oracle.to_account_info(),
        &pool.oracle,
        curtime,
        RateBound::Lower,
    )?;
    let perpetual = ctx.accounts.perpetual.as_mut();
    let (_, liquidatable) = perpetual.cash_out_value(&rate, market.maintenance_margin)?;
    if liquidatable {
        msg!("Position is liquidated");
        let total_hedge_amount = market.total_hedge_amount;
        market
            .rewards
            .checkpoint(perpetual, total_hedge_amount, curtime)?;
        let rewards_owed = market.rewards.claim(perpetual);
        market.release_hedge(perpetual.hedge_amount)?;
        market.open_positions = math::checked_sub(market.open_positions, 1)?;

        // the margin stays behind for stable holders
        let collateral_decimals = pool.collateral_decimals;
        pool.propagate_stocks_delta(perpetual.stocks_delta(&rate, 0, collateral_decimals)?)?;

        if rewards_owed > 0 {
            controller.transfer_tokens(
                ctx.accounts.reward_vault.to_account_info(),
                ctx.accounts.reward_account.to_account_info(),
                ctx.accounts.transfer_authority.to_account_info(),
                ctx.accounts.token_program.to_account_info(),
                rewards_owed,
            )?;
        }
        return ctx
            .accounts
            .perpetual
            .close(ctx.accounts.owner.to_account_info());
    }

    msg!("Update position");
    perpetual.margin = math::checked_add(perpetual.margin, params.amount)?;

    msg!("Transfer tokens");
    controller.transfer_tokens_from_user(
        ctx.accounts.funding_account.to_account_info(),
        ctx.accounts.pool_token_account.to_account_info(),
        ctx.accounts.owner.to_account_info(),
        ctx.accounts.token_program.to_account_info(),
        params.amount,
    )?;

    Ok(())
}
