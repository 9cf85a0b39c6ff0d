//! RemoveFromPerpetual instruction handler
//!
//! Withdraws part of a position's margin. The touch re-checks liquidation
//! first, the lock time must have elapsed, the amount must leave the
//! position above its maintenance margin, and the higher post-removal
//! leverage must still satisfy the market maximum.

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

/// Accounts required for removing margin from a position
#[derive(Accounts)]
pub struct RemoveFromPerpetual<'info> {
    /// Position owner (signer)
    #[account(mut)]
    pub owner: Signer<'info>,

    /// Destination collateral token account
    #[account(
        mut,
        constraint = receiving_account.mint == pool.collateral_mint
    )]
    pub receiving_account: Box<Account<'info, TokenAccount>>,

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

    /// Position to withdraw from (mutable, owned by the signer)
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

    /// Vault holding undistributed rewards
    #[account(
        mut,
        seeds = [b"reward_vault", hedge_market.key().as_ref()],
        bump = hedge_market.reward_vault_bump
    )]
    pub reward_vault: Box<Account<'info, TokenAccount>>,

    token_program: Program<'info, Token>,
}

/// Parameters for removing margin from a position
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy)]
pub struct RemoveFromPerpetualParams {
    /// Margin to withdraw, collateral native decimals
    pub amount: u64,
}

pub fn remove_from_perpetual(
    ctx: Context<RemoveFromPerpetual>,
    params: &RemoveFromPerpetualParams,
) -> Result<()> {
    msg!("Check permissions");
    let controller = ctx.accounts.controller.as_ref();
    let pool = ctx.accounts.pool.as_mut();
    let market = ctx.accounts.hedge_market.as_mut();
    require!(market.allow_close, StablehedgeError::InstructionNotAllowed);
    require!(params.amount > 0, StablehedgeError::ZeroAmount);

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
    if liquidatable {
        msg!("Position is liquidated");
        let total_hedge_amount = market.total_hedge_amount;
        market
            .rewards
            .checkpoint(perpetual, total_hedge_amount, curtime)?;
        let rewards_owed = market.rewards.claim(perpetual);
        market.release_hedge(perpetual.hedge_amount)?;
        market.open_positions = math::checked_sub(market.open_positions, 1)?;

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

    // withdrawal gates: lock time, remaining value, maintenance margin,
    // post-removal leverage
    require!(
        math::checked_sub(curtime, perpetual.entry_time)? >= market.lock_time,
        StablehedgeError::LockTimeNotElapsed
    );
    require!(
        value > params.amount && perpetual.margin > params.amount,
        StablehedgeError::TooMuchRequested
    );
    let value_after = math::checked_sub(value, params.amount)?;
    require!(
        math::checked_mul(value_after as u128, StableController::RATE_POWER)?
            > math::checked_mul(
                market.maintenance_margin as u128,
                perpetual.committed_amount as u128
            )?,
        StablehedgeError::BelowMaintenanceMargin
    );
    let new_margin = math::checked_sub(perpetual.margin, params.amount)?;
    require!(
        market.check_leverage(perpetual.committed_amount, new_margin)?,
        StablehedgeError::MaxLeverageExceeded
    );

    msg!("Update position");
    perpetual.margin = new_margin;
    msg!("Amount out: {}", params.amount);

    msg!("Transfer tokens");
    controller.transfer_tokens(
        ctx.accounts.pool_token_account.to_account_info(),
        ctx.accounts.receiving_account.to_account_info(),
        ctx.accounts.transfer_authority.to_account_info(),
        ctx.accounts.token_program.to_account_info(),
        params.amount,
    )?;

    Ok(())
}
