//! Init instruction handler
//!
//! Initializes the protocol: creates the controller account, the
//! transfer_authority PDA used to sign all token CPIs, and the stablecoin
//! mint. Must be called once before any other operation.

use {
    crate::{
        error::StablehedgeError,
        state::core::StableController,
    },
    anchor_lang::prelude::*,
    anchor_spl::token::{Mint, Token},
};

/// Accounts required for initializing the protocol
#[derive(Accounts)]
pub struct Init<'info> {
    /// Deployer paying for account creation; becomes the initial governor
    /// unless the params override it
    #[account(mut)]
    pub payer: Signer<'info>,

    /// Transfer authority PDA to be initialized
    ///
    /// CHECK: Empty PDA, will be set as authority for token accounts
    #[account(
        init,
        payer = payer,
        space = 0,
        seeds = [b"transfer_authority"],
        bump
    )]
    pub transfer_authority: AccountInfo<'info>,

    /// Controller account to be initialized
    #[account(
        init,
        payer = payer,
        space = StableController::LEN,
        seeds = [b"controller"],
        bump
    )]
    pub controller: Box<Account<'info, StableController>>,

    /// Stablecoin mint to be initialized, minted and burned only through
    /// the transfer authority
    #[account(
        init,
        payer = payer,
        mint::decimals = StableController::STABLE_DECIMALS,
        mint::authority = transfer_authority,
        seeds = [b"stable_mint"],
        bump
    )]
    pub stable_mint: Box<Account<'info, Mint>>,

    /// Mint of the token distributed as hedging-agent rewards
    pub reward_mint: Box<Account<'info, Mint>>,

    system_program: Program<'info, System>,
    token_program: Program<'info, Token>,
}

/// Parameters for initializing the protocol
#[derive(AnchorSerialize, AnchorDeserialize, Copy, Clone)]
pub struct InitParams {
    /// Authority for protocol-critical parameters
    pub governor: Pubkey,
    /// Authority for pausing and fee corrections
    pub guardian: Pubkey,
}

pub fn init(ctx: Context<Init>, params: &InitParams) -> Result<()> {
    let controller = ctx.accounts.controller.as_mut();

    controller.governor = params.governor;
    controller.guardian = params.guardian;
    controller.stable_mint = ctx.accounts.stable_mint.key();
    controller.reward_mint = ctx.accounts.reward_mint.key();
    controller.pools = Vec::new();

    controller.bump = ctx.bumps.controller;
    controller.transfer_authority_bump = ctx.bumps.transfer_authority;
    controller.stable_mint_bump = ctx.bumps.stable_mint;
    controller.inception_time = controller.get_time()?;

    if !controller.validate() {
        return err!(StablehedgeError::InvalidParameter);
    }

    Ok(())
}
