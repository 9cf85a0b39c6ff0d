//! Global program state and token utility functions
//!
//! The controller stores protocol-wide authorities and the registry of
//! collateral pools, and provides the token CPI helpers every instruction
//! uses to move collateral, stablecoins, san tokens and rewards.

use {
    anchor_lang::prelude::*,
    anchor_spl::token::{Burn, MintTo, Transfer},
};

/// Main controller account
///
/// Root account holding global authorities, the stablecoin mint and the
/// list of collateral pools.
#[account]
#[derive(Default, Debug)]
pub struct StableController {
    /// Authority for protocol-critical parameters (fee curves, hedge
    /// parameters, strategies, authority rotation)
    pub governor: Pubkey,
    /// Authority for pausing and fee-policy corrections
    pub guardian: Pubkey,
    /// Mint of the stablecoin issued against every pool
    pub stable_mint: Pubkey,
    /// Mint of the token distributed to hedging agents as staking rewards
    pub reward_mint: Pubkey,
    /// Registered collateral pool addresses
    pub pools: Vec<Pubkey>,

    /// Bump seed for the controller PDA
    pub bump: u8,
    /// Bump seed for the transfer authority PDA
    pub transfer_authority_bump: u8,
    /// Bump seed for the stable mint PDA
    pub stable_mint_bump: u8,
    /// Time of inception, also used as current wall clock time for testing
    pub inception_time: i64,
}

impl StableController {
    pub const LEN: usize = 8 + std::mem::size_of::<StableController>() + 32 * 8;

    /// Decimal places for ratio/fee parameters (1e9 == 100%)
    pub const RATE_DECIMALS: u8 = 9;
    /// Power of 10 for ratio/fee parameters
    pub const RATE_POWER: u128 = 10u64.pow(Self::RATE_DECIMALS as u32) as u128;
    /// Decimal places for oracle rates (stablecoin units per collateral unit)
    pub const PRICE_DECIMALS: u8 = 6;
    /// Decimal places for the stablecoin mint
    pub const STABLE_DECIMALS: u8 = 6;
    /// Decimal places for san (SLP share) tokens
    pub const SAN_DECIMALS: u8 = Self::STABLE_DECIMALS;

    pub fn validate(&self) -> bool {
        self.governor != Pubkey::default() && self.guardian != Pubkey::default()
    }

    pub fn is_governor(&self, key: &Pubkey) -> bool {
        *key == self.governor
    }

    /// Guardian operations are also open to the governor.
    pub fn is_guardian(&self, key: &Pubkey) -> bool {
        *key == self.guardian || *key == self.governor
    }

    /// Get current time (test mode - uses inception_time)
    #[cfg(feature = "test")]
    pub fn get_time(&self) -> Result<i64> {
        Ok(self.inception_time)
    }

    /// Get current time from the clock sysvar (production mode)
    #[cfg(not(feature = "test"))]
    pub fn get_time(&self) -> Result<i64> {
        let time = anchor_lang::solana_program::sysvar::clock::Clock::get()?.unix_timestamp;
        if time > 0 {
            Ok(time)
        } else {
            Err(ProgramError::InvalidAccountData.into())
        }
    }

    /// Get current slot (test mode - derives a fake slot from inception_time)
    #[cfg(feature = "test")]
    pub fn get_slot(&self) -> Result<u64> {
        Ok(self.inception_time as u64)
    }

    /// Get current slot from the clock sysvar (production mode)
    #[cfg(not(feature = "test"))]
    pub fn get_slot(&self) -> Result<u64> {
        Ok(anchor_lang::solana_program::sysvar::clock::Clock::get()?.slot)
    }

    /// Transfer tokens out of a program-owned account using the transfer
    /// authority PDA
    pub fn transfer_tokens<'info>(
        &self,
        from: AccountInfo<'info>,
        to: AccountInfo<'info>,
        authority: AccountInfo<'info>,
        token_program: AccountInfo<'info>,
        amount: u64,
    ) -> Result<()> {
        let authority_seeds: &[&[&[u8]]] =
            &[&[b"transfer_authority", &[self.transfer_authority_bump]]];

        let context = CpiContext::new(
            token_program,
            Transfer {
                from,
                to,
                authority,
            },
        )
        .with_signer(authority_seeds);

        anchor_spl::token::transfer(context, amount)
    }

    /// Transfer tokens from a user account (user signs the transaction)
    pub fn transfer_tokens_from_user<'info>(
        &self,
        from: AccountInfo<'info>,
        to: AccountInfo<'info>,
        authority: AccountInfo<'info>,
        token_program: AccountInfo<'info>,
        amount: u64,
    ) -> Result<()> {
        let context = CpiContext::new(
            token_program,
            Transfer {
                from,
                to,
                authority,
            },
        );
        anchor_spl::token::transfer(context, amount)
    }

    /// Mint stablecoin, san or reward tokens using the transfer authority PDA
    pub fn mint_tokens<'info>(
        &self,
        mint: AccountInfo<'info>,
        to: AccountInfo<'info>,
        authority: AccountInfo<'info>,
        token_program: AccountInfo<'info>,
        amount: u64,
    ) -> Result<()> {
        let authority_seeds: &[&[&[u8]]] =
            &[&[b"transfer_authority", &[self.transfer_authority_bump]]];

        let context = CpiContext::new(
            token_program,
            MintTo {
                mint,
                to,
                authority,
            },
        )
        .with_signer(authority_seeds);

        anchor_spl::token::mint_to(context, amount)
    }

    /// Burn tokens from an account whose owner signed the transaction
    pub fn burn_tokens<'info>(
        &self,
        mint: AccountInfo<'info>,
        from: AccountInfo<'info>,
        authority: AccountInfo<'info>,
        token_program: AccountInfo<'info>,
        amount: u64,
    ) -> Result<()> {
        let context = CpiContext::new(
            token_program,
            Burn {
                mint,
                from,
                authority,
            },
        );

        anchor_spl::token::burn(context, amount)
    }

    /// Check if an account is empty (no data or zero lamports)
    pub fn is_empty_account(account_info: &AccountInfo) -> Result<bool> {
        Ok(account_info.try_data_is_empty()? || account_info.try_lamports()? == 0)
    }
}
