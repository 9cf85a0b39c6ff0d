//! Oracle rate integration
//!
//! The protocol reads collateral prices (stablecoin units per collateral
//! unit) from a push oracle account. Callers never read a single point
//! price: mint and perpetual-close paths use the LOWER bound, burn and
//! perpetual-open paths use the UPPER bound, so that adverse selection
//! against the protocol is bounded by the oracle's bracket.

use {
    crate::{error::StablehedgeError, math, state::core::StableController},
    anchor_lang::prelude::*,
    core::cmp::Ordering,
};

/// Which side of the oracle bracket a caller wants
#[derive(Copy, Clone, PartialEq, AnchorSerialize, AnchorDeserialize, Debug)]
pub enum RateBound {
    Lower,
    Upper,
}

/// Oracle rate representation with mantissa and exponent
///
/// rate = rate * 10^exponent, e.g. rate=1_050_000, exponent=-6 is 1.05
#[derive(Copy, Clone, Eq, PartialEq, AnchorSerialize, AnchorDeserialize, Default, Debug)]
pub struct OracleRate {
    pub rate: u64,
    pub exponent: i32,
}

/// Configuration for a pool's oracle feed
#[derive(Copy, Clone, PartialEq, AnchorSerialize, AnchorDeserialize, Default, Debug)]
pub struct OracleParams {
    /// Address of the rate oracle account
    pub oracle_account: Pubkey,
    /// Authority allowed to push rate updates
    pub oracle_authority: Pubkey,
    /// Maximum acceptable confidence interval, in RATE terms relative to
    /// the quoted rate
    pub max_rate_error: u64,
    /// Maximum age of the quote in seconds before it is considered stale
    pub max_rate_age_sec: u32,
}

/// Push oracle account storing the current rate bracket on-chain
#[account]
#[derive(Default, Debug)]
pub struct RateOracle {
    /// Spot rate mantissa
    pub rate: u64,
    /// Exponential moving average rate mantissa
    pub ema_rate: u64,
    /// Rate exponent (shared by spot and EMA)
    pub expo: i32,
    /// Confidence interval around the spot rate
    pub conf: u64,
    /// Unix timestamp of the last push
    pub publish_time: i64,
    /// Bump seed for the oracle PDA
    pub bump: u8,
}

impl RateOracle {
    pub const LEN: usize = 8 + std::mem::size_of::<RateOracle>();

    pub fn set(&mut self, rate: u64, ema_rate: u64, expo: i32, conf: u64, publish_time: i64) {
        self.rate = rate;
        self.ema_rate = ema_rate;
        self.expo = expo;
        self.conf = conf;
        self.publish_time = publish_time;
    }
}

impl PartialOrd for OracleRate {
    fn partial_cmp(&self, other: &OracleRate) -> Option<Ordering> {
        let (lhs, rhs) = if self.exponent == other.exponent {
            (self.rate, other.rate)
        } else if self.exponent < other.exponent {
            if let Ok(scaled) = other.scale_to_exponent(self.exponent) {
                (self.rate, scaled.rate)
            } else {
                return None;
            }
        } else if let Ok(scaled) = self.scale_to_exponent(other.exponent) {
            (scaled.rate, other.rate)
        } else {
            return None;
        };
        lhs.partial_cmp(&rhs)
    }
}

impl OracleRate {
    pub fn new(rate: u64, exponent: i32) -> Self {
        Self { rate, exponent }
    }

    /// Read one side of the rate bracket from the oracle account.
    ///
    /// `Lower` returns min(spot, ema), `Upper` returns max(spot, ema);
    /// both are validated for staleness and confidence first.
    pub fn new_from_oracle(
        oracle_account: &AccountInfo,
        oracle_params: &OracleParams,
        current_time: i64,
        bound: RateBound,
    ) -> Result<Self> {
        require!(
            !StableController::is_empty_account(oracle_account)?,
            StablehedgeError::InvalidOracleAccount
        );

        // Equivalent to `Account::<RateOracle>::try_from(oracle_account)`, but
        // returns an owned value so no `&'a AccountInfo<'a>` borrow is retained
        // (anchor 0.32's `Account::try_from` requires the reference lifetime to
        // equal the invariant data lifetime, which a named account field cannot
        // provide). Mirrors anchor's checks and error codes exactly.
        let oracle_acc: RateOracle = {
            if oracle_account.owner == &anchor_lang::system_program::ID
                && oracle_account.lamports() == 0
            {
                return Err(anchor_lang::error::ErrorCode::AccountNotInitialized.into());
            }
            if oracle_account.owner != &RateOracle::owner() {
                return Err(anchor_lang::error::Error::from(
                    anchor_lang::error::ErrorCode::AccountOwnedByWrongProgram,
                )
                .with_pubkeys((*oracle_account.owner, RateOracle::owner())));
            }
            let mut data: &[u8] = &oracle_account.try_borrow_data()?;
            RateOracle::try_deserialize(&mut data)?
        };

        let last_update_age_sec = math::checked_sub(current_time, oracle_acc.publish_time)?;
        if last_update_age_sec > oracle_params.max_rate_age_sec as i64 {
            msg!("Error: Oracle rate is stale");
            return err!(StablehedgeError::StaleOracleRate);
        }

        if oracle_acc.rate == 0
            || oracle_acc.ema_rate == 0
            || math::checked_div(
                math::checked_mul(oracle_acc.conf as u128, StableController::RATE_POWER)?,
                oracle_acc.rate as u128,
            )? > oracle_params.max_rate_error as u128
        {
            msg!("Error: Oracle rate is out of bounds");
            return err!(StablehedgeError::InvalidOracleRate);
        }

        let rate = match bound {
            RateBound::Lower => std::cmp::min(oracle_acc.rate, oracle_acc.ema_rate),
            RateBound::Upper => std::cmp::max(oracle_acc.rate, oracle_acc.ema_rate),
        };

        Ok(OracleRate {
            rate,
            exponent: oracle_acc.expo,
        })
    }

    /// Read both sides of the bracket at once.
    pub fn new_all_from_oracle(
        oracle_account: &AccountInfo,
        oracle_params: &OracleParams,
        current_time: i64,
    ) -> Result<(Self, Self)> {
        Ok((
            Self::new_from_oracle(oracle_account, oracle_params, current_time, RateBound::Lower)?,
            Self::new_from_oracle(oracle_account, oracle_params, current_time, RateBound::Upper)?,
        ))
    }

    /// Convert a collateral amount to stablecoin units at this rate.
    ///
    /// Result has `STABLE_DECIMALS` decimals; rounds down.
    pub fn get_stable_amount(
        &self,
        collateral_amount: u64,
        collateral_decimals: u8,
    ) -> Result<u64> {
        if collateral_amount == 0 || self.rate == 0 {
            return Ok(0);
        }
        math::checked_decimal_mul(
            collateral_amount,
            -(collateral_decimals as i32),
            self.rate,
            self.exponent,
            -(StableController::STABLE_DECIMALS as i32),
        )
    }

    /// Convert a stablecoin amount to collateral units at this rate.
    ///
    /// Rounds down.
    pub fn get_collateral_amount(
        &self,
        stable_amount: u64,
        collateral_decimals: u8,
    ) -> Result<u64> {
        if stable_amount == 0 || self.rate == 0 {
            return Ok(0);
        }
        math::checked_decimal_div(
            stable_amount,
            -(StableController::STABLE_DECIMALS as i32),
            self.rate,
            self.exponent,
            -(collateral_decimals as i32),
        )
    }

    pub fn scale_to_exponent(&self, target_exponent: i32) -> Result<OracleRate> {
        if target_exponent == self.exponent {
            return Ok(*self);
        }
        let delta = math::checked_sub(target_exponent, self.exponent)?;
        if delta > 0 {
            Ok(OracleRate {
                rate: math::checked_div(self.rate, math::checked_pow(10, delta as usize)?)?,
                exponent: target_exponent,
            })
        } else {
            Ok(OracleRate {
                rate: math::checked_mul(self.rate, math::checked_pow(10, (-delta) as usize)?)?,
                exponent: target_exponent,
            })
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_conversions_round_trip_down() {
        // 1.05 stable per collateral unit, collateral with 9 decimals
        let rate = OracleRate::new(1_050_000, -6);
        let stable = rate.get_stable_amount(2_000_000_000, 9).unwrap();
        assert_eq!(stable, 2_100_000); // 2.1 stable at 6 decimals
        let back = rate.get_collateral_amount(stable, 9).unwrap();
        assert_eq!(back, 2_000_000_000);
    }

    #[test]
    fn test_zero_rate_is_zero_amount() {
        let rate = OracleRate::new(0, -6);
        assert_eq!(rate.get_stable_amount(1_000, 6).unwrap(), 0);
    }

    #[test]
    fn test_ordering_across_exponents() {
        let a = OracleRate::new(1_000_000, -6);
        let b = OracleRate::new(1_000, -3);
        assert!(!(a < b) && !(b < a));
        let c = OracleRate::new(1_001, -3);
        assert!(a < c);
    }
}
