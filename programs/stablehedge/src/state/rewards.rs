//! Staking-style reward accrual for hedging agents
//!
//! Reward-per-token-stored ledger weighted by each position's hedge
//! contribution. Every state transition that changes a position's weight
//! (open, close, liquidate, force close) MUST checkpoint the position
//! first; skipping the checkpoint either leaks rewards or double-counts
//! them. When the total weighted stake is zero the stored accumulator does
//! not advance, so rewards resume from the checkpoint once stake reappears.

use {
    crate::{
        error::StablehedgeError,
        math,
        state::{core::StableController, perpetual::Perpetual},
    },
    anchor_lang::prelude::*,
};

/// Per-market reward distribution state
#[derive(Copy, Clone, PartialEq, AnchorSerialize, AnchorDeserialize, Default, Debug)]
pub struct RewardDistribution {
    /// Authority allowed to notify new reward amounts
    pub rewards_distributor: Pubkey,
    /// Reward tokens distributed per second
    pub reward_rate: u64,
    /// Length of a distribution period in seconds
    pub rewards_duration: i64,
    /// Timestamp at which the current period stops accruing
    pub period_finish: i64,
    /// Last accrual checkpoint
    pub last_update_time: i64,
    /// Accumulated rewards per unit of hedge, scaled by RATE_POWER
    pub reward_per_token_stored: u128,
}

impl RewardDistribution {
    /// Accrual never runs past the end of the period.
    pub fn last_time_reward_applicable(&self, current_time: i64) -> i64 {
        std::cmp::min(current_time, self.period_finish)
    }

    /// Current reward-per-token accumulator given the total weighted stake.
    pub fn reward_per_token(&self, total_hedge_amount: u64, current_time: i64) -> Result<u128> {
        if total_hedge_amount == 0 {
            return Ok(self.reward_per_token_stored);
        }
        let elapsed = math::checked_sub(
            self.last_time_reward_applicable(current_time),
            self.last_update_time,
        )?;
        if elapsed <= 0 {
            return Ok(self.reward_per_token_stored);
        }
        math::checked_add(
            self.reward_per_token_stored,
            math::checked_div(
                math::checked_mul(
                    math::checked_mul(elapsed as u128, self.reward_rate as u128)?,
                    StableController::RATE_POWER,
                )?,
                total_hedge_amount as u128,
            )?,
        )
    }

    /// Rewards owed to a position at the current accumulator value.
    pub fn earned(&self, perpetual: &Perpetual, reward_per_token: u128) -> Result<u64> {
        math::checked_as_u64(math::checked_add(
            math::checked_div(
                math::checked_mul(
                    perpetual.hedge_amount as u128,
                    math::checked_sub(reward_per_token, perpetual.reward_per_token_paid)?,
                )?,
                StableController::RATE_POWER,
            )?,
            perpetual.rewards_owed as u128,
        )?)
    }

    /// Checkpoint the global accumulator and a position's owed rewards.
    ///
    /// Mandatory before any change to the position's hedge weight and
    /// before burning the position.
    pub fn checkpoint(
        &mut self,
        perpetual: &mut Perpetual,
        total_hedge_amount: u64,
        current_time: i64,
    ) -> Result<()> {
        let reward_per_token = self.reward_per_token(total_hedge_amount, current_time)?;
        self.reward_per_token_stored = reward_per_token;
        self.last_update_time = self.last_time_reward_applicable(current_time);

        perpetual.rewards_owed = self.earned(perpetual, reward_per_token)?;
        perpetual.reward_per_token_paid = reward_per_token;
        Ok(())
    }

    /// Advance only the global accumulator (no position involved).
    pub fn checkpoint_global(&mut self, total_hedge_amount: u64, current_time: i64) -> Result<()> {
        self.reward_per_token_stored = self.reward_per_token(total_hedge_amount, current_time)?;
        self.last_update_time = self.last_time_reward_applicable(current_time);
        Ok(())
    }

    /// Start (or top up) a distribution period.
    ///
    /// A still-running period rolls its undistributed remainder into the
    /// new rate. The rate is bounded so the reward vault balance can always
    /// cover `rate * duration`.
    pub fn notify_reward_amount(
        &mut self,
        reward: u64,
        vault_balance: u64,
        total_hedge_amount: u64,
        current_time: i64,
    ) -> Result<()> {
        self.checkpoint_global(total_hedge_amount, current_time)?;

        require_gt!(self.rewards_duration, 0, StablehedgeError::InvalidParameter);
        let duration = self.rewards_duration as u128;
        let rate = if current_time >= self.period_finish {
            math::checked_div(reward as u128, duration)?
        } else {
            let remaining = math::checked_sub(self.period_finish, current_time)? as u128;
            let leftover = math::checked_mul(remaining, self.reward_rate as u128)?;
            math::checked_div(math::checked_add(reward as u128, leftover)?, duration)?
        };

        require!(
            rate <= math::checked_div(vault_balance as u128, duration)?,
            StablehedgeError::RewardExceedsBalance
        );

        self.reward_rate = math::checked_as_u64(rate)?;
        self.last_update_time = current_time;
        self.period_finish = math::checked_add(current_time, self.rewards_duration)?;
        Ok(())
    }

    /// Change the period length; only between periods.
    pub fn set_rewards_duration(&mut self, duration: i64, current_time: i64) -> Result<()> {
        require!(
            current_time > self.period_finish,
            StablehedgeError::DurationNotElapsed
        );
        require_gt!(duration, 0, StablehedgeError::InvalidParameter);
        self.rewards_duration = duration;
        Ok(())
    }

    /// Pay out a position's owed rewards; returns the amount to transfer.
    pub fn claim(&mut self, perpetual: &mut Perpetual) -> u64 {
        let amount = perpetual.rewards_owed;
        perpetual.rewards_owed = 0;
        amount
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn distribution() -> RewardDistribution {
        RewardDistribution {
            rewards_distributor: Pubkey::new_unique(),
            rewards_duration: 1_000,
            ..RewardDistribution::default()
        }
    }

    fn perp(hedge: u64) -> Perpetual {
        Perpetual {
            hedge_amount: hedge,
            ..Perpetual::default()
        }
    }

    #[test]
    fn test_accrues_proportionally_to_hedge() {
        let mut d = distribution();
        d.notify_reward_amount(1_000_000, 1_000_000, 0, 0).unwrap();
        assert_eq!(d.reward_rate, 1_000);

        let mut a = perp(300);
        let mut b = perp(100);
        // 500 seconds at rate 1000 over total stake 400
        d.checkpoint(&mut a, 400, 500).unwrap();
        d.checkpoint(&mut b, 400, 500).unwrap();
        assert_eq!(a.rewards_owed, 375_000);
        assert_eq!(b.rewards_owed, 125_000);
    }

    #[test]
    fn test_stops_at_period_finish() {
        let mut d = distribution();
        d.notify_reward_amount(1_000_000, 1_000_000, 0, 0).unwrap();
        let mut p = perp(100);
        d.checkpoint(&mut p, 100, 5_000).unwrap();
        // full reward, nothing past period_finish = 1000
        assert_eq!(p.rewards_owed, 1_000_000);
        let owed = p.rewards_owed;
        d.checkpoint(&mut p, 100, 9_000).unwrap();
        assert_eq!(p.rewards_owed, owed);
    }

    #[test]
    fn test_zero_stake_freezes_accumulator() {
        let mut d = distribution();
        d.notify_reward_amount(1_000_000, 1_000_000, 0, 0).unwrap();
        d.checkpoint_global(0, 600).unwrap();
        assert_eq!(d.reward_per_token_stored, 0);
        // stake appears at t=600; the remaining 400s still accrue
        let mut p = perp(100);
        d.checkpoint(&mut p, 100, 600).unwrap();
        d.checkpoint(&mut p, 100, 1_000).unwrap();
        assert_eq!(p.rewards_owed, 400_000);
    }

    #[test]
    fn test_notify_rolls_leftover_into_new_rate() {
        let mut d = distribution();
        d.notify_reward_amount(1_000_000, 10_000_000, 0, 0).unwrap();
        // halfway through, 500_000 undistributed; new notify of 500_000
        // gives rate (500_000 + 500_000) / 1_000
        d.notify_reward_amount(500_000, 10_000_000, 0, 500).unwrap();
        assert_eq!(d.reward_rate, 1_000);
        assert_eq!(d.period_finish, 1_500);
    }

    #[test]
    fn test_notify_rejects_unbacked_rate() {
        let mut d = distribution();
        assert!(d
            .notify_reward_amount(1_000_000, 500_000, 0, 0)
            .is_err());
    }

    #[test]
    fn test_set_duration_only_between_periods() {
        let mut d = distribution();
        d.notify_reward_amount(1_000_000, 1_000_000, 0, 0).unwrap();
        assert!(d.set_rewards_duration(2_000, 500).is_err());
        assert!(d.set_rewards_duration(2_000, 1_001).is_ok());
        assert_eq!(d.rewards_duration, 2_000);
    }

    #[test]
    fn test_claim_zeroes_owed() {
        let mut d = distribution();
        let mut p = perp(100);
        p.rewards_owed = 42;
        assert_eq!(d.claim(&mut p), 42);
        assert_eq!(p.rewards_owed, 0);
    }
}
