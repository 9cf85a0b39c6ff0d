//! Yield strategy ledger
//!
//! Strategies borrow idle pool collateral up to a governance-set debt
//! ratio and report gains, losses and repayments back. Gains first repay
//! any admin debt, then split between protocol surplus and the SLP
//! interest carryover; losses burn surplus first, then socialize through
//! `signal_loss`, and whatever cannot be socialized is carried as admin
//! debt against future gains.

use {
    crate::{
        error::StablehedgeError,
        math,
        state::{collateral::CollateralPool, core::StableController},
    },
    anchor_lang::prelude::*,
};

/// Strategy account, one per (pool, strategy authority)
#[account]
#[derive(Default, Debug)]
pub struct Strategy {
    /// Pool this strategy borrows from
    pub pool: Pubkey,
    /// Authority allowed to report for this strategy
    pub authority: Pubkey,
    /// Token account holding the strategy's working funds
    pub token_account: Pubkey,
    /// Share of pool assets this strategy may hold (RATE)
    pub debt_ratio: u64,
    /// Collateral currently lent to this strategy
    pub total_strategy_debt: u64,
    /// Timestamp of the last report
    pub last_report: i64,
    /// Emergency exit: debt ratio treated as zero, everything recalled
    pub emergency_exit: bool,
    /// Bump seed for the strategy PDA
    pub bump: u8,
}

/// Outcome of a report: how much collateral moves and in which direction.
#[derive(Copy, Clone, PartialEq, Debug, Default)]
pub struct ReportOutcome {
    /// Collateral to push from the pool to the strategy
    pub to_strategy: u64,
    /// Collateral to pull from the strategy to the pool (repayment + gain)
    pub to_pool: u64,
}

impl Strategy {
    pub const LEN: usize = 8 + std::mem::size_of::<Strategy>();

    pub fn effective_debt_ratio(&self) -> u64 {
        if self.emergency_exit {
            0
        } else {
            self.debt_ratio
        }
    }

    /// Process a gain/loss/repayment report against the pool ledger.
    ///
    /// `idle_balance` is the pool token account balance before any
    /// transfer. Returns the transfers the handler must execute; the
    /// ledger fields are already updated when this returns.
    pub fn process_report(
        &mut self,
        pool: &mut CollateralPool,
        gain: u64,
        loss: u64,
        debt_payment: u64,
        idle_balance: u64,
        san_supply: u64,
        current_slot: u64,
        current_time: i64,
    ) -> Result<ReportOutcome> {
        require!(
            loss == 0 || gain == 0,
            StablehedgeError::InvalidParameter
        );
        require!(
            math::checked_add(loss, debt_payment)? <= self.total_strategy_debt,
            StablehedgeError::InvalidParameter
        );

        if loss > 0 {
            self.total_strategy_debt = math::checked_sub(self.total_strategy_debt, loss)?;
            pool.total_debt = math::checked_sub(pool.total_debt, loss)?;

            // derisk a losing strategy proportionally to the loss so the
            // rebalance below does not immediately re-lend to it
            let assets = pool.total_assets(idle_balance)?;
            if assets > 0 {
                let ratio_change = std::cmp::min(
                    math::checked_as_u64(math::checked_div(
                        math::checked_mul(loss as u128, StableController::RATE_POWER)?,
                        assets as u128,
                    )?)?,
                    self.debt_ratio,
                );
                self.debt_ratio = math::checked_sub(self.debt_ratio, ratio_change)?;
                pool.debt_ratio_total = math::checked_sub(pool.debt_ratio_total, ratio_change)?;
            }

            let absorbed = std::cmp::min(loss, pool.interests_accumulated);
            pool.interests_accumulated =
                math::checked_sub(pool.interests_accumulated, absorbed)?;
            let remainder = math::checked_sub(loss, absorbed)?;
            if remainder > 0 {
                let unsocialized = pool.signal_loss(remainder, san_supply)?;
                pool.admin_debt = math::checked_add(pool.admin_debt, unsocialized)?;
            }
        }

        let mut distributable = gain;
        if distributable > 0 {
            let repay = std::cmp::min(distributable, pool.admin_debt);
            pool.admin_debt = math::checked_sub(pool.admin_debt, repay)?;
            distributable = math::checked_sub(distributable, repay)?;
        }
        if distributable > 0 {
            let surplus = math::checked_as_u64(math::checked_div(
                math::checked_mul(distributable as u128, pool.interests_for_surplus as u128)?,
                StableController::RATE_POWER,
            )?)?;
            pool.interests_accumulated =
                math::checked_add(pool.interests_accumulated, surplus)?;
            pool.accumulate_interest(
                math::checked_sub(distributable, surplus)?,
                san_supply,
                current_slot,
            )?;
        }

        // rebalance toward the target debt
        let ratio = self.effective_debt_ratio();
        let credit = pool.credit_available(ratio, self.total_strategy_debt, idle_balance)?;
        let outstanding = pool.debt_outstanding(ratio, self.total_strategy_debt, idle_balance)?;

        let outcome = if credit > 0 {
            self.total_strategy_debt = math::checked_add(self.total_strategy_debt, credit)?;
            pool.total_debt = math::checked_add(pool.total_debt, credit)?;
            ReportOutcome {
                to_strategy: credit,
                to_pool: gain,
            }
        } else {
            // over target: pull back at most what the strategy made
            // available this report
            let pulled = std::cmp::min(outstanding, math::checked_add(debt_payment, gain)?);
            let repaid = std::cmp::min(pulled, debt_payment);
            self.total_strategy_debt = math::checked_sub(self.total_strategy_debt, repaid)?;
            pool.total_debt = math::checked_sub(pool.total_debt, repaid)?;
            ReportOutcome {
                to_strategy: 0,
                to_pool: math::checked_add(repaid, gain)?,
            }
        };

        self.last_report = current_time;
        Ok(outcome)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::state::fee_curve::PiecewiseCurve;

    const RATE: u64 = 1_000_000_000;

    fn fixture() -> (CollateralPool, Strategy) {
        let pool = CollateralPool {
            collateral_mint: Pubkey::new_unique(),
            collateral_decimals: 6,
            san_rate: RATE,
            max_san_rate_update: u64::MAX,
            interests_for_slps: 500_000_000,
            interests_for_surplus: 200_000_000,
            bonus_malus_mint: RATE,
            bonus_malus_burn: RATE,
            mint_fee_curve: PiecewiseCurve {
                x: vec![0],
                y: vec![0],
            },
            burn_fee_curve: PiecewiseCurve {
                x: vec![0],
                y: vec![0],
            },
            allow_deposit: true,
            allow_withdraw: true,
            total_debt: 500,
            debt_ratio_total: RATE / 2,
            ..CollateralPool::default()
        };
        let strategy = Strategy {
            pool: Pubkey::new_unique(),
            authority: Pubkey::new_unique(),
            debt_ratio: RATE / 2,
            total_strategy_debt: 500,
            ..Strategy::default()
        };
        (pool, strategy)
    }

    #[test]
    fn test_gain_splits_surplus_and_slp_share() {
        let (mut pool, mut strategy) = fixture();
        // assets 1000, target 500, at target: no push, no pull
        let outcome = strategy
            .process_report(&mut pool, 100, 0, 0, 500, 1_000, 1, 10)
            .unwrap();
        assert_eq!(outcome.to_strategy, 0);
        assert_eq!(outcome.to_pool, 100);
        // 20% surplus, 50% of the remaining 80 into the SLP carryover
        assert_eq!(pool.interests_accumulated, 20);
        assert_eq!(pool.locked_interests, 40);
        assert_eq!(strategy.last_report, 10);
    }

    #[test]
    fn test_gain_repays_admin_debt_first() {
        let (mut pool, mut strategy) = fixture();
        pool.admin_debt = 70;
        strategy
            .process_report(&mut pool, 100, 0, 0, 500, 1_000, 1, 10)
            .unwrap();
        assert_eq!(pool.admin_debt, 0);
        // only 30 distributed: 6 surplus, 12 to SLPs
        assert_eq!(pool.interests_accumulated, 6);
        assert_eq!(pool.locked_interests, 12);
    }

    #[test]
    fn test_loss_burns_surplus_then_socializes() {
        let (mut pool, mut strategy) = fixture();
        pool.interests_accumulated = 30;
        strategy
            .process_report(&mut pool, 0, 100, 0, 500, 1_000_000_000, 1, 10)
            .unwrap();
        assert_eq!(pool.interests_accumulated, 0);
        assert_eq!(strategy.total_strategy_debt, 400);
        assert_eq!(pool.total_debt, 400);
        // remaining 70 cut the san rate
        assert_eq!(pool.san_rate, RATE - 70);
        assert_eq!(pool.admin_debt, 0);
        // the strategy was derisked: 100 / (500 idle + 400 debt) of ratio gone
        assert_eq!(strategy.debt_ratio, RATE / 2 - 111_111_111);
        assert_eq!(pool.debt_ratio_total, RATE / 2 - 111_111_111);
    }

    #[test]
    fn test_unsocializable_loss_books_admin_debt() {
        let (mut pool, mut strategy) = fixture();
        // no san supply: nothing to socialize against
        strategy
            .process_report(&mut pool, 0, 100, 0, 500, 0, 1, 10)
            .unwrap();
        assert_eq!(pool.admin_debt, 100);
    }

    #[test]
    fn test_under_target_pushes_credit() {
        let (mut pool, mut strategy) = fixture();
        strategy.total_strategy_debt = 300;
        pool.total_debt = 300;
        // assets 500 idle + 300 debt = 800, target 400
        let outcome = strategy
            .process_report(&mut pool, 0, 0, 0, 500, 1_000, 1, 10)
            .unwrap();
        assert_eq!(outcome.to_strategy, 100);
        assert_eq!(strategy.total_strategy_debt, 400);
        assert_eq!(pool.total_debt, 400);
    }

    #[test]
    fn test_over_target_pulls_repayment() {
        let (mut pool, mut strategy) = fixture();
        strategy.total_strategy_debt = 700;
        pool.total_debt = 700;
        // assets 300 idle + 700 debt = 1000, target 500, excess 200 but the
        // strategy only offered 150
        let outcome = strategy
            .process_report(&mut pool, 0, 0, 150, 300, 1_000, 1, 10)
            .unwrap();
        assert_eq!(outcome.to_strategy, 0);
        assert_eq!(outcome.to_pool, 150);
        assert_eq!(strategy.total_strategy_debt, 550);
        assert_eq!(pool.total_debt, 550);
    }

    #[test]
    fn test_emergency_exit_recalls_everything() {
        let (mut pool, mut strategy) = fixture();
        strategy.emergency_exit = true;
        let outcome = strategy
            .process_report(&mut pool, 0, 0, 500, 500, 1_000, 1, 10)
            .unwrap();
        assert_eq!(outcome.to_pool, 500);
        assert_eq!(strategy.total_strategy_debt, 0);
        assert_eq!(pool.total_debt, 0);
    }

    #[test]
    fn test_report_rejects_overclaimed_loss() {
        let (mut pool, mut strategy) = fixture();
        assert!(strategy
            .process_report(&mut pool, 0, 600, 0, 500, 1_000, 1, 10)
            .is_err());
    }
}
