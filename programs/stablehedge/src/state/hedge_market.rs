//! Hedging market state and coverage/fee logic
//!
//! One market per collateral pool. It owns the aggregate hedge ledger
//! (`total_hedge_amount`, always the sum of live positions' frozen
//! `hedge_amount` contributions), the coverage-ratio arithmetic that
//! drives both hedging-agent fees and mint/burn fees, leverage and
//! maintenance parameters, keeper economics, and the reward distribution.
//!
//! The market never writes `stocks_users` itself; issuance-side deltas go
//! through the pool's single-writer method from the instruction handlers.

use {
    crate::{
        error::StablehedgeError,
        math,
        state::{
            core::StableController, fee_curve::PiecewiseCurve, rewards::RewardDistribution,
        },
    },
    anchor_lang::prelude::*,
};

/// Hedging market account
#[account]
#[derive(Default, Debug)]
pub struct HedgeMarket {
    /// Collateral pool this market hedges
    pub pool: Pubkey,

    /// Sum of live positions' stable-denominated hedge contributions
    pub total_hedge_amount: u64,
    /// Fraction of stocks_users that should be hedged; admitting new hedge
    /// stops at this bound (RATE)
    pub target_hedge_ratio: u64,
    /// Fraction of stocks_users above which permissionless force closing
    /// becomes available (RATE, > target)
    pub limit_hedge_ratio: u64,

    /// Maximum committed/margin leverage (RATE, e.g. 100x = 100 * RATE)
    pub max_leverage: u64,
    /// Value-to-commitment ratio at or below which a position is
    /// liquidatable (RATE)
    pub maintenance_margin: u64,
    /// Minimum seconds between opening and any withdrawal/cash-out
    pub lock_time: i64,

    /// Entry fee curve keyed on the coverage room left below target
    pub entry_fee_curve: PiecewiseCurve,
    /// Exit fee curve keyed on the hedge ratio after removal
    pub exit_fee_curve: PiecewiseCurve,
    /// Correction scalar on entry fees, set by the fee policy (RATE)
    pub ha_bonus_malus_deposit: u64,
    /// Correction scalar on exit fees, set by the fee policy (RATE)
    pub ha_bonus_malus_withdraw: u64,

    /// Fraction of a liquidated position's value paid to the keeper (RATE)
    pub keeper_fees_liquidation_ratio: u64,
    /// Absolute cap on a single liquidation keeper fee, collateral units
    pub keeper_fees_liquidation_cap: u64,
    /// Fraction of accumulated exit fees paid to a force-close keeper (RATE)
    pub keeper_fees_closing_ratio: u64,
    /// Absolute cap on a single force-close keeper fee, collateral units
    pub keeper_fees_closing_cap: u64,

    /// Reward accrual for hedging agents
    pub rewards: RewardDistribution,

    /// Id assigned to the next opened position
    pub next_position_id: u64,
    /// Number of live positions
    pub open_positions: u64,

    /// Allow opening and margin additions
    pub allow_open: bool,
    /// Allow cash-outs and margin removals (liquidations and force closes
    /// stay permissionless regardless)
    pub allow_close: bool,

    /// Bump seed for the market PDA
    pub bump: u8,
    /// Bump seed for the reward vault PDA
    pub reward_vault_bump: u8,
}

impl HedgeMarket {
    pub const LEN: usize = 8 + std::mem::size_of::<HedgeMarket>() + 2 * PiecewiseCurve::LEN;

    /// Assumed burn-fee rate used to estimate the cost of manipulating
    /// stocks_users in a burn-then-force-close attack (RATE, 0.05%).
    /// Deliberately a constant: a governance parameter here could zero the
    /// flash-loan defense.
    pub const ASSUMED_BURN_FEE: u64 = 500_000;

    pub fn validate(&self) -> bool {
        self.target_hedge_ratio as u128 <= StableController::RATE_POWER
            && self.limit_hedge_ratio >= self.target_hedge_ratio
            && self.limit_hedge_ratio as u128 <= StableController::RATE_POWER
            && self.maintenance_margin > 0
            && (self.maintenance_margin as u128) < StableController::RATE_POWER
            && self.max_leverage as u128 > StableController::RATE_POWER
            && self.lock_time >= 0
            && self.keeper_fees_liquidation_ratio as u128 <= StableController::RATE_POWER
            && self.keeper_fees_closing_ratio as u128 <= StableController::RATE_POWER
            && self.entry_fee_curve.validate()
            && self.exit_fee_curve.validate()
    }

    /// Stable amount that should be hedged at the target ratio.
    pub fn target_hedge(&self, stocks_users: i64) -> Result<u64> {
        if stocks_users <= 0 {
            return Ok(0);
        }
        math::checked_as_u64(math::checked_div(
            math::checked_mul(stocks_users as u128, self.target_hedge_ratio as u128)?,
            StableController::RATE_POWER,
        )?)
    }

    /// Stable amount above which the market is over the limit coverage.
    pub fn limit_hedge(&self, stocks_users: i64) -> Result<u64> {
        if stocks_users <= 0 {
            return Ok(0);
        }
        math::checked_as_u64(math::checked_div(
            math::checked_mul(stocks_users as u128, self.limit_hedge_ratio as u128)?,
            StableController::RATE_POWER,
        )?)
    }

    /// Hedge ratio after removing `subtracted` from the current total
    /// (RATE; 1e9 == fully hedged at target). An empty issuance side
    /// counts as fully hedged so that fee curves land on their
    /// high-coverage end.
    pub fn hedge_ratio(&self, stocks_users: i64, subtracted: u64) -> Result<u64> {
        let target = self.target_hedge(stocks_users)?;
        if target == 0 {
            return math::checked_as_u64(StableController::RATE_POWER);
        }
        let hedged = self.total_hedge_amount.saturating_sub(subtracted);
        math::checked_as_u64(math::checked_div(
            math::checked_mul(hedged as u128, StableController::RATE_POWER)?,
            target as u128,
        )?)
    }

    /// Remaining room below the target coverage, as a fraction of the
    /// target (RATE). Zero when at/over target or when nothing is issued.
    pub fn coverage_room(&self, stocks_users: i64) -> Result<u64> {
        let target = self.target_hedge(stocks_users)?;
        if target == 0 || self.total_hedge_amount >= target {
            return Ok(0);
        }
        math::checked_as_u64(math::checked_div(
            math::checked_mul(
                math::checked_sub(target, self.total_hedge_amount)? as u128,
                StableController::RATE_POWER,
            )?,
            target as u128,
        )?)
    }

    /// Entry fee rate for a new position (RATE), from the coverage room.
    pub fn entry_fee_rate(&self, stocks_users: i64) -> Result<u64> {
        math::checked_as_u64(math::checked_div(
            math::checked_mul(
                self.entry_fee_curve.interpolate(self.coverage_room(stocks_users)?)? as u128,
                self.ha_bonus_malus_deposit as u128,
            )?,
            StableController::RATE_POWER,
        )?)
    }

    /// Exit fee rate for closing a position whose hedge contribution is
    /// `hedge_removed` (RATE), from the post-removal hedge ratio.
    pub fn exit_fee_rate(&self, stocks_users: i64, hedge_removed: u64) -> Result<u64> {
        math::checked_as_u64(math::checked_div(
            math::checked_mul(
                self.exit_fee_curve
                    .interpolate(self.hedge_ratio(stocks_users, hedge_removed)?)?
                    as u128,
                self.ha_bonus_malus_withdraw as u128,
            )?,
            StableController::RATE_POWER,
        )?)
    }

    /// Fee amount deducted from `amount` at `fee_rate`; rounds up.
    pub fn fee_amount(fee_rate: u64, amount: u64) -> Result<u64> {
        if fee_rate == 0 || amount == 0 {
            return Ok(0);
        }
        math::checked_as_u64(math::checked_ceil_div(
            math::checked_mul(amount as u128, fee_rate as u128)?,
            StableController::RATE_POWER,
        )?)
    }

    /// Admit a new position's hedge contribution.
    ///
    /// Fails when the market is already at its target coverage or the new
    /// contribution would push it past the target; a creation that would
    /// be admitted at zero room must fail, not slip through with zero fee.
    pub fn admit_hedge(&mut self, hedge_amount: u64, stocks_users: i64) -> Result<()> {
        let target = self.target_hedge(stocks_users)?;
        let new_total = math::checked_add(self.total_hedge_amount, hedge_amount)?;
        require!(
            target > 0 && self.total_hedge_amount < target && new_total <= target,
            StablehedgeError::OverHedged
        );
        self.total_hedge_amount = new_total;
        Ok(())
    }

    /// Release a closed position's hedge contribution.
    pub fn release_hedge(&mut self, hedge_amount: u64) -> Result<()> {
        self.total_hedge_amount = math::checked_sub(self.total_hedge_amount, hedge_amount)?;
        Ok(())
    }

    /// Leverage guard: committed * RATE <= max_leverage * margin.
    pub fn check_leverage(&self, committed_amount: u64, margin: u64) -> Result<bool> {
        if margin == 0 {
            return Ok(false);
        }
        Ok(
            math::checked_mul(committed_amount as u128, StableController::RATE_POWER)?
                <= math::checked_mul(self.max_leverage as u128, margin as u128)?,
        )
    }

    /// Keeper fee for liquidating a position worth `value`; bounded
    /// fraction with an absolute cap.
    pub fn keeper_liquidation_fee(&self, value: u64) -> Result<u64> {
        let fee = math::checked_as_u64(math::checked_div(
            math::checked_mul(value as u128, self.keeper_fees_liquidation_ratio as u128)?,
            StableController::RATE_POWER,
        )?)?;
        Ok(std::cmp::min(fee, self.keeper_fees_liquidation_cap))
    }

    /// Keeper reward for a force close: bounded fraction of the exit fees
    /// collected, capped both absolutely and by the estimated cost of a
    /// burn-then-force-close manipulation of stocks_users.
    pub fn keeper_closing_fee(&self, exit_fees: u64, attack_cost: u64) -> Result<u64> {
        let fee = math::checked_as_u64(math::checked_div(
            math::checked_mul(exit_fees as u128, self.keeper_fees_closing_ratio as u128)?,
            StableController::RATE_POWER,
        )?)?;
        Ok(std::cmp::min(
            fee,
            std::cmp::min(self.keeper_fees_closing_cap, attack_cost),
        ))
    }

    /// Estimated stable-denominated cost of moving stocks_users through a
    /// burn, at the assumed burn-fee rate.
    pub fn estimated_attack_cost(&self, stocks_users: i64) -> Result<u64> {
        if stocks_users <= 0 {
            return Ok(0);
        }
        math::checked_as_u64(math::checked_div(
            math::checked_mul(stocks_users as u128, Self::ASSUMED_BURN_FEE as u128)?,
            StableController::RATE_POWER,
        )?)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    const RATE: u64 = 1_000_000_000;

    fn market() -> HedgeMarket {
        HedgeMarket {
            target_hedge_ratio: 900_000_000,  // 90%
            limit_hedge_ratio: 950_000_000,   // 95%
            max_leverage: 100 * RATE,
            maintenance_margin: 30_000_000, // 3%
            lock_time: 3_600,
            entry_fee_curve: PiecewiseCurve {
                x: vec![0, RATE],
                y: vec![10_000_000, 2_000_000], // 1% down to 0.2%
            },
            exit_fee_curve: PiecewiseCurve {
                x: vec![0, RATE],
                y: vec![2_000_000, 10_000_000],
            },
            ha_bonus_malus_deposit: RATE,
            ha_bonus_malus_withdraw: RATE,
            keeper_fees_liquidation_ratio: 200_000_000, // 20%
            keeper_fees_liquidation_cap: 50_000_000,
            keeper_fees_closing_ratio: 500_000_000, // 50%
            keeper_fees_closing_cap: 100_000_000,
            ..HedgeMarket::default()
        }
    }

    #[test]
    fn test_hedge_ratio_and_room() {
        let mut m = market();
        let stocks = 1_000_000_000i64; // 1000 stable at 6 decimals
        assert_eq!(m.target_hedge(stocks).unwrap(), 900_000_000);
        assert_eq!(m.hedge_ratio(stocks, 0).unwrap(), 0);
        assert_eq!(m.coverage_room(stocks).unwrap(), RATE);

        m.total_hedge_amount = 450_000_000;
        assert_eq!(m.hedge_ratio(stocks, 0).unwrap(), RATE / 2);
        assert_eq!(m.coverage_room(stocks).unwrap(), RATE / 2);
        // post-removal ratio drops
        assert_eq!(m.hedge_ratio(stocks, 450_000_000).unwrap(), 0);
    }

    #[test]
    fn test_empty_issuance_counts_as_fully_hedged() {
        let m = market();
        assert_eq!(m.hedge_ratio(0, 0).unwrap(), RATE);
        assert_eq!(m.coverage_room(0).unwrap(), 0);
    }

    #[test]
    fn test_admission_stops_at_target() {
        let mut m = market();
        let stocks = 1_000_000_000i64;
        m.admit_hedge(900_000_000, stocks).unwrap();
        assert_eq!(m.total_hedge_amount, 900_000_000);
        // at exactly 100% of target any further amount must fail
        assert!(m.admit_hedge(1, stocks).is_err());
        assert_eq!(m.total_hedge_amount, 900_000_000);
    }

    #[test]
    fn test_admission_rejects_overshoot() {
        let mut m = market();
        let stocks = 1_000_000_000i64;
        m.total_hedge_amount = 800_000_000;
        assert!(m.admit_hedge(200_000_000, stocks).is_err());
        m.admit_hedge(100_000_000, stocks).unwrap();
    }

    #[test]
    fn test_admission_rejects_empty_issuance() {
        let mut m = market();
        assert!(m.admit_hedge(1, 0).is_err());
    }

    #[test]
    fn test_hedge_total_tracks_live_positions() {
        // the aggregate is always the sum of admitted-minus-released
        // contributions, whatever order positions close in
        let mut m = market();
        let stocks = 1_000_000_000i64;
        let contributions = [200_000_000u64, 300_000_000, 150_000_000];
        for c in contributions {
            m.admit_hedge(c, stocks).unwrap();
        }
        assert_eq!(m.total_hedge_amount, 650_000_000);
        m.release_hedge(contributions[1]).unwrap();
        assert_eq!(m.total_hedge_amount, 350_000_000);
        m.release_hedge(contributions[2]).unwrap();
        m.release_hedge(contributions[0]).unwrap();
        assert_eq!(m.total_hedge_amount, 0);
        assert!(m.release_hedge(1).is_err());
    }

    #[test]
    fn test_entry_fee_follows_room() {
        let mut m = market();
        let stocks = 1_000_000_000i64;
        // empty market: full room, cheapest end of the curve is at x=RATE
        assert_eq!(m.entry_fee_rate(stocks).unwrap(), 2_000_000);
        m.total_hedge_amount = 450_000_000;
        assert_eq!(m.entry_fee_rate(stocks).unwrap(), 6_000_000);
        // malus doubles the fee
        m.ha_bonus_malus_deposit = 2 * RATE;
        assert_eq!(m.entry_fee_rate(stocks).unwrap(), 12_000_000);
    }

    #[test]
    fn test_leverage_guard() {
        let m = market();
        assert!(m.check_leverage(100, 1).unwrap());
        assert!(!m.check_leverage(101, 1).unwrap());
        assert!(!m.check_leverage(100, 0).unwrap());
    }

    #[test]
    fn test_keeper_fee_caps() {
        let m = market();
        // 20% of 100 = 20, below cap
        assert_eq!(m.keeper_liquidation_fee(100_000_000).unwrap(), 20_000_000);
        // 20% of 1000 = 200, capped at 50
        assert_eq!(m.keeper_liquidation_fee(1_000_000_000).unwrap(), 50_000_000);
        // closing fee: min(50% of fees, cap, attack cost)
        assert_eq!(m.keeper_closing_fee(100_000_000, u64::MAX).unwrap(), 50_000_000);
        assert_eq!(m.keeper_closing_fee(400_000_000, u64::MAX).unwrap(), 100_000_000);
        assert_eq!(m.keeper_closing_fee(400_000_000, 7_000).unwrap(), 7_000);
    }

    #[test]
    fn test_estimated_attack_cost() {
        let m = market();
        // 0.05% of 1_000_000_000
        assert_eq!(m.estimated_attack_cost(1_000_000_000).unwrap(), 500_000);
        assert_eq!(m.estimated_attack_cost(0).unwrap(), 0);
    }

    #[test]
    fn test_fee_amount_rounds_up() {
        assert_eq!(HedgeMarket::fee_amount(2_000_000, 1_000).unwrap(), 2);
        assert_eq!(HedgeMarket::fee_amount(2_000_000, 1_001).unwrap(), 3);
        assert_eq!(HedgeMarket::fee_amount(0, 1_000).unwrap(), 0);
    }
}
