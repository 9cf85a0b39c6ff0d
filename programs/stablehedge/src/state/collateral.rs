//! Collateral pool state: issuance accounting and the san rate
//!
//! One account per accepted collateral token. It owns the two fields the
//! rest of the protocol must never write directly: `stocks_users` (the
//! stable-denominated collateral value attributed to stablecoin holders,
//! mutated only through `propagate_stocks_delta`) and `san_rate` (the
//! share-token exchange rate, mutated only through `update_san_rate` and
//! `signal_loss`). It also carries the mint/burn fee curves and the
//! reserves-vs-strategy debt ledger.

use {
    crate::{
        error::StablehedgeError,
        math,
        state::{core::StableController, fee_curve::PiecewiseCurve, oracle::OracleParams},
    },
    anchor_lang::prelude::*,
};

/// Collateral pool account
#[account]
#[derive(Default, Debug)]
pub struct CollateralPool {
    /// Mint of the accepted collateral token
    pub collateral_mint: Pubkey,
    /// Native decimals of the collateral mint
    pub collateral_decimals: u8,
    /// Oracle configuration for this collateral
    pub oracle: OracleParams,

    /// Stable-denominated collateral value attributed to stablecoin
    /// holders, net of hedging-agent gains and losses. Signed: agent
    /// profits can drive it below the issued amount.
    pub stocks_users: i64,
    /// Hard cap on stocks_users growth for this pool
    pub cap_on_stocks_users: u64,

    /// San token <-> collateral exchange rate (RATE base, starts at 1e9,
    /// floored at 1)
    pub san_rate: u64,
    /// Interest carried over for future san-rate updates, collateral units
    pub locked_interests: u64,
    /// Maximum san-rate increase applied per slot (RATE units)
    pub max_san_rate_update: u64,
    /// Slot of the last san-rate update
    pub last_slot_updated: u64,

    /// Share of mint/burn fees routed to SLPs (RATE)
    pub fees_for_slps: u64,
    /// Share of strategy interest routed to SLPs (RATE)
    pub interests_for_slps: u64,
    /// Share of strategy gains kept as protocol surplus (RATE)
    pub interests_for_surplus: u64,
    /// Flat haircut applied to SLP withdrawals (RATE)
    pub slippage: u64,
    /// Fraction of incoming SLP interest set aside when the collateral
    /// ratio is degraded; pushed by the fee policy (RATE)
    pub slippage_fee: u64,
    /// Interest siphoned aside by slippage_fee, collateral units
    pub fees_aside: u64,

    /// Mint fee curve keyed on the hedge ratio
    pub mint_fee_curve: PiecewiseCurve,
    /// Burn fee curve keyed on the post-burn hedge ratio
    pub burn_fee_curve: PiecewiseCurve,
    /// Correction scalar on mint fees, set by the fee policy (RATE)
    pub bonus_malus_mint: u64,
    /// Correction scalar on burn fees, set by the fee policy (RATE)
    pub bonus_malus_burn: u64,

    /// Allow stablecoin minting against this pool
    pub allow_mint: bool,
    /// Allow stablecoin burning against this pool
    pub allow_burn: bool,
    /// Allow SLP deposits
    pub allow_deposit: bool,
    /// Allow SLP withdrawals
    pub allow_withdraw: bool,

    /// Collateral lent out to strategies
    pub total_debt: u64,
    /// Sum of registered strategies' debt ratios (RATE, <= 100%)
    pub debt_ratio_total: u64,
    /// Protocol surplus accumulated from strategy gains, collateral units
    pub interests_accumulated: u64,
    /// Loss the protocol still has to recover from future gains
    pub admin_debt: u64,
    /// Protocol share of mint/burn/HA fees, collateral units
    pub protocol_fees: u64,

    /// Bump seed for the pool PDA
    pub bump: u8,
    /// Bump seed for the pool token account PDA
    pub token_account_bump: u8,
    /// Bump seed for the san mint PDA
    pub san_mint_bump: u8,
}

impl CollateralPool {
    pub const LEN: usize = 8 + std::mem::size_of::<CollateralPool>() + 2 * PiecewiseCurve::LEN;

    /// San rate never reaches zero; a floored pool pauses SLP actions
    /// instead of bricking deposits with a zero rate.
    pub const SAN_RATE_FLOOR: u64 = 1;

    pub fn validate(&self) -> bool {
        self.collateral_mint != Pubkey::default()
            && self.san_rate >= Self::SAN_RATE_FLOOR
            && self.fees_for_slps as u128 <= StableController::RATE_POWER
            && self.interests_for_slps as u128 <= StableController::RATE_POWER
            && self.interests_for_surplus as u128 <= StableController::RATE_POWER
            && self.slippage as u128 <= StableController::RATE_POWER
            && self.slippage_fee as u128 <= StableController::RATE_POWER
            && self.mint_fee_curve.validate()
            && self.burn_fee_curve.validate()
    }

    /// Single writer for stocks_users.
    ///
    /// Positive deltas are capped; the signed accumulator itself may go
    /// negative when hedging agents realize gains, but user-facing burns
    /// are bounded by the current value before they get here.
    pub fn propagate_stocks_delta(&mut self, delta: i64) -> Result<()> {
        let new_stocks = if let Some(v) = self.stocks_users.checked_add(delta) {
            v
        } else {
            return err!(StablehedgeError::MathOverflow);
        };
        if delta > 0 {
            require!(
                new_stocks <= math::checked_as_i64(self.cap_on_stocks_users)?,
                StablehedgeError::StocksUsersCapExceeded
            );
        }
        self.stocks_users = new_stocks;
        Ok(())
    }

    /// Mint fee rate at the given hedge ratio (RATE).
    pub fn mint_fee_rate(&self, hedge_ratio: u64) -> Result<u64> {
        math::checked_as_u64(math::checked_div(
            math::checked_mul(
                self.mint_fee_curve.interpolate(hedge_ratio)? as u128,
                self.bonus_malus_mint as u128,
            )?,
            StableController::RATE_POWER,
        )?)
    }

    /// Burn fee rate at the given (post-burn) hedge ratio (RATE).
    pub fn burn_fee_rate(&self, hedge_ratio: u64) -> Result<u64> {
        math::checked_as_u64(math::checked_div(
            math::checked_mul(
                self.burn_fee_curve.interpolate(hedge_ratio)? as u128,
                self.bonus_malus_burn as u128,
            )?,
            StableController::RATE_POWER,
        )?)
    }

    /// Update the san rate and fold `to_share` into the interest carryover.
    ///
    /// Flash-loan mitigation: interest introduced in this call never moves
    /// the rate in this call. At most `max_san_rate_update` of rate
    /// increase is applied per slot, drawn from the carryover accumulated
    /// in earlier slots; a large pending update amortizes over several
    /// slots.
    pub fn update_san_rate(
        &mut self,
        to_share: u64,
        san_supply: u64,
        current_slot: u64,
    ) -> Result<()> {
        if current_slot > self.last_slot_updated {
            if self.locked_interests > 0 && san_supply > 0 {
                let mut increase = math::checked_as_u64(math::checked_div(
                    math::checked_mul(
                        self.locked_interests as u128,
                        StableController::RATE_POWER,
                    )?,
                    san_supply as u128,
                )?)?;
                if increase > self.max_san_rate_update {
                    increase = self.max_san_rate_update;
                    // remove the applied portion from the carryover,
                    // rounding the removal up so no interest is counted twice
                    let applied = math::checked_as_u64(math::checked_ceil_div(
                        math::checked_mul(increase as u128, san_supply as u128)?,
                        StableController::RATE_POWER,
                    )?)?;
                    self.locked_interests = self.locked_interests.saturating_sub(applied);
                } else {
                    self.locked_interests = 0;
                }
                self.san_rate = math::checked_add(self.san_rate, increase)?;
            }
            self.last_slot_updated = current_slot;
        }

        if to_share > 0 {
            let mut to_share = to_share;
            if self.slippage_fee > 0 {
                let aside = math::checked_as_u64(math::checked_div(
                    math::checked_mul(to_share as u128, self.slippage_fee as u128)?,
                    StableController::RATE_POWER,
                )?)?;
                self.fees_aside = math::checked_add(self.fees_aside, aside)?;
                to_share = math::checked_sub(to_share, aside)?;
            }
            self.locked_interests = math::checked_add(self.locked_interests, to_share)?;
        }
        Ok(())
    }

    /// Route a strategy gain: the SLP share enters the san-rate carryover,
    /// the rest stays in the reserves backing users.
    pub fn accumulate_interest(
        &mut self,
        gain: u64,
        san_supply: u64,
        current_slot: u64,
    ) -> Result<()> {
        let to_share = math::checked_as_u64(math::checked_div(
            math::checked_mul(gain as u128, self.interests_for_slps as u128)?,
            StableController::RATE_POWER,
        )?)?;
        self.update_san_rate(to_share, san_supply, current_slot)
    }

    /// Absorb a loss: locked interest first, then the san rate, floored at
    /// SAN_RATE_FLOOR. Hitting the floor pauses SLP actions as a safety
    /// trip-wire. Returns the part of the loss that could not be
    /// socialized.
    pub fn signal_loss(&mut self, loss: u64, san_supply: u64) -> Result<u64> {
        let absorbed = std::cmp::min(loss, self.locked_interests);
        self.locked_interests = math::checked_sub(self.locked_interests, absorbed)?;
        let mut remainder = math::checked_sub(loss, absorbed)?;
        if remainder == 0 {
            return Ok(0);
        }
        if san_supply == 0 {
            return Ok(remainder);
        }

        // largest loss the current rate can absorb before the floor
        let absorbable = math::checked_as_u64(math::checked_div(
            math::checked_mul(
                math::checked_sub(self.san_rate, Self::SAN_RATE_FLOOR)? as u128,
                san_supply as u128,
            )?,
            StableController::RATE_POWER,
        )?)?;

        if remainder >= absorbable {
            self.san_rate = Self::SAN_RATE_FLOOR;
            self.allow_deposit = false;
            self.allow_withdraw = false;
            remainder = math::checked_sub(remainder, absorbable)?;
        } else {
            let decrease = math::checked_as_u64(math::checked_ceil_div(
                math::checked_mul(remainder as u128, StableController::RATE_POWER)?,
                san_supply as u128,
            )?)?;
            self.san_rate = math::checked_sub(self.san_rate, decrease)?;
            remainder = 0;
        }
        Ok(remainder)
    }

    /// San tokens minted for a collateral deposit at the current rate.
    pub fn san_amount_for_deposit(&self, amount: u64) -> Result<u64> {
        math::checked_as_u64(math::checked_div(
            math::checked_mul(amount as u128, StableController::RATE_POWER)?,
            self.san_rate as u128,
        )?)
    }

    /// Collateral owed for burning san tokens, after the flat slippage
    /// haircut.
    pub fn collateral_for_withdraw(&self, san_amount: u64) -> Result<u64> {
        let gross = math::checked_div(
            math::checked_mul(san_amount as u128, self.san_rate as u128)?,
            StableController::RATE_POWER,
        )?;
        math::checked_as_u64(math::checked_div(
            math::checked_mul(
                gross,
                math::checked_sub(StableController::RATE_POWER, self.slippage as u128)?,
            )?,
            StableController::RATE_POWER,
        )?)
    }

    // ---- reserves vs strategy debt ----

    /// Total assets of the pool: idle reserves plus lent-out debt.
    pub fn total_assets(&self, idle_balance: u64) -> Result<u64> {
        math::checked_add(idle_balance, self.total_debt)
    }

    /// Collateral a strategy at `debt_ratio` may still borrow, clamped by
    /// the idle balance.
    pub fn credit_available(
        &self,
        debt_ratio: u64,
        strategy_debt: u64,
        idle_balance: u64,
    ) -> Result<u64> {
        let target = math::checked_as_u64(math::checked_div(
            math::checked_mul(self.total_assets(idle_balance)? as u128, debt_ratio as u128)?,
            StableController::RATE_POWER,
        )?)?;
        if strategy_debt >= target {
            return Ok(0);
        }
        Ok(std::cmp::min(
            math::checked_sub(target, strategy_debt)?,
            idle_balance,
        ))
    }

    /// Debt a strategy should repay, clamped at zero when under target.
    pub fn debt_outstanding(
        &self,
        debt_ratio: u64,
        strategy_debt: u64,
        idle_balance: u64,
    ) -> Result<u64> {
        let target = math::checked_as_u64(math::checked_div(
            math::checked_mul(self.total_assets(idle_balance)? as u128, debt_ratio as u128)?,
            StableController::RATE_POWER,
        )?)?;
        if strategy_debt <= target {
            return Ok(0);
        }
        math::checked_sub(strategy_debt, target)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::state::{hedge_market::HedgeMarket, oracle::OracleRate};

    const RATE: u64 = 1_000_000_000;

    fn pool() -> CollateralPool {
        CollateralPool {
            collateral_mint: Pubkey::new_unique(),
            collateral_decimals: 6,
            cap_on_stocks_users: 10_000_000_000,
            san_rate: RATE,
            max_san_rate_update: 1_000_000, // 0.001
            fees_for_slps: 500_000_000,     // 50%
            interests_for_slps: 600_000_000,
            interests_for_surplus: 200_000_000,
            slippage: 0,
            slippage_fee: 0,
            bonus_malus_mint: RATE,
            bonus_malus_burn: RATE,
            mint_fee_curve: PiecewiseCurve {
                x: vec![0, RATE],
                y: vec![8_000_000, 2_000_000],
            },
            burn_fee_curve: PiecewiseCurve {
                x: vec![0, RATE],
                y: vec![2_000_000, 8_000_000],
            },
            allow_mint: true,
            allow_burn: true,
            allow_deposit: true,
            allow_withdraw: true,
            ..CollateralPool::default()
        }
    }

    #[test]
    fn test_stocks_delta_cap() {
        let mut p = pool();
        p.propagate_stocks_delta(10_000_000_000).unwrap();
        assert!(p.propagate_stocks_delta(1).is_err());
        // state unchanged on the failed delta
        assert_eq!(p.stocks_users, 10_000_000_000);
        p.propagate_stocks_delta(-4_000_000_000).unwrap();
        assert_eq!(p.stocks_users, 6_000_000_000);
    }

    #[test]
    fn test_stocks_can_go_negative_on_agent_gains() {
        let mut p = pool();
        p.propagate_stocks_delta(-5).unwrap();
        assert_eq!(p.stocks_users, -5);
    }

    #[test]
    fn test_san_rate_update_throttled_across_slots() {
        let mut p = pool();
        let supply = 1_000_000_000u64;
        // pending interest implies a 0.01 rate jump; cap is 0.001 per slot
        p.update_san_rate(10_000_000, supply, 1).unwrap();
        assert_eq!(p.san_rate, RATE); // introduced this slot, not applied
        p.update_san_rate(0, supply, 2).unwrap();
        assert_eq!(p.san_rate, RATE + 1_000_000);
        p.update_san_rate(0, supply, 3).unwrap();
        assert_eq!(p.san_rate, RATE + 2_000_000);
        // carryover drained by exactly the applied amounts
        assert_eq!(p.locked_interests, 8_000_000);
    }

    #[test]
    fn test_san_rate_same_slot_never_applies() {
        let mut p = pool();
        let supply = 1_000_000_000u64;
        p.update_san_rate(10_000_000, supply, 5).unwrap();
        p.update_san_rate(0, supply, 5).unwrap();
        assert_eq!(p.san_rate, RATE);
        assert_eq!(p.locked_interests, 10_000_000);
    }

    #[test]
    fn test_small_carryover_applies_fully() {
        let mut p = pool();
        let supply = 1_000_000_000u64;
        p.update_san_rate(500, supply, 1).unwrap();
        p.update_san_rate(0, supply, 2).unwrap();
        assert_eq!(p.san_rate, RATE + 500);
        assert_eq!(p.locked_interests, 0);
    }

    #[test]
    fn test_slippage_fee_siphons_share_aside() {
        let mut p = pool();
        p.slippage_fee = 100_000_000; // 10%
        p.update_san_rate(1_000, 0, 1).unwrap();
        assert_eq!(p.fees_aside, 100);
        assert_eq!(p.locked_interests, 900);
    }

    #[test]
    fn test_signal_loss_consumes_locked_interest_first() {
        let mut p = pool();
        p.locked_interests = 600;
        let rem = p.signal_loss(500, 1_000_000_000).unwrap();
        assert_eq!(rem, 0);
        assert_eq!(p.locked_interests, 100);
        assert_eq!(p.san_rate, RATE);
    }

    #[test]
    fn test_signal_loss_cuts_san_rate() {
        let mut p = pool();
        let supply = 1_000_000_000u64;
        let rem = p.signal_loss(10_000_000, supply).unwrap();
        assert_eq!(rem, 0);
        assert_eq!(p.san_rate, RATE - 10_000_000);
        assert!(p.allow_deposit && p.allow_withdraw);
    }

    #[test]
    fn test_signal_loss_floors_and_pauses() {
        let mut p = pool();
        let supply = 1_000u64;
        // rate can absorb just under 1000 units of loss at this supply
        let rem = p.signal_loss(1_500, supply).unwrap();
        assert_eq!(p.san_rate, CollateralPool::SAN_RATE_FLOOR);
        assert!(!p.allow_deposit && !p.allow_withdraw);
        assert!(rem > 0);
    }

    #[test]
    fn test_deposit_withdraw_at_rate() {
        let mut p = pool();
        assert_eq!(p.san_amount_for_deposit(1_000).unwrap(), 1_000);
        p.san_rate = 2 * RATE;
        assert_eq!(p.san_amount_for_deposit(1_000).unwrap(), 500);
        assert_eq!(p.collateral_for_withdraw(500).unwrap(), 1_000);
        p.slippage = 5_000_000; // 0.5%
        assert_eq!(p.collateral_for_withdraw(500).unwrap(), 995);
    }

    #[test]
    fn test_credit_and_debt_views() {
        let mut p = pool();
        p.total_debt = 400;
        // strategy at 50% of assets (idle 600 + debt 400 = 1000)
        let ratio = RATE / 2;
        assert_eq!(p.credit_available(ratio, 400, 600).unwrap(), 100);
        assert_eq!(p.debt_outstanding(ratio, 400, 600).unwrap(), 0);
        assert_eq!(p.credit_available(ratio, 600, 600).unwrap(), 0);
        assert_eq!(p.debt_outstanding(ratio, 600, 600).unwrap(), 100);
        // credit clamped by idle balance
        assert_eq!(p.credit_available(RATE, 0, 50).unwrap(), 50);
    }

    #[test]
    fn test_mint_burn_round_trip_with_zero_fees() {
        // 1000 units of 6-decimal collateral at rate 1.0 with flat-zero fee
        // curves mints exactly 1000 stable and unwinds to exactly zero
        let mut p = pool();
        p.mint_fee_curve = PiecewiseCurve {
            x: vec![0],
            y: vec![0],
        };
        p.burn_fee_curve = PiecewiseCurve {
            x: vec![0],
            y: vec![0],
        };
        let rate = OracleRate::new(1_000_000, -6);

        let deposit = 1_000_000_000u64; // 1000.0 collateral
        let fee = HedgeMarket::fee_amount(p.mint_fee_rate(0).unwrap(), deposit).unwrap();
        assert_eq!(fee, 0);
        let minted = rate.get_stable_amount(deposit, 6).unwrap();
        assert_eq!(minted, 1_000_000_000); // 1000.0 stable
        p.propagate_stocks_delta(minted as i64).unwrap();
        assert_eq!(p.stocks_users, 1_000_000_000);

        let returned = rate.get_collateral_amount(minted, 6).unwrap();
        let burn_fee = HedgeMarket::fee_amount(p.burn_fee_rate(0).unwrap(), returned).unwrap();
        assert_eq!(burn_fee, 0);
        assert_eq!(returned, deposit);
        p.propagate_stocks_delta(-(minted as i64)).unwrap();
        assert_eq!(p.stocks_users, 0);
    }

    #[test]
    fn test_fee_rates_follow_hedge_ratio() {
        let p = pool();
        // unhedged mints pay the expensive end, fully hedged the cheap end
        assert_eq!(p.mint_fee_rate(0).unwrap(), 8_000_000);
        assert_eq!(p.mint_fee_rate(RATE).unwrap(), 2_000_000);
        assert_eq!(p.burn_fee_rate(0).unwrap(), 2_000_000);
        assert_eq!(p.burn_fee_rate(RATE).unwrap(), 8_000_000);
    }
}
