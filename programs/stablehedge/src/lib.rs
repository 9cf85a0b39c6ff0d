//! Stablehedge: multi-collateral stablecoin core
//!
//! Coordinates four ledgers around each accepted collateral token: the
//! issuance ledger minting and burning the stablecoin against oracle
//! rates with hedge-coverage-driven fees, a perpetual hedging market
//! where agents post margin to absorb the collateral-price exposure, a
//! san (SLP share) token layer distributing yield and absorbing residual
//! losses, and a reserves-vs-strategy ledger lending idle collateral to
//! yield strategies.

#![allow(clippy::result_large_err)]

use {anchor_lang::prelude::*, instructions::*};

pub mod error;
pub mod instructions;
pub mod math;
pub mod state;

#[cfg(not(feature = "no-entrypoint"))]
solana_security_txt::security_txt! {
    name: "Stablehedge",
    project_url: "https://github.com/stablehedge-protocol/stablehedge",
    contacts: "email:security@stablehedge.fi",
    policy: "https://github.com/stablehedge-protocol/stablehedge/blob/main/SECURITY.md"
}

declare_id!("Fg6PaFpoGXkYsidMpWTK6W2BeZ7FEfcYkg476zPFsLnS");

#[program]
pub mod stablehedge {
    use super::*;

    /// Initialize the protocol: controller, transfer authority and the
    /// stablecoin mint
    pub fn init(ctx: Context<Init>, params: InitParams) -> Result<()> {
        instructions::init::init(ctx, &params)
    }

    /// Register a collateral token: pool, san mint, hedging market,
    /// reward vault and rate oracle
    pub fn add_collateral_pool(
        ctx: Context<AddCollateralPool>,
        params: AddCollateralPoolParams,
    ) -> Result<()> {
        instructions::add_collateral_pool::add_collateral_pool(ctx, &params)
    }

    /// Push a fresh oracle rate bracket for a pool
    pub fn set_oracle_rate(ctx: Context<SetOracleRate>, params: SetOracleRateParams) -> Result<()> {
        instructions::set_oracle_rate::set_oracle_rate(ctx, &params)
    }

    /// Replace mint/burn and hedging fee curves (validated here)
    pub fn set_fee_curves(ctx: Context<SetFeeCurves>, params: SetFeeCurvesParams) -> Result<()> {
        instructions::set_fee_curves::set_fee_curves(ctx, &params)
    }

    /// Update a pool's issuance and SLP parameters
    pub fn set_pool_parameters(
        ctx: Context<SetPoolParameters>,
        params: SetPoolParametersParams,
    ) -> Result<()> {
        instructions::set_pool_parameters::set_pool_parameters(ctx, &params)
    }

    /// Fee-policy corrections: bonus/malus scalars and slippage settings
    pub fn set_fee_correctors(
        ctx: Context<SetFeeCorrectors>,
        params: SetFeeCorrectorsParams,
    ) -> Result<()> {
        instructions::set_fee_correctors::set_fee_correctors(ctx, &params)
    }

    /// Update the hedging market's risk and keeper parameters
    pub fn set_hedge_parameters(
        ctx: Context<SetHedgeParameters>,
        params: SetHedgeParametersParams,
    ) -> Result<()> {
        instructions::set_hedge_parameters::set_hedge_parameters(ctx, &params)
    }

    /// Pause or resume action classes per pool
    pub fn set_permissions(
        ctx: Context<SetPermissions>,
        params: SetPermissionsParams,
    ) -> Result<()> {
        instructions::set_permissions::set_permissions(ctx, &params)
    }

    /// Rotate protocol authorities
    pub fn set_authorities(
        ctx: Context<SetAuthorities>,
        params: SetAuthoritiesParams,
    ) -> Result<()> {
        instructions::set_authorities::set_authorities(ctx, &params)
    }

    /// Mint stablecoins against deposited collateral
    pub fn mint_stable(ctx: Context<MintStable>, params: MintStableParams) -> Result<()> {
        instructions::mint_stable::mint_stable(ctx, &params)
    }

    /// Burn stablecoins for collateral
    pub fn burn_stable(ctx: Context<BurnStable>, params: BurnStableParams) -> Result<()> {
        instructions::burn_stable::burn_stable(ctx, &params)
    }

    /// SLP deposit: collateral in, san tokens out
    pub fn deposit(ctx: Context<Deposit>, params: DepositParams) -> Result<()> {
        instructions::deposit::deposit(ctx, &params)
    }

    /// SLP withdrawal: san tokens in, collateral out (best effort)
    pub fn withdraw(ctx: Context<Withdraw>, params: WithdrawParams) -> Result<()> {
        instructions::withdraw::withdraw(ctx, &params)
    }

    /// Open a hedging position
    pub fn open_perpetual(ctx: Context<OpenPerpetual>, params: OpenPerpetualParams) -> Result<()> {
        instructions::open_perpetual::open_perpetual(ctx, &params)
    }

    /// Add margin to a position
    pub fn add_to_perpetual(
        ctx: Context<AddToPerpetual>,
        params: AddToPerpetualParams,
    ) -> Result<()> {
        instructions::add_to_perpetual::add_to_perpetual(ctx, &params)
    }

    /// Withdraw margin from a position
    pub fn remove_from_perpetual(
        ctx: Context<RemoveFromPerpetual>,
        params: RemoveFromPerpetualParams,
    ) -> Result<()> {
        instructions::remove_from_perpetual::remove_from_perpetual(ctx, &params)
    }

    /// Cash out a position
    pub fn close_perpetual(
        ctx: Context<ClosePerpetual>,
        params: ClosePerpetualParams,
    ) -> Result<()> {
        instructions::close_perpetual::close_perpetual(ctx, &params)
    }

    /// Liquidate an undercollateralized position (permissionless)
    pub fn liquidate_perpetual(
        ctx: Context<LiquidatePerpetual>,
        params: LiquidatePerpetualParams,
    ) -> Result<()> {
        instructions::liquidate_perpetual::liquidate_perpetual(ctx, &params)
    }

    /// Force close positions while the market is over its limit coverage
    /// (permissionless)
    pub fn force_close_perpetuals<'info>(
        ctx: Context<'_, '_, 'info, 'info, ForceClosePerpetuals<'info>>,
        params: ForceClosePerpetualsParams,
    ) -> Result<()> {
        instructions::force_close_perpetuals::force_close_perpetuals(ctx, &params)
    }

    /// Fund and start a reward distribution period
    pub fn notify_reward_amount(
        ctx: Context<NotifyRewardAmount>,
        params: NotifyRewardAmountParams,
    ) -> Result<()> {
        instructions::notify_reward_amount::notify_reward_amount(ctx, &params)
    }

    /// Claim a position's accrued rewards
    pub fn claim_reward(ctx: Context<ClaimReward>, params: ClaimRewardParams) -> Result<()> {
        instructions::claim_reward::claim_reward(ctx, &params)
    }

    /// Register a yield strategy for a pool
    pub fn add_strategy(ctx: Context<AddStrategy>, params: AddStrategyParams) -> Result<()> {
        instructions::add_strategy::add_strategy(ctx, &params)
    }

    /// Change a strategy's debt ratio or emergency exit flag
    pub fn update_strategy_debt_ratio(
        ctx: Context<UpdateStrategyDebtRatio>,
        params: UpdateStrategyDebtRatioParams,
    ) -> Result<()> {
        instructions::update_strategy_debt_ratio::update_strategy_debt_ratio(ctx, &params)
    }

    /// View: a strategy's total assets, available credit and outstanding
    /// debt
    pub fn get_strategy_accounting(
        ctx: Context<GetStrategyAccounting>,
        params: GetStrategyAccountingParams,
    ) -> Result<StrategyAccounting> {
        instructions::get_strategy_accounting::get_strategy_accounting(ctx, &params)
    }

    /// Strategy gain/loss/repayment report and rebalance
    pub fn strategy_report(
        ctx: Context<StrategyReport>,
        params: StrategyReportParams,
    ) -> Result<()> {
        instructions::strategy_report::strategy_report(ctx, &params)
    }

    /// Collect protocol revenue
    pub fn withdraw_protocol_fees(
        ctx: Context<WithdrawProtocolFees>,
        params: WithdrawProtocolFeesParams,
    ) -> Result<()> {
        instructions::withdraw_protocol_fees::withdraw_protocol_fees(ctx, &params)
    }
}
