pub mod add_collateral_pool;
pub mod add_strategy;
pub mod add_to_perpetual;
pub mod burn_stable;
pub mod claim_reward;
pub mod close_perpetual;
pub mod deposit;
pub mod force_close_perpetuals;
pub mod get_strategy_accounting;
pub mod init;
pub mod liquidate_perpetual;
pub mod mint_stable;
pub mod notify_reward_amount;
pub mod open_perpetual;
pub mod remove_from_perpetual;
pub mod set_authorities;
pub mod set_fee_correctors;
pub mod set_fee_curves;
pub mod set_hedge_parameters;
pub mod set_oracle_rate;
pub mod set_permissions;
pub mod set_pool_parameters;
pub mod strategy_report;
pub mod update_strategy_debt_ratio;
pub mod withdraw;
pub mod withdraw_protocol_fees;

pub use {
    add_collateral_pool::*, add_strategy::*, add_to_perpetual::*, burn_stable::*, claim_reward::*,
    close_perpetual::*, deposit::*, force_close_perpetuals::*, get_strategy_accounting::*,
    init::*, liquidate_perpetual::*,
    mint_stable::*, notify_reward_amount::*, open_perpetual::*, remove_from_perpetual::*,
    set_authorities::*, set_fee_correctors::*, set_fee_curves::*, set_hedge_parameters::*,
    set_oracle_rate::*, set_permissions::*, set_pool_parameters::*, strategy_report::*,
    update_strategy_debt_ratio::*, withdraw::*, withdraw_protocol_fees::*,
};
