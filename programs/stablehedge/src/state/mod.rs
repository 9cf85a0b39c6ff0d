pub mod collateral;
pub mod core;
pub mod fee_curve;
pub mod hedge_market;
pub mod oracle;
pub mod perpetual;
pub mod rewards;
pub mod strategy;
