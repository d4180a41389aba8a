//! # weightbook
//!
//! A deterministic target-weight rebalancing calculator.
//!
//! Given the current positions of a portfolio and a target weight for some of
//! them, the calculator derives the buy/sell operations that bring the
//! selected holdings to their targets under one of two policies:
//!
//! | Mode | Behavior |
//! |------|----------|
//! | **buy_only** | Never sells. Adds just enough capital that no holding is above its target. |
//! | **buy_and_sell** | Keeps the selected total fixed and reallocates it. |
//!
//! ## Quick Start
//!
//! ```
//! use weightbook::{calculate, Action, Mode, Position, TargetWeights};
//!
//! let positions = vec![
//!     Position::with_value("A", 700.0, 10.0),
//!     Position::with_value("B", 300.0, 5.0),
//! ];
//! let targets: TargetWeights = [("A", 50.0), ("B", 50.0)].into_iter().collect();
//!
//! let plan = calculate(&positions, &targets, Mode::BuyAndSell).unwrap();
//! assert_eq!(plan.operations.len(), 2);
//! assert_eq!(plan.operations[0].action, Action::Sell);
//! assert!((plan.operations[0].quantity - 20.0).abs() < 1e-9);
//! assert_eq!(plan.operations[1].action, Action::Buy);
//! assert!((plan.operations[1].quantity - 40.0).abs() < 1e-9);
//! ```
//!
//! ## Buy-only scaling
//!
//! In `buy_only` mode the most overweight holding fixes the new total; the
//! others are topped up to their share of it:
//!
//! ```
//! use weightbook::{calculate, Mode, Position, TargetWeights};
//!
//! let positions = vec![
//!     Position::with_value("A", 700.0, 10.0),
//!     Position::with_value("B", 300.0, 5.0),
//! ];
//! let targets: TargetWeights = [("A", 50.0), ("B", 50.0)].into_iter().collect();
//!
//! let plan = calculate(&positions, &targets, Mode::BuyOnly).unwrap();
//! assert!((plan.new_total - 1400.0).abs() < 1e-9);
//! assert!((plan.additional_investment - 400.0).abs() < 1e-9);
//! assert_eq!(plan.operations.len(), 1); // only B is bought
//! ```
//!
//! ## Features
//!
//! - `serde`: Serialize/Deserialize for all input and output types.

mod calculator;
mod error;
mod mode;
mod operation;
mod position;
mod targets;
mod tolerance;

pub use calculator::{RebalanceCalculator, calculate};
pub use error::RebalanceError;
pub use mode::{Mode, ParseModeError};
pub use operation::{Action, RebalanceOperation, RebalanceResult};
pub use position::Position;
pub use targets::TargetWeights;
pub use tolerance::{DEFAULT_MIN_TRADE_VALUE, DEFAULT_WEIGHT_SUM_TOLERANCE, Tolerance};
