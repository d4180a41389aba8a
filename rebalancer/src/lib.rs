//! weightbook-rebalancer: target-weight rebalancing for Tinkoff Invest accounts.
//!
//! Logs in with an API token (kept encrypted at rest), fetches an account's
//! holdings over the Tinkoff Invest REST gateway, and computes the buy/sell
//! plan that moves them toward a target.json. Plans can also be computed
//! offline from a file of positions. Every action lands in a JSONL audit trail.

pub mod audit;
pub mod broker;
pub mod config;
pub mod crypto;
pub mod doctor;
pub mod error;
pub mod report;
pub mod session;
pub mod store;
pub mod target;
pub mod workflow;
