//! Scripts for deploying and wiring contracts through a reconciling
//! deployment ledger.

#![deny(missing_docs)]
#![deny(clippy::missing_docs_in_private_items)]

pub mod cli;
pub mod client;
mod commands;
pub mod constants;
pub mod errors;
pub mod upgrades;
pub mod utils;
