//! # strata-forks
//!
//! Protocol rules as data. [`ChainConfig`] maps block numbers to a [`Fork`];
//! [`ForkRules`] is the value consulted by the interpreter and the block and
//! transaction processors for every rule that changed between forks.

#![warn(clippy::all)]

mod config;
mod error;
mod fork;
mod rules;

pub use config::ChainConfig;
pub use error::ForkError;
pub use fork::Fork;
pub use rules::{DifficultyRule, ForkRules, GasSchedule};
