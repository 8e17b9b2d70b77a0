//! CLI subcommands

pub mod apply;
pub mod fork;
pub mod state_root;
