//! CLI subcommands

pub mod actions;
pub mod score;
pub mod simulate;
