//! Cadence CLI - headless front-end for the Cadence player
//!
//! Wires the Web API adapters into a player facade and drives it from the
//! command line.

pub mod cli;
pub mod commands;
pub mod config;
pub mod output;
