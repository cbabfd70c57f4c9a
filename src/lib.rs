//! Remote debugger end-to-end test harness
//!
//! Drives a debugger attached to a process on a remote device through its
//! command interpreter and checks the textual responses. The debugger itself
//! sits behind the [`bridge::Debugger`] trait.

pub mod bridge;
pub mod cli;
pub mod commands;
pub mod common;
pub mod device;
pub mod harness;
pub mod scenarios;

pub use common::{Error, Result};
pub use harness::{Scenario, ScenarioReport, ScenarioRunner, Verdict};
