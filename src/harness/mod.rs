//! Remote debugger test harness
//!
//! Attaches a debugger to a process on a remote device, issues interpreter
//! commands and checks their textual output.

mod command;
pub mod connection;
pub mod matcher;
pub mod reduction;
pub mod scenario;
pub mod source_map;

pub use connection::{
    is_connection_refused, ConnectOptions, ConnectionManager, RemoteTarget, Session,
};
pub use matcher::{matches, Expectation};
pub use reduction::{
    RoleAssignment, RoleCombinationCheck, SingleRoleCheck, REDUCE_ITERATIONS, ROLE_PREFIX_LEN,
};
pub use scenario::{
    RunOptions, Scenario, ScenarioContext, ScenarioReport, ScenarioRunner, Step, StepAction,
    Verdict,
};
pub use source_map::{remap, SourceMapping};
