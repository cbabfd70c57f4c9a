//! Breakpoint checks for reduction kernels
//!
//! A reduction is compiled into several generated functions, one per role
//! (initializer, accumulator, combiner, outconverter, halter). Breakpoints can
//! be scoped to roles instead of symbol names. The checks here confirm that
//! such breakpoints stop only in functions of the requested roles, and that
//! every requested role eventually stops the process.
//!
//! Generated symbols are named `<reduce>_<role prefix>...`, where the prefix
//! is the first [`ROLE_PREFIX_LEN`] characters of the role (`accu`, `outc`,
//! ...). Roles are recognised in stop locations by that prefix.

use regex::Regex;
use serde::Deserialize;

use crate::common::{Error, Result};

use super::connection::Session;
use super::matcher::Expectation;

/// Resume budget per role combination; one per input coordinate of the test app
pub const REDUCE_ITERATIONS: u32 = 128;

/// Characters of a role name that prefix its generated function
pub const ROLE_PREFIX_LEN: usize = 4;

/// Stop description of a breakpoint hit; crashes and step stops do not count
const STOPPED_AT_BREAKPOINT: &str = "stop reason = breakpoint";

/// Suffix of combiners generated when the script declares none
const AUTO_COMBINER_SUFFIX: &str = ".combiner";

fn default_iterations() -> u32 {
    REDUCE_ITERATIONS
}

fn default_prefix_len() -> usize {
    ROLE_PREFIX_LEN
}

/// Checks that role-scoped breakpoints only stop in functions of those roles
#[derive(Debug, Clone, Deserialize)]
pub struct RoleCombinationCheck {
    /// Script name inside `librs.<name>.so`
    pub script_soname: String,
    /// Reduction kernel name
    pub reduce_name: String,
    /// Role pairs to set breakpoints on
    pub combinations: Vec<[String; 2]>,
    /// Maximum resumes per pair
    #[serde(default = "default_iterations")]
    pub iterations: u32,
    #[serde(default = "default_prefix_len")]
    pub prefix_len: usize,
}

/// A generated function and the role it implements
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RoleAssignment {
    pub function: String,
    pub role: String,
}

impl RoleAssignment {
    pub fn new(function: impl Into<String>, role: impl Into<String>) -> Self {
        Self {
            function: function.into(),
            role: role.into(),
        }
    }
}

/// Checks that a breakpoint on a single role resolves to, and stops in, the
/// expected function
#[derive(Debug, Clone, Deserialize)]
pub struct SingleRoleCheck {
    /// Script name inside `librs.<name>.so`
    pub script_soname: String,
    /// Source file the script was compiled from
    pub script_basename: String,
    /// Reduction kernel name
    pub reduce_name: String,
    pub functions: Vec<RoleAssignment>,
}

/// Command setting a reduction breakpoint scoped to `roles`
fn reduction_breakpoint_command(reduce_name: &str, roles: &str) -> String {
    format!(
        "language renderscript reduction breakpoint set {} --function-role {}",
        reduce_name, roles
    )
}

/// Patterns `process continue` output must match to have stopped in a
/// function of the script
fn stop_patterns(script_soname: &str, function_pattern: &str) -> [String; 3] {
    [
        r"resuming".to_string(),
        r"Process \d+ stopped".to_string(),
        format!(
            r"frame #0: 0x[0-9a-fA-F]+ librs\.{}\.so`{}",
            regex::escape(script_soname),
            function_pattern
        ),
    ]
}

/// Generated prefix of a role's function name
pub fn role_prefix(role: &str, len: usize) -> String {
    role.chars().take(len).collect()
}

/// Remove the first pending role prefix named on any line of `output`
///
/// Lines are searched in order. A line naming a role that was already
/// observed is skipped, since some roles (the accumulator) fire far more often
/// than others (the outconverter). Returns the prefix that was removed.
pub fn observe_role(pattern: &Regex, output: &str, pending: &mut Vec<String>) -> Option<String> {
    for line in output.lines() {
        let Some(captures) = pattern.captures(line) else {
            continue;
        };
        let Some(prefix) = captures.get(1) else {
            continue;
        };
        if let Some(index) = pending.iter().position(|p| p == prefix.as_str()) {
            return Some(pending.remove(index));
        }
    }
    None
}

impl RoleCombinationCheck {
    /// Pattern matching the function of either role, capturing the role prefix
    pub fn function_pattern(&self, roles: &[String; 2]) -> String {
        format!(
            "{}_(({}|{}))",
            regex::escape(&self.reduce_name),
            regex::escape(&role_prefix(&roles[0], self.prefix_len)),
            regex::escape(&role_prefix(&roles[1], self.prefix_len)),
        )
    }

    /// Run the check for every combination
    pub async fn verify(&self, session: &mut Session<'_>) -> Result<()> {
        if self.prefix_len == 0 {
            return Err(Error::Config(
                "role prefix length must be at least 1".to_string(),
            ));
        }
        for roles in &self.combinations {
            self.verify_combination(session, roles).await?;
        }
        Ok(())
    }

    async fn verify_combination(&self, session: &mut Session<'_>, roles: &[String; 2]) -> Result<()> {
        session.delete_breakpoints().await?;
        session
            .run(
                &reduction_breakpoint_command(&self.reduce_name, &roles.join(",")),
                &Expectation::contains(["Breakpoint(s) created"]),
            )
            .await?;

        let function_pattern = self.function_pattern(roles);
        let functions = Regex::new(&function_pattern).map_err(|e| Error::InvalidPattern {
            pattern: function_pattern.clone(),
            reason: e.to_string(),
        })?;
        let stopped = Expectation::new(
            [STOPPED_AT_BREAKPOINT],
            stop_patterns(&self.script_soname, &function_pattern),
        )?;

        let mut pending: Vec<String> = roles
            .iter()
            .map(|role| role_prefix(role, self.prefix_len))
            .collect();

        for iteration in 1..=self.iterations {
            let output = session.run("process continue", &stopped).await?;

            if let Some(prefix) = observe_role(&functions, &output, &mut pending) {
                tracing::debug!(iteration, role = %prefix, "Observed role");
            }
            if pending.is_empty() {
                tracing::info!(roles = ?roles, iteration, "All roles observed");
                return Ok(());
            }
        }

        let unmatched = roles
            .iter()
            .filter(|role| pending.contains(&role_prefix(role, self.prefix_len)))
            .cloned()
            .collect();

        Err(Error::RoleCoverageIncomplete {
            combination: roles.to_vec(),
            pending: unmatched,
            iterations: self.iterations,
        })
    }
}

impl SingleRoleCheck {
    /// Expected breakpoint creation message for `function`
    ///
    /// Generated combiners have no source location, so the `at <file>` part is
    /// only required for other functions.
    pub fn breakpoint_pattern(&self, function: &str) -> String {
        let pattern = format!(
            r"Breakpoint \d+: where = librs\.{}\.so`{}",
            regex::escape(&self.script_soname),
            regex::escape(function)
        );
        if function.ends_with(AUTO_COMBINER_SUFFIX) {
            pattern
        } else {
            format!(
                r"{} (\+ \d+ )?at {}",
                pattern,
                regex::escape(&self.script_basename)
            )
        }
    }

    /// Run the check for every function
    pub async fn verify(&self, session: &mut Session<'_>) -> Result<()> {
        for assignment in &self.functions {
            session.delete_breakpoints().await?;

            session
                .run(
                    &reduction_breakpoint_command(&self.reduce_name, &assignment.role),
                    &Expectation::matching([self.breakpoint_pattern(&assignment.function)])?,
                )
                .await?;

            let stopped = Expectation::matching(stop_patterns(
                &self.script_soname,
                &regex::escape(&assignment.function),
            ))?;
            session.run("process continue", &stopped).await?;

            tracing::debug!(
                function = %assignment.function,
                role = %assignment.role,
                "Role breakpoint resolved"
            );
        }
        Ok(())
    }
}
