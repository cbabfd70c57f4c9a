//! Scenario execution
//!
//! A scenario is an ordered list of [`Step`]s run against one attached
//! session. [`ScenarioRunner::run`] drives the whole lifecycle: device setup,
//! attach, steps, detach and device shutdown. Detach and shutdown run on
//! every path once they are reached.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use colored::Colorize;
use serde::Deserialize;
use tempfile::TempDir;

use crate::bridge::Debugger;
use crate::common::{Error, Result};
use crate::device::Device;

use super::connection::{ConnectOptions, ConnectionManager, RemoteTarget, Session};
use super::matcher::Expectation;
use super::reduction::{RoleCombinationCheck, SingleRoleCheck};
use super::source_map;

/// One unit of work in a scenario
#[derive(Debug, Clone, Deserialize)]
pub struct Step {
    #[serde(flatten)]
    pub action: StepAction,
    /// Left out when running in reduced mode
    #[serde(default)]
    pub skip_when_reduced: bool,
}

/// What a step does
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum StepAction {
    /// Run a command and check its output
    Command {
        command: String,
        #[serde(default)]
        expect: Expectation,
    },
    /// Remove all breakpoints
    DeleteBreakpoints,
    /// Map the recorded source directory of `file` to `directory`
    ///
    /// Relative directories are taken from the scenario's source root.
    SourceMap { file: String, directory: PathBuf },
    /// Delete a file if it exists; relative paths are in the scenario temp dir
    RemoveFile { path: PathBuf },
    RoleCombinations(RoleCombinationCheck),
    SingleRoles(SingleRoleCheck),
}

impl Step {
    pub fn new(action: StepAction) -> Self {
        Self {
            action,
            skip_when_reduced: false,
        }
    }

    /// Command step checked against `expect`
    pub fn command(command: impl Into<String>, expect: Expectation) -> Self {
        Self::new(StepAction::Command {
            command: command.into(),
            expect,
        })
    }

    /// Command step requiring every substring in `substrings`
    pub fn expect<S>(command: impl Into<String>, substrings: S) -> Self
    where
        S: IntoIterator,
        S::Item: Into<String>,
    {
        Self::command(command, Expectation::contains(substrings))
    }

    pub fn delete_breakpoints() -> Self {
        Self::new(StepAction::DeleteBreakpoints)
    }

    pub fn source_map(file: impl Into<String>, directory: impl Into<PathBuf>) -> Self {
        Self::new(StepAction::SourceMap {
            file: file.into(),
            directory: directory.into(),
        })
    }

    pub fn remove_file(path: impl Into<PathBuf>) -> Self {
        Self::new(StepAction::RemoveFile { path: path.into() })
    }

    /// Mark the step as left out of reduced runs
    pub fn full_only(mut self) -> Self {
        self.skip_when_reduced = true;
        self
    }
}

impl StepAction {
    /// Short human readable label
    pub fn summary(&self) -> String {
        match self {
            StepAction::Command { command, .. } => command.clone(),
            StepAction::DeleteBreakpoints => "delete all breakpoints".to_string(),
            StepAction::SourceMap { file, directory } => {
                format!("map sources of {} to {}", file, directory.display())
            }
            StepAction::RemoveFile { path } => format!("remove {}", path.display()),
            StepAction::RoleCombinations(check) => {
                format!("role combinations of {}", check.reduce_name)
            }
            StepAction::SingleRoles(check) => format!("single roles of {}", check.reduce_name),
        }
    }
}

/// Per-run resources shared by a scenario's steps
pub struct ScenarioContext {
    tmp_dir: TempDir,
    source_root: PathBuf,
    device: Option<Device>,
}

impl ScenarioContext {
    /// Create a context with a fresh temp directory
    pub fn new(source_root: impl Into<PathBuf>) -> Result<Self> {
        let tmp_dir = tempfile::Builder::new()
            .prefix("lldb-harness-")
            .tempdir()?;
        Ok(Self {
            tmp_dir,
            source_root: source_root.into(),
            device: None,
        })
    }

    pub fn with_device(mut self, device: Device) -> Self {
        self.device = Some(device);
        self
    }

    pub fn tmp_dir(&self) -> &Path {
        self.tmp_dir.path()
    }

    /// Path of a file inside the temp directory
    pub fn tmp_file_path(&self, name: &str) -> PathBuf {
        self.tmp_dir.path().join(name)
    }

    pub fn source_root(&self) -> &Path {
        &self.source_root
    }

    /// Resolve a source directory against the source root
    pub fn resolve_source(&self, directory: &Path) -> PathBuf {
        if directory.is_absolute() {
            directory.to_path_buf()
        } else {
            self.source_root.join(directory)
        }
    }

    pub fn device_mut(&mut self) -> Option<&mut Device> {
        self.device.as_mut()
    }

    fn resolve_tmp(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.tmp_dir.path().join(path)
        }
    }
}

/// A named debugger test
#[async_trait]
pub trait Scenario: Send + Sync {
    fn name(&self) -> &str;

    fn description(&self) -> Option<&str> {
        None
    }

    /// Application bundle the scenario expects to be attached to
    fn bundle_target(&self) -> &str;

    /// Prepare the device before attaching
    async fn setup(&self, _device: &mut Device) -> Result<()> {
        Ok(())
    }

    fn steps(&self, ctx: &ScenarioContext) -> Result<Vec<Step>>;

    /// Undo device changes made by [`Scenario::setup`]
    async fn shutdown(&self, _device: &mut Device) -> Result<()> {
        Ok(())
    }
}

/// Outcome of a scenario
#[derive(Debug)]
pub enum Verdict {
    Passed,
    Failed(Error),
}

impl Verdict {
    pub fn is_passed(&self) -> bool {
        matches!(self, Verdict::Passed)
    }

    pub fn error(&self) -> Option<&Error> {
        match self {
            Verdict::Passed => None,
            Verdict::Failed(e) => Some(e),
        }
    }
}

/// Result of a scenario run
#[derive(Debug)]
pub struct ScenarioReport {
    pub name: String,
    pub verdict: Verdict,
    pub steps_run: usize,
    pub steps_skipped: usize,
    pub steps_total: usize,
}

impl ScenarioReport {
    pub fn passed(&self) -> bool {
        self.verdict.is_passed()
    }
}

/// How a scenario is run
#[derive(Debug, Clone, Copy, Default)]
pub struct RunOptions {
    /// Skip steps marked as full-run only
    pub reduced: bool,
    /// Print step progress to stdout
    pub echo: bool,
}

/// Runs scenarios against a debugger backend
#[derive(Debug, Clone)]
pub struct ScenarioRunner {
    connect: ConnectOptions,
    options: RunOptions,
}

impl ScenarioRunner {
    pub fn new(connect: ConnectOptions, options: RunOptions) -> Self {
        Self { connect, options }
    }

    /// Run `scenario` against `target`
    ///
    /// Never returns early without tearing down: once attach has been
    /// attempted the connection is released, and device shutdown runs
    /// whenever a device is present.
    pub async fn run(
        &self,
        scenario: &dyn Scenario,
        debugger: Box<dyn Debugger>,
        target: &RemoteTarget,
        ctx: &mut ScenarioContext,
    ) -> ScenarioReport {
        let name = scenario.name().to_string();
        tracing::info!(scenario = %name, reduced = self.options.reduced, "Running scenario");
        self.print_header(scenario);

        let mut report = ScenarioReport {
            name,
            verdict: Verdict::Passed,
            steps_run: 0,
            steps_skipped: 0,
            steps_total: 0,
        };

        let steps = match scenario.steps(ctx) {
            Ok(steps) => steps,
            Err(e) => {
                report.verdict = Verdict::Failed(e);
                return self.finish(report);
            }
        };
        report.steps_total = steps.len();

        let setup = match ctx.device_mut() {
            Some(device) => scenario.setup(device).await,
            None => {
                tracing::debug!("No device handle, skipping scenario setup");
                Ok(())
            }
        };

        match setup {
            Ok(()) => {
                let mut manager = ConnectionManager::new(debugger, self.connect.clone());
                let outcome = self
                    .run_attached(&mut manager, target, &steps, ctx, &mut report)
                    .await;
                manager.detach().await;

                if let Err(e) = outcome {
                    report.verdict = Verdict::Failed(e);
                }
            }
            Err(e) => {
                tracing::error!(error = %e, "Scenario setup failed");
                self.echo(format!("  {} Setup: {}", "✗".red(), e));
                report.verdict = Verdict::Failed(e);
            }
        }

        if let Some(device) = ctx.device_mut() {
            if let Err(e) = scenario.shutdown(device).await {
                tracing::warn!(error = %e, "Scenario shutdown failed");
                if report.passed() {
                    report.verdict = Verdict::Failed(e);
                }
            }
        }

        self.finish(report)
    }

    async fn run_attached(
        &self,
        manager: &mut ConnectionManager,
        target: &RemoteTarget,
        steps: &[Step],
        ctx: &ScenarioContext,
        report: &mut ScenarioReport,
    ) -> Result<()> {
        let mut session = match manager.attach(target).await {
            Ok(session) => session,
            Err(e) => {
                self.echo(format!("  {} Attach: {}", "✗".red(), e));
                return Err(e);
            }
        };
        self.echo(format!(
            "  {} Attached to process {} via {}",
            "✓".green(),
            session.pid(),
            session.endpoint().dimmed()
        ));

        self.echo(format!("\n{}", "Steps:".cyan()));
        for (i, step) in steps.iter().enumerate() {
            let step_num = i + 1;
            let label = step.action.summary();

            if self.options.reduced && step.skip_when_reduced {
                report.steps_skipped += 1;
                tracing::debug!(step = step_num, "Skipped in reduced mode");
                self.echo(format!("  {} Step {}: {}", "-".dimmed(), step_num, label.dimmed()));
                continue;
            }

            report.steps_run += 1;
            match execute_step(&mut session, &step.action, ctx).await {
                Ok(()) => {
                    self.echo(format!("  {} Step {}: {}", "✓".green(), step_num, label));
                }
                Err(e) => {
                    tracing::error!(step = step_num, kind = e.kind(), error = %e, "Step failed");
                    self.echo(format!("  {} Step {}: {}", "✗".red(), step_num, e));
                    return Err(e);
                }
            }
        }
        Ok(())
    }

    fn print_header(&self, scenario: &dyn Scenario) {
        self.echo(format!(
            "\n{} {}",
            "Running Scenario:".blue().bold(),
            scenario.name().white().bold()
        ));
        if let Some(desc) = scenario.description() {
            self.echo(format!("  {}", desc.dimmed()));
        }
    }

    fn finish(&self, report: ScenarioReport) -> ScenarioReport {
        match &report.verdict {
            Verdict::Passed => {
                tracing::info!(
                    scenario = %report.name,
                    steps_run = report.steps_run,
                    steps_skipped = report.steps_skipped,
                    "Scenario passed"
                );
                self.echo(format!(
                    "\n{} {}\n",
                    "✓".green().bold(),
                    "Scenario Passed".green().bold()
                ));
            }
            Verdict::Failed(e) => {
                tracing::error!(scenario = %report.name, kind = e.kind(), "Scenario failed");
                self.echo(format!(
                    "\n{} {}\n",
                    "✗".red().bold(),
                    "Scenario Failed".red().bold()
                ));
            }
        }
        report
    }

    fn echo(&self, line: String) {
        if self.options.echo {
            println!("{}", line);
        }
    }
}

async fn execute_step(
    session: &mut Session<'_>,
    action: &StepAction,
    ctx: &ScenarioContext,
) -> Result<()> {
    match action {
        StepAction::Command { command, expect } => session.run(command, expect).await.map(|_| ()),
        StepAction::DeleteBreakpoints => session.delete_breakpoints().await,
        StepAction::SourceMap { file, directory } => {
            let directory = ctx.resolve_source(directory);
            source_map::remap(session, file, &directory).await.map(|_| ())
        }
        StepAction::RemoveFile { path } => remove_file(&ctx.resolve_tmp(path)).await,
        StepAction::RoleCombinations(check) => check.verify(session).await,
        StepAction::SingleRoles(check) => check.verify(session).await,
    }
}

async fn remove_file(path: &Path) -> Result<()> {
    match tokio::fs::remove_file(path).await {
        Ok(()) => {
            tracing::debug!(path = %path.display(), "Removed file");
            Ok(())
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}
