//! CLI command handling

use colored::Colorize;

use crate::bridge::BridgeDebugger;
use crate::commands::Commands;
use crate::common::config::Config;
use crate::common::{paths, Error, Result};
use crate::device::Device;
use crate::harness::{
    ConnectOptions, RemoteTarget, RunOptions, ScenarioContext, ScenarioRunner, Verdict,
};
use crate::scenarios;

/// Dispatch a CLI command
pub async fn dispatch(command: Commands, config: &Config) -> Result<()> {
    match command {
        Commands::Run {
            scenario,
            pid,
            device,
            port,
            reduced,
            source_root,
            no_device_setup,
            quiet,
        } => {
            let scenario = scenarios::resolve(&scenario, config.scenarios.dir.as_deref())?;

            let device_id = device
                .or_else(|| config.remote.device.clone())
                .ok_or_else(|| {
                    Error::Config(
                        "No device given; pass --device or set [remote] device".to_string(),
                    )
                })?;
            let target = RemoteTarget {
                device: device_id.clone(),
                port: port.unwrap_or(config.remote.port),
                pid,
            };

            let source_root = source_root.unwrap_or_else(|| config.sources.root.clone());
            let mut ctx = ScenarioContext::new(source_root)?;
            if !no_device_setup {
                match config.adb_path() {
                    Ok(adb) => ctx = ctx.with_device(Device::adb(adb, Some(device_id))),
                    Err(e) => tracing::warn!(error = %e, "Running without device property control"),
                }
            }

            let debugger = BridgeDebugger::spawn(&config.bridge_path()?, &config.bridge.args).await?;

            let runner = ScenarioRunner::new(
                ConnectOptions::from(&config.remote),
                RunOptions {
                    reduced,
                    echo: !quiet,
                },
            );
            let report = runner
                .run(scenario.as_ref(), Box::new(debugger), &target, &mut ctx)
                .await;

            println!(
                "{}: {} ({} of {} steps run, {} skipped)",
                report.name.bold(),
                if report.passed() {
                    "passed".green()
                } else {
                    "failed".red()
                },
                report.steps_run,
                report.steps_total,
                report.steps_skipped
            );

            match report.verdict {
                Verdict::Passed => Ok(()),
                Verdict::Failed(e) => Err(e),
            }
        }

        Commands::List => {
            println!("{}", "Built-in scenarios:".cyan());
            for scenario in scenarios::builtin() {
                println!(
                    "  {} {:<24} {}",
                    format!("{:<28}", scenario.name()).white().bold(),
                    scenario.bundle_target(),
                    scenario.description().unwrap_or_default().dimmed()
                );
            }

            if let Some(dir) = &config.scenarios.dir {
                println!("\n{} {}", "Scenario files in".cyan(), dir.display());
                for path in scenarios::discover(dir)? {
                    match scenarios::FileScenario::load(&path) {
                        Ok(scenario) => println!(
                            "  {} {:<24} {}",
                            format!("{:<28}", scenario.name).white().bold(),
                            scenario.bundle,
                            path.display().to_string().dimmed()
                        ),
                        Err(e) => println!("  {} {}: {}", "✗".red(), path.display(), e),
                    }
                }
            }
            Ok(())
        }

        Commands::Check => {
            match paths::config_path() {
                Some(path) if path.exists() => {
                    println!("  {} config: {}", "✓".green(), path.display())
                }
                Some(path) => println!(
                    "  {} config: {} (not present, using defaults)",
                    "-".dimmed(),
                    path.display()
                ),
                None => println!("  {} config: no config directory", "-".dimmed()),
            }

            let mut ok = true;
            for (name, found) in [("bridge", config.bridge_path()), ("adb", config.adb_path())] {
                match found {
                    Ok(path) => println!("  {} {}: {}", "✓".green(), name, path.display()),
                    Err(e) => {
                        ok = false;
                        println!("  {} {}: {}", "✗".red(), name, e);
                    }
                }
            }

            if ok {
                Ok(())
            } else {
                Err(Error::Config("Harness prerequisites missing".to_string()))
            }
        }
    }
}
