//! CLI command definitions

use clap::Subcommand;
use std::path::PathBuf;

#[derive(Subcommand)]
pub enum Commands {
    /// Run a scenario against a process on a device
    Run {
        /// Built-in scenario name, scenario name in the scenarios dir, or
        /// path to a YAML scenario file
        scenario: String,

        /// Process ID of the app to attach to
        #[arg(long)]
        pid: u32,

        /// Device id (default: [remote] device from the config file)
        #[arg(long, short)]
        device: Option<String>,

        /// Debug server port on the device
        #[arg(long, short)]
        port: Option<u16>,

        /// Run only the steps that are not marked as full-run only
        #[arg(long)]
        reduced: bool,

        /// Root that relative source-map directories are resolved against
        #[arg(long)]
        source_root: Option<PathBuf>,

        /// Do not change device properties before the run
        #[arg(long)]
        no_device_setup: bool,

        /// Only print the final result
        #[arg(long, short)]
        quiet: bool,
    },

    /// List available scenarios
    List,

    /// Check that the debugger bridge and adb can be found
    Check,
}
