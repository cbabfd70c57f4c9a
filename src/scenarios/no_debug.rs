//! `language renderscript` subcommands against an app built without debug info

use async_trait::async_trait;

use crate::common::Result;
use crate::harness::{Scenario, ScenarioContext, Step};

/// Exercises the RenderScript language subcommands; module dump must report
/// the missing debug info.
pub struct LanguageSubcmdsNoDebug;

#[async_trait]
impl Scenario for LanguageSubcmdsNoDebug {
    fn name(&self) -> &str {
        "language_subcmds_no_debug"
    }

    fn description(&self) -> Option<&str> {
        Some("RenderScript language subcommands on an app without debug info")
    }

    fn bundle_target(&self) -> &str {
        "JavaNoDebugWaitAttach"
    }

    fn steps(&self, ctx: &ScenarioContext) -> Result<Vec<Step>> {
        let dump = ctx.tmp_file_path("allocation.dump");
        let dump = dump.display().to_string();

        Ok(vec![
            Step::expect(
                "language renderscript status",
                ["Runtime Library discovered", "Runtime Driver discovered"],
            ),
            Step::expect(
                "language renderscript kernel breakpoint set simple_kernel",
                ["(pending)"],
            ),
            Step::expect("process continue", Vec::<String>::new()),
            Step::expect(
                "language renderscript kernel",
                ["breakpoint", "coordinate", "list"],
            ),
            Step::expect(
                "language renderscript kernel list",
                ["RenderScript Kernels", "Resource 'simple'", "root", "simple_kernel"],
            ),
            Step::expect("language renderscript context", ["dump"]),
            Step::expect(
                "language renderscript context dump",
                ["Inferred RenderScript Contexts", "1 script instances"],
            ),
            Step::expect(
                "language renderscript allocation",
                ["list", "load", "save", "dump", "refresh"],
            ),
            Step::expect(
                "language renderscript allocation list",
                ["RenderScript Allocations:"],
            ),
            Step::expect(
                "language renderscript allocation list -i 0",
                ["RenderScript Allocations:"],
            )
            .full_only(),
            Step::expect(
                "language renderscript allocation list --id 0",
                ["RenderScript Allocations:"],
            )
            .full_only(),
            Step::expect("language renderscript allocation dump 1", ["Data (X, Y, Z):"]),
            Step::expect(
                format!("language renderscript allocation dump 1 -f {}", dump),
                [format!("Results written to '{}'", dump)],
            ),
            Step::remove_file(&dump),
            Step::expect(
                format!("language renderscript allocation dump 1 --file {}", dump),
                [format!("Results written to '{}'", dump)],
            )
            .full_only(),
            Step::expect(
                format!("language renderscript allocation save 1 {}", dump),
                [format!("Allocation written to file '{}'", dump)],
            ),
            Step::expect(
                format!("language renderscript allocation load 1 {}", dump),
                [format!("Contents of file '{}' read into allocation 1", dump)],
            ),
            Step::expect(
                "language renderscript allocation refresh",
                ["All allocations successfully recomputed"],
            ),
            Step::expect("language renderscript module", ["dump"]),
            Step::expect(
                "language renderscript module dump",
                [
                    "RenderScript Modules:",
                    "librs.simple.so",
                    "Debug info does not exist.",
                    "Globals: 1",
                    "gColor - variable identified, but not found in binary (symbol exists)",
                    "Kernels: 2",
                    "root",
                    "simple_kernel",
                    "java_package_name: com.android.rs.waitattachnodebug",
                    "version",
                ],
            ),
        ])
    }
}
