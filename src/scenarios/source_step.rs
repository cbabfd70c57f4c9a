//! Source level stepping through a script called from native code

use async_trait::async_trait;

use crate::common::Result;
use crate::device::Device;
use crate::harness::{Expectation, Scenario, ScenarioContext, Step};

/// Thread pool size property; stepping needs a single worker thread
const MAX_THREADS_PROP: &str = "debug.rs.max-threads";

pub struct SourceStepCpp;

#[async_trait]
impl Scenario for SourceStepCpp {
    fn name(&self) -> &str {
        "source_step_cpp"
    }

    fn description(&self) -> Option<&str> {
        Some("Step in, over and out of script functions in an NDK app")
    }

    fn bundle_target(&self) -> &str {
        "CppBranchingFunCalls"
    }

    async fn setup(&self, device: &mut Device) -> Result<()> {
        device.push_prop(MAX_THREADS_PROP, "1").await
    }

    fn steps(&self, _ctx: &ScenarioContext) -> Result<Vec<Step>> {
        Ok(vec![
            Step::expect(
                "language renderscript status",
                ["Runtime Library discovered", "Runtime Driver discovered"],
            ),
            Step::expect("b -f simple.rs -l 47", ["(pending)"]),
            Step::expect(
                "process continue",
                ["stopped", "stop reason = breakpoint", "simple.rs:47"],
            ),
            Step::source_map("simple.rs", "cpp/BranchingFunCalls"),
            Step::expect("process status", ["-> 47", "int i = in;"]),
            Step::expect("thread step-in", ["-> 48"]),
            Step::expect("thread step-in", ["-> 49"]),
            Step::expect("thread step-over", ["-> 50"]),
            Step::expect("thread step-in", ["-> 33"]),
            Step::expect("b -f simple.rs -l 38", ["modify_i", "simple.rs:38"]),
            Step::expect("c", ["stop reason = breakpoint", "simple.rs:38", "-> 38"]),
            // set_i is at lines 20-22; any of them is a valid landing line
            Step::command("thread step-in", Expectation::matching([r"-> 2[012]"])?),
            Step::expect("thread step-out", ["-> 38"]),
            Step::expect("breakpoint delete 1", ["1 breakpoints deleted"]),
            Step::expect("breakpoint delete 2", ["1 breakpoints deleted"]),
            Step::expect("process continue", ["exited with status = 0"]),
        ])
    }

    async fn shutdown(&self, device: &mut Device) -> Result<()> {
        device.pop_prop(MAX_THREADS_PROP).await
    }
}
