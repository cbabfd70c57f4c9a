//! Role scoped breakpoints in a reduction kernel

use async_trait::async_trait;

use crate::common::Result;
use crate::harness::{
    RoleAssignment, RoleCombinationCheck, Scenario, ScenarioContext, SingleRoleCheck, Step,
    StepAction, REDUCE_ITERATIONS, ROLE_PREFIX_LEN,
};

const SCRIPT_SONAME: &str = "reduce";
const SCRIPT_BASENAME: &str = "reduce_common.rsh";
const REDUCE_NAME: &str = "find_min_user_type";

/// Checks role resolution and role exclusivity of reduction breakpoints
pub struct ReductionBreakpoints;

impl ReductionBreakpoints {
    fn single_roles() -> SingleRoleCheck {
        SingleRoleCheck {
            script_soname: SCRIPT_SONAME.to_string(),
            script_basename: SCRIPT_BASENAME.to_string(),
            reduce_name: REDUCE_NAME.to_string(),
            functions: vec![
                RoleAssignment::new("find_min_user_type_init", "initializer"),
                RoleAssignment::new("find_min_user_type_accum", "accumulator"),
                RoleAssignment::new("find_min_user_type_comb", "combiner"),
                RoleAssignment::new("find_min_user_type_outc", "outconverter"),
            ],
        }
    }

    fn role_combinations() -> RoleCombinationCheck {
        // The combiner only runs with several worker threads, so it is left
        // out of the pairs.
        let roles = ["initializer", "accumulator", "outconverter"];
        let mut combinations = Vec::new();
        for (i, first) in roles.iter().enumerate() {
            for second in &roles[i + 1..] {
                combinations.push([first.to_string(), second.to_string()]);
            }
        }

        RoleCombinationCheck {
            script_soname: SCRIPT_SONAME.to_string(),
            reduce_name: REDUCE_NAME.to_string(),
            combinations,
            iterations: REDUCE_ITERATIONS,
            prefix_len: ROLE_PREFIX_LEN,
        }
    }
}

#[async_trait]
impl Scenario for ReductionBreakpoints {
    fn name(&self) -> &str {
        "reduction_breakpoints"
    }

    fn description(&self) -> Option<&str> {
        Some("Reduction breakpoints stop only in functions of the requested roles")
    }

    fn bundle_target(&self) -> &str {
        "JavaReduction"
    }

    fn steps(&self, _ctx: &ScenarioContext) -> Result<Vec<Step>> {
        Ok(vec![
            Step::expect(
                "language renderscript status",
                ["Runtime Library discovered", "Runtime Driver discovered"],
            ),
            Step::new(StepAction::SingleRoles(Self::single_roles())),
            Step::new(StepAction::RoleCombinations(Self::role_combinations())).full_only(),
            Step::delete_breakpoints(),
        ])
    }
}
