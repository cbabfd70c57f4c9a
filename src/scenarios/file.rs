//! Scenarios loaded from YAML files

use std::collections::BTreeMap;
use std::path::Path;

use async_trait::async_trait;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer};

use crate::common::{Error, Result};
use crate::device::Device;
use crate::harness::{Scenario, ScenarioContext, Step};

/// A scenario described in YAML
///
/// ```yaml
/// name: source_step_smoke
/// bundle: CppBranchingFunCalls
/// properties:
///   debug.rs.max-threads: 1
/// steps:
///   - action: command
///     command: "b -f simple.rs -l 47"
///     expect:
///       contains: ["(pending)"]
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileScenario {
    pub name: String,
    pub description: Option<String>,
    /// Application bundle the scenario expects
    pub bundle: String,
    /// Device properties set for the duration of the run
    #[serde(default, deserialize_with = "scalar_map")]
    pub properties: BTreeMap<String, String>,
    pub steps: Vec<Step>,
}

impl FileScenario {
    /// Load a scenario from a YAML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| Error::FileRead {
            path: path.display().to_string(),
            error: e.to_string(),
        })?;
        Self::parse(&content).map_err(|e| {
            Error::Config(format!(
                "Failed to parse scenario '{}': {}",
                path.display(),
                e
            ))
        })
    }

    pub fn parse(content: &str) -> Result<Self> {
        serde_yaml::from_str(content).map_err(|e| Error::Config(e.to_string()))
    }
}

/// Accept numbers and booleans as property values
fn scalar_map<'de, D>(deserializer: D) -> std::result::Result<BTreeMap<String, String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = BTreeMap::<String, serde_yaml::Value>::deserialize(deserializer)?;
    raw.into_iter()
        .map(|(name, value)| match value {
            serde_yaml::Value::String(s) => Ok((name, s)),
            serde_yaml::Value::Number(n) => Ok((name, n.to_string())),
            serde_yaml::Value::Bool(b) => Ok((name, b.to_string())),
            _ => Err(D::Error::custom(format!(
                "property '{}' must be a string, number or boolean",
                name
            ))),
        })
        .collect()
}

#[async_trait]
impl Scenario for FileScenario {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    fn bundle_target(&self) -> &str {
        &self.bundle
    }

    async fn setup(&self, device: &mut Device) -> Result<()> {
        for (name, value) in &self.properties {
            device.push_prop(name, value).await?;
        }
        Ok(())
    }

    fn steps(&self, _ctx: &ScenarioContext) -> Result<Vec<Step>> {
        Ok(self.steps.clone())
    }

    /// Restores every property, reporting the first failure
    async fn shutdown(&self, device: &mut Device) -> Result<()> {
        let mut first_error = None;
        for name in self.properties.keys().rev() {
            if let Err(e) = device.pop_prop(name).await {
                tracing::warn!(property = %name, error = %e, "Failed to restore property");
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::harness::StepAction;

    #[test]
    fn test_parse_with_properties() {
        let scenario = FileScenario::parse(
            r#"
name: stepping
bundle: CppBranchingFunCalls
properties:
  debug.rs.max-threads: 1
  debug.rs.debug: true
steps:
  - action: command
    command: "b -f simple.rs -l 47"
    expect:
      contains: ["(pending)"]
  - action: delete_breakpoints
    skip_when_reduced: true
"#,
        )
        .unwrap();

        assert_eq!(scenario.name(), "stepping");
        assert_eq!(scenario.bundle_target(), "CppBranchingFunCalls");
        assert_eq!(scenario.properties["debug.rs.max-threads"], "1");
        assert_eq!(scenario.properties["debug.rs.debug"], "true");
        assert_eq!(scenario.steps.len(), 2);
        assert!(matches!(scenario.steps[1].action, StepAction::DeleteBreakpoints));
    }

    #[test]
    fn test_unknown_field_rejected() {
        let err = FileScenario::parse("name: x\nbundle: y\nsteps: []\ntarget: z\n").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_nested_property_rejected() {
        let result = FileScenario::parse("name: x\nbundle: y\nproperties:\n  a: [1]\nsteps: []\n");
        assert!(result.is_err());
    }
}
