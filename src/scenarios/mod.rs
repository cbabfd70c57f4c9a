//! Built-in scenarios and scenario lookup

mod file;
mod no_debug;
mod reduction;
mod source_step;

use std::path::{Path, PathBuf};

use crate::common::{Error, Result};
use crate::harness::Scenario;

pub use file::FileScenario;
pub use no_debug::LanguageSubcmdsNoDebug;
pub use reduction::ReductionBreakpoints;
pub use source_step::SourceStepCpp;

/// Every scenario compiled into the harness
pub fn builtin() -> Vec<Box<dyn Scenario>> {
    vec![
        Box::new(LanguageSubcmdsNoDebug),
        Box::new(SourceStepCpp),
        Box::new(ReductionBreakpoints),
    ]
}

/// Built-in scenario by name
pub fn find(name: &str) -> Option<Box<dyn Scenario>> {
    builtin().into_iter().find(|s| s.name() == name)
}

fn is_yaml(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yaml") | Some("yml")
    )
}

/// YAML scenario files in `dir`, sorted by path
pub fn discover(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut paths = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && is_yaml(&path) {
            paths.push(path);
        }
    }
    paths.sort();
    Ok(paths)
}

/// Resolve a scenario argument
///
/// A path to a YAML file is loaded directly. Otherwise the name is looked up
/// among the built-in scenarios, then as `<name>.yaml` in `scenarios_dir`.
pub fn resolve(name_or_path: &str, scenarios_dir: Option<&Path>) -> Result<Box<dyn Scenario>> {
    let path = Path::new(name_or_path);
    if is_yaml(path) {
        return Ok(Box::new(FileScenario::load(path)?));
    }

    if let Some(scenario) = find(name_or_path) {
        return Ok(scenario);
    }

    if let Some(dir) = scenarios_dir {
        for ext in ["yaml", "yml"] {
            let candidate = dir.join(format!("{}.{}", name_or_path, ext));
            if candidate.is_file() {
                return Ok(Box::new(FileScenario::load(&candidate)?));
            }
        }
    }

    Err(Error::UnknownScenario(name_or_path.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_names_unique() {
        let names: Vec<String> = builtin().iter().map(|s| s.name().to_string()).collect();
        let mut sorted = names.clone();
        sorted.sort();
        sorted.dedup();
        assert_eq!(names.len(), sorted.len());
    }

    #[test]
    fn test_resolve_builtin_and_unknown() {
        let scenario = resolve("source_step_cpp", None).unwrap();
        assert_eq!(scenario.bundle_target(), "CppBranchingFunCalls");

        let err = resolve("no_such_scenario", None).err().unwrap();
        assert!(matches!(err, Error::UnknownScenario(_)));
    }

    #[test]
    fn test_resolve_from_scenarios_dir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("smoke.yaml"),
            "name: smoke\nbundle: JavaNoDebugWaitAttach\nsteps: []\n",
        )
        .unwrap();
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let scenario = resolve("smoke", Some(dir.path())).unwrap();
        assert_eq!(scenario.name(), "smoke");
        assert_eq!(discover(dir.path()).unwrap().len(), 1);
    }
}
