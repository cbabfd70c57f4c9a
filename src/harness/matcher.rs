//! Output matching
//!
//! A command's response passes when every required substring occurs in it
//! verbatim and every required pattern matches somewhere in it.

use regex::Regex;
use serde::Deserialize;

use crate::common::{Error, Result};

/// Check `output` against required substrings and patterns
///
/// Empty requirement sets pass for any output. Matching is case-sensitive.
pub fn matches(output: &str, substrings: &[String], patterns: &[Regex]) -> bool {
    substrings.iter().all(|s| output.contains(s.as_str()))
        && patterns.iter().all(|p| p.is_match(output))
}

/// Verdict rule for one command response
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(try_from = "RawExpectation")]
pub struct Expectation {
    substrings: Vec<String>,
    patterns: Vec<Regex>,
}

/// Serialized form of an [`Expectation`]
#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawExpectation {
    #[serde(default)]
    contains: Vec<String>,
    #[serde(default)]
    matches: Vec<String>,
}

impl TryFrom<RawExpectation> for Expectation {
    type Error = Error;

    fn try_from(raw: RawExpectation) -> Result<Self> {
        Self::new(raw.contains, raw.matches)
    }
}

impl Expectation {
    /// Expectation that accepts any output
    pub fn none() -> Self {
        Self::default()
    }

    /// Build an expectation from substrings and uncompiled patterns
    pub fn new<S, P>(substrings: S, patterns: P) -> Result<Self>
    where
        S: IntoIterator,
        S::Item: Into<String>,
        P: IntoIterator,
        P::Item: AsRef<str>,
    {
        Ok(Self {
            substrings: substrings.into_iter().map(Into::into).collect(),
            patterns: compile(patterns)?,
        })
    }

    /// Require every substring
    pub fn contains<S>(substrings: S) -> Self
    where
        S: IntoIterator,
        S::Item: Into<String>,
    {
        Self {
            substrings: substrings.into_iter().map(Into::into).collect(),
            patterns: Vec::new(),
        }
    }

    /// Require every pattern to match
    pub fn matching<P>(patterns: P) -> Result<Self>
    where
        P: IntoIterator,
        P::Item: AsRef<str>,
    {
        Ok(Self {
            substrings: Vec::new(),
            patterns: compile(patterns)?,
        })
    }

    /// Whether this expectation accepts any output
    pub fn is_empty(&self) -> bool {
        self.substrings.is_empty() && self.patterns.is_empty()
    }

    /// Apply the expectation to a response
    pub fn check(&self, output: &str) -> bool {
        matches(output, &self.substrings, &self.patterns)
    }

    /// Requirements that `output` does not satisfy
    pub fn missing(&self, output: &str) -> Vec<String> {
        let substrings = self
            .substrings
            .iter()
            .filter(|s| !output.contains(s.as_str()))
            .map(|s| format!("{:?}", s));
        let patterns = self
            .patterns
            .iter()
            .filter(|p| !p.is_match(output))
            .map(|p| format!("/{}/", p.as_str()));
        substrings.chain(patterns).collect()
    }

    /// Human readable form of the rule
    pub fn describe(&self) -> String {
        if self.is_empty() {
            return "no expectation".to_string();
        }
        let mut parts = Vec::new();
        if !self.substrings.is_empty() {
            parts.push(format!("substrings {:?}", self.substrings));
        }
        if !self.patterns.is_empty() {
            let patterns: Vec<&str> = self.patterns.iter().map(Regex::as_str).collect();
            parts.push(format!("patterns {:?}", patterns));
        }
        parts.join(" and ")
    }
}

fn compile<P>(patterns: P) -> Result<Vec<Regex>>
where
    P: IntoIterator,
    P::Item: AsRef<str>,
{
    patterns
        .into_iter()
        .map(|p| {
            let p = p.as_ref();
            Regex::new(p).map_err(|e| Error::InvalidPattern {
                pattern: p.to_string(),
                reason: e.to_string(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const MODULE_DUMP: &str = "RenderScript Modules:\n  librs.simple.so\n    Debug info does not exist.\n    Globals: 1\n    Kernels: 2\n      root\n      simple_kernel\n";

    #[test]
    fn test_empty_expectation_passes_anything() {
        let empty = Expectation::none();
        assert!(empty.check(""));
        assert!(empty.check(MODULE_DUMP));
        assert!(empty.missing("anything").is_empty());
    }

    #[test]
    fn test_all_substrings_required() {
        let expect = Expectation::contains(["Debug info does not exist.", "Kernels: 2"]);
        assert!(expect.check(MODULE_DUMP));

        let expect = Expectation::contains(["Kernels: 2", "Kernels: 3"]);
        assert!(!expect.check(MODULE_DUMP));
        assert_eq!(expect.missing(MODULE_DUMP), vec!["\"Kernels: 3\"".to_string()]);
    }

    #[test]
    fn test_substrings_are_case_sensitive() {
        let expect = Expectation::contains(["kernels: 2"]);
        assert!(!expect.check(MODULE_DUMP));
    }

    #[test]
    fn test_substring_must_be_contiguous() {
        let expect = Expectation::contains(["Globals: 2"]);
        assert!(!expect.check("Globals: 1\n2"));
    }

    #[test]
    fn test_patterns_match_anywhere() {
        let expect = Expectation::matching([r"Process \d+ stopped", r"-> 2[012]"]).unwrap();
        assert!(expect.check("Process 3021 stopped\n* thread #1\n-> 21   int tmp = b;"));
        assert!(!expect.check("Process 3021 resuming"));
    }

    #[test]
    fn test_substrings_and_patterns_combined() {
        let expect = Expectation::new(["stop reason = breakpoint"], [r"simple\.rs:4\d"]).unwrap();
        assert!(expect.check("stop reason = breakpoint 1.1\nframe #0: simple.rs:47"));
        assert!(!expect.check("stop reason = step in\nframe #0: simple.rs:47"));
    }

    #[test]
    fn test_invalid_pattern_rejected() {
        let err = Expectation::matching(["(unclosed"]).unwrap_err();
        assert!(matches!(err, Error::InvalidPattern { .. }));
    }

    #[test]
    fn test_large_output() {
        let mut output = "frame #0: 0x0000 librs.reduce.so`find_min_user_type_accum\n".repeat(100_000);
        output.push_str("Process 7 stopped\n");
        let expect = Expectation::matching([r"Process \d+ stopped"]).unwrap();
        assert!(expect.check(&output));
    }

    #[test]
    fn test_deserialize_from_yaml() {
        let expect: Expectation =
            serde_yaml::from_str("contains: ['-> 48']\nmatches: ['Process \\d+']").unwrap();
        assert!(expect.check("Process 1 stopped\n-> 48"));
        assert_eq!(expect.describe(), "substrings [\"-> 48\"] and patterns [\"Process \\\\d+\"]");

        let bad: std::result::Result<Expectation, _> = serde_yaml::from_str("matches: ['[']");
        assert!(bad.is_err());
    }
}
