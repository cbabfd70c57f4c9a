//! Source path remapping
//!
//! Debug info records the absolute source paths of the build machine. To show
//! source lines from a local checkout, the recorded directory of a file is
//! looked up from its line table and mapped to a local directory.

use std::path::{Path, PathBuf};

use crate::common::{Error, Result};

use super::connection::Session;
use super::matcher::Expectation;

/// Marker on the first line of a resolved line table dump
const LINE_TABLE_HEADER: &str = "Line table for";

/// Directory mapping installed on a session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceMapping {
    pub old_directory: PathBuf,
    pub new_directory: PathBuf,
}

/// Extract the build-time directory of a file from a line table dump
///
/// Expects output like:
///
/// ```text
/// Line table for /build/src/rs/scalars.rs in `librs.scalars.so
/// 0xb30f2374: /build/src/rs/scalars.rs:46
/// ```
///
/// The address line is split on spaces and colons; its second token is the
/// recorded path.
pub fn recorded_directory(file_name: &str, line_table: &str) -> Result<PathBuf> {
    let mut lines = line_table.lines();

    let header = lines.next().unwrap_or_default();
    if !header.contains(LINE_TABLE_HEADER) {
        return Err(Error::source_path_unresolved(
            file_name,
            "no line table in debug info",
        ));
    }

    let entry = lines
        .next()
        .ok_or_else(|| Error::source_path_unresolved(file_name, "line table has no entries"))?;

    let path = entry
        .split(|c: char| c == ' ' || c == ':')
        .filter(|token| !token.is_empty())
        .nth(1)
        .ok_or_else(|| {
            Error::source_path_unresolved(file_name, &format!("unparsable line table entry '{}'", entry))
        })?;

    Path::new(path)
        .parent()
        .map(Path::to_path_buf)
        .ok_or_else(|| Error::source_path_unresolved(file_name, &format!("'{}' has no directory", path)))
}

/// Map the recorded source directory of `file_name` to `new_directory`
pub async fn remap(
    session: &mut Session<'_>,
    file_name: &str,
    new_directory: &Path,
) -> Result<SourceMapping> {
    let command = format!("target modules dump line-table {}", file_name);
    let line_table = match session.do_command(&command).await {
        Ok(output) => output,
        Err(Error::ExecutionFailure { message, .. }) => {
            return Err(Error::source_path_unresolved(file_name, &message));
        }
        Err(e) => return Err(e),
    };

    let old_directory = recorded_directory(file_name, &line_table)?;

    session
        .run(
            &format!(
                "settings set target.source-map {} {}",
                old_directory.display(),
                new_directory.display()
            ),
            &Expectation::none(),
        )
        .await?;

    tracing::info!(
        file = file_name,
        from = %old_directory.display(),
        to = %new_directory.display(),
        "Installed source mapping"
    );

    Ok(SourceMapping {
        old_directory,
        new_directory: new_directory.to_path_buf(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const LINE_TABLE: &str = "Line table for /home/build/frameworks/rs/tests/lldb/cpp/BranchingFunCalls/simple.rs in `librs.simple.so\n0xb30f2374: /home/build/frameworks/rs/tests/lldb/cpp/BranchingFunCalls/simple.rs:46\n0xb30f2380: /home/build/frameworks/rs/tests/lldb/cpp/BranchingFunCalls/simple.rs:47\n";

    #[test]
    fn test_recorded_directory_from_address_line() {
        let dir = recorded_directory("simple.rs", LINE_TABLE).unwrap();
        assert_eq!(
            dir,
            PathBuf::from("/home/build/frameworks/rs/tests/lldb/cpp/BranchingFunCalls")
        );
    }

    #[test]
    fn test_missing_header_is_unresolved() {
        let err = recorded_directory(
            "nosuch.rs",
            "warning: No source filenames matched 'nosuch.rs'.\n",
        )
        .unwrap_err();
        assert!(matches!(err, Error::SourcePathUnresolved { .. }));
    }

    #[test]
    fn test_empty_output_is_unresolved() {
        let err = recorded_directory("simple.rs", "").unwrap_err();
        assert!(matches!(err, Error::SourcePathUnresolved { .. }));
    }

    #[test]
    fn test_header_without_entries_is_unresolved() {
        let err = recorded_directory("simple.rs", "Line table for /x/simple.rs in `librs.simple.so\n")
            .unwrap_err();
        assert!(err.to_string().contains("no entries"));
    }
}
