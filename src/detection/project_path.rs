//! Locating the Node.js project inside the working directory.

use std::path::{Path, PathBuf};

use crate::environment::{BuildEnvironment, BP_NODE_PROJECT_PATH};
use crate::install::{fs, InstallError, InstallResult};

/// Resolve the project directory.
///
/// `BP_NODE_PROJECT_PATH`, when set and non-empty, names a sub-directory of
/// `working_dir` that holds `package.json`; it must exist. Otherwise the
/// working directory is the project.
///
/// # Example
///
/// ```rust
/// use yarn_install::{find_project_path, BuildEnvironment};
///
/// let dir = tempfile::tempdir().unwrap();
/// std::fs::create_dir(dir.path().join("frontend")).unwrap();
///
/// let env = BuildEnvironment::from_pairs([("BP_NODE_PROJECT_PATH", "frontend")]);
/// let project = find_project_path(dir.path(), &env).unwrap();
/// assert_eq!(project, dir.path().join("frontend"));
/// ```
pub fn find_project_path(working_dir: &Path, env: &BuildEnvironment) -> InstallResult<PathBuf> {
    let sub_dir = match env.get(BP_NODE_PROJECT_PATH) {
        Some(value) if !value.is_empty() => value,
        _ => return Ok(working_dir.to_path_buf()),
    };

    let project = working_dir.join(sub_dir);
    if !fs::exists(&project)? {
        return Err(InstallError::MissingPrerequisite {
            name: sub_dir.to_string(),
            path: working_dir.to_path_buf(),
        });
    }

    tracing::debug!(project = %project.display(), "using {}", BP_NODE_PROJECT_PATH);
    Ok(project)
}
