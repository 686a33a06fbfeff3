//! Detect phase: does this project need a Yarn install, and what does it require?

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::detection::find_project_path;
use crate::detection::manifest::PackageJson;
use crate::environment::BuildEnvironment;
use crate::install::{fs, InstallError, InstallResult, NODE_MODULES, YARN_LOCK};

/// Plan entry name for the Node.js runtime.
pub const PLAN_DEPENDENCY_NODE: &str = "node";

/// Plan entry name for Yarn.
pub const PLAN_DEPENDENCY_YARN: &str = "yarn";

/// Plan entry name for the installed modules.
pub const PLAN_DEPENDENCY_NODE_MODULES: &str = NODE_MODULES;

/// Metadata attached to a requirement.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct RequirementMetadata {
    /// Declared version constraint, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    /// Manifest field the version came from (e.g. `package.json#engines.yarn`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version_source: Option<String>,
    /// Needed at build time.
    pub build: bool,
}

/// Something the install step needs from an earlier step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Requirement {
    /// Plan entry name.
    pub name: String,
    /// Version hints.
    pub metadata: RequirementMetadata,
}

/// What the install step provides and requires.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetectResult {
    /// Plan entries provided (`node_modules`).
    pub provides: Vec<String>,
    /// Plan entries required (`node`, `yarn`).
    pub requires: Vec<Requirement>,
}

impl DetectResult {
    /// Find a requirement by name.
    pub fn requirement(&self, name: &str) -> Option<&Requirement> {
        self.requires.iter().find(|r| r.name == name)
    }
}

/// Detect whether the project at `working_dir` is a Yarn project.
///
/// # Detection Process
///
/// 1. Resolve the project directory (`BP_NODE_PROJECT_PATH`)
/// 2. Require `yarn.lock`
/// 3. Require a parseable `package.json`
/// 4. Require `node` and `yarn` at build time, with declared versions when
///    the manifest has them, and provide `node_modules`
///
/// # Example
///
/// ```rust
/// use yarn_install::{detect, BuildEnvironment};
///
/// let dir = tempfile::tempdir().unwrap();
/// std::fs::write(dir.path().join("yarn.lock"), "").unwrap();
/// std::fs::write(dir.path().join("package.json"), r#"{"engines": {"yarn": "1.22.0"}}"#).unwrap();
///
/// let result = detect(dir.path(), &BuildEnvironment::default()).unwrap();
/// let yarn = result.requirement("yarn").unwrap();
/// assert_eq!(yarn.metadata.version.as_deref(), Some("1.22.0"));
/// assert_eq!(yarn.metadata.version_source.as_deref(), Some("package.json#engines.yarn"));
/// ```
pub fn detect(working_dir: &Path, env: &BuildEnvironment) -> InstallResult<DetectResult> {
    let project = find_project_path(working_dir, env)?;

    if !fs::exists(&project.join(YARN_LOCK))? {
        return Err(InstallError::MissingPrerequisite {
            name: YARN_LOCK.to_string(),
            path: project,
        });
    }

    let descriptor = PackageJson::load(&project)?.descriptor();
    tracing::debug!(?descriptor, "detected version constraints");

    let requirement = |name: &str, constraint: Option<crate::VersionConstraint>| Requirement {
        name: name.to_string(),
        metadata: match constraint {
            Some(c) => RequirementMetadata {
                version: Some(c.version),
                version_source: Some(c.source.to_string()),
                build: true,
            },
            None => RequirementMetadata {
                build: true,
                ..Default::default()
            },
        },
    };

    Ok(DetectResult {
        provides: vec![PLAN_DEPENDENCY_NODE_MODULES.to_string()],
        requires: vec![
            requirement(PLAN_DEPENDENCY_NODE, descriptor.node),
            requirement(PLAN_DEPENDENCY_YARN, descriptor.yarn),
        ],
    })
}
