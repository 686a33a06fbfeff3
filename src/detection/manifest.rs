//! `package.json` reading: declared Node.js and Yarn version constraints.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::install::{InstallError, InstallResult};

/// Manifest file name.
pub const PACKAGE_JSON: &str = "package.json";

/// Prefix of a `packageManager` pin naming Yarn.
pub(crate) const YARN_PIN_PREFIX: &str = "yarn@";

/// The subset of `package.json` this crate cares about.
#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct PackageJson {
    #[serde(default, deserialize_with = "string_engines")]
    pub engines: Option<HashMap<String, String>>,
    #[serde(default, rename = "packageManager")]
    pub package_manager: Option<String>,
}

impl PackageJson {
    pub(crate) fn path(project: &Path) -> PathBuf {
        project.join(PACKAGE_JSON)
    }

    /// Strict load: missing file and malformed JSON are errors.
    pub(crate) fn load(project: &Path) -> InstallResult<Self> {
        let path = Self::path(project);
        let data = std::fs::read(&path).map_err(|source| {
            if source.kind() == std::io::ErrorKind::NotFound {
                InstallError::MissingPrerequisite {
                    name: PACKAGE_JSON.to_string(),
                    path: project.to_path_buf(),
                }
            } else {
                InstallError::Io {
                    operation: "read",
                    path: path.clone(),
                    source,
                }
            }
        })?;

        serde_json::from_slice(&data).map_err(|source| InstallError::ManifestParse { path, source })
    }

    /// Lenient load: any failure is "no manifest".
    pub(crate) fn load_lenient(project: &Path) -> Option<Self> {
        match Self::load(project) {
            Ok(pkg) => Some(pkg),
            Err(e) => {
                tracing::debug!(error = %e, "ignoring unreadable package.json");
                None
            }
        }
    }

    fn engine(&self, name: &str) -> Option<&str> {
        self.engines
            .as_ref()
            .and_then(|engines| engines.get(name))
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }

    /// Everything after a literal `yarn@` prefix, possibly empty.
    pub(crate) fn raw_yarn_pin(&self) -> Option<&str> {
        self.package_manager
            .as_deref()
            .and_then(|pm| pm.strip_prefix(YARN_PIN_PREFIX))
    }

    /// The version after a literal `yarn@` prefix, if non-empty.
    pub(crate) fn yarn_pin(&self) -> Option<&str> {
        self.raw_yarn_pin().filter(|v| !v.is_empty())
    }

    /// Describe the version constraints declared in this manifest.
    pub(crate) fn descriptor(&self) -> ProjectDescriptor {
        let node = self.engine("node").map(|v| VersionConstraint {
            version: v.to_string(),
            source: VersionSource::PackageJson,
        });

        let yarn = self
            .engine("yarn")
            .map(|v| VersionConstraint {
                version: v.to_string(),
                source: VersionSource::EnginesYarn,
            })
            .or_else(|| {
                self.yarn_pin().map(|v| VersionConstraint {
                    version: v.to_string(),
                    source: VersionSource::PackageManager,
                })
            });

        ProjectDescriptor { node, yarn }
    }
}

/// Keep the string entries of an `engines` object; any other shape (the
/// legacy array form, `null`) is no engines at all.
fn string_engines<'de, D>(deserializer: D) -> Result<Option<HashMap<String, String>>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Object(map) => Some(
            map.into_iter()
                .filter_map(|(name, value)| match value {
                    Value::String(version) => Some((name, version)),
                    _ => None,
                })
                .collect(),
        ),
        _ => None,
    })
}

/// Which manifest field a version constraint came from.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::IntoStaticStr,
)]
pub enum VersionSource {
    /// Runtime version from `engines.node`.
    #[serde(rename = "package.json")]
    #[strum(serialize = "package.json")]
    PackageJson,
    /// Yarn version from `engines.yarn`.
    #[serde(rename = "package.json#engines.yarn")]
    #[strum(serialize = "package.json#engines.yarn")]
    EnginesYarn,
    /// Yarn version from the `packageManager` pin.
    #[serde(rename = "package.json#packageManager")]
    #[strum(serialize = "package.json#packageManager")]
    PackageManager,
}

/// A declared version together with its provenance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionConstraint {
    /// Version or range, verbatim from the manifest.
    pub version: String,
    /// Field that supplied it.
    pub source: VersionSource,
}

/// Version hints declared by a project.
///
/// Both fields are optional; an empty descriptor means "no hints", never an
/// error.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectDescriptor {
    /// Node.js runtime constraint.
    pub node: Option<VersionConstraint>,
    /// Yarn constraint.
    pub yarn: Option<VersionConstraint>,
}

/// Read the version constraints declared in `<project>/package.json`.
///
/// Tolerates a missing or malformed manifest by returning an empty
/// descriptor. Yarn resolution order:
///
/// 1. a non-empty `engines.yarn`
/// 2. a `packageManager` value starting with `yarn@`, version taken verbatim
///
/// # Example
///
/// ```rust
/// use yarn_install::{read_constraints, VersionSource};
///
/// let dir = tempfile::tempdir().unwrap();
/// std::fs::write(
///     dir.path().join("package.json"),
///     r#"{"packageManager": "yarn@4.2.2"}"#,
/// ).unwrap();
///
/// let descriptor = read_constraints(dir.path());
/// let yarn = descriptor.yarn.unwrap();
/// assert_eq!(yarn.version, "4.2.2");
/// assert_eq!(yarn.source, VersionSource::PackageManager);
/// ```
pub fn read_constraints(project: &Path) -> ProjectDescriptor {
    PackageJson::load_lenient(project)
        .map(|pkg| pkg.descriptor())
        .unwrap_or_default()
}
