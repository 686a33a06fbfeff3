//! Yarn generation enum and every behavior that differs between them.
//!
//! Yarn 1 ("Classic") and Yarn 2+ ("Modern", a.k.a. Berry) have disjoint CLI
//! grammars, offline semantics and config discovery. All of that branching
//! lives here; the rest of the crate selects a variant once with
//! [`classify`](crate::classify) and calls these methods.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use strum::IntoEnumIterator;

use crate::environment::{BuildEnvironment, NODE_ENV};
use crate::install::executable::{run_checked, Execution, OutputMode};
use crate::install::{fs, Executable, InstallError, InstallResult};

/// Modern config file at the project root.
pub const YARNRC_YML: &str = ".yarnrc.yml";

/// Modern state directory at the project root.
pub const YARN_DIR: &str = ".yarn";

/// Modern offline cache, relative to the project root.
pub const YARN_CACHE_DIR: &str = ".yarn/cache";

/// The package-manager generation in use.
///
/// # Example
///
/// ```rust
/// use yarn_install::PackageManagerVariant;
///
/// let args = PackageManagerVariant::Classic.install_args(false, true);
/// assert_eq!(
///     args,
///     ["install", "--ignore-engines", "--frozen-lockfile", "--production", "false", "--offline"]
/// );
///
/// let args = PackageManagerVariant::Modern.install_args(false, false);
/// assert_eq!(args, ["install", "--immutable"]);
/// ```
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::EnumIter,
    strum::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum PackageManagerVariant {
    /// Yarn 1.x.
    Classic,
    /// Yarn 2 and later.
    Modern,
}

impl PackageManagerVariant {
    /// Human-readable name.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Classic => "Yarn Classic",
            Self::Modern => "Yarn Modern",
        }
    }

    /// Iterator over both variants.
    pub fn all() -> impl Iterator<Item = Self> {
        <Self as IntoEnumIterator>::iter()
    }

    /// Arguments for the install call.
    ///
    /// `launch` is true when the modules are for the runtime image (dev
    /// dependencies excluded), false for a build-time install.
    pub fn install_args(&self, launch: bool, offline: bool) -> Vec<String> {
        let mut args = vec!["install"];

        match self {
            Self::Classic => {
                args.extend(["--ignore-engines", "--frozen-lockfile"]);
                if !launch {
                    args.extend(["--production", "false"]);
                }
            }
            // No --production equivalent; see `apply_environment`.
            Self::Modern => args.push("--immutable"),
        }

        if offline {
            args.push("--offline");
        }

        args.into_iter().map(String::from).collect()
    }

    /// Environment adjustments for the install call.
    ///
    /// Modern Yarn installs dev dependencies only when `NODE_ENV` is not
    /// `production`, so a build-phase install forces `development`.
    pub fn apply_environment(&self, env: &mut BuildEnvironment, launch: bool) {
        if *self == Self::Modern && !launch {
            env.set(NODE_ENV, "development");
        }
    }

    /// Raw bytes describing the effective Yarn configuration.
    ///
    /// Classic asks the tool (`yarn config list --silent`). Modern has no
    /// listing command, so `.yarnrc.yml` is read directly and an absent file
    /// is an empty snapshot.
    pub(crate) async fn config_snapshot<E>(
        &self,
        executable: &E,
        working_dir: &Path,
        env: &BuildEnvironment,
    ) -> InstallResult<Vec<u8>>
    where
        E: Executable + ?Sized,
    {
        match self {
            Self::Classic => {
                let output = run_checked(
                    executable,
                    Execution {
                        args: args(&["config", "list", "--silent"]),
                        env: env.clone(),
                        dir: working_dir.to_path_buf(),
                        output: OutputMode::Capture,
                    },
                )
                .await?;
                Ok(output.into_bytes())
            }
            Self::Modern => {
                let path = working_dir.join(YARNRC_YML);
                match std::fs::read(&path) {
                    Ok(data) => Ok(data),
                    Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
                    Err(e) => Err(InstallError::io("read", &path)(e)),
                }
            }
        }
    }

    /// Whether a local package source allows `--offline`.
    ///
    /// Classic asks for `yarn-offline-mirror` and checks the reported
    /// directory. Modern checks `.yarn/cache` and never runs the tool.
    pub(crate) async fn offline_available<E>(
        &self,
        executable: &E,
        working_dir: &Path,
        env: &BuildEnvironment,
    ) -> InstallResult<bool>
    where
        E: Executable + ?Sized,
    {
        let dir = match self {
            Self::Classic => {
                let output = run_checked(
                    executable,
                    Execution {
                        args: args(&["config", "get", "yarn-offline-mirror"]),
                        env: env.clone(),
                        dir: working_dir.to_path_buf(),
                        output: OutputMode::Capture,
                    },
                )
                .await?;

                match parse_offline_mirror(&output) {
                    Some(dir) => dir,
                    None => {
                        tracing::debug!("no offline mirror configured");
                        return Ok(false);
                    }
                }
            }
            Self::Modern => working_dir.join(YARN_CACHE_DIR),
        };

        let available = fs::is_dir(&dir)?;
        tracing::debug!(dir = %dir.display(), available, "offline package source");
        Ok(available)
    }
}

fn args(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// Pick the mirror directory out of `yarn config get yarn-offline-mirror`.
///
/// The output may carry warning lines (e.g. "warning You don't appear to
/// have an internet connection."), so the first line that is an absolute
/// path wins.
pub(crate) fn parse_offline_mirror(output: &str) -> Option<PathBuf> {
    let absolute = Regex::new(r"^(/|[A-Za-z]:[\\/])").expect("Invalid regex pattern");

    output
        .lines()
        .map(str::trim)
        .find(|line| absolute.is_match(line))
        .map(PathBuf::from)
}
