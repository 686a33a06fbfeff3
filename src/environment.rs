//! Environment snapshot passed explicitly through the install pipeline.

use std::collections::BTreeMap;
use std::env;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Runtime-environment-mode variable read for fingerprinting.
pub const NODE_ENV: &str = "NODE_ENV";

/// Process search-path variable.
pub const PATH: &str = "PATH";

/// Sub-directory of the working directory holding the Node.js project.
pub const BP_NODE_PROJECT_PATH: &str = "BP_NODE_PROJECT_PATH";

/// An immutable-by-default copy of the environment variables relevant to a build.
///
/// Components never read `std::env` directly; they receive a snapshot so a
/// build can be replayed with synthetic inputs. Take one snapshot at the edge
/// with [`BuildEnvironment::from_process`].
///
/// # Example
///
/// ```rust
/// use yarn_install::BuildEnvironment;
///
/// let env = BuildEnvironment::from_pairs([("NODE_ENV", "production")]);
/// assert_eq!(env.node_env(), "production");
/// assert_eq!(env.get("HOME"), None);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildEnvironment {
    vars: BTreeMap<String, String>,
}

impl BuildEnvironment {
    /// Snapshot the current process environment.
    ///
    /// Variables whose name or value is not valid unicode are skipped.
    pub fn from_process() -> Self {
        Self {
            vars: env::vars_os()
                .filter_map(|(k, v)| Some((k.into_string().ok()?, v.into_string().ok()?)))
                .collect(),
        }
    }

    /// Build a snapshot from explicit key/value pairs.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            vars: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Look up a variable.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }

    /// Set (or overwrite) a variable.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.vars.insert(key.into(), value.into());
    }

    /// Value of `NODE_ENV`, empty when unset.
    pub fn node_env(&self) -> &str {
        self.get(NODE_ENV).unwrap_or_default()
    }

    /// Value of `PATH`, if set.
    pub fn path(&self) -> Option<&str> {
        self.get(PATH)
    }

    /// Prepend a directory to `PATH`.
    ///
    /// Entries that cannot be joined (e.g. a directory containing the path
    /// separator) leave `PATH` untouched.
    pub fn prepend_path(&mut self, dir: &Path) {
        let mut entries: Vec<PathBuf> = vec![dir.to_path_buf()];
        if let Some(existing) = self.path() {
            entries.extend(env::split_paths(existing));
        }

        match env::join_paths(entries).map(OsString::into_string) {
            Ok(Ok(joined)) => self.set(PATH, joined),
            _ => tracing::debug!(dir = %dir.display(), "unable to prepend directory to PATH"),
        }
    }

    /// Iterate over all variables in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.vars.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Number of variables in the snapshot.
    pub fn len(&self) -> usize {
        self.vars.len()
    }

    /// Whether the snapshot is empty.
    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }
}
